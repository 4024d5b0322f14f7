use std::fmt::{Display, Write};

use chrono::{DateTime, Local, TimeZone};
use tracing::warn;

use crate::dom::Document;
use crate::page::Page;

pub const CLOCK_ELEMENT_ID: &str = "current-time";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Writes the current local time into `#current-time`, if the page has one.
pub fn update_current_time(page: &Page) -> bool {
    let text = format_time(&Local::now(), &page.config().time_format);
    page.with_document(|doc| write_time(doc, &text))
}

pub fn format_time<Tz>(now: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    if write!(out, "{}", now.format(pattern)).is_err() {
        warn!(pattern, "invalid clock format, using {DEFAULT_TIME_FORMAT}");
        out.clear();
        let _ = write!(out, "{}", now.format(DEFAULT_TIME_FORMAT));
    }
    out
}

fn write_time(doc: &mut Document, text: &str) -> bool {
    match doc.get_element_by_id(CLOCK_ELEMENT_ID) {
        Some(id) => doc.set_text(id, text),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use chrono::{NaiveDate, Utc};

    fn page_with_clock(present: bool) -> Page {
        let mut doc = Document::new();
        if present {
            let clock = doc.build("span").attr("id", CLOCK_ELEMENT_ID).finish();
            let body = doc.body();
            doc.append_child(body, clock).unwrap();
        }
        Page::new(doc, "/", PageConfig::default())
    }

    #[test]
    fn formats_24_hour_time() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 9)
            .unwrap()
            .and_hms_opt(17, 4, 5)
            .unwrap()
            .and_utc();
        assert_eq!(format_time(&at, "%H:%M:%S"), "17:04:05");
    }

    #[test]
    fn broken_format_falls_back() {
        let at = Utc::now();
        let text = format_time(&at, "%Q");
        assert_eq!(text.len(), 8);
    }

    #[test]
    fn writes_time_into_clock_element() {
        let page = page_with_clock(true);
        assert!(update_current_time(&page));

        let text = page.with_document(|doc| {
            let id = doc.get_element_by_id(CLOCK_ELEMENT_ID).unwrap();
            doc.text_content(id)
        });
        assert_eq!(text.len(), 8);
        assert_eq!(text.matches(':').count(), 2);
    }

    #[test]
    fn missing_clock_element_is_a_silent_noop() {
        let page = page_with_clock(false);
        let before = page.with_document(|doc| doc.revision());

        assert!(!update_current_time(&page));
        assert_eq!(page.with_document(|doc| doc.revision()), before);
    }
}
