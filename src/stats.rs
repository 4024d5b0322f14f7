use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::dom::Document;
use crate::errors::PageError;
use crate::page::Page;

pub const STAT_ATTRIBUTE: &str = "data-stat";

pub type StatsPayload = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsRefresh {
    Applied { updated: usize },
    /// A later-issued refresh already patched the page.
    Stale,
}

/// Orders overlapping refreshes so the most recently issued one wins.
#[derive(Debug, Default)]
pub struct StatsSequence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl StatsSequence {
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Claims the right to patch the page for `ticket`.
    pub fn commit(&self, ticket: u64) -> bool {
        self.applied.fetch_max(ticket, Ordering::SeqCst) < ticket
    }
}

/// Fetches the stats payload and patches matching elements.
///
/// Failures are logged and returned; the document is left untouched.
pub async fn refresh_stats(page: &Page) -> Result<StatsRefresh, PageError> {
    let ticket = page.stats_sequence().issue();
    let payload = match fetch_stats(page).await {
        Ok(payload) => payload,
        Err(err) => {
            error!(url = %page.config().stats_url, "failed to refresh stats: {err}");
            return Err(err);
        }
    };

    let outcome = page.with_document(|doc| {
        if !page.stats_sequence().commit(ticket) {
            return StatsRefresh::Stale;
        }
        StatsRefresh::Applied {
            updated: apply_stats(doc, &payload),
        }
    });

    match outcome {
        StatsRefresh::Stale => debug!(ticket, "dropping stale stats response"),
        StatsRefresh::Applied { updated } => debug!(ticket, updated, "stats refreshed"),
    }
    Ok(outcome)
}

async fn fetch_stats(page: &Page) -> Result<StatsPayload, PageError> {
    let response = page
        .client()
        .get(&page.config().stats_url)
        .send()
        .await
        .map_err(PageError::Request)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::Status(status));
    }

    response
        .json::<StatsPayload>()
        .await
        .map_err(PageError::Decode)
}

/// Writes every payload value whose key names a `[data-stat]` element.
pub fn apply_stats(doc: &mut Document, payload: &StatsPayload) -> usize {
    let mut updated = 0;
    for id in doc.elements_with_attribute(STAT_ATTRIBUTE) {
        let Some(text) = doc
            .element(id)
            .and_then(|element| element.attribute(STAT_ATTRIBUTE))
            .and_then(|key| payload.get(key))
            .and_then(display_value)
        else {
            continue;
        };
        if doc.set_text(id, text) {
            updated += 1;
        }
    }
    updated
}

fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::dom::NodeId;
    use axum::{routing::get, Json, Router};
    use serde_json::json;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::sleep;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn stat_cell(doc: &mut Document, key: &str, initial: &str) -> NodeId {
        let cell = doc
            .build("div")
            .class("stat-value")
            .attr(STAT_ATTRIBUTE, key)
            .text(initial)
            .finish();
        let body = doc.body();
        doc.append_child(body, cell).unwrap();
        cell
    }

    fn payload(value: Value) -> StatsPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn matching_elements_take_payload_values() {
        let mut doc = Document::new();
        let users = stat_cell(&mut doc, "users", "0");
        let messages = stat_cell(&mut doc, "messages", "0");
        let unknown = stat_cell(&mut doc, "unknown", "--");

        let updated = apply_stats(&mut doc, &payload(json!({ "users": 42, "messages": 7, "extra": 1 })));

        assert_eq!(updated, 2);
        assert_eq!(doc.text_content(users), "42");
        assert_eq!(doc.text_content(messages), "7");
        assert_eq!(doc.text_content(unknown), "--");
    }

    #[test]
    fn scalar_values_render_as_text() {
        assert_eq!(display_value(&json!("12 MB")), Some("12 MB".to_string()));
        assert_eq!(display_value(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(display_value(&json!(true)), Some("true".to_string()));
        assert_eq!(display_value(&Value::Null), Some(String::new()));
        assert_eq!(display_value(&json!([1, 2])), None);
    }

    #[test]
    fn later_ticket_blocks_earlier_one() {
        let sequence = StatsSequence::default();
        let first = sequence.issue();
        let second = sequence.issue();

        assert!(sequence.commit(second));
        assert!(!sequence.commit(first));
        assert!(sequence.commit(sequence.issue()));
    }

    #[tokio::test]
    async fn refresh_patches_page_from_endpoint() {
        let origin = serve(Router::new().route(
            "/api/stats",
            get(|| async { Json(json!({ "users": 42, "messages": 7 })) }),
        ))
        .await;
        let mut doc = Document::new();
        let users = stat_cell(&mut doc, "users", "0");
        let unknown = stat_cell(&mut doc, "unknown", "--");
        let page = Page::new(doc, "/", PageConfig::for_origin(&origin));

        let outcome = refresh_stats(&page).await.unwrap();

        assert_eq!(outcome, StatsRefresh::Applied { updated: 1 });
        page.with_document(|doc| {
            assert_eq!(doc.text_content(users), "42");
            assert_eq!(doc.text_content(unknown), "--");
        });
    }

    #[tokio::test]
    async fn network_failure_leaves_page_untouched() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut doc = Document::new();
        let users = stat_cell(&mut doc, "users", "0");
        let page = Page::new(doc, "/", PageConfig::for_origin(&origin));
        let before = page.with_document(|doc| doc.revision());

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let err = refresh_stats(&page).await.unwrap_err();

        assert!(matches!(err, PageError::Request(_)));
        page.with_document(|doc| {
            assert_eq!(doc.revision(), before);
            assert_eq!(doc.text_content(users), "0");
        });
        let output = logs.contents();
        assert!(output.contains("ERROR"), "no error event in {output:?}");
        assert!(output.contains("failed to refresh stats"), "missing diagnostic in {output:?}");
    }

    #[tokio::test]
    async fn slow_earlier_refresh_is_dropped_as_stale() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let origin = serve(Router::new().route(
            "/api/stats",
            get(move || {
                let call = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        sleep(Duration::from_millis(300)).await;
                        Json(json!({ "users": "old" }))
                    } else {
                        Json(json!({ "users": "new" }))
                    }
                }
            }),
        ))
        .await;
        let mut doc = Document::new();
        let users = stat_cell(&mut doc, "users", "0");
        let page = Page::new(doc, "/", PageConfig::for_origin(&origin));

        let slow = tokio::spawn({
            let page = page.clone();
            async move { refresh_stats(&page).await }
        });
        while hits.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(5)).await;
        }
        let fast = refresh_stats(&page).await.unwrap();

        assert_eq!(fast, StatsRefresh::Applied { updated: 1 });
        assert_eq!(slow.await.unwrap().unwrap(), StatsRefresh::Stale);
        page.with_document(|doc| assert_eq!(doc.text_content(users), "new"));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_failure() {
        let origin = serve(Router::new().route("/api/stats", get(|| async { "<html>oops</html>" }))).await;
        let mut doc = Document::new();
        let users = stat_cell(&mut doc, "users", "0");
        let page = Page::new(doc, "/", PageConfig::for_origin(&origin));

        let err = refresh_stats(&page).await.unwrap_err();

        assert!(matches!(err, PageError::Decode(_)));
        page.with_document(|doc| assert_eq!(doc.text_content(users), "0"));
    }
}
