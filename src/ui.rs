use chrono::Local;
use tracing::warn;

use crate::clock::{format_time, CLOCK_ELEMENT_ID, DEFAULT_TIME_FORMAT};
use crate::dom::{Document, NodeId};
use crate::init::{highlight_active_tab, NAV_TAB_CLASS};
use crate::models::StatsSnapshot;
use crate::stats::STAT_ATTRIBUTE;

pub const NAV_TABS: &[(&str, &str)] = &[("/", "Dashboard"), ("/stats", "Statistics")];

/// Dashboard with one card per counter.
pub fn dashboard_document(stats: &StatsSnapshot) -> Document {
    let (mut doc, content) = layout("Dashboard");

    let card = doc.build("div").class("glass-card").finish();
    let heading = doc.build("h2").text("Overview").finish();
    let grid = doc.build("div").class("stats-grid").finish();
    append(&mut doc, card, &[heading, grid]);

    for (key, label, value) in stats.entries() {
        let stat_card = doc.build("div").class("stat-card").finish();
        let value = stat_value(&mut doc, "div", key, value.to_string());
        let label = doc.build("div").class("stat-label").text(label).finish();
        append(&mut doc, stat_card, &[value, label]);
        append(&mut doc, grid, &[stat_card]);
    }

    let updated = doc.build("p").class("updated").text("Last update: ").finish();
    let stamp = stat_value(&mut doc, "span", "timestamp", "--".to_string());
    append(&mut doc, updated, &[stamp]);
    append(&mut doc, card, &[updated]);
    append(&mut doc, content, &[card]);
    doc
}

/// Tabular view of every counter.
pub fn stats_document(stats: &StatsSnapshot) -> Document {
    let (mut doc, content) = layout("Statistics");

    let card = doc.build("div").class("glass-card").finish();
    let table = doc.build("table").class("stats-table").finish();
    append(&mut doc, card, &[table]);

    for (key, label, value) in stats.entries() {
        let row = doc.build("tr").finish();
        let name = doc.build("th").text(label).finish();
        let cell = stat_value(&mut doc, "td", key, value.to_string());
        append(&mut doc, row, &[name, cell]);
        append(&mut doc, table, &[row]);
    }
    append(&mut doc, content, &[card]);
    doc
}

/// Marks the tab for `path` and serializes the page.
pub fn render_page(mut doc: Document, path: &str) -> String {
    highlight_active_tab(&mut doc, path);
    doc.to_html()
}

fn layout(title: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let head = doc.head();
    let body = doc.body();

    let charset = doc.build("meta").attr("charset", "UTF-8").finish();
    let viewport = doc
        .build("meta")
        .attr("name", "viewport")
        .attr("content", "width=device-width, initial-scale=1.0")
        .finish();
    let page_title = doc.build("title").text(format!("{title} • Admin Panel")).finish();
    let css = doc.build("style").text(PAGE_CSS).finish();
    append(&mut doc, head, &[charset, viewport, page_title, css]);

    let container = doc.build("div").class("container").finish();
    let header = doc.build("div").class("header").finish();
    let h1 = doc.build("h1").text(title).finish();
    let clock = doc
        .build("span")
        .attr("id", CLOCK_ELEMENT_ID)
        .text(format_time(&Local::now(), DEFAULT_TIME_FORMAT))
        .finish();
    append(&mut doc, header, &[h1, clock]);

    let nav = doc.build("nav").class("nav-tabs").finish();
    for (href, label) in NAV_TABS {
        let tab = doc
            .build("a")
            .class(NAV_TAB_CLASS)
            .attr("href", *href)
            .text(*label)
            .finish();
        append(&mut doc, nav, &[tab]);
    }

    let content = doc.build("main").class("content").finish();
    append(&mut doc, container, &[header, nav, content]);
    append(&mut doc, body, &[container]);
    (doc, content)
}

fn stat_value(doc: &mut Document, tag: &str, key: &str, initial: String) -> NodeId {
    doc.build(tag)
        .class("stat-value")
        .attr(STAT_ATTRIBUTE, key)
        .text(initial)
        .finish()
}

fn append(doc: &mut Document, parent: NodeId, children: &[NodeId]) {
    for child in children {
        if let Err(err) = doc.append_child(parent, *child) {
            warn!("failed to attach {child} under {parent}: {err}");
        }
    }
}

const PAGE_CSS: &str = r#"
    :root {
      --primary: #6366f1;
      --secondary: #8b5cf6;
      --dark: #1f2937;
      --gray: #6b7280;
    }

    * { margin: 0; padding: 0; box-sizing: border-box; }

    body {
      font-family: 'Segoe UI', system-ui, sans-serif;
      background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
      min-height: 100vh;
      color: var(--dark);
      line-height: 1.6;
    }

    .container { max-width: 1200px; margin: 0 auto; padding: 20px; }

    .header {
      display: flex;
      align-items: baseline;
      justify-content: space-between;
      padding: 30px;
      margin-bottom: 20px;
      border-radius: 20px;
      color: white;
      background: linear-gradient(135deg, var(--primary), var(--secondary));
    }

    #current-time { font-variant-numeric: tabular-nums; opacity: 0.9; }

    .nav-tabs { display: flex; gap: 10px; margin-bottom: 30px; flex-wrap: wrap; }

    .nav-tab {
      padding: 12px 24px;
      border-radius: 12px;
      background: rgba(255, 255, 255, 0.9);
      color: var(--dark);
      text-decoration: none;
      font-weight: 600;
    }

    .nav-tab.active { background: var(--primary); color: white; }

    .glass-card {
      background: rgba(255, 255, 255, 0.95);
      border-radius: 20px;
      padding: 30px;
      box-shadow: 0 8px 32px rgba(0, 0, 0, 0.1);
    }

    .stats-grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 20px;
      margin-top: 20px;
    }

    .stat-card { background: white; border-radius: 15px; padding: 25px; text-align: center; }
    .stat-value { font-size: 2.2em; font-weight: 800; color: var(--primary); }
    .stat-label { color: var(--gray); font-size: 0.9em; text-transform: uppercase; }
    .stats-table { width: 100%; border-collapse: collapse; }
    .stats-table th, .stats-table td { padding: 12px; text-align: left; border-bottom: 1px solid #e5e7eb; }
    .updated { margin-top: 20px; color: var(--gray); }
    .updated .stat-value { font-size: 1em; font-weight: 400; }

    .btn {
      padding: 10px 20px;
      border: none;
      border-radius: 10px;
      background: var(--primary);
      color: white;
      cursor: pointer;
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::ACTIVE_CLASS;

    fn sample() -> StatsSnapshot {
        StatsSnapshot {
            total_users: 10,
            total_messages: 250,
            active_users: 4,
            total_payments: 2,
        }
    }

    #[test]
    fn dashboard_carries_clock_and_stat_cells() {
        let doc = dashboard_document(&sample());

        assert!(doc.get_element_by_id(CLOCK_ELEMENT_ID).is_some());
        let cells = doc.elements_with_attribute(STAT_ATTRIBUTE);
        let keys: Vec<&str> = cells
            .iter()
            .filter_map(|id| doc.element(*id)?.attribute(STAT_ATTRIBUTE))
            .collect();
        assert_eq!(
            keys,
            ["total_users", "total_messages", "active_users", "total_payments", "timestamp"]
        );
        assert_eq!(doc.text_content(cells[1]), "250");
    }

    #[test]
    fn rendered_page_marks_only_the_current_tab() {
        let mut doc = stats_document(&sample());
        let active = highlight_active_tab(&mut doc, "/stats");
        assert_eq!(active.len(), 1);
        assert_eq!(
            doc.element(active[0]).unwrap().attribute("href"),
            Some("/stats")
        );

        let html = render_page(dashboard_document(&sample()), "/");
        assert!(html.contains(&format!(
            r#"<a href="/" class="{NAV_TAB_CLASS} {ACTIVE_CLASS}">Dashboard</a>"#
        )));
        assert!(html.contains(r#"<a href="/stats" class="nav-tab">Statistics</a>"#));
    }
}
