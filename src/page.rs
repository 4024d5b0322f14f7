use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::PageConfig;
use crate::dom::{Document, NodeId};
use crate::stats::StatsSequence;

pub const KEYFRAMES_CSS: &str = r#"
    @keyframes slideIn {
        from { transform: translateX(100%); opacity: 0; }
        to { transform: translateX(0); opacity: 1; }
    }

    @keyframes slideOut {
        from { transform: translateX(0); opacity: 1; }
        to { transform: translateX(100%); opacity: 0; }
    }

    @keyframes fadeIn {
        from { opacity: 0; transform: translateY(-10px); }
        to { opacity: 1; transform: translateY(0); }
    }
"#;

/// Cheap handle to a loaded page. Clones share the same document.
#[derive(Clone)]
pub struct Page {
    inner: Arc<PageInner>,
}

struct PageInner {
    document: Mutex<Document>,
    path: String,
    config: PageConfig,
    client: Client,
    stats_sequence: StatsSequence,
}

impl Page {
    /// Loads the page at `path`, appending the animation keyframes to head.
    pub fn new(mut document: Document, path: impl Into<String>, config: PageConfig) -> Self {
        let style = install_keyframes(&mut document);
        debug!(%style, "animation keyframes installed");

        Self {
            inner: Arc::new(PageInner {
                document: Mutex::new(document),
                path: path.into(),
                config,
                client: Client::new(),
                stats_sequence: StatsSequence::default(),
            }),
        }
    }

    /// Runs `f` with exclusive access to the document.
    ///
    /// Never call this across an await point.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let mut document = self
            .inner
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut document)
    }

    pub fn html(&self) -> String {
        self.with_document(|doc| doc.to_html())
    }

    /// Current location path, e.g. `/stats`.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    pub fn config(&self) -> &PageConfig {
        &self.inner.config
    }

    pub(crate) fn client(&self) -> &Client {
        &self.inner.client
    }

    pub(crate) fn stats_sequence(&self) -> &StatsSequence {
        &self.inner.stats_sequence
    }
}

fn install_keyframes(document: &mut Document) -> NodeId {
    let style = document.build("style").text(KEYFRAMES_CSS).finish();
    let head = document.head();
    if let Err(err) = document.append_child(head, style) {
        warn!("failed to install keyframes: {err}");
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_a_page_appends_keyframes_to_head() {
        let page = Page::new(Document::new(), "/", PageConfig::default());
        page.with_document(|doc| {
            let head = doc.element(doc.head()).unwrap();
            let style = *head.children().last().unwrap();
            assert_eq!(doc.element(style).unwrap().tag(), "style");
            let css = doc.text_content(style);
            for name in ["slideIn", "slideOut", "fadeIn"] {
                assert!(css.contains(&format!("@keyframes {name}")), "missing {name}");
            }
        });
    }
}
