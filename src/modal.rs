use std::sync::Arc;

use tracing::debug;

use crate::dom::{ClickEvent, Document, DomError, NodeId};
use crate::errors::PageError;
use crate::page::Page;

pub const MODAL_CLASS: &str = "modal";

/// Appends a dismissible overlay dialog to body and returns the overlay.
///
/// `title` is shown as text. `content` is inserted as raw markup and must
/// not carry untrusted input.
pub fn show_modal(page: &Page, title: &str, content: &str) -> Result<NodeId, PageError> {
    let close_label = page.config().close_label.as_str();
    let overlay = page.with_document(|doc| build_modal(doc, title, content, close_label))?;
    debug!(%overlay, title, "modal shown");
    Ok(overlay)
}

fn build_modal(
    doc: &mut Document,
    title: &str,
    content: &str,
    close_label: &str,
) -> Result<NodeId, DomError> {
    let overlay = doc
        .build("div")
        .class(MODAL_CLASS)
        .style("position", "fixed")
        .style("top", "0")
        .style("left", "0")
        .style("right", "0")
        .style("bottom", "0")
        .style("background", "rgba(0, 0, 0, 0.5)")
        .style("display", "flex")
        .style("align-items", "center")
        .style("justify-content", "center")
        .style("z-index", "1000")
        .on_click(Arc::new(dismiss_on_backdrop))
        .finish();
    let panel = doc
        .build("div")
        .class("modal-panel")
        .style("background", "white")
        .style("padding", "30px")
        .style("border-radius", "20px")
        .style("max-width", "500px")
        .style("width", "90%")
        .style("box-shadow", "0 20px 60px rgba(0, 0, 0, 0.3)")
        .finish();
    let heading = doc
        .build("h2")
        .style("margin-bottom", "20px")
        .text(title)
        .finish();
    let body = doc
        .build("div")
        .class("modal-body")
        .style("margin-bottom", "30px")
        .markup(content)
        .finish();
    let actions = doc
        .build("div")
        .style("display", "flex")
        .style("justify-content", "flex-end")
        .style("gap", "10px")
        .finish();
    let close = doc
        .build("button")
        .class("btn")
        .text(close_label)
        .on_click(Arc::new(close_enclosing_modal))
        .finish();

    doc.append_child(actions, close)?;
    doc.append_child(panel, heading)?;
    doc.append_child(panel, body)?;
    doc.append_child(panel, actions)?;
    doc.append_child(overlay, panel)?;
    let page_body = doc.body();
    doc.append_child(page_body, overlay)?;
    Ok(overlay)
}

// Only clicks on the dimmed backdrop itself, not bubbled ones from the panel.
fn dismiss_on_backdrop(doc: &mut Document, event: &ClickEvent) {
    if event.target == event.current_target {
        doc.remove(event.current_target);
    }
}

fn close_enclosing_modal(doc: &mut Document, event: &ClickEvent) {
    if let Some(modal) = doc.closest_with_class(event.current_target, MODAL_CLASS) {
        doc.remove(modal);
    }
}
