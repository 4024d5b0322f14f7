use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::dom::{Document, DomError, NodeId};
use crate::errors::PageError;
use crate::page::Page;

pub const NOTIFICATION_CLASS: &str = "notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown severity `{0}`")]
pub struct UnknownSeverity(String);

impl Severity {
    /// Missing or unrecognized names fall back to [`Severity::Info`].
    pub fn from_name(name: Option<&str>) -> Self {
        name.and_then(|name| name.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Info => "#6366f1",
            Self::Success => "#10b981",
            Self::Warning => "#f59e0b",
            Self::Error => "#ef4444",
        }
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(UnknownSeverity(value.to_string())),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shows a toast in the top-right corner and schedules its removal.
///
/// After `notification_timeout` the toast slides out, and it is removed once
/// `exit_animation` has elapsed. Must be called from within a tokio runtime.
pub fn show_notification(
    page: &Page,
    message: &str,
    severity: Severity,
) -> Result<NodeId, PageError> {
    let toast = page.with_document(|doc| build_toast(doc, message, severity))?;
    debug!(%toast, %severity, "notification shown");

    let page = page.clone();
    tokio::spawn(async move {
        let timeout = page.config().notification_timeout;
        let exit = page.config().exit_animation;

        sleep(timeout).await;
        let animation = format!("slideOut {}s ease", exit.as_secs_f64());
        if !page.with_document(|doc| doc.set_style(toast, "animation", animation)) {
            return;
        }

        sleep(exit).await;
        page.with_document(|doc| doc.remove(toast));
        debug!(%toast, "notification removed");
    });

    Ok(toast)
}

fn build_toast(doc: &mut Document, message: &str, severity: Severity) -> Result<NodeId, DomError> {
    let toast = doc
        .build("div")
        .class(NOTIFICATION_CLASS)
        .class(severity.as_str())
        .style("position", "fixed")
        .style("top", "20px")
        .style("right", "20px")
        .style("background", severity.color())
        .style("color", "white")
        .style("padding", "15px 25px")
        .style("border-radius", "10px")
        .style("box-shadow", "0 5px 20px rgba(0, 0, 0, 0.2)")
        .style("z-index", "1000")
        .style("animation", "slideIn 0.3s ease")
        .style("max-width", "400px")
        .text(message)
        .finish();
    let body = doc.body();
    doc.append_child(body, toast)?;
    Ok(toast)
}
