use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::update_current_time;
use crate::dom::{Document, NodeId};
use crate::page::Page;
use crate::stats::refresh_stats;

pub const NAV_TAB_CLASS: &str = "nav-tab";
pub const ACTIVE_CLASS: &str = "active";
pub const ENTRY_ANIMATION: &str = "fadeIn 0.5s ease";

/// Timers started by [`initialize`]. Dropping the session stops them along
/// with any stats fetch they started.
#[derive(Debug)]
pub struct PageSession {
    timers: Vec<JoinHandle<()>>,
}

impl PageSession {
    /// Stops every timer and pending fetch, as navigating away from the page would.
    pub fn unload(self) {}
}

impl Drop for PageSession {
    fn drop(&mut self) {
        for timer in &self.timers {
            timer.abort();
        }
    }
}

/// Runs the page-load transition. Must be called from within a tokio runtime.
pub fn initialize(page: &Page) -> PageSession {
    update_current_time(page);
    let clock = spawn_clock(page.clone());
    let stats = spawn_stats_poller(page.clone());

    let active = page.with_document(|doc| {
        let body = doc.body();
        doc.set_style(body, "animation", ENTRY_ANIMATION);
        highlight_active_tab(doc, page.path())
    });
    info!(path = page.path(), active_tabs = active.len(), "page initialized");

    PageSession {
        timers: vec![clock, stats],
    }
}

/// Marks every `.nav-tab` whose `href` points at `path` as active.
///
/// An empty path is treated as the root, so a `/` tab matches it as well.
pub fn highlight_active_tab(doc: &mut Document, path: &str) -> Vec<NodeId> {
    let matching: Vec<NodeId> = doc
        .elements_with_class(NAV_TAB_CLASS)
        .into_iter()
        .filter(|id| {
            doc.element(*id)
                .and_then(|tab| tab.attribute("href"))
                .is_some_and(|href| href == path || (href == "/" && path.is_empty()))
        })
        .collect();
    for tab in &matching {
        doc.add_class(*tab, ACTIVE_CLASS);
    }
    matching
}

fn spawn_clock(page: Page) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = page.config().clock_interval;
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            update_current_time(&page);
        }
    })
}

// Refreshes overlap like browser intervals do. They live in the poller's
// JoinSet, so aborting the poller cancels any fetch still in flight.
fn spawn_stats_poller(page: Page) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = page.config().stats_interval;
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let page = page.clone();
                    in_flight.spawn(async move {
                        if refresh_stats(&page).await.is_err() {
                            debug!("stats poll failed, keeping previous values");
                        }
                    });
                }
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }
    })
}
