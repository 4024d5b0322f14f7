pub mod app;
pub mod clock;
pub mod config;
pub mod dom;
pub mod errors;
pub mod handlers;
pub mod init;
pub mod modal;
pub mod models;
pub mod notify;
pub mod page;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;

pub use app::router;
pub use clock::update_current_time;
pub use config::{PageConfig, ServerConfig};
pub use dom::{Document, NodeId};
pub use errors::{AppError, PageError};
pub use init::{initialize, PageSession};
pub use modal::show_modal;
pub use notify::{show_notification, Severity};
pub use page::Page;
pub use state::AppState;
pub use stats::{refresh_stats, StatsRefresh};
