use std::{env, path::PathBuf, time::Duration};

use crate::clock::DEFAULT_TIME_FORMAT;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/stats.json";
pub const STATS_PATH: &str = "/api/stats";

/// Server settings, read from `PORT` and `APP_DATA_PATH`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub data_path: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_path = env::var("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        Self { port, data_path }
    }
}

/// Timings and endpoints used by the page components.
#[derive(Debug, Clone)]
pub struct PageConfig {
    pub stats_url: String,
    pub clock_interval: Duration,
    pub stats_interval: Duration,
    pub notification_timeout: Duration,
    pub exit_animation: Duration,
    /// chrono format string for the clock.
    pub time_format: String,
    pub close_label: String,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::for_origin(&format!("http://127.0.0.1:{DEFAULT_PORT}"))
    }
}

impl PageConfig {
    pub fn for_origin(origin: &str) -> Self {
        Self {
            stats_url: format!("{}{STATS_PATH}", origin.trim_end_matches('/')),
            clock_interval: Duration::from_millis(1000),
            stats_interval: Duration::from_millis(30_000),
            notification_timeout: Duration::from_millis(5000),
            exit_animation: Duration::from_millis(300),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            close_label: "Close".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_url_joins_origin_without_double_slash() {
        let config = PageConfig::for_origin("http://localhost:9000/");
        assert_eq!(config.stats_url, "http://localhost:9000/api/stats");
        assert_eq!(config.notification_timeout + config.exit_animation, Duration::from_millis(5300));
    }
}
