use crate::errors::AppError;
use crate::models::StatsSnapshot;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the stats file. A missing file means nothing has been counted yet.
pub async fn load_stats(path: &Path) -> Result<StatsSnapshot, AppError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(StatsSnapshot::default()),
        Err(err) => Err(err.into()),
    }
}

pub async fn load_stats_or_default(path: &Path) -> StatsSnapshot {
    match load_stats(path).await {
        Ok(stats) => stats,
        Err(err) => {
            error!("failed to load stats from {}: {}", path.display(), err.message);
            StatsSnapshot::default()
        }
    }
}
