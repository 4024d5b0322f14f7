use serde::{Deserialize, Serialize};

/// Counters shown on the dashboard, as stored in the data file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StatsSnapshot {
    pub total_users: u64,
    pub total_messages: u64,
    pub active_users: u64,
    pub total_payments: u64,
}

impl StatsSnapshot {
    /// `(stat key, label, value)` in display order.
    pub fn entries(&self) -> [(&'static str, &'static str, u64); 4] {
        [
            ("total_users", "Total users", self.total_users),
            ("total_messages", "Total messages", self.total_messages),
            ("active_users", "Active users", self.active_users),
            ("total_payments", "Completed payments", self.total_payments),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    pub timestamp: String,
}
