// Per-block counter set as stored by the ingestion pipeline

use serde::{Deserialize, Serialize};

/// One closed block's counters. `total_*` fields are cumulative and never
/// decrease in timestamp order; `active_*` fields are point-in-time gauges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSnapshot {
    /// Milliseconds since epoch; monotonic and unique across snapshots.
    pub datetime: i64,
    pub height: i64,
    pub is_processed: bool,
    pub active_lease_count: i64,
    pub total_lease_count: i64,
    #[serde(rename = "totalUAktSpent")]
    pub total_uakt_spent: i64,
    #[serde(rename = "activeCPU")]
    pub active_cpu: i64,
    #[serde(rename = "activeGPU")]
    pub active_gpu: i64,
    pub active_memory: i64,
    pub active_ephemeral_storage: i64,
    pub active_persistent_storage: i64,
}

impl BlockSnapshot {
    /// Active storage is always derived from its two sub-counters at read
    /// time; there is no precombined column.
    pub fn active_storage(&self) -> i64 {
        self.active_ephemeral_storage + self.active_persistent_storage
    }
}
