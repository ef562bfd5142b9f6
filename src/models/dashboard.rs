// Request-scoped comparison view: now vs the 24h-ago window

use serde::Serialize;

/// One side of the dashboard comparison. Daily fields are already derived
/// against the next-older window by the comparison engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub date: i64,
    pub height: i64,
    pub active_lease_count: i64,
    pub total_lease_count: i64,
    pub daily_lease_count: i64,
    #[serde(rename = "totalUAktSpent")]
    pub total_uakt_spent: i64,
    #[serde(rename = "dailyUAktSpent")]
    pub daily_uakt_spent: i64,
    #[serde(rename = "activeCPU")]
    pub active_cpu: i64,
    #[serde(rename = "activeGPU")]
    pub active_gpu: i64,
    pub active_memory: i64,
    pub active_storage: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardComparison {
    pub now: DashboardSnapshot,
    pub compare: DashboardSnapshot,
}
