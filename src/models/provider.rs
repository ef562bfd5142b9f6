// Provider capacity models: raw per-check snapshots and the cached daily
// aggregate derived from them.

use serde::{Deserialize, Serialize};

/// One provider health-check sample. Written by the external checker;
/// read-only here. When a provider reports multiple times in a day, only its
/// latest sample that day counts toward the daily aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSnapshot {
    pub owner: String,
    /// Milliseconds since epoch.
    pub check_date: i64,
    pub is_online: bool,
    pub active_cpu: i64,
    pub pending_cpu: i64,
    pub available_cpu: i64,
    pub active_gpu: i64,
    pub pending_gpu: i64,
    pub available_gpu: i64,
    pub active_memory: i64,
    pub pending_memory: i64,
    pub available_memory: i64,
    pub active_storage: i64,
    pub pending_storage: i64,
    pub available_storage: i64,
}

/// One day of capacity summed across all online providers. Produced by the
/// aggregate query and held in the cache; never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDailyAggregate {
    pub date: String,
    pub cpu: i64,
    pub gpu: i64,
    pub memory: i64,
    pub storage: i64,
    pub count: i64,
}

/// Day-level summary for the provider dashboard's now/compare pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDaySummary {
    pub count: i64,
    pub cpu: i64,
    pub gpu: i64,
    pub memory: i64,
    pub storage: i64,
}

impl ProviderDaySummary {
    pub fn from_aggregate(a: &ProviderDailyAggregate) -> Self {
        Self {
            count: a.count,
            cpu: a.cpu,
            gpu: a.gpu,
            memory: a.memory,
            storage: a.storage,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetricSeries {
    pub current_value: i64,
    pub compare_value: i64,
    pub snapshots: Vec<super::SeriesPoint>,
    pub now: ProviderDaySummary,
    pub compare: ProviderDaySummary,
}

/// One lease as recorded on chain. Only the fields the per-provider
/// active-lease series needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: String,
    pub provider_address: String,
    pub created_height: i64,
    pub closed_height: Option<i64>,
    pub predicted_closed_height: Option<i64>,
}
