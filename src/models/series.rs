use serde::{Deserialize, Serialize};

/// One day's value in a time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Day as `YYYY-MM-DD`.
    pub date: String,
    pub value: i64,
}

/// Full historical series for one block metric plus the comparison pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    pub current_value: i64,
    pub compare_value: i64,
    pub snapshots: Vec<SeriesPoint>,
}

/// Per-day active-lease counts for one provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLeasesSeries {
    pub current_value: i64,
    pub compare_value: i64,
    pub snapshots: Vec<SeriesPoint>,
}
