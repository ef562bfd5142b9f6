// Metric registry: closed key set -> which snapshot columns feed it, whether
// the series is a period-over-period delta, and how columns combine.

use std::str::FromStr;

use crate::error::Error;
use crate::models::{DashboardSnapshot, ProviderDailyAggregate};

/// The closed set of block metrics the dashboard can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    ActiveLeaseCount,
    TotalLeaseCount,
    DailyLeaseCount,
    TotalUaktSpent,
    DailyUaktSpent,
    ActiveCpu,
    ActiveGpu,
    ActiveMemory,
    ActiveStorage,
}

/// Raw snapshot columns a metric can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotColumn {
    ActiveLeaseCount,
    TotalLeaseCount,
    TotalUaktSpent,
    ActiveCpu,
    ActiveGpu,
    ActiveMemory,
    ActiveEphemeralStorage,
    ActivePersistentStorage,
}

impl SnapshotColumn {
    pub fn sql_name(self) -> &'static str {
        match self {
            SnapshotColumn::ActiveLeaseCount => "active_lease_count",
            SnapshotColumn::TotalLeaseCount => "total_lease_count",
            SnapshotColumn::TotalUaktSpent => "total_uakt_spent",
            SnapshotColumn::ActiveCpu => "active_cpu",
            SnapshotColumn::ActiveGpu => "active_gpu",
            SnapshotColumn::ActiveMemory => "active_memory",
            SnapshotColumn::ActiveEphemeralStorage => "active_ephemeral_storage",
            SnapshotColumn::ActivePersistentStorage => "active_persistent_storage",
        }
    }
}

/// How a metric maps onto raw columns. `columns` is what the store must
/// read; `is_relative` marks a cumulative source whose series must be
/// converted to per-period deltas (and only such a source).
#[derive(Debug, Clone, Copy)]
pub struct MetricResolution {
    pub columns: &'static [SnapshotColumn],
    pub is_relative: bool,
}

impl MetricResolution {
    /// Combine one row's column values into a single scalar. Identity for a
    /// single column, sum for composites.
    pub fn combine(&self, values: &[i64]) -> i64 {
        values.iter().sum()
    }
}

impl MetricKey {
    pub fn resolution(self) -> MetricResolution {
        use SnapshotColumn::*;
        match self {
            // Daily metrics read the underlying cumulative column.
            MetricKey::DailyLeaseCount => MetricResolution {
                columns: &[TotalLeaseCount],
                is_relative: true,
            },
            MetricKey::DailyUaktSpent => MetricResolution {
                columns: &[TotalUaktSpent],
                is_relative: true,
            },
            // Composite: ephemeral + persistent, summed per row.
            MetricKey::ActiveStorage => MetricResolution {
                columns: &[ActiveEphemeralStorage, ActivePersistentStorage],
                is_relative: false,
            },
            MetricKey::ActiveLeaseCount => MetricResolution {
                columns: &[ActiveLeaseCount],
                is_relative: false,
            },
            MetricKey::TotalLeaseCount => MetricResolution {
                columns: &[TotalLeaseCount],
                is_relative: false,
            },
            MetricKey::TotalUaktSpent => MetricResolution {
                columns: &[TotalUaktSpent],
                is_relative: false,
            },
            MetricKey::ActiveCpu => MetricResolution {
                columns: &[ActiveCpu],
                is_relative: false,
            },
            MetricKey::ActiveGpu => MetricResolution {
                columns: &[ActiveGpu],
                is_relative: false,
            },
            MetricKey::ActiveMemory => MetricResolution {
                columns: &[ActiveMemory],
                is_relative: false,
            },
        }
    }

    /// Comparison-side value for this key. The comparison engine already
    /// derived the daily fields, so every key is a plain field read here.
    pub fn dashboard_value(self, side: &DashboardSnapshot) -> i64 {
        match self {
            MetricKey::ActiveLeaseCount => side.active_lease_count,
            MetricKey::TotalLeaseCount => side.total_lease_count,
            MetricKey::DailyLeaseCount => side.daily_lease_count,
            MetricKey::TotalUaktSpent => side.total_uakt_spent,
            MetricKey::DailyUaktSpent => side.daily_uakt_spent,
            MetricKey::ActiveCpu => side.active_cpu,
            MetricKey::ActiveGpu => side.active_gpu,
            MetricKey::ActiveMemory => side.active_memory,
            MetricKey::ActiveStorage => side.active_storage,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetricKey::ActiveLeaseCount => "activeLeaseCount",
            MetricKey::TotalLeaseCount => "totalLeaseCount",
            MetricKey::DailyLeaseCount => "dailyLeaseCount",
            MetricKey::TotalUaktSpent => "totalUAktSpent",
            MetricKey::DailyUaktSpent => "dailyUAktSpent",
            MetricKey::ActiveCpu => "activeCPU",
            MetricKey::ActiveGpu => "activeGPU",
            MetricKey::ActiveMemory => "activeMemory",
            MetricKey::ActiveStorage => "activeStorage",
        }
    }
}

impl FromStr for MetricKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(match s {
            "activeLeaseCount" => MetricKey::ActiveLeaseCount,
            "totalLeaseCount" => MetricKey::TotalLeaseCount,
            "dailyLeaseCount" => MetricKey::DailyLeaseCount,
            "totalUAktSpent" => MetricKey::TotalUaktSpent,
            "dailyUAktSpent" => MetricKey::DailyUaktSpent,
            "activeCPU" => MetricKey::ActiveCpu,
            "activeGPU" => MetricKey::ActiveGpu,
            "activeMemory" => MetricKey::ActiveMemory,
            "activeStorage" => MetricKey::ActiveStorage,
            _ => return Err(Error::UnknownMetric(s.to_string())),
        })
    }
}

/// The closed set of provider capacity metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderMetricKey {
    Cpu,
    Gpu,
    Memory,
    Storage,
    Count,
}

impl ProviderMetricKey {
    pub fn value_of(self, day: &ProviderDailyAggregate) -> i64 {
        match self {
            ProviderMetricKey::Cpu => day.cpu,
            ProviderMetricKey::Gpu => day.gpu,
            ProviderMetricKey::Memory => day.memory,
            ProviderMetricKey::Storage => day.storage,
            ProviderMetricKey::Count => day.count,
        }
    }
}

impl FromStr for ProviderMetricKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(match s {
            "cpu" => ProviderMetricKey::Cpu,
            "gpu" => ProviderMetricKey::Gpu,
            "memory" => ProviderMetricKey::Memory,
            "storage" => ProviderMetricKey::Storage,
            "count" => ProviderMetricKey::Count,
            _ => return Err(Error::UnknownMetric(s.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_metrics_resolve_to_cumulative_source() {
        let r = MetricKey::DailyLeaseCount.resolution();
        assert_eq!(r.columns, &[SnapshotColumn::TotalLeaseCount]);
        assert!(r.is_relative);

        let r = MetricKey::DailyUaktSpent.resolution();
        assert_eq!(r.columns, &[SnapshotColumn::TotalUaktSpent]);
        assert!(r.is_relative);
    }

    #[test]
    fn active_storage_is_composite_sum() {
        let r = MetricKey::ActiveStorage.resolution();
        assert_eq!(
            r.columns,
            &[
                SnapshotColumn::ActiveEphemeralStorage,
                SnapshotColumn::ActivePersistentStorage
            ]
        );
        assert!(!r.is_relative);
        assert_eq!(r.combine(&[30, 70]), 100);
    }

    #[test]
    fn default_metrics_are_identity() {
        let r = MetricKey::ActiveCpu.resolution();
        assert_eq!(r.columns, &[SnapshotColumn::ActiveCpu]);
        assert!(!r.is_relative);
        assert_eq!(r.combine(&[42]), 42);
    }

    #[test]
    fn unknown_key_fails() {
        let err = "bogusMetric".parse::<MetricKey>().unwrap_err();
        assert!(matches!(err, Error::UnknownMetric(s) if s == "bogusMetric"));
    }

    #[test]
    fn wire_names_round_trip() {
        for key in [
            MetricKey::ActiveLeaseCount,
            MetricKey::TotalLeaseCount,
            MetricKey::DailyLeaseCount,
            MetricKey::TotalUaktSpent,
            MetricKey::DailyUaktSpent,
            MetricKey::ActiveCpu,
            MetricKey::ActiveGpu,
            MetricKey::ActiveMemory,
            MetricKey::ActiveStorage,
        ] {
            assert_eq!(key.as_str().parse::<MetricKey>().unwrap(), key);
        }
    }

    #[test]
    fn provider_key_parses() {
        assert_eq!(
            "storage".parse::<ProviderMetricKey>().unwrap(),
            ProviderMetricKey::Storage
        );
        assert!("disk".parse::<ProviderMetricKey>().is_err());
    }
}
