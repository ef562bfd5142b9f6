// Domain models for the dashboard stats core

mod dashboard;
mod provider;
mod series;
mod snapshot;

pub use dashboard::{DashboardComparison, DashboardSnapshot};
pub use provider::{
    Lease, ProviderDailyAggregate, ProviderDaySummary, ProviderMetricSeries, ProviderSnapshot,
};
pub use series::{ActiveLeasesSeries, MetricSeries, SeriesPoint};
pub use snapshot::BlockSnapshot;
