// Inbound surface: resolve metric keys and assemble series and comparison
// responses. The cache key and TTL for the provider aggregate are declared
// here, at the call site.

use std::str::FromStr;
use std::sync::Arc;

use tokio::time::Duration;
use tracing::instrument;

use crate::cache::CacheCoordinator;
use crate::comparison;
use crate::error::{Error, Result};
use crate::metrics::{MetricKey, ProviderMetricKey};
use crate::models::{
    ActiveLeasesSeries, DashboardComparison, MetricSeries, ProviderDailyAggregate,
    ProviderDaySummary, ProviderMetricSeries, SeriesPoint,
};
use crate::series::{daily_deltas, ensure_monotonic, latest_pair};
use crate::snapshot_repo::SnapshotRepo;

/// Cache key for the provider capacity daily aggregate; the one expensive
/// query this crate wraps.
const PROVIDER_AGGREGATE_KEY: &str = "provider-daily-aggregate";
const DEFAULT_PROVIDER_TTL: Duration = Duration::from_secs(300);

pub struct StatsService {
    repo: Arc<SnapshotRepo>,
    cache: CacheCoordinator,
    provider_ttl: Duration,
}

impl StatsService {
    pub fn new(repo: Arc<SnapshotRepo>, cache: CacheCoordinator) -> Self {
        Self {
            repo,
            cache,
            provider_ttl: DEFAULT_PROVIDER_TTL,
        }
    }

    /// Override the provider aggregate TTL (e.g. from cache.provider_ttl_secs).
    pub fn with_provider_ttl(mut self, ttl: Duration) -> Self {
        self.provider_ttl = ttl;
        self
    }

    /// Full historical series for one block metric, paired with the
    /// comparison engine's now/compare values for that key.
    #[instrument(skip(self), fields(service = "stats", operation = "get_series"))]
    pub async fn get_series(&self, key: &str) -> Result<MetricSeries> {
        let metric = MetricKey::from_str(key)?;
        let resolution = metric.resolution();

        let rows = self.repo.daily_series(resolution.columns).await?;
        if rows.is_empty() {
            return Err(Error::InsufficientHistory);
        }

        let values: Vec<i64> = rows
            .iter()
            .map(|(_, columns)| resolution.combine(columns))
            .collect();
        let values = if resolution.is_relative {
            ensure_monotonic(&values)?;
            daily_deltas(&values)
        } else {
            values
        };

        let snapshots = rows
            .iter()
            .zip(values)
            .map(|((date, _), value)| SeriesPoint {
                date: date.clone(),
                value,
            })
            .collect();

        let dashboard = comparison::compute_comparison(&self.repo).await?;
        Ok(MetricSeries {
            current_value: metric.dashboard_value(&dashboard.now),
            compare_value: metric.dashboard_value(&dashboard.compare),
            snapshots,
        })
    }

    #[instrument(skip(self), fields(service = "stats", operation = "get_dashboard"))]
    pub async fn get_dashboard(&self) -> Result<DashboardComparison> {
        comparison::compute_comparison(&self.repo).await
    }

    /// Provider capacity series from the cached daily aggregate (5-minute
    /// staleness bound, single recompute under concurrent demand).
    #[instrument(skip(self), fields(service = "stats", operation = "get_provider_series"))]
    pub async fn get_provider_series(&self, key: &str) -> Result<ProviderMetricSeries> {
        let metric = ProviderMetricKey::from_str(key)?;

        let repo = Arc::clone(&self.repo);
        let aggregates: Vec<ProviderDailyAggregate> = self
            .cache
            .get_or_compute(PROVIDER_AGGREGATE_KEY, self.provider_ttl, true, move || {
                async move { Ok(repo.provider_daily_aggregates().await?) }
            })
            .await?;

        let (current, previous) = latest_pair(&aggregates)?;
        Ok(ProviderMetricSeries {
            current_value: metric.value_of(current),
            compare_value: metric.value_of(previous),
            snapshots: aggregates
                .iter()
                .map(|day| SeriesPoint {
                    date: day.date.clone(),
                    value: metric.value_of(day),
                })
                .collect(),
            now: ProviderDaySummary::from_aggregate(current),
            compare: ProviderDaySummary::from_aggregate(previous),
        })
    }

    /// Per-day active-lease counts for one provider. Cheap enough to run
    /// uncached.
    #[instrument(skip(self), fields(service = "stats", operation = "get_provider_active_leases"))]
    pub async fn get_provider_active_leases(
        &self,
        provider_address: &str,
    ) -> Result<ActiveLeasesSeries> {
        let rows = self.repo.provider_active_leases(provider_address).await?;
        let (current, previous) = latest_pair(&rows)?;
        Ok(ActiveLeasesSeries {
            current_value: current.1,
            compare_value: previous.1,
            snapshots: rows
                .iter()
                .map(|(date, count)| SeriesPoint {
                    date: date.clone(),
                    value: *count,
                })
                .collect(),
        })
    }
}
