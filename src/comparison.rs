// Comparison window engine: the single source of truth for "now vs 24h ago
// vs 48h ago". Boundary rule: earliest snapshot at or after the lookback
// cutoff, i.e. the first snapshot that crossed into the window. Stable even
// when snapshots are irregularly spaced.

use crate::error::{Error, Result};
use crate::models::{BlockSnapshot, DashboardComparison, DashboardSnapshot};
use crate::snapshot_repo::SnapshotRepo;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// latest processed snapshot vs the 24h and 48h windows, read inside one
/// transaction so all three lookups observe the same store version.
pub async fn compute_comparison(repo: &SnapshotRepo) -> Result<DashboardComparison> {
    let mut tx = repo.begin().await?;

    let now = SnapshotRepo::latest_processed_tx(&mut tx)
        .await?
        .ok_or(Error::InsufficientHistory)?;
    let compare_24h = SnapshotRepo::earliest_at_or_after_tx(&mut tx, now.datetime - DAY_MS)
        .await?
        .ok_or(Error::InsufficientHistory)?;
    let compare_48h = SnapshotRepo::earliest_at_or_after_tx(&mut tx, now.datetime - 2 * DAY_MS)
        .await?
        .ok_or(Error::InsufficientHistory)?;

    tx.commit().await?;

    Ok(DashboardComparison {
        now: comparison_side(&now, &compare_24h)?,
        compare: comparison_side(&compare_24h, &compare_48h)?,
    })
}

/// One side of the comparison: `snapshot`'s fields plus daily changes of the
/// cumulative counters against the next-older window.
fn comparison_side(
    snapshot: &BlockSnapshot,
    against: &BlockSnapshot,
) -> Result<DashboardSnapshot> {
    Ok(DashboardSnapshot {
        date: snapshot.datetime,
        height: snapshot.height,
        active_lease_count: snapshot.active_lease_count,
        total_lease_count: snapshot.total_lease_count,
        daily_lease_count: daily_change(
            "total_lease_count",
            snapshot.total_lease_count,
            against.total_lease_count,
        )?,
        total_uakt_spent: snapshot.total_uakt_spent,
        daily_uakt_spent: daily_change(
            "total_uakt_spent",
            snapshot.total_uakt_spent,
            against.total_uakt_spent,
        )?,
        active_cpu: snapshot.active_cpu,
        active_gpu: snapshot.active_gpu,
        active_memory: snapshot.active_memory,
        active_storage: snapshot.active_storage(),
    })
}

/// Change of a cumulative counter across the window. A decrease means the
/// store is corrupt, not that the metric went negative.
fn daily_change(field: &str, now: i64, compare: i64) -> Result<i64> {
    if now < compare {
        return Err(Error::DataIntegrity(format!(
            "{field} decreased across window: {compare} -> {now}"
        )));
    }
    Ok(now - compare)
}
