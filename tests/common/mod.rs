// Shared test helpers
#![allow(dead_code)]

use std::sync::Arc;

use chainstats::models::BlockSnapshot;
use chainstats::snapshot_repo::SnapshotRepo;
use tempfile::TempDir;

pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const DAY_MS: i64 = 24 * HOUR_MS;
/// 2024-01-01T00:00:00Z
pub const T0: i64 = 1_704_067_200_000;

pub async fn temp_repo() -> (TempDir, Arc<SnapshotRepo>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stats.db");
    let repo = SnapshotRepo::connect(path.to_str().unwrap(), 4)
        .await
        .unwrap();
    repo.init().await.unwrap();
    (dir, Arc::new(repo))
}

pub fn block(datetime: i64, height: i64, total_leases: i64, total_spent: i64) -> BlockSnapshot {
    BlockSnapshot {
        datetime,
        height,
        is_processed: true,
        active_lease_count: 5,
        total_lease_count: total_leases,
        total_uakt_spent: total_spent,
        active_cpu: 16,
        active_gpu: 2,
        active_memory: 4096,
        active_ephemeral_storage: 30,
        active_persistent_storage: 70,
    }
}

pub fn date_of(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .unwrap()
        .format("%Y-%m-%d")
        .to_string()
}

/// Insert a block and record it as its day's closing block.
pub async fn seed_day(repo: &SnapshotRepo, s: &BlockSnapshot) {
    repo.record_closing_block(s).await.unwrap();
}
