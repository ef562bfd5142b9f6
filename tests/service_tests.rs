// StatsService tests: metric series assembly, provider aggregates through
// the cache, per-provider active leases

mod common;

use std::sync::Arc;

use chainstats::cache::CacheCoordinator;
use chainstats::error::Error;
use chainstats::models::{Lease, ProviderSnapshot};
use chainstats::service::StatsService;
use chainstats::snapshot_repo::SnapshotRepo;
use common::*;

fn service(repo: &Arc<SnapshotRepo>) -> StatsService {
    StatsService::new(Arc::clone(repo), CacheCoordinator::new())
}

fn provider_snap(owner: &str, check_date: i64, is_online: bool, cpu: i64) -> ProviderSnapshot {
    ProviderSnapshot {
        owner: owner.into(),
        check_date,
        is_online,
        active_cpu: cpu,
        pending_cpu: 0,
        available_cpu: 0,
        active_gpu: 1,
        pending_gpu: 0,
        available_gpu: 0,
        active_memory: 1024,
        pending_memory: 0,
        available_memory: 0,
        active_storage: 500,
        pending_storage: 0,
        available_storage: 0,
    }
}

/// Three days of closing blocks: totals 100 -> 150 -> 230 leases,
/// 1000 -> 1600 -> 2500 uakt.
async fn seed_three_days(repo: &SnapshotRepo) {
    seed_day(repo, &block(T0, 100, 100, 1000)).await;
    seed_day(repo, &block(T0 + DAY_MS, 200, 150, 1600)).await;
    seed_day(repo, &block(T0 + 2 * DAY_MS, 300, 230, 2500)).await;
}

#[tokio::test]
async fn unknown_metric_is_rejected() {
    let (_dir, repo) = temp_repo().await;
    let err = service(&repo).get_series("notAMetric").await.unwrap_err();
    assert!(matches!(err, Error::UnknownMetric(s) if s == "notAMetric"));
}

#[tokio::test]
async fn empty_store_never_yields_an_empty_series() {
    let (_dir, repo) = temp_repo().await;
    let err = service(&repo).get_series("activeCPU").await.unwrap_err();
    assert!(matches!(err, Error::InsufficientHistory));
}

#[tokio::test]
async fn daily_lease_count_series_is_deltas_of_the_cumulative_source() {
    let (_dir, repo) = temp_repo().await;
    seed_three_days(&repo).await;

    let series = service(&repo).get_series("dailyLeaseCount").await.unwrap();
    let values: Vec<i64> = series.snapshots.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![0, 50, 80]);
    assert_eq!(series.snapshots[0].date, date_of(T0));
    assert_eq!(series.snapshots[2].date, date_of(T0 + 2 * DAY_MS));
    // Current/compare come from the comparison engine, not array position.
    assert_eq!(series.current_value, 80);
    assert_eq!(series.compare_value, 50);
}

#[tokio::test]
async fn absolute_metric_series_is_raw_values() {
    let (_dir, repo) = temp_repo().await;
    seed_three_days(&repo).await;

    let series = service(&repo).get_series("totalLeaseCount").await.unwrap();
    let values: Vec<i64> = series.snapshots.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![100, 150, 230]);
    assert_eq!(series.current_value, 230);
    assert_eq!(series.compare_value, 150);
}

#[tokio::test]
async fn active_storage_series_sums_both_storage_columns() {
    let (_dir, repo) = temp_repo().await;
    seed_three_days(&repo).await;

    let series = service(&repo).get_series("activeStorage").await.unwrap();
    assert!(series.snapshots.iter().all(|p| p.value == 100));
    assert_eq!(series.current_value, 100);
    assert_eq!(series.compare_value, 100);
}

#[tokio::test]
async fn decreasing_cumulative_series_is_a_data_integrity_failure() {
    let (_dir, repo) = temp_repo().await;
    seed_day(&repo, &block(T0, 100, 100, 1000)).await;
    seed_day(&repo, &block(T0 + DAY_MS, 200, 150, 1600)).await;
    seed_day(&repo, &block(T0 + 2 * DAY_MS, 300, 120, 2500)).await;

    let err = service(&repo).get_series("dailyLeaseCount").await.unwrap_err();
    assert!(matches!(err, Error::DataIntegrity(_)));
}

#[tokio::test]
async fn dashboard_matches_latest_windows() {
    let (_dir, repo) = temp_repo().await;
    seed_three_days(&repo).await;

    let c = service(&repo).get_dashboard().await.unwrap();
    assert_eq!(c.now.height, 300);
    assert_eq!(c.now.daily_lease_count, 80);
    assert_eq!(c.compare.daily_lease_count, 50);
}

#[tokio::test]
async fn provider_series_sums_online_providers_with_latest_sample_per_day() {
    let (_dir, repo) = temp_repo().await;
    seed_day(&repo, &block(T0, 100, 100, 1000)).await;
    seed_day(&repo, &block(T0 + DAY_MS, 200, 150, 1600)).await;

    // Day 1: only provider-a online.
    repo.insert_provider_snapshot(&provider_snap("provider-a", T0 + HOUR_MS, true, 10))
        .await
        .unwrap();
    // Day 2: provider-a reports twice; only the later sample counts.
    repo.insert_provider_snapshot(&provider_snap("provider-a", T0 + DAY_MS + HOUR_MS, true, 999))
        .await
        .unwrap();
    repo.insert_provider_snapshot(&provider_snap(
        "provider-a",
        T0 + DAY_MS + 2 * HOUR_MS,
        true,
        20,
    ))
    .await
    .unwrap();
    repo.insert_provider_snapshot(&provider_snap("provider-b", T0 + DAY_MS + HOUR_MS, true, 5))
        .await
        .unwrap();
    // Offline providers never count.
    repo.insert_provider_snapshot(&provider_snap(
        "provider-c",
        T0 + DAY_MS + HOUR_MS,
        false,
        1000,
    ))
    .await
    .unwrap();

    let series = service(&repo).get_provider_series("cpu").await.unwrap();
    let values: Vec<i64> = series.snapshots.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![10, 25]);
    assert_eq!(series.current_value, 25);
    assert_eq!(series.compare_value, 10);
    assert_eq!(series.now.count, 2);
    assert_eq!(series.compare.count, 1);
    assert_eq!(series.now.cpu, 25);
}

#[tokio::test]
async fn provider_series_is_served_from_cache_within_ttl() {
    let (_dir, repo) = temp_repo().await;
    seed_day(&repo, &block(T0, 100, 100, 1000)).await;
    seed_day(&repo, &block(T0 + DAY_MS, 200, 150, 1600)).await;
    repo.insert_provider_snapshot(&provider_snap("provider-a", T0 + HOUR_MS, true, 10))
        .await
        .unwrap();
    repo.insert_provider_snapshot(&provider_snap("provider-a", T0 + DAY_MS + HOUR_MS, true, 20))
        .await
        .unwrap();

    let cache = CacheCoordinator::new();
    let svc = StatsService::new(Arc::clone(&repo), cache.clone());

    let first = svc.get_provider_series("cpu").await.unwrap();
    assert_eq!(first.current_value, 20);

    // New data lands, but the aggregate is within its staleness bound.
    repo.insert_provider_snapshot(&provider_snap("provider-b", T0 + DAY_MS + HOUR_MS, true, 50))
        .await
        .unwrap();
    let second = svc.get_provider_series("cpu").await.unwrap();
    assert_eq!(second.current_value, 20);

    // After invalidation the recompute sees it.
    cache.invalidate("provider-daily-aggregate").await;
    let third = svc.get_provider_series("cpu").await.unwrap();
    assert_eq!(third.current_value, 70);
    assert_eq!(third.now.count, 2);
}

#[tokio::test]
async fn provider_series_needs_two_days() {
    let (_dir, repo) = temp_repo().await;
    seed_day(&repo, &block(T0, 100, 100, 1000)).await;
    repo.insert_provider_snapshot(&provider_snap("provider-a", T0 + HOUR_MS, true, 10))
        .await
        .unwrap();

    let err = service(&repo).get_provider_series("cpu").await.unwrap_err();
    assert!(matches!(err, Error::InsufficientHistory));
}

#[tokio::test]
async fn active_leases_counts_open_leases_per_day() {
    let (_dir, repo) = temp_repo().await;
    seed_day(&repo, &block(T0, 100, 100, 1000)).await;
    seed_day(&repo, &block(T0 + DAY_MS, 200, 150, 1600)).await;
    seed_day(&repo, &block(T0 + 2 * DAY_MS, 300, 230, 2500)).await;

    // Open for all three days.
    repo.insert_lease(&Lease {
        id: "l1".into(),
        provider_address: "provider-a".into(),
        created_height: 100,
        closed_height: None,
        predicted_closed_height: None,
    })
    .await
    .unwrap();
    // Created by day 2's closing block, closed by day 3's.
    repo.insert_lease(&Lease {
        id: "l2".into(),
        provider_address: "provider-a".into(),
        created_height: 200,
        closed_height: Some(300),
        predicted_closed_height: None,
    })
    .await
    .unwrap();
    // Another provider's lease never counts here.
    repo.insert_lease(&Lease {
        id: "l3".into(),
        provider_address: "provider-b".into(),
        created_height: 100,
        closed_height: None,
        predicted_closed_height: None,
    })
    .await
    .unwrap();

    let series = service(&repo)
        .get_provider_active_leases("provider-a")
        .await
        .unwrap();
    let values: Vec<i64> = series.snapshots.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![1, 2, 1]);
    assert_eq!(series.current_value, 1);
    assert_eq!(series.compare_value, 2);
}
