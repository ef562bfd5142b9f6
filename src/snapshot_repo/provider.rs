// Provider capacity queries: schema for the provider tables plus the daily
// aggregate and per-provider active-lease SQL. DB access for block/day data
// stays in snapshot_repo::mod.

use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::models::{Lease, ProviderDailyAggregate, ProviderSnapshot};

/// Creates the provider_snapshot and lease tables and indexes if not present.
pub async fn init_provider_tables(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provider_snapshot (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            check_date INTEGER NOT NULL,
            is_online INTEGER NOT NULL,
            active_cpu INTEGER NOT NULL,
            pending_cpu INTEGER NOT NULL,
            available_cpu INTEGER NOT NULL,
            active_gpu INTEGER NOT NULL,
            pending_gpu INTEGER NOT NULL,
            available_gpu INTEGER NOT NULL,
            active_memory INTEGER NOT NULL,
            pending_memory INTEGER NOT NULL,
            available_memory INTEGER NOT NULL,
            active_storage INTEGER NOT NULL,
            pending_storage INTEGER NOT NULL,
            available_storage INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_provider_snapshot_owner_check_date ON provider_snapshot(owner, check_date)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lease (
            id TEXT PRIMARY KEY,
            provider_address TEXT NOT NULL,
            created_height INTEGER NOT NULL,
            closed_height INTEGER,
            predicted_closed_height INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_lease_provider_address ON lease(provider_address)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Capacity summed across providers online that day, one row per day,
/// ascending. A provider reporting multiple times in a day counts once: its
/// latest sample that day.
#[instrument(skip(pool), fields(repo = "provider", operation = "daily_aggregates"))]
pub async fn daily_aggregates(
    pool: &SqlitePool,
) -> Result<Vec<ProviderDailyAggregate>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT d.date AS date,
               SUM(ps.active_cpu + ps.pending_cpu + ps.available_cpu) AS cpu,
               SUM(ps.active_gpu + ps.pending_gpu + ps.available_gpu) AS gpu,
               SUM(ps.active_memory + ps.pending_memory + ps.available_memory) AS memory,
               SUM(ps.active_storage + ps.pending_storage + ps.available_storage) AS storage,
               COUNT(*) AS count
        FROM day d
        INNER JOIN provider_snapshot ps
            ON date(ps.check_date / 1000, 'unixepoch') = d.date
           AND ps.is_online = 1
           AND ps.check_date = (
               SELECT MAX(p2.check_date)
               FROM provider_snapshot p2
               WHERE p2.owner = ps.owner
                 AND date(p2.check_date / 1000, 'unixepoch') = d.date
           )
        GROUP BY d.date
        ORDER BY d.date ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(ProviderDailyAggregate {
            date: row.try_get("date")?,
            cpu: row.try_get("cpu")?,
            gpu: row.try_get("gpu")?,
            memory: row.try_get("memory")?,
            storage: row.try_get("storage")?,
            count: row.try_get("count")?,
        });
    }
    Ok(out)
}

/// Active leases per day for one provider: created at or before the day's
/// closing block and not yet (or not predicted to be) closed by it. Days
/// without a matching lease count zero.
#[instrument(skip(pool), fields(repo = "provider", operation = "active_leases"))]
pub async fn active_leases(
    pool: &SqlitePool,
    provider_address: &str,
) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT d.date AS date, COUNT(l.id) AS count
        FROM day d
        LEFT JOIN lease l
            ON l.provider_address = $1
           AND l.created_height <= d.last_block_height
           AND (l.closed_height IS NULL OR l.closed_height > d.last_block_height)
           AND (l.predicted_closed_height IS NULL OR l.predicted_closed_height > d.last_block_height)
        GROUP BY d.date
        ORDER BY d.date ASC
        "#,
    )
    .bind(provider_address)
    .fetch_all(pool)
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push((row.try_get("date")?, row.try_get("count")?));
    }
    Ok(out)
}

pub async fn insert_snapshot(pool: &SqlitePool, ps: &ProviderSnapshot) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO provider_snapshot
            (owner, check_date, is_online,
             active_cpu, pending_cpu, available_cpu,
             active_gpu, pending_gpu, available_gpu,
             active_memory, pending_memory, available_memory,
             active_storage, pending_storage, available_storage)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(&ps.owner)
    .bind(ps.check_date)
    .bind(ps.is_online)
    .bind(ps.active_cpu)
    .bind(ps.pending_cpu)
    .bind(ps.available_cpu)
    .bind(ps.active_gpu)
    .bind(ps.pending_gpu)
    .bind(ps.available_gpu)
    .bind(ps.active_memory)
    .bind(ps.pending_memory)
    .bind(ps.available_memory)
    .bind(ps.active_storage)
    .bind(ps.pending_storage)
    .bind(ps.available_storage)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn insert_lease(pool: &SqlitePool, lease: &Lease) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO lease (id, provider_address, created_height, closed_height, predicted_closed_height)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&lease.id)
    .bind(&lease.provider_address)
    .bind(lease.created_height)
    .bind(lease.closed_height)
    .bind(lease.predicted_closed_height)
    .execute(pool)
    .await?;
    Ok(())
}
