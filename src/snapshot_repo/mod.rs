// SQLite snapshot store access. Block and day reads for the dashboard and
// series paths live here; provider capacity queries are in the provider
// submodule. The store is append-only from this crate's point of view; the
// insert helpers exist for the ingestion side and tests.

pub mod provider;

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::instrument;

use crate::metrics::SnapshotColumn;
use crate::models::{BlockSnapshot, Lease, ProviderDailyAggregate, ProviderSnapshot};

const BLOCK_COLUMNS: &str = "datetime, height, is_processed, active_lease_count, \
     total_lease_count, total_uakt_spent, active_cpu, active_gpu, active_memory, \
     active_ephemeral_storage, active_persistent_storage";

pub struct SnapshotRepo {
    pool: SqlitePool,
}

impl SnapshotRepo {
    pub async fn connect(path: &str, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS block_snapshot (
                datetime INTEGER PRIMARY KEY,
                height INTEGER NOT NULL,
                is_processed INTEGER NOT NULL,
                active_lease_count INTEGER NOT NULL,
                total_lease_count INTEGER NOT NULL,
                total_uakt_spent INTEGER NOT NULL,
                active_cpu INTEGER NOT NULL,
                active_gpu INTEGER NOT NULL,
                active_memory INTEGER NOT NULL,
                active_ephemeral_storage INTEGER NOT NULL,
                active_persistent_storage INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_block_snapshot_height ON block_snapshot(height)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS day (date TEXT PRIMARY KEY, last_block_height INTEGER NOT NULL)",
        )
        .execute(&self.pool)
        .await?;

        provider::init_provider_tables(&self.pool).await?;

        Ok(())
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Latest finalized snapshot, by height. Transaction-scoped so callers
    /// can pair it with boundary lookups on the same data version.
    pub async fn latest_processed_tx(
        tx: &mut Transaction<'_, Sqlite>,
    ) -> Result<Option<BlockSnapshot>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {BLOCK_COLUMNS} FROM block_snapshot WHERE is_processed = 1 ORDER BY height DESC LIMIT 1"
        ))
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(parse_block_row).transpose()
    }

    /// Earliest snapshot whose timestamp is at or after `ts`: the first
    /// snapshot that crossed into the lookback window.
    pub async fn earliest_at_or_after_tx(
        tx: &mut Transaction<'_, Sqlite>,
        ts: i64,
    ) -> Result<Option<BlockSnapshot>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {BLOCK_COLUMNS} FROM block_snapshot WHERE datetime >= $1 ORDER BY datetime ASC LIMIT 1"
        ))
        .bind(ts)
        .fetch_optional(&mut **tx)
        .await?;
        row.as_ref().map(parse_block_row).transpose()
    }

    /// One point per day, ascending: the requested columns of each day's
    /// closing block. Values align with `columns`.
    #[instrument(skip(self, columns), fields(repo = "snapshot", operation = "daily_series"))]
    pub async fn daily_series(
        &self,
        columns: &[SnapshotColumn],
    ) -> Result<Vec<(String, Vec<i64>)>, sqlx::Error> {
        let select = columns
            .iter()
            .map(|c| format!("b.{}", c.sql_name()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT d.date AS date, {select}
             FROM day d
             INNER JOIN block_snapshot b ON b.height = d.last_block_height
             ORDER BY d.date ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let date: String = row.try_get("date")?;
            let mut values = Vec::with_capacity(columns.len());
            for c in columns {
                values.push(row.try_get::<i64, _>(c.sql_name())?);
            }
            out.push((date, values));
        }
        Ok(out)
    }

    /// Sum capacity across online providers per day. Full-table join; callers
    /// go through the cache coordinator.
    pub async fn provider_daily_aggregates(
        &self,
    ) -> Result<Vec<ProviderDailyAggregate>, sqlx::Error> {
        provider::daily_aggregates(&self.pool).await
    }

    /// Per-day active-lease counts for one provider.
    pub async fn provider_active_leases(
        &self,
        provider_address: &str,
    ) -> Result<Vec<(String, i64)>, sqlx::Error> {
        provider::active_leases(&self.pool, provider_address).await
    }

    #[instrument(skip(self, s), fields(repo = "snapshot", operation = "insert_block_snapshot", height = s.height))]
    pub async fn insert_block_snapshot(&self, s: &BlockSnapshot) -> anyhow::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO block_snapshot ({BLOCK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(s.datetime)
        .bind(s.height)
        .bind(s.is_processed)
        .bind(s.active_lease_count)
        .bind(s.total_lease_count)
        .bind(s.total_uakt_spent)
        .bind(s.active_cpu)
        .bind(s.active_gpu)
        .bind(s.active_memory)
        .bind(s.active_ephemeral_storage)
        .bind(s.active_persistent_storage)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record (or move forward) a day's closing block height.
    pub async fn upsert_day(&self, date: &str, last_block_height: i64) -> anyhow::Result<()> {
        sqlx::query("INSERT OR REPLACE INTO day (date, last_block_height) VALUES ($1, $2)")
            .bind(date)
            .bind(last_block_height)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a block and mark it as its day's closing block, in one
    /// transaction. Convenience for the ingestion side.
    #[instrument(skip(self, s), fields(repo = "snapshot", operation = "record_closing_block", height = s.height))]
    pub async fn record_closing_block(&self, s: &BlockSnapshot) -> anyhow::Result<()> {
        let date = chrono::DateTime::from_timestamp_millis(s.datetime)
            .ok_or_else(|| anyhow::anyhow!("timestamp out of range: {}", s.datetime))?
            .format("%Y-%m-%d")
            .to_string();

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!(
            "INSERT INTO block_snapshot ({BLOCK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(s.datetime)
        .bind(s.height)
        .bind(s.is_processed)
        .bind(s.active_lease_count)
        .bind(s.total_lease_count)
        .bind(s.total_uakt_spent)
        .bind(s.active_cpu)
        .bind(s.active_gpu)
        .bind(s.active_memory)
        .bind(s.active_ephemeral_storage)
        .bind(s.active_persistent_storage)
        .execute(&mut *tx)
        .await?;
        sqlx::query("INSERT OR REPLACE INTO day (date, last_block_height) VALUES ($1, $2)")
            .bind(&date)
            .bind(s.height)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_provider_snapshot(&self, ps: &ProviderSnapshot) -> anyhow::Result<()> {
        provider::insert_snapshot(&self.pool, ps).await
    }

    pub async fn insert_lease(&self, lease: &Lease) -> anyhow::Result<()> {
        provider::insert_lease(&self.pool, lease).await
    }
}

fn parse_block_row(row: &SqliteRow) -> Result<BlockSnapshot, sqlx::Error> {
    Ok(BlockSnapshot {
        datetime: row.try_get("datetime")?,
        height: row.try_get("height")?,
        is_processed: row.try_get("is_processed")?,
        active_lease_count: row.try_get("active_lease_count")?,
        total_lease_count: row.try_get("total_lease_count")?,
        total_uakt_spent: row.try_get("total_uakt_spent")?,
        active_cpu: row.try_get("active_cpu")?,
        active_gpu: row.try_get("active_gpu")?,
        active_memory: row.try_get("active_memory")?,
        active_ephemeral_storage: row.try_get("active_ephemeral_storage")?,
        active_persistent_storage: row.try_get("active_persistent_storage")?,
    })
}
