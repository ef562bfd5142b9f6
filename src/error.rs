// Typed failures for the stats core. Zero is a valid value for every metric,
// so no operation defaults to zero on error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Metric name outside the closed set. Client-correctable.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// Not enough snapshots to satisfy a lookback window. Expected early in
    /// the store's life; callers surface this as "not enough data yet".
    #[error("insufficient history")]
    InsufficientHistory,

    /// A cumulative counter decreased between snapshots.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Store read or aggregate query failed. Transient; never cached.
    #[error("compute failed: {0}")]
    ComputeFailure(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::ComputeFailure(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
