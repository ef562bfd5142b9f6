// Dashboard statistics core: time-windowed comparisons and historical series
// over an append-only chain snapshot store.

pub mod cache;
pub mod comparison;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod series;
pub mod service;
pub mod snapshot_repo;
