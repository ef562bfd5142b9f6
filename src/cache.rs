// TTL cache with per-key single-flight. One leader runs the computation;
// concurrent callers for the same key fan in through a watch channel and
// receive the leader's value or its error. Failures are never cached, and an
// expired entry is treated the same as a missing one (no stale serving).

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tokio::time::{Duration, Instant};

use crate::error::{Error, Result};

type Payload = Arc<dyn Any + Send + Sync>;
type FlightResult = Option<std::result::Result<Payload, String>>;

struct CachedEntry {
    value: Payload,
    computed_at: Instant,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, CachedEntry>,
    inflight: HashMap<String, watch::Receiver<FlightResult>>,
}

/// Shared cache for expensive aggregate computations, keyed by a stable
/// identifier. Key and TTL are declared at each call site. Clones share the
/// same underlying state.
#[derive(Clone, Default)]
pub struct CacheCoordinator {
    state: Arc<Mutex<State>>,
}

impl CacheCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if younger than `ttl`, otherwise
    /// compute it. With `single_flight`, one caller per key computes while
    /// the rest wait for that result; without it, each caller computes
    /// independently. A single-flight computation runs to completion and
    /// populates the cache even if the requesting task is dropped.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        single_flight: bool,
        compute: F,
    ) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let tx = {
            let mut state = self.state.lock().await;
            if let Some(entry) = state.entries.get(key)
                && entry.computed_at.elapsed() < ttl
            {
                return downcast::<T>(&entry.value);
            }
            if !single_flight {
                None
            } else if let Some(rx) = state.inflight.get(key) {
                let mut rx = rx.clone();
                drop(state);
                return wait_for_leader::<T>(&mut rx).await;
            } else {
                let (tx, rx) = watch::channel(None);
                state.inflight.insert(key.to_string(), rx);
                Some(tx)
            }
        };

        let Some(tx) = tx else {
            // No coordination requested: compute inline and cache on success.
            let value = compute()
                .await
                .map_err(|e| Error::ComputeFailure(format!("{e:#}")))?;
            let mut state = self.state.lock().await;
            state.entries.insert(
                key.to_string(),
                CachedEntry {
                    value: Arc::new(value.clone()),
                    computed_at: Instant::now(),
                },
            );
            return Ok(value);
        };

        // Leader. The computation is spawned so it survives this request
        // being abandoned; the result lands in the cache for the next caller.
        let mut rx = tx.subscribe();
        let fut = compute();
        let this = self.clone();
        let key_owned = key.to_string();
        tokio::spawn(async move {
            let result = fut.await;
            let mut state = this.state.lock().await;
            state.inflight.remove(&key_owned);
            match result {
                Ok(value) => {
                    let payload: Payload = Arc::new(value);
                    state.entries.insert(
                        key_owned,
                        CachedEntry {
                            value: Arc::clone(&payload),
                            computed_at: Instant::now(),
                        },
                    );
                    let _ = tx.send(Some(Ok(payload)));
                }
                Err(e) => {
                    tracing::warn!(key = %key_owned, error = %e, "cached computation failed");
                    let _ = tx.send(Some(Err(format!("{e:#}"))));
                }
            }
        });
        wait_for_leader::<T>(&mut rx).await
    }

    /// Drop the entry for `key`, forcing the next call to recompute.
    pub async fn invalidate(&self, key: &str) {
        let mut state = self.state.lock().await;
        state.entries.remove(key);
    }
}

async fn wait_for_leader<T: Clone + 'static>(
    rx: &mut watch::Receiver<FlightResult>,
) -> Result<T> {
    loop {
        if let Some(result) = rx.borrow_and_update().as_ref() {
            return match result {
                Ok(payload) => downcast::<T>(payload),
                Err(msg) => Err(Error::ComputeFailure(msg.clone())),
            };
        }
        if rx.changed().await.is_err() {
            return Err(Error::ComputeFailure(
                "in-flight computation dropped without a result".into(),
            ));
        }
    }
}

fn downcast<T: Clone + 'static>(payload: &Payload) -> Result<T> {
    payload
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| Error::ComputeFailure("cache entry type mismatch".into()))
}
