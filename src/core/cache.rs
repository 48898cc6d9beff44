//! Single-flight, TTL-bounded memo cache keyed by symbol.
//!
//! At most one computation per key is in flight at any time; concurrent
//! callers for the same key wait on that computation and share its result.
//! Only successful results are stored. Entries expire `ttl` after insertion
//! and the oldest inserted entry is evicted once `capacity` keys are held.

use crate::core::config::CacheConfig;
use crate::core::error::PriceError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type Flight<V> = Shared<BoxFuture<'static, Result<V, PriceError>>>;

enum Lookup<V> {
    Cached(V),
    Pending(Flight<V>),
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    generation: u64,
}

struct Inner<V> {
    entries: DashMap<String, CacheEntry<V>>,
    in_flight: DashMap<String, Flight<V>>,
    // (key, generation) in insertion order; records whose generation no
    // longer matches the live entry are stale and skipped.
    insertion_order: Mutex<VecDeque<(String, u64)>>,
    next_generation: AtomicU64,
    ttl: Duration,
    capacity: usize,
}

impl<V> Inner<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) >= self.ttl
    }

    fn get_live(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if !self.is_expired(&entry, now) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }

        if self
            .entries
            .remove_if(key, |_, entry| self.is_expired(entry, now))
            .is_some()
        {
            debug!("Cache entry expired for key: {}", key);
        }
        None
    }

    fn insert(&self, key: String, value: V) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut order = self
            .insertion_order
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !self.entries.contains_key(&key) {
            while self.entries.len() >= self.capacity {
                let Some((oldest, oldest_generation)) = order.pop_front() else {
                    break;
                };
                if self
                    .entries
                    .remove_if(&oldest, |_, entry| entry.generation == oldest_generation)
                    .is_some()
                {
                    debug!("Cache EVICT for key: {}", oldest);
                }
            }
        }

        debug!("Cache PUT for key: {}", key);
        self.entries.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                generation,
            },
        );
        order.push_back((key, generation));

        if order.len() > self.capacity.saturating_mul(2) {
            order.retain(|(key, generation)| {
                self.entries
                    .get(key)
                    .is_some_and(|entry| entry.generation == *generation)
            });
        }
    }
}

/// Clears the in-flight marker once its computation ends, including by panic.
struct FlightGuard<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<V>>,
    key: String,
}

impl<V> Drop for FlightGuard<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.inner.in_flight.remove(&self.key);
    }
}

#[derive(Clone)]
pub struct SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Inner<V>>,
}

impl<V> SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                insertion_order: Mutex::new(VecDeque::new()),
                next_generation: AtomicU64::new(0),
                ttl,
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.capacity)
    }

    /// Returns the cached value for `key`, or runs `compute` to produce it.
    ///
    /// If another caller is already computing `key`, this waits for that
    /// computation instead of starting a new one. The computation runs as its
    /// own task, so it finishes and fills the cache even if every caller
    /// stops waiting. Errors are shared with all waiters and never stored.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<V, PriceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, PriceError>> + Send + 'static,
    {
        let flight = match self.claim(key, compute) {
            Lookup::Cached(value) => return Ok(value),
            Lookup::Pending(flight) => flight,
        };

        flight
            .await
            .map_err(|source| PriceError::CacheComputationFailed {
                key: key.to_string(),
                source: Box::new(source),
            })
    }

    fn claim<F, Fut>(&self, key: &str, compute: F) -> Lookup<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, PriceError>> + Send + 'static,
    {
        if let Some(value) = self.inner.get_live(key) {
            debug!("Cache HIT for key: {}", key);
            return Lookup::Cached(value);
        }

        match self.inner.in_flight.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Joining in-flight lookup for key: {}", key);
                Lookup::Pending(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                // A flight may have completed between the first read and the claim.
                if let Some(value) = self.inner.get_live(key) {
                    debug!("Cache HIT for key: {}", key);
                    return Lookup::Cached(value);
                }
                debug!("Cache MISS for key: {}", key);
                let flight = self.start_flight(key.to_string(), compute());
                entry.insert(flight.clone());
                Lookup::Pending(flight)
            }
        }
    }

    fn start_flight<Fut>(&self, key: String, computation: Fut) -> Flight<V>
    where
        Fut: Future<Output = Result<V, PriceError>> + Send + 'static,
    {
        let guard = FlightGuard {
            inner: Arc::clone(&self.inner),
            key,
        };
        let task = tokio::spawn(async move {
            let result = computation.await;
            if let Ok(value) = &result {
                guard.inner.insert(guard.key.clone(), value.clone());
            }
            drop(guard);
            result
        });

        async move {
            task.await.unwrap_or_else(|e| {
                Err(PriceError::SourceUnavailable(format!(
                    "price lookup task failed: {e}"
                )))
            })
        }
        .boxed()
        .shared()
    }

    /// Copy of the live entries. Does not purge or refresh anything.
    pub fn snapshot(&self) -> HashMap<String, V> {
        let now = Instant::now();
        self.inner
            .entries
            .iter()
            .filter(|entry| !self.inner.is_expired(entry.value(), now))
            .map(|entry| (entry.key().clone(), entry.value().value.clone()))
            .collect()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl<V> Default for SingleFlightCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}
