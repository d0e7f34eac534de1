//! Expiring key-value registry.
//!
//! String-keyed map with a per-entry TTL. A single background sweep task owns
//! a min-heap of absolute deadlines, sleeps until the earliest one (or until
//! a `put` schedules something sooner) and evicts everything that is due.
//!
//! # Guarantees
//!
//! - `get` never returns an entry past its deadline, even if the sweep has
//!   not run yet.
//! - The expiry callback fires exactly once per natural expiry, on its own
//!   task, outside the registry lock. Explicit `delete` never fires it.
//! - Replacing or deleting a key leaves a stale heap slot behind; stale slots
//!   are recognised by generation and skipped, and the heap is rebuilt when
//!   they outnumber live entries.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::Result;

/// Sweep granularity used when a non-positive resolution is requested.
pub const DEFAULT_RESOLUTION: Duration = Duration::from_secs(20);

/// Slack before the heap is rebuilt from the live entries.
const COMPACTION_SLACK: usize = 64;

/// Invoked with `(key, last_value)` when an entry expires naturally.
pub type ExpireCallback<V> = Arc<dyn Fn(String, V) + Send + Sync>;

/// Serialized form of one entry: its value and absolute deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry<V> {
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

struct Slot<V> {
    value: V,
    expires_at: DateTime<Utc>,
    generation: u64,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    at: DateTime<Utc>,
    generation: u64,
    key: String,
}

struct State<V> {
    entries: HashMap<String, Slot<V>>,
    heap: BinaryHeap<Reverse<Deadline>>,
    next_generation: u64,
}

struct Inner<V> {
    state: Mutex<State<V>>,
    wake: Notify,
    on_expire: RwLock<Option<ExpireCallback<V>>>,
    resolution: Duration,
}

/// Expiring registry. Dropping it stops the sweep task.
pub struct TinyKv<V> {
    inner: Arc<Inner<V>>,
    sweeper: JoinHandle<()>,
}

impl<V> TinyKv<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a registry and spawn its sweep task.
    ///
    /// `resolution` bounds a single sweep sleep; zero falls back to
    /// [`DEFAULT_RESOLUTION`]. Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(resolution: Duration) -> Self {
        let resolution = if resolution.is_zero() {
            DEFAULT_RESOLUTION
        } else {
            resolution
        };
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                entries: HashMap::new(),
                heap: BinaryHeap::new(),
                next_generation: 0,
            }),
            wake: Notify::new(),
            on_expire: RwLock::new(None),
            resolution,
        });
        let sweeper = tokio::spawn(sweep(Arc::clone(&inner)));
        Self { inner, sweeper }
    }

    #[must_use]
    pub fn resolution(&self) -> Duration {
        self.inner.resolution
    }

    /// Register the natural-expiry callback, replacing any previous one.
    pub fn set_on_expire<F>(&self, callback: F)
    where
        F: Fn(String, V) + Send + Sync + 'static,
    {
        *self.inner.on_expire.write() = Some(Arc::new(callback));
    }

    /// Drop the callback; expiring entries then simply vanish.
    pub fn clear_on_expire(&self) {
        *self.inner.on_expire.write() = None;
    }

    /// Insert or replace `key`, expiring `ttl` from now.
    pub fn put(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.put_until(key, value, deadline_after(Utc::now(), ttl));
    }

    /// Insert or replace `key` with an absolute deadline.
    pub fn put_until(&self, key: impl Into<String>, value: V, expires_at: DateTime<Utc>) {
        let key = key.into();
        let earliest = {
            let mut state = self.inner.state.lock();
            let generation = state.bump_generation();
            state.entries.insert(
                key.clone(),
                Slot {
                    value,
                    expires_at,
                    generation,
                },
            );
            state.schedule(key, expires_at, generation)
        };
        if earliest {
            self.inner.wake.notify_one();
        }
    }

    /// Push the deadline of a live `key` to `ttl` from now, keeping its value.
    ///
    /// Returns false, and changes nothing, if `key` is absent or already past
    /// its deadline. An expired entry is never brought back.
    pub fn touch(&self, key: &str, ttl: Duration) -> bool {
        let now = Utc::now();
        let expires_at = deadline_after(now, ttl);
        let earliest = {
            let mut state = self.inner.state.lock();
            let live = state
                .entries
                .get(key)
                .is_some_and(|slot| slot.expires_at > now);
            if !live {
                return false;
            }
            let generation = state.bump_generation();
            if let Some(slot) = state.entries.get_mut(key) {
                slot.expires_at = expires_at;
                slot.generation = generation;
            }
            state.schedule(key.to_string(), expires_at, generation)
        };
        if earliest {
            self.inner.wake.notify_one();
        }
        true
    }

    /// Value for `key` unless absent or already past its deadline.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Utc::now();
        let state = self.inner.state.lock();
        state
            .entries
            .get(key)
            .filter(|slot| slot.expires_at > now)
            .map(|slot| slot.value.clone())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key` now. The expiry callback is not invoked.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.inner.state.lock();
        let removed = state.entries.remove(key).is_some();
        state.compact_if_needed();
        removed
    }

    /// Live keys at this instant.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }

    /// Live values at this instant.
    #[must_use]
    pub fn values(&self) -> Vec<V> {
        self.entries().into_iter().map(|(_, value)| value).collect()
    }

    /// Live `(key, value)` pairs at this instant.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, V)> {
        let now = Utc::now();
        let state = self.inner.state.lock();
        state
            .entries
            .iter()
            .filter(|(_, slot)| slot.expires_at > now)
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live entries with their absolute deadlines.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, StoredEntry<V>> {
        let now = Utc::now();
        let state = self.inner.state.lock();
        state
            .entries
            .iter()
            .filter(|(_, slot)| slot.expires_at > now)
            .map(|(key, slot)| {
                (
                    key.clone(),
                    StoredEntry {
                        value: slot.value.clone(),
                        expires_at: slot.expires_at,
                    },
                )
            })
            .collect()
    }

    /// Load entries, dropping any whose deadline has already passed.
    ///
    /// Dropped entries do not fire the expiry callback. Returns the number
    /// of entries kept.
    pub fn restore(&self, entries: BTreeMap<String, StoredEntry<V>>) -> usize {
        let now = Utc::now();
        let mut kept = 0;
        for (key, entry) in entries {
            if entry.expires_at <= now {
                trace!(key = %key, "Dropping expired entry on restore");
                continue;
            }
            self.put_until(key, entry.value, entry.expires_at);
            kept += 1;
        }
        kept
    }

    /// Serialize live entries as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails to serialize.
    pub fn marshal_json(&self) -> Result<Vec<u8>>
    where
        V: Serialize,
    {
        Ok(serde_json::to_vec(&self.snapshot())?)
    }

    /// Restore entries from JSON produced by [`marshal_json`](Self::marshal_json).
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not valid JSON for this value type.
    pub fn unmarshal_json(&self, bytes: &[u8]) -> Result<usize>
    where
        V: DeserializeOwned,
    {
        let entries: BTreeMap<String, StoredEntry<V>> = serde_json::from_slice(bytes)?;
        Ok(self.restore(entries))
    }
}

impl<V> Drop for TinyKv<V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

impl<V> State<V> {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Push a heap slot; true if it is now the earliest deadline.
    fn schedule(&mut self, key: String, at: DateTime<Utc>, generation: u64) -> bool {
        self.heap.push(Reverse(Deadline {
            at,
            generation,
            key,
        }));
        self.compact_if_needed();
        self.heap
            .peek()
            .is_some_and(|Reverse(top)| top.generation == generation)
    }

    fn compact_if_needed(&mut self) {
        if self.heap.len() <= self.entries.len() * 2 + COMPACTION_SLACK {
            return;
        }
        self.heap = self
            .entries
            .iter()
            .map(|(key, slot)| {
                Reverse(Deadline {
                    at: slot.expires_at,
                    generation: slot.generation,
                    key: key.clone(),
                })
            })
            .collect();
    }

    /// Pop every due deadline; return the live entries it evicted and the
    /// next deadline still scheduled.
    fn take_expired(&mut self, now: DateTime<Utc>) -> (Vec<(String, V)>, Option<DateTime<Utc>>) {
        let mut expired = Vec::new();
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.at > now {
                return (expired, Some(top.at));
            }
            let Some(Reverse(due)) = self.heap.pop() else {
                break;
            };
            let live = self
                .entries
                .get(&due.key)
                .is_some_and(|slot| slot.generation == due.generation);
            if live {
                if let Some(slot) = self.entries.remove(&due.key) {
                    expired.push((due.key, slot.value));
                }
            }
        }
        (expired, None)
    }
}

fn deadline_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

async fn sweep<V>(inner: Arc<Inner<V>>)
where
    V: Clone + Send + Sync + 'static,
{
    loop {
        let now = Utc::now();
        let (expired, next) = inner.state.lock().take_expired(now);

        if !expired.is_empty() {
            debug!(count = expired.len(), "Entries expired");
            let callback = inner.on_expire.read().clone();
            if let Some(callback) = callback {
                for (key, value) in expired {
                    let callback = Arc::clone(&callback);
                    tokio::spawn(async move { callback(key, value) });
                }
            }
        }

        let wait = next
            .and_then(|at| (at - now).to_std().ok())
            .map_or(inner.resolution, |until| until.min(inner.resolution));

        tokio::select! {
            () = inner.wake.notified() => {}
            () = tokio::time::sleep(wait) => {}
        }
    }
}
