//! Bounded cache of open archive handles.
//!
//! Random access into a container needs its index, which is expensive to read
//! (a zip's central directory sits at the end of the file). Handles are kept
//! open between requests, keyed by archive path, and closed again on capacity
//! eviction, idle expiry or explicit invalidation.
//!
//! # Locking
//!
//! There are two levels of lock: one map lock, and one lock per slot. The map
//! lock is only ever held for bookkeeping and is never held while waiting on
//! a slot. A slot lock is held for the full duration of an open or of an
//! operation on the handle, so:
//!
//! - concurrent first requests for the same archive perform a single open,
//!   the others wait on the slot rather than spinning;
//! - an evicted handle is only closed once the operation using it returns;
//! - a failed open is not remembered, the next request tries again.

use crate::error::Result;
use derive_more::Display;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_CAPACITY: NonZeroUsize = NonZeroUsize::new(20).unwrap();
const DEFAULT_IDLE: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum number of open handles; the least recently used goes first.
    pub capacity: NonZeroUsize,
    /// Handles unused for this long are closed. A handle that is being opened
    /// or used is never idle, whatever this is set to.
    pub idle: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, idle: DEFAULT_IDLE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EvictionCause {
    #[display("capacity")]
    Capacity,
    #[display("expired")]
    Expired,
    #[display("invalidated")]
    Invalidated,
}

type Opener<H> = Box<dyn Fn(&Path) -> Result<H> + Send + Sync>;

pub struct HandleCache<H> {
    options: CacheOptions,
    open: Opener<H>,
    entries: Mutex<Entries<H>>,
}

struct Entries<H> {
    map: HashMap<PathBuf, Entry<H>>,
    tick: u64,
}

struct Entry<H> {
    slot: Arc<Slot<H>>,
    last_tick: u64,
    last_access: Instant,
}

struct Slot<H> {
    state: Mutex<State<H>>,
}

enum State<H> {
    /// Not opened yet.
    Vacant,
    Open(H),
    /// Evicted, or the open failed. Never reused; requests retry with a new slot.
    Released,
}

type Evicted<H> = (PathBuf, Arc<Slot<H>>, EvictionCause);

impl<H> HandleCache<H> {
    pub fn new(options: CacheOptions, open: impl Fn(&Path) -> Result<H> + Send + Sync + 'static) -> Self {
        Self {
            options,
            open: Box::new(open),
            entries: Mutex::new(Entries { map: HashMap::new(), tick: 0 }),
        }
    }

    pub fn options(&self) -> CacheOptions {
        self.options
    }

    /// Run `operation` against the open handle for `path`, opening it first if
    /// needed. The handle stays exclusively borrowed until `operation` returns.
    pub fn acquire<T>(&self, path: &Path, operation: impl FnOnce(&mut H) -> Result<T>) -> Result<T> {
        loop {
            let slot = self.checkout(path);
            let mut state = slot.state.lock();
            if matches!(*state, State::Vacant) {
                match (self.open)(path) {
                    Ok(handle) => {
                        tracing::debug!(path = %path.display(), "Opened archive handle");
                        *state = State::Open(handle);
                    },
                    Err(err) => {
                        // Forgotten while still locked: anyone queued on this
                        // slot will find it released and start over.
                        *state = State::Released;
                        self.forget(path, &slot);
                        return Err(err);
                    },
                }
            }
            match &mut *state {
                State::Open(handle) => return operation(handle),
                // Lost a race with eviction.
                State::Released | State::Vacant => continue,
            }
        }
    }

    /// Close the handle for `path`, if any, once its current user is done.
    pub fn invalidate(&self, path: &Path) -> bool {
        let removed = self.entries.lock().map.remove(path);
        match removed {
            Some(entry) => {
                release(path, &entry.slot, EvictionCause::Invalidated);
                true
            },
            None => false,
        }
    }

    /// Close every handle that has been idle for too long. Expiry also happens
    /// lazily on every [`acquire`](Self::acquire); this is for callers that
    /// want handles closed without further traffic.
    pub fn evict_expired(&self) -> usize {
        let evicted = {
            let mut entries = self.entries.lock();
            self.expired(&mut entries.map, Instant::now())
        };
        let count = evicted.len();
        release_all(evicted);
        count
    }

    /// Number of cached slots, including ones whose open is still in flight.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.lock().map.contains_key(path)
    }

    fn checkout(&self, path: &Path) -> Arc<Slot<H>> {
        let now = Instant::now();
        let (slot, evicted) = {
            let mut guard = self.entries.lock();
            let Entries { map, tick } = &mut *guard;
            *tick += 1;
            let mut evicted = self.expired(map, now);
            let entry = map.entry(path.to_path_buf()).or_insert_with(|| Entry {
                slot: Arc::new(Slot { state: Mutex::new(State::Vacant) }),
                last_tick: *tick,
                last_access: now,
            });
            entry.last_tick = *tick;
            entry.last_access = now;
            let slot = Arc::clone(&entry.slot);
            evicted.extend(self.overflow(map, path));
            (slot, evicted)
        };
        release_all(evicted);
        slot
    }

    /// Remove a slot whose open failed, unless it was already replaced.
    fn forget(&self, path: &Path, slot: &Arc<Slot<H>>) {
        let mut entries = self.entries.lock();
        if entries.map.get(path).is_some_and(|entry| Arc::ptr_eq(&entry.slot, slot)) {
            entries.map.remove(path);
        }
    }

    fn expired(&self, map: &mut HashMap<PathBuf, Entry<H>>, now: Instant) -> Vec<Evicted<H>> {
        let stale: Vec<PathBuf> = map
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_access) >= self.options.idle)
            // A held slot lock means an open or an operation is in flight.
            .filter(|(_, entry)| entry.slot.state.try_lock().is_some())
            .map(|(key, _)| key.clone())
            .collect();
        stale
            .into_iter()
            .filter_map(|key| map.remove(&key).map(|entry| (key, entry.slot, EvictionCause::Expired)))
            .collect()
    }

    fn overflow(&self, map: &mut HashMap<PathBuf, Entry<H>>, keep: &Path) -> Vec<Evicted<H>> {
        let mut evicted = Vec::new();
        while map.len() > self.options.capacity.get() {
            let oldest = map
                .iter()
                .filter(|(key, _)| key.as_path() != keep)
                .min_by_key(|(_, entry)| entry.last_tick)
                .map(|(key, _)| key.clone());
            let Some(key) = oldest else { break };
            if let Some(entry) = map.remove(&key) {
                evicted.push((key, entry.slot, EvictionCause::Capacity));
            }
        }
        evicted
    }
}

fn release_all<H>(evicted: Vec<Evicted<H>>) {
    for (path, slot, cause) in evicted {
        release(&path, &slot, cause);
    }
}

/// Blocks until any in-flight operation on the handle has returned.
fn release<H>(path: &Path, slot: &Slot<H>, cause: EvictionCause) {
    let mut state = slot.state.lock();
    if let State::Open(handle) = std::mem::replace(&mut *state, State::Released) {
        drop(handle);
        tracing::debug!(path = %path.display(), %cause, "Closed archive handle");
    }
}
