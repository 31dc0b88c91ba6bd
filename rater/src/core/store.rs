//! Time-windowed mark storage.
//!
//! A mark is one observed occurrence of a `(value, class)` pair, stamped
//! with the time it was seen. The store exclusively owns the mark
//! collection: the decision path appends, windowed counts read, and bulk
//! expiry is the only deletion. The collection is intentionally volatile
//! (a restart clears all counts).

use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;

// Configuration constants
const DEFAULT_CAPACITY: usize = 1000;
const CAPACITY_OVERHEAD_FACTOR: f64 = 1.3;

/// Storage backend for timestamped marks.
///
/// Errors are reported as strings so a failing backend degrades the single
/// request that hit it instead of aborting the process; the caller decides
/// what a missing count means.
pub trait MarkStore {
    /// Append one mark for `(value, class)` at `timestamp`.
    fn record(&mut self, value: &str, class: &str, timestamp: SystemTime) -> Result<(), String>;

    /// Count marks for `(value, class)` with `timestamp > threshold`.
    ///
    /// Counting is scoped to the class: the same value tracked under two
    /// classes yields two independent counts.
    fn count_since(
        &self,
        value: &str,
        class: &str,
        threshold: SystemTime,
    ) -> Result<u64, String>;

    /// Delete every mark with `timestamp < now - age`.
    ///
    /// Returns the number of marks removed. Idempotent: purging twice with
    /// the same arguments removes nothing the second time.
    fn purge_older_than(&mut self, age: Duration, now: SystemTime) -> Result<usize, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MarkKey {
    value: String,
    class: String,
}

impl MarkKey {
    fn new(value: &str, class: &str) -> Self {
        MarkKey {
            value: value.to_string(),
            class: class.to_string(),
        }
    }
}

/// In-memory mark store keyed by `(value, class)`.
///
/// Timestamps for each key are held in insertion order. A windowed count
/// scans one key's entries; purge walks the whole table and drops keys that
/// end up empty, so idle values do not pin memory.
///
/// # Example
///
/// ```
/// use rater::{MarkStore, MemoryStore};
/// use std::time::{Duration, SystemTime};
///
/// let mut store = MemoryStore::new();
/// let now = SystemTime::now();
///
/// store.record("10.0.0.4", "ip", now).unwrap();
/// let count = store
///     .count_since("10.0.0.4", "ip", now - Duration::from_secs(90))
///     .unwrap();
/// assert_eq!(count, 1);
/// ```
pub struct MemoryStore {
    marks: HashMap<MarkKey, VecDeque<SystemTime>>,
}

impl MemoryStore {
    /// Create a new store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new store sized for `capacity` distinct `(value, class)`
    /// pairs.
    ///
    /// The map pre-allocates 30% extra space to reduce rehashing.
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryStore {
            marks: HashMap::with_capacity((capacity as f64 * CAPACITY_OVERHEAD_FACTOR) as usize),
        }
    }

    #[cfg(test)]
    pub fn mark_count(&self) -> usize {
        self.marks.values().map(|stamps| stamps.len()).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkStore for MemoryStore {
    fn record(&mut self, value: &str, class: &str, timestamp: SystemTime) -> Result<(), String> {
        self.marks
            .entry(MarkKey::new(value, class))
            .or_default()
            .push_back(timestamp);
        Ok(())
    }

    fn count_since(
        &self,
        value: &str,
        class: &str,
        threshold: SystemTime,
    ) -> Result<u64, String> {
        let count = self
            .marks
            .get(&MarkKey::new(value, class))
            .map(|stamps| stamps.iter().filter(|stamp| **stamp > threshold).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    fn purge_older_than(&mut self, age: Duration, now: SystemTime) -> Result<usize, String> {
        let cutoff = now.checked_sub(age).unwrap_or(UNIX_EPOCH);
        let mut purged = 0;

        self.marks.retain(|_, stamps| {
            let before = stamps.len();
            stamps.retain(|stamp| *stamp >= cutoff);
            purged += before - stamps.len();
            !stamps.is_empty()
        });

        Ok(purged)
    }
}
