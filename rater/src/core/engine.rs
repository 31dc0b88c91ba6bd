//! The per-request decision algorithm.
//!
//! One request line comes in, one [`Verdict`] comes out. There is no state
//! machine beyond this: each request is independent, and its only lasting
//! effect is the mark it records.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::catalog::LimitCatalog;
use super::store::MarkStore;

/// The engine's structured decision for one request line.
///
/// `Display` renders the wire report: a status code (`0` allowed, `1` rate
/// exceeded, `2` error) followed by the detail text. The report texts are
/// stable: clients parse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The windowed count is within the matched key's limit.
    Allowed { count: u64, limit: u64 },
    /// The windowed count is over the matched key's limit.
    Exceeded { count: u64, limit: u64 },
    /// The request line had no space separator.
    BadInput,
    /// The class name is not in the catalog; carries the raw request line.
    UnknownClass(String),
    /// The class exists but no key pattern matched the value.
    NoMatchingKey(String),
    /// The mark store failed; the request fails closed. The reason is for
    /// logging and is never sent to the client.
    Unavailable(String),
}

impl Verdict {
    /// Leading status code of the wire report.
    pub fn code(&self) -> u8 {
        match self {
            Verdict::Allowed { .. } => 0,
            Verdict::Exceeded { .. } => 1,
            Verdict::BadInput
            | Verdict::UnknownClass(_)
            | Verdict::NoMatchingKey(_)
            | Verdict::Unavailable(_) => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Allowed { count, limit } => write!(f, "0 {count}/{limit}"),
            Verdict::Exceeded { count, limit } => write!(f, "1 {count}/{limit}"),
            Verdict::BadInput => write!(f, "2 Bad Input (no space)"),
            Verdict::UnknownClass(line) => write!(f, "2 Class not found: {line}"),
            Verdict::NoMatchingKey(value) => write!(f, "2 No matching key: {value}"),
            Verdict::Unavailable(_) => write!(f, "2 Rate check unavailable"),
        }
    }
}

/// Matches request lines against the limit catalog and keeps usage counts
/// in the mark store.
///
/// The catalog and the store are construction-time dependencies; the engine
/// holds no other state.
///
/// # Example
///
/// ```
/// use rater::{ClassConfig, DecisionEngine, KeyConfig, LimitCatalog, MemoryStore, Verdict};
/// use std::time::SystemTime;
///
/// let catalog = LimitCatalog::builder()
///     .build(vec![ClassConfig {
///         name: "ip".to_string(),
///         keys: vec![KeyConfig {
///             pattern: "10.0.0.*".to_string(),
///             window_secs: 90,
///             limit: 10,
///         }],
///     }])
///     .unwrap();
///
/// let mut engine = DecisionEngine::new(catalog, MemoryStore::new());
/// let verdict = engine.decide("ip 10.0.0.4", SystemTime::now());
/// assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 10 });
/// assert_eq!(verdict.to_string(), "0 1/10");
/// ```
pub struct DecisionEngine<S: MarkStore> {
    catalog: LimitCatalog,
    store: S,
}

impl<S: MarkStore> DecisionEngine<S> {
    /// Create an engine from a built catalog and a mark store.
    pub fn new(catalog: LimitCatalog, store: S) -> Self {
        DecisionEngine { catalog, store }
    }

    pub fn catalog(&self) -> &LimitCatalog {
        &self.catalog
    }

    /// Decide one request line.
    ///
    /// The line is split on the first space: class name before it, value
    /// after it (the value may be empty or contain further spaces). The
    /// first key of the class whose pattern matches the value decides the
    /// window and limit. A mark is recorded before counting, so the first
    /// request for a value reports `1/<limit>`, and the mark written here is
    /// always visible to the count that follows it.
    pub fn decide(&mut self, raw_line: &str, now: SystemTime) -> Verdict {
        let Some((class, value)) = raw_line.split_once(' ') else {
            return Verdict::BadInput;
        };

        let Some(limit_class) = self.catalog.lookup(class) else {
            return Verdict::UnknownClass(raw_line.to_string());
        };

        let Some(key) = limit_class.first_match(value) else {
            return Verdict::NoMatchingKey(value.to_string());
        };

        if let Err(reason) = self.store.record(value, class, now) {
            return Verdict::Unavailable(reason);
        }

        let window_start = now.checked_sub(key.window()).unwrap_or(UNIX_EPOCH);
        let count = match self.store.count_since(value, class, window_start) {
            Ok(count) => count,
            Err(reason) => return Verdict::Unavailable(reason),
        };

        if count > key.limit() {
            Verdict::Exceeded {
                count,
                limit: key.limit(),
            }
        } else {
            Verdict::Allowed {
                count,
                limit: key.limit(),
            }
        }
    }

    /// Bulk-expire marks older than `age`.
    ///
    /// Returns the number of marks removed.
    pub fn purge_older_than(&mut self, age: Duration, now: SystemTime) -> Result<usize, String> {
        self.store.purge_older_than(age, now)
    }
}
