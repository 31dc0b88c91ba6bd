//! # Rater
//!
//! A sliding-window admission-control engine: glob-matched limit keys
//! grouped into named classes, a time-windowed mark store, and a
//! first-match-wins decision algorithm.
//!
//! ## Overview
//!
//! Clients ask about a `(class, value)` pair, for example class `ip` with
//! value `10.0.0.4`, or class `user` with value `joe`. The engine records
//! one *mark* per accepted request and answers whether the number of marks
//! for that pair inside the matched key's trailing window exceeds the
//! configured limit.
//!
//! - A **limit key** is a glob pattern plus a counting window and an
//!   allowed count (e.g. `10.0.0.*`, 90 seconds, 10 marks).
//! - A **class** is an ordered list of keys; the first key whose pattern
//!   matches the value decides, and keys are never merged.
//! - The **mark store** owns every recorded occurrence and supports
//!   windowed counts and bulk expiry of stale marks.
//!
//! ## Quick Start
//!
//! ```
//! use rater::{ClassConfig, DecisionEngine, KeyConfig, LimitCatalog, MemoryStore, Verdict};
//! use std::time::SystemTime;
//!
//! let catalog = LimitCatalog::builder()
//!     .build(vec![ClassConfig {
//!         name: "user".to_string(),
//!         keys: vec![
//!             KeyConfig { pattern: "joe*".to_string(), window_secs: 60, limit: 5 },
//!             KeyConfig { pattern: "*".to_string(), window_secs: 60, limit: 1 },
//!         ],
//!     }])
//!     .unwrap();
//!
//! let mut engine = DecisionEngine::new(catalog, MemoryStore::new());
//!
//! // "joey" matches the first key only: limit 5, not 1.
//! let verdict = engine.decide("user joey", SystemTime::now());
//! assert_eq!(verdict, Verdict::Allowed { count: 1, limit: 5 });
//! ```
//!
//! ## Verdicts
//!
//! Every request line yields exactly one [`Verdict`]; its `Display`
//! rendering is the one-line wire report (`0 3/10`, `1 11/10`,
//! `2 Bad Input (no space)`, ...).
//!
//! ## Concurrency
//!
//! The engine is not internally synchronized. Drive it from a single task
//! or thread (the server crate wraps it in an actor), which also gives the
//! required read-after-write guarantee: the mark recorded by a request is
//! visible to that same request's count.
//!
//! ## Features
//!
//! - `ahash` (default): use AHash for the mark-store map

pub mod core;

pub use core::{
    CatalogBuilder, CatalogError, ClassConfig, DEFAULT_MAX_CLASS_NAME_LEN, DecisionEngine, KeyConfig,
    LimitCatalog, LimitClass, LimitKey, MarkStore, MemoryStore, Verdict,
};
