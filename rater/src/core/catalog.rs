//! Limit classes and glob-matched limit keys.
//!
//! The catalog is the configuration side of the engine: a set of named
//! classes, each holding an ordered list of limit keys. It is built once at
//! startup and never mutated afterwards, so it can be shared freely.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::time::Duration;

use glob::{Pattern, PatternError};

/// Historical upper bound on class-name length, used as the builder default.
pub const DEFAULT_MAX_CLASS_NAME_LEN: usize = 49;

/// One `(pattern, window, limit)` triple as read from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    /// Shell-glob pattern matched against request values
    pub pattern: String,
    /// Counting window in seconds
    pub window_secs: u64,
    /// Number of marks allowed inside the window
    pub limit: u64,
}

/// A class definition: a name plus its ordered key list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassConfig {
    pub name: String,
    pub keys: Vec<KeyConfig>,
}

/// A compiled limit key: a glob pattern plus the counting window and the
/// number of marks allowed inside it.
#[derive(Debug, Clone)]
pub struct LimitKey {
    pattern: Pattern,
    window: Duration,
    limit: u64,
}

impl LimitKey {
    /// The source text of the glob pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The trailing duration over which marks are counted for this key.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The number of marks allowed inside the window.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Full-string, case-sensitive glob match against a request value.
    pub fn matches(&self, value: &str) -> bool {
        self.pattern.matches(value)
    }
}

/// A named container of limit keys.
///
/// Keys are evaluated in configuration order and the first match wins; keys
/// are never merged or combined.
#[derive(Debug, Clone)]
pub struct LimitClass {
    name: String,
    keys: Vec<LimitKey>,
}

impl LimitClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[LimitKey] {
        &self.keys
    }

    /// The first key whose pattern matches `value`, if any.
    pub fn first_match(&self, value: &str) -> Option<&LimitKey> {
        self.keys.iter().find(|key| key.matches(value))
    }
}

/// Immutable mapping from class name to its ordered limit keys.
///
/// Lookup is exact string match on the class name, never a pattern match.
/// The catalog exposes no mutation: configuration changes require a restart.
///
/// # Example
///
/// ```
/// use rater::{ClassConfig, KeyConfig, LimitCatalog};
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
/// let class = catalog.lookup("ip").unwrap();
/// assert!(class.first_match("10.0.0.4").is_some());
/// ```
#[derive(Debug)]
pub struct LimitCatalog {
    classes: HashMap<String, LimitClass>,
}

impl LimitCatalog {
    /// Create a new builder for constructing a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder {
            max_class_name_len: DEFAULT_MAX_CLASS_NAME_LEN,
        }
    }

    /// Exact-name lookup of a class.
    pub fn lookup(&self, name: &str) -> Option<&LimitClass> {
        self.classes.get(name)
    }

    /// Number of classes in the catalog.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over all classes, in no particular order.
    pub fn classes(&self) -> impl Iterator<Item = &LimitClass> {
        self.classes.values()
    }

    /// Largest configured window across all keys, if any key exists.
    ///
    /// The mark retention horizon must be at least this large for counts to
    /// be correct over the full window.
    pub fn max_window(&self) -> Option<Duration> {
        self.classes
            .values()
            .flat_map(|class| class.keys.iter())
            .map(|key| key.window)
            .max()
    }
}

/// Builder for a [`LimitCatalog`].
pub struct CatalogBuilder {
    max_class_name_len: usize,
}

impl CatalogBuilder {
    /// Set the maximum accepted class-name length.
    ///
    /// Defaults to [`DEFAULT_MAX_CLASS_NAME_LEN`].
    pub fn max_class_name_len(mut self, max: usize) -> Self {
        self.max_class_name_len = max;
        self
    }

    /// Compile class definitions into a catalog.
    ///
    /// Key order within each class is preserved. Any invalid definition is a
    /// startup configuration error: the whole build fails rather than
    /// loading partial rules.
    pub fn build(self, specs: Vec<ClassConfig>) -> Result<LimitCatalog, CatalogError> {
        let mut classes = HashMap::with_capacity(specs.len());

        for spec in specs {
            if spec.name.len() > self.max_class_name_len {
                return Err(CatalogError::ClassNameTooLong {
                    name: spec.name,
                    max: self.max_class_name_len,
                });
            }
            if classes.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateClass(spec.name));
            }

            let mut keys = Vec::with_capacity(spec.keys.len());
            for key in spec.keys {
                if key.window_secs == 0 {
                    return Err(CatalogError::ZeroWindow {
                        class: spec.name,
                        pattern: key.pattern,
                    });
                }
                let pattern =
                    Pattern::new(&key.pattern).map_err(|source| CatalogError::InvalidPattern {
                        class: spec.name.clone(),
                        pattern: key.pattern.clone(),
                        source,
                    })?;
                keys.push(LimitKey {
                    pattern,
                    window: Duration::from_secs(key.window_secs),
                    limit: key.limit,
                });
            }

            classes.insert(spec.name.clone(), LimitClass {
                name: spec.name,
                keys,
            });
        }

        Ok(LimitCatalog { classes })
    }
}

/// Errors raised while compiling class definitions into a catalog.
///
/// All of these are fatal startup configuration errors.
#[derive(Debug)]
pub enum CatalogError {
    /// A class name exceeds the configured maximum length
    ClassNameTooLong { name: String, max: usize },
    /// Two classes share the same name
    DuplicateClass(String),
    /// A key pattern is not a valid glob
    InvalidPattern {
        class: String,
        pattern: String,
        source: PatternError,
    },
    /// A key declares a zero-second counting window
    ZeroWindow { class: String, pattern: String },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::ClassNameTooLong { name, max } => {
                write!(f, "class name exceeds {max} characters: {name}")
            }
            CatalogError::DuplicateClass(name) => write!(f, "duplicate class: {name}"),
            CatalogError::InvalidPattern {
                class,
                pattern,
                source,
            } => write!(f, "invalid pattern {pattern:?} in class {class}: {source}"),
            CatalogError::ZeroWindow { class, pattern } => {
                write!(f, "zero-second window for pattern {pattern:?} in class {class}")
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}
