//! Server configuration: CLI arguments, environment variables, and the
//! limits file.
//!
//! Settings come from CLI arguments with `RATER_`-prefixed environment
//! variables as fallback (CLI takes precedence, then env, then defaults).
//! The limit classes themselves live in a separate YAML file:
//!
//! ```yaml
//! limits:
//!   ip:
//!     - pattern: "10.0.0.*"
//!       window: 90
//!       limit: 10
//!   user:
//!     - pattern: "joe*"
//!       window: 60
//!       limit: 5
//!     - pattern: "*"
//!       window: 60
//!       limit: 1
//! ```
//!
//! Key order within a class is the evaluation order: the first pattern that
//! matches a value decides. Any configuration problem (unreadable file,
//! missing or empty `limits` section, bad glob, over-long class name) is
//! fatal at startup; the server refuses to run with partial rules.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rater::{ClassConfig, KeyConfig};

/// Main configuration structure for the server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address the line protocol binds to
    pub host: String,
    /// Port the line protocol listens on
    pub port: u16,
    /// Path to the YAML limits file
    pub limits_path: PathBuf,
    /// Global mark retention horizon
    pub retention: Duration,
    /// Interval between expiry runs
    pub expiry_interval: Duration,
    /// Maximum accepted class-name length
    pub max_class_name_len: usize,
    /// Expected number of distinct (value, class) pairs in the mark store
    pub store_capacity: usize,
    /// Channel buffer size for actor communication
    pub buffer_size: usize,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// Command-line arguments for the server.
///
/// All arguments can also be set via environment variables with the
/// `RATER_` prefix; CLI arguments take precedence.
#[derive(Parser, Debug)]
#[command(
    name = "rater",
    about = "Line-protocol admission-control server",
    long_about = "An admission-control server speaking a line-based TCP protocol.\n\nClients send `<class> <value>` and receive a coded one-line verdict.\nLimit classes are loaded from a YAML file at startup.\n\nEnvironment variables with the RATER_ prefix are supported. CLI arguments take precedence."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "HOST",
        help = "Host to bind",
        default_value = "127.0.0.1",
        env = "RATER_HOST"
    )]
    pub host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "Port to listen on",
        default_value_t = 1999,
        env = "RATER_PORT"
    )]
    pub port: u16,

    #[arg(
        long,
        value_name = "FILE",
        help = "Path to the YAML limits file",
        env = "RATER_LIMITS"
    )]
    pub limits: PathBuf,

    #[arg(
        long,
        value_name = "SECS",
        help = "Mark retention horizon (seconds)",
        default_value_t = 90,
        env = "RATER_RETENTION"
    )]
    pub retention: u64,
    #[arg(
        long,
        value_name = "SECS",
        help = "Interval between expiry runs (seconds)",
        default_value_t = 180,
        env = "RATER_EXPIRY_INTERVAL"
    )]
    pub expiry_interval: u64,

    #[arg(
        long,
        value_name = "N",
        help = "Maximum class-name length",
        default_value_t = rater::DEFAULT_MAX_CLASS_NAME_LEN,
        env = "RATER_MAX_CLASS_NAME_LEN"
    )]
    pub max_class_name_len: usize,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Initial mark store capacity",
        default_value_t = 10_000,
        env = "RATER_STORE_CAPACITY"
    )]
    pub store_capacity: usize,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Channel buffer size",
        default_value_t = 100_000,
        env = "RATER_BUFFER_SIZE"
    )]
    pub buffer_size: usize,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "RATER_LOG_LEVEL"
    )]
    pub log_level: String,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a value fails validation; a missing `--limits`
    /// argument is rejected by clap before this runs.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();
        Self::from_args(args)
    }

    fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            host: args.host,
            port: args.port,
            limits_path: args.limits,
            retention: Duration::from_secs(args.retention),
            expiry_interval: Duration::from_secs(args.expiry_interval),
            max_class_name_len: args.max_class_name_len,
            store_capacity: args.store_capacity,
            buffer_size: args.buffer_size,
            log_level: args.log_level,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port must be non-zero"));
        }
        if self.retention.is_zero() {
            return Err(anyhow!("retention must be at least one second"));
        }
        if self.expiry_interval.is_zero() {
            return Err(anyhow!("expiry interval must be at least one second"));
        }
        Ok(())
    }
}

/// On-disk shape of the limits file.
#[derive(Debug, Deserialize)]
struct LimitsFile {
    limits: HashMap<String, Vec<KeyEntry>>,
}

#[derive(Debug, Deserialize)]
struct KeyEntry {
    pattern: String,
    window: u64,
    limit: u64,
}

/// Load the limits file into class definitions.
///
/// Errors here are fatal: the server refuses to start with partial rules.
pub fn load_limits(path: &Path) -> Result<Vec<ClassConfig>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading limits file {}", path.display()))?;
    parse_limits(&contents).with_context(|| format!("parsing limits file {}", path.display()))
}

fn parse_limits(contents: &str) -> Result<Vec<ClassConfig>> {
    let file: LimitsFile = serde_yaml::from_str(contents)?;
    if file.limits.is_empty() {
        return Err(anyhow!("the limits section defines no classes"));
    }

    let mut classes: Vec<ClassConfig> = file
        .limits
        .into_iter()
        .map(|(name, keys)| ClassConfig {
            name,
            keys: keys
                .into_iter()
                .map(|key| KeyConfig {
                    pattern: key.pattern,
                    window_secs: key.window,
                    limit: key.limit,
                })
                .collect(),
        })
        .collect();
    // Class order never affects matching; sort for deterministic startup logs
    classes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(classes)
}
