// src/error.rs
//! Typed configuration errors. Anything reported here is fatal at startup,
//! before a single source is fetched.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config file found (set DIGEST_CONFIG_PATH or create config/digest.toml)")]
    NotFound,

    #[error("reading config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(String),

    #[error("source `{source_id}`: {field} must be between 0 and {max} (got {value})", max = u32::MAX)]
    InvalidDays {
        source_id: String,
        field: &'static str,
        value: i64,
    },

    #[error("source `{source_id}` references unknown keyword set `{set}`")]
    UnknownKeywordSet { source_id: String, set: String },

    #[error("source `{0}` has no keyword set")]
    MissingKeywordSet(String),

    #[error("keyword set `{0}` is empty")]
    EmptyKeywordSet(String),

    #[error("keyword `{term}` cannot be compiled: {reason}")]
    InvalidKeyword { term: String, reason: String },

    #[error("invalid anchor date `{0}` (expected YYYY-MM-DD)")]
    InvalidAnchor(String),

    #[error("utc_offset_hours {0} is out of range")]
    InvalidOffset(i32),

    #[error("max_concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("fetch_timeout_secs must be at least 1")]
    ZeroTimeout,

    #[error("duplicate source id `{0}`")]
    DuplicateSource(String),

    #[error("source `{0}` uses the rss adapter but has no url")]
    MissingUrl(String),
}
