// src/config.rs
//! Run configuration: keyword sets, per-source windows and display flags,
//! and the single anchor date for the run.
//!
//! File lookup order:
//! 1) explicit path
//! 2) $DIGEST_CONFIG_PATH
//! 3) config/digest.toml
//! 4) config/digest.json
//!
//! Everything is validated here, before any fetch starts.

use chrono::{FixedOffset, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::date::DateResolver;
use crate::digest::SectionStyle;
use crate::error::ConfigError;
use crate::ingest::runner::RunnerCfg;
use crate::ingest::{DateFallback, SourcePolicy};
use crate::keywords::{KeywordSet, DEFAULT_BOUNDED_MAX_LEN};
use crate::window::Window;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_ANCHOR_DATE: &str = "DIGEST_ANCHOR_DATE";
pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const DEFAULT_NOTHING_FOUND: &str =
    "DXやデジタル化に関連する新着情報および審議会等の開催はいずれもなし";

/* ----------------------------
File schema
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfigFile {
    #[serde(default)]
    pub run: RunSection,
    #[serde(default)]
    pub keyword_sets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub sources: Vec<SourceCfg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    #[serde(default = "default_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default)]
    pub anchor_date: Option<String>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_bounded_max_len")]
    pub bounded_max_len: usize,
    #[serde(default = "default_nothing_found")]
    pub nothing_found: String,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_offset_hours(),
            anchor_date: None,
            max_concurrency: default_max_concurrency(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            bounded_max_len: default_bounded_max_len(),
            nothing_found: default_nothing_found(),
        }
    }
}

fn default_offset_hours() -> i32 {
    9
}
fn default_max_concurrency() -> usize {
    4
}
fn default_fetch_timeout_secs() -> u64 {
    30
}
fn default_bounded_max_len() -> usize {
    DEFAULT_BOUNDED_MAX_LEN
}
fn default_nothing_found() -> String {
    DEFAULT_NOTHING_FOUND.to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Rss,
    Manual,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCfg {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub lookback_days: i64,
    #[serde(default)]
    pub ahead_days: i64,
    #[serde(default)]
    pub adapter: AdapterKind,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub match_body: bool,
    #[serde(default)]
    pub date_from_text: bool,
    #[serde(default)]
    pub date_fallback: DateFallback,
    #[serde(default)]
    pub expects_media: bool,
    #[serde(default)]
    pub quote_titles: bool,
    #[serde(default)]
    pub range_on_empty: bool,
    #[serde(default)]
    pub manual_notice: Option<String>,
}

/* ----------------------------
Resolved, validated config
---------------------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterSpec {
    Rss { url: String },
    Manual,
}

#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub id: String,
    pub name: String,
    pub adapter: AdapterSpec,
    pub policy: SourcePolicy,
    pub style: SectionStyle,
    pub manual_notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub resolver: DateResolver,
    pub anchor: NaiveDate,
    pub runner: RunnerCfg,
    pub nothing_found: String,
    /// In display order.
    pub sources: Vec<SourceSpec>,
}

impl RunConfig {
    pub fn source(&self, id: &str) -> Option<&SourceSpec> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/* ----------------------------
Loading
---------------------------- */

/// Load from an explicit path. TOML or JSON, picked by extension.
pub fn load_config_from(path: &Path) -> Result<DigestConfigFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_config(&content, ext.as_str())
}

/// Load using env var + fallbacks (see module docs).
pub fn load_config_default() -> Result<DigestConfigFile, ConfigError> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        return load_config_from(&PathBuf::from(p));
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/digest.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Err(ConfigError::NotFound)
}

pub fn parse_config(s: &str, hint_ext: &str) -> Result<DigestConfigFile, ConfigError> {
    if hint_ext == "json" {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    } else {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Anchor precedence: $DIGEST_ANCHOR_DATE, then the file, then today.
pub fn resolve_anchor(
    file_anchor: Option<&str>,
    resolver: &DateResolver,
) -> Result<NaiveDate, ConfigError> {
    let from_env = std::env::var(ENV_ANCHOR_DATE)
        .ok()
        .filter(|s| !s.trim().is_empty());
    match from_env.as_deref().or(file_anchor) {
        Some(raw) => parse_anchor(raw),
        None => Ok(resolver.today()),
    }
}

fn parse_anchor(raw: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidAnchor(raw.to_string()))
}

fn days(source_id: &str, field: &'static str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::InvalidDays {
        source_id: source_id.to_string(),
        field,
        value,
    })
}

impl DigestConfigFile {
    /// Validate and resolve, computing the anchor once.
    pub fn resolve(self) -> Result<RunConfig, ConfigError> {
        let offset = FixedOffset::east_opt(self.run.utc_offset_hours.saturating_mul(3600))
            .filter(|_| self.run.utc_offset_hours.abs() < 24)
            .ok_or(ConfigError::InvalidOffset(self.run.utc_offset_hours))?;
        let resolver = DateResolver::new(offset);
        let anchor = resolve_anchor(self.run.anchor_date.as_deref(), &resolver)?;
        self.resolve_with_anchor(resolver, anchor)
    }

    /// Validate and resolve against an explicit anchor (reproducible runs, tests).
    pub fn resolve_with_anchor(
        self,
        resolver: DateResolver,
        anchor: NaiveDate,
    ) -> Result<RunConfig, ConfigError> {
        if self.run.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.run.fetch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let mut sets: HashMap<String, Arc<KeywordSet>> = HashMap::new();
        for (name, terms) in &self.keyword_sets {
            let set = KeywordSet::new(terms, self.run.bounded_max_len)?;
            if set.is_empty() {
                return Err(ConfigError::EmptyKeywordSet(name.clone()));
            }
            sets.insert(name.clone(), Arc::new(set));
        }

        let mut seen = HashSet::new();
        let mut sources = Vec::with_capacity(self.sources.len());
        for s in self.sources {
            if !seen.insert(s.id.clone()) {
                return Err(ConfigError::DuplicateSource(s.id));
            }
            let lookback = days(&s.id, "lookback_days", s.lookback_days)?;
            let ahead = days(&s.id, "ahead_days", s.ahead_days)?;

            let adapter = match s.adapter {
                AdapterKind::Rss => match s.url.as_deref().map(str::trim) {
                    Some(u) if !u.is_empty() => AdapterSpec::Rss { url: u.to_string() },
                    _ => return Err(ConfigError::MissingUrl(s.id)),
                },
                AdapterKind::Manual => AdapterSpec::Manual,
            };

            let keywords = match (&s.keywords, &adapter) {
                (Some(name), _) => sets.get(name).cloned().ok_or_else(|| {
                    ConfigError::UnknownKeywordSet {
                        source_id: s.id.clone(),
                        set: name.clone(),
                    }
                })?,
                (None, AdapterSpec::Manual) => Arc::new(KeywordSet::default()),
                (None, _) => return Err(ConfigError::MissingKeywordSet(s.id)),
            };

            sources.push(SourceSpec {
                policy: SourcePolicy {
                    source_id: s.id.clone(),
                    keywords,
                    window: Window::new(anchor, lookback, ahead),
                    match_body: s.match_body,
                    date_from_text: s.date_from_text,
                    date_fallback: s.date_fallback,
                },
                style: SectionStyle {
                    expects_media: s.expects_media,
                    quote_titles: s.quote_titles,
                    range_on_empty: s.range_on_empty,
                },
                id: s.id,
                name: s.name,
                adapter,
                manual_notice: s.manual_notice,
            });
        }

        Ok(RunConfig {
            resolver,
            anchor,
            runner: RunnerCfg {
                max_concurrency: self.run.max_concurrency,
                fetch_timeout: Duration::from_secs(self.run.fetch_timeout_secs),
            },
            nothing_found: self.run.nothing_found,
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[run]
anchor_date = "2025-06-23"
max_concurrency = 2

[keyword_sets]
digital = ["デジタル", "AI", "ＤＸ"]

[[sources]]
id = "cao"
name = "内閣府"
keywords = "digital"
lookback_days = 4
url = "https://www.cao.go.jp/rss/news.rdf"

[[sources]]
id = "meti"
name = "経済産業省"
adapter = "manual"
manual_notice = "自動化できないので手動で調べてください!!!!"
"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sample_resolves() {
        let file = parse_config(SAMPLE, "toml").unwrap();
        let cfg = file
            .resolve_with_anchor(DateResolver::jst(), ymd(2025, 6, 23))
            .unwrap();
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.runner.max_concurrency, 2);
        assert_eq!(cfg.nothing_found, DEFAULT_NOTHING_FOUND);
        let cao = cfg.source("cao").unwrap();
        assert_eq!(cao.policy.window.start(), ymd(2025, 6, 19));
        assert_eq!(cao.policy.keywords.len(), 3);
        assert_eq!(
            cao.adapter,
            AdapterSpec::Rss {
                url: "https://www.cao.go.jp/rss/news.rdf".into()
            }
        );
        let meti = cfg.source("meti").unwrap();
        assert_eq!(meti.adapter, AdapterSpec::Manual);
        assert!(meti.policy.keywords.is_empty());
    }

    #[test]
    fn negative_days_rejected() {
        let s = r#"
[keyword_sets]
k = ["x"]
[[sources]]
id = "a"
name = "A"
keywords = "k"
url = "u"
lookback_days = -1
"#;
        let err = parse_config(s, "toml")
            .unwrap()
            .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDays { field: "lookback_days", value: -1, .. }
        ));
    }

    #[test]
    fn structural_errors() {
        let empty = parse_config("[keyword_sets]\nempty = [\" \", \"\"]", "toml")
            .unwrap()
            .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1));
        assert!(matches!(empty, Err(ConfigError::EmptyKeywordSet(ref n)) if n == "empty"));

        let unknown = parse_config(
            "[keyword_sets]\nk = [\"x\"]\n[[sources]]\nid = \"a\"\nname = \"A\"\nkeywords = \"zzz\"\nurl = \"u\"",
            "toml",
        )
        .unwrap()
        .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1));
        assert!(matches!(unknown, Err(ConfigError::UnknownKeywordSet { .. })));

        let dup = parse_config(
            "[keyword_sets]\nk = [\"x\"]\n[[sources]]\nid = \"a\"\nname = \"A\"\nkeywords = \"k\"\nurl = \"u\"\n[[sources]]\nid = \"a\"\nname = \"B\"\nkeywords = \"k\"\nurl = \"u\"",
            "toml",
        )
        .unwrap()
        .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1));
        assert!(matches!(dup, Err(ConfigError::DuplicateSource(_))));

        let no_url = parse_config(
            "[keyword_sets]\nk = [\"x\"]\n[[sources]]\nid = \"a\"\nname = \"A\"\nkeywords = \"k\"",
            "toml",
        )
        .unwrap()
        .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1));
        assert!(matches!(no_url, Err(ConfigError::MissingUrl(_))));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let file = parse_config("[run]\nmax_concurrency = 0", "toml").unwrap();
        assert!(matches!(
            file.resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1)),
            Err(ConfigError::ZeroConcurrency)
        ));
    }

    #[test]
    fn zero_timeout_rejected() {
        let file = parse_config("[run]\nfetch_timeout_secs = 0", "toml").unwrap();
        assert!(matches!(
            file.resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1)),
            Err(ConfigError::ZeroTimeout)
        ));
    }

    #[test]
    fn text_dates_are_opt_in() {
        let s = "[keyword_sets]\nk = [\"x\"]\n\
                 [[sources]]\nid = \"a\"\nname = \"A\"\nkeywords = \"k\"\nurl = \"u\"\n\
                 [[sources]]\nid = \"b\"\nname = \"B\"\nkeywords = \"k\"\nurl = \"u\"\ndate_from_text = true";
        let cfg = parse_config(s, "toml")
            .unwrap()
            .resolve_with_anchor(DateResolver::jst(), ymd(2025, 1, 1))
            .unwrap();
        assert!(!cfg.source("a").unwrap().policy.date_from_text);
        assert!(cfg.source("b").unwrap().policy.date_from_text);
    }

    #[test]
    fn json_is_accepted() {
        let j = r#"{"keyword_sets": {"k": ["AI"]},
                    "sources": [{"id": "a", "name": "A", "keywords": "k", "url": "u", "ahead_days": 7}]}"#;
        let cfg = parse_config(j, "json")
            .unwrap()
            .resolve_with_anchor(DateResolver::jst(), ymd(2025, 6, 23))
            .unwrap();
        assert_eq!(cfg.sources[0].policy.window.end(), ymd(2025, 6, 30));
    }

    #[test]
    fn bad_anchor_rejected() {
        assert!(matches!(
            parse_anchor("2025/06/23"),
            Err(ConfigError::InvalidAnchor(_))
        ));
        assert_eq!(parse_anchor(" 2025-06-23 ").unwrap(), ymd(2025, 6, 23));
    }
}
