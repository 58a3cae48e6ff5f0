// src/keywords.rs
//! Keyword matcher.
//!
//! Keywords are normalized and classified once, when the set is built:
//! - **bounded**: short all-ASCII-alphanumeric terms (`ai`, `it`, `dx`). They only
//!   match with a non-`[a-z0-9]` character or a text edge on both sides, so `ai`
//!   hits `AIガバナンス` but not `saitama`.
//! - **free**: everything else, matched by plain substring containment.
//!
//! Input text must already be normalized (see [`crate::normalize`]).

use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::ConfigError;
use crate::normalize::normalize;

/// Longest term still treated as a collision-prone acronym.
pub const DEFAULT_BOUNDED_MAX_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Bounded,
    Free,
}

/// Bounded iff 1..=`bounded_max_len` chars, all ASCII alphanumeric.
pub fn classify(term: &str, bounded_max_len: usize) -> KeywordKind {
    let len = term.chars().count();
    if len > 0 && len <= bounded_max_len && term.chars().all(|c| c.is_ascii_alphanumeric()) {
        KeywordKind::Bounded
    } else {
        KeywordKind::Free
    }
}

#[derive(Debug, Clone)]
pub struct Keyword {
    term: String,
    kind: KeywordKind,
    bounded: Option<Regex>,
}

impl Keyword {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn kind(&self) -> KeywordKind {
        self.kind
    }

    fn is_in(&self, normalized: &str) -> bool {
        match &self.bounded {
            Some(re) => re.is_match(normalized),
            None => normalized.contains(self.term.as_str()),
        }
    }
}

/// An immutable, compiled keyword set. Safe to share across tasks.
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
}

impl KeywordSet {
    /// Normalize, drop blanks and duplicates, classify, compile.
    pub fn new<I, S>(terms: I, bounded_max_len: usize) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();
        for raw in terms {
            let term = normalize(raw.as_ref().trim());
            if term.is_empty() || !seen.insert(term.clone()) {
                continue;
            }
            let kind = classify(&term, bounded_max_len);
            let bounded = match kind {
                KeywordKind::Bounded => Some(compile_bounded(&term)?),
                KeywordKind::Free => None,
            };
            keywords.push(Keyword {
                term,
                kind,
                bounded,
            });
        }
        Ok(Self { keywords })
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.iter()
    }

    /// True if any keyword occurs in the normalized text.
    pub fn matches(&self, normalized: &str) -> bool {
        self.first_match(normalized).is_some()
    }

    /// The first keyword (in configuration order) that occurs in the text.
    pub fn first_match(&self, normalized: &str) -> Option<&Keyword> {
        self.keywords.iter().find(|k| k.is_in(normalized))
    }
}

/// Free-function form of [`KeywordSet::matches`].
pub fn matches(normalized_text: &str, set: &KeywordSet) -> bool {
    set.matches(normalized_text)
}

fn compile_bounded(term: &str) -> Result<Regex, ConfigError> {
    let pattern = format!(r"(?:^|[^a-z0-9]){}(?:[^a-z0-9]|$)", regex::escape(term));
    Regex::new(&pattern).map_err(|e| ConfigError::InvalidKeyword {
        term: term.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(terms: &[&str]) -> KeywordSet {
        KeywordSet::new(terms.iter().copied(), DEFAULT_BOUNDED_MAX_LEN).unwrap()
    }

    #[test]
    fn classification() {
        assert_eq!(classify("ai", 3), KeywordKind::Bounded);
        assert_eq!(classify("sns", 3), KeywordKind::Bounded);
        assert_eq!(classify("5g", 3), KeywordKind::Bounded);
        assert_eq!(classify("web3", 3), KeywordKind::Free);
        assert_eq!(classify("デジタル", 3), KeywordKind::Free);
        assert_eq!(classify("a.i", 3), KeywordKind::Free);
        assert_eq!(classify("", 3), KeywordKind::Free);
    }

    #[test]
    fn bounded_needs_boundaries() {
        let k = set(&["AI"]);
        assert!(k.matches(&normalize("AIガバナンス")));
        assert!(k.matches(&normalize("生成AI")));
        assert!(k.matches(&normalize("ai")));
        assert!(k.matches(&normalize("(ai)")));
        assert!(!k.matches(&normalize("saitama")));
        assert!(!k.matches(&normalize("Mail")));
        assert!(!k.matches(&normalize("ai2")));
    }

    #[test]
    fn fullwidth_keyword_and_text() {
        let k = set(&["ＤＸ"]);
        assert_eq!(k.len(), 1);
        assert!(k.matches(&normalize("医療ＤＸの推進")));
        assert!(k.matches(&normalize("医療DXの推進")));
        assert!(!k.matches(&normalize("XDXY")));
    }

    #[test]
    fn free_is_substring() {
        let k = set(&["デジタル", "Web3"]);
        assert!(k.matches(&normalize("デジタル推進会議開催")));
        assert!(k.matches(&normalize("web3.0研究会")));
        assert!(k.matches(&normalize("Ｗｅｂ３研究会")));
        assert!(!k.matches(&normalize("防災訓練")));
    }

    #[test]
    fn duplicates_and_blanks_dropped() {
        let k = set(&["DX", "ＤＸ", " dx ", "", "  "]);
        assert_eq!(k.len(), 1);
        assert_eq!(k.iter().next().unwrap().term(), "dx");
    }

    #[test]
    fn first_match_reports_keyword() {
        let k = set(&["サイバー", "IT"]);
        let hit = k.first_match(&normalize("IT人材育成")).unwrap();
        assert_eq!(hit.term(), "it");
        assert_eq!(hit.kind(), KeywordKind::Bounded);
        assert!(k.first_match(&normalize("edit")).is_none());
    }

    #[test]
    fn empty_set_matches_nothing() {
        let k = KeywordSet::default();
        assert!(k.is_empty());
        assert!(!matches("anything", &k));
    }
}
