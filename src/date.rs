// src/date.rs
//! Date resolution: turns free text or structured metadata into one calendar
//! day anchored to the run's fixed UTC offset.
//!
//! Grammars, in priority order:
//! 1. structured timestamp (from markup such as `<time datetime=..>`)
//! 2. era date, `令和7年6月20日`
//! 3. Gregorian Kanji date, `2025年6月20日`
//! 4. slash date, `2025/6/20`
//! 5. feed timestamps: RFC 2822, RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`, `YYYY-MM-DD`
//!
//! Grammars 2–4 run on normalized text; 5 runs on the trimmed raw text.
//! Failing to resolve is `None`; what to do next is the caller's decision.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::normalize::normalize;

/// Era name → Gregorian year of the era's first year.
pub const ERA_TABLE: &[(&str, i32)] = &[
    ("明治", 1868),
    ("大正", 1912),
    ("昭和", 1926),
    ("平成", 1989),
    ("令和", 2019),
];

pub const JST_OFFSET_SECS: i32 = 9 * 3600;

static ERA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(明治|大正|昭和|平成|令和)\s*(元|[0-9]{1,2})\s*年\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日")
        .expect("era date regex")
});
static KANJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{4})\s*年\s*([0-9]{1,2})\s*月\s*([0-9]{1,2})\s*日").expect("kanji date regex")
});
static SLASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})/([0-9]{1,2})/([0-9]{1,2})").expect("slash date regex"));

// URL fallbacks: /news/20250620.html, ?day=2025.6.20, /2025-06-20/
static URL_COMPACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^0-9])([0-9]{4})([0-9]{2})([0-9]{2})(?:[^0-9]|$)").expect("url compact regex")
});
static URL_SEP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{4})[.\-]([0-9]{1,2})[.\-]([0-9]{1,2})").expect("url separated regex")
});

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^PT(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?").expect("duration regex")
});

/// Date information already present in structured markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StructuredDate {
    /// A whole day, used as-is.
    Day(NaiveDate),
    /// An instant; converted to the canonical offset before taking its day.
    Instant(DateTime<FixedOffset>),
}

/// Resolves dates into the canonical offset. Cheap to copy, holds no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    offset: FixedOffset,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::jst()
    }
}

impl DateResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Japan Standard Time (UTC+9), the offset every bundled source publishes in.
    pub fn jst() -> Self {
        Self::new(FixedOffset::east_opt(JST_OFFSET_SECS).expect("+09:00 is a valid offset"))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current calendar day in the canonical offset.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    /// Resolve from a structured hint first, then each candidate text in order.
    pub fn resolve<S: AsRef<str>>(
        &self,
        candidates: &[S],
        structured: Option<&StructuredDate>,
    ) -> Option<NaiveDate> {
        if let Some(hint) = structured {
            return Some(self.resolve_structured(hint));
        }
        candidates
            .iter()
            .find_map(|c| self.resolve_text(c.as_ref()))
    }

    pub fn resolve_structured(&self, hint: &StructuredDate) -> NaiveDate {
        match hint {
            StructuredDate::Day(d) => *d,
            StructuredDate::Instant(dt) => dt.with_timezone(&self.offset).date_naive(),
        }
    }

    /// Try every text grammar against one candidate.
    pub fn resolve_text(&self, text: &str) -> Option<NaiveDate> {
        let norm = normalize(text);
        era_date(&norm)
            .or_else(|| first_valid_ymd(&KANJI_RE, &norm))
            .or_else(|| first_valid_ymd(&SLASH_RE, &norm))
            .or_else(|| self.parse_feed_timestamp(text))
    }

    /// Date embedded in a URL. Only for callers whose fallback policy allows it.
    pub fn resolve_url(&self, url: &str) -> Option<NaiveDate> {
        first_valid_ymd(&URL_COMPACT_RE, url).or_else(|| first_valid_ymd(&URL_SEP_RE, url))
    }

    fn parse_feed_timestamp(&self, raw: &str) -> Option<NaiveDate> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        let instant = OffsetDateTime::parse(s, &Rfc2822)
            .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
            .ok()
            .and_then(|dt| Utc.timestamp_opt(dt.unix_timestamp(), 0).single())
            .map(|dt| dt.fixed_offset())
            // W3C-DTF without seconds, common in RDF feeds
            .or_else(|| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M%:z").ok());
        if let Some(dt) = instant {
            return Some(dt.with_timezone(&self.offset).date_naive());
        }

        // Offset-less forms are taken to be in the canonical offset already.
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
            .map(|dt| dt.date())
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .ok()
    }
}

/// `eraBaseYear - 1 + eraYear`; `None` for unknown eras or era-year 0.
pub fn era_to_gregorian(era: &str, era_year: u32) -> Option<i32> {
    if era_year == 0 {
        return None;
    }
    let base = ERA_TABLE.iter().find(|(name, _)| *name == era)?.1;
    Some(base - 1 + i32::try_from(era_year).ok()?)
}

fn era_date(norm: &str) -> Option<NaiveDate> {
    ERA_RE.captures_iter(norm).find_map(|caps| {
        let era_year = match &caps[2] {
            "元" => 1,
            n => n.parse().ok()?,
        };
        let year = era_to_gregorian(&caps[1], era_year)?;
        NaiveDate::from_ymd_opt(year, num(&caps, 3)?, num(&caps, 4)?)
    })
}

fn first_valid_ymd(re: &Regex, s: &str) -> Option<NaiveDate> {
    re.captures_iter(s).find_map(|caps| {
        let year = caps.get(1)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, num(&caps, 2)?, num(&caps, 3)?)
    })
}

fn num(caps: &Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse().ok()
}

/// Total seconds of an ISO-8601 `PT#H#M#S` duration. Malformed input is 0.
pub fn parse_iso8601_duration(raw: &str) -> u64 {
    let Some(caps) = DURATION_RE.captures(raw.trim()) else {
        return 0;
    };
    let part = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    part(1)
        .saturating_mul(3600)
        .saturating_add(part(2).saturating_mul(60))
        .saturating_add(part(3))
}

/// `M分S秒`; minutes are not folded into hours.
pub fn format_duration(secs: u64) -> String {
    format!("{}分{}秒", secs / 60, secs % 60)
}

/// Subtract whole days, clamping at the calendar's lower bound.
pub(crate) fn days_before(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MIN)
}

/// Add whole days, clamping at the calendar's upper bound.
pub(crate) fn days_after(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(n)))
        .unwrap_or(NaiveDate::MAX)
}
