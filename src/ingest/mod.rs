// src/ingest/mod.rs
pub mod providers;
pub mod runner;
pub mod types;

use crate::date::DateResolver;
use crate::dedup::dedupe_with_count;
use crate::ingest::types::{Media, RawItem, ResolvedItem};
use crate::keywords::KeywordSet;
use crate::normalize::normalize;
use crate::window::Window;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "digest_items_fetched_total",
            "Raw items returned by source adapters."
        );
        describe_counter!(
            "digest_items_kept_total",
            "Items kept after keyword, date, window and dedup stages."
        );
        describe_counter!(
            "digest_items_undated_total",
            "Items dropped because no date could be resolved."
        );
        describe_counter!(
            "digest_items_unmatched_total",
            "Items dropped because no keyword matched."
        );
        describe_counter!(
            "digest_items_out_of_window_total",
            "Items dropped because their date is outside the window."
        );
        describe_counter!("digest_dedup_total", "Items collapsed by deduplication.");
        describe_counter!(
            "digest_source_errors_total",
            "Source adapter fetch/parse errors and timeouts."
        );
        describe_histogram!("digest_source_fetch_ms", "Adapter fetch time in milliseconds.");
        describe_gauge!("digest_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Adapter-side cleanup for markup fragments: decode entities, strip tags,
/// collapse whitespace.
pub fn clean_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace (ideographic space included)
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// What to do when no text grammar yields a date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFallback {
    /// Exclude the item.
    #[default]
    Drop,
    /// Use a date embedded in the item URL, if any.
    Url,
}

/// Filtering policy for one source. Read-only once built.
#[derive(Debug, Clone)]
pub struct SourcePolicy {
    pub source_id: String,
    pub keywords: Arc<KeywordSet>,
    pub window: Window,
    /// Also search the body for keywords (titles are always searched).
    pub match_body: bool,
    /// Also mine the title and body for a date when the item carries none.
    pub date_from_text: bool,
    pub date_fallback: DateFallback,
}

/// Why an item did not survive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Invalid,
    Unmatched,
    Undated,
    OutOfWindow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub fetched: usize,
    pub invalid: usize,
    pub unmatched: usize,
    pub undated: usize,
    pub out_of_window: usize,
    pub deduped: usize,
    pub kept: usize,
}

impl PipelineStats {
    fn reject(&mut self, why: Rejection) {
        match why {
            Rejection::Invalid => self.invalid += 1,
            Rejection::Unmatched => self.unmatched += 1,
            Rejection::Undated => self.undated += 1,
            Rejection::OutOfWindow => self.out_of_window += 1,
        }
    }
}

/// Keyword match → date resolution → window check for a single item.
pub fn resolve_item(
    raw: RawItem,
    policy: &SourcePolicy,
    resolver: &DateResolver,
) -> Result<ResolvedItem, Rejection> {
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(Rejection::Invalid);
    }
    let body = raw
        .body
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    let mut haystack = normalize(&title);
    if policy.match_body {
        if let Some(b) = &body {
            haystack.push('\n');
            haystack.push_str(&normalize(b));
        }
    }
    if !policy.keywords.matches(&haystack) {
        return Err(Rejection::Unmatched);
    }

    let mut candidates: Vec<&str> = Vec::with_capacity(3);
    if let Some(t) = raw.raw_date_text.as_deref() {
        candidates.push(t);
    }
    // title/body dates are opt-in per source
    if policy.date_from_text {
        candidates.push(&title);
        if let Some(b) = body.as_deref() {
            candidates.push(b);
        }
    }
    let date = resolver
        .resolve(&candidates, raw.structured_date.as_ref())
        .or_else(|| match policy.date_fallback {
            DateFallback::Url => resolver.resolve_url(&raw.url),
            DateFallback::Drop => None,
        })
        .ok_or(Rejection::Undated)?;

    if !policy.window.contains(date) {
        return Err(Rejection::OutOfWindow);
    }

    let media = raw.media.map(|m| Media {
        video_url: m.video_url,
        duration_secs: m
            .duration
            .as_deref()
            .map(crate::date::parse_iso8601_duration),
    });

    Ok(ResolvedItem {
        source_id: raw.source_id,
        date,
        title,
        body,
        url: raw.url,
        media,
    })
}

/// Run one source's raw items through the whole pipeline, dedup included.
pub fn process_source(
    raw_items: Vec<RawItem>,
    policy: &SourcePolicy,
    resolver: &DateResolver,
) -> (Vec<ResolvedItem>, PipelineStats) {
    ensure_metrics_described();

    let mut stats = PipelineStats {
        fetched: raw_items.len(),
        ..Default::default()
    };
    let mut resolved = Vec::with_capacity(raw_items.len());
    for raw in raw_items {
        match resolve_item(raw, policy, resolver) {
            Ok(item) => resolved.push(item),
            Err(why) => stats.reject(why),
        }
    }

    let (kept, deduped) = dedupe_with_count(resolved);
    stats.deduped = deduped;
    stats.kept = kept.len();

    // Telemetry
    counter!("digest_items_fetched_total").increment(stats.fetched as u64);
    counter!("digest_items_kept_total").increment(stats.kept as u64);
    counter!("digest_items_undated_total").increment(stats.undated as u64);
    counter!("digest_items_unmatched_total").increment(stats.unmatched as u64);
    counter!("digest_items_out_of_window_total").increment(stats.out_of_window as u64);
    counter!("digest_dedup_total").increment(stats.deduped as u64);

    tracing::info!(
        target: "ingest",
        source = %policy.source_id,
        fetched = stats.fetched,
        unmatched = stats.unmatched,
        undated = stats.undated,
        out_of_window = stats.out_of_window,
        deduped = stats.deduped,
        kept = stats.kept,
        "source processed"
    );

    (kept, stats)
}
