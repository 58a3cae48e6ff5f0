// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::date::StructuredDate;

/// Video reference as found by an adapter; the duration is still raw ISO-8601.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawMedia {
    pub video_url: Option<String>,
    pub duration: Option<String>, // e.g. "PT12M34S"
}

/// One candidate record, exactly as a source adapter found it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub source_id: String,
    pub title: String,
    pub body: Option<String>,
    pub raw_date_text: Option<String>,
    pub structured_date: Option<StructuredDate>,
    pub url: String,
    pub media: Option<RawMedia>,
}

impl RawItem {
    pub fn new(source_id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            title: title.into(),
            body: None,
            raw_date_text: None,
            structured_date: None,
            url: url.into(),
            media: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_date_text(mut self, text: impl Into<String>) -> Self {
        self.raw_date_text = Some(text.into());
        self
    }

    pub fn with_structured_date(mut self, date: StructuredDate) -> Self {
        self.structured_date = Some(date);
        self
    }

    pub fn with_media(mut self, media: RawMedia) -> Self {
        self.media = Some(media);
        self
    }
}

/// Resolved video reference; `duration_secs: None` means "could not be resolved".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Media {
    pub video_url: Option<String>,
    pub duration_secs: Option<u64>,
}

/// A record that passed keyword, date and window checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedItem {
    pub source_id: String,
    pub date: NaiveDate,
    pub title: String,
    pub body: Option<String>,
    pub url: String,
    pub media: Option<Media>,
}

/// Exact `(date, title)` identity used by deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupeKey {
    pub date: NaiveDate,
    pub title: String,
}

impl ResolvedItem {
    pub fn dedupe_key(&self) -> DedupeKey {
        DedupeKey {
            date: self.date,
            title: self.title.clone(),
        }
    }
}

/// Per-site collaborator. Locates candidates in site markup and packages them
/// as [`RawItem`]s; keyword and window filtering are never done here.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawItem>>;
    fn source_id(&self) -> &str;
}
