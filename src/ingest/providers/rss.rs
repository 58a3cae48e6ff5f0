// src/ingest/providers/rss.rs
//! RSS 2.0 (`<pubDate>`) and RSS 1.0 / RDF (`<dc:date>`) feeds.
//!
//! Only packages items; keyword and window filtering happen in the core.

use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::clean_text;
use crate::ingest::types::{RawItem, SourceAdapter};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36";

/// RSS 2.0 nests items in `<channel>`; RDF puts them next to it.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "date", alias = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
}

pub struct RssAdapter {
    source_id: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RssAdapter {
    pub fn from_fixture_str(source_id: impl Into<String>, xml: &str) -> Self {
        Self {
            source_id: source_id.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(source_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<RawItem>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let feed: Feed = from_str(&xml_clean)
            .with_context(|| format!("parsing {} feed xml", self.source_id))?;

        let items = feed
            .channel
            .map(|c| c.item)
            .unwrap_or_default()
            .into_iter()
            .chain(feed.item);

        let mut out = Vec::new();
        for it in items {
            let title = clean_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                continue;
            }
            let body = it
                .description
                .as_deref()
                .map(clean_text)
                .filter(|d| !d.is_empty());

            out.push(RawItem {
                source_id: self.source_id.clone(),
                title,
                body,
                raw_date_text: it.pub_date.or(it.dc_date).map(|d| d.trim().to_string()),
                structured_date: None,
                url: it.link.map(|l| l.trim().to_string()).unwrap_or_default(),
                media: None,
            });
        }

        tracing::debug!(target: "ingest", source = %self.source_id, count = out.len(), "feed parsed");
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self) -> Result<Vec<RawItem>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url.as_str())
                    .header(reqwest::header::USER_AGENT, USER_AGENT)
                    .send()
                    .await
                    .with_context(|| format!("{} http get()", self.source_id))?
                    .error_for_status()
                    .with_context(|| format!("{} http status", self.source_id))?
                    .text()
                    .await
                    .with_context(|| format!("{} http .text()", self.source_id))?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
