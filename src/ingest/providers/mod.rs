// src/ingest/providers/mod.rs
//! Bundled source adapters and the config → adapter wiring.

pub mod rss;

use crate::config::{AdapterSpec, RunConfig};
use crate::ingest::types::SourceAdapter;

/// One adapter per automated source in the config; manual sources get none.
pub fn build_adapters(cfg: &RunConfig) -> Vec<Box<dyn SourceAdapter>> {
    cfg.sources
        .iter()
        .filter_map(|s| match &s.adapter {
            AdapterSpec::Rss { url } => {
                Some(Box::new(rss::RssAdapter::from_url(s.id.clone(), url.clone())) as Box<dyn SourceAdapter>)
            }
            AdapterSpec::Manual => None,
        })
        .collect()
}
