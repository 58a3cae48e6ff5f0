// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod date;
pub mod dedup;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod keywords;
pub mod normalize;
pub mod window;

use std::collections::{HashMap, HashSet};

use crate::config::{AdapterSpec, RunConfig};
use crate::digest::{Section, SectionBody};
use crate::ingest::runner::{run_sources, SourceReport, SourceTask};
use crate::ingest::types::SourceAdapter;

pub use crate::digest::DigestFormatter;
pub use crate::error::ConfigError;
pub use crate::ingest::types::{RawItem, ResolvedItem};

/// Fetch every automated source concurrently and assemble the report sections
/// in configured display order.
///
/// Adapters are matched to sources by `source_id`. A configured source with no
/// adapter, or whose adapter failed, still gets a section (it renders as the
/// nothing-found line). Adapters for unknown ids, and any second adapter for
/// the same id, are logged and ignored.
pub async fn run_digest(cfg: &RunConfig, adapters: Vec<Box<dyn SourceAdapter>>) -> Vec<Section> {
    let mut tasks = Vec::with_capacity(adapters.len());
    let mut scheduled = HashSet::new();
    for adapter in adapters {
        let Some(spec) = cfg.source(adapter.source_id()) else {
            tracing::warn!(target: "digest", source = %adapter.source_id(), "adapter has no configured source; ignored");
            continue;
        };
        if spec.adapter == AdapterSpec::Manual {
            tracing::warn!(target: "digest", source = %spec.id, "adapter given for a manual source; ignored");
            continue;
        }
        if !scheduled.insert(spec.id.as_str()) {
            tracing::warn!(target: "digest", source = %spec.id, "duplicate adapter for source; ignored");
            continue;
        }
        tasks.push(SourceTask {
            policy: spec.policy.clone(),
            adapter,
        });
    }

    let mut reports: HashMap<String, SourceReport> = run_sources(tasks, cfg.resolver, cfg.runner)
        .await
        .into_iter()
        .map(|r| (r.source_id.clone(), r))
        .collect();

    let sections: Vec<Section> = cfg
        .sources
        .iter()
        .map(|spec| {
            let (body, failure) = match &spec.adapter {
                AdapterSpec::Manual => (
                    SectionBody::Manual(spec.manual_notice.clone().unwrap_or_default()),
                    None,
                ),
                AdapterSpec::Rss { .. } => match reports.remove(&spec.id) {
                    Some(r) => (SectionBody::Items(r.items), r.failure),
                    None => {
                        tracing::warn!(target: "digest", source = %spec.id, "no adapter for source");
                        (SectionBody::Items(Vec::new()), Some("no adapter".to_string()))
                    }
                },
            };
            Section {
                source_id: spec.id.clone(),
                name: spec.name.clone(),
                window: spec.policy.window,
                style: spec.style,
                body,
                failure,
            }
        })
        .collect();

    let failed = sections.iter().filter(|s| s.failure.is_some()).count();
    tracing::info!(target: "digest", anchor = %cfg.anchor, sources = sections.len(), failed, "digest assembled");
    sections
}

/// Text report for already-assembled sections.
pub fn render(cfg: &RunConfig, sections: &[Section]) -> String {
    DigestFormatter::new(cfg.nothing_found.clone()).format(sections)
}
