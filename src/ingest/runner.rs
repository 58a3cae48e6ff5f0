// src/ingest/runner.rs
//! Bounded concurrent fetch: one task per source, at most `max_concurrency`
//! in flight. A task that errors, times out or panics contributes nothing and
//! never takes its siblings down.

use crate::date::DateResolver;
use crate::ingest::types::{ResolvedItem, SourceAdapter};
use crate::ingest::{ensure_metrics_described, process_source, PipelineStats, SourcePolicy};
use futures::stream::{self, StreamExt};
use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub struct RunnerCfg {
    pub max_concurrency: usize,
    pub fetch_timeout: Duration,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

pub struct SourceTask {
    pub adapter: Box<dyn SourceAdapter>,
    pub policy: SourcePolicy,
}

/// Outcome for one source. `failure` is set when the adapter produced nothing
/// usable; `items` is then empty.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_id: String,
    pub items: Vec<ResolvedItem>,
    pub stats: PipelineStats,
    pub failure: Option<String>,
}

impl SourceReport {
    fn failed(source_id: String, why: String) -> Self {
        Self {
            source_id,
            items: Vec::new(),
            stats: PipelineStats::default(),
            failure: Some(why),
        }
    }
}

/// Fetch and process every task. Reports come back in completion order.
pub async fn run_sources(
    tasks: Vec<SourceTask>,
    resolver: DateResolver,
    cfg: RunnerCfg,
) -> Vec<SourceReport> {
    ensure_metrics_described();

    let reports: Vec<SourceReport> = stream::iter(tasks)
        .map(|task| {
            let source_id = task.policy.source_id.clone();
            let handle = tokio::spawn(run_one(task, resolver, cfg.fetch_timeout));
            async move {
                match handle.await {
                    Ok(report) => report,
                    Err(e) => {
                        tracing::warn!(target: "ingest", source = %source_id, error = %e, "source task aborted");
                        counter!("digest_source_errors_total").increment(1);
                        SourceReport::failed(source_id, format!("task aborted: {e}"))
                    }
                }
            }
        })
        .buffer_unordered(cfg.max_concurrency.max(1))
        .collect()
        .await;

    let now = chrono::Utc::now().timestamp().max(0);
    gauge!("digest_last_run_ts").set(now as f64);

    reports
}

async fn run_one(task: SourceTask, resolver: DateResolver, timeout: Duration) -> SourceReport {
    let SourceTask { adapter, policy } = task;
    let source_id = policy.source_id.clone();

    let t0 = Instant::now();
    let fetched = tokio::time::timeout(timeout, adapter.fetch()).await;
    histogram!("digest_source_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let raw = match fetched {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            tracing::warn!(target: "ingest", source = %source_id, error = ?e, "adapter error");
            counter!("digest_source_errors_total").increment(1);
            return SourceReport::failed(source_id, format!("{e:#}"));
        }
        Err(_) => {
            tracing::warn!(target: "ingest", source = %source_id, timeout_secs = timeout.as_secs(), "adapter timed out");
            counter!("digest_source_errors_total").increment(1);
            return SourceReport::failed(source_id, "timed out".to_string());
        }
    };

    let (items, stats) = process_source(raw, &policy, &resolver);
    SourceReport {
        source_id,
        items,
        stats,
        failure: None,
    }
}
