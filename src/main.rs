//! policy-digest — binary entrypoint.
//! Loads the run configuration, fetches every source once and prints the
//! digest to stdout. Logs go to stderr.

use anyhow::Context;
use policy_digest::config::load_config_default;
use policy_digest::digest::to_json;
use policy_digest::ingest::providers::build_adapters;
use policy_digest::{render, run_digest};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Stderr logging. `RUST_LOG` filters (default `info`);
/// `DIGEST_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("DIGEST_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; DIGEST_CONFIG_PATH / DIGEST_ANCHOR_DATE may live there.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default()
        .and_then(|file| file.resolve())
        .context("loading digest config")?;
    tracing::info!(target: "digest", anchor = %cfg.anchor, sources = cfg.sources.len(), "config loaded");

    let adapters = build_adapters(&cfg);
    let sections = run_digest(&cfg, adapters).await;

    let as_json = std::env::var("DIGEST_OUTPUT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));
    if as_json {
        println!("{}", to_json(&sections).context("serialising digest")?);
    } else {
        print!("{}", render(&cfg, &sections));
    }

    Ok(())
}
