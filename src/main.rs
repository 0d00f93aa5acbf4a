//! headline-digest — one scheduled run.
//! Reads today's snapshots, builds the report for the configured mode and
//! pushes it to the configured channels when the push gate allows.
//!
//! Exit status is non-zero only when configuration cannot be loaded.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use headline_digest::clock::now_in;
use headline_digest::config::{load_word_groups, AppConfig};
use headline_digest::version::check_for_update;
use headline_digest::{init_tracing, run_once, NotifierMux};

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "headline-digest failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let mut cfg = AppConfig::load().context("loading configuration")?;
    if cfg.notification.enabled && !cfg.has_channels() {
        warn!("notifications enabled but neither telegram nor email is configured");
    }
    if let Some(url) = cfg.report.version_check_url.clone() {
        if let Some(notice) = check_for_update(&url).await {
            cfg.report.add_notice(notice);
        }
    }
    let groups = load_word_groups(&cfg.word_groups_path)?;
    let mux = NotifierMux::from_config(&cfg.notification).context("building notification channels")?;

    info!(
        mode = %cfg.report.mode,
        sources = cfg.sources.len(),
        groups = groups.groups.len(),
        channels = mux.len(),
        "starting run"
    );

    let now = now_in(cfg.utc_offset());
    let summary = run_once(&cfg, &groups, &mux, now).await;
    if let Some(a) = &summary.analysis {
        info!(
            day = %a.day,
            snapshots = a.snapshot_count,
            matched = a.report.matched_count(),
            new = a.new_titles,
            outcome = summary.outcome.label(),
            "done"
        );
    }
    Ok(())
}
