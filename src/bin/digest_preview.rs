//! Prints today's report batches to stdout instead of sending them.
//! Useful to check word groups and batch sizes against real snapshots.
//!
//! Usage: `digest-preview [incremental|current|daily] [budget_bytes]`

use anyhow::Result;

use headline_digest::clock::now_in;
use headline_digest::config::{load_word_groups, AppConfig};
use headline_digest::notify::{split_into_batches, PlainFormatter};
use headline_digest::pipeline::{analyze_day, batch_frame};
use headline_digest::ReportMode;

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let mut cfg = AppConfig::load()?;
    if let Some(mode) = args.next() {
        cfg.report.mode = mode.parse::<ReportMode>()?;
    }
    let budget = args
        .next()
        .and_then(|b| b.parse().ok())
        .unwrap_or(cfg.notification.message_batch_size);

    let groups = load_word_groups(&cfg.word_groups_path)?;
    let now = now_in(cfg.utc_offset());
    let Some(analysis) = analyze_day(&cfg, &groups, now) else {
        println!("no snapshots for today");
        return Ok(());
    };

    let batches = split_into_batches(
        &analysis.report,
        analysis.mode,
        &PlainFormatter,
        budget,
        &batch_frame(&cfg, now),
    );
    for (i, b) in batches.iter().enumerate() {
        println!("----- batch {}/{} ({} bytes) -----", i + 1, batches.len(), b.len());
        println!("{b}");
    }
    println!(
        "valid content for {}: {}",
        analysis.mode,
        analysis.report.has_valid_content(analysis.mode)
    );
    Ok(())
}
