// src/pipeline.rs
//! One scheduled run: read today's snapshots, classify, gate, deliver.
//!
//! The analysis half is synchronous and side-effect free apart from reading
//! snapshot files; only delivery is async.

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

use crate::analyze::{compute_stats, prepare_report, ReportData, ReportMode, ScopeInput};
use crate::change_detector::detect_new_titles;
use crate::clock::date_folder;
use crate::config::{AppConfig, WordGroups};
use crate::ledger::merge_snapshots;
use crate::metrics;
use crate::notify::{BatchFrame, ChannelOutcome, GateDecision, NotifierMux, PushGate};
use crate::snapshot::SnapshotStore;

/// Result of the analysis half of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAnalysis {
    pub day: String,
    pub mode: ReportMode,
    pub snapshot_count: usize,
    /// Titles in the mode's scope before matching.
    pub scoped_titles: usize,
    /// Titles detected as new in the latest snapshot.
    pub new_titles: usize,
    pub report: ReportData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No snapshot files for today.
    NoData,
    /// Nothing worth sending in this mode.
    NoContent,
    NotificationDisabled,
    NoChannels,
    Gated(GateDecision),
    /// At least one channel succeeded.
    Sent,
    /// Every channel failed.
    AllChannelsFailed,
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::NoData => "no_data",
            RunOutcome::NoContent => "no_content",
            RunOutcome::NotificationDisabled => "notification_disabled",
            RunOutcome::NoChannels => "no_channels",
            RunOutcome::Gated(_) => "gated",
            RunOutcome::Sent => "sent",
            RunOutcome::AllChannelsFailed => "all_channels_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub analysis: Option<DayAnalysis>,
    pub outcome: RunOutcome,
    pub channels: Vec<ChannelOutcome>,
}

/// Merge, diff and classify today's snapshots. `None` when there are none.
pub fn analyze_day(cfg: &AppConfig, groups: &WordGroups, now: DateTime<FixedOffset>) -> Option<DayAnalysis> {
    let store = SnapshotStore::new(&cfg.report.output_dir);
    let day = date_folder(&now);
    let snapshots = store.load_day(&day);
    if snapshots.is_empty() {
        info!(%day, dir = %store.day_dir(&day).display(), "no snapshots for today");
        return None;
    }

    let allow = cfg.source_ids();
    let merged = merge_snapshots(&snapshots, Some(&allow));
    let new_titles = detect_new_titles(&snapshots, Some(&allow));
    let failed_ids = snapshots
        .last()
        .map(|s| s.failed_ids.clone())
        .unwrap_or_default();

    let mode = cfg.report.mode;
    let input = ScopeInput {
        day: &merged,
        new_titles: &new_titles,
        first_snapshot: store.is_first_snapshot(&day),
    };
    let stats = compute_stats(mode, &input, groups, cfg.report.rank_threshold);
    let report = prepare_report(
        mode,
        &input,
        stats.stats,
        &failed_ids,
        groups,
        cfg.report.rank_threshold,
    );

    debug!(
        %day,
        %mode,
        snapshots = snapshots.len(),
        matched = report.matched_count(),
        new = report.total_new_count,
        failed = report.failed_ids.len(),
        "day analysed"
    );
    Some(DayAnalysis {
        day,
        mode,
        snapshot_count: snapshots.len(),
        scoped_titles: stats.total_titles,
        new_titles: new_titles.total(),
        report,
    })
}

pub fn batch_frame(cfg: &AppConfig, now: DateTime<FixedOffset>) -> BatchFrame {
    BatchFrame {
        generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        notice: cfg.report.footer_notice.clone(),
    }
}

/// Full run. Only a successful delivery writes the push record.
pub async fn run_once(
    cfg: &AppConfig,
    groups: &WordGroups,
    mux: &NotifierMux,
    now: DateTime<FixedOffset>,
) -> RunSummary {
    metrics::ensure_described();
    let summary = run_inner(cfg, groups, mux, now).await;
    metrics::run_finished(summary.outcome.label());
    info!(outcome = summary.outcome.label(), "run finished");
    summary
}

async fn run_inner(
    cfg: &AppConfig,
    groups: &WordGroups,
    mux: &NotifierMux,
    now: DateTime<FixedOffset>,
) -> RunSummary {
    let finish = |analysis: Option<DayAnalysis>, outcome: RunOutcome| RunSummary {
        analysis,
        outcome,
        channels: Vec::new(),
    };

    let Some(analysis) = analyze_day(cfg, groups, now) else {
        return finish(None, RunOutcome::NoData);
    };
    let mode = analysis.mode;

    if !cfg.notification.enabled {
        return finish(Some(analysis), RunOutcome::NotificationDisabled);
    }
    if !analysis.report.has_valid_content(mode) {
        info!(%mode, "nothing to report");
        return finish(Some(analysis), RunOutcome::NoContent);
    }
    if mux.is_empty() {
        warn!("notification enabled but no channel configured");
        return finish(Some(analysis), RunOutcome::NoChannels);
    }

    let gate = PushGate::new(&cfg.notification.push_window, cfg.push_record_dir(), now);
    let decision = gate.evaluate(now);
    if !decision.is_allowed() {
        metrics::push_denied();
        info!(?decision, "push gate held the report back");
        return finish(Some(analysis), RunOutcome::Gated(decision));
    }

    let subject = format!("{} - {}", mode.report_type(), analysis.day);
    let channels = mux
        .dispatch(&analysis.report, mode, &batch_frame(cfg, now), &subject)
        .await;

    let outcome = if channels.iter().any(ChannelOutcome::is_ok) {
        gate.record(mode.report_type(), now);
        RunOutcome::Sent
    } else {
        RunOutcome::AllChannelsFailed
    };
    RunSummary {
        analysis: Some(analysis),
        outcome,
        channels,
    }
}
