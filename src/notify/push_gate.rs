// src/notify/push_gate.rs
//! Push window and once-per-day gate.
//!
//! `evaluate` / `allow` never mutate state; `record` is called explicitly after
//! a send succeeded on at least one channel. Records live in one JSON file per
//! day and are swept by age when the gate is constructed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PushWindowConfig;

const RECORD_PREFIX: &str = "push_record_";
const RECORD_EXT: &str = "json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushRecord {
    #[serde(default)]
    pub pushed: bool,
    #[serde(default)]
    pub push_time: String,
    #[serde(default)]
    pub report_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Window control is off; every run may push.
    WindowDisabled,
    Allowed,
    OutsideWindow { now: String, start: String, end: String },
    AlreadyPushedToday,
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::WindowDisabled | GateDecision::Allowed)
    }
}

#[derive(Debug, Clone)]
pub struct PushGate {
    window: PushWindowConfig,
    record_dir: PathBuf,
}

impl PushGate {
    /// Creates the record directory if needed and sweeps expired records.
    pub fn new(window: &PushWindowConfig, record_dir: impl Into<PathBuf>, now: DateTime<FixedOffset>) -> Self {
        let gate = Self {
            window: window.clone(),
            record_dir: record_dir.into(),
        };
        if let Err(e) = fs::create_dir_all(&gate.record_dir) {
            warn!(target: "push_gate", dir = %gate.record_dir.display(), error = %e, "cannot create push record dir");
        }
        gate.sweep_expired(now.date_naive());
        gate
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    pub fn record_path(&self, day: NaiveDate) -> PathBuf {
        self.record_dir
            .join(format!("{RECORD_PREFIX}{}.{RECORD_EXT}", day.format("%Y%m%d")))
    }

    fn sweep_expired(&self, today: NaiveDate) {
        let entries = match fs::read_dir(&self.record_dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(target: "push_gate", error = %e, "cannot list push records");
                return;
            }
        };

        for path in entries.flatten().map(|e| e.path()) {
            let Some(day) = record_day(&path) else {
                continue;
            };
            if (today - day).num_days() <= self.window.retention_days {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => info!(target: "push_gate", file = %path.display(), "removed expired push record"),
                Err(e) => warn!(target: "push_gate", file = %path.display(), error = %e, "cannot remove push record"),
            }
        }
    }

    /// Unreadable or corrupt records count as "not pushed".
    pub fn has_pushed_today(&self, now: DateTime<FixedOffset>) -> bool {
        let path = self.record_path(now.date_naive());
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                warn!(target: "push_gate", file = %path.display(), error = %e, "cannot read push record");
                return false;
            }
        };
        match serde_json::from_str::<PushRecord>(&content) {
            Ok(rec) => rec.pushed,
            Err(e) => {
                warn!(target: "push_gate", file = %path.display(), error = %e, "corrupt push record");
                false
            }
        }
    }

    pub fn evaluate(&self, now: DateTime<FixedOffset>) -> GateDecision {
        if !self.window.enabled {
            return GateDecision::WindowDisabled;
        }

        let current = now.format("%H:%M").to_string();
        let start = normalize_hhmm(&self.window.start);
        let end = normalize_hhmm(&self.window.end);
        if !(start.as_str() <= current.as_str() && current.as_str() <= end.as_str()) {
            debug!(target: "push_gate", %current, %start, %end, "outside push window");
            return GateDecision::OutsideWindow {
                now: current,
                start,
                end,
            };
        }

        if self.window.once_per_day && self.has_pushed_today(now) {
            return GateDecision::AlreadyPushedToday;
        }
        GateDecision::Allowed
    }

    pub fn allow(&self, now: DateTime<FixedOffset>) -> bool {
        self.evaluate(now).is_allowed()
    }

    /// Overwrites today's record. Failures are logged, not returned.
    pub fn record(&self, report_type: &str, now: DateTime<FixedOffset>) {
        if let Err(e) = self.write_record(report_type, now) {
            warn!(target: "push_gate", error = %format!("{e:#}"), "cannot save push record");
        }
    }

    fn write_record(&self, report_type: &str, now: DateTime<FixedOffset>) -> Result<()> {
        let rec = PushRecord {
            pushed: true,
            push_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            report_type: report_type.to_string(),
        };
        let path = self.record_path(now.date_naive());
        fs::create_dir_all(&self.record_dir)
            .with_context(|| format!("creating {}", self.record_dir.display()))?;
        let body = serde_json::to_vec_pretty(&rec)?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(target: "push_gate", report_type, at = %rec.push_time, "push recorded");
        Ok(())
    }
}

fn record_day(path: &Path) -> Option<NaiveDate> {
    if path.extension()?.to_str()? != RECORD_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(RECORD_PREFIX)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}

/// `9:5` becomes `09:05`. Invalid input is kept as-is so comparison still happens.
fn normalize_hhmm(raw: &str) -> String {
    let parsed = raw.trim().split_once(':').and_then(|(h, m)| {
        let h: u32 = h.trim().parse().ok()?;
        let m: u32 = m.trim().parse().ok()?;
        (h <= 23 && m <= 59).then(|| format!("{h:02}:{m:02}"))
    });
    parsed.unwrap_or_else(|| {
        warn!(target: "push_gate", value = raw, "invalid HH:MM in push window");
        raw.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        tz().with_ymd_and_hms(2025, 9, d, h, m, 0).unwrap()
    }

    fn window(enabled: bool) -> PushWindowConfig {
        PushWindowConfig {
            enabled,
            start: "9:00".into(),
            end: "21:30".into(),
            once_per_day: true,
            retention_days: 7,
        }
    }

    #[test]
    fn disabled_window_always_allows() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = PushGate::new(&window(false), tmp.path(), at(6, 3, 0));
        gate.record("Daily summary", at(6, 3, 0));
        assert_eq!(gate.evaluate(at(6, 3, 0)), GateDecision::WindowDisabled);
        assert!(gate.allow(at(6, 23, 59)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = PushGate::new(&window(true), tmp.path(), at(6, 9, 0));
        assert!(gate.allow(at(6, 9, 0)));
        assert!(gate.allow(at(6, 21, 30)));
        assert!(!gate.allow(at(6, 8, 59)));
        assert!(!gate.allow(at(6, 21, 31)));
    }

    #[test]
    fn once_per_day_denies_after_record() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = PushGate::new(&window(true), tmp.path(), at(6, 10, 0));
        assert!(gate.allow(at(6, 10, 0)));
        gate.record("Daily summary", at(6, 10, 0));
        assert_eq!(gate.evaluate(at(6, 12, 0)), GateDecision::AlreadyPushedToday);
        // next day starts clean
        assert!(gate.allow(at(7, 10, 0)));

        let saved: PushRecord =
            serde_json::from_str(&fs::read_to_string(gate.record_path(at(6, 0, 0).date_naive())).unwrap()).unwrap();
        assert!(saved.pushed);
        assert_eq!(saved.push_time, "2025-09-06 10:00:00");
    }

    #[test]
    fn corrupt_record_fails_open() {
        let tmp = tempfile::tempdir().unwrap();
        let gate = PushGate::new(&window(true), tmp.path(), at(6, 10, 0));
        fs::write(gate.record_path(at(6, 0, 0).date_naive()), "{not json").unwrap();
        assert!(gate.allow(at(6, 10, 0)));
    }

    #[test]
    fn retention_sweep_removes_old_records_only() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["push_record_20250820.json", "push_record_20250830.json", "push_record_junk.json", "notes.txt"] {
            fs::write(tmp.path().join(name), "{}").unwrap();
        }
        let _gate = PushGate::new(&window(true), tmp.path(), at(6, 10, 0));
        assert!(!tmp.path().join("push_record_20250820.json").exists());
        assert!(tmp.path().join("push_record_20250830.json").exists());
        assert!(tmp.path().join("push_record_junk.json").exists());
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[test]
    fn normalizes_times() {
        assert_eq!(normalize_hhmm("9:5"), "09:05");
        assert_eq!(normalize_hhmm(" 22:00 "), "22:00");
        assert_eq!(normalize_hhmm("25:00"), "25:00");
    }
}
