// src/notify/batch.rs
//! Splits a report into messages that each fit a channel's byte budget.
//!
//! Every batch is `header + sections + footer`. A section header travels with
//! the section's first unit, and a group or source header with its first
//! title, so no batch carries headers alone. A continuation batch repeats the
//! section and group headers. A unit
//! larger than the budget on its own is emitted anyway rather than split.

use super::render::TitleFormatter;
use crate::analyze::{ReportData, ReportMode};

/// Fixed parts of every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFrame {
    /// Timestamp shown in the footer, already formatted.
    pub generated_at: String,
    /// Extra footer line, e.g. a version update notice.
    pub notice: Option<String>,
}

struct Packer {
    budget: usize,
    header: String,
    footer: String,
    batches: Vec<String>,
    current: String,
    has_content: bool,
}

impl Packer {
    fn new(budget: usize, header: String, footer: String) -> Self {
        Self {
            budget,
            current: header.clone(),
            header,
            footer,
            batches: Vec::new(),
            has_content: false,
        }
    }

    fn fits(&self, extra: &str) -> bool {
        self.current
            .len()
            .saturating_add(extra.len())
            .saturating_add(self.footer.len())
            < self.budget
    }

    fn flush(&mut self) {
        if self.has_content {
            let mut done = std::mem::take(&mut self.current);
            done.push_str(&self.footer);
            self.batches.push(done);
        }
    }

    /// Append `unit`, or start a new batch seeded with `context` when it does not fit.
    fn place(&mut self, unit: &str, context: &str) {
        if self.fits(unit) {
            self.current.push_str(unit);
        } else {
            self.flush();
            self.current = format!("{}{context}{unit}", self.header);
        }
        self.has_content = true;
    }

    /// Append only if it fits; used for cosmetic separators.
    fn place_if_fits(&mut self, unit: &str) {
        if self.fits(unit) {
            self.current.push_str(unit);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.batches
    }
}

fn group_icon(count: usize) -> &'static str {
    match count {
        c if c >= 10 => "🔥 ",
        c if c >= 5 => "📈 ",
        _ => "📌 ",
    }
}

/// Pack the report into ordered messages of at most `budget` bytes each
/// (UTF-8 length, footer included), except when one atomic unit alone is larger.
pub fn split_into_batches(
    report: &ReportData,
    mode: ReportMode,
    formatter: &dyn TitleFormatter,
    budget: usize,
    frame: &BatchFrame,
) -> Vec<String> {
    let total_titles: usize = report.stats.iter().map(|s| s.titles.len()).sum();
    let header = format!("Total news: {total_titles}\n\n");
    let mut footer = format!("\n\nUpdated at: {}", frame.generated_at);
    if let Some(notice) = frame.notice.as_deref().filter(|n| !n.is_empty()) {
        footer.push('\n');
        footer.push_str(&formatter.escape(notice));
    }

    if report.is_empty() {
        let placeholder = format!("📭 {}\n\n", mode.empty_placeholder());
        return vec![format!("{header}{placeholder}{footer}")];
    }

    let mut packer = Packer::new(budget, header, footer);

    if !report.stats.is_empty() {
        let stats_header = "📊 Hot topic statistics\n\n";

        let groups = report.stats.len();
        for (i, stat) in report.stats.iter().enumerate() {
            let word_header = format!(
                "{}[{}/{groups}] {} : {} items\n\n",
                group_icon(stat.count),
                i + 1,
                formatter.escape(&stat.word),
                stat.count
            );
            let last = stat.titles.len().saturating_sub(1);
            let line = |j: usize| {
                let mut l = format!("  {}. {}\n", j + 1, formatter.format(&stat.titles[j], true));
                if j < last {
                    l.push('\n');
                }
                l
            };

            let first = if stat.titles.is_empty() { String::new() } else { line(0) };
            let (lead, context) = if i == 0 { (stats_header, "") } else { ("", stats_header) };
            packer.place(&format!("{lead}{word_header}{first}"), context);

            let continued = format!("{stats_header}{word_header}");
            for j in 1..stat.titles.len() {
                packer.place(&line(j), &continued);
            }

            if i + 1 < groups {
                packer.place_if_fits("\n\n");
            }
        }
    }

    if !report.new_titles.is_empty() {
        let new_header = format!("\n\n🆕 New hot news ({} total)\n\n", report.total_new_count);

        for (k, section) in report.new_titles.iter().enumerate() {
            let source_header = format!(
                "{} ({} items):\n\n",
                formatter.escape(&section.source_name),
                section.titles.len()
            );
            // everything in this section is new; no marker, no source prefix
            let line = |j: usize| {
                let mut t = section.titles[j].clone();
                t.is_new = false;
                format!("  {}. {}\n", j + 1, formatter.format(&t, false))
            };

            let first = if section.titles.is_empty() { String::new() } else { line(0) };
            let (lead, context) = if k == 0 { (new_header.as_str(), "") } else { ("", new_header.as_str()) };
            packer.place(&format!("{lead}{source_header}{first}"), context);

            let continued = format!("{new_header}{source_header}");
            for j in 1..section.titles.len() {
                packer.place(&line(j), &continued);
            }
            packer.current.push('\n');
        }
    }

    if !report.failed_ids.is_empty() {
        let failed_header = "\n\n⚠️ Sources that failed to fetch:\n\n";
        for (k, id) in report.failed_ids.iter().enumerate() {
            let line = format!("  • {}\n", formatter.escape(id));
            if k == 0 {
                packer.place(&format!("{failed_header}{line}"), "");
            } else {
                packer.place(&line, failed_header);
            }
        }
    }

    packer.finish()
}
