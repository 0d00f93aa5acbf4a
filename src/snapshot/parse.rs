//! Snapshot text format.
//!
//! Sections are separated by a blank line. The first line of a section is
//! `<source_id>` or `<source_id> | <display name>`, followed by title lines
//! `<rank>. <title>[ [URL:<url>]][ [MOBILE:<mobile_url>]]`. A trailing sentinel
//! section lists the sources that failed to fetch during that run.

use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::warn;

use super::{Snapshot, TitleData};
use crate::ordered::{OrderedMap, SourceMap};

pub const FAILED_SENTINEL: &str = "==== FAILED SOURCES ====";

const URL_MARK: &str = " [URL:";
const MOBILE_MARK: &str = " [MOBILE:";

/// Collapse line breaks and runs of whitespace into single spaces.
pub fn clean_title(raw: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(raw, " ").trim().to_string()
}

/// Parse one snapshot file. Bad sections and lines are skipped, never fatal.
pub fn parse_snapshot(time: &str, content: &str) -> Snapshot {
    let normalized = content.replace("\r\n", "\n");
    let mut snap = Snapshot::new(time);

    for section in normalized.split("\n\n") {
        if section.trim().is_empty() {
            continue;
        }
        if section.contains(FAILED_SENTINEL) {
            snap.failed_ids.extend(
                section
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && *l != FAILED_SENTINEL)
                    .map(str::to_string),
            );
            continue;
        }

        let lines: Vec<&str> = section.trim().lines().collect();
        if lines.len() < 2 {
            warn!(snapshot = time, section = %lines.first().copied().unwrap_or(""), "skipping section without titles");
            continue;
        }

        let (source_id, name) = parse_header(lines[0]);
        if source_id.is_empty() {
            warn!(snapshot = time, "skipping section with empty source id");
            continue;
        }
        snap.names.insert(source_id.clone(), name);

        let titles = snap
            .titles
            .get_or_insert_with(&source_id, OrderedMap::new);
        for line in &lines[1..] {
            if line.trim().is_empty() {
                continue;
            }
            match parse_title_line(line) {
                Some((title, data)) => {
                    titles.insert(title, data);
                }
                None => warn!(snapshot = time, source = %source_id, line = %line, "skipping unparsable title line"),
            }
        }
    }

    snap
}

fn parse_header(line: &str) -> (String, String) {
    let line = line.trim();
    match line.split_once(" | ") {
        Some((id, name)) => (id.trim().to_string(), name.trim().to_string()),
        None => (line.to_string(), line.to_string()),
    }
}

/// `None` when nothing usable remains after stripping rank and link markers.
fn parse_title_line(line: &str) -> Option<(String, TitleData)> {
    let mut rest = line.trim();
    let mut rank = None;

    if let Some((prefix, tail)) = rest.split_once('.') {
        let numeric = !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit());
        if numeric && (tail.is_empty() || tail.starts_with(' ')) {
            rank = prefix.parse::<u32>().ok().filter(|r| *r > 0);
            rest = tail.trim_start();
        }
    }

    let mut mobile_url = String::new();
    if let Some((head, tail)) = rest.rsplit_once(MOBILE_MARK.trim_start()) {
        if let Some(u) = tail.strip_suffix(']') {
            mobile_url = u.to_string();
            rest = head.trim_end();
        }
    }

    let mut url = String::new();
    if let Some((head, tail)) = rest.rsplit_once(URL_MARK.trim_start()) {
        if let Some(u) = tail.strip_suffix(']') {
            url = u.to_string();
            rest = head.trim_end();
        }
    }

    let title = clean_title(rest);
    if title.is_empty() {
        return None;
    }
    Some((title, TitleData::new(vec![rank.unwrap_or(1)], url, mobile_url)))
}

/// Render the snapshot file for one crawl run. Titles in each section are
/// ordered by their first rank.
pub fn render_snapshot(
    results: &SourceMap<TitleData>,
    id_to_name: &OrderedMap<String>,
    failed_ids: &[String],
) -> String {
    let mut out = String::new();

    for (source_id, titles) in results.iter() {
        match id_to_name.get(source_id) {
            Some(name) if name != source_id => {
                out.push_str(&format!("{source_id} | {name}\n"));
            }
            _ => {
                out.push_str(source_id);
                out.push('\n');
            }
        }

        let mut rows: Vec<(u32, String, &TitleData)> = titles
            .iter()
            .map(|(t, d)| (d.ranks.first().copied().unwrap_or(1), clean_title(t), d))
            .collect();
        rows.sort_by_key(|(rank, _, _)| *rank);

        for (rank, title, data) in rows {
            out.push_str(&format!("{rank}. {title}"));
            if !data.url.is_empty() {
                out.push_str(&format!("{URL_MARK}{}]", data.url));
            }
            if !data.mobile_url.is_empty() {
                out.push_str(&format!("{MOBILE_MARK}{}]", data.mobile_url));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !failed_ids.is_empty() {
        out.push_str(FAILED_SENTINEL);
        out.push('\n');
        for id in failed_ids {
            out.push_str(id);
            out.push('\n');
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "vnexpress | VnExpress\n\
1. Gia vang tang manh [URL:https://vnx.vn/a] [MOBILE:https://m.vnx.vn/a]\n\
2. Bao so 3 do bo\n\
\n\
cafef\n\
1. VN-Index vuot 1300 [URL:https://cafef.vn/x]\n\
\n\
==== FAILED SOURCES ====\n\
dantri\n";

    #[test]
    fn parses_sections_links_and_failures() {
        let snap = parse_snapshot("08h00", SAMPLE);
        assert_eq!(snap.time, "08h00");
        assert_eq!(snap.names.get("vnexpress").map(String::as_str), Some("VnExpress"));
        assert_eq!(snap.names.get("cafef").map(String::as_str), Some("cafef"));

        let vnx = snap.titles.get("vnexpress").unwrap();
        let gold = vnx.get("Gia vang tang manh").unwrap();
        assert_eq!(gold.ranks, vec![1]);
        assert_eq!(gold.url, "https://vnx.vn/a");
        assert_eq!(gold.mobile_url, "https://m.vnx.vn/a");
        assert_eq!(vnx.get("Bao so 3 do bo").unwrap().ranks, vec![2]);

        assert_eq!(snap.failed_ids, vec!["dantri".to_string()]);
    }

    #[test]
    fn missing_rank_defaults_to_one() {
        let snap = parse_snapshot("09h00", "src\nNo rank here\n");
        assert_eq!(snap.titles.get("src").unwrap().get("No rank here").unwrap().ranks, vec![1]);
    }

    #[test]
    fn bad_units_are_skipped() {
        // header-only section, blank title after rank, and a good line
        let text = "lonely\n\nsrc\n3. \n4.  [URL:http://x]\n5. Kept title\n";
        let snap = parse_snapshot("10h00", text);
        assert!(!snap.titles.contains_key("lonely"));
        let src = snap.titles.get("src").unwrap();
        assert_eq!(src.len(), 1);
        assert!(src.contains_key("Kept title"));
    }

    #[test]
    fn render_then_parse_keeps_content() {
        let snap = parse_snapshot("08h00", SAMPLE);
        let text = render_snapshot(&snap.titles, &snap.names, &snap.failed_ids);
        assert!(text.starts_with("vnexpress | VnExpress\n1. Gia vang tang manh"));
        assert!(text.contains("\ncafef\n"));
        assert_eq!(parse_snapshot("08h00", &text), snap);
    }

    #[test]
    fn clean_title_collapses_whitespace() {
        assert_eq!(clean_title("  a\r\nb \t c  "), "a b c");
    }
}
