// tests/batching.rs
use headline_digest::analyze::{NewTitlesSection, ReportData, ReportMode, StatEntry, TitleDisplay};
use headline_digest::notify::{split_into_batches, BatchFrame, TelegramFormatter};

fn title(source: &str, name: String, rank: u32, is_new: bool) -> TitleDisplay {
    TitleDisplay {
        title: name,
        source_id: source.to_string(),
        source_name: source.to_uppercase(),
        first_time: "08h00".into(),
        last_time: "10h00".into(),
        time_display: "[08h00 ~ 10h00]".into(),
        count: 2,
        ranks: vec![rank],
        rank_threshold: 5,
        url: format!("https://news.example/{rank}"),
        mobile_url: String::new(),
        is_new,
    }
}

fn big_report() -> ReportData {
    let stats = (0..6)
        .map(|g| {
            let titles: Vec<TitleDisplay> = (0..15)
                .map(|i| title("vnx", format!("Grp{g} headline número {i} ✓"), i + 1, i % 4 == 0))
                .collect();
            StatEntry {
                word: format!("topic {g}"),
                count: titles.len(),
                titles,
            }
        })
        .collect();
    let new_titles = vec![NewTitlesSection {
        source_id: "cafef".into(),
        source_name: "CafeF".into(),
        titles: (0..12).map(|i| title("cafef", format!("Fresh item {i}"), i + 1, true)).collect(),
    }];
    ReportData {
        stats,
        failed_ids: vec!["dantri".into(), "tuoitre".into()],
        new_titles,
        total_new_count: 12,
    }
}

fn frame() -> BatchFrame {
    BatchFrame {
        generated_at: "2025-09-06 10:00:00".into(),
        notice: Some("v2.0 available".into()),
    }
}

#[test]
fn every_title_rendered_exactly_once() {
    let report = big_report();
    let batches = split_into_batches(&report, ReportMode::Daily, &TelegramFormatter, 1200, &frame());
    assert!(batches.len() > 3);
    let all = batches.concat();

    for stat in &report.stats {
        for t in &stat.titles {
            let needle = format!("{}</a>", t.title);
            assert_eq!(all.matches(&needle).count(), 1, "{}", t.title);
        }
    }
    for t in &report.new_titles[0].titles {
        let needle = format!(">{}</a>", t.title);
        assert_eq!(all.matches(&needle).count(), 1, "{}", t.title);
    }
    assert_eq!(all.matches("  • dantri\n").count(), 1);
}

#[test]
fn batches_respect_budget_and_carry_footer() {
    let batches = split_into_batches(&big_report(), ReportMode::Daily, &TelegramFormatter, 1200, &frame());
    for b in &batches {
        assert!(b.len() < 1200, "batch of {} bytes", b.len());
        assert!(b.starts_with("Total news: 90\n\n"));
        assert!(b.ends_with("Updated at: 2025-09-06 10:00:00\nv2.0 available"));
    }
}

#[test]
fn oversized_unit_is_emitted_whole() {
    let mut report = big_report();
    report.stats.truncate(1);
    report.stats[0].titles.truncate(1);
    report.stats[0].count = 1;
    report.stats[0].titles[0].title = "x".repeat(500);
    report.new_titles.clear();
    report.total_new_count = 0;
    report.failed_ids.clear();

    let batches = split_into_batches(&report, ReportMode::Daily, &TelegramFormatter, 200, &frame());
    let long = "x".repeat(500);
    let holding: Vec<&String> = batches.iter().filter(|b| b.contains(&long)).collect();
    assert_eq!(holding.len(), 1);
    assert!(holding[0].len() > 200);
    assert!(holding[0].contains("topic 0 : 1 items"));
    for b in batches.iter().filter(|b| !b.contains(&long)) {
        assert!(b.len() < 200);
    }
}
