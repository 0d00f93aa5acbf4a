// tests/classify.rs
use headline_digest::analyze::{compute_stats, matches, ReportMode, ScopeInput};
use headline_digest::change_detector::detect_new_titles;
use headline_digest::config::parse_word_groups;
use headline_digest::ledger::merge_snapshots;
use headline_digest::snapshot::{parse_snapshot, Snapshot};

fn day() -> Vec<Snapshot> {
    vec![
        parse_snapshot("08h00", "a | Alpha\n1. Gold price jumps\n2. Oil price falls\n3. Gold rumor spreads\n"),
        parse_snapshot(
            "09h00",
            "a | Alpha\n1. Gold price jumps\n2. Weather report\n\nb | Beta\n1. Gold and oil rally\n",
        ),
    ]
}

#[test]
fn title_counts_only_under_first_matching_group() {
    let groups = parse_word_groups("gold\noil\nrumor!\n");
    let snaps = day();
    let merged = merge_snapshots(&snaps, None);
    let new = detect_new_titles(&snaps, None);
    let input = ScopeInput { day: &merged, new_titles: &new, first_snapshot: false };
    let stats = compute_stats(ReportMode::Daily, &input, &groups, 5).stats;

    let gold = stats.iter().find(|s| s.word == "gold").unwrap();
    let oil = stats.iter().find(|s| s.word == "oil").unwrap();
    let gold_titles: Vec<&str> = gold.titles.iter().map(|t| t.title.as_str()).collect();
    assert!(gold_titles.contains(&"Gold and oil rally"));
    assert!(!oil.titles.iter().any(|t| t.title == "Gold and oil rally"));
    assert_eq!(oil.count, 1);

    // filtered everywhere
    assert!(stats.iter().all(|s| s.titles.iter().all(|t| !t.title.contains("rumor"))));

    // each (source, title) at most once across all groups
    let total: usize = stats.iter().map(|s| s.titles.len()).sum();
    let matched: usize = stats.iter().map(|s| s.count).sum();
    assert_eq!(total, matched);
    assert_eq!(total, 3);
}

#[test]
fn new_title_from_second_source_sorts_first() {
    let groups = parse_word_groups("gold\n");
    let snaps = day();
    let merged = merge_snapshots(&snaps, None);
    let new = detect_new_titles(&snaps, None);
    let input = ScopeInput { day: &merged, new_titles: &new, first_snapshot: false };
    let stats = compute_stats(ReportMode::Daily, &input, &groups, 5).stats;
    assert_eq!(stats[0].titles[0].title, "Gold and oil rally");
    assert!(stats[0].titles[0].is_new);
    assert_eq!(stats[0].titles[0].source_name, "Beta");
}

#[test]
fn any_filter_word_blocks_match() {
    let groups = parse_word_groups("gold\nads!\n");
    for title in ["Gold ADS inside", "ads: gold", "goldads"] {
        assert!(!matches(title, &groups.groups, &groups.filter_words), "{title}");
    }
    assert!(matches("anything", &[], &groups.filter_words));
}

#[test]
fn incremental_mode_counts_only_new_titles() {
    let groups = parse_word_groups("");
    let snaps = day();
    let merged = merge_snapshots(&snaps, None);
    let new = detect_new_titles(&snaps, None);
    let input = ScopeInput { day: &merged, new_titles: &new, first_snapshot: false };
    let r = compute_stats(ReportMode::Incremental, &input, &groups, 5);
    assert_eq!(r.total_titles, 2);
    assert_eq!(r.stats[0].count, 2);
    assert!(r.stats[0].titles.iter().all(|t| t.is_new));
}
