// tests/config_env.rs
use std::{env, fs};

use headline_digest::config::{load_word_groups, AppConfig, ENV_CONFIG_PATH};
use headline_digest::ReportMode;

const OVERRIDES: &[&str] = &[
    "REPORT_MODE",
    "ENABLE_NOTIFICATION",
    "PUSH_WINDOW_ENABLED",
    "PUSH_WINDOW_START",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "EMAIL_FROM",
    "EMAIL_PASSWORD",
    "EMAIL_TO",
    "EMAIL_SMTP_SERVER",
    "EMAIL_SMTP_PORT",
];

fn clear_env() {
    env::remove_var(ENV_CONFIG_PATH);
    for k in OVERRIDES {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn load_reads_path_from_env_and_applies_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digest.toml");
    fs::write(
        &path,
        r#"
[report]
mode = "daily"

[[sources]]
id = "vnx"
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, &path);
    env::set_var("REPORT_MODE", "current");
    env::set_var("PUSH_WINDOW_ENABLED", "true");
    env::set_var("PUSH_WINDOW_START", "07:30");
    env::set_var("TELEGRAM_BOT_TOKEN", "token");
    env::set_var("TELEGRAM_CHAT_ID", "chat");
    env::set_var("EMAIL_FROM", "bot@example.com");
    env::set_var("EMAIL_PASSWORD", "secret");
    env::set_var("EMAIL_TO", "me@example.com");
    env::set_var("EMAIL_SMTP_SERVER", "smtp.example.com");
    env::set_var("EMAIL_SMTP_PORT", "465");

    let cfg = AppConfig::load();
    clear_env();
    let cfg = cfg.unwrap();

    assert_eq!(cfg.report.mode, ReportMode::Current);
    assert!(cfg.notification.push_window.enabled);
    assert_eq!(cfg.notification.push_window.start, "07:30");
    assert_eq!(cfg.notification.telegram.as_ref().unwrap().chat_id, "chat");
    let email = cfg.notification.email.as_ref().unwrap();
    assert_eq!(email.smtp_host, "smtp.example.com");
    assert_eq!(email.smtp_port, 465);
}

#[serial_test::serial]
#[test]
fn missing_config_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    env::set_var(ENV_CONFIG_PATH, dir.path().join("absent.toml"));
    let res = AppConfig::load();
    clear_env();
    assert!(res.is_err());
}

#[serial_test::serial]
#[test]
fn unknown_mode_override_is_ignored() {
    clear_env();
    let mut cfg = AppConfig::from_toml_str("[[sources]]\nid = \"a\"\n").unwrap();
    env::set_var("REPORT_MODE", "weekly");
    cfg.apply_env_overrides();
    clear_env();
    assert_eq!(cfg.report.mode, ReportMode::Daily);
}

#[serial_test::serial]
#[test]
fn channels_come_from_env_when_file_has_none() {
    clear_env();
    let mut cfg = AppConfig::from_toml_str("[[sources]]\nid = \"a\"\n").unwrap();
    assert!(!cfg.has_channels());

    env::set_var("TELEGRAM_BOT_TOKEN", "token");
    cfg.apply_env_overrides();
    assert!(!cfg.has_channels(), "token without chat id is not a channel");

    env::set_var("TELEGRAM_CHAT_ID", "chat");
    cfg.apply_env_overrides();
    clear_env();
    assert!(cfg.has_channels());
}

#[test]
fn word_group_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frequency_words.txt");
    fs::write(&path, "# markets\nvn-index, chứng khoán | tăng+\nquảng cáo!\n").unwrap();
    let groups = load_word_groups(&path).unwrap();
    assert_eq!(groups.groups.len(), 1);
    assert_eq!(groups.groups[0].group_key, "vn-index chứng khoán");
    assert_eq!(groups.groups[0].required, vec!["tăng"]);
    assert_eq!(groups.filter_words, vec!["quảng cáo"]);
}
