// tests/logging_levels.rs

use taskdag::config::parse_str;
use taskdag::logging::resolve_level;
use taskdag::types::LogLevel;

#[test]
fn explicit_level_wins() {
    assert_eq!(resolve_level(Some(LogLevel::Debug)), tracing::Level::DEBUG);
    assert_eq!(resolve_level(Some(LogLevel::Error)), tracing::Level::ERROR);
}

#[test]
fn config_level_feeds_resolution() {
    let cfg = parse_str("[logging]\nlevel = \"trace\"\n").unwrap();
    assert_eq!(resolve_level(cfg.logging().level), tracing::Level::TRACE);
}

#[test]
fn unknown_level_name_is_rejected_by_config() {
    assert!(parse_str("[logging]\nlevel = \"loud\"\n").is_err());
}

#[test]
fn config_installs_the_global_subscriber_once() {
    let cfg = parse_str("[logging]\nlevel = \"warn\"\n").unwrap();

    assert!(taskdag::logging::init_from_config(&cfg).is_ok());
    assert!(taskdag::logging::init_from_config(&cfg).is_err());
}
