use std::io::Write;
use tickerwatch::config::{AppConfig, ConfigError};
use tickerwatch::types::InboundEvent;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_full_config() {
    let file = write_config(
        r#"{
            "monitored_bots": [
                {"name": "pumply_futures_dex", "username": "pumply_futures_dex",
                 "pattern": "🔻\\s+(SHORT|LONG)\\s+\\$(\\w+)\\s+\\+[\\d.]+%\\s+on\\s+MEXC",
                 "ticker_group": 2, "direction_group": 1},
                {"name": "kormushka_mexc", "pattern": "(\\w+)\\s+\\+[\\d.]+%\\s+in\\s+\\d+\\s+secs!", "enabled": false}
            ],
            "blacklist": {"enabled": true, "tickers": ["rice", "DOGE"]},
            "settings": {"auto_copy_clipboard": false, "log_level": "DEBUG", "dedup_cache_size": 50},
            "notifications": {"enabled": false},
            "forwarding": {"url": "https://example.com/hook", "token": "secret"}
        }"#,
    );

    let cfg = AppConfig::load_from_path(file.path()).expect("config");
    assert!(!cfg.settings.auto_copy_clipboard);
    assert!(cfg.settings.auto_open_gmgn);
    assert_eq!(cfg.settings.dedup_cache_size, 50);
    assert_eq!(cfg.settings.stats_interval, 10);
    assert!(!cfg.notifications.enabled);
    assert_eq!(cfg.forwarding.as_ref().map(|f| f.url.as_str()), Some("https://example.com/hook"));

    let grammars = cfg.grammars().expect("grammars");
    assert_eq!(grammars.len(), 2);
    assert_eq!(grammars[1].sender_identifier, "kormushka_mexc");
    assert!(!grammars[1].enabled);

    let blacklist = cfg.blacklist();
    assert!(blacklist.contains("RICE"));
    assert_eq!(blacklist.sorted(), vec!["DOGE", "RICE"]);

    let pipeline = cfg.build_pipeline().expect("pipeline");
    assert!(pipeline.extract("🔻 LONG $WIF +3.1% on MEXC", "pumply_futures_dex", 1).is_some());
    // grammar is disabled
    assert!(pipeline.extract("FTT +3.61% in 10 secs!", "kormushka_mexc", 2).is_none());
}

#[test]
fn empty_config_uses_builtin_grammars() {
    let cfg = AppConfig::from_json("{}").expect("config");
    let names: Vec<String> = cfg.grammars().unwrap().into_iter().map(|g| g.name).collect();
    assert_eq!(names, ["mexcTracker", "kormushka_mexc", "pumply_futures_dex"]);
    assert!(!cfg.blacklist().is_enabled());
    assert!(cfg.forwarding.is_none());
}

#[test]
fn rejects_bad_pattern() {
    let err = AppConfig::from_json(r#"{"monitored_bots": [{"name": "x", "pattern": "(unclosed"}]}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Grammar(_)), "{}", err);
}

#[test]
fn rejects_group_outside_pattern() {
    let err = AppConfig::from_json(
        r#"{"monitored_bots": [{"name": "x", "pattern": "(\\w+) up", "direction_group": 3}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Grammar(_)), "{}", err);
}

#[test]
fn rejects_tiny_cache_and_duplicate_names() {
    let err = AppConfig::from_json(r#"{"settings": {"dedup_cache_size": 1}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(_)));

    let err = AppConfig::from_json(
        r#"{"monitored_bots": [{"name": "a", "pattern": "(\\w+)"}, {"name": "a", "pattern": "(\\w+)"}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(_)));
}

#[test]
fn log_level_accepts_python_spellings() {
    let cfg = AppConfig::from_json(r#"{"settings": {"log_level": "WARNING"}}"#).expect("config");
    assert_eq!(cfg.settings.tracing_level().unwrap(), "warn");
    let cfg = AppConfig::from_json(r#"{"settings": {"log_level": "CRITICAL"}}"#).expect("config");
    assert_eq!(cfg.settings.tracing_level().unwrap(), "error");
    let cfg = AppConfig::from_json(r#"{"settings": {"log_level": "Debug"}}"#).expect("config");
    assert_eq!(cfg.settings.tracing_level().unwrap(), "debug");

    let err = AppConfig::from_json(r#"{"settings": {"log_level": "verbose"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue(_)), "{}", err);
}

#[test]
fn missing_file_is_io_error() {
    let err = AppConfig::load_from_path("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn inbound_event_appends_hidden_urls() {
    let event = InboundEvent::from_json(
        r#"{"sender": "kormushka_mexc", "text": "FTT +3.61% in 10 secs!", "message_id": 9,
            "urls": ["https://gmgn.ai/eth/token/0xabc", "https://futures.mexc.com/exchange/FTT_USDT"]}"#,
    )
    .unwrap();
    assert_eq!(
        event.scan_text().unwrap(),
        "FTT +3.61% in 10 secs!\nhttps://gmgn.ai/eth/token/0xabc \nhttps://futures.mexc.com/exchange/FTT_USDT"
    );

    let empty = InboundEvent::from_json(r#"{"sender": "x", "text": "  ", "message_id": 1}"#).unwrap();
    assert!(empty.scan_text().is_err());
    assert!(InboundEvent::from_json("not json").is_err());
}
