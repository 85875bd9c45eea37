//! Configuration tests
//!
//! The template written on first run must parse back into the same values,
//! and every layer of the precedence chain must be honoured.

use super::*;
use crate::gesture::Condition;
use std::collections::HashMap;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

/// The default template parses and reproduces the defaults
#[test]
fn test_config_roundtrip_default() {
    let toml_str = Config::default().to_toml();

    let parsed: Result<FileConfig, _> = toml::from_str(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.err()
    );

    let config = Config::from_sources(parsed.unwrap(), no_env);
    let defaults = Config::default();
    assert_eq!(config.api_base_url, defaults.api_base_url);
    assert_eq!(config.suggestions_count, defaults.suggestions_count);
    assert_eq!(config.settle_delay_ms, 220);
    assert_eq!(config.toggle_cooldown_ms, 400);
    assert_eq!(config.speech_command, None);
    assert_eq!(config.gestures, defaults.gestures);
}

/// Custom gestures and a speech command survive serialization
#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.speech_command = Some("espeak -s 150".to_string());
    config.logging.file_rotation = LogRotation::Hourly;
    config.gestures = vec![GestureSpec::new(
        "Select",
        vec![
            Condition::above("jawOpen", 1.0),
            Condition::below("mouthSmileLeft", 0.25),
        ],
        3,
    )];

    let toml_str = config.to_toml();
    let file: FileConfig = toml::from_str(&toml_str).unwrap();
    let parsed = Config::from_sources(file, no_env);

    assert_eq!(parsed.speech_command.as_deref(), Some("espeak -s 150"));
    assert_eq!(parsed.logging.file_rotation, LogRotation::Hourly);
    assert_eq!(parsed.gestures, config.gestures);
}

#[test]
fn test_template_documents_every_gesture() {
    let toml_str = Config::default().to_toml();
    for spec in default_gestures() {
        assert!(
            toml_str.contains(&format!("name = \"{}\"", spec.name)),
            "template is missing gesture {}",
            spec.name
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_env_overrides_file() {
    let file: FileConfig = toml::from_str(
        r#"
api_base_url = "http://file:1"
demo = false
"#,
    )
    .unwrap();
    let env = env_from(&[
        ("VOICELINK_API_URL", "http://env:2"),
        ("VOICELINK_DEMO", "TRUE"),
    ]);
    let config = Config::from_sources(file, env);
    assert_eq!(config.api_base_url, "http://env:2");
    assert!(config.demo);
}

#[test]
fn test_mail_url_follows_api_url_when_unset() {
    let env = env_from(&[("VOICELINK_API_URL", "http://svc:9000")]);
    let config = Config::from_sources(FileConfig::default(), env);
    assert_eq!(config.mail_base_url, "http://svc:9000");

    let env = env_from(&[("VOICELINK_MAIL_URL", "http://mail:1")]);
    let config = Config::from_sources(FileConfig::default(), env);
    assert_eq!(config.mail_base_url, "http://mail:1");
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
}

#[test]
fn test_chat_settings_layering() {
    let env = env_from(&[("VOICELINK_API_URL", "http://svc:9000")]);
    let config = Config::from_sources(FileConfig::default(), env);
    assert_eq!(config.chat_base_url, "http://svc:9000");
    assert_eq!(config.chat_model, "asi1-mini");
    assert_eq!(config.chat_api_key, None);

    let file: FileConfig = toml::from_str(
        r#"
chat_base_url = "https://api.asi1.ai/v1"
chat_model = "asi1-extended"
chat_api_key = "from-file"
"#,
    )
    .unwrap();
    let env = env_from(&[("VOICELINK_CHAT_API_KEY", "from-env")]);
    let config = Config::from_sources(file, env);
    assert_eq!(config.chat_base_url, "https://api.asi1.ai/v1");
    assert_eq!(config.chat_model, "asi1-extended");
    assert_eq!(config.chat_api_key.as_deref(), Some("from-env"));
}

#[test]
fn test_template_never_contains_chat_key() {
    let mut config = Config::default();
    config.chat_api_key = Some("secret-key".to_string());
    let toml_str = config.to_toml();
    assert!(!toml_str.contains("secret-key"));
    let file: FileConfig = toml::from_str(&toml_str).unwrap();
    assert_eq!(file.chat_api_key, None);
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file: FileConfig = toml::from_str(
        r#"
suggestions_count = 8

[logging]
level = "debug"
"#,
    )
    .unwrap();
    let config = Config::from_sources(file, no_env);
    assert_eq!(config.suggestions_count, 8);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file_prefix, "voicelink");
    assert_eq!(config.gestures.len(), default_gestures().len());
}

#[test]
fn test_blank_speech_command_is_ignored() {
    let file: FileConfig = toml::from_str(r#"speech_command = "  ""#).unwrap();
    assert_eq!(Config::from_sources(file, no_env).speech_command, None);
}

#[test]
fn test_gesture_frames_default_to_one() {
    let file: FileConfig = toml::from_str(
        r#"
[[gestures]]
name = "Select"
conditions = [{ metric = "jawOpen", threshold = 0.5 }]
"#,
    )
    .unwrap();
    let config = Config::from_sources(file, no_env);
    assert_eq!(config.gestures.len(), 1);
    assert_eq!(config.gestures[0].frames_required, 1);
    assert_eq!(config.gestures[0].conditions[0], Condition::above("jawOpen", 0.5));
}

#[test]
fn test_navigator_settings_from_config() {
    let config = Config::default();
    let settings = config.navigator_settings();
    assert_eq!(settings.settle_delay, Duration::from_millis(220));
    assert_eq!(settings.suggestions_count, 5);
    assert_eq!(config.toggle_cooldown(), Duration::from_millis(400));
}

#[test]
fn test_logging_table_fields_are_independent() {
    let file: FileConfig = toml::from_str(
        r#"
[logging]
file_enabled = true
file_rotation = "Never"
file_dir = "/var/log/voicelink"
"#,
    )
    .unwrap();
    let logging = Config::from_sources(file, no_env).logging;
    assert!(logging.file_enabled);
    assert_eq!(logging.file_rotation, LogRotation::Never);
    assert_eq!(logging.file_dir, PathBuf::from("/var/log/voicelink"));
    assert_eq!(logging.level, "info");
    assert_eq!(logging.file_prefix, "voicelink");
}

#[test]
fn test_log_rotation_parsing() {
    assert_eq!(LogRotation::parse("HOURLY"), LogRotation::Hourly);
    assert_eq!(LogRotation::parse("never"), LogRotation::Never);
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
}
