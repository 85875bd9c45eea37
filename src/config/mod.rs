//! Configuration for the navigator
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/voicelink/config.toml)
//! 3. Built-in defaults (lowest priority)

use crate::gesture::{default_gestures, GestureSpec};
use crate::navigator::NavigatorSettings;
use crate::session::DEFAULT_TOGGLE_COOLDOWN;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod logging;
mod serialization;

#[cfg(test)]
mod tests;

pub use logging::{LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

const DEFAULT_CHAT_MODEL: &str = "asi1-mini";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the suggestion service (`{base}/suggest`)
    pub api_base_url: String,

    /// Base URL of the mail relay (`{base}/agentmail/send`)
    pub mail_base_url: String,

    /// Base URL of the chat completions service (`{base}/chat/completions`)
    pub chat_base_url: String,

    /// Model name sent with every chat completion
    pub chat_model: String,

    /// Bearer token for the chat service
    pub chat_api_key: Option<String>,

    /// Demo mode: canned offline suggestions and chat, mail only logged
    pub demo: bool,

    /// Word suggestions requested per round
    pub suggestions_count: u32,

    /// Pause between speaking a response and listening again
    pub settle_delay_ms: u64,

    /// Cooldown for the keyboard and agent-mode toggle gestures
    pub toggle_cooldown_ms: u64,

    /// Viewport width used to lay out sentence columns
    pub viewport_width: u16,

    /// Per-request timeout for the HTTP collaborators
    pub request_timeout_secs: u64,

    /// Speech synthesizer command line (e.g. "espeak -s 150"); log only when unset
    pub speech_command: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Gesture vocabulary, in dispatch order
    pub gestures: Vec<GestureSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            mail_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_api_key: None,
            demo: false,
            suggestions_count: 5,
            settle_delay_ms: 220,
            toggle_cooldown_ms: DEFAULT_TOGGLE_COOLDOWN.as_millis() as u64,
            viewport_width: 1024,
            request_timeout_secs: 15,
            speech_command: None,
            logging: LoggingConfig::default(),
            gestures: default_gestures(),
        }
    }
}

impl Config {
    pub fn navigator_settings(&self) -> NavigatorSettings {
        NavigatorSettings {
            suggestions_count: self.suggestions_count,
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            viewport_width: self.viewport_width,
        }
    }

    pub fn toggle_cooldown(&self) -> Duration {
        Duration::from_millis(self.toggle_cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub api_base_url: Option<String>,
    pub mail_base_url: Option<String>,
    pub chat_base_url: Option<String>,
    pub chat_model: Option<String>,
    pub chat_api_key: Option<String>,
    pub demo: Option<bool>,
    pub suggestions_count: Option<u32>,
    pub settle_delay_ms: Option<u64>,
    pub toggle_cooldown_ms: Option<u64>,
    pub viewport_width: Option<u16>,
    pub request_timeout_secs: Option<u64>,
    pub speech_command: Option<String>,

    /// Optional [logging] section
    pub logging: Option<LoggingConfig>,

    /// Optional [[gestures]] entries; replace the built-in set when present
    #[serde(default)]
    pub gestures: Vec<GestureSpec>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a boolean flag the way the env toggles are written ("1" / "true")
fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl Config {
    /// Get the config file path: ~/.config/voicelink/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("voicelink").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Config is optional
            }
        }

        // Config::default().to_toml() is the template
        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Load file config if it exists
    ///
    /// A config file that exists but does not parse is fatal: silently falling
    /// back to defaults would hide the typo.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("\n  CONFIG ERROR - Failed to parse configuration file\n");
                    eprintln!("  File: {}\n", path.display());
                    eprintln!("  Error: {}\n", e);
                    eprintln!("  To reset, run `voicelink config --reset`.\n");
                    std::process::exit(1);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("\n  CONFIG ERROR - Cannot read configuration file\n");
                eprintln!("  File: {}\n", path.display());
                eprintln!("  Error: {}\n", e);
                std::process::exit(1);
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        Self::from_sources(Self::load_file_config(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources<F>(file: FileConfig, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Suggestion service: env > file > default
        let api_base_url = env("VOICELINK_API_URL")
            .or(file.api_base_url)
            .unwrap_or(defaults.api_base_url);

        // Mail relay: env > file > same host as the suggestion service
        let mail_base_url = env("VOICELINK_MAIL_URL")
            .or(file.mail_base_url)
            .unwrap_or_else(|| api_base_url.clone());

        // Chat service: env > file > same host as the suggestion service
        let chat_base_url = env("VOICELINK_CHAT_URL")
            .or(file.chat_base_url)
            .unwrap_or_else(|| api_base_url.clone());

        let chat_api_key = env("VOICELINK_CHAT_API_KEY")
            .or(file.chat_api_key)
            .filter(|k| !k.trim().is_empty());

        let demo = env("VOICELINK_DEMO")
            .map(|v| parse_flag(&v))
            .or(file.demo)
            .unwrap_or(defaults.demo);

        let gestures = if file.gestures.is_empty() {
            defaults.gestures
        } else {
            file.gestures
        };

        Self {
            api_base_url,
            mail_base_url,
            chat_base_url,
            chat_model: file.chat_model.unwrap_or(defaults.chat_model),
            chat_api_key,
            demo,
            suggestions_count: file.suggestions_count.unwrap_or(defaults.suggestions_count),
            settle_delay_ms: file.settle_delay_ms.unwrap_or(defaults.settle_delay_ms),
            toggle_cooldown_ms: file
                .toggle_cooldown_ms
                .unwrap_or(defaults.toggle_cooldown_ms),
            viewport_width: file.viewport_width.unwrap_or(defaults.viewport_width),
            request_timeout_secs: file
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            speech_command: file.speech_command.filter(|c| !c.trim().is_empty()),
            logging: file.logging.unwrap_or_default(),
            gestures,
        }
    }
}
