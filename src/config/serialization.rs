//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize the gesture vocabulary as [[gestures]] tables
    pub(super) fn gestures_to_toml(&self) -> String {
        let mut output = String::new();
        for spec in &self.gestures {
            output.push_str("\n[[gestures]]\n");
            output.push_str(&format!("name = {:?}\n", spec.name));
            output.push_str(&format!("frames_required = {}\n", spec.frames_required));
            let conditions: Vec<String> = spec
                .conditions
                .iter()
                .map(|c| {
                    format!(
                        "{{ metric = {:?}, comparison = \"{}\", threshold = {:?} }}",
                        c.metric, c.comparison, c.threshold
                    )
                })
                .collect();
            output.push_str(&format!("conditions = [{}]\n", conditions.join(", ")));
        }
        output
    }

    /// Render the full config file
    pub fn to_toml(&self) -> String {
        let speech_command = match &self.speech_command {
            Some(command) => format!("speech_command = {:?}", command),
            None => "# speech_command = \"espeak -s 150\"".to_string(),
        };

        format!(
            r#"# voicelink configuration

# Suggestion service base URL (POST {{base}}/suggest)
api_base_url = "{api}"

# Mail relay base URL (POST {{base}}/agentmail/send)
mail_base_url = "{mail}"

# Chat assistant (POST {{base}}/chat/completions)
chat_base_url = "{chat}"
chat_model = "{chat_model}"
# Bearer token; never written here by voicelink (or set VOICELINK_CHAT_API_KEY)
# chat_api_key = "..."

# Offline mode: canned suggestions and chat, mail is only logged
demo = {demo}

# Word suggestions requested per round
suggestions_count = {count}

# Pause after speaking a response before listening again
settle_delay_ms = {settle}

# Cooldown for the keyboard and agent-mode toggle gestures
toggle_cooldown_ms = {cooldown}

# Width used to lay out sentence suggestion columns
viewport_width = {width}

# HTTP timeout for suggestion and mail requests
request_timeout_secs = {timeout}

# Speech synthesizer; the text is passed as the last argument
{speech_command}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to the console buffer or stdout)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"

# ─────────────────────────────────────────────────────────────────────────────
# GESTURES
# ─────────────────────────────────────────────────────────────────────────────
# A gesture fires when all of its conditions hold for frames_required
# consecutive frames. Order matters: gestures firing on the same frame are
# dispatched in this order (winks always go first).
{gestures}"#,
            api = self.api_base_url,
            mail = self.mail_base_url,
            chat = self.chat_base_url,
            chat_model = self.chat_model,
            demo = self.demo,
            count = self.suggestions_count,
            settle = self.settle_delay_ms,
            cooldown = self.toggle_cooldown_ms,
            width = self.viewport_width,
            timeout = self.request_timeout_secs,
            speech_command = speech_command,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
            gestures = self.gestures_to_toml(),
        )
    }
}
