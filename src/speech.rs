// Speech output collaborator
//
// Fire-and-forget "say this". A new utterance always cuts off the previous
// one. Without a configured synthesizer the text only goes to the log.

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

pub trait SpeechOutput: Send {
    fn speak(&mut self, text: &str);

    /// Cut off anything still being spoken
    fn cancel(&mut self);
}

/// Logs utterances instead of speaking them
#[derive(Debug, Default)]
pub struct LogSpeaker;

impl SpeechOutput for LogSpeaker {
    fn speak(&mut self, text: &str) {
        tracing::info!(text = %text, "Speak");
    }

    fn cancel(&mut self) {}
}

/// Runs an external synthesizer (`espeak`, `say`, ...) with the text as its
/// last argument
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSpeaker {
    /// Parse a command line such as `"espeak -s 150"`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            current: None,
        })
    }

    fn spawn(&self, text: &str) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to run speech command '{}'", self.program))
    }
}

impl SpeechOutput for CommandSpeaker {
    fn speak(&mut self, text: &str) {
        self.cancel();
        tracing::info!(text = %text, program = %self.program, "Speak");
        match self.spawn(text) {
            Ok(child) => self.current = Some(child),
            Err(e) => tracing::warn!("{:#}", e),
        }
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Err(e) = child.start_kill() {
                tracing::debug!("Previous utterance already finished: {}", e);
            }
        }
    }
}

/// Pick the speaker for an optional configured command line
pub fn build_speaker(command: Option<&str>) -> Box<dyn SpeechOutput> {
    match command.and_then(CommandSpeaker::from_command_line) {
        Some(speaker) => Box::new(speaker),
        None => Box::new(LogSpeaker),
    }
}
