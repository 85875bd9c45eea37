// Input events
//
// Newline-delimited JSON, one event per line, tagged by "type". The same
// events feed the headless replay (stdin or a file) and the interactive
// console, which builds them from key presses.
//
//   {"type":"frame","scores":[{"name":"jawOpen","score":0.6}]}
//   {"type":"transcript","text":"How are you","final":true}
//   {"type":"speech_error","error":"no-speech"}
//   {"type":"gesture","name":"Select"}
//   {"type":"keys","text":"hello "}
//   {"type":"chat","text":"email Jordan that I'm late"}
//   {"type":"chat_clear"}
//   {"type":"session","action":"start"}
//   {"type":"resize","width":1024}
//   {"type":"wait","ms":250}

use crate::gesture::BlendshapeScore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Start,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// One video frame worth of blendshape scores
    Frame { scores: Vec<BlendshapeScore> },
    Transcript {
        text: String,
        #[serde(rename = "final", default)]
        is_final: bool,
    },
    SpeechError { error: String },
    /// Simulated gesture, bypassing the classifier
    Gesture { name: String },
    /// Typed text for whichever keyboard has focus
    Keys { text: String },
    /// A message for the chat assistant
    Chat { text: String },
    ChatClear,
    Session { action: SessionAction },
    Resize { width: u16 },
    /// Replay pacing; never reaches the session
    Wait { ms: u64 },
}

/// Parse one line. Blank lines and `#` comments yield `None`; malformed lines
/// are logged and skipped.
pub fn parse_line(line: &str) -> Option<InputEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Skipping malformed input line: {} ({})", e, line);
            None
        }
    }
}

/// Read events until EOF, honouring `wait` lines. Stops early once the
/// receiving side is gone.
pub async fn read_events<R>(reader: R, tx: mpsc::Sender<InputEvent>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let Some(event) = parse_line(&line) else {
            continue;
        };
        if let InputEvent::Wait { ms } = event {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            continue;
        }
        if tx.send(event).await.is_err() {
            tracing::debug!("Input receiver closed, stopping reader");
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_kinds() {
        assert_eq!(
            parse_line(r#"{"type":"frame","scores":[{"name":"jawOpen","score":0.6}]}"#),
            Some(InputEvent::Frame {
                scores: vec![BlendshapeScore::new("jawOpen", 0.6)]
            })
        );
        assert_eq!(
            parse_line(r#"{"type":"transcript","text":"How are you","final":true}"#),
            Some(InputEvent::Transcript {
                text: "How are you".into(),
                is_final: true
            })
        );
        assert_eq!(
            parse_line(r#"{"type":"transcript","text":"How"}"#),
            Some(InputEvent::Transcript {
                text: "How".into(),
                is_final: false
            })
        );
        assert_eq!(
            parse_line(r#"{"type":"speech_error","error":"no-speech"}"#),
            Some(InputEvent::SpeechError {
                error: "no-speech".into()
            })
        );
        assert_eq!(
            parse_line(r#"{"type":"session","action":"stop"}"#),
            Some(InputEvent::Session {
                action: SessionAction::Stop
            })
        );
        assert_eq!(
            parse_line(r#"{"type":"chat","text":"hi"}"#),
            Some(InputEvent::Chat { text: "hi".into() })
        );
        assert_eq!(
            parse_line(r#"{"type":"chat_clear"}"#),
            Some(InputEvent::ChatClear)
        );
        assert_eq!(
            parse_line(r#"{"type":"resize","width":480}"#),
            Some(InputEvent::Resize { width: 480 })
        );
    }

    #[test]
    fn test_malformed_and_blank_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   # comment"), None);
        assert_eq!(parse_line("{not json"), None);
        assert_eq!(parse_line(r#"{"type":"teleport"}"#), None);
    }

    #[tokio::test]
    async fn test_read_events_skips_bad_lines_and_waits() {
        let input = b"{\"type\":\"gesture\",\"name\":\"Down\"}\n\
                      garbage\n\
                      {\"type\":\"wait\",\"ms\":1}\n\
                      {\"type\":\"keys\",\"text\":\"hi\"}\n";
        let (tx, mut rx) = mpsc::channel(8);
        read_events(&input[..], tx).await.unwrap();

        let mut seen = Vec::new();
        while let Some(event) = rx.recv().await {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                InputEvent::Gesture {
                    name: "Down".into()
                },
                InputEvent::Keys { text: "hi".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_read_events_stops_when_receiver_is_gone() {
        let input = b"{\"type\":\"keys\",\"text\":\"a\"}\n{\"type\":\"keys\",\"text\":\"b\"}\n";
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        assert!(read_events(&input[..], tx).await.is_ok());
    }
}
