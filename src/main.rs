// voicelink - hands-free conversation navigator
//
// A guest speaks; the user answers by moving a highlight with face gestures
// over suggested sentences, words, and an on-screen keyboard, and the answer
// is spoken aloud.
//
// Architecture:
// - Gesture detector: per-frame blendshape scores -> named gestures
// - Session: routes gestures to the navigator or to agent mode
// - Navigator / agents / chat panel: sync reducers that return effects
// - Runtime (tokio): executes effects, spawns fetches and timers
// - Console (ratatui) or headless replay: where input comes from

mod agent;
mod chat;
mod cli;
mod config;
mod effects;
mod gesture;
mod grid;
mod http;
mod input;
mod logging;
mod navigator;
mod runtime;
mod session;
mod speech;
mod suggest;
mod tui;

use anyhow::{Context, Result};
use cli::{Outcome, RunMode};
use config::Config;
use logging::{LogBuffer, LogOutput};
use runtime::{build_session, run_replay, Runtime, Services, CHANNEL_CAPACITY};
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    // Config subcommands exit early
    let (mode, demo_flag) = match cli::handle_cli() {
        Outcome::Handled => return Ok(()),
        Outcome::Run { mode, demo } => (mode, demo),
    };

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    config.demo |= demo_flag;

    // Console mode keeps logs off the alternate screen; replay keeps stdout
    // for the final snapshot
    let log_buffer = LogBuffer::new();
    let output = match mode {
        RunMode::Console => LogOutput::Buffer(log_buffer.clone()),
        RunMode::Replay(_) => LogOutput::Stderr,
    };
    let _file_guard = logging::init(&config.logging, output);

    tracing::info!(
        version = config::VERSION,
        demo = config.demo,
        api = %config.api_base_url,
        "Starting voicelink"
    );

    let services = Services::from_config(&config);
    let session = build_session(&config);

    match mode {
        RunMode::Console => {
            let (events_tx, events_rx) = mpsc::channel(CHANNEL_CAPACITY);
            let mut runtime = Runtime::new(session, services, events_tx);
            runtime.start_session();
            tui::run_console(runtime, events_rx, log_buffer).await?;
        }
        RunMode::Replay(path) => {
            let snapshot = match path {
                Some(path) => {
                    let file = tokio::fs::File::open(&path)
                        .await
                        .with_context(|| format!("Failed to open {}", path.display()))?;
                    run_replay(session, services, BufReader::new(file)).await?
                }
                None => run_replay(session, services, BufReader::new(tokio::io::stdin())).await?,
            };
            let json = serde_json::to_string_pretty(&snapshot)
                .context("Failed to serialize final state")?;
            println!("{}", json);
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
