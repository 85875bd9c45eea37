// CLI module - command-line argument parsing and handlers
//
// With no subcommand the navigator runs: the developer console by default,
// or a headless replay of newline-delimited input events.
//
// Subcommands for configuration management:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --edit: Open config file in $EDITOR
// - config --path: Print the config file location

use crate::config::{Config, VERSION};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// voicelink - hands-free conversation navigator
#[derive(Parser)]
#[command(name = "voicelink")]
#[command(version = VERSION)]
#[command(about = "Hands-free conversation navigator driven by face gestures", long_about = None)]
pub struct Cli {
    /// Replay input events (JSON lines) from a file instead of the console;
    /// use "-" for stdin
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Use canned suggestions and log mail instead of sending it
    #[arg(long)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Print the effective configuration as TOML
        #[arg(long)]
        show: bool,

        /// Overwrite the config file with defaults
        #[arg(long)]
        reset: bool,

        /// Open the config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Print the config file location
        #[arg(long)]
        path: bool,
    },
}

/// How the navigator should run once CLI handling is done
#[derive(Debug, PartialEq, Eq)]
pub enum RunMode {
    Console,
    /// `None` reads stdin
    Replay(Option<PathBuf>),
}

/// What main should do after parsing
pub enum Outcome {
    /// A subcommand ran; exit
    Handled,
    Run { mode: RunMode, demo: bool },
}

/// Parse the command line and handle subcommands
pub fn handle_cli() -> Outcome {
    let cli = Cli::parse();

    let Some(Commands::Config {
        show,
        reset,
        edit,
        path,
    }) = cli.command
    else {
        return Outcome::Run {
            mode: run_mode(cli.replay),
            demo: cli.demo,
        };
    };

    let result = if path {
        config_path().map(|path| println!("{}", path.display()))
    } else if show {
        show_config();
        Ok(())
    } else if reset {
        reset_config()
    } else if edit {
        edit_config()
    } else {
        print_config_usage();
        Ok(())
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Outcome::Handled
}

fn run_mode(replay: Option<PathBuf>) -> RunMode {
    match replay {
        Some(path) if path.as_os_str() == "-" => RunMode::Replay(None),
        Some(path) => RunMode::Replay(Some(path)),
        None => RunMode::Console,
    }
}

fn config_path() -> Result<PathBuf> {
    Config::config_path().context("Could not determine config path (no home directory)")
}

fn print_config_usage() {
    println!("Usage: voicelink config [--show|--reset|--edit|--path]");
    println!();
    println!("Options:");
    println!("  --show    Print the effective configuration as TOML");
    println!("  --reset   Overwrite the config file with defaults");
    println!("  --edit    Open the config file in $EDITOR");
    println!("  --path    Print the config file location");
}

fn show_config() {
    let source = match Config::config_path() {
        Some(path) if path.exists() => path.display().to_string(),
        _ => "defaults (no config file)".to_string(),
    };

    println!("# Effective configuration (env > file > defaults)");
    println!("# Source: {}", source);
    println!();
    print!("{}", Config::from_env().to_toml());
}

/// Ask on stderr so the prompt survives stdout redirection
fn confirm(question: &str) -> bool {
    eprint!("{} [y/N] ", question);
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer).is_ok() && answer.trim().eq_ignore_ascii_case("y")
}

fn reset_config() -> Result<()> {
    let path = config_path()?;
    if path.exists() && !confirm(&format!("Overwrite {}?", path.display())) {
        println!("Aborted.");
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Config::default().to_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

fn edit_config() -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| default_editor().to_string());

    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to launch editor '{}' (set $EDITOR)", editor))?;
    if !status.success() {
        bail!("Editor exited with {}", status);
    }
    Ok(())
}

fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "nano"
    }
}
