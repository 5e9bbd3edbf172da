//! Timed, shuffled flashcard prompts.
//!
//! Reads a session file of `[ name | seconds ]` groups, then shows one prompt
//! at a time in raw terminal mode until Ctrl+C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cram::exit_codes;
use cram::io::clock::MonotonicClock;
use cram::io::config::{CramConfig, load_config};
use cram::io::entropy::seed_generator;
use cram::io::event_log::open_event_sink;
use cram::io::terminal::CrosstermTerminal;
use cram::logging;
use cram::session::run_file;
use tracing::info;

const KEYS_HELP: &str = "Keys: Enter / Space / alphanumeric = next prompt, Ctrl+C = quit";

#[derive(Parser)]
#[command(
    name = "cram",
    version,
    about = "Timed, shuffled flashcard prompts in the terminal",
    after_help = KEYS_HELP
)]
struct Cli {
    /// Session file: `[ name | seconds ]` headers, each followed by prompt lines.
    session_file: PathBuf,

    /// TOML config overriding limits and the event log location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Append session events to this file instead of the configured one.
    #[arg(long, value_name = "PATH", conflicts_with = "no_log")]
    log: Option<PathBuf>,

    /// Do not write the event log.
    #[arg(long)]
    no_log: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<CramConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CramConfig::default(),
        };
        if let Some(log) = &self.log {
            config.log_enabled = true;
            config.log_path = log.clone();
        }
        if self.no_log {
            config.log_enabled = false;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_codes::FAILURE);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let mut events = open_event_sink(&config);
    let mut terminal = CrosstermTerminal::new();
    let summary = run_file(
        &cli.session_file,
        &config,
        &mut events,
        &mut terminal,
        &MonotonicClock::new(),
        seed_generator(),
    )?;
    info!(
        end = ?summary.end,
        prompts = summary.prompts_shown,
        groups = summary.groups_visited,
        "session finished"
    );
    Ok(())
}
