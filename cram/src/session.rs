//! Orchestration for one `cram <session-file>` run.
//!
//! Parses the file before touching the terminal, so a malformed file is
//! reported on a normal screen. Once raw mode is on, the terminal is restored
//! on every exit path, including scheduler failures.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::core::parser::{ParseError, parse_file};
use crate::core::rng::Generator;
use crate::io::clock::Clock;
use crate::io::config::CramConfig;
use crate::io::event_log::EventSink;
use crate::io::terminal::{RawModeGuard, Terminal, TerminalError};
use crate::scheduler::{self, RunSummary, Runtime, SchedulerError};

#[derive(Debug, Error)]
pub enum CramError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Parse `path` and run an interactive session on `terminal`.
pub fn run_file<T: Terminal, C: Clock>(
    path: &Path,
    config: &CramConfig,
    events: &mut EventSink,
    terminal: &mut T,
    clock: &C,
    rng: Generator,
) -> Result<RunSummary, CramError> {
    let session = parse_file(path, &config.limits)?;
    info!(
        path = %path.display(),
        groups = session.group_count(),
        items = session.item_count(),
        "parsed session"
    );

    events.record("start", "session started");
    events.record("input", &path.display().to_string());

    let mut runtime = Runtime::new(&session, rng, config.limits);
    let outcome = run_with_terminal(&mut runtime, terminal, clock, events);

    match &outcome {
        Ok(summary) => events.record(
            "exit",
            &format!(
                "session end prompts={} groups={}",
                summary.prompts_shown, summary.groups_visited
            ),
        ),
        Err(err) => events.record("exit", &format!("session failed: {err}")),
    }
    outcome
}

fn run_with_terminal<T: Terminal, C: Clock>(
    runtime: &mut Runtime<'_>,
    terminal: &mut T,
    clock: &C,
    events: &mut EventSink,
) -> Result<RunSummary, CramError> {
    let mut guard = match RawModeGuard::enter(terminal) {
        Ok(guard) => guard,
        Err(err) => {
            events.record("error", "failed to enter raw mode");
            return Err(err.into());
        }
    };

    let result = scheduler::run(runtime, guard.terminal(), clock, events);
    let restored = guard.finish();

    match (result, restored) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(err)) => {
            events.record("error", "failed to restore terminal");
            Err(err.into())
        }
        (Err(err), restored) => {
            if let Err(restore_err) = restored {
                warn!(error = %restore_err, "terminal restore failed after loop error");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::core::keys::INTERRUPT;
    use crate::scheduler::RunEnd;
    use crate::test_support::{
        EXAMPLE_SESSION, ManualClock, MemoryEventLog, ScriptedInput, ScriptedTerminal,
    };

    #[test]
    fn parse_error_never_touches_terminal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.txt");
        fs::write(&path, "[Bad]\nitem\n").expect("write");
        let log = MemoryEventLog::new();
        let mut events = EventSink::new(log.clone());
        let mut terminal = ScriptedTerminal::new(Vec::new());

        let err = run_file(
            &path,
            &CramConfig::default(),
            &mut events,
            &mut terminal,
            &ManualClock::new(),
            Generator::from_seed(1),
        )
        .expect_err("parse error");

        assert_eq!(err.to_string(), "line 1: malformed header");
        assert!(!terminal.is_raw());
        assert_eq!(terminal.restore_calls(), 0);
        assert!(log.records().is_empty());
    }

    #[test]
    fn interrupted_run_restores_and_logs_exit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("deck.txt");
        fs::write(&path, EXAMPLE_SESSION).expect("write");
        let log = MemoryEventLog::new();
        let mut events = EventSink::new(log.clone());
        let mut terminal = ScriptedTerminal::new(vec![
            ScriptedInput::Key(b' '),
            ScriptedInput::Key(INTERRUPT),
        ]);

        let summary = run_file(
            &path,
            &CramConfig::default(),
            &mut events,
            &mut terminal,
            &ManualClock::new(),
            Generator::from_seed(2),
        )
        .expect("run");

        assert_eq!(summary.end, RunEnd::Interrupted);
        assert_eq!(summary.prompts_shown, 2);
        assert!(!terminal.is_raw());
        assert!(!terminal.cursor_hidden());
        assert!(terminal.screen_cleared());
        assert_eq!(log.messages("start"), vec!["session started"]);
        assert_eq!(log.messages("input"), vec![path.display().to_string()]);
        assert_eq!(log.messages("exit"), vec!["session end prompts=2 groups=1"]);
    }
}
