//! Terminal adapter: raw mode, cursor and screen control, prompt drawing and a
//! single-key read with timeout.
//!
//! The [`Terminal`] trait decouples the scheduler from the real terminal.
//! Tests use a scripted terminal that replays keys and timeouts.
//!
//! # Cleanup
//!
//! [`RawModeGuard`] owns the "raw mode is on" state for the duration of a
//! session. [`RawModeGuard::finish`] restores the terminal, shows the cursor and
//! clears the screen, reporting a failed restore. If the guard is dropped
//! without `finish` (an early return or a panic), `Drop` performs the same
//! cleanup.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("failed to enter raw mode")]
    EnterRaw(#[source] io::Error),
    #[error("failed to restore terminal settings")]
    Restore(#[source] io::Error),
    #[error("failed to write to terminal")]
    Write(#[source] io::Error),
    #[error("failed to read input")]
    Read(#[source] io::Error),
    /// The input source has no more data (scripted terminals only).
    #[error("input closed")]
    InputClosed,
}

/// Terminal capabilities consumed by the scheduler.
pub trait Terminal {
    fn enter_raw(&mut self) -> Result<(), TerminalError>;
    fn restore(&mut self) -> Result<(), TerminalError>;
    fn hide_cursor(&mut self) -> Result<(), TerminalError>;
    fn show_cursor(&mut self) -> Result<(), TerminalError>;
    fn clear_screen(&mut self) -> Result<(), TerminalError>;
    /// Clear the screen and show `text` as the only content.
    fn draw_prompt(&mut self, text: &[u8]) -> Result<(), TerminalError>;
    /// Wait for one key. `None` blocks indefinitely. Returns `Ok(None)` on
    /// timeout, on an interrupted wait, or for input that maps to no byte.
    /// Elapsed time is the caller's concern; the timeout is not adjusted.
    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<u8>, TerminalError>;
}

/// Terminal on stdin/stdout backed by crossterm.
pub struct CrosstermTerminal {
    out: Stdout,
    raw: bool,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            raw: false,
        }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for CrosstermTerminal {
    fn enter_raw(&mut self) -> Result<(), TerminalError> {
        terminal::enable_raw_mode().map_err(TerminalError::EnterRaw)?;
        self.raw = true;
        debug!("entered raw mode");
        Ok(())
    }

    fn restore(&mut self) -> Result<(), TerminalError> {
        if !self.raw {
            return Ok(());
        }
        terminal::disable_raw_mode().map_err(TerminalError::Restore)?;
        self.raw = false;
        debug!("restored terminal");
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<(), TerminalError> {
        execute!(self.out, Hide).map_err(TerminalError::Write)
    }

    fn show_cursor(&mut self) -> Result<(), TerminalError> {
        execute!(self.out, Show).map_err(TerminalError::Write)
    }

    fn clear_screen(&mut self) -> Result<(), TerminalError> {
        execute!(self.out, Clear(ClearType::All), MoveTo(0, 0)).map_err(TerminalError::Write)
    }

    fn draw_prompt(&mut self, text: &[u8]) -> Result<(), TerminalError> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0)).map_err(TerminalError::Write)?;
        self.out.write_all(text).map_err(TerminalError::Write)?;
        // Raw mode disables output post-processing, so a bare `\n` would not
        // return the carriage.
        self.out.write_all(b"\r\n").map_err(TerminalError::Write)?;
        self.out.flush().map_err(TerminalError::Write)
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<u8>, TerminalError> {
        if let Some(timeout) = timeout {
            match event::poll(timeout) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => return Ok(None),
                Err(err) => return Err(TerminalError::Read(err)),
            }
        }
        match event::read() {
            Ok(Event::Key(key)) => Ok(key_byte(&key)),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TerminalError::Read(err)),
        }
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        if self.raw {
            let _ = terminal::disable_raw_mode();
            let _ = execute!(self.out, Show);
        }
    }
}

/// Map a key event to the byte a raw terminal would have delivered.
fn key_byte(key: &KeyEvent) -> Option<u8> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => {
            let byte = c as u8;
            if key.modifiers.contains(KeyModifiers::CONTROL) && byte.is_ascii_alphabetic() {
                Some(byte.to_ascii_lowercase() & 0x1f)
            } else {
                Some(byte)
            }
        }
        KeyCode::Enter => Some(b'\r'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x7f),
        KeyCode::Esc => Some(0x1b),
        _ => None,
    }
}

/// Keeps the terminal in raw mode until finished or dropped.
pub struct RawModeGuard<'t, T: Terminal> {
    terminal: &'t mut T,
    armed: bool,
}

impl<'t, T: Terminal> RawModeGuard<'t, T> {
    /// Enter raw mode and hide the cursor.
    pub fn enter(terminal: &'t mut T) -> Result<Self, TerminalError> {
        terminal.enter_raw()?;
        let mut guard = Self {
            terminal,
            armed: true,
        };
        if let Err(err) = guard.terminal.hide_cursor() {
            warn!(error = %err, "failed to hide cursor");
        }
        Ok(guard)
    }

    pub fn terminal(&mut self) -> &mut T {
        &mut *self.terminal
    }

    /// Restore the terminal. Cursor and screen cleanup are best-effort; a failed
    /// restore is returned.
    pub fn finish(mut self) -> Result<(), TerminalError> {
        self.armed = false;
        cleanup(&mut *self.terminal)
    }
}

impl<T: Terminal> Drop for RawModeGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            if let Err(err) = cleanup(&mut *self.terminal) {
                warn!(error = %err, "terminal cleanup failed");
            }
        }
    }
}

fn cleanup<T: Terminal>(terminal: &mut T) -> Result<(), TerminalError> {
    let restored = terminal.restore();
    if let Err(err) = terminal.show_cursor() {
        warn!(error = %err, "failed to show cursor");
    }
    if let Err(err) = terminal.clear_screen() {
        warn!(error = %err, "failed to clear screen");
    }
    restored
}
