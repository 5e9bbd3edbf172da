//! Test-only fakes for the terminal, clock and event log.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::core::model::{Limits, Session};
use crate::core::parser::parse_bytes;
use crate::io::clock::Clock;
use crate::io::event_log::{EventLog, EventLogError};
use crate::io::terminal::{Terminal, TerminalError};

/// Two groups of two items each.
pub const EXAMPLE_SESSION: &str = "[Greetings|5]\nHello\nBonjour\n[Numbers|5]\nOne\nTwo\n";

/// Parse `text` with default limits.
pub fn session(text: &str) -> Session {
    parse_bytes(text.as_bytes().to_vec(), &Limits::default()).expect("parse test session")
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// One scripted response to `read_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedInput {
    Key(u8),
    /// The read times out: the attached clock advances by the full timeout.
    Timeout,
    /// No key arrives, `ms` pass on the attached clock.
    Wait(u64),
}

/// Terminal that replays a fixed input script and records what was drawn.
#[derive(Debug, Default)]
pub struct ScriptedTerminal {
    script: VecDeque<ScriptedInput>,
    repeat: Option<ScriptedInput>,
    clock: Option<ManualClock>,
    fail_enter_raw: bool,
    raw: bool,
    cursor_hidden: bool,
    screen_cleared: bool,
    restore_calls: usize,
    drawn: Vec<String>,
    timeouts: Vec<Option<Duration>>,
}

impl ScriptedTerminal {
    pub fn new(script: Vec<ScriptedInput>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Advance `clock` when the script times out or waits.
    pub fn with_clock(mut self, clock: &ManualClock) -> Self {
        self.clock = Some(clock.clone());
        self
    }

    /// Once the script is exhausted, answer every read with `input`.
    pub fn repeat_when_empty(mut self, input: ScriptedInput) -> Self {
        self.repeat = Some(input);
        self
    }

    pub fn fail_enter_raw(mut self) -> Self {
        self.fail_enter_raw = true;
        self
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn cursor_hidden(&self) -> bool {
        self.cursor_hidden
    }

    pub fn screen_cleared(&self) -> bool {
        self.screen_cleared
    }

    pub fn restore_calls(&self) -> usize {
        self.restore_calls
    }

    /// Prompts drawn so far, in order.
    pub fn drawn(&self) -> &[String] {
        &self.drawn
    }

    /// Timeouts passed to `read_key`, in order.
    pub fn timeouts(&self) -> &[Option<Duration>] {
        &self.timeouts
    }

    fn advance_clock(&self, ms: u64) {
        if let Some(clock) = &self.clock {
            clock.advance(ms);
        }
    }
}

impl Terminal for ScriptedTerminal {
    fn enter_raw(&mut self) -> Result<(), TerminalError> {
        if self.fail_enter_raw {
            return Err(TerminalError::EnterRaw(std::io::Error::other("not a tty")));
        }
        self.raw = true;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), TerminalError> {
        self.restore_calls += 1;
        self.raw = false;
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<(), TerminalError> {
        self.cursor_hidden = true;
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<(), TerminalError> {
        self.cursor_hidden = false;
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<(), TerminalError> {
        self.screen_cleared = true;
        Ok(())
    }

    fn draw_prompt(&mut self, text: &[u8]) -> Result<(), TerminalError> {
        self.drawn.push(String::from_utf8_lossy(text).into_owned());
        Ok(())
    }

    fn read_key(&mut self, timeout: Option<Duration>) -> Result<Option<u8>, TerminalError> {
        self.timeouts.push(timeout);
        let input = self
            .script
            .pop_front()
            .or(self.repeat)
            .ok_or(TerminalError::InputClosed)?;
        match input {
            ScriptedInput::Key(byte) => Ok(Some(byte)),
            ScriptedInput::Timeout => {
                if let Some(timeout) = timeout {
                    self.advance_clock(timeout.as_millis() as u64);
                }
                Ok(None)
            }
            ScriptedInput::Wait(ms) => {
                self.advance_clock(ms);
                Ok(None)
            }
        }
    }
}

/// In-memory event log. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventLog {
    records: Rc<RefCell<Vec<(String, String)>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.borrow().clone()
    }

    /// Messages recorded under `tag`, in order.
    pub fn messages(&self, tag: &str) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter(|(recorded, _)| recorded == tag)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl EventLog for MemoryEventLog {
    fn record(&mut self, tag: &str, message: &str) -> Result<(), EventLogError> {
        self.records
            .borrow_mut()
            .push((tag.to_string(), message.to_string()));
        Ok(())
    }
}
