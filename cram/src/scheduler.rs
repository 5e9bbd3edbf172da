//! Interactive presentation loop.
//!
//! The scheduler owns the shuffled orderings and the cursor into them. Each
//! iteration performs one timed read, bounded by the active group's deadline:
//!
//! - Advancing key while [`SchedulerState::AwaitingInput`]: next item of the
//!   current group (reshuffled once every item has been shown).
//! - Deadline reached: [`SchedulerState::PendingSwitch`]. The switch waits for
//!   the next advancing key, which draws the next group.
//! - Ctrl+C in any state ends the run.
//!
//! Group draws walk a shuffled permutation and reshuffle when it runs out, so
//! every group is visited once per cycle.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::core::keys::{KeyAction, classify_key};
use crate::core::model::{Limits, Session};
use crate::core::rng::Generator;
use crate::io::clock::Clock;
use crate::io::event_log::EventSink;
use crate::io::terminal::{Terminal, TerminalError};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),
    #[error("input loop stalled after {attempts} reads without an advance")]
    Liveness { attempts: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Within a group, waiting for an advancing key or the group deadline.
    AwaitingInput,
    /// The group deadline passed; the next advancing key picks a new group.
    PendingSwitch,
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    Interrupted,
    /// `limits.max_prompts` advances were made.
    PromptLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub end: RunEnd,
    pub prompts_shown: usize,
    pub groups_visited: usize,
}

/// Result of waiting for one advance.
enum Step {
    Advanced,
    Interrupted,
}

/// Runtime context for one session: generator, orderings and cursor.
pub struct Runtime<'s> {
    session: &'s Session,
    limits: Limits,
    rng: Generator,
    group_order: Vec<usize>,
    item_order: Vec<usize>,
    order_pos: usize,
    group_index: usize,
    item_pos: usize,
    item_index: usize,
    deadline_ms: u64,
    state: SchedulerState,
    prompts_shown: usize,
    groups_visited: usize,
}

impl<'s> Runtime<'s> {
    /// `session` must satisfy the parser's invariants (at least one group,
    /// no empty groups).
    pub fn new(session: &'s Session, rng: Generator, limits: Limits) -> Self {
        Self {
            session,
            limits,
            rng,
            group_order: Vec::with_capacity(session.group_count()),
            item_order: Vec::with_capacity(session.max_group_len()),
            order_pos: 0,
            group_index: 0,
            item_pos: 0,
            item_index: 0,
            deadline_ms: 0,
            state: SchedulerState::AwaitingInput,
            prompts_shown: 0,
            groups_visited: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn group_index(&self) -> usize {
        self.group_index
    }

    /// Absolute index of the item on screen.
    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub fn deadline_ms(&self) -> u64 {
        self.deadline_ms
    }

    fn summary(&self, end: RunEnd) -> RunSummary {
        RunSummary {
            end,
            prompts_shown: self.prompts_shown,
            groups_visited: self.groups_visited,
        }
    }

    /// Start at a random group and show its first item.
    fn begin<T: Terminal, C: Clock>(
        &mut self,
        terminal: &mut T,
        clock: &C,
        events: &mut EventSink,
    ) -> Result<(), SchedulerError> {
        self.group_order.clear();
        self.group_order.extend(0..self.session.group_count());
        // An exhausted cursor makes the first draw shuffle the fresh order.
        self.order_pos = self.group_order.len();
        self.select_next_group(events);
        self.enter_group(terminal, clock, events)
    }

    fn select_next_group(&mut self, events: &mut EventSink) {
        if self.order_pos >= self.group_order.len() {
            self.rng.shuffle(&mut self.group_order);
            self.order_pos = 0;
            events.record("shuffle", "groups");
        }
        self.group_index = self.group_order[self.order_pos];
        self.order_pos += 1;
    }

    /// Shuffle the current group's items, arm its deadline and show the first item.
    fn enter_group<T: Terminal, C: Clock>(
        &mut self,
        terminal: &mut T,
        clock: &C,
        events: &mut EventSink,
    ) -> Result<(), SchedulerError> {
        let group = *self.session.group(self.group_index);
        self.item_order.clear();
        self.item_order.extend(group.items());
        self.rng.shuffle(&mut self.item_order);
        self.item_pos = 0;
        self.deadline_ms = clock.now_ms() + group.duration_ms();
        self.state = SchedulerState::AwaitingInput;
        self.groups_visited += 1;

        let name = String::from_utf8_lossy(self.session.group_name(self.group_index));
        info!(group = self.group_index, name = %name, seconds = group.seconds, "group selected");
        events.record(
            "group",
            &format!(
                "group={} name={} seconds={}",
                self.group_index, name, group.seconds
            ),
        );
        events.record("shuffle", &format!("items group={}", self.group_index));
        self.show_current(terminal, events)
    }

    fn advance_item<T: Terminal>(
        &mut self,
        terminal: &mut T,
        events: &mut EventSink,
    ) -> Result<(), SchedulerError> {
        self.item_pos += 1;
        if self.item_pos >= self.item_order.len() {
            self.rng.shuffle(&mut self.item_order);
            self.item_pos = 0;
            events.record("shuffle", &format!("items group={}", self.group_index));
        }
        self.show_current(terminal, events)
    }

    fn show_current<T: Terminal>(
        &mut self,
        terminal: &mut T,
        events: &mut EventSink,
    ) -> Result<(), SchedulerError> {
        self.item_index = self.item_order[self.item_pos];
        terminal.draw_prompt(self.session.item_text(self.item_index))?;
        self.prompts_shown += 1;
        events.record(
            "prompt",
            &format!("group={} item={}", self.group_index, self.item_index),
        );
        Ok(())
    }

    /// Flip to `PendingSwitch` once the deadline passes. Returns the read
    /// timeout: the remaining time, or `None` (block) while a switch is pending.
    fn poll_deadline<C: Clock>(&mut self, clock: &C, events: &mut EventSink) -> Option<Duration> {
        if self.state == SchedulerState::PendingSwitch {
            return None;
        }
        let now = clock.now_ms();
        if now >= self.deadline_ms {
            self.state = SchedulerState::PendingSwitch;
            debug!(group = self.group_index, "group expired");
            events.record("expired", &format!("group={}", self.group_index));
            return None;
        }
        Some(Duration::from_millis(self.deadline_ms - now))
    }

    fn handle_key<T: Terminal, C: Clock>(
        &mut self,
        key: u8,
        terminal: &mut T,
        clock: &C,
        events: &mut EventSink,
    ) -> Result<Option<Step>, SchedulerError> {
        events.record("key", &format!("key={key}"));
        match classify_key(key) {
            KeyAction::Interrupt => Ok(Some(Step::Interrupted)),
            KeyAction::Ignore => Ok(None),
            KeyAction::Advance => {
                match self.state {
                    SchedulerState::AwaitingInput => self.advance_item(terminal, events)?,
                    SchedulerState::PendingSwitch => {
                        self.select_next_group(events);
                        self.enter_group(terminal, clock, events)?;
                    }
                }
                Ok(Some(Step::Advanced))
            }
        }
    }

    /// Read until a key advances or interrupts, within the liveness bound.
    fn wait_for_step<T: Terminal, C: Clock>(
        &mut self,
        terminal: &mut T,
        clock: &C,
        events: &mut EventSink,
    ) -> Result<Step, SchedulerError> {
        for _ in 0..self.limits.max_wait_loops {
            let timeout = self.poll_deadline(clock, events);
            let key = match terminal.read_key(timeout) {
                Ok(Some(key)) => key,
                Ok(None) => continue,
                Err(err) => {
                    events.record("error", "read input failed");
                    return Err(err.into());
                }
            };
            if let Some(step) = self.handle_key(key, terminal, clock, events)? {
                return Ok(step);
            }
        }
        events.record("error", "wait loop exceeded");
        Err(SchedulerError::Liveness {
            attempts: self.limits.max_wait_loops,
        })
    }
}

/// Run the interactive loop until Ctrl+C or the prompt limit.
///
/// Shows the first prompt immediately. The terminal must already be in raw
/// mode; restoring it is the caller's job.
pub fn run<T: Terminal, C: Clock>(
    runtime: &mut Runtime<'_>,
    terminal: &mut T,
    clock: &C,
    events: &mut EventSink,
) -> Result<RunSummary, SchedulerError> {
    runtime.begin(terminal, clock, events)?;

    let mut advances = 0usize;
    while advances < runtime.limits.max_prompts {
        match runtime.wait_for_step(terminal, clock, events)? {
            Step::Advanced => advances += 1,
            Step::Interrupted => {
                info!(prompts = runtime.prompts_shown, "interrupted");
                return Ok(runtime.summary(RunEnd::Interrupted));
            }
        }
    }
    events.record("limit", "prompt limit reached");
    Ok(runtime.summary(RunEnd::PromptLimit))
}
