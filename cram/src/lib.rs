//! Timed, shuffled flashcard prompts in the terminal.
//!
//! A session file lists topic groups, each with a display duration, followed by
//! one prompt per line. `cram` shows one prompt at a time, rotating through a
//! group's prompts on every advancing key and moving to a new group once the
//! group's time is up. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (arena model, parser, generator,
//!   key classification). Fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (terminal, clock, event log, config,
//!   entropy). Behind traits where the scheduler consumes them, so tests can
//!   script them.
//!
//! [`scheduler`] drives the interactive loop; [`session`] wires parsing,
//! terminal setup and cleanup around it for the CLI.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod scheduler;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
