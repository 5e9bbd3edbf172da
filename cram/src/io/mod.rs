//! I/O adapters for the session engine.

pub mod clock;
pub mod config;
pub mod entropy;
pub mod event_log;
pub mod terminal;
