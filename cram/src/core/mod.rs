//! Deterministic, pure logic for the session engine.
//!
//! Core modules must be free of I/O side effects, with one exception:
//! [`parser::parse_file`] reads the session file before handing the bytes to
//! the pure [`parser::parse_bytes`].

pub mod invariants;
pub mod keys;
pub mod model;
pub mod parser;
pub mod rng;
