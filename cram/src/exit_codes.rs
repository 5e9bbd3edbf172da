//! Stable exit codes for the `cram` CLI.

/// The session ended normally (Ctrl+C or prompt limit), or `--help` was shown.
pub const OK: i32 = 0;
/// The session file, config or terminal could not be used, or the loop failed.
pub const FAILURE: i32 = 1;
/// Invalid command-line arguments (reported by clap).
pub const USAGE: i32 = 2;
