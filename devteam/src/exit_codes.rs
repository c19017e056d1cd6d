//! Stable exit codes for devteam CLI commands.

/// Command succeeded; for `run` and `exec`, the product executed cleanly.
pub const OK: i32 = 0;
/// Invalid config, arguments, or any host-side failure.
pub const INVALID: i32 = 1;
/// The generated (or supplied) program raised, timed out, or crashed.
pub const EXECUTION_FAILED: i32 = 2;
/// The text-generation backend failed; the run was aborted.
pub const GENERATION_FAILED: i32 = 3;
