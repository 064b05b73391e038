//! Process exit codes. Part of the public contract for CI usage.

pub const EXIT_SUCCESS: i32 = 0;
/// A run was invalid, or a score fell below `--min-score`.
pub const EXIT_BELOW_THRESHOLD: i32 = 1;
/// Bad arguments, unreadable or malformed input files, config errors.
pub const EXIT_CONFIG_ERROR: i32 = 2;
