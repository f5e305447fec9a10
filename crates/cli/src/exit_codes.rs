//! CLI Exit Code Registry
//!
//! Single source of truth for `vinmerge` exit codes. Scripts rely on them.
//!
//! | Code | Description                                         |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unspecified)                         |
//! | 2    | CLI usage error (bad args)                          |
//! | 60   | Invalid config (parse or validation)                |
//! | 61   | Runtime failure (unreadable file, missing column)   |
//! | 62   | A configured quality check failed                   |
//!
//! New codes go in the 60-69 range, documented here and wired into the
//! command that raises them.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments. clap exits with this code on its own.
#[allow(dead_code)]
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 60;

/// Sources could not be read or are structurally unusable.
pub const EXIT_RUNTIME: u8 = 61;

/// Outputs were written but at least one quality check failed.
pub const EXIT_CHECK_FAILED: u8 = 62;
