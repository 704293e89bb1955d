//! Exit codes
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Release or object not found
pub const NOT_FOUND: i32 = 2;

/// Chart could not be located, loaded or has unmet dependencies
pub const CHART_ERROR: i32 = 3;

/// Repository file, lock or index download failed
pub const REPO_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Cluster connection or API failure
pub const KUBE_ERROR: i32 = 6;

/// Usage error - invalid arguments or values (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;

/// Helm binary missing (following shell convention for "command not found")
pub const ENGINE_UNAVAILABLE: i32 = 127;
