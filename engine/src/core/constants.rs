// =============================================================================
// Application Identity
// =============================================================================

/// Library crate name (log target)
pub const CRATE_TARGET: &str = "sieve_engine";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sieve.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SIEVE_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SIEVE_LOG";

/// Environment variable overriding the case-insensitive comparison token
pub const ENV_COMPARISON: &str = "SIEVE_COMPARISON";

// =============================================================================
// Exit Codes
// =============================================================================

/// `check` exit code for a tree with no usable filter
pub const EXIT_INVALID_FILTER: u8 = 2;
