// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Advisor Search";

/// Application name in lowercase (for paths, identifiers and the log filter)
pub const APP_NAME_LOWER: &str = "advisor_search";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".advisor-search";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "advisor-search.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "ADVISOR_SEARCH_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "ADVISOR_SEARCH_LOG";

// =============================================================================
// Environment Variables - Filter Rules
// =============================================================================

/// Environment variable for an external rule table path
pub const ENV_RULES_PATH: &str = "ADVISOR_SEARCH_RULES";

/// Environment variable to report missing required filters
pub const ENV_ENFORCE_REQUIRED: &str = "ADVISOR_SEARCH_ENFORCE_REQUIRED";

// =============================================================================
// Environment Variables - Monitor
// =============================================================================

/// Environment variable for the monitor history size
pub const ENV_HISTORY_CAPACITY: &str = "ADVISOR_SEARCH_HISTORY_CAPACITY";

/// Default number of operation records kept by the monitor
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Upper bound accepted for the history size
pub const MAX_HISTORY_CAPACITY: usize = 100_000;
