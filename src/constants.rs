//! Shared Constants
//!
//! Storage keys, defaults, and limits used across the application.

// ==================== Storage Keys ====================

/// Map of every saved scenario, serialized as one JSON object
pub const SAVED_CONFIGURATIONS_KEY: &str = "analyticsSavedConfigurations";
/// Name of the scenario the live settings are based on
pub const ACTIVE_CONFIGURATION_KEY: &str = "analyticsActiveConfigurationName";
/// `"true"` / `"false"` marker for unsaved live changes
pub const MODIFIED_FLAG_KEY: &str = "analyticsConfigurationModified";

pub const LIVE_FILTERS_KEY: &str = "analyticsFilters";
pub const LIVE_ENABLED_KEY: &str = "analyticsFieldEnabledStatus";
pub const LIVE_FORMATS_KEY: &str = "analyticsFieldNumericFormats";
pub const LIVE_TIPS_KEY: &str = "analyticsFieldInfoTips";
pub const LIVE_RULES_KEY: &str = "analyticsTransformationRules";
pub const POST_TRANSFORM_ENABLED_KEY: &str = "analyticsPostTransformEnabledStatus";
pub const POST_TRANSFORM_FORMATS_KEY: &str = "analyticsPostTransformNumericFormats";
pub const POST_TRANSFORM_TIPS_KEY: &str = "analyticsPostTransformInfoTips";

// ==================== Scenarios ====================

/// Scenario preferred by first-render selection
pub const DEFAULT_SCENARIO_NAME: &str = "Default";
/// Name used when an imported file name sanitizes to nothing
pub const IMPORTED_SCENARIO_FALLBACK: &str = "Imported_Scenario";
/// Maximum length of a name derived from an imported file
pub const IMPORTED_NAME_MAX_LEN: usize = 50;
/// Prefix of exported scenario file names
pub const EXPORT_FILE_PREFIX: &str = "analytics_scenario_";

// ==================== Inheritance Defaults ====================

pub const DEFAULT_FIELD_ENABLED: bool = true;
pub const DEFAULT_NUMERIC_FORMAT: &str = "default";
pub const DEFAULT_INFO_TIP: &str = "";

// ==================== Mass Fetch ====================

/// Default job API base URL
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
/// Job status polling interval
pub const JOB_POLL_INTERVAL_MS: u64 = 2000;
/// HTTP request timeout for job endpoints
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Progress messages kept per job
pub const JOB_PROGRESS_LOG_CAPACITY: usize = 200;
