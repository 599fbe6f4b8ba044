//! Scenario name utilities.
//!
//! Import derives a scenario name from the uploaded file name, export derives
//! a download file name from the scenario name. Both share one sanitizer.

use crate::constants::{EXPORT_FILE_PREFIX, IMPORTED_NAME_MAX_LEN, IMPORTED_SCENARIO_FALLBACK};

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive a scenario name from an imported file name
///
/// Strips a trailing `.json` (any case), sanitizes, truncates to 50 chars and
/// falls back to `Imported_Scenario` when nothing is left.
pub fn scenario_name_from_file(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let stem = if trimmed.to_ascii_lowercase().ends_with(".json") {
        &trimmed[..trimmed.len() - ".json".len()]
    } else {
        trimmed
    };

    let name: String = sanitize_name(stem)
        .chars()
        .take(IMPORTED_NAME_MAX_LEN)
        .collect();

    if name.is_empty() {
        IMPORTED_SCENARIO_FALLBACK.to_string()
    } else {
        name
    }
}

/// Download file name for an exported scenario
pub fn export_file_name(scenario_name: &str) -> String {
    format!("{EXPORT_FILE_PREFIX}{}.json", sanitize_name(scenario_name.trim()))
}

/// Trim a user-entered scenario name, rejecting blank input
pub fn normalize_scenario_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imported_name_is_sanitized_and_stripped() {
        assert_eq!(scenario_name_from_file("Q3 Plan!!.json"), "Q3_Plan__");
        assert_eq!(scenario_name_from_file("growth.v2.JSON"), "growth.v2");
    }

    #[test]
    fn imported_name_falls_back_when_empty() {
        assert_eq!(scenario_name_from_file(".json"), IMPORTED_SCENARIO_FALLBACK);
        assert_eq!(scenario_name_from_file("  "), IMPORTED_SCENARIO_FALLBACK);
    }

    #[test]
    fn imported_name_is_truncated() {
        let long = format!("{}.json", "a".repeat(80));
        assert_eq!(scenario_name_from_file(&long).len(), IMPORTED_NAME_MAX_LEN);
    }

    #[test]
    fn non_ascii_characters_become_underscores() {
        assert_eq!(sanitize_name("Ünïcode"), "_n_code");
    }

    #[test]
    fn export_name_uses_prefix() {
        assert_eq!(
            export_file_name("Value Picks"),
            "analytics_scenario_Value_Picks.json"
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(normalize_scenario_name("  Default "), Some("Default"));
        assert_eq!(normalize_scenario_name("   "), None);
    }
}
