//! Human-readable error descriptions and structured JSON error formatting.

use bolus_core::DoseError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(de) = err.downcast_ref::<DoseError>() {
        return match de {
            DoseError::InvalidInput(msg) => format!(
                "What happened: The request was rejected ({msg}).\nLikely causes: Negative or non-numeric carbs, or an unknown activity level.\nHow to fix: Pass --carbs as grams >= 0 and --activity as normal, light or intense."
            ),
            DoseError::ProfileStore(msg) => format!(
                "What happened: The user's profile could not be read ({msg}).\nLikely causes: Profile store unavailable.\nHow to fix: Retry, or calculate without --user to use default parameters."
            ),
            DoseError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or an unreadable profile row.\nHow to fix: Edit the config or profile CSV, then rerun."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading.
    // `{:#}` includes the wrapped causes.
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("profile csv must have headers") {
        return "Invalid headers in profile CSV. Expected 'user_id,insulin_carb_ratio,correction_factor,target_glucose,sick_day_percent,stress_percent,light_exercise_percent,intense_exercise_percent'.".to_string();
    }

    if lower.contains("open profile csv") {
        return format!(
            "What happened: The profile CSV could not be opened.\nLikely causes: Wrong --profiles path or [profiles].csv entry.\nHow to fix: Point to an existing file. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("invalid config") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    format!(
        "Something went wrong.\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: invalid input 3, profile store 4, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<DoseError>() {
        Some(DoseError::InvalidInput(_)) => 3,
        Some(DoseError::ProfileStore(_)) => 4,
        _ => 1,
    }
}

pub fn error_reason_name(err: &eyre::Report) -> &'static str {
    match err.downcast_ref::<DoseError>() {
        Some(DoseError::InvalidInput(_)) => "InvalidInput",
        Some(DoseError::ProfileStore(_)) => "ProfileStore",
        Some(DoseError::Config(_)) => "Config",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({ "reason": error_reason_name(err), "message": humanize(err) }).to_string()
}
