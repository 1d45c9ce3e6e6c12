//! `From` implementations bridging `bolus_config` types to `bolus_core` types.

use std::time::Duration;

use bolus_traits::MedicalProfile;

use crate::calculator::CalculationMode;
use crate::config::{AdjustmentPercents, CalculatorCfg, FallbackParams, WarningThresholds};
use crate::error::{DoseError, Result};
use crate::ratio;

// ── FallbackParams ───────────────────────────────────────────────────────────

impl From<&bolus_config::Fallback> for FallbackParams {
    fn from(c: &bolus_config::Fallback) -> Self {
        Self {
            insulin_carb_ratio: c.insulin_carb_ratio,
            correction_factor: c.correction_factor,
            target_glucose: c.target_glucose,
        }
    }
}

// ── AdjustmentPercents ───────────────────────────────────────────────────────

impl From<&bolus_config::Adjustments> for AdjustmentPercents {
    fn from(c: &bolus_config::Adjustments) -> Self {
        Self {
            sick_day: c.sick_day_percent,
            stress: c.stress_percent,
            light_exercise: c.light_exercise_percent,
            intense_exercise: c.intense_exercise_percent,
        }
    }
}

// ── WarningThresholds ────────────────────────────────────────────────────────

impl From<&bolus_config::Warnings> for WarningThresholds {
    fn from(c: &bolus_config::Warnings) -> Self {
        Self {
            low_glucose_mg_dl: c.low_glucose_mg_dl,
            high_glucose_mg_dl: c.high_glucose_mg_dl,
            high_dose_units: c.high_dose_units,
            min_practical_dose_units: c.min_practical_dose_units,
        }
    }
}

// ── CalculatorCfg ────────────────────────────────────────────────────────────

impl From<&bolus_config::Config> for CalculatorCfg {
    fn from(c: &bolus_config::Config) -> Self {
        Self {
            fallback: (&c.fallback).into(),
            adjustments: (&c.adjustments).into(),
            warnings: (&c.warnings).into(),
        }
    }
}

// ── CalculationMode ──────────────────────────────────────────────────────────

/// `None` for `auto`: the mode is inferred per request.
pub fn configured_mode(c: &bolus_config::Calculation) -> Option<CalculationMode> {
    match c.mode {
        bolus_config::ModeCfg::Auto => None,
        bolus_config::ModeCfg::Simple => Some(CalculationMode::Simple),
        bolus_config::ModeCfg::Full => Some(CalculationMode::Full),
    }
}

// ── Scan cache TTL ───────────────────────────────────────────────────────────

pub fn scan_ttl(c: &bolus_config::Cache) -> Duration {
    Duration::from_secs(c.scan_ttl_hours.saturating_mul(60 * 60))
}

// ── MedicalProfile ───────────────────────────────────────────────────────────

/// Decode a profile CSV row. A ratio cell that is present but unreadable is
/// rejected rather than silently treated as missing.
pub fn profile_from_row(r: &bolus_config::ProfileRow) -> Result<MedicalProfile> {
    let insulin_carb_ratio = match r.insulin_carb_ratio.as_deref() {
        None => None,
        Some(text) => Some(ratio::parse(text).ok_or_else(|| {
            eyre::Report::new(DoseError::Config(format!(
                "profile '{}': cannot parse insulin_carb_ratio '{}' (expected 1:N or units per gram)",
                r.user_id, text
            )))
        })?),
    };
    Ok(MedicalProfile {
        insulin_carb_ratio,
        correction_factor: r.correction_factor,
        target_glucose: r.target_glucose,
        sick_day_percent: r.sick_day_percent,
        stress_percent: r.stress_percent,
        light_exercise_percent: r.light_exercise_percent,
        intense_exercise_percent: r.intense_exercise_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ratio: Option<&str>) -> bolus_config::ProfileRow {
        bolus_config::ProfileRow {
            user_id: "erin".into(),
            insulin_carb_ratio: ratio.map(str::to_string),
            correction_factor: Some(40.0),
            target_glucose: Some(110),
            sick_day_percent: None,
            stress_percent: Some(5),
            light_exercise_percent: None,
            intense_exercise_percent: None,
        }
    }

    #[test]
    fn ratio_cell_is_decoded_to_units_per_gram() {
        let p = profile_from_row(&row(Some("1:8"))).unwrap();
        assert!((p.insulin_carb_ratio.unwrap() - 0.125).abs() < 1e-7);
        assert_eq!(p.stress_percent, Some(5));

        let p = profile_from_row(&row(None)).unwrap();
        assert_eq!(p.insulin_carb_ratio, None);
    }

    #[test]
    fn unreadable_ratio_cell_is_a_config_error() {
        let err = profile_from_row(&row(Some("ten"))).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DoseError>(),
            Some(DoseError::Config(msg)) if msg.contains("erin")
        ));
    }

    #[test]
    fn auto_mode_defers_to_inference() {
        let mut c = bolus_config::Calculation::default();
        assert_eq!(configured_mode(&c), None);
        c.mode = bolus_config::ModeCfg::Full;
        assert_eq!(configured_mode(&c), Some(CalculationMode::Full));
    }

    #[test]
    fn scan_ttl_is_hours() {
        let c = bolus_config::Cache { scan_ttl_hours: 24 };
        assert_eq!(scan_ttl(&c), crate::scan_cache::DEFAULT_SCAN_TTL);
        let c = bolus_config::Cache { scan_ttl_hours: 2 };
        assert_eq!(scan_ttl(&c), Duration::from_secs(7200));
    }

    #[test]
    fn default_config_matches_runtime_defaults() {
        let cfg = CalculatorCfg::from(&bolus_config::Config::default());
        assert_eq!(cfg, CalculatorCfg::default());
    }
}
