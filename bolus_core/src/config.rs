//! Configuration types for the calculation engine.
//!
//! These are the runtime configuration structs used by `DoseCalculator`.
//! They are separate from the TOML-deserialized config in `bolus_config`.

/// Values substituted by the simple calculation when a profile field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackParams {
    /// Units of insulin per gram of carbohydrate.
    pub insulin_carb_ratio: f32,
    /// mg/dL per unit.
    pub correction_factor: f32,
    /// mg/dL.
    pub target_glucose: u16,
}

impl Default for FallbackParams {
    fn default() -> Self {
        Self {
            insulin_carb_ratio: 0.1,
            correction_factor: 50.0,
            target_glucose: 100,
        }
    }
}

/// Situational adjustment percentages. Never required; defaults fill any gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentPercents {
    pub sick_day: u8,
    pub stress: u8,
    pub light_exercise: u8,
    pub intense_exercise: u8,
}

impl Default for AdjustmentPercents {
    fn default() -> Self {
        Self {
            sick_day: 15,
            stress: 10,
            light_exercise: 15,
            intense_exercise: 30,
        }
    }
}

/// Safety thresholds for dose advisories.
///
/// A single high-dose threshold applies to both calculation modes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningThresholds {
    pub low_glucose_mg_dl: u16,
    pub high_glucose_mg_dl: u16,
    pub high_dose_units: f32,
    pub min_practical_dose_units: f32,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            low_glucose_mg_dl: 70,
            high_glucose_mg_dl: 250,
            high_dose_units: 15.0,
            min_practical_dose_units: 0.5,
        }
    }
}

/// Everything the calculator needs besides the request and the profile.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CalculatorCfg {
    pub fallback: FallbackParams,
    pub adjustments: AdjustmentPercents,
    pub warnings: WarningThresholds,
}
