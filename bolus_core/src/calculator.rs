//! Bolus dose calculation.
//!
//! Two strategies coexist and are selected explicitly:
//!
//! - **Simple**: carb dose plus a correction that never goes below zero.
//!   Absent profile fields are filled from `FallbackParams`; situational
//!   flags are ignored.
//! - **Full**: requires a complete profile. Glucose below target may reduce
//!   the dose, but never by more than half the carb dose. Sick, stress and
//!   exercise adjustments are applied to the base dose.
//!
//! Both return a fresh `DoseBreakdown` per call; nothing is cached because the
//! profile may change between calls.

use std::fmt;
use std::str::FromStr;

use bolus_traits::MedicalProfile;

use crate::config::CalculatorCfg;
use crate::error::{DoseError, Result};
use crate::profile::{CompleteParams, ProfileField, resolve};
use crate::rounding::round_to_half_unit;
use crate::warning::warning_for;

/// Activity reported with a meal. Exercise always lowers the dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityLevel {
    #[default]
    Normal,
    Light,
    Intense,
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Normal => "normal",
            ActivityLevel::Light => "light",
            ActivityLevel::Intense => "intense",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = DoseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ActivityLevel::Normal),
            "light" => Ok(ActivityLevel::Light),
            "intense" => Ok(ActivityLevel::Intense),
            other => Err(DoseError::InvalidInput(format!(
                "unknown activity level '{other}' (expected normal|light|intense)"
            ))),
        }
    }
}

/// Which calculation strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    Simple,
    Full,
}

impl CalculationMode {
    /// Full when the request carries any situational adjustment, else Simple.
    pub fn infer(request: &DoseRequest) -> Self {
        if request.has_adjustments() {
            CalculationMode::Full
        } else {
            CalculationMode::Simple
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CalculationMode::Simple => "simple",
            CalculationMode::Full => "full",
        }
    }
}

impl fmt::Display for CalculationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DoseRequest {
    /// Carbohydrate grams in the meal. Zero is a valid correction-only request.
    pub total_carbs: f32,
    /// Current glucose in mg/dL; enables the correction term.
    pub current_glucose: Option<u16>,
    pub activity_level: Option<ActivityLevel>,
    pub sick_mode: bool,
    pub stress_mode: bool,
}

impl DoseRequest {
    pub fn new(total_carbs: f32) -> Self {
        Self {
            total_carbs,
            ..Self::default()
        }
    }

    /// True when any flag that only the full strategy honors is set.
    pub fn has_adjustments(&self) -> bool {
        self.sick_mode
            || self.stress_mode
            || matches!(
                self.activity_level,
                Some(ActivityLevel::Light | ActivityLevel::Intense)
            )
    }

    fn validate(&self) -> Result<()> {
        if !self.total_carbs.is_finite() {
            return Err(eyre::Report::new(DoseError::InvalidInput(
                "total carbs must be a finite number".to_string(),
            )));
        }
        if self.total_carbs < 0.0 {
            return Err(eyre::Report::new(DoseError::InvalidInput(format!(
                "total carbs must be >= 0 g, got {}",
                self.total_carbs
            ))));
        }
        Ok(())
    }
}

/// Structured result of a calculation. All doses are in insulin units.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseBreakdown {
    pub mode: CalculationMode,
    pub carb_dose: f32,
    pub correction_dose: f32,
    pub sick_adjustment: f32,
    pub stress_adjustment: f32,
    /// Zero or negative.
    pub exercise_adjustment: f32,
    /// `carb_dose + correction_dose`, before adjustments.
    pub base_dose: f32,
    /// Base plus adjustments, never negative.
    pub total_dose: f32,
    /// `total_dose` rounded to the nearest 0.5 unit.
    pub rounded_dose: f32,
    pub warning: Option<String>,
    pub profile_complete: bool,
    pub missing_fields: Vec<ProfileField>,
}

impl DoseBreakdown {
    /// All-zero result for a full calculation that lacks required profile fields.
    fn incomplete(missing_fields: Vec<ProfileField>) -> Self {
        Self {
            mode: CalculationMode::Full,
            carb_dose: 0.0,
            correction_dose: 0.0,
            sick_adjustment: 0.0,
            stress_adjustment: 0.0,
            exercise_adjustment: 0.0,
            base_dose: 0.0,
            total_dose: 0.0,
            rounded_dose: 0.0,
            warning: None,
            profile_complete: false,
            missing_fields,
        }
    }

    pub fn missing_field_names(&self) -> Vec<&'static str> {
        self.missing_fields
            .iter()
            .map(|f| f.display_name())
            .collect()
    }
}

// -0.0 prints as "-0" and reads like a reduction; report plain zero.
#[inline]
fn unsigned_zero(x: f32) -> f32 {
    if x == 0.0 { 0.0 } else { x }
}

// Carbs large enough to overflow f32 arithmetic are rejected, not rounded.
fn finite_dose(total: f32, request: &DoseRequest) -> Result<f32> {
    if total.is_finite() {
        Ok(total)
    } else {
        Err(eyre::Report::new(DoseError::InvalidInput(format!(
            "total carbs {} g produce a dose that is not a finite number",
            request.total_carbs
        ))))
    }
}

#[inline]
fn percent_of(base: f32, pct: u8) -> f32 {
    base * (f32::from(pct) / 100.0)
}

/// Pure dose calculator. Cheap to clone and safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct DoseCalculator {
    cfg: CalculatorCfg,
}

impl DoseCalculator {
    /// Validate configuration and construct a calculator.
    pub fn new(cfg: CalculatorCfg) -> Result<Self> {
        let fb = &cfg.fallback;
        if !(fb.insulin_carb_ratio.is_finite() && fb.insulin_carb_ratio > 0.0) {
            return Err(eyre::Report::new(DoseError::Config(
                "fallback insulin_carb_ratio must be > 0".to_string(),
            )));
        }
        if !(fb.correction_factor.is_finite() && fb.correction_factor > 0.0) {
            return Err(eyre::Report::new(DoseError::Config(
                "fallback correction_factor must be > 0".to_string(),
            )));
        }
        if fb.target_glucose == 0 {
            return Err(eyre::Report::new(DoseError::Config(
                "fallback target_glucose must be > 0".to_string(),
            )));
        }
        let w = &cfg.warnings;
        if !(w.high_dose_units.is_finite() && w.high_dose_units > 0.0) {
            return Err(eyre::Report::new(DoseError::Config(
                "high_dose_units must be > 0".to_string(),
            )));
        }
        if !(w.min_practical_dose_units.is_finite() && w.min_practical_dose_units >= 0.0) {
            return Err(eyre::Report::new(DoseError::Config(
                "min_practical_dose_units must be >= 0".to_string(),
            )));
        }
        Ok(Self { cfg })
    }

    pub fn cfg(&self) -> &CalculatorCfg {
        &self.cfg
    }

    /// Run the selected strategy.
    pub fn calculate(
        &self,
        mode: CalculationMode,
        request: &DoseRequest,
        profile: Option<&MedicalProfile>,
    ) -> Result<DoseBreakdown> {
        match mode {
            CalculationMode::Simple => self.calculate_simple(request, profile),
            CalculationMode::Full => self.calculate_full(request, profile),
        }
    }

    /// Carb dose plus non-negative correction, with fallbacks for absent fields.
    pub fn calculate_simple(
        &self,
        request: &DoseRequest,
        profile: Option<&MedicalProfile>,
    ) -> Result<DoseBreakdown> {
        request.validate()?;
        if request.has_adjustments() {
            tracing::debug!("simple calculation ignores activity/sick/stress flags");
        }

        let resolved = resolve(profile, &self.cfg.adjustments);
        let params = resolved.with_fallback(&self.cfg.fallback);

        let carb_dose = request.total_carbs * params.insulin_carb_ratio;
        let correction_dose = request
            .current_glucose
            .map(|g| {
                let delta = f32::from(g) - f32::from(params.target_glucose);
                (delta / params.correction_factor).max(0.0)
            })
            .unwrap_or(0.0);
        let base_dose = carb_dose + correction_dose;
        let total_dose = finite_dose(base_dose, request)?.max(0.0);
        let rounded_dose = round_to_half_unit(total_dose);
        let warning = warning_for(request.current_glucose, total_dose, &self.cfg.warnings);

        tracing::info!(
            mode = "simple",
            carb_dose,
            correction_dose,
            total_dose,
            rounded_dose,
            profile_complete = resolved.is_complete(),
            "dose calculated"
        );

        Ok(DoseBreakdown {
            mode: CalculationMode::Simple,
            carb_dose,
            correction_dose: unsigned_zero(correction_dose),
            sick_adjustment: 0.0,
            stress_adjustment: 0.0,
            exercise_adjustment: 0.0,
            base_dose,
            total_dose,
            rounded_dose,
            warning,
            profile_complete: resolved.is_complete(),
            missing_fields: resolved.missing_fields,
        })
    }

    /// Adjusted calculation. An incomplete profile short-circuits to an
    /// all-zero breakdown listing the missing fields.
    pub fn calculate_full(
        &self,
        request: &DoseRequest,
        profile: Option<&MedicalProfile>,
    ) -> Result<DoseBreakdown> {
        request.validate()?;

        let resolved = resolve(profile, &self.cfg.adjustments);
        let Some(params) = resolved.complete() else {
            tracing::warn!(
                missing = ?resolved.missing_field_names(),
                "profile incomplete; adjusted dose not calculated"
            );
            return Ok(DoseBreakdown::incomplete(resolved.missing_fields));
        };

        self.adjusted(request, &params)
    }

    fn adjusted(&self, request: &DoseRequest, params: &CompleteParams) -> Result<DoseBreakdown> {
        let carb_dose = request.total_carbs * params.insulin_carb_ratio;
        let correction_dose = match request.current_glucose {
            Some(g) => full_correction(g, params, carb_dose),
            None => 0.0,
        };
        let base_dose = carb_dose + correction_dose;

        let adj = &params.adjustments;
        let sick_adjustment = if request.sick_mode {
            percent_of(base_dose, adj.sick_day)
        } else {
            0.0
        };
        let stress_adjustment = if request.stress_mode {
            percent_of(base_dose, adj.stress)
        } else {
            0.0
        };
        let exercise_adjustment = match request.activity_level {
            Some(ActivityLevel::Light) => -percent_of(base_dose, adj.light_exercise),
            Some(ActivityLevel::Intense) => -percent_of(base_dose, adj.intense_exercise),
            Some(ActivityLevel::Normal) | None => 0.0,
        };

        let total_dose = finite_dose(
            base_dose + sick_adjustment + stress_adjustment + exercise_adjustment,
            request,
        )?
        .max(0.0);
        let rounded_dose = round_to_half_unit(total_dose);
        let warning = warning_for(request.current_glucose, total_dose, &self.cfg.warnings);

        tracing::info!(
            mode = "full",
            carb_dose,
            correction_dose,
            base_dose,
            sick_adjustment,
            stress_adjustment,
            exercise_adjustment,
            total_dose,
            rounded_dose,
            "dose calculated"
        );

        Ok(DoseBreakdown {
            mode: CalculationMode::Full,
            carb_dose,
            correction_dose: unsigned_zero(correction_dose),
            sick_adjustment,
            stress_adjustment,
            exercise_adjustment: unsigned_zero(exercise_adjustment),
            base_dose,
            total_dose: unsigned_zero(total_dose),
            rounded_dose: unsigned_zero(rounded_dose),
            warning,
            profile_complete: true,
            missing_fields: Vec::new(),
        })
    }
}

/// Correction for the full strategy: negative below target, but never more
/// negative than half the carb dose.
fn full_correction(glucose: u16, params: &CompleteParams, carb_dose: f32) -> f32 {
    let target = params.target_glucose;
    if glucose == target {
        return 0.0;
    }
    let raw = (f32::from(glucose) - f32::from(target)) / params.correction_factor;
    if glucose > target {
        return raw;
    }
    let floor = -0.5 * carb_dose;
    if raw < floor {
        tracing::debug!(raw, floor, "negative correction clamped to half the carb dose");
        floor
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> MedicalProfile {
        MedicalProfile {
            insulin_carb_ratio: Some(0.1),
            correction_factor: Some(50.0),
            target_glucose: Some(100),
            ..MedicalProfile::default()
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn activity_parses_case_insensitively() {
        assert_eq!("Light".parse::<ActivityLevel>().unwrap(), ActivityLevel::Light);
        assert_eq!(" intense ".parse::<ActivityLevel>().unwrap(), ActivityLevel::Intense);
        assert_eq!("normal".parse::<ActivityLevel>().unwrap(), ActivityLevel::Normal);
    }

    #[test]
    fn activity_typo_is_rejected() {
        let err = "intens".parse::<ActivityLevel>().unwrap_err();
        assert!(matches!(err, DoseError::InvalidInput(_)));
    }

    #[test]
    fn infer_mode() {
        let mut r = DoseRequest::new(40.0);
        assert_eq!(CalculationMode::infer(&r), CalculationMode::Simple);
        r.activity_level = Some(ActivityLevel::Normal);
        assert_eq!(CalculationMode::infer(&r), CalculationMode::Simple);
        r.activity_level = Some(ActivityLevel::Light);
        assert_eq!(CalculationMode::infer(&r), CalculationMode::Full);
        let r = DoseRequest {
            stress_mode: true,
            ..DoseRequest::new(40.0)
        };
        assert_eq!(CalculationMode::infer(&r), CalculationMode::Full);
    }

    #[test]
    fn correction_at_target_is_zero() {
        let c = DoseCalculator::default();
        let req = DoseRequest {
            current_glucose: Some(100),
            ..DoseRequest::new(30.0)
        };
        let b = c.calculate_full(&req, Some(&profile())).unwrap();
        assert_eq!(b.correction_dose, 0.0);
        assert!(approx(b.total_dose, 3.0));
    }

    #[test]
    fn correction_clamped_to_half_carb_dose() {
        let c = DoseCalculator::default();
        // carb dose 1.0; raw correction (40-100)/50 = -1.2, floor -0.5
        let req = DoseRequest {
            current_glucose: Some(40),
            ..DoseRequest::new(10.0)
        };
        let b = c.calculate_full(&req, Some(&profile())).unwrap();
        assert!(approx(b.correction_dose, -0.5));
        assert!(approx(b.base_dose, 0.5));
        assert!(b.warning.unwrap().contains("hypoglycemia"));
    }

    #[test]
    fn zero_carbs_below_target_reports_plain_zero() {
        let c = DoseCalculator::default();
        let req = DoseRequest {
            current_glucose: Some(80),
            activity_level: Some(ActivityLevel::Light),
            ..DoseRequest::new(0.0)
        };
        let b = c.calculate_full(&req, Some(&profile())).unwrap();
        assert!(b.correction_dose.is_sign_positive());
        assert!(b.exercise_adjustment.is_sign_positive());
        assert_eq!(b.total_dose, 0.0);
        assert_eq!(b.rounded_dose, 0.0);
    }

    #[test]
    fn simple_ignores_adjustment_flags() {
        let c = DoseCalculator::default();
        let req = DoseRequest {
            sick_mode: true,
            activity_level: Some(ActivityLevel::Intense),
            ..DoseRequest::new(50.0)
        };
        let b = c.calculate_simple(&req, Some(&profile())).unwrap();
        assert_eq!(b.sick_adjustment, 0.0);
        assert_eq!(b.exercise_adjustment, 0.0);
        assert!(approx(b.total_dose, 5.0));
    }

    #[test]
    fn negative_carbs_rejected_by_both_modes() {
        let c = DoseCalculator::default();
        let req = DoseRequest::new(-1.0);
        for mode in [CalculationMode::Simple, CalculationMode::Full] {
            let err = c.calculate(mode, &req, Some(&profile())).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DoseError>(),
                Some(DoseError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn nan_carbs_rejected() {
        let c = DoseCalculator::default();
        let err = c
            .calculate_simple(&DoseRequest::new(f32::NAN), None)
            .unwrap_err();
        assert!(format!("{err}").contains("finite"));
    }

    #[test]
    fn huge_carbs_round_within_a_quarter_unit() {
        let c = DoseCalculator::default();
        let b = c.calculate_simple(&DoseRequest::new(3.0e10), None).unwrap();
        assert!(b.total_dose > 1.0e9);
        assert!((b.rounded_dose - b.total_dose).abs() <= 0.25);
    }

    #[test]
    fn overflowing_dose_is_rejected() {
        let c = DoseCalculator::default();
        let mut p = profile();
        p.insulin_carb_ratio = Some(5.0);
        for mode in [CalculationMode::Simple, CalculationMode::Full] {
            let err = c
                .calculate(mode, &DoseRequest::new(1.0e38), Some(&p))
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<DoseError>(),
                Some(DoseError::InvalidInput(msg)) if msg.contains("not a finite number")
            ));
        }
    }

    #[test]
    fn new_rejects_unusable_fallback() {
        let mut cfg = CalculatorCfg::default();
        cfg.fallback.correction_factor = 0.0;
        let err = DoseCalculator::new(cfg).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DoseError>(),
            Some(DoseError::Config(_))
        ));
    }
}
