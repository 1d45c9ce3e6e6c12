//! Merge a stored medical profile into a validated parameter bundle.
//!
//! Resolution never fails: absent or invalid required fields are recorded in
//! `missing_fields`, and absent adjustment percentages take their defaults.
//! Only the full calculation decides whether incompleteness stops a dose.

use std::fmt;

use bolus_traits::MedicalProfile;

use crate::config::{AdjustmentPercents, FallbackParams};

/// Required profile fields, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    InsulinCarbRatio,
    CorrectionFactor,
    TargetGlucose,
}

impl ProfileField {
    pub const REQUIRED: [ProfileField; 3] = [
        ProfileField::InsulinCarbRatio,
        ProfileField::CorrectionFactor,
        ProfileField::TargetGlucose,
    ];

    /// Name shown to the user when prompting to complete the profile.
    pub fn display_name(self) -> &'static str {
        match self {
            ProfileField::InsulinCarbRatio => "Insulin to Carb Ratio (ICR)",
            ProfileField::CorrectionFactor => "Correction Factor (ISF)",
            ProfileField::TargetGlucose => "Target Glucose",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parameters resolved from a profile. Required fields are `Some` only when
/// present and valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParams {
    pub insulin_carb_ratio: Option<f32>,
    pub correction_factor: Option<f32>,
    pub target_glucose: Option<u16>,
    pub adjustments: AdjustmentPercents,
    pub missing_fields: Vec<ProfileField>,
}

/// A profile with every required field present and positive.
///
/// The adjusted calculation only accepts this type, so its divisions can
/// never see a zero or absent correction factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteParams {
    pub insulin_carb_ratio: f32,
    pub correction_factor: f32,
    pub target_glucose: u16,
    pub adjustments: AdjustmentPercents,
}

impl ResolvedParams {
    pub fn is_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }

    /// All required fields, or `None` when any is missing.
    pub fn complete(&self) -> Option<CompleteParams> {
        Some(CompleteParams {
            insulin_carb_ratio: self.insulin_carb_ratio?,
            correction_factor: self.correction_factor?,
            target_glucose: self.target_glucose?,
            adjustments: self.adjustments,
        })
    }

    /// Fill every missing required field from `fallback`.
    ///
    /// `fallback` is validated when the calculator is built, so the result
    /// is always usable for arithmetic.
    pub fn with_fallback(&self, fallback: &FallbackParams) -> CompleteParams {
        CompleteParams {
            insulin_carb_ratio: self
                .insulin_carb_ratio
                .unwrap_or(fallback.insulin_carb_ratio),
            correction_factor: self
                .correction_factor
                .unwrap_or(fallback.correction_factor),
            target_glucose: self.target_glucose.unwrap_or(fallback.target_glucose),
            adjustments: self.adjustments,
        }
    }

    pub fn missing_field_names(&self) -> Vec<&'static str> {
        self.missing_fields
            .iter()
            .map(|f| f.display_name())
            .collect()
    }
}

#[inline]
fn positive(v: Option<f32>) -> Option<f32> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

/// Build a `ResolvedParams` from an optional profile.
///
/// An absent profile yields all three required fields missing and the
/// default adjustment percentages.
pub fn resolve(profile: Option<&MedicalProfile>, defaults: &AdjustmentPercents) -> ResolvedParams {
    let empty = MedicalProfile::default();
    let p = profile.unwrap_or(&empty);

    let insulin_carb_ratio = positive(p.insulin_carb_ratio);
    let correction_factor = positive(p.correction_factor);
    let target_glucose = p.target_glucose.filter(|t| *t > 0);

    let mut missing_fields = Vec::with_capacity(3);
    if insulin_carb_ratio.is_none() {
        missing_fields.push(ProfileField::InsulinCarbRatio);
    }
    if correction_factor.is_none() {
        missing_fields.push(ProfileField::CorrectionFactor);
    }
    if target_glucose.is_none() {
        missing_fields.push(ProfileField::TargetGlucose);
    }
    if !missing_fields.is_empty() {
        tracing::debug!(
            profile_present = profile.is_some(),
            missing = ?missing_fields,
            "profile has missing or invalid required fields"
        );
    }

    let adjustments = AdjustmentPercents {
        sick_day: p.sick_day_percent.unwrap_or(defaults.sick_day),
        stress: p.stress_percent.unwrap_or(defaults.stress),
        light_exercise: p.light_exercise_percent.unwrap_or(defaults.light_exercise),
        intense_exercise: p
            .intense_exercise_percent
            .unwrap_or(defaults.intense_exercise),
    };

    ResolvedParams {
        insulin_carb_ratio,
        correction_factor,
        target_glucose,
        adjustments,
        missing_fields,
    }
}
