//! Safety advisories attached to a calculated dose.

use std::fmt;

use crate::config::WarningThresholds;

/// One triggered safety condition. Variants are listed in reporting order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advisory {
    LowGlucose { glucose_mg_dl: u16 },
    HighGlucose { glucose_mg_dl: u16 },
    HighDose { dose: f32, threshold: f32 },
    BelowMinimumDose { dose: f32, minimum: f32 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::LowGlucose { glucose_mg_dl } => write!(
                f,
                "Low blood glucose ({glucose_mg_dl} mg/dL): treat hypoglycemia before taking insulin."
            ),
            Advisory::HighGlucose { glucose_mg_dl } => write!(
                f,
                "High blood glucose ({glucose_mg_dl} mg/dL): check ketones."
            ),
            Advisory::HighDose { dose, threshold } => write!(
                f,
                "Dose of {dose:.1} units exceeds {threshold:.1} units: verify before injection."
            ),
            Advisory::BelowMinimumDose { dose, minimum } => write!(
                f,
                "Dose of {dose:.2} units is below the minimum practical dose of {minimum:.1} units."
            ),
        }
    }
}

/// Every condition triggered by this reading and dose, in reporting order.
pub fn advisories(
    current_glucose: Option<u16>,
    dose: f32,
    thresholds: &WarningThresholds,
) -> Vec<Advisory> {
    let mut out = Vec::new();
    if let Some(g) = current_glucose {
        if g < thresholds.low_glucose_mg_dl {
            out.push(Advisory::LowGlucose { glucose_mg_dl: g });
        }
        if g > thresholds.high_glucose_mg_dl {
            out.push(Advisory::HighGlucose { glucose_mg_dl: g });
        }
    }
    if dose > thresholds.high_dose_units {
        out.push(Advisory::HighDose {
            dose,
            threshold: thresholds.high_dose_units,
        });
    }
    if dose > 0.0 && dose < thresholds.min_practical_dose_units {
        out.push(Advisory::BelowMinimumDose {
            dose,
            minimum: thresholds.min_practical_dose_units,
        });
    }
    out
}

/// Concatenated advisory text, or `None` when nothing triggered.
pub fn warning_for(
    current_glucose: Option<u16>,
    dose: f32,
    thresholds: &WarningThresholds,
) -> Option<String> {
    let found = advisories(current_glucose, dose, thresholds);
    if found.is_empty() {
        return None;
    }
    tracing::warn!(?current_glucose, dose, count = found.len(), "dose advisories raised");
    Some(
        found
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "),
    )
}
