#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and profile CSV parsing for the bolus engine.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The profile CSV loader enforces exact headers and keeps empty cells as
//!   absent values; the resolver decides later what "absent" means.
use serde::Deserialize;
use std::collections::HashSet;

/// Profile CSV schema.
///
/// Expected headers:
/// user_id,insulin_carb_ratio,correction_factor,target_glucose,sick_day_percent,stress_percent,light_exercise_percent,intense_exercise_percent
///
/// Example:
/// user_id,insulin_carb_ratio,correction_factor,target_glucose,sick_day_percent,stress_percent,light_exercise_percent,intense_exercise_percent
/// alice,1:10,50,100,,,,
/// bob,0.083,40,110,20,10,15,30
///
/// `insulin_carb_ratio` is kept as text: either the display form "1:N" or
/// the arithmetic form in units per gram.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ProfileRow {
    pub user_id: String,
    pub insulin_carb_ratio: Option<String>,
    pub correction_factor: Option<f32>,
    pub target_glucose: Option<u16>,
    pub sick_day_percent: Option<u8>,
    pub stress_percent: Option<u8>,
    pub light_exercise_percent: Option<u8>,
    pub intense_exercise_percent: Option<u8>,
}

pub const PROFILE_CSV_HEADERS: [&str; 8] = [
    "user_id",
    "insulin_carb_ratio",
    "correction_factor",
    "target_glucose",
    "sick_day_percent",
    "stress_percent",
    "light_exercise_percent",
    "intense_exercise_percent",
];

/// Fallback values used by the simple calculation for absent profile fields.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fallback {
    /// Units of insulin per gram of carbohydrate (0.1 == "1:10").
    pub insulin_carb_ratio: f32,
    /// mg/dL per unit.
    pub correction_factor: f32,
    /// mg/dL.
    pub target_glucose: u16,
}

impl Default for Fallback {
    fn default() -> Self {
        Self {
            insulin_carb_ratio: 0.1,
            correction_factor: 50.0,
            target_glucose: 100,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    pub sick_day_percent: u8,
    pub stress_percent: u8,
    pub light_exercise_percent: u8,
    pub intense_exercise_percent: u8,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            sick_day_percent: 15,
            stress_percent: 10,
            light_exercise_percent: 15,
            intense_exercise_percent: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Warnings {
    /// Below this reading the patient should treat hypoglycemia before dosing.
    pub low_glucose_mg_dl: u16,
    /// Above this reading a ketone check is advised.
    pub high_glucose_mg_dl: u16,
    /// Doses above this many units must be double-checked before injection.
    pub high_dose_units: f32,
    /// Positive doses below this are flagged as impractical to inject.
    pub min_practical_dose_units: f32,
}

impl Default for Warnings {
    fn default() -> Self {
        Self {
            low_glucose_mg_dl: 70,
            high_glucose_mg_dl: 250,
            high_dose_units: 15.0,
            min_practical_dose_units: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeCfg {
    /// Pick per request: adjusted calculation when any adjustment flag is set.
    #[default]
    Auto,
    Simple,
    Full,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Calculation {
    pub mode: ModeCfg,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
    /// Lifetime of a cached scan result in hours.
    pub scan_ttl_hours: u64,
}

impl Default for Cache {
    fn default() -> Self {
        Self { scan_ttl_hours: 24 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Profiles {
    /// Optional profile CSV; the CLI `--profiles` flag takes precedence.
    pub csv: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub fallback: Fallback,
    pub adjustments: Adjustments,
    pub warnings: Warnings,
    pub calculation: Calculation,
    pub cache: Cache,
    pub profiles: Profiles,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_profiles_csv(path: &std::path::Path) -> eyre::Result<Vec<ProfileRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open profile CSV {:?}: {}", path, e))?;
    read_profiles(rdr, &format!("{path:?}"))
}

/// Parse profile rows from in-memory CSV text (same rules as `load_profiles_csv`).
pub fn parse_profiles_csv(text: &str) -> eyre::Result<Vec<ProfileRow>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    read_profiles(rdr, "<memory>")
}

fn read_profiles<R: std::io::Read>(
    mut rdr: csv::Reader<R>,
    origin: &str,
) -> eyre::Result<Vec<ProfileRow>> {
    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {}: {}", origin, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != PROFILE_CSV_HEADERS {
        eyre::bail!(
            "profile CSV must have headers '{}', got: {}",
            PROFILE_CSV_HEADERS.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        match rec {
            Ok(row) => {
                if row.user_id.is_empty() {
                    eyre::bail!("profile CSV row {} has an empty user_id", idx + 2);
                }
                if !seen.insert(row.user_id.clone()) {
                    eyre::bail!(
                        "profile CSV row {} duplicates user_id '{}'",
                        idx + 2,
                        row.user_id
                    );
                }
                rows.push(row);
            }
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Fallback
        let ratio = self.fallback.insulin_carb_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            eyre::bail!("fallback.insulin_carb_ratio must be > 0 (units per gram)");
        }
        if ratio > 1.0 {
            eyre::bail!(
                "fallback.insulin_carb_ratio is unreasonably large (>1 unit per gram); expected units per gram, not grams per unit"
            );
        }
        let cf = self.fallback.correction_factor;
        if !(cf.is_finite() && cf > 0.0) {
            eyre::bail!("fallback.correction_factor must be > 0");
        }
        if self.fallback.target_glucose == 0 {
            eyre::bail!("fallback.target_glucose must be > 0");
        }

        // Adjustments
        for (name, pct) in [
            ("adjustments.sick_day_percent", self.adjustments.sick_day_percent),
            ("adjustments.stress_percent", self.adjustments.stress_percent),
            (
                "adjustments.light_exercise_percent",
                self.adjustments.light_exercise_percent,
            ),
            (
                "adjustments.intense_exercise_percent",
                self.adjustments.intense_exercise_percent,
            ),
        ] {
            if pct > 100 {
                eyre::bail!("{name} must be in [0, 100]");
            }
        }

        // Warnings
        if self.warnings.low_glucose_mg_dl >= self.warnings.high_glucose_mg_dl {
            eyre::bail!("warnings.low_glucose_mg_dl must be < warnings.high_glucose_mg_dl");
        }
        let hd = self.warnings.high_dose_units;
        if !(hd.is_finite() && hd > 0.0) {
            eyre::bail!("warnings.high_dose_units must be > 0");
        }
        let md = self.warnings.min_practical_dose_units;
        if !(md.is_finite() && md >= 0.0) {
            eyre::bail!("warnings.min_practical_dose_units must be >= 0");
        }
        if md >= hd {
            eyre::bail!("warnings.min_practical_dose_units must be < warnings.high_dose_units");
        }

        // Cache
        if self.cache.scan_ttl_hours == 0 {
            eyre::bail!("cache.scan_ttl_hours must be >= 1");
        }
        if self.cache.scan_ttl_hours > 24 * 30 {
            eyre::bail!("cache.scan_ttl_hours is unreasonably large (>30 days)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Calculation: serde restricts to known modes

        Ok(())
    }
}
