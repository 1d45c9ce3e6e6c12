//! Command handlers: service assembly, dose output, ratio and profile views.

use std::path::Path;
use std::str::FromStr;

use bolus_core::conversions::configured_mode;
use bolus_core::{
    ActivityLevel, BolusService, CalculationMode, CalculatorCfg, DoseBreakdown, DoseCalculator,
    DoseError, DoseRequest, InMemoryProfileStore, ResolvedParams, UserId, ratio,
};
use eyre::WrapErr;
use serde_json::json;

use crate::cli::ModeArg;

/// Load the TOML config. A missing file yields built-in defaults.
pub fn load_config(path: &Path) -> eyre::Result<bolus_config::Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found; using defaults");
        return Ok(bolus_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = bolus_config::load_toml(&text).wrap_err("parse config")?;
    cfg.validate().wrap_err("invalid config")?;
    Ok(cfg)
}

/// Build the service from config plus the profile CSV (flag wins over config).
pub fn build_service(
    cfg: &bolus_config::Config,
    profiles: Option<&Path>,
) -> eyre::Result<BolusService<InMemoryProfileStore>> {
    let csv_path = profiles
        .map(Path::to_path_buf)
        .or_else(|| cfg.profiles.csv.as_ref().map(Into::into));
    let store = match csv_path {
        Some(p) => {
            let rows = bolus_config::load_profiles_csv(&p)?;
            InMemoryProfileStore::from_rows(&rows)?
        }
        None => InMemoryProfileStore::new(),
    };
    let calculator = DoseCalculator::new(CalculatorCfg::from(cfg))?;
    Ok(BolusService::new(store, calculator).with_default_mode(configured_mode(&cfg.calculation)))
}

pub struct DoseArgs<'a> {
    pub carbs: f32,
    pub glucose: Option<u16>,
    pub user: Option<&'a str>,
    pub activity: Option<&'a str>,
    pub sick: bool,
    pub stress: bool,
    pub mode: ModeArg,
}

pub fn run_dose(
    service: &BolusService<InMemoryProfileStore>,
    args: &DoseArgs<'_>,
    json: bool,
) -> eyre::Result<()> {
    let activity_level = args
        .activity
        .map(ActivityLevel::from_str)
        .transpose()
        .map_err(eyre::Report::new)?;
    let request = DoseRequest {
        total_carbs: args.carbs,
        current_glucose: args.glucose,
        activity_level,
        sick_mode: args.sick,
        stress_mode: args.stress,
    };
    let mode = match args.mode {
        ModeArg::Auto => None,
        ModeArg::Simple => Some(CalculationMode::Simple),
        ModeArg::Full => Some(CalculationMode::Full),
    };
    let user = args.user.map(UserId::new);
    let breakdown = service.dose(user.as_ref(), &request, mode)?;

    if json {
        println!("{}", breakdown_json(&breakdown));
    } else {
        print_breakdown(&breakdown);
    }
    Ok(())
}

pub fn breakdown_json(b: &DoseBreakdown) -> serde_json::Value {
    json!({
        "mode": b.mode.as_str(),
        "carb_dose": b.carb_dose,
        "correction_dose": b.correction_dose,
        "sick_adjustment": b.sick_adjustment,
        "stress_adjustment": b.stress_adjustment,
        "exercise_adjustment": b.exercise_adjustment,
        "base_dose": b.base_dose,
        "total_dose": b.total_dose,
        "rounded_dose": b.rounded_dose,
        "warning": b.warning,
        "profile_complete": b.profile_complete,
        "missing_fields": b.missing_field_names(),
    })
}

fn print_breakdown(b: &DoseBreakdown) {
    // Only the adjusted calculation withholds a dose for an incomplete profile.
    if b.mode == CalculationMode::Full && !b.profile_complete {
        println!(
            "Profile incomplete; complete it before using the adjusted calculation. Missing: {}",
            b.missing_field_names().join(", ")
        );
        return;
    }
    println!("mode:        {}", b.mode);
    println!("carb dose:   {:.2} U", b.carb_dose);
    println!("correction:  {:.2} U", b.correction_dose);
    if b.mode == CalculationMode::Full {
        println!("sick:        {:+.2} U", b.sick_adjustment);
        println!("stress:      {:+.2} U", b.stress_adjustment);
        println!("exercise:    {:+.2} U", b.exercise_adjustment);
    }
    println!("total:       {:.2} U", b.total_dose);
    println!("recommended: {:.1} U", b.rounded_dose);
    if let Some(w) = &b.warning {
        println!("warning:     {w}");
    }
    if !b.profile_complete {
        println!(
            "note:        default values used for {}",
            b.missing_field_names().join(", ")
        );
    }
}

pub fn run_ratio_format(units_per_gram: f32, json: bool) -> eyre::Result<()> {
    let text = ratio::format(Some(units_per_gram)).ok_or_else(|| {
        eyre::Report::new(DoseError::InvalidInput(format!(
            "{units_per_gram} units per gram cannot be written as 1:N"
        )))
    })?;
    if json {
        println!("{}", json!({ "units_per_gram": units_per_gram, "ratio": text }));
    } else {
        println!("{text}");
    }
    Ok(())
}

pub fn run_ratio_parse(text: &str, json: bool) -> eyre::Result<()> {
    let value = ratio::parse(text).ok_or_else(|| {
        eyre::Report::new(DoseError::InvalidInput(format!(
            "'{text}' is not a ratio (expected U:G with G > 0, or a number)"
        )))
    })?;
    if json {
        println!("{}", json!({ "ratio": text.trim(), "units_per_gram": value }));
    } else {
        println!("{value}");
    }
    Ok(())
}

pub fn run_profile(
    service: &BolusService<InMemoryProfileStore>,
    user: &str,
    json: bool,
) -> eyre::Result<()> {
    let user = UserId::new(user);
    if service.lookup(&user)?.is_none() {
        tracing::info!(user = %user, "no stored profile");
    }
    let resolved = service.resolved_profile(&user)?;
    if json {
        println!("{}", profile_json(&user, &resolved));
    } else {
        print_profile(&user, &resolved);
    }
    Ok(())
}

fn profile_json(user: &UserId, p: &ResolvedParams) -> serde_json::Value {
    json!({
        "user": user.as_str(),
        "insulin_carb_ratio": p.insulin_carb_ratio,
        "ratio": ratio::format(p.insulin_carb_ratio),
        "correction_factor": p.correction_factor,
        "target_glucose": p.target_glucose,
        "sick_day_percent": p.adjustments.sick_day,
        "stress_percent": p.adjustments.stress,
        "light_exercise_percent": p.adjustments.light_exercise,
        "intense_exercise_percent": p.adjustments.intense_exercise,
        "complete": p.is_complete(),
        "missing_fields": p.missing_field_names(),
    })
}

fn print_profile(user: &UserId, p: &ResolvedParams) {
    fn or_dash<T: ToString>(v: Option<T>) -> String {
        v.map_or_else(|| "-".to_string(), |x| x.to_string())
    }
    println!("user:              {user}");
    println!("carb ratio:        {}", or_dash(ratio::format(p.insulin_carb_ratio)));
    println!("correction factor: {}", or_dash(p.correction_factor));
    println!("target glucose:    {}", or_dash(p.target_glucose));
    println!(
        "adjustments:       sick {}% stress {}% light {}% intense {}%",
        p.adjustments.sick_day,
        p.adjustments.stress,
        p.adjustments.light_exercise,
        p.adjustments.intense_exercise
    );
    if p.is_complete() {
        println!("complete:          yes");
    } else {
        println!("complete:          no (missing {})", p.missing_field_names().join(", "));
    }
}

pub fn run_self_check(
    service: &BolusService<InMemoryProfileStore>,
    json: bool,
) -> eyre::Result<()> {
    let profiles = service.store().len();
    tracing::info!(profiles, "self-check passed");
    if json {
        println!("{}", json!({ "status": "ok", "profiles": profiles }));
    } else {
        println!("ok ({profiles} profiles)");
    }
    Ok(())
}
