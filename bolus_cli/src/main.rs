mod cli;
mod dose;
mod error_fmt;
mod logging;

use clap::Parser;

use crate::cli::{Cli, Commands, JSON_MODE, RatioOp};
use crate::dose::DoseArgs;
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(&cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
            tracing::debug!("{e:?}");
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn run(cli: &Cli) -> eyre::Result<()> {
    // Ratio conversions need neither config nor profiles.
    if let Commands::Ratio { op } = &cli.cmd {
        logging::init(&cli.log_level, cli.json, &bolus_config::Logging::default())?;
        return match op {
            RatioOp::Format { units_per_gram } => dose::run_ratio_format(*units_per_gram, cli.json),
            RatioOp::Parse { text } => dose::run_ratio_parse(text, cli.json),
        };
    }

    let cfg = match dose::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            logging::init(&cli.log_level, cli.json, &bolus_config::Logging::default())?;
            return Err(e);
        }
    };
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let service = dose::build_service(&cfg, cli.profiles.as_deref())?;

    match &cli.cmd {
        Commands::Dose {
            carbs,
            glucose,
            user,
            activity,
            sick,
            stress,
            mode,
        } => {
            let args = DoseArgs {
                carbs: *carbs,
                glucose: *glucose,
                user: user.as_deref(),
                activity: activity.as_deref(),
                sick: *sick,
                stress: *stress,
                mode: *mode,
            };
            dose::run_dose(&service, &args, cli.json)
        }
        Commands::Profile { user } => dose::run_profile(&service, user, cli.json),
        Commands::SelfCheck => dose::run_self_check(&service, cli.json),
        Commands::Ratio { .. } => Ok(()),
    }
}
