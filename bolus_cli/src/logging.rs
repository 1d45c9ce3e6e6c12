//! Tracing subscriber setup: console layer plus optional JSON-lines file.

use std::path::Path;

use eyre::{WrapErr, eyre};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::cli::FILE_GUARD;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init(level: &str, json: bool, cfg: &bolus_config::Logging) -> eyre::Result<()> {
    let console_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level '{level}'"))?,
    };

    // Console goes to stderr so stdout carries only command output.
    let mut layers: Vec<BoxedLayer> = Vec::new();
    if json {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_filter(console_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter)
                .boxed(),
        );
    }

    if let Some(file) = cfg.file.as_deref() {
        layers.push(file_layer(file, cfg)?);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| eyre!("init logging: {e}"))
}

fn file_layer(file: &str, cfg: &bolus_config::Logging) -> eyre::Result<BoxedLayer> {
    let path = Path::new(file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("logging.file '{file}' has no file name"))?;
    let appender = match cfg.rotation.as_deref() {
        Some("daily") => tracing_appender::rolling::daily(dir, name),
        Some("hourly") => tracing_appender::rolling::hourly(dir, name),
        _ => tracing_appender::rolling::never(dir, name),
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);

    let level = cfg.level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level)
        .wrap_err_with(|| format!("invalid logging.level '{level}'"))?;
    Ok(fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter)
        .boxed())
}
