pub mod cli;
pub mod config;
mod error;
mod logging;
pub mod reports;
mod runtime;
pub mod services;

use clap::Parser;

pub use error::AppError;

pub fn run() -> Result<(), AppError> {
    logging::init()?;

    let config = config::AppConfig::from_env()?;
    log_bootstrap(&config);

    runtime::run(config)
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = cli::Cli::parse();
    logging::init()?;

    let config = config::AppConfig::from_env()?;
    tracing::debug!(base_url = %config.base_url, command = ?cli.command, "cli bootstrap initialized");

    runtime::run_cli(config, cli.command)
}

/// Startup summary; credential fields stay out of it.
fn log_bootstrap(config: &config::AppConfig) {
    tracing::info!(
        base_url = %config.base_url,
        connector_id = config.connector_id,
        price_per_kwh_cents = config.price_per_kwh_cents,
        http_timeout_secs = config.http_timeout_secs,
        http_bind = %config.http_bind,
        "application bootstrap initialized"
    );
}
