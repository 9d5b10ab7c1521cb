//! flowlog -- VPC flow log filter and connection counter

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Commands};
use output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let writer = OutputWriter::new(cli.output);
    let (config_path, explicit) = cli.config_path();

    let loaded = commands::load_config(&config_path, explicit)
        .await
        .and_then(|mut config| {
            if let Some(level) = &cli.log_level {
                config.general.log_level = level.clone();
                config.validate()?;
            }
            Ok(config)
        });

    // `config validate` reports load failures itself, so logging falls back to defaults.
    let mut general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }
    flowlog_core::metrics::describe_metrics();

    tracing::debug!(
        config = %config_path.display(),
        explicit,
        "flowlog starting"
    );

    let result = match cli.command {
        Commands::Filter(args) => commands::filter::execute(args, loaded, &writer).await,
        Commands::Config(args) => commands::config::execute(args, loaded, &config_path, &writer),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "command failed");
            eprintln!("error: {}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
