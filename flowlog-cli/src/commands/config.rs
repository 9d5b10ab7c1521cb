//! `flowlog config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use flowlog_core::config::FlowLogConfig;
use flowlog_core::error::FlowLogError;
use flowlog_pipeline::ProcessorConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 3] = ["general", "layout", "filter"];

/// Execute the `config` command.
pub fn execute(
    args: ConfigArgs,
    loaded: Result<FlowLogConfig, FlowLogError>,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(loaded, config_path, writer),
        ConfigAction::Show { section } => execute_show(loaded, config_path, section, writer),
    }
}

/// Execute the config validate subcommand.
///
/// Reports the outcome of loading the configuration, including the allow-list
/// IPv4 checks performed when building the processor configuration.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (invalid values, parse errors, missing file).
fn execute_validate(
    loaded: Result<FlowLogConfig, FlowLogError>,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let errors = match loaded {
        Ok(config) => match ProcessorConfig::from_core(&config) {
            Ok(_) => Vec::new(),
            Err(e) => vec![e.to_string()],
        },
        Err(e) => vec![e.to_string()],
    };

    let report = ConfigValidationReport {
        source: config_path.display().to_string(),
        valid: errors.is_empty(),
        errors,
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Displays the effective configuration (file + env overrides + defaults),
/// optionally narrowed to a single section.
///
/// # Errors
///
/// Returns `CliError::Core` if loading failed or `CliError::Command` if the section name is unknown.
fn execute_show(
    loaded: Result<FlowLogConfig, FlowLogError>,
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = loaded?;
    let report = build_show_report(&config, config_path, section)?;
    writer.render(&report)?;
    Ok(())
}

fn build_show_report(
    config: &FlowLogConfig,
    config_path: &Path,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section.as_deref() {
        None => to_toml(config),
        Some("general") => to_toml(&config.general),
        Some("layout") => to_toml(&config.layout),
        Some("filter") => to_toml(&config.filter),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    };

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {})", e))
}

/// Configuration display report.
///
/// The `config_toml` field is skipped during JSON serialization (only used for text rendering).
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}
