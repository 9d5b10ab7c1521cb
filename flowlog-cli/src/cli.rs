//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! Apart from [`FilterArgs::apply_to`], which folds flag overrides into a loaded
//! configuration, it is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use flowlog_core::config::FlowLogConfig;

/// Config file used when `--config` is not given. A missing file at this path is not an error.
pub const DEFAULT_CONFIG_PATH: &str = "flowlog.toml";

/// flowlog -- filter VPC flow log records and count connections.
///
/// Use `flowlog <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "flowlog", version, about, long_about = None)]
pub struct Cli {
    /// Path to the flowlog.toml configuration file [default: flowlog.toml].
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The config path to load and whether it was given explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        }
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Matched lines followed by the connection count trailer.
    Text,
    /// A single machine-readable JSON report.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter a flow log file and optionally count connections.
    Filter(FilterArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- filter ----

/// Filter a flow log file.
///
/// Every flag overrides the matching `[filter]` or `[layout]` value from the
/// config file and environment. Numeric constraints of `0` mean "no constraint".
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Flow log file to read.
    pub file: PathBuf,

    /// Source IP allow-list (comma separated).
    #[arg(long = "src-ip", visible_alias = "srcIp", value_delimiter = ',')]
    pub src_ips: Vec<String>,

    /// Destination IP allow-list (comma separated).
    #[arg(long = "dst-ip", visible_alias = "destIp", value_delimiter = ',')]
    pub dst_ips: Vec<String>,

    /// Required source port.
    #[arg(long, visible_alias = "srcPort")]
    pub src_port: Option<u32>,

    /// Required destination port.
    #[arg(long, visible_alias = "destPort")]
    pub dst_port: Option<u32>,

    /// Required protocol number (6 = TCP, 17 = UDP).
    #[arg(long)]
    pub protocol: Option<u32>,

    /// Count matched records per connection (5-tuple).
    #[arg(long, visible_alias = "countConnection")]
    pub count_connections: bool,

    /// Zero-based token position of the source IP.
    #[arg(long, visible_alias = "srcIndex")]
    pub src_index: Option<usize>,

    /// Zero-based token position of the destination IP.
    #[arg(long, visible_alias = "destIndex")]
    pub dst_index: Option<usize>,

    /// Zero-based token position of the source port.
    #[arg(long, visible_alias = "srcPortIndex")]
    pub src_port_index: Option<usize>,

    /// Zero-based token position of the destination port.
    #[arg(long, visible_alias = "destPortIndex")]
    pub dst_port_index: Option<usize>,

    /// Zero-based token position of the protocol.
    #[arg(long, visible_alias = "protocolIndex")]
    pub protocol_index: Option<usize>,
}

impl FilterArgs {
    /// Fold the flag overrides into a loaded configuration.
    ///
    /// The caller re-validates the result.
    pub fn apply_to(&self, config: &mut FlowLogConfig) {
        let src_ips = trimmed(&self.src_ips);
        if !src_ips.is_empty() {
            config.filter.src_ips = src_ips;
        }
        let dst_ips = trimmed(&self.dst_ips);
        if !dst_ips.is_empty() {
            config.filter.dst_ips = dst_ips;
        }
        if let Some(port) = self.src_port {
            config.filter.src_port = port;
        }
        if let Some(port) = self.dst_port {
            config.filter.dst_port = port;
        }
        if let Some(protocol) = self.protocol {
            config.filter.protocol = protocol;
        }
        if self.count_connections {
            config.filter.count_connections = true;
        }

        if let Some(index) = self.src_index {
            config.layout.src_ip_index = index;
        }
        if let Some(index) = self.dst_index {
            config.layout.dst_ip_index = index;
        }
        if let Some(index) = self.src_port_index {
            config.layout.src_port_index = index;
        }
        if let Some(index) = self.dst_port_index {
            config.layout.dst_port_index = index;
        }
        if let Some(index) = self.protocol_index {
            config.layout.protocol_index = index;
        }
    }
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

// ---- config ----

/// Manage flowlog configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, layout, filter).
        #[arg(long)]
        section: Option<String>,
    },
}
