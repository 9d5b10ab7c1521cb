//! Command handlers -- one module per subcommand

pub mod config;
pub mod filter;

use std::path::Path;

use flowlog_core::config::FlowLogConfig;
use flowlog_core::error::FlowLogError;

/// Load the effective configuration (file + env overrides + defaults).
///
/// A missing file is only an error when the path was given explicitly.
pub async fn load_config(path: &Path, explicit: bool) -> Result<FlowLogConfig, FlowLogError> {
    if explicit {
        FlowLogConfig::load(path).await
    } else {
        FlowLogConfig::load_or_default(path).await
    }
}
