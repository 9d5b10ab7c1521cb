//! CLI-specific error types and exit code mapping

use flowlog_core::error::FlowLogError;
use flowlog_pipeline::FlowPipelineError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (input file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from flowlog-core.
    #[error("{0}")]
    Core(#[from] FlowLogError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::Core(FlowLogError::Config(_)) => 2,
            Self::Core(FlowLogError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<FlowPipelineError> for CliError {
    fn from(e: FlowPipelineError) -> Self {
        match e {
            FlowPipelineError::Config { .. } => Self::Config(e.to_string()),
            FlowPipelineError::Sink(FlowLogError::Io(io)) => Self::Io(io),
            FlowPipelineError::Sink(inner) => Self::Core(inner),
        }
    }
}
