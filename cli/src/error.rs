//! CLI error type, mapping every failure onto the exit code table.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    UserError(String),

    #[error(transparent)]
    Parse(#[from] schemaplan_core::ParseError),

    #[error(transparent)]
    Introspect(#[from] schemaplan_core::IntrospectError),

    #[error(transparent)]
    Diff(#[from] schemaplan_core::DiffError),

    #[error(transparent)]
    Apply(#[from] schemaplan_core::ApplyError),

    #[error(transparent)]
    Core(#[from] schemaplan_core::IoError),

    #[error("could not connect to database: {0}")]
    Connection(#[from] tokio_postgres::Error),

    #[error("invalid ignore config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid plan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Exit code: 0 success, 1 user error, 2 planning/apply failure, 3
    /// drift, 4 connection/timeout.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::UserError(_) | CliError::Io(_) | CliError::Toml(_) | CliError::Json(_) => 1,
            CliError::Parse(_) | CliError::Diff(_) => 2,
            CliError::Apply(e) => apply_exit_code(e),
            CliError::Introspect(_) | CliError::Connection(_) => 4,
            CliError::Core(_) => 1,
        }
    }
}

fn apply_exit_code(e: &schemaplan_core::ApplyError) -> u8 {
    use schemaplan_core::ApplyError;
    match e {
        ApplyError::Drift { .. } => 3,
        ApplyError::Timeout(_) => 4,
        ApplyError::Introspect(_) => 4,
        ApplyError::Exec { .. } => 2,
    }
}
