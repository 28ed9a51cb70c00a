//! Typed error kinds for every fallible core operation.
//!
//! Every component returns one of these through `Result`; nothing in this
//! crate panics outside of `#[cfg(test)]` code. `anyhow` is deliberately not
//! used here — it belongs at the CLI boundary where these get wrapped with
//! presentation context.

use thiserror::Error;

/// Failures raised while parsing DDL text (C3).
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("syntax error at line {line}, column {col}: {message}")]
    Syntax {
        line: usize,
        col: usize,
        message: String,
    },

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("unresolved include directive: {0}")]
    Include(String),
}

/// Failures raised while introspecting a live database (C2).
#[derive(Error, Debug)]
pub enum IntrospectError {
    #[error("could not connect to database: {0}")]
    Connection(String),

    #[error("schema {0:?} does not exist")]
    SchemaMissing(String),

    #[error("catalog query failed ({query}): {cause}")]
    CatalogRead { query: String, cause: String },
}

/// Failures raised while computing a diff (C6).
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("cyclic dependency among: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),
}

/// Failures raised while applying a plan (C9).
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error(
        "schema drift detected: live fingerprint {live} does not match plan fingerprint {planned}"
    )]
    Drift { planned: String, live: String },

    #[error("statement failed: {stmt}\ncause: {cause}")]
    Exec { stmt: String, cause: String },

    #[error("timed out: {0}")]
    Timeout(String),

    #[error(transparent)]
    Introspect(#[from] IntrospectError),
}

/// Umbrella error for filesystem/IO boundaries (ignore config, plan files,
/// multi-file dump/include resolution).
#[derive(Error, Debug)]
pub enum IoError {
    #[error("io error reading {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error writing {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore config: {0}")]
    IgnoreConfig(#[from] toml::de::Error),

    #[error("invalid plan JSON: {0}")]
    PlanJson(#[from] serde_json::Error),
}

/// Top-level error type a core operation (`dump`/`plan`/`apply`) can return.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Introspect(#[from] IntrospectError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Io(#[from] IoError),
}
