//! Explicit configuration threaded into every component.
//!
//! No process-global state: schema name, ignore patterns, timeouts, and
//! color/formatting preferences are all carried in a value and passed to the
//! function that needs them, never read from a global.

use std::time::Duration;

use crate::ignore::IgnoreConfig;

/// Connection + schema-scope options shared by the Inspector and Applier.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub app_name: Option<String>,
    pub schema: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: String::new(),
            user: String::new(),
            password: None,
            app_name: None,
            schema: "public".to_string(),
        }
    }
}

/// Options governing a single plan/apply job.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub connect: ConnectOptions,
    pub ignore: IgnoreConfig,
    /// When true, every identifier is quoted in generated SQL regardless of
    /// whether it strictly requires quoting.
    pub quote_all: bool,
    /// Policy for `ALTER TYPE ... ADD VALUE` at a non-terminal position.
    pub enum_add_policy: EnumAddPolicy,
    pub lock_timeout: Duration,
    pub statement_timeout: Duration,
    /// When true, the Applier loads the plan's SQL into a temporary schema
    /// first to validate it applies cleanly before touching the real
    /// transaction.
    pub validate_in_temp_schema: bool,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            connect: ConnectOptions::default(),
            ignore: IgnoreConfig::default(),
            quote_all: false,
            enum_add_policy: EnumAddPolicy::AppendIfUnsupported,
            lock_timeout: Duration::from_secs(30),
            statement_timeout: Duration::from_secs(5 * 60),
            validate_in_temp_schema: false,
        }
    }
}

/// Positional `ALTER TYPE ... ADD VALUE` is attempted when the target
/// position is supported; otherwise the label is
/// appended instead of erroring, since append-only is always safe and a hard
/// failure would block an otherwise-applicable plan over a cosmetic ordering
/// difference. See DESIGN.md for the recorded decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumAddPolicy {
    AppendIfUnsupported,
    ErrorIfUnsupported,
}

/// File-naming policy for multi-file dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileNamePolicy {
    PreserveCase,
    Lowercase,
}

impl Default for FileNamePolicy {
    fn default() -> Self {
        FileNamePolicy::PreserveCase
    }
}
