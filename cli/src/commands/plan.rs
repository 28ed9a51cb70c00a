//! `pgschema plan`: compare the live schema against a desired-state SQL
//! file and render the computed diff as SQL, human-readable text, and/or
//! JSON.

use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use schemaplan_core::ignore::IgnoreConfig;
use schemaplan_core::plan::{Plan, PlanTarget};

use crate::config::DbArgs;
use crate::error::CliError;
use crate::include;
use crate::output;

/// Where a renderer's output should land: stdout, or a file path.
#[derive(Debug, Clone)]
pub enum OutputTarget {
    Stdout,
    Path(PathBuf),
}

impl FromStr for OutputTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "stdout" {
            Ok(OutputTarget::Stdout)
        } else {
            Ok(OutputTarget::Path(PathBuf::from(s)))
        }
    }
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Desired-state SQL file (`\i` includes are resolved before parsing).
    #[arg(long)]
    pub file: PathBuf,

    /// Write the plan as SQL to `stdout` or a file path.
    #[arg(long)]
    pub output_sql: Option<OutputTarget>,

    /// Write the plan as human-readable text to `stdout` or a file path.
    #[arg(long)]
    pub output_human: Option<OutputTarget>,

    /// Write the plan as JSON to `stdout` or a file path.
    #[arg(long)]
    pub output_json: Option<OutputTarget>,
}

pub async fn run(args: PlanArgs) -> Result<(), CliError> {
    let targets = [&args.output_sql, &args.output_human, &args.output_json];
    let stdout_count = targets
        .iter()
        .filter(|t| matches!(t, Some(OutputTarget::Stdout)))
        .count();
    if stdout_count > 1 {
        return Err(CliError::UserError(
            "at most one of --output-sql/--output-human/--output-json may target stdout".into(),
        ));
    }

    let plan = build_plan(&args).await?;

    // Default to human output on stdout when the caller asked for nothing
    // specific, so the command always prints something to the terminal.
    let any_requested = args.output_sql.is_some() || args.output_human.is_some() || args.output_json.is_some();

    if let Some(target) = &args.output_sql {
        emit(target, &plan.render_sql())?;
    }
    if let Some(target) = &args.output_human {
        emit(target, &plan.render_human())?;
    } else if !any_requested {
        emit(&OutputTarget::Stdout, &plan.render_human())?;
    }
    if let Some(target) = &args.output_json {
        emit(target, &plan.render_json()?)?;
    }

    Ok(())
}

/// Shared by `plan` and `apply --plan` validation paths: inspects the live
/// schema, parses the desired-state file, normalizes/filters both, diffs
/// them, and packages the result.
pub async fn build_plan(args: &PlanArgs) -> Result<Plan, CliError> {
    let (client, _connection) = args.db.connect().await?;
    let schema_name = &args.db.schema;

    let ignore_cfg = load_ignore_config()?;

    let current = schemaplan_core::inspect::build_ir(&client, schema_name).await?;
    let current = schemaplan_core::normalize::normalize(current, schema_name);
    let current = schemaplan_core::ignore::filter(current, &ignore_cfg);

    let desired_text = include::resolve(&args.file)?;
    let desired = schemaplan_core::parser::parse(&desired_text, schema_name)?;
    let desired = schemaplan_core::normalize::normalize(desired, schema_name);
    let desired = schemaplan_core::ignore::filter(desired, &ignore_cfg);

    let operations = schemaplan_core::diff::diff(&current, &desired)?;
    let fingerprint = schemaplan_core::fingerprint::fingerprint(&current, schema_name);

    let target = PlanTarget {
        host: args.db.host.clone(),
        port: args.db.port,
        database: args.db.database.clone(),
        schema: schema_name.clone(),
    };

    Ok(Plan::new(operations, fingerprint, target, now_rfc3339()))
}

/// `.pgschemaignore` in the working directory; absent is not an error
/// (empty config, nothing filtered).
pub fn load_ignore_config() -> Result<IgnoreConfig, CliError> {
    let path = std::path::Path::new(".pgschemaignore");
    Ok(IgnoreConfig::load(path)?)
}

fn emit(target: &OutputTarget, text: &str) -> Result<(), CliError> {
    match target {
        OutputTarget::Stdout => {
            println!("{text}");
        }
        OutputTarget::Path(path) => {
            std::fs::write(path, text)?;
            eprintln!("{}", output::success(&format!("wrote {}", path.display())));
        }
    }
    Ok(())
}

/// A timestamp for `Plan::created_at`. Excluded from plan-JSON content
/// equality, so a plain `SystemTime`-derived string is sufficient without
/// pulling in a date crate this crate doesn't otherwise depend on.
fn now_rfc3339() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("unix:{secs}")
}
