//! `pgschema dump`: render the live schema as canonical DDL, as one file or
//! as a dependency-ordered multi-file tree.

use std::path::{Path, PathBuf};

use clap::Args;
use schemaplan_core::{EntityKind, Ir};

use crate::config::DbArgs;
use crate::error::CliError;
use crate::output;

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub db: DbArgs,

    /// Split the dump into one file per object under a directory tree
    /// instead of a single file.
    #[arg(long)]
    pub multi_file: bool,

    /// Output path. A single file for the default mode, or the `main.sql`
    /// entry point for `--multi-file`. Defaults to stdout when omitted.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub async fn run(args: DumpArgs) -> Result<(), CliError> {
    let (client, _connection) = args.db.connect().await?;
    let schema_name = &args.db.schema;

    let ir = schemaplan_core::inspect::build_ir(&client, schema_name).await?;
    let ir = schemaplan_core::normalize::normalize(ir, schema_name);

    if args.multi_file {
        let main_path = args
            .file
            .ok_or_else(|| CliError::UserError("--multi-file requires --file <path>".into()))?;
        write_multi_file(&ir, schema_name, &main_path)?;
        eprintln!("{}", output::success(&format!("wrote {}", main_path.display())));
        return Ok(());
    }

    let opts = schemaplan_core::sqlgen::RenderOptions {
        with_comments: true,
        current_schema: schema_name.clone(),
        ..Default::default()
    };
    let rendered = schemaplan_core::sqlgen::render_dump(&ir, schema_name, &opts);

    match args.file {
        Some(path) => {
            std::fs::write(&path, rendered)?;
            eprintln!("{}", output::success(&format!("wrote {}", path.display())));
        }
        None => print!("{rendered}"),
    }

    Ok(())
}

/// Writes one file per object, grouped by kind under `main_path`'s parent
/// directory, and a `main.sql` that `\i`-includes them in dependency order
/// (the order the diff engine would create them in, obtained by diffing an
/// empty IR against the live one).
fn write_multi_file(ir: &Ir, schema_name: &str, main_path: &Path) -> Result<(), CliError> {
    let base_dir = main_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(base_dir)?;
    clean_stale_files(base_dir)?;

    let empty = Ir::new();
    let operations = schemaplan_core::diff::diff(&empty, ir)?;

    let render_opts = schemaplan_core::sqlgen::RenderOptions {
        current_schema: schema_name.to_string(),
        ..Default::default()
    };
    let mut includes = Vec::new();

    for op in &operations {
        let (kind, key) = op.identity();
        if kind == EntityKind::Schema {
            continue;
        }
        let dir_name = directory_for(kind);
        let dir = base_dir.join(dir_name);
        std::fs::create_dir_all(&dir)?;

        let file_name = format!("{}.sql", sanitize(&object_basename(&key, schema_name)));
        let file_path = dir.join(&file_name);
        let sql = schemaplan_core::sqlgen::render_operation(op, &render_opts);
        std::fs::write(&file_path, sql)?;

        includes.push(format!("{dir_name}/{file_name}"));
    }

    let mut main = String::new();
    main.push_str(&format!(
        "CREATE SCHEMA IF NOT EXISTS {schema_name};\n\n"
    ));
    for include in &includes {
        main.push_str(&format!("\\i {include}\n"));
    }
    std::fs::write(main_path, main)?;
    Ok(())
}

/// Removes `*.sql` files left over from a previous dump of this tree, so a
/// renamed or dropped object doesn't leave a stale file behind. Uses the
/// `glob` crate for the filesystem-path matching it's built for, unlike
/// `ignore::glob_match`'s hand-rolled string matcher (which matches object
/// names, not paths).
fn clean_stale_files(base_dir: &Path) -> Result<(), CliError> {
    let pattern = format!("{}/**/*.sql", base_dir.display());
    for path in glob::glob(&pattern)
        .map_err(|e| CliError::UserError(e.to_string()))?
        .flatten()
    {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}

fn directory_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Schema => "schemas",
        EntityKind::Type => "types",
        EntityKind::Domain => "domains",
        EntityKind::Sequence => "sequences",
        EntityKind::Table => "tables",
        EntityKind::Column => "tables",
        EntityKind::Constraint => "constraints",
        EntityKind::Index => "indexes",
        EntityKind::Function => "functions",
        EntityKind::Procedure => "procedures",
        EntityKind::View => "views",
        EntityKind::MaterializedView => "materialized_views",
        EntityKind::Trigger => "triggers",
        EntityKind::Policy => "policies",
        EntityKind::Privilege => "privileges",
    }
}

/// Strips the leading `<schema>.` component from an identity's display
/// form, since every file in the tree already lives under one schema.
fn object_basename(key: &schemaplan_core::EntityKey, schema_name: &str) -> String {
    let display = key.display();
    display
        .strip_prefix(&format!("{schema_name}."))
        .unwrap_or(&display)
        .to_string()
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
