//! C7 SQL Generator: renders IR objects or diff operations into DDL text.
//!
//! Grounded in `postgres::statements::PostgresGenerator`'s phased emission
//! and `postgres::codegen`'s literal per-entity `CREATE`/`ALTER`/`DROP`
//! rendering, generalized to the full object set.

use crate::diff::{ColumnChange, Operation};
use crate::entity::Entity;
use crate::ir::{
    ArgMode, Column, ConstraintKind, Function, GeneratedKind, IdentityKind, Index, Ir,
    PrivilegeObjectKind, ReferentialAction, ReturnType, Schema, TableKind, TriggerTiming, TypeKind,
};

const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render options threaded explicitly (Design Notes: no global state).
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub quote_all: bool,
    /// Emit `-- Name: ...` comment blocks and the dump header. Plan
    /// rendering turns this off to keep `plan.sql` minimal.
    pub with_comments: bool,
    pub engine_version: String,
    /// The schema a reference is rendered relative to. An object whose
    /// schema matches this one renders unqualified, mirroring the
    /// normalizer's same-schema qualifier stripping; cross-schema
    /// references always qualify.
    pub current_schema: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            quote_all: false,
            with_comments: false,
            engine_version: "PostgreSQL 16".to_string(),
            current_schema: "public".to_string(),
        }
    }
}

fn quote_ident(name: &str, opts: &RenderOptions) -> String {
    let needs_quoting = opts.quote_all
        || name.is_empty()
        || !name.chars().next().unwrap().is_ascii_lowercase()
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        || is_reserved(name);
    if needs_quoting {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(
        name,
        "table" | "select" | "user" | "order" | "group" | "column" | "primary" | "references"
    )
}

fn qualify(schema: &str, name: &str, opts: &RenderOptions) -> String {
    if schema == opts.current_schema {
        quote_ident(name, opts)
    } else {
        format!("{}.{}", quote_ident(schema, opts), quote_ident(name, opts))
    }
}

/// `RenderDump(ir, schemaName, options) -> text`: full canonical DDL for a
/// schema, in kind-ordinal order, each object preceded by a comment block.
pub fn render_dump(ir: &Ir, schema_name: &str, opts: &RenderOptions) -> String {
    let opts = &RenderOptions {
        current_schema: schema_name.to_string(),
        ..opts.clone()
    };
    let empty = Schema::new(schema_name);
    let schema = ir.schema(schema_name).unwrap_or(&empty);
    let mut out = String::new();

    if opts.with_comments {
        out.push_str(&format!("-- Database engine: {}\n", opts.engine_version));
        out.push_str(&format!("-- Generated by pgschema {}\n\n", TOOL_VERSION));
    }

    comment_block(&mut out, "SCHEMA", schema_name, opts);
    out.push_str(&format!(
        "CREATE SCHEMA IF NOT EXISTS {};\n\n",
        quote_ident(schema_name, opts)
    ));

    for t in schema.types.iter() {
        comment_block(&mut out, "TYPE", &t.key().display(), opts);
        out.push_str(&render_create_type(t, opts));
        out.push('\n');
    }
    for d in schema.domains.iter() {
        comment_block(&mut out, "DOMAIN", &d.key().display(), opts);
        out.push_str(&render_create_domain(d, opts));
        out.push('\n');
    }
    for s in schema.sequences.iter() {
        comment_block(&mut out, "SEQUENCE", &s.key().display(), opts);
        out.push_str(&render_create_sequence(s, opts));
        if let Some((table, column)) = &s.owned_by {
            out.push_str(&format!(
                "ALTER SEQUENCE {} OWNED BY {}.{};\n",
                qualify(&s.schema, &s.name, opts),
                qualify(&s.schema, table, opts),
                quote_ident(column, opts)
            ));
        }
        out.push('\n');
    }
    for t in schema.tables.iter() {
        comment_block(&mut out, "TABLE", &t.key().display(), opts);
        out.push_str(&render_create_table(t, opts));
        out.push('\n');
    }
    for c in schema.constraints.iter() {
        comment_block(&mut out, "CONSTRAINT", &c.key().display(), opts);
        out.push_str(&render_create_constraint(c, opts));
        out.push('\n');
    }
    for i in schema.indexes.iter() {
        comment_block(&mut out, "INDEX", &i.key().display(), opts);
        out.push_str(&render_create_index(i, opts));
        out.push('\n');
    }
    for f in schema.functions.iter() {
        comment_block(&mut out, "FUNCTION", &f.key().display(), opts);
        out.push_str(&render_create_function(f, opts));
        out.push('\n');
    }
    for p in schema.procedures.iter() {
        comment_block(&mut out, "PROCEDURE", &p.key().display(), opts);
        out.push_str(&render_create_procedure(p, opts));
        out.push('\n');
    }
    for v in schema.views.iter() {
        comment_block(&mut out, "VIEW", &v.key().display(), opts);
        out.push_str(&format!(
            "CREATE VIEW {} AS {};\n\n",
            qualify(&v.schema, &v.name, opts),
            v.definition
        ));
    }
    for v in schema.materialized_views.iter() {
        comment_block(&mut out, "MATERIALIZED VIEW", &v.key().display(), opts);
        out.push_str(&format!(
            "CREATE MATERIALIZED VIEW {} AS {};\n\n",
            qualify(&v.schema, &v.name, opts),
            v.definition
        ));
    }
    for t in schema.triggers.iter() {
        comment_block(&mut out, "TRIGGER", &t.key().display(), opts);
        out.push_str(&render_create_trigger(t, opts));
        out.push('\n');
    }
    if schema.tables.iter().any(|t| t.rls_enabled) {
        for t in schema.tables.iter().filter(|t| t.rls_enabled) {
            out.push_str(&format!(
                "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;\n",
                qualify(&t.schema, &t.name, opts)
            ));
        }
        out.push('\n');
    }
    for p in schema.policies.iter() {
        comment_block(&mut out, "POLICY", &p.key().display(), opts);
        out.push_str(&render_create_policy(p, opts));
        out.push('\n');
    }
    for p in schema.privileges.iter() {
        comment_block(&mut out, "PRIVILEGE", &p.key().display(), opts);
        out.push_str(&render_create_privilege(p, opts));
        out.push('\n');
    }

    out
}

fn comment_block(out: &mut String, kind: &str, identity: &str, opts: &RenderOptions) {
    if opts.with_comments {
        out.push_str(&format!(
            "-- Name: {identity}; Type: {kind}; Schema: -; Owner: -\n"
        ));
    }
}

/// `RenderOperation(op) -> text`.
pub fn render_operation(op: &Operation, opts: &RenderOptions) -> String {
    match op {
        Operation::CreateSchema(s) => {
            format!("CREATE SCHEMA {};\n", quote_ident(&s.name, opts))
        }
        Operation::DropSchema(s) => {
            format!("DROP SCHEMA {};\n", quote_ident(&s.name, opts))
        }

        Operation::CreateType(t) => render_create_type(t, opts),
        Operation::DropType(t) => {
            format!("DROP TYPE {};\n", qualify(&t.schema, &t.name, opts))
        }
        Operation::AlterTypeAddValue { new, label, after, .. } => {
            let position = match after {
                Some(a) => format!(" AFTER '{a}'"),
                None => String::new(),
            };
            format!(
                "ALTER TYPE {} ADD VALUE '{}'{};\n",
                qualify(&new.schema, &new.name, opts),
                label,
                position
            )
        }

        Operation::CreateDomain(d) => render_create_domain(d, opts),
        Operation::DropDomain(d) => {
            format!("DROP DOMAIN {};\n", qualify(&d.schema, &d.name, opts))
        }
        Operation::AlterDomain { new, .. } => {
            let mut s = String::new();
            let ident = qualify(&new.schema, &new.name, opts);
            if let Some(default) = &new.default {
                s.push_str(&format!(
                    "ALTER DOMAIN {ident} SET DEFAULT {default};\n"
                ));
            } else {
                s.push_str(&format!("ALTER DOMAIN {ident} DROP DEFAULT;\n"));
            }
            s.push_str(&format!(
                "ALTER DOMAIN {ident} {} NOT NULL;\n",
                if new.nullable { "DROP" } else { "SET" }
            ));
            s
        }

        Operation::CreateSequence(s) => render_create_sequence(s, opts),
        Operation::DropSequence(s) => {
            format!("DROP SEQUENCE {};\n", qualify(&s.schema, &s.name, opts))
        }
        Operation::AlterSequence { new, .. } => format!(
            "ALTER SEQUENCE {} INCREMENT BY {} MINVALUE {} MAXVALUE {} CACHE {}{};\n",
            qualify(&new.schema, &new.name, opts),
            new.increment,
            new.min_value,
            new.max_value,
            new.cache,
            if new.cycle { " CYCLE" } else { " NO CYCLE" }
        ),
        Operation::AlterSequenceOwnedBy(s) => {
            let owned = s
                .owned_by
                .as_ref()
                .map(|(t, c)| format!("{}.{}", qualify(&s.schema, t, opts), quote_ident(c, opts)))
                .unwrap_or_else(|| "NONE".to_string());
            format!(
                "ALTER SEQUENCE {} OWNED BY {};\n",
                qualify(&s.schema, &s.name, opts),
                owned
            )
        }

        Operation::CreateTable(t) => render_create_table(t, opts),
        Operation::DropTable(t) => {
            format!("DROP TABLE {};\n", qualify(&t.schema, &t.name, opts))
        }
        Operation::AlterTable {
            table,
            column_changes,
        } => render_alter_table(table, column_changes, opts),

        Operation::CreateConstraint(c) => render_create_constraint(c, opts),
        Operation::DropConstraint(c) => format!(
            "ALTER TABLE {} DROP CONSTRAINT {};\n",
            qualify(&c.schema, &c.table, opts),
            quote_ident(&c.name, opts)
        ),

        Operation::CreateIndex(i) => render_create_index(i, opts),
        Operation::DropIndex(i) => {
            format!("DROP INDEX {};\n", qualify(&i.schema, &i.name, opts))
        }

        Operation::CreateFunction(f) | Operation::ReplaceFunction { new: f, .. } => {
            render_create_function(f, opts)
        }
        Operation::DropFunction(f) => format!(
            "DROP FUNCTION {}({});\n",
            qualify(&f.schema, &f.name, opts),
            f.arguments
                .iter()
                .map(|a| a.data_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),

        Operation::CreateProcedure(p) | Operation::ReplaceProcedure { new: p, .. } => {
            render_create_procedure(p, opts)
        }
        Operation::DropProcedure(p) => format!(
            "DROP PROCEDURE {}({});\n",
            qualify(&p.schema, &p.name, opts),
            p.arguments
                .iter()
                .map(|a| a.data_type.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),

        Operation::CreateView(v) => format!(
            "CREATE VIEW {} AS {};\n",
            qualify(&v.schema, &v.name, opts),
            v.definition
        ),
        Operation::DropView(v) => {
            format!("DROP VIEW {};\n", qualify(&v.schema, &v.name, opts))
        }
        Operation::CreateMaterializedView(v) => format!(
            "CREATE MATERIALIZED VIEW {} AS {};\n",
            qualify(&v.schema, &v.name, opts),
            v.definition
        ),
        Operation::DropMaterializedView(v) => format!(
            "DROP MATERIALIZED VIEW {};\n",
            qualify(&v.schema, &v.name, opts)
        ),

        Operation::CreateTrigger(t) => render_create_trigger(t, opts),
        Operation::DropTrigger(t) => format!(
            "DROP TRIGGER {} ON {};\n",
            quote_ident(&t.name, opts),
            qualify(&t.schema, &t.table, opts)
        ),

        Operation::EnableRls { schema, table } => format!(
            "ALTER TABLE {} ENABLE ROW LEVEL SECURITY;\n",
            qualify(schema, table, opts)
        ),
        Operation::DisableRls { schema, table } => format!(
            "ALTER TABLE {} DISABLE ROW LEVEL SECURITY;\n",
            qualify(schema, table, opts)
        ),

        Operation::CreatePolicy(p) => render_create_policy(p, opts),
        Operation::AlterPolicy { new, .. } => render_alter_policy(new, opts),
        Operation::DropPolicy(p) => format!(
            "DROP POLICY {} ON {};\n",
            quote_ident(&p.name, opts),
            qualify(&p.schema, &p.table, opts)
        ),

        Operation::CreatePrivilege(p) => render_create_privilege(p, opts),
        Operation::DropPrivilege(p) => format!(
            "REVOKE {} ON {} {} FROM {};\n",
            p.privileges.join(", "),
            privilege_object_noun(p.object_kind),
            qualify(&p.schema, &p.object_name, opts),
            quote_ident(&p.grantee, opts)
        ),
    }
}

fn render_create_type(t: &crate::ir::TypeDef, opts: &RenderOptions) -> String {
    match &t.kind {
        TypeKind::Enum { labels } => {
            let values = labels
                .iter()
                .map(|l| format!("'{l}'"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TYPE {} AS ENUM ({});\n",
                qualify(&t.schema, &t.name, opts),
                values
            )
        }
        TypeKind::Composite { attributes } => {
            let attrs = attributes
                .iter()
                .map(|a| format!("{} {}", quote_ident(&a.name, opts), a.data_type))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "CREATE TYPE {} AS ({});\n",
                qualify(&t.schema, &t.name, opts),
                attrs
            )
        }
        TypeKind::Range { subtype } => format!(
            "CREATE TYPE {} AS RANGE (subtype = {});\n",
            qualify(&t.schema, &t.name, opts),
            subtype
        ),
    }
}

fn render_create_domain(d: &crate::ir::Domain, opts: &RenderOptions) -> String {
    let mut s = format!(
        "CREATE DOMAIN {} AS {}",
        qualify(&d.schema, &d.name, opts),
        d.base_type
    );
    if !d.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(default) = &d.default {
        s.push_str(&format!(" DEFAULT {default}"));
    }
    for check in &d.checks {
        s.push_str(&format!(
            " CONSTRAINT {} CHECK ({})",
            quote_ident(&check.name, opts),
            check.expression
        ));
    }
    s.push_str(";\n");
    s
}

fn render_create_sequence(s: &crate::ir::Sequence, opts: &RenderOptions) -> String {
    format!(
        "CREATE SEQUENCE {} AS {} START WITH {} INCREMENT BY {} MINVALUE {} MAXVALUE {} CACHE {}{};\n",
        qualify(&s.schema, &s.name, opts),
        s.data_type,
        s.start,
        s.increment,
        s.min_value,
        s.max_value,
        s.cache,
        if s.cycle { " CYCLE" } else { "" }
    )
}

fn render_column(c: &Column, opts: &RenderOptions) -> String {
    let mut s = format!("{} {}", quote_ident(&c.name, opts), c.data_type);
    if !c.nullable {
        s.push_str(" NOT NULL");
    }
    if let Some(default) = &c.default {
        s.push_str(&format!(" DEFAULT {default}"));
    }
    if let Some(generated) = &c.generated {
        let kind = match generated.kind {
            GeneratedKind::Stored => "STORED",
            GeneratedKind::Virtual => "VIRTUAL",
        };
        s.push_str(&format!(
            " GENERATED ALWAYS AS ({}) {}",
            generated.expression, kind
        ));
    }
    if let Some(identity) = &c.identity {
        let kind = match identity.kind {
            IdentityKind::Always => "ALWAYS",
            IdentityKind::ByDefault => "BY DEFAULT",
            IdentityKind::None => "",
        };
        if !kind.is_empty() {
            s.push_str(&format!(" GENERATED {kind} AS IDENTITY"));
        }
    }
    if let Some(collation) = &c.collation {
        s.push_str(&format!(" COLLATE \"{collation}\""));
    }
    s
}

fn render_create_table(t: &crate::ir::Table, opts: &RenderOptions) -> String {
    let columns = t
        .columns
        .iter()
        .map(|c| render_column(c, opts))
        .collect::<Vec<_>>()
        .join(",\n    ");

    let mut s = match t.kind {
        TableKind::PartitionOf => format!(
            "CREATE TABLE {} PARTITION OF {} {};\n",
            qualify(&t.schema, &t.name, opts),
            qualify(&t.schema, t.parent.as_deref().unwrap_or(""), opts),
            t.partition_bound.clone().unwrap_or_default()
        ),
        _ => format!(
            "CREATE TABLE {} (\n    {}\n)",
            qualify(&t.schema, &t.name, opts),
            columns
        ),
    };

    if t.kind == TableKind::Partitioned {
        s.push_str(&format!(
            " PARTITION BY {}",
            t.partition_key.clone().unwrap_or_default()
        ));
    }
    if t.kind != TableKind::PartitionOf {
        s.push_str(";\n");
    }
    s
}

fn render_alter_table(
    table: &crate::ir::Table,
    changes: &[ColumnChange],
    opts: &RenderOptions,
) -> String {
    let ident = qualify(&table.schema, &table.name, opts);
    let mut out = String::new();
    for change in changes {
        match change {
            ColumnChange::Add(c) => out.push_str(&format!(
                "ALTER TABLE {ident} ADD COLUMN {};\n",
                render_column(c, opts)
            )),
            ColumnChange::Drop(c) => out.push_str(&format!(
                "ALTER TABLE {ident} DROP COLUMN {};\n",
                quote_ident(&c.name, opts)
            )),
            ColumnChange::Alter { old, new } => {
                if old.data_type != new.data_type {
                    out.push_str(&format!(
                        "ALTER TABLE {ident} ALTER COLUMN {} TYPE {};\n",
                        quote_ident(&new.name, opts),
                        new.data_type
                    ));
                }
                if old.nullable != new.nullable {
                    out.push_str(&format!(
                        "ALTER TABLE {ident} ALTER COLUMN {} {} NOT NULL;\n",
                        quote_ident(&new.name, opts),
                        if new.nullable { "DROP" } else { "SET" }
                    ));
                }
                if old.default != new.default {
                    match &new.default {
                        Some(d) => out.push_str(&format!(
                            "ALTER TABLE {ident} ALTER COLUMN {} SET DEFAULT {};\n",
                            quote_ident(&new.name, opts),
                            d
                        )),
                        None => out.push_str(&format!(
                            "ALTER TABLE {ident} ALTER COLUMN {} DROP DEFAULT;\n",
                            quote_ident(&new.name, opts)
                        )),
                    }
                }
            }
        }
    }
    out
}

fn render_create_constraint(c: &crate::ir::Constraint, opts: &RenderOptions) -> String {
    let ident = qualify(&c.schema, &c.table, opts);
    let name = quote_ident(&c.name, opts);
    let cols = c
        .columns
        .iter()
        .map(|col| quote_ident(col, opts))
        .collect::<Vec<_>>()
        .join(", ");

    match c.kind {
        ConstraintKind::PrimaryKey => format!(
            "ALTER TABLE {ident} ADD CONSTRAINT {name} PRIMARY KEY ({cols});\n"
        ),
        ConstraintKind::Unique => format!(
            "ALTER TABLE {ident} ADD CONSTRAINT {name} UNIQUE ({cols});\n"
        ),
        ConstraintKind::ForeignKey => {
            let ref_table = qualify(
                c.ref_schema.as_deref().unwrap_or(&c.schema),
                c.ref_table.as_deref().unwrap_or(""),
                opts,
            );
            let ref_cols = c
                .ref_columns
                .iter()
                .map(|col| quote_ident(col, opts))
                .collect::<Vec<_>>()
                .join(", ");
            let mut s = format!(
                "ALTER TABLE {ident} ADD CONSTRAINT {name} FOREIGN KEY ({cols}) REFERENCES {ref_table} ({ref_cols})"
            );
            if let Some(action) = c.on_update {
                s.push_str(&format!(" ON UPDATE {}", referential_action(action)));
            }
            if let Some(action) = c.on_delete {
                s.push_str(&format!(" ON DELETE {}", referential_action(action)));
            }
            s.push_str(";\n");
            s
        }
        ConstraintKind::Check => format!(
            "ALTER TABLE {ident} ADD CONSTRAINT {name} CHECK ({});\n",
            c.expression.clone().unwrap_or_default()
        ),
        ConstraintKind::Exclusion => format!(
            "ALTER TABLE {ident} ADD CONSTRAINT {name} EXCLUDE ({});\n",
            c.expression.clone().unwrap_or_default()
        ),
        ConstraintKind::NotNull => format!(
            "ALTER TABLE {ident} ALTER COLUMN {cols} SET NOT NULL;\n"
        ),
    }
}

fn referential_action(action: ReferentialAction) -> &'static str {
    match action {
        ReferentialAction::NoAction => "NO ACTION",
        ReferentialAction::Restrict => "RESTRICT",
        ReferentialAction::Cascade => "CASCADE",
        ReferentialAction::SetNull => "SET NULL",
        ReferentialAction::SetDefault => "SET DEFAULT",
    }
}

fn render_create_index(i: &Index, opts: &RenderOptions) -> String {
    let cols = i
        .columns
        .iter()
        .map(|c| {
            let mut s = c.value.clone();
            if !c.ascending {
                s.push_str(" DESC");
            }
            if c.nulls_first {
                s.push_str(" NULLS FIRST");
            }
            if let Some(op) = &c.opclass {
                s.push_str(&format!(" {op}"));
            }
            s
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut s = format!(
        "CREATE {}INDEX {} ON {} USING {} ({})",
        if i.unique { "UNIQUE " } else { "" },
        quote_ident(&i.name, opts),
        qualify(&i.schema, &i.table, opts),
        i.method,
        cols
    );
    if !i.include.is_empty() {
        s.push_str(&format!(
            " INCLUDE ({})",
            i.include
                .iter()
                .map(|c| quote_ident(c, opts))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if let Some(pred) = &i.where_predicate {
        s.push_str(&format!(" WHERE {pred}"));
    }
    s.push_str(";\n");
    s
}

fn render_args(args: &[crate::ir::Argument]) -> String {
    args.iter()
        .map(|a| {
            let mode = match a.mode {
                ArgMode::In => "",
                ArgMode::Out => "OUT ",
                ArgMode::Inout => "INOUT ",
                ArgMode::Variadic => "VARIADIC ",
            };
            let name = a.name.clone().map(|n| format!("{n} ")).unwrap_or_default();
            format!("{mode}{name}{}", a.data_type)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_create_function(f: &Function, opts: &RenderOptions) -> String {
    let ret = match &f.return_type {
        ReturnType::Type(t) => t.clone(),
        ReturnType::SetOf(t) => format!("SETOF {t}"),
        ReturnType::Table(cols) => format!("TABLE ({})", render_args(cols)),
    };
    let volatility = match f.volatility {
        crate::ir::Volatility::Immutable => "IMMUTABLE",
        crate::ir::Volatility::Stable => "STABLE",
        crate::ir::Volatility::Volatile => "VOLATILE",
    };
    let security = match f.security {
        crate::ir::Security::Invoker => "SECURITY INVOKER",
        crate::ir::Security::Definer => "SECURITY DEFINER",
    };
    format!(
        "CREATE OR REPLACE FUNCTION {}({})\nRETURNS {}\nLANGUAGE {}\n{} {}\nAS $$\n{}\n$$;\n",
        qualify(&f.schema, &f.name, opts),
        render_args(&f.arguments),
        ret,
        f.language,
        volatility,
        security,
        f.body
    )
}

fn render_create_procedure(p: &crate::ir::Procedure, opts: &RenderOptions) -> String {
    let security = match p.security {
        crate::ir::Security::Invoker => "SECURITY INVOKER",
        crate::ir::Security::Definer => "SECURITY DEFINER",
    };
    format!(
        "CREATE OR REPLACE PROCEDURE {}({})\nLANGUAGE {}\n{}\nAS $$\n{}\n$$;\n",
        qualify(&p.schema, &p.name, opts),
        render_args(&p.arguments),
        p.language,
        security,
        p.body
    )
}

fn render_create_trigger(t: &crate::ir::Trigger, opts: &RenderOptions) -> String {
    let timing = match t.timing {
        TriggerTiming::Before => "BEFORE",
        TriggerTiming::After => "AFTER",
        TriggerTiming::InsteadOf => "INSTEAD OF",
    };
    let events = t
        .events
        .iter()
        .map(|e| {
            match e {
                crate::ir::TriggerEvent::Insert => "INSERT",
                crate::ir::TriggerEvent::Update => "UPDATE",
                crate::ir::TriggerEvent::Delete => "DELETE",
                crate::ir::TriggerEvent::Truncate => "TRUNCATE",
            }
        })
        .collect::<Vec<_>>()
        .join(" OR ");
    let level = if t.per_row { "ROW" } else { "STATEMENT" };
    let mut s = format!(
        "CREATE TRIGGER {} {} {} ON {}\nFOR EACH {}",
        quote_ident(&t.name, opts),
        timing,
        events,
        qualify(&t.schema, &t.table, opts),
        level
    );
    if let Some(when) = &t.when_condition {
        s.push_str(&format!("\nWHEN ({when})"));
    }
    // `t.function` already carries its call parens (e.g. `sync()` or, for a
    // trigger that passes TG_ARGV literals, `sync('a', 'b')`) — the parser
    // stores it that way so `find_function`'s signature match and this
    // render stay in lockstep.
    s.push_str(&format!("\nEXECUTE FUNCTION {};\n", t.function));
    s
}

fn render_create_policy(p: &crate::ir::Policy, opts: &RenderOptions) -> String {
    let command = policy_command(p.command);
    let kind = if p.permissive {
        "PERMISSIVE"
    } else {
        "RESTRICTIVE"
    };
    let roles = if p.roles.is_empty() {
        "PUBLIC".to_string()
    } else {
        p.roles.join(", ")
    };
    let mut s = format!(
        "CREATE POLICY {} ON {} AS {} FOR {} TO {}",
        quote_ident(&p.name, opts),
        qualify(&p.schema, &p.table, opts),
        kind,
        command,
        roles
    );
    if let Some(using) = &p.using_expr {
        s.push_str(&format!(" USING ({using})"));
    }
    if let Some(check) = &p.check_expr {
        s.push_str(&format!(" WITH CHECK ({check})"));
    }
    s.push_str(";\n");
    s
}

fn render_alter_policy(p: &crate::ir::Policy, opts: &RenderOptions) -> String {
    let mut s = format!(
        "ALTER POLICY {} ON {}",
        quote_ident(&p.name, opts),
        qualify(&p.schema, &p.table, opts)
    );
    if let Some(using) = &p.using_expr {
        s.push_str(&format!(" USING ({using})"));
    }
    if let Some(check) = &p.check_expr {
        s.push_str(&format!(" WITH CHECK ({check})"));
    }
    s.push_str(";\n");
    s
}

fn policy_command(c: crate::ir::PolicyCommand) -> &'static str {
    match c {
        crate::ir::PolicyCommand::All => "ALL",
        crate::ir::PolicyCommand::Select => "SELECT",
        crate::ir::PolicyCommand::Insert => "INSERT",
        crate::ir::PolicyCommand::Update => "UPDATE",
        crate::ir::PolicyCommand::Delete => "DELETE",
    }
}

fn privilege_object_noun(kind: PrivilegeObjectKind) -> &'static str {
    match kind {
        PrivilegeObjectKind::Table => "TABLE",
        PrivilegeObjectKind::Sequence => "SEQUENCE",
        PrivilegeObjectKind::Function => "FUNCTION",
        PrivilegeObjectKind::Procedure => "PROCEDURE",
        PrivilegeObjectKind::Schema => "SCHEMA",
    }
}

fn render_create_privilege(p: &crate::ir::Privilege, opts: &RenderOptions) -> String {
    let mut s = format!(
        "GRANT {} ON {} {} TO {}",
        p.privileges.join(", "),
        privilege_object_noun(p.object_kind),
        qualify(&p.schema, &p.object_name, opts),
        quote_ident(&p.grantee, opts)
    );
    if p.with_grant {
        s.push_str(" WITH GRANT OPTION");
    }
    s.push_str(";\n");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::*;

    #[test]
    fn quote_ident_only_quotes_when_needed() {
        let opts = RenderOptions::default();
        assert_eq!(quote_ident("users", &opts), "users");
        assert_eq!(quote_ident("User", &opts), "\"User\"");
        assert_eq!(quote_ident("select", &opts), "\"select\"");
    }

    #[test]
    fn add_column_renders_literal_alter_table() {
        let table = Table {
            schema: "public".into(),
            name: "users".into(),
            kind: TableKind::Base,
            parent: None,
            partition_key: None,
            partition_bound: None,
            columns: vec![],
            rls_enabled: false,
            comment: None,
        };
        let change = ColumnChange::Add(Column {
            position: 1,
            name: "email".into(),
            data_type: "text".into(),
            nullable: true,
            default: None,
            generated: None,
            identity: None,
            collation: None,
            comment: None,
        });
        let sql = render_alter_table(&table, &[change], &RenderOptions::default());
        assert_eq!(sql, "ALTER TABLE users ADD COLUMN email text;\n");
    }

    #[test]
    fn trigger_render_does_not_double_up_call_parens() {
        let trigger = Trigger {
            schema: "public".into(),
            table: "users".into(),
            name: "t".into(),
            timing: TriggerTiming::After,
            events: vec![crate::ir::TriggerEvent::Insert],
            per_row: true,
            when_condition: None,
            function: "sync()".into(),
        };
        let sql = render_create_trigger(&trigger, &RenderOptions::default());
        assert!(sql.contains("EXECUTE FUNCTION sync();"), "{sql}");
        assert!(!sql.contains("sync()()"), "{sql}");
    }
}
