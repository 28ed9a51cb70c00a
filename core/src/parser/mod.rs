//! C3 Parser: turns a `.sql` schema file into an `Ir`.
//!
//! Statement splitting is a lexical scan (dollar-quoted bodies and string
//! literals can contain semicolons, so a naive `split(';')` is wrong);
//! per-statement parsing uses `nom` combinators in the same style as
//! `parser::combinators` in the sibling crate this one started from.

mod combinators;

use crate::error::ParseError;
use crate::ir::*;

/// `Parse(text) -> IR`. `current_schema` is the schema new objects are
/// attached to absent an explicit `schema.name` qualifier (mirrors
/// Postgres' `search_path` resolution for unqualified DDL).
pub fn parse(text: &str, current_schema: &str) -> Result<Ir, ParseError> {
    let mut ir = Ir::new();
    ir.schema_mut(current_schema);

    for stmt in split_statements(text) {
        let trimmed = strip_leading_line_comments(stmt.trim());
        if trimmed.is_empty() {
            continue;
        }
        if let Some(target) = trimmed.strip_prefix("\\i") {
            return Err(ParseError::Include(target.trim().to_string()));
        }
        apply_statement(&mut ir, trimmed, current_schema)?;
    }

    Ok(ir)
}

/// Drops any run of blank lines and whole-line `-- ...` comments from the
/// front of a statement, so a comment immediately preceding a DDL statement
/// doesn't make the whole statement look like a no-op comment block. Only
/// ever applied to the dispatch-facing statement text, never to a body
/// (function/procedure source) that may legitimately contain `--`.
fn strip_leading_line_comments(mut s: &str) -> &str {
    loop {
        let trimmed = s.trim_start();
        if let Some(rest) = trimmed.strip_prefix("--") {
            s = match rest.find('\n') {
                Some(idx) => &rest[idx + 1..],
                None => "",
            };
        } else {
            return trimmed;
        }
    }
}

fn apply_statement(ir: &mut Ir, stmt: &str, current_schema: &str) -> Result<(), ParseError> {
    let upper = uppercase_keywords_prefix(stmt);

    if upper.starts_with("SET") {
        // `SET ...` statements are tolerated syntactically but carry no IR
        // meaning; never surfaced as `ErrUnsupported`.
        return Ok(());
    } else if upper.starts_with("CREATE SCHEMA") {
        let name = combinators::parse_create_schema(stmt)?;
        ir.schema_mut(&name);
    } else if upper.starts_with("CREATE TABLE") {
        let (table, constraints, sequences) = combinators::parse_create_table(stmt, current_schema)?;
        let schema = table.schema.clone();
        ir.schema_mut(&schema).tables.push(table);
        for constraint in constraints {
            ir.schema_mut(&schema).constraints.push(constraint);
        }
        for sequence in sequences {
            ir.schema_mut(&schema).sequences.push(sequence);
        }
    } else if upper.starts_with("CREATE TYPE") {
        let ty = combinators::parse_create_type(stmt, current_schema)?;
        ir.schema_mut(&ty.schema).types.push(ty);
    } else if upper.starts_with("CREATE DOMAIN") {
        let domain = combinators::parse_create_domain(stmt, current_schema)?;
        ir.schema_mut(&domain.schema).domains.push(domain);
    } else if upper.starts_with("CREATE SEQUENCE") {
        let seq = combinators::parse_create_sequence(stmt, current_schema)?;
        ir.schema_mut(&seq.schema).sequences.push(seq);
    } else if upper.starts_with("CREATE UNIQUE INDEX") || upper.starts_with("CREATE INDEX") {
        let idx = combinators::parse_create_index(stmt, current_schema)?;
        ir.schema_mut(&idx.schema).indexes.push(idx);
    } else if upper.starts_with("CREATE MATERIALIZED VIEW") {
        let view = combinators::parse_create_materialized_view(stmt, current_schema)?;
        ir.schema_mut(&view.schema).materialized_views.push(view);
    } else if upper.starts_with("CREATE VIEW") || upper.starts_with("CREATE OR REPLACE VIEW") {
        let view = combinators::parse_create_view(stmt, current_schema)?;
        ir.schema_mut(&view.schema).views.push(view);
    } else if upper.starts_with("CREATE OR REPLACE FUNCTION") || upper.starts_with("CREATE FUNCTION") {
        let func = combinators::parse_create_function(stmt, current_schema)?;
        ir.schema_mut(&func.schema).functions.push(func);
    } else if upper.starts_with("CREATE OR REPLACE PROCEDURE") || upper.starts_with("CREATE PROCEDURE") {
        let proc = combinators::parse_create_procedure(stmt, current_schema)?;
        ir.schema_mut(&proc.schema).procedures.push(proc);
    } else if upper.starts_with("CREATE TRIGGER") {
        let trigger = combinators::parse_create_trigger(stmt, current_schema)?;
        ir.schema_mut(&trigger.schema).triggers.push(trigger);
    } else if upper.starts_with("CREATE POLICY") {
        let policy = combinators::parse_create_policy(stmt, current_schema)?;
        ir.schema_mut(&policy.schema).policies.push(policy);
    } else if upper.starts_with("ALTER TABLE") && upper.contains("ADD CONSTRAINT") {
        let (schema, constraint) = combinators::parse_alter_table_add_constraint(stmt, current_schema)?;
        ir.schema_mut(&schema).constraints.push(constraint);
    } else if upper.starts_with("ALTER TABLE") && upper.contains("ENABLE ROW LEVEL SECURITY") {
        let (schema, table) = combinators::parse_table_reference(stmt, current_schema)?;
        if let Some(t) = ir.schema_mut(&schema).tables.get(&EntityKey::composite2(&schema, &table)) {
            let mut t = t.clone();
            t.rls_enabled = true;
            ir.schema_mut(&schema).tables.delete(&EntityKey::composite2(&schema, &table));
            ir.schema_mut(&schema).tables.push(t);
        }
    } else if upper.starts_with("ALTER SEQUENCE") {
        let (schema, seq_name, table, column) =
            combinators::parse_alter_sequence_owned_by(stmt, current_schema)?;
        let key = EntityKey::composite2(&schema, &seq_name);
        if let Some(seq) = ir.schema_mut(&schema).sequences.get(&key) {
            let mut seq = seq.clone();
            seq.owned_by = Some((table, column));
            ir.schema_mut(&schema).sequences.delete(&key);
            ir.schema_mut(&schema).sequences.push(seq);
        }
    } else if upper.starts_with("GRANT") {
        let (schema, privilege) = combinators::parse_grant(stmt, current_schema)?;
        ir.schema_mut(&schema).privileges.push(privilege);
    } else {
        return Err(ParseError::Unsupported(first_words(stmt, 4)));
    }

    Ok(())
}

fn first_words(stmt: &str, n: usize) -> String {
    stmt.split_whitespace().take(n).collect::<Vec<_>>().join(" ")
}

/// Uppercases only the leading run of plain keyword characters, leaving
/// quoted identifiers and string literals (which may appear early in some
/// statement forms) untouched — used purely for the dispatch `starts_with`
/// checks above, never for identity text.
fn uppercase_keywords_prefix(stmt: &str) -> String {
    stmt.chars().take(40).collect::<String>().to_ascii_uppercase()
}

/// Split a `.sql` file into individual statements on top-level semicolons,
/// treating `'...'` string literals and `$tag$...$tag$` dollar-quoted
/// bodies (function/procedure source) as opaque so semicolons inside them
/// don't split the statement.
pub fn split_statements(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    let mut in_string = false;
    let mut in_line_comment = false;
    let mut dollar_tag: Option<String> = None;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }

        if let Some(tag) = &dollar_tag {
            if text[i..].starts_with(tag.as_str()) {
                i += tag.len();
                dollar_tag = None;
            } else {
                i += 1;
            }
            continue;
        }

        if in_string {
            if c == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '-' && text[i..].starts_with("--") {
            in_line_comment = true;
            i += 2;
            continue;
        }

        if c == '\'' {
            in_string = true;
            i += 1;
            continue;
        }

        if c == '$' {
            if let Some(tag) = find_dollar_tag(&text[i..]) {
                dollar_tag = Some(tag.clone());
                i += tag.len();
                continue;
            }
        }

        if c == ';' {
            statements.push(text[start..i].to_string());
            i += 1;
            start = i;
            continue;
        }

        i += 1;
    }

    if start < text.len() {
        let rest = text[start..].trim();
        if !rest.is_empty() {
            statements.push(rest.to_string());
        }
    }

    statements
}

/// Recognizes `$$` or `$tag$` at the start of `rest`, returning the full
/// delimiter (including both `$`s) if one is present.
fn find_dollar_tag(rest: &str) -> Option<String> {
    let mut chars = rest.char_indices();
    let (_, first) = chars.next()?;
    if first != '$' {
        return None;
    }
    for (idx, c) in chars {
        if c == '$' {
            return Some(rest[..idx + 1].to_string());
        }
        if !(c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_statements_respects_dollar_quoted_body() {
        let sql = r#"
CREATE TABLE t (id integer);
CREATE FUNCTION f() RETURNS integer LANGUAGE sql AS $$
  SELECT 1; SELECT 2;
$$;
CREATE TABLE u (id integer);
"#;
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 3);
        assert!(stmts[1].contains("SELECT 1; SELECT 2;"));
    }

    #[test]
    fn split_statements_respects_string_literal_semicolons() {
        let sql = "CREATE TABLE t (id integer DEFAULT 'a;b');";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn parse_simple_table() {
        let sql = "CREATE TABLE users (id integer NOT NULL, name text);";
        let ir = parse(sql, "public").unwrap();
        let schema = ir.schema("public").unwrap();
        assert_eq!(schema.tables.len(), 1);
        let table = schema.tables.get(&EntityKey::composite2("public", "users")).unwrap();
        assert_eq!(table.columns.len(), 2);
        assert!(!table.columns[0].nullable);
    }

    #[test]
    fn inline_primary_key_and_references_become_constraints() {
        let sql = "CREATE TABLE users (id integer PRIMARY KEY);\n\
                   CREATE TABLE orders (id integer PRIMARY KEY, user_id integer REFERENCES users(id));";
        let ir = parse(sql, "public").unwrap();
        let schema = ir.schema("public").unwrap();
        let orders = schema
            .constraints
            .iter()
            .filter(|c| c.table == "orders")
            .collect::<Vec<_>>();
        assert!(orders.iter().any(|c| c.kind == ConstraintKind::PrimaryKey));
        let fk = orders
            .iter()
            .find(|c| c.kind == ConstraintKind::ForeignKey)
            .expect("foreign key constraint");
        assert_eq!(fk.ref_table.as_deref(), Some("users"));
        assert_eq!(fk.columns, vec!["user_id".to_string()]);
    }

    #[test]
    fn table_level_constraints_are_extracted() {
        let sql = "CREATE TABLE widgets (\n\
                       id integer,\n\
                       sku text,\n\
                       CONSTRAINT widgets_pkey PRIMARY KEY (id),\n\
                       UNIQUE (sku),\n\
                       CHECK (id > 0)\n\
                   );";
        let ir = parse(sql, "public").unwrap();
        let schema = ir.schema("public").unwrap();
        let widgets: Vec<_> = schema.constraints.iter().filter(|c| c.table == "widgets").collect();
        assert_eq!(widgets.len(), 3);
        assert!(widgets.iter().any(|c| c.kind == ConstraintKind::PrimaryKey && c.name == "widgets_pkey"));
        assert!(widgets.iter().any(|c| c.kind == ConstraintKind::Unique));
        assert!(widgets.iter().any(|c| c.kind == ConstraintKind::Check));
    }

    #[test]
    fn unknown_statement_is_unsupported() {
        let err = parse("VACUUM ANALYZE users;", "public").unwrap_err();
        assert!(matches!(err, ParseError::Unsupported(_)));
    }

    #[test]
    fn set_statements_are_tolerated_and_ignored() {
        let sql = "SET search_path = public;\nCREATE TABLE t (id integer);";
        let ir = parse(sql, "public").unwrap();
        let schema = ir.schema("public").unwrap();
        assert_eq!(schema.tables.len(), 1);
    }

    #[test]
    fn leading_comment_does_not_swallow_the_statement_after_it() {
        let sql = "-- widgets table\nCREATE TABLE widgets (id integer);";
        let ir = parse(sql, "public").unwrap();
        let schema = ir.schema("public").unwrap();
        assert_eq!(schema.tables.len(), 1);
    }

    #[test]
    fn include_directive_surfaces_as_error() {
        let err = parse("\\i shared/types.sql", "public").unwrap_err();
        assert!(matches!(err, ParseError::Include(_)));
    }
}
