//! Per-statement-kind parsers, one `nom` combinator pipeline per DDL form
//! named in the object model.
//!
//! Follows the same small-combinator style as the sibling crate's
//! `parser::combinators` (balanced-delimiter scanning alongside `nom` for
//! the parts `nom`'s built-in combinators don't make simpler).

use nom::{
    Parser,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0},
};

use crate::error::ParseError;
use crate::ir::*;

type PResult<'a, T> = Result<(&'a str, T), ParseError>;

fn syntax_err(input: &str, message: &str) -> ParseError {
    ParseError::Syntax {
        line: 1,
        col: input.len().min(1),
        message: message.to_string(),
    }
}

fn ident(input: &str) -> PResult<'_, String> {
    let input = input.trim_start();
    if let Some(rest) = input.strip_prefix('"') {
        let end = rest.find('"').ok_or_else(|| syntax_err(input, "unterminated quoted identifier"))?;
        return Ok((&rest[end + 1..], rest[..end].to_string()));
    }
    let (rest, word): (&str, &str) = take_while1::<_, _, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_alphanumeric() || c == '_'
    })
    .parse(input)
    .map_err(|_| syntax_err(input, "expected identifier"))?;
    Ok((rest, word.to_string()))
}

/// `name` or `schema.name`; returns `(schema, name)`, defaulting `schema`
/// to `current_schema` when unqualified.
fn qualified_ident<'a>(input: &'a str, current_schema: &str) -> PResult<'a, (String, String)> {
    let (rest, first) = ident(input)?;
    if let Some(stripped) = rest.strip_prefix('.') {
        let (rest2, second) = ident(stripped)?;
        Ok((rest2, (first, second)))
    } else {
        Ok((rest, (current_schema.to_string(), first)))
    }
}

fn ws(input: &str) -> &str {
    let (rest, _) = multispace0::<_, nom::error::Error<&str>>(input).unwrap_or((input, ""));
    rest
}

fn consume_tag<'a>(input: &'a str, t: &str) -> PResult<'a, ()> {
    let input = ws(input);
    let (rest, _) = tag_no_case::<_, _, nom::error::Error<&str>>(t)
        .parse(input)
        .map_err(|_| syntax_err(input, &format!("expected `{t}`")))?;
    Ok((rest, ()))
}

fn try_tag<'a>(input: &'a str, t: &str) -> (&'a str, bool) {
    let trimmed = ws(input);
    match tag_no_case::<_, _, nom::error::Error<&str>>(t).parse(trimmed) {
        Ok((rest, _)) => (rest, true),
        Err(_) => (input, false),
    }
}

/// Content inside balanced `(...)`, starting at the opening paren.
fn balanced_parens(input: &str) -> PResult<'_, String> {
    let input = ws(input);
    let (rest, _) = char::<_, nom::error::Error<&str>>('(')
        .parse(input)
        .map_err(|_| syntax_err(input, "expected `(`"))?;

    let mut depth = 1;
    let mut end = 0;
    let mut in_string = false;
    for (i, c) in rest.char_indices() {
        if in_string {
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => in_string = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    end = i;
                    break;
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(syntax_err(rest, "unbalanced parentheses"));
    }
    Ok((&rest[end + 1..], rest[..end].to_string()))
}

/// Split a comma-separated list respecting nested parens and string quotes
/// (column definitions, argument lists, index column lists).
fn split_top_level_commas(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        if in_string {
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => in_string = true,
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(input[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let tail = input[start..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

// ===========================================================================
// CREATE SCHEMA
// ===========================================================================

pub fn parse_create_schema(stmt: &str) -> Result<String, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "SCHEMA")?;
    let (rest, _) = try_tag(rest, "IF NOT EXISTS");
    let (_, name) = ident(rest)?;
    Ok(name)
}

// ===========================================================================
// CREATE TABLE
// ===========================================================================

pub fn parse_create_table(
    stmt: &str,
    current_schema: &str,
) -> Result<(Table, Vec<Constraint>, Vec<Sequence>), ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "TABLE")?;
    let (rest, _) = try_tag(rest, "IF NOT EXISTS");
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;

    let rest_trim = ws(rest);
    if let (after, true) = try_tag(rest_trim, "PARTITION OF") {
        let (after, (parent_schema, parent_name)) = qualified_ident(after, current_schema)?;
        let _ = parent_schema;
        let bound = ws(after).trim_end_matches(';').trim().to_string();
        return Ok((
            Table {
                schema,
                name,
                kind: TableKind::PartitionOf,
                parent: Some(parent_name),
                partition_key: None,
                partition_bound: Some(bound),
                columns: Vec::new(),
                rls_enabled: false,
                comment: None,
            },
            Vec::new(),
            Vec::new(),
        ));
    }

    let (rest, body) = balanced_parens(rest_trim)?;
    let (columns, constraints, sequences) = parse_column_list(&body, &schema, &name, current_schema)?;

    let rest = ws(rest);
    let (kind, partition_key) = if let (after, true) = try_tag(rest, "PARTITION BY") {
        let key = ws(after).trim_end_matches(';').trim().to_string();
        (TableKind::Partitioned, Some(key))
    } else {
        (TableKind::Base, None)
    };

    Ok((
        Table {
            schema,
            name,
            kind,
            parent: None,
            partition_key,
            partition_bound: None,
            columns,
            rls_enabled: false,
            comment: None,
        },
        constraints,
        sequences,
    ))
}

/// A constraint implied by a column's inline clause (`PRIMARY KEY`, `UNIQUE`,
/// `REFERENCES ...`); resolved into a full `Constraint` once the column name
/// and enclosing table are known.
enum InlineConstraint {
    PrimaryKey,
    Unique,
    References {
        ref_schema: String,
        ref_table: String,
        ref_column: Option<String>,
        on_update: Option<ReferentialAction>,
        on_delete: Option<ReferentialAction>,
    },
}

fn inline_constraint_to_constraint(
    inline: InlineConstraint,
    schema: &str,
    table: &str,
    column: &str,
) -> Constraint {
    match inline {
        InlineConstraint::PrimaryKey => Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name: format!("{table}_pkey"),
            kind: ConstraintKind::PrimaryKey,
            columns: vec![column.to_string()],
            ref_schema: None,
            ref_table: None,
            ref_columns: Vec::new(),
            on_update: None,
            on_delete: None,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        },
        InlineConstraint::Unique => Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name: format!("{table}_{column}_key"),
            kind: ConstraintKind::Unique,
            columns: vec![column.to_string()],
            ref_schema: None,
            ref_table: None,
            ref_columns: Vec::new(),
            on_update: None,
            on_delete: None,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        },
        InlineConstraint::References {
            ref_schema,
            ref_table,
            ref_column,
            on_update,
            on_delete,
        } => Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name: format!("{table}_{column}_fkey"),
            kind: ConstraintKind::ForeignKey,
            columns: vec![column.to_string()],
            ref_schema: Some(ref_schema),
            ref_table: Some(ref_table),
            ref_columns: ref_column.map(|c| vec![c]).unwrap_or_default(),
            on_update,
            on_delete,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        },
    }
}

fn parse_column_list(
    body: &str,
    schema: &str,
    table: &str,
    current_schema: &str,
) -> Result<(Vec<Column>, Vec<Constraint>, Vec<Sequence>), ParseError> {
    let mut columns = Vec::new();
    let mut constraints = Vec::new();
    let mut sequences = Vec::new();
    let mut position = 0u32;
    let mut constraint_seq = 0u32;
    for entry in split_top_level_commas(body) {
        let upper = entry.trim_start().to_ascii_uppercase();
        // Table-level constraints start with a keyword, not an identifier
        // that's followed by a type.
        if upper.starts_with("PRIMARY KEY")
            || upper.starts_with("CONSTRAINT")
            || upper.starts_with("UNIQUE")
            || upper.starts_with("FOREIGN KEY")
            || upper.starts_with("CHECK")
        {
            constraint_seq += 1;
            constraints.push(parse_table_constraint(&entry, schema, table, constraint_seq)?);
            continue;
        }
        position += 1;
        let (mut column, inline, is_serial) = parse_column_def(&entry, position, current_schema)?;
        if let Some(inline) = inline {
            constraints.push(inline_constraint_to_constraint(
                inline, schema, table, &column.name,
            ));
        }
        if is_serial && column.default.is_none() {
            let seq_name = format!("{table}_{}_seq", column.name);
            column.default = Some(format!("nextval('{seq_name}'::regclass)"));
            sequences.push(Sequence {
                schema: schema.to_string(),
                name: seq_name,
                data_type: column.data_type.clone(),
                start: 1,
                increment: 1,
                min_value: 1,
                max_value: i64::MAX,
                cache: 1,
                cycle: false,
                owned_by: Some((table.to_string(), column.name.clone())),
            });
        }
        columns.push(column);
    }
    Ok((columns, constraints, sequences))
}

/// Table-level constraint clause: optional `CONSTRAINT <name>` prefix, then
/// the same `PRIMARY KEY`/`UNIQUE`/`FOREIGN KEY`/`CHECK` tail the out-of-line
/// `ALTER TABLE ... ADD CONSTRAINT` form uses.
fn parse_table_constraint(
    entry: &str,
    schema: &str,
    table: &str,
    seq: u32,
) -> Result<Constraint, ParseError> {
    let trimmed = ws(entry);
    if let (after, true) = try_tag(trimmed, "CONSTRAINT") {
        let (after, name) = ident(after)?;
        parse_constraint_tail(ws(after), schema, table, name)
    } else {
        parse_constraint_tail(trimmed, schema, table, format!("{table}_constraint_{seq}"))
    }
}

fn parse_column_def(
    entry: &str,
    position: u32,
    current_schema: &str,
) -> Result<(Column, Option<InlineConstraint>, bool), ParseError> {
    let (rest, name) = ident(entry)?;
    let rest = ws(rest);
    let (rest, raw_type) = take_type(rest)?;

    let (data_type, is_serial) = desugar_serial(&raw_type);

    let mut nullable = true;
    let mut rest = rest;
    let mut default = None;
    let mut identity = None;
    let mut generated = None;
    let mut inline_constraint = None;

    loop {
        let trimmed = ws(rest);
        if let (after, true) = try_tag(trimmed, "NOT NULL") {
            nullable = false;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "NULL") {
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "DEFAULT") {
            let (after, expr) = take_till_keyword(after)?;
            default = Some(expr.trim().to_string());
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "PRIMARY KEY") {
            nullable = false;
            inline_constraint = Some(InlineConstraint::PrimaryKey);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "UNIQUE") {
            inline_constraint = Some(InlineConstraint::Unique);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "REFERENCES") {
            let (after, (ref_schema, ref_table)) = qualified_ident(after, current_schema)?;
            let (after, ref_column) = match balanced_parens(after) {
                Ok((after2, body)) => (after2, split_top_level_commas(&body).into_iter().next()),
                Err(_) => (after, None),
            };
            let mut on_update = None;
            let mut on_delete = None;
            let mut ref_rest = after;
            loop {
                let ref_trimmed = ws(ref_rest);
                if let (next, true) = try_tag(ref_trimmed, "ON UPDATE") {
                    let (next, action) = parse_referential_action_clause(next)?;
                    on_update = Some(action);
                    ref_rest = next;
                } else if let (next, true) = try_tag(ref_trimmed, "ON DELETE") {
                    let (next, action) = parse_referential_action_clause(next)?;
                    on_delete = Some(action);
                    ref_rest = next;
                } else {
                    break;
                }
            }
            inline_constraint = Some(InlineConstraint::References {
                ref_schema,
                ref_table,
                ref_column,
                on_update,
                on_delete,
            });
            rest = ref_rest;
        } else if let (after, true) = try_tag(trimmed, "GENERATED ALWAYS AS IDENTITY") {
            identity = Some(IdentityOptions {
                kind: IdentityKind::Always,
                start: None,
                increment: None,
                min_value: None,
                max_value: None,
                cache: None,
                cycle: false,
            });
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "GENERATED BY DEFAULT AS IDENTITY") {
            identity = Some(IdentityOptions {
                kind: IdentityKind::ByDefault,
                start: None,
                increment: None,
                min_value: None,
                max_value: None,
                cache: None,
                cycle: false,
            });
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "GENERATED ALWAYS AS") {
            let (after, expr) = balanced_parens(after)?;
            let (after, _) = try_tag(after, "STORED");
            generated = Some(Generated {
                kind: GeneratedKind::Stored,
                expression: expr,
            });
            rest = after;
        } else {
            break;
        }
    }

    if is_serial {
        nullable = false;
    }

    Ok((
        Column {
            position,
            name,
            data_type,
            nullable,
            default,
            generated,
            identity,
            collation: None,
            comment: None,
        },
        inline_constraint,
        is_serial,
    ))
}

/// Reads the type token, including an optional `(n[,m])` modifier.
fn take_type(input: &str) -> PResult<'_, String> {
    let (rest, word) = take_while1::<_, _, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_alphanumeric() || c == '_'
    })
    .parse(input)
    .map_err(|_| syntax_err(input, "expected a type name"))?;

    let mut full = word.to_string();
    let mut rest = rest;

    // Multi-word types: "double precision", "character varying",
    // "timestamp with time zone", etc.
    loop {
        let trimmed = ws(rest);
        let next_word_end = trimmed
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(trimmed.len());
        let candidate = &trimmed[..next_word_end];
        let extended = format!("{full} {candidate}").to_ascii_lowercase();
        if matches!(
            extended.as_str(),
            "double precision"
                | "character varying"
                | "character varying with"
                | "timestamp with"
                | "timestamp without"
                | "time with"
                | "time without"
                | "with time"
                | "without time"
                | "time zone"
        ) {
            full.push(' ');
            full.push_str(candidate);
            rest = &trimmed[next_word_end..];
        } else {
            rest = trimmed;
            break;
        }
    }

    if let Ok((after, modifier)) = balanced_parens(rest) {
        full.push('(');
        full.push_str(&modifier);
        full.push(')');
        rest = after;
    }
    if let (after, true) = try_tag(rest, "[]") {
        full.push_str("[]");
        rest = after;
    }

    Ok((rest, full))
}

/// Desugars `SERIAL`/`BIGSERIAL`/`SMALLSERIAL` to their base integer type,
/// flagging the column as serial so the caller (which knows the enclosing
/// table name) can attach an owned sequence and `nextval()` default,
/// matching what Postgres itself expands these pseudo-types to.
fn desugar_serial(raw_type: &str) -> (String, bool) {
    let lower = raw_type.to_ascii_lowercase();
    match lower.as_str() {
        "serial" | "serial4" => ("integer".to_string(), true),
        "bigserial" | "serial8" => ("bigint".to_string(), true),
        "smallserial" | "serial2" => ("smallint".to_string(), true),
        _ => (raw_type.to_string(), false),
    }
}

fn take_till_keyword(input: &str) -> PResult<'_, String> {
    let trimmed = ws(input);
    let keywords = [
        "NOT NULL", "NULL", "DEFAULT", "PRIMARY KEY", "GENERATED", "REFERENCES", "UNIQUE",
        "CHECK", ",",
    ];
    if let Some(stripped) = trimmed.strip_prefix('\'') {
        let end = stripped.find('\'').ok_or_else(|| syntax_err(trimmed, "unterminated string"))?;
        let literal = format!("'{}'", &stripped[..end]);
        return Ok((&stripped[end + 1..], literal));
    }
    if trimmed.starts_with('(') {
        let (rest, inner) = balanced_parens(trimmed)?;
        return Ok((rest, format!("({inner})")));
    }
    let mut best = trimmed.len();
    for kw in keywords {
        let upper = trimmed.to_ascii_uppercase();
        if let Some(idx) = upper.find(kw) {
            if idx > 0 && idx < best {
                best = idx;
            }
        }
    }
    Ok((&trimmed[best..], trimmed[..best].trim().to_string()))
}

// ===========================================================================
// CREATE TYPE ... AS ENUM
// ===========================================================================

pub fn parse_create_type(stmt: &str, current_schema: &str) -> Result<TypeDef, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "TYPE")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "AS")?;
    let (rest, _) = consume_tag(rest, "ENUM")?;
    let (_, body) = balanced_parens(rest)?;

    let labels = split_top_level_commas(&body)
        .into_iter()
        .map(|s| s.trim().trim_matches('\'').to_string())
        .collect();

    Ok(TypeDef {
        schema,
        name,
        kind: TypeKind::Enum { labels },
    })
}

// ===========================================================================
// CREATE DOMAIN
// ===========================================================================

pub fn parse_create_domain(stmt: &str, current_schema: &str) -> Result<Domain, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "DOMAIN")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "AS")?;
    let (rest, base_type) = take_type(rest)?;

    let mut nullable = true;
    let mut default = None;
    let mut checks = Vec::new();
    let mut rest = rest;
    let mut check_idx = 0;

    loop {
        let trimmed = ws(rest);
        if trimmed.is_empty() || trimmed == ";" {
            break;
        }
        if let (after, true) = try_tag(trimmed, "NOT NULL") {
            nullable = false;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "DEFAULT") {
            let (after, expr) = take_till_keyword(after)?;
            default = Some(expr);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "CONSTRAINT") {
            let (after, name) = ident(after)?;
            let (after, _) = consume_tag(after, "CHECK")?;
            let (after, expr) = balanced_parens(after)?;
            checks.push(DomainCheck { name, expression: expr });
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "CHECK") {
            let (after, expr) = balanced_parens(after)?;
            checks.push(DomainCheck {
                name: format!("{name}_check{check_idx}"),
                expression: expr,
            });
            check_idx += 1;
            rest = after;
        } else {
            break;
        }
    }

    Ok(Domain {
        schema,
        name,
        base_type,
        nullable,
        default,
        checks,
    })
}

// ===========================================================================
// CREATE SEQUENCE
// ===========================================================================

pub fn parse_create_sequence(stmt: &str, current_schema: &str) -> Result<Sequence, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "SEQUENCE")?;
    let (rest, _) = try_tag(rest, "IF NOT EXISTS");
    let (mut rest, (schema, name)) = qualified_ident(rest, current_schema)?;

    let mut data_type = "bigint".to_string();
    let mut start = 1i64;
    let mut increment = 1i64;
    let mut min_value = 1i64;
    let mut max_value = i64::MAX;
    let mut cache = 1i64;
    let mut cycle = false;

    loop {
        let trimmed = ws(rest);
        if trimmed.is_empty() || trimmed == ";" {
            break;
        }
        if let (after, true) = try_tag(trimmed, "AS") {
            let (after, ty) = take_type(after)?;
            data_type = ty;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "START WITH") {
            let (after, n) = take_integer(after)?;
            start = n;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "INCREMENT BY") {
            let (after, n) = take_integer(after)?;
            increment = n;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "MINVALUE") {
            let (after, n) = take_integer(after)?;
            min_value = n;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "MAXVALUE") {
            let (after, n) = take_integer(after)?;
            max_value = n;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "CACHE") {
            let (after, n) = take_integer(after)?;
            cache = n;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "CYCLE") {
            cycle = true;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "NO CYCLE") {
            cycle = false;
            rest = after;
        } else {
            break;
        }
    }

    Ok(Sequence {
        schema,
        name,
        data_type,
        start,
        increment,
        min_value,
        max_value,
        cache,
        cycle,
        owned_by: None,
    })
}

fn take_integer(input: &str) -> PResult<'_, i64> {
    let trimmed = ws(input);
    let (rest, digits) = take_while::<_, _, nom::error::Error<&str>>(|c: char| {
        c.is_ascii_digit() || c == '-'
    })
    .parse(trimmed)
    .map_err(|_| syntax_err(trimmed, "expected integer"))?;
    let n: i64 = digits
        .parse()
        .map_err(|_| syntax_err(trimmed, "invalid integer literal"))?;
    Ok((rest, n))
}

// ===========================================================================
// CREATE INDEX
// ===========================================================================

pub fn parse_create_index(stmt: &str, current_schema: &str) -> Result<Index, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, unique) = try_tag(rest, "UNIQUE");
    let (rest, _) = consume_tag(rest, "INDEX")?;
    let (rest, _) = try_tag(rest, "CONCURRENTLY");
    let (rest, _) = try_tag(rest, "IF NOT EXISTS");
    let (rest, name) = ident(rest)?;
    let (rest, _) = consume_tag(rest, "ON")?;
    let (rest, (schema, table)) = qualified_ident(rest, current_schema)?;

    let (rest, method) = if let (after, true) = try_tag(rest, "USING") {
        let (after, m) = ident(after)?;
        (after, m)
    } else {
        (rest, "btree".to_string())
    };

    let (rest, body) = balanced_parens(rest)?;
    let columns = split_top_level_commas(&body)
        .into_iter()
        .map(|c| IndexColumn {
            is_expression: c.contains('('),
            ascending: !c.to_ascii_uppercase().contains("DESC"),
            nulls_first: c.to_ascii_uppercase().contains("NULLS FIRST"),
            opclass: None,
            value: c,
        })
        .collect();

    let mut include = Vec::new();
    let mut rest = rest;
    if let (after, true) = try_tag(rest, "INCLUDE") {
        let (after, body) = balanced_parens(after)?;
        include = split_top_level_commas(&body);
        rest = after;
    }

    let where_predicate = if let (after, true) = try_tag(rest, "WHERE") {
        Some(ws(after).trim_end_matches(';').trim().to_string())
    } else {
        None
    };

    Ok(Index {
        schema,
        table,
        name,
        columns,
        unique,
        method,
        where_predicate,
        include,
    })
}

// ===========================================================================
// CREATE VIEW / CREATE MATERIALIZED VIEW
// ===========================================================================

pub fn parse_create_view(stmt: &str, current_schema: &str) -> Result<View, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = try_tag(rest, "OR REPLACE");
    let (rest, _) = consume_tag(rest, "VIEW")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "AS")?;
    let definition = ws(rest).trim_end_matches(';').trim().to_string();

    Ok(View {
        schema,
        name,
        definition,
        dependencies: Vec::new(),
        comment: None,
    })
}

pub fn parse_create_materialized_view(
    stmt: &str,
    current_schema: &str,
) -> Result<MaterializedView, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "MATERIALIZED")?;
    let (rest, _) = consume_tag(rest, "VIEW")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "AS")?;
    let definition = ws(rest).trim_end_matches(';').trim().to_string();

    Ok(MaterializedView {
        schema,
        name,
        definition,
        dependencies: Vec::new(),
        comment: None,
    })
}

// ===========================================================================
// CREATE [OR REPLACE] FUNCTION / PROCEDURE
// ===========================================================================

pub fn parse_create_function(stmt: &str, current_schema: &str) -> Result<Function, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = try_tag(rest, "OR REPLACE");
    let (rest, _) = consume_tag(rest, "FUNCTION")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, args_body) = balanced_parens(rest)?;
    let arguments = parse_argument_list(&args_body)?;

    let (rest, _) = consume_tag(rest, "RETURNS")?;
    let (rest, return_type) = parse_return_type(rest)?;

    let (body, language, volatility, security, parallel_safe) = parse_routine_tail(rest)?;

    Ok(Function {
        schema,
        name,
        arguments,
        return_type,
        language,
        volatility,
        security,
        parallel_safe,
        body,
    })
}

pub fn parse_create_procedure(stmt: &str, current_schema: &str) -> Result<Procedure, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = try_tag(rest, "OR REPLACE");
    let (rest, _) = consume_tag(rest, "PROCEDURE")?;
    let (rest, (schema, name)) = qualified_ident(rest, current_schema)?;
    let (rest, args_body) = balanced_parens(rest)?;
    let arguments = parse_argument_list(&args_body)?;

    let (body, language, _volatility, security, _parallel_safe) = parse_routine_tail(rest)?;

    Ok(Procedure {
        schema,
        name,
        arguments,
        language,
        security,
        body,
    })
}

fn parse_argument_list(body: &str) -> Result<Vec<Argument>, ParseError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level_commas(body)
        .into_iter()
        .map(|part| parse_one_argument(&part))
        .collect()
}

fn parse_one_argument(part: &str) -> Result<Argument, ParseError> {
    let trimmed = part.trim();
    let (trimmed, mode) = if let (after, true) = try_tag(trimmed, "VARIADIC") {
        (after, ArgMode::Variadic)
    } else if let (after, true) = try_tag(trimmed, "INOUT") {
        (after, ArgMode::Inout)
    } else if let (after, true) = try_tag(trimmed, "OUT") {
        (after, ArgMode::Out)
    } else if let (after, true) = try_tag(trimmed, "IN") {
        (after, ArgMode::In)
    } else {
        (trimmed, ArgMode::In)
    };

    let trimmed = ws(trimmed);
    // An argument may be `type` or `name type`: if the first word is
    // followed by another type-looking word, it's a name.
    let (after_first, first) = ident(trimmed)?;
    let after_first_ws = ws(after_first);
    let looks_like_more = !after_first_ws.is_empty()
        && after_first_ws
            .chars()
            .next()
            .map(|c| c.is_ascii_alphabetic())
            .unwrap_or(false);

    let (name, data_type) = if looks_like_more {
        let (rest, ty) = take_type(after_first_ws)?;
        let _ = rest;
        (Some(first), ty)
    } else {
        (None, first)
    };

    Ok(Argument {
        name,
        mode,
        data_type,
        default: None,
    })
}

fn parse_return_type(input: &str) -> PResult<'_, ReturnType> {
    let trimmed = ws(input);
    if let (after, true) = try_tag(trimmed, "SETOF") {
        let (after, ty) = take_type(after)?;
        return Ok((after, ReturnType::SetOf(ty)));
    }
    if let (after, true) = try_tag(trimmed, "TABLE") {
        let (after, body) = balanced_parens(after)?;
        let args = parse_argument_list(&body)?;
        return Ok((after, ReturnType::Table(args)));
    }
    let (after, ty) = take_type(trimmed)?;
    Ok((after, ReturnType::Type(ty)))
}

type RoutineTail = (String, String, Volatility, Security, bool);

/// Parses the shared `LANGUAGE ... [volatility] [security] ... AS $$body$$`
/// tail shared by function and procedure definitions.
fn parse_routine_tail(input: &str) -> Result<RoutineTail, ParseError> {
    let mut language = "sql".to_string();
    let mut volatility = Volatility::Volatile;
    let mut security = Security::Invoker;
    let mut parallel_safe = false;
    let mut rest = input;

    loop {
        let trimmed = ws(rest);
        if let (after, true) = try_tag(trimmed, "LANGUAGE") {
            let (after, lang) = ident(after)?;
            language = lang;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "IMMUTABLE") {
            volatility = Volatility::Immutable;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "STABLE") {
            volatility = Volatility::Stable;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "VOLATILE") {
            volatility = Volatility::Volatile;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "PARALLEL SAFE") {
            parallel_safe = true;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "SECURITY DEFINER") {
            security = Security::Definer;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "SECURITY INVOKER") {
            security = Security::Invoker;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "AS") {
            let (after, body) = take_dollar_quoted_or_literal(after)?;
            rest = after;
            let _ = rest;
            return Ok((body, language, volatility, security, parallel_safe));
        } else {
            return Err(syntax_err(trimmed, "expected routine body"));
        }
    }
}

fn take_dollar_quoted_or_literal(input: &str) -> PResult<'_, String> {
    let trimmed = ws(input);
    if let Some(rest) = trimmed.strip_prefix('$') {
        let tag_end = rest.find('$').ok_or_else(|| syntax_err(trimmed, "unterminated dollar tag"))?;
        let delim = format!("${}$", &rest[..tag_end]);
        let body_start = tag_end + 1;
        let close = rest[body_start..]
            .find(&delim)
            .ok_or_else(|| syntax_err(trimmed, "unterminated dollar-quoted body"))?;
        let body = rest[body_start..body_start + close].to_string();
        let after = &rest[body_start + close + delim.len()..];
        return Ok((after, body));
    }
    if let Some(rest) = trimmed.strip_prefix('\'') {
        let end = rest.find('\'').ok_or_else(|| syntax_err(trimmed, "unterminated string"))?;
        return Ok((&rest[end + 1..], rest[..end].to_string()));
    }
    Err(syntax_err(trimmed, "expected a routine body"))
}

// ===========================================================================
// CREATE TRIGGER
// ===========================================================================

pub fn parse_create_trigger(stmt: &str, current_schema: &str) -> Result<Trigger, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "TRIGGER")?;
    let (rest, name) = ident(rest)?;

    let trimmed = ws(rest);
    let (rest, timing) = if let (after, true) = try_tag(trimmed, "BEFORE") {
        (after, TriggerTiming::Before)
    } else if let (after, true) = try_tag(trimmed, "AFTER") {
        (after, TriggerTiming::After)
    } else if let (after, true) = try_tag(trimmed, "INSTEAD OF") {
        (after, TriggerTiming::InsteadOf)
    } else {
        return Err(syntax_err(trimmed, "expected trigger timing"));
    };

    let mut events = Vec::new();
    let mut rest = rest;
    loop {
        let trimmed = ws(rest);
        if let (after, true) = try_tag(trimmed, "INSERT") {
            events.push(TriggerEvent::Insert);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "UPDATE") {
            events.push(TriggerEvent::Update);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "DELETE") {
            events.push(TriggerEvent::Delete);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "TRUNCATE") {
            events.push(TriggerEvent::Truncate);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "OR") {
            rest = after;
        } else {
            break;
        }
    }

    let (rest, _) = consume_tag(rest, "ON")?;
    let (rest, (schema, table)) = qualified_ident(rest, current_schema)?;

    let mut rest = rest;
    let mut per_row = false;
    if let (after, true) = try_tag(rest, "FOR EACH ROW") {
        per_row = true;
        rest = after;
    } else if let (after, true) = try_tag(rest, "FOR EACH STATEMENT") {
        rest = after;
    }

    let mut when_condition = None;
    if let (after, true) = try_tag(rest, "WHEN") {
        let (after, cond) = balanced_parens(after)?;
        when_condition = Some(cond);
        rest = after;
    }

    let (rest, _) = consume_tag(rest, "EXECUTE")?;
    let (rest, _) = {
        let trimmed = ws(rest);
        let (after, _) = try_tag(trimmed, "PROCEDURE");
        let (after, _) = try_tag(after, "FUNCTION");
        (after, ())
    };
    let (rest, func_name) = ident(rest)?;
    let (_, func_args) = balanced_parens(rest)?;

    Ok(Trigger {
        schema,
        table,
        name,
        timing,
        events,
        per_row,
        when_condition,
        function: format!("{func_name}({func_args})"),
    })
}

// ===========================================================================
// CREATE POLICY
// ===========================================================================

pub fn parse_create_policy(stmt: &str, current_schema: &str) -> Result<Policy, ParseError> {
    let (rest, _) = consume_tag(stmt, "CREATE")?;
    let (rest, _) = consume_tag(rest, "POLICY")?;
    let (rest, name) = ident(rest)?;
    let (rest, _) = consume_tag(rest, "ON")?;
    let (mut rest, (schema, table)) = qualified_ident(rest, current_schema)?;

    let mut permissive = true;
    let mut command = PolicyCommand::All;
    let mut roles = Vec::new();
    let mut using_expr = None;
    let mut check_expr = None;

    loop {
        let trimmed = ws(rest);
        if trimmed.is_empty() || trimmed == ";" {
            break;
        }
        if let (after, true) = try_tag(trimmed, "AS PERMISSIVE") {
            permissive = true;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "AS RESTRICTIVE") {
            permissive = false;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "FOR ALL") {
            command = PolicyCommand::All;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "FOR SELECT") {
            command = PolicyCommand::Select;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "FOR INSERT") {
            command = PolicyCommand::Insert;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "FOR UPDATE") {
            command = PolicyCommand::Update;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "FOR DELETE") {
            command = PolicyCommand::Delete;
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "TO") {
            let (after, role) = ident(after)?;
            roles.push(role);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "USING") {
            let (after, expr) = balanced_parens(after)?;
            using_expr = Some(expr);
            rest = after;
        } else if let (after, true) = try_tag(trimmed, "WITH CHECK") {
            let (after, expr) = balanced_parens(after)?;
            check_expr = Some(expr);
            rest = after;
        } else {
            break;
        }
    }

    Ok(Policy {
        schema,
        table,
        name,
        command,
        permissive,
        roles,
        using_expr,
        check_expr,
    })
}

// ===========================================================================
// ALTER TABLE ... ADD CONSTRAINT / ENABLE ROW LEVEL SECURITY
// ===========================================================================

pub fn parse_table_reference(
    stmt: &str,
    current_schema: &str,
) -> Result<(String, String), ParseError> {
    let (rest, _) = consume_tag(stmt, "ALTER")?;
    let (rest, _) = consume_tag(rest, "TABLE")?;
    let (_, (schema, table)) = qualified_ident(rest, current_schema)?;
    Ok((schema, table))
}

pub fn parse_alter_table_add_constraint(
    stmt: &str,
    current_schema: &str,
) -> Result<(String, Constraint), ParseError> {
    let (rest, _) = consume_tag(stmt, "ALTER")?;
    let (rest, _) = consume_tag(rest, "TABLE")?;
    let (rest, (schema, table)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "ADD")?;
    let (rest, _) = consume_tag(rest, "CONSTRAINT")?;
    let (rest, name) = ident(rest)?;

    let trimmed = ws(rest);
    let constraint = parse_constraint_tail(trimmed, &schema, &table, name)?;
    Ok((schema, constraint))
}

/// Shared tail grammar for `PRIMARY KEY (...)` / `UNIQUE (...)` /
/// `FOREIGN KEY (...) REFERENCES ...` / `CHECK (...)`, used by both the
/// out-of-line `ALTER TABLE ... ADD CONSTRAINT` form and table-level
/// constraint clauses inside `CREATE TABLE`.
fn parse_constraint_tail(
    trimmed: &str,
    schema: &str,
    table: &str,
    name: String,
) -> Result<Constraint, ParseError> {
    if let (after, true) = try_tag(trimmed, "PRIMARY KEY") {
        let (_, body) = balanced_parens(after)?;
        Ok(Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name,
            kind: ConstraintKind::PrimaryKey,
            columns: split_top_level_commas(&body),
            ref_schema: None,
            ref_table: None,
            ref_columns: Vec::new(),
            on_update: None,
            on_delete: None,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        })
    } else if let (after, true) = try_tag(trimmed, "UNIQUE") {
        let (_, body) = balanced_parens(after)?;
        Ok(Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name,
            kind: ConstraintKind::Unique,
            columns: split_top_level_commas(&body),
            ref_schema: None,
            ref_table: None,
            ref_columns: Vec::new(),
            on_update: None,
            on_delete: None,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        })
    } else if let (after, true) = try_tag(trimmed, "FOREIGN KEY") {
        let (after, body) = balanced_parens(after)?;
        let columns = split_top_level_commas(&body);
        let (after, _) = consume_tag(after, "REFERENCES")?;
        let (after, (ref_schema, ref_table)) = qualified_ident(after, schema)?;
        let (after, ref_body) = balanced_parens(after)?;
        let ref_columns = split_top_level_commas(&ref_body);

        let mut on_update = None;
        let mut on_delete = None;
        let mut rest = after;
        loop {
            let trimmed = ws(rest);
            if let (next, true) = try_tag(trimmed, "ON UPDATE") {
                let (next, action) = parse_referential_action_clause(next)?;
                on_update = Some(action);
                rest = next;
            } else if let (next, true) = try_tag(trimmed, "ON DELETE") {
                let (next, action) = parse_referential_action_clause(next)?;
                on_delete = Some(action);
                rest = next;
            } else {
                break;
            }
        }

        Ok(Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name,
            kind: ConstraintKind::ForeignKey,
            columns,
            ref_schema: Some(ref_schema),
            ref_table: Some(ref_table),
            ref_columns,
            on_update,
            on_delete,
            expression: None,
            deferrable: false,
            initially_deferred: false,
        })
    } else if let (after, true) = try_tag(trimmed, "CHECK") {
        let (_, expr) = balanced_parens(after)?;
        Ok(Constraint {
            schema: schema.to_string(),
            table: table.to_string(),
            name,
            kind: ConstraintKind::Check,
            columns: Vec::new(),
            ref_schema: None,
            ref_table: None,
            ref_columns: Vec::new(),
            on_update: None,
            on_delete: None,
            expression: Some(expr),
            deferrable: false,
            initially_deferred: false,
        })
    } else {
        Err(syntax_err(trimmed, "unsupported constraint form"))
    }
}

fn parse_referential_action_clause(input: &str) -> PResult<'_, ReferentialAction> {
    let trimmed = ws(input);
    if let (after, true) = try_tag(trimmed, "CASCADE") {
        Ok((after, ReferentialAction::Cascade))
    } else if let (after, true) = try_tag(trimmed, "RESTRICT") {
        Ok((after, ReferentialAction::Restrict))
    } else if let (after, true) = try_tag(trimmed, "SET NULL") {
        Ok((after, ReferentialAction::SetNull))
    } else if let (after, true) = try_tag(trimmed, "SET DEFAULT") {
        Ok((after, ReferentialAction::SetDefault))
    } else if let (after, true) = try_tag(trimmed, "NO ACTION") {
        Ok((after, ReferentialAction::NoAction))
    } else {
        Err(syntax_err(trimmed, "expected referential action"))
    }
}

// ===========================================================================
// ALTER SEQUENCE ... OWNED BY
// ===========================================================================

/// `ALTER SEQUENCE [schema.]name OWNED BY [schema.]table.column;`, the form
/// dumps emit to record an owned sequence separately from its `CREATE
/// SEQUENCE`. Returns `(sequence_schema, sequence_name, owned_table, owned_column)`.
pub fn parse_alter_sequence_owned_by(
    stmt: &str,
    current_schema: &str,
) -> Result<(String, String, String, String), ParseError> {
    let (rest, _) = consume_tag(stmt, "ALTER")?;
    let (rest, _) = consume_tag(rest, "SEQUENCE")?;
    let (rest, (seq_schema, seq_name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "OWNED")?;
    let (rest, _) = consume_tag(rest, "BY")?;
    let (rest, first) = ident(rest)?;
    let rest_after_first = rest;
    let (table, column) = if let Some(stripped) = rest_after_first.strip_prefix('.') {
        let (rest2, second) = ident(stripped)?;
        if let Some(stripped2) = rest2.strip_prefix('.') {
            // schema.table.column: discard the leading schema segment.
            let (_, third) = ident(stripped2)?;
            (second, third)
        } else {
            (first, second)
        }
    } else {
        return Err(syntax_err(rest_after_first, "expected table.column after OWNED BY"));
    };

    Ok((seq_schema, seq_name, table, column))
}

// ===========================================================================
// GRANT
// ===========================================================================

pub fn parse_grant(stmt: &str, current_schema: &str) -> Result<(String, Privilege), ParseError> {
    let (rest, _) = consume_tag(stmt, "GRANT")?;
    let (rest, privileges) = take_till_keyword_list(rest, "ON")?;
    let (rest, _) = consume_tag(rest, "ON")?;
    let (rest, _) = try_tag(rest, "TABLE");
    let (rest, (schema, object_name)) = qualified_ident(rest, current_schema)?;
    let (rest, _) = consume_tag(rest, "TO")?;
    let (rest, grantee) = ident(rest)?;
    let (_, with_grant) = try_tag(rest, "WITH GRANT OPTION");

    Ok((
        schema.clone(),
        Privilege {
            schema,
            object_kind: PrivilegeObjectKind::Table,
            object_name,
            grantee,
            privileges,
            with_grant,
        },
    ))
}

fn take_till_keyword_list<'a>(input: &'a str, stop: &str) -> PResult<'a, Vec<String>> {
    let trimmed = ws(input);
    let upper = trimmed.to_ascii_uppercase();
    let idx = upper
        .find(&format!(" {stop} "))
        .or_else(|| if upper.starts_with(&format!("{stop} ")) { Some(0) } else { None })
        .ok_or_else(|| syntax_err(trimmed, "expected ON clause"))?;
    let list_text = trimmed[..idx].trim();
    let privileges = list_text
        .split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    Ok((&trimmed[idx..], privileges))
}

