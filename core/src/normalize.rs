//! C4 Normalizer: rewrites cosmetic differences into one canonical form so
//! that `IR::equal` reflects semantic, not textual, equivalence.
//!
//! Grounded in `postgres::grammar`'s type-synonym table and
//! `postgres::serializer`'s expression rewriting, generalized into a
//! six-step pipeline.

use crate::ir::{Column, Constraint, Domain, Function, Ir, Policy, Procedure, Schema, Trigger, View};

/// Pure function: `Normalize(ir, currentSchema) -> ir'`.
pub fn normalize(mut ir: Ir, current_schema: &str) -> Ir {
    for schema in ir.schemas.values_mut() {
        normalize_schema(schema, current_schema);
    }
    ir
}

fn normalize_schema(schema: &mut Schema, current_schema: &str) {
    map_collection(&mut schema.tables, |table| {
        for column in table.columns.iter_mut() {
            normalize_column(column, current_schema);
        }
    });
    map_collection(&mut schema.constraints, |c| normalize_constraint(c, current_schema));
    map_collection(&mut schema.views, |v| normalize_view(v, current_schema));
    map_collection(&mut schema.functions, |f| normalize_function(f, current_schema));
    map_collection(&mut schema.procedures, |p| normalize_procedure(p, current_schema));
    map_collection(&mut schema.triggers, |t| normalize_trigger(t, current_schema));
    map_collection(&mut schema.policies, |p| normalize_policy(p, current_schema));
    map_collection(&mut schema.domains, |d| normalize_domain(d, current_schema));
}

fn map_collection<E, F>(col: &mut crate::collection::Collection<E>, mut f: F)
where
    E: crate::entity::Entity,
    F: FnMut(&mut E),
{
    let mut items: Vec<E> = std::mem::take(col).into_vec();
    for item in items.iter_mut() {
        f(item);
    }
    *col = items.into_iter().collect();
}

fn normalize_column(column: &mut Column, current_schema: &str) {
    column.data_type = canonical_type(&column.data_type);
    if let Some(default) = column.default.as_mut() {
        *default = strip_qualifier(default, current_schema);
    }
    if let Some(generated) = column.generated.as_mut() {
        generated.expression = strip_qualifier(&generated.expression, current_schema);
    }
}

fn normalize_constraint(constraint: &mut Constraint, current_schema: &str) {
    if let Some(expr) = constraint.expression.as_mut() {
        *expr = strip_qualifier(expr, current_schema);
    }
}

fn normalize_view(view: &mut View, current_schema: &str) {
    view.definition = strip_qualifier(&view.definition, current_schema);
}

fn normalize_function(function: &mut Function, current_schema: &str) {
    function.body = strip_qualifier(&function.body, current_schema);
}

fn normalize_procedure(procedure: &mut Procedure, current_schema: &str) {
    procedure.body = strip_qualifier(&procedure.body, current_schema);
}

fn normalize_trigger(trigger: &mut Trigger, current_schema: &str) {
    if let Some(when) = trigger.when_condition.as_mut() {
        *when = strip_qualifier(when, current_schema);
    }
}

fn normalize_policy(policy: &mut Policy, current_schema: &str) {
    if let Some(using) = policy.using_expr.as_mut() {
        *using = strip_qualifier(using, current_schema);
    }
    if let Some(check) = policy.check_expr.as_mut() {
        *check = strip_qualifier(check, current_schema);
    }
}

fn normalize_domain(domain: &mut Domain, current_schema: &str) {
    if let Some(default) = domain.default.as_mut() {
        *default = strip_qualifier(default, current_schema);
    }
    for check in domain.checks.iter_mut() {
        check.expression = strip_qualifier(&check.expression, current_schema);
    }
}

/// Step 2: collapse a handful of common type synonyms to the spelling
/// Postgres' catalog reports (the Inspector already emits canonical names;
/// this exists so hand-written desired-state text normalizes identically).
pub fn canonical_type(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();

    // Preserve any parenthesized modifier (e.g. `varchar(255)`).
    let (base, modifier) = match lower.find('(') {
        Some(idx) => (&lower[..idx], &lower[idx..]),
        None => (lower.as_str(), ""),
    };

    let canonical_base = match base.trim() {
        "int" | "int4" | "integer" => "integer",
        "int2" | "smallint" => "smallint",
        "int8" | "bigint" => "bigint",
        "varchar" | "character varying" => "character varying",
        "bpchar" | "character" => "character",
        "bool" | "boolean" => "boolean",
        "float4" | "real" => "real",
        "float8" | "double precision" => "double precision",
        "timestamptz" | "timestamp with time zone" => "timestamp with time zone",
        "timestamp" | "timestamp without time zone" => "timestamp without time zone",
        "timetz" | "time with time zone" => "time with time zone",
        "time" | "time without time zone" => "time without time zone",
        "decimal" | "numeric" => "numeric",
        "serial" | "serial4" => "integer",
        "bigserial" | "serial8" => "bigint",
        other => other,
    };

    format!("{canonical_base}{modifier}")
}

/// Step 4: rewrite `<currentSchema>.<name>` to `<name>` within an
/// expression, leaving cross-schema references, string literals, and casts
/// to other schemas untouched. This is a textual rewrite, not a parse;
/// structural parsing of expressions is deliberately out of scope.
pub fn strip_qualifier(expr: &str, current_schema: &str) -> String {
    let prefix = format!("{current_schema}.");
    let bytes = expr.as_bytes();
    let mut out = String::with_capacity(expr.len());
    let mut i = 0;
    let mut in_string = false;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c == '\'' {
            in_string = !in_string;
            out.push(c);
            i += 1;
            continue;
        }

        if !in_string && expr[i..].starts_with(&prefix) {
            let before_ok = i == 0 || !is_ident_char(bytes[i - 1] as char);
            if before_ok {
                i += prefix.len();
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_type_collapses_synonyms() {
        assert_eq!(canonical_type("int4"), "integer");
        assert_eq!(canonical_type("VARCHAR(255)"), "character varying(255)");
        assert_eq!(canonical_type("bool"), "boolean");
        assert_eq!(
            canonical_type("timestamptz"),
            "timestamp with time zone"
        );
    }

    #[test]
    fn strip_qualifier_rewrites_same_schema_only() {
        assert_eq!(strip_qualifier("public.next_id()", "public"), "next_id()");
        assert_eq!(strip_qualifier("other.fn()", "public"), "other.fn()");
    }

    #[test]
    fn strip_qualifier_preserves_string_literals() {
        let expr = "'public.not_a_call'";
        assert_eq!(strip_qualifier(expr, "public"), expr);
    }
}
