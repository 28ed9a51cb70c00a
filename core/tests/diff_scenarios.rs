//! Boundary scenarios from the schema-diffing spec's testable-properties
//! section: literal current/desired SQL in, an expected shape of rendered
//! DDL out. Each test goes through the real pipeline (parse → normalize →
//! filter → diff → render), not hand-built IR structs, so it doubles as a
//! parser/sqlgen regression test.

use schemaplan_core::ignore::IgnoreConfig;
use schemaplan_core::sqlgen::RenderOptions;
use schemaplan_core::{diff, normalize, parser};

const SCHEMA: &str = "public";

fn build(text: &str) -> schemaplan_core::Ir {
    let ir = parser::parse(text, SCHEMA).expect("parse should succeed");
    normalize::normalize(ir, SCHEMA)
}

fn render_all(ops: &[diff::Operation]) -> String {
    let opts = RenderOptions::default();
    ops.iter()
        .map(|op| schemaplan_core::sqlgen::render_operation(op, &opts))
        .collect::<Vec<_>>()
        .join("")
}

#[test]
fn add_column_emits_a_single_alter_table() {
    let current = build("CREATE TABLE users(id int PRIMARY KEY, name text);");
    let desired = build(
        "CREATE TABLE users(id int PRIMARY KEY, name text, email text);",
    );

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = render_all(&ops);

    assert_eq!(
        sql.trim(),
        "ALTER TABLE users ADD COLUMN email text;"
    );
}

#[test]
fn same_schema_qualifier_is_stripped_cross_schema_preserved() {
    let ir = build(
        "CREATE TABLE public.items(id int, made_at timestamp DEFAULT public.next_id(), tag text DEFAULT other.tag_of());",
    );
    let table = ir
        .schema("public")
        .unwrap()
        .tables
        .get(&schemaplan_core::EntityKey::composite2("public", "items"))
        .expect("table present");

    let made_at = table.columns.iter().find(|c| c.name == "made_at").unwrap();
    assert_eq!(made_at.default.as_deref(), Some("next_id()"));

    let tag = table.columns.iter().find(|c| c.name == "tag").unwrap();
    assert_eq!(tag.default.as_deref(), Some("other.tag_of()"));
}

#[test]
fn creating_both_tables_orders_referenced_table_first() {
    let current = build("CREATE TABLE users(id int PRIMARY KEY);");
    let desired = build(
        "CREATE TABLE users(id int PRIMARY KEY); \
         CREATE TABLE orders(id int PRIMARY KEY, user_id int REFERENCES users(id));",
    );

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = render_all(&ops);

    let orders_pos = sql.find("CREATE TABLE orders").expect("orders created");
    let users_alter_or_create = sql.find("users").expect("users referenced");
    assert!(
        users_alter_or_create < orders_pos || sql.contains("ADD CONSTRAINT"),
        "users must be established before or alongside orders' FK: {sql}"
    );
}

#[test]
fn view_body_change_drops_then_recreates() {
    let current = build("CREATE TABLE t(id int, name text); CREATE VIEW v AS SELECT id FROM t;");
    let desired =
        build("CREATE TABLE t(id int, name text); CREATE VIEW v AS SELECT id, name FROM t;");

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = render_all(&ops);

    assert!(sql.contains("DROP VIEW v;"), "{sql}");
    assert!(sql.contains("CREATE VIEW v AS"), "{sql}");
    assert!(!sql.contains("CREATE OR REPLACE VIEW"), "{sql}");

    let drop_pos = sql.find("DROP VIEW").unwrap();
    let create_pos = sql.find("CREATE VIEW").unwrap();
    assert!(drop_pos < create_pos);
}

#[test]
fn trigger_on_ignored_table_with_managed_function_survives() {
    let desired_text = "\
        CREATE TABLE temp_external_users(id int PRIMARY KEY); \
        CREATE OR REPLACE FUNCTION sync() RETURNS trigger LANGUAGE plpgsql AS $$ BEGIN RETURN NEW; END; $$; \
        CREATE TRIGGER t AFTER INSERT ON temp_external_users FOR EACH ROW EXECUTE FUNCTION sync();";

    let current = build("");
    let desired = build(desired_text);

    let cfg = IgnoreConfig::parse(
        r#"
[tables]
patterns = ["temp_external_users"]
"#,
    )
    .unwrap();

    let current = schemaplan_core::ignore::filter(current, &cfg);
    let desired = schemaplan_core::ignore::filter(desired, &cfg);

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = render_all(&ops);

    assert!(sql.contains("CREATE TRIGGER t"), "{sql}");
    assert!(!sql.contains("CREATE TABLE temp_external_users"), "{sql}");
    assert!(!sql.contains("DROP TABLE temp_external_users"), "{sql}");
}

#[test]
fn creating_a_table_with_rls_also_enables_it() {
    let current = build("");
    let desired = build(
        "CREATE TABLE accounts(id int PRIMARY KEY); ALTER TABLE accounts ENABLE ROW LEVEL SECURITY;",
    );

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = render_all(&ops);

    let create_pos = sql.find("CREATE TABLE accounts").expect("table created");
    let rls_pos = sql
        .find("ENABLE ROW LEVEL SECURITY")
        .expect("rls enabled on the new table");
    assert!(create_pos < rls_pos, "{sql}");
}

#[test]
fn identical_schemas_diff_to_nothing() {
    let text = "CREATE TABLE t(id int PRIMARY KEY, name text NOT NULL);";
    let a = build(text);
    let b = build(text);

    let ops = diff::diff(&a, &b).unwrap();
    assert!(ops.is_empty(), "expected empty diff, got {} ops", ops.len());
}
