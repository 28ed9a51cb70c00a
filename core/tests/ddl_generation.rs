//! DDL rendering shapes: identifier quoting, generated/identity columns,
//! partitioned tables, and enum/sequence output, checked against `render_dump`
//! and `render_operation` directly rather than through a round trip.

use schemaplan_core::sqlgen::{render_dump, render_operation, RenderOptions};
use schemaplan_core::{diff, normalize, parser};

const SCHEMA: &str = "public";

fn build(text: &str) -> schemaplan_core::Ir {
    let ir = parser::parse(text, SCHEMA).expect("parse should succeed");
    normalize::normalize(ir, SCHEMA)
}

#[test]
fn reserved_word_column_is_quoted() {
    let ir = build("CREATE TABLE t(id integer, \"order\" text);");
    let dump = render_dump(&ir, SCHEMA, &RenderOptions::default());
    assert!(dump.contains("\"order\" text"), "{dump}");
}

#[test]
fn quote_all_quotes_every_identifier() {
    let ir = build("CREATE TABLE widgets(id integer, name text);");
    let opts = RenderOptions {
        quote_all: true,
        ..RenderOptions::default()
    };
    let dump = render_dump(&ir, SCHEMA, &opts);
    assert!(dump.contains("CREATE TABLE \"public\".\"widgets\""), "{dump}");
    assert!(dump.contains("\"id\" integer"), "{dump}");
}

#[test]
fn identity_column_renders_generated_as_identity() {
    let ir = build("CREATE TABLE counters(id integer GENERATED ALWAYS AS IDENTITY, label text);");
    let dump = render_dump(&ir, SCHEMA, &RenderOptions::default());
    assert!(dump.contains("GENERATED ALWAYS AS IDENTITY"), "{dump}");
}

#[test]
fn partitioned_table_renders_partition_by_clause() {
    let ir = build("CREATE TABLE events(id integer, logged_at timestamp) PARTITION BY RANGE (logged_at);");
    let dump = render_dump(&ir, SCHEMA, &RenderOptions::default());
    assert!(dump.contains("PARTITION BY RANGE (logged_at)"), "{dump}");
}

#[test]
fn enum_type_renders_labels_in_declared_order() {
    let ir = build("CREATE TYPE mood AS ENUM ('sad', 'ok', 'happy');");
    let dump = render_dump(&ir, SCHEMA, &RenderOptions::default());
    let pos_sad = dump.find("'sad'").expect("sad present");
    let pos_ok = dump.find("'ok'").expect("ok present");
    let pos_happy = dump.find("'happy'").expect("happy present");
    assert!(pos_sad < pos_ok && pos_ok < pos_happy, "{dump}");
}

#[test]
fn plan_rendering_omits_comment_blocks_and_header() {
    let current = build("CREATE TABLE t(id integer);");
    let desired = build("CREATE TABLE t(id integer); CREATE TABLE u(id integer);");
    let ops = diff::diff(&current, &desired).unwrap();

    let opts = RenderOptions {
        with_comments: false,
        ..RenderOptions::default()
    };
    let sql = ops
        .iter()
        .map(|op| render_operation(op, &opts))
        .collect::<Vec<_>>()
        .join("");

    assert!(!sql.contains("-- Name:"), "{sql}");
    assert!(sql.contains("CREATE TABLE"), "{sql}");
}

#[test]
fn added_enum_label_renders_as_in_place_alter_type() {
    let current = build("CREATE TYPE mood AS ENUM ('sad', 'happy');");
    let desired = build("CREATE TYPE mood AS ENUM ('sad', 'happy', 'ecstatic');");

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = ops
        .iter()
        .map(|op| render_operation(op, &RenderOptions::default()))
        .collect::<Vec<_>>()
        .join("");

    assert!(sql.contains("ALTER TYPE"), "{sql}");
    assert!(sql.contains("ADD VALUE"), "{sql}");
    assert!(!sql.contains("DROP TYPE"), "{sql}");
}

#[test]
fn removed_enum_label_forces_drop_then_create() {
    let current = build("CREATE TYPE mood AS ENUM ('sad', 'ok', 'happy');");
    let desired = build("CREATE TYPE mood AS ENUM ('sad', 'happy');");

    let ops = diff::diff(&current, &desired).unwrap();
    let sql = ops
        .iter()
        .map(|op| render_operation(op, &RenderOptions::default()))
        .collect::<Vec<_>>()
        .join("");

    assert!(sql.contains("DROP TYPE"), "{sql}");
    assert!(sql.contains("CREATE TYPE"), "{sql}");
    let drop_pos = sql.find("DROP TYPE").unwrap();
    let create_pos = sql.find("CREATE TYPE").unwrap();
    assert!(drop_pos < create_pos);
}
