//! C2 Inspector: `BuildIR(client, schemaName) -> IR` over a live
//! `tokio_postgres::Client`.
//!
//! Query shapes follow `postgres::introspect::queries`'s existing
//! `pg_catalog`/`information_schema` joins, scoped to a single target schema
//! and widened to cover domains, materialized views, functions/procedures,
//! triggers, policies, and privileges.

use tokio_postgres::Client;

use crate::error::IntrospectError;
use crate::ir::*;

/// Build the full IR for one schema. Fails fast with `SchemaMissing` if the
/// schema does not exist, rather than silently returning an empty `Schema`:
/// introspecting a missing schema is an error, not an empty result.
pub async fn build_ir(client: &Client, schema_name: &str) -> Result<Ir, IntrospectError> {
    schema_exists(client, schema_name).await?;

    let mut schema = Schema::new(schema_name);

    load_tables(client, schema_name, &mut schema).await?;
    load_constraints(client, schema_name, &mut schema).await?;
    load_indexes(client, schema_name, &mut schema).await?;
    load_sequences(client, schema_name, &mut schema).await?;
    load_types(client, schema_name, &mut schema).await?;
    load_domains(client, schema_name, &mut schema).await?;
    load_views(client, schema_name, &mut schema).await?;
    load_functions(client, schema_name, &mut schema).await?;
    load_procedures(client, schema_name, &mut schema).await?;
    load_triggers(client, schema_name, &mut schema).await?;
    load_policies(client, schema_name, &mut schema).await?;
    load_privileges(client, schema_name, &mut schema).await?;

    let mut ir = Ir::new();
    ir.schemas.insert(schema_name.to_string(), schema);
    Ok(ir)
}

async fn schema_exists(client: &Client, schema_name: &str) -> Result<(), IntrospectError> {
    let row = client
        .query_opt(
            "SELECT 1 FROM pg_namespace WHERE nspname = $1",
            &[&schema_name],
        )
        .await
        .map_err(|e| IntrospectError::CatalogRead {
            query: "pg_namespace".into(),
            cause: e.to_string(),
        })?;
    if row.is_none() {
        return Err(IntrospectError::SchemaMissing(schema_name.to_string()));
    }
    Ok(())
}

fn catalog_err(query: &str) -> impl Fn(tokio_postgres::Error) -> IntrospectError + '_ {
    move |e| IntrospectError::CatalogRead {
        query: query.to_string(),
        cause: e.to_string(),
    }
}

async fn load_tables(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const TABLES_QUERY: &str = r#"
        SELECT
            c.relname AS name,
            c.relkind AS kind,
            c.relrowsecurity AS rls_enabled,
            p.relname AS parent,
            pg_get_expr(c.relpartbound, c.oid) AS partition_bound,
            pg_get_partkeydef(c.oid) AS partition_key
        FROM pg_class c
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_inherits i ON i.inhrelid = c.oid AND c.relispartition
        LEFT JOIN pg_class p ON p.oid = i.inhparent
        WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
        ORDER BY c.relname
    "#;
    const COLUMNS_QUERY: &str = r#"
        SELECT
            c.table_name AS table_name,
            c.column_name AS name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            c.is_nullable = 'NO' AS not_null,
            c.column_default AS default_value,
            c.is_identity = 'YES' AS is_identity,
            c.identity_generation AS identity_kind,
            c.is_generated = 'ALWAYS' AS is_generated,
            c.generation_expression AS generated_expression,
            c.collation_name AS collation,
            c.ordinal_position AS position
        FROM information_schema.columns c
        JOIN pg_attribute a
            ON a.attrelid = (quote_ident(c.table_schema) || '.' || quote_ident(c.table_name))::regclass
            AND a.attname = c.column_name
        WHERE c.table_schema = $1
        ORDER BY c.table_name, c.ordinal_position
    "#;

    let table_rows = client
        .query(TABLES_QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("tables"))?;
    let column_rows = client
        .query(COLUMNS_QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("columns"))?;

    for row in &table_rows {
        let name: String = row.get("name");
        let relkind: i8 = row.get::<_, i8>("kind");
        let parent: Option<String> = row.get("parent");
        let partition_bound: Option<String> = row.get("partition_bound");
        let partition_key: Option<String> = row.get("partition_key");

        let kind = if parent.is_some() {
            TableKind::PartitionOf
        } else if relkind == b'p' as i8 {
            TableKind::Partitioned
        } else {
            TableKind::Base
        };

        let columns = column_rows
            .iter()
            .filter(|r| r.get::<_, String>("table_name") == name)
            .map(|r| {
                let generated = if r.get::<_, bool>("is_generated") {
                    Some(Generated {
                        kind: GeneratedKind::Stored,
                        expression: r.get("generated_expression"),
                    })
                } else {
                    None
                };
                let identity = if r.get::<_, bool>("is_identity") {
                    let ik: Option<String> = r.get("identity_kind");
                    Some(IdentityOptions {
                        kind: match ik.as_deref() {
                            Some("ALWAYS") => IdentityKind::Always,
                            Some("BY DEFAULT") => IdentityKind::ByDefault,
                            _ => IdentityKind::None,
                        },
                        start: None,
                        increment: None,
                        min_value: None,
                        max_value: None,
                        cache: None,
                        cycle: false,
                    })
                } else {
                    None
                };
                Column {
                    position: r.get::<_, i32>("position") as u32,
                    name: r.get("name"),
                    data_type: r.get("data_type"),
                    nullable: !r.get::<_, bool>("not_null"),
                    default: r.get("default_value"),
                    generated,
                    identity,
                    collation: r.get("collation"),
                    comment: None,
                }
            })
            .collect();

        schema.tables.push(Table {
            schema: schema_name.to_string(),
            name,
            kind,
            parent,
            partition_key,
            partition_bound,
            columns,
            rls_enabled: row.get("rls_enabled"),
            comment: None,
        });
    }

    Ok(())
}

async fn load_constraints(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            con.conname AS name,
            tbl.relname AS table_name,
            con.contype AS contype,
            (
                SELECT array_agg(pa.attname ORDER BY u.ord)
                FROM unnest(con.conkey) WITH ORDINALITY AS u(attnum, ord)
                JOIN pg_attribute pa ON pa.attrelid = con.conrelid AND pa.attnum = u.attnum
            ) AS columns,
            ns_to.nspname AS ref_schema,
            tbl_to.relname AS ref_table,
            (
                SELECT array_agg(pa.attname ORDER BY u.ord)
                FROM unnest(con.confkey) WITH ORDINALITY AS u(attnum, ord)
                JOIN pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = u.attnum
            ) AS ref_columns,
            con.confupdtype::text AS on_update,
            con.confdeltype::text AS on_delete,
            pg_get_expr(con.conbin, con.conrelid) AS expression,
            con.condeferrable AS deferrable,
            con.condeferred AS initially_deferred
        FROM pg_constraint con
        JOIN pg_class tbl ON tbl.oid = con.conrelid
        JOIN pg_namespace ns ON ns.oid = tbl.relnamespace
        LEFT JOIN pg_class tbl_to ON tbl_to.oid = con.confrelid
        LEFT JOIN pg_namespace ns_to ON ns_to.oid = tbl_to.relnamespace
        WHERE ns.nspname = $1
        ORDER BY tbl.relname, con.conname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("constraints"))?;

    for row in &rows {
        let contype: i8 = row.get::<_, i8>("contype");
        let kind = match contype as u8 as char {
            'p' => ConstraintKind::PrimaryKey,
            'u' => ConstraintKind::Unique,
            'f' => ConstraintKind::ForeignKey,
            'c' => ConstraintKind::Check,
            'x' => ConstraintKind::Exclusion,
            _ => ConstraintKind::Check,
        };

        schema.constraints.push(Constraint {
            schema: schema_name.to_string(),
            table: row.get("table_name"),
            name: row.get("name"),
            kind,
            columns: row
                .get::<_, Option<Vec<Option<String>>>>("columns")
                .into_iter()
                .flatten()
                .flatten()
                .collect(),
            ref_schema: row.get("ref_schema"),
            ref_table: row.get("ref_table"),
            ref_columns: row
                .get::<_, Option<Vec<Option<String>>>>("ref_columns")
                .into_iter()
                .flatten()
                .flatten()
                .collect(),
            on_update: parse_referential_action(row.get("on_update")),
            on_delete: parse_referential_action(row.get("on_delete")),
            expression: row.get("expression"),
            deferrable: row.get("deferrable"),
            initially_deferred: row.get("initially_deferred"),
        });
    }

    Ok(())
}

fn parse_referential_action(code: Option<String>) -> Option<ReferentialAction> {
    match code.as_deref() {
        Some("a") => Some(ReferentialAction::NoAction),
        Some("r") => Some(ReferentialAction::Restrict),
        Some("c") => Some(ReferentialAction::Cascade),
        Some("n") => Some(ReferentialAction::SetNull),
        Some("d") => Some(ReferentialAction::SetDefault),
        _ => None,
    }
}

async fn load_indexes(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            tbl.relname AS table_name,
            idx.relname AS name,
            ix.indisunique AS is_unique,
            am.amname AS method,
            array_agg(pg_get_indexdef(ix.indexrelid, s.n, true) ORDER BY s.n) AS columns,
            pg_get_expr(ix.indpred, ix.indrelid) AS where_clause
        FROM pg_index ix
        JOIN pg_class idx ON idx.oid = ix.indexrelid
        JOIN pg_class tbl ON tbl.oid = ix.indrelid
        JOIN pg_namespace ns ON ns.oid = tbl.relnamespace
        JOIN pg_am am ON am.oid = idx.relam
        JOIN generate_series(1, ix.indnkeyatts) AS s(n) ON TRUE
        WHERE ns.nspname = $1 AND NOT ix.indisprimary
        GROUP BY tbl.relname, idx.relname, ix.indisunique, am.amname, ix.indpred, ix.indrelid
        ORDER BY tbl.relname, idx.relname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("indexes"))?;

    for row in &rows {
        let columns: Vec<String> = row.get("columns");
        schema.indexes.push(Index {
            schema: schema_name.to_string(),
            table: row.get("table_name"),
            name: row.get("name"),
            columns: columns
                .into_iter()
                .map(|value| IndexColumn {
                    value,
                    is_expression: false,
                    ascending: true,
                    nulls_first: false,
                    opclass: None,
                })
                .collect(),
            unique: row.get("is_unique"),
            method: row.get("method"),
            where_predicate: row.get("where_clause"),
            include: Vec::new(),
        });
    }

    Ok(())
}

async fn load_sequences(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            c.relname AS name,
            format_type(s.seqtypid, NULL) AS data_type,
            s.seqstart AS start_value,
            s.seqmin AS min_value,
            s.seqmax AS max_value,
            s.seqincrement AS increment,
            s.seqcycle AS cycle,
            s.seqcache AS cache_value,
            d.refobjid::regclass::text AS owner_table,
            a.attname AS owner_column
        FROM pg_sequence s
        JOIN pg_class c ON c.oid = s.seqrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_depend d ON d.objid = c.oid AND d.deptype = 'a'
        LEFT JOIN pg_attribute a ON a.attrelid = d.refobjid AND a.attnum = d.refobjsubid
        WHERE n.nspname = $1
        ORDER BY c.relname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("sequences"))?;

    for row in &rows {
        let owner_table: Option<String> = row.get("owner_table");
        let owner_column: Option<String> = row.get("owner_column");
        schema.sequences.push(Sequence {
            schema: schema_name.to_string(),
            name: row.get("name"),
            data_type: row.get("data_type"),
            start: row.get("start_value"),
            increment: row.get("increment"),
            min_value: row.get("min_value"),
            max_value: row.get("max_value"),
            cache: row.get("cache_value"),
            cycle: row.get("cycle"),
            owned_by: owner_table.zip(owner_column),
        });
    }

    Ok(())
}

async fn load_types(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            t.typname AS name,
            array_agg(e.enumlabel ORDER BY e.enumsortorder) AS labels
        FROM pg_type t
        JOIN pg_enum e ON t.oid = e.enumtypid
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE n.nspname = $1
        GROUP BY t.typname
        ORDER BY t.typname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("types"))?;

    for row in &rows {
        schema.types.push(TypeDef {
            schema: schema_name.to_string(),
            name: row.get("name"),
            kind: TypeKind::Enum {
                labels: row.get("labels"),
            },
        });
    }

    Ok(())
}

async fn load_domains(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            t.typname AS name,
            format_type(t.typbasetype, t.typtypmod) AS base_type,
            NOT t.typnotnull AS nullable,
            t.typdefault AS default_value
        FROM pg_type t
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE n.nspname = $1 AND t.typtype = 'd'
        ORDER BY t.typname
    "#;
    const CHECKS_QUERY: &str = r#"
        SELECT
            t.typname AS domain_name,
            con.conname AS name,
            pg_get_expr(con.conbin, 0) AS expression
        FROM pg_constraint con
        JOIN pg_type t ON t.oid = con.contypid
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE n.nspname = $1
        ORDER BY t.typname, con.conname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("domains"))?;
    let check_rows = client
        .query(CHECKS_QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("domain checks"))?;

    for row in &rows {
        let name: String = row.get("name");
        let checks = check_rows
            .iter()
            .filter(|r| r.get::<_, String>("domain_name") == name)
            .map(|r| DomainCheck {
                name: r.get("name"),
                expression: r.get("expression"),
            })
            .collect();

        schema.domains.push(Domain {
            schema: schema_name.to_string(),
            name,
            base_type: row.get("base_type"),
            nullable: row.get("nullable"),
            default: row.get("default_value"),
            checks,
        });
    }

    Ok(())
}

async fn load_views(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT schemaname AS schema, viewname AS name, definition, FALSE AS is_materialized
        FROM pg_views WHERE schemaname = $1
        UNION ALL
        SELECT schemaname AS schema, matviewname AS name, definition, TRUE AS is_materialized
        FROM pg_matviews WHERE schemaname = $1
        ORDER BY name
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("views"))?;

    for row in &rows {
        let name: String = row.get("name");
        let definition: String = row.get("definition");
        if row.get("is_materialized") {
            schema.materialized_views.push(MaterializedView {
                schema: schema_name.to_string(),
                name,
                definition,
                dependencies: Vec::new(),
                comment: None,
            });
        } else {
            schema.views.push(View {
                schema: schema_name.to_string(),
                name,
                definition,
                dependencies: Vec::new(),
                comment: None,
            });
        }
    }

    Ok(())
}

fn parse_routine_args(signature: &str) -> Vec<Argument> {
    let inner = signature
        .split_once('(')
        .and_then(|(_, rest)| rest.rsplit_once(')'))
        .map(|(args, _)| args)
        .unwrap_or("");
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|part| Argument {
            name: None,
            mode: ArgMode::In,
            data_type: part.trim().to_string(),
            default: None,
        })
        .collect()
}

async fn load_functions(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            p.proname AS name,
            pg_get_function_identity_arguments(p.oid) AS args,
            format_type(p.prorettype, NULL) AS return_type,
            p.prosrc AS body,
            l.lanname AS language,
            p.provolatile AS volatility,
            p.prosecdef AS security_definer,
            p.proparallel AS parallel
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        JOIN pg_language l ON l.oid = p.prolang
        WHERE n.nspname = $1 AND p.prokind = 'f'
        ORDER BY p.proname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("functions"))?;

    for row in &rows {
        let name: String = row.get("name");
        let args: String = row.get("args");
        let volatility: i8 = row.get::<_, i8>("volatility");
        let parallel: i8 = row.get::<_, i8>("parallel");

        schema.functions.push(Function {
            schema: schema_name.to_string(),
            name: name.clone(),
            arguments: parse_routine_args(&format!("({args})")),
            return_type: ReturnType::Type(row.get("return_type")),
            language: row.get("language"),
            volatility: match volatility as u8 as char {
                'i' => Volatility::Immutable,
                's' => Volatility::Stable,
                _ => Volatility::Volatile,
            },
            security: if row.get("security_definer") {
                Security::Definer
            } else {
                Security::Invoker
            },
            parallel_safe: parallel as u8 as char == 's',
            body: row.get("body"),
        });
    }

    Ok(())
}

async fn load_procedures(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            p.proname AS name,
            pg_get_function_identity_arguments(p.oid) AS args,
            p.prosrc AS body,
            l.lanname AS language,
            p.prosecdef AS security_definer
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        JOIN pg_language l ON l.oid = p.prolang
        WHERE n.nspname = $1 AND p.prokind = 'p'
        ORDER BY p.proname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("procedures"))?;

    for row in &rows {
        let args: String = row.get("args");
        schema.procedures.push(Procedure {
            schema: schema_name.to_string(),
            name: row.get("name"),
            arguments: parse_routine_args(&format!("({args})")),
            language: row.get("language"),
            security: if row.get("security_definer") {
                Security::Definer
            } else {
                Security::Invoker
            },
            body: row.get("body"),
        });
    }

    Ok(())
}

async fn load_triggers(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            tg.tgname AS name,
            tbl.relname AS table_name,
            tg.tgtype AS tgtype,
            p.proname AS function_name,
            pg_get_function_identity_arguments(p.oid) AS function_args,
            pg_get_triggerdef(tg.oid) AS definition
        FROM pg_trigger tg
        JOIN pg_class tbl ON tbl.oid = tg.tgrelid
        JOIN pg_namespace n ON n.oid = tbl.relnamespace
        JOIN pg_proc p ON p.oid = tg.tgfoid
        WHERE n.nspname = $1 AND NOT tg.tgisinternal
        ORDER BY tbl.relname, tg.tgname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("triggers"))?;

    for row in &rows {
        let tgtype: i16 = row.get("tgtype");
        let function_name: String = row.get("function_name");
        let function_args: String = row.get("function_args");
        let definition: String = row.get("definition");

        schema.triggers.push(Trigger {
            schema: schema_name.to_string(),
            table: row.get("table_name"),
            name: row.get("name"),
            timing: trigger_timing(tgtype),
            events: trigger_events(tgtype),
            per_row: tgtype & (1 << 0) != 0,
            when_condition: extract_when_clause(&definition),
            function: format!("{function_name}({function_args})"),
        });
    }

    Ok(())
}

fn trigger_timing(tgtype: i16) -> TriggerTiming {
    if tgtype & (1 << 6) != 0 {
        TriggerTiming::InsteadOf
    } else if tgtype & (1 << 1) != 0 {
        TriggerTiming::Before
    } else {
        TriggerTiming::After
    }
}

fn trigger_events(tgtype: i16) -> Vec<TriggerEvent> {
    let mut events = Vec::new();
    if tgtype & (1 << 2) != 0 {
        events.push(TriggerEvent::Insert);
    }
    if tgtype & (1 << 3) != 0 {
        events.push(TriggerEvent::Delete);
    }
    if tgtype & (1 << 4) != 0 {
        events.push(TriggerEvent::Update);
    }
    if tgtype & (1 << 5) != 0 {
        events.push(TriggerEvent::Truncate);
    }
    events
}

/// `pg_get_triggerdef` embeds the `WHEN (...)` clause inline; pull it out
/// textually rather than re-deriving it from catalog bits.
fn extract_when_clause(definition: &str) -> Option<String> {
    let start = definition.find("WHEN (")? + "WHEN (".len();
    let mut depth = 1;
    let bytes = definition.as_bytes();
    let mut end = start;
    for (i, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    end = start + i;
                    break;
                }
            }
            _ => {}
        }
    }
    Some(definition[start..end].to_string())
}

async fn load_policies(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            tablename AS table_name,
            policyname AS name,
            permissive = 'PERMISSIVE' AS permissive,
            cmd AS command,
            roles,
            qual AS using_expr,
            with_check
        FROM pg_policies
        WHERE schemaname = $1
        ORDER BY tablename, policyname
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("policies"))?;

    for row in &rows {
        let command: String = row.get("command");
        schema.policies.push(Policy {
            schema: schema_name.to_string(),
            table: row.get("table_name"),
            name: row.get("name"),
            command: match command.as_str() {
                "r" => PolicyCommand::Select,
                "a" => PolicyCommand::Insert,
                "w" => PolicyCommand::Update,
                "d" => PolicyCommand::Delete,
                _ => PolicyCommand::All,
            },
            permissive: row.get("permissive"),
            roles: row.get("roles"),
            using_expr: row.get("using_expr"),
            check_expr: row.get("with_check"),
        });
    }

    Ok(())
}

async fn load_privileges(
    client: &Client,
    schema_name: &str,
    schema: &mut Schema,
) -> Result<(), IntrospectError> {
    const QUERY: &str = r#"
        SELECT
            table_name AS object_name,
            grantee,
            array_agg(privilege_type ORDER BY privilege_type) AS privileges,
            bool_or(is_grantable = 'YES') AS with_grant
        FROM information_schema.role_table_grants
        WHERE table_schema = $1 AND grantee != 'PUBLIC'
        GROUP BY table_name, grantee
        ORDER BY table_name, grantee
    "#;

    let rows = client
        .query(QUERY, &[&schema_name])
        .await
        .map_err(catalog_err("privileges"))?;

    for row in &rows {
        schema.privileges.push(Privilege {
            schema: schema_name.to_string(),
            object_kind: PrivilegeObjectKind::Table,
            object_name: row.get("object_name"),
            grantee: row.get("grantee"),
            privileges: row.get("privileges"),
            with_grant: row.get("with_grant"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_events_decodes_bitmask() {
        // TRIGGER_TYPE_ROW | INSERT | UPDATE, per pg_trigger.tgtype bits.
        let tgtype: i16 = 0b10101;
        assert_eq!(trigger_events(tgtype), vec![TriggerEvent::Insert, TriggerEvent::Update]);
    }

    #[test]
    fn extract_when_clause_balances_parens() {
        let def = "CREATE TRIGGER t BEFORE INSERT ON x FOR EACH ROW WHEN (NEW.a > (1 + 2)) EXECUTE FUNCTION f()";
        assert_eq!(
            extract_when_clause(def),
            Some("NEW.a > (1 + 2)".to_string())
        );
    }

    #[test]
    fn parse_routine_args_splits_on_commas() {
        let args = parse_routine_args("(integer, text)");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].data_type, "integer");
        assert_eq!(args[1].data_type, "text");
    }
}
