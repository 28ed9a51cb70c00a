//! C6 Diff Engine: compares two normalized IRs and emits an ordered
//! sequence of typed diff operations.
//!
//! Generalizes `postgres::diff`'s per-kind `diff_tables`/`diff_columns`/...
//! free functions (structural "prev vs cur" comparison) combined with
//! `collection::diff_collections`'s generic identity-based three-way split,
//! plus a dependency graph (`diff::graph`) for topological ordering.

mod graph;

use std::collections::BTreeMap;

use crate::collection::diff_collections;
use crate::entity::{DiffType, Entity, EntityKey, EntityKind};
use crate::error::DiffError;
use crate::ir::{
    Column, ConstraintKind, Domain, Function, Index, Ir, MaterializedView, Policy, Privilege,
    Procedure, Schema, SchemaDef, Sequence, Table, Trigger, TypeDef, TypeKind, View,
};

use graph::{DepGraph, NodeId};

/// A single field-level change within an `AlterTable` operation.
#[derive(Debug, Clone)]
pub enum ColumnChange {
    Add(Column),
    Drop(Column),
    Alter { old: Column, new: Column },
}

/// One unit of schema change. `kind_ordinal` determines tie-break order
/// within a topological level.
#[derive(Debug, Clone)]
pub enum Operation {
    CreateSchema(SchemaDef),
    DropSchema(SchemaDef),

    CreateType(TypeDef),
    /// Label addition or removal for an ENUM type. Removal forces
    /// drop+create at a higher level (see `build_types`); this variant only
    /// ever carries an in-place label addition.
    AlterTypeAddValue {
        old: TypeDef,
        new: TypeDef,
        label: String,
        after: Option<String>,
    },
    DropType(TypeDef),

    CreateDomain(Domain),
    AlterDomain { old: Domain, new: Domain },
    DropDomain(Domain),

    CreateSequence(Sequence),
    AlterSequence { old: Sequence, new: Sequence },
    AlterSequenceOwnedBy(Sequence),
    DropSequence(Sequence),

    CreateTable(Table),
    AlterTable {
        table: Table,
        column_changes: Vec<ColumnChange>,
    },
    DropTable(Table),

    CreateConstraint(crate::ir::Constraint),
    DropConstraint(crate::ir::Constraint),

    CreateIndex(Index),
    DropIndex(Index),

    CreateFunction(Function),
    ReplaceFunction { old: Function, new: Function },
    DropFunction(Function),

    CreateProcedure(Procedure),
    ReplaceProcedure { old: Procedure, new: Procedure },
    DropProcedure(Procedure),

    CreateView(View),
    DropView(View),
    CreateMaterializedView(MaterializedView),
    DropMaterializedView(MaterializedView),

    CreateTrigger(Trigger),
    DropTrigger(Trigger),

    EnableRls { schema: String, table: String },
    DisableRls { schema: String, table: String },

    CreatePolicy(Policy),
    AlterPolicy { old: Policy, new: Policy },
    DropPolicy(Policy),

    CreatePrivilege(Privilege),
    DropPrivilege(Privilege),
}

impl Operation {
    pub fn diff_type(&self) -> DiffType {
        use Operation::*;
        match self {
            CreateSchema(_) | CreateType(_) | CreateDomain(_) | CreateSequence(_)
            | CreateTable(_) | CreateConstraint(_) | CreateIndex(_) | CreateFunction(_)
            | CreateProcedure(_) | CreateView(_) | CreateMaterializedView(_)
            | CreateTrigger(_) | CreatePolicy(_) | CreatePrivilege(_)
            | AlterSequenceOwnedBy(_) | EnableRls { .. } => DiffType::Create,

            DropSchema(_) | DropType(_) | DropDomain(_) | DropSequence(_) | DropTable(_)
            | DropConstraint(_) | DropIndex(_) | DropFunction(_) | DropProcedure(_)
            | DropView(_) | DropMaterializedView(_) | DropTrigger(_) | DropPolicy(_)
            | DropPrivilege(_) | DisableRls { .. } => DiffType::Drop,

            AlterTypeAddValue { .. }
            | AlterDomain { .. }
            | AlterSequence { .. }
            | AlterTable { .. }
            | ReplaceFunction { .. }
            | ReplaceProcedure { .. }
            | AlterPolicy { .. } => DiffType::Alter,
        }
    }

    /// Fixed kind-ordinal used as the tie-break within a topological level.
    /// This is creation order; drops use the reverse.
    pub fn kind_ordinal(&self) -> u8 {
        use Operation::*;
        match self {
            CreateSchema(_) | DropSchema(_) => 0,
            CreateType(_) | AlterTypeAddValue { .. } | DropType(_) => 1,
            CreateDomain(_) | AlterDomain { .. } | DropDomain(_) => 2,
            CreateSequence(_) | AlterSequence { .. } | DropSequence(_) => 3,
            CreateTable(_) | DropTable(_) => 4,
            AlterTable { .. } => 5,
            CreateConstraint(c) | DropConstraint(c) if c.kind != ConstraintKind::ForeignKey => 6,
            CreateConstraint(_) | DropConstraint(_) => 13,
            CreateIndex(_) | DropIndex(_) => 7,
            AlterSequenceOwnedBy(_) => 8,
            CreateFunction(_) | ReplaceFunction { .. } | DropFunction(_) => 9,
            CreateProcedure(_) | ReplaceProcedure { .. } | DropProcedure(_) => 10,
            CreateView(_) | DropView(_) => 11,
            CreateMaterializedView(_) | DropMaterializedView(_) => 12,
            CreateTrigger(_) | DropTrigger(_) => 13,
            EnableRls { .. } | DisableRls { .. } => 14,
            CreatePolicy(_) | AlterPolicy { .. } | DropPolicy(_) => 15,
            CreatePrivilege(_) | DropPrivilege(_) => 16,
        }
    }

    /// Identity of the object this operation targets, for tie-breaking and
    /// for dependency-graph node identification.
    pub fn identity(&self) -> (EntityKind, EntityKey) {
        use Operation::*;
        match self {
            CreateSchema(s) | DropSchema(s) => (EntityKind::Schema, s.key()),
            CreateType(t) | DropType(t) => (EntityKind::Type, t.key()),
            AlterTypeAddValue { new, .. } => (EntityKind::Type, new.key()),
            CreateDomain(d) | DropDomain(d) => (EntityKind::Domain, d.key()),
            AlterDomain { new, .. } => (EntityKind::Domain, new.key()),
            CreateSequence(s) | DropSequence(s) | AlterSequenceOwnedBy(s) => {
                (EntityKind::Sequence, s.key())
            }
            AlterSequence { new, .. } => (EntityKind::Sequence, new.key()),
            CreateTable(t) | DropTable(t) => (EntityKind::Table, t.key()),
            AlterTable { table, .. } => (EntityKind::Table, table.key()),
            CreateConstraint(c) | DropConstraint(c) => (EntityKind::Constraint, c.key()),
            CreateIndex(i) | DropIndex(i) => (EntityKind::Index, i.key()),
            CreateFunction(f) | DropFunction(f) => (EntityKind::Function, f.key()),
            ReplaceFunction { new, .. } => (EntityKind::Function, new.key()),
            CreateProcedure(p) | DropProcedure(p) => (EntityKind::Procedure, p.key()),
            ReplaceProcedure { new, .. } => (EntityKind::Procedure, new.key()),
            CreateView(v) | DropView(v) => (EntityKind::View, v.key()),
            CreateMaterializedView(v) | DropMaterializedView(v) => {
                (EntityKind::MaterializedView, v.key())
            }
            CreateTrigger(t) | DropTrigger(t) => (EntityKind::Trigger, t.key()),
            EnableRls { schema, table } | DisableRls { schema, table } => (
                EntityKind::Table,
                EntityKey::composite2(schema.clone(), table.clone()),
            ),
            CreatePolicy(p) | DropPolicy(p) => (EntityKind::Policy, p.key()),
            AlterPolicy { new, .. } => (EntityKind::Policy, new.key()),
            CreatePrivilege(p) | DropPrivilege(p) => (EntityKind::Privilege, p.key()),
        }
    }
}

/// `Diff(current, desired) -> [Operation]`. Both IRs must already be
/// normalized against the same `currentSchema`.
pub fn diff(current: &Ir, desired: &Ir) -> Result<Vec<Operation>, DiffError> {
    let mut creates = Vec::new();
    let mut drops = Vec::new();
    let mut alters = Vec::new();

    let mut schema_names: std::collections::BTreeSet<&String> = std::collections::BTreeSet::new();
    schema_names.extend(current.schemas.keys());
    schema_names.extend(desired.schemas.keys());

    let empty = Schema::new("");
    for name in schema_names {
        let cur = current.schema(name).unwrap_or(&empty);
        let des = desired.schema(name).unwrap_or(&empty);

        if current.schema(name).is_none() && desired.schema(name).is_some() {
            creates.push(Operation::CreateSchema(SchemaDef { name: name.clone() }));
        }
        if current.schema(name).is_some() && desired.schema(name).is_none() {
            drops.push(Operation::DropSchema(SchemaDef { name: name.clone() }));
        }

        diff_types(cur, des, &mut creates, &mut drops, &mut alters);
        diff_domains(cur, des, &mut creates, &mut drops, &mut alters);
        diff_sequences(cur, des, &mut creates, &mut drops, &mut alters);
        diff_tables(cur, des, &mut creates, &mut drops, &mut alters);
        diff_constraints(cur, des, &mut creates, &mut drops);
        diff_indexes(cur, des, &mut creates, &mut drops);
        diff_functions(cur, des, &mut creates, &mut drops, &mut alters);
        diff_procedures(cur, des, &mut creates, &mut drops, &mut alters);
        diff_views(cur, des, &mut creates, &mut drops);
        diff_materialized_views(cur, des, &mut creates, &mut drops);
        diff_triggers(cur, des, &mut creates, &mut drops);
        diff_policies(cur, des, &mut creates, &mut drops, &mut alters);
        diff_privileges(cur, des, &mut creates, &mut drops);
        diff_rls(cur, des, &mut creates, &mut drops);
    }

    let ordered_creates = order_creates(&creates, desired)?;
    let ordered_drops = order_drops(&drops, current)?;

    let mut out = Vec::with_capacity(ordered_drops.len() + alters.len() + ordered_creates.len());
    out.extend(ordered_drops);
    out.extend(alters);
    out.extend(ordered_creates);
    Ok(out)
}

fn diff_types(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.types, &des.types) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateType(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropType(d.left.unwrap())),
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();
                match (&old.kind, &new.kind) {
                    (TypeKind::Enum { labels: old_labels }, TypeKind::Enum { labels: new_labels }) => {
                        // Label removal forces drop+create; pure additions
                        // are in-place `ALTER TYPE ... ADD VALUE`.
                        let removed = old_labels.iter().any(|l| !new_labels.contains(l));
                        if removed {
                            drops.push(Operation::DropType(old.clone()));
                            creates.push(Operation::CreateType(new));
                        } else {
                            let mut after = None;
                            for (i, label) in new_labels.iter().enumerate() {
                                if !old_labels.contains(label) {
                                    after = if i == 0 {
                                        None
                                    } else {
                                        Some(new_labels[i - 1].clone())
                                    };
                                    alters.push(Operation::AlterTypeAddValue {
                                        old: old.clone(),
                                        new: new.clone(),
                                        label: label.clone(),
                                        after: after.clone(),
                                    });
                                }
                            }
                        }
                    }
                    _ => {
                        // Composite/range changes, or a kind change: not
                        // in-place alterable.
                        drops.push(Operation::DropType(old));
                        creates.push(Operation::CreateType(new));
                    }
                }
            }
        }
    }
}

fn diff_domains(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.domains, &des.domains) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateDomain(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropDomain(d.left.unwrap())),
            DiffType::Alter => alters.push(Operation::AlterDomain {
                old: d.left.unwrap(),
                new: d.right.unwrap(),
            }),
        }
    }
}

fn diff_sequences(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.sequences, &des.sequences) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateSequence(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropSequence(d.left.unwrap())),
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();
                if old.owned_by != new.owned_by {
                    alters.push(Operation::AlterSequenceOwnedBy(new.clone()));
                }
                if old.start != new.start
                    || old.increment != new.increment
                    || old.min_value != new.min_value
                    || old.max_value != new.max_value
                    || old.cache != new.cache
                    || old.cycle != new.cycle
                    || old.data_type != new.data_type
                {
                    alters.push(Operation::AlterSequence { old, new });
                }
            }
        }
    }
}

fn diff_tables(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.tables, &des.tables) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateTable(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropTable(d.left.unwrap())),
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();

                if old.kind != new.kind
                    || old.partition_key != new.partition_key
                    || old.partition_bound != new.partition_bound
                {
                    // Partition key changes force drop+create of the whole table.
                    drops.push(Operation::DropTable(old));
                    creates.push(Operation::CreateTable(new));
                    continue;
                }

                let column_changes = diff_columns(&old.columns, &new.columns);
                if !column_changes.is_empty() || old.comment != new.comment {
                    alters.push(Operation::AlterTable {
                        table: new,
                        column_changes,
                    });
                }
            }
        }
    }
}

fn diff_columns(old: &[Column], new: &[Column]) -> Vec<ColumnChange> {
    let old_map: BTreeMap<&str, &Column> = old.iter().map(|c| (c.name.as_str(), c)).collect();
    let new_map: BTreeMap<&str, &Column> = new.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changes = Vec::new();
    for c in old {
        if !new_map.contains_key(c.name.as_str()) {
            changes.push(ColumnChange::Drop(c.clone()));
        }
    }
    for c in new {
        if !old_map.contains_key(c.name.as_str()) {
            changes.push(ColumnChange::Add(c.clone()));
        }
    }
    for c in new {
        if let Some(old_col) = old_map.get(c.name.as_str()) {
            if *old_col != c {
                changes.push(ColumnChange::Alter {
                    old: (*old_col).clone(),
                    new: c.clone(),
                });
            }
        }
    }
    changes
}

fn diff_constraints(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.constraints, &des.constraints) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateConstraint(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropConstraint(d.left.unwrap())),
            // Constraints have no in-place ALTER in Postgres; a changed
            // constraint is a drop+create pair.
            DiffType::Alter => {
                drops.push(Operation::DropConstraint(d.left.unwrap()));
                creates.push(Operation::CreateConstraint(d.right.unwrap()));
            }
        }
    }
}

fn diff_indexes(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.indexes, &des.indexes) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateIndex(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropIndex(d.left.unwrap())),
            DiffType::Alter => {
                drops.push(Operation::DropIndex(d.left.unwrap()));
                creates.push(Operation::CreateIndex(d.right.unwrap()));
            }
        }
    }
}

fn diff_functions(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.functions, &des.functions) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateFunction(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropFunction(d.left.unwrap())),
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();
                // Signature (arguments) changes force drop+create; body,
                // volatility, security, language changes are
                // `CREATE OR REPLACE`.
                if old.arguments != new.arguments || old.return_type != new.return_type {
                    drops.push(Operation::DropFunction(old));
                    creates.push(Operation::CreateFunction(new));
                } else {
                    alters.push(Operation::ReplaceFunction { old, new });
                }
            }
        }
    }
}

fn diff_procedures(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.procedures, &des.procedures) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateProcedure(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropProcedure(d.left.unwrap())),
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();
                if old.arguments != new.arguments {
                    drops.push(Operation::DropProcedure(old));
                    creates.push(Operation::CreateProcedure(new));
                } else {
                    alters.push(Operation::ReplaceProcedure { old, new });
                }
            }
        }
    }
}

fn diff_views(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.views, &des.views) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateView(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropView(d.left.unwrap())),
            // View body changes always force DROP+CREATE, never
            // CREATE OR REPLACE.
            DiffType::Alter => {
                drops.push(Operation::DropView(d.left.unwrap()));
                creates.push(Operation::CreateView(d.right.unwrap()));
            }
        }
    }
}

fn diff_materialized_views(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.materialized_views, &des.materialized_views) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateMaterializedView(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropMaterializedView(d.left.unwrap())),
            DiffType::Alter => {
                drops.push(Operation::DropMaterializedView(d.left.unwrap()));
                creates.push(Operation::CreateMaterializedView(d.right.unwrap()));
            }
        }
    }
}

fn diff_triggers(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.triggers, &des.triggers) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreateTrigger(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropTrigger(d.left.unwrap())),
            DiffType::Alter => {
                drops.push(Operation::DropTrigger(d.left.unwrap()));
                creates.push(Operation::CreateTrigger(d.right.unwrap()));
            }
        }
    }
}

fn diff_policies(
    cur: &Schema,
    des: &Schema,
    creates: &mut Vec<Operation>,
    drops: &mut Vec<Operation>,
    alters: &mut Vec<Operation>,
) {
    for d in diff_collections(&cur.policies, &des.policies) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreatePolicy(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropPolicy(d.left.unwrap())),
            DiffType::Alter => alters.push(Operation::AlterPolicy {
                old: d.left.unwrap(),
                new: d.right.unwrap(),
            }),
        }
    }
}

fn diff_privileges(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.privileges, &des.privileges) {
        match d.diff_type {
            DiffType::Create => creates.push(Operation::CreatePrivilege(d.right.unwrap())),
            DiffType::Drop => drops.push(Operation::DropPrivilege(d.left.unwrap())),
            DiffType::Alter => {
                drops.push(Operation::DropPrivilege(d.left.unwrap()));
                creates.push(Operation::CreatePrivilege(d.right.unwrap()));
            }
        }
    }
}

fn diff_rls(cur: &Schema, des: &Schema, creates: &mut Vec<Operation>, drops: &mut Vec<Operation>) {
    for d in diff_collections(&cur.tables, &des.tables) {
        match d.diff_type {
            DiffType::Create => {
                let new = d.right.unwrap();
                if new.rls_enabled {
                    creates.push(Operation::EnableRls {
                        schema: new.schema,
                        table: new.name,
                    });
                }
            }
            DiffType::Alter => {
                let old = d.left.unwrap();
                let new = d.right.unwrap();
                if old.rls_enabled == new.rls_enabled {
                    continue;
                }
                if new.rls_enabled {
                    creates.push(Operation::EnableRls {
                        schema: new.schema,
                        table: new.name,
                    });
                } else {
                    drops.push(Operation::DisableRls {
                        schema: new.schema,
                        table: new.name,
                    });
                }
            }
            DiffType::Drop => {}
        }
    }
}

/// Build the dependency graph for creation ordering and emit a topological,
/// tie-broken order. Dropping reuses the same graph (see `order_drops`)
/// since the parent/child relation doesn't change direction — only
/// traversal direction does.
fn build_graph(ops: &[Operation], reference_ir: &Ir) -> DepGraph {
    let mut g = DepGraph::new();

    for op in ops {
        let (kind, key) = op.identity();
        let node = NodeId(kind, key);
        g.add_node(node.clone());

        match op {
            Operation::CreateTable(t) | Operation::DropTable(t) => {
                g.add_edge(node, NodeId(EntityKind::Schema, EntityKey::simple(&t.schema)));
                if let Some(parent) = &t.parent {
                    g.add_edge(
                        NodeId(EntityKind::Table, EntityKey::composite2(&t.schema, &t.name)),
                        NodeId(EntityKind::Table, EntityKey::composite2(&t.schema, parent)),
                    );
                }
            }
            Operation::CreateConstraint(c) | Operation::DropConstraint(c) => {
                g.add_edge(
                    node.clone(),
                    NodeId(EntityKind::Table, EntityKey::composite2(&c.schema, &c.table)),
                );
                if c.kind == ConstraintKind::ForeignKey {
                    if let Some(ref_table) = &c.ref_table {
                        let ref_schema = c.ref_schema.clone().unwrap_or_else(|| c.schema.clone());
                        g.add_edge(
                            node,
                            NodeId(EntityKind::Table, EntityKey::composite2(ref_schema, ref_table.clone())),
                        );
                    }
                }
            }
            Operation::CreateIndex(i) | Operation::DropIndex(i) => {
                g.add_edge(
                    node,
                    NodeId(EntityKind::Table, EntityKey::composite2(&i.schema, &i.table)),
                );
            }
            Operation::CreateTrigger(t) | Operation::DropTrigger(t) => {
                g.add_edge(
                    node.clone(),
                    NodeId(EntityKind::Table, EntityKey::composite2(&t.schema, &t.table)),
                );
                if let Some(func) = find_function(reference_ir, &t.schema, &t.function) {
                    g.add_edge(node, NodeId(EntityKind::Function, func.key()));
                }
            }
            Operation::CreatePolicy(p) | Operation::DropPolicy(p) => {
                g.add_edge(
                    node,
                    NodeId(EntityKind::Table, EntityKey::composite2(&p.schema, &p.table)),
                );
            }
            Operation::CreatePrivilege(p) | Operation::DropPrivilege(p) => {
                g.add_edge(
                    node,
                    NodeId(EntityKind::Table, EntityKey::composite2(&p.schema, &p.object_name)),
                );
            }
            Operation::CreateView(v) | Operation::DropView(v) => {
                for dep in &v.dependencies {
                    if let Some((depkind, depkey)) = resolve_dependency(reference_ir, &v.schema, &dep.0) {
                        g.add_edge(node.clone(), NodeId(depkind, depkey));
                    }
                }
            }
            Operation::CreateMaterializedView(v) | Operation::DropMaterializedView(v) => {
                for dep in &v.dependencies {
                    if let Some((depkind, depkey)) = resolve_dependency(reference_ir, &v.schema, &dep.0) {
                        g.add_edge(node.clone(), NodeId(depkind, depkey));
                    }
                }
            }
            _ => {}
        }
    }

    g
}

fn find_function<'a>(ir: &'a Ir, schema: &str, signature: &str) -> Option<&'a Function> {
    ir.schema(schema)?
        .functions
        .iter()
        .find(|f| f.signature() == signature)
}

/// Best-effort resolution of a computed view dependency (`schema.name`
/// format) to a node in the graph; tables are checked first, then views.
fn resolve_dependency(ir: &Ir, default_schema: &str, raw: &str) -> Option<(EntityKind, EntityKey)> {
    let (schema, name) = match raw.split_once('.') {
        Some((s, n)) => (s, n),
        None => (default_schema, raw),
    };
    let s = ir.schema(schema)?;
    if s.tables.contains(&EntityKey::composite2(schema, name)) {
        return Some((EntityKind::Table, EntityKey::composite2(schema, name)));
    }
    if s.views.contains(&EntityKey::composite2(schema, name)) {
        return Some((EntityKind::View, EntityKey::composite2(schema, name)));
    }
    None
}

fn order_creates(ops: &[Operation], desired: &Ir) -> Result<Vec<Operation>, DiffError> {
    order_by_graph(ops, desired, false)
}

fn order_drops(ops: &[Operation], current: &Ir) -> Result<Vec<Operation>, DiffError> {
    order_by_graph(ops, current, true)
}

fn order_by_graph(
    ops: &[Operation],
    reference_ir: &Ir,
    reverse: bool,
) -> Result<Vec<Operation>, DiffError> {
    if ops.is_empty() {
        return Ok(Vec::new());
    }

    let g = build_graph(ops, reference_ir);
    let by_identity: BTreeMap<(EntityKind, EntityKey), &Operation> =
        ops.iter().map(|op| (op.identity(), op)).collect();

    let tie_break = |n: &NodeId| {
        let op = by_identity.get(&(n.0, n.1.clone()));
        let ordinal = op.map(|o| o.kind_ordinal()).unwrap_or(255);
        (ordinal, n.1.display())
    };

    let sorted = g
        .topo_sort_creates(tie_break)
        .map_err(DiffError::CyclicDependency)?;

    let mut result: Vec<Operation> = sorted
        .into_iter()
        .filter_map(|n| by_identity.get(&(n.0, n.1)).cloned().cloned())
        .collect();

    if reverse {
        result.reverse();
    }

    Ok(result)
}
