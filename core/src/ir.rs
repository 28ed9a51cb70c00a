//! The intermediate representation (IR): typed, canonical data structures
//! for every schema object, generalizing the prior flat `PostgresEntity`
//! tagged union (see DESIGN.md) to the full set of object kinds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::entity::{Entity, EntityKey, EntityKind};

/// Root IR value: a mapping from schema name to `Schema`.
#[derive(Debug, Clone, Default)]
pub struct Ir {
    pub schemas: BTreeMap<String, Schema>,
}

impl Ir {
    /// An empty IR, per C1's `NewIR()`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    pub fn schema_mut(&mut self, name: &str) -> &mut Schema {
        self.schemas
            .entry(name.to_string())
            .or_insert_with(|| Schema::new(name))
    }

    /// Structural equality after normalization. Callers are expected to
    /// normalize both sides first; this is a plain derive-backed compare.
    pub fn equal(&self, other: &Ir) -> bool {
        self.schemas == other.schemas
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tables.iter().eq(other.tables.iter())
            && self.views.iter().eq(other.views.iter())
            && self.materialized_views.iter().eq(other.materialized_views.iter())
            && self.functions.iter().eq(other.functions.iter())
            && self.procedures.iter().eq(other.procedures.iter())
            && self.sequences.iter().eq(other.sequences.iter())
            && self.types.iter().eq(other.types.iter())
            && self.domains.iter().eq(other.domains.iter())
            && self.indexes.iter().eq(other.indexes.iter())
            && self.constraints.iter().eq(other.constraints.iter())
            && self.triggers.iter().eq(other.triggers.iter())
            && self.policies.iter().eq(other.policies.iter())
            && self.privileges.iter().eq(other.privileges.iter())
    }
}

/// One schema's worth of objects. Columns stay nested inside `Table` as an
/// ordered list; everything else that scopes to a table (constraints,
/// indexes, triggers, policies) is a flat, identity-indexed collection so
/// the generic `diff_collections` machinery applies uniformly, following
/// `postgres::ddl`'s flat-entity model.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub tables: Collection<Table>,
    pub views: Collection<View>,
    pub materialized_views: Collection<MaterializedView>,
    pub functions: Collection<Function>,
    pub procedures: Collection<Procedure>,
    pub sequences: Collection<Sequence>,
    pub types: Collection<TypeDef>,
    pub domains: Collection<Domain>,
    pub indexes: Collection<Index>,
    pub constraints: Collection<Constraint>,
    pub triggers: Collection<Trigger>,
    pub policies: Collection<Policy>,
    pub privileges: Collection<Privilege>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Collection::new(),
            views: Collection::new(),
            materialized_views: Collection::new(),
            functions: Collection::new(),
            procedures: Collection::new(),
            sequences: Collection::new(),
            types: Collection::new(),
            domains: Collection::new(),
            indexes: Collection::new(),
            constraints: Collection::new(),
            triggers: Collection::new(),
            policies: Collection::new(),
            privileges: Collection::new(),
        }
    }
}

// ===========================================================================
// Table / Column
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableKind {
    Base,
    Partitioned,
    PartitionOf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
    /// Name of the partitioned parent, when `kind == PartitionOf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// `PARTITION BY ...` expression, when `kind == Partitioned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    /// `FOR VALUES ...` clause, when `kind == PartitionOf`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition_bound: Option<String>,
    pub columns: Vec<Column>,
    pub rls_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Entity for Table {
    const KIND: EntityKind = EntityKind::Table;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    None,
    Always,
    ByDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityOptions {
    pub kind: IdentityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<i64>,
    pub cycle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratedKind {
    Stored,
    Virtual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated {
    pub kind: GeneratedKind,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub position: u32,
    pub name: String,
    /// Canonical type spelling (see Glossary), e.g. `character varying(n)`.
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated: Option<Generated>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

// ===========================================================================
// Constraint
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
    Exclusion,
    NotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_schema: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_table: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ref_columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    /// CHECK clause text, or an exclusion predicate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

impl Entity for Constraint {
    const KIND: EntityKind = EntityKind::Constraint;

    fn key(&self) -> EntityKey {
        EntityKey::composite3(&self.schema, &self.table, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::composite2(&self.schema, &self.table))
    }
}

// ===========================================================================
// Index
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    /// Column name or expression.
    pub value: String,
    pub is_expression: bool,
    pub ascending: bool,
    pub nulls_first: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opclass: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub where_predicate: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub include: Vec<String>,
}

impl Entity for Index {
    const KIND: EntityKind = EntityKind::Index;

    fn key(&self) -> EntityKey {
        EntityKey::composite3(&self.schema, &self.table, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::composite2(&self.schema, &self.table))
    }
}

// ===========================================================================
// Sequence
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub schema: String,
    pub name: String,
    pub data_type: String,
    pub start: i64,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub cache: i64,
    pub cycle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<(String, String)>,
}

impl Entity for Sequence {
    const KIND: EntityKind = EntityKind::Sequence;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

// ===========================================================================
// Type / Domain
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeAttribute {
    pub name: String,
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Enum { labels: Vec<String> },
    Composite { attributes: Vec<CompositeAttribute> },
    Range { subtype: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    pub schema: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl Entity for TypeDef {
    const KIND: EntityKind = EntityKind::Type;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCheck {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub schema: String,
    pub name: String,
    pub base_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub checks: Vec<DomainCheck>,
}

impl Entity for Domain {
    const KIND: EntityKind = EntityKind::Domain;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

// ===========================================================================
// View / Materialized view
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub schema: String,
    pub name: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<EntityKeyWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Entity for View {
    const KIND: EntityKind = EntityKind::View;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedView {
    pub schema: String,
    pub name: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dependencies: Vec<EntityKeyWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Entity for MaterializedView {
    const KIND: EntityKind = EntityKind::MaterializedView;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

/// A serializable stand-in for `EntityKey` in a computed-dependencies field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKeyWire(pub String);

// ===========================================================================
// Function / Procedure
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArgMode {
    In,
    Out,
    Inout,
    Variadic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Argument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mode: ArgMode,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Security {
    Invoker,
    Definer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnType {
    Type(String),
    SetOf(String),
    Table(Vec<Argument>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub schema: String,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub return_type: ReturnType,
    pub language: String,
    pub volatility: Volatility,
    pub security: Security,
    pub parallel_safe: bool,
    pub body: String,
}

impl Function {
    /// Argument-signature-qualified identity: functions are disambiguated
    /// by their full argument signature.
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self
            .arguments
            .iter()
            .filter(|a| a.mode != ArgMode::Out)
            .map(|a| a.data_type.as_str())
            .collect();
        format!("{}({})", self.name, types.join(","))
    }
}

impl Entity for Function {
    const KIND: EntityKind = EntityKind::Function;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, self.signature())
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Procedure {
    pub schema: String,
    pub name: String,
    pub arguments: Vec<Argument>,
    pub language: String,
    pub security: Security,
    pub body: String,
}

impl Procedure {
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self
            .arguments
            .iter()
            .filter(|a| a.mode != ArgMode::Out)
            .map(|a| a.data_type.as_str())
            .collect();
        format!("{}({})", self.name, types.join(","))
    }
}

impl Entity for Procedure {
    const KIND: EntityKind = EntityKind::Procedure;

    fn key(&self) -> EntityKey {
        EntityKey::composite2(&self.schema, self.signature())
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::simple(&self.schema))
    }
}

// ===========================================================================
// Trigger / Policy / Privilege
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerTiming {
    Before,
    After,
    InsteadOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    Insert,
    Update,
    Delete,
    Truncate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub timing: TriggerTiming,
    pub events: Vec<TriggerEvent>,
    pub per_row: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when_condition: Option<String>,
    /// Schema-qualified signature of the function the trigger executes.
    pub function: String,
}

impl Entity for Trigger {
    const KIND: EntityKind = EntityKind::Trigger;

    fn key(&self) -> EntityKey {
        EntityKey::composite3(&self.schema, &self.table, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::composite2(&self.schema, &self.table))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyCommand {
    All,
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub command: PolicyCommand,
    pub permissive: bool,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub using_expr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_expr: Option<String>,
}

impl Entity for Policy {
    const KIND: EntityKind = EntityKind::Policy;

    fn key(&self) -> EntityKey {
        EntityKey::composite3(&self.schema, &self.table, &self.name)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::composite2(&self.schema, &self.table))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivilegeObjectKind {
    Table,
    Sequence,
    Function,
    Procedure,
    Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    pub schema: String,
    pub object_kind: PrivilegeObjectKind,
    pub object_name: String,
    pub grantee: String,
    pub privileges: Vec<String>,
    pub with_grant: bool,
}

impl Entity for Privilege {
    const KIND: EntityKind = EntityKind::Privilege;

    fn key(&self) -> EntityKey {
        EntityKey::composite3(&self.schema, &self.object_name, &self.grantee)
    }

    fn parent_key(&self) -> Option<EntityKey> {
        Some(EntityKey::composite2(&self.schema, &self.object_name))
    }
}

// ===========================================================================
// Schema-as-object (for CREATE/DROP SCHEMA diff operations)
// ===========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    pub name: String,
}

impl Entity for SchemaDef {
    const KIND: EntityKind = EntityKind::Schema;

    fn key(&self) -> EntityKey {
        EntityKey::simple(&self.name)
    }
}
