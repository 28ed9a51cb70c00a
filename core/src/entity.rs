//! Entity identity model shared by every IR object kind.
//!
//! Generalizes the tagged-union-of-kinds pattern: a small `Kind`
//! discriminator plus identity/dependency/diff-type operations, rather than
//! an inheritance tree (see Design Notes in SPEC_FULL.md).

use std::fmt;
use std::str::FromStr;

/// Every object kind the IR can hold. Order here is the "declaration order"
/// used for lexicographic display only; the diff engine's creation/drop
/// ordinal is defined separately in `diff::KIND_ORDINAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Schema,
    Type,
    Domain,
    Sequence,
    Table,
    Column,
    Constraint,
    Index,
    Function,
    Procedure,
    View,
    MaterializedView,
    Trigger,
    Policy,
    Privilege,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Schema => "schema",
            EntityKind::Type => "type",
            EntityKind::Domain => "domain",
            EntityKind::Sequence => "sequence",
            EntityKind::Table => "table",
            EntityKind::Column => "column",
            EntityKind::Constraint => "constraint",
            EntityKind::Index => "index",
            EntityKind::Function => "function",
            EntityKind::Procedure => "procedure",
            EntityKind::View => "view",
            EntityKind::MaterializedView => "materialized_view",
            EntityKind::Trigger => "trigger",
            EntityKind::Policy => "policy",
            EntityKind::Privilege => "privilege",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "schema" => EntityKind::Schema,
            "type" => EntityKind::Type,
            "domain" => EntityKind::Domain,
            "sequence" => EntityKind::Sequence,
            "table" => EntityKind::Table,
            "column" => EntityKind::Column,
            "constraint" => EntityKind::Constraint,
            "index" => EntityKind::Index,
            "function" => EntityKind::Function,
            "procedure" => EntityKind::Procedure,
            "view" => EntityKind::View,
            "materialized_view" => EntityKind::MaterializedView,
            "trigger" => EntityKind::Trigger,
            "policy" => EntityKind::Policy,
            "privilege" => EntityKind::Privilege,
            other => return Err(format!("unknown entity kind: {other}")),
        })
    }
}

/// Identity tuple for an IR object. Variants cover the shapes schema
/// objects need: a bare name (schema, standalone sequence), a
/// (parent, name) pair (table within schema, column within table), and a
/// (parent, child, name) triple (constraint/index/trigger/policy scoped to a
/// table, argument-signature-qualified function).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Simple(String),
    Composite2(String, String),
    Composite3(String, String, String),
}

impl EntityKey {
    pub fn simple(name: impl Into<String>) -> Self {
        EntityKey::Simple(name.into())
    }

    pub fn composite2(a: impl Into<String>, b: impl Into<String>) -> Self {
        EntityKey::Composite2(a.into(), b.into())
    }

    pub fn composite3(a: impl Into<String>, b: impl Into<String>, c: impl Into<String>) -> Self {
        EntityKey::Composite3(a.into(), b.into(), c.into())
    }

    /// Render the identity as the dotted form used in dump comment blocks
    /// (`-- Name: <identity>; ...`).
    pub fn display(&self) -> String {
        match self {
            EntityKey::Simple(a) => a.clone(),
            EntityKey::Composite2(a, b) => format!("{a}.{b}"),
            EntityKey::Composite3(a, b, c) => format!("{a}.{b}.{c}"),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A single IR object kind. `KIND` is the static discriminator; `key()`
/// gives the identity tuple used for diffing and lookups; `parent_key()`
/// gives the identity of the owning object (a table, for a column or
/// constraint) when the kind is ignore-filterable by inheritance: such
/// kinds follow their parent table's fate.
pub trait Entity: Clone + PartialEq {
    const KIND: EntityKind;

    fn key(&self) -> EntityKey;

    fn parent_key(&self) -> Option<EntityKey> {
        None
    }
}

/// The kind of change a single diff entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffType {
    Create,
    Alter,
    Drop,
}
