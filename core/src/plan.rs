//! C8 Plan: an ordered, serializable bundle of operations plus the metadata
//! needed to detect drift and to render the plan in any of its three forms:
//! `plan.sql`, `plan.txt`, `plan.json`.

use serde::{Deserialize, Serialize};

use crate::diff::Operation;
use crate::entity::DiffType;
use crate::sqlgen::{render_operation, RenderOptions};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub schema: String,
}

/// A computed set of changes, ready to render or apply.
///
/// `created_at` and `pgschema_version` are metadata, not content: two plans
/// computed from identical inputs one second apart are semantically equal
/// even though these two fields differ, which is why `Plan::content_equal`
/// exists alongside `PartialEq`-by-derive equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub pgschema_version: String,
    pub created_at: String,
    pub source_fingerprint: String,
    pub target: PlanTarget,
    #[serde(skip)]
    pub operations: Vec<Operation>,
    pub diff: Vec<PlanEntry>,
}

/// A transportable, human- and machine-readable description of one
/// operation. `Plan::operations` carries the live typed form used by the
/// applier; `diff` is its serialization, kept in lockstep by
/// `Plan::new`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanEntry {
    pub change: String,
    pub kind: String,
    pub identity: String,
    pub sql: String,
}

impl Plan {
    pub fn new(
        operations: Vec<Operation>,
        source_fingerprint: String,
        target: PlanTarget,
        created_at: String,
    ) -> Self {
        let opts = RenderOptions {
            current_schema: target.schema.clone(),
            ..RenderOptions::default()
        };
        let diff = operations
            .iter()
            .map(|op| {
                let (kind, key) = op.identity();
                PlanEntry {
                    change: diff_type_str(op.diff_type()).to_string(),
                    kind: kind.to_string(),
                    identity: key.to_string(),
                    sql: render_operation(op, &opts),
                }
            })
            .collect();

        Self {
            pgschema_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at,
            source_fingerprint,
            target,
            operations,
            diff,
        }
    }

    /// Uses `diff`, not `operations`: `operations` doesn't survive a
    /// JSON round-trip (`#[serde(skip)]`), but a plan loaded via
    /// `from_json` must still report its true emptiness.
    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    /// Equality that ignores `created_at` and `pgschema_version`, both
    /// excluded from plan-comparison.
    pub fn content_equal(&self, other: &Plan) -> bool {
        self.source_fingerprint == other.source_fingerprint
            && self.target.host == other.target.host
            && self.target.port == other.target.port
            && self.target.database == other.target.database
            && self.target.schema == other.target.schema
            && self.diff == other.diff
    }

    /// `plan.sql`: the statements in apply order, no decoration. Rendered
    /// from `diff`, not `operations`, so a plan reloaded from JSON (where
    /// `operations` comes back empty) still renders correctly.
    pub fn render_sql(&self) -> String {
        self.diff
            .iter()
            .map(|entry| entry.sql.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `plan.txt`: one `+`/`~`/`-` annotated line per operation, grouped by
    /// change kind in the order they will run.
    pub fn render_human(&self) -> String {
        let mut out = String::new();
        if self.is_empty() {
            out.push_str("No changes.\n");
            return out;
        }
        for entry in &self.diff {
            let marker = match entry.change.as_str() {
                "create" => "+",
                "drop" => "-",
                _ => "~",
            };
            out.push_str(&format!("{marker} {} {}\n", entry.kind, entry.identity));
        }
        out
    }

    /// `plan.json`: the full structured form, as read back by `apply`.
    pub fn render_json(&self) -> Result<String, crate::error::IoError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, crate::error::IoError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn diff_type_str(t: DiffType) -> &'static str {
    match t {
        DiffType::Create => "create",
        DiffType::Alter => "alter",
        DiffType::Drop => "drop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> PlanTarget {
        PlanTarget {
            host: "localhost".into(),
            port: 5432,
            database: "app".into(),
            schema: "public".into(),
        }
    }

    #[test]
    fn empty_plan_renders_no_changes() {
        let plan = Plan::new(vec![], "abc123".into(), target(), "2026-01-01T00:00:00Z".into());
        assert!(plan.is_empty());
        assert_eq!(plan.render_human(), "No changes.\n");
    }

    #[test]
    fn content_equal_ignores_timestamp_and_version() {
        let a = Plan::new(vec![], "fp".into(), target(), "2026-01-01T00:00:00Z".into());
        let mut b = Plan::new(vec![], "fp".into(), target(), "2026-06-06T12:00:00Z".into());
        b.pgschema_version = "9.9.9".into();
        assert!(a.content_equal(&b));
    }

    #[test]
    fn content_equal_detects_fingerprint_drift() {
        let a = Plan::new(vec![], "fp-old".into(), target(), "2026-01-01T00:00:00Z".into());
        let b = Plan::new(vec![], "fp-new".into(), target(), "2026-01-01T00:00:00Z".into());
        assert!(!a.content_equal(&b));
    }

    #[test]
    fn json_round_trips_diff_entries() {
        let plan = Plan::new(vec![], "fp".into(), target(), "2026-01-01T00:00:00Z".into());
        let json = plan.render_json().unwrap();
        let back = Plan::from_json(&json).unwrap();
        assert_eq!(back.source_fingerprint, plan.source_fingerprint);
        assert!(back.operations.is_empty());
    }

    /// `operations` is `#[serde(skip)]`'d, so a plan loaded with
    /// `from_json` (the `apply --plan <path>` path) must still see its
    /// real, non-empty set of changes and be able to render them — both
    /// `is_empty` and `render_sql` must read `diff`, not `operations`.
    #[test]
    fn json_round_trip_preserves_emptiness_and_sql_despite_skipped_operations() {
        let ops = vec![Operation::CreateSchema(crate::ir::SchemaDef {
            name: "app".into(),
        })];
        let plan = Plan::new(ops, "fp".into(), target(), "2026-01-01T00:00:00Z".into());
        assert!(!plan.is_empty());

        let json = plan.render_json().unwrap();
        let back = Plan::from_json(&json).unwrap();

        assert!(back.operations.is_empty(), "operations is skip-serialized");
        assert!(!back.is_empty(), "diff entries must still report real content");
        assert!(back.render_sql().contains("CREATE SCHEMA"));
        assert!(plan.content_equal(&back));
    }
}
