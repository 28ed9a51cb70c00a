//! C5 Ignore Filter: removes objects from an IR that match configured
//! glob patterns, loaded from `.pgschemaignore` (a TOML document with a
//! `[category]` header and a `patterns = [...]` array per category).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::IoError;
use crate::ir::{Ir, PrivilegeObjectKind};

/// One category's pattern list. A leading `!` marks a negation, which wins
/// over any positive match regardless of pattern order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternList {
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub tables: PatternList,
    #[serde(default)]
    pub views: PatternList,
    #[serde(default)]
    pub functions: PatternList,
    #[serde(default)]
    pub procedures: PatternList,
    #[serde(default)]
    pub types: PatternList,
    #[serde(default)]
    pub sequences: PatternList,
}

impl IgnoreConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(text: &str) -> Result<Self, IoError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, IoError> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let text = std::fs::read_to_string(path).map_err(|e| IoError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&text)
    }

    fn is_ignored(&self, category: &PatternList, name: &str) -> bool {
        let mut positives = Vec::new();
        let mut negatives = Vec::new();
        for pattern in &category.patterns {
            if let Some(negated) = pattern.strip_prefix('!') {
                negatives.push(negated);
            } else {
                positives.push(pattern.as_str());
            }
        }
        if negatives.iter().any(|p| glob_match(p, name)) {
            return false;
        }
        positives.iter().any(|p| glob_match(p, name))
    }

    pub fn ignores_table(&self, name: &str) -> bool {
        self.is_ignored(&self.tables, name)
    }
    pub fn ignores_view(&self, name: &str) -> bool {
        self.is_ignored(&self.views, name)
    }
    pub fn ignores_function(&self, name: &str) -> bool {
        self.is_ignored(&self.functions, name)
    }
    pub fn ignores_procedure(&self, name: &str) -> bool {
        self.is_ignored(&self.procedures, name)
    }
    pub fn ignores_type(&self, name: &str) -> bool {
        self.is_ignored(&self.types, name)
    }
    pub fn ignores_sequence(&self, name: &str) -> bool {
        self.is_ignored(&self.sequences, name)
    }
}

/// `Filter(ir, cfg) -> ir'`. Triggers, indexes, constraints, policies and
/// privileges are not directly filterable; they follow their parent
/// table's fate, except that a trigger whose function still exists in the
/// managed IR survives even when its table is ignored (managing a trigger
/// on an externally-owned table).
pub fn filter(mut ir: Ir, cfg: &IgnoreConfig) -> Ir {
    for schema in ir.schemas.values_mut() {
        let ignored_tables: std::collections::BTreeSet<String> = schema
            .tables
            .iter()
            .filter(|t| cfg.ignores_table(&t.name))
            .map(|t| t.name.clone())
            .collect();

        let ignored_functions: std::collections::BTreeSet<String> = schema
            .functions
            .iter()
            .filter(|f| cfg.ignores_function(&f.name))
            .map(|f| f.name.clone())
            .collect();
        let ignored_procedures: std::collections::BTreeSet<String> = schema
            .procedures
            .iter()
            .filter(|p| cfg.ignores_procedure(&p.name))
            .map(|p| p.name.clone())
            .collect();
        let ignored_sequences: std::collections::BTreeSet<String> = schema
            .sequences
            .iter()
            .filter(|s| cfg.ignores_sequence(&s.name))
            .map(|s| s.name.clone())
            .collect();

        schema.tables.retain(|t| !ignored_tables.contains(&t.name));
        schema.views.retain(|v| !cfg.ignores_view(&v.name));
        schema
            .materialized_views
            .retain(|v| !cfg.ignores_view(&v.name));
        schema
            .functions
            .retain(|f| !ignored_functions.contains(&f.name));
        schema
            .procedures
            .retain(|p| !ignored_procedures.contains(&p.name));
        schema.types.retain(|t| !cfg.ignores_type(&t.name));
        schema.domains.retain(|d| !cfg.ignores_type(&d.name));
        schema
            .sequences
            .retain(|s| !ignored_sequences.contains(&s.name));

        // Constraints, indexes, and policies strictly follow their parent
        // table.
        schema
            .constraints
            .retain(|c| !ignored_tables.contains(&c.table));
        schema
            .indexes
            .retain(|i| !ignored_tables.contains(&i.table));
        schema
            .policies
            .retain(|p| !ignored_tables.contains(&p.table));

        // Privileges are not directly filterable either; they follow
        // whichever object category they're granted on.
        schema.privileges.retain(|p| match p.object_kind {
            PrivilegeObjectKind::Table => !ignored_tables.contains(&p.object_name),
            PrivilegeObjectKind::Function => !ignored_functions.contains(&p.object_name),
            PrivilegeObjectKind::Procedure => !ignored_procedures.contains(&p.object_name),
            PrivilegeObjectKind::Sequence => !ignored_sequences.contains(&p.object_name),
            PrivilegeObjectKind::Schema => true,
        });

        let existing_functions: std::collections::BTreeSet<String> = schema
            .functions
            .iter()
            .map(|f| f.signature())
            .collect();
        schema.triggers.retain(|t| {
            !ignored_tables.contains(&t.table) || existing_functions.contains(&t.function)
        });
    }
    ir
}

/// Hand-rolled glob matcher over plain strings (`*`, `?`, `[...]`), not a
/// filesystem matcher — the `glob` crate in this workspace matches paths,
/// which is the wrong shape for object-name patterns.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    match_from(&p, &n)
}

fn match_from(p: &[char], n: &[char]) -> bool {
    match (p.first(), n.first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some('*'), _) => {
            // `*` matches a run of one or more characters; empty-matching
            // is disallowed, so try consuming at least one char from `n`.
            for split in 1..=n.len() {
                if match_from(&p[1..], &n[split..]) {
                    return true;
                }
            }
            false
        }
        (Some('?'), Some(_)) => match_from(&p[1..], &n[1..]),
        (Some('['), _) => match_class(p, n),
        (Some(pc), Some(nc)) if pc == nc => match_from(&p[1..], &n[1..]),
        _ => false,
    }
}

fn match_class(p: &[char], n: &[char]) -> bool {
    let Some(close) = p.iter().position(|&c| c == ']') else {
        return false;
    };
    let Some(&nc) = n.first() else {
        return false;
    };
    let class = &p[1..close];
    if class.contains(&nc) {
        match_from(&p[close + 1..], &n[1..])
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_ignore_grammar() {
        let text = r#"
[tables]
patterns = ["temp_*", "!temp_keep"]
"#;
        let cfg = IgnoreConfig::parse(text).unwrap();
        assert!(cfg.ignores_table("temp_external_users"));
        assert!(!cfg.ignores_table("temp_keep"));
        assert!(!cfg.ignores_table("users"));
    }

    #[test]
    fn glob_star_requires_at_least_one_char() {
        assert!(glob_match("temp_*", "temp_x"));
        assert!(!glob_match("temp_*", "temp_"));
    }

    #[test]
    fn glob_question_mark_matches_single_char() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
    }

    #[test]
    fn negation_overrides_positive_match() {
        let cfg = IgnoreConfig::parse(
            r#"
[views]
patterns = ["*", "!keep_view"]
"#,
        )
        .unwrap();
        assert!(cfg.ignores_view("anything"));
        assert!(!cfg.ignores_view("keep_view"));
    }

    #[test]
    fn privileges_follow_their_object_table() {
        use crate::ir::{Ir, Privilege, PrivilegeObjectKind, Table, TableKind};

        let mut ir = Ir::new();
        let schema = ir.schema_mut("public");
        schema.tables.push(Table {
            schema: "public".into(),
            name: "temp_external_users".into(),
            kind: TableKind::Base,
            parent: None,
            partition_key: None,
            partition_bound: None,
            columns: vec![],
            rls_enabled: false,
            comment: None,
        });
        schema.tables.push(Table {
            schema: "public".into(),
            name: "users".into(),
            kind: TableKind::Base,
            parent: None,
            partition_key: None,
            partition_bound: None,
            columns: vec![],
            rls_enabled: false,
            comment: None,
        });
        schema.privileges.push(Privilege {
            schema: "public".into(),
            object_kind: PrivilegeObjectKind::Table,
            object_name: "temp_external_users".into(),
            grantee: "app".into(),
            privileges: vec!["SELECT".into()],
            with_grant: false,
        });
        schema.privileges.push(Privilege {
            schema: "public".into(),
            object_kind: PrivilegeObjectKind::Table,
            object_name: "users".into(),
            grantee: "app".into(),
            privileges: vec!["SELECT".into()],
            with_grant: false,
        });

        let cfg = IgnoreConfig::parse("[tables]\npatterns = [\"temp_*\"]\n").unwrap();
        let filtered = filter(ir, &cfg);
        let schema = filtered.schema("public").unwrap();
        assert_eq!(schema.privileges.len(), 1);
        assert_eq!(schema.privileges.iter().next().unwrap().object_name, "users");
    }
}
