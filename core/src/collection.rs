//! Generic entity collection used by every per-kind map inside a `Schema`.

use std::collections::BTreeMap;

use crate::entity::{DiffType, Entity, EntityKey};

/// Ordered, identity-indexed collection for any entity kind.
///
/// Backed by a `BTreeMap` rather than a `Vec` + index so that iteration is
/// always in identity order: IR output order is deterministic.
#[derive(Debug, Clone)]
pub struct Collection<E: Entity> {
    entities: BTreeMap<EntityKey, E>,
}

impl<E: Entity> Default for Collection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Collection<E> {
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
        }
    }

    /// Insert an entity, returns true if inserted, false if the key was
    /// already present (no two objects may share an identity tuple).
    pub fn push(&mut self, entity: E) -> bool {
        let key = entity.key();
        if self.entities.contains_key(&key) {
            return false;
        }
        self.entities.insert(key, entity);
        true
    }

    pub fn get(&self, key: &EntityKey) -> Option<&E> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    pub fn delete(&mut self, key: &EntityKey) -> Option<E> {
        self.entities.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Iterate in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entities.values()
    }

    pub fn into_vec(self) -> Vec<E> {
        self.entities.into_values().collect()
    }

    pub fn filter<P>(&self, predicate: P) -> Vec<&E>
    where
        P: Fn(&E) -> bool,
    {
        self.entities.values().filter(|e| predicate(e)).collect()
    }

    pub fn retain<P>(&mut self, predicate: P)
    where
        P: Fn(&E) -> bool,
    {
        self.entities.retain(|_, e| predicate(e));
    }
}

impl<E: Entity> FromIterator<E> for Collection<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut col = Collection::new();
        for e in iter {
            col.push(e);
        }
        col
    }
}

/// A single diff entry for one entity of kind `E`.
#[derive(Debug, Clone)]
pub struct EntityDiff<E: Entity> {
    pub diff_type: DiffType,
    pub key: EntityKey,
    /// Present for Drop/Alter.
    pub left: Option<E>,
    /// Present for Create/Alter.
    pub right: Option<E>,
}

impl<E: Entity> EntityDiff<E> {
    pub fn kind(&self) -> crate::entity::EntityKind {
        E::KIND
    }
}

/// Compute the identity-based three-way split between two collections of
/// the same entity kind: dropped (left only), created (right only), altered
/// (present in both but structurally different).
pub fn diff_collections<E: Entity>(
    left: &Collection<E>,
    right: &Collection<E>,
) -> Vec<EntityDiff<E>> {
    let mut diffs = Vec::new();

    for entity in left.iter() {
        let key = entity.key();
        if !right.contains(&key) {
            diffs.push(EntityDiff {
                diff_type: DiffType::Drop,
                key,
                left: Some(entity.clone()),
                right: None,
            });
        }
    }

    for entity in right.iter() {
        let key = entity.key();
        if !left.contains(&key) {
            diffs.push(EntityDiff {
                diff_type: DiffType::Create,
                key,
                left: None,
                right: Some(entity.clone()),
            });
        }
    }

    for left_entity in left.iter() {
        let key = left_entity.key();
        if let Some(right_entity) = right.get(&key) {
            if left_entity != right_entity {
                diffs.push(EntityDiff {
                    diff_type: DiffType::Alter,
                    key,
                    left: Some(left_entity.clone()),
                    right: Some(right_entity.clone()),
                });
            }
        }
    }

    diffs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    #[derive(Clone, Debug, PartialEq)]
    struct TestEntity {
        name: String,
        value: i32,
    }

    impl Entity for TestEntity {
        const KIND: EntityKind = EntityKind::Table;

        fn key(&self) -> EntityKey {
            EntityKey::simple(&self.name)
        }
    }

    #[test]
    fn push_rejects_duplicate_key() {
        let mut col: Collection<TestEntity> = Collection::new();
        assert!(col.push(TestEntity {
            name: "foo".into(),
            value: 1
        }));
        assert!(!col.push(TestEntity {
            name: "foo".into(),
            value: 2
        }));
        assert_eq!(col.get(&EntityKey::simple("foo")).unwrap().value, 1);
    }

    #[test]
    fn delete_removes_entity() {
        let mut col: Collection<TestEntity> = Collection::new();
        col.push(TestEntity {
            name: "a".into(),
            value: 1,
        });
        col.push(TestEntity {
            name: "b".into(),
            value: 2,
        });
        let removed = col.delete(&EntityKey::simple("a"));
        assert_eq!(removed.unwrap().value, 1);
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn iteration_is_identity_ordered() {
        let mut col: Collection<TestEntity> = Collection::new();
        col.push(TestEntity {
            name: "zebra".into(),
            value: 1,
        });
        col.push(TestEntity {
            name: "apple".into(),
            value: 2,
        });
        let names: Vec<_> = col.iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["apple".to_string(), "zebra".to_string()]);
    }

    #[test]
    fn diff_collections_splits_create_drop_alter() {
        let mut left: Collection<TestEntity> = Collection::new();
        left.push(TestEntity {
            name: "keep".into(),
            value: 1,
        });
        left.push(TestEntity {
            name: "drop".into(),
            value: 2,
        });
        left.push(TestEntity {
            name: "alter".into(),
            value: 3,
        });

        let mut right: Collection<TestEntity> = Collection::new();
        right.push(TestEntity {
            name: "keep".into(),
            value: 1,
        });
        right.push(TestEntity {
            name: "create".into(),
            value: 4,
        });
        right.push(TestEntity {
            name: "alter".into(),
            value: 99,
        });

        let diffs = diff_collections(&left, &right);
        assert_eq!(diffs.len(), 3);
        assert!(
            diffs
                .iter()
                .any(|d| d.diff_type == DiffType::Drop && d.left.as_ref().unwrap().name == "drop")
        );
        assert!(
            diffs
                .iter()
                .any(|d| d.diff_type == DiffType::Create
                    && d.right.as_ref().unwrap().name == "create")
        );
        assert!(diffs.iter().any(|d| d.diff_type == DiffType::Alter
            && d.left.as_ref().unwrap().value == 3
            && d.right.as_ref().unwrap().value == 99));
    }
}
