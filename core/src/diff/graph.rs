//! Dependency graph over operation identities.
//!
//! Edges are keyed by identity tuples in a separate arena, never by live
//! pointers into the IR (see DESIGN.md).
//! Nodes are `(EntityKind, EntityKey)` pairs rather than raw `EntityKey`
//! because two different kinds can otherwise share an identity (e.g. a
//! table and a same-named sequence).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::entity::{EntityKey, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub EntityKind, pub EntityKey);

/// Directed edges `node -> depends_on` (node must be created after, and
/// dropped before, everything it depends on).
#[derive(Debug, Default)]
pub struct DepGraph {
    depends_on: HashMap<NodeId, Vec<NodeId>>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: NodeId) {
        self.depends_on.entry(node).or_default();
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_node(to.clone());
        self.depends_on.entry(from).or_default().push(to);
    }

    /// Topological order, ancestors (dependencies) first. Ties within a
    /// level broken by the caller-supplied ordering key. Returns the cycle
    /// members (as display strings) if the graph is not a DAG.
    pub fn topo_sort_creates<F, K>(&self, tie_break: F) -> Result<Vec<NodeId>, Vec<String>>
    where
        F: Fn(&NodeId) -> K,
        K: Ord,
    {
        let mut indegree: HashMap<NodeId, usize> = HashMap::new();
        let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

        for node in self.depends_on.keys() {
            indegree.entry(node.clone()).or_insert(0);
        }

        for (node, deps) in &self.depends_on {
            for dep in deps {
                *indegree.entry(node.clone()).or_insert(0) += 1;
                dependents.entry(dep.clone()).or_default().push(node.clone());
            }
        }

        let mut ready: Vec<NodeId> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(n, _)| n.clone())
            .collect();
        ready.sort_by_key(&tie_break);
        let mut queue: VecDeque<NodeId> = ready.into();

        let mut order = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node.clone()) {
                continue;
            }
            order.push(node.clone());

            let mut newly_ready = Vec::new();
            if let Some(deps) = dependents.get(&node) {
                for dependent in deps {
                    if let Some(deg) = indegree.get_mut(dependent) {
                        *deg -= 1;
                        if *deg == 0 {
                            newly_ready.push(dependent.clone());
                        }
                    }
                }
            }
            newly_ready.sort_by_key(&tie_break);

            // Re-merge into the queue, keeping overall deterministic order:
            // drain the queue, merge, and re-sort the ready prefix. Cheap
            // enough at the sizes this engine deals with (hundreds, not
            // millions, of objects per schema).
            let mut rest: Vec<NodeId> = queue.into_iter().collect();
            rest.extend(newly_ready);
            rest.sort_by_key(&tie_break);
            queue = rest.into();
        }

        if order.len() != indegree.len() {
            let remaining: Vec<String> = indegree
                .keys()
                .filter(|n| !visited.contains(n))
                .map(|n| n.1.display())
                .collect();
            return Err(remaining);
        }

        Ok(order)
    }
}
