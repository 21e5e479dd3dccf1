//! Self-referential trees: the supervisor forest, department tree and chart
//! of accounts.
//!
//! Nodes live in a flat map keyed by id with an optional parent id. Every
//! reassignment is checked for cycles before it is stored, and every walk
//! stops on a repeated node so that bad stored data cannot loop forever.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use wayfare_shared::AppError;

/// Errors from parent reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// A node cannot be its own parent.
    #[error("A {kind} cannot be its own parent")]
    SelfReference {
        /// Node kind, e.g. "supervisor".
        kind: &'static str,
    },

    /// The new parent is a descendant of the node.
    #[error("Circular {kind} relationship")]
    Cycle {
        /// Node kind.
        kind: &'static str,
    },

    /// The new parent does not exist or is inactive.
    #[error("{kind} {id} not found")]
    ParentNotFound {
        /// Node kind.
        kind: &'static str,
        /// Missing id.
        id: Uuid,
    },

    /// Active records still hang below this node.
    #[error("Cannot delete {kind}: {count} active {dependents} still assigned")]
    HasDependents {
        /// Node kind.
        kind: &'static str,
        /// What depends on it, e.g. "direct reports".
        dependents: &'static str,
        /// How many.
        count: u64,
    },
}

impl From<HierarchyError> for AppError {
    fn from(e: HierarchyError) -> Self {
        match e {
            HierarchyError::ParentNotFound { .. } => Self::NotFound(e.to_string()),
            HierarchyError::SelfReference { .. }
            | HierarchyError::Cycle { .. }
            | HierarchyError::HasDependents { .. } => {
                Self::BadRequest(e.to_string())
            }
        }
    }
}

/// Arena of nodes keyed by id, each with an optional parent.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    parents: HashMap<Uuid, Option<Uuid>>,
}

impl Forest {
    /// Creates an empty forest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a node.
    pub fn insert(&mut self, id: Uuid, parent: Option<Uuid>) {
        self.parents.insert(id, parent);
    }

    /// True if the node is present.
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.parents.contains_key(&id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// True if the forest is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Stored parent of a node.
    #[must_use]
    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.parents.get(&id).copied().flatten()
    }

    /// Ancestors of `id`, nearest first, not including `id` itself.
    ///
    /// The walk ends at a root, at a parent that is not in the forest, or on
    /// the first repeated node.
    #[must_use]
    pub fn ancestors(&self, id: Uuid) -> Vec<Uuid> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut current = id;

        while let Some(parent) = self.parent_of(current) {
            if !self.contains(parent) || !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// Direct children of `id`, in no particular order.
    #[must_use]
    pub fn children_of(&self, id: Uuid) -> Vec<Uuid> {
        self.parents
            .iter()
            .filter(|(_, parent)| **parent == Some(id))
            .map(|(child, _)| *child)
            .collect()
    }

    /// True if making `new_parent` the parent of `node` would close a loop.
    #[must_use]
    pub fn would_create_cycle(&self, node: Uuid, new_parent: Uuid) -> bool {
        node == new_parent || self.ancestors(new_parent).contains(&node)
    }

    /// Validates a parent reassignment.
    ///
    /// # Errors
    ///
    /// `SelfReference`, `ParentNotFound` when the parent is not in the
    /// forest, or `Cycle`.
    pub fn check_reassignment(
        &self,
        kind: &'static str,
        node: Uuid,
        new_parent: Option<Uuid>,
    ) -> Result<(), HierarchyError> {
        let Some(parent) = new_parent else {
            return Ok(());
        };
        if parent == node {
            return Err(HierarchyError::SelfReference { kind });
        }
        if !self.contains(parent) {
            return Err(HierarchyError::ParentNotFound { kind, id: parent });
        }
        if self.would_create_cycle(node, parent) {
            return Err(HierarchyError::Cycle { kind });
        }
        Ok(())
    }
}

impl FromIterator<(Uuid, Option<Uuid>)> for Forest {
    fn from_iter<I: IntoIterator<Item = (Uuid, Option<Uuid>)>>(iter: I) -> Self {
        Self {
            parents: iter.into_iter().collect(),
        }
    }
}

/// Checks that nothing active depends on a node before it is removed.
pub fn ensure_no_dependents(
    kind: &'static str,
    dependents: &'static str,
    count: u64,
) -> Result<(), HierarchyError> {
    if count == 0 {
        Ok(())
    } else {
        Err(HierarchyError::HasDependents {
            kind,
            dependents,
            count,
        })
    }
}

/// A node of a materialized tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode<T> {
    /// The item.
    #[serde(flatten)]
    pub item: T,
    /// Children, in the same order as the input.
    pub children: Vec<TreeNode<T>>,
}

/// Builds nested trees from flat items.
///
/// Items whose parent is missing from the input become roots. Input order is
/// kept among siblings, so sort before calling. Nodes caught in a stored
/// cycle are dropped.
pub fn build_tree<T, FI, FP>(items: Vec<T>, id_of: FI, parent_of: FP) -> Vec<TreeNode<T>>
where
    FI: Fn(&T) -> Uuid,
    FP: Fn(&T) -> Option<Uuid>,
{
    fn attach<T, FI: Fn(&T) -> Uuid>(
        key: Option<Uuid>,
        children: &mut HashMap<Option<Uuid>, Vec<T>>,
        id_of: &FI,
    ) -> Vec<TreeNode<T>> {
        children
            .remove(&key)
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                let id = id_of(&item);
                TreeNode {
                    children: attach(Some(id), children, id_of),
                    item,
                }
            })
            .collect()
    }

    let ids: HashSet<Uuid> = items.iter().map(&id_of).collect();
    let mut children: HashMap<Option<Uuid>, Vec<T>> = HashMap::new();

    for item in items {
        let parent = parent_of(&item).filter(|p| ids.contains(p));
        children.entry(parent).or_default().push(item);
    }

    attach(None, &mut children, &id_of)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(len: usize) -> (Forest, Vec<Uuid>) {
        let ids: Vec<Uuid> = (0..len).map(|_| Uuid::new_v4()).collect();
        let mut forest = Forest::new();
        for (i, id) in ids.iter().enumerate() {
            forest.insert(*id, ids.get(i + 1).copied());
        }
        (forest, ids)
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (forest, ids) = chain(4);
        assert_eq!(forest.ancestors(ids[0]), ids[1..].to_vec());
        assert!(forest.ancestors(ids[3]).is_empty());
    }

    #[test]
    fn test_ancestors_stop_at_missing_parent() {
        let (mut forest, ids) = chain(3);
        forest.parents.remove(&ids[2]);
        assert_eq!(forest.ancestors(ids[0]), vec![ids[1]]);
    }

    #[test]
    fn test_ancestors_stop_on_stored_cycle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let forest: Forest = [(a, Some(b)), (b, Some(a))].into_iter().collect();
        assert_eq!(forest.ancestors(a), vec![b]);
    }

    #[test]
    fn test_two_node_cycle_is_rejected() {
        // a supervises b; making b supervise a closes the loop.
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let forest: Forest = [(a, None), (b, Some(a))].into_iter().collect();

        assert_eq!(
            forest.check_reassignment("supervisor", a, Some(b)),
            Err(HierarchyError::Cycle { kind: "supervisor" })
        );
        assert!(forest.check_reassignment("supervisor", b, Some(a)).is_ok());
    }

    #[test]
    fn test_deep_cycle_is_rejected() {
        let (forest, ids) = chain(5);
        assert!(forest.would_create_cycle(ids[4], ids[0]));
        assert!(!forest.would_create_cycle(ids[0], ids[4]));
    }

    #[test]
    fn test_self_and_missing_parent() {
        let (forest, ids) = chain(2);
        assert!(matches!(
            forest.check_reassignment("department", ids[0], Some(ids[0])),
            Err(HierarchyError::SelfReference { .. })
        ));
        assert!(matches!(
            forest.check_reassignment("department", ids[0], Some(Uuid::new_v4())),
            Err(HierarchyError::ParentNotFound { .. })
        ));
        assert!(forest.check_reassignment("department", ids[0], None).is_ok());
    }

    #[test]
    fn test_dependents_block_delete() {
        assert!(ensure_no_dependents("user", "direct reports", 0).is_ok());
        let err = ensure_no_dependents("user", "direct reports", 1).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete user: 1 active direct reports still assigned");
        assert_eq!(AppError::from(err).error_code(), "BAD_REQUEST");
    }

    #[test]
    fn test_build_tree_nests_and_keeps_order() {
        let root = Uuid::new_v4();
        let c1 = Uuid::new_v4();
        let c2 = Uuid::new_v4();
        let grandchild = Uuid::new_v4();
        let orphan = Uuid::new_v4();
        let items = vec![
            (root, None, "1000"),
            (c1, Some(root), "1100"),
            (c2, Some(root), "1200"),
            (grandchild, Some(c1), "1110"),
            (orphan, Some(Uuid::new_v4()), "9000"),
        ];

        let tree = build_tree(items, |i| i.0, |i| i.1);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].item.2, "1000");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].item.2, "1100");
        assert_eq!(tree[0].children[0].children[0].item.2, "1110");
        assert_eq!(tree[1].item.2, "9000");
    }
}
