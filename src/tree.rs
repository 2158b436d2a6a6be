//! Persistent, id-addressed draw-node tree.
//!
//! The tree mirrors the set of active canvas components. It is the retained
//! half of the bridge: components mutate it, the executor walks it.
//!
//! ## Key Features
//!
//! - **Monotonic Ids**: every node gets the next value of a per-tree counter.
//!   Ids are never reused, so a stale id held by a component that is still
//!   tearing down can never hit a different node.
//!
//! - **Structural Sharing**: nodes are immutable `Rc<DrawNode>`s. A mutation
//!   copies the nodes on the path from the root down to the mutated node and
//!   shares every other subtree with the previous version. A [`Snapshot`]
//!   taken before a mutation keeps seeing the old tree.
//!
//! - **Lineage Index**: a side map from every live id to its parent id. It
//!   turns lookups into a walk down one root-to-node path instead of a full
//!   traversal.
//!
//! - **Retired Ids**: a bounded window of recently removed ids, each pointing
//!   at the live node its subtree hung from. An insert whose parent was just
//!   removed falls back to that ancestor; older stale ids fall back to the
//!   root.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::registry::NodeType;
use crate::value::Attributes;

/// Unique identifier of a node within one [`DrawTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One node: a type tag, its attributes and its children in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawNode {
    id: NodeId,
    node_type: NodeType,
    attributes: Attributes,
    children: Vec<Rc<DrawNode>>,
}

impl DrawNode {
    fn new(id: NodeId, node_type: NodeType, attributes: Attributes) -> Self {
        Self {
            id,
            node_type,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Children in paint order: later children paint over earlier ones.
    pub fn children(&self) -> &[Rc<DrawNode>] {
        &self.children
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        self.iter().count()
    }
}

/// Depth-first, pre-order walk over a subtree in stored child order.
pub struct PreOrder<'a> {
    stack: Vec<&'a DrawNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a DrawNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}

/// A frozen view of the tree at one version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    root: Rc<DrawNode>,
    version: u64,
}

impl Snapshot {
    pub fn root(&self) -> &DrawNode {
        &self.root
    }

    /// Version of the tree this snapshot was taken from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Full-walk lookup; snapshots carry no index.
    pub fn find(&self, id: NodeId) -> Option<&DrawNode> {
        self.root.iter().find(|node| node.id == id)
    }

    pub fn iter(&self) -> PreOrder<'_> {
        self.root.iter()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.root.subtree_len()
    }

    /// Always false: a snapshot contains at least the root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Whether both snapshots share the same root allocation.
    pub fn ptr_eq(&self, other: &Snapshot) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }
}

/// Structurally invalid tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node type {0} is reserved for the tree root")]
    ReservedType(NodeType),
}

/// How many removed ids keep a fallback parent.
const RETIRED_CAPACITY: usize = 256;

/// The mutable handle over the persistent tree.
#[derive(Debug)]
pub struct DrawTree {
    root: Rc<DrawNode>,
    next_id: u64,
    version: u64,
    /// Parent of every live non-root id.
    lineage: HashMap<NodeId, NodeId>,
    /// Ids currently reachable from the root.
    live: HashSet<NodeId>,
    /// Removed id to the ancestor it was removed from, oldest first in
    /// `retired_order`.
    retired: HashMap<NodeId, NodeId>,
    retired_order: VecDeque<NodeId>,
}

impl DrawTree {
    pub fn new() -> Self {
        Self::with_root_attributes(Attributes::new())
    }

    pub fn with_root_attributes(attributes: Attributes) -> Self {
        let root_id = NodeId(0);
        Self {
            root: Rc::new(DrawNode::new(root_id, NodeType::ROOT, attributes)),
            next_id: 1,
            version: 0,
            lineage: HashMap::new(),
            live: HashSet::from([root_id]),
            retired: HashMap::new(),
            retired_order: VecDeque::new(),
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root.id
    }

    /// Mutation counter; bumps on every change that produced a new root.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True when only the root is left.
    pub fn is_empty(&self) -> bool {
        self.live.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.live.contains(&id)
    }

    /// Parent of a live node. `None` for the root and for unknown ids.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if !self.contains(id) {
            return None;
        }
        self.lineage.get(&id).copied()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            root: self.root.clone(),
            version: self.version,
        }
    }

    pub fn find(&self, id: NodeId) -> Option<Rc<DrawNode>> {
        let path = self.path_to(id)?;
        let mut node = &self.root;
        for step in &path[1..] {
            node = node.children.iter().find(|child| child.id == *step)?;
        }
        Some(node.clone())
    }

    /// Create a node under `parent` and return its id.
    ///
    /// `None` attaches under the root. A parent that is not in the tree is
    /// not an error: a recently removed parent resolves to the ancestor it
    /// was removed from, anything else attaches under the root.
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        node_type: NodeType,
        attributes: Attributes,
    ) -> Result<NodeId, TreeError> {
        if node_type.is_root() {
            return Err(TreeError::ReservedType(node_type));
        }

        let parent_id = self.resolve_parent(parent);
        if let Some(requested) = parent {
            if requested != parent_id {
                log::debug!(
                    "Parent {} is not in the tree, attaching {} under {}",
                    requested,
                    node_type,
                    parent_id
                );
            }
        }

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let child = Rc::new(DrawNode::new(id, node_type, attributes));
        let path = self
            .path_to(parent_id)
            .unwrap_or_else(|| vec![self.root.id]);
        if let Some(root) = rewrite(&self.root, &path, |node| node.children.push(child)) {
            self.root = root;
        }

        self.lineage.insert(id, parent_id);
        self.live.insert(id);
        self.version += 1;
        log::debug!("Inserted {} {} under {}", node_type, id, parent_id);
        Ok(id)
    }

    /// Shallow-merge `partial` into the node's attributes.
    ///
    /// Returns `false` when the id is not in the tree or the merge changed
    /// nothing; neither case produces a new version.
    pub fn update(&mut self, id: NodeId, partial: &Attributes) -> bool {
        let Some(path) = self.path_to(id) else {
            log::debug!("Ignoring update of stale node {}", id);
            return false;
        };

        let mut changed = false;
        let root = rewrite(&self.root, &path, |node| {
            let merged = node.attributes.merged(partial);
            if merged != node.attributes {
                node.attributes = merged;
                changed = true;
            }
        });
        if !changed {
            return false;
        }
        if let Some(root) = root {
            self.root = root;
            self.version += 1;
        }
        changed
    }

    /// Delete a node and its whole subtree.
    ///
    /// No-op for `None`, unknown ids and the root. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, id: Option<NodeId>) -> bool {
        let Some(id) = id else {
            return false;
        };
        if id == self.root.id {
            log::warn!("Refusing to remove the tree root");
            return false;
        }
        let Some(path) = self.path_to(id) else {
            log::debug!("Ignoring removal of stale node {}", id);
            return false;
        };
        let Some(removed) = self.find(id) else {
            return false;
        };

        let parent_path = &path[..path.len() - 1];
        let root = rewrite(&self.root, parent_path, |node| {
            node.children.retain(|child| child.id != id);
        });
        let Some(root) = root else {
            return false;
        };
        self.root = root;

        let survivor = parent_path[parent_path.len() - 1];
        for node in removed.iter() {
            self.live.remove(&node.id);
            self.lineage.remove(&node.id);
            if survivor != self.root.id {
                self.retire(node.id, survivor);
            }
        }
        self.version += 1;
        log::debug!(
            "Removed {} {} ({} nodes)",
            removed.node_type,
            id,
            removed.subtree_len()
        );
        true
    }

    /// Drop every node but the root. Root id and attributes are kept, ids
    /// keep counting up.
    pub fn reset(&mut self) {
        let mut root = DrawNode::clone(&self.root);
        root.children.clear();
        self.root = Rc::new(root);
        self.lineage.clear();
        self.retired.clear();
        self.retired_order.clear();
        self.live.clear();
        self.live.insert(self.root.id);
        self.version += 1;
    }

    /// The live node an insert under `parent` should attach to.
    fn resolve_parent(&self, parent: Option<NodeId>) -> NodeId {
        let mut current = match parent {
            Some(id) => id,
            None => return self.root.id,
        };
        // Retired entries point at older ids, so the walk terminates.
        loop {
            if self.live.contains(&current) {
                return current;
            }
            match self.retired.get(&current) {
                Some(parent) => current = *parent,
                None => return self.root.id,
            }
        }
    }

    fn retire(&mut self, id: NodeId, ancestor: NodeId) {
        self.retired.insert(id, ancestor);
        self.retired_order.push_back(id);
        while self.retired_order.len() > RETIRED_CAPACITY {
            if let Some(oldest) = self.retired_order.pop_front() {
                self.retired.remove(&oldest);
            }
        }
    }

    /// Ids from the root down to `target`, both ends included.
    fn path_to(&self, target: NodeId) -> Option<Vec<NodeId>> {
        if !self.live.contains(&target) {
            return None;
        }
        let mut path = vec![target];
        let mut current = target;
        while current != self.root.id {
            current = *self.lineage.get(&current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }
}

impl Default for DrawTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy the nodes along `path` (which starts at `node`), apply `edit` to the
/// copy of the last one, and return the new subtree root.
///
/// Returns `None` if the path does not match the tree.
fn rewrite<F>(node: &Rc<DrawNode>, path: &[NodeId], edit: F) -> Option<Rc<DrawNode>>
where
    F: FnOnce(&mut DrawNode),
{
    if path.first() != Some(&node.id) {
        return None;
    }
    let mut copy = DrawNode::clone(node);
    match path.get(1) {
        None => edit(&mut copy),
        Some(next) => {
            let index = node.children.iter().position(|child| child.id == *next)?;
            copy.children[index] = rewrite(&node.children[index], &path[1..], edit)?;
        }
    }
    Some(Rc::new(copy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;

    const GROUP: NodeType = NodeType::new("GROUP");
    const BAR: NodeType = NodeType::new("BAR");

    fn ids(snapshot: &Snapshot) -> Vec<u64> {
        snapshot.iter().map(|node| node.id().get()).collect()
    }

    #[test]
    fn test_insert_then_remove_round_trip() {
        let mut tree = DrawTree::new();
        let id = tree.insert(None, BAR, attrs! { "x" => 1 }).unwrap();
        assert!(tree.find(id).is_some());

        assert!(tree.remove(Some(id)));
        assert!(tree.find(id).is_none());
        assert!(!tree.contains(id));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_update_merges_attributes() {
        let mut tree = DrawTree::new();
        let id = tree.insert(None, BAR, attrs! { "a" => 1, "b" => 2 }).unwrap();
        assert!(tree.update(id, &attrs! { "b" => 3 }));

        let node = tree.find(id).unwrap();
        assert_eq!(node.attributes(), &attrs! { "a" => 1, "b" => 3 });
    }

    #[test]
    fn test_update_without_change_keeps_version() {
        let mut tree = DrawTree::new();
        let id = tree.insert(None, BAR, attrs! { "a" => 1 }).unwrap();
        let version = tree.version();

        assert!(!tree.update(id, &attrs! { "a" => 1 }));
        assert_eq!(tree.version(), version);
    }

    #[test]
    fn test_remove_deletes_subtree() {
        let mut tree = DrawTree::new();
        let group = tree.insert(None, GROUP, Attributes::new()).unwrap();
        let inner = tree.insert(Some(group), GROUP, Attributes::new()).unwrap();
        let leaf = tree.insert(Some(inner), BAR, Attributes::new()).unwrap();
        let sibling = tree.insert(None, BAR, Attributes::new()).unwrap();

        assert!(tree.remove(Some(group)));
        for id in [group, inner, leaf] {
            assert!(tree.find(id).is_none());
            assert!(!tree.contains(id));
        }
        assert!(tree.find(sibling).is_some());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutations() {
        let mut tree = DrawTree::new();
        let a = tree.insert(None, BAR, attrs! { "v" => 1 }).unwrap();
        let before = tree.snapshot();

        tree.update(a, &attrs! { "v" => 2 });
        tree.insert(None, BAR, Attributes::new()).unwrap();
        tree.remove(Some(a));

        let old = before.find(a).unwrap();
        assert_eq!(old.attributes(), &attrs! { "v" => 1 });
        assert_eq!(before.len(), 2);
        assert!(!before.ptr_eq(&tree.snapshot()));
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let mut tree = DrawTree::new();
        let left = tree.insert(None, GROUP, Attributes::new()).unwrap();
        tree.insert(Some(left), BAR, Attributes::new()).unwrap();
        let right = tree.insert(None, GROUP, Attributes::new()).unwrap();

        let before = tree.snapshot();
        tree.update(right, &attrs! { "top" => 4 });
        let after = tree.snapshot();

        let old_left = &before.root().children()[0];
        let new_left = &after.root().children()[0];
        assert!(Rc::ptr_eq(old_left, new_left));
        assert!(!Rc::ptr_eq(
            &before.root().children()[1],
            &after.root().children()[1]
        ));
    }

    #[test]
    fn test_children_keep_insertion_order() {
        let mut tree = DrawTree::new();
        let a = tree.insert(None, GROUP, Attributes::new()).unwrap();
        let b = tree.insert(Some(a), BAR, Attributes::new()).unwrap();
        let c = tree.insert(Some(a), BAR, Attributes::new()).unwrap();
        let d = tree.insert(None, BAR, Attributes::new()).unwrap();

        let order = ids(&tree.snapshot());
        assert_eq!(order, vec![0, a.get(), b.get(), c.get(), d.get()]);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut tree = DrawTree::new();
        let first = tree.insert(None, BAR, Attributes::new()).unwrap();
        tree.remove(Some(first));
        let second = tree.insert(None, BAR, Attributes::new()).unwrap();
        assert!(second > first);

        tree.reset();
        let third = tree.insert(None, BAR, Attributes::new()).unwrap();
        assert!(third > second);
    }

    #[test]
    fn test_unknown_parent_attaches_under_root() {
        let mut tree = DrawTree::new();
        let id = tree
            .insert(Some(NodeId(999)), BAR, Attributes::new())
            .unwrap();
        assert_eq!(tree.parent_of(id), Some(tree.root_id()));
    }

    #[test]
    fn test_removed_parent_falls_back_to_live_ancestor() {
        let mut tree = DrawTree::new();
        let outer = tree.insert(None, GROUP, Attributes::new()).unwrap();
        let inner = tree.insert(Some(outer), GROUP, Attributes::new()).unwrap();
        tree.remove(Some(inner));

        let late = tree.insert(Some(inner), BAR, Attributes::new()).unwrap();
        assert_eq!(tree.parent_of(late), Some(outer));
    }

    #[test]
    fn test_removed_chain_resolves_through_retired_ancestors() {
        let mut tree = DrawTree::new();
        let outer = tree.insert(None, GROUP, Attributes::new()).unwrap();
        let middle = tree.insert(Some(outer), GROUP, Attributes::new()).unwrap();
        let inner = tree.insert(Some(middle), GROUP, Attributes::new()).unwrap();
        tree.remove(Some(inner));
        tree.remove(Some(middle));

        let late = tree.insert(Some(inner), BAR, Attributes::new()).unwrap();
        assert_eq!(tree.parent_of(late), Some(outer));
    }

    #[test]
    fn test_index_stays_bounded_under_churn() {
        let mut tree = DrawTree::new();
        let group = tree.insert(None, GROUP, Attributes::new()).unwrap();
        for _ in 0..10_000 {
            let bar = tree.insert(Some(group), BAR, Attributes::new()).unwrap();
            let top = tree.insert(None, BAR, Attributes::new()).unwrap();
            tree.remove(Some(bar));
            tree.remove(Some(top));
        }

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.lineage.len(), 1);
        assert!(tree.retired.len() <= RETIRED_CAPACITY);
        assert_eq!(tree.retired.len(), tree.retired_order.len());
    }

    #[test]
    fn test_root_type_is_reserved() {
        let mut tree = DrawTree::new();
        let err = tree.insert(None, NodeType::ROOT, Attributes::new());
        assert_eq!(err, Err(TreeError::ReservedType(NodeType::ROOT)));
        assert_eq!(tree.version(), 0);
    }

    #[test]
    fn test_remove_noops() {
        let mut tree = DrawTree::new();
        let root = tree.root_id();
        assert!(!tree.remove(None));
        assert!(!tree.remove(Some(root)));
        assert!(!tree.remove(Some(NodeId(42))));
        assert_eq!(tree.version(), 0);
    }

    #[test]
    fn test_update_stale_id_is_noop() {
        let mut tree = DrawTree::new();
        let id = tree.insert(None, BAR, Attributes::new()).unwrap();
        tree.remove(Some(id));
        let version = tree.version();
        assert!(!tree.update(id, &attrs! { "x" => 1 }));
        assert_eq!(tree.version(), version);
    }

    #[test]
    fn test_root_can_be_updated() {
        let mut tree = DrawTree::new();
        let root = tree.root_id();
        assert!(tree.update(root, &attrs! { "density" => 2 }));
        assert_eq!(
            tree.snapshot().root().attributes(),
            &attrs! { "density" => 2 }
        );
    }

    #[test]
    fn test_reset_keeps_root() {
        let mut tree = DrawTree::with_root_attributes(attrs! { "density" => 2 });
        let root = tree.root_id();
        tree.insert(None, GROUP, Attributes::new()).unwrap();
        tree.reset();

        assert!(tree.is_empty());
        assert_eq!(tree.root_id(), root);
        assert_eq!(
            tree.snapshot().root().attributes(),
            &attrs! { "density" => 2 }
        );
    }
}
