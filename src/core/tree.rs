//! Structural model of the host surface hierarchy.
//!
//! The [`SceneNode`] is the fundamental unit – a named node linking to its
//! parent and children via indices into an arena (the [`SceneTree`] struct).
//! Every structural change is journalled as a [`MutationRecord`] so the
//! tamper guard can react to it the same way it would to host notifications.

/// Index into [`SceneTree::nodes`].
pub type NodeId = usize;

/// One structural change: children added to / removed from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N = NodeId> {
    pub target: N,
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn added(target: N, child: N) -> Self {
        Self {
            target,
            added: vec![child],
            removed: Vec::new(),
        }
    }

    pub fn removed(target: N, child: N) -> Self {
        Self {
            target,
            added: Vec::new(),
            removed: vec![child],
        }
    }
}

/// The structural operations the tamper guard needs from a host tree.
pub trait NodeTree {
    type Node: Copy + Eq + std::fmt::Debug;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Detach `node` from its current parent (no-op if already detached).
    fn remove(&mut self, node: Self::Node);

    /// Make `child` the last child of `parent`, detaching it first if needed.
    fn append_child(&mut self, parent: Self::Node, child: Self::Node);
}

// ───────────────────────────────────────── scene node ────────

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

// ───────────────────────────────────────── arena tree ────────

/// Arena-backed node tree.
///
/// Nodes are stored in a flat `Vec` and reference each other by index.
/// Removing a node only detaches it; its id stays valid so it can be
/// reattached later.
#[derive(Debug, Clone)]
pub struct SceneTree {
    pub nodes: Vec<SceneNode>,
    pub root: NodeId,
    records: Vec<MutationRecord>,
}

impl SceneTree {
    /// Create a new tree with a single root node.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = SceneNode {
            name: root_name.into(),
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: 0,
            records: Vec::new(),
        }
    }

    /// Create a detached node and return its [`NodeId`].
    pub fn create(&mut self, name: impl Into<String>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SceneNode {
            name: name.into(),
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a node under `parent_id` and return its [`NodeId`].
    pub fn add_child(&mut self, parent_id: NodeId, name: impl Into<String>) -> NodeId {
        let id = self.create(name);
        self.append_child(parent_id, id);
        id
    }

    /// Children of `id`; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(n) = cur {
            if n == self.root {
                return true;
            }
            cur = self.nodes.get(n).and_then(|node| node.parent);
        }
        false
    }

    /// Drain the mutation journal.
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    fn contains(&self, id: NodeId) -> bool {
        id < self.nodes.len()
    }
}

impl NodeTree for SceneTree {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Unknown ids are ignored.
    fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get_mut(node).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        self.records.push(MutationRecord::removed(parent, node));
    }

    /// Unknown ids (either side) are ignored.
    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            tracing::debug!("append_child({parent}, {child}): unknown node id");
            return;
        }
        self.remove(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.records.push(MutationRecord::added(parent, child));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_are_journalled() {
        let mut tree = SceneTree::new("body");
        let container = tree.add_child(tree.root, "container");
        let canvas = tree.add_child(container, "canvas");
        assert_eq!(tree.children(container), &[canvas]);
        tree.take_records();

        tree.remove(canvas);
        assert!(tree.children(container).is_empty());
        assert!(!tree.is_attached(canvas));
        assert_eq!(tree.take_records(), vec![MutationRecord::removed(container, canvas)]);
    }

    #[test]
    fn test_append_moves_between_parents() {
        let mut tree = SceneTree::new("body");
        let a = tree.add_child(tree.root, "a");
        let b = tree.add_child(tree.root, "b");
        let leaf = tree.add_child(a, "leaf");
        tree.take_records();

        tree.append_child(b, leaf);
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[leaf]);
        assert_eq!(tree.parent(leaf), Some(b));
        assert_eq!(
            tree.take_records(),
            vec![MutationRecord::removed(a, leaf), MutationRecord::added(b, leaf)]
        );
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut tree = SceneTree::new("body");
        let canvas = tree.add_child(tree.root, "canvas");
        tree.take_records();

        assert_eq!(tree.parent(99), None);
        assert!(tree.children(99).is_empty());
        assert!(!tree.is_attached(99));
        assert!(tree.get(99).is_none());
        tree.remove(99);
        tree.append_child(99, canvas);
        tree.append_child(canvas, 99);

        assert!(tree.take_records().is_empty());
        assert_eq!(tree.parent(canvas), Some(tree.root));
    }

    #[test]
    fn test_remove_detached_is_noop() {
        let mut tree = SceneTree::new("body");
        let orphan = tree.create("orphan");
        tree.remove(orphan);
        assert!(tree.take_records().is_empty());
    }
}
