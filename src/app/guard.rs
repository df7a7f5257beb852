//! Tamper guard — keeps the watermark surface a leaf and keeps it attached.
//!
//! The guard never touches the tree itself.  It turns mutation records into
//! [`Repair`]s, which the host (or [`Repair::apply`]) carries out.  Repairs
//! produce further records of their own, but none of those match a rule
//! here, so the loop settles after one round.
//!
//! This is best-effort: anything that can mutate the tree can also outpace
//! or disconnect the guard.

use crate::core::tree::{MutationRecord, NodeId, NodeTree};

/// A corrective action derived from a mutation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
    /// `child` was added under the surface; take it back out.
    RemoveChild { parent: NodeId, child: NodeId },
    /// The surface was removed from `parent`; put it back.
    Reattach { parent: NodeId, child: NodeId },
}

impl Repair {
    pub fn apply<T: NodeTree<Node = NodeId>>(&self, tree: &mut T) {
        match *self {
            Repair::RemoveChild { parent, child } => {
                // The node may have moved on since the record was taken.
                if tree.parent(child) == Some(parent) {
                    tree.remove(child);
                }
            }
            Repair::Reattach { parent, child } => {
                if tree.parent(child) != Some(parent) {
                    tree.append_child(parent, child);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TamperGuard {
    surface: NodeId,
    parent: Option<NodeId>,
}

impl TamperGuard {
    pub fn new(surface: NodeId, parent: Option<NodeId>) -> Self {
        Self { surface, parent }
    }

    /// Guard `surface`, remembering its current parent.
    pub fn attach<T: NodeTree<Node = NodeId>>(tree: &T, surface: NodeId) -> Self {
        Self::new(surface, tree.parent(surface))
    }

    pub fn surface(&self) -> NodeId {
        self.surface
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn inspect(&self, records: &[MutationRecord]) -> Vec<Repair> {
        let mut repairs = Vec::new();
        for record in records {
            if record.target == self.surface && !record.added.is_empty() {
                tracing::debug!(?record, "child added to watermark surface");
                repairs.extend(record.added.iter().map(|&child| Repair::RemoveChild {
                    parent: self.surface,
                    child,
                }));
            }
            if let Some(parent) = self.parent.filter(|&p| p == record.target) {
                if record.removed.contains(&self.surface) {
                    tracing::debug!(?record, "watermark surface removed from its parent");
                    repairs.push(Repair::Reattach {
                        parent,
                        child: self.surface,
                    });
                }
            }
        }
        repairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::SceneTree;

    fn scene() -> (SceneTree, NodeId, NodeId) {
        let mut tree = SceneTree::new("body");
        let container = tree.add_child(tree.root, "container");
        let canvas = tree.add_child(container, "canvas");
        tree.take_records();
        (tree, container, canvas)
    }

    fn settle(tree: &mut SceneTree, guard: &TamperGuard) -> usize {
        let mut rounds = 0;
        loop {
            let records = tree.take_records();
            let repairs = guard.inspect(&records);
            if repairs.is_empty() {
                return rounds;
            }
            for r in repairs {
                r.apply(tree);
            }
            rounds += 1;
        }
    }

    #[test]
    fn test_attach_captures_parent() {
        let (tree, container, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        assert_eq!(guard.parent(), Some(container));
        assert_eq!(guard.surface(), canvas);
    }

    #[test]
    fn test_child_added_to_surface_is_removed() {
        let (mut tree, _, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        let overlay = tree.add_child(canvas, "overlay");

        let repairs = guard.inspect(&tree.take_records());
        assert_eq!(
            repairs,
            vec![Repair::RemoveChild {
                parent: canvas,
                child: overlay
            }]
        );
        repairs[0].apply(&mut tree);
        assert!(tree.children(canvas).is_empty());
    }

    #[test]
    fn test_removed_surface_is_reattached() {
        let (mut tree, container, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        tree.remove(canvas);

        assert_eq!(settle(&mut tree, &guard), 1);
        assert_eq!(tree.parent(canvas), Some(container));
        assert!(tree.is_attached(canvas));
    }

    #[test]
    fn test_surface_moved_elsewhere_comes_back() {
        let (mut tree, container, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        let elsewhere = tree.add_child(tree.root, "elsewhere");
        tree.take_records();
        tree.append_child(elsewhere, canvas);

        settle(&mut tree, &guard);
        assert_eq!(tree.parent(canvas), Some(container));
        assert!(tree.children(elsewhere).is_empty());
    }

    #[test]
    fn test_unrelated_mutations_are_ignored() {
        let (mut tree, container, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        let sibling = tree.add_child(container, "sibling");
        tree.remove(sibling);
        assert!(guard.inspect(&tree.take_records()).is_empty());
    }

    #[test]
    fn test_repairs_naming_unknown_nodes_are_skipped() {
        let (mut tree, container, canvas) = scene();
        let guard = TamperGuard::attach(&tree, canvas);
        let forged = [
            MutationRecord::added(canvas, 404),
            MutationRecord::removed(container, canvas),
        ];
        for repair in guard.inspect(&forged) {
            repair.apply(&mut tree);
        }
        Repair::Reattach { parent: 404, child: canvas }.apply(&mut tree);
        Repair::RemoveChild { parent: 404, child: 405 }.apply(&mut tree);

        assert_eq!(tree.parent(canvas), Some(container));
        assert!(tree.children(canvas).is_empty());
    }

    #[test]
    fn test_stale_remove_repair_is_skipped() {
        let (mut tree, container, canvas) = scene();
        let overlay = tree.add_child(canvas, "overlay");
        tree.append_child(container, overlay);
        Repair::RemoveChild {
            parent: canvas,
            child: overlay,
        }
        .apply(&mut tree);
        assert_eq!(tree.parent(overlay), Some(container));
    }
}
