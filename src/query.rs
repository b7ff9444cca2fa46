//! Tree query interface
//!
//! The feature engine never owns or builds trees. Anything that can answer
//! these structural questions can be fed to a compiled template set.

use crate::tree::NodeId;

/// Read-only structural access to an ordered, labeled tree.
///
/// Node ids must be dense (`0..node_count()`). Children and roots are
/// reported in sentence order; the evaluator relies on that order for
/// sibling windows and document order.
pub trait TreeQuery {
    /// Number of nodes in the tree
    fn node_count(&self) -> usize;

    /// Top-level nodes, in order
    fn roots(&self) -> &[NodeId];

    /// Parent of a node, if any
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Ordered children of a node
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Value of a node attribute, or `None` when the node lacks it
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Ancestor-or-self chain of a node, from the node up to its root
    fn ancestors_or_self(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            // guard against malformed (cyclic) parent links
            if chain.len() > self.node_count() {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

/// Pre-order (document order) ranking of a tree's nodes
#[derive(Debug, Clone)]
pub struct DocumentOrder {
    order: Vec<NodeId>,
    rank: Vec<usize>,
}

impl DocumentOrder {
    /// Walk the tree depth-first, roots and children in their given order
    pub fn build<T: TreeQuery + ?Sized>(tree: &T) -> Self {
        let n = tree.node_count();
        let mut order = Vec::with_capacity(n);
        let mut rank = vec![usize::MAX; n];
        let mut stack: Vec<NodeId> = tree.roots().iter().rev().copied().collect();

        while let Some(node) = stack.pop() {
            if node >= n || rank[node] != usize::MAX {
                continue;
            }
            rank[node] = order.len();
            order.push(node);
            stack.extend(tree.children(node).iter().rev().copied());
        }

        Self { order, rank }
    }

    /// All reachable nodes in document order
    pub fn nodes(&self) -> &[NodeId] {
        &self.order
    }

    /// Position of a node in document order (`usize::MAX` if unreachable)
    pub fn rank(&self, node: NodeId) -> usize {
        self.rank.get(node).copied().unwrap_or(usize::MAX)
    }

    /// Sort nodes into document order and drop duplicates
    pub fn sort(&self, nodes: &mut Vec<NodeId>) {
        nodes.sort_by_key(|&n| self.rank(n));
        nodes.dedup();
    }
}
