//! Arena representation of PQ-trees whose leaves carry gene labels.
//!
//! Nodes live in a single vector and reference their children by [`NodeId`].
//! Trees are assembled with [`PqTreeBuilder`], which only hands out a
//! [`PqTree`] once the node set forms a strict tree: every node except the
//! root has exactly one parent and every node is reachable from the root.

use std::fmt;

use crate::error::{Error, Result};
use crate::gene_group::GeneGroup;

/// Index of a node inside its [`PqTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the children of an internal node may be arranged along the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Q-node: children keep their left-to-right order, up to reversal of the whole run.
    OrderFixed,
    /// P-node: children may appear in any order.
    OrderFree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(GeneGroup),
    Internal { kind: NodeKind, children: Vec<NodeId> },
}

#[derive(Debug, Clone)]
pub struct PqTree {
    nodes: Vec<Node>,
    leaf_counts: Vec<usize>,
    root: NodeId,
}

impl PqTree {
    /// A tree made of a single leaf.
    pub fn single_leaf(label: GeneGroup) -> Self {
        Self {
            nodes: vec![Node::Leaf(label)],
            leaf_counts: vec![1],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves in the subtree rooted at `id`.
    pub fn leaf_count(&self, id: NodeId) -> usize {
        self.leaf_counts[id.0]
    }

    pub fn label(&self, id: NodeId) -> Option<&GeneGroup> {
        match self.node(id) {
            Node::Leaf(label) => Some(label),
            Node::Internal { .. } => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Node::Leaf(_) => &[],
            Node::Internal { children, .. } => children,
        }
    }

    /// Leaves of the subtree rooted at `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::with_capacity(self.leaf_count(id));
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            match self.node(current) {
                Node::Leaf(_) => leaves.push(current),
                Node::Internal { children, .. } => stack.extend(children.iter().rev()),
            }
        }
        leaves
    }

    /// All node ids, children before their parents.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.children(id).iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node(id) {
            Node::Leaf(label) => write!(f, "{label}"),
            Node::Internal { kind, children } => {
                let (open, close) = match kind {
                    NodeKind::OrderFixed => ('[', ']'),
                    NodeKind::OrderFree => ('(', ')'),
                };
                write!(f, "{open}")?;
                for (i, &child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    self.fmt_node(child, f)?;
                }
                write!(f, "{close}")
            }
        }
    }
}

/// Parenthesis notation: `[..]` for order-fixed and `(..)` for order-free nodes.
impl fmt::Display for PqTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

/// Incremental construction of a [`PqTree`].
///
/// Children must be added before their parent, which rules out cycles.
#[derive(Debug, Default)]
pub struct PqTreeBuilder {
    nodes: Vec<Node>,
}

impl PqTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_leaf(&mut self, label: GeneGroup) -> NodeId {
        self.nodes.push(Node::Leaf(label));
        NodeId(self.nodes.len() - 1)
    }

    pub fn add_internal(&mut self, kind: NodeKind, children: Vec<NodeId>) -> Result<NodeId> {
        if children.is_empty() {
            return Err(Error::MalformedTree(
                "internal nodes need at least one child".to_string(),
            ));
        }
        let next = self.nodes.len();
        if let Some(child) = children.iter().find(|child| child.0 >= next) {
            return Err(Error::MalformedTree(format!(
                "child {child} does not exist yet"
            )));
        }
        self.nodes.push(Node::Internal { kind, children });
        Ok(NodeId(next))
    }

    /// Finish the tree rooted at `root`.
    pub fn build(self, root: NodeId) -> Result<PqTree> {
        let n = self.nodes.len();
        if root.0 >= n {
            return Err(Error::MalformedTree(format!("root {root} does not exist")));
        }

        let mut parents = vec![0usize; n];
        for node in &self.nodes {
            if let Node::Internal { children, .. } = node {
                for child in children {
                    parents[child.0] += 1;
                }
            }
        }
        if parents[root.0] != 0 {
            return Err(Error::MalformedTree(format!(
                "root {root} is the child of another node"
            )));
        }
        if let Some(shared) = (0..n).find(|&i| parents[i] > 1) {
            return Err(Error::MalformedTree(format!(
                "node #{shared} has {} parents",
                parents[shared]
            )));
        }

        // Children always precede their parents, so one forward pass suffices.
        let mut leaf_counts = vec![0usize; n];
        for (i, node) in self.nodes.iter().enumerate() {
            leaf_counts[i] = match node {
                Node::Leaf(_) => 1,
                Node::Internal { children, .. } => {
                    children.iter().map(|child| leaf_counts[child.0]).sum()
                }
            };
        }

        let tree = PqTree {
            nodes: self.nodes,
            leaf_counts,
            root,
        };
        let reachable = tree.post_order().len();
        if reachable != n {
            return Err(Error::MalformedTree(format!(
                "{} nodes are not reachable from the root",
                n - reachable
            )));
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(label: &str) -> GeneGroup {
        label.parse().unwrap()
    }

    fn sample_tree() -> PqTree {
        let mut builder = PqTreeBuilder::new();
        let a = builder.add_leaf(gene("A+"));
        let b = builder.add_leaf(gene("B+"));
        let c = builder.add_leaf(gene("C-"));
        let q = builder.add_internal(NodeKind::OrderFixed, vec![a, b]).unwrap();
        let root = builder.add_internal(NodeKind::OrderFree, vec![q, c]).unwrap();
        builder.build(root).unwrap()
    }

    #[test]
    fn leaf_counts_and_leaves() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.leaf_count(tree.root()), 3);
        let labels: Vec<String> = tree
            .leaves(tree.root())
            .into_iter()
            .map(|leaf| tree.label(leaf).unwrap().to_string())
            .collect();
        assert_eq!(labels, vec!["A+", "B+", "C-"]);
    }

    #[test]
    fn post_order_visits_children_first() {
        let tree = sample_tree();
        let order = tree.post_order();
        assert_eq!(order.len(), tree.len());
        assert_eq!(*order.last().unwrap(), tree.root());
        let position = |id: NodeId| order.iter().position(|&x| x == id).unwrap();
        for &id in &order {
            for &child in tree.children(id) {
                assert!(position(child) < position(id));
            }
        }
    }

    #[test]
    fn display_uses_parenthesis_notation() {
        assert_eq!(sample_tree().to_string(), "([A+ B+] C-)");
    }

    #[test]
    fn rejects_shared_children() {
        let mut builder = PqTreeBuilder::new();
        let a = builder.add_leaf(gene("A"));
        let q = builder.add_internal(NodeKind::OrderFixed, vec![a]).unwrap();
        let root = builder.add_internal(NodeKind::OrderFree, vec![q, a]).unwrap();
        assert!(builder.build(root).is_err());
    }

    #[test]
    fn rejects_unreachable_nodes() {
        let mut builder = PqTreeBuilder::new();
        let a = builder.add_leaf(gene("A"));
        let _orphan = builder.add_leaf(gene("B"));
        let root = builder.add_internal(NodeKind::OrderFixed, vec![a]).unwrap();
        assert!(builder.build(root).is_err());
    }

    #[test]
    fn rejects_empty_internal_nodes() {
        let mut builder = PqTreeBuilder::new();
        assert!(builder.add_internal(NodeKind::OrderFree, vec![]).is_err());
    }
}
