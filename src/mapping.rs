use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::pq_tree::NodeId;

/// One concrete alignment of a subtree to a substring of the gene sequence.
///
/// Positions are 1-based and inclusive. A mapping that matches at least one
/// leaf starts and ends on matched leaves. The only other kind is the root
/// mapping that deletes every leaf, which is empty (`start = 1`, `end = 0`).
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    node: NodeId,
    score: f64,
    start: usize,
    end: usize,
    reversed: bool,
    children: Vec<Mapping>,      // matched children, in sequence order
    deleted_leaves: Vec<NodeId>, // whole subtree, not only direct children
    deleted_positions: Vec<usize>,
}

impl Mapping {
    /// A leaf matched to the element at `position`
    pub(crate) fn leaf(node: NodeId, position: usize, score: f64, reversed: bool) -> Self {
        Mapping {
            node,
            score,
            start: position,
            end: position,
            reversed,
            children: Vec::new(),
            deleted_leaves: Vec::new(),
            deleted_positions: Vec::new(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn internal(
        node: NodeId,
        score: f64,
        start: usize,
        end: usize,
        reversed: bool,
        children: Vec<Mapping>,
        mut deleted_leaves: Vec<NodeId>,
        mut deleted_positions: Vec<usize>,
    ) -> Self {
        deleted_leaves.sort_unstable();
        deleted_positions.sort_unstable();
        Mapping {
            node,
            score,
            start,
            end,
            reversed,
            children,
            deleted_leaves,
            deleted_positions,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of sequence positions covered
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Whether this subtree is read against the opposite strand
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && !self.is_empty()
    }

    pub fn children(&self) -> &[Mapping] {
        &self.children
    }

    pub fn deleted_leaves(&self) -> &[NodeId] {
        &self.deleted_leaves
    }

    pub fn deleted_positions(&self) -> &[usize] {
        &self.deleted_positions
    }

    pub fn tree_deletions(&self) -> usize {
        self.deleted_leaves.len()
    }

    pub fn string_deletions(&self) -> usize {
        self.deleted_positions.len()
    }

    pub fn overlaps(&self, other: &Mapping) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Ranking used to pick best mappings; `Greater` means `self` is better.
    ///
    /// Higher score wins, then the narrower span, the smaller start, fewer tree
    /// deletions, fewer string deletions, and finally forward orientation.
    pub fn rank_cmp(&self, other: &Mapping) -> Ordering {
        OrderedFloat(self.score)
            .cmp(&OrderedFloat(other.score))
            .then_with(|| other.len().cmp(&self.len()))
            .then_with(|| other.start.cmp(&self.start))
            .then_with(|| other.tree_deletions().cmp(&self.tree_deletions()))
            .then_with(|| other.string_deletions().cmp(&self.string_deletions()))
            .then_with(|| other.reversed.cmp(&self.reversed))
    }

    /// Matched leaf -> sequence position. Deleted leaves are omitted.
    pub fn leaf_positions(&self) -> BTreeMap<NodeId, usize> {
        let mut positions = BTreeMap::new();
        self.collect_leaf_positions(&mut positions);
        positions
    }

    /// Sequence position -> matched leaf. Deleted positions are omitted.
    pub fn position_leaves(&self) -> BTreeMap<usize, NodeId> {
        self.leaf_positions()
            .into_iter()
            .map(|(leaf, position)| (position, leaf))
            .collect()
    }

    fn collect_leaf_positions(&self, positions: &mut BTreeMap<NodeId, usize>) {
        if self.is_leaf() {
            positions.insert(self.node, self.start);
            return;
        }
        for child in &self.children {
            child.collect_leaf_positions(positions);
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node {} -> S[{}:{}] score {} ({} leaf deletions, {} gene deletions{})",
            self.node,
            self.start,
            self.end,
            self.score,
            self.tree_deletions(),
            self.string_deletions(),
            if self.reversed { ", reversed" } else { "" }
        )
    }
}
