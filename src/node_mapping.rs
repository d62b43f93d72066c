/// Alignment of a PQ-tree against a gene sequence with bounded deletions
///
/// The engine solves every node bottom-up, once per strand context, and keeps
/// for each node only the best entry per (end point, tree deletions, string
/// deletions). The root is read on the forward strand only; its entries are
/// expanded into [`Mapping`] values and grouped by end point.
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::config::AlignmentConfig;
use crate::error::{Error, Result};
use crate::gene_group::GeneGroup;
use crate::mapping::Mapping;
use crate::node_table::{leaf_table, ChildSlot, Combiner, Context, Entry, NodeTable, Part};
use crate::order_fixed::combine_order_fixed;
use crate::order_free::{combine_order_free, MAX_ORDER_FREE_CHILDREN};
use crate::pq_tree::{Node, NodeId, NodeKind, PqTree};
use crate::scoring::ScoringPolicy;

/// Root mappings grouped by the end point of their substring
pub type ResultTable = BTreeMap<usize, Vec<Mapping>>;

/// Tables of one solved subtree, mirroring the tree shape
struct SolvedNode {
    node: NodeId,
    tables: [NodeTable; 2],
    children: Vec<SolvedNode>,
}

pub struct NodeMappingAlgorithm {
    sequence: Vec<GeneGroup>,
    tree: PqTree,
    config: AlignmentConfig,
    scoring: Box<dyn ScoringPolicy>,
    result_mappings_by_end_points: ResultTable,
}

impl NodeMappingAlgorithm {
    /// Validate the inputs of one run. Nothing is computed until
    /// [`run_algorithm`](Self::run_algorithm) is called.
    pub fn new(
        sequence: Vec<GeneGroup>,
        tree: PqTree,
        config: AlignmentConfig,
        scoring: impl ScoringPolicy + 'static,
    ) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::EmptySequence);
        }
        for id in tree.post_order() {
            if let Node::Internal {
                kind: NodeKind::OrderFree,
                children,
            } = tree.node(id)
            {
                if children.len() > MAX_ORDER_FREE_CHILDREN {
                    return Err(Error::OrderFreeDegree {
                        node: id.index(),
                        children: children.len(),
                        limit: MAX_ORDER_FREE_CHILDREN,
                    });
                }
            }
        }

        Ok(Self {
            sequence,
            tree,
            config,
            scoring: Box::new(scoring),
            result_mappings_by_end_points: ResultTable::new(),
        })
    }

    /// Fill the result table with every mapping of the root that fits the
    /// deletion budgets, keeping the best mapping per (end point, tree
    /// deletions, string deletions).
    pub fn run_algorithm(&mut self) {
        info!(
            "Aligning a tree with {} leaves against {} genes (tree deletions <= {}, gene deletions <= {})",
            self.tree.leaf_count(self.tree.root()),
            self.sequence.len(),
            self.config.tree_deletion_limit,
            self.config.string_deletion_limit
        );

        let element_costs: Vec<f64> = self
            .sequence
            .iter()
            .map(|gene| self.scoring.deletion_cost(gene))
            .collect();
        let subtree_costs = self.subtree_costs();
        let cx = Combiner {
            tree: &self.tree,
            config: self.config,
            element_costs: &element_costs,
            subtree_costs: &subtree_costs,
        };

        let solved = self.solve(&cx, self.tree.root(), &[Context::Forward]);
        let mut table = self.collect_root_mappings(&solved);
        if let Some(deleted) = self.fully_deleted_root(&subtree_costs) {
            table.entry(deleted.end()).or_default().push(deleted);
        }

        let total: usize = table.values().map(Vec::len).sum();
        info!(
            "Found {} mappings ending at {} distinct positions",
            total,
            table.len()
        );
        self.result_mappings_by_end_points = table;
    }

    /// All mappings computed by [`run_algorithm`](Self::run_algorithm), empty before it runs
    pub fn result_table(&self) -> &ResultTable {
        &self.result_mappings_by_end_points
    }

    pub fn sequence(&self) -> &[GeneGroup] {
        &self.sequence
    }

    pub fn tree(&self) -> &PqTree {
        &self.tree
    }

    pub fn config(&self) -> AlignmentConfig {
        self.config
    }

    /// Best mapping by [`Mapping::rank_cmp`]
    pub fn best_mapping(&self) -> Option<&Mapping> {
        self.result_mappings_by_end_points
            .values()
            .flatten()
            .filter(|mapping| mapping.score() > f64::NEG_INFINITY)
            .max_by(|a, b| a.rank_cmp(b))
    }

    /// Mappings scoring strictly above `threshold`, best first
    pub fn all_mappings(&self, threshold: f64) -> Vec<&Mapping> {
        let mut mappings: Vec<&Mapping> = self
            .result_mappings_by_end_points
            .values()
            .flatten()
            .filter(|mapping| mapping.score() > threshold)
            .collect();
        mappings.sort_by(|a, b| b.rank_cmp(a));
        mappings
    }

    /// Best mapping per end point, then best of those per start index, best first
    pub fn best_distinct_mappings(&self, threshold: f64) -> Vec<&Mapping> {
        let mut by_start: BTreeMap<usize, &Mapping> = BTreeMap::new();
        let best_per_end = self
            .result_mappings_by_end_points
            .values()
            .filter_map(|mappings| mappings.iter().max_by(|a, b| a.rank_cmp(b)))
            .filter(|mapping| mapping.score() > threshold);
        for mapping in best_per_end {
            by_start
                .entry(mapping.start())
                .and_modify(|best| {
                    if mapping.rank_cmp(best).is_gt() {
                        *best = mapping;
                    }
                })
                .or_insert(mapping);
        }

        let mut mappings: Vec<&Mapping> = by_start.into_values().collect();
        mappings.sort_by(|a, b| b.rank_cmp(a));
        mappings
    }

    /// Sequence position -> leaf of the best mapping
    pub fn best_position_to_leaf(&self) -> Option<BTreeMap<usize, NodeId>> {
        self.best_mapping().map(Mapping::position_leaves)
    }

    fn subtree_costs(&self) -> Vec<f64> {
        let mut costs = vec![0.0; self.tree.len()];
        for id in self.tree.post_order() {
            costs[id.index()] = match self.tree.node(id) {
                Node::Leaf(label) => self.scoring.deletion_cost(label),
                Node::Internal { children, .. } => {
                    children.iter().map(|child| costs[child.index()]).sum()
                }
            };
        }
        costs
    }

    /// Solve the subtree rooted at `node` in `contexts`; the tables of other
    /// contexts stay empty. Independent children run in parallel.
    fn solve(&self, cx: &Combiner, node: NodeId, contexts: &[Context]) -> SolvedNode {
        match self.tree.node(node) {
            Node::Leaf(label) => SolvedNode {
                node,
                tables: Context::BOTH.map(|context| {
                    if contexts.contains(&context) {
                        leaf_table(label, context, &self.sequence, &*self.scoring)
                    } else {
                        NodeTable::default()
                    }
                }),
                children: Vec::new(),
            },
            Node::Internal { kind, children } => {
                let solved: Vec<SolvedNode> = children
                    .par_iter()
                    .map(|&child| self.solve(cx, child, &Context::BOTH))
                    .collect();
                let tables = {
                    let slots: Vec<ChildSlot> = solved
                        .iter()
                        .enumerate()
                        .map(|(position, child)| ChildSlot {
                            position,
                            node: child.node,
                            tables: &child.tables,
                        })
                        .collect();

                    match kind {
                        NodeKind::OrderFixed => {
                            let table = combine_order_fixed(cx, &slots);
                            [table.clone(), table]
                        }
                        NodeKind::OrderFree => Context::BOTH.map(|context| {
                            if contexts.contains(&context) {
                                combine_order_free(cx, &slots, context)
                            } else {
                                NodeTable::default()
                            }
                        }),
                    }
                };
                debug!(
                    "Node {} ({:?}, {} children): {} forward and {} reverse entries",
                    node,
                    kind,
                    children.len(),
                    tables[0].len(),
                    tables[1].len()
                );

                SolvedNode {
                    node,
                    tables,
                    children: solved,
                }
            }
        }
    }

    /// Forward root entries expanded into mappings
    fn collect_root_mappings(&self, solved: &SolvedNode) -> ResultTable {
        let mut table = ResultTable::new();
        for entry in solved.tables[Context::Forward.index()].iter() {
            let mapping = self.expand(solved, entry);
            table.entry(mapping.end()).or_default().push(mapping);
        }
        for mappings in table.values_mut() {
            mappings.sort_by(|a, b| b.rank_cmp(a));
        }
        table
    }

    fn expand(&self, solved: &SolvedNode, entry: &Entry) -> Mapping {
        let reversed = entry.orientation == Context::Reverse;
        if entry.parts.is_empty() {
            return Mapping::leaf(solved.node, entry.start, entry.score, reversed);
        }

        let mut children = Vec::new();
        let mut deleted_leaves = Vec::new();
        let mut deleted_positions = Vec::new();
        for part in &entry.parts {
            match *part {
                Part::Matched {
                    child,
                    context,
                    key,
                } => {
                    let child_solved = &solved.children[child];
                    // Parts only reference entries that survived in the child's table
                    let Some(child_entry) = child_solved.tables[context.index()].get(&key) else {
                        continue;
                    };
                    let mapping = self.expand(child_solved, child_entry);
                    deleted_leaves.extend_from_slice(mapping.deleted_leaves());
                    deleted_positions.extend_from_slice(mapping.deleted_positions());
                    children.push(mapping);
                }
                Part::Deleted { child } => {
                    deleted_leaves.extend(self.tree.leaves(solved.children[child].node));
                }
                Part::Gap { start, end } => deleted_positions.extend(start..=end),
            }
        }

        Mapping::internal(
            solved.node,
            entry.score,
            entry.start,
            entry.key.end,
            reversed,
            children,
            deleted_leaves,
            deleted_positions,
        )
    }

    /// The empty mapping that deletes every leaf, when the tree budget allows it
    fn fully_deleted_root(&self, subtree_costs: &[f64]) -> Option<Mapping> {
        let root = self.tree.root();
        if self.tree.leaf_count(root) > self.config.tree_deletion_limit {
            return None;
        }
        let score = -subtree_costs[root.index()];
        if !score.is_finite() {
            return None;
        }
        Some(Mapping::internal(
            root,
            score,
            1,
            0,
            false,
            Vec::new(),
            self.tree.leaves(root),
            Vec::new(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node_table::fixtures::{flat_tree, genes};
    use crate::scoring::{ExactMatchScoring, FnScoring};
    use pretty_assertions::assert_eq;

    fn run(tree: PqTree, sequence: &str, config: AlignmentConfig) -> NodeMappingAlgorithm {
        let mut algorithm =
            NodeMappingAlgorithm::new(genes(sequence), tree, config, ExactMatchScoring::new(1.0))
                .unwrap();
        algorithm.run_algorithm();
        algorithm
    }

    #[test]
    fn test_rejects_empty_sequence() {
        let tree = flat_tree(NodeKind::OrderFixed, "A B");
        let result = NodeMappingAlgorithm::new(
            Vec::new(),
            tree,
            AlignmentConfig::default(),
            ExactMatchScoring::default(),
        );
        assert!(matches!(result, Err(Error::EmptySequence)));
    }

    #[test]
    fn test_rejects_wide_order_free_nodes() {
        let labels: Vec<String> = (0..=MAX_ORDER_FREE_CHILDREN).map(|i| format!("G{i}")).collect();
        let tree = flat_tree(NodeKind::OrderFree, &labels.join(" "));
        let result = NodeMappingAlgorithm::new(
            genes("G0"),
            tree,
            AlignmentConfig::default(),
            ExactMatchScoring::default(),
        );
        assert!(matches!(result, Err(Error::OrderFreeDegree { .. })));
    }

    #[test]
    fn test_queries_are_empty_before_running() {
        let tree = flat_tree(NodeKind::OrderFixed, "A B");
        let algorithm = NodeMappingAlgorithm::new(
            genes("A B"),
            tree,
            AlignmentConfig::default(),
            ExactMatchScoring::default(),
        )
        .unwrap();
        assert!(algorithm.result_table().is_empty());
        assert!(algorithm.best_mapping().is_none());
        assert!(algorithm.all_mappings(f64::NEG_INFINITY).is_empty());
        assert!(algorithm.best_position_to_leaf().is_none());
    }

    #[test]
    fn test_nested_tree_expansion() {
        // ([A B] C) against C A X B with one gene deletion
        let mut builder = crate::pq_tree::PqTreeBuilder::new();
        let a = builder.add_leaf("A".parse().unwrap());
        let b = builder.add_leaf("B".parse().unwrap());
        let c = builder.add_leaf("C".parse().unwrap());
        let q = builder.add_internal(NodeKind::OrderFixed, vec![a, b]).unwrap();
        let root = builder.add_internal(NodeKind::OrderFree, vec![q, c]).unwrap();
        let tree = builder.build(root).unwrap();

        let algorithm = run(tree, "C A X B", AlignmentConfig::new(0, 1));
        let best = algorithm.best_mapping().unwrap();
        assert_eq!((best.start(), best.end()), (1, 4));
        assert_eq!(best.score(), 2.0);
        assert_eq!(best.deleted_positions(), &[3]);
        assert_eq!(best.tree_deletions(), 0);

        let children: Vec<NodeId> = best.children().iter().map(Mapping::node).collect();
        assert_eq!(children, vec![c, q]);

        let positions = best.leaf_positions();
        assert_eq!(positions[&c], 1);
        assert_eq!(positions[&a], 2);
        assert_eq!(positions[&b], 4);
    }

    #[test]
    fn test_fully_deleted_root_is_a_candidate() {
        let tree = PqTree::single_leaf("A".parse().unwrap());
        let algorithm = run(tree, "B", AlignmentConfig::new(1, 0));
        let best = algorithm.best_mapping().unwrap();
        assert!(best.is_empty());
        assert_eq!(best.score(), -1.0);
        assert_eq!(best.tree_deletions(), 1);
        assert!(best.leaf_positions().is_empty());
    }

    #[test]
    fn test_closure_scoring() {
        let tree = flat_tree(NodeKind::OrderFixed, "A B");
        let scoring = FnScoring::new(
            |leaf: &GeneGroup, element: &GeneGroup| {
                if leaf.catalog_id() == element.catalog_id() {
                    2.0
                } else {
                    -0.5
                }
            },
            |_: &GeneGroup| 0.0,
        );
        let mut algorithm =
            NodeMappingAlgorithm::new(genes("A C"), tree, AlignmentConfig::default(), scoring)
                .unwrap();
        algorithm.run_algorithm();
        let best = algorithm.best_mapping().unwrap();
        assert_eq!(best.score(), 1.5);
        assert_eq!((best.start(), best.end()), (1, 2));
    }

    #[test]
    fn test_threshold_filters_mappings() {
        let tree = flat_tree(NodeKind::OrderFixed, "A B");
        let algorithm = run(tree, "A B Y A", AlignmentConfig::new(1, 0));
        let all = algorithm.all_mappings(f64::NEG_INFINITY);
        // [1,2] with score 2, and single-leaf matches at 1, 2 and 4 with one deletion
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].score(), 2.0);
        assert_eq!(algorithm.all_mappings(1.0).len(), 1);
        assert!(algorithm.all_mappings(2.0).is_empty());
    }
}
