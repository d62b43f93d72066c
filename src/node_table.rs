/// Per-node dynamic programming tables
///
/// A subtree with `k` leaves matched with `t` tree deletions and `s` string
/// deletions always covers `k - t + s` positions, so the end point together
/// with both deletion counts determines the whole span. Tables are keyed by
/// that triple and keep only the best-scoring entry per key.
use std::collections::BTreeMap;

use crate::config::AlignmentConfig;
use crate::gene_group::GeneGroup;
use crate::pq_tree::{NodeId, PqTree};
use crate::scoring::ScoringPolicy;

/// Strand orientation a subtree is read in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Context {
    Forward,
    Reverse,
}

impl Context {
    pub(crate) const BOTH: [Context; 2] = [Context::Forward, Context::Reverse];

    pub(crate) fn index(self) -> usize {
        match self {
            Context::Forward => 0,
            Context::Reverse => 1,
        }
    }
}

/// (end point, tree deletions, string deletions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct StateKey {
    pub end: usize,
    pub tree_deletions: usize,
    pub string_deletions: usize,
}

/// One step of an internal node's derivation, in sequence order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Part {
    /// Child at `child` (index among the node's children) matched by the entry
    /// stored under `key` in its table for `context`
    Matched {
        child: usize,
        context: Context,
        key: StateKey,
    },
    /// Whole child subtree deleted
    Deleted { child: usize },
    /// Sequence positions `start..=end` deleted
    Gap { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub start: usize,
    pub key: StateKey,
    pub score: f64,
    /// Orientation the node's children (or the leaf label) are read in
    pub orientation: Context,
    /// Empty for leaves
    pub parts: Vec<Part>,
}

/// Finished table of one node in one context
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeTable {
    entries: BTreeMap<StateKey, Entry>,
    by_start: BTreeMap<usize, Vec<StateKey>>,
}

impl NodeTable {
    pub(crate) fn get(&self, key: &StateKey) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    /// Entries whose span begins at `start`
    pub(crate) fn starting_at(&self, start: usize) -> impl Iterator<Item = &Entry> {
        self.by_start
            .get(&start)
            .into_iter()
            .flatten()
            .filter_map(|key| self.entries.get(key))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Collects candidate entries, keeping the best score per key
#[derive(Debug, Default)]
pub(crate) struct TableBuilder {
    entries: BTreeMap<StateKey, Entry>,
}

impl TableBuilder {
    /// Ties keep the entry offered first.
    pub(crate) fn offer(&mut self, entry: Entry) {
        if !entry.score.is_finite() {
            return;
        }
        match self.entries.get(&entry.key) {
            Some(existing) if existing.score >= entry.score => {}
            _ => {
                self.entries.insert(entry.key, entry);
            }
        }
    }

    pub(crate) fn finish(self) -> NodeTable {
        let mut by_start: BTreeMap<usize, Vec<StateKey>> = BTreeMap::new();
        for (key, entry) in &self.entries {
            by_start.entry(entry.start).or_default().push(*key);
        }
        NodeTable {
            entries: self.entries,
            by_start,
        }
    }
}

/// Leaf base case: every sequence position the label substitutes into
pub(crate) fn leaf_table(
    label: &GeneGroup,
    context: Context,
    sequence: &[GeneGroup],
    scoring: &dyn ScoringPolicy,
) -> NodeTable {
    let label = match context {
        Context::Forward => label.clone(),
        Context::Reverse => label.reversed(),
    };

    let mut builder = TableBuilder::default();
    for (index, element) in sequence.iter().enumerate() {
        let position = index + 1;
        builder.offer(Entry {
            start: position,
            key: StateKey {
                end: position,
                tree_deletions: 0,
                string_deletions: 0,
            },
            score: scoring.substitution(&label, element),
            orientation: context,
            parts: Vec::new(),
        });
    }
    builder.finish()
}

/// Shared read-only inputs of the child combination routines
pub(crate) struct Combiner<'a> {
    pub tree: &'a PqTree,
    pub config: AlignmentConfig,
    /// Deletion cost of each sequence element, 0-based
    pub element_costs: &'a [f64],
    /// Cost of deleting every leaf below each node, by node index
    pub subtree_costs: &'a [f64],
}

impl Combiner<'_> {
    pub(crate) fn sequence_len(&self) -> usize {
        self.element_costs.len()
    }

    /// Cost of deleting positions `start..=end` (1-based)
    pub(crate) fn gap_cost(&self, start: usize, end: usize) -> f64 {
        if end < start {
            return 0.0;
        }
        self.element_costs[start - 1..end].iter().sum()
    }
}

/// Partial cover of a node's children during combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Frontier {
    /// Nothing matched yet, only whole-child deletions
    Empty { tree_deletions: usize },
    /// Matched span ending at `key.end`
    Open(StateKey),
}

impl Frontier {
    pub(crate) fn tree_deletions(&self) -> usize {
        match self {
            Frontier::Empty { tree_deletions } => *tree_deletions,
            Frontier::Open(key) => key.tree_deletions,
        }
    }
}

/// DP cell of a combination in progress
#[derive(Debug, Clone)]
pub(crate) struct Cell {
    pub score: f64,
    pub start: usize,
    /// Predecessor layer and state
    pub back: Option<(usize, Frontier)>,
    /// Parts appended by the transition into this cell
    pub steps: Vec<Part>,
}

pub(crate) type Layer = BTreeMap<Frontier, Cell>;

/// Keep `cell` under `frontier` unless an equal or better one is already there
pub(crate) fn relax(layer: &mut Layer, frontier: Frontier, cell: Cell) {
    match layer.get(&frontier) {
        Some(existing) if existing.score >= cell.score => {}
        _ => {
            layer.insert(frontier, cell);
        }
    }
}

/// Parts of the derivation ending in `frontier` of `layers[layer]`, in sequence order
pub(crate) fn backtrack(layers: &[Layer], layer: usize, frontier: Frontier) -> Vec<Part> {
    let mut chunks = Vec::new();
    let mut current = Some((layer, frontier));
    while let Some((layer, frontier)) = current {
        let Some(cell) = layers[layer].get(&frontier) else {
            break;
        };
        chunks.push(cell.steps.as_slice());
        current = cell.back;
    }
    chunks.into_iter().rev().flatten().cloned().collect()
}

/// A child of the node being combined, with both of its finished tables
pub(crate) struct ChildSlot<'a> {
    /// Index among the node's children
    pub position: usize,
    pub node: NodeId,
    pub tables: &'a [NodeTable; 2],
}

/// One way to extend a frontier by a child
pub(crate) struct Extension {
    pub frontier: Frontier,
    pub start: usize,
    pub score_delta: f64,
    pub steps: Vec<Part>,
}

/// Every budget-respecting way to place `slot` right after `frontier`:
/// delete it entirely, or match one of its entries, leaving a gap of deleted
/// positions when the frontier already holds a matched span.
pub(crate) fn extensions(
    cx: &Combiner,
    frontier: Frontier,
    start: usize,
    slot: &ChildSlot,
    context: Context,
) -> Vec<Extension> {
    let config = cx.config;
    let table = &slot.tables[context.index()];
    let child = slot.position;
    let mut result = Vec::new();

    let deleted = frontier.tree_deletions() + cx.tree.leaf_count(slot.node);
    if deleted <= config.tree_deletion_limit {
        let frontier = match frontier {
            Frontier::Empty { .. } => Frontier::Empty {
                tree_deletions: deleted,
            },
            Frontier::Open(key) => Frontier::Open(StateKey {
                tree_deletions: deleted,
                ..key
            }),
        };
        result.push(Extension {
            frontier,
            start,
            score_delta: -cx.subtree_costs[slot.node.index()],
            steps: vec![Part::Deleted { child }],
        });
    }

    match frontier {
        Frontier::Empty { tree_deletions } => {
            for entry in table.iter() {
                let t = tree_deletions + entry.key.tree_deletions;
                let s = entry.key.string_deletions;
                if !config.allows(t, s) {
                    continue;
                }
                result.push(Extension {
                    frontier: Frontier::Open(StateKey {
                        end: entry.key.end,
                        tree_deletions: t,
                        string_deletions: s,
                    }),
                    start: entry.start,
                    score_delta: entry.score,
                    steps: vec![Part::Matched {
                        child,
                        context,
                        key: entry.key,
                    }],
                });
            }
        }
        Frontier::Open(key) => {
            let spare = config.string_deletion_limit - key.string_deletions;
            for gap in 0..=spare {
                let next = key.end + 1 + gap;
                if next > cx.sequence_len() {
                    break;
                }
                let gap_cost = cx.gap_cost(key.end + 1, key.end + gap);
                for entry in table.starting_at(next) {
                    let t = key.tree_deletions + entry.key.tree_deletions;
                    let s = key.string_deletions + gap + entry.key.string_deletions;
                    if !config.allows(t, s) {
                        continue;
                    }
                    let mut steps = Vec::with_capacity(2);
                    if gap > 0 {
                        steps.push(Part::Gap {
                            start: key.end + 1,
                            end: key.end + gap,
                        });
                    }
                    steps.push(Part::Matched {
                        child,
                        context,
                        key: entry.key,
                    });
                    result.push(Extension {
                        frontier: Frontier::Open(StateKey {
                            end: entry.key.end,
                            tree_deletions: t,
                            string_deletions: s,
                        }),
                        start,
                        score_delta: entry.score - gap_cost,
                        steps,
                    });
                }
            }
        }
    }
    result
}

/// Turn the finished frontiers of the last layer into table entries
pub(crate) fn offer_open_frontiers(
    builder: &mut TableBuilder,
    layers: &[Layer],
    layer: usize,
    orientation: Context,
) {
    for (frontier, cell) in &layers[layer] {
        if let Frontier::Open(key) = *frontier {
            builder.offer(Entry {
                start: cell.start,
                key,
                score: cell.score,
                orientation,
                parts: backtrack(layers, layer, *frontier),
            });
        }
    }
}
