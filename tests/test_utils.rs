#![allow(dead_code)]

/// Utility functions for testing
use pqalign::scoring::ScoringPolicy;
use pqalign::sequence_io::parse_genes;
use pqalign::tree_parser::parse_tree;
use pqalign::{
    AlignmentConfig, ExactMatchScoring, GeneGroup, Mapping, NodeMappingAlgorithm, PqTree, Strand,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;

/// Deletion cost used by the exact-match helpers; exact in binary so sums compare exactly
pub const DELETION_COST: f64 = 0.5;

pub fn genes(labels: &str) -> Vec<GeneGroup> {
    parse_genes(labels).expect("valid gene labels")
}

pub fn tree(text: &str) -> PqTree {
    parse_tree(text).expect("valid tree")
}

/// Run the engine under exact-match scoring with [`DELETION_COST`]
pub fn align(tree_text: &str, genes_text: &str, config: AlignmentConfig) -> NodeMappingAlgorithm {
    align_with(tree(tree_text), genes(genes_text), config)
}

pub fn align_with(
    tree: PqTree,
    sequence: Vec<GeneGroup>,
    config: AlignmentConfig,
) -> NodeMappingAlgorithm {
    let mut algorithm = NodeMappingAlgorithm::new(
        sequence,
        tree,
        config,
        ExactMatchScoring::new(DELETION_COST),
    )
    .expect("valid alignment input");
    algorithm.run_algorithm();
    algorithm
}

pub fn best_score(algorithm: &NodeMappingAlgorithm) -> f64 {
    algorithm
        .best_mapping()
        .map(Mapping::score)
        .unwrap_or(f64::NEG_INFINITY)
}

/// Random genes over `alphabet`, each on a random strand
pub fn random_genes(rng: &mut StdRng, len: usize, alphabet: &[&str]) -> Vec<GeneGroup> {
    (0..len)
        .map(|_| {
            let id = alphabet[rng.gen_range(0..alphabet.len())];
            let strand = if rng.gen_bool(0.5) {
                Strand::Plus
            } else {
                Strand::Minus
            };
            GeneGroup::new(id, strand)
        })
        .collect()
}

/// Random tree in parenthesis notation over the given leaves, in their order
pub fn random_tree_text(rng: &mut StdRng, leaves: &[GeneGroup]) -> String {
    if leaves.len() == 1 && rng.gen_bool(0.7) {
        return leaves[0].to_string();
    }

    let groups = rng.gen_range(1..=leaves.len().min(4));
    let mut cuts: Vec<usize> = (1..leaves.len()).collect();
    cuts.shuffle(rng);
    cuts.truncate(groups - 1);
    cuts.sort_unstable();

    let mut children = Vec::new();
    let mut from = 0;
    for cut in cuts.into_iter().chain(std::iter::once(leaves.len())) {
        children.push(random_tree_text(rng, &leaves[from..cut]));
        from = cut;
    }

    let (open, close) = if rng.gen_bool(0.5) {
        ('[', ']')
    } else {
        ('(', ')')
    };
    format!("{open}{}{close}", children.join(" "))
}

/// Recompute a mapping's score from its leaves and deletions
pub fn recomputed_score(
    mapping: &Mapping,
    tree: &PqTree,
    sequence: &[GeneGroup],
    scoring: &dyn ScoringPolicy,
) -> f64 {
    let mut score = 0.0;
    collect_substitutions(mapping, tree, sequence, scoring, &mut score);
    for &leaf in mapping.deleted_leaves() {
        score -= scoring.deletion_cost(tree.label(leaf).expect("deleted leaves are leaves"));
    }
    for &position in mapping.deleted_positions() {
        score -= scoring.deletion_cost(&sequence[position - 1]);
    }
    score
}

fn collect_substitutions(
    mapping: &Mapping,
    tree: &PqTree,
    sequence: &[GeneGroup],
    scoring: &dyn ScoringPolicy,
    score: &mut f64,
) {
    if mapping.is_leaf() {
        let label = tree.label(mapping.node()).expect("leaf mapping on a leaf");
        let label = if mapping.is_reversed() {
            label.reversed()
        } else {
            label.clone()
        };
        *score += scoring.substitution(&label, &sequence[mapping.start() - 1]);
        return;
    }
    for child in mapping.children() {
        collect_substitutions(child, tree, sequence, scoring, score);
    }
}
