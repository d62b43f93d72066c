use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use pqalign::report::write_mappings;
use pqalign::scoring::{ExactMatchScoring, ScoringPolicy, SubstitutionMatrix};
use pqalign::sequence_io::{parse_genes, read_genes};
use pqalign::tree_parser::{parse_tree, read_tree_json};
use pqalign::{AlignmentConfig, Mapping, NodeMappingAlgorithm, OutputMode};

/// pqalign - Align a PQ-tree of gene groups against a gene sequence
///
/// Finds the substrings of the sequence that the tree can derive, allowing a
/// bounded number of deleted leaves and deleted genes.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(group(clap::ArgGroup::new("tree_input").required(true).args(["tree", "tree_json"])))]
#[clap(group(clap::ArgGroup::new("gene_input").required(true).args(["genes", "genes_file"])))]
struct Args {
    /// PQ-tree in parenthesis notation, e.g. "[A+ (B- C+) D+]"
    #[clap(short = 'p', long = "tree")]
    tree: Option<String>,

    /// PQ-tree as a JSON file
    #[clap(short = 'j', long = "tree-json")]
    tree_json: Option<String>,

    /// Gene sequence as whitespace separated labels
    #[clap(short = 'g', long = "genes")]
    genes: Option<String>,

    /// Gene sequence file (JSON array or whitespace separated text)
    #[clap(long = "genes-file")]
    genes_file: Option<String>,

    /// Substitution matrix file with "<id> <id> <score>" lines
    #[clap(short = 'm', long = "matrix")]
    matrix: Option<String>,

    /// Maximum number of deleted tree leaves
    #[clap(long = "dt", alias = "tree-deletions", default_value = "0")]
    tree_deletions: usize,

    /// Maximum number of deleted genes inside a match
    #[clap(long = "ds", alias = "string-deletions", default_value = "0")]
    string_deletions: usize,

    /// Cost of deleting one leaf or one gene
    #[clap(long = "deletion-cost", default_value = "0")]
    deletion_cost: f64,

    /// Which mappings to report
    #[clap(short = 'o', long = "output", value_enum, default_value_t = OutputMode::Best)]
    output: OutputMode,

    /// Only report mappings scoring above this value (all and distinct modes)
    #[clap(long = "threshold", default_value_t = f64::NEG_INFINITY, allow_negative_numbers = true)]
    threshold: f64,

    /// Number of threads
    #[clap(short = 't', long = "threads", default_value = "1")]
    threads: usize,

    /// Only log warnings and errors
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    if !args.deletion_cost.is_finite() || args.deletion_cost < 0.0 {
        anyhow::bail!(
            "Deletion cost must be finite and non-negative, got {}",
            args.deletion_cost
        );
    }

    // Set up rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()?;

    let tree = if let Some(text) = &args.tree {
        parse_tree(text).context("Failed to parse tree")?
    } else if let Some(path) = &args.tree_json {
        read_tree_json(path).with_context(|| format!("Failed to read tree from {path}"))?
    } else {
        anyhow::bail!("A tree is required (--tree or --tree-json)");
    };
    let genes = if let Some(text) = &args.genes {
        parse_genes(text).context("Failed to parse genes")?
    } else if let Some(path) = &args.genes_file {
        read_genes(path).with_context(|| format!("Failed to read genes from {path}"))?
    } else {
        anyhow::bail!("A gene sequence is required (--genes or --genes-file)");
    };

    let scoring: Box<dyn ScoringPolicy> = match &args.matrix {
        Some(path) => Box::new(
            SubstitutionMatrix::from_file(path, args.deletion_cost)
                .with_context(|| format!("Failed to load substitution matrix {path}"))?,
        ),
        None => Box::new(ExactMatchScoring::new(args.deletion_cost)),
    };

    info!("Tree: {tree}");
    let config = AlignmentConfig::new(args.tree_deletions, args.string_deletions);
    let mut algorithm = NodeMappingAlgorithm::new(genes, tree, config, scoring)?;
    algorithm.run_algorithm();

    let mappings: Vec<&Mapping> = match args.output {
        OutputMode::Best => algorithm.best_mapping().into_iter().collect(),
        OutputMode::All => algorithm.all_mappings(args.threshold),
        OutputMode::Distinct => algorithm.best_distinct_mappings(args.threshold),
    };
    info!("Reporting {} mapping(s) in {} mode", mappings.len(), args.output);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_mappings(&mut out, &mappings, algorithm.tree(), algorithm.sequence())?;
    out.flush()?;

    Ok(())
}
