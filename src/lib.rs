// Library exports for pqalign
pub mod config;
pub mod error;
pub mod gene_group;
pub mod mapping;
pub mod node_mapping;
mod node_table;
mod order_fixed;
pub mod order_free;
pub mod pq_tree;
pub mod report;
pub mod scoring;
pub mod sequence_io;
pub mod tree_parser;

pub use config::{AlignmentConfig, OutputMode};
pub use error::{Error, Result};
pub use gene_group::{GeneGroup, Strand};
pub use mapping::Mapping;
pub use node_mapping::{NodeMappingAlgorithm, ResultTable};
pub use pq_tree::{Node, NodeId, NodeKind, PqTree, PqTreeBuilder};
pub use scoring::{ExactMatchScoring, FnScoring, ScoringPolicy, SubstitutionMatrix};
