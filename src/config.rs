/// Run configuration shared by the library and the command line
use std::fmt;

/// Deletion budgets for one alignment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentConfig {
    /// Maximum number of tree leaves that may be left unmatched
    pub tree_deletion_limit: usize,
    /// Maximum number of sequence positions inside a match that may be skipped
    pub string_deletion_limit: usize,
}

impl AlignmentConfig {
    pub fn new(tree_deletion_limit: usize, string_deletion_limit: usize) -> Self {
        Self {
            tree_deletion_limit,
            string_deletion_limit,
        }
    }

    /// Whether a (tree, string) deletion count fits both budgets
    pub fn allows(&self, tree_deletions: usize, string_deletions: usize) -> bool {
        tree_deletions <= self.tree_deletion_limit && string_deletions <= self.string_deletion_limit
    }
}

/// Which mappings get reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// The single best mapping
    #[default]
    Best,
    /// Every mapping above the threshold
    All,
    /// The best mapping per distinct region of the sequence
    Distinct,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Best => write!(f, "best"),
            OutputMode::All => write!(f, "all"),
            OutputMode::Distinct => write!(f, "distinct"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_checks() {
        let config = AlignmentConfig::new(1, 2);
        assert!(config.allows(0, 0));
        assert!(config.allows(1, 2));
        assert!(!config.allows(2, 0));
        assert!(!config.allows(0, 3));
    }
}
