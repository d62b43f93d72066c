//! Scoring policies: substitution scores between tree leaves and sequence
//! elements, and deletion costs for leaves and elements.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::debug;
use nom::{
    bytes::complete::take_till1,
    character::complete::{space0, space1},
    combinator::all_consuming,
    number::complete::double,
    sequence::{terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::gene_group::GeneGroup;

/// Scoring used by the alignment engine.
///
/// Scores are opaque to the engine. A non-finite substitution score means the
/// leaf cannot be matched to the element. Deletion costs are expected to be
/// finite and non-negative; they are subtracted from the score.
pub trait ScoringPolicy: Send + Sync {
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64;

    /// Cost of deleting a tree leaf with this label, or a sequence element.
    fn deletion_cost(&self, gene: &GeneGroup) -> f64;
}

impl<P: ScoringPolicy + ?Sized> ScoringPolicy for Arc<P> {
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64 {
        (**self).substitution(leaf, element)
    }

    fn deletion_cost(&self, gene: &GeneGroup) -> f64 {
        (**self).deletion_cost(gene)
    }
}

impl<P: ScoringPolicy + ?Sized> ScoringPolicy for Box<P> {
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64 {
        (**self).substitution(leaf, element)
    }

    fn deletion_cost(&self, gene: &GeneGroup) -> f64 {
        (**self).deletion_cost(gene)
    }
}

/// Scores `1.0` for identical genes and forbids every other substitution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatchScoring {
    pub deletion_cost: f64,
}

impl ExactMatchScoring {
    pub fn new(deletion_cost: f64) -> Self {
        Self { deletion_cost }
    }
}

impl ScoringPolicy for ExactMatchScoring {
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64 {
        if leaf == element {
            1.0
        } else {
            f64::NEG_INFINITY
        }
    }

    fn deletion_cost(&self, _gene: &GeneGroup) -> f64 {
        self.deletion_cost
    }
}

/// Scoring policy assembled from two closures.
pub struct FnScoring<S, D> {
    substitution: S,
    deletion: D,
}

impl<S, D> FnScoring<S, D>
where
    S: Fn(&GeneGroup, &GeneGroup) -> f64 + Send + Sync,
    D: Fn(&GeneGroup) -> f64 + Send + Sync,
{
    pub fn new(substitution: S, deletion: D) -> Self {
        Self {
            substitution,
            deletion,
        }
    }
}

impl<S, D> ScoringPolicy for FnScoring<S, D>
where
    S: Fn(&GeneGroup, &GeneGroup) -> f64 + Send + Sync,
    D: Fn(&GeneGroup) -> f64 + Send + Sync,
{
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64 {
        (self.substitution)(leaf, element)
    }

    fn deletion_cost(&self, gene: &GeneGroup) -> f64 {
        (self.deletion)(gene)
    }
}

/// Substitution scores between catalog ids, read from a whitespace separated
/// table with one `<id_a> <id_b> <score>` entry per line.
///
/// Entries are symmetric. Genes on different strands never substitute, and
/// identical catalog ids missing from the table score `1.0`.
#[derive(Debug, Clone, Default)]
pub struct SubstitutionMatrix {
    scores: HashMap<(String, String), f64>,
    deletion_cost: f64,
}

impl SubstitutionMatrix {
    pub fn from_file<P: AsRef<Path>>(path: P, deletion_cost: f64) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let matrix = Self::parse(&content, deletion_cost)?;
        debug!(
            "Loaded {} substitution scores from {}",
            matrix.len(),
            path.as_ref().display()
        );
        Ok(matrix)
    }

    pub fn parse(input: &str, deletion_cost: f64) -> Result<Self> {
        let mut scores = HashMap::new();
        for (index, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (_, (a, b, score)) = parse_matrix_line(line).map_err(|_| Error::Matrix {
                line: index + 1,
                reason: format!("expected '<id> <id> <score>', got '{line}'"),
            })?;
            if score.is_nan() {
                return Err(Error::Matrix {
                    line: index + 1,
                    reason: "score is NaN".to_string(),
                });
            }
            scores.insert(ordered_pair(a, b), score);
        }
        Ok(Self {
            scores,
            deletion_cost,
        })
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Score between two catalog ids, ignoring strands.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        match self.scores.get(&ordered_pair(a, b)) {
            Some(&score) => score,
            None if a == b => 1.0,
            None => f64::NEG_INFINITY,
        }
    }
}

impl ScoringPolicy for SubstitutionMatrix {
    fn substitution(&self, leaf: &GeneGroup, element: &GeneGroup) -> f64 {
        if leaf.strand() != element.strand() {
            return f64::NEG_INFINITY;
        }
        self.score(leaf.catalog_id(), element.catalog_id())
    }

    fn deletion_cost(&self, _gene: &GeneGroup) -> f64 {
        self.deletion_cost
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn parse_token(input: &str) -> IResult<&str, &str> {
    take_till1(char::is_whitespace)(input)
}

fn parse_matrix_line(input: &str) -> IResult<&str, (&str, &str, f64)> {
    all_consuming(tuple((
        terminated(parse_token, space1),
        terminated(parse_token, space1),
        terminated(double, space0),
    )))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(label: &str) -> GeneGroup {
        label.parse().unwrap()
    }

    #[test]
    fn exact_match_scoring() {
        let scoring = ExactMatchScoring::new(0.5);
        assert_eq!(scoring.substitution(&gene("A+"), &gene("A+")), 1.0);
        assert_eq!(
            scoring.substitution(&gene("A+"), &gene("A-")),
            f64::NEG_INFINITY
        );
        assert_eq!(scoring.deletion_cost(&gene("A+")), 0.5);
    }

    #[test]
    fn fn_scoring_delegates_to_closures() {
        let scoring = FnScoring::new(
            |leaf: &GeneGroup, element: &GeneGroup| {
                if leaf.catalog_id() == element.catalog_id() {
                    2.0
                } else {
                    -1.0
                }
            },
            |_: &GeneGroup| 0.25,
        );
        assert_eq!(scoring.substitution(&gene("A+"), &gene("A-")), 2.0);
        assert_eq!(scoring.substitution(&gene("A+"), &gene("B+")), -1.0);
        assert_eq!(scoring.deletion_cost(&gene("B+")), 0.25);
    }

    #[test]
    fn matrix_is_symmetric() {
        let matrix = SubstitutionMatrix::parse(
            "# cog scores\nCOG1 COG2 0.5\nCOG3\tCOG1\t-2\n\n",
            0.0,
        )
        .unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.score("COG1", "COG2"), 0.5);
        assert_eq!(matrix.score("COG2", "COG1"), 0.5);
        assert_eq!(matrix.score("COG1", "COG3"), -2.0);
        assert_eq!(matrix.score("COG4", "COG4"), 1.0);
        assert_eq!(matrix.score("COG4", "COG5"), f64::NEG_INFINITY);
    }

    #[test]
    fn matrix_requires_matching_strands() {
        let matrix = SubstitutionMatrix::parse("COG1 COG2 0.5", 0.0).unwrap();
        assert_eq!(matrix.substitution(&gene("COG1+"), &gene("COG2+")), 0.5);
        assert_eq!(
            matrix.substitution(&gene("COG1+"), &gene("COG2-")),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn matrix_reports_bad_lines() {
        let err = SubstitutionMatrix::parse("COG1 COG2 0.5\nCOG1 COG2\n", 0.0).unwrap_err();
        match err {
            Error::Matrix { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(SubstitutionMatrix::parse("COG1 COG2 high", 0.0).is_err());
    }

    #[test]
    fn matrix_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "A B 3\n").unwrap();
        let matrix = SubstitutionMatrix::from_file(file.path(), 1.0).unwrap();
        assert_eq!(matrix.score("B", "A"), 3.0);
        assert_eq!(matrix.deletion_cost(&gene("A")), 1.0);
    }
}
