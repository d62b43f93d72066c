//! Gene labels: a catalog id (e.g. a COG) together with a strand orientation.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Strand orientation of a gene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Plus => '+',
            Self::Minus => '-',
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Plus => Self::Minus,
            Self::Minus => Self::Plus,
        }
    }

    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Plus),
            '-' => Some(Self::Minus),
            _ => None,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A gene identified by its catalog id and strand.
///
/// Used both as the label of a tree leaf and as an element of the gene sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneGroup {
    catalog_id: String,
    strand: Strand,
}

impl GeneGroup {
    pub fn new(catalog_id: impl Into<String>, strand: Strand) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            strand,
        }
    }

    pub fn catalog_id(&self) -> &str {
        &self.catalog_id
    }

    pub fn strand(&self) -> Strand {
        self.strand
    }

    /// The same gene read from the opposite strand.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            catalog_id: self.catalog_id.clone(),
            strand: self.strand.reversed(),
        }
    }
}

impl FromStr for GeneGroup {
    type Err = Error;

    /// A trailing `+` or `-` is the strand. Without one, the whole text is the
    /// catalog id and the gene is on the plus strand.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err(Error::InvalidLabel(s.to_string()));
        };

        let (catalog_id, strand) = match Strand::from_symbol(last) {
            Some(strand) => (&s[..s.len() - last.len_utf8()], strand),
            None => (s, Strand::Plus),
        };

        if catalog_id.is_empty() || catalog_id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidLabel(s.to_string()));
        }

        Ok(Self::new(catalog_id, strand))
    }
}

impl fmt::Display for GeneGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.catalog_id, self.strand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_strand_suffix() {
        let plus: GeneGroup = "COG0001+".parse().unwrap();
        assert_eq!(plus.catalog_id(), "COG0001");
        assert_eq!(plus.strand(), Strand::Plus);

        let minus: GeneGroup = "COG0002-".parse().unwrap();
        assert_eq!(minus.catalog_id(), "COG0002");
        assert_eq!(minus.strand(), Strand::Minus);
    }

    #[test]
    fn parse_without_suffix_defaults_to_plus() {
        let gene: GeneGroup = "COG0003".parse().unwrap();
        assert_eq!(gene.catalog_id(), "COG0003");
        assert_eq!(gene.strand(), Strand::Plus);
    }

    #[test]
    fn parse_rejects_empty_labels() {
        assert!("".parse::<GeneGroup>().is_err());
        assert!("+".parse::<GeneGroup>().is_err());
        assert!("-".parse::<GeneGroup>().is_err());
    }

    #[test]
    fn equality_includes_strand() {
        let a: GeneGroup = "X+".parse().unwrap();
        let b: GeneGroup = "X-".parse().unwrap();
        assert_ne!(a, b);
        assert_eq!(a, b.reversed());
    }

    #[test]
    fn display_round_trip() {
        for label in ["COG1+", "COG2-", "abc+"] {
            let gene: GeneGroup = label.parse().unwrap();
            assert_eq!(gene.to_string(), label);
        }
        let gene: GeneGroup = "abc".parse().unwrap();
        assert_eq!(gene.to_string(), "abc+");
    }
}
