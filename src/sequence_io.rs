//! Loading gene sequences from command line text or from files.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::gene_group::GeneGroup;

/// Parse whitespace separated gene labels, e.g. `COG0001+ COG0002- COG0003`.
pub fn parse_genes(input: &str) -> Result<Vec<GeneGroup>> {
    let genes = input
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<Vec<GeneGroup>>>()?;
    if genes.is_empty() {
        return Err(Error::EmptySequence);
    }
    Ok(genes)
}

/// Parse a sequence file: either a JSON array of labels or plain text with
/// whitespace separated labels, where lines starting with `#` are comments.
pub fn parse_genes_file_content(content: &str) -> Result<Vec<GeneGroup>> {
    if content.trim_start().starts_with('[') {
        let labels: Vec<String> = serde_json::from_str(content)?;
        let genes = labels
            .iter()
            .map(|label| label.parse())
            .collect::<Result<Vec<GeneGroup>>>()?;
        if genes.is_empty() {
            return Err(Error::EmptySequence);
        }
        return Ok(genes);
    }

    let text: String = content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");
    parse_genes(&text)
}

pub fn read_genes<P: AsRef<Path>>(path: P) -> Result<Vec<GeneGroup>> {
    let content = fs::read_to_string(path.as_ref())?;
    let genes = parse_genes_file_content(&content)?;
    debug!(
        "Loaded {} genes from {}",
        genes.len(),
        path.as_ref().display()
    );
    Ok(genes)
}
