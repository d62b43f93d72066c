/// Human-readable rendering of alignment results
use std::io::{self, Write};

use crate::gene_group::GeneGroup;
use crate::mapping::Mapping;
use crate::pq_tree::PqTree;

/// Write every mapping, separated by blank lines, or a notice when there is none.
pub fn write_mappings<W: Write>(
    out: &mut W,
    mappings: &[&Mapping],
    tree: &PqTree,
    sequence: &[GeneGroup],
) -> io::Result<()> {
    if mappings.is_empty() {
        writeln!(out, "No mapping found.")?;
        return Ok(());
    }
    for mapping in mappings {
        write_mapping(out, mapping, tree, sequence)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_mapping<W: Write>(
    out: &mut W,
    mapping: &Mapping,
    tree: &PqTree,
    sequence: &[GeneGroup],
) -> io::Result<()> {
    writeln!(out, "Derivation score: {}", mapping.score())?;

    if mapping.is_empty() {
        writeln!(out, "The derived substring is empty")?;
    } else {
        let substring: Vec<String> = sequence[mapping.start() - 1..mapping.end()]
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(
            out,
            "The derived substring is S[{}:{}] = {}",
            mapping.start(),
            mapping.end(),
            substring.join(",")
        )?;
    }

    writeln!(out, "The one-to-one mapping:")?;
    for (leaf, position) in mapping.leaf_positions() {
        let label = tree
            .label(leaf)
            .map(ToString::to_string)
            .unwrap_or_default();
        writeln!(
            out,
            "  {} -> {} at index {}",
            label,
            sequence[position - 1],
            position
        )?;
    }

    let deleted_positions = mapping.deleted_positions();
    if deleted_positions.is_empty() {
        writeln!(out, "No genes deleted in the derivation.")?;
    } else {
        writeln!(
            out,
            "{} gene(s) deleted in the derivation:",
            deleted_positions.len()
        )?;
        for &position in deleted_positions {
            writeln!(out, "  {} at index {}", sequence[position - 1], position)?;
        }
    }

    let deleted_leaves = mapping.deleted_leaves();
    if deleted_leaves.is_empty() {
        writeln!(out, "No leaves deleted in the derivation.")?;
    } else {
        let labels: Vec<String> = deleted_leaves
            .iter()
            .filter_map(|&leaf| tree.label(leaf))
            .map(ToString::to_string)
            .collect();
        writeln!(
            out,
            "{} leaf(s) deleted in the derivation:",
            deleted_leaves.len()
        )?;
        writeln!(out, "  {}", labels.join(", "))?;
    }

    writeln!(
        out,
        "Orientation: {}",
        if mapping.is_reversed() {
            "reversed"
        } else {
            "forward"
        }
    )
}
