//! Loading PQ-trees from parenthesis notation and from JSON.
//!
//! Parenthesis notation writes order-fixed nodes as `[ .. ]` and order-free
//! nodes as `( .. )`. Leaves are gene labels separated by whitespace or
//! commas, e.g. `[A+ (B- C+) D+]`. A single label is a one-leaf tree.
//!
//! JSON trees use a `type` tag:
//! `{"type": "Q", "children": [{"type": "leaf", "label": "COG0001+"}, ..]}`.

use std::fs;
use std::path::Path;

use log::debug;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, multispace0, multispace1},
    combinator::map,
    multi::{many0, many0_count},
    sequence::{delimited, preceded, terminated},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::{translate_nom_error, Error, Result};
use crate::gene_group::GeneGroup;
use crate::pq_tree::{Node, NodeId, NodeKind, PqTree, PqTreeBuilder};

/// Tree as written in the input, before labels are validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawNode {
    #[serde(rename = "leaf")]
    Leaf { label: String },
    #[serde(rename = "Q")]
    OrderFixed { children: Vec<RawNode> },
    #[serde(rename = "P")]
    OrderFree { children: Vec<RawNode> },
}

impl RawNode {
    /// Inverse of [`build_tree`], used to export trees as JSON.
    pub fn from_tree(tree: &PqTree) -> Self {
        Self::from_node(tree, tree.root())
    }

    fn from_node(tree: &PqTree, id: NodeId) -> Self {
        match tree.node(id) {
            Node::Leaf(label) => RawNode::Leaf {
                label: label.to_string(),
            },
            Node::Internal { kind, children } => {
                let children = children
                    .iter()
                    .map(|&child| Self::from_node(tree, child))
                    .collect();
                match kind {
                    NodeKind::OrderFixed => RawNode::OrderFixed { children },
                    NodeKind::OrderFree => RawNode::OrderFree { children },
                }
            }
        }
    }
}

/// Parse a tree written in parenthesis notation.
pub fn parse_tree(input: &str) -> Result<PqTree> {
    let (rest, raw) = preceded(multispace0, terminated(parse_node, multispace0))(input)
        .map_err(translate_nom_error)?;
    if !rest.is_empty() {
        return Err(Error::TrailingInput(rest.to_string()));
    }
    build_tree(&raw)
}

pub fn parse_tree_json(input: &str) -> Result<PqTree> {
    let raw: RawNode = serde_json::from_str(input)?;
    build_tree(&raw)
}

pub fn read_tree_json<P: AsRef<Path>>(path: P) -> Result<PqTree> {
    let content = fs::read_to_string(path.as_ref())?;
    let tree = parse_tree_json(&content)?;
    debug!(
        "Loaded tree with {} leaves from {}",
        tree.leaf_count(tree.root()),
        path.as_ref().display()
    );
    Ok(tree)
}

/// Validate labels and node shapes and assemble the arena tree.
pub fn build_tree(raw: &RawNode) -> Result<PqTree> {
    let mut builder = PqTreeBuilder::new();
    let root = add_node(&mut builder, raw)?;
    builder.build(root)
}

fn add_node(builder: &mut PqTreeBuilder, raw: &RawNode) -> Result<NodeId> {
    let (kind, children) = match raw {
        RawNode::Leaf { label } => {
            let label: GeneGroup = label.parse()?;
            return Ok(builder.add_leaf(label));
        }
        RawNode::OrderFixed { children } => (NodeKind::OrderFixed, children),
        RawNode::OrderFree { children } => (NodeKind::OrderFree, children),
    };
    let children = children
        .iter()
        .map(|child| add_node(builder, child))
        .collect::<Result<Vec<_>>>()?;
    builder.add_internal(kind, children)
}

fn separator(input: &str) -> IResult<&str, usize> {
    many0_count(alt((multispace1, tag(","))))(input)
}

fn parse_label(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace() || "[](),".contains(c))(input)
}

fn parse_children(input: &str) -> IResult<&str, Vec<RawNode>> {
    preceded(separator, many0(terminated(parse_node, separator)))(input)
}

fn parse_node(input: &str) -> IResult<&str, RawNode> {
    alt((
        map(
            delimited(char('['), parse_children, char(']')),
            |children| RawNode::OrderFixed { children },
        ),
        map(
            delimited(char('('), parse_children, char(')')),
            |children| RawNode::OrderFree { children },
        ),
        map(parse_label, |label: &str| RawNode::Leaf {
            label: label.to_string(),
        }),
    ))(input)
}
