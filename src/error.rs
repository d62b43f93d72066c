//! Error types for the pqalign library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading inputs or validating an alignment run.
///
/// Infeasible alignments are not errors: they show up as empty query results.
#[derive(Debug, Error)]
pub enum Error {
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("A parsing error of kind '{kind:?}' occurred when the remaining input was '{input}'")]
    Parser {
        input: String,
        kind: nom::error::ErrorKind,
    },

    #[error("Unexpected trailing input after the tree: '{0}'")]
    TrailingInput(String),

    #[error("Invalid gene label: '{0}'")]
    InvalidLabel(String),

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("The gene sequence is empty")]
    EmptySequence,

    #[error("Invalid substitution matrix line {line}: {reason}")]
    Matrix { line: usize, reason: String },

    #[error(
        "Order-free node {node} has {children} children, at most {limit} are supported"
    )]
    OrderFreeDegree {
        node: usize,
        children: usize,
        limit: usize,
    },
}

pub(crate) fn translate_nom_error(error: nom::Err<nom::error::Error<&str>>) -> Error {
    match error {
        nom::Err::Incomplete(_) => Error::Parser {
            input: String::new(),
            kind: nom::error::ErrorKind::Eof,
        },
        nom::Err::Error(error) | nom::Err::Failure(error) => Error::Parser {
            input: error.input.to_string(),
            kind: error.code,
        },
    }
}
