use thiserror::Error;

use crate::canonicalizer::CanonicalizationError;
use crate::parser::ParseError;

/// Any failure on the way from text to a canonical tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The text is not well-formed.
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),
    /// The document was rejected by the canonicalizer.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
