//! Deterministic YAML: one canonical text per document.
//!
//! Text is read by the [`parser`] into a [`Node`] tree with comments held in a
//! side table, rewritten by the [`Canonicalizer`] into a [`CanonicalTree`]
//! (sorted keys, canonical scalar spellings, comments projected into the
//! reserved `$human$` key) and written back by the [`emitter`]. The
//! [`validation`] module reports how far a document is from that form.

#![deny(missing_docs)]

/// Canonicalization of parsed documents.
pub mod canonicalizer;
/// Fingerprints of canonical text.
pub mod digest;
/// Canonical text writer.
pub mod emitter;
/// Crate-level error type.
pub mod errors;
/// Hygiene report types emitted during canonicalization.
pub mod hygiene;
/// YAML block-subset reader.
pub mod parser;
/// Scalar resolution and canonical spelling.
pub mod scalar;
/// Document tree model.
pub mod tree;
/// Conformance checks.
pub mod validation;

pub use canonicalizer::{
    canonicalize_text, CanonicalTree, CanonicalizationError, CanonicalizationResult, Canonicalizer,
};
pub use digest::{Digest, DigestAlg, DigestError};
pub use emitter::emit;
pub use errors::Error;
pub use hygiene::{HygieneReport, HygieneStatus, HygieneWarning};
pub use parser::{Annotation, ConstructKind, Document, ParseError, ParseErrorKind};
pub use scalar::{key_rank, needs_quotes};
pub use tree::{
    Mapping, Node, NodePath, PathSegment, Scalar, ScalarValue, ANNOTATION_KEY,
    ANNOTATION_SEPARATOR,
};
pub use validation::{
    FindingCode, Severity, ValidationFinding, ValidationReport, Validator,
};
