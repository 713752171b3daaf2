use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::digest::Digest;
use crate::emitter;
use crate::hygiene::{
    HygieneReport, HygieneStatus, HygieneWarning, METRIC_ANNOTATIONS_PROJECTED,
    METRIC_BLOCK_SCALARS_FOLDED, METRIC_FLOW_COLLECTIONS_EXPANDED, METRIC_KEYS_ESCAPED,
    METRIC_MAPPINGS_REORDERED, METRIC_SCALARS_RESPELLED,
};
use crate::parser::{Annotation, Document, NodeStyle};
use crate::scalar;
use crate::tree::{
    escape_annotation_key, Mapping, Node, NodePath, Scalar, ScalarValue, ANNOTATION_KEY,
    ANNOTATION_SEPARATOR,
};

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// The document uses an anchor, alias, tag, directive or document marker.
    #[error("unsupported construct {construct} at {path}")]
    UnsupportedConstruct {
        /// Construct description, e.g. ``anchor `&base` ``.
        construct: String,
        /// Path of the node that carried it.
        path: NodePath,
    },
    /// Escaping a data `$human$` key would overwrite an existing `$$human$` key.
    #[error("annotation key collision at {path}")]
    KeyCollision {
        /// Path of the mapping.
        path: NodePath,
    },
}

/// Result of canonicalization.
#[derive(Debug, Clone)]
pub struct CanonicalizationResult {
    /// The canonical tree.
    pub tree: CanonicalTree,
    /// Canonical text for the tree.
    pub text: String,
    /// Hygiene report describing what had to be rewritten.
    pub report: HygieneReport,
}

/// A tree in canonical form. Only the [`Canonicalizer`] creates one.
#[derive(Debug, Clone)]
pub struct CanonicalTree {
    root: Node,
}

impl CanonicalTree {
    /// Root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Node at `path`.
    pub fn get_path(&self, path: &NodePath) -> Option<&Node> {
        self.root.get_path(path)
    }

    /// `$human$` text of the mapping at `path`.
    pub fn annotation_at(&self, path: &NodePath) -> Option<&str> {
        self.get_path(path)?.as_mapping()?.annotation()
    }

    /// Canonical text.
    pub fn to_text(&self) -> String {
        emitter::emit(self)
    }

    /// Fingerprint of the canonical text.
    pub fn digest(&self) -> Digest {
        Digest::of_text(&self.to_text())
    }
}

/// Canonical equality.
impl PartialEq for CanonicalTree {
    fn eq(&self, other: &Self) -> bool {
        self.root.canonical_eq(&other.root)
    }
}

impl Serialize for CanonicalTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

/// Canonicalizer that emits deterministic trees.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    strip_annotations: bool,
}

impl Canonicalizer {
    /// Creates a canonicalizer that projects annotations into `$human$`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every annotation and every `$human$` key instead of projecting them.
    pub fn with_stripped_annotations(mut self, strip: bool) -> Self {
        self.strip_annotations = strip;
        self
    }

    /// Produces the canonical tree.
    pub fn canonicalize(&self, document: &Document) -> Result<CanonicalTree, CanonicalizationError> {
        self.canonicalize_with_report(document)
            .map(|result| result.tree)
            .map_err(|(err, _)| err)
    }

    /// Produces the canonical tree, text and hygiene report, returning the report even on error.
    pub fn canonicalize_with_report(
        &self,
        document: &Document,
    ) -> Result<CanonicalizationResult, (CanonicalizationError, HygieneReport)> {
        let mut report = HygieneReport::new();

        if let Some(construct) = document.rejected_constructs().first() {
            report.status = HygieneStatus::Invalid;
            let err = CanonicalizationError::UnsupportedConstruct {
                construct: construct.to_string(),
                path: construct.path.clone(),
            };
            return Err((err, report));
        }

        if !self.strip_annotations {
            self.check_orphans(document, &mut report);
        }

        let root = match self.node(document.root(), &NodePath::root(), document, &mut report) {
            Ok(root) => root,
            Err(err) => {
                report.status = HygieneStatus::Invalid;
                return Err((err, report));
            }
        };

        if report.rewrote_input() {
            report.status = HygieneStatus::Normalized;
        }
        debug!(metrics = ?report.metrics, status = ?report.status, "canonicalized document");

        let tree = CanonicalTree { root };
        let text = emitter::emit(&tree);
        Ok(CanonicalizationResult { tree, text, report })
    }

    fn check_orphans(&self, document: &Document, report: &mut HygieneReport) {
        let mut orphans: Vec<&Annotation> = document.orphaned_annotations().iter().collect();
        for (path, annotations) in document.annotations() {
            if !matches!(document.root().get_path(path), Some(Node::Mapping(_))) {
                orphans.extend(annotations);
            }
        }
        for orphan in &orphans {
            warn!(line = orphan.line, text = %orphan.text, "annotation has no owning mapping");
        }
        if !orphans.is_empty() {
            report.warn(HygieneWarning::orphaned_annotation());
        }
    }

    fn node(
        &self,
        node: &Node,
        path: &NodePath,
        document: &Document,
        report: &mut HygieneReport,
    ) -> Result<Node, CanonicalizationError> {
        let style = document.layout(path).map(|layout| layout.style);
        match node {
            Node::Scalar(scalar) => Ok(Node::Scalar(self.scalar(scalar, style, path, report))),
            Node::Sequence(items) => {
                if style == Some(NodeStyle::Flow) && !items.is_empty() {
                    report.bump(METRIC_FLOW_COLLECTIONS_EXPANDED, 1);
                }
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.node(item, &path.push_index(index), document, report))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Node::Sequence)
            }
            Node::Mapping(mapping) => {
                if style == Some(NodeStyle::Flow) && !mapping.is_empty() {
                    report.bump(METRIC_FLOW_COLLECTIONS_EXPANDED, 1);
                }
                self.mapping(mapping, path, document, report).map(Node::Mapping)
            }
        }
    }

    fn scalar(
        &self,
        scalar: &Scalar,
        style: Option<NodeStyle>,
        path: &NodePath,
        report: &mut HygieneReport,
    ) -> Scalar {
        let spelling = scalar.canonical_spelling();
        if matches!(style, Some(NodeStyle::Literal | NodeStyle::Folded)) {
            report.bump(METRIC_BLOCK_SCALARS_FOLDED, 1);
        } else if scalar.literal().is_some_and(|literal| literal != spelling) {
            report.bump(METRIC_SCALARS_RESPELLED, 1);
        }
        if let (ScalarValue::Float(_), Some(literal)) = (scalar.value(), scalar.literal()) {
            if scalar::is_integer_literal(literal) {
                warn!(%path, literal, "integer outside 64-bit range read as float");
                report.warn(HygieneWarning::integer_overflow());
            }
        }
        Scalar::with_literal(scalar.value().clone(), spelling)
    }

    fn mapping(
        &self,
        mapping: &Mapping,
        path: &NodePath,
        document: &Document,
        report: &mut HygieneReport,
    ) -> Result<Mapping, CanonicalizationError> {
        let annotations = if self.strip_annotations {
            &[][..]
        } else {
            document.annotations_for(path)
        };

        let mut entries = Vec::with_capacity(mapping.len() + 1);
        for (key, value) in mapping.iter() {
            if self.strip_annotations && key == ANNOTATION_KEY {
                continue;
            }
            let child = self.node(value, &path.push_key(key), document, report)?;
            let key = if key == ANNOTATION_KEY && !annotations.is_empty() {
                let escaped = escape_annotation_key(key);
                if mapping.contains_key(&escaped) {
                    return Err(CanonicalizationError::KeyCollision { path: path.clone() });
                }
                report.bump(METRIC_KEYS_ESCAPED, 1);
                report.warn(HygieneWarning::annotation_key_escaped());
                escaped
            } else {
                key.to_string()
            };
            entries.push((key, child));
        }

        let before: Vec<String> = entries.iter().map(|(key, _)| key.clone()).collect();
        entries.sort_by_cached_key(|(key, _)| scalar::key_rank(key));
        if entries.iter().map(|(key, _)| key).ne(before.iter()) {
            report.bump(METRIC_MAPPINGS_REORDERED, 1);
        }

        if !annotations.is_empty() {
            let text = annotations
                .iter()
                .map(Annotation::rendered)
                .collect::<Vec<_>>()
                .join(ANNOTATION_SEPARATOR);
            report.bump(METRIC_ANNOTATIONS_PROJECTED, annotations.len() as u64);
            entries.insert(0, (ANNOTATION_KEY.to_string(), Node::string(text)));
        }

        Ok(entries.into_iter().collect())
    }
}

/// Parses and canonicalizes text in one step.
pub fn canonicalize_text(text: &str) -> Result<CanonicalizationResult, crate::Error> {
    let document = Document::parse(text)?;
    Canonicalizer::new()
        .canonicalize_with_report(&document)
        .map_err(|(err, _)| err.into())
}
