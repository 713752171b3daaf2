//! Conformance checks against the canonical form.
//!
//! The validator canonicalizes a copy of a parsed document and compares it with
//! the source text and layout the parser recorded. Every deviation becomes a
//! [`ValidationFinding`]; nothing is rewritten.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonicalizer::{CanonicalizationError, Canonicalizer};
use crate::parser::{Document, NodeStyle, ParseError};
use crate::scalar;
use crate::tree::{Node, NodePath, ANNOTATION_KEY};

/// Severity of a finding. Only `Error` makes a document invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational.
    Info,
    /// Suspicious but conforming.
    Warning,
    /// Not canonical.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.pad(label)
    }
}

/// Stable finding code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingCode {
    /// Anchor, alias, tag, directive or document marker.
    UnsupportedConstruct,
    /// Mapping keys out of canonical order.
    KeyOrder,
    /// Scalar spelled differently from its canonical spelling.
    ScalarSpelling,
    /// Key spelled differently from its canonical spelling.
    KeySpelling,
    /// Block collection not indented two spaces per level.
    IndentWidth,
    /// Non-empty flow collection.
    FlowStyle,
    /// Literal or folded block scalar.
    BlockScalar,
    /// Comment line that should be a `$human$` annotation.
    Comment,
    /// Tab character.
    TabCharacter,
    /// Data `$human$` key that cannot be escaped.
    KeyCollision,
    /// Whitespace at the end of a line.
    TrailingWhitespace,
    /// Empty line inside the document.
    BlankLine,
    /// Empty lines at the end of the document.
    TrailingBlankLines,
    /// Document does not end with a newline.
    MissingFinalNewline,
    /// Comment that no mapping owns.
    OrphanedAnnotation,
    /// Text still differs from canonical output.
    NotCanonical,
}

/// Where a finding applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Node path, rendered like `a.b[0]`; `None` for text-level findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// 1-based line, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

impl Location {
    fn node(path: &NodePath, line: Option<usize>) -> Self {
        Self {
            path: Some(path.to_string()),
            line: line.filter(|line| *line > 0),
        }
    }

    fn line(line: usize) -> Self {
        Self {
            path: None,
            line: Some(line),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.line, &self.path) {
            (Some(line), Some(path)) => write!(f, "line {line} ({path})"),
            (Some(line), None) => write!(f, "line {line}"),
            (None, Some(path)) => write!(f, "{path}"),
            (None, None) => write!(f, "document"),
        }
    }
}

/// One deviation from the canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFinding {
    /// Where it applies.
    pub location: Location,
    /// Stable code.
    pub code: FindingCode,
    /// Human-readable description.
    pub message: String,
    /// Severity.
    pub severity: Severity,
}

/// All findings for one document, ordered by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Findings in line order.
    pub findings: Vec<ValidationFinding>,
    /// Whether stylistic findings were raised to errors.
    pub strict: bool,
}

impl ValidationReport {
    /// True when no finding is an error.
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    /// Number of findings with the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    /// Returns true when any finding carries `code`.
    pub fn has(&self, code: FindingCode) -> bool {
        self.findings.iter().any(|f| f.code == code)
    }
}

/// Validator configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    /// Creates a validator. Strict mode reports stylistic findings as errors.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Validates a parsed document against the text it was parsed from.
    pub fn validate(&self, document: &Document, original: &str) -> ValidationReport {
        let mut findings = Vec::new();
        let mut push = |location, code, severity, message: String| {
            findings.push(ValidationFinding {
                location,
                code,
                message,
                severity,
            })
        };

        for construct in document.rejected_constructs() {
            push(
                Location::node(&construct.path, Some(construct.line)),
                FindingCode::UnsupportedConstruct,
                Severity::Error,
                format!("{construct} is not allowed"),
            );
        }

        let canonical = match Canonicalizer::new().canonicalize(document) {
            Ok(tree) => Some(tree.to_text()),
            Err(CanonicalizationError::KeyCollision { path }) => {
                push(
                    Location::node(&path, document.layout(&path).map(|l| l.line)),
                    FindingCode::KeyCollision,
                    Severity::Error,
                    format!("`{ANNOTATION_KEY}` cannot be escaped: the escaped key already exists"),
                );
                None
            }
            Err(CanonicalizationError::UnsupportedConstruct { .. }) => None,
        };

        walk(document, document.root(), &NodePath::root(), &mut push);

        for (_, annotations) in document.annotations() {
            for annotation in annotations.iter().filter(|a| a.line > 0) {
                push(
                    Location::line(annotation.line),
                    FindingCode::Comment,
                    Severity::Error,
                    format!("comment must be written as `{ANNOTATION_KEY}`: {}", annotation.text),
                );
            }
        }
        for orphan in document.orphaned_annotations() {
            push(
                Location::line(orphan.line),
                FindingCode::Comment,
                Severity::Error,
                format!("comment cannot be kept: {}", orphan.text),
            );
            push(
                Location::line(orphan.line),
                FindingCode::OrphanedAnnotation,
                Severity::Warning,
                format!("comment has no owning mapping: {}", orphan.text),
            );
        }

        let stylistic = if self.strict { Severity::Error } else { Severity::Info };
        scan_text(original, stylistic, &mut push);

        let clean = !findings.iter().any(|f| f.severity == Severity::Error);
        if let Some(canonical) = canonical {
            if clean && tidy(original) != canonical {
                findings.push(ValidationFinding {
                    location: Location {
                        path: None,
                        line: None,
                    },
                    code: FindingCode::NotCanonical,
                    message: "text differs from its canonical form".to_string(),
                    severity: Severity::Error,
                });
            }
        }

        findings.sort_by_key(|f| f.location.line.unwrap_or(usize::MAX));
        ValidationReport {
            findings,
            strict: self.strict,
        }
    }
}

/// Parses `text` and validates it.
pub fn validate(text: &str, strict: bool) -> Result<ValidationReport, ParseError> {
    let document = Document::parse(text)?;
    Ok(Validator::new(strict).validate(&document, text))
}

type Push<'a> = dyn FnMut(Location, FindingCode, Severity, String) + 'a;

fn walk(document: &Document, node: &Node, path: &NodePath, push: &mut Push<'_>) {
    let layout = document.layout(path);
    let line = layout.map(|l| l.line);
    let style = layout.map(|l| l.style);

    let empty = match node {
        Node::Mapping(m) => Some(m.is_empty()),
        Node::Sequence(items) => Some(items.is_empty()),
        Node::Scalar(_) => None,
    };
    if let Some(empty) = empty {
        if style == Some(NodeStyle::Flow) && !empty {
            push(
                Location::node(path, line),
                FindingCode::FlowStyle,
                Severity::Error,
                format!("{} written in flow style", node.kind_name()),
            );
        }
        let expected = path.len() * 2;
        if let Some(indent) = layout.and_then(|l| l.indent) {
            if style == Some(NodeStyle::Block) && indent != expected {
                push(
                    Location::node(path, line),
                    FindingCode::IndentWidth,
                    Severity::Error,
                    format!("{} indented {indent} columns, expected {expected}", node.kind_name()),
                );
            }
        }
    }

    match node {
        Node::Scalar(s) => {
            if matches!(style, Some(NodeStyle::Literal | NodeStyle::Folded)) {
                push(
                    Location::node(path, line),
                    FindingCode::BlockScalar,
                    Severity::Error,
                    "block scalar must be a double-quoted string".to_string(),
                );
            } else if let Some(literal) = s.literal() {
                let canonical = s.canonical_spelling();
                if literal != canonical {
                    push(
                        Location::node(path, line),
                        FindingCode::ScalarSpelling,
                        Severity::Error,
                        format!("`{literal}` should be spelled `{canonical}`"),
                    );
                }
            }
        }
        Node::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(document, item, &path.push_index(index), push);
            }
        }
        Node::Mapping(mapping) => {
            let keys: Vec<&str> = mapping.keys().collect();
            let mut sorted = keys.clone();
            sorted.sort_by_cached_key(|key| scalar::key_rank(key));
            if keys != sorted {
                push(
                    Location::node(path, line),
                    FindingCode::KeyOrder,
                    Severity::Error,
                    format!("keys out of order, expected: {}", sorted.join(", ")),
                );
            }
            for (key, value) in mapping.iter() {
                let child = path.push_key(key);
                let child_layout = document.layout(&child);
                if let Some(literal) = child_layout.and_then(|l| l.key_literal.as_deref()) {
                    let canonical = scalar::spell_key(key);
                    if literal != canonical {
                        push(
                            Location::node(&child, child_layout.map(|l| l.line)),
                            FindingCode::KeySpelling,
                            Severity::Error,
                            format!("key `{literal}` should be spelled `{canonical}`"),
                        );
                    }
                }
                walk(document, value, &child, push);
            }
        }
    }
}

fn scan_text(text: &str, severity: Severity, push: &mut Push<'_>) {
    let lines: Vec<&str> = text.split('\n').collect();
    // `split` yields a final empty piece when the text ends with a newline.
    let body = match lines.split_last() {
        Some((last, rest)) if last.is_empty() => rest,
        _ => &lines[..],
    };
    let trailing_blank = body.iter().rev().take_while(|l| l.trim().is_empty()).count();
    let content_end = body.len() - trailing_blank;

    for (index, line) in body.iter().enumerate() {
        let number = index + 1;
        if line.contains('\t') {
            push(
                Location::line(number),
                FindingCode::TabCharacter,
                Severity::Error,
                "tab character".to_string(),
            );
        }
        if index >= content_end {
            continue;
        }
        if line.trim().is_empty() {
            push(
                Location::line(number),
                FindingCode::BlankLine,
                severity,
                "blank line".to_string(),
            );
        } else if line.ends_with(char::is_whitespace) {
            push(
                Location::line(number),
                FindingCode::TrailingWhitespace,
                severity,
                "trailing whitespace".to_string(),
            );
        }
    }
    if trailing_blank > 0 {
        push(
            Location::line(content_end + 1),
            FindingCode::TrailingBlankLines,
            severity,
            format!("{trailing_blank} blank line(s) at end of document"),
        );
    }
    if !text.is_empty() && !text.ends_with('\n') {
        push(
            Location::line(body.len()),
            FindingCode::MissingFinalNewline,
            severity,
            "missing final newline".to_string(),
        );
    }
}

/// Source text with stylistic noise removed, for the residual comparison.
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
