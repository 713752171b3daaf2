//! Canonical text writer.
//!
//! Block style only, two spaces per level. Sequences under a key are indented
//! one level, mapping items start on the dash line and nested sequences are
//! written `- - item`. The output always ends with exactly one newline.

use crate::canonicalizer::CanonicalTree;
use crate::scalar;
use crate::tree::{Mapping, Node, Scalar};

const INDENT: usize = 2;

/// Writes the canonical text of a tree.
pub fn emit(tree: &CanonicalTree) -> String {
    let mut out = String::new();
    match tree.root() {
        Node::Mapping(mapping) if !mapping.is_empty() => write_mapping(&mut out, mapping, 0, false),
        Node::Sequence(items) if !items.is_empty() => write_sequence(&mut out, items, 0, false),
        leaf => {
            out.push_str(&inline(leaf));
            out.push('\n');
        }
    }
    out
}

/// Single-token spelling of a scalar or empty collection.
fn inline(node: &Node) -> String {
    match node {
        Node::Scalar(s) => spelling(s),
        Node::Mapping(_) => "{}".to_string(),
        Node::Sequence(_) => "[]".to_string(),
    }
}

fn spelling(scalar: &Scalar) -> String {
    scalar::spell(scalar.value())
}

fn is_leaf(node: &Node) -> bool {
    match node {
        Node::Scalar(_) => true,
        Node::Mapping(m) => m.is_empty(),
        Node::Sequence(items) => items.is_empty(),
    }
}

fn pad(out: &mut String, indent: usize) {
    out.extend(std::iter::repeat(' ').take(indent));
}

/// Writes mapping entries at `indent`. With `first_inline` the first entry
/// continues the current line (after `- `).
fn write_mapping(out: &mut String, mapping: &Mapping, indent: usize, first_inline: bool) {
    for (i, (key, value)) in mapping.iter().enumerate() {
        if i > 0 || !first_inline {
            pad(out, indent);
        }
        out.push_str(&scalar::spell_key(key));
        out.push(':');
        write_value(out, value, indent);
    }
}

/// Writes what follows `key:`.
fn write_value(out: &mut String, value: &Node, indent: usize) {
    if is_leaf(value) {
        out.push(' ');
        out.push_str(&inline(value));
        out.push('\n');
        return;
    }
    out.push('\n');
    match value {
        Node::Mapping(m) => write_mapping(out, m, indent + INDENT, false),
        Node::Sequence(items) => write_sequence(out, items, indent + INDENT, false),
        Node::Scalar(_) => {}
    }
}

fn write_sequence(out: &mut String, items: &[Node], indent: usize, first_inline: bool) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 || !first_inline {
            pad(out, indent);
        }
        out.push('-');
        if is_leaf(item) {
            out.push(' ');
            out.push_str(&inline(item));
            out.push('\n');
            continue;
        }
        out.push(' ');
        match item {
            Node::Mapping(m) => write_mapping(out, m, indent + INDENT, true),
            Node::Sequence(nested) => write_sequence(out, nested, indent + INDENT, true),
            Node::Scalar(_) => {}
        }
    }
}
