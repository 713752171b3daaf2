//! Structural diff of two canonical trees.

use serde::Serialize;

use dyaml_canonical::scalar::key_rank;
use dyaml_canonical::{CanonicalTree, Node, NodePath};

/// What happened at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Present only in the second tree.
    Added,
    /// Present only in the first tree.
    Removed,
    /// Present in both with different values.
    Changed,
}

impl ChangeKind {
    /// Upper-case tag used in text reports.
    pub fn tag(self) -> &'static str {
        match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Removed => "REMOVED",
            ChangeKind::Changed => "CHANGED",
        }
    }
}

/// One path-addressed difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Where the difference is.
    pub path: NodePath,
    /// Kind of difference.
    pub kind: ChangeKind,
    /// Value in the first tree.
    pub before: Option<Node>,
    /// Value in the second tree.
    pub after: Option<Node>,
    /// True when the path ends in the annotation key.
    pub is_annotation: bool,
}

impl ChangeRecord {
    fn new(path: NodePath, kind: ChangeKind, before: Option<&Node>, after: Option<&Node>) -> Self {
        Self {
            is_annotation: path.is_annotation(),
            path,
            kind,
            before: before.cloned(),
            after: after.cloned(),
        }
    }
}

/// Lists the differences from `a` to `b` in canonical path order.
#[must_use]
pub fn diff(a: &CanonicalTree, b: &CanonicalTree) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();
    compare(&NodePath::root(), a.root(), b.root(), &mut changes);
    changes
}

fn compare(path: &NodePath, a: &Node, b: &Node, changes: &mut Vec<ChangeRecord>) {
    if a.canonical_eq(b) {
        return;
    }
    match (a, b) {
        (Node::Mapping(left), Node::Mapping(right)) => {
            let mut keys: Vec<&str> = left.keys().chain(right.keys()).collect();
            keys.sort_by_cached_key(|key| key_rank(key));
            keys.dedup();

            for key in keys {
                let child = path.push_key(key);
                match (left.get(key), right.get(key)) {
                    (Some(before), None) => {
                        changes.push(ChangeRecord::new(child, ChangeKind::Removed, Some(before), None))
                    }
                    (None, Some(after)) => {
                        changes.push(ChangeRecord::new(child, ChangeKind::Added, None, Some(after)))
                    }
                    (Some(before), Some(after)) => compare(&child, before, after, changes),
                    (None, None) => {}
                }
            }
        }
        (Node::Sequence(left), Node::Sequence(right)) => {
            for index in 0..left.len().max(right.len()) {
                let child = path.push_index(index);
                match (left.get(index), right.get(index)) {
                    (Some(before), None) => {
                        changes.push(ChangeRecord::new(child, ChangeKind::Removed, Some(before), None))
                    }
                    (None, Some(after)) => {
                        changes.push(ChangeRecord::new(child, ChangeKind::Added, None, Some(after)))
                    }
                    (Some(before), Some(after)) => compare(&child, before, after, changes),
                    (None, None) => {}
                }
            }
        }
        _ => changes.push(ChangeRecord::new(
            path.clone(),
            ChangeKind::Changed,
            Some(a),
            Some(b),
        )),
    }
}
