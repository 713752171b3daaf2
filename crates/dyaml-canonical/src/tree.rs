use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::scalar;

/// Reserved mapping key that carries projected annotations.
pub const ANNOTATION_KEY: &str = "$human$";

/// Prefix applied once to a data key that collides with [`ANNOTATION_KEY`].
pub const ANNOTATION_ESCAPE_PREFIX: &str = "$";

/// Separator placed between annotations projected onto the same mapping.
pub const ANNOTATION_SEPARATOR: &str = " | ";

/// Returns the escaped spelling of a data key that collides with the annotation key.
pub fn escape_annotation_key(key: &str) -> String {
    format!("{ANNOTATION_ESCAPE_PREFIX}{key}")
}

/// Semantic value of a scalar, independent of how it was spelled.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// An IEEE-754 binary float.
    Float(f64),
    /// A string.
    String(String),
}

impl ScalarValue {
    /// Human-readable name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Bool(_) => "bool",
            ScalarValue::Int(_) => "int",
            ScalarValue::Float(_) => "float",
            ScalarValue::String(_) => "string",
        }
    }

    /// Numeric view of `Int` and `Float` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Null, ScalarValue::Null) => true,
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a == b,
            (ScalarValue::Int(a), ScalarValue::Int(b)) => a == b,
            (ScalarValue::Float(a), ScalarValue::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (ScalarValue::String(a), ScalarValue::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Leaf value together with the source text that produced it, when known.
#[derive(Debug, Clone)]
pub struct Scalar {
    value: ScalarValue,
    literal: Option<String>,
}

impl Scalar {
    /// Creates a scalar with no recorded source spelling.
    pub fn new(value: ScalarValue) -> Self {
        Self {
            value,
            literal: None,
        }
    }

    /// Creates a scalar that remembers its source spelling.
    pub fn with_literal(value: ScalarValue, literal: impl Into<String>) -> Self {
        Self {
            value,
            literal: Some(literal.into()),
        }
    }

    /// Semantic value.
    pub fn value(&self) -> &ScalarValue {
        &self.value
    }

    /// Source spelling recorded at parse time.
    pub fn literal(&self) -> Option<&str> {
        self.literal.as_deref()
    }

    /// The unique canonical spelling of this scalar's value.
    pub fn canonical_spelling(&self) -> String {
        scalar::spell(&self.value)
    }
}

/// Structural equality: compares semantic values only.
impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// Insertion-ordered mapping with unique string keys.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: Vec<(String, Node)>,
}

impl Mapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry. An existing key keeps its position and the old value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> Option<Node> {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns true when the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of the reserved annotation key, if present and a string.
    pub fn annotation(&self) -> Option<&str> {
        self.get(ANNOTATION_KEY).and_then(Node::as_str)
    }

    fn data_entries(&self) -> impl Iterator<Item = &(String, Node)> {
        self.entries.iter().filter(|(k, _)| k != ANNOTATION_KEY)
    }
}

impl FromIterator<(String, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// Structural equality: key order and the annotation key are ignored.
impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.data_entries().count() == other.data_entries().count()
            && self
                .data_entries()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

/// A parsed document node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Key/value pairs.
    Mapping(Mapping),
    /// Ordered items.
    Sequence(Vec<Node>),
    /// A leaf value.
    Scalar(Scalar),
}

impl Node {
    /// A null scalar.
    pub fn null() -> Self {
        Node::Scalar(Scalar::new(ScalarValue::Null))
    }

    /// A boolean scalar.
    pub fn bool(value: bool) -> Self {
        Node::Scalar(Scalar::new(ScalarValue::Bool(value)))
    }

    /// An integer scalar.
    pub fn int(value: i64) -> Self {
        Node::Scalar(Scalar::new(ScalarValue::Int(value)))
    }

    /// A float scalar.
    pub fn float(value: f64) -> Self {
        Node::Scalar(Scalar::new(ScalarValue::Float(value)))
    }

    /// A string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::new(ScalarValue::String(value.into())))
    }

    /// Short name of the node's shape, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(s) => s.value().type_name(),
        }
    }

    /// Mapping view.
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Sequence view.
    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Scalar view.
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// String view of a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar {
                value: ScalarValue::String(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// Resolves a path relative to this node.
    pub fn get_path(&self, path: &NodePath) -> Option<&Node> {
        let mut node = self;
        for segment in path.segments() {
            node = match (segment, node) {
                (PathSegment::Key(key), Node::Mapping(m)) => m.get(key)?,
                (PathSegment::Index(index), Node::Sequence(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Canonical equality: same shape, same key order, same canonical scalar
    /// spelling and same annotation content.
    pub fn canonical_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Scalar(a), Node::Scalar(b)) => a.canonical_spelling() == b.canonical_spelling(),
            (Node::Sequence(a), Node::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.canonical_eq(y))
            }
            (Node::Mapping(a), Node::Mapping(b)) => {
                a.len() == b.len()
                    && a
                        .iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.canonical_eq(vb))
            }
            _ => false,
        }
    }
}

/// Structural equality (see [`Node::canonical_eq`] for the stricter form).
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Mapping(a), Node::Mapping(b)) => a == b,
            (Node::Sequence(a), Node::Sequence(b)) => a == b,
            (Node::Scalar(a), Node::Scalar(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (key, value) in m.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Scalar(s) => match s.value() {
                ScalarValue::Null => serializer.serialize_unit(),
                ScalarValue::Bool(b) => serializer.serialize_bool(*b),
                ScalarValue::Int(i) => serializer.serialize_i64(*i),
                ScalarValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
                ScalarValue::Float(f) => serializer.serialize_str(&scalar::spell_float(*f)),
                ScalarValue::String(text) => serializer.serialize_str(text),
            },
        }
    }
}

/// One step of a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Mapping key.
    Key(String),
    /// Sequence index.
    Index(usize),
}

/// Address of a node from the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Child path through a mapping key.
    pub fn push_key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Child path through a sequence index.
    pub fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    /// Enclosing path, or `None` at the root.
    pub fn parent(&self) -> Option<NodePath> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Segments from the root outwards.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Final segment.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Key of the final segment, when it is a mapping key.
    pub fn last_key(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }

    /// Number of segments (nesting depth).
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true when the final segment is the annotation key.
    pub fn is_annotation(&self) -> bool {
        self.last_key() == Some(ANNOTATION_KEY)
    }
}

impl FromIterator<PathSegment> for NodePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "root");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
