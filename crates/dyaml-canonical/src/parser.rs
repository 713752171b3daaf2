//! Reader for the YAML block subset that Deterministic YAML constrains.
//!
//! Parsing never resolves comments into the tree. Full-line and trailing
//! comments are kept in an annotation side table keyed by the path of the
//! mapping that owns them; the canonicalizer projects them into `$human$`.
//! Anchors, aliases, tags, directives and document markers are recorded
//! rather than rejected so that callers can report every one of them.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::scalar;
use crate::tree::{Mapping, Node, NodePath, Scalar, ScalarValue};

/// Deepest collection nesting the parser accepts.
pub const MAX_DEPTH: usize = 128;

/// Error raised for input that is not well-formed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Classification of [`ParseError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A line is indented deeper than its context allows.
    #[error("unexpected indentation")]
    UnexpectedIndent,
    /// Indentation contains a tab.
    #[error("tab character used for indentation")]
    TabIndent,
    /// A quoted scalar is not closed on its line.
    #[error("unterminated quoted scalar")]
    UnterminatedQuote,
    /// Unknown escape in a double-quoted scalar.
    #[error("invalid escape sequence `\\{0}`")]
    InvalidEscape(String),
    /// Text follows a complete quoted scalar or flow collection.
    #[error("unexpected content after value: `{0}`")]
    TrailingContent(String),
    /// A key appears twice in one mapping.
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
    /// `? key` syntax.
    #[error("complex mapping keys are not supported")]
    ComplexKey,
    /// A flow collection is not closed on its line.
    #[error("unterminated flow collection")]
    UnterminatedFlow,
    /// Malformed flow collection.
    #[error("invalid flow collection: {0}")]
    InvalidFlow(String),
    /// Malformed `|` / `>` header.
    #[error("invalid block scalar header `{0}`")]
    InvalidBlockHeader(String),
    /// A mapping line without a `key:`.
    #[error("expected a mapping entry, found `{0}`")]
    ExpectedEntry(String),
    /// Content after the root node.
    #[error("unexpected content after document root: `{0}`")]
    UnexpectedContent(String),
    /// Collections nested deeper than the limit.
    #[error("collections nested deeper than {0} levels")]
    TooDeep(usize),
}

/// A comment attached out-of-band to a mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Comment text without the `#` marker.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
    /// Key of the entry whose line carried the comment, for trailing comments.
    pub key: Option<String>,
}

impl Annotation {
    /// Text as projected into `$human$`.
    pub fn rendered(&self) -> String {
        match &self.key {
            Some(key) => format!("{key}: {}", self.text),
            None => self.text.clone(),
        }
    }
}

/// Kinds of source construct that canonical documents may not contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructKind {
    /// `&name`
    Anchor,
    /// `*name`
    Alias,
    /// `!tag`
    Tag,
    /// `%YAML ...`
    Directive,
    /// `---` or `...`
    DocumentMarker,
}

impl fmt::Display for ConstructKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstructKind::Anchor => "anchor",
            ConstructKind::Alias => "alias",
            ConstructKind::Tag => "tag",
            ConstructKind::Directive => "directive",
            ConstructKind::DocumentMarker => "document marker",
        };
        f.write_str(name)
    }
}

/// An occurrence of a construct the canonicalizer rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedConstruct {
    /// Construct kind.
    pub kind: ConstructKind,
    /// Source spelling, e.g. `&base`.
    pub spelling: String,
    /// Path of the node that carried it.
    pub path: NodePath,
    /// 1-based source line.
    pub line: usize,
}

impl fmt::Display for RejectedConstruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.spelling)
    }
}

/// Source presentation of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeStyle {
    /// Indented block collection.
    Block,
    /// `{...}` or `[...]`.
    Flow,
    /// Unquoted scalar.
    #[default]
    Plain,
    /// `'...'`
    SingleQuoted,
    /// `"..."`
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
}

/// Layout facts recorded for one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeLayout {
    /// 1-based line where the node starts.
    pub line: usize,
    /// Presentation style.
    pub style: NodeStyle,
    /// Column of the entries of a block collection.
    pub indent: Option<usize>,
    /// Source spelling of the key that leads to this node.
    pub key_literal: Option<String>,
}

/// A parsed document: the tree plus its out-of-band side tables.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
    annotations: BTreeMap<NodePath, Vec<Annotation>>,
    orphaned: Vec<Annotation>,
    layout: BTreeMap<NodePath, NodeLayout>,
    constructs: Vec<RejectedConstruct>,
}

impl Document {
    /// Parses YAML text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Parser::new(text).parse_document()
    }

    /// Wraps a programmatically built tree with empty side tables.
    pub fn from_node(root: Node) -> Self {
        Self {
            root,
            annotations: BTreeMap::new(),
            orphaned: Vec::new(),
            layout: BTreeMap::new(),
            constructs: Vec::new(),
        }
    }

    /// Adds an out-of-band annotation to the mapping at `path`.
    pub fn with_annotation(mut self, path: NodePath, text: impl Into<String>) -> Self {
        self.annotations.entry(path).or_default().push(Annotation {
            text: text.into(),
            line: 0,
            key: None,
        });
        self
    }

    /// Records a rejected construct, as the parser would.
    pub fn with_construct(mut self, kind: ConstructKind, spelling: &str, path: NodePath) -> Self {
        self.constructs.push(RejectedConstruct {
            kind,
            spelling: spelling.to_string(),
            path,
            line: 0,
        });
        self
    }

    /// Root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Annotations owned by the mapping at `path`, in source order.
    pub fn annotations_for(&self, path: &NodePath) -> &[Annotation] {
        self.annotations.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every annotated mapping path with its annotations.
    pub fn annotations(&self) -> impl Iterator<Item = (&NodePath, &[Annotation])> {
        self.annotations.iter().map(|(p, a)| (p, a.as_slice()))
    }

    /// Comments that no mapping could own.
    pub fn orphaned_annotations(&self) -> &[Annotation] {
        &self.orphaned
    }

    /// Layout recorded for the node at `path`.
    pub fn layout(&self, path: &NodePath) -> Option<&NodeLayout> {
        self.layout.get(path)
    }

    /// Anchors, aliases, tags, directives and document markers found in the source.
    pub fn rejected_constructs(&self) -> &[RejectedConstruct] {
        &self.constructs
    }
}

/// A logical line: one source line, or the remainder of a `- ` item line.
#[derive(Debug, Clone)]
struct Logical {
    number: usize,
    indent: usize,
    content: String,
    comment: Option<String>,
    /// Column of the `-` this content was lifted from.
    floor: Option<usize>,
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    current: Option<Logical>,
    pending: Vec<Annotation>,
    annotations: BTreeMap<NodePath, Vec<Annotation>>,
    orphaned: Vec<Annotation>,
    layout: BTreeMap<NodePath, NodeLayout>,
    constructs: Vec<RejectedConstruct>,
    seen_content: bool,
    stopped: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self {
            lines,
            pos: 0,
            current: None,
            pending: Vec::new(),
            annotations: BTreeMap::new(),
            orphaned: Vec::new(),
            layout: BTreeMap::new(),
            constructs: Vec::new(),
            seen_content: false,
            stopped: false,
        }
    }

    fn parse_document(mut self) -> Result<Document, ParseError> {
        let root_path = NodePath::root();
        let root = if self.peek()?.is_some() {
            self.parse_block(&root_path, None)?
        } else {
            Node::Scalar(Scalar::with_literal(ScalarValue::Null, ""))
        };
        if let Some(extra) = self.peek()? {
            return Err(ParseError::new(
                extra.number,
                ParseErrorKind::UnexpectedContent(extra.content.clone()),
            ));
        }

        let leftover = std::mem::take(&mut self.pending);
        if matches!(root, Node::Mapping(_)) {
            self.annotations.entry(root_path).or_default().extend(leftover);
        } else {
            self.orphaned.extend(leftover);
        }

        Ok(Document {
            root,
            annotations: self.annotations,
            orphaned: self.orphaned,
            layout: self.layout,
            constructs: self.constructs,
        })
    }

    fn peek(&mut self) -> Result<Option<&Logical>, ParseError> {
        if self.current.is_none() {
            self.current = self.next_logical()?;
        }
        Ok(self.current.as_ref())
    }

    fn next_logical(&mut self) -> Result<Option<Logical>, ParseError> {
        while !self.stopped && self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            let number = self.pos + 1;
            self.pos += 1;

            if raw.trim().is_empty() {
                continue;
            }
            let trimmed = raw.trim_start_matches(' ');
            let indent = raw.len() - trimmed.len();
            if trimmed.starts_with('\t') {
                return Err(ParseError::new(number, ParseErrorKind::TabIndent));
            }
            if let Some(comment) = trimmed.strip_prefix('#') {
                self.pending.push(Annotation {
                    text: comment.trim().to_string(),
                    line: number,
                    key: None,
                });
                continue;
            }
            if indent == 0 && (is_marker(trimmed, "---") || is_marker(trimmed, "...")) {
                self.record_construct(ConstructKind::DocumentMarker, &trimmed[..3], &NodePath::root(), number);
                if self.seen_content {
                    self.stopped = true;
                }
                continue;
            }
            if indent == 0 && trimmed.starts_with('%') {
                self.record_construct(ConstructKind::Directive, trimmed.trim_end(), &NodePath::root(), number);
                continue;
            }

            let (content, comment) = split_comment(trimmed);
            self.seen_content = true;
            return Ok(Some(Logical {
                number,
                indent,
                content: content.trim_end().to_string(),
                comment,
                floor: None,
            }));
        }
        Ok(None)
    }

    fn record_construct(&mut self, kind: ConstructKind, spelling: &str, path: &NodePath, line: usize) {
        self.constructs.push(RejectedConstruct {
            kind,
            spelling: spelling.to_string(),
            path: path.clone(),
            line,
        });
    }

    fn record_layout(&mut self, path: &NodePath, line: usize, style: NodeStyle, indent: Option<usize>) {
        let entry = self.layout.entry(path.clone()).or_default();
        entry.line = line;
        entry.style = style;
        entry.indent = indent;
    }

    fn record_key(&mut self, path: &NodePath, literal: &str) {
        self.layout.entry(path.clone()).or_default().key_literal = Some(literal.to_string());
    }

    fn claim_pending(&mut self, owner: &NodePath) {
        if self.pending.is_empty() {
            return;
        }
        let drained = std::mem::take(&mut self.pending);
        self.annotations.entry(owner.clone()).or_default().extend(drained);
    }

    fn attach(&mut self, owner: Option<&NodePath>, annotation: Annotation) {
        match owner {
            Some(path) => self.annotations.entry(path.clone()).or_default().push(annotation),
            None => self.orphaned.push(annotation),
        }
    }

    /// Strips leading anchors and tags, recording each one.
    fn strip_properties<'t>(&mut self, mut text: &'t str, line: usize, path: &NodePath) -> &'t str {
        loop {
            let kind = match text.chars().next() {
                Some('&') => ConstructKind::Anchor,
                Some('!') => ConstructKind::Tag,
                _ => return text,
            };
            let end = text.find(char::is_whitespace).unwrap_or(text.len());
            self.record_construct(kind, &text[..end], path, line);
            text = text[end..].trim_start();
        }
    }

    /// Parses the node that starts at the current logical line.
    fn parse_block(&mut self, path: &NodePath, owner: Option<&NodePath>) -> Result<Node, ParseError> {
        let Some(line) = self.peek()?.cloned() else {
            return Ok(Node::null());
        };
        if is_item(&line.content) {
            return self.parse_sequence(line.indent, path, owner);
        }
        if split_key(&line.content, line.number)?.is_some() {
            return self.parse_mapping(line.indent, path);
        }

        self.current = None;
        if let Some(text) = line.comment {
            self.attach(
                owner,
                Annotation {
                    text,
                    line: line.number,
                    key: None,
                },
            );
        }
        let text = self.strip_properties(&line.content, line.number, path);
        self.parse_inline(text, line.number, line.floor, path, owner)
    }

    fn parse_mapping(&mut self, indent: usize, path: &NodePath) -> Result<Node, ParseError> {
        let start = self.peek()?.map_or(0, |l| l.number);
        check_depth(path, start)?;
        let mut mapping = Mapping::new();
        let mut first_line = None;

        loop {
            let Some(line) = self.peek()? else { break };
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(ParseError::new(line.number, ParseErrorKind::UnexpectedIndent));
            }
            let Some(line) = self.current.take() else { break };
            let Some((key_text, value_text)) = split_key(&line.content, line.number)? else {
                return Err(ParseError::new(
                    line.number,
                    ParseErrorKind::ExpectedEntry(line.content.clone()),
                ));
            };
            let key = parse_key(key_text, line.number)?;
            if mapping.contains_key(&key) {
                return Err(ParseError::new(line.number, ParseErrorKind::DuplicateKey(key)));
            }
            first_line.get_or_insert(line.number);

            self.claim_pending(path);
            if let Some(text) = &line.comment {
                self.attach(
                    Some(path),
                    Annotation {
                        text: text.clone(),
                        line: line.number,
                        key: Some(key.clone()),
                    },
                );
            }

            let child = path.push_key(&key);
            self.record_key(&child, key_text);
            let value_text = self.strip_properties(value_text, line.number, &child);
            let value = if value_text.is_empty() {
                self.parse_nested(indent, line.number, &child, Some(path))?
            } else {
                self.parse_inline(value_text, line.number, Some(indent), &child, Some(path))?
            };
            mapping.insert(key, value);
        }

        self.record_layout(path, first_line.unwrap_or(0), NodeStyle::Block, Some(indent));
        Ok(Node::Mapping(mapping))
    }

    /// Value of a `key:` or `-` line with nothing after the indicator.
    fn parse_nested(
        &mut self,
        parent_indent: usize,
        line: usize,
        path: &NodePath,
        owner: Option<&NodePath>,
    ) -> Result<Node, ParseError> {
        let next = self.peek()?.map(|l| (l.indent, is_item(&l.content)));
        match next {
            Some((indent, _)) if indent > parent_indent => self.parse_block(path, owner),
            // Compact form: `key:` followed by `- item` at the key's column.
            Some((indent, true)) if indent == parent_indent && path.last_key().is_some() => {
                self.parse_sequence(indent, path, owner)
            }
            _ => {
                self.record_layout(path, line, NodeStyle::Plain, None);
                Ok(Node::Scalar(Scalar::with_literal(ScalarValue::Null, "")))
            }
        }
    }

    fn parse_sequence(
        &mut self,
        indent: usize,
        path: &NodePath,
        owner: Option<&NodePath>,
    ) -> Result<Node, ParseError> {
        let start = self.peek()?.map_or(0, |l| l.number);
        check_depth(path, start)?;
        let mut items = Vec::new();
        let mut first_line = None;

        loop {
            let Some(line) = self.peek()? else { break };
            if line.indent < indent || !is_item(&line.content) {
                if line.indent > indent {
                    return Err(ParseError::new(line.number, ParseErrorKind::UnexpectedIndent));
                }
                break;
            }
            if line.indent > indent {
                return Err(ParseError::new(line.number, ParseErrorKind::UnexpectedIndent));
            }
            let Some(line) = self.current.take() else { break };
            first_line.get_or_insert(line.number);

            let child = path.push_index(items.len());
            let mut leading = std::mem::take(&mut self.pending);
            let after_dash = &line.content[1..];
            let gap = after_dash.len() - after_dash.trim_start().len();
            let rest = self.strip_properties(after_dash.trim_start(), line.number, &child);

            let item = if rest.is_empty() {
                if let Some(text) = line.comment.clone() {
                    leading.push(Annotation {
                        text,
                        line: line.number,
                        key: None,
                    });
                }
                self.parse_nested(indent, line.number, &child, owner)?
            } else {
                self.current = Some(Logical {
                    number: line.number,
                    indent: indent + 1 + gap,
                    content: rest.to_string(),
                    comment: line.comment.clone(),
                    floor: Some(indent),
                });
                self.parse_block(&child, owner)?
            };

            if !leading.is_empty() {
                if matches!(item, Node::Mapping(_)) {
                    let slot = self.annotations.entry(child.clone()).or_default();
                    leading.append(slot);
                    *slot = leading;
                } else {
                    for annotation in leading {
                        self.attach(owner, annotation);
                    }
                }
            }
            items.push(item);
        }

        self.record_layout(path, first_line.unwrap_or(0), NodeStyle::Block, Some(indent));
        Ok(Node::Sequence(items))
    }

    /// Parses a value written on the same line as its key or dash.
    fn parse_inline(
        &mut self,
        text: &str,
        line: usize,
        floor: Option<usize>,
        path: &NodePath,
        owner: Option<&NodePath>,
    ) -> Result<Node, ParseError> {
        if text.is_empty() {
            self.record_layout(path, line, NodeStyle::Plain, None);
            return Ok(Node::Scalar(Scalar::with_literal(ScalarValue::Null, "")));
        }
        if text.starts_with('*') {
            self.record_construct(ConstructKind::Alias, text, path, line);
            self.record_layout(path, line, NodeStyle::Plain, None);
            return Ok(Node::Scalar(Scalar::with_literal(ScalarValue::Null, text)));
        }
        if text.starts_with('|') || text.starts_with('>') {
            return self.parse_block_scalar(text, line, floor, path);
        }
        if text.starts_with('[') || text.starts_with('{') {
            let mut cursor = Cursor::new(text, line);
            let node = self.flow_node(&mut cursor, path)?;
            cursor.expect_end()?;
            return Ok(node);
        }
        if text.starts_with('"') || text.starts_with('\'') {
            let mut cursor = Cursor::new(text, line);
            let (value, style) = cursor.quoted()?;
            cursor.expect_end()?;
            self.record_layout(path, line, style, None);
            return Ok(Node::Scalar(Scalar::with_literal(ScalarValue::String(value), text)));
        }

        let mut literal = text.to_string();
        let mut folded = text.to_string();
        if let Some(floor) = floor {
            while let Some(next) = self.peek()? {
                if next.indent <= floor {
                    break;
                }
                let Some(next) = self.current.take() else { break };
                literal.push('\n');
                literal.push_str(&" ".repeat(next.indent));
                literal.push_str(&next.content);
                folded.push(' ');
                folded.push_str(&next.content);
                if let Some(text) = next.comment {
                    self.attach(
                        owner,
                        Annotation {
                            text,
                            line: next.number,
                            key: None,
                        },
                    );
                }
            }
        }
        self.record_layout(path, line, NodeStyle::Plain, None);
        Ok(Node::Scalar(Scalar::with_literal(scalar::resolve_plain(&folded), literal)))
    }

    fn parse_block_scalar(
        &mut self,
        header: &str,
        line: usize,
        floor: Option<usize>,
        path: &NodePath,
    ) -> Result<Node, ParseError> {
        let folded = header.starts_with('>');
        let mut chomp = Chomp::Clip;
        let mut explicit = None;
        for c in header[1..].chars() {
            match c {
                '-' if chomp == Chomp::Clip => chomp = Chomp::Strip,
                '+' if chomp == Chomp::Clip => chomp = Chomp::Keep,
                '1'..='9' if explicit.is_none() => explicit = c.to_digit(10).map(|d| d as usize),
                _ => {
                    return Err(ParseError::new(
                        line,
                        ParseErrorKind::InvalidBlockHeader(header.to_string()),
                    ))
                }
            }
        }

        let minimum = floor.map_or(0, |f| f + 1);
        let content_indent = match explicit {
            Some(d) => floor.map_or(d, |f| f + d),
            None => self.lines[self.pos..]
                .iter()
                .find(|raw| !raw.trim().is_empty())
                .map(|raw| raw.len() - raw.trim_start_matches(' ').len())
                .filter(|indent| *indent >= minimum)
                .unwrap_or(usize::MAX),
        };

        let mut body: Vec<String> = Vec::new();
        let mut raw_lines = vec![header.to_string()];
        while self.pos < self.lines.len() {
            let raw = self.lines[self.pos];
            if raw.trim().is_empty() {
                body.push(raw.get(content_indent..).unwrap_or("").to_string());
                raw_lines.push(raw.to_string());
                self.pos += 1;
                continue;
            }
            let indent = raw.len() - raw.trim_start_matches(' ').len();
            if indent < content_indent {
                break;
            }
            body.push(raw[content_indent..].to_string());
            raw_lines.push(raw.to_string());
            self.pos += 1;
        }

        let trailing = body.iter().rev().take_while(|l| l.trim().is_empty()).count();
        // Blank lines after the block belong to the document, not the scalar.
        let consumed_blank = raw_lines.len() - 1 - (body.len() - trailing);
        let core = &body[..body.len() - trailing];
        let text = if folded { fold_lines(core) } else { core.join("\n") };
        let value = match chomp {
            Chomp::Strip => text,
            Chomp::Clip if core.is_empty() => String::new(),
            Chomp::Clip => text + "\n",
            Chomp::Keep if core.is_empty() => "\n".repeat(trailing),
            Chomp::Keep => text + &"\n".repeat(trailing + 1),
        };
        raw_lines.truncate(raw_lines.len() - consumed_blank);

        let style = if folded { NodeStyle::Folded } else { NodeStyle::Literal };
        self.record_layout(path, line, style, None);
        Ok(Node::Scalar(Scalar::with_literal(
            ScalarValue::String(value),
            raw_lines.join("\n"),
        )))
    }

    fn flow_node(&mut self, cursor: &mut Cursor<'_>, path: &NodePath) -> Result<Node, ParseError> {
        cursor.skip_ws();
        while let Some(c @ ('&' | '!')) = cursor.peek() {
            let kind = if c == '&' { ConstructKind::Anchor } else { ConstructKind::Tag };
            let token = cursor.token();
            self.record_construct(kind, &token, path, cursor.line);
            cursor.skip_ws();
        }
        let line = cursor.line;
        match cursor.peek() {
            Some('[') => self.flow_sequence(cursor, path),
            Some('{') => self.flow_mapping(cursor, path),
            Some('"' | '\'') => {
                let start = cursor.pos;
                let (value, style) = cursor.quoted()?;
                let literal = cursor.text[start..cursor.pos].to_string();
                self.record_layout(path, line, style, None);
                Ok(Node::Scalar(Scalar::with_literal(ScalarValue::String(value), literal)))
            }
            Some('*') => {
                let token = cursor.token();
                self.record_construct(ConstructKind::Alias, &token, path, line);
                self.record_layout(path, line, NodeStyle::Plain, None);
                Ok(Node::Scalar(Scalar::with_literal(ScalarValue::Null, token)))
            }
            _ => {
                let text = cursor.plain(false);
                self.record_layout(path, line, NodeStyle::Plain, None);
                Ok(Node::Scalar(Scalar::with_literal(scalar::resolve_plain(&text), text)))
            }
        }
    }

    fn flow_sequence(&mut self, cursor: &mut Cursor<'_>, path: &NodePath) -> Result<Node, ParseError> {
        check_depth(path, cursor.line)?;
        cursor.bump();
        let mut items = Vec::new();
        loop {
            cursor.skip_ws();
            if cursor.eat(']') {
                break;
            }
            let item = self.flow_node(cursor, &path.push_index(items.len()))?;
            items.push(item);
            cursor.skip_ws();
            match cursor.next() {
                Some(',') => continue,
                Some(']') => break,
                Some(c) => return Err(cursor.invalid(format!("unexpected `{c}` in sequence"))),
                None => return Err(ParseError::new(cursor.line, ParseErrorKind::UnterminatedFlow)),
            }
        }
        self.record_layout(path, cursor.line, NodeStyle::Flow, None);
        Ok(Node::Sequence(items))
    }

    fn flow_mapping(&mut self, cursor: &mut Cursor<'_>, path: &NodePath) -> Result<Node, ParseError> {
        check_depth(path, cursor.line)?;
        cursor.bump();
        let mut mapping = Mapping::new();
        loop {
            cursor.skip_ws();
            if cursor.eat('}') {
                break;
            }
            let start = cursor.pos;
            let key = match cursor.peek() {
                Some('"' | '\'') => cursor.quoted()?.0,
                Some(_) => cursor.plain(true),
                None => return Err(ParseError::new(cursor.line, ParseErrorKind::UnterminatedFlow)),
            };
            let key_literal = cursor.text[start..cursor.pos].trim_end().to_string();
            if mapping.contains_key(&key) {
                return Err(ParseError::new(cursor.line, ParseErrorKind::DuplicateKey(key)));
            }
            let child = path.push_key(&key);
            self.record_key(&child, &key_literal);
            cursor.skip_ws();
            let value = if cursor.eat(':') {
                self.flow_node(cursor, &child)?
            } else {
                self.record_layout(&child, cursor.line, NodeStyle::Plain, None);
                Node::Scalar(Scalar::with_literal(ScalarValue::Null, ""))
            };
            mapping.insert(key, value);
            cursor.skip_ws();
            match cursor.next() {
                Some(',') => continue,
                Some('}') => break,
                Some(c) => return Err(cursor.invalid(format!("unexpected `{c}` in mapping"))),
                None => return Err(ParseError::new(cursor.line, ParseErrorKind::UnterminatedFlow)),
            }
        }
        self.record_layout(path, cursor.line, NodeStyle::Flow, None);
        Ok(Node::Mapping(mapping))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Clip,
    Strip,
    Keep,
}

/// Character cursor over a single line, used for quoted scalars and flow collections.
struct Cursor<'t> {
    text: &'t str,
    pos: usize,
    line: usize,
}

impl<'t> Cursor<'t> {
    fn new(text: &'t str, line: usize) -> Self {
        Self { text, pos: 0, line }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump(&mut self) {
        self.next();
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            return true;
        }
        false
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
    }

    fn invalid(&self, reason: String) -> ParseError {
        ParseError::new(self.line, ParseErrorKind::InvalidFlow(reason))
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.pos < self.text.len() {
            return Err(ParseError::new(
                self.line,
                ParseErrorKind::TrailingContent(self.text[self.pos..].to_string()),
            ));
        }
        Ok(())
    }

    /// Anchor, tag or alias token up to whitespace or a flow indicator.
    fn token(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, ',' | '[' | ']' | '{' | '}') {
                break;
            }
            self.bump();
        }
        self.text[start..self.pos].to_string()
    }

    /// Plain scalar inside a flow collection.
    fn plain(&mut self, is_key: bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ',' | ']' | '}') {
                break;
            }
            if c == ':' {
                let after = self.text[self.pos + 1..].chars().next();
                if is_key || matches!(after, None | Some(' ' | ',' | ']' | '}')) {
                    break;
                }
            }
            self.bump();
        }
        self.text[start..self.pos].trim().to_string()
    }

    fn quoted(&mut self) -> Result<(String, NodeStyle), ParseError> {
        match self.next() {
            Some('"') => self.double_quoted().map(|s| (s, NodeStyle::DoubleQuoted)),
            _ => self.single_quoted().map(|s| (s, NodeStyle::SingleQuoted)),
        }
    }

    fn single_quoted(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.next() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    out.push('\'');
                }
                Some('\'') => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(ParseError::new(self.line, ParseErrorKind::UnterminatedQuote)),
            }
        }
    }

    fn double_quoted(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        loop {
            match self.next() {
                Some('"') => return Ok(out),
                Some('\\') => {
                    let Some(escape) = self.next() else {
                        return Err(ParseError::new(self.line, ParseErrorKind::UnterminatedQuote));
                    };
                    let decoded = match escape {
                        'n' => '\n',
                        't' | '\t' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        'a' => '\u{07}',
                        'b' => '\u{08}',
                        'e' => '\u{1b}',
                        'f' => '\u{0c}',
                        'v' => '\u{0b}',
                        '"' => '"',
                        '\\' => '\\',
                        '/' => '/',
                        ' ' => ' ',
                        'N' => '\u{85}',
                        '_' => '\u{a0}',
                        'L' => '\u{2028}',
                        'P' => '\u{2029}',
                        'x' => self.hex_escape(2, escape)?,
                        'u' => self.hex_escape(4, escape)?,
                        'U' => self.hex_escape(8, escape)?,
                        other => {
                            return Err(ParseError::new(
                                self.line,
                                ParseErrorKind::InvalidEscape(other.to_string()),
                            ))
                        }
                    };
                    out.push(decoded);
                }
                Some(c) => out.push(c),
                None => return Err(ParseError::new(self.line, ParseErrorKind::UnterminatedQuote)),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize, marker: char) -> Result<char, ParseError> {
        let start = self.pos;
        let end = start + digits;
        let invalid = || {
            ParseError::new(
                self.line,
                ParseErrorKind::InvalidEscape(format!("{marker}{}", &self.text[start..])),
            )
        };
        let hex = self.text.get(start..end).ok_or_else(invalid)?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        let decoded = char::from_u32(code).ok_or_else(invalid)?;
        self.pos = end;
        Ok(decoded)
    }
}

fn check_depth(path: &NodePath, line: usize) -> Result<(), ParseError> {
    if path.len() >= MAX_DEPTH {
        return Err(ParseError::new(line, ParseErrorKind::TooDeep(MAX_DEPTH)));
    }
    Ok(())
}

fn is_marker(trimmed: &str, marker: &str) -> bool {
    trimmed
        .strip_prefix(marker)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

fn is_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ")
}

/// Splits trailing `# comment` text off a line, ignoring `#` inside quotes.
fn split_comment(text: &str) -> (&str, Option<String>) {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match quote {
            Some('"') if escaped => escaped = false,
            Some('"') if c == '\\' => escaped = true,
            Some('\'') if c == '\'' && chars.peek().is_some_and(|(_, n)| *n == '\'') => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                let at_token_start =
                    prev.map_or(true, |p| p.is_whitespace() || matches!(p, ':' | '[' | '{' | ',' | '-'));
                if (c == '"' || c == '\'') && at_token_start {
                    quote = Some(c);
                } else if c == '#' && prev.map_or(true, char::is_whitespace) {
                    return (&text[..i], Some(text[i + 1..].trim().to_string()));
                }
            }
        }
        prev = Some(c);
    }
    (text, None)
}

/// Splits `key: value` into its parts; `None` when the line is not an entry.
fn split_key(content: &str, line: usize) -> Result<Option<(&str, &str)>, ParseError> {
    if content == "?" || content.starts_with("? ") {
        return Err(ParseError::new(line, ParseErrorKind::ComplexKey));
    }
    if content.starts_with('[') || content.starts_with('{') {
        return Ok(None);
    }
    if content.starts_with('"') || content.starts_with('\'') {
        let mut cursor = Cursor::new(content, line);
        if cursor.quoted().is_err() {
            return Ok(None);
        }
        let key_end = cursor.pos;
        cursor.skip_ws();
        if !cursor.eat(':') {
            return Ok(None);
        }
        if !matches!(cursor.peek(), None | Some(' ' | '\t')) {
            return Ok(None);
        }
        return Ok(Some((&content[..key_end], content[cursor.pos..].trim())));
    }

    let bytes = content.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) {
            let key = content[..i].trim_end();
            if key.is_empty() {
                return Ok(None);
            }
            return Ok(Some((key, content[i + 1..].trim())));
        }
    }
    Ok(None)
}

fn parse_key(key_text: &str, line: usize) -> Result<String, ParseError> {
    if key_text.starts_with('"') || key_text.starts_with('\'') {
        let mut cursor = Cursor::new(key_text, line);
        return cursor.quoted().map(|(key, _)| key);
    }
    Ok(key_text.to_string())
}

/// Applies YAML line folding to the body of a `>` block scalar.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut breaks = 0usize;
    let mut previous_indented: Option<bool> = None;
    for line in lines {
        if line.is_empty() {
            breaks += 1;
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');
        match previous_indented {
            None => out.push_str(&"\n".repeat(breaks)),
            Some(prev) if prev || indented => out.push_str(&"\n".repeat(breaks + 1)),
            Some(_) if breaks == 0 => out.push(' '),
            Some(_) => out.push_str(&"\n".repeat(breaks)),
        }
        out.push_str(line);
        breaks = 0;
        previous_indented = Some(indented);
    }
    out
}
