use dyaml_canonical::parser::{NodeStyle, MAX_DEPTH};
use dyaml_canonical::{ConstructKind, Document, Node, NodePath, ParseErrorKind, ScalarValue};

fn parse(text: &str) -> Document {
    Document::parse(text).unwrap()
}

fn path(keys: &[&str]) -> NodePath {
    keys.iter().fold(NodePath::root(), |p, k| p.push_key(k))
}

fn value_at(document: &Document, keys: &[&str]) -> ScalarValue {
    document
        .root()
        .get_path(&path(keys))
        .and_then(Node::as_scalar)
        .map(|s| s.value().clone())
        .unwrap()
}

fn rendered(document: &Document, at: &NodePath) -> Vec<String> {
    document
        .annotations_for(at)
        .iter()
        .map(|a| a.rendered())
        .collect()
}

#[test]
fn comments_are_kept_in_source_order() {
    let document = parse("# first\na: 1 # trailing\n# second\nb: 2\n");
    assert_eq!(
        rendered(&document, &NodePath::root()),
        vec!["first", "a: trailing", "second"]
    );
    assert_eq!(document.annotations_for(&NodePath::root())[1].line, 2);
}

#[test]
fn comment_belongs_to_mapping_of_next_entry() {
    let document = parse("server:\n  # port note\n  port: 80\nother: 1\n");
    assert_eq!(rendered(&document, &path(&["server"])), vec!["port note"]);
    assert!(document.annotations_for(&NodePath::root()).is_empty());
}

#[test]
fn comment_before_mapping_item_belongs_to_item() {
    let document = parse("users:\n  # admin account\n  - name: root\n  - name: guest\n");
    let item = path(&["users"]).push_index(0);
    assert_eq!(rendered(&document, &item), vec!["admin account"]);
}

#[test]
fn comment_before_scalar_item_belongs_to_enclosing_mapping() {
    let document = parse("ports:\n  # http\n  - 80\n");
    assert_eq!(rendered(&document, &NodePath::root()), vec!["http"]);
}

#[test]
fn comment_without_owner_is_orphaned() {
    let document = parse("- a\n# lost\n- b\n");
    assert_eq!(document.orphaned_annotations().len(), 1);
    assert_eq!(document.orphaned_annotations()[0].text, "lost");
}

#[test]
fn hash_inside_quotes_is_not_a_comment() {
    let document = parse("a: \"x # y\"\nb: 'it''s # here'\nc: x#y\n");
    assert_eq!(value_at(&document, &["a"]), ScalarValue::String("x # y".into()));
    assert_eq!(value_at(&document, &["b"]), ScalarValue::String("it's # here".into()));
    assert_eq!(value_at(&document, &["c"]), ScalarValue::String("x#y".into()));
    assert!(document.annotations_for(&NodePath::root()).is_empty());
}

#[test]
fn rejected_constructs_are_recorded() {
    let document = parse("%YAML 1.2\n---\na: &x 1\nb: *x\nc: !custom 2\n");
    let kinds: Vec<ConstructKind> = document
        .rejected_constructs()
        .iter()
        .map(|c| c.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            ConstructKind::Directive,
            ConstructKind::DocumentMarker,
            ConstructKind::Anchor,
            ConstructKind::Alias,
            ConstructKind::Tag,
        ]
    );
    let alias = &document.rejected_constructs()[3];
    assert_eq!(alias.spelling, "*x");
    assert_eq!(alias.path, path(&["b"]));
    assert_eq!(alias.line, 4);
    assert_eq!(value_at(&document, &["c"]), ScalarValue::Int(2));
}

#[test]
fn second_document_is_not_read() {
    let document = parse("a: 1\n---\nb: 2\n");
    assert!(document.root().get_path(&path(&["b"])).is_none());
    assert_eq!(document.rejected_constructs().len(), 1);
}

#[test]
fn malformed_input_is_reported_with_line() {
    let cases: Vec<(&str, usize, ParseErrorKind)> = vec![
        ("a: 1\na: 2\n", 2, ParseErrorKind::DuplicateKey("a".into())),
        ("a:\n\tb: 1\n", 2, ParseErrorKind::TabIndent),
        ("a: \"open\n", 1, ParseErrorKind::UnterminatedQuote),
        ("? a\n", 1, ParseErrorKind::ComplexKey),
        ("a: [1,\n  2]\n", 1, ParseErrorKind::UnterminatedFlow),
        ("a:\n    b: 1\n  c: 2\n", 3, ParseErrorKind::UnexpectedIndent),
        ("a: \"\\q\"\n", 1, ParseErrorKind::InvalidEscape("q".into())),
        ("a: \"x\" y\n", 1, ParseErrorKind::TrailingContent("y".into())),
        ("a: |x\n  b\n", 1, ParseErrorKind::InvalidBlockHeader("|x".into())),
    ];
    for (text, line, kind) in cases {
        let err = Document::parse(text).unwrap_err();
        assert_eq!((err.line, err.kind), (line, kind), "input: {text:?}");
    }
}

#[test]
fn block_scalars_follow_chomping_and_folding() {
    let document = parse("lit: |\n  one\n  two\nfold: >\n  one\n  two\n\n  three\nstrip: |-\n  x\nkeep: |+\n  y\n\nlast: 1\n");
    assert_eq!(value_at(&document, &["lit"]), ScalarValue::String("one\ntwo\n".into()));
    assert_eq!(value_at(&document, &["fold"]), ScalarValue::String("one two\nthree\n".into()));
    assert_eq!(value_at(&document, &["strip"]), ScalarValue::String("x".into()));
    assert_eq!(value_at(&document, &["keep"]), ScalarValue::String("y\n\n".into()));
    assert_eq!(value_at(&document, &["last"]), ScalarValue::Int(1));
    assert_eq!(
        document.layout(&path(&["fold"])).map(|l| l.style),
        Some(NodeStyle::Folded)
    );
}

#[test]
fn quoted_scalars_decode_escapes() {
    let document = parse("a: \"tab\\there \\u00e9 \\x41\"\nb: 'single ''quoted'''\n");
    assert_eq!(value_at(&document, &["a"]), ScalarValue::String("tab\there é A".into()));
    assert_eq!(value_at(&document, &["b"]), ScalarValue::String("single 'quoted'".into()));
}

#[test]
fn plain_scalars_resolve_with_core_rules() {
    let document = parse("a: Yes\nb: y\nc: 0o17\nd: .inf\ne: -.5\nf: ~\ng: 1.2.3\n");
    assert_eq!(value_at(&document, &["a"]), ScalarValue::Bool(true));
    assert_eq!(value_at(&document, &["b"]), ScalarValue::String("y".into()));
    assert_eq!(value_at(&document, &["c"]), ScalarValue::Int(15));
    assert_eq!(value_at(&document, &["d"]), ScalarValue::Float(f64::INFINITY));
    assert_eq!(value_at(&document, &["e"]), ScalarValue::Float(-0.5));
    assert_eq!(value_at(&document, &["f"]), ScalarValue::Null);
    assert_eq!(value_at(&document, &["g"]), ScalarValue::String("1.2.3".into()));
}

#[test]
fn multi_line_plain_scalars_are_folded() {
    let document = parse("a: one\n  two\n  three\nb: 2\n");
    assert_eq!(value_at(&document, &["a"]), ScalarValue::String("one two three".into()));
}

#[test]
fn compact_sequences_and_crlf_are_accepted() {
    let document = parse("a:\r\n- 1\r\n- 2\r\nb: 3\r\n");
    let items = document
        .root()
        .get_path(&path(&["a"]))
        .and_then(Node::as_sequence)
        .unwrap();
    assert_eq!(items, &[Node::int(1), Node::int(2)][..]);
    assert_eq!(value_at(&document, &["b"]), ScalarValue::Int(3));
    assert_eq!(document.layout(&path(&["a"])).and_then(|l| l.indent), Some(0));
}

#[test]
fn flow_collections_are_parsed_on_one_line() {
    let document = parse("a: {x: 1, \"y z\": [true, 'q'], url: http://host:80}\n");
    let a = path(&["a"]);
    assert_eq!(value_at(&document, &["a", "x"]), ScalarValue::Int(1));
    assert_eq!(
        value_at(&document, &["a", "url"]),
        ScalarValue::String("http://host:80".into())
    );
    let inner = document
        .root()
        .get_path(&a.push_key("y z"))
        .and_then(Node::as_sequence)
        .unwrap();
    assert_eq!(inner, &[Node::bool(true), Node::string("q")][..]);
    assert_eq!(document.layout(&a).map(|l| l.style), Some(NodeStyle::Flow));
    assert_eq!(
        document
            .layout(&a.push_key("y z"))
            .and_then(|l| l.key_literal.clone()),
        Some("\"y z\"".to_string())
    );
}

#[test]
fn structural_equality_ignores_order_and_spelling() {
    let a = parse("x: yes\ny: [1, 2]\n");
    let b = parse("y:\n  - 1\n  - 2\nx: true\n");
    assert_eq!(a.root(), b.root());
    assert!(!a.root().canonical_eq(b.root()));
}

#[test]
fn empty_document_is_null() {
    let document = parse("# only a comment\n");
    assert_eq!(
        document.root().as_scalar().map(|s| s.value().clone()),
        Some(ScalarValue::Null)
    );
    assert_eq!(document.orphaned_annotations().len(), 1);
}

#[test]
fn nesting_beyond_the_limit_is_rejected() {
    let deep_flow = format!("{}{}\n", "[".repeat(10_000), "]".repeat(10_000));
    let err = Document::parse(&deep_flow).unwrap_err();
    assert_eq!((err.line, err.kind), (1, ParseErrorKind::TooDeep(MAX_DEPTH)));

    let deep_block: String = (0..MAX_DEPTH + 1)
        .map(|level| format!("{}k:\n", "  ".repeat(level)))
        .collect();
    let err = Document::parse(&deep_block).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::TooDeep(MAX_DEPTH));

    let at_limit = format!("{}{}\n", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
    assert!(Document::parse(&at_limit).is_ok());
}
