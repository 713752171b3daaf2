use dyaml_canonical::validation::validate;
use dyaml_canonical::{canonicalize_text, FindingCode, Severity, ValidationReport};
use serde_json::json;

fn report(text: &str) -> ValidationReport {
    validate(text, false).unwrap()
}

fn codes(report: &ValidationReport) -> Vec<FindingCode> {
    report.findings.iter().map(|f| f.code).collect()
}

#[test]
fn canonical_text_has_no_findings() {
    let report = report("$human$: Primary account holder\nactive: true\nage: 30\nname: John\n");
    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert!(report.is_valid());
}

#[test]
fn canonical_output_always_validates() {
    let text = "# settings\nzeta: [b, a]\nalpha:\n  port: 0x50\n  hosts:\n    - {name: db}\n    - - 1\n      - 2\n";
    let canonical = canonicalize_text(text).unwrap().text;
    let strict = validate(&canonical, true).unwrap();
    assert!(strict.findings.is_empty(), "{:?}", strict.findings);
}

#[test]
fn structural_deviations_are_errors() {
    let cases: Vec<(&str, FindingCode)> = vec![
        ("b: 1\na: 2\n", FindingCode::KeyOrder),
        ("a: yes\n", FindingCode::ScalarSpelling),
        ("'a': 1\n", FindingCode::KeySpelling),
        ("a:\n    b: 1\n", FindingCode::IndentWidth),
        ("a: [1, 2]\n", FindingCode::FlowStyle),
        ("a: |\n  x\n", FindingCode::BlockScalar),
        ("# note\na: 1\n", FindingCode::Comment),
        ("a: \"x\ty\"\n", FindingCode::TabCharacter),
        ("a: &x 1\n", FindingCode::UnsupportedConstruct),
        ("a:\n- 1\n", FindingCode::IndentWidth),
    ];
    for (text, code) in cases {
        let report = report(text);
        assert!(report.has(code), "{code:?} missing for {text:?}: {:?}", report.findings);
        assert!(!report.is_valid(), "{text:?} should be invalid");
    }
}

#[test]
fn empty_flow_collections_are_canonical() {
    let report = report("a: []\nb: {}\n");
    assert!(report.findings.is_empty(), "{:?}", report.findings);
}

#[test]
fn unsupported_construct_suppresses_residual_check() {
    let report = report("a: &x 1\n");
    assert_eq!(codes(&report), vec![FindingCode::UnsupportedConstruct]);
}

#[test]
fn escape_collision_is_reported() {
    let report = report("$human$: a\n$$human$: b\n# c\nx: 1\n");
    assert!(report.has(FindingCode::KeyCollision));
    assert!(report.has(FindingCode::Comment));
}

#[test]
fn stylistic_findings_depend_on_strict_mode() {
    let text = "a: 1\n\nb: 2  \nc: 3\n\n";

    let relaxed = validate(text, false).unwrap();
    assert!(relaxed.is_valid());
    assert_eq!(
        codes(&relaxed),
        vec![
            FindingCode::BlankLine,
            FindingCode::TrailingWhitespace,
            FindingCode::TrailingBlankLines,
        ]
    );
    assert_eq!(relaxed.count(Severity::Info), 3);

    let strict = validate(text, true).unwrap();
    assert!(!strict.is_valid());
    assert_eq!(strict.count(Severity::Error), 3);
}

#[test]
fn missing_final_newline_is_stylistic() {
    let relaxed = report("a: 1");
    assert_eq!(codes(&relaxed), vec![FindingCode::MissingFinalNewline]);
    assert!(relaxed.is_valid());
    assert!(!validate("a: 1", true).unwrap().is_valid());
}

#[test]
fn residual_difference_is_not_canonical() {
    let report = report("a:   1\n");
    assert_eq!(codes(&report), vec![FindingCode::NotCanonical]);
    assert!(!report.is_valid());
}

#[test]
fn orphaned_comment_is_reported() {
    let report = report("- a\n# lost\n- b\n");
    assert!(report.has(FindingCode::OrphanedAnnotation));
    let orphan = report
        .findings
        .iter()
        .find(|f| f.code == FindingCode::OrphanedAnnotation)
        .unwrap();
    assert_eq!(orphan.severity, Severity::Warning);
    assert_eq!(orphan.location.line, Some(2));
}

#[test]
fn findings_are_ordered_by_line() {
    let report = report("z: 1\na: yes\nm: 'x'\n");
    let lines: Vec<Option<usize>> = report.findings.iter().map(|f| f.location.line).collect();
    let mut sorted = lines.clone();
    sorted.sort_by_key(|line| line.unwrap_or(usize::MAX));
    assert_eq!(lines, sorted);
}

#[test]
fn finding_serializes_to_expected_shape() {
    let report = report("a: yes\n");
    assert_eq!(
        serde_json::to_value(&report.findings[0]).unwrap(),
        json!({
            "location": {"path": "a", "line": 1},
            "code": "ScalarSpelling",
            "message": "`yes` should be spelled `true`",
            "severity": "error"
        })
    );
}

#[test]
fn parse_errors_are_returned() {
    assert!(validate("a: 1\na: 2\n", false).is_err());
}

#[test]
fn key_order_follows_quoted_spelling() {
    assert!(report("\"1\": 3\n\"true\": 2\nabc: 1\n").findings.is_empty());

    let raw_order = report("\"1\": 3\nabc: 1\n\"true\": 2\n");
    assert_eq!(codes(&raw_order), vec![FindingCode::KeyOrder]);
}
