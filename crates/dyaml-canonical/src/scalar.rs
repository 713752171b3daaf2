//! Scalar resolution and canonical spelling.
//!
//! A plain (unquoted) scalar is resolved with YAML 1.2 core-schema rules plus
//! the YAML 1.1 boolean words (`yes`, `on`, ...). Every semantic value has
//! exactly one canonical spelling, and [`needs_quotes`] decides whether a string
//! must be double-quoted so that it does not re-parse as something else.
//!
//! Writing is stricter than reading: a string that a YAML 1.1 reader would
//! take as a number (`0b101`, `1_000`, `1:30`) is quoted even though it
//! resolves to a string here.

use regex::Regex;
use std::sync::OnceLock;

use crate::tree::{ScalarValue, ANNOTATION_KEY};

/// Canonical spelling of the null value.
pub const NULL_SPELLING: &str = "null";

/// Strings that are always quoted because they carry meaning to YAML tooling.
pub const RESERVED_KEYWORDS: &[&str] = &["<<", "=", ANNOTATION_KEY];

/// Characters that change parsing when they start a plain scalar.
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '#', '\'', '"', '[', ']', '{', '}', '&', '*', '!', '|', '>', '%', '@',
    '`',
];

fn decimal_int() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[-+]?[0-9]+$").expect("invalid regex"))
}

fn hex_int() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]+$").expect("invalid regex"))
}

fn octal_int() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0o[0-7]+$").expect("invalid regex"))
}

fn float_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$").expect("invalid regex")
    })
}

/// Numbers only YAML 1.1 readers recognise: binary, `_` digit groups and
/// base-60 forms.
fn yaml11_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[-+]?(0b[01_]+|0x[0-9a-fA-F_]+|[0-9][0-9_]*(:[0-5]?[0-9])*(\.[0-9_]*)?)$")
            .expect("invalid regex")
    })
}

/// Resolves the text of a plain scalar to its semantic value.
pub fn resolve_plain(text: &str) -> ScalarValue {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return ScalarValue::Null,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            return ScalarValue::Bool(true)
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            return ScalarValue::Bool(false)
        }
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return ScalarValue::Float(f64::INFINITY)
        }
        "-.inf" | "-.Inf" | "-.INF" => return ScalarValue::Float(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return ScalarValue::Float(f64::NAN),
        _ => {}
    }

    if decimal_int().is_match(text) {
        return match text.parse::<i64>() {
            Ok(value) => ScalarValue::Int(value),
            // Out of i64 range: keep the magnitude as a float.
            Err(_) => text
                .parse::<f64>()
                .map(ScalarValue::Float)
                .unwrap_or_else(|_| ScalarValue::String(text.to_string())),
        };
    }
    if hex_int().is_match(text) {
        if let Ok(value) = i64::from_str_radix(&text[2..], 16) {
            return ScalarValue::Int(value);
        }
    }
    if octal_int().is_match(text) {
        if let Ok(value) = i64::from_str_radix(&text[2..], 8) {
            return ScalarValue::Int(value);
        }
    }
    if float_number().is_match(text) {
        if let Ok(value) = text.parse::<f64>() {
            return ScalarValue::Float(value);
        }
    }
    ScalarValue::String(text.to_string())
}

/// Returns true when `text` is a decimal integer literal (in or out of `i64` range).
pub fn is_integer_literal(text: &str) -> bool {
    decimal_int().is_match(text)
}

/// Canonical spelling of a semantic value.
pub fn spell(value: &ScalarValue) -> String {
    match value {
        ScalarValue::Null => NULL_SPELLING.to_string(),
        ScalarValue::Bool(true) => "true".to_string(),
        ScalarValue::Bool(false) => "false".to_string(),
        ScalarValue::Int(v) => v.to_string(),
        ScalarValue::Float(v) => spell_float(*v),
        ScalarValue::String(s) => spell_string(s),
    }
}

/// Canonical float spelling: shortest round-trip digits, a digit on both
/// sides of the point, lowercase exponent.
pub fn spell_float(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let shortest = format!("{value:?}");
    let (mantissa, exponent) = match shortest.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (shortest.as_str(), None),
    };
    let mut out = mantissa.to_string();
    if !out.contains('.') {
        out.push_str(".0");
    }
    if let Some(exponent) = exponent {
        out.push('e');
        out.push_str(exponent);
    }
    out
}

/// Canonical spelling of a string: plain when safe, double-quoted otherwise.
pub fn spell_string(text: &str) -> String {
    if needs_quotes(text) {
        quote(text)
    } else {
        text.to_string()
    }
}

/// Canonical spelling of a mapping key. The annotation key is written bare;
/// every other key follows the string rules.
pub fn spell_key(key: &str) -> String {
    if key == ANNOTATION_KEY {
        key.to_string()
    } else {
        spell_string(key)
    }
}

/// Sort key giving canonical mapping order: the annotation key first, then
/// byte-wise on the canonical spelling of each key.
pub fn key_rank(key: &str) -> (bool, String) {
    (key != ANNOTATION_KEY, spell_key(key))
}

/// Decides whether a string must be quoted to survive a re-parse as a string.
pub fn needs_quotes(text: &str) -> bool {
    let (Some(first), Some(last)) = (text.chars().next(), text.chars().last()) else {
        return true;
    };
    if !matches!(resolve_plain(text), ScalarValue::String(_)) {
        return true;
    }
    if RESERVED_KEYWORDS.contains(&text) || yaml11_number().is_match(text) {
        return true;
    }
    if INDICATORS.contains(&first) || text.starts_with("...") {
        return true;
    }
    if first.is_whitespace() || last.is_whitespace() {
        return true;
    }
    if text.chars().any(char::is_control) {
        return true;
    }
    text.contains(": ") || text.contains(" #") || text.ends_with(':')
}

/// Double-quotes a string using the canonical escape table
/// (`\\`, `\"`, `\n`, `\t`); every other character is written as-is.
///
/// `\r`, U+0085, U+2028 and U+2029 therefore appear raw inside the quotes.
/// YAML readers fold them as line breaks, so strings holding them do not
/// survive a round trip through other tooling.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}
