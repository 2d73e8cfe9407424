//! Text rendering for diagnostics.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PathSegment;
use crate::value::{Value, format_number};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern compiles")
});

/// Render a literal the way it would be written in source: strings quoted,
/// bigints with an `n` suffix, symbols as `Symbol(desc)`.
pub fn literal_to_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::BigInt(n) => format!("{n}n"),
        Value::String(s) => serde_json::Value::String(s.clone()).to_string(),
        Value::Symbol(sym) => sym.to_string(),
        Value::Array(_) | Value::Object(_) => match value.to_json() {
            Ok(json) => json.to_string(),
            Err(_) => format!("<{}>", value.kind()),
        },
    }
}

/// `$`, `$.a[1]`, `$["weird key"]`.
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::from("$");
    for segment in path {
        match segment {
            PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            PathSegment::Key(k) if IDENTIFIER.is_match(k) => {
                out.push('.');
                out.push_str(k);
            }
            PathSegment::Key(k) => {
                out.push('[');
                out.push_str(&serde_json::Value::String(k.clone()).to_string());
                out.push(']');
            }
        }
    }
    out
}

// ------------------------------- Tests ------------------------------------ //
