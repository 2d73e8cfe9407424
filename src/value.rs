//! Dynamic input values.
//!
//! `Value` is the "unknown" side of validation: whatever arrived over the
//! wire or out of a config file, decoded into a closed set of kinds. It is a
//! superset of JSON (it also knows `undefined`, bigints and symbols) so that
//! schemas can express the full set of atomic kinds.
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;

/// Insertion-ordered property map of an object value.
pub type Map = IndexMap<String, Value>;

// ------------------------------- Symbol ---------------------------------- //

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// A unique token. Two symbols are equal only if one is a clone of the other;
/// the description is for display only.
#[derive(Clone, Debug)]
pub struct Symbol {
    id: u64,
    description: Option<Arc<str>>,
}

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        let description: String = description.into();
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: Some(Arc::from(description)),
        }
    }

    pub fn anonymous() -> Self {
        Self { id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed), description: None }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

// -------------------------------- Value ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i128),
    String(String),
    Symbol(Symbol),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Name of the dynamic kind, as used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Property read the way the host's `key in v` followed by `v[key]` sees
    /// it. Arrays expose their elements under canonical index keys (`"0"`,
    /// not `"00"`) and their `length`.
    pub fn property(&self, key: &str) -> Option<Cow<'_, Value>> {
        match self {
            Value::Object(m) => m.get(key).map(Cow::Borrowed),
            Value::Array(xs) if key == "length" => Some(Cow::Owned(Value::Number(xs.len() as f64))),
            Value::Array(xs) => array_index(key, xs.len()).map(|i| Cow::Borrowed(&xs[i])),
            _ => None,
        }
    }

    /// Own enumerable entries: object entries in insertion order, array
    /// elements under their index. Empty for primitives.
    pub fn entries(&self) -> Vec<(Cow<'_, str>, &Value)> {
        match self {
            Value::Object(m) => m.iter().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)).collect(),
            Value::Array(xs) => xs.iter().enumerate().map(|(i, v)| (Cow::Owned(i.to_string()), v)).collect(),
            _ => Vec::new(),
        }
    }

    /// Write back a property read through [`Value::property`]. Only element
    /// indices are writable on arrays; writes to `length` are dropped.
    pub(crate) fn set_property(&mut self, key: &str, next: Value) {
        match self {
            Value::Object(m) => {
                m.insert(key.to_string(), next);
            }
            Value::Array(xs) => {
                if let Some(i) = array_index(key, xs.len()) {
                    xs[i] = next;
                }
            }
            _ => {}
        }
    }

    /// Identity comparison used by literal schemas.
    ///
    /// Numbers follow IEEE equality (`NaN` never matches, `0 == -0`), symbols
    /// compare by identity. Arrays and objects are never strictly equal.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            _ => false,
        }
    }

    /// Map onto plain JSON.
    ///
    /// `undefined` is dropped from objects and becomes `null` elsewhere.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        Ok(match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => json_number(*n)?,
            Value::BigInt(n) => {
                if let Ok(i) = i64::try_from(*n) {
                    serde_json::Value::from(i)
                } else if let Ok(u) = u64::try_from(*n) {
                    serde_json::Value::from(u)
                } else {
                    return Err(ValueError::BigIntRange(*n));
                }
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Symbol(sym) => return Err(ValueError::Symbol(sym.to_string())),
            Value::Array(xs) => {
                serde_json::Value::Array(xs.iter().map(Value::to_json).collect::<Result<_, _>>()?)
            }
            Value::Object(m) => {
                let mut out = serde_json::Map::with_capacity(m.len());
                for (k, v) in m {
                    if matches!(v, Value::Undefined) {
                        continue;
                    }
                    out.insert(k.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
        })
    }
}

fn array_index(key: &str, len: usize) -> Option<usize> {
    let i: usize = key.parse().ok()?;
    (i < len && i.to_string() == key).then_some(i)
}

// Prefer emitting integers when exact.
fn json_number(n: f64) -> Result<serde_json::Value, ValueError> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        return Ok(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .ok_or(ValueError::NonFinite(n))
}

/// Host rendering of a number: `1` rather than `1.0`, `NaN`, `Infinity`.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n == 0.0 {
        "0".to_string()
    } else if n < 0.0 {
        format!("-{}", format_magnitude(-n))
    } else {
        format_magnitude(n)
    }
}

// Plain notation for decimal exponents in [-7, 21), scientific otherwise,
// from the shortest round-trip digits.
fn format_magnitude(n: f64) -> String {
    let sci = format!("{n:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exp + 1;
    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat(-point as usize))
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{}", exp.abs())
    }
}

/// Numeric coercion of a textual key (`Number("0")` in the host).
///
/// Whitespace is trimmed, the empty string is `0`, anything unparsable is `NaN`.
pub fn numeric_coercion(text: &str) -> f64 {
    let t = text.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(n) = radix_literal(t) {
        return n;
    }
    // Rust also accepts "inf"/"nan" spellings; the host does not.
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

// `0x1f`, `0o17`, `0b101`: unsigned, at least one digit.
fn radix_literal(text: &str) -> Option<f64> {
    let radix = match text.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &text[2..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Some(f64::NAN);
    }
    Some(digits.chars().filter_map(|c| c.to_digit(radix)).fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)))
}

/// Host string coercion (`String(v)`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::BigInt(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Symbol(sym) => write!(f, "{sym}"),
            Value::Array(xs) => {
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !matches!(x, Value::Undefined | Value::Null) {
                        write!(f, "{x}")?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
        }
    }
}

// ----------------------------- Conversions ------------------------------- //

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(xs) => Value::Array(xs.iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Object(m.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(xs) => Value::Array(xs.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(m) => {
                Value::Object(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            other => Value::from(&other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self {
        Value::Array(xs)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Object(m)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().map_err(serde::ser::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn symbols_compare_by_identity() {
        let a = Symbol::new("a");
        let b = Symbol::new("a");
        assert!(Value::from(a.clone()).strict_eq(&Value::from(a.clone())));
        assert!(!Value::from(a).strict_eq(&Value::from(b)));
    }

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = Value::Number(f64::NAN);
        assert!(!nan.strict_eq(&nan));
        assert!(Value::Number(0.0).strict_eq(&Value::Number(-0.0)));
        assert!(!Value::Number(1.0).strict_eq(&Value::BigInt(1)));
    }

    #[test]
    fn composites_are_not_strictly_equal() {
        let xs = Value::Array(vec![]);
        assert!(!xs.strict_eq(&xs));
    }

    #[test]
    fn numeric_coercion_matches_host() {
        assert_eq!(numeric_coercion("0"), 0.0);
        assert_eq!(numeric_coercion(" 12 "), 12.0);
        assert_eq!(numeric_coercion(""), 0.0);
        assert_eq!(numeric_coercion("1e3"), 1000.0);
        assert!(numeric_coercion("abc").is_nan());
        assert!(numeric_coercion("inf").is_nan());
        assert_eq!(numeric_coercion("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(numeric_coercion("0x10"), 16.0);
        assert_eq!(numeric_coercion(" 0B101 "), 5.0);
        assert_eq!(numeric_coercion("0o17"), 15.0);
        assert!(numeric_coercion("0x").is_nan());
        assert!(numeric_coercion("0b2").is_nan());
        assert!(numeric_coercion("-0x10").is_nan());
    }

    #[test]
    fn numbers_print_like_the_host() {
        let cases = [
            (1e21, "1e+21"),
            (1e-7, "1e-7"),
            (1.5e-7, "1.5e-7"),
            (0.000001, "0.000001"),
            (123456789012345680000.0, "123456789012345680000"),
            (-2.5e30, "-2.5e+30"),
            (1234.5, "1234.5"),
            (100.0, "100"),
            (-0.0, "0"),
        ];
        for (n, text) in cases {
            assert_eq!(format_number(n), text, "{n:?}");
        }
    }

    #[test]
    fn two_to_the_63_is_not_saturated() {
        let json = Value::Number(9223372036854775808.0).to_json().unwrap();
        assert_eq!(json.as_f64(), Some(9223372036854775808.0));
        assert!(json.as_i64().is_none());
        assert_eq!(Value::Number(-9223372036854775808.0).to_json().unwrap(), json!(i64::MIN));
    }

    #[test]
    fn display_is_host_string_coercion() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::BigInt(7).to_string(), "7");
        assert_eq!(Value::from(Symbol::new("a")).to_string(), "Symbol(a)");
        assert_eq!(Value::from(json!([1, null, "x"])).to_string(), "1,,x");
        assert_eq!(Value::from(json!({"a": 1})).to_string(), "[object Object]");
    }

    #[test]
    fn json_mapping_drops_undefined_members() {
        let v = Value::object([("a", Value::Undefined), ("b", Value::from(1))]);
        assert_eq!(v.to_json().unwrap(), json!({"b": 1}));
        let xs = Value::Array(vec![Value::Undefined, Value::Number(2.5)]);
        assert_eq!(xs.to_json().unwrap(), json!([null, 2.5]));
    }

    #[test]
    fn json_mapping_rejects_non_json_values() {
        assert!(matches!(Value::Number(f64::NAN).to_json(), Err(ValueError::NonFinite(_))));
        assert!(matches!(Value::from(Symbol::anonymous()).to_json(), Err(ValueError::Symbol(_))));
        assert!(matches!(Value::BigInt(i128::MAX).to_json(), Err(ValueError::BigIntRange(_))));
    }

    #[test]
    fn object_order_survives_json_round_trip() {
        let source = json!({"z": 1, "a": 2, "m": [true]});
        let v = Value::from(&source);
        let keys: Vec<_> = v.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
        assert_eq!(v.to_json().unwrap(), source);
    }
}
