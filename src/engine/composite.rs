//! Containers and combinators.
use tracing::trace;

use super::{Env, Mode, Pass, descend};
use crate::error::PathSegment;
use crate::schema::{ObjectSchema, Schema};
use crate::value::{Value, numeric_coercion};

pub(super) enum Bound {
    Min,
    Max,
}

pub(super) fn array<M: Mode>(element: &Schema, value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    let Value::Array(items) = value else {
        return Err(M::fail(|| "not an array".to_string()));
    };
    positional::<M>(|_| element, items, env)
}

pub(super) fn non_empty_array<M: Mode>(
    element: &Schema,
    value: &Value,
    env: Env<'_>,
) -> Result<Pass, M::Error> {
    let Value::Array(items) = value else {
        return Err(M::fail(|| "not an array".to_string()));
    };
    if items.is_empty() {
        return Err(M::fail(|| "array is empty".to_string()));
    }
    positional::<M>(|_| element, items, env)
}

/// Base first; the length bound applies to whatever the base handed back.
pub(super) fn bounded_length<M: Mode>(
    base: &Schema,
    length: usize,
    bound: Bound,
    value: &Value,
    env: Env<'_>,
) -> Result<Pass, M::Error> {
    let pass = descend::<M>(base, value, env)?;
    let actual = match pass.resolve(value) {
        Value::Array(items) => items.len(),
        _ => return Err(M::fail(|| "not an array".to_string())),
    };
    match bound {
        Bound::Min if actual < length => {
            Err(M::fail(|| format!("array must contain at least {length} elements")))
        }
        Bound::Max if actual > length => {
            Err(M::fail(|| format!("array must contain at most {length} elements")))
        }
        _ => Ok(pass),
    }
}

pub(super) fn tuple<M: Mode>(parts: &[Schema], value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    let Value::Array(items) = value else {
        return Err(M::fail(|| "not an array".to_string()));
    };
    if items.len() != parts.len() {
        return Err(M::fail(|| {
            format!("tuple length mismatch: expected {}, got {}", parts.len(), items.len())
        }));
    }
    positional::<M>(|i| &parts[i], items, env)
}

// Elements in index order; the first failure aborts.
fn positional<'s, M: Mode>(
    schema_at: impl Fn(usize) -> &'s Schema,
    items: &[Value],
    env: Env<'_>,
) -> Result<Pass, M::Error> {
    let mut changed: Option<Vec<Value>> = None;
    for (i, item) in items.iter().enumerate() {
        let pass = descend::<M>(schema_at(i), item, env).map_err(|e| M::nest(e, || PathSegment::Index(i)))?;
        if let Pass::Replaced(next) = pass {
            changed.get_or_insert_with(|| items.to_vec())[i] = next;
        }
    }
    Ok(changed.map_or(Pass::Kept, |xs| Pass::Replaced(Value::Array(xs))))
}

/// Declared properties only; anything else on the input passes through.
/// Arrays are structured values too, read through their index keys.
pub(super) fn object<M: Mode>(obj: &ObjectSchema, value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    if value.is_primitive() {
        return Err(M::fail(|| "not an object".to_string()));
    }
    let mut changed: Option<Value> = None;
    for (key, schema, required) in obj.properties() {
        let Some(item) = value.property(key) else {
            if required {
                let missing = M::fail(|| "missing required property".to_string());
                return Err(M::nest(missing, || PathSegment::from(key)));
            }
            continue;
        };
        let pass = descend::<M>(schema, &item, env).map_err(|e| M::nest(e, || PathSegment::from(key)))?;
        if let Pass::Replaced(next) = pass {
            changed.get_or_insert_with(|| value.clone()).set_property(key, next);
        }
    }
    Ok(changed.map_or(Pass::Kept, Pass::Replaced))
}

/// Every own key and value. Value conversions are kept, key conversions are
/// only used for acceptance.
pub(super) fn record<M: Mode>(
    key_schema: &Schema,
    value_schema: &Schema,
    value: &Value,
    env: Env<'_>,
) -> Result<Pass, M::Error> {
    if value.is_primitive() {
        return Err(M::fail(|| "not an object".to_string()));
    }
    let mut changed: Option<Value> = None;
    for (key, item) in value.entries() {
        record_key::<M>(key_schema, &key, env).map_err(|e| {
            M::nest(M::reword(e, |m| format!("Record key: {m}")), || PathSegment::from(&*key))
        })?;
        let pass = descend::<M>(value_schema, item, env).map_err(|e| {
            M::nest(M::reword(e, |m| format!("Record value: {m}")), || PathSegment::from(&*key))
        })?;
        if let Pass::Replaced(next) = pass {
            changed.get_or_insert_with(|| value.clone()).set_property(&key, next);
        }
    }
    Ok(changed.map_or(Pass::Kept, Pass::Replaced))
}

// Keys arrive as text; a key the schema rejects as text gets a second chance
// as its numeric coercion, unless that is NaN.
fn record_key<M: Mode>(key_schema: &Schema, key: &str, env: Env<'_>) -> Result<(), M::Error> {
    let textual = match descend::<M>(key_schema, &Value::from(key), env) {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };
    let numeric = numeric_coercion(key);
    if numeric.is_nan() {
        return Err(textual);
    }
    descend::<M>(key_schema, &Value::Number(numeric), env).map(|_| ())
}

/// First alternative that accepts wins, converted value included.
pub(super) fn union<M: Mode>(parts: &[Schema], value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    let mut errors = Vec::with_capacity(parts.len());
    for part in parts {
        match descend::<M>(part, value, env) {
            Ok(pass) => return Ok(pass),
            Err(e) => errors.push(e),
        }
    }
    trace!(alternatives = parts.len(), "union exhausted");
    Err(M::exhausted(errors))
}

/// Every part sees the original input. Conversions of structured values are
/// merged key by key, later parts winning; any other conversion replaces the
/// output outright.
pub(super) fn intersection<M: Mode>(parts: &[Schema], value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    let mut out: Option<Value> = None;
    for part in parts {
        if let Pass::Replaced(next) = descend::<M>(part, value, env)? {
            out = Some(match out {
                Some(merged) => merge_conversions(value, merged, next),
                None => next,
            });
        }
    }
    Ok(out.map_or(Pass::Kept, Pass::Replaced))
}

// Only the entries `next` changed relative to the input are carried over.
fn merge_conversions(input: &Value, mut merged: Value, next: Value) -> Value {
    let same_shape = matches!(
        (&merged, &next),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    );
    if !same_shape {
        return next;
    }
    for (key, item) in next.entries() {
        if input.property(&key).as_deref() != Some(item) {
            merged.set_property(&key, item.clone());
        }
    }
    merged
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use crate::error::PathSegment;
    use crate::schema;
    use crate::value::Value;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn to_number() -> schema::Schema {
        schema::convert(|v: &Value| match v {
            Value::String(s) => s.parse::<f64>().map(Value::Number).map_err(|e| e.to_string()),
            other => Ok(other.clone()),
        })
    }

    #[test]
    fn array_reports_the_failing_index() {
        let err = schema::array(schema::number()).validate(&v(json!([1, 2, "x", "y"]))).unwrap_err();
        assert_eq!(err.message, "not a number");
        assert_eq!(err.path, vec![PathSegment::Index(2)]);
        let err = schema::array(schema::number()).validate(&v(json!({"0": 1}))).unwrap_err();
        assert_eq!(err.message, "not an array");
    }

    #[test]
    fn array_conversion_replaces_positionally() {
        let input = v(json!(["1", 2, "3"]));
        let out = schema::array(to_number()).validate(&input).unwrap();
        assert_eq!(out, v(json!([1, 2, 3])));
        assert_eq!(input, v(json!(["1", 2, "3"])));
    }

    #[test]
    fn non_empty_array_requires_an_element() {
        let s = schema::non_empty_array(schema::string());
        assert_eq!(s.validate(&v(json!([]))).unwrap_err().message, "array is empty");
        assert!(s.is_valid(&v(json!(["a"]))));
    }

    #[test]
    fn length_bounds_apply_after_the_base() {
        let at_least_two = schema::min_length(schema::array(schema::number()), 2);
        assert_eq!(
            at_least_two.validate(&v(json!([1]))).unwrap_err().message,
            "array must contain at least 2 elements"
        );
        assert!(at_least_two.is_valid(&v(json!([1, 2]))));
        let at_most_one = schema::max_length(schema::array(schema::unknown()), 1);
        assert_eq!(
            at_most_one.validate(&v(json!([1, 2]))).unwrap_err().message,
            "array must contain at most 1 elements"
        );
        assert_eq!(
            schema::min_length(schema::unknown(), 0).validate(&v(json!("x"))).unwrap_err().message,
            "not an array"
        );
    }

    #[test]
    fn tuple_arity_is_exact() {
        let pair = schema::tuple([schema::string(), schema::number()]);
        assert!(pair.is_valid(&v(json!(["a", 1]))));
        assert_eq!(
            pair.validate(&v(json!(["a"]))).unwrap_err().message,
            "tuple length mismatch: expected 2, got 1"
        );
        assert!(!pair.is_valid(&v(json!(["a", 1, 2]))));
        let err = pair.validate(&v(json!([1, 1]))).unwrap_err();
        assert_eq!(err.path, vec![PathSegment::Index(0)]);
    }

    #[test]
    fn missing_required_property_names_the_key() {
        let s = schema::object([("id", schema::number())]);
        let err = s.validate(&v(json!({"name": "x"}))).unwrap_err();
        assert_eq!(err.message, "missing required property");
        assert_eq!(err.path, vec![PathSegment::from("id")]);
    }

    #[test]
    fn present_undefined_satisfies_presence() {
        let s = schema::object([("a", schema::void())]);
        assert!(s.is_valid(&Value::object([("a", Value::Undefined)])));
        assert!(!s.is_valid(&Value::object(Vec::<(String, Value)>::new())));
    }

    #[test]
    fn object_conversion_touches_only_changed_keys() {
        let s = schema::object([("n", to_number()), ("s", schema::string())]);
        let out = s.validate(&v(json!({"extra": true, "n": "5", "s": "x"}))).unwrap();
        assert_eq!(out, v(json!({"extra": true, "n": 5, "s": "x"})));
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["extra", "n", "s"]);
    }

    #[test]
    fn record_prefixes_key_and_value_failures() {
        let s = schema::record(schema::literal_union(["a", "b"]), schema::number());
        let err = s.validate(&v(json!({"a": 1, "c": 2}))).unwrap_err();
        assert_eq!(err.message, r#"Record key: is not one of "a", "b""#);
        assert_eq!(err.path, vec![PathSegment::from("c")]);
        let err = s.validate(&v(json!({"a": 1, "b": "x"}))).unwrap_err();
        assert_eq!(err.message, "Record value: not a number");
        assert_eq!(err.path, vec![PathSegment::from("b")]);
    }

    #[test]
    fn record_keys_retry_as_numbers() {
        let s = schema::record(schema::number(), schema::boolean());
        assert!(s.is_valid(&v(json!({"0": true, "1.5": false}))));
        let err = s.validate(&v(json!({"abc": true}))).unwrap_err();
        assert_eq!(err.message, "Record key: not a number");
    }

    #[test]
    fn record_substitutes_converted_values() {
        let s = schema::record(schema::string(), to_number());
        assert_eq!(s.validate(&v(json!({"a": "1"}))).unwrap(), v(json!({"a": 1})));
    }

    #[test]
    fn union_returns_the_first_success() {
        let s = schema::union([schema::string(), to_number()]);
        assert_eq!(s.validate(&v(json!("7"))).unwrap(), v(json!("7")));
        let s = schema::union([to_number(), schema::string()]);
        assert_eq!(s.validate(&v(json!("7"))).unwrap(), v(json!(7)));
    }

    #[test]
    fn union_exhaustion_drops_child_paths() {
        let s = schema::union([schema::object([("a", schema::number())]), schema::string()]);
        let err = s.validate(&v(json!({"a": "x"}))).unwrap_err();
        assert_eq!(
            err.message,
            "must resolve any one of the following issues: (1) not a number (2) not a string"
        );
        assert!(err.path.is_empty());
    }

    #[test]
    fn empty_union_rejects_everything() {
        let s = schema::union([]);
        for value in [Value::Undefined, Value::Null, v(json!({})), v(json!(1))] {
            assert!(!s.is_valid(&value));
        }
        assert_eq!(s.validate(&Value::Null).unwrap_err().message, "empty union does not accept any value");
    }

    #[test]
    fn intersection_requires_every_part() {
        let s = schema::intersection([
            schema::object([("a", schema::number())]),
            schema::object([("b", schema::string())]),
        ]);
        assert!(s.is_valid(&v(json!({"a": 1, "b": "x"}))));
        let err = s.validate(&v(json!({"a": 1}))).unwrap_err();
        assert_eq!(err.path, vec![PathSegment::from("b")]);
        assert!(schema::intersection([]).is_valid(&Value::Null));
    }

    #[test]
    fn intersection_merges_conversions_of_every_part() {
        let s = schema::intersection([
            schema::object([("a", to_number())]),
            schema::object([("b", to_number())]),
        ]);
        assert_eq!(s.validate(&v(json!({"a": "1", "b": "2", "c": "3"}))).unwrap(), v(json!({"a": 1, "b": 2, "c": "3"})));

        let both = schema::intersection([
            schema::object([("a", to_number())]),
            schema::object([("a", schema::convert(|_: &Value| Ok::<_, String>(Value::from("late"))))]),
        ]);
        assert_eq!(both.validate(&v(json!({"a": "1"}))).unwrap(), v(json!({"a": "late"})));
    }

    #[test]
    fn intersection_of_scalar_conversions_keeps_the_last() {
        let s = schema::intersection([to_number(), schema::convert(|_: &Value| Ok::<_, String>(Value::Null))]);
        assert_eq!(s.validate(&v(json!("1"))).unwrap(), Value::Null);
    }

    #[test]
    fn arrays_are_read_through_index_keys() {
        let s = schema::object_with_optional([("0", schema::number())], [("length", schema::number())]).unwrap();
        assert!(s.is_valid(&v(json!([1]))));
        assert!(schema::object::<&str>([]).is_valid(&v(json!([1]))));
        let err = s.validate(&v(json!([]))).unwrap_err();
        assert_eq!((err.message.as_str(), err.path), ("missing required property", vec![PathSegment::from("0")]));
        assert!(!schema::object([("00", schema::number())]).is_valid(&v(json!([1]))));

        let converted = schema::object([("1", to_number())]).validate(&v(json!(["a", "2"]))).unwrap();
        assert_eq!(converted, v(json!(["a", 2])));
    }

    #[test]
    fn records_walk_array_elements() {
        let s = schema::record(schema::number(), to_number());
        assert_eq!(s.validate(&v(json!(["1", "2"]))).unwrap(), v(json!([1, 2])));
        let err = schema::record(schema::string(), schema::string()).validate(&v(json!(["x", 1]))).unwrap_err();
        assert_eq!(err.message, "Record value: not a string");
        assert_eq!(err.path, vec![PathSegment::from("1")]);
    }
}
