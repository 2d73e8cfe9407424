//! Validation engine.
//!
//! One recursive descent over `(schema, value, env)` serves both public
//! entry points. [`validate`] runs it in [`Diagnose`] mode and gets a message
//! and path on failure; [`is_valid`] runs it in [`Check`] mode, where a
//! failure is a unit value and nothing is formatted. Both visit children in
//! the same order and stop at the same point, so they always agree.
//!
//! A successful step reports [`Pass::Kept`] when the input is accepted as is
//! and [`Pass::Replaced`] when a converter produced a different value.
//! Containers copy their input only once a child actually replaced something.
mod composite;
mod env;
mod mode;
mod pipeline;

use tracing::{debug, trace};

use crate::error::{SchemaError, ValidationError};
use crate::render::literal_to_string;
use crate::schema::{RecursionKey, Recursive, Schema, Target};
use crate::value::Value;

use env::{Env, Frame};
use mode::{Check, Diagnose, Mode};

pub(crate) enum Pass {
    Kept,
    Replaced(Value),
}

impl Pass {
    /// The value the next stage should see.
    fn resolve<'v>(&'v self, input: &'v Value) -> &'v Value {
        match self {
            Pass::Kept => input,
            Pass::Replaced(v) => v,
        }
    }

    fn into_value(self, input: &Value) -> Value {
        match self {
            Pass::Kept => input.clone(),
            Pass::Replaced(v) => v,
        }
    }
}

// ------------------------------ Entry points ----------------------------- //

/// Validate `value` against `schema`, returning the accepted value, converted
/// where the schema converts.
///
/// # Panics
///
/// If the schema is malformed: a `recursion` key with no enclosing binding,
/// or a slot that was never defined or has been dropped.
pub fn validate(schema: &Schema, value: &Value) -> Result<Value, ValidationError> {
    match run::<Diagnose>(schema, value) {
        Ok(pass) => Ok(pass.into_value(value)),
        Err(failure) => Err(report(failure.into_error())),
    }
}

/// [`validate`] for an owned input, which is handed back as is unless a
/// converter replaced it.
pub fn validate_owned(schema: &Schema, value: Value) -> Result<Value, ValidationError> {
    match run::<Diagnose>(schema, &value) {
        Ok(Pass::Kept) => Ok(value),
        Ok(Pass::Replaced(v)) => Ok(v),
        Err(failure) => Err(report(failure.into_error())),
    }
}

/// Whether `validate` would succeed. Converters still run, since a throwing
/// converter rejects, but their output is discarded.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    run::<Check>(schema, value).is_ok()
}

fn run<M: Mode>(schema: &Schema, value: &Value) -> Result<Pass, M::Error> {
    // The root is always reachable through the anonymous key.
    let anonymous = RecursionKey::Anonymous;
    let root = Frame::new(&anonymous, schema, Env::default());
    descend::<M>(schema, value, root.env())
}

fn report(err: ValidationError) -> ValidationError {
    debug!(message = %err.message, path = ?err.path, "validation failed");
    err
}

// -------------------------------- Descent -------------------------------- //

pub(crate) fn descend<M: Mode>(schema: &Schema, value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    match schema {
        Schema::Atomic(atomic) => {
            if atomic.accepts(value) {
                Ok(Pass::Kept)
            } else {
                Err(M::fail(|| atomic.mismatch_message().to_string()))
            }
        }
        Schema::Literal { value: expected } => {
            if expected.strict_eq(value) {
                Ok(Pass::Kept)
            } else {
                Err(M::fail(|| format!("not equal to {}", literal_to_string(expected))))
            }
        }
        Schema::LiteralUnion { values } => {
            if values.iter().any(|v| v.strict_eq(value)) {
                Ok(Pass::Kept)
            } else {
                Err(M::fail(|| {
                    let listed: Vec<String> = values.iter().map(literal_to_string).collect();
                    format!("is not one of {}", listed.join(", "))
                }))
            }
        }
        Schema::AnyObject if value.is_primitive() => Err(M::fail(|| "not an object".to_string())),
        Schema::AnyObject => Ok(Pass::Kept),
        Schema::Array { element } => composite::array::<M>(element, value, env),
        Schema::NonEmptyArray { element } => composite::non_empty_array::<M>(element, value, env),
        Schema::MinLength { base, length } => {
            composite::bounded_length::<M>(base, *length, composite::Bound::Min, value, env)
        }
        Schema::MaxLength { base, length } => {
            composite::bounded_length::<M>(base, *length, composite::Bound::Max, value, env)
        }
        Schema::Tuple { parts } => composite::tuple::<M>(parts, value, env),
        Schema::Object(obj) => composite::object::<M>(obj, value, env),
        Schema::Record { key, value: item } => composite::record::<M>(key, item, value, env),
        Schema::Union { parts } => composite::union::<M>(parts, value, env),
        Schema::Intersection { parts } => composite::intersection::<M>(parts, value, env),
        Schema::Refine { base, predicate } => pipeline::refine::<M>(base, predicate, value, env),
        Schema::Convert(converter) => pipeline::convert::<M>(converter, value),
        Schema::Pipe { stages } => pipeline::pipe::<M>(stages, value, env),
        Schema::Recursive(rec) => enter::<M>(rec, value, env),
        Schema::Recursion { key } => match env.lookup(key) {
            Some(bound) => descend::<M>(bound, value, env),
            None => malformed(SchemaError::UnboundRecursion { key: key.to_string() }),
        },
    }
}

/// Push the node's binding and descend into its target under it.
fn enter<M: Mode>(rec: &Recursive, value: &Value, env: Env<'_>) -> Result<Pass, M::Error> {
    trace!(key = %rec.key, depth = env.depth(), "binding recursion key");
    match &rec.target {
        Target::Inline(inner) => {
            let frame = Frame::new(&rec.key, inner, env);
            descend::<M>(inner, value, frame.env())
        }
        Target::Thunk(thunk) => {
            let inner = thunk();
            let frame = Frame::new(&rec.key, &inner, env);
            descend::<M>(&inner, value, frame.env())
        }
        Target::Slot(slot) => {
            let outcome = slot.with(|inner| {
                let frame = Frame::new(&rec.key, inner, env);
                descend::<M>(inner, value, frame.env())
            });
            match outcome {
                Ok(result) => result,
                Err(err) => malformed(err),
            }
        }
    }
}

fn malformed(err: SchemaError) -> ! {
    panic!("malformed schema: {err}")
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PathSegment;
    use crate::schema::{self, SchemaSlot};
    use crate::value::Symbol;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn failure(schema: &Schema, value: Value) -> (String, Vec<PathSegment>) {
        let err = validate(schema, &value).unwrap_err();
        assert!(!is_valid(schema, &value), "is_valid disagrees for {value:?}");
        (err.message, err.path)
    }

    #[test]
    fn atomic_mismatches_report_the_expected_kind() {
        assert_eq!(failure(&schema::number(), v(json!("1"))).0, "not a number");
        assert_eq!(failure(&schema::boolean(), Value::Null).0, "not a boolean");
        assert_eq!(failure(&schema::never(), Value::Undefined).0, "never type does not accept any value");
        assert_eq!(failure(&schema::void(), Value::Null).0, "not equal to undefined");
        assert!(is_valid(&schema::symbol(), &Value::from(Symbol::new("s"))));
    }

    #[test]
    fn literal_failures_render_the_expected_literal() {
        assert_eq!(failure(&schema::literal("a"), v(json!("b"))).0, r#"not equal to "a""#);
        assert_eq!(failure(&schema::literal(Value::BigInt(3)), v(json!(3))).0, "not equal to 3n");
        assert_eq!(failure(&schema::null(), Value::Undefined).0, "not equal to null");
        assert_eq!(failure(&schema::undefined(), Value::Null).0, "not equal to undefined");
        let sym = Symbol::new("tag");
        assert_eq!(failure(&schema::literal(sym.clone()), Value::from(Symbol::new("tag"))).0, "not equal to Symbol(tag)");
        assert!(is_valid(&schema::literal(sym.clone()), &Value::from(sym)));
    }

    #[test]
    fn literal_union_lists_every_choice() {
        let s = schema::literal_union([Value::from("a"), Value::from(1), Value::Null]);
        assert!(is_valid(&s, &v(json!(1))));
        assert_eq!(failure(&s, v(json!("c"))).0, r#"is not one of "a", 1, null"#);
    }

    #[test]
    fn any_object_accepts_structured_values_only() {
        assert!(is_valid(&schema::any_object(), &v(json!({"x": 1}))));
        assert!(is_valid(&schema::any_object(), &v(json!([]))));
        assert_eq!(failure(&schema::any_object(), Value::Null).0, "not an object");
        assert_eq!(failure(&schema::any_object(), v(json!("{}"))).0, "not an object");
    }

    #[test]
    fn validate_owned_returns_input_when_kept() {
        let input = v(json!({"a": [1, 2]}));
        let out = validate_owned(&schema::object([("a", schema::array(schema::number()))]), input.clone());
        assert_eq!(out.unwrap(), input);
    }

    #[test]
    fn anonymous_recursion_refers_to_the_root() {
        let list = schema::union([
            schema::null(),
            schema::object([("head", schema::number()), ("tail", schema::recursion_self())]),
        ]);
        assert!(is_valid(&list, &v(json!({"head": 1, "tail": {"head": 2, "tail": null}}))));
        let (message, path) = failure(&list, v(json!({"head": 1, "tail": {"head": "x", "tail": null}})));
        assert!(message.starts_with("must resolve any one of the following issues"));
        assert!(path.is_empty());
    }

    #[test]
    fn slot_schema_validates_nested_trees() {
        let slot = SchemaSlot::new();
        let child = slot.placeholder();
        let tree = slot.define(schema::object([
            ("value", schema::number()),
            ("children", schema::array(child)),
        ]));
        let (_, path) = failure(&tree, v(json!({"value": 1, "children": [{"value": "x", "children": []}]})));
        assert_eq!(path, vec!["children".into(), 0.into(), "value".into()]);
    }

    #[test]
    #[should_panic(expected = "malformed schema")]
    fn unbound_recursion_key_panics() {
        let _ = validate(&schema::array(schema::recursion("missing")), &v(json!([1])));
    }

    #[test]
    #[should_panic(expected = "malformed schema")]
    fn dropped_slot_panics() {
        let orphan = {
            let slot = SchemaSlot::new();
            let placeholder = slot.placeholder();
            drop(slot.define(schema::number()));
            placeholder
        };
        is_valid(&orphan, &Value::Null);
    }

    #[test]
    #[should_panic(expected = "malformed schema")]
    fn undefined_slot_panics() {
        let slot = SchemaSlot::new();
        let placeholder = slot.placeholder();
        is_valid(&placeholder, &Value::Null);
        drop(slot);
    }
}
