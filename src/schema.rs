//! Schema node model.
//!
//! A [`Schema`] is an immutable tree of tagged nodes. Data-only kinds are
//! plain enum variants so the engine, the document codec and the static
//! check can all dispatch on them; only `refine`, `convert` and lazily
//! resolved recursion carry closures.
//!
//! The free functions in this module are the factories; they never fail
//! except where an invariant can be violated by the arguments
//! ([`object_with_optional`]).
pub mod atomic;
pub mod func;
pub mod object;
pub mod recursive;

use std::borrow::Cow;
use std::sync::Arc;

pub use atomic::Atomic;
pub use func::{Converter, Predicate};
pub use object::ObjectSchema;
pub use recursive::{RecursionKey, Recursive, SchemaSlot, SlotRef, Target};

use crate::error::{SchemaError, ValidationError};
use crate::value::Value;

#[derive(Clone, Debug)]
pub enum Schema {
    Atomic(Atomic),
    Literal { value: Value },
    LiteralUnion { values: Vec<Value> },
    AnyObject,
    Array { element: Box<Schema> },
    NonEmptyArray { element: Box<Schema> },
    MinLength { base: Box<Schema>, length: usize },
    MaxLength { base: Box<Schema>, length: usize },
    Tuple { parts: Vec<Schema> },
    Object(ObjectSchema),
    Record { key: Box<Schema>, value: Box<Schema> },
    Union { parts: Vec<Schema> },
    Intersection { parts: Vec<Schema> },
    Refine { base: Box<Schema>, predicate: Predicate },
    Convert(Converter),
    /// Never empty.
    Pipe { stages: Vec<Schema> },
    Recursive(Recursive),
    Recursion { key: RecursionKey },
}

impl Schema {
    /// Tag name, as written in schema documents.
    pub fn kind(&self) -> &'static str {
        match self {
            Schema::Atomic(a) => a.name(),
            Schema::Literal { .. } => "literal",
            Schema::LiteralUnion { .. } => "literalUnion",
            Schema::AnyObject => "anyObject",
            Schema::Array { .. } => "array",
            Schema::NonEmptyArray { .. } => "nonEmptyArray",
            Schema::MinLength { .. } => "minLengthArray",
            Schema::MaxLength { .. } => "maxLengthArray",
            Schema::Tuple { .. } => "tuple",
            Schema::Object(_) => "object",
            Schema::Record { .. } => "record",
            Schema::Union { .. } => "union",
            Schema::Intersection { .. } => "intersection",
            Schema::Refine { .. } => "refine",
            Schema::Convert(_) => "convert",
            Schema::Pipe { .. } => "pipe",
            Schema::Recursive(_) => "recursive",
            Schema::Recursion { .. } => "recursion",
        }
    }

    /// Whether a successful validation may hand back a value different from
    /// its input.
    ///
    /// Lazily resolved targets (thunks, slots) and recursion placeholders are
    /// not expanded and count as non-converting.
    pub fn is_converter(&self) -> bool {
        match self {
            Schema::Convert(_) => true,
            Schema::Atomic(_)
            | Schema::Literal { .. }
            | Schema::LiteralUnion { .. }
            | Schema::AnyObject
            | Schema::Recursion { .. } => false,
            Schema::Array { element } | Schema::NonEmptyArray { element } => element.is_converter(),
            Schema::MinLength { base, .. }
            | Schema::MaxLength { base, .. }
            | Schema::Refine { base, .. } => base.is_converter(),
            Schema::Tuple { parts }
            | Schema::Union { parts }
            | Schema::Intersection { parts }
            | Schema::Pipe { stages: parts } => parts.iter().any(Schema::is_converter),
            Schema::Object(obj) => obj.properties().any(|(_, s, _)| s.is_converter()),
            // keys are never rewritten
            Schema::Record { value, .. } => value.is_converter(),
            Schema::Recursive(rec) => match &rec.target {
                Target::Inline(inner) => inner.is_converter(),
                Target::Thunk(_) | Target::Slot(_) => false,
            },
        }
    }

    /// Validate `value`, returning it (or its converted form) on success.
    pub fn validate(&self, value: &Value) -> Result<Value, ValidationError> {
        crate::engine::validate(self, value)
    }

    /// Like [`Schema::validate`], but hands the input back without cloning
    /// when nothing was converted.
    pub fn validate_owned(&self, value: Value) -> Result<Value, ValidationError> {
        crate::engine::validate_owned(self, value)
    }

    pub fn is_valid(&self, value: &Value) -> bool {
        crate::engine::is_valid(self, value)
    }
}

impl From<Atomic> for Schema {
    fn from(a: Atomic) -> Self {
        Schema::Atomic(a)
    }
}

// ------------------------------ Atomics ---------------------------------- //

pub fn boolean() -> Schema {
    Schema::Atomic(Atomic::Boolean)
}

pub fn number() -> Schema {
    Schema::Atomic(Atomic::Number)
}

pub fn bigint() -> Schema {
    Schema::Atomic(Atomic::BigInt)
}

pub fn string() -> Schema {
    Schema::Atomic(Atomic::String)
}

pub fn symbol() -> Schema {
    Schema::Atomic(Atomic::Symbol)
}

pub fn unknown() -> Schema {
    Schema::Atomic(Atomic::Unknown)
}

pub fn any() -> Schema {
    Schema::Atomic(Atomic::Any)
}

pub fn never() -> Schema {
    Schema::Atomic(Atomic::Never)
}

pub fn void() -> Schema {
    Schema::Atomic(Atomic::Void)
}

// ------------------------------ Literals --------------------------------- //

pub fn literal(value: impl Into<Value>) -> Schema {
    Schema::Literal { value: value.into() }
}

pub fn null() -> Schema {
    literal(Value::Null)
}

pub fn undefined() -> Schema {
    literal(Value::Undefined)
}

pub fn nullish() -> Schema {
    union([null(), undefined()])
}

pub fn true_() -> Schema {
    literal(true)
}

pub fn false_() -> Schema {
    literal(false)
}

pub fn literal_union<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Schema {
    Schema::LiteralUnion { values: values.into_iter().map(Into::into).collect() }
}

// ----------------------------- Composites -------------------------------- //

pub fn any_object() -> Schema {
    Schema::AnyObject
}

pub fn array(element: Schema) -> Schema {
    Schema::Array { element: Box::new(element) }
}

pub fn non_empty_array(element: Schema) -> Schema {
    Schema::NonEmptyArray { element: Box::new(element) }
}

pub fn min_length(base: Schema, length: usize) -> Schema {
    Schema::MinLength { base: Box::new(base), length }
}

pub fn max_length(base: Schema, length: usize) -> Schema {
    Schema::MaxLength { base: Box::new(base), length }
}

pub fn tuple(parts: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Tuple { parts: parts.into_iter().collect() }
}

/// An object whose listed properties are all required.
pub fn object<K: Into<String>>(required: impl IntoIterator<Item = (K, Schema)>) -> Schema {
    let required = required.into_iter().map(|(k, s)| (k.into(), s)).collect();
    Schema::Object(ObjectSchema::required_only(required))
}

/// An object with required and optional properties. Fails if a key is
/// declared in both.
pub fn object_with_optional<K1, K2>(
    required: impl IntoIterator<Item = (K1, Schema)>,
    optional: impl IntoIterator<Item = (K2, Schema)>,
) -> Result<Schema, SchemaError>
where
    K1: Into<String>,
    K2: Into<String>,
{
    let required = required.into_iter().map(|(k, s)| (k.into(), s)).collect();
    let optional = optional.into_iter().map(|(k, s)| (k.into(), s)).collect();
    Ok(Schema::Object(ObjectSchema::new(required, optional)?))
}

pub fn record(key: Schema, value: Schema) -> Schema {
    Schema::Record { key: Box::new(key), value: Box::new(value) }
}

pub fn union(parts: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Union { parts: parts.into_iter().collect() }
}

pub fn intersection(parts: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::Intersection { parts: parts.into_iter().collect() }
}

// ------------------------------ Pipeline --------------------------------- //

pub fn refine(base: Schema, test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Schema {
    Schema::Refine { base: Box::new(base), predicate: Predicate::new(test) }
}

pub fn refine_named(
    base: Schema,
    name: impl Into<Cow<'static, str>>,
    test: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> Schema {
    Schema::Refine { base: Box::new(base), predicate: Predicate::named(name, test) }
}

/// A standalone predicate stage: a refinement of `unknown`.
pub fn predicate(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Schema {
    refine(unknown(), test)
}

pub fn predicate_named(
    name: impl Into<Cow<'static, str>>,
    test: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> Schema {
    refine_named(unknown(), name, test)
}

pub fn convert<F, E>(converter: F) -> Schema
where
    F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
    E: std::fmt::Display,
{
    Schema::Convert(Converter::new(converter))
}

pub fn convert_named<F, E>(name: impl Into<Cow<'static, str>>, converter: F) -> Schema
where
    F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
    E: std::fmt::Display,
{
    Schema::Convert(Converter::named(name, converter))
}

/// Thread a value through `first` and then every stage of `rest`.
pub fn pipe(first: Schema, rest: impl IntoIterator<Item = Schema>) -> Schema {
    let mut stages = vec![first];
    stages.extend(rest);
    Schema::Pipe { stages }
}

// ------------------------------ Recursion -------------------------------- //

/// Self reference through a function that rebuilds the schema on demand.
///
/// ```
/// use json_shape::schema::{self, Schema};
///
/// fn tree() -> Schema {
///     schema::object([
///         ("value", schema::unknown()),
///         ("children", schema::array(schema::recursive(tree))),
///     ])
/// }
/// # let _ = tree();
/// ```
pub fn recursive(thunk: impl Fn() -> Schema + Send + Sync + 'static) -> Schema {
    Schema::Recursive(Recursive { key: RecursionKey::Anonymous, target: Target::Thunk(Arc::new(thunk)) })
}

/// Bind `key` to `schema` for every `recursion(key)` below it.
pub fn recursive_keyed(key: impl AsRef<str>, schema: Schema) -> Schema {
    Schema::Recursive(Recursive {
        key: RecursionKey::named(key),
        target: Target::Inline(Box::new(schema)),
    })
}

/// Rebind the anonymous key to `schema`; `recursion_self()` below it refers
/// to `schema` instead of the root.
pub fn recursive_inline(schema: Schema) -> Schema {
    Schema::Recursive(Recursive { key: RecursionKey::Anonymous, target: Target::Inline(Box::new(schema)) })
}

pub fn recursion(key: impl AsRef<str>) -> Schema {
    Schema::Recursion { key: RecursionKey::named(key) }
}

/// Refers to the innermost anonymous binding, the root schema by default.
pub fn recursion_self() -> Schema {
    Schema::Recursion { key: RecursionKey::Anonymous }
}

// ------------------------------- Tests ------------------------------------ //
