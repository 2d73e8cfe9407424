//! Schema documents.
//!
//! The JSON form of a schema is internally tagged on `"type"`:
//!
//! ```json
//! {"type": "object",
//!  "required": {"id": {"type": "number"}},
//!  "optional": {"tags": {"type": "array", "element": {"type": "string"}}}}
//! ```
//!
//! Nodes that carry functions (`refine`, `convert`, thunk or slot backed
//! `recursive`) are written as descriptive stubs and cannot be read back.
//! Literals that JSON cannot express use a marker object:
//! `{"$bigint": "12"}` and `{"$undefined": true}`.
use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{self, Serialize, Serializer};

use crate::error::{SchemaError, ValueError};
use crate::path_de::{from_str_with_path, from_value_with_path};
use crate::schema::{Atomic, ObjectSchema, RecursionKey, Recursive, Schema, Target};
use crate::value::Value;

// ---------------------------- Literal values ----------------------------- //

#[derive(serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
enum LiteralDoc {
    BigInt {
        #[serde(rename = "$bigint")]
        digits: String,
    },
    Undefined {
        #[serde(rename = "$undefined")]
        marker: bool,
    },
    Plain(serde_json::Value),
}

impl LiteralDoc {
    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(match value {
            Value::Undefined => LiteralDoc::Undefined { marker: true },
            Value::BigInt(n) => LiteralDoc::BigInt { digits: n.to_string() },
            other => LiteralDoc::Plain(other.to_json()?),
        })
    }

    fn into_value(self) -> Result<Value, SchemaError> {
        match self {
            LiteralDoc::BigInt { digits } => digits.trim().parse::<i128>().map(Value::BigInt).map_err(|e| {
                SchemaError::InvalidLiteral { reason: format!("bigint `{digits}`: {e}") }
            }),
            LiteralDoc::Undefined { marker: true } => Ok(Value::Undefined),
            LiteralDoc::Undefined { marker: false } => {
                Err(SchemaError::InvalidLiteral { reason: "`$undefined` must be true".to_string() })
            }
            LiteralDoc::Plain(json) if is_primitive_json(&json) => Ok(Value::from(json)),
            LiteralDoc::Plain(_) => Err(SchemaError::InvalidLiteral {
                reason: "literals must be primitive values".to_string(),
            }),
        }
    }
}

fn is_primitive_json(json: &serde_json::Value) -> bool {
    !matches!(json, serde_json::Value::Array(_) | serde_json::Value::Object(_))
}

// ------------------------------- Reading --------------------------------- //

// Child nodes stay raw until their parent knows where they sit.
type Raw = serde_json::Value;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum DocIn {
    Boolean,
    Number,
    Bigint,
    String,
    Symbol,
    Unknown,
    Any,
    Never,
    Void,
    Null,
    Undefined,
    Nullish,
    AnyObject,
    Literal {
        value: Raw,
    },
    LiteralUnion {
        values: Vec<Raw>,
    },
    Array {
        element: Raw,
    },
    NonEmptyArray {
        element: Raw,
    },
    MinLengthArray {
        base: Raw,
        length: usize,
    },
    MaxLengthArray {
        base: Raw,
        length: usize,
    },
    Tuple {
        parts: Vec<Raw>,
    },
    Object {
        #[serde(default)]
        required: IndexMap<String, Raw>,
        #[serde(default)]
        optional: IndexMap<String, Raw>,
    },
    Record {
        key: Raw,
        value: Raw,
    },
    Union {
        parts: Vec<Raw>,
    },
    Intersection {
        parts: Vec<Raw>,
    },
    Pipe {
        stages: Vec<Raw>,
    },
    Recursive {
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        value: Option<Raw>,
    },
    Recursion {
        #[serde(default)]
        key: Option<String>,
    },
    Refine {},
    Convert {},
}

/// Where a node sits in its document, spelled the way `serde_path_to_error`
/// spells paths: `required.a.element`, `parts[1]`, `.` for the root.
#[derive(Clone, Debug, Default)]
struct NodePath(String);

impl NodePath {
    fn field(&self, name: &str) -> NodePath {
        if self.0.is_empty() {
            NodePath(name.to_string())
        } else {
            NodePath(format!("{}.{name}", self.0))
        }
    }

    fn index(&self, i: usize) -> NodePath {
        NodePath(format!("{}[{i}]", self.0))
    }

    /// Anchor an error raised while reading this node. Document errors carry
    /// a path relative to the node; everything else is about the node itself.
    fn locate(&self, err: SchemaError) -> SchemaError {
        match err {
            SchemaError::Document { path, reason } => {
                let path = match path.as_str() {
                    "." => self.to_string(),
                    rel if rel.starts_with('[') => format!("{}{rel}", self.0),
                    rel => self.field(rel).to_string(),
                };
                SchemaError::Document { path, reason }
            }
            other => SchemaError::Document { path: self.to_string(), reason: other.to_string() },
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { f.write_str(".") } else { f.write_str(&self.0) }
    }
}

fn load(node: Raw, at: &NodePath) -> Result<Schema, SchemaError> {
    let doc: DocIn = from_value_with_path(node).map_err(|err| at.locate(err))?;
    let boxed = |raw: Raw, field: &str| load(raw, &at.field(field)).map(Box::new);
    Ok(match doc {
        DocIn::Boolean => Schema::Atomic(Atomic::Boolean),
        DocIn::Number => Schema::Atomic(Atomic::Number),
        DocIn::Bigint => Schema::Atomic(Atomic::BigInt),
        DocIn::String => Schema::Atomic(Atomic::String),
        DocIn::Symbol => Schema::Atomic(Atomic::Symbol),
        DocIn::Unknown => Schema::Atomic(Atomic::Unknown),
        DocIn::Any => Schema::Atomic(Atomic::Any),
        DocIn::Never => Schema::Atomic(Atomic::Never),
        DocIn::Void => Schema::Atomic(Atomic::Void),
        DocIn::Null => Schema::Literal { value: Value::Null },
        DocIn::Undefined => Schema::Literal { value: Value::Undefined },
        DocIn::Nullish => crate::schema::nullish(),
        DocIn::AnyObject => Schema::AnyObject,
        DocIn::Literal { value } => Schema::Literal { value: literal(value, &at.field("value"))? },
        DocIn::LiteralUnion { values } => {
            let at = at.field("values");
            Schema::LiteralUnion {
                values: values
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| literal(raw, &at.index(i)))
                    .collect::<Result<_, _>>()?,
            }
        }
        DocIn::Array { element } => Schema::Array { element: boxed(element, "element")? },
        DocIn::NonEmptyArray { element } => Schema::NonEmptyArray { element: boxed(element, "element")? },
        DocIn::MinLengthArray { base, length } => Schema::MinLength { base: boxed(base, "base")?, length },
        DocIn::MaxLengthArray { base, length } => Schema::MaxLength { base: boxed(base, "base")?, length },
        DocIn::Tuple { parts } => Schema::Tuple { parts: load_all(parts, &at.field("parts"))? },
        DocIn::Object { required, optional } => {
            let required = load_map(required, &at.field("required"))?;
            let optional = load_map(optional, &at.field("optional"))?;
            Schema::Object(ObjectSchema::new(required, optional).map_err(|err| at.locate(err))?)
        }
        DocIn::Record { key, value } => Schema::Record { key: boxed(key, "key")?, value: boxed(value, "value")? },
        DocIn::Union { parts } => Schema::Union { parts: load_all(parts, &at.field("parts"))? },
        DocIn::Intersection { parts } => Schema::Intersection { parts: load_all(parts, &at.field("parts"))? },
        DocIn::Pipe { stages } if stages.is_empty() => return Err(at.locate(SchemaError::EmptyPipe)),
        DocIn::Pipe { stages } => Schema::Pipe { stages: load_all(stages, &at.field("stages"))? },
        DocIn::Recursive { key, value: Some(value) } => Schema::Recursive(Recursive {
            key: key.map_or(RecursionKey::Anonymous, RecursionKey::named),
            target: Target::Inline(boxed(value, "value")?),
        }),
        DocIn::Recursive { value: None, .. } => {
            return Err(at.locate(SchemaError::NotLoadable { kind: "recursive" }));
        }
        DocIn::Recursion { key } => Schema::Recursion {
            key: key.map_or(RecursionKey::Anonymous, RecursionKey::named),
        },
        DocIn::Refine {} => return Err(at.locate(SchemaError::NotLoadable { kind: "refine" })),
        DocIn::Convert {} => return Err(at.locate(SchemaError::NotLoadable { kind: "convert" })),
    })
}

fn load_all(nodes: Vec<Raw>, at: &NodePath) -> Result<Vec<Schema>, SchemaError> {
    nodes.into_iter().enumerate().map(|(i, node)| load(node, &at.index(i))).collect()
}

fn load_map(nodes: IndexMap<String, Raw>, at: &NodePath) -> Result<IndexMap<String, Schema>, SchemaError> {
    nodes
        .into_iter()
        .map(|(key, node)| {
            let schema = load(node, &at.field(&key))?;
            Ok((key, schema))
        })
        .collect()
}

fn literal(raw: Raw, at: &NodePath) -> Result<Value, SchemaError> {
    from_value_with_path::<LiteralDoc>(raw)
        .and_then(LiteralDoc::into_value)
        .map_err(|err| at.locate(err))
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Raw::deserialize(deserializer)?;
        load(node, &NodePath::default()).map_err(de::Error::custom)
    }
}

// ------------------------------- Writing --------------------------------- //

#[derive(serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum DocOut<'a> {
    Boolean,
    Number,
    Bigint,
    String,
    Symbol,
    Unknown,
    Any,
    Never,
    Void,
    AnyObject,
    Literal {
        value: LiteralDoc,
    },
    LiteralUnion {
        values: Vec<LiteralDoc>,
    },
    Array {
        element: &'a Schema,
    },
    NonEmptyArray {
        element: &'a Schema,
    },
    MinLengthArray {
        base: &'a Schema,
        length: usize,
    },
    MaxLengthArray {
        base: &'a Schema,
        length: usize,
    },
    Tuple {
        parts: &'a [Schema],
    },
    Object {
        required: &'a IndexMap<String, Schema>,
        optional: &'a IndexMap<String, Schema>,
    },
    Record {
        key: &'a Schema,
        value: &'a Schema,
    },
    Union {
        parts: &'a [Schema],
    },
    Intersection {
        parts: &'a [Schema],
    },
    Refine {
        base: &'a Schema,
        #[serde(skip_serializing_if = "Option::is_none")]
        predicate: Option<&'a str>,
    },
    Convert {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<&'a str>,
    },
    Pipe {
        stages: &'a [Schema],
    },
    Recursive {
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<&'a Schema>,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        lazy: bool,
    },
    Recursion {
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<&'a str>,
    },
}

impl<'a> DocOut<'a> {
    fn from_schema(schema: &'a Schema) -> Result<Self, ValueError> {
        Ok(match schema {
            Schema::Atomic(atomic) => match atomic {
                Atomic::Boolean => DocOut::Boolean,
                Atomic::Number => DocOut::Number,
                Atomic::BigInt => DocOut::Bigint,
                Atomic::String => DocOut::String,
                Atomic::Symbol => DocOut::Symbol,
                Atomic::Unknown => DocOut::Unknown,
                Atomic::Any => DocOut::Any,
                Atomic::Never => DocOut::Never,
                Atomic::Void => DocOut::Void,
            },
            Schema::Literal { value } => DocOut::Literal { value: LiteralDoc::from_value(value)? },
            Schema::LiteralUnion { values } => DocOut::LiteralUnion {
                values: values.iter().map(LiteralDoc::from_value).collect::<Result<_, _>>()?,
            },
            Schema::AnyObject => DocOut::AnyObject,
            Schema::Array { element } => DocOut::Array { element },
            Schema::NonEmptyArray { element } => DocOut::NonEmptyArray { element },
            Schema::MinLength { base, length } => DocOut::MinLengthArray { base, length: *length },
            Schema::MaxLength { base, length } => DocOut::MaxLengthArray { base, length: *length },
            Schema::Tuple { parts } => DocOut::Tuple { parts },
            Schema::Object(obj) => DocOut::Object { required: obj.required(), optional: obj.optional() },
            Schema::Record { key, value } => DocOut::Record { key, value },
            Schema::Union { parts } => DocOut::Union { parts },
            Schema::Intersection { parts } => DocOut::Intersection { parts },
            Schema::Refine { base, predicate } => DocOut::Refine { base, predicate: predicate.name() },
            Schema::Convert(converter) => DocOut::Convert { name: converter.name() },
            Schema::Pipe { stages } => DocOut::Pipe { stages },
            Schema::Recursive(rec) => {
                let key = rec.key.as_name();
                match &rec.target {
                    Target::Inline(inner) => DocOut::Recursive { key, value: Some(inner), lazy: false },
                    Target::Thunk(_) | Target::Slot(_) => DocOut::Recursive { key, value: None, lazy: true },
                }
            }
            Schema::Recursion { key } => DocOut::Recursion { key: key.as_name() },
        })
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DocOut::from_schema(self).map_err(ser::Error::custom)?.serialize(serializer)
    }
}

// ------------------------------ Schema API ------------------------------- //

impl Schema {
    /// Parse a schema document; errors name the JSON path of the offending node.
    pub fn from_json_str(text: &str) -> Result<Schema, SchemaError> {
        let doc: Raw = from_str_with_path(text)?;
        Schema::from_json_value(doc)
    }

    pub fn from_json_value(doc: serde_json::Value) -> Result<Schema, SchemaError> {
        load(doc, &NodePath::default())
    }

    /// The document form of this schema. Fails only for literals JSON cannot
    /// hold (symbols, non-finite numbers).
    pub fn describe(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use crate::value::Symbol;
    use serde_json::json;

    #[test]
    fn loads_nested_documents() {
        let s = Schema::from_json_value(json!({
            "type": "object",
            "required": {"a": {"type": "array", "element": {"type": "number"}}},
            "optional": {"b": {"type": "literalUnion", "values": ["x", {"$bigint": "12"}]}}
        }))
        .unwrap();
        assert!(s.is_valid(&Value::from(json!({"a": [1]}))));
        assert!(s.is_valid(&Value::object([("a", Value::Array(vec![])), ("b", Value::BigInt(12))])));
        let err = s.validate(&Value::from(json!({"a": [1, "x"]}))).unwrap_err();
        assert_eq!(err.path, vec!["a".into(), 1.into()]);
    }

    #[test]
    fn null_and_undefined_tags_load_as_literals() {
        let s = Schema::from_json_str(r#"{"type": "null"}"#).unwrap();
        assert!(matches!(s, Schema::Literal { value: Value::Null }));
        let s = Schema::from_json_str(r#"{"type": "literal", "value": {"$undefined": true}}"#).unwrap();
        assert!(s.is_valid(&Value::Undefined));
    }

    #[test]
    fn function_nodes_are_not_loadable() {
        let err = Schema::from_json_str(r#"{"type": "array", "element": {"type": "convert"}}"#).unwrap_err();
        assert!(err.to_string().contains("`convert` schemas carry functions"), "{err}");
        let err = Schema::from_json_str(r#"{"type": "recursive", "lazy": true}"#).unwrap_err();
        assert!(err.to_string().contains("`recursive`"), "{err}");
    }

    #[test]
    fn structural_invariants_are_enforced_on_load() {
        let err = Schema::from_json_str(r#"{"type": "pipe", "stages": []}"#).unwrap_err();
        assert!(err.to_string().contains("at least one stage"), "{err}");
        let err = Schema::from_json_value(json!({
            "type": "object",
            "required": {"a": {"type": "number"}},
            "optional": {"a": {"type": "string"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("both required and optional"), "{err}");
        let err = Schema::from_json_str(r#"{"type": "literal", "value": [1]}"#).unwrap_err();
        assert!(err.to_string().contains("primitive"), "{err}");
    }

    #[test]
    fn errors_name_the_offending_node() {
        let err = Schema::from_json_str(
            r#"{"type":"object","required":{"a":{"type":"array","element":{"type":"map"}}}}"#,
        )
        .unwrap_err();
        let SchemaError::Document { path, reason } = err else { panic!("expected document error") };
        assert_eq!(path, "required.a.element");
        assert!(reason.contains("unknown variant `map`"), "{reason}");

        let err = Schema::from_json_value(json!({
            "type": "union",
            "parts": [{"type": "number"}, {"type": "literal", "value": {}}]
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::Document { ref path, .. } if path == "parts[1].value"), "{err}");

        let err = Schema::from_json_str(r#"{"type": "tuple", "parts": [{"type": "pipe", "stages": []}]}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Document { ref path, .. } if path == "parts[0]"), "{err}");
    }

    #[test]
    fn unknown_tags_are_reported() {
        let err = Schema::from_json_str(r#"{"type": "map"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Document { .. }));
        assert!(err.to_string().contains("unknown variant"), "{err}");
    }

    #[test]
    fn describe_writes_stubs_for_functions() {
        let s = schema::pipe(
            schema::refine_named(schema::number(), "finite", |v| v.as_f64().is_some_and(f64::is_finite)),
            [schema::convert_named("String", |v: &Value| Ok::<_, String>(Value::from(v.to_string())))],
        );
        assert_eq!(
            s.describe().unwrap(),
            json!({"type": "pipe", "stages": [
                {"type": "refine", "base": {"type": "number"}, "predicate": "finite"},
                {"type": "convert", "name": "String"}
            ]})
        );
    }

    #[test]
    fn describe_round_trips_data_only_schemas() {
        let s = schema::recursive_keyed(
            "tree",
            schema::object_with_optional(
                [("value", schema::literal(Value::BigInt(-3)))],
                [("children", schema::array(schema::recursion("tree")))],
            )
            .unwrap(),
        );
        let doc = s.describe().unwrap();
        assert_eq!(doc["key"], json!("tree"));
        assert_eq!(doc["value"]["required"]["value"]["value"], json!({"$bigint": "-3"}));
        let reloaded = Schema::from_json_value(doc.clone()).unwrap();
        assert_eq!(reloaded.describe().unwrap(), doc);
    }

    #[test]
    fn symbols_cannot_be_described() {
        assert!(schema::literal(Symbol::new("s")).describe().is_err());
    }

    #[test]
    fn lazy_recursion_is_described_as_a_stub() {
        fn list() -> Schema {
            schema::union([schema::null(), schema::tuple([schema::number(), schema::recursive(list)])])
        }
        let doc = list().describe().unwrap();
        assert_eq!(doc["parts"][1]["parts"][1], json!({"type": "recursive", "lazy": true}));
    }
}
