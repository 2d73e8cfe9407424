//! Schema-driven validation and conversion of dynamic values.
//!
//! Build a [`Schema`] from the factories in [`schema`] (or load one from a
//! JSON document), then [`Schema::validate`] untrusted input against it:
//!
//! ```
//! use json_shape::{Value, schema};
//!
//! let point = schema::object([("x", schema::number()), ("y", schema::number())]);
//! let input = Value::from(serde_json::json!({"x": 1, "y": "2"}));
//! let err = point.validate(&input).unwrap_err();
//! assert_eq!(err.to_string(), "not a number at $.y");
//! assert!(!point.is_valid(&input));
//! ```
pub mod document;
pub mod engine;
pub mod error;
pub mod lint;
pub mod path_de;
pub mod render;
pub mod schema;
pub mod value;

pub use engine::{is_valid, validate, validate_owned};
pub use error::{PathSegment, SchemaError, ValidationError, ValueError};
pub use schema::{Schema, SchemaSlot};
pub use value::{Map, Symbol, Value};
