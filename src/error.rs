//! Outcome types: data failures, malformed schemas, value mapping errors.
use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::render::render_path;

/// One step from the root value towards the point of failure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl Serialize for PathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PathSegment::Key(k) => serializer.serialize_str(k),
            PathSegment::Index(i) => serializer.serialize_u64(*i as u64),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(k: &str) -> Self {
        PathSegment::Key(k.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(k: String) -> Self {
        PathSegment::Key(k)
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// A value did not conform to a schema.
///
/// `path` reads root → leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Error)]
pub struct ValidationError {
    pub message: String,
    pub path: Vec<PathSegment>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: Vec<PathSegment>) -> Self {
        Self { message: message.into(), path }
    }

    /// A failure at the current position (empty path).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, Vec::new())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Re-raise from one level up: `segment` becomes the first path entry.
    pub fn nested(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Rewrite the message, keeping the path.
    pub fn map_message(mut self, f: impl FnOnce(String) -> String) -> Self {
        self.message = f(self.message);
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{} at {}", self.message, render_path(&self.path))
        }
    }
}

/// The schema itself is malformed. These are authoring errors, never data errors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("object schema declares `{key}` as both required and optional")]
    OverlappingKeys { key: String },

    #[error("recursion key `{key}` is not bound by any enclosing recursive schema")]
    UnboundRecursion { key: String },

    #[error("schema slot was referenced before it was defined")]
    UndefinedSlot,

    #[error("schema slot outlived the schema that defined it")]
    DroppedSlot,

    #[error("pipe schema requires at least one stage")]
    EmptyPipe,

    #[error("`{kind}` schemas carry functions and cannot be loaded from a document")]
    NotLoadable { kind: &'static str },

    #[error("invalid literal: {reason}")]
    InvalidLiteral { reason: String },

    #[error("at JSON path {path} → {reason}")]
    Document { path: String, reason: String },
}

/// A `Value` has no JSON representation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValueError {
    #[error("{0} has no JSON representation")]
    Symbol(String),

    #[error("non-finite number {0} has no JSON representation")]
    NonFinite(f64),

    #[error("bigint {0} does not fit a JSON number")]
    BigIntRange(i128),
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_prepends_segments() {
        let err = ValidationError::failure("not a number").nested(1).nested("a");
        assert_eq!(err.path, vec![PathSegment::from("a"), PathSegment::Index(1)]);
        assert_eq!(err.to_string(), "not a number at $.a[1]");
    }

    #[test]
    fn map_message_keeps_path() {
        let err = ValidationError::new("not a string", vec!["k".into()])
            .map_message(|m| format!("Record value: {m}"));
        assert_eq!(err.message(), "Record value: not a string");
        assert_eq!(err.path(), &[PathSegment::from("k")]);
    }

    #[test]
    fn serializes_path_as_keys_and_indices() {
        let err = ValidationError::new("x", vec!["children".into(), 0.into(), "value".into()]);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"message": "x", "path": ["children", 0, "value"]}));
    }

    #[test]
    fn root_failure_displays_bare_message() {
        assert_eq!(ValidationError::failure("not an array").to_string(), "not an array");
    }
}
