use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::render::literal_to_string;
use crate::value::Value;

type TestFn = dyn Fn(&Value) -> bool + Send + Sync;
type ConvertFn = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

/// A narrowing check attached to a `refine` node.
#[derive(Clone)]
pub struct Predicate {
    name: Option<Cow<'static, str>>,
    test: Arc<TestFn>,
}

impl Predicate {
    pub fn new(test: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self { name: None, test: Arc::new(test) }
    }

    pub fn named(
        name: impl Into<Cow<'static, str>>,
        test: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { name: Some(name.into()), test: Arc::new(test) }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }

    pub(crate) fn unmet_message(&self, value: &Value) -> String {
        match &self.name {
            Some(name) => format!("predicate {name} not met: {}", literal_to_string(value)),
            None => format!("predicate not met: {}", literal_to_string(value)),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A value transformation. An `Err` plays the part of a thrown exception;
/// its text becomes the failure message.
#[derive(Clone)]
pub struct Converter {
    name: Option<Cow<'static, str>>,
    run: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F, E>(convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self {
            name: None,
            run: Arc::new(move |v| convert(v).map_err(|e| e.to_string())),
        }
    }

    pub fn named<F, E>(name: impl Into<Cow<'static, str>>, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self { name: Some(name.into()), ..Self::new(convert) }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        (self.run)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter").field("name", &self.name).finish_non_exhaustive()
    }
}
