use serde::de::{Deserialize, DeserializeOwned, Deserializer};

use crate::error::SchemaError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let value = located(&mut *de)?;
    de.end().map_err(|err| SchemaError::Document { path: "$".to_string(), reason: err.to_string() })?;
    Ok(value)
}

/// Same as [`from_str_with_path`], for a document that is already parsed.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, SchemaError> {
    located(value)
}

fn located<'de, D, T>(de: D) -> Result<T, SchemaError>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::Document { path, reason: err.into_inner().to_string() }
    })
}

// ------------------------------- Tests ------------------------------------ //
