use indexmap::IndexMap;

use super::Schema;
use crate::error::SchemaError;

/// Property schemas of an `object` node.
///
/// Required and optional keys are disjoint; both maps keep declaration order,
/// which is also the order properties are checked in.
#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    required: IndexMap<String, Schema>,
    optional: IndexMap<String, Schema>,
}

impl ObjectSchema {
    pub fn new(
        required: IndexMap<String, Schema>,
        optional: IndexMap<String, Schema>,
    ) -> Result<Self, SchemaError> {
        if let Some(key) = required.keys().find(|k| optional.contains_key(*k)) {
            return Err(SchemaError::OverlappingKeys { key: key.clone() });
        }
        Ok(Self { required, optional })
    }

    pub fn required_only(required: IndexMap<String, Schema>) -> Self {
        Self { required, optional: IndexMap::new() }
    }

    pub fn required(&self) -> &IndexMap<String, Schema> {
        &self.required
    }

    pub fn optional(&self) -> &IndexMap<String, Schema> {
        &self.optional
    }

    /// Every declared property with its presence rule, required ones first.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Schema, bool)> {
        let required = self.required.iter().map(|(k, s)| (k.as_str(), s, true));
        let optional = self.optional.iter().map(|(k, s)| (k.as_str(), s, false));
        required.chain(optional)
    }

    pub fn len(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
