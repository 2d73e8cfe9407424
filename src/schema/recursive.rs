//! Self-referential schemas.
//!
//! A `recursive` node binds a key to its target for the duration of the
//! descent below it; `recursion` placeholders look the key up again. The
//! target can be given inline, produced by a thunk on demand, or parked in a
//! [`SchemaSlot`] that is filled after placeholders pointing at it exist.
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use super::Schema;
use crate::error::SchemaError;

/// Name under which a recursive node binds its target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecursionKey {
    /// Bound implicitly to the root of every validation, and by unkeyed
    /// `recursive` nodes.
    Anonymous,
    Named(Arc<str>),
}

impl RecursionKey {
    pub fn named(key: impl AsRef<str>) -> Self {
        RecursionKey::Named(Arc::from(key.as_ref()))
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            RecursionKey::Anonymous => None,
            RecursionKey::Named(k) => Some(k),
        }
    }
}

impl fmt::Display for RecursionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecursionKey::Anonymous => f.write_str("<anonymous>"),
            RecursionKey::Named(k) => f.write_str(k),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Recursive {
    pub key: RecursionKey,
    pub target: Target,
}

/// Where a recursive node finds the schema it binds.
#[derive(Clone)]
pub enum Target {
    Inline(Box<Schema>),
    /// Evaluated every time the node is entered.
    Thunk(Arc<dyn Fn() -> Schema + Send + Sync>),
    Slot(SlotRef),
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Inline(schema) => f.debug_tuple("Inline").field(schema).finish(),
            Target::Thunk(_) => f.write_str("Thunk(..)"),
            Target::Slot(slot) => f.debug_tuple("Slot").field(slot).finish(),
        }
    }
}

// -------------------------------- Slots ---------------------------------- //

/// A deferred-initialization cell for a schema that refers to itself.
///
/// ```
/// use json_shape::schema::{self, SchemaSlot};
/// use json_shape::Value;
///
/// let slot = SchemaSlot::new();
/// let child = slot.placeholder();
/// let tree = slot.define(schema::object([
///     ("value", schema::unknown()),
///     ("children", schema::array(child)),
/// ]));
/// let input = Value::from(serde_json::json!({"value": 1, "children": [{"value": 2, "children": []}]}));
/// assert!(tree.is_valid(&input));
/// ```
///
/// Placeholders are handed out with [`SchemaSlot::placeholder`] before the
/// target exists. The schema returned by [`SchemaSlot::define`] owns the cell;
/// placeholders only hold a weak reference, so no reference cycle is formed.
#[derive(Debug, Default)]
pub struct SchemaSlot {
    cell: Arc<OnceCell<Schema>>,
}

impl SchemaSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(&self) -> Schema {
        Schema::Recursive(Recursive {
            key: RecursionKey::Anonymous,
            target: Target::Slot(SlotRef::Placeholder(Arc::downgrade(&self.cell))),
        })
    }

    pub fn define(self, schema: Schema) -> Schema {
        // A fresh slot is always empty, `set` cannot fail here.
        let _ = self.cell.set(schema);
        Schema::Recursive(Recursive {
            key: RecursionKey::Anonymous,
            target: Target::Slot(SlotRef::Owner(self.cell)),
        })
    }
}

#[derive(Clone)]
pub enum SlotRef {
    Owner(Arc<OnceCell<Schema>>),
    Placeholder(Weak<OnceCell<Schema>>),
}

impl SlotRef {
    pub fn is_owner(&self) -> bool {
        matches!(self, SlotRef::Owner(_))
    }

    /// Run `f` against the slot's schema.
    pub fn with<R>(&self, f: impl FnOnce(&Schema) -> R) -> Result<R, SchemaError> {
        let cell = match self {
            SlotRef::Owner(cell) => Arc::clone(cell),
            SlotRef::Placeholder(weak) => weak.upgrade().ok_or(SchemaError::DroppedSlot)?,
        };
        let schema = cell.get().ok_or(SchemaError::UndefinedSlot)?;
        Ok(f(schema))
    }
}

impl fmt::Debug for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotRef::Owner(_) => f.write_str("Owner(..)"),
            SlotRef::Placeholder(_) => f.write_str("Placeholder(..)"),
        }
    }
}
