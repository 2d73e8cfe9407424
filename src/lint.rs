//! Static schema check.
//!
//! Finds authoring mistakes that would otherwise only surface as a panic once
//! some input happens to reach them.
use crate::error::SchemaError;
use crate::schema::{RecursionKey, Schema, Target};

impl Schema {
    /// Verify that every `recursion` key is bound by an enclosing `recursive`
    /// node and that every slot reachable without calling a thunk is filled.
    ///
    /// The anonymous key is always bound, to the root.
    pub fn check(&self) -> Result<(), SchemaError> {
        let mut bound = vec![RecursionKey::Anonymous];
        walk(self, &mut bound)
    }
}

fn walk(schema: &Schema, bound: &mut Vec<RecursionKey>) -> Result<(), SchemaError> {
    match schema {
        Schema::Atomic(_)
        | Schema::Literal { .. }
        | Schema::LiteralUnion { .. }
        | Schema::AnyObject
        | Schema::Convert(_) => Ok(()),
        Schema::Array { element } | Schema::NonEmptyArray { element } => walk(element, bound),
        Schema::MinLength { base, .. } | Schema::MaxLength { base, .. } | Schema::Refine { base, .. } => {
            walk(base, bound)
        }
        Schema::Tuple { parts }
        | Schema::Union { parts }
        | Schema::Intersection { parts }
        | Schema::Pipe { stages: parts } => parts.iter().try_for_each(|part| walk(part, bound)),
        Schema::Object(obj) => obj.properties().try_for_each(|(_, s, _)| walk(s, bound)),
        Schema::Record { key, value } => {
            walk(key, bound)?;
            walk(value, bound)
        }
        Schema::Recursive(rec) => match &rec.target {
            Target::Inline(inner) => scoped(&rec.key, inner, bound),
            // expanding a thunk could recurse forever
            Target::Thunk(_) => Ok(()),
            Target::Slot(slot) if slot.is_owner() => slot.with(|inner| scoped(&rec.key, inner, bound))?,
            // the owner walks the body
            Target::Slot(slot) => slot.with(|_| ()),
        },
        Schema::Recursion { key } if bound.contains(key) => Ok(()),
        Schema::Recursion { key } => Err(SchemaError::UnboundRecursion { key: key.to_string() }),
    }
}

fn scoped(key: &RecursionKey, inner: &Schema, bound: &mut Vec<RecursionKey>) -> Result<(), SchemaError> {
    bound.push(key.clone());
    let result = walk(inner, bound);
    bound.pop();
    result
}

// ------------------------------- Tests ------------------------------------ //
