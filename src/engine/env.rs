use crate::schema::{RecursionKey, Schema};

/// Recursion bindings visible at one point of the descent.
///
/// Frames live on the call stack and link to their parent, so a binding is
/// visible exactly to the subtree it was pushed for; sibling branches never
/// see each other's bindings.
#[derive(Clone, Copy, Default)]
pub(crate) struct Env<'a> {
    top: Option<&'a Frame<'a>>,
}

pub(crate) struct Frame<'a> {
    key: &'a RecursionKey,
    schema: &'a Schema,
    parent: Env<'a>,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(key: &'a RecursionKey, schema: &'a Schema, parent: Env<'a>) -> Self {
        Self { key, schema, parent }
    }

    pub(crate) fn env(&'a self) -> Env<'a> {
        Env { top: Some(self) }
    }
}

impl<'a> Env<'a> {
    /// Innermost binding for `key`.
    pub(crate) fn lookup(self, key: &RecursionKey) -> Option<&'a Schema> {
        let mut cursor = self.top;
        while let Some(frame) = cursor {
            if frame.key == key {
                return Some(frame.schema);
            }
            cursor = frame.parent.top;
        }
        None
    }

    pub(crate) fn depth(self) -> usize {
        let mut n = 0;
        let mut cursor = self.top;
        while let Some(frame) = cursor {
            n += 1;
            cursor = frame.parent.top;
        }
        n
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let anon = RecursionKey::Anonymous;
        let outer = schema::number();
        let inner = schema::string();
        let root = Frame::new(&anon, &outer, Env::default());
        let nested = Frame::new(&anon, &inner, root.env());
        assert!(matches!(nested.env().lookup(&anon), Some(schema::Schema::Atomic(schema::Atomic::String))));
        assert!(matches!(root.env().lookup(&anon), Some(schema::Schema::Atomic(schema::Atomic::Number))));
        assert_eq!(nested.env().depth(), 2);
    }

    #[test]
    fn named_keys_resolve_through_unrelated_frames() {
        let tree = RecursionKey::named("tree");
        let anon = RecursionKey::Anonymous;
        let a = schema::boolean();
        let b = schema::null();
        let outer = Frame::new(&tree, &a, Env::default());
        let inner = Frame::new(&anon, &b, outer.env());
        assert!(inner.env().lookup(&tree).is_some());
        assert!(inner.env().lookup(&RecursionKey::named("forest")).is_none());
    }
}
