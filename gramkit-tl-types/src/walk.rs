//! Named-field view over decoded TL objects.
//!
//! Every schema type exposes its children through [`TlObject::walk_fields`],
//! which lets callers harvest data from arbitrarily deep responses without
//! matching on each concrete shape. Primitive fields are never visited.

use std::any::Any;

/// A decoded TL value that can be tree-walked.
pub trait TlObject: Any {
    /// Upcast used for downcasting to a concrete schema type.
    fn as_any(&self) -> &dyn Any;

    /// Calls `visit` once per direct child object, with the field name.
    fn walk_fields(&self, visit: &mut dyn FnMut(&'static str, &dyn TlObject));
}

/// How a field presents itself to [`TlObject::walk_fields`].
///
/// Objects visit themselves, `Option`s visit their content when present,
/// primitives visit nothing.
pub trait Walk {
    fn walk_as_field(&self, name: &'static str, visit: &mut dyn FnMut(&'static str, &dyn TlObject));
}

impl<T: TlObject> Walk for T {
    fn walk_as_field(&self, name: &'static str, visit: &mut dyn FnMut(&'static str, &dyn TlObject)) {
        visit(name, self);
    }
}

impl<T: Walk> Walk for Option<T> {
    fn walk_as_field(&self, name: &'static str, visit: &mut dyn FnMut(&'static str, &dyn TlObject)) {
        if let Some(v) = self { v.walk_as_field(name, visit); }
    }
}

macro_rules! leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Walk for $ty {
                fn walk_as_field(&self, _: &'static str, _: &mut dyn FnMut(&'static str, &dyn TlObject)) {}
            }
        )*
    };
}

leaf!(bool, i32, u32, i64, f64, String, Vec<u8>, [u8; 16], [u8; 32], Vec<i32>, Vec<i64>, Vec<String>);

// ─── Collections ─────────────────────────────────────────────────────────────

impl<T: TlObject> TlObject for Vec<T> {
    fn as_any(&self) -> &dyn Any { self }

    fn walk_fields(&self, visit: &mut dyn FnMut(&'static str, &dyn TlObject)) {
        for item in self { visit("", item); }
    }
}

impl<T: TlObject> TlObject for crate::RawVec<T> {
    fn as_any(&self) -> &dyn Any { self }

    fn walk_fields(&self, visit: &mut dyn FnMut(&'static str, &dyn TlObject)) {
        for item in &self.0 { visit("", item); }
    }
}

/// Walks `root` depth-first, calling `handle` on `root` and on every nested
/// object. Children of a node are only visited when `handle` returns `true`
/// for it.
pub fn walk(root: &dyn TlObject, handle: &mut dyn FnMut(&'static str, &dyn TlObject) -> bool) {
    if handle("", root) {
        walk_children(root, handle);
    }
}

fn walk_children(node: &dyn TlObject, handle: &mut dyn FnMut(&'static str, &dyn TlObject) -> bool) {
    node.walk_fields(&mut |name, child| {
        if handle(name, child) {
            walk_children(child, &mut *handle);
        }
    });
}
