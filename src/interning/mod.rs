//! Global string interning used by every compiler phase.
//!
//! A single `StringTable` is created per build and threaded through the
//! pipeline so identifiers, module names, and path components are cheap,
//! `Copy` handles instead of heap-allocated `String`s.

mod path;

pub use path::ModulePath;

use rustc_hash::FxHashMap;

/// Identifier for an interned string. Cheap to copy, compare, and hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn resolve(self, table: &StringTable) -> &str {
        table.resolve(self)
    }

    #[inline]
    pub fn eq_str(self, table: &StringTable, other: &str) -> bool {
        table.resolve(self) == other
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Centralized string interning table.
///
/// Uses a dual-mapping approach: a `Vec<Box<str>>` for O(1) id -> string
/// resolution, and an `FxHashMap<&str, StringId>` for O(1) string -> id
/// lookup. Strings are never removed once interned, which is what makes
/// the `'static` trick below sound.
#[derive(Debug, Default)]
pub struct StringTable {
    strings: Vec<Box<str>>,
    string_to_id: FxHashMap<&'static str, StringId>,
}

const MINIMUM_STRING_TABLE_CAPACITY: usize = 64;

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: Vec::with_capacity(capacity + MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing) = self.string_to_id.get(s) {
            return existing;
        }
        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let id = StringId(self.strings.len() as u32);
        let boxed: Box<str> = s.into();

        // SAFETY: the table never removes or reallocates a `Box<str>` once
        // pushed, and it outlives every borrow handed out here because it
        // lives for the whole compilation. This mirrors the interning
        // strategy used throughout the rest of the pipeline to avoid a
        // `String` key copy per entry.
        let static_ref: &'static str =
            unsafe { std::mem::transmute::<&str, &'static str>(boxed.as_ref()) };

        self.string_to_id.insert(static_ref, id);
        self.strings.push(boxed);
        id
    }

    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        self.strings[id.0 as usize].as_ref()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("foo");
        assert_eq!(a, b);
        assert_eq!(table.resolve(a), "foo");
    }

    #[test]
    fn distinct_strings_get_distinct_ids() {
        let mut table = StringTable::new();
        let a = table.intern("foo");
        let b = table.intern("bar");
        assert_ne!(a, b);
    }
}
