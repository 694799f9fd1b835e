//! Dotted module paths represented as interned components.
//!
//! Module names in this language are derived from a source file's path
//! relative to the project's source root, joined with `.`. Representing
//! them as a sequence of interned components (rather than a `String`)
//! makes suffix-matching during import resolution and registry lookups
//! cheap comparisons instead of string scans.

use super::{StringId, StringTable};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModulePath {
    components: Vec<StringId>,
}

impl ModulePath {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_components(components: Vec<StringId>) -> Self {
        Self { components }
    }

    pub fn from_single(component: &str, table: &mut StringTable) -> Self {
        Self {
            components: vec![table.intern(component)],
        }
    }

    /// Derive a module path from a source file path relative to the
    /// project's source root: strips the file extension, splits on path
    /// separators, interns each segment, and prepends `package` (when
    /// given) as the leading component — the final step of the language's
    /// module-naming algorithm. `package` is `None` for an ad hoc single
    /// file compiled outside of a package (no manifest to take a name
    /// from).
    pub fn from_relative_file_path(relative: &Path, package: Option<&str>, table: &mut StringTable) -> Self {
        let mut components = Vec::with_capacity(relative.components().count() + 1);
        if let Some(package) = package {
            components.push(table.intern(package));
        }
        let stem_count = relative.components().count();
        for (idx, component) in relative.components().enumerate() {
            let text = component.as_os_str().to_string_lossy();
            let text = if idx + 1 == stem_count {
                Path::new(text.as_ref())
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| text.into_owned())
            } else {
                text.into_owned()
            };
            components.push(table.intern(&text));
        }
        Self { components }
    }

    pub fn push(&mut self, component: &str, table: &mut StringTable) {
        self.components.push(table.intern(component));
    }

    pub fn append(&self, component: StringId) -> Self {
        let mut components = self.components.clone();
        components.push(component);
        Self { components }
    }

    pub fn join(&self, other: &ModulePath) -> Self {
        let mut components = self.components.clone();
        components.extend_from_slice(&other.components);
        Self { components }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.components.is_empty() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    pub fn name(&self) -> Option<StringId> {
        self.components.last().copied()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn as_components(&self) -> &[StringId] {
        &self.components
    }

    pub fn ends_with(&self, suffix: &ModulePath) -> bool {
        if suffix.len() > self.len() {
            return false;
        }
        let start = self.len() - suffix.len();
        self.components[start..] == suffix.components[..]
    }

    pub fn to_dotted_string(&self, table: &StringTable) -> String {
        self.components
            .iter()
            .map(|id| table.resolve(*id))
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn to_path_buf(&self, table: &StringTable) -> PathBuf {
        let mut buf = PathBuf::new();
        for id in &self.components {
            buf.push(table.resolve(*id));
        }
        buf
    }
}

impl std::fmt::Display for ModulePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<module path, {} components>", self.components.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_dotted_name_from_relative_path_with_no_package() {
        let mut table = StringTable::new();
        let path = ModulePath::from_relative_file_path(Path::new("math/util.mg"), None, &mut table);
        assert_eq!(path.to_dotted_string(&table), "math.util");
    }

    #[test]
    fn derives_dotted_name_prepending_the_package_name() {
        let mut table = StringTable::new();
        let path = ModulePath::from_relative_file_path(Path::new("math/util.mg"), Some("myapp"), &mut table);
        assert_eq!(path.to_dotted_string(&table), "myapp.math.util");
    }

    #[test]
    fn ends_with_matches_suffix() {
        let mut table = StringTable::new();
        let full = ModulePath::from_relative_file_path(Path::new("a/b/c.mg"), None, &mut table);
        let suffix = ModulePath::from_relative_file_path(Path::new("b/c.mg"), None, &mut table);
        assert!(full.ends_with(&suffix));
    }

    #[test]
    fn ends_with_matches_suffix_across_a_package_prefix() {
        let mut table = StringTable::new();
        let full = ModulePath::from_relative_file_path(Path::new("a/b/c.mg"), Some("myapp"), &mut table);
        let suffix = ModulePath::from_relative_file_path(Path::new("b/c.mg"), None, &mut table);
        assert!(full.ends_with(&suffix));
    }
}
