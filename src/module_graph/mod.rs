//! The module registry: a process-wide arena of parsed modules keyed by
//! name, with imports stored as name-references rather than pointers.
//!
//! The registry is cleared at the start of every build (`ModuleRegistry::new`
//! is called fresh per `build::Pipeline::run`), so there is no persistent
//! process-global state between builds despite the registry being the one
//! structure every later phase shares mutable access to.

use crate::ast::{Decl, Program};
use crate::diagnostics::{Diagnostic, ErrorKind, Reporter, Span};
use crate::interning::{ModulePath, StringTable};
use crate::module_graph_log;
use rustc_hash::FxHashMap;

/// Module names under these prefixes are resolved against the fixed
/// stdlib surface baked into codegen, not against the project's own
/// source files.
pub const BUILTIN_MODULE_PREFIXES: &[&str] = &["std", "std.io", "std.math", "std.string", "std.array"];

pub fn is_builtin(path: &ModulePath, table: &StringTable) -> bool {
    let dotted = path.to_dotted_string(table);
    BUILTIN_MODULE_PREFIXES
        .iter()
        .any(|prefix| dotted == *prefix || dotted.starts_with(&format!("{prefix}.")))
}

pub struct Module {
    pub path: ModulePath,
    pub program: Program,
}

/// Insertion-ordered module store: iteration order is deterministic and
/// independent of filesystem enumeration order or the thread that
/// discovered a given file.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    index: FxHashMap<ModulePath, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: ModulePath, program: Program, reporter: &mut Reporter) {
        if let Some(&existing) = self.index.get(&path) {
            let span = Span::to_here(path.clone(), crate::diagnostics::Position::new(1, 1));
            reporter.push(Diagnostic::error(
                ErrorKind::Module,
                format!("duplicate module registered for the same name"),
                span,
            ));
            let _ = existing;
            return;
        }
        module_graph_log!("registered module");
        self.index.insert(path.clone(), self.modules.len());
        self.modules.push(Module { path, program });
    }

    pub fn get(&self, path: &ModulePath) -> Option<&Module> {
        self.index.get(path).map(|&idx| &self.modules[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// All import targets declared by a module's top-level `using`
    /// declarations, in source order.
    pub fn imports_of(&self, path: &ModulePath) -> Vec<ModulePath> {
        let Some(module) = self.get(path) else {
            return Vec::new();
        };
        module
            .program
            .decls
            .iter()
            .filter_map(|decl| match decl {
                Decl::Import(import) => Some(ModulePath::from_components(import.path.clone())),
                _ => None,
            })
            .collect()
    }

    /// Topologically sorts modules by import dependency using
    /// depth-first search with cycle detection, returning module paths
    /// in an order where every module appears after all modules it
    /// depends on. Builtin imports are skipped (they have no registry
    /// entry to order against).
    pub fn topological_order(&self, table: &StringTable, reporter: &mut Reporter) -> Vec<ModulePath> {
        let mut visited = rustc_hash::FxHashSet::default();
        let mut temp_mark = rustc_hash::FxHashSet::default();
        let mut sorted = Vec::with_capacity(self.modules.len());

        for module in &self.modules {
            if !visited.contains(&module.path) {
                visit(
                    &module.path,
                    self,
                    table,
                    &mut temp_mark,
                    &mut visited,
                    &mut sorted,
                    reporter,
                );
            }
        }

        sorted
    }
}

fn visit(
    path: &ModulePath,
    registry: &ModuleRegistry,
    table: &StringTable,
    temp_mark: &mut rustc_hash::FxHashSet<ModulePath>,
    visited: &mut rustc_hash::FxHashSet<ModulePath>,
    sorted: &mut Vec<ModulePath>,
    reporter: &mut Reporter,
) {
    if temp_mark.contains(path) {
        let span = Span::to_here(path.clone(), crate::diagnostics::Position::new(1, 1));
        reporter.push(
            Diagnostic::error(
                ErrorKind::Module,
                format!(
                    "circular dependency detected at module '{}'",
                    path.to_dotted_string(table)
                ),
                span,
            )
            .with_help("move the shared code into a separate module to break the cycle"),
        );
        return;
    }
    if visited.contains(path) {
        return;
    }

    temp_mark.insert(path.clone());
    for import in registry.imports_of(path) {
        if is_builtin(&import, table) {
            continue;
        }
        if let Some(resolved) = crate::resolve::imports::resolve_module_path(&import, registry, table) {
            visit(&resolved, registry, table, temp_mark, visited, sorted, reporter);
        }
    }
    temp_mark.remove(path);
    visited.insert(path.clone());
    sorted.push(path.clone());
}
