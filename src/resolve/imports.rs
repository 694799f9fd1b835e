//! Import resolution: turn an import path written in source into the
//! registry entry it names.
//!
//! A requested path resolves to a registered module if it matches
//! exactly, or if it matches the tail ("suffix") of exactly one
//! registered module's dotted name. An ambiguous suffix match (more than
//! one candidate) is treated as unresolved, surfaced as a diagnostic by
//! the caller rather than silently picking one.

use crate::diagnostics::{Diagnostic, ErrorKind, Reporter, Span};
use crate::interning::{ModulePath, StringTable};
use crate::module_graph::{is_builtin, ModuleRegistry};
use crate::resolve_log;

pub fn resolve_module_path(
    requested: &ModulePath,
    registry: &ModuleRegistry,
    table: &StringTable,
) -> Option<ModulePath> {
    if registry.get(requested).is_some() {
        return Some(requested.clone());
    }

    let mut matches = registry
        .iter()
        .map(|module| &module.path)
        .filter(|candidate| candidate.ends_with(requested));

    let first = matches.next()?.clone();
    if matches.next().is_some() {
        return None;
    }
    resolve_log!("resolved import to '{}'", first.to_dotted_string(table));
    Some(first)
}

/// Resolves every `using` declaration in every registered module,
/// reporting an "unresolved import" / "ambiguous import" diagnostic for
/// anything that isn't a builtin and doesn't resolve uniquely.
pub fn resolve_all_imports(registry: &ModuleRegistry, table: &StringTable, reporter: &mut Reporter) {
    for module in registry.iter() {
        for import in registry.imports_of(&module.path) {
            if is_builtin(&import, table) {
                continue;
            }

            let exact = registry.get(&import).is_some();
            let suffix_candidates: Vec<_> = registry
                .iter()
                .map(|m| &m.path)
                .filter(|candidate| candidate.ends_with(&import))
                .collect();

            if exact {
                continue;
            }

            let span = Span::to_here(module.path.clone(), crate::diagnostics::Position::new(1, 1));
            match suffix_candidates.len() {
                0 => {
                    reporter.push(
                        Diagnostic::error(
                            ErrorKind::Module,
                            format!(
                                "cannot resolve import '{}'",
                                import.to_dotted_string(table)
                            ),
                            span,
                        )
                        .with_help("check the module path spelling or that the file exists under the source root"),
                    );
                }
                1 => {}
                _ => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Module,
                        format!(
                            "import '{}' is ambiguous: matches {} modules",
                            import.to_dotted_string(table),
                            suffix_candidates.len()
                        ),
                        span,
                    ));
                }
            }
        }
    }
}
