//! Accumulate-don't-abort diagnostic reporting.
//!
//! Every phase of the pipeline collects `Diagnostic`s into a shared
//! `Reporter` rather than aborting on the first error, so a single build
//! can surface every problem it finds in one pass. A phase only refuses
//! to hand its output to the next phase when `Reporter::has_error()` is
//! true.

mod display;

pub use display::render;

use crate::interning::{ModulePath, StringTable};

/// A position in a source file: 1-based line, 1-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A source range, scoped to a module, used by every token/AST node and
/// every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub module: ModulePath,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(module: ModulePath, start: Position, end: Position) -> Self {
        Self { module, start, end }
    }

    pub fn to_here(module: ModulePath, pos: Position) -> Self {
        Self {
            module,
            start: pos,
            end: pos,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// Phase-grouped error taxonomy. Each phase's own internal-invariant
/// violations funnel into `Internal` rather than panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Module,
    Name,
    Type,
    Emission,
    Internal,
}

impl ErrorKind {
    fn code_prefix(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "E01",
            ErrorKind::Syntactic => "E02",
            ErrorKind::Module => "E03",
            ErrorKind::Name => "E04",
            ErrorKind::Type => "E05",
            ErrorKind::Emission => "E06",
            ErrorKind::Internal => "E99",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub help: Option<String>,
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn error(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
            help: None,
            code: None,
        }
    }

    pub fn warning(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            span,
            help: None,
            code: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_code(mut self) -> Self {
        self.code = Some(self.kind.code_prefix());
        self
    }

    pub fn internal(message: impl Into<String>, span: Span) -> Self {
        Self::error(ErrorKind::Internal, message, span)
    }
}

/// Suppresses specific diagnostics that are expected to be noisy in a
/// partial-source context (e.g. an editor integration checking a file
/// being actively typed). The default policy suppresses nothing; this is
/// a seam for a collaborator that needs quieter output, not a feature
/// implemented by this crate.
pub trait FilterPolicy {
    fn allow(&self, diagnostic: &Diagnostic) -> bool;
}

pub struct NoFilter;

impl FilterPolicy for NoFilter {
    fn allow(&self, _diagnostic: &Diagnostic) -> bool {
        true
    }
}

/// Quiets the two diagnostic classes that are disproportionately noisy
/// while a file is being actively edited: a call through a chain that
/// hasn't been fully typed out yet looks like a call on a non-function,
/// and a namespace identifier typed alone on a line looks like an
/// undefined variable. An editor integration can use this instead of
/// `NoFilter` to avoid flashing both on every keystroke.
pub struct LspFilterPolicy;

impl FilterPolicy for LspFilterPolicy {
    fn allow(&self, diagnostic: &Diagnostic) -> bool {
        if diagnostic.message.starts_with("cannot call a value of type") {
            return false;
        }
        if let Some(name) = diagnostic
            .message
            .strip_prefix("undefined variable '")
            .and_then(|rest| rest.strip_suffix('\''))
        {
            let lowered = name.to_ascii_lowercase();
            if crate::module_graph::BUILTIN_MODULE_PREFIXES.contains(&lowered.as_str())
                || name.chars().next().is_some_and(|c| c.is_uppercase())
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Default)]
pub struct Reporter {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors.push(diagnostic),
            Severity::Warning => self.warnings.push(diagnostic),
        }
    }

    pub fn extend(&mut self, other: Reporter) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Every diagnostic in source order, errors and warnings merged by
    /// span position rather than just concatenated — a warning raised in
    /// an earlier pass can still sit after an error from a later pass at
    /// an earlier line.
    pub fn all(&self) -> Vec<&Diagnostic> {
        let mut combined: Vec<&Diagnostic> = self.errors.iter().chain(self.warnings.iter()).collect();
        combined.sort_by_key(|d| (d.span.start.line, d.span.start.column));
        combined
    }

    pub fn render_all(&self, table: &StringTable, sources: &dyn Fn(&ModulePath) -> Option<String>) -> String {
        let mut out = String::new();
        for diagnostic in self.all() {
            out.push_str(&render(diagnostic, table, sources));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod filter_tests {
    use super::*;
    use crate::interning::StringTable;

    fn dummy_span(table: &mut StringTable) -> Span {
        let module = ModulePath::from_single("main", table);
        Span::to_here(module, Position::new(1, 1))
    }

    #[test]
    fn no_filter_allows_everything() {
        let mut table = StringTable::new();
        let span = dummy_span(&mut table);
        let d = Diagnostic::error(ErrorKind::Name, "undefined variable 'Std'", span);
        assert!(NoFilter.allow(&d));
    }

    #[test]
    fn lsp_filter_suppresses_non_function_call_on_chain() {
        let mut table = StringTable::new();
        let span = dummy_span(&mut table);
        let d = Diagnostic::error(ErrorKind::Type, "cannot call a value of type Int", span);
        assert!(!LspFilterPolicy.allow(&d));
    }

    #[test]
    fn lsp_filter_suppresses_undefined_namespace_identifier() {
        let mut table = StringTable::new();
        let span = dummy_span(&mut table);
        let d = Diagnostic::error(ErrorKind::Name, "undefined variable 'Std'", span);
        assert!(!LspFilterPolicy.allow(&d));

        let span2 = dummy_span(&mut table);
        let lowered = Diagnostic::error(ErrorKind::Name, "undefined variable 'std'", span2);
        assert!(!LspFilterPolicy.allow(&lowered));
    }

    #[test]
    fn lsp_filter_keeps_undefined_plain_local_variable() {
        let mut table = StringTable::new();
        let span = dummy_span(&mut table);
        let d = Diagnostic::error(ErrorKind::Name, "undefined variable 'count'", span);
        assert!(LspFilterPolicy.allow(&d));
    }
}

#[cfg(test)]
mod reporter_tests {
    use super::*;
    use crate::interning::StringTable;

    fn span_at(module: &ModulePath, line: u32) -> Span {
        Span::to_here(module.clone(), Position::new(line, 1))
    }

    #[test]
    fn all_merges_errors_and_warnings_in_source_order_regardless_of_push_order() {
        let mut table = StringTable::new();
        let module = ModulePath::from_single("main", &mut table);

        let mut reporter = Reporter::new();
        // A later-reported error sits earlier in the source than an
        // earlier-reported warning; `all()` must still yield them in
        // line order, not push order.
        reporter.push(Diagnostic::warning(ErrorKind::Name, "unused variable 'x'", span_at(&module, 5)));
        reporter.push(Diagnostic::error(ErrorKind::Type, "type mismatch", span_at(&module, 2)));

        let ordered = reporter.all();
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].message, "type mismatch");
        assert_eq!(ordered[1].message, "unused variable 'x'");
    }
}
