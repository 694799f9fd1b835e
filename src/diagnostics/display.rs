//! Renders a `Diagnostic` into the fixed, user-visible text format:
//!
//! ```text
//! error: message
//!   --> path/to/file:line:col
//!   = help: hint
//! ```
//!
//! When the offending source line is available, a caret line underlines
//! the offending span.

use super::{Diagnostic, Severity};
use crate::interning::{ModulePath, StringTable};

pub fn render(
    diagnostic: &Diagnostic,
    table: &StringTable,
    sources: &dyn Fn(&ModulePath) -> Option<String>,
) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };

    let path = diagnostic.span.module.to_dotted_string(table);
    let mut out = format!(
        "{severity}: {message}\n  --> {path}:{line}:{col}\n",
        severity = severity,
        message = diagnostic.message,
        path = path,
        line = diagnostic.span.start.line,
        col = diagnostic.span.start.column,
    );

    if let Some(source) = sources(&diagnostic.span.module) {
        if let Some(line_text) = source.lines().nth(diagnostic.span.start.line.saturating_sub(1) as usize) {
            let underline_len = if diagnostic.span.end.line == diagnostic.span.start.line
                && diagnostic.span.end.column > diagnostic.span.start.column
            {
                (diagnostic.span.end.column - diagnostic.span.start.column) as usize
            } else {
                1
            };
            let indent = " ".repeat(diagnostic.span.start.column.saturating_sub(1) as usize);
            out.push_str(&format!("  | {line_text}\n"));
            out.push_str(&format!("  | {indent}{}\n", "^".repeat(underline_len.max(1))));
        }
    }

    if let Some(help) = &diagnostic.help {
        out.push_str(&format!("  = help: {help}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{ErrorKind, Position, Span};

    #[test]
    fn renders_fixed_format() {
        let mut table = StringTable::new();
        let module = ModulePath::from_single("main", &mut table);
        let span = Span::new(module, Position::new(3, 5), Position::new(3, 9));
        let diag = Diagnostic::error(ErrorKind::Type, "cannot assign Int to String", span)
            .with_help("convert with toString()");
        let rendered = render(&diag, &table, &|_| None);
        assert!(rendered.starts_with("error: cannot assign Int to String\n"));
        assert!(rendered.contains("--> main:3:5"));
        assert!(rendered.contains("= help: convert with toString()"));
    }
}
