//! Name resolution: binds every identifier reference to a declaration
//! (a local, a parameter, a function, or a class) and flags the
//! non-lvalue-assignment and undefined-variable error classes.
//!
//! Scopes are arena-indexed (`Vec<ScopeData>` plus a parent index)
//! rather than a parent-pointer tree of `Rc<RefCell<_>>` nodes, so there
//! is no shared mutable state across the scope stack.

use crate::ast::*;
use crate::diagnostics::{Diagnostic, ErrorKind, Reporter, Span};
use crate::interning::StringId;
use crate::module_graph::ModuleRegistry;
use crate::resolve_log;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Var { mutable: bool },
    Param,
    Function,
    Class,
}

pub struct Scope {
    parent: Option<usize>,
    declarations: FxHashMap<StringId, Binding>,
}

pub struct NameResolver<'a> {
    registry: &'a ModuleRegistry,
    table: &'a crate::interning::StringTable,
    scopes: Vec<Scope>,
    current: usize,
}

impl<'a> NameResolver<'a> {
    pub fn new(registry: &'a ModuleRegistry, table: &'a crate::interning::StringTable) -> Self {
        Self {
            registry,
            table,
            scopes: vec![Scope {
                parent: None,
                declarations: FxHashMap::default(),
            }],
            current: 0,
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope {
            parent: Some(self.current),
            declarations: FxHashMap::default(),
        });
        self.current = self.scopes.len() - 1;
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    fn declare(&mut self, name: StringId, binding: Binding) {
        self.scopes[self.current].declarations.insert(name, binding);
    }

    fn lookup(&self, name: StringId) -> Option<Binding> {
        let mut idx = Some(self.current);
        while let Some(i) = idx {
            if let Some(binding) = self.scopes[i].declarations.get(&name) {
                return Some(*binding);
            }
            idx = self.scopes[i].parent;
        }
        None
    }

    pub fn resolve_module(&mut self, program: &Program, reporter: &mut Reporter) {
        // First pass: register every top-level function/class name so
        // forward references and mutual recursion resolve.
        for decl in &program.decls {
            match decl {
                Decl::Function(f) => self.declare(f.signature.name, Binding::Function),
                Decl::Class(c) => self.declare(c.name, Binding::Class),
                _ => {}
            }
        }

        for decl in &program.decls {
            match decl {
                Decl::Function(f) => self.resolve_function(f, reporter),
                Decl::Class(c) => {
                    for field in &c.fields {
                        if let Some(init) = &field.init {
                            self.resolve_expr(init, reporter);
                        }
                    }
                    for method in &c.methods {
                        self.resolve_function(method, reporter);
                    }
                }
                Decl::Import(_) | Decl::NativeImport(_) | Decl::NativeBlock(..) => {}
            }
        }
        resolve_log!("resolved module with {} declarations", program.decls.len());
    }

    fn resolve_function(&mut self, function: &FunctionDecl, reporter: &mut Reporter) {
        self.push_scope();
        for param in &function.signature.params {
            self.declare(param.name, Binding::Param);
        }
        for stmt in &function.body {
            self.resolve_stmt(stmt, reporter);
        }
        self.pop_scope();
    }

    fn resolve_block(&mut self, block: &[Stmt], reporter: &mut Reporter) {
        self.push_scope();
        for stmt in block {
            self.resolve_stmt(stmt, reporter);
        }
        self.pop_scope();
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, reporter: &mut Reporter) {
        match &stmt.kind {
            StmtKind::Let { name, mutable, value, .. } => {
                self.resolve_expr(value, reporter);
                self.declare(*name, Binding::Var { mutable: *mutable });
            }
            StmtKind::Expr(expr) => self.resolve_expr(expr, reporter),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.resolve_expr(value, reporter);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition, reporter);
                self.resolve_block(then_branch, reporter);
                if let Some(else_branch) = else_branch {
                    self.resolve_block(else_branch, reporter);
                }
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition, reporter);
                self.resolve_block(body, reporter);
            }
            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                self.resolve_expr(iterable, reporter);
                self.push_scope();
                self.declare(*binding, Binding::Var { mutable: false });
                for stmt in body {
                    self.resolve_stmt(stmt, reporter);
                }
                self.pop_scope();
            }
            StmtKind::Break | StmtKind::Continue => {}
        }
    }

    fn resolve_expr(&mut self, expr: &Expr, reporter: &mut Reporter) {
        match &expr.kind {
            ExprKind::Path(segments) => self.resolve_path(segments, &expr.span, reporter),
            ExprKind::Binary(_, left, right) => {
                self.resolve_expr(left, reporter);
                self.resolve_expr(right, reporter);
            }
            ExprKind::Unary(_, operand) => self.resolve_expr(operand, reporter),
            ExprKind::Call { callee, args, .. } => {
                self.resolve_expr(callee, reporter);
                for arg in args {
                    self.resolve_expr(arg, reporter);
                }
            }
            ExprKind::FieldAccess(base, _) => self.resolve_expr(base, reporter),
            ExprKind::Index(base, index) => {
                self.resolve_expr(base, reporter);
                self.resolve_expr(index, reporter);
            }
            ExprKind::Assign { target, value } => {
                self.resolve_expr(value, reporter);
                if !is_lvalue(target) {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Name,
                        "cannot assign to a non-lvalue expression",
                        target.span.clone(),
                    ).with_help("assignment targets must be a variable, field, or array index"));
                } else {
                    self.resolve_expr(target, reporter);
                }
            }
            ExprKind::Lambda { params, body, .. } => {
                self.push_scope();
                for param in params {
                    self.declare(param.name, Binding::Param);
                }
                self.resolve_expr(body, reporter);
                self.pop_scope();
            }
            ExprKind::Match { scrutinee, arms } => {
                self.resolve_expr(scrutinee, reporter);
                for arm in arms {
                    self.push_scope();
                    self.declare_pattern(&arm.pattern);
                    self.resolve_expr(&arm.body, reporter);
                    self.pop_scope();
                }
            }
            ExprKind::Block(stmts, tail) => {
                self.push_scope();
                for stmt in stmts {
                    self.resolve_stmt(stmt, reporter);
                }
                if let Some(tail) = tail {
                    self.resolve_expr(tail, reporter);
                }
                self.pop_scope();
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.resolve_expr(element, reporter);
                }
            }
            ExprKind::Some(inner) => self.resolve_expr(inner, reporter),
            ExprKind::InterpolatedString(parts) => {
                for part in parts {
                    if let StringPart::Expr(inner) = part {
                        self.resolve_expr(inner, reporter);
                    }
                }
            }
            ExprKind::New { class, args } => {
                for arg in args {
                    self.resolve_expr(arg, reporter);
                }
                if !self.class_is_known(*class) {
                    reporter.push(
                        Diagnostic::error(
                            ErrorKind::Name,
                            format!("undefined class '{}'", class.resolve(self.table)),
                            expr.span.clone(),
                        )
                        .with_help("check the spelling, or that the class is exported and imported"),
                    );
                }
            }
            ExprKind::IntLiteral(_)
            | ExprKind::FloatLiteral(_)
            | ExprKind::BoolLiteral(_)
            | ExprKind::CharLiteral(_)
            | ExprKind::StringLiteral(_)
            | ExprKind::This
            | ExprKind::None => {}
        }
    }

    /// A class name is known if it is declared in the current module
    /// (scope lookup covers this regardless of export) or exported from
    /// any module in the registry (an imported class).
    fn class_is_known(&self, class: StringId) -> bool {
        self.lookup(class).is_some()
            || self.registry.iter().any(|module| {
                module.program.decls.iter().any(|decl| {
                    matches!(decl, Decl::Class(c) if c.name == class && c.exported)
                })
            })
    }

    fn declare_pattern(&mut self, pattern: &Pattern) {
        match pattern {
            Pattern::Binding(name) => self.declare(*name, Binding::Var { mutable: false }),
            Pattern::Some(inner) => self.declare_pattern(inner),
            _ => {}
        }
    }

    fn resolve_path(&mut self, segments: &[StringId], span: &Span, reporter: &mut Reporter) {
        let Some(&first) = segments.first() else {
            return;
        };

        if self.lookup(first).is_some() {
            return;
        }

        // Module-qualified escape hatch: `Std.Math.sqrt(...)` and
        // project-module-qualified calls are resolved against the
        // registry/stdlib surface by the type checker, not here — a
        // multi-segment path whose head isn't a local binding is assumed
        // to name a module until type checking proves otherwise.
        if segments.len() > 1 {
            return;
        }

        let text = first.resolve(self.table);
        let names_a_module = crate::module_graph::BUILTIN_MODULE_PREFIXES
            .iter()
            .any(|prefix| prefix.split('.').next() == Some(text))
            || self
                .registry
                .iter()
                .any(|module| module.path.as_components().first() == Some(&first));
        if names_a_module {
            return;
        }

        reporter.push(
            Diagnostic::error(
                ErrorKind::Name,
                format!("undefined variable '{}'", first.resolve(self.table)),
                span.clone(),
            )
            .with_help("check the spelling, or that it is declared before use"),
        );
    }
}

fn is_lvalue(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Path(_) | ExprKind::FieldAccess(..) | ExprKind::Index(..)
    )
}
