//! Build orchestrator: ties every phase together into one pipeline run.
//!
//! Mirrors the "one method per phase" shape used for this pipeline's
//! frontend driver elsewhere in the codebase, generalized to this
//! language's own phases. File discovery lexes and parses each file
//! independently in parallel (`rayon`), each against its own scratch
//! string table; the module registry and every phase after it runs
//! single-threaded, in the registry's deterministic iteration order, over
//! identifiers re-interned into one shared table.

pub mod host_compiler;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Reporter, Span};
use crate::interning::{ModulePath, StringId, StringTable};
use crate::lexer::Lexer;
use crate::module_graph::ModuleRegistry;
use crate::parser::Parser;
use crate::resolve::names::NameResolver;
use crate::timer_log;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct Pipeline {
    pub string_table: StringTable,
    pub registry: ModuleRegistry,
    pub reporter: Reporter,
    /// The owning package's name, prepended to every derived module path
    /// (the final step of module-name derivation). `None` for an ad hoc
    /// single file compiled with no package manifest.
    pub package: Option<String>,
}

pub struct SourceFile {
    pub relative_path: PathBuf,
    pub source: String,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            string_table: StringTable::new(),
            registry: ModuleRegistry::new(),
            reporter: Reporter::new(),
            package: None,
        }
    }

    pub fn set_package(&mut self, package: impl Into<String>) {
        self.package = Some(package.into());
    }

    /// Recursively collects every `.mg` file under `src_root`, relative
    /// to it.
    pub fn discover_source_files(src_root: &Path) -> std::io::Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        Self::walk(src_root, src_root, &mut files)?;
        Ok(files)
    }

    fn walk(root: &Path, dir: &Path, files: &mut Vec<SourceFile>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                Self::walk(root, &path, files)?;
            } else if path.extension().is_some_and(|ext| ext == "mg") {
                let source = std::fs::read_to_string(&path)?;
                let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                files.push(SourceFile { relative_path, source });
            }
        }
        Ok(())
    }

    /// Lexes and parses every source file in parallel, each against its
    /// own scratch string table (lexing/parsing one file never touches
    /// another file's state). The module registry is then populated in a
    /// second, single-threaded pass: every identifier is re-interned into
    /// the pipeline's shared table as it's copied in, so registry
    /// insertion order depends only on `files`' order, never on which
    /// file finished lexing first, and every `StringId` reachable from
    /// the registry afterward is valid against `self.string_table`.
    pub fn build_module_graph(&mut self, files: Vec<SourceFile>) {
        let start = Instant::now();

        let parsed: Vec<(PathBuf, Program, StringTable, Reporter)> = files
            .into_par_iter()
            .map(|file| {
                let mut table = StringTable::new();
                let mut reporter = Reporter::new();
                let module = ModulePath::from_relative_file_path(&file.relative_path, self.package.as_deref(), &mut table);
                let lexer = Lexer::new(&file.source, module.clone());
                let tokens = lexer.tokenize(&mut table, &mut reporter);
                let program = Parser::new(tokens.tokens, module, &mut table).parse_program(&mut reporter);
                (file.relative_path, program, table, reporter)
            })
            .collect();

        for (relative_path, program, local_table, per_file_reporter) in parsed {
            let module = ModulePath::from_relative_file_path(&relative_path, self.package.as_deref(), &mut self.string_table);
            let remapped = remap_program(&program, &local_table, &mut self.string_table);
            for diagnostic in per_file_reporter.errors().iter().chain(per_file_reporter.warnings().iter()) {
                self.reporter.push(remap_diagnostic(diagnostic, &local_table, &mut self.string_table));
            }
            self.registry.insert(module, remapped, &mut self.reporter);
        }

        timer_log!("module graph construction", start.elapsed());
    }

    pub fn resolve_imports(&mut self) {
        crate::resolve::imports::resolve_all_imports(&self.registry, &self.string_table, &mut self.reporter);
    }

    pub fn resolve_names(&mut self) {
        for module in self.registry.iter() {
            let mut resolver = NameResolver::new(&self.registry, &self.string_table);
            resolver.resolve_module(&module.program, &mut self.reporter);
        }
    }

    pub fn check_types(&mut self) {
        for module in self.registry.iter() {
            let mut checker = crate::typeck::Checker::new(&self.registry, &self.string_table);
            checker.check_module(&module.program, &mut self.reporter);
        }
    }

    pub fn generate_cpp(&self, entry_module: &ModulePath) -> String {
        let entry_has_main = self
            .registry
            .get(entry_module)
            .map(|module| {
                module.program.decls.iter().any(|decl| {
                    matches!(decl, Decl::Function(f) if f.signature.name.resolve(&self.string_table) == "main")
                })
            })
            .unwrap_or(false);
        crate::codegen::Emitter::new(&self.string_table).emit_project(&self.registry, entry_has_main)
    }

    /// Runs every phase in order, stopping early if an earlier phase
    /// already reported an error (no phase hands broken input to the
    /// next).
    pub fn run(&mut self, src_root: &Path, entry_module: &ModulePath) -> Result<String, &Reporter> {
        let files = Self::discover_source_files(src_root).unwrap_or_default();
        self.build_module_graph(files);
        if self.reporter.has_error() {
            return Err(&self.reporter);
        }
        self.resolve_imports();
        if self.reporter.has_error() {
            return Err(&self.reporter);
        }
        self.resolve_names();
        if self.reporter.has_error() {
            return Err(&self.reporter);
        }
        self.check_types();
        if self.reporter.has_error() {
            return Err(&self.reporter);
        }
        Ok(self.generate_cpp(entry_module))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

// --- StringId re-interning -------------------------------------------
//
// Every per-file parse above runs against its own scratch `StringTable`
// for thread isolation. The functions below walk a parsed `Program` and
// rebuild it with every `StringId` re-interned against the pipeline's
// shared table, which is what makes cross-module comparisons (import
// resolution, the module registry's `FxHashMap<ModulePath, _>` key, name
// resolution's module-prefix check) correct: after this point every
// `StringId` reachable from the registry resolves against one table.

fn remap_id(id: StringId, from: &StringTable, to: &mut StringTable) -> StringId {
    to.intern(id.resolve(from))
}

fn remap_module_path(path: &ModulePath, from: &StringTable, to: &mut StringTable) -> ModulePath {
    ModulePath::from_components(path.as_components().iter().map(|&id| remap_id(id, from, to)).collect())
}

fn remap_span(span: &Span, from: &StringTable, to: &mut StringTable) -> Span {
    Span::new(remap_module_path(&span.module, from, to), span.start, span.end)
}

fn remap_diagnostic(diagnostic: &Diagnostic, from: &StringTable, to: &mut StringTable) -> Diagnostic {
    Diagnostic {
        severity: diagnostic.severity,
        kind: diagnostic.kind,
        message: diagnostic.message.clone(),
        span: remap_span(&diagnostic.span, from, to),
        help: diagnostic.help.clone(),
        code: diagnostic.code,
    }
}

fn remap_type_expr(ty: &TypeExpr, from: &StringTable, to: &mut StringTable) -> TypeExpr {
    match ty {
        TypeExpr::Int => TypeExpr::Int,
        TypeExpr::Float => TypeExpr::Float,
        TypeExpr::Bool => TypeExpr::Bool,
        TypeExpr::String => TypeExpr::String,
        TypeExpr::Void => TypeExpr::Void,
        TypeExpr::Optional(inner) => TypeExpr::Optional(Box::new(remap_type_expr(inner, from, to))),
        TypeExpr::Array(inner) => TypeExpr::Array(Box::new(remap_type_expr(inner, from, to))),
        TypeExpr::Function { params, returns } => TypeExpr::Function {
            params: params.iter().map(|p| remap_type_expr(p, from, to)).collect(),
            returns: Box::new(remap_type_expr(returns, from, to)),
        },
        TypeExpr::Named(id, args) => TypeExpr::Named(
            remap_id(*id, from, to),
            args.iter().map(|a| remap_type_expr(a, from, to)).collect(),
        ),
    }
}

fn remap_param(param: &Param, from: &StringTable, to: &mut StringTable) -> Param {
    Param {
        name: remap_id(param.name, from, to),
        ty: remap_type_expr(&param.ty, from, to),
        span: remap_span(&param.span, from, to),
    }
}

fn remap_pattern(pattern: &Pattern, from: &StringTable, to: &mut StringTable) -> Pattern {
    match pattern {
        Pattern::Wildcard => Pattern::Wildcard,
        Pattern::Binding(id) => Pattern::Binding(remap_id(*id, from, to)),
        Pattern::IntLiteral(v) => Pattern::IntLiteral(*v),
        Pattern::BoolLiteral(v) => Pattern::BoolLiteral(*v),
        Pattern::Some(inner) => Pattern::Some(Box::new(remap_pattern(inner, from, to))),
        Pattern::None => Pattern::None,
    }
}

fn remap_string_part(part: &StringPart, from: &StringTable, to: &mut StringTable) -> StringPart {
    match part {
        StringPart::Literal(id) => StringPart::Literal(remap_id(*id, from, to)),
        StringPart::Expr(inner) => StringPart::Expr(Box::new(remap_expr(inner, from, to))),
    }
}

fn remap_expr(expr: &Expr, from: &StringTable, to: &mut StringTable) -> Expr {
    let kind = match &expr.kind {
        ExprKind::IntLiteral(v) => ExprKind::IntLiteral(*v),
        ExprKind::FloatLiteral(v) => ExprKind::FloatLiteral(*v),
        ExprKind::BoolLiteral(v) => ExprKind::BoolLiteral(*v),
        ExprKind::CharLiteral(v) => ExprKind::CharLiteral(*v),
        ExprKind::StringLiteral(id) => ExprKind::StringLiteral(remap_id(*id, from, to)),
        ExprKind::InterpolatedString(parts) => {
            ExprKind::InterpolatedString(parts.iter().map(|p| remap_string_part(p, from, to)).collect())
        }
        ExprKind::Path(segments) => ExprKind::Path(segments.iter().map(|&id| remap_id(id, from, to)).collect()),
        ExprKind::ArrayLiteral(elements) => {
            ExprKind::ArrayLiteral(elements.iter().map(|e| remap_expr(e, from, to)).collect())
        }
        ExprKind::Binary(op, left, right) => ExprKind::Binary(
            op.clone(),
            Box::new(remap_expr(left, from, to)),
            Box::new(remap_expr(right, from, to)),
        ),
        ExprKind::Unary(op, operand) => ExprKind::Unary(op.clone(), Box::new(remap_expr(operand, from, to))),
        ExprKind::Call { callee, type_args, args } => ExprKind::Call {
            callee: Box::new(remap_expr(callee, from, to)),
            type_args: type_args.iter().map(|t| remap_type_expr(t, from, to)).collect(),
            args: args.iter().map(|a| remap_expr(a, from, to)).collect(),
        },
        ExprKind::FieldAccess(base, name) => {
            ExprKind::FieldAccess(Box::new(remap_expr(base, from, to)), remap_id(*name, from, to))
        }
        ExprKind::Index(base, index) => {
            ExprKind::Index(Box::new(remap_expr(base, from, to)), Box::new(remap_expr(index, from, to)))
        }
        ExprKind::Assign { target, value } => ExprKind::Assign {
            target: Box::new(remap_expr(target, from, to)),
            value: Box::new(remap_expr(value, from, to)),
        },
        ExprKind::Lambda { params, returns, body } => ExprKind::Lambda {
            params: params.iter().map(|p| remap_param(p, from, to)).collect(),
            returns: returns.as_ref().map(|r| remap_type_expr(r, from, to)),
            body: Box::new(remap_expr(body, from, to)),
        },
        ExprKind::Match { scrutinee, arms } => ExprKind::Match {
            scrutinee: Box::new(remap_expr(scrutinee, from, to)),
            arms: arms
                .iter()
                .map(|arm| MatchArm {
                    pattern: remap_pattern(&arm.pattern, from, to),
                    body: remap_expr(&arm.body, from, to),
                    span: remap_span(&arm.span, from, to),
                })
                .collect(),
        },
        ExprKind::Block(stmts, tail) => ExprKind::Block(
            stmts.iter().map(|s| remap_stmt(s, from, to)).collect(),
            tail.as_ref().map(|t| Box::new(remap_expr(t, from, to))),
        ),
        ExprKind::Some(inner) => ExprKind::Some(Box::new(remap_expr(inner, from, to))),
        ExprKind::None => ExprKind::None,
        ExprKind::This => ExprKind::This,
        ExprKind::New { class, args } => ExprKind::New {
            class: remap_id(*class, from, to),
            args: args.iter().map(|a| remap_expr(a, from, to)).collect(),
        },
    };
    Expr {
        kind,
        span: remap_span(&expr.span, from, to),
    }
}

fn remap_stmt(stmt: &Stmt, from: &StringTable, to: &mut StringTable) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Let { name, mutable, ty, value } => StmtKind::Let {
            name: remap_id(*name, from, to),
            mutable: *mutable,
            ty: ty.as_ref().map(|t| remap_type_expr(t, from, to)),
            value: remap_expr(value, from, to),
        },
        StmtKind::Expr(expr) => StmtKind::Expr(remap_expr(expr, from, to)),
        StmtKind::Return(value) => StmtKind::Return(value.as_ref().map(|v| remap_expr(v, from, to))),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition: remap_expr(condition, from, to),
            then_branch: then_branch.iter().map(|s| remap_stmt(s, from, to)).collect(),
            else_branch: else_branch
                .as_ref()
                .map(|branch| branch.iter().map(|s| remap_stmt(s, from, to)).collect()),
        },
        StmtKind::While { condition, body } => StmtKind::While {
            condition: remap_expr(condition, from, to),
            body: body.iter().map(|s| remap_stmt(s, from, to)).collect(),
        },
        StmtKind::For { binding, iterable, body } => StmtKind::For {
            binding: remap_id(*binding, from, to),
            iterable: remap_expr(iterable, from, to),
            body: body.iter().map(|s| remap_stmt(s, from, to)).collect(),
        },
        StmtKind::Break => StmtKind::Break,
        StmtKind::Continue => StmtKind::Continue,
    };
    Stmt {
        kind,
        span: remap_span(&stmt.span, from, to),
    }
}

fn remap_function_decl(function: &FunctionDecl, from: &StringTable, to: &mut StringTable) -> FunctionDecl {
    FunctionDecl {
        signature: FunctionSig {
            name: remap_id(function.signature.name, from, to),
            generics: function.signature.generics.iter().map(|&id| remap_id(id, from, to)).collect(),
            params: function.signature.params.iter().map(|p| remap_param(p, from, to)).collect(),
            returns: remap_type_expr(&function.signature.returns, from, to),
        },
        body: function.body.iter().map(|s| remap_stmt(s, from, to)).collect(),
        exported: function.exported,
        is_static: function.is_static,
        span: remap_span(&function.span, from, to),
    }
}

fn remap_decl(decl: &Decl, from: &StringTable, to: &mut StringTable) -> Decl {
    match decl {
        Decl::Function(f) => Decl::Function(remap_function_decl(f, from, to)),
        Decl::Class(c) => Decl::Class(ClassDecl {
            name: remap_id(c.name, from, to),
            generics: c.generics.iter().map(|&id| remap_id(id, from, to)).collect(),
            fields: c
                .fields
                .iter()
                .map(|field| FieldDecl {
                    name: remap_id(field.name, from, to),
                    ty: remap_type_expr(&field.ty, from, to),
                    exported: field.exported,
                    is_static: field.is_static,
                    init: field.init.as_ref().map(|e| remap_expr(e, from, to)),
                    span: remap_span(&field.span, from, to),
                })
                .collect(),
            methods: c.methods.iter().map(|m| remap_function_decl(m, from, to)).collect(),
            exported: c.exported,
            span: remap_span(&c.span, from, to),
        }),
        Decl::Import(import) => Decl::Import(ImportDecl {
            path: import.path.iter().map(|&id| remap_id(id, from, to)).collect(),
            span: remap_span(&import.span, from, to),
        }),
        Decl::NativeImport(native) => Decl::NativeImport(NativeImportDecl {
            header: remap_id(native.header, from, to),
            is_system: native.is_system,
            alias_namespace: native.alias_namespace.map(|id| remap_id(id, from, to)),
            selected_symbols: native.selected_symbols.iter().map(|&id| remap_id(id, from, to)).collect(),
            span: remap_span(&native.span, from, to),
        }),
        Decl::NativeBlock(id, span) => Decl::NativeBlock(remap_id(*id, from, to), remap_span(span, from, to)),
    }
}

fn remap_program(program: &Program, from: &StringTable, to: &mut StringTable) -> Program {
    Program {
        module: remap_module_path(&program.module, from, to),
        decls: program.decls.iter().map(|d| remap_decl(d, from, to)).collect(),
    }
}
