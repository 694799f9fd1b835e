//! Lowers a resolved, checked module to a single C++17 translation unit.
//!
//! `Emitter` is a structured string-builder — an `out: String`
//! accumulator plus an `indent: usize` counter — the same shape used for
//! structured text emission elsewhere in this pipeline, generalized here
//! from a different target language to C++.

pub mod prelude;

use crate::ast::*;
use crate::codegen_log;
use crate::interning::StringTable;
use crate::module_graph::ModuleRegistry;
use std::fmt::Write as _;

pub struct Emitter<'a> {
    table: &'a StringTable,
    out: String,
    indent: usize,
}

impl<'a> Emitter<'a> {
    pub fn new(table: &'a StringTable) -> Self {
        Self {
            table,
            out: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emits every module in the registry's deterministic iteration
    /// order into one translation unit, then emits a `main()` that calls
    /// the entry module's `main` function if one is declared.
    pub fn emit_project(mut self, registry: &ModuleRegistry, entry_has_main: bool) -> String {
        self.out.push_str(prelude::PRELUDE);
        self.out.push('\n');

        for module in registry.iter() {
            for decl in &module.program.decls {
                self.emit_decl(decl);
            }
        }

        if entry_has_main {
            self.out.push_str("\nint main() {\n    glint_main();\n    return 0;\n}\n");
        }

        codegen_log!("emitted {} bytes", self.out.len());
        self.out
    }

    fn emit_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Function(f) => self.emit_function(f, ""),
            Decl::Class(c) => self.emit_class(c),
            Decl::Import(_) => {}
            Decl::NativeImport(native) => self.emit_native_import(native),
            Decl::NativeBlock(id, _) => {
                self.out.push_str(id.resolve(self.table));
                self.out.push('\n');
            }
        }
    }

    /// Lowers to `#include` plus, when the declaration named a C++
    /// namespace, either a blanket `using namespace` or one `using` per
    /// selected symbol qualified into that namespace.
    fn emit_native_import(&mut self, native: &NativeImportDecl) {
        let header = native.header.resolve(self.table);
        if native.is_system {
            let _ = writeln!(self.out, "#include <{header}>");
        } else {
            let _ = writeln!(self.out, "#include \"{header}\"");
        }
        match native.alias_namespace {
            Some(namespace) if native.selected_symbols.is_empty() => {
                let _ = writeln!(self.out, "using namespace {};", namespace.resolve(self.table));
            }
            Some(namespace) => {
                let namespace = namespace.resolve(self.table);
                for symbol in &native.selected_symbols {
                    let _ = writeln!(self.out, "using {namespace}::{};", symbol.resolve(self.table));
                }
            }
            None => {}
        }
    }

    fn emit_class(&mut self, class: &ClassDecl) {
        let name = class.name.resolve(self.table);
        let _ = writeln!(self.out, "struct {name} {{");
        self.indent += 1;

        // Visibility follows each member's own modifier, not the class's;
        // a label is only (re-)emitted when it changes from the previous
        // member, matching how a human writer would group `public`/
        // `private` runs instead of repeating a label every line.
        let mut last_visibility: Option<bool> = None;
        let mut set_visibility = |emitter: &mut Self, public: bool| {
            if last_visibility != Some(public) {
                emitter.line(if public { "public:" } else { "private:" });
                last_visibility = Some(public);
            }
        };

        let instance_fields: Vec<&FieldDecl> = class.fields.iter().filter(|f| !f.is_static).collect();

        for field in &class.fields {
            set_visibility(self, field.exported);
            let ty = cpp_type(&field.ty, self.table);
            let field_name = field.name.resolve(self.table);
            let static_prefix = if field.is_static { "inline static " } else { "" };
            match &field.init {
                Some(init) => {
                    let init_text = self.emit_expr(init);
                    self.line(&format!("{static_prefix}{ty} {field_name} = {init_text};"));
                }
                None => self.line(&format!("{static_prefix}{ty} {field_name};")),
            }
        }

        if !instance_fields.is_empty() {
            set_visibility(self, true);
            let ctor_params: Vec<String> = instance_fields
                .iter()
                .map(|f| format!("{} {}", cpp_type(&f.ty, self.table), f.name.resolve(self.table)))
                .collect();
            let init_list: Vec<String> = instance_fields
                .iter()
                .map(|f| {
                    let field_name = f.name.resolve(self.table);
                    format!("{field_name}({field_name})")
                })
                .collect();
            self.line(&format!("{name}({}) : {} {{}}", ctor_params.join(", "), init_list.join(", ")));
        } else {
            set_visibility(self, true);
            self.line(&format!("{name}() = default;"));
        }

        for method in &class.methods {
            set_visibility(self, method.exported);
            let prefix = if method.is_static { "static " } else { "" };
            self.emit_function(method, prefix);
        }
        self.indent -= 1;
        self.line("};");
        self.out.push('\n');
    }

    fn emit_function(&mut self, function: &FunctionDecl, prefix: &str) {
        let name = mangled_function_name(function.signature.name, self.table);
        let returns = cpp_type(&function.signature.returns, self.table);
        let params: Vec<String> = function
            .signature
            .params
            .iter()
            .map(|p| format!("{} {}", cpp_type(&p.ty, self.table), p.name.resolve(self.table)))
            .collect();
        let template_prefix = if function.signature.generics.is_empty() {
            String::new()
        } else {
            let names: Vec<&str> = function
                .signature
                .generics
                .iter()
                .map(|id| id.resolve(self.table))
                .collect();
            format!(
                "template <{}>\n",
                names.iter().map(|n| format!("typename {n}")).collect::<Vec<_>>().join(", ")
            )
        };
        self.out.push_str(&template_prefix);
        let _ = writeln!(self.out, "{prefix}{returns} {name}({}) {{", params.join(", "));
        self.indent += 1;
        for stmt in &function.body {
            self.emit_stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
        self.out.push('\n');
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Let { name, ty, value, .. } => {
                let ty_text = match ty {
                    Some(ty) => cpp_type(ty, self.table),
                    None => "auto".to_string(),
                };
                let value_text = self.emit_expr(value);
                self.line(&format!("{ty_text} {} = {value_text};", name.resolve(self.table)));
            }
            StmtKind::Expr(expr) => {
                let text = self.emit_expr(expr);
                self.line(&format!("{text};"));
            }
            StmtKind::Return(value) => match value {
                Some(value) => {
                    let text = self.emit_expr(value);
                    self.line(&format!("return {text};"));
                }
                None => self.line("return;"),
            },
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond_text = self.emit_expr(condition);
                self.line(&format!("if ({cond_text}) {{"));
                self.indent += 1;
                for stmt in then_branch {
                    self.emit_stmt(stmt);
                }
                self.indent -= 1;
                if let Some(else_branch) = else_branch {
                    self.line("} else {");
                    self.indent += 1;
                    for stmt in else_branch {
                        self.emit_stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.line("}");
            }
            StmtKind::While { condition, body } => {
                let cond_text = self.emit_expr(condition);
                self.line(&format!("while ({cond_text}) {{"));
                self.indent += 1;
                for stmt in body {
                    self.emit_stmt(stmt);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                let iterable_text = self.emit_expr(iterable);
                self.line(&format!(
                    "for (auto& {} : {iterable_text}) {{",
                    binding.resolve(self.table)
                ));
                self.indent += 1;
                for stmt in body {
                    self.emit_stmt(stmt);
                }
                self.indent -= 1;
                self.line("}");
            }
            StmtKind::Break => self.line("break;"),
            StmtKind::Continue => self.line("continue;"),
        }
    }

    fn emit_expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::IntLiteral(value) => value.to_string(),
            ExprKind::FloatLiteral(value) => format!("{value}"),
            ExprKind::BoolLiteral(value) => value.to_string(),
            ExprKind::CharLiteral(value) => format!("'{value}'"),
            ExprKind::StringLiteral(id) => format!("std::string({:?})", id.resolve(self.table)),
            ExprKind::InterpolatedString(parts) => {
                let mut pieces = Vec::new();
                for part in parts {
                    match part {
                        StringPart::Literal(id) => {
                            pieces.push(format!("std::string({:?})", id.resolve(self.table)));
                        }
                        StringPart::Expr(inner) => {
                            let text = self.emit_expr(inner);
                            pieces.push(format!("glint_to_string({text})"));
                        }
                    }
                }
                if pieces.is_empty() {
                    "std::string(\"\")".to_string()
                } else {
                    pieces.join(" + ")
                }
            }
            ExprKind::Path(segments) => self.emit_path(segments),
            ExprKind::ArrayLiteral(elements) => {
                let items: Vec<String> = elements.iter().map(|e| self.emit_expr(e)).collect();
                format!("std::vector{{{}}}", items.join(", "))
            }
            ExprKind::Binary(op, left, right) => {
                let left_text = self.emit_expr(left);
                let right_text = self.emit_expr(right);
                format!("({left_text} {} {right_text})", binop_text(op))
            }
            ExprKind::Unary(op, operand) => {
                let text = self.emit_expr(operand);
                match op {
                    UnaryOp::Neg => format!("(-{text})"),
                    UnaryOp::Not => format!("(!{text})"),
                }
            }
            ExprKind::FieldAccess(base, name) => {
                let base_text = self.emit_expr(base);
                format!("{base_text}.{}", name.resolve(self.table))
            }
            ExprKind::Index(base, index) => {
                let base_text = self.emit_expr(base);
                let index_text = self.emit_expr(index);
                format!("{base_text}[{index_text}]")
            }
            ExprKind::Call { callee, type_args, args } => {
                let callee_text = self.emit_call_callee(callee);
                let type_args_text = if type_args.is_empty() {
                    String::new()
                } else {
                    format!(
                        "<{}>",
                        type_args
                            .iter()
                            .map(|t| cpp_type(t, self.table))
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                };
                let args_text: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
                format!("{callee_text}{type_args_text}({})", args_text.join(", "))
            }
            ExprKind::Assign { target, value } => {
                let target_text = self.emit_expr(target);
                let value_text = self.emit_expr(value);
                format!("({target_text} = {value_text})")
            }
            ExprKind::Lambda { params, body, .. } => {
                // Lambdas conservatively capture every outer binding they
                // mention by value: `[=]`.
                let params_text: Vec<String> = params
                    .iter()
                    .map(|p| format!("{} {}", cpp_type(&p.ty, self.table), p.name.resolve(self.table)))
                    .collect();
                let body_text = self.emit_expr(body);
                format!("[=]({}) {{ return {body_text}; }}", params_text.join(", "))
            }
            ExprKind::Match { scrutinee, arms } => self.emit_match(scrutinee, arms),
            ExprKind::Block(stmts, tail) => {
                let mut body = String::new();
                body.push_str("[&]() {\n");
                self.indent += 1;
                for stmt in stmts {
                    self.emit_stmt_into(stmt, &mut body);
                }
                if let Some(tail) = tail {
                    let text = self.emit_expr(tail);
                    self.write_indent_into(&mut body);
                    body.push_str(&format!("return {text};\n"));
                }
                self.indent -= 1;
                self.write_indent_into(&mut body);
                body.push_str("}()");
                body
            }
            ExprKind::Some(inner) => {
                let text = self.emit_expr(inner);
                format!("std::make_optional({text})")
            }
            ExprKind::None => "std::nullopt".to_string(),
            ExprKind::This => "(*this)".to_string(),
            ExprKind::New { class, args } => {
                let name = class.resolve(self.table);
                let args_text: Vec<String> = args.iter().map(|a| self.emit_expr(a)).collect();
                format!("{name}({})", args_text.join(", "))
            }
        }
    }

    fn emit_stmt_into(&mut self, stmt: &Stmt, buf: &mut String) {
        let marker = self.out.len();
        self.emit_stmt(stmt);
        buf.push_str(&self.out[marker..]);
        self.out.truncate(marker);
    }

    fn write_indent_into(&self, buf: &mut String) {
        for _ in 0..self.indent {
            buf.push_str("    ");
        }
    }

    fn emit_call_callee(&mut self, callee: &Expr) -> String {
        // A module-qualified call (`Std.Math.sqrt`, or `other.helper`)
        // emits as a plain `::`-joined C++ name rather than a runtime
        // field access, matching the fixed `Std::` namespace layout in
        // the prelude and the flattened free-function layout this
        // backend gives every other module's exported functions.
        if let Some(path) = flatten_field_chain(callee) {
            return path
                .iter()
                .map(|id| id.resolve(self.table))
                .collect::<Vec<_>>()
                .join("::");
        }
        self.emit_expr(callee)
    }

    fn emit_path(&mut self, segments: &[crate::interning::StringId]) -> String {
        if segments.len() == 1 {
            segments[0].resolve(self.table).to_string()
        } else {
            segments
                .iter()
                .map(|id| id.resolve(self.table))
                .collect::<Vec<_>>()
                .join("::")
        }
    }

    fn emit_match(&mut self, scrutinee: &Expr, arms: &[MatchArm]) -> String {
        let scrutinee_text = self.emit_expr(scrutinee);
        let mut body = String::new();
        body.push_str("[&]() -> auto {\n");
        self.indent += 1;
        let tmp = "glint_match_value";
        self.write_indent_into(&mut body);
        body.push_str(&format!("auto {tmp} = {scrutinee_text};\n"));
        for (idx, arm) in arms.iter().enumerate() {
            self.write_indent_into(&mut body);
            let keyword = if idx == 0 { "if" } else { "else if" };
            body.push_str(&format!("{keyword} ({}) {{\n", pattern_condition(&arm.pattern, tmp, self.table)));
            self.indent += 1;
            for binding in pattern_bindings(&arm.pattern, tmp, self.table) {
                self.write_indent_into(&mut body);
                body.push_str(&binding);
                body.push('\n');
            }
            self.write_indent_into(&mut body);
            let arm_text = self.emit_expr(&arm.body);
            body.push_str(&format!("return {arm_text};\n"));
            self.indent -= 1;
            self.write_indent_into(&mut body);
            body.push_str("}\n");
        }
        self.write_indent_into(&mut body);
        body.push_str("throw std::runtime_error(\"non-exhaustive match\");\n");
        self.indent -= 1;
        self.write_indent_into(&mut body);
        body.push_str("}()");
        body
    }
}

fn pattern_condition(pattern: &Pattern, scrutinee: &str, _table: &StringTable) -> String {
    match pattern {
        Pattern::Wildcard => "true".to_string(),
        Pattern::Binding(_) => "true".to_string(),
        Pattern::IntLiteral(value) => format!("{scrutinee} == {value}"),
        Pattern::BoolLiteral(value) => format!("{scrutinee} == {value}"),
        Pattern::Some(_) => format!("{scrutinee}.has_value()"),
        Pattern::None => format!("!{scrutinee}.has_value()"),
    }
}

/// `let`-binding statements a pattern needs before its arm body runs:
/// a bare binding captures the whole scrutinee, `Some(inner)` unwraps one
/// `.value()` layer first and recurses (so `Some(Some(v))` would chain
/// two `.value()` calls, though the language doesn't nest optionals today).
fn pattern_bindings(pattern: &Pattern, scrutinee: &str, table: &StringTable) -> Vec<String> {
    match pattern {
        Pattern::Binding(name) => vec![format!("auto {} = {scrutinee};", name.resolve(table))],
        Pattern::Some(inner) => pattern_bindings(inner, &format!("{scrutinee}.value()"), table),
        Pattern::Wildcard | Pattern::IntLiteral(_) | Pattern::BoolLiteral(_) | Pattern::None => Vec::new(),
    }
}

fn flatten_field_chain(expr: &Expr) -> Option<Vec<crate::interning::StringId>> {
    match &expr.kind {
        ExprKind::Path(segments) if segments.len() > 1 => Some(segments.clone()),
        ExprKind::FieldAccess(base, name) => {
            let mut chain = flatten_field_chain(base).or_else(|| match &base.kind {
                ExprKind::Path(segments) => Some(segments.clone()),
                _ => None,
            })?;
            chain.push(*name);
            Some(chain)
        }
        _ => None,
    }
}

fn binop_text(op: &BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::NotEq => "!=",
        BinOp::Less => "<",
        BinOp::LessEq => "<=",
        BinOp::Greater => ">",
        BinOp::GreaterEq => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
    }
}

fn cpp_type(ty: &TypeExpr, table: &StringTable) -> String {
    match ty {
        TypeExpr::Int => "int64_t".to_string(),
        TypeExpr::Float => "double".to_string(),
        TypeExpr::Bool => "bool".to_string(),
        TypeExpr::String => "std::string".to_string(),
        TypeExpr::Void => "void".to_string(),
        TypeExpr::Optional(inner) => format!("std::optional<{}>", cpp_type(inner, table)),
        TypeExpr::Array(inner) => format!("std::vector<{}>", cpp_type(inner, table)),
        TypeExpr::Function { params, returns } => format!(
            "std::function<{}({})>",
            cpp_type(returns, table),
            params.iter().map(|p| cpp_type(p, table)).collect::<Vec<_>>().join(", ")
        ),
        TypeExpr::Named(id, args) => {
            if args.is_empty() {
                id.resolve(table).to_string()
            } else {
                format!(
                    "{}<{}>",
                    id.resolve(table),
                    args.iter().map(|a| cpp_type(a, table)).collect::<Vec<_>>().join(", ")
                )
            }
        }
    }
}

fn mangled_function_name(name: crate::interning::StringId, table: &StringTable) -> String {
    let text = name.resolve(table);
    if text == "main" {
        "glint_main".to_string()
    } else {
        text.to_string()
    }
}
