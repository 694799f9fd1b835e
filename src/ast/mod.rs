//! The parsed, not-yet-resolved syntax tree.
//!
//! Every node is a plain Rust `enum` matched with `match` in each later
//! pass (name resolution, type checking, codegen) rather than dispatched
//! through a trait object — there is no `Visitor` here.

use crate::diagnostics::Span;
use crate::interning::{ModulePath, StringId};

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Float,
    Bool,
    String,
    Void,
    /// A tagged optional, `T?`.
    Optional(Box<TypeExpr>),
    Array(Box<TypeExpr>),
    Function {
        params: Vec<TypeExpr>,
        returns: Box<TypeExpr>,
    },
    /// A user-defined class or a generic type parameter name, resolved
    /// against the module's declarations during name resolution.
    Named(StringId, Vec<TypeExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: StringId,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: StringId,
    pub generics: Vec<StringId>,
    pub params: Vec<Param>,
    pub returns: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// One segment of an interpolated string: either literal text or an
/// embedded expression to be stringified and concatenated.
#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Literal(StringId),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Wildcard,
    Binding(StringId),
    IntLiteral(i64),
    BoolLiteral(bool),
    /// `some(x)` / `none` for tagged optionals.
    Some(Box<Pattern>),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    CharLiteral(char),
    StringLiteral(StringId),
    InterpolatedString(Vec<StringPart>),
    /// A name reference, possibly module-qualified (`Std.Math.sqrt`).
    Path(Vec<StringId>),
    ArrayLiteral(Vec<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Call {
        callee: Box<Expr>,
        type_args: Vec<TypeExpr>,
        args: Vec<Expr>,
    },
    FieldAccess(Box<Expr>, StringId),
    Index(Box<Expr>, Box<Expr>),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// A lambda capturing every outer binding it mentions by value.
    Lambda {
        params: Vec<Param>,
        returns: Option<TypeExpr>,
        body: Box<Expr>,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Block(Vec<Stmt>, Option<Box<Expr>>),
    Some(Box<Expr>),
    None,
    /// `this`, referring to the enclosing method's receiver.
    This,
    /// `new ClassName(args...)`.
    New {
        class: StringId,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let {
        name: StringId,
        mutable: bool,
        ty: Option<TypeExpr>,
        value: Expr,
    },
    Expr(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        binding: StringId,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub signature: FunctionSig,
    pub body: Vec<Stmt>,
    pub exported: bool,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: StringId,
    pub ty: TypeExpr,
    pub exported: bool,
    pub is_static: bool,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: StringId,
    pub generics: Vec<StringId>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FunctionDecl>,
    pub exported: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: Vec<StringId>,
    pub span: Span,
}

/// A `using native ...;` declaration pulling a C++ header straight into
/// the generated translation unit, e.g. `using native system "vector";`
/// or `using native system "algorithm" as std.{sort, search};`.
/// `alias_namespace` names the C++ namespace the header's symbols live
/// in; with no `selected_symbols` it lowers to a blanket `using
/// namespace`, otherwise to one qualified `using` per symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeImportDecl {
    pub header: StringId,
    pub is_system: bool,
    pub alias_namespace: Option<StringId>,
    pub selected_symbols: Vec<StringId>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Function(FunctionDecl),
    Class(ClassDecl),
    Import(ImportDecl),
    NativeImport(NativeImportDecl),
    /// A verbatim `@cpp{ ... }` block at module scope, passed through to
    /// codegen unparsed.
    NativeBlock(StringId, Span),
}

/// One parsed source file, not yet linked into the module graph.
#[derive(Debug, Clone)]
pub struct Program {
    pub module: ModulePath,
    pub decls: Vec<Decl>,
}
