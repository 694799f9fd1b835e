use crate::interning::StringId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Fn,
    Let,
    Mut,
    If,
    Else,
    Match,
    Return,
    Using,
    Native,
    System,
    As,
    True,
    False,
    None,
    Some,
    For,
    In,
    While,
    Break,
    Continue,
    Export,
    Static,
    New,
    This,
    Int,
    Float,
    Bool,
    String,
    Void,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        Some(match s {
            "class" => Keyword::Class,
            "fn" => Keyword::Fn,
            "let" => Keyword::Let,
            "mut" => Keyword::Mut,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "match" => Keyword::Match,
            "return" => Keyword::Return,
            "using" => Keyword::Using,
            "native" => Keyword::Native,
            "system" => Keyword::System,
            "as" => Keyword::As,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "none" => Keyword::None,
            "some" => Keyword::Some,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "while" => Keyword::While,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "export" => Keyword::Export,
            "static" => Keyword::Static,
            "new" => Keyword::New,
            "this" => Keyword::This,
            "Int" => Keyword::Int,
            "Float" => Keyword::Float,
            "Bool" => Keyword::Bool,
            "String" => Keyword::String,
            "Void" => Keyword::Void,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Identifier(StringId),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(StringId),
    /// A `"...${expr}..."` interpolated string. The payload is the
    /// string's literal text with escapes already resolved, except each
    /// `${...}` hole's raw source is kept verbatim and wrapped between
    /// `\u{1}`/`\u{2}` markers for the parser to split out and re-lex as
    /// an expression.
    InterpolatedStringLiteral(StringId),
    CharLiteral(char),
    Keyword(Keyword),

    // Punctuation
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Dot,
    Colon,
    DoubleColon,
    Semicolon,
    Arrow,
    FatArrow,
    QuestionMark,
    Pipe,
    At, // `@` introduces a native-code escape block: @cpp{ ... }

    // Operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Bang,
    Less_TypeArgOpen, // disambiguated by the parser via speculative lookahead

    /// The raw, verbatim text of a native escape block's body (between the
    /// braces), preserved byte-for-byte for passthrough codegen.
    NativeBlockBody(StringId),

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: crate::diagnostics::Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: crate::diagnostics::Span) -> Self {
        Self { kind, span }
    }

    /// Whether this token can legally continue an expression onto a new
    /// physical line without an explicit continuation marker (used by the
    /// parser's newline-tolerant statement boundaries).
    pub fn continues_expression(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Dot
                | TokenKind::Comma
                | TokenKind::AndAnd
                | TokenKind::OrOr
                | TokenKind::OpenParen
                | TokenKind::OpenBracket
        )
    }
}
