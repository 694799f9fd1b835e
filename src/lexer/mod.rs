//! Hand-rolled lexer producing a flat token stream for one source file.
//!
//! Mirrors the character-at-a-time scanner pattern used throughout this
//! pipeline: a `Lexer` walks a `Peekable<Chars>`, tracking line/column by
//! hand, and pushes `Token`s with interned identifier/string payloads.

pub mod tokens;

pub use tokens::{Keyword, Token, TokenKind};

use crate::diagnostics::{Diagnostic, ErrorKind, Position, Reporter, Span};
use crate::interning::{ModulePath, StringTable};
use crate::token_log;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    module: ModulePath,
    chars: Peekable<Chars<'a>>,
    line: u32,
    column: u32,
    emitted_native_block: Option<Token>,
}

/// All tokens lexed from one source file, plus the module path they
/// belong to (every `Span` a later phase creates for this file reuses it).
pub struct FileTokens {
    pub module: ModulePath,
    pub tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, module: ModulePath) -> Self {
        Self {
            module,
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
            emitted_native_block: None,
        }
    }

    fn pos(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_is(&mut self, c: char) -> bool {
        self.peek() == Some(c)
    }

    fn span(&self, start: Position) -> Span {
        Span::new(self.module.clone(), start, self.pos())
    }

    pub fn tokenize(mut self, string_table: &mut StringTable, reporter: &mut Reporter) -> FileTokens {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();
            let start = self.pos();
            let Some(c) = self.advance() else {
                tokens.push(Token::new(TokenKind::Eof, self.span(start)));
                break;
            };

            let kind = match c {
                '{' => TokenKind::OpenBrace,
                '}' => TokenKind::CloseBrace,
                '(' => TokenKind::OpenParen,
                ')' => TokenKind::CloseParen,
                '[' => TokenKind::OpenBracket,
                ']' => TokenKind::CloseBracket,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                ';' => TokenKind::Semicolon,
                '?' => TokenKind::QuestionMark,
                '|' => {
                    if self.peek_is('|') {
                        self.advance();
                        TokenKind::OrOr
                    } else {
                        TokenKind::Pipe
                    }
                }
                '@' => {
                    self.lex_native_block(start, string_table, reporter);
                    if let Some(token) = self.take_native_block() {
                        tokens.push(token);
                    }
                    continue;
                }
                ':' => {
                    if self.peek_is(':') {
                        self.advance();
                        TokenKind::DoubleColon
                    } else {
                        TokenKind::Colon
                    }
                }
                '-' => {
                    if self.peek_is('>') {
                        self.advance();
                        TokenKind::Arrow
                    } else if self.peek_is('=') {
                        self.advance();
                        TokenKind::MinusAssign
                    } else {
                        TokenKind::Minus
                    }
                }
                '=' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::EqEq
                    } else if self.peek_is('>') {
                        self.advance();
                        TokenKind::FatArrow
                    } else {
                        TokenKind::Assign
                    }
                }
                '+' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::PlusAssign
                    } else {
                        TokenKind::Plus
                    }
                }
                '*' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::StarAssign
                    } else {
                        TokenKind::Star
                    }
                }
                '/' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::SlashAssign
                    } else {
                        TokenKind::Slash
                    }
                }
                '%' => TokenKind::Percent,
                '!' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::NotEq
                    } else {
                        TokenKind::Bang
                    }
                }
                '<' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::LessEq
                    } else {
                        TokenKind::Less
                    }
                }
                '>' => {
                    if self.peek_is('=') {
                        self.advance();
                        TokenKind::GreaterEq
                    } else {
                        TokenKind::Greater
                    }
                }
                '&' => {
                    if self.peek_is('&') {
                        self.advance();
                        TokenKind::AndAnd
                    } else {
                        reporter.push(Diagnostic::error(
                            ErrorKind::Lexical,
                            "unexpected character '&'",
                            self.span(start),
                        ).with_help("did you mean '&&'?"));
                        continue;
                    }
                }
                '"' => self.lex_string(start, string_table, reporter, false),
                '$' => {
                    if self.peek_is('"') {
                        self.advance();
                        self.lex_string(start, string_table, reporter, true)
                    } else {
                        reporter.push(Diagnostic::error(
                            ErrorKind::Lexical,
                            "unexpected character '$'",
                            self.span(start),
                        ).with_help("use $\"...\" to start an interpolated string"));
                        continue;
                    }
                }
                '\'' => self.lex_char(start, reporter),
                c if c.is_ascii_digit() => self.lex_number(c, start, reporter),
                c if c.is_alphabetic() || c == '_' => self.lex_identifier(c, string_table),
                other => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        format!("unexpected character '{other}'"),
                        self.span(start),
                    ));
                    continue;
                }
            };

            let token = Token::new(kind, self.span(start));
            token_log!("{:?}", token.kind);
            tokens.push(token);
        }

        FileTokens {
            module: self.module.clone(),
            tokens,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            while !matches!(self.peek(), Some('\n') | None) {
                                self.advance();
                            }
                        }
                        Some('*') => {
                            self.advance();
                            self.advance();
                            loop {
                                match self.advance() {
                                    None => break,
                                    Some('*') if self.peek_is('/') => {
                                        self.advance();
                                        break;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_identifier(&mut self, first: char, string_table: &mut StringTable) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if let Some(keyword) = Keyword::from_str(&text) {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Identifier(string_table.intern(&text))
        }
    }

    fn lex_number(&mut self, first: char, start: Position, reporter: &mut Reporter) -> TokenKind {
        let mut text = String::new();
        text.push(first);
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !is_float {
                let mut lookahead = self.chars.clone();
                lookahead.next();
                if matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                    is_float = true;
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some(c) if c.is_ascii_alphabetic() || c == '_') {
            let mut suffix = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    suffix.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            reporter.push(Diagnostic::error(
                ErrorKind::Lexical,
                format!("invalid numeric suffix '{suffix}'"),
                self.span(start),
            ));
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => TokenKind::FloatLiteral(value),
                Err(_) => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        format!("invalid float literal '{text}'"),
                        self.span(start),
                    ));
                    TokenKind::FloatLiteral(0.0)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => TokenKind::IntLiteral(value),
                Err(_) => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        format!("invalid integer literal '{text}'"),
                        self.span(start),
                    ));
                    TokenKind::IntLiteral(0)
                }
            }
        }
    }

    fn lex_string(
        &mut self,
        start: Position,
        string_table: &mut StringTable,
        reporter: &mut Reporter,
        is_interpolated: bool,
    ) -> TokenKind {
        let mut text = String::new();
        let mut has_holes = false;
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    let escape_start = self.pos();
                    if let Some(escaped) = self.advance() {
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '"' => '"',
                            '\\' => '\\',
                            other => {
                                reporter.push(Diagnostic::error(
                                    ErrorKind::Lexical,
                                    format!("unknown escape sequence '\\{other}'"),
                                    self.span(escape_start),
                                ));
                                other
                            }
                        });
                    }
                }
                Some('{') if is_interpolated => {
                    has_holes = true;
                    text.push('\u{1}');
                    self.scan_interpolation_hole(start, &mut text, reporter);
                    text.push('\u{2}');
                }
                Some(c) => text.push(c),
                None => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        "unterminated string literal",
                        self.span(start),
                    ));
                    break;
                }
            }
        }
        let id = string_table.intern(&text);
        if has_holes {
            TokenKind::InterpolatedStringLiteral(id)
        } else {
            TokenKind::StringLiteral(id)
        }
    }

    /// Copies a `{...}` hole's source verbatim into `text`, tracking
    /// brace depth (a nested `{`/`}`, e.g. from an array literal, doesn't
    /// end the hole early) and skipping over nested string literals
    /// unexamined so a `}` inside one doesn't either.
    fn scan_interpolation_hole(&mut self, start: Position, text: &mut String, reporter: &mut Reporter) {
        let mut depth = 1usize;
        loop {
            match self.advance() {
                None => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        "unterminated string interpolation hole",
                        self.span(start),
                    ));
                    break;
                }
                Some('"') => {
                    text.push('"');
                    loop {
                        match self.advance() {
                            Some('\\') => {
                                text.push('\\');
                                if let Some(c) = self.advance() {
                                    text.push(c);
                                }
                            }
                            Some('"') => {
                                text.push('"');
                                break;
                            }
                            Some(c) => text.push(c),
                            None => break,
                        }
                    }
                }
                Some('{') => {
                    depth += 1;
                    text.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    text.push('}');
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn lex_char(&mut self, start: Position, reporter: &mut Reporter) -> TokenKind {
        let c = self.advance().unwrap_or('\0');
        let c = if c == '\\' {
            match self.advance() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some(other) => other,
                None => '\0',
            }
        } else {
            c
        };
        if self.advance() != Some('\'') {
            reporter.push(Diagnostic::error(
                ErrorKind::Lexical,
                "unterminated char literal",
                self.span(start),
            ));
        }
        TokenKind::CharLiteral(c)
    }

    /// `@cpp{ ... }` native blocks: the body is copied verbatim, tracking
    /// brace depth so braces inside string/char literals or comments
    /// don't terminate the block early.
    fn lex_native_block(&mut self, start: Position, string_table: &mut StringTable, reporter: &mut Reporter) {
        // consume the tag identifier (e.g. "cpp")
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() {
                self.advance();
            } else {
                break;
            }
        }
        self.skip_whitespace_and_comments();
        if self.advance() != Some('{') {
            reporter.push(Diagnostic::error(
                ErrorKind::Lexical,
                "expected '{' after native block tag",
                self.span(start),
            ));
            return;
        }

        let mut depth = 1usize;
        let mut body = String::new();
        loop {
            match self.advance() {
                None => {
                    reporter.push(Diagnostic::error(
                        ErrorKind::Lexical,
                        "unterminated native block",
                        self.span(start),
                    ));
                    break;
                }
                Some('"') => {
                    body.push('"');
                    loop {
                        match self.advance() {
                            Some('\\') => {
                                body.push('\\');
                                if let Some(c) = self.advance() {
                                    body.push(c);
                                }
                            }
                            Some('"') => {
                                body.push('"');
                                break;
                            }
                            Some(c) => body.push(c),
                            None => break,
                        }
                    }
                }
                Some('{') => {
                    depth += 1;
                    body.push('{');
                }
                Some('}') => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    body.push('}');
                }
                Some(c) => body.push(c),
            }
        }

        let id = string_table.intern(body.trim_matches('\n'));
        let token = Token::new(TokenKind::NativeBlockBody(id), self.span(start));
        token_log!("native block, {} bytes", body.len());
        self.emitted_native_block = Some(token);
    }

    fn take_native_block(&mut self) -> Option<Token> {
        self.emitted_native_block.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<TokenKind>, StringTable) {
        let mut table = StringTable::new();
        let mut reporter = Reporter::new();
        let module = ModulePath::from_single("test", &mut table);
        let file = Lexer::new(source, module).tokenize(&mut table, &mut reporter);
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        (file.tokens.into_iter().map(|t| t.kind).collect(), table)
    }

    #[test]
    fn lexes_simple_function_signature() {
        let (tokens, table) = lex("fn add(a: Int, b: Int) -> Int {");
        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Fn));
        match &tokens[1] {
            TokenKind::Identifier(id) => assert_eq!(id.resolve(&table), "add"),
            other => panic!("expected identifier, got {other:?}"),
        }
        assert!(tokens.contains(&TokenKind::Arrow));
        assert!(tokens.contains(&TokenKind::OpenBrace));
    }

    #[test]
    fn lexes_native_block_verbatim() {
        let (tokens, table) = lex("@cpp{ int x = 1; }");
        match &tokens[0] {
            TokenKind::NativeBlockBody(id) => {
                assert_eq!(id.resolve(&table).trim(), "int x = 1;");
            }
            other => panic!("expected native block, got {other:?}"),
        }
    }

    #[test]
    fn skips_line_and_block_comments() {
        let (tokens, _) = lex("// comment\nlet /* inline */ x = 1");
        assert_eq!(tokens[0], TokenKind::Keyword(Keyword::Let));
    }

    #[test]
    fn unknown_string_escape_is_diagnosed_but_keeps_the_literal_char() {
        let mut table = StringTable::new();
        let mut reporter = Reporter::new();
        let module = ModulePath::from_single("test", &mut table);
        let file = Lexer::new(r#""a\qb""#, module).tokenize(&mut table, &mut reporter);
        assert!(reporter.has_error());
        assert!(reporter.errors()[0].message.contains("unknown escape sequence"));
        match &file.tokens[0].kind {
            TokenKind::StringLiteral(id) => assert_eq!(id.resolve(&table), "aqb"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn numeric_suffix_is_diagnosed() {
        let mut table = StringTable::new();
        let mut reporter = Reporter::new();
        let module = ModulePath::from_single("test", &mut table);
        let file = Lexer::new("let x = 42px;", module).tokenize(&mut table, &mut reporter);
        assert!(reporter.has_error());
        assert!(reporter.errors()[0].message.contains("invalid numeric suffix"));
        assert!(file.tokens.iter().any(|t| t.kind == TokenKind::IntLiteral(42)));
    }
}
