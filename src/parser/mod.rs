//! Recursive-descent parser with precedence-climbing for binary
//! operators and speculative lookahead to disambiguate a generic call
//! (`f<T,U>(...)`) from a pair of comparison expressions.
//!
//! Parse errors never abort the file: on a syntax error the parser
//! resyncs to the next `;`, `}`, or top-level keyword (panic-mode
//! recovery) so one mistake doesn't hide the rest of the file's
//! diagnostics.

use crate::ast::*;
use crate::diagnostics::{Diagnostic, ErrorKind, Reporter, Span};
use crate::interning::{ModulePath, StringTable};
use crate::lexer::{Keyword, Token, TokenKind};
use crate::ast_log;

pub struct Parser<'a> {
    tokens: Vec<Token>,
    index: usize,
    module: ModulePath,
    string_table: &'a mut StringTable,
}

type PResult<T> = Result<T, ()>;

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, module: ModulePath, string_table: &'a mut StringTable) -> Self {
        Self {
            tokens,
            index: 0,
            module,
            string_table,
        }
    }

    pub fn parse_program(mut self, reporter: &mut Reporter) -> Program {
        let mut decls = Vec::new();
        while !self.at_eof() {
            match self.parse_decl(reporter) {
                Ok(decl) => decls.push(decl),
                Err(()) => self.resync(),
            }
        }
        ast_log!("parsed {} top-level declarations", decls.len());
        Program {
            module: self.module,
            decls,
        }
    }

    // --- cursor helpers -------------------------------------------------

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.index + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn span(&self) -> Span {
        self.peek().span.clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn checkpoint(&self) -> usize {
        self.index
    }

    fn restore(&mut self, checkpoint: usize) {
        self.index = checkpoint;
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str, reporter: &mut Reporter) -> PResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            reporter.push(Diagnostic::error(
                ErrorKind::Syntactic,
                format!("expected {what}, found {:?}", self.peek().kind),
                self.span(),
            ));
            Err(())
        }
    }

    fn expect_identifier(&mut self, reporter: &mut Reporter) -> PResult<crate::interning::StringId> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(id) => {
                self.advance();
                Ok(id)
            }
            other => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected identifier, found {other:?}"),
                    self.span(),
                ));
                Err(())
            }
        }
    }

    /// Skip forward to a likely statement/declaration boundary after a
    /// parse error, so the rest of the file can still be checked.
    fn resync(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::CloseBrace => {
                    self.advance();
                    return;
                }
                TokenKind::Keyword(Keyword::Fn)
                | TokenKind::Keyword(Keyword::Class)
                | TokenKind::Keyword(Keyword::Using) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- declarations -----------------------------------------------------

    fn parse_decl(&mut self, reporter: &mut Reporter) -> PResult<Decl> {
        if matches!(self.peek().kind, TokenKind::At) {
            let span = self.span();
            self.advance();
            return Err(self.unexpected_native_at_top_level(span, reporter));
        }
        if let TokenKind::NativeBlockBody(id) = self.peek().kind {
            let span = self.span();
            self.advance();
            return Ok(Decl::NativeBlock(id, span));
        }

        let exported = self.eat(&TokenKind::Keyword(Keyword::Export));

        match self.peek().kind {
            TokenKind::Keyword(Keyword::Using)
                if matches!(self.peek_at(1).kind, TokenKind::Keyword(Keyword::Native)) =>
            {
                self.parse_native_import(reporter)
            }
            TokenKind::Keyword(Keyword::Using) => self.parse_import(reporter),
            TokenKind::Keyword(Keyword::Fn) => {
                self.parse_function(exported, false, reporter).map(Decl::Function)
            }
            TokenKind::Keyword(Keyword::Class) => {
                self.parse_class(exported, reporter).map(Decl::Class)
            }
            _ => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected a declaration, found {:?}", self.peek().kind),
                    self.span(),
                ));
                Err(())
            }
        }
    }

    fn unexpected_native_at_top_level(&mut self, span: Span, reporter: &mut Reporter) {
        reporter.push(Diagnostic::error(
            ErrorKind::Syntactic,
            "native block tag must be immediately followed by '{'",
            span,
        ));
    }

    fn parse_import(&mut self, reporter: &mut Reporter) -> PResult<Decl> {
        let span = self.span();
        self.advance(); // `using`
        let mut path = vec![self.expect_identifier(reporter)?];
        while self.eat(&TokenKind::Dot) {
            path.push(self.expect_identifier(reporter)?);
        }
        self.eat(&TokenKind::Semicolon);
        Ok(Decl::Import(ImportDecl { path, span }))
    }

    /// `using native [system] "header" [as Alias][.{sym, sym}];`
    fn parse_native_import(&mut self, reporter: &mut Reporter) -> PResult<Decl> {
        let span = self.span();
        self.advance(); // `using`
        self.advance(); // `native`

        let is_system = self.eat(&TokenKind::Keyword(Keyword::System));

        let header = match self.peek().kind.clone() {
            TokenKind::StringLiteral(id) => {
                self.advance();
                id
            }
            other => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected a header string literal, found {other:?}"),
                    self.span(),
                ));
                return Err(());
            }
        };

        let alias_namespace = if self.eat(&TokenKind::Keyword(Keyword::As)) {
            Some(self.expect_identifier(reporter)?)
        } else {
            None
        };

        let mut selected_symbols = Vec::new();
        if self.eat(&TokenKind::Dot) {
            self.expect(TokenKind::OpenBrace, "'{'", reporter)?;
            if !self.check(&TokenKind::CloseBrace) {
                loop {
                    selected_symbols.push(self.expect_identifier(reporter)?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::CloseBrace, "'}'", reporter)?;
        }

        self.eat(&TokenKind::Semicolon);
        Ok(Decl::NativeImport(NativeImportDecl {
            header,
            is_system,
            alias_namespace,
            selected_symbols,
            span,
        }))
    }

    fn parse_generics(&mut self, reporter: &mut Reporter) -> PResult<Vec<crate::interning::StringId>> {
        if !self.eat(&TokenKind::Less) {
            return Ok(Vec::new());
        }
        let mut generics = Vec::new();
        if !self.check(&TokenKind::Greater) {
            loop {
                generics.push(self.expect_identifier(reporter)?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::Greater, "'>'", reporter)?;
        Ok(generics)
    }

    fn parse_function(&mut self, exported: bool, is_static: bool, reporter: &mut Reporter) -> PResult<FunctionDecl> {
        let span = self.span();
        self.advance(); // `fn`
        let name = self.expect_identifier(reporter)?;
        let generics = self.parse_generics(reporter)?;
        self.expect(TokenKind::OpenParen, "'('", reporter)?;
        let params = self.parse_params(reporter)?;
        self.expect(TokenKind::CloseParen, "')'", reporter)?;

        let returns = if self.eat(&TokenKind::Arrow) {
            self.parse_type(reporter)?
        } else {
            TypeExpr::Void
        };

        let body = self.parse_block(reporter)?;

        Ok(FunctionDecl {
            signature: FunctionSig {
                name,
                generics,
                params,
                returns,
            },
            body,
            exported,
            is_static,
            span,
        })
    }

    fn parse_params(&mut self, reporter: &mut Reporter) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check(&TokenKind::CloseParen) {
            return Ok(params);
        }
        loop {
            let span = self.span();
            let name = self.expect_identifier(reporter)?;
            self.expect(TokenKind::Colon, "':'", reporter)?;
            let ty = self.parse_type(reporter)?;
            params.push(Param { name, ty, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_class(&mut self, exported: bool, reporter: &mut Reporter) -> PResult<ClassDecl> {
        let span = self.span();
        self.advance(); // `class`
        let name = self.expect_identifier(reporter)?;
        let generics = self.parse_generics(reporter)?;
        self.expect(TokenKind::OpenBrace, "'{'", reporter)?;

        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.at_eof() {
            let member_exported = self.eat(&TokenKind::Keyword(Keyword::Export));
            let member_static = self.eat(&TokenKind::Keyword(Keyword::Static));

            if self.check(&TokenKind::Keyword(Keyword::Fn)) {
                methods.push(self.parse_function(member_exported, member_static, reporter)?);
                continue;
            }
            let field_span = self.span();
            let field_name = match self.expect_identifier(reporter) {
                Ok(id) => id,
                Err(()) => {
                    self.resync();
                    continue;
                }
            };
            if let Err(()) = self.expect(TokenKind::Colon, "':'", reporter) {
                self.resync();
                continue;
            }
            let ty = match self.parse_type(reporter) {
                Ok(ty) => ty,
                Err(()) => {
                    self.resync();
                    continue;
                }
            };
            let init = if self.eat(&TokenKind::Assign) {
                match self.parse_expr(reporter) {
                    Ok(expr) => Some(expr),
                    Err(()) => {
                        self.resync();
                        continue;
                    }
                }
            } else {
                None
            };
            self.eat(&TokenKind::Comma);
            self.eat(&TokenKind::Semicolon);
            fields.push(FieldDecl {
                name: field_name,
                ty,
                exported: member_exported,
                is_static: member_static,
                init,
                span: field_span,
            });
        }
        self.expect(TokenKind::CloseBrace, "'}'", reporter)?;

        Ok(ClassDecl {
            name,
            generics,
            fields,
            methods,
            exported,
            span,
        })
    }

    fn parse_type(&mut self, reporter: &mut Reporter) -> PResult<TypeExpr> {
        let mut ty = match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Int) => {
                self.advance();
                TypeExpr::Int
            }
            TokenKind::Keyword(Keyword::Float) => {
                self.advance();
                TypeExpr::Float
            }
            TokenKind::Keyword(Keyword::Bool) => {
                self.advance();
                TypeExpr::Bool
            }
            TokenKind::Keyword(Keyword::String) => {
                self.advance();
                TypeExpr::String
            }
            TokenKind::Keyword(Keyword::Void) => {
                self.advance();
                TypeExpr::Void
            }
            TokenKind::OpenBracket => {
                self.advance();
                let inner = self.parse_type(reporter)?;
                self.expect(TokenKind::CloseBracket, "']'", reporter)?;
                TypeExpr::Array(Box::new(inner))
            }
            TokenKind::Identifier(id) => {
                self.advance();
                let mut args = Vec::new();
                if self.eat(&TokenKind::Less) {
                    if !self.check(&TokenKind::Greater) {
                        loop {
                            args.push(self.parse_type(reporter)?);
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::Greater, "'>'", reporter)?;
                }
                TypeExpr::Named(id, args)
            }
            other => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected a type, found {other:?}"),
                    self.span(),
                ));
                return Err(());
            }
        };

        while self.eat(&TokenKind::QuestionMark) {
            ty = TypeExpr::Optional(Box::new(ty));
        }

        Ok(ty)
    }

    // --- statements ---------------------------------------------------

    fn parse_block(&mut self, reporter: &mut Reporter) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::OpenBrace, "'{'", reporter)?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.at_eof() {
            match self.parse_stmt(reporter) {
                Ok(stmt) => stmts.push(stmt),
                Err(()) => self.resync(),
            }
        }
        self.expect(TokenKind::CloseBrace, "'}'", reporter)?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self, reporter: &mut Reporter) -> PResult<Stmt> {
        let span = self.span();
        match self.peek().kind.clone() {
            TokenKind::Keyword(Keyword::Let) => self.parse_let(reporter),
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) || self.check(&TokenKind::CloseBrace) {
                    None
                } else {
                    Some(self.parse_expr(reporter)?)
                };
                self.eat(&TokenKind::Semicolon);
                Ok(Stmt {
                    kind: StmtKind::Return(value),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if(reporter),
            TokenKind::Keyword(Keyword::While) => self.parse_while(reporter),
            TokenKind::Keyword(Keyword::For) => self.parse_for(reporter),
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                Ok(Stmt {
                    kind: StmtKind::Break,
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                self.eat(&TokenKind::Semicolon);
                Ok(Stmt {
                    kind: StmtKind::Continue,
                    span,
                })
            }
            _ => {
                let expr = self.parse_expr(reporter)?;
                let stmt = if self.eat(&TokenKind::Assign) {
                    let value = self.parse_expr(reporter)?;
                    Stmt {
                        kind: StmtKind::Expr(Expr {
                            span: span.clone(),
                            kind: ExprKind::Assign {
                                target: Box::new(expr),
                                value: Box::new(value),
                            },
                        }),
                        span,
                    }
                } else {
                    Stmt {
                        kind: StmtKind::Expr(expr),
                        span,
                    }
                };
                self.eat(&TokenKind::Semicolon);
                Ok(stmt)
            }
        }
    }

    fn parse_let(&mut self, reporter: &mut Reporter) -> PResult<Stmt> {
        let span = self.span();
        self.advance(); // `let`
        let mutable = self.eat(&TokenKind::Keyword(Keyword::Mut));
        let name = self.expect_identifier(reporter)?;
        let ty = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type(reporter)?)
        } else {
            None
        };
        self.expect(TokenKind::Assign, "'='", reporter)?;
        let value = self.parse_expr(reporter)?;
        self.eat(&TokenKind::Semicolon);
        Ok(Stmt {
            kind: StmtKind::Let {
                name,
                mutable,
                ty,
                value,
            },
            span,
        })
    }

    fn parse_if(&mut self, reporter: &mut Reporter) -> PResult<Stmt> {
        let span = self.span();
        self.advance(); // `if`
        let condition = self.parse_expr(reporter)?;
        let then_branch = self.parse_block(reporter)?;
        let else_branch = if self.eat(&TokenKind::Keyword(Keyword::Else)) {
            if self.check(&TokenKind::Keyword(Keyword::If)) {
                let nested = self.parse_if(reporter)?;
                Some(vec![nested])
            } else {
                Some(self.parse_block(reporter)?)
            }
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        })
    }

    fn parse_while(&mut self, reporter: &mut Reporter) -> PResult<Stmt> {
        let span = self.span();
        self.advance(); // `while`
        let condition = self.parse_expr(reporter)?;
        let body = self.parse_block(reporter)?;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            span,
        })
    }

    fn parse_for(&mut self, reporter: &mut Reporter) -> PResult<Stmt> {
        let span = self.span();
        self.advance(); // `for`
        let binding = self.expect_identifier(reporter)?;
        self.expect(TokenKind::Keyword(Keyword::In), "'in'", reporter)?;
        let iterable = self.parse_expr(reporter)?;
        let body = self.parse_block(reporter)?;
        Ok(Stmt {
            kind: StmtKind::For {
                binding,
                iterable,
                body,
            },
            span,
        })
    }

    // --- expressions: precedence climbing ------------------------------

    fn parse_expr(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        self.parse_or(reporter)
    }

    fn parse_or(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_and(reporter)?;
        while self.check(&TokenKind::OrOr) {
            let span = self.span();
            self.advance();
            let right = self.parse_and(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(BinOp::Or, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_equality(reporter)?;
        while self.check(&TokenKind::AndAnd) {
            let span = self.span();
            self.advance();
            let right = self.parse_equality(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(BinOp::And, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_relational(reporter)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_relational(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(op, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_additive(reporter)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                _ => break,
            };
            // A bare `<` here could also start a generic call's type-arg
            // list if the left side is a callable path immediately
            // followed by `<...>(`. `parse_postfix` already consumes
            // that case eagerly via speculative lookahead, so by the
            // time we're here a `<` is always the relational operator.
            let span = self.span();
            self.advance();
            let right = self.parse_additive(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(op, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_multiplicative(reporter)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_multiplicative(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(op, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut left = self.parse_unary(reporter)?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let right = self.parse_unary(reporter)?;
            left = Expr {
                kind: ExprKind::Binary(op, Box::new(left), Box::new(right)),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let span = self.span();
        match self.peek().kind {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary(reporter)?;
                Ok(Expr {
                    kind: ExprKind::Unary(UnaryOp::Neg, Box::new(operand)),
                    span,
                })
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_unary(reporter)?;
                Ok(Expr {
                    kind: ExprKind::Unary(UnaryOp::Not, Box::new(operand)),
                    span,
                })
            }
            _ => self.parse_postfix(reporter),
        }
    }

    fn parse_postfix(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let mut expr = self.parse_primary(reporter)?;
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    let span = self.span();
                    self.advance();
                    let name = self.expect_identifier(reporter)?;
                    expr = Expr {
                        kind: ExprKind::FieldAccess(Box::new(expr), name),
                        span,
                    };
                }
                TokenKind::OpenParen => {
                    let span = self.span();
                    self.advance();
                    let args = self.parse_args(reporter)?;
                    self.expect(TokenKind::CloseParen, "')'", reporter)?;
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            type_args: Vec::new(),
                            args,
                        },
                        span,
                    };
                }
                TokenKind::OpenBracket => {
                    let span = self.span();
                    self.advance();
                    let index = self.parse_expr(reporter)?;
                    self.expect(TokenKind::CloseBracket, "']'", reporter)?;
                    expr = Expr {
                        kind: ExprKind::Index(Box::new(expr), Box::new(index)),
                        span,
                    };
                }
                TokenKind::Less => {
                    // Speculatively try `<T, U>(` as a generic call's
                    // type-argument list; if it doesn't pan out, restore
                    // the cursor and let relational parsing handle `<`.
                    let checkpoint = self.checkpoint();
                    let span = self.span();
                    if let Some(type_args) = self.try_parse_type_arg_list(reporter) {
                        if self.check(&TokenKind::OpenParen) {
                            self.advance();
                            let args = self.parse_args(reporter)?;
                            self.expect(TokenKind::CloseParen, "')'", reporter)?;
                            expr = Expr {
                                kind: ExprKind::Call {
                                    callee: Box::new(expr),
                                    type_args,
                                    args,
                                },
                                span,
                            };
                            continue;
                        }
                    }
                    self.restore(checkpoint);
                    break;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Attempts to parse `<T, U, ...>` as a type-argument list without
    /// emitting diagnostics on failure; returns `None` (cursor untouched
    /// by the caller, which restores its own checkpoint) if it isn't one.
    fn try_parse_type_arg_list(&mut self, _reporter: &mut Reporter) -> Option<Vec<TypeExpr>> {
        let mut scratch = Reporter::new();
        if !self.eat(&TokenKind::Less) {
            return None;
        }
        let mut args = Vec::new();
        if !self.check(&TokenKind::Greater) {
            loop {
                match self.parse_type(&mut scratch) {
                    Ok(ty) => args.push(ty),
                    Err(()) => return None,
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        if !self.eat(&TokenKind::Greater) {
            return None;
        }
        if scratch.has_error() {
            return None;
        }
        Some(args)
    }

    fn parse_args(&mut self, reporter: &mut Reporter) -> PResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::CloseParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr(reporter)?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    /// Splits a lexed interpolated string's raw payload on the
    /// `\u{1}`/`\u{2}` hole markers, interning literal runs and
    /// re-lexing/parsing each hole's raw source as a standalone
    /// expression (the same trick as a native block's verbatim capture,
    /// but fed back through the lexer/parser instead of passed through
    /// untouched).
    fn parse_interpolation_parts(&mut self, raw: &str, outer_span: &Span, reporter: &mut Reporter) -> Vec<StringPart> {
        let mut parts = Vec::new();
        let mut in_hole = false;
        let mut chunk = String::new();
        for c in raw.chars() {
            match c {
                '\u{1}' => {
                    if !chunk.is_empty() {
                        parts.push(StringPart::Literal(self.string_table.intern(&chunk)));
                        chunk.clear();
                    }
                    in_hole = true;
                }
                '\u{2}' => {
                    parts.push(StringPart::Expr(Box::new(self.parse_hole_expr(&chunk, outer_span, reporter))));
                    chunk.clear();
                    in_hole = false;
                }
                other => chunk.push(other),
            }
        }
        if !in_hole && !chunk.is_empty() {
            parts.push(StringPart::Literal(self.string_table.intern(&chunk)));
        }
        parts
    }

    fn parse_hole_expr(&mut self, source: &str, outer_span: &Span, reporter: &mut Reporter) -> Expr {
        let tokens = crate::lexer::Lexer::new(source, self.module.clone())
            .tokenize(self.string_table, reporter)
            .tokens;
        let mut sub_parser = Parser::new(tokens, self.module.clone(), self.string_table);
        match sub_parser.parse_expr(reporter) {
            Ok(expr) => expr,
            Err(()) => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("invalid expression in string interpolation hole: '{source}'"),
                    outer_span.clone(),
                ));
                Expr {
                    kind: ExprKind::IntLiteral(0),
                    span: outer_span.clone(),
                }
            }
        }
    }

    fn parse_primary(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let span = self.span();
        match self.peek().kind.clone() {
            TokenKind::IntLiteral(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::IntLiteral(value),
                    span,
                })
            }
            TokenKind::FloatLiteral(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::FloatLiteral(value),
                    span,
                })
            }
            TokenKind::CharLiteral(value) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::CharLiteral(value),
                    span,
                })
            }
            TokenKind::StringLiteral(id) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::StringLiteral(id),
                    span,
                })
            }
            TokenKind::InterpolatedStringLiteral(id) => {
                self.advance();
                let raw = id.resolve(self.string_table).to_string();
                let parts = self.parse_interpolation_parts(&raw, &span, reporter);
                Ok(Expr {
                    kind: ExprKind::InterpolatedString(parts),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::BoolLiteral(true),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::BoolLiteral(false),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::None) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::None,
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Some) => {
                self.advance();
                self.expect(TokenKind::OpenParen, "'('", reporter)?;
                let inner = self.parse_expr(reporter)?;
                self.expect(TokenKind::CloseParen, "')'", reporter)?;
                Ok(Expr {
                    kind: ExprKind::Some(Box::new(inner)),
                    span,
                })
            }
            TokenKind::Keyword(Keyword::Match) => self.parse_match(reporter),
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                Ok(Expr {
                    kind: ExprKind::This,
                    span,
                })
            }
            TokenKind::Keyword(Keyword::New) => {
                self.advance();
                let class = self.expect_identifier(reporter)?;
                self.expect(TokenKind::OpenParen, "'('", reporter)?;
                let mut args = Vec::new();
                if !self.check(&TokenKind::CloseParen) {
                    loop {
                        args.push(self.parse_expr(reporter)?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::CloseParen, "')'", reporter)?;
                Ok(Expr {
                    kind: ExprKind::New { class, args },
                    span,
                })
            }
            TokenKind::OpenBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::CloseBracket) {
                    loop {
                        elements.push(self.parse_expr(reporter)?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::CloseBracket, "']'", reporter)?;
                Ok(Expr {
                    kind: ExprKind::ArrayLiteral(elements),
                    span,
                })
            }
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.parse_expr(reporter)?;
                self.expect(TokenKind::CloseParen, "')'", reporter)?;
                Ok(inner)
            }
            TokenKind::Identifier(_) => self.parse_path_expr(reporter),
            other => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected an expression, found {other:?}"),
                    span,
                ));
                Err(())
            }
        }
    }

    fn parse_path_expr(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let span = self.span();
        let mut path = vec![self.expect_identifier(reporter)?];
        while matches!(self.peek().kind, TokenKind::Dot)
            && matches!(self.peek_at(1).kind, TokenKind::Identifier(_))
            && !matches!(self.peek_at(2).kind, TokenKind::OpenParen)
        {
            self.advance();
            path.push(self.expect_identifier(reporter)?);
        }
        Ok(Expr {
            kind: ExprKind::Path(path),
            span,
        })
    }

    fn parse_match(&mut self, reporter: &mut Reporter) -> PResult<Expr> {
        let span = self.span();
        self.advance(); // `match`
        let scrutinee = self.parse_expr(reporter)?;
        self.expect(TokenKind::OpenBrace, "'{'", reporter)?;
        let mut arms = Vec::new();
        while !self.check(&TokenKind::CloseBrace) && !self.at_eof() {
            let arm_span = self.span();
            let pattern = self.parse_pattern(reporter)?;
            self.expect(TokenKind::FatArrow, "'=>'", reporter)?;
            let body = self.parse_expr(reporter)?;
            self.eat(&TokenKind::Comma);
            arms.push(MatchArm {
                pattern,
                body,
                span: arm_span,
            });
        }
        self.expect(TokenKind::CloseBrace, "'}'", reporter)?;
        Ok(Expr {
            kind: ExprKind::Match {
                scrutinee: Box::new(scrutinee),
                arms,
            },
            span,
        })
    }

    fn parse_pattern(&mut self, reporter: &mut Reporter) -> PResult<Pattern> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(id) => {
                let text = id.resolve(self.string_table);
                if text == "_" {
                    self.advance();
                    Ok(Pattern::Wildcard)
                } else {
                    self.advance();
                    Ok(Pattern::Binding(id))
                }
            }
            TokenKind::IntLiteral(value) => {
                self.advance();
                Ok(Pattern::IntLiteral(value))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Pattern::BoolLiteral(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Pattern::BoolLiteral(false))
            }
            TokenKind::Keyword(Keyword::None) => {
                self.advance();
                Ok(Pattern::None)
            }
            TokenKind::Keyword(Keyword::Some) => {
                self.advance();
                self.expect(TokenKind::OpenParen, "'('", reporter)?;
                let inner = self.parse_pattern(reporter)?;
                self.expect(TokenKind::CloseParen, "')'", reporter)?;
                Ok(Pattern::Some(Box::new(inner)))
            }
            other => {
                reporter.push(Diagnostic::error(
                    ErrorKind::Syntactic,
                    format!("expected a pattern, found {other:?}"),
                    self.span(),
                ));
                Err(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Program, Reporter) {
        let mut table = StringTable::new();
        let mut reporter = Reporter::new();
        let module = ModulePath::from_single("test", &mut table);
        let file = Lexer::new(source, module.clone()).tokenize(&mut table, &mut reporter);
        let program = Parser::new(file.tokens, module, &mut table).parse_program(&mut reporter);
        (program, reporter)
    }

    #[test]
    fn parses_factorial_function() {
        let (program, reporter) = parse(
            "fn factorial(n: Int) -> Int {
                if n <= 1 {
                    return 1;
                }
                return n * factorial(n - 1);
            }",
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        assert_eq!(program.decls.len(), 1);
        assert!(matches!(program.decls[0], Decl::Function(_)));
    }

    #[test]
    fn parses_generic_call_vs_comparison() {
        let (program, reporter) = parse(
            "fn main() -> Int {
                let a = identity<Int>(5);
                let b = (x < y) && (y > z);
                return 0;
            }",
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.body.len(), 3);
    }

    #[test]
    fn reports_assignment_to_non_lvalue() {
        // Parsing alone does not reject this (name resolution does, see
        // `resolve::names`); this test only checks the parse succeeds and
        // produces the shape the checker relies on.
        let (program, reporter) = parse("fn main() -> Int { 1 + 2 = 3; return 0; }");
        assert!(!reporter.has_error());
        assert_eq!(program.decls.len(), 1);
    }

    #[test]
    fn parses_interpolated_string_into_literal_and_expr_parts() {
        let (program, reporter) = parse(
            r#"fn main() -> Void {
                let name = "world";
                Std.IO.print($"hello, {name}!");
            }"#,
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        let StmtKind::Expr(call) = &f.body[1].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { args, .. } = &call.kind else {
            panic!("expected call expression");
        };
        let ExprKind::InterpolatedString(parts) = &args[0].kind else {
            panic!("expected interpolated string argument, got {:?}", args[0].kind);
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(parts[0], StringPart::Literal(_)));
        assert!(matches!(parts[1], StringPart::Expr(_)));
        assert!(matches!(parts[2], StringPart::Literal(_)));
    }

    #[test]
    fn interpolation_hole_with_nested_braces_and_string_does_not_end_early() {
        let (program, reporter) = parse(
            r#"fn main() -> Void {
                Std.IO.print($"count: {length([1, 2, 3])}");
            }"#,
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.body.len(), 1);
    }

    #[test]
    fn parses_class_with_static_and_exported_members_and_field_init() {
        let (program, reporter) = parse(
            "class Counter {
                export count: Int = 0,
                static limit: Int = 100,
                export fn increment() -> Void {
                    this.count = this.count + 1;
                }
                static fn max() -> Int {
                    return limit;
                }
            }",
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Class(class) = &program.decls[0] else {
            panic!("expected class");
        };
        assert_eq!(class.fields.len(), 2);
        assert!(class.fields[0].exported);
        assert!(!class.fields[0].is_static);
        assert!(class.fields[0].init.is_some());
        assert!(!class.fields[1].exported);
        assert!(class.fields[1].is_static);

        assert_eq!(class.methods.len(), 2);
        assert!(class.methods[0].exported);
        assert!(!class.methods[0].is_static);
        assert!(!class.methods[1].exported);
        assert!(class.methods[1].is_static);
    }

    #[test]
    fn parses_new_expression_with_constructor_arguments() {
        let (program, reporter) = parse(
            "fn main() -> Int {
                let p = new Point(1, 2);
                return 0;
            }",
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Function(f) = &program.decls[0] else {
            panic!("expected function");
        };
        let StmtKind::Let { value, .. } = &f.body[0].kind else {
            panic!("expected let statement");
        };
        let ExprKind::New { args, .. } = &value.kind else {
            panic!("expected new expression, got {:?}", value.kind);
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn parses_this_expression_inside_method_body() {
        let (program, reporter) = parse(
            "class Box {
                value: Int,
                fn get() -> Int {
                    return this.value;
                }
            }",
        );
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::Class(class) = &program.decls[0] else {
            panic!("expected class");
        };
        let StmtKind::Return(Some(ret)) = &class.methods[0].body[0].kind else {
            panic!("expected return statement");
        };
        let ExprKind::FieldAccess(base, _) = &ret.kind else {
            panic!("expected field access, got {:?}", ret.kind);
        };
        assert!(matches!(base.kind, ExprKind::This));
    }

    #[test]
    fn parses_system_native_import_with_alias_and_selected_symbols() {
        let (program, reporter) = parse(r#"using native system "algorithm" as std.{sort, find};"#);
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::NativeImport(native) = &program.decls[0] else {
            panic!("expected native import, got {:?}", program.decls[0]);
        };
        assert!(native.is_system);
        assert!(native.alias_namespace.is_some());
        assert_eq!(native.selected_symbols.len(), 2);
    }

    #[test]
    fn parses_local_native_import_with_no_alias() {
        let (program, reporter) = parse(r#"using native "myheader.h";"#);
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        let Decl::NativeImport(native) = &program.decls[0] else {
            panic!("expected native import, got {:?}", program.decls[0]);
        };
        assert!(!native.is_system);
        assert!(native.alias_namespace.is_none());
        assert!(native.selected_symbols.is_empty());
    }

    #[test]
    fn plain_using_import_is_still_parsed_as_module_import() {
        let (program, reporter) = parse("using math.util;");
        assert!(!reporter.has_error(), "{:?}", reporter.errors());
        assert!(matches!(program.decls[0], Decl::Import(_)));
    }
}
