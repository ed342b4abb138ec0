//! Recursive-descent parser
//!
//! Syntax errors go through a debounced [`Reporter`]: after an error the
//! parser skips to the next statement boundary and re-arms the reporter, so
//! one bad statement yields one diagnostic and later statements still parse.

use crate::ast::{
    AssignTarget, BinOp, Block, CastTarget, Expr, FunctionDecl, LineIndex, Program, Span, Spanned,
    Stmt, UnOp,
};
use crate::error::{CompileError, Reporter, Result};
use crate::lexer::Token;
use std::rc::Rc;


/// Parse tokens into AST
pub fn parse(_filename: &str, source: &str, tokens: Vec<(Token, Span)>) -> Result<Program> {
    let eof = LineIndex::new(source).span(source, source.len()..source.len());
    let mut parser = Parser::new(tokens, eof);
    let program = parser.program();
    tracing::debug!(
        statements = program.statements.len(),
        errors = parser.reporter.diagnostics().len(),
        "parsed"
    );
    if parser.reporter.has_errors() {
        Err(CompileError::Syntax {
            diagnostics: parser.reporter.into_diagnostics(),
        })
    } else {
        Ok(program)
    }
}

/// A syntax error that has already been handed to the reporter
struct SyntaxError;

type PResult<T> = std::result::Result<T, SyntaxError>;

type Level = fn(&mut Parser) -> PResult<Spanned<Expr>>;

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
    reporter: Reporter,
}

impl Parser {
    fn new(tokens: Vec<(Token, Span)>, eof: Span) -> Self {
        Parser {
            tokens,
            pos: 0,
            eof,
            reporter: Reporter::new(),
        }
    }

    // ---- token cursor ----

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(token, _)| token)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |(_, span)| *span)
    }

    fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some((_, span)) => *span,
            None => self.eof,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> Option<Span> {
        if self.check(token) {
            self.advance().map(|(_, span)| span)
        } else {
            None
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> PResult<Span> {
        match self.eat(token) {
            Some(span) => Ok(span),
            None => Err(self.error(what)),
        }
    }

    /// Report `Expected <what>, found <current token>` (unforced).
    fn error(&mut self, what: &str) -> SyntaxError {
        let found = match self.peek() {
            Some(token) => token.to_string(),
            None => "end of input".to_string(),
        };
        let span = self.peek_span();
        self.reporter
            .report(format!("Expected {what}, found {found}"), span, false);
        SyntaxError
    }

    // ---- recovery ----

    fn statement_recovering(&mut self) -> Option<Spanned<Stmt>> {
        let start = self.pos;
        match self.statement() {
            Ok(stmt) => Some(stmt),
            Err(SyntaxError) => {
                if self.pos == start {
                    self.advance();
                }
                self.synchronize();
                self.reporter.handled();
                None
            }
        }
    }

    /// Skip to the next statement boundary at nesting depth zero: a statement
    /// keyword, a closing brace, the first token of a later line, or just past
    /// a semicolon.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.peek().cloned() {
            if depth == 0 {
                if token.starts_statement() || token == Token::RBrace {
                    return;
                }
                if token == Token::Semi {
                    self.advance();
                    return;
                }
                if self.pos > 0 && self.peek_span().line > self.previous_span().line {
                    return;
                }
            }
            match token {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_semicolons(&mut self) {
        while self.eat(&Token::Semi).is_some() {}
    }

    // ---- statements ----

    fn program(&mut self) -> Program {
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at_end() {
                break;
            }
            if let Some(stmt) = self.statement_recovering() {
                statements.push(stmt);
            }
        }
        Program { statements }
    }

    fn block(&mut self) -> PResult<Block> {
        let open = self.expect(&Token::LBrace, "'{'")?;
        let mut statements = Vec::new();
        loop {
            self.skip_semicolons();
            if self.at_end() || self.check(&Token::RBrace) {
                break;
            }
            if let Some(stmt) = self.statement_recovering() {
                statements.push(stmt);
            }
        }
        let close = self.expect(&Token::RBrace, "'}'")?;
        Ok(Block {
            statements,
            span: open.merge(close),
        })
    }

    fn statement(&mut self) -> PResult<Spanned<Stmt>> {
        let start = self.peek_span();
        let stmt = match self.peek() {
            Some(Token::Function) => Stmt::Function(Rc::new(self.function()?)),
            Some(Token::If) => self.if_statement()?,
            Some(Token::While) => {
                self.advance();
                let cond = self.expression()?;
                let body = self.block()?;
                Stmt::While { cond, body }
            }
            Some(Token::For) => {
                self.advance();
                let var = self.identifier("loop variable")?;
                self.expect(&Token::In, "'in'")?;
                let iterable = self.expression()?;
                let body = self.block()?;
                Stmt::For {
                    var,
                    iterable,
                    body,
                }
            }
            Some(Token::Repeat) => {
                self.advance();
                let count = self.expression()?;
                let body = self.block()?;
                Stmt::Repeat { count, body }
            }
            Some(Token::Return) => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(self.expression()?)
                } else {
                    None
                };
                Stmt::Return(value)
            }
            Some(Token::Stop) => {
                self.advance();
                Stmt::Stop
            }
            Some(Token::Next) => {
                self.advance();
                Stmt::Next
            }
            _ => self.simple_statement()?,
        };
        let span = start.merge(self.previous_span());
        self.eat(&Token::Semi);
        Ok(Spanned::new(stmt, span))
    }

    fn if_statement(&mut self) -> PResult<Stmt> {
        self.expect(&Token::If, "'if'")?;
        let cond = self.expression()?;
        let then_block = self.block()?;
        let else_block = if self.eat(&Token::Else).is_some() {
            if self.check(&Token::If) {
                let start = self.peek_span();
                let nested = self.if_statement()?;
                let span = start.merge(self.previous_span());
                Some(Block {
                    statements: vec![Spanned::new(nested, span)],
                    span,
                })
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn function(&mut self) -> PResult<FunctionDecl> {
        let start = self.expect(&Token::Function, "'function'")?;
        let name = self.identifier("function name")?;
        self.expect(&Token::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.identifier("parameter name")?);
                if self.eat(&Token::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(&Token::RParen, "')'")?;
        let body = self.block()?;
        Ok(FunctionDecl {
            name,
            params,
            body,
            span: start.merge(self.previous_span()),
        })
    }

    /// Expression statement or assignment
    fn simple_statement(&mut self) -> PResult<Stmt> {
        let expr = self.expression()?;
        if self.eat(&Token::LArrow).is_none() {
            return Ok(Stmt::Expr(expr));
        }
        let target = self.assign_target(expr)?;
        let value = self.expression()?;
        Ok(Stmt::Assign { target, value })
    }

    fn assign_target(&mut self, expr: Spanned<Expr>) -> PResult<Spanned<AssignTarget>> {
        let span = expr.span;
        let rooted = Expr::root_identifier(&expr).is_some();
        match expr.node {
            Expr::Var(name) => Ok(Spanned::new(AssignTarget::Identifier(name), span)),
            Expr::Index { base, index } if rooted => {
                Ok(Spanned::new(AssignTarget::Subscript { base, index }, span))
            }
            _ => {
                self.reporter
                    .report("Invalid assignment target", span, false);
                Err(SyntaxError)
            }
        }
    }

    fn identifier(&mut self, what: &str) -> PResult<Spanned<String>> {
        match self.peek() {
            Some(Token::Ident(_)) => match self.advance() {
                Some((Token::Ident(name), span)) => Ok(Spanned::new(name, span)),
                _ => Err(self.error(what)),
            },
            _ => Err(self.error(what)),
        }
    }

    // ---- expressions ----

    fn starts_expression(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::IntLit(_)
                    | Token::FloatLit(_)
                    | Token::StringLit(_)
                    | Token::True
                    | Token::False
                    | Token::Ident(_)
                    | Token::LBracket
                    | Token::LParen
                    | Token::Plus
                    | Token::Minus
                    | Token::Tilde
                    | Token::Not
                    | Token::TyInt
                    | Token::TyFloat
                    | Token::TyBool
                    | Token::TyString
                    | Token::TyArray
            )
        )
    }

    fn expression(&mut self) -> PResult<Spanned<Expr>> {
        self.or_expr()
    }

    /// One left-associative binary precedence level.
    fn binary_level(&mut self, next: Level, op_for: fn(&Token) -> Option<BinOp>) -> PResult<Spanned<Expr>> {
        let mut left = next(self)?;
        while let Some(op) = self.peek().and_then(op_for) {
            self.advance();
            let right = next(self)?;
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn or_expr(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::and_expr, |t| match t {
            Token::Or => Some(BinOp::Or),
            _ => None,
        })
    }

    fn and_expr(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::not_expr, |t| match t {
            Token::And => Some(BinOp::And),
            _ => None,
        })
    }

    fn not_expr(&mut self) -> PResult<Spanned<Expr>> {
        match self.eat(&Token::Not) {
            Some(start) => {
                let operand = self.not_expr()?;
                let span = start.merge(operand.span);
                Ok(Spanned::new(
                    Expr::Unary {
                        op: UnOp::Not,
                        expr: Box::new(operand),
                    },
                    span,
                ))
            }
            None => self.equality(),
        }
    }

    fn equality(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::comparison, |t| match t {
            Token::Eq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::Ne),
            _ => None,
        })
    }

    fn comparison(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::range, |t| match t {
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::Le),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn range(&mut self) -> PResult<Spanned<Expr>> {
        let start = self.bit_or()?;
        if self.eat(&Token::DotDot).is_none() {
            return Ok(start);
        }
        let end = self.bit_or()?;
        let span = start.span.merge(end.span);
        Ok(Spanned::new(
            Expr::Range {
                start: Box::new(start),
                end: Box::new(end),
            },
            span,
        ))
    }

    fn bit_or(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::bit_xor, |t| match t {
            Token::Pipe => Some(BinOp::BitOr),
            _ => None,
        })
    }

    fn bit_xor(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::bit_and, |t| match t {
            Token::Caret => Some(BinOp::BitXor),
            _ => None,
        })
    }

    fn bit_and(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::additive, |t| match t {
            Token::Amp => Some(BinOp::BitAnd),
            _ => None,
        })
    }

    fn additive(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::term, |t| match t {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn term(&mut self) -> PResult<Spanned<Expr>> {
        self.binary_level(Parser::unary, |t| match t {
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    fn unary(&mut self) -> PResult<Spanned<Expr>> {
        let op = match self.peek() {
            Some(Token::Plus) => UnOp::Pos,
            Some(Token::Minus) => UnOp::Neg,
            Some(Token::Tilde) => UnOp::BitNot,
            _ => return self.postfix(),
        };
        let start = self.peek_span();
        self.advance();
        let operand = self.unary()?;
        let span = start.merge(operand.span);
        Ok(Spanned::new(
            Expr::Unary {
                op,
                expr: Box::new(operand),
            },
            span,
        ))
    }

    fn postfix(&mut self) -> PResult<Spanned<Expr>> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::LBracket).is_some() {
                let index = self.expression()?;
                let close = self.expect(&Token::RBracket, "']'")?;
                let span = expr.span.merge(close);
                expr = Spanned::new(
                    Expr::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.check(&Token::LParen) {
                // Only a bare identifier can be called.
                let Expr::Var(name) = &expr.node else {
                    return Ok(expr);
                };
                let func = Spanned::new(name.clone(), expr.span);
                self.advance();
                let args = self.arguments()?;
                let close = self.expect(&Token::RParen, "')'")?;
                expr = Spanned::new(Expr::Call { func, args }, expr.span.merge(close));
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to (not including) `)` or `]`.
    fn arguments(&mut self) -> PResult<Vec<Spanned<Expr>>> {
        let mut args = Vec::new();
        if self.check(&Token::RParen) || self.check(&Token::RBracket) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::Comma).is_none() {
                return Ok(args);
            }
        }
    }

    fn primary(&mut self) -> PResult<Spanned<Expr>> {
        let span = self.peek_span();
        let node = match self.peek().cloned() {
            Some(Token::IntLit(n)) => Expr::IntLit(n),
            Some(Token::FloatLit(x)) => Expr::FloatLit(x),
            Some(Token::StringLit(s)) => Expr::StringLit(s),
            Some(Token::True) => Expr::BoolLit(true),
            Some(Token::False) => Expr::BoolLit(false),
            Some(Token::Ident(name)) => Expr::Var(name),
            Some(Token::LBracket) => {
                self.advance();
                let elements = self.arguments()?;
                let close = self.expect(&Token::RBracket, "']'")?;
                return Ok(Spanned::new(Expr::ArrayLit(elements), span.merge(close)));
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                return Ok(inner);
            }
            Some(Token::TyInt) => return self.cast(CastTarget::Int),
            Some(Token::TyFloat) => return self.cast(CastTarget::Float),
            Some(Token::TyBool) => return self.cast(CastTarget::Bool),
            Some(Token::TyString) => return self.cast(CastTarget::String),
            Some(Token::TyArray) => return self.cast(CastTarget::Array),
            _ => return Err(self.error("expression")),
        };
        self.advance();
        Ok(Spanned::new(node, span))
    }

    fn cast(&mut self, target: CastTarget) -> PResult<Spanned<Expr>> {
        let start = self.peek_span();
        self.advance();
        self.expect(&Token::LParen, "'('")?;
        let operand = self.expression()?;
        let close = self.expect(&Token::RParen, "')'")?;
        Ok(Spanned::new(
            Expr::Cast {
                target,
                expr: Box::new(operand),
            },
            start.merge(close),
        ))
    }
}
