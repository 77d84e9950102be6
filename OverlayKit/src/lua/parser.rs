//! Recursive-descent parser for the Lua literal subset
//!
//! Produces a small statement/expression tree that [`super::eval`] runs.
//! Only the constructs overlay files are written with are accepted: local and
//! indexed assignments, table constructors, `if` guards, call statements and
//! `return`.

use crate::error::{Error, Result};

use super::lexer::{Token, TokenKind};

/// Deepest nesting of blocks and expressions the parser accepts.
pub const MAX_SYNTAX_DEPTH: usize = 100;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    NotEq,
    Concat,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
    Index {
        target: Box<Expr>,
        key: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        method: Option<String>,
        args: Vec<Expr>,
    },
    Table(Vec<Field>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// One field of a table constructor
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// `expr`, stored under the next sequence index
    Positional(Expr),
    /// `name = expr` or `[expr] = expr`
    Keyed(Expr, Expr),
}

/// Statement kinds
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Local {
        name: String,
        value: Option<Expr>,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    Call(Expr),
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        otherwise: Option<Vec<Stmt>>,
    },
    Return(Option<Expr>),
}

/// A statement and the line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

/// Parser over a token stream
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser. The token stream must end with [`TokenKind::Eof`].
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parse a whole chunk
    pub fn parse_chunk(&mut self) -> Result<Vec<Stmt>> {
        let block = self.block()?;
        if !self.check(&TokenKind::Eof) {
            return Err(self.unexpected("'<eof>' expected"));
        }
        Ok(block)
    }

    // === Statements ===

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mark = self.depth;
        self.descend()?;
        let mut statements = Vec::new();

        while !self.block_follows() {
            if self.match_token(&TokenKind::Semicolon) {
                continue;
            }
            let line = self.peek().line;
            if self.match_token(&TokenKind::Return) {
                let value = if self.block_follows() || self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.match_token(&TokenKind::Semicolon);
                statements.push(Stmt {
                    kind: StmtKind::Return(value),
                    line,
                });
                // 'return' must be the last statement of its block.
                if !self.block_follows() {
                    return Err(self.unexpected("'<eof>' expected after 'return'"));
                }
                break;
            }
            let kind = self.statement()?;
            statements.push(Stmt { kind, line });
        }

        self.depth = mark;
        Ok(statements)
    }

    fn block_follows(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Eof | TokenKind::End | TokenKind::Else | TokenKind::Elseif
        )
    }

    fn statement(&mut self) -> Result<StmtKind> {
        if self.match_token(&TokenKind::Local) {
            let name = self.consume_ident("<name> expected after 'local'")?;
            let value = if self.match_token(&TokenKind::Assign) {
                Some(self.expression()?)
            } else {
                None
            };
            return Ok(StmtKind::Local { name, value });
        }

        if self.match_token(&TokenKind::If) {
            return self.if_statement();
        }

        let target = self.suffixed_expression()?;
        if self.match_token(&TokenKind::Assign) {
            if !matches!(target, Expr::Name(_) | Expr::Index { .. }) {
                return Err(self.unexpected("cannot assign to this expression"));
            }
            let value = self.expression()?;
            Ok(StmtKind::Assign { target, value })
        } else if matches!(target, Expr::Call { .. }) {
            Ok(StmtKind::Call(target))
        } else {
            Err(self.unexpected("syntax error"))
        }
    }

    fn if_statement(&mut self) -> Result<StmtKind> {
        let mut branches = Vec::new();
        let mut otherwise = None;

        loop {
            let condition = self.expression()?;
            self.consume(&TokenKind::Then, "'then' expected")?;
            let body = self.block()?;
            branches.push((condition, body));

            if self.match_token(&TokenKind::Elseif) {
                continue;
            }
            if self.match_token(&TokenKind::Else) {
                otherwise = Some(self.block()?);
            }
            self.consume(&TokenKind::End, "'end' expected to close 'if'")?;
            break;
        }

        Ok(StmtKind::If {
            branches,
            otherwise,
        })
    }

    // === Expressions ===

    /// Parse a single expression
    pub fn expression(&mut self) -> Result<Expr> {
        let mark = self.depth;
        self.descend()?;
        let expr = self.or_expression()?;
        self.depth = mark;
        Ok(expr)
    }

    fn or_expression(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.and_expression()?;
        while self.match_token(&TokenKind::Or) {
            self.descend()?;
            let rhs = self.and_expression()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn and_expression(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.comparison()?;
        while self.match_token(&TokenKind::And) {
            self.descend()?;
            let rhs = self.comparison()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut lhs = self.concat()?;
        loop {
            let op = if self.match_token(&TokenKind::EqEq) {
                BinaryOp::Eq
            } else if self.match_token(&TokenKind::NotEq) {
                BinaryOp::NotEq
            } else {
                break;
            };
            self.descend()?;
            let rhs = self.concat()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = mark;
        Ok(lhs)
    }

    fn concat(&mut self) -> Result<Expr> {
        let lhs = self.unary()?;
        if self.match_token(&TokenKind::Concat) {
            // Right associative
            let mark = self.depth;
            self.descend()?;
            let rhs = self.concat()?;
            self.depth = mark;
            return Ok(binary(BinaryOp::Concat, lhs, rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        let negate = if self.match_token(&TokenKind::Not) {
            false
        } else if self.match_token(&TokenKind::Minus) {
            true
        } else {
            return self.simple_expression();
        };

        let mark = self.depth;
        self.descend()?;
        let operand = Box::new(self.unary()?);
        self.depth = mark;
        Ok(if negate {
            Expr::Neg(operand)
        } else {
            Expr::Not(operand)
        })
    }

    fn simple_expression(&mut self) -> Result<Expr> {
        let expr = match &self.peek().kind {
            TokenKind::Nil => Expr::Nil,
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::Int(i) => Expr::Int(*i),
            TokenKind::Float(f) => Expr::Float(*f),
            TokenKind::String(s) => Expr::Str(s.clone()),
            TokenKind::LBrace => return self.table_constructor(),
            _ => return self.suffixed_expression(),
        };
        self.current += 1;
        Ok(expr)
    }

    fn primary_expression(&mut self) -> Result<Expr> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.current += 1;
            return Ok(Expr::Name(name));
        }
        if self.match_token(&TokenKind::LParen) {
            let inner = self.expression()?;
            self.consume(&TokenKind::RParen, "')' expected")?;
            return Ok(inner);
        }
        Err(self.unexpected("unexpected symbol"))
    }

    fn suffixed_expression(&mut self) -> Result<Expr> {
        let mark = self.depth;
        let mut expr = self.primary_expression()?;

        loop {
            if matches!(
                self.peek().kind,
                TokenKind::Dot
                    | TokenKind::LBracket
                    | TokenKind::Colon
                    | TokenKind::LParen
                    | TokenKind::String(_)
                    | TokenKind::LBrace
            ) {
                self.descend()?;
            }
            match &self.peek().kind {
                TokenKind::Dot => {
                    self.current += 1;
                    let name = self.consume_ident("<name> expected after '.'")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        key: Box::new(Expr::Str(name)),
                    };
                }
                TokenKind::LBracket => {
                    self.current += 1;
                    let key = self.expression()?;
                    self.consume(&TokenKind::RBracket, "']' expected")?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        key: Box::new(key),
                    };
                }
                TokenKind::Colon => {
                    self.current += 1;
                    let method = self.consume_ident("<name> expected after ':'")?;
                    let args = self.call_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        method: Some(method),
                        args,
                    };
                }
                TokenKind::LParen | TokenKind::String(_) | TokenKind::LBrace => {
                    let args = self.call_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        method: None,
                        args,
                    };
                }
                _ => {
                    self.depth = mark;
                    return Ok(expr);
                }
            }
        }
    }

    fn call_arguments(&mut self) -> Result<Vec<Expr>> {
        match &self.peek().kind {
            TokenKind::String(s) => {
                let arg = Expr::Str(s.clone());
                self.current += 1;
                Ok(vec![arg])
            }
            TokenKind::LBrace => Ok(vec![self.table_constructor()?]),
            TokenKind::LParen => {
                self.current += 1;
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.match_token(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.consume(&TokenKind::RParen, "')' expected to close argument list")?;
                Ok(args)
            }
            _ => Err(self.unexpected("function arguments expected")),
        }
    }

    fn table_constructor(&mut self) -> Result<Expr> {
        self.consume(&TokenKind::LBrace, "'{' expected")?;
        let mut fields = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            fields.push(self.field()?);
            if !(self.match_token(&TokenKind::Comma) || self.match_token(&TokenKind::Semicolon)) {
                break;
            }
        }

        self.consume(&TokenKind::RBrace, "'}' expected to close table")?;
        Ok(Expr::Table(fields))
    }

    fn field(&mut self) -> Result<Field> {
        if self.match_token(&TokenKind::LBracket) {
            let key = self.expression()?;
            self.consume(&TokenKind::RBracket, "']' expected")?;
            self.consume(&TokenKind::Assign, "'=' expected")?;
            let value = self.expression()?;
            return Ok(Field::Keyed(key, value));
        }

        if let TokenKind::Ident(name) = &self.peek().kind {
            if self.peek_next().kind == TokenKind::Assign {
                let key = Expr::Str(name.clone());
                self.current += 2;
                let value = self.expression()?;
                return Ok(Field::Keyed(key, value));
            }
        }

        Ok(Field::Positional(self.expression()?))
    }

    // === Token helpers ===

    fn peek(&self) -> &Token {
        // The stream always ends with Eof, which is never consumed.
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.current + 1).min(self.tokens.len() - 1)]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) && *kind != TokenKind::Eof {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: &TokenKind, message: &str) -> Result<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.unexpected(message))
        }
    }

    fn consume_ident(&mut self, message: &str) -> Result<String> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.current += 1;
            Ok(name)
        } else {
            Err(self.unexpected(message))
        }
    }

    /// Count one nesting level, failing past [`MAX_SYNTAX_DEPTH`].
    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_SYNTAX_DEPTH {
            let token = self.peek();
            return Err(Error::LuaSyntax {
                line: token.line,
                column: token.column,
                message: "chunk has too many syntax levels".to_string(),
            });
        }
        Ok(())
    }

    fn unexpected(&self, message: &str) -> Error {
        let token = self.peek();
        Error::LuaSyntax {
            line: token.line,
            column: token.column,
            message: format!("{message} near {}", token.kind.describe()),
        }
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::lexer::Lexer;

    fn parse(source: &str) -> Result<Vec<Stmt>> {
        let tokens = Lexer::new(source).tokenize()?;
        Parser::new(tokens).parse_chunk()
    }

    #[test]
    fn test_local_and_indexed_assignment() {
        let chunk = parse("local overlayMap = {}\noverlayMap[\"door_1\"] = { name = \"shop\" }").unwrap();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk[1].line, 2);
        match &chunk[1].kind {
            StmtKind::Assign {
                target: Expr::Index { key, .. },
                value: Expr::Table(fields),
            } => {
                assert_eq!(**key, Expr::Str("door_1".into()));
                assert_eq!(
                    fields[0],
                    Field::Keyed(Expr::Str("name".into()), Expr::Str("shop".into()))
                );
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn test_guarded_method_call() {
        let chunk = parse("if not TILEZED then\n  getTileOverlays():addOverlays(overlayMap)\nend").unwrap();
        let StmtKind::If { branches, otherwise } = &chunk[0].kind else {
            panic!("expected if");
        };
        assert!(otherwise.is_none());
        assert!(matches!(branches[0].0, Expr::Not(_)));
        assert!(matches!(
            &branches[0].1[0].kind,
            StmtKind::Call(Expr::Call { method: Some(m), .. }) if m == "addOverlays"
        ));
    }

    #[test]
    fn test_table_constructor_separators() {
        let chunk = parse("t = { 1; 2, [3] = 'x', }").unwrap();
        let StmtKind::Assign { value: Expr::Table(fields), .. } = &chunk[0].kind else {
            panic!("expected table assignment");
        };
        assert_eq!(fields.len(), 3);
        assert!(matches!(fields[2], Field::Keyed(Expr::Int(3), _)));
    }

    #[test]
    fn test_return_must_end_block() {
        assert!(parse("return t\nx = 1").is_err());
        assert!(parse("return t;").is_ok());
    }

    #[test]
    fn test_bare_expression_is_rejected() {
        let err = parse("x").unwrap_err();
        assert!(matches!(err, Error::LuaSyntax { line: 1, .. }));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let tables = format!("return {}{}", "{".repeat(10_000), "}".repeat(10_000));
        let err = parse(&tables).unwrap_err();
        assert!(err.to_string().contains("too many syntax levels"), "{err}");

        let negations = format!("return {}x", "not ".repeat(10_000));
        assert!(parse(&negations).is_err());

        let chain = format!("x = a{}", ".b".repeat(10_000));
        assert!(parse(&chain).is_err());

        let ors = format!("x = a{}", " or a".repeat(10_000));
        assert!(parse(&ors).is_err());

        let ifs = format!("{}{}", "if x then ".repeat(10_000), "end ".repeat(10_000));
        assert!(parse(&ifs).is_err());
    }

    #[test]
    fn test_moderate_nesting_is_accepted() {
        let tables = format!("return {}{}", "{".repeat(20), "}".repeat(20));
        assert!(parse(&tables).is_ok());
    }

    #[test]
    fn test_missing_end_is_reported() {
        let err = parse("if TILEZED then x = 1").unwrap_err();
        assert!(err.to_string().contains("'end' expected"));
    }
}
