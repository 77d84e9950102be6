//! Tokenizer for the Lua literal subset used by overlay files
//!
//! Converts source text into a stream of tokens with line/column positions.

use crate::error::{Error, Result};

/// Token kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),

    // Identifiers and keywords
    Ident(String),
    Local,
    Return,
    If,
    Then,
    Elseif,
    Else,
    End,
    Not,
    And,
    Or,
    Nil,
    True,
    False,

    // Operators
    Assign,
    EqEq,
    NotEq,
    Minus,
    Concat,

    // Delimiters
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,

    // Special
    Eof,
}

impl TokenKind {
    /// Short description used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Int(i) => format!("number '{i}'"),
            TokenKind::Float(f) => format!("number '{f}'"),
            TokenKind::String(s) => format!("string \"{s}\""),
            TokenKind::Ident(name) => format!("'{name}'"),
            TokenKind::Eof => "<eof>".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Local => "local",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Elseif => "elseif",
            TokenKind::Else => "else",
            TokenKind::End => "end",
            TokenKind::Not => "not",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Nil => "nil",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Assign => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "~=",
            TokenKind::Minus => "-",
            TokenKind::Concat => "..",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            _ => "?",
        }
    }
}

/// A token with position information
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Lexer over a whole script
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        Ok(tokens)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> Error {
        Error::LuaSyntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let (line, column) = (self.line, self.column);

        let Some((pos, c)) = self.advance() else {
            return Ok(Token::new(TokenKind::Eof, line, column));
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '-' => TokenKind::Minus,
            '[' => {
                if let Some(level) = self.long_bracket_level() {
                    TokenKind::String(self.long_string(level, line, column)?)
                } else {
                    TokenKind::LBracket
                }
            }
            '=' => {
                if self.match_char('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '~' => {
                if self.match_char('=') {
                    TokenKind::NotEq
                } else {
                    return Err(self.error(line, column, "unexpected symbol '~'"));
                }
            }
            '.' => {
                if self.match_char('.') {
                    TokenKind::Concat
                } else if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.number(pos, line, column)?
                } else {
                    TokenKind::Dot
                }
            }
            '"' | '\'' => TokenKind::String(self.string(c, line, column)?),
            c if c.is_ascii_digit() => self.number(pos, line, column)?,
            c if c.is_alphabetic() || c == '_' => self.identifier(pos),
            _ => {
                return Err(self.error(line, column, format!("unexpected symbol '{c}'")));
            }
        };

        Ok(Token::new(kind, line, column))
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((_, c)) = result {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next().map(|(_, c)| c)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_offset(&mut self) -> usize {
        self.chars.peek().map_or(self.source.len(), |(pos, _)| *pos)
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('-') if self.peek_second() == Some('-') => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    if self.match_char('[') {
                        if let Some(level) = self.long_bracket_level() {
                            self.long_string(level, line, column)?;
                            continue;
                        }
                    }
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// After a consumed `[`, consumes `=*[` and returns the level, or leaves
    /// the input untouched when this is not a long bracket.
    fn long_bracket_level(&mut self) -> Option<usize> {
        let mut lookahead = self.chars.clone();
        let mut level = 0;
        loop {
            match lookahead.next() {
                Some((_, '=')) => level += 1,
                Some((_, '[')) => break,
                _ => return None,
            }
        }
        for _ in 0..=level {
            self.advance();
        }
        Some(level)
    }

    fn long_string(&mut self, level: usize, line: usize, column: usize) -> Result<String> {
        // A newline right after the opening bracket is skipped.
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }

        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, ']')) => {
                    let mut lookahead = self.chars.clone();
                    let mut closing = 0;
                    while let Some((_, '=')) = lookahead.peek() {
                        lookahead.next();
                        closing += 1;
                    }
                    if closing == level && matches!(lookahead.peek(), Some((_, ']'))) {
                        for _ in 0..=level {
                            self.advance();
                        }
                        return Ok(value);
                    }
                    value.push(']');
                }
                Some((_, c)) => value.push(c),
                None => {
                    return Err(self.error(line, column, "unfinished long string"));
                }
            }
        }
    }

    fn string(&mut self, quote: char, line: usize, column: usize) -> Result<String> {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, c)) if c == quote => break,
                Some((_, '\n')) | None => {
                    return Err(self.error(line, column, "unfinished string"));
                }
                Some((_, '\\')) => match self.advance() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 'a')) => value.push('\u{7}'),
                    Some((_, 'b')) => value.push('\u{8}'),
                    Some((_, 'f')) => value.push('\u{c}'),
                    Some((_, 'v')) => value.push('\u{b}'),
                    Some((_, '\n')) => value.push('\n'),
                    Some((_, c @ ('\\' | '"' | '\''))) => value.push(c),
                    Some((_, d)) if d.is_ascii_digit() => {
                        let mut code = d.to_digit(10).unwrap_or(0);
                        for _ in 0..2 {
                            match self.peek().and_then(|c| c.to_digit(10)) {
                                Some(digit) => {
                                    self.advance();
                                    code = code * 10 + digit;
                                }
                                None => break,
                            }
                        }
                        let Some(ch) = u8::try_from(code).ok().map(char::from) else {
                            return Err(self.error(line, column, "decimal escape too large"));
                        };
                        value.push(ch);
                    }
                    Some((_, c)) => {
                        return Err(self.error(line, column, format!("invalid escape sequence '\\{c}'")));
                    }
                    None => {
                        return Err(self.error(line, column, "unfinished string"));
                    }
                },
                Some((_, c)) => value.push(c),
            }
        }

        Ok(value)
    }

    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind> {
        let source = self.source;
        let first = source[start..].chars().next();
        if first == Some('0') && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let digits_start = self.current_offset();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            }
            let digits_end = self.current_offset();
            let digits = &source[digits_start..digits_end];
            return i64::from_str_radix(digits, 16)
                .map(TokenKind::Int)
                .map_err(|_| self.error(line, column, format!("malformed number near '0x{digits}'")));
        }

        let mut is_float = first == Some('.');
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.advance();
                }
                Some('.') if !is_float => {
                    is_float = true;
                    self.advance();
                }
                Some('e' | 'E') => {
                    is_float = true;
                    self.advance();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.advance();
                    }
                }
                _ => break,
            }
        }

        let end = self.current_offset();
        let text = &source[start..end];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(line, column, format!("malformed number near '{text}'")))
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(TokenKind::Int(value)),
                // Integers that overflow fall back to floats, as in Lua.
                Err(_) => text
                    .parse::<f64>()
                    .map(TokenKind::Float)
                    .map_err(|_| self.error(line, column, format!("malformed number near '{text}'"))),
            }
        }
    }

    fn identifier(&mut self, start: usize) -> TokenKind {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let end = self.current_offset();
        let ident = &self.source[start..end];

        match ident {
            "local" => TokenKind::Local,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "elseif" => TokenKind::Elseif,
            "else" => TokenKind::Else,
            "end" => TokenKind::End,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "nil" => TokenKind::Nil,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Ident(ident.to_string()),
        }
    }
}
