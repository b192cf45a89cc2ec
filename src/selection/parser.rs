//! Selection text parser
//!
//! Turns selection text such as `b = a, starts_with("x"), -(c:e)` into
//! selection terms. A top-level unnamed `c(...)` is split into one term per
//! element.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::{Arg, Expr, SelectionTerm, MAX_NESTING_DEPTH};
use super::errors::{SelectionError, SelectionResult};

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    /// Name; `quoted` is set for backtick-quoted names
    Ident { name: String, quoted: bool },
    Int(i64),
    Str(String),
    True,
    False,
    Minus,
    Colon,
    Comma,
    Eq,
    LParen,
    RParen,
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Ident { name, .. } => format!("name '{}'", name),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::True => "TRUE".to_string(),
            TokenKind::False => "FALSE".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    /// Byte offset of the first character
    start: usize,
}

fn line_col(input: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(input.len());
    let mut line = 1;
    let mut col = 1;
    for c in input[..offset].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn parse_err(input: &str, offset: usize, msg: impl Into<String>) -> SelectionError {
    let (line, col) = line_col(input, offset);
    SelectionError::parse_error(line, col, msg)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '.'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn tokenize(input: &str) -> SelectionResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let kind = match c {
            '-' => single(&mut chars, TokenKind::Minus),
            ':' => single(&mut chars, TokenKind::Colon),
            ',' => single(&mut chars, TokenKind::Comma),
            '=' => single(&mut chars, TokenKind::Eq),
            '(' => single(&mut chars, TokenKind::LParen),
            ')' => single(&mut chars, TokenKind::RParen),
            '"' | '\'' => {
                chars.next();
                TokenKind::Str(read_quoted(input, start, c, &mut chars)?)
            }
            '`' => {
                chars.next();
                let name = read_quoted(input, start, '`', &mut chars)?;
                if name.is_empty() {
                    return Err(parse_err(input, start, "empty quoted name"));
                }
                TokenKind::Ident { name, quoted: true }
            }
            c if c.is_ascii_digit() => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                if let Some(&(i, d)) = chars.peek() {
                    if is_ident_continue(d) {
                        return Err(parse_err(
                            input,
                            i,
                            "names cannot start with a digit; quote them with backticks",
                        ));
                    }
                }
                let digits = &input[start..end];
                let n = digits.parse::<i64>().map_err(|_| {
                    parse_err(input, start, format!("number {} is too large", digits))
                })?;
                TokenKind::Int(n)
            }
            c if is_ident_start(c) => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if !is_ident_continue(d) {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                match &input[start..end] {
                    "TRUE" | "true" => TokenKind::True,
                    "FALSE" | "false" => TokenKind::False,
                    name => TokenKind::Ident {
                        name: name.to_string(),
                        quoted: false,
                    },
                }
            }
            other => {
                return Err(parse_err(
                    input,
                    start,
                    format!("unexpected character '{}'", other),
                ))
            }
        };

        tokens.push(Token { kind, start });
    }

    Ok(tokens)
}

fn single(chars: &mut Peekable<CharIndices<'_>>, kind: TokenKind) -> TokenKind {
    chars.next();
    kind
}

/// Reads up to the closing `quote`, handling backslash escapes
fn read_quoted(
    input: &str,
    start: usize,
    quote: char,
    chars: &mut Peekable<CharIndices<'_>>,
) -> SelectionResult<String> {
    let mut out = String::new();
    loop {
        match chars.next() {
            None => return Err(parse_err(input, start, "unterminated quote")),
            Some((_, c)) if c == quote => return Ok(out),
            Some((i, '\\')) => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, c @ ('\\' | '"' | '\'' | '`'))) => out.push(c),
                Some((_, c)) => {
                    return Err(parse_err(input, i, format!("unknown escape '\\{}'", c)))
                }
                None => return Err(parse_err(input, start, "unterminated quote")),
            },
            Some((_, c)) => out.push(c),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            input,
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_second(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.start)
            .unwrap_or(self.input.len())
    }

    fn error_here(&self, msg: impl Into<String>) -> SelectionError {
        parse_err(self.input, self.offset(), msg)
    }

    fn found(&self) -> String {
        self.peek()
            .map(TokenKind::describe)
            .unwrap_or_else(|| "end of input".to_string())
    }

    fn expect(&mut self, expected: TokenKind) -> SelectionResult<()> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here(format!(
                "expected {}, found {}",
                expected.describe(),
                self.found()
            )))
        }
    }

    /// `name =` prefix, if present
    fn binding_name(&mut self) -> Option<String> {
        match (self.peek(), self.peek_second()) {
            (Some(TokenKind::Ident { name, .. }), Some(TokenKind::Eq)) => {
                let name = name.clone();
                self.pos += 2;
                Some(name)
            }
            _ => None,
        }
    }

    fn terms(&mut self) -> SelectionResult<Vec<SelectionTerm>> {
        let mut terms = Vec::new();
        if self.peek().is_none() {
            return Ok(terms);
        }
        loop {
            terms.push(self.term()?);
            match self.peek() {
                None => break,
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(_) => {
                    return Err(self.error_here(format!(
                        "expected ',' or end of input, found {}",
                        self.found()
                    )))
                }
            }
        }
        Ok(terms)
    }

    fn term(&mut self) -> SelectionResult<SelectionTerm> {
        let name = self.binding_name();
        let expr = self.expr()?;
        Ok(SelectionTerm { expr, name })
    }

    fn expr(&mut self) -> SelectionResult<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error_here(format!(
                "expression nested deeper than {} levels",
                MAX_NESTING_DEPTH
            )));
        }
        self.depth += 1;
        let result = self.unary();
        self.depth -= 1;
        result
    }

    fn unary(&mut self) -> SelectionResult<Expr> {
        if self.peek() == Some(&TokenKind::Minus) {
            self.pos += 1;
            return Ok(Expr::negate(self.expr()?));
        }
        let from = self.primary()?;
        if self.peek() == Some(&TokenKind::Colon) {
            self.pos += 1;
            let to = self.primary()?;
            return Ok(Expr::range(from, to));
        }
        Ok(from)
    }

    fn primary(&mut self) -> SelectionResult<Expr> {
        let start = self.offset();
        let token = match self.advance() {
            Some(t) => t,
            None => return Err(self.error_here("expected an expression, found end of input")),
        };

        match token.kind {
            TokenKind::Ident { name, quoted } => {
                if self.peek() != Some(&TokenKind::LParen) {
                    return Ok(Expr::Column(name));
                }
                self.pos += 1;
                let args = self.args()?;
                if name == "c" && !quoted {
                    if args.iter().any(|a| a.name.is_some()) {
                        return Err(parse_err(
                            self.input,
                            start,
                            "c() elements cannot be named; name the term instead",
                        ));
                    }
                    return Ok(Expr::List(args.into_iter().map(|a| a.value).collect()));
                }
                Ok(Expr::Call {
                    function: name,
                    args,
                })
            }
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(parse_err(
                self.input,
                start,
                format!("expected an expression, found {}", other.describe()),
            )),
        }
    }

    /// Arguments after `(`, consuming the closing `)`
    fn args(&mut self) -> SelectionResult<Vec<Arg>> {
        let mut args = Vec::new();
        if self.peek() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            let name = self.binding_name();
            let value = self.expr()?;
            args.push(Arg { name, value });
            match self.peek() {
                Some(TokenKind::Comma) => {
                    self.pos += 1;
                }
                Some(TokenKind::RParen) => {
                    self.pos += 1;
                    return Ok(args);
                }
                _ => {
                    return Err(self.error_here(format!(
                        "expected ',' or ')', found {}",
                        self.found()
                    )))
                }
            }
        }
    }
}

/// Parses selection text into terms
///
/// Empty (or whitespace-only) text yields no terms.
pub fn parse_selection(input: &str) -> SelectionResult<Vec<SelectionTerm>> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(input, tokens);
    let parsed = parser.terms()?;

    let mut terms = Vec::with_capacity(parsed.len());
    for term in parsed {
        match term {
            SelectionTerm {
                expr: Expr::List(items),
                name: None,
            } => terms.extend(items.into_iter().map(SelectionTerm::new)),
            term => terms.push(term),
        }
    }
    Ok(terms)
}
