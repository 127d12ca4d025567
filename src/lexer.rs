// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Brewin language.
// Converts source code text into a stream of tokens for parsing.
//
// Supports:
// - Keywords: func, return, if, else, while, lambda, ref, nil
// - Identifiers, integer literals, true/false
// - String literals with escape sequences
// - Operators: + - * / % = == != < <= > >= && || ! @
// - Punctuation: ( ) { } , ; .
// - Line comments starting with //

use crate::errors::{BrewinError, BrewinResult, SourceLocation};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Int(i64),
    String(String),
    Bool(bool),
    Operator(String),
    Punctuation(char),
    Keyword(String),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

const KEYWORDS: &[&str] = &["func", "return", "if", "else", "while", "lambda", "ref", "nil"];

/// Tokenizes Brewin source code into a vector of tokens.
///
/// The returned vector always ends with an `Eof` token. Every token records
/// the line and column where it starts.
pub fn tokenize(source: &str) -> BrewinResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;
    let mut col = 1;

    while let Some(&c) = chars.peek() {
        let start_col = col;
        let mut push = |kind: TokenKind| tokens.push(Token { kind, line, column: start_col });

        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
                col += 1;
            }
            '\n' => {
                chars.next();
                line += 1;
                col = 1;
            }
            '"' => {
                chars.next();
                col += 1;
                let mut s = String::new();
                let mut closed = false;
                while let Some(ch) = chars.next() {
                    col += 1;
                    match ch {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\n' => break,
                        '\\' => {
                            if let Some(esc) = chars.next() {
                                col += 1;
                                match esc {
                                    'n' => s.push('\n'),
                                    't' => s.push('\t'),
                                    '\\' => s.push('\\'),
                                    '"' => s.push('"'),
                                    other => s.push(other),
                                }
                            }
                        }
                        other => s.push(other),
                    }
                }
                if !closed {
                    return Err(Box::new(BrewinError::parse_error(
                        "unterminated string literal",
                        SourceLocation::new(line, start_col),
                    )));
                }
                push(TokenKind::String(s));
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() {
                        digits.push(ch);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }
                let value = digits.parse::<i64>().map_err(|_| {
                    BrewinError::parse_error(
                        format!("integer literal {} is out of range", digits),
                        SourceLocation::new(line, start_col),
                    )
                })?;
                push(TokenKind::Int(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                        col += 1;
                    } else {
                        break;
                    }
                }

                let kind = match ident.as_str() {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    kw if KEYWORDS.contains(&kw) => TokenKind::Keyword(ident),
                    _ => TokenKind::Identifier(ident),
                };
                push(kind);
            }
            '/' => {
                chars.next();
                col += 1;
                if chars.peek() == Some(&'/') {
                    // Comment runs to the end of the line; the newline is handled above
                    while let Some(&ch) = chars.peek() {
                        if ch == '\n' {
                            break;
                        }
                        chars.next();
                        col += 1;
                    }
                } else {
                    push(TokenKind::Operator("/".into()));
                }
            }
            '=' | '!' | '<' | '>' => {
                chars.next();
                col += 1;
                if chars.peek() == Some(&'=') {
                    chars.next();
                    col += 1;
                    push(TokenKind::Operator(format!("{}=", c)));
                } else {
                    push(TokenKind::Operator(c.to_string()));
                }
            }
            '&' | '|' => {
                chars.next();
                col += 1;
                if chars.peek() == Some(&c) {
                    chars.next();
                    col += 1;
                    push(TokenKind::Operator(format!("{}{}", c, c)));
                } else {
                    return Err(Box::new(BrewinError::parse_error(
                        format!("unexpected character '{}', did you mean '{}{}'?", c, c, c),
                        SourceLocation::new(line, start_col),
                    )));
                }
            }
            '+' | '-' | '*' | '%' | '@' => {
                chars.next();
                col += 1;
                push(TokenKind::Operator(c.to_string()));
            }
            '(' | ')' | '{' | '}' | ',' | ';' | '.' => {
                chars.next();
                col += 1;
                push(TokenKind::Punctuation(c));
            }
            other => {
                return Err(Box::new(BrewinError::parse_error(
                    format!("unexpected character '{}'", other),
                    SourceLocation::new(line, start_col),
                )));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, line, column: col });

    Ok(tokens)
}
