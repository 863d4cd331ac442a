//! Tokenizer for declaration sources.
//!
//! Keywords are not distinguished here; the parser matches identifier text
//! where it expects a keyword, so `ob`, `attr` and friends stay usable as
//! field names.

use std::fmt;

use crate::error::FrontendError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Pipe,
    Eq,
    ColonColon,
    Arrow,
    Dot,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize, // byte offsets into the source
    pub end: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Pipe => f.write_str("|"),
            TokenKind::Eq => f.write_str("="),
            TokenKind::ColonColon => f.write_str("::"),
            TokenKind::Arrow => f.write_str("->"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, FrontendError> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let single = |kind| Token { kind, start, end: start + c.len_utf8() };
        match c {
            ' ' | '\t' | '\r' | '\n' => {}
            '#' => {
                while let Some(&(_, c)) = chars.peek() {
                    if c == '\n' { break; }
                    chars.next();
                }
            }
            '(' => tokens.push(single(TokenKind::LParen)),
            ')' => tokens.push(single(TokenKind::RParen)),
            '{' => tokens.push(single(TokenKind::LBrace)),
            '}' => tokens.push(single(TokenKind::RBrace)),
            ',' => tokens.push(single(TokenKind::Comma)),
            '|' => tokens.push(single(TokenKind::Pipe)),
            '=' => tokens.push(single(TokenKind::Eq)),
            '.' => tokens.push(single(TokenKind::Dot)),
            ':' => match chars.peek() {
                Some(&(_, ':')) => {
                    chars.next();
                    tokens.push(Token { kind: TokenKind::ColonColon, start, end: start + 2 });
                }
                _ => return Err(FrontendError::parse(start, ":", "expected `::`")),
            },
            '-' => match chars.peek() {
                Some(&(_, '>')) => {
                    chars.next();
                    tokens.push(Token { kind: TokenKind::Arrow, start, end: start + 2 });
                }
                _ => return Err(FrontendError::parse(start, "-", "expected `->`")),
            },
            '"' => {
                let mut text = String::new();
                let end = loop {
                    match chars.next() {
                        Some((i, '"')) => break i + 1,
                        Some((i, '\\')) => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, '"')) => text.push('"'),
                            Some((_, '\\')) => text.push('\\'),
                            Some((_, other)) => {
                                return Err(FrontendError::parse(
                                    i,
                                    format!("\\{other}"),
                                    "unknown escape in string literal",
                                ));
                            }
                            None => {
                                return Err(FrontendError::parse(
                                    start,
                                    &src[start..],
                                    "unterminated string literal",
                                ));
                            }
                        },
                        Some((_, c)) => text.push(c),
                        None => {
                            return Err(FrontendError::parse(
                                start,
                                &src[start..],
                                "unterminated string literal",
                            ));
                        }
                    }
                };
                tokens.push(Token { kind: TokenKind::Str(text), start, end });
            }
            c if is_ident_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, c)) = chars.peek() {
                    if !is_ident_continue(c) { break; }
                    end = i + c.len_utf8();
                    chars.next();
                }
                tokens.push(Token { kind: TokenKind::Ident(src[start..end].to_owned()), start, end });
            }
            other => {
                return Err(FrontendError::parse(start, other.to_string(), "unexpected character"));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, start: src.len(), end: src.len() });
    Ok(tokens)
}
