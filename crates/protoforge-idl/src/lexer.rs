//! Tokenizer for `.proto` sources.
//!
//! Comments are emitted as tokens so the parser can attach them to the
//! declarations they document.

use crate::error::{ParseError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Int(String),
    Float(String),
    Str(String),
    Symbol(char),
    LineComment(String),
    BlockComment(String),
}

impl TokenKind {
    pub(crate) const fn is_comment(&self) -> bool {
        matches!(self, Self::LineComment(_) | Self::BlockComment(_))
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("identifier '{s}'"),
            Self::Int(s) | Self::Float(s) => format!("number '{s}'"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::Symbol(c) => format!("'{c}'"),
            Self::LineComment(_) | Self::BlockComment(_) => "comment".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Line where the token starts
    pub line: usize,
    /// Line where the token ends (differs only for block comments)
    pub end_line: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            let line = self.line;
            let kind = match c {
                c if c.is_whitespace() => {
                    self.bump();
                    continue;
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '"' | '\'' => self.string(c)?,
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.number(),
                c if c.is_ascii_alphabetic() || c == '_' => self.ident(),
                ';' | '{' | '}' | '(' | ')' | '[' | ']' | '<' | '>' | ',' | '=' | '.' | '-'
                | '+' | ':' | '/' => {
                    self.bump();
                    TokenKind::Symbol(c)
                }
                other => {
                    return Err(ParseError::Lex {
                        line,
                        message: format!("unexpected character '{other}'"),
                    });
                }
            };
            tokens.push(Token {
                kind,
                line,
                end_line: self.line,
            });
        }
        Ok(tokens)
    }

    fn line_comment(&mut self) -> TokenKind {
        self.pos += 2;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.pos += 1;
        }
        TokenKind::LineComment(text.trim_end_matches('\r').to_string())
    }

    fn block_comment(&mut self) -> Result<TokenKind> {
        let start = self.line;
        self.pos += 2;
        let mut text = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::Lex {
                        line: start,
                        message: "unterminated block comment".to_string(),
                    });
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.pos += 2;
                    break;
                }
                Some(_) => {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
            }
        }
        Ok(TokenKind::BlockComment(text))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(ParseError::Lex {
                    line: start,
                    message: "unterminated string literal".to_string(),
                });
            };
            match c {
                c if c == quote => break,
                '\n' => {
                    return Err(ParseError::Lex {
                        line: start,
                        message: "newline in string literal".to_string(),
                    });
                }
                '\\' => {
                    let escaped = self.bump().ok_or_else(|| ParseError::Lex {
                        line: start,
                        message: "unterminated escape sequence".to_string(),
                    })?;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        '0' => '\0',
                        other => other,
                    });
                }
                c => text.push(c),
            }
        }
        Ok(TokenKind::Str(text))
    }

    fn number(&mut self) -> TokenKind {
        let mut text = String::new();
        let mut is_float = false;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            text.push_str("0x");
            self.pos += 2;
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                text.push(c);
                self.pos += 1;
            }
            return TokenKind::Int(text);
        }
        while let Some(c) = self.peek() {
            match c {
                c if c.is_ascii_digit() => text.push(c),
                '.' => {
                    is_float = true;
                    text.push(c);
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    if let Some(sign @ ('+' | '-')) = self.peek_at(1) {
                        text.push(sign);
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Int(text)
        }
    }

    fn ident(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self
            .peek()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            text.push(c);
            self.pos += 1;
        }
        TokenKind::Ident(text)
    }
}
