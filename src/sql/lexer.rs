//! Tokenizer for the SQL subset.
//!
//! Words are lowercased, so keywords and identifiers are case-insensitive.
//! `--` starts a comment that runs to the end of the line.

use std::iter::Peekable;
use std::str::CharIndices;

use super::error::Span;
use super::token::{Keyword, Token, TokenKind};
use crate::catalog::IndexKind;
use crate::query::Operator;

/// Splits statement text into [`Token`]s, ending with a single
/// [`TokenKind::Eof`].
///
/// Malformed input becomes a [`TokenKind::Error`] token and lexing carries on
/// after it; the parser decides what to do with the error.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            finished: false,
        }
    }

    /// Byte offset of the next unread character.
    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.input.len(), |&(i, _)| i)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// The character after the next one.
    fn peek_second(&self) -> Option<char> {
        self.chars.clone().nth(1).map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.chars.next_if(|&(_, c)| pred(c)).is_some() {}
    }

    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.peek() == Some('-') && self.peek_second() == Some('-') {
                self.eat_while(|c| c != '\n');
            } else {
                return;
            }
        }
    }

    fn token(&mut self, kind: TokenKind, start: usize) -> Token {
        let end = self.offset();
        Token::new(kind, Span::new(start, end))
    }

    fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let start = self.offset();
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::at(start));
        };
        let kind = match c {
            '\'' => self.string(),
            '-' if self.peek_second().is_some_and(|d| d.is_ascii_digit()) => self.number(start),
            '0'..='9' => self.number(start),
            c if c.is_ascii_alphabetic() || c == '_' => self.word(start),
            '=' | '!' | '<' | '>' => self.operator(start),
            _ => {
                self.bump();
                match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    _ => TokenKind::Error(format!("unexpected character '{c}'")),
                }
            }
        };
        self.token(kind, start)
    }

    /// A quoted string; `''` inside it stands for one quote.
    fn string(&mut self) -> TokenKind {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return TokenKind::Error("unterminated string literal".to_string()),
                Some('\'') if self.peek() == Some('\'') => {
                    self.bump();
                    value.push('\'');
                }
                Some('\'') => return TokenKind::String(value),
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, start: usize) -> TokenKind {
        if self.peek() == Some('-') {
            self.bump();
        }
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek().is_some_and(is_word_char) {
            self.eat_while(is_word_char);
            return TokenKind::Error("invalid number literal".to_string());
        }
        let end = self.offset();
        match self.input[start..end].parse() {
            Ok(n) => TokenKind::Integer(n),
            Err(_) => TokenKind::Error("integer literal out of range".to_string()),
        }
    }

    /// A keyword, an index type name or an identifier, in that order.
    fn word(&mut self, start: usize) -> TokenKind {
        self.eat_while(is_word_char);
        let end = self.offset();
        let word = self.input[start..end].to_ascii_lowercase();
        if let Some(keyword) = Keyword::parse(&word) {
            TokenKind::Keyword(keyword)
        } else if let Some(kind) = IndexKind::parse(&word) {
            TokenKind::IndexType(kind)
        } else {
            TokenKind::Identifier(word)
        }
    }

    /// The longest run of operator characters, which must form one operator.
    fn operator(&mut self, start: usize) -> TokenKind {
        self.eat_while(|c| matches!(c, '=' | '!' | '<' | '>'));
        let end = self.offset();
        let text = &self.input[start..end];
        match Operator::parse(text) {
            Some(op) => TokenKind::Op(op),
            None => TokenKind::Error(format!("invalid operator '{text}'")),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = token.is_eof();
        Some(token)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
