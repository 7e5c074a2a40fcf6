//! Syntax errors raised while lexing or parsing a statement.

use thiserror::Error;

/// Byte range `start..end` of the statement text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// An empty span at byte `pos`, used when the input ends early.
    pub fn at(pos: usize) -> Self {
        Self::new(pos, pos)
    }
}

/// A statement that does not lex or parse.
///
/// Statements are rejected whole; parsing never resumes after an error.
/// The position shown by `Display` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {}", .span.start + 1)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn unexpected_token(expected: &str, found: &str, span: Span) -> Self {
        Self::new(format!("expected {expected}, found {found}"), span)
    }

    pub fn unexpected_eof(expected: &str, pos: usize) -> Self {
        let message = format!("unexpected end of input, expected {expected}");
        Self::new(message, Span::at(pos))
    }

    /// 1-based position of the first offending byte.
    pub fn position(&self) -> usize {
        self.span.start + 1
    }
}
