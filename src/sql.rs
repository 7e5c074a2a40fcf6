//! SQL parsing module.
//!
//! A handwritten lexer and recursive descent parser that turn SQL text into
//! statement descriptors ([`Statement`], [`QueryData`], ...).

mod ast;
mod error;
mod lexer;
mod parser;
mod token;

pub use ast::*;
pub use error::{Span, SyntaxError};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Keyword, Token, TokenKind};
