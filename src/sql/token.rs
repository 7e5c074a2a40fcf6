//! SQL token types.
//!
//! The lexer produces [`Token`]s carrying a [`TokenKind`] and the byte span
//! they came from. Keywords and identifiers are case-folded.

use super::error::Span;
use crate::catalog::IndexKind;
use crate::query::Operator;

/// A SQL token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an end-of-file token.
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// The kind of a SQL token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Integer literal (e.g., 42, -7).
    Integer(i32),
    /// String literal (e.g., 'hello').
    String(String),

    /// Identifier, lowercased (e.g., my_table).
    Identifier(String),
    Keyword(Keyword),
    /// `hash` or `btree`.
    IndexType(IndexKind),

    /// Comparison operator built from a run of `=`, `!`, `<`, `>`.
    Op(Operator),

    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,

    /// A lexical error; the parser rejects the statement when it sees one.
    Error(String),

    /// End of file/input.
    Eof,
}

impl TokenKind {
    /// Returns the display name for error messages.
    pub fn display_name(&self) -> String {
        match self {
            TokenKind::Integer(n) => format!("integer '{n}'"),
            TokenKind::String(s) => format!("string '{s}'"),
            TokenKind::Identifier(s) => format!("identifier '{s}'"),
            TokenKind::Keyword(kw) => format!("keyword '{}'", kw.as_str()),
            TokenKind::IndexType(kind) => format!("index type '{kind}'"),
            TokenKind::Op(op) => format!("'{op}'"),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Error(msg) => msg.clone(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

/// SQL keywords.
///
/// Keywords are case-insensitive; the lexer lowercases words before
/// matching them against this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // DML
    Select,
    Distinct,
    From,
    Where,
    And,
    Insert,
    Into,
    Values,
    Delete,
    Update,
    Set,

    // SELECT clauses
    Group,
    Order,
    By,
    Asc,
    Desc,

    // DDL
    Create,
    Table,
    Int,
    Varchar,
    View,
    As,
    Index,
    On,
    Using,
}

impl Keyword {
    /// Returns the string representation of this keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Select => "select",
            Keyword::Distinct => "distinct",
            Keyword::From => "from",
            Keyword::Where => "where",
            Keyword::And => "and",
            Keyword::Insert => "insert",
            Keyword::Into => "into",
            Keyword::Values => "values",
            Keyword::Delete => "delete",
            Keyword::Update => "update",
            Keyword::Set => "set",
            Keyword::Group => "group",
            Keyword::Order => "order",
            Keyword::By => "by",
            Keyword::Asc => "asc",
            Keyword::Desc => "desc",
            Keyword::Create => "create",
            Keyword::Table => "table",
            Keyword::Int => "int",
            Keyword::Varchar => "varchar",
            Keyword::View => "view",
            Keyword::As => "as",
            Keyword::Index => "index",
            Keyword::On => "on",
            Keyword::Using => "using",
        }
    }

    /// Attempts to parse a keyword from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Some(Keyword::Select),
            "distinct" => Some(Keyword::Distinct),
            "from" => Some(Keyword::From),
            "where" => Some(Keyword::Where),
            "and" => Some(Keyword::And),
            "insert" => Some(Keyword::Insert),
            "into" => Some(Keyword::Into),
            "values" => Some(Keyword::Values),
            "delete" => Some(Keyword::Delete),
            "update" => Some(Keyword::Update),
            "set" => Some(Keyword::Set),
            "group" => Some(Keyword::Group),
            "order" => Some(Keyword::Order),
            "by" => Some(Keyword::By),
            "asc" => Some(Keyword::Asc),
            "desc" => Some(Keyword::Desc),
            "create" => Some(Keyword::Create),
            "table" => Some(Keyword::Table),
            "int" => Some(Keyword::Int),
            "varchar" => Some(Keyword::Varchar),
            "view" => Some(Keyword::View),
            "as" => Some(Keyword::As),
            "index" => Some(Keyword::Index),
            "on" => Some(Keyword::On),
            "using" => Some(Keyword::Using),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::parse("SELECT"), Some(Keyword::Select));
        assert_eq!(Keyword::parse("select"), Some(Keyword::Select));
        assert_eq!(Keyword::parse("SeLeCt"), Some(Keyword::Select));
        assert_eq!(Keyword::parse("hash"), None);
        assert_eq!(Keyword::parse("unknown"), None);
    }

    #[test]
    fn test_keyword_roundtrip() {
        let keywords = [
            Keyword::Select,
            Keyword::Insert,
            Keyword::Update,
            Keyword::Delete,
            Keyword::Create,
            Keyword::Using,
        ];
        for kw in keywords {
            assert_eq!(Keyword::parse(kw.as_str()), Some(kw));
        }
    }

    #[test]
    fn test_token_display_name() {
        assert_eq!(
            TokenKind::Keyword(Keyword::Select).display_name(),
            "keyword 'select'"
        );
        assert_eq!(
            TokenKind::Identifier("foo".to_string()).display_name(),
            "identifier 'foo'"
        );
        assert_eq!(TokenKind::Integer(42).display_name(), "integer '42'");
        assert_eq!(TokenKind::Op(Operator::LtEq).display_name(), "'<='");
        assert_eq!(
            TokenKind::IndexType(IndexKind::BTree).display_name(),
            "index type 'btree'"
        );
        assert_eq!(TokenKind::Eof.display_name(), "end of input");
    }
}
