//! SQL parser using recursive descent.
//!
//! The [`Parser`] converts a stream of tokens into a [`Statement`]. Each
//! grammar rule is one method; a failure anywhere rejects the whole
//! statement.
//!
//! ```text
//! query      := SELECT [DISTINCT] item {, item} FROM id {, id}
//!               [WHERE predicate] [GROUP BY id {, id}] [ORDER BY sort {, sort}]
//! item       := id | aggfn ( id )
//! sort       := id [ASC | DESC]
//! predicate  := term {AND term}
//! term       := expression op expression
//! expression := id | constant
//! insert     := INSERT INTO id ( id {, id} ) VALUES ( constant {, constant} )
//! delete     := DELETE FROM id [WHERE predicate]
//! update     := UPDATE id SET id = expression [WHERE predicate]
//! create     := CREATE TABLE id ( id type {, id type} )
//!             | CREATE VIEW id AS query
//!             | CREATE INDEX id ON id ( id ) USING (HASH | BTREE)
//! type       := INT | VARCHAR ( integer )
//! ```

use super::ast::*;
use super::error::{Span, SyntaxError};
use super::lexer::Lexer;
use super::token::{Keyword, Token, TokenKind};
use crate::catalog::IndexKind;
use crate::query::{
    AggregateKind, AggregateSpec, Constant, Expression, Operator, Predicate, SortField, Term,
};
use crate::record::Schema;

/// SQL parser that converts tokens into statement descriptors.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: Lexer::new(input).collect(),
            pos: 0,
            input,
        }
    }

    /// Parses the input and returns a statement.
    ///
    /// Returns `Ok(None)` for empty input (whitespace/comments only),
    /// `Ok(Some(stmt))` for a valid statement.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the input is not a valid statement.
    pub fn parse(&mut self) -> Result<Option<Statement>, SyntaxError> {
        self.check_lexical_errors()?;
        if self.is_eof() {
            return Ok(None);
        }

        let stmt = self.parse_statement()?;
        self.finish()?;
        Ok(Some(stmt))
    }

    /// Parses input that must consist of exactly one select statement,
    /// such as a stored view definition.
    pub fn parse_query(&mut self) -> Result<QueryData, SyntaxError> {
        self.check_lexical_errors()?;
        let query = self.parse_query_data()?;
        self.finish()?;
        Ok(query)
    }

    fn check_lexical_errors(&self) -> Result<(), SyntaxError> {
        for token in &self.tokens {
            if let TokenKind::Error(message) = &token.kind {
                return Err(SyntaxError::new(message.clone(), token.span));
            }
        }
        Ok(())
    }

    /// Accepts an optional trailing semicolon, then requires end of input.
    fn finish(&mut self) -> Result<(), SyntaxError> {
        self.consume_token(TokenKind::Semicolon);
        if !self.is_eof() {
            return Err(SyntaxError::unexpected_token(
                "end of input",
                &self.current_token_name(),
                self.current_span(),
            ));
        }
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        if self.check_keyword(Keyword::Select) {
            let query = self.parse_query_data()?;
            return Ok(Statement::Query(Box::new(query)));
        }

        if self.consume_keyword(Keyword::Insert) {
            return self.parse_insert();
        }

        if self.consume_keyword(Keyword::Delete) {
            return self.parse_delete();
        }

        if self.consume_keyword(Keyword::Update) {
            return self.parse_modify();
        }

        if self.consume_keyword(Keyword::Create) {
            if self.consume_keyword(Keyword::Table) {
                return self.parse_create_table();
            }
            if self.consume_keyword(Keyword::View) {
                return self.parse_create_view();
            }
            if self.consume_keyword(Keyword::Index) {
                return self.parse_create_index();
            }
            return Err(SyntaxError::unexpected_token(
                "TABLE, VIEW or INDEX",
                &self.current_token_name(),
                self.current_span(),
            ));
        }

        Err(SyntaxError::unexpected_token(
            "statement",
            &self.current_token_name(),
            self.current_span(),
        ))
    }

    // ==================== Queries ====================

    fn parse_query_data(&mut self) -> Result<QueryData, SyntaxError> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.consume_keyword(Keyword::Distinct);

        let mut items = vec![self.parse_select_item()?];
        while self.consume_token(TokenKind::Comma) {
            items.push(self.parse_select_item()?);
        }

        self.expect_keyword(Keyword::From)?;
        let tables = self.parse_identifier_list()?;

        let pred = self.parse_where_clause()?;

        let mut group_by = Vec::new();
        if self.consume_keyword(Keyword::Group) {
            self.expect_keyword(Keyword::By)?;
            group_by = self.parse_identifier_list()?;
        }

        let mut order_by = Vec::new();
        if self.consume_keyword(Keyword::Order) {
            self.expect_keyword(Keyword::By)?;
            order_by.push(self.parse_sort_field()?);
            while self.consume_token(TokenKind::Comma) {
                order_by.push(self.parse_sort_field()?);
            }
        }

        Ok(QueryData {
            distinct,
            items,
            tables,
            pred,
            group_by,
            order_by,
        })
    }

    /// A field name, or an aggregate when the name is followed by `(`.
    fn parse_select_item(&mut self) -> Result<SelectItem, SyntaxError> {
        let span = self.current_span();
        let name = self.expect_identifier()?;
        if !self.consume_token(TokenKind::LParen) {
            return Ok(SelectItem::Field(name));
        }

        let kind = AggregateKind::from_name(&name).ok_or_else(|| {
            SyntaxError::new(format!("unknown aggregate function '{name}'"), span)
        })?;
        let field = self.expect_identifier()?;
        self.expect_token(TokenKind::RParen)?;
        Ok(SelectItem::Aggregate(AggregateSpec::new(kind, field)))
    }

    fn parse_sort_field(&mut self) -> Result<SortField, SyntaxError> {
        let field = self.expect_identifier()?;
        if self.consume_keyword(Keyword::Desc) {
            return Ok(SortField::desc(field));
        }
        self.consume_keyword(Keyword::Asc);
        Ok(SortField::asc(field))
    }

    // ==================== Predicates ====================

    fn parse_where_clause(&mut self) -> Result<Predicate, SyntaxError> {
        if self.consume_keyword(Keyword::Where) {
            self.parse_predicate()
        } else {
            Ok(Predicate::new())
        }
    }

    fn parse_predicate(&mut self) -> Result<Predicate, SyntaxError> {
        let mut pred = Predicate::from(self.parse_term()?);
        while self.consume_keyword(Keyword::And) {
            pred.push(self.parse_term()?);
        }
        Ok(pred)
    }

    fn parse_term(&mut self) -> Result<Term, SyntaxError> {
        let lhs = self.parse_expression()?;
        let op = self.expect_operator()?;
        let rhs = self.parse_expression()?;
        Ok(Term::new(lhs, op, rhs))
    }

    fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
        if let Some(name) = self.peek_identifier() {
            self.advance();
            return Ok(Expression::Field(name));
        }
        match self.parse_constant() {
            Ok(c) => Ok(Expression::Constant(c)),
            Err(_) => Err(SyntaxError::unexpected_token(
                "field or constant",
                &self.current_token_name(),
                self.current_span(),
            )),
        }
    }

    fn parse_constant(&mut self) -> Result<Constant, SyntaxError> {
        let constant = match self.peek_kind() {
            Some(TokenKind::Integer(n)) => Constant::Int(*n),
            Some(TokenKind::String(s)) => Constant::Str(s.clone()),
            _ => {
                return Err(SyntaxError::unexpected_token(
                    "constant",
                    &self.current_token_name(),
                    self.current_span(),
                ))
            }
        };
        self.advance();
        Ok(constant)
    }

    fn expect_operator(&mut self) -> Result<Operator, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Op(op)) => {
                let op = *op;
                self.advance();
                Ok(op)
            }
            _ => Err(SyntaxError::unexpected_token(
                "comparison operator",
                &self.current_token_name(),
                self.current_span(),
            )),
        }
    }

    // ==================== Updates ====================

    fn parse_insert(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::Into)?;
        let table = self.expect_identifier()?;

        self.expect_token(TokenKind::LParen)?;
        let fields = self.parse_identifier_list()?;
        self.expect_token(TokenKind::RParen)?;

        self.expect_keyword(Keyword::Values)?;
        self.expect_token(TokenKind::LParen)?;
        let mut values = vec![self.parse_constant()?];
        while self.consume_token(TokenKind::Comma) {
            values.push(self.parse_constant()?);
        }
        self.expect_token(TokenKind::RParen)?;

        Ok(Statement::Insert(InsertData {
            table,
            fields,
            values,
        }))
    }

    fn parse_delete(&mut self) -> Result<Statement, SyntaxError> {
        self.expect_keyword(Keyword::From)?;
        let table = self.expect_identifier()?;
        let pred = self.parse_where_clause()?;
        Ok(Statement::Delete(DeleteData { table, pred }))
    }

    fn parse_modify(&mut self) -> Result<Statement, SyntaxError> {
        let table = self.expect_identifier()?;
        self.expect_keyword(Keyword::Set)?;
        let field = self.expect_identifier()?;
        self.expect_token(TokenKind::Op(Operator::Eq))?;
        let new_value = self.parse_expression()?;
        let pred = self.parse_where_clause()?;
        Ok(Statement::Modify(ModifyData {
            table,
            field,
            new_value,
            pred,
        }))
    }

    // ==================== DDL ====================

    fn parse_create_table(&mut self) -> Result<Statement, SyntaxError> {
        let table = self.expect_identifier()?;
        self.expect_token(TokenKind::LParen)?;

        let mut schema = Schema::new();
        loop {
            let span = self.current_span();
            let field = self.expect_identifier()?;
            if schema.has_field(&field) {
                return Err(SyntaxError::new(
                    format!("duplicate field '{field}'"),
                    span,
                ));
            }
            self.parse_field_type(&mut schema, field)?;
            if !self.consume_token(TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(TokenKind::RParen)?;
        Ok(Statement::CreateTable(CreateTableData { table, schema }))
    }

    fn parse_field_type(&mut self, schema: &mut Schema, field: String) -> Result<(), SyntaxError> {
        if self.consume_keyword(Keyword::Int) {
            schema.add_int_field(field);
            return Ok(());
        }

        self.expect_keyword(Keyword::Varchar)?;
        self.expect_token(TokenKind::LParen)?;
        let span = self.current_span();
        let length = match self.parse_constant()? {
            Constant::Int(n) if n > 0 => n as usize,
            _ => return Err(SyntaxError::new("invalid varchar length", span)),
        };
        self.expect_token(TokenKind::RParen)?;
        schema.add_string_field(field, length);
        Ok(())
    }

    fn parse_create_view(&mut self) -> Result<Statement, SyntaxError> {
        let view = self.expect_identifier()?;
        self.expect_keyword(Keyword::As)?;
        let query = self.parse_query_data()?;
        Ok(Statement::CreateView(CreateViewData { view, query }))
    }

    fn parse_create_index(&mut self) -> Result<Statement, SyntaxError> {
        let index = self.expect_identifier()?;
        self.expect_keyword(Keyword::On)?;
        let table = self.expect_identifier()?;
        self.expect_token(TokenKind::LParen)?;
        let field = self.expect_identifier()?;
        self.expect_token(TokenKind::RParen)?;
        self.expect_keyword(Keyword::Using)?;
        let kind = self.expect_index_type()?;
        Ok(Statement::CreateIndex(CreateIndexData {
            index,
            table,
            field,
            kind,
        }))
    }

    fn expect_index_type(&mut self) -> Result<IndexKind, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::IndexType(kind)) => {
                let kind = *kind;
                self.advance();
                Ok(kind)
            }
            _ => Err(SyntaxError::unexpected_token(
                "index type 'hash' or 'btree'",
                &self.current_token_name(),
                self.current_span(),
            )),
        }
    }

    // ==================== Helper methods ====================

    fn is_eof(&self) -> bool {
        self.peek().is_none_or(|t| t.is_eof())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn current_span(&self) -> Span {
        self.peek().map_or(Span::at(self.input.len()), |t| t.span)
    }

    fn current_token_name(&self) -> String {
        self.peek()
            .map_or("end of input".to_string(), |t| t.kind.display_name())
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), Some(TokenKind::Keyword(k)) if *k == kw)
    }

    fn consume_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), SyntaxError> {
        if self.consume_keyword(kw) {
            Ok(())
        } else {
            Err(SyntaxError::unexpected_token(
                &format!("keyword '{}'", kw.as_str()),
                &self.current_token_name(),
                self.current_span(),
            ))
        }
    }

    fn consume_token(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == Some(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, kind: TokenKind) -> Result<(), SyntaxError> {
        if self.consume_token(kind.clone()) {
            Ok(())
        } else {
            Err(SyntaxError::unexpected_token(
                &kind.display_name(),
                &self.current_token_name(),
                self.current_span(),
            ))
        }
    }

    /// The current token as a name. Index type words double as identifiers
    /// outside `using`.
    fn peek_identifier(&self) -> Option<String> {
        match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => Some(name.clone()),
            Some(TokenKind::IndexType(kind)) => Some(kind.as_str().to_string()),
            _ => None,
        }
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        match self.peek_identifier() {
            Some(name) => {
                self.advance();
                Ok(name)
            }
            None => Err(SyntaxError::unexpected_token(
                "identifier",
                &self.current_token_name(),
                self.current_span(),
            )),
        }
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>, SyntaxError> {
        let mut names = vec![self.expect_identifier()?];
        while self.consume_token(TokenKind::Comma) {
            names.push(self.expect_identifier()?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldType;

    fn parse(sql: &str) -> Result<Statement, SyntaxError> {
        Parser::new(sql)
            .parse()
            .and_then(|opt| opt.ok_or_else(|| SyntaxError::new("empty query", Span::at(0))))
    }

    fn parse_query(sql: &str) -> QueryData {
        match parse(sql).unwrap() {
            Statement::Query(q) => *q,
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query() {
        assert!(Parser::new("").parse().unwrap().is_none());
        assert!(Parser::new("  \n\t  ").parse().unwrap().is_none());
        assert!(Parser::new("-- comment").parse().unwrap().is_none());
        assert!(Parser::new("-- one\n  -- two").parse().unwrap().is_none());
    }

    #[test]
    fn test_select_basic() {
        let q = parse_query("SELECT sname, gradyear FROM student");
        assert!(!q.distinct);
        assert_eq!(q.fields().collect::<Vec<_>>(), vec!["sname", "gradyear"]);
        assert_eq!(q.tables, vec!["student"]);
        assert!(q.pred.is_empty());
        assert!(q.group_by.is_empty());
        assert!(q.order_by.is_empty());
    }

    #[test]
    fn test_select_where() {
        let q = parse_query("select a from t, u where a = b and c >= 3 and d != 'x'");
        assert_eq!(q.tables, vec!["t", "u"]);
        assert_eq!(
            q.pred.terms(),
            &[
                Term::equality(Expression::field("a"), Expression::field("b")),
                Term::new(Expression::field("c"), Operator::GtEq, Expression::constant(3)),
                Term::new(
                    Expression::field("d"),
                    Operator::BangEq,
                    Expression::constant("x")
                ),
            ]
        );
    }

    #[test]
    fn test_select_distinct_group_order() {
        let q = parse_query(
            "select distinct dept, count(eid), avg(salary) from emp \
             group by dept order by dept desc, x",
        );
        assert!(q.distinct);
        assert_eq!(
            q.items,
            vec![
                SelectItem::Field("dept".to_string()),
                SelectItem::Aggregate(AggregateSpec::new(AggregateKind::Count, "eid")),
                SelectItem::Aggregate(AggregateSpec::new(AggregateKind::Avg, "salary")),
            ]
        );
        assert_eq!(q.group_by, vec!["dept"]);
        assert_eq!(q.order_by, vec![SortField::desc("dept"), SortField::asc("x")]);
    }

    #[test]
    fn test_unknown_aggregate() {
        let err = parse("select median(x) from t").unwrap_err();
        assert_eq!(err.message, "unknown aggregate function 'median'");
        assert_eq!(err.position(), 8);
    }

    #[test]
    fn test_query_text_reparses() {
        let sql = "select distinct a, max(b) from t, u where a = 'it''s' and b < -2 \
                   group by a order by a desc";
        let q = parse_query(sql);
        let again = Parser::new(&q.to_string()).parse_query().unwrap();
        assert_eq!(again, q);
    }

    #[test]
    fn test_insert() {
        let stmt = parse("insert into student (sid, sname) values (1, 'joe')").unwrap();
        assert_eq!(
            stmt,
            Statement::Insert(InsertData {
                table: "student".to_string(),
                fields: vec!["sid".to_string(), "sname".to_string()],
                values: vec![Constant::Int(1), Constant::from("joe")],
            })
        );
    }

    #[test]
    fn test_delete() {
        let stmt = parse("DELETE FROM student WHERE gradyear = 2020").unwrap();
        let Statement::Delete(d) = stmt else {
            panic!("expected DELETE");
        };
        assert_eq!(d.table, "student");
        assert_eq!(d.pred.terms().len(), 1);

        let Statement::Delete(d) = parse("delete from t").unwrap() else {
            panic!("expected DELETE");
        };
        assert!(d.pred.is_empty());
    }

    #[test]
    fn test_update() {
        let stmt = parse("update student set majorid = 20 where majorid = 30").unwrap();
        let Statement::Modify(m) = stmt else {
            panic!("expected UPDATE");
        };
        assert_eq!(m.table, "student");
        assert_eq!(m.field, "majorid");
        assert_eq!(m.new_value, Expression::constant(20));
        assert_eq!(m.pred.terms().len(), 1);
    }

    #[test]
    fn test_create_table() {
        let stmt = parse("create table student (sid int, sname varchar(10))").unwrap();
        let Statement::CreateTable(ct) = stmt else {
            panic!("expected CREATE TABLE");
        };
        assert_eq!(ct.table, "student");
        assert_eq!(ct.schema.fields(), &["sid".to_string(), "sname".to_string()]);
        assert_eq!(ct.schema.field_type("sname"), Some(FieldType::Varchar));
        assert_eq!(ct.schema.length("sname"), Some(10));

        assert!(parse("create table t (a int, a int)").is_err());
        assert!(parse("create table t (a varchar(0))").is_err());
        assert!(parse("create table t (a float)").is_err());
    }

    #[test]
    fn test_create_view() {
        let stmt = parse("create view v as select a from t where a = 1").unwrap();
        let Statement::CreateView(cv) = stmt else {
            panic!("expected CREATE VIEW");
        };
        assert_eq!(cv.view, "v");
        assert_eq!(cv.view_def(), "select a from t where a = 1");
    }

    #[test]
    fn test_create_index() {
        let stmt = parse("create index I on T(c) using hash").unwrap();
        assert_eq!(
            stmt,
            Statement::CreateIndex(CreateIndexData {
                index: "i".to_string(),
                table: "t".to_string(),
                field: "c".to_string(),
                kind: IndexKind::Hash,
            })
        );

        let Statement::CreateIndex(ci) = parse("create index i on t(c) using BTREE").unwrap()
        else {
            panic!("expected CREATE INDEX");
        };
        assert_eq!(ci.kind, IndexKind::BTree);

        let err = parse("create index i on t(c) using xyz").unwrap_err();
        assert_eq!(
            err.message,
            "expected index type 'hash' or 'btree', found identifier 'xyz'"
        );
        assert!(parse("create index i on t(c)").is_err());
    }

    #[test]
    fn test_index_type_words_as_names() {
        let q = parse_query("select hash from btree");
        assert_eq!(q.fields().collect::<Vec<_>>(), vec!["hash"]);
        assert_eq!(q.tables, vec!["btree"]);
    }

    #[test]
    fn test_trailing_semicolon() {
        assert!(parse("select a from t;").is_ok());
        assert!(parse("select a from t;;").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse("select from t").is_err());
        assert!(parse("select a t").is_err());
        assert!(parse("select a from t where a").is_err());
        assert!(parse("select a from t where a =< 1").is_err());
        assert!(parse("select a from t where a = 1 or b = 2").is_err());
        assert!(parse("drop table t").is_err());
        assert!(parse("select a from t where a = 'open").is_err());

        let err = parse("select a from t where a =< 1").unwrap_err();
        assert_eq!(err.message, "invalid operator '=<'");
        assert_eq!(err.span, Span::new(24, 26));
    }
}
