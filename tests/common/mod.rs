//! Shared helpers for the integration tests.

#![allow(dead_code)]

use strata::tx::Transaction;
use strata::{Database, DbConfig, StatementResult};

/// A database with small blocks, so that modest tables span many blocks.
pub fn small_db() -> Database {
    let config = DbConfig::default().with_block_size(64);
    Database::new(config).unwrap()
}

/// Runs each update statement in order.
pub fn exec_all(db: &Database, tx: &Transaction, statements: &[&str]) {
    for sql in statements {
        db.execute_update(tx, sql)
            .unwrap_or_else(|e| panic!("{sql}: {e}"));
    }
}

/// Creates `table` with int `fields` and inserts `rows`.
pub fn int_table(db: &Database, tx: &Transaction, table: &str, fields: &[&str], rows: &[Vec<i32>]) {
    let columns: Vec<String> = fields.iter().map(|f| format!("{f} int")).collect();
    db.execute_update(tx, &format!("create table {table} ({})", columns.join(", ")))
        .unwrap();
    for row in rows {
        let values: Vec<String> = row.iter().map(i32::to_string).collect();
        let sql = format!(
            "insert into {table} ({}) values ({})",
            fields.join(", "),
            values.join(", ")
        );
        db.execute_update(tx, &sql).unwrap();
    }
}

/// Runs a select and collects the int values of `fields` per row.
pub fn query_ints(db: &Database, tx: &Transaction, sql: &str, fields: &[&str]) -> Vec<Vec<i32>> {
    let result = db
        .execute(tx, sql)
        .unwrap_or_else(|e| panic!("{sql}: {e}"));
    let StatementResult::Query { mut scan, .. } = result else {
        panic!("{sql}: expected a query result");
    };
    let mut rows = Vec::new();
    while scan.next().unwrap() {
        rows.push(fields.iter().map(|f| scan.get_int(f).unwrap()).collect());
    }
    scan.close();
    rows
}

/// Like [`query_ints`], sorted so that row order does not matter.
pub fn query_sorted(db: &Database, tx: &Transaction, sql: &str, fields: &[&str]) -> Vec<Vec<i32>> {
    let mut rows = query_ints(db, tx, sql, fields);
    rows.sort();
    rows
}
