//! End-to-end SQL through `Database`.

mod common;

use strata::query::ExecError;
use strata::tx::Transaction;
use strata::{Database, DbConfig, DbError, StatementResult};

use common::{exec_all, int_table, query_ints, query_sorted, small_db};

fn scenario_db() -> (Database, Transaction) {
    let db = small_db();
    let tx = db.new_tx();
    int_table(&db, &tx, "a", &["x"], &[vec![1], vec![2], vec![2], vec![3]]);
    int_table(&db, &tx, "b", &["y"], &[vec![2], vec![2], vec![3], vec![4]]);
    (db, tx)
}

fn query_strings(db: &Database, tx: &Transaction, sql: &str, field: &str) -> Vec<String> {
    let StatementResult::Query { mut scan, .. } = db.execute(tx, sql).unwrap() else {
        panic!("{sql}: expected a query result");
    };
    let mut values = Vec::new();
    while scan.next().unwrap() {
        values.push(scan.get_string(field).unwrap());
    }
    values
}

#[test]
fn test_equijoin_with_duplicates() {
    let (db, tx) = scenario_db();
    let rows = query_sorted(&db, &tx, "select x, y from a, b where x = y", &["x", "y"]);
    assert_eq!(
        rows,
        vec![vec![2, 2], vec![2, 2], vec![2, 2], vec![2, 2], vec![3, 3]]
    );
}

#[test]
fn test_select_with_order() {
    let (db, tx) = scenario_db();
    let rows = query_ints(&db, &tx, "select x from a where x = 2 order by x", &["x"]);
    assert_eq!(rows, vec![vec![2], vec![2]]);

    let rows = query_ints(&db, &tx, "select y from b order by y desc", &["y"]);
    assert_eq!(rows, vec![vec![4], vec![3], vec![2], vec![2]]);
}

#[test]
fn test_distinct() {
    let (db, tx) = scenario_db();
    let rows = query_sorted(&db, &tx, "select distinct x from a", &["x"]);
    assert_eq!(rows, vec![vec![1], vec![2], vec![3]]);
}

#[test]
fn test_create_index_syntax() {
    let (db, tx) = scenario_db();
    assert_eq!(
        db.execute_update(&tx, "create index ax on a(x) using hash")
            .unwrap(),
        0
    );
    let err = db
        .execute_update(&tx, "create index ay on a(x) using xyz")
        .unwrap_err();
    assert!(matches!(err, DbError::Syntax(_)), "{err}");
    assert_eq!(db.catalog().indexes_of("a").len(), 1);
}

#[test]
fn test_aggregates() {
    let db = small_db();
    let tx = db.new_tx();
    let rows: Vec<Vec<i32>> = (1..=9).map(|v| vec![v % 3, v]).collect();
    int_table(&db, &tx, "t", &["g", "v"], &rows);

    let fields = ["g", "countofv", "sumofv", "avgofv", "maxofv", "minofv"];
    let sql = "select g, count(v), sum(v), avg(v), max(v), min(v) from t group by g order by g";
    assert_eq!(
        query_ints(&db, &tx, sql, &fields),
        vec![
            vec![0, 3, 18, 6, 9, 3],
            vec![1, 3, 12, 4, 7, 1],
            vec![2, 3, 15, 5, 8, 2],
        ]
    );

    let rows = query_ints(&db, &tx, "select count(v), max(g) from t", &["countofv", "maxofg"]);
    assert_eq!(rows, vec![vec![9, 2]]);

    let rows = query_ints(&db, &tx, "select count(v) from t where v > 100", &["countofv"]);
    assert!(rows.is_empty());
}

#[test]
fn test_strings_and_negative_literals() {
    let db = small_db();
    let tx = db.new_tx();
    exec_all(
        &db,
        &tx,
        &[
            "create table p (id int, name varchar(6))",
            "insert into p (id, name) values (-2, 'ann')",
            "insert into p (id, name) values (5, 'bob')",
            "insert into p (name, id) values ('cy', 0)",
        ],
    );
    assert_eq!(
        query_strings(&db, &tx, "select name from p where id < 1 order by name", "name"),
        vec!["ann".to_string(), "cy".to_string()]
    );
    assert_eq!(
        query_ints(&db, &tx, "select id from p where name = 'bob'", &["id"]),
        vec![vec![5]]
    );

    let err = db
        .execute_update(&tx, "insert into p (id, name) values (1, 'toolong')")
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Execution(ExecError::ValueTooLong { max: 6, .. })
    ));
    assert_eq!(query_ints(&db, &tx, "select id from p", &["id"]).len(), 3);
}

fn type_mismatch_on_next(db: &Database, tx: &Transaction, sql: &str) -> bool {
    let StatementResult::Query { mut scan, .. } = db.execute(tx, sql).unwrap() else {
        panic!("{sql}: expected a query result");
    };
    matches!(scan.next(), Err(ExecError::TypeMismatch { .. }))
}

#[test]
fn test_comparing_int_with_string_fails() {
    let sql = "select x from a where x = 'two'";
    let (db, tx) = scenario_db();
    assert!(type_mismatch_on_next(&db, &tx, sql));

    for kind in ["hash", "btree"] {
        let (db, tx) = scenario_db();
        let ddl = format!("create index ax on a(x) using {kind}");
        exec_all(&db, &tx, &[ddl.as_str()]);
        let explain = db.query_plan(&tx, sql).unwrap().explain();
        assert!(explain.contains("IndexSelect"), "{explain}");
        assert!(type_mismatch_on_next(&db, &tx, sql), "{kind}");
    }
}

#[test]
fn test_updates_keep_index_in_step() {
    let db = Database::new(DbConfig::default()).unwrap();
    let tx = db.new_tx();
    int_table(
        &db,
        &tx,
        "emp",
        &["id", "dept"],
        &(0..30).map(|i| vec![i, i % 5]).collect::<Vec<_>>(),
    );
    exec_all(&db, &tx, &["create index emp_dept on emp(dept) using btree"]);

    let sql = "select id from emp where dept = 3";
    let plan = db.query_plan(&tx, sql).unwrap();
    assert!(plan.explain().contains("IndexSelect"), "{}", plan.explain());
    assert_eq!(query_ints(&db, &tx, sql, &["id"]).len(), 6);

    assert_eq!(
        db.execute_update(&tx, "update emp set dept = 3 where id < 5")
            .unwrap(),
        5
    );
    // Ids 0, 1, 2 and 4 moved into department 3; id 3 was already there.
    assert_eq!(query_ints(&db, &tx, sql, &["id"]).len(), 10);

    assert_eq!(
        db.execute_update(&tx, "delete from emp where dept = 3")
            .unwrap(),
        10
    );
    assert!(query_ints(&db, &tx, sql, &["id"]).is_empty());
    assert_eq!(query_ints(&db, &tx, "select id from emp", &["id"]).len(), 20);
}

#[test]
fn test_views() {
    let (db, tx) = scenario_db();
    exec_all(
        &db,
        &tx,
        &[
            "create view matches as select x, y from a, b where x = y",
            "create view threes as select x from matches where x = 3",
        ],
    );
    assert_eq!(
        query_sorted(&db, &tx, "select x from matches", &["x"]),
        vec![vec![2], vec![2], vec![2], vec![2], vec![3]]
    );
    assert_eq!(
        query_ints(&db, &tx, "select x from threes", &["x"]),
        vec![vec![3]]
    );
    let err = db
        .execute_update(&tx, "create view matches as select x from a")
        .unwrap_err();
    assert!(matches!(err, DbError::Execution(ExecError::Catalog(_))));
}

#[test]
fn test_errors_leave_data_unchanged() {
    let (db, tx) = scenario_db();
    for sql in [
        "select x from a, b where x = z",
        "select z from a",
        "delete from a where z = 1",
        "insert into a (x, y) values (1)",
        "insert into missing (x) values (1)",
        "select x frm a",
    ] {
        assert!(db.execute(&tx, sql).is_err(), "{sql}");
    }
    assert_eq!(query_ints(&db, &tx, "select x from a", &["x"]).len(), 4);
}
