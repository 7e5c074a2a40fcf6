//! Loading a `DbConfig` from a serialized document.

use strata::{ConfigError, Database, DbConfig, DbError};

#[test]
fn test_partial_document_uses_defaults() {
    let json = r#"{ "block_size": 128, "max_blocks": 4 }"#;
    let config: DbConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.block_size, 128);
    assert_eq!(config.max_blocks, Some(4));
    assert_eq!(config.buffer_count, DbConfig::default().buffer_count);
    assert!(Database::new(config).is_ok());
}

#[test]
fn test_invalid_document_is_rejected_on_open() {
    let config: DbConfig = serde_json::from_str(r#"{ "sort_buffers": 1 }"#).unwrap();
    assert!(matches!(
        Database::new(config),
        Err(DbError::Config(ConfigError::TooFewSortBuffers(1)))
    ));
    assert!(serde_json::from_str::<DbConfig>(r#"{ "block_size": "big" }"#).is_err());
}

#[test]
fn test_block_budget_is_enforced() {
    let config = DbConfig::default().with_block_size(64).with_max_blocks(2);
    let db = Database::new(config).unwrap();
    let tx = db.new_tx();
    db.execute_update(&tx, "create table t (a int)").unwrap();
    let mut result = Ok(0);
    for i in 0..100 {
        result = db.execute_update(&tx, &format!("insert into t (a) values ({i})"));
        if result.is_err() {
            break;
        }
    }
    assert!(matches!(result, Err(DbError::Execution(_))), "{result:?}");
}
