//! Transactions.
//!
//! A [`Transaction`] is the unit of work every plan is opened under. It hands
//! out the storage handle, the buffer budget that sizes hash partitions and
//! sort runs, and unique names for temporary tables. The engine does not log
//! or lock; commit and rollback only demarcate the unit of work.

pub mod error;
pub mod manager;
pub mod transaction;

pub use error::TxError;
pub use manager::{TransactionManager, TxId, TxState};
pub use transaction::Transaction;
