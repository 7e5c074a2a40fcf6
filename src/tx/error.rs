//! Transaction error types.

use thiserror::Error;

use super::manager::{TxId, TxState};

/// Errors that can occur during transaction operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxError {
    /// Transaction not found in the transaction manager.
    #[error("transaction {0} not found")]
    TransactionNotFound(TxId),

    /// Invalid transaction state transition.
    #[error("invalid state transition for transaction {txid}: {current:?} -> {attempted:?}")]
    InvalidStateTransition {
        txid: TxId,
        current: TxState,
        attempted: TxState,
    },
}
