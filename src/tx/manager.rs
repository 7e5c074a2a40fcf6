//! Transaction manager.
//!
//! Allocates transaction ids and tracks whether each transaction is still in
//! progress, committed or rolled back.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use super::error::TxError;

/// Transaction ID. Allocated sequentially starting from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxId(u64);

impl TxId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    InProgress,
    Committed,
    RolledBack,
}

/// Transaction manager.
///
/// Shared by every transaction of one database; the same manager also hands
/// out the sequence numbers behind temporary table names so that names stay
/// unique across transactions.
pub struct TransactionManager {
    next_txid: Mutex<u64>,
    next_temp: Mutex<u64>,
    tx_states: Mutex<HashMap<TxId, TxState>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self {
            next_txid: Mutex::new(1),
            next_temp: Mutex::new(0),
            tx_states: Mutex::new(HashMap::new()),
        }
    }

    /// Allocates a new TxId and marks it as in progress.
    pub fn begin(&self) -> TxId {
        let txid = {
            let mut next = self.next_txid.lock();
            let txid = TxId::new(*next);
            *next += 1;
            txid
        };
        self.tx_states.lock().insert(txid, TxState::InProgress);
        txid
    }

    pub fn commit(&self, txid: TxId) -> Result<(), TxError> {
        self.complete(txid, TxState::Committed)
    }

    pub fn rollback(&self, txid: TxId) -> Result<(), TxError> {
        self.complete(txid, TxState::RolledBack)
    }

    fn complete(&self, txid: TxId, new_state: TxState) -> Result<(), TxError> {
        let mut tx_states = self.tx_states.lock();
        match tx_states.get(&txid).copied() {
            Some(TxState::InProgress) => {
                tx_states.insert(txid, new_state);
                Ok(())
            }
            Some(current) => Err(TxError::InvalidStateTransition {
                txid,
                current,
                attempted: new_state,
            }),
            None => Err(TxError::TransactionNotFound(txid)),
        }
    }

    pub fn state(&self, txid: TxId) -> Option<TxState> {
        self.tx_states.lock().get(&txid).copied()
    }

    /// Returns a fresh, never reused temporary table name.
    pub fn next_temp_name(&self) -> String {
        let mut next = self.next_temp.lock();
        *next += 1;
        format!("temp{}", *next)
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
