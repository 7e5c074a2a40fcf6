//! Transaction handle.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::error::TxError;
use super::manager::{TransactionManager, TxId, TxState};
use crate::config::DbConfig;
use crate::storage::MemoryStorage;

/// A handle on one unit of work.
///
/// Cloning is cheap; clones refer to the same transaction. Plans are opened
/// against a transaction, and every temporary table they create is named
/// through it.
#[derive(Clone)]
pub struct Transaction {
    txid: TxId,
    manager: Arc<TransactionManager>,
    storage: Arc<MemoryStorage>,
    config: Arc<DbConfig>,
}

impl Transaction {
    /// Begins a new transaction.
    pub fn begin(
        manager: Arc<TransactionManager>,
        storage: Arc<MemoryStorage>,
        config: Arc<DbConfig>,
    ) -> Self {
        let txid = manager.begin();
        debug!(txid = %txid, "begin transaction");
        Self {
            txid,
            manager,
            storage,
            config,
        }
    }

    pub fn id(&self) -> TxId {
        self.txid
    }

    pub fn storage(&self) -> &Arc<MemoryStorage> {
        &self.storage
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn block_size(&self) -> usize {
        self.storage.block_size()
    }

    /// Number of buffers this transaction may pin at once.
    pub fn available_buffs(&self) -> usize {
        self.config.buffer_count
    }

    /// Returns a table name that no other table or temporary table uses.
    pub fn next_temp_name(&self) -> String {
        self.manager.next_temp_name()
    }

    pub fn state(&self) -> Option<TxState> {
        self.manager.state(self.txid)
    }

    pub fn is_active(&self) -> bool {
        self.state() == Some(TxState::InProgress)
    }

    pub fn commit(&self) -> Result<(), TxError> {
        self.manager.commit(self.txid)?;
        debug!(txid = %self.txid, "commit");
        Ok(())
    }

    /// Ends the transaction as rolled back.
    ///
    /// The in-memory store keeps no undo log, so writes already applied stay
    /// in place.
    pub fn rollback(&self) -> Result<(), TxError> {
        self.manager.rollback(self.txid)?;
        debug!(txid = %self.txid, "rollback");
        Ok(())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("txid", &self.txid)
            .field("state", &self.state())
            .finish()
    }
}
