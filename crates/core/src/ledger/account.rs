use super::code_storage::CodeStorage;
use super::logging::{EventLog, LogManager};
use super::Ledger;
use crate::error::{LedgerError, LedgerResult};
use async_trait::async_trait;
use faucet_common::types::{Address, Hash};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Account state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountState {
    /// Balance in wei
    pub balance: BigUint,

    /// Transaction count
    pub nonce: u64,
}

/// Identifier returned by [`InMemoryLedger::snapshot`]
pub type SnapshotId = u64;

/// Point-in-time copy of the ledger used to undo a reverted transaction
#[derive(Debug, Clone)]
struct LedgerSnapshot {
    accounts: HashMap<Address, AccountState>,
    code_bindings: HashMap<Address, Hash>,
    log_count: usize,
}

/// In-memory ledger
///
/// Holds balances and nonces, contract code and the event log. Snapshots
/// cover all three so a failed transaction can be undone exactly.
pub struct InMemoryLedger {
    accounts: Arc<RwLock<HashMap<Address, AccountState>>>,
    code: CodeStorage,
    logs: LogManager,
    snapshots: Arc<RwLock<HashMap<SnapshotId, LedgerSnapshot>>>,
    next_snapshot: Arc<RwLock<SnapshotId>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            code: CodeStorage::new(),
            logs: LogManager::new(),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            next_snapshot: Arc::new(RwLock::new(1)),
        }
    }

    /// Mint `amount` into `address` (genesis allocation)
    pub async fn credit(&self, address: &Address, amount: &BigUint) {
        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(*address).or_default();
        account.balance += amount;
        debug!("Credited {} wei to {}", amount, address);
    }

    pub async fn get_account(&self, address: &Address) -> Option<AccountState> {
        self.accounts.read().await.get(address).cloned()
    }

    pub async fn get_nonce(&self, address: &Address) -> u64 {
        self.accounts
            .read()
            .await
            .get(address)
            .map(|a| a.nonce)
            .unwrap_or(0)
    }

    /// Bump the nonce and return the value it had before
    pub async fn increment_nonce(&self, address: &Address) -> u64 {
        let mut accounts = self.accounts.write().await;
        let account = accounts.entry(*address).or_default();
        let previous = account.nonce;
        account.nonce += 1;
        previous
    }

    /// Delete an account outright (self-destruct)
    pub async fn delete_account(&self, address: &Address) {
        if self.accounts.write().await.remove(address).is_some() {
            debug!("Account deleted: {}", address);
        }
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub fn code(&self) -> &CodeStorage {
        &self.code
    }

    pub fn logs(&self) -> &LogManager {
        &self.logs
    }

    /// Capture balances, nonces, code bindings and the log length
    pub async fn snapshot(&self) -> SnapshotId {
        let snapshot = LedgerSnapshot {
            accounts: self.accounts.read().await.clone(),
            code_bindings: self.code.bindings().await,
            log_count: self.logs.log_count().await,
        };

        let mut next = self.next_snapshot.write().await;
        let id = *next;
        *next += 1;
        drop(next);

        self.snapshots.write().await.insert(id, snapshot);
        debug!("Created ledger snapshot {}", id);
        id
    }

    /// Restore the state captured by `id` and consume the snapshot
    pub async fn revert_to(&self, id: SnapshotId) -> LedgerResult<()> {
        let snapshot = self
            .snapshots
            .write()
            .await
            .remove(&id)
            .ok_or(LedgerError::SnapshotNotFound(id))?;

        *self.accounts.write().await = snapshot.accounts;
        self.code.restore_bindings(snapshot.code_bindings).await;
        self.logs.truncate(snapshot.log_count).await;

        warn!("Reverted ledger to snapshot {}", id);
        Ok(())
    }

    /// Keep the current state and discard snapshot `id`
    pub async fn commit(&self, id: SnapshotId) -> LedgerResult<()> {
        self.snapshots
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(LedgerError::SnapshotNotFound(id))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance_of(&self, address: &Address) -> LedgerResult<BigUint> {
        Ok(self
            .accounts
            .read()
            .await
            .get(address)
            .map(|a| a.balance.clone())
            .unwrap_or_else(BigUint::zero))
    }

    async fn transfer(&self, from: &Address, to: &Address, amount: &BigUint) -> LedgerResult<()> {
        let mut accounts = self.accounts.write().await;

        let available = accounts
            .get(from)
            .map(|a| a.balance.clone())
            .unwrap_or_else(BigUint::zero);
        if &available < amount {
            return Err(LedgerError::InsufficientFunds {
                address: *from,
                requested: amount.clone(),
                available,
            });
        }
        if amount.is_zero() || from == to {
            return Ok(());
        }

        accounts.entry(*from).or_default().balance -= amount;
        accounts.entry(*to).or_default().balance += amount;

        debug!("Transferred {} wei from {} to {}", amount, from, to);
        Ok(())
    }

    async fn emit_event(&self, log: EventLog) -> LedgerResult<()> {
        self.logs.emit(log).await.map(|_| ())
    }
}
