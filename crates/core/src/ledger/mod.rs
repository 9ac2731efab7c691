//! Ledger abstraction
//!
//! Contracts never own account balances. They reach the hosting ledger
//! through the [`Ledger`] trait, which lets the faucet logic run against the
//! in-memory dev ledger or against a test fake.

pub mod account;
pub mod code_storage;
pub mod logging;

use crate::error::LedgerResult;
use async_trait::async_trait;
use faucet_common::types::Address;
use num_bigint::BigUint;

pub use account::{AccountState, InMemoryLedger, SnapshotId};
pub use code_storage::CodeStorage;
pub use logging::{EventLog, LogManager};

/// Capabilities a contract needs from its host ledger
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance of `address` in wei; unknown accounts hold zero
    async fn balance_of(&self, address: &Address) -> LedgerResult<BigUint>;

    /// Move `amount` from `from` to `to`, failing without change when
    /// `from` cannot cover it
    async fn transfer(&self, from: &Address, to: &Address, amount: &BigUint) -> LedgerResult<()>;

    /// Append an event log
    async fn emit_event(&self, log: EventLog) -> LedgerResult<()>;
}
