//! Owner-gated faucet contract with an in-memory host ledger.
//!
//! - [`contract`]: faucet state, calldata dispatcher and the `FallbackCalled` event
//! - [`ledger`]: the [`ledger::Ledger`] trait and its in-memory implementation
//! - [`chain`]: dev chain executing transactions atomically
//! - [`client`]: typed faucet handle bound to a signer

pub mod abi;
pub mod chain;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod receipt;

// Re-export commonly used types
pub use chain::{CallRequest, DevAccount, DevChain};
pub use client::FaucetClient;
pub use config::{ChainConfig, FaucetSettings, SessionConfig};
pub use contract::{CallContext, FallbackCalled, Faucet, FaucetCall};
pub use error::{ClientError, ExecutionError, LedgerError, RevertReason};
pub use ledger::{InMemoryLedger, Ledger};
pub use receipt::{Receipt, ReceiptLog};
