//! Error types for ledger access, ABI decoding and contract execution.
//!
//! Every failure during a transaction ends the same way for the caller: the
//! call is reverted. The variants below only exist so the host can report
//! *why* it reverted.

use faucet_common::types::{Address, Hash};
use num_bigint::BigUint;
use thiserror::Error;

/// Ledger-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Sender cannot cover the requested transfer
    #[error("Insufficient funds in {address}: requested {requested}, available {available}")]
    InsufficientFunds {
        address: Address,
        requested: BigUint,
        available: BigUint,
    },

    /// Event log has too many topics
    #[error("Event log cannot have more than 4 topics, got {0}")]
    TooManyTopics(usize),

    /// Snapshot id is unknown or already consumed
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(u64),
}

/// ABI decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Data too short: need {needed} bytes at offset {offset}, have {available}")]
    DataTooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Value does not fit in uint256")]
    Overflow,

    #[error("Invalid ABI data: {0}")]
    Invalid(String),
}

/// Why a contract call reverted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// Privileged operation called by someone other than the owner
    #[error("caller {caller} is not the owner {owner}")]
    Unauthorized { caller: Address, owner: Address },

    /// Withdrawal larger than the contract balance
    #[error("withdraw amount {requested} exceeds balance {available}")]
    InsufficientBalance {
        requested: BigUint,
        available: BigUint,
    },

    /// Value attached to a function that does not accept it
    #[error("function {0} is not payable")]
    NonPayable(&'static str),

    /// Calldata matched a selector but its arguments could not be decoded
    #[error("invalid calldata: {0}")]
    InvalidCalldata(#[from] AbiError),

    /// The faucet has self-destructed
    #[error("contract {0} has been destroyed")]
    ContractDestroyed(Address),

    /// Calldata sent to an address with no code
    #[error("no contract deployed at {0}")]
    ContractNotFound(Address),

    /// Sender cannot pay the value attached to the call
    #[error("sender {address} cannot cover value {requested} (balance {available})")]
    InsufficientFunds {
        address: Address,
        requested: BigUint,
        available: BigUint,
    },
}

/// Execution errors surfaced while running a contract operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// Contract reverted
    #[error("Contract reverted: {0}")]
    Revert(#[from] RevertReason),

    /// Ledger refused an operation
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for ExecutionError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                address,
                requested,
                available,
            } => ExecutionError::Revert(RevertReason::InsufficientFunds {
                address,
                requested,
                available,
            }),
            other => ExecutionError::Ledger(other),
        }
    }
}

impl From<AbiError> for ExecutionError {
    fn from(err: AbiError) -> Self {
        ExecutionError::Revert(RevertReason::InvalidCalldata(err))
    }
}

impl ExecutionError {
    /// Revert reason, if this error is a contract revert
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            ExecutionError::Revert(reason) => Some(reason),
            ExecutionError::Ledger(_) => None,
        }
    }
}

/// Failures seen by a client of the dev chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transaction was mined but reverted
    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: Hash, reason: String },

    /// Read-only call failed
    #[error("Call failed: {0}")]
    Call(#[from] ExecutionError),

    /// Return data could not be decoded
    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
pub type AbiResult<T> = Result<T, AbiError>;
pub type ExecutionResult<T> = Result<T, ExecutionError>;
pub type ClientResult<T> = Result<T, ClientError>;
