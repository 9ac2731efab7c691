//! Transaction receipts
//!
//! A receipt records the result of one transaction: status, return data,
//! emitted logs and, for deployments, the created contract address.

use crate::error::{ClientError, ClientResult};
use crate::ledger::EventLog;
use faucet_common::types::{Address, Hash};
use keccak_hash::keccak;
use num_bigint::BigUint;
use rlp::RlpStream;
use serde::{Deserialize, Serialize};

/// Transaction receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: Hash,

    /// Sender address
    pub from: Address,

    /// Recipient address (None for contract creation)
    pub to: Option<Address>,

    /// Sender nonce used by this transaction
    pub nonce: u64,

    /// Value attached to the transaction
    pub value: BigUint,

    /// Execution status (true = success, false = reverted)
    pub status: bool,

    /// Contract address created (for contract creation transactions)
    pub contract_address: Option<Address>,

    /// Logs emitted during execution; empty when reverted
    pub logs: Vec<ReceiptLog>,

    /// Transaction output data (return value)
    pub output: Vec<u8>,

    /// Revert reason (if failed)
    pub revert_reason: Option<String>,
}

/// Log entry in a receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReceiptLog {
    /// Log index in the transaction
    pub log_index: u64,

    /// Transaction hash
    pub tx_hash: Hash,

    /// Contract address that emitted the log
    pub address: Address,

    /// Log topics
    pub topics: Vec<Hash>,

    /// Log data
    pub data: Vec<u8>,
}

impl ReceiptLog {
    pub fn from_event(log: EventLog, log_index: u64, tx_hash: Hash) -> Self {
        Self {
            log_index,
            tx_hash,
            address: log.address,
            topics: log.topics,
            data: log.data,
        }
    }

    /// The event log this entry was built from
    pub fn to_event(&self) -> EventLog {
        EventLog::new(self.address, self.topics.clone(), self.data.clone())
    }
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status
    }

    pub fn is_reverted(&self) -> bool {
        !self.status
    }

    /// Turn a reverted receipt into an error
    pub fn ensure_success(self) -> ClientResult<Receipt> {
        if self.status {
            return Ok(self);
        }
        Err(ClientError::Reverted {
            tx_hash: self.tx_hash,
            reason: self.revert_reason.unwrap_or_default(),
        })
    }

    /// Logs whose first topic is `topic`
    pub fn logs_with_topic<'a>(&'a self, topic: &'a Hash) -> impl Iterator<Item = &'a ReceiptLog> + 'a {
        self.logs.iter().filter(move |log| log.topics.first() == Some(topic))
    }
}

/// Transaction hash: keccak256(rlp([from, nonce, to, value, data]))
pub fn transaction_hash(
    from: &Address,
    nonce: u64,
    to: Option<&Address>,
    value: &BigUint,
    data: &[u8],
) -> Hash {
    let mut stream = RlpStream::new_list(5);
    stream.append(&from.0.to_vec());
    stream.append(&nonce);
    match to {
        Some(to) => stream.append(&to.0.to_vec()),
        None => stream.append_empty_data(),
    };
    stream.append(&value.to_bytes_be());
    stream.append(&data.to_vec());

    Hash(keccak(stream.out()).0)
}
