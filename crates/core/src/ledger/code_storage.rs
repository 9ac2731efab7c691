//! Contract code storage module
//!
//! Manages storage and retrieval of contract runtime code.

use faucet_common::types::{Address, Hash};
use keccak_hash::keccak;
use rlp::RlpStream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Contract code storage
pub struct CodeStorage {
    /// Code database: code_hash -> bytecode
    codes: Arc<RwLock<HashMap<Hash, Vec<u8>>>>,

    /// Address to code hash mapping
    address_to_code: Arc<RwLock<HashMap<Address, Hash>>>,
}

impl CodeStorage {
    pub fn new() -> Self {
        Self {
            codes: Arc::new(RwLock::new(HashMap::new())),
            address_to_code: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Hash of a code blob
    pub fn code_hash(code: &[u8]) -> Hash {
        Hash(keccak(code).0)
    }

    /// Store code and bind it to `address`, returning the code hash
    pub async fn deploy(&self, address: Address, code: Vec<u8>) -> Hash {
        let code_hash = Self::code_hash(&code);
        let size = code.len();
        self.codes.write().await.entry(code_hash).or_insert(code);
        self.address_to_code.write().await.insert(address, code_hash);

        info!(
            "Bound code to address: address={}, code_hash={}, size={} bytes",
            address, code_hash, size
        );
        code_hash
    }

    /// Unbind code from `address`. Returns whether code was present.
    pub async fn remove(&self, address: &Address) -> bool {
        let removed = self.address_to_code.write().await.remove(address).is_some();
        if removed {
            debug!("Removed code at {}", address);
        }
        removed
    }

    pub async fn get_code_hash(&self, address: &Address) -> Option<Hash> {
        self.address_to_code.read().await.get(address).copied()
    }

    /// Code at `address`; empty when nothing is deployed there
    pub async fn get_code(&self, address: &Address) -> Vec<u8> {
        let Some(code_hash) = self.get_code_hash(address).await else {
            return Vec::new();
        };
        self.codes
            .read()
            .await
            .get(&code_hash)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn is_contract(&self, address: &Address) -> bool {
        self.get_code_hash(address).await.is_some()
    }

    /// Copy of the address bindings, for snapshots
    pub async fn bindings(&self) -> HashMap<Address, Hash> {
        self.address_to_code.read().await.clone()
    }

    /// Restore address bindings taken by [`CodeStorage::bindings`]
    pub async fn restore_bindings(&self, bindings: HashMap<Address, Hash>) {
        *self.address_to_code.write().await = bindings;
    }

    /// Calculate contract creation address (CREATE rule)
    ///
    /// Address = keccak256(rlp.encode([sender, nonce]))[12..]
    pub fn calculate_create_address(sender: &Address, nonce: u64) -> Address {
        let mut stream = RlpStream::new_list(2);
        stream.append(&sender.0.to_vec());
        stream.append(&nonce);
        let encoded = stream.out();

        Address::from_hash_tail(&keccak(&encoded).0)
    }
}

impl Default for CodeStorage {
    fn default() -> Self {
        Self::new()
    }
}
