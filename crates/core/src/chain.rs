//! In-memory development chain
//!
//! Hosts faucet contracts on top of [`InMemoryLedger`]. Transactions run one
//! at a time behind an execution lock. Each one is wrapped in a ledger
//! snapshot: a revert restores balances, code and logs, and only the sender
//! nonce survives.

use crate::abi::ABI;
use crate::config::ChainConfig;
use crate::contract::{dispatch, CallContext, Faucet};
use crate::error::{ExecutionError, ExecutionResult, RevertReason};
use crate::ledger::{CodeStorage, EventLog, InMemoryLedger, Ledger, SnapshotId};
use crate::receipt::{transaction_hash, Receipt, ReceiptLog};
use faucet_common::error::CommonError;
use faucet_common::types::{Address, Hash};
use faucet_common::utils::converter::format_ether;
use k256::ecdsa::SigningKey;
use keccak_hash::keccak;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A funded development account
#[derive(Clone)]
pub struct DevAccount {
    pub index: usize,
    pub address: Address,
    signing_key: SigningKey,
}

impl DevAccount {
    /// Derive account `index` for `chain_id` from a fixed seed
    pub fn derive(chain_id: u64, index: usize) -> faucet_common::Result<Self> {
        let seed = keccak(format!("faucet-dev-account:{}:{}", chain_id, index));
        let signing_key = SigningKey::from_bytes(&seed.0.into())
            .map_err(|e| CommonError::Internal(format!("Invalid dev key {}: {}", index, e)))?;
        let address = Self::address_of(&signing_key);
        Ok(Self {
            index,
            address,
            signing_key,
        })
    }

    /// Ethereum address: last 20 bytes of keccak256 of the uncompressed public key
    pub fn address_of(signing_key: &SigningKey) -> Address {
        let public_key = signing_key.verifying_key();
        let encoded = public_key.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag
        let hash = keccak(&encoded.as_bytes()[1..]);
        Address::from_hash_tail(&hash.0)
    }

    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }
}

impl std::fmt::Debug for DevAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevAccount")
            .field("index", &self.index)
            .field("address", &self.address)
            .finish()
    }
}

/// A transaction or read-only call against a contract address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub value: BigUint,
    pub data: Vec<u8>,
}

impl CallRequest {
    pub fn new(from: Address, to: Address) -> Self {
        Self {
            from,
            to,
            value: BigUint::zero(),
            data: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: BigUint) -> Self {
        self.value = value;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }
}

/// Ledger position captured before a transaction runs
struct Pending {
    snapshot: SnapshotId,
    log_start: usize,
}

/// Contract map change to apply once a transaction commits
enum ContractChange {
    None,
    Deployed(Faucet),
    Destroyed(Address),
}

/// The development chain
pub struct DevChain {
    config: ChainConfig,
    ledger: Arc<InMemoryLedger>,
    contracts: RwLock<HashMap<Address, Faucet>>,
    accounts: Vec<DevAccount>,
    execution: Mutex<()>,
}

impl DevChain {
    /// Create a chain with `config.accounts` funded dev accounts
    pub async fn new(config: ChainConfig) -> faucet_common::Result<Self> {
        let balance = config.account_balance_wei()?;
        let ledger = Arc::new(InMemoryLedger::new());

        let mut accounts = Vec::with_capacity(config.accounts);
        for index in 0..config.accounts {
            let account = DevAccount::derive(config.chain_id, index)?;
            ledger.credit(&account.address, &balance).await;
            accounts.push(account);
        }

        info!(
            "Dev chain {} started with {} accounts of {} ETH",
            config.chain_id,
            accounts.len(),
            format_ether(&balance)
        );

        Ok(Self {
            config,
            ledger,
            contracts: RwLock::new(HashMap::new()),
            accounts,
            execution: Mutex::new(()),
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.accounts.iter().map(|a| a.address).collect()
    }

    pub fn account(&self, index: usize) -> Option<Address> {
        self.accounts.get(index).map(|a| a.address)
    }

    pub fn dev_accounts(&self) -> &[DevAccount] {
        &self.accounts
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Deploy a faucet from `from`, funding it with `value`
    pub async fn deploy_faucet(&self, from: &Address, value: BigUint) -> Receipt {
        let _guard = self.execution.lock().await;

        let nonce = self.ledger.increment_nonce(from).await;
        let code = Faucet::runtime_code();
        let tx_hash = transaction_hash(from, nonce, None, &value, &code);
        let address = CodeStorage::calculate_create_address(from, nonce);
        debug!("Deploying faucet from {} (nonce {}) to {}", from, nonce, address);

        let ctx = CallContext::new(*from, value.clone());
        let pending = self.begin().await;
        let result = self.execute_deploy(address, &ctx, code).await;

        let mut receipt = self
            .finish(pending, tx_hash, *from, None, nonce, value, result)
            .await;
        if receipt.status {
            receipt.contract_address = Some(address);
            info!("Faucet deployed at {} by {}", address, from);
        }
        receipt
    }

    /// Execute a state-changing transaction
    pub async fn send_transaction(&self, tx: CallRequest) -> Receipt {
        let _guard = self.execution.lock().await;

        let nonce = self.ledger.increment_nonce(&tx.from).await;
        let tx_hash = transaction_hash(&tx.from, nonce, Some(&tx.to), &tx.value, &tx.data);
        debug!(
            "Executing tx {} from {} to {} ({} bytes, {} wei)",
            tx_hash,
            tx.from,
            tx.to,
            tx.data.len(),
            tx.value
        );

        let pending = self.begin().await;
        let result = self.execute_call(&tx).await;
        self.finish(pending, tx_hash, tx.from, Some(tx.to), nonce, tx.value, result)
            .await
    }

    /// Execute without persisting anything and return the output bytes
    pub async fn call(&self, tx: CallRequest) -> ExecutionResult<Vec<u8>> {
        let _guard = self.execution.lock().await;

        let snapshot = self.ledger.snapshot().await;
        let result = self.execute_call(&tx).await;
        self.ledger.revert_to(snapshot).await?;

        result.map(|(output, _)| output)
    }

    /// Runtime code at `address`; empty when there is none
    pub async fn get_code(&self, address: &Address) -> Vec<u8> {
        self.ledger.code().get_code(address).await
    }

    pub async fn get_balance(&self, address: &Address) -> BigUint {
        // The in-memory ledger never fails a balance lookup
        self.ledger
            .balance_of(address)
            .await
            .unwrap_or_else(|_| BigUint::zero())
    }

    pub async fn get_nonce(&self, address: &Address) -> u64 {
        self.ledger.get_nonce(address).await
    }

    /// Live faucet state at `address`
    pub async fn faucet(&self, address: &Address) -> Option<Faucet> {
        self.contracts.read().await.get(address).cloned()
    }

    pub async fn logs_by_address(&self, address: &Address) -> Vec<EventLog> {
        self.ledger.logs().get_logs_by_address(address).await
    }

    pub async fn logs_by_topic(&self, topic: &Hash) -> Vec<EventLog> {
        self.ledger.logs().get_logs_by_topic(topic).await
    }

    async fn execute_deploy(
        &self,
        address: Address,
        ctx: &CallContext,
        code: Vec<u8>,
    ) -> ExecutionResult<(Vec<u8>, ContractChange)> {
        self.ledger.transfer(&ctx.caller, &address, &ctx.value).await?;
        let faucet = Faucet::construct(address, ctx);
        self.ledger.code().deploy(address, code).await;
        Ok((Vec::new(), ContractChange::Deployed(faucet)))
    }

    async fn execute_call(&self, tx: &CallRequest) -> ExecutionResult<(Vec<u8>, ContractChange)> {
        self.ledger.transfer(&tx.from, &tx.to, &tx.value).await?;

        let Some(mut faucet) = self.faucet(&tx.to).await else {
            if tx.data.is_empty() {
                // Plain value transfer to an account without code
                return Ok((Vec::new(), ContractChange::None));
            }
            return Err(RevertReason::ContractNotFound(tx.to).into());
        };

        let ctx = CallContext::new(tx.from, tx.value.clone());
        let outcome = dispatch(&mut faucet, self.ledger.as_ref(), &ctx, &tx.data).await?;

        if outcome.destroyed {
            self.ledger.code().remove(&tx.to).await;
            self.ledger.delete_account(&tx.to).await;
            return Ok((outcome.output, ContractChange::Destroyed(tx.to)));
        }
        Ok((outcome.output, ContractChange::None))
    }

    async fn begin(&self) -> Pending {
        Pending {
            log_start: self.ledger.logs().log_count().await,
            snapshot: self.ledger.snapshot().await,
        }
    }

    /// Commit or revert the ledger, apply contract changes and build the receipt
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        pending: Pending,
        tx_hash: Hash,
        from: Address,
        to: Option<Address>,
        nonce: u64,
        value: BigUint,
        result: ExecutionResult<(Vec<u8>, ContractChange)>,
    ) -> Receipt {
        let mut receipt = Receipt {
            tx_hash,
            from,
            to,
            nonce,
            value,
            status: false,
            contract_address: None,
            logs: Vec::new(),
            output: Vec::new(),
            revert_reason: None,
        };

        match result {
            Ok((output, change)) => {
                let logs = self.ledger.logs().logs_since(pending.log_start).await;
                if let Err(e) = self.ledger.commit(pending.snapshot).await {
                    warn!("Failed to release snapshot for {}: {}", tx_hash, e);
                }
                self.apply(change).await;

                receipt.status = true;
                receipt.output = output;
                receipt.logs = logs
                    .into_iter()
                    .enumerate()
                    .map(|(i, log)| ReceiptLog::from_event(log, i as u64, tx_hash))
                    .collect();
            }
            Err(err) => {
                if let Err(e) = self.ledger.revert_to(pending.snapshot).await {
                    warn!("Failed to revert tx {}: {}", tx_hash, e);
                }
                warn!("Transaction {} reverted: {}", tx_hash, err);
                receipt.revert_reason = Some(revert_message(&err));
            }
        }

        receipt
    }

    async fn apply(&self, change: ContractChange) {
        let mut contracts = self.contracts.write().await;
        match change {
            ContractChange::None => {}
            ContractChange::Deployed(faucet) => {
                contracts.insert(faucet.address(), faucet);
            }
            ContractChange::Destroyed(address) => {
                contracts.remove(&address);
                info!("Contract {} removed from chain", address);
            }
        }
    }
}

fn revert_message(err: &ExecutionError) -> String {
    match err.revert_reason() {
        Some(reason) => reason.to_string(),
        None => err.to_string(),
    }
}

/// Selector/topic table of the faucet interface, for display
pub fn interface_table() -> Vec<(String, String)> {
    use crate::contract::dispatcher::{
        DESTROY_FAUCET_SIGNATURE, OWNER_SIGNATURE, WITHDRAW_ALL_SIGNATURE, WITHDRAW_SIGNATURE,
    };
    use crate::contract::events::FALLBACK_CALLED_SIGNATURE;

    let mut table: Vec<(String, String)> = [
        OWNER_SIGNATURE,
        WITHDRAW_SIGNATURE,
        WITHDRAW_ALL_SIGNATURE,
        DESTROY_FAUCET_SIGNATURE,
    ]
    .iter()
    .map(|sig| {
        (
            sig.to_string(),
            format!("0x{}", hex::encode(ABI::function_selector(sig))),
        )
    })
    .collect();
    table.push((
        FALLBACK_CALLED_SIGNATURE.to_string(),
        ABI::event_signature_hash(FALLBACK_CALLED_SIGNATURE).to_string(),
    ));
    table
}
