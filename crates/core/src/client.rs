//! Typed client for a deployed faucet

use crate::abi::ABI;
use crate::chain::{CallRequest, DevChain};
use crate::contract::FaucetCall;
use crate::error::{ClientError, ClientResult};
use crate::receipt::Receipt;
use faucet_common::types::Address;
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::debug;

/// A faucet bound to a signer, in the style of an ethers contract handle
#[derive(Clone)]
pub struct FaucetClient {
    chain: Arc<DevChain>,
    address: Address,
    signer: Address,
}

impl FaucetClient {
    /// Deploy a new faucet funded with `value` and bind it to the deployer
    pub async fn deploy(chain: Arc<DevChain>, signer: Address, value: BigUint) -> ClientResult<Self> {
        let receipt = chain.deploy_faucet(&signer, value).await.ensure_success()?;
        let address = receipt.contract_address.ok_or_else(|| ClientError::Reverted {
            tx_hash: receipt.tx_hash,
            reason: "deployment produced no contract address".to_string(),
        })?;
        Ok(Self::at(chain, address, signer))
    }

    /// Bind to an existing faucet
    pub fn at(chain: Arc<DevChain>, address: Address, signer: Address) -> Self {
        Self {
            chain,
            address,
            signer,
        }
    }

    /// Same faucet, different signer
    pub fn connect(&self, signer: Address) -> Self {
        Self::at(self.chain.clone(), self.address, signer)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn chain(&self) -> &Arc<DevChain> {
        &self.chain
    }

    /// `owner()` via a read-only call
    pub async fn owner(&self) -> ClientResult<Address> {
        let data = FaucetCall::Owner.encode()?;
        let output = self
            .chain
            .call(CallRequest::new(self.signer, self.address).with_data(data))
            .await?;
        Ok(ABI::decode_address(&output, 0)?)
    }

    pub async fn withdraw(&self, amount: BigUint) -> ClientResult<Receipt> {
        self.transact(FaucetCall::Withdraw { amount }).await
    }

    pub async fn withdraw_all(&self) -> ClientResult<Receipt> {
        self.transact(FaucetCall::WithdrawAll).await
    }

    pub async fn destroy_faucet(&self) -> ClientResult<Receipt> {
        self.transact(FaucetCall::DestroyFaucet).await
    }

    /// Send arbitrary calldata and value to the faucet address
    pub async fn send_raw(&self, value: BigUint, data: Vec<u8>) -> Receipt {
        self.chain
            .send_transaction(
                CallRequest::new(self.signer, self.address)
                    .with_value(value)
                    .with_data(data),
            )
            .await
    }

    /// Contract balance
    pub async fn balance(&self) -> BigUint {
        self.chain.get_balance(&self.address).await
    }

    /// Encode `call` and send it; the receipt may report a revert
    async fn transact(&self, call: FaucetCall) -> ClientResult<Receipt> {
        debug!("{} calling {} on {}", self.signer, call.name(), self.address);
        let data = call.encode()?;
        Ok(self
            .chain
            .send_transaction(CallRequest::new(self.signer, self.address).with_data(data))
            .await)
    }
}
