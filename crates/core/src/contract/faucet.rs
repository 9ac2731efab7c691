//! The faucet contract
//!
//! Holds no balance of its own: the balance lives in the host ledger under
//! the contract address. The contract keeps the owner and a terminal
//! `destroyed` flag.

use super::dispatcher::FaucetCall;
use super::events::FallbackCalled;
use crate::error::{ExecutionResult, RevertReason};
use crate::ledger::Ledger;
use faucet_common::types::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Marker prefixed to the faucet runtime code
const RUNTIME_CODE_MAGIC: &[u8] = b"\xfa\x0c\xe7\x01";

/// Who is calling and how much value came with the call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: BigUint,
}

impl CallContext {
    pub fn new(caller: Address, value: BigUint) -> Self {
        Self { caller, value }
    }

    /// Call without attached value
    pub fn plain(caller: Address) -> Self {
        Self::new(caller, BigUint::zero())
    }
}

/// Deployed faucet state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faucet {
    address: Address,
    owner: Address,
    destroyed: bool,
}

impl Faucet {
    /// Constructor. The host has already moved `ctx.value` to `address`.
    pub fn construct(address: Address, ctx: &CallContext) -> Self {
        info!(
            "Faucet constructed at {} by {} with {} wei",
            address, ctx.caller, ctx.value
        );
        Self {
            address,
            owner: ctx.caller,
            destroyed: false,
        }
    }

    /// Runtime code stored by the host: a marker followed by the selector table
    pub fn runtime_code() -> Vec<u8> {
        let mut code = RUNTIME_CODE_MAGIC.to_vec();
        for selector in FaucetCall::selectors() {
            code.extend_from_slice(&selector);
        }
        code
    }

    /// Whether `code` is faucet runtime code
    pub fn is_faucet_code(code: &[u8]) -> bool {
        code == Self::runtime_code().as_slice()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// `owner()`
    pub fn owner(&self) -> ExecutionResult<Address> {
        self.ensure_live()?;
        Ok(self.owner)
    }

    /// `withdraw(amount)`: owner only, amount must not exceed the balance
    pub async fn withdraw<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        caller: &Address,
        amount: &BigUint,
    ) -> ExecutionResult<()> {
        self.ensure_live()?;
        self.only_owner(caller)?;

        let available = ledger.balance_of(&self.address).await?;
        if amount > &available {
            return Err(RevertReason::InsufficientBalance {
                requested: amount.clone(),
                available,
            }
            .into());
        }

        ledger.transfer(&self.address, caller, amount).await?;
        debug!("Withdrew {} wei from {} to {}", amount, self.address, caller);
        Ok(())
    }

    /// `withdrawAll()`: owner only. Returns the amount moved.
    pub async fn withdraw_all<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        caller: &Address,
    ) -> ExecutionResult<BigUint> {
        self.ensure_live()?;
        self.only_owner(caller)?;

        let balance = ledger.balance_of(&self.address).await?;
        ledger.transfer(&self.address, caller, &balance).await?;
        debug!("Withdrew full balance {} wei from {}", balance, self.address);
        Ok(balance)
    }

    /// `destroyFaucet()`: owner only. Forwards the remaining balance to the
    /// owner and marks the contract destroyed. Removing code is up to the host.
    pub async fn destroy<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        caller: &Address,
    ) -> ExecutionResult<BigUint> {
        self.ensure_live()?;
        self.only_owner(caller)?;

        let balance = ledger.balance_of(&self.address).await?;
        ledger.transfer(&self.address, &self.owner, &balance).await?;
        self.destroyed = true;

        info!(
            "Faucet {} destroyed, forwarded {} wei to {}",
            self.address, balance, self.owner
        );
        Ok(balance)
    }

    /// Fallback: anyone may call, any value is kept, one event is emitted
    pub async fn fallback<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        ctx: &CallContext,
        data: &[u8],
    ) -> ExecutionResult<()> {
        self.ensure_live()?;

        let event = FallbackCalled {
            sender: ctx.caller,
            value: ctx.value.clone(),
            data: data.to_vec(),
        };
        ledger.emit_event(event.to_log(self.address)?).await?;
        debug!(
            "Fallback called on {} by {} with {} bytes",
            self.address,
            ctx.caller,
            data.len()
        );
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), RevertReason> {
        if self.destroyed {
            return Err(RevertReason::ContractDestroyed(self.address));
        }
        Ok(())
    }

    fn only_owner(&self, caller: &Address) -> Result<(), RevertReason> {
        if caller != &self.owner {
            return Err(RevertReason::Unauthorized {
                caller: *caller,
                owner: self.owner,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LedgerError, LedgerResult};
    use crate::ledger::EventLog;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Minimal ledger fake recording balances and events
    #[derive(Default)]
    struct FakeLedger {
        balances: Mutex<HashMap<Address, BigUint>>,
        events: Mutex<Vec<EventLog>>,
    }

    impl FakeLedger {
        fn with_balance(address: Address, amount: u64) -> Self {
            let ledger = Self::default();
            ledger
                .balances
                .lock()
                .unwrap()
                .insert(address, BigUint::from(amount));
            ledger
        }

        fn balance(&self, address: &Address) -> BigUint {
            self.balances
                .lock()
                .unwrap()
                .get(address)
                .cloned()
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl Ledger for FakeLedger {
        async fn balance_of(&self, address: &Address) -> LedgerResult<BigUint> {
            Ok(self.balance(address))
        }

        async fn transfer(&self, from: &Address, to: &Address, amount: &BigUint) -> LedgerResult<()> {
            let mut balances = self.balances.lock().unwrap();
            let available = balances.get(from).cloned().unwrap_or_default();
            if &available < amount {
                return Err(LedgerError::InsufficientFunds {
                    address: *from,
                    requested: amount.clone(),
                    available,
                });
            }
            *balances.entry(*from).or_default() -= amount;
            *balances.entry(*to).or_default() += amount;
            Ok(())
        }

        async fn emit_event(&self, log: EventLog) -> LedgerResult<()> {
            self.events.lock().unwrap().push(log);
            Ok(())
        }
    }

    const CONTRACT: Address = Address([0xfa; 20]);
    const OWNER: Address = Address([0x01; 20]);
    const STRANGER: Address = Address([0x02; 20]);

    fn deployed() -> Faucet {
        Faucet::construct(CONTRACT, &CallContext::new(OWNER, BigUint::from(10u32)))
    }

    #[test]
    fn test_construct_sets_owner() {
        let faucet = deployed();
        assert_eq!(faucet.owner().unwrap(), OWNER);
        assert_eq!(faucet.address(), CONTRACT);
        assert!(!faucet.is_destroyed());
    }

    #[tokio::test]
    async fn test_withdraw_by_owner() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let faucet = deployed();

        faucet.withdraw(&ledger, &OWNER, &BigUint::from(4u32)).await.unwrap();
        assert_eq!(ledger.balance(&CONTRACT), BigUint::from(6u32));
        assert_eq!(ledger.balance(&OWNER), BigUint::from(4u32));
    }

    #[tokio::test]
    async fn test_withdraw_more_than_balance_reverts() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let faucet = deployed();

        let err = faucet
            .withdraw(&ledger, &OWNER, &BigUint::from(11u32))
            .await
            .unwrap_err();
        assert!(matches!(
            err.revert_reason(),
            Some(RevertReason::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.balance(&CONTRACT), BigUint::from(10u32));
    }

    #[tokio::test]
    async fn test_privileged_calls_reject_non_owner() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let mut faucet = deployed();

        let unauthorized = |e: crate::error::ExecutionError| {
            matches!(e.revert_reason(), Some(RevertReason::Unauthorized { .. }))
        };

        assert!(unauthorized(
            faucet
                .withdraw(&ledger, &STRANGER, &BigUint::from(1u32))
                .await
                .unwrap_err()
        ));
        assert!(unauthorized(faucet.withdraw_all(&ledger, &STRANGER).await.unwrap_err()));
        assert!(unauthorized(faucet.destroy(&ledger, &STRANGER).await.unwrap_err()));

        assert!(!faucet.is_destroyed());
        assert_eq!(ledger.balance(&CONTRACT), BigUint::from(10u32));
        assert_eq!(ledger.balance(&STRANGER), BigUint::zero());
    }

    #[tokio::test]
    async fn test_withdraw_all_empties_contract() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let faucet = deployed();

        let moved = faucet.withdraw_all(&ledger, &OWNER).await.unwrap();
        assert_eq!(moved, BigUint::from(10u32));
        assert_eq!(ledger.balance(&CONTRACT), BigUint::zero());
        assert_eq!(ledger.balance(&OWNER), BigUint::from(10u32));
    }

    #[tokio::test]
    async fn test_destroy_is_terminal() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let mut faucet = deployed();

        let forwarded = faucet.destroy(&ledger, &OWNER).await.unwrap();
        assert_eq!(forwarded, BigUint::from(10u32));
        assert!(faucet.is_destroyed());
        assert_eq!(ledger.balance(&OWNER), BigUint::from(10u32));

        let destroyed = |e: crate::error::ExecutionError| {
            matches!(e.revert_reason(), Some(RevertReason::ContractDestroyed(_)))
        };
        assert!(destroyed(faucet.owner().unwrap_err()));
        assert!(destroyed(faucet.destroy(&ledger, &OWNER).await.unwrap_err()));
        assert!(destroyed(
            faucet
                .fallback(&ledger, &CallContext::plain(STRANGER), &[1])
                .await
                .unwrap_err()
        ));
    }

    #[tokio::test]
    async fn test_fallback_emits_one_event() {
        let ledger = FakeLedger::with_balance(CONTRACT, 10);
        let faucet = deployed();
        let ctx = CallContext::new(STRANGER, BigUint::from(3u32));

        faucet.fallback(&ledger, &ctx, &[0xde, 0xad]).await.unwrap();

        let events = ledger.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let decoded = FallbackCalled::decode_log(&events[0]).unwrap().unwrap();
        assert_eq!(decoded.sender, STRANGER);
        assert_eq!(decoded.value, BigUint::from(3u32));
        assert_eq!(decoded.data, vec![0xde, 0xad]);
    }

    #[test]
    fn test_runtime_code_is_recognised() {
        let code = Faucet::runtime_code();
        assert!(!code.is_empty());
        assert!(Faucet::is_faucet_code(&code));
        assert!(!Faucet::is_faucet_code(&[0x60, 0x80]));
    }
}
