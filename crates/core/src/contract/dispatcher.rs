//! Calldata routing for the faucet
//!
//! Known selectors are matched first; anything else, including empty
//! calldata, falls through to the fallback handler.

use super::faucet::{CallContext, Faucet};
use crate::abi::{ABI, SELECTOR_SIZE};
use crate::error::{AbiResult, ExecutionResult, RevertReason};
use crate::ledger::Ledger;
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::debug;

pub const OWNER_SIGNATURE: &str = "owner()";
pub const WITHDRAW_SIGNATURE: &str = "withdraw(uint256)";
pub const WITHDRAW_ALL_SIGNATURE: &str = "withdrawAll()";
pub const DESTROY_FAUCET_SIGNATURE: &str = "destroyFaucet()";

/// A decoded faucet call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaucetCall {
    Owner,
    Withdraw { amount: BigUint },
    WithdrawAll,
    DestroyFaucet,
    Fallback { data: Vec<u8> },
}

impl FaucetCall {
    /// Selectors of every named function, in declaration order
    pub fn selectors() -> [[u8; SELECTOR_SIZE]; 4] {
        [
            ABI::function_selector(OWNER_SIGNATURE),
            ABI::function_selector(WITHDRAW_SIGNATURE),
            ABI::function_selector(WITHDRAW_ALL_SIGNATURE),
            ABI::function_selector(DESTROY_FAUCET_SIGNATURE),
        ]
    }

    /// Decode calldata. Fails only when a known selector carries bad arguments.
    pub fn decode(calldata: &[u8]) -> AbiResult<Self> {
        if calldata.len() < SELECTOR_SIZE {
            return Ok(FaucetCall::Fallback {
                data: calldata.to_vec(),
            });
        }

        let (selector, args) = calldata.split_at(SELECTOR_SIZE);
        let call = if selector == ABI::function_selector(OWNER_SIGNATURE) {
            FaucetCall::Owner
        } else if selector == ABI::function_selector(WITHDRAW_SIGNATURE) {
            FaucetCall::Withdraw {
                amount: ABI::decode_uint(args, 0)?,
            }
        } else if selector == ABI::function_selector(WITHDRAW_ALL_SIGNATURE) {
            FaucetCall::WithdrawAll
        } else if selector == ABI::function_selector(DESTROY_FAUCET_SIGNATURE) {
            FaucetCall::DestroyFaucet
        } else {
            FaucetCall::Fallback {
                data: calldata.to_vec(),
            }
        };
        Ok(call)
    }

    /// Encode as calldata
    pub fn encode(&self) -> AbiResult<Vec<u8>> {
        let data = match self {
            FaucetCall::Owner => ABI::encode_function_call(OWNER_SIGNATURE, &[]),
            FaucetCall::Withdraw { amount } => {
                ABI::encode_function_call(WITHDRAW_SIGNATURE, &[ABI::encode_uint(amount)?])
            }
            FaucetCall::WithdrawAll => ABI::encode_function_call(WITHDRAW_ALL_SIGNATURE, &[]),
            FaucetCall::DestroyFaucet => ABI::encode_function_call(DESTROY_FAUCET_SIGNATURE, &[]),
            FaucetCall::Fallback { data } => data.clone(),
        };
        Ok(data)
    }

    /// Function name used in logs and non-payable reverts
    pub fn name(&self) -> &'static str {
        match self {
            FaucetCall::Owner => "owner",
            FaucetCall::Withdraw { .. } => "withdraw",
            FaucetCall::WithdrawAll => "withdrawAll",
            FaucetCall::DestroyFaucet => "destroyFaucet",
            FaucetCall::Fallback { .. } => "fallback",
        }
    }

    pub fn is_payable(&self) -> bool {
        matches!(self, FaucetCall::Fallback { .. })
    }
}

/// Outcome of a dispatched call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// ABI-encoded return data
    pub output: Vec<u8>,

    /// Set when the call self-destructed the contract
    pub destroyed: bool,
}

/// Decode `calldata` and run it against `faucet`.
///
/// `ctx.value` must already be credited to the contract.
pub async fn dispatch<L: Ledger + ?Sized>(
    faucet: &mut Faucet,
    ledger: &L,
    ctx: &CallContext,
    calldata: &[u8],
) -> ExecutionResult<DispatchOutcome> {
    let call = FaucetCall::decode(calldata)?;
    debug!("Dispatching {} from {}", call.name(), ctx.caller);

    if !call.is_payable() && !ctx.value.is_zero() {
        return Err(RevertReason::NonPayable(call.name()).into());
    }

    let output = match &call {
        FaucetCall::Owner => ABI::encode_address(&faucet.owner()?).to_vec(),
        FaucetCall::Withdraw { amount } => {
            faucet.withdraw(ledger, &ctx.caller, amount).await?;
            Vec::new()
        }
        FaucetCall::WithdrawAll => {
            faucet.withdraw_all(ledger, &ctx.caller).await?;
            Vec::new()
        }
        FaucetCall::DestroyFaucet => {
            faucet.destroy(ledger, &ctx.caller).await?;
            Vec::new()
        }
        FaucetCall::Fallback { data } => {
            faucet.fallback(ledger, ctx, data).await?;
            Vec::new()
        }
    };

    Ok(DispatchOutcome {
        output,
        destroyed: faucet.is_destroyed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbiError;
    use crate::ledger::{InMemoryLedger, Ledger};
    use faucet_common::types::Address;

    const CONTRACT: Address = Address([0xfa; 20]);
    const OWNER: Address = Address([0x01; 20]);

    #[test]
    fn test_decode_known_selectors() {
        let amount = BigUint::from(1_000u32);
        for call in [
            FaucetCall::Owner,
            FaucetCall::Withdraw { amount },
            FaucetCall::WithdrawAll,
            FaucetCall::DestroyFaucet,
        ] {
            let data = call.encode().unwrap();
            assert_eq!(FaucetCall::decode(&data).unwrap(), call);
        }
    }

    #[test]
    fn test_unknown_data_falls_through() {
        let data =
            hex::decode("f028c523285f6d5172b4f6fd31f72f52dc757bc26a0c46239dec58b836ee67f6").unwrap();
        assert_eq!(
            FaucetCall::decode(&data).unwrap(),
            FaucetCall::Fallback { data: data.clone() }
        );
        assert_eq!(
            FaucetCall::decode(&[]).unwrap(),
            FaucetCall::Fallback { data: vec![] }
        );
        assert_eq!(
            FaucetCall::decode(&[0x01, 0x02]).unwrap(),
            FaucetCall::Fallback { data: vec![0x01, 0x02] }
        );
    }

    #[test]
    fn test_withdraw_with_short_argument_is_invalid() {
        let mut data = ABI::function_selector(WITHDRAW_SIGNATURE).to_vec();
        data.extend_from_slice(&[0u8; 8]);
        assert!(matches!(
            FaucetCall::decode(&data),
            Err(AbiError::DataTooShort { .. })
        ));
    }

    #[test]
    fn test_selectors_are_distinct() {
        let selectors = FaucetCall::selectors();
        for i in 0..selectors.len() {
            for j in (i + 1)..selectors.len() {
                assert_ne!(selectors[i], selectors[j]);
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_owner_returns_word() {
        let ledger = InMemoryLedger::new();
        let mut faucet = Faucet::construct(CONTRACT, &CallContext::plain(OWNER));
        let data = FaucetCall::Owner.encode().unwrap();

        let outcome = dispatch(&mut faucet, &ledger, &CallContext::plain(OWNER), &data)
            .await
            .unwrap();
        assert_eq!(ABI::decode_address(&outcome.output, 0).unwrap(), OWNER);
        assert!(!outcome.destroyed);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_value_on_non_payable() {
        let ledger = InMemoryLedger::new();
        let mut faucet = Faucet::construct(CONTRACT, &CallContext::plain(OWNER));
        let data = FaucetCall::WithdrawAll.encode().unwrap();
        let ctx = CallContext::new(OWNER, BigUint::from(1u32));

        let err = dispatch(&mut faucet, &ledger, &ctx, &data).await.unwrap_err();
        assert_eq!(
            err.revert_reason(),
            Some(&RevertReason::NonPayable("withdrawAll"))
        );
    }

    #[tokio::test]
    async fn test_dispatch_destroy_reports_outcome() {
        let ledger = InMemoryLedger::new();
        ledger.credit(&CONTRACT, &BigUint::from(5u32)).await;
        let mut faucet = Faucet::construct(CONTRACT, &CallContext::plain(OWNER));
        let data = FaucetCall::DestroyFaucet.encode().unwrap();

        let outcome = dispatch(&mut faucet, &ledger, &CallContext::plain(OWNER), &data)
            .await
            .unwrap();
        assert!(outcome.destroyed);
        assert_eq!(ledger.balance_of(&OWNER).await.unwrap(), BigUint::from(5u32));
    }
}
