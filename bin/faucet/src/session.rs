//! Scripted faucet session

use anyhow::{Context, Result};
use faucet_common::utils::converter::{format_ether, to_hex};
use faucet_core::{DevChain, FallbackCalled, FaucetClient, Receipt, SessionConfig};
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::{info, warn};

/// Calldata matching no faucet selector
const FALLBACK_PAYLOAD: [u8; 4] = [0xf0, 0x28, 0xc5, 0x23];

pub async fn run(config: &SessionConfig) -> Result<()> {
    let chain = Arc::new(DevChain::new(config.chain.clone()).await?);
    let owner = chain.account(0).context("dev chain has no accounts")?;
    let stranger = chain
        .account(1)
        .context("session needs at least two dev accounts")?;

    let funding = config.faucet.initial_funding_wei()?;
    let amount = config.faucet.withdraw_amount_wei()?;

    let faucet = FaucetClient::deploy(chain.clone(), owner, funding).await?;
    info!("Faucet at {} owned by {}", faucet.address(), faucet.owner().await?);
    log_balances(&chain, &faucet).await;

    report("withdraw", &faucet.withdraw(amount).await?);
    log_balances(&chain, &faucet).await;

    let attempt = faucet.connect(stranger).destroy_faucet().await?;
    report("destroyFaucet (non-owner)", &attempt);

    let receipt = faucet
        .connect(stranger)
        .send_raw(BigUint::from(0u32), FALLBACK_PAYLOAD.to_vec())
        .await;
    report("fallback", &receipt);
    for log in receipt.logs_with_topic(&FallbackCalled::topic()) {
        if let Some(event) = FallbackCalled::decode_log(&log.to_event())? {
            info!(
                "FallbackCalled sender={} value={} data={}",
                event.sender,
                event.value,
                to_hex(&event.data)
            );
        }
    }

    report("withdrawAll", &faucet.withdraw_all().await?);
    log_balances(&chain, &faucet).await;

    report("destroyFaucet", &faucet.destroy_faucet().await?);
    info!(
        "Code at {} after destroy: {} bytes",
        faucet.address(),
        chain.get_code(&faucet.address()).await.len()
    );

    Ok(())
}

fn report(step: &str, receipt: &Receipt) {
    if receipt.is_success() {
        info!(
            "{}: tx {} ok, {} log(s)",
            step,
            receipt.tx_hash,
            receipt.logs.len()
        );
    } else {
        warn!(
            "{}: tx {} reverted: {}",
            step,
            receipt.tx_hash,
            receipt.revert_reason.as_deref().unwrap_or("unknown")
        );
    }
}

async fn log_balances(chain: &DevChain, faucet: &FaucetClient) {
    info!(
        "Balances: faucet {} ETH, owner {} ETH",
        format_ether(&faucet.balance().await),
        format_ether(&chain.get_balance(&faucet.signer()).await)
    );
}
