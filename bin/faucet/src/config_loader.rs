use crate::cli::Cli;
use anyhow::{Context, Result};
use faucet_core::SessionConfig;

/// Load the session config file, if any, and apply CLI overrides
pub fn load_session_config(args: &Cli) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => SessionConfig::default(),
    };

    if let Some(funding) = &args.initial_funding {
        config.faucet.initial_funding = funding.clone();
    }

    if let Some(amount) = &args.withdraw_amount {
        config.faucet.withdraw_amount = amount.clone();
    }

    if args.debug {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}
