//! Session configuration: dev chain parameters, faucet amounts and logging.

use anyhow::Result;
use faucet_common::error::ErrorContext;
use faucet_common::utils::config::load_config;
use faucet_common::utils::converter::parse_ether;
use faucet_common::utils::logging::LoggingConfig;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dev chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID, mixed into dev account key derivation
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Number of funded dev accounts
    #[serde(default = "default_accounts")]
    pub accounts: usize,

    /// Genesis balance of every dev account, in ether
    #[serde(default = "default_account_balance")]
    pub account_balance: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            accounts: default_accounts(),
            account_balance: default_account_balance(),
        }
    }
}

impl ChainConfig {
    /// Genesis balance in wei
    pub fn account_balance_wei(&self) -> faucet_common::Result<BigUint> {
        parse_ether(&self.account_balance).with_context("chain.account_balance")
    }
}

/// Faucet amounts used by the scripted session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaucetSettings {
    /// Value sent with the constructor, in ether
    #[serde(default = "default_initial_funding")]
    pub initial_funding: String,

    /// Amount requested by the owner's partial withdrawal, in ether
    #[serde(default = "default_withdraw_amount")]
    pub withdraw_amount: String,
}

impl Default for FaucetSettings {
    fn default() -> Self {
        Self {
            initial_funding: default_initial_funding(),
            withdraw_amount: default_withdraw_amount(),
        }
    }
}

impl FaucetSettings {
    pub fn initial_funding_wei(&self) -> faucet_common::Result<BigUint> {
        parse_ether(&self.initial_funding).with_context("faucet.initial_funding")
    }

    pub fn withdraw_amount_wei(&self) -> faucet_common::Result<BigUint> {
        parse_ether(&self.withdraw_amount).with_context("faucet.withdraw_amount")
    }
}

/// Everything the `faucet` binary reads from its config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub faucet: FaucetSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SessionConfig {
    /// Load from a TOML/YAML/JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config(path)
    }

    /// Reject amounts that do not parse before anything runs
    pub fn validate(&self) -> faucet_common::Result<()> {
        self.chain.account_balance_wei()?;
        self.faucet.initial_funding_wei()?;
        self.faucet.withdraw_amount_wei()?;
        Ok(())
    }
}

fn default_chain_id() -> u64 { 31337 }
fn default_accounts() -> usize { 20 }
fn default_account_balance() -> String { "10000".to_string() }
fn default_initial_funding() -> String { "10".to_string() }
fn default_withdraw_amount() -> String { "1".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.chain.accounts, 20);
        assert_eq!(
            config.faucet.initial_funding_wei().unwrap(),
            parse_ether("10").unwrap()
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "[chain]")?;
        writeln!(file, "accounts = 3")?;
        writeln!(file, "[faucet]")?;
        writeln!(file, "withdraw_amount = \"0.1\"")?;

        let config = SessionConfig::load(file.path())?;
        assert_eq!(config.chain.accounts, 3);
        assert_eq!(config.chain.chain_id, 31337);
        assert_eq!(config.faucet.initial_funding, "10");
        assert_eq!(
            config.faucet.withdraw_amount_wei()?,
            parse_ether("0.1")?
        );
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_amount() {
        let mut config = SessionConfig::default();
        config.faucet.withdraw_amount = "lots".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("faucet.withdraw_amount"));
    }
}
