use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "faucet")]
#[command(about = "Owner-gated faucet contract on an in-memory dev chain", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Initial faucet funding in ether (overrides the config file)
    #[arg(long, value_name = "ETHER")]
    pub initial_funding: Option<String>,

    /// Owner withdrawal amount in ether (overrides the config file)
    #[arg(long, value_name = "ETHER")]
    pub withdraw_amount: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Deploy a faucet and run the scripted owner/stranger session
    Run,

    /// Print function selectors and event topics
    Selectors,
}
