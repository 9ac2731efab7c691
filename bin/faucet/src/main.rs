mod cli;
mod config_loader;
mod session;

use clap::Parser;
use faucet_common::utils::logging::init_logging;
use faucet_core::chain::interface_table;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Parse CLI
    let args = cli::Cli::parse();

    // 2. Load Config
    let config = config_loader::load_session_config(&args)?;

    // 3. Setup Logging
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;

    match args.command.unwrap_or(cli::Commands::Run) {
        cli::Commands::Selectors => {
            for (signature, selector) in interface_table() {
                println!("{:<40} {}", signature, selector);
            }
        }
        cli::Commands::Run => {
            info!("Starting faucet session on chain {}", config.chain.chain_id);
            session::run(&config).await?;
        }
    }

    Ok(())
}
