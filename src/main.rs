mod options;

use ethtxprint_lib::config::Config;
use ethtxprint_lib::error::TxInfoError;
use ethtxprint_lib::report::render_report;
use ethtxprint_lib::runtime::lookup_transaction;
use ethtxprint_lib::setup::LookupSetup;

use crate::options::{validated_cli, NodeSelection};

async fn main_internal() -> Result<(), TxInfoError> {
    let dotenv_res = dotenv::dotenv();
    env_logger::init();
    if let Err(err) = dotenv_res {
        log::debug!("No .env file loaded: {}", err);
    }
    let cli = validated_cli()?;

    let setup = match &cli.node {
        NodeSelection::Url(url) => LookupSetup::from_node_url(url, cli.timeout),
        NodeSelection::ConfigChain { config, chain } => {
            let config = Config::load(config)?;
            LookupSetup::from_config(&config, chain, cli.timeout)?
        }
    };
    log::debug!("Looking up {:#x} with {:?}", cli.tx_hash, setup);

    let snapshot = lookup_transaction(&setup, cli.tx_hash, cli.policy).await?;
    print!("{}", render_report(&snapshot));
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = main_internal().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
