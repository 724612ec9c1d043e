use ethtxprint_lib::error::TxInfoError;
use ethtxprint_lib::err_custom_create;
use ethtxprint_lib::process::RecoveryPolicy;
use ethtxprint_lib::setup::DEFAULT_NODE_URL;
use std::env;
use std::path::PathBuf;
use structopt::StructOpt;
use web3::types::H256;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "ethtxprint",
    about = "Print status, fees and confirmations of an Ethereum transaction"
)]
struct CliOptions {
    #[structopt(help = "Transaction hash, 32 bytes hex encoded")]
    tx_hash: String,

    #[structopt(long = "node", help = "Ethereum node URL [env: ETH_NODE_URL]")]
    node: Option<String>,

    #[structopt(long = "config", help = "Chain config file (toml)")]
    config: Option<PathBuf>,

    #[structopt(long = "chain", help = "Chain name from the config file")]
    chain: Option<String>,

    #[structopt(long = "timeout", help = "Timeout in seconds for every node request")]
    timeout: Option<u64>,

    #[structopt(
        long = "strict-recovery",
        help = "Fail when the sender cannot be recovered from the signature"
    )]
    strict_recovery: bool,
}

pub enum NodeSelection {
    Url(String),
    ConfigChain { config: PathBuf, chain: String },
}

pub struct ValidatedOptions {
    pub tx_hash: H256,
    pub node: NodeSelection,
    pub timeout: Option<u64>,
    pub policy: RecoveryPolicy,
}

pub fn parse_tx_hash(input: &str) -> Result<H256, TxInfoError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped)
        .map_err(|err| err_custom_create!("Invalid transaction hash provided: {}", err))?;
    if bytes.len() != 32 {
        return Err(err_custom_create!(
            "Invalid transaction hash provided: expected 32 bytes, got {}",
            bytes.len()
        ));
    }
    Ok(H256::from_slice(&bytes))
}

fn validate(opt: CliOptions) -> Result<ValidatedOptions, TxInfoError> {
    let tx_hash = parse_tx_hash(&opt.tx_hash)?;
    let node = match (opt.config, opt.chain) {
        (Some(config), Some(chain)) => {
            if opt.node.is_some() {
                return Err(err_custom_create!("Can't specify both node and chain"));
            }
            NodeSelection::ConfigChain { config, chain }
        }
        (None, Some(_)) => {
            return Err(err_custom_create!("Specify config file to select chain"));
        }
        (Some(_), None) => {
            return Err(err_custom_create!("Specify chain to use with config file"));
        }
        (None, None) => NodeSelection::Url(
            opt.node
                .or_else(|| env::var("ETH_NODE_URL").ok())
                .unwrap_or_else(|| DEFAULT_NODE_URL.to_string()),
        ),
    };
    Ok(ValidatedOptions {
        tx_hash,
        node,
        timeout: opt.timeout,
        policy: if opt.strict_recovery {
            RecoveryPolicy::Strict
        } else {
            RecoveryPolicy::Lenient
        },
    })
}

pub fn validated_cli() -> Result<ValidatedOptions, TxInfoError> {
    validate(CliOptions::from_args())
}
