use crate::config::Config;
use crate::error::TxInfoError;
use crate::err_custom_create;
use rand::Rng;
use std::time::Duration;
use web3::transports::Http;
use web3::Web3;

pub const DEFAULT_NODE_URL: &str = "http://localhost:8545";
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Where to look for the node and how long to wait for each answer.
#[derive(Clone, Debug)]
pub struct LookupSetup {
    pub rpc_endpoints: Vec<String>,
    pub expected_chain_id: Option<u64>,
    pub request_timeout: Duration,
}

impl LookupSetup {
    pub fn from_node_url(node_url: &str, request_timeout: Option<u64>) -> Self {
        LookupSetup {
            rpc_endpoints: vec![node_url.to_string()],
            expected_chain_id: None,
            request_timeout: Duration::from_secs(
                request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            ),
        }
    }

    /// Chain from the config file, an explicit timeout wins over the chain's.
    pub fn from_config(
        config: &Config,
        chain_name: &str,
        request_timeout: Option<u64>,
    ) -> Result<Self, TxInfoError> {
        let chain = config.get_chain(chain_name)?;
        if chain.rpc_endpoints.is_empty() {
            return Err(err_custom_create!(
                "No rpc endpoints configured for chain {}",
                chain_name
            ));
        }
        Ok(LookupSetup {
            rpc_endpoints: chain.rpc_endpoints.clone(),
            expected_chain_id: chain.network_id,
            request_timeout: Duration::from_secs(
                request_timeout
                    .or(chain.request_timeout)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            ),
        })
    }

    pub fn pick_endpoint(&self) -> Result<&str, TxInfoError> {
        let mut rng = rand::thread_rng();
        if self.rpc_endpoints.is_empty() {
            return Err(err_custom_create!("No rpc endpoints configured"));
        }
        let endpoint = &self.rpc_endpoints[rng.gen_range(0..self.rpc_endpoints.len())];
        Ok(endpoint.as_str())
    }

    pub fn get_provider(&self) -> Result<Web3<Http>, TxInfoError> {
        let endpoint = self.pick_endpoint()?;
        let Ok(transport) = web3::transports::Http::new(endpoint) else {
            return Err(err_custom_create!(
                "Failed to create transport for endpoint: {}",
                endpoint
            ));
        };
        log::debug!("Using endpoint {}", endpoint);
        Ok(Web3::new(transport))
    }
}
