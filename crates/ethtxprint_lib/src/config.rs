use serde::Deserialize;
use std::collections::btree_map::BTreeMap as Map;

use std::fs;
use std::path::Path;

use crate::error::TxInfoError;
use crate::{err_custom_create, err_from};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub chain: Map<String, Chain>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Chain {
    /// Expected chain id, checked against the node when set.
    pub network_id: Option<u64>,
    pub rpc_endpoints: Vec<String>,
    pub request_timeout: Option<u64>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TxInfoError> {
        Self::parse(&fs::read(path).map_err(err_from!())?)
    }

    pub fn parse(data: &[u8]) -> Result<Self, TxInfoError> {
        toml::from_slice(data).map_err(err_from!())
    }

    pub fn get_chain(&self, name: &str) -> Result<&Chain, TxInfoError> {
        self.chain
            .get(name)
            .ok_or_else(|| err_custom_create!("Chain {} not found in config", name))
    }
}
