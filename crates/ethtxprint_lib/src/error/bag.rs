use crate::error::custom::{CustomError, TimeoutError};
use crate::utils::ConversionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErrorBag {
    #[error("web3 error: {0}")]
    Web3Error(#[from] web3::Error),
    #[error("{0}")]
    ConversionError(#[from] ConversionError),
    #[error("{0}")]
    CustomError(#[from] CustomError),
    #[error("{0}")]
    TimeoutError(#[from] TimeoutError),
    #[error("secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("config error: {0}")]
    TomlError(#[from] toml::de::Error),
}
