use web3::types::H256;

use crate::err_custom_create;
use crate::error::TxInfoError;
use crate::eth::Secp256k1Recovery;
use crate::model::TransactionSnapshot;
use crate::process::{derive_snapshot_on_chain, RecoveryPolicy};
use crate::setup::LookupSetup;
use crate::source::{ChainSource, Web3Source};

/// Connects to a node from `setup` and derives the snapshot of `hash`.
///
/// The partial snapshot of a failed derivation is only logged, the caller
/// gets the underlying error.
pub async fn lookup_transaction(
    setup: &LookupSetup,
    hash: H256,
    policy: RecoveryPolicy,
) -> Result<TransactionSnapshot, TxInfoError> {
    let source = Web3Source::new(setup.get_provider()?, setup.request_timeout);
    lookup_with_source(&source, hash, policy, setup.expected_chain_id).await
}

/// Returns the chain id read from the node, `None` when nothing is expected.
pub async fn check_chain_id<S: ChainSource + ?Sized>(
    source: &S,
    expected_chain_id: Option<u64>,
) -> Result<Option<u64>, TxInfoError> {
    let Some(expected) = expected_chain_id else {
        return Ok(None);
    };
    let chain_id = source.chain_id().await?;
    if chain_id != expected {
        return Err(err_custom_create!(
            "Node is on chain {}, config expects {}",
            chain_id,
            expected
        ));
    }
    Ok(Some(chain_id))
}

pub async fn lookup_with_source<S: ChainSource + ?Sized>(
    source: &S,
    hash: H256,
    policy: RecoveryPolicy,
    expected_chain_id: Option<u64>,
) -> Result<TransactionSnapshot, TxInfoError> {
    let known_chain_id = check_chain_id(source, expected_chain_id).await?;
    match derive_snapshot_on_chain(source, &Secp256k1Recovery, hash, policy, known_chain_id)
        .await
    {
        Ok(snapshot) => {
            for anomaly in &snapshot.anomalies {
                log::warn!("Transaction {:#x}: {}", hash, anomaly);
            }
            Ok(snapshot)
        }
        Err(failure) => {
            log::debug!("Partial snapshot before failure: {:#?}", failure.partial);
            Err(failure.error)
        }
    }
}
