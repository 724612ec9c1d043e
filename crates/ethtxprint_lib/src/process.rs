use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;
use web3::ethabi::ethereum_types::U512;
use web3::types::{BlockNumber, H256, U256, U64};

use crate::err_custom_create;
use crate::error::TxInfoError;
use crate::eth::SenderRecovery;
use crate::model::*;
use crate::source::ChainSource;
use crate::utils::{u256_to_f64, u256_to_u64, wide_wei_to_ether};

/// What to do when the sender cannot be recovered from the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Keep going with `from` unset, the failure is kept as an anomaly.
    #[default]
    Lenient,
    /// Stop and return the partial snapshot with the recovery error.
    Strict,
}

/// Chain read (or strict recovery) failed, with whatever was read before.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct DeriveFailure {
    pub partial: Box<SnapshotBuilder>,
    #[source]
    pub error: TxInfoError,
}

impl DeriveFailure {
    fn new(partial: SnapshotBuilder, error: TxInfoError) -> Self {
        Self {
            partial: Box::new(partial),
            error,
        }
    }
}

macro_rules! read_or_fail {
    ($builder:expr, $e:expr) => {
        match $e {
            Ok(x) => x,
            Err(err) => return Err(DeriveFailure::new($builder, err)),
        }
    };
}

fn block_time(timestamp: U256) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(u256_to_u64(timestamp).ok()?).ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

/// Tip cap plus base fee, `None` (and an anomaly) when it does not fit.
fn price_with_base_fee(
    tip_cap: U256,
    base_fee: Option<U256>,
    anomalies: &mut Vec<Anomaly>,
) -> Option<U256> {
    match tip_cap.checked_add(base_fee.unwrap_or_default()) {
        Some(price) => Some(price),
        None => {
            log::warn!("Gas price overflow: tip cap {} base fee {:?}", tip_cap, base_fee);
            anomalies.push(Anomaly::FeeOverflow);
            None
        }
    }
}

/// gas_used * (max_fee - (base_fee + max_priority_fee)), sign kept.
pub fn priority_fee_savings(
    gas_used: U256,
    max_fee: U256,
    base_fee: U256,
    max_priority_fee: U256,
) -> SignedWei {
    let charged = U512::from(base_fee) + U512::from(max_priority_fee);
    let max_fee = U512::from(max_fee);
    let gas_used = U512::from(gas_used);
    if max_fee >= charged {
        SignedWei::positive(gas_used.saturating_mul(max_fee - charged))
    } else {
        SignedWei::negative(gas_used.saturating_mul(charged - max_fee))
    }
}

pub fn gas_used_percent(gas_used: U256, gas_limit: u64) -> Option<f64> {
    if gas_limit == 0 {
        return None;
    }
    Some(u256_to_f64(gas_used) / gas_limit as f64 * 100.0)
}

fn recover_from(
    builder: &mut SnapshotBuilder,
    recovery: &dyn SenderRecovery,
    tx: &ChainTransaction,
    fee_model: FeeModel,
    chain_id: u64,
) -> Result<(), TxInfoError> {
    let recovered = recovery.recover_sender(tx, fee_model, chain_id)?;
    if let Some(reported) = tx.from {
        if reported != recovered {
            log::warn!(
                "Sender mismatch for {:#x}: node says {:#x}, signature gives {:#x}",
                tx.hash,
                reported,
                recovered
            );
            builder.anomalies.push(Anomaly::SenderMismatch {
                reported,
                recovered,
            });
        }
    }
    builder.from = Some(recovered);
    Ok(())
}

/// Reads the transaction, its receipt and blocks and reconciles them into a
/// snapshot.
///
/// Each read is tried exactly once. A failing read ends the derivation and
/// hands back the fields gathered so far together with the error.
pub async fn derive_snapshot<S: ChainSource + ?Sized>(
    source: &S,
    recovery: &dyn SenderRecovery,
    hash: H256,
    policy: RecoveryPolicy,
) -> Result<TransactionSnapshot, DeriveFailure> {
    derive_snapshot_on_chain(source, recovery, hash, policy, None).await
}

/// Same as [`derive_snapshot`], `known_chain_id` saves the chain id request
/// when the caller has already read it.
pub async fn derive_snapshot_on_chain<S: ChainSource + ?Sized>(
    source: &S,
    recovery: &dyn SenderRecovery,
    hash: H256,
    policy: RecoveryPolicy,
    known_chain_id: Option<u64>,
) -> Result<TransactionSnapshot, DeriveFailure> {
    let mut builder = SnapshotBuilder::new(hash);

    let (tx_res, head_res) = tokio::join!(
        source.transaction_by_hash(hash),
        source.block_by_number(BlockNumber::Latest)
    );
    let (tx, pending) = read_or_fail!(builder, tx_res);
    let head = read_or_fail!(builder, head_res);
    log::debug!(
        "Transaction {:#x} found, pending: {}, head block: {:?}",
        hash,
        pending,
        head.number
    );

    let fee_model = FeeModel::from_type_byte(tx.type_byte());
    builder.fee_model = Some(fee_model);
    builder.to = tx.to;
    builder.value = Some(tx.value);
    builder.gas_limit = Some(u256_to_u64(tx.gas).unwrap_or_else(|e| {
        log::warn!("Gas limit out of range, saturating: {}", e);
        u64::MAX
    }));
    builder.nonce = Some(u256_to_u64(tx.nonce).unwrap_or_else(|e| {
        log::warn!("Nonce out of range, saturating: {}", e);
        u64::MAX
    }));
    builder.input = tx.input.clone();

    let chain_id = match known_chain_id {
        Some(chain_id) => chain_id,
        None => read_or_fail!(builder, source.chain_id().await),
    };
    if let Err(err) = recover_from(&mut builder, recovery, &tx, fee_model, chain_id) {
        match policy {
            RecoveryPolicy::Strict => return Err(DeriveFailure::new(builder, err)),
            RecoveryPolicy::Lenient => {
                log::warn!("Cannot recover sender of {:#x}: {}", hash, err);
                builder.anomalies.push(Anomaly::SenderRecovery(err.to_string()));
            }
        }
    }

    if pending {
        let gas_price_estimate =
            price_with_base_fee(tx.gas_tip_cap(), head.base_fee_per_gas, &mut builder.anomalies);
        builder.state = Some(ChainState::Pending(PendingView { gas_price_estimate }));
        return finish(builder);
    }

    let receipt = read_or_fail!(builder, source.transaction_receipt(hash).await);
    let block_hash = read_or_fail!(
        builder,
        receipt
            .block_hash
            .ok_or_else(|| err_custom_create!("Receipt of {:#x} has no block hash", hash))
    );
    let block = read_or_fail!(builder, source.block_by_hash(block_hash).await);

    let status = TxStatus::from_receipt_status(receipt.status);
    if status == TxStatus::Unknown {
        log::warn!("Unexpected receipt status {:?} for {:#x}", receipt.status, hash);
    }

    let head_number = head.number.unwrap_or_default();
    let inclusion_number = receipt.block_number.or(block.number).unwrap_or_default();
    if head_number < inclusion_number {
        log::warn!(
            "Head block {} behind inclusion block {}",
            head_number,
            inclusion_number
        );
        builder.anomalies.push(Anomaly::HeadBehindInclusion {
            head: head_number,
            inclusion: inclusion_number,
        });
    }
    let confirmations = confirmations_at(head_number, inclusion_number);

    let base_fee = block.base_fee_per_gas;
    let tip_cap = tx.gas_tip_cap();
    let effective_gas_price = price_with_base_fee(tip_cap, base_fee, &mut builder.anomalies);
    let gas_used = receipt.gas_used;
    let gas_limit = builder.gas_limit.unwrap_or_default();

    let transaction_fee = match (effective_gas_price, gas_used) {
        (Some(price), Some(used)) => Some(price.full_mul(used)),
        _ => None,
    };
    let burnt_fees = match (base_fee, gas_used) {
        (Some(base_fee), Some(used)) => Some(base_fee.full_mul(used)),
        _ => None,
    };
    let savings = match (fee_model, gas_used) {
        (FeeModel::FeeMarket, Some(used)) => Some(priority_fee_savings(
            used,
            tx.gas_fee_cap(),
            base_fee.unwrap_or_default(),
            tip_cap,
        )),
        (FeeModel::FeeMarket, None) | (FeeModel::Legacy, _) | (FeeModel::Unknown(_), _) => None,
    };

    if let Some(fee) = transaction_fee {
        log::debug!("Transaction {:#x} paid {} ETH in fees", hash, wide_wei_to_ether(fee));
    }
    if let (Some(reported), Some(computed)) = (receipt.effective_gas_price, effective_gas_price) {
        if reported != computed {
            log::debug!(
                "Receipt effective gas price {} differs from tip cap plus base fee {}",
                reported,
                computed
            );
        }
    }

    builder.state = Some(ChainState::Mined(MinedView {
        status,
        block_number: block.number.unwrap_or(inclusion_number),
        block_index: receipt.transaction_index.as_u64(),
        block_timestamp: block_time(block.timestamp),
        confirmations,
        gas_used,
        gas_used_percent: gas_used.and_then(|used| gas_used_percent(used, gas_limit)),
        effective_gas_price,
        base_fee_per_gas: base_fee,
        max_fee_per_gas: tx.gas_fee_cap(),
        max_priority_fee_per_gas: tip_cap,
        transaction_fee,
        burnt_fees,
        savings,
    }));

    finish(builder)
}

fn finish(builder: SnapshotBuilder) -> Result<TransactionSnapshot, DeriveFailure> {
    match builder.clone().build() {
        Some(snapshot) => Ok(snapshot),
        None => {
            let hash = builder.hash;
            Err(DeriveFailure::new(
                builder,
                err_custom_create!("Incomplete snapshot for transaction {:#x}", hash),
            ))
        }
    }
}

/// Blocks mined on top of the inclusion block, zero if the head lags behind.
pub fn confirmations_at(head: U64, inclusion: U64) -> u64 {
    head.saturating_sub(inclusion).as_u64()
}
