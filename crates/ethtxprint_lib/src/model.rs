use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};
use web3::ethabi::ethereum_types::U512;
use web3::types::{Address, H256, U256, U64};

/// Transaction as returned by `eth_getTransactionByHash`, reduced to what the
/// snapshot needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: H256,
    pub nonce: U256,
    pub block_hash: Option<H256>,
    pub block_number: Option<U64>,
    /// Sender as reported by the node, only used for cross checking.
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: U256,
    pub gas: U256,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub input: Vec<u8>,
    pub transaction_type: Option<U64>,
    pub access_list: Vec<(Address, Vec<H256>)>,
    pub v: Option<U64>,
    pub r: Option<U256>,
    pub s: Option<U256>,
}

impl ChainTransaction {
    pub fn type_byte(&self) -> u64 {
        self.transaction_type.map(|t| t.as_u64()).unwrap_or(0)
    }

    /// Tip per gas offered to the block producer (gas price for legacy).
    pub fn gas_tip_cap(&self) -> U256 {
        self.max_priority_fee_per_gas
            .or(self.gas_price)
            .unwrap_or_default()
    }

    /// Maximum total price per gas (gas price for legacy).
    pub fn gas_fee_cap(&self) -> U256 {
        self.max_fee_per_gas.or(self.gas_price).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReceipt {
    pub transaction_index: U64,
    pub block_hash: Option<H256>,
    pub block_number: Option<U64>,
    pub gas_used: Option<U256>,
    pub status: Option<U64>,
    pub effective_gas_price: Option<U256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainBlock {
    pub hash: Option<H256>,
    pub number: Option<U64>,
    pub timestamp: U256,
    pub base_fee_per_gas: Option<U256>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Unknown,
    Pending,
    Failed,
    Successful,
}

impl TxStatus {
    pub fn from_receipt_status(status: Option<U64>) -> Self {
        match status.map(|s| s.as_u64()) {
            Some(0) => TxStatus::Failed,
            Some(1) => TxStatus::Successful,
            _ => TxStatus::Unknown,
        }
    }
}

impl Display for TxStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStatus::Unknown => "Unknown",
            TxStatus::Pending => "Pending",
            TxStatus::Failed => "Failed",
            TxStatus::Successful => "Successful",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    Legacy,
    FeeMarket,
    Unknown(u64),
}

impl FeeModel {
    pub fn from_type_byte(tx_type: u64) -> Self {
        match tx_type {
            0x0 => FeeModel::Legacy,
            0x2 => FeeModel::FeeMarket,
            other => FeeModel::Unknown(other),
        }
    }

    pub fn type_byte(&self) -> u64 {
        match self {
            FeeModel::Legacy => 0x0,
            FeeModel::FeeMarket => 0x2,
            FeeModel::Unknown(t) => *t,
        }
    }
}

impl Display for FeeModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeModel::Legacy => write!(f, "Legacy"),
            FeeModel::FeeMarket => write!(f, "EIP-1559"),
            FeeModel::Unknown(_) => write!(f, "Unknown"),
        }
    }
}

/// Sign and magnitude, used for savings which can go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedWei {
    pub negative: bool,
    pub magnitude: U512,
}

impl SignedWei {
    pub fn positive(magnitude: U512) -> Self {
        Self {
            negative: false,
            magnitude,
        }
    }

    pub fn negative(magnitude: U512) -> Self {
        Self {
            negative: !magnitude.is_zero(),
            magnitude,
        }
    }
}

impl Display for SignedWei {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

/// Soft failure noticed while deriving a snapshot that did not stop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    SenderRecovery(String),
    SenderMismatch { reported: Address, recovered: Address },
    HeadBehindInclusion { head: U64, inclusion: U64 },
    FeeOverflow,
}

impl Display for Anomaly {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Anomaly::SenderRecovery(msg) => write!(f, "sender recovery failed: {msg}"),
            Anomaly::SenderMismatch {
                reported,
                recovered,
            } => write!(
                f,
                "node reported sender {reported:#x}, signature recovers {recovered:#x}"
            ),
            Anomaly::HeadBehindInclusion { head, inclusion } => write!(
                f,
                "head block {head} is behind inclusion block {inclusion}"
            ),
            Anomaly::FeeOverflow => write!(f, "tip cap plus base fee overflows 256 bits"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingView {
    /// Tip cap plus base fee of the current head.
    pub gas_price_estimate: Option<U256>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinedView {
    pub status: TxStatus,
    pub block_number: U64,
    pub block_index: u64,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub confirmations: u64,
    pub gas_used: Option<U256>,
    pub gas_used_percent: Option<f64>,
    pub effective_gas_price: Option<U256>,
    pub base_fee_per_gas: Option<U256>,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub transaction_fee: Option<U512>,
    pub burnt_fees: Option<U512>,
    pub savings: Option<SignedWei>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainState {
    Pending(PendingView),
    Mined(MinedView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionSnapshot {
    pub hash: H256,
    pub fee_model: FeeModel,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub nonce: u64,
    pub input: Vec<u8>,
    pub state: ChainState,
    pub anomalies: Vec<Anomaly>,
}

impl TransactionSnapshot {
    pub fn status(&self) -> TxStatus {
        match &self.state {
            ChainState::Pending(_) => TxStatus::Pending,
            ChainState::Mined(mined) => mined.status,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ChainState::Pending(_))
    }

    pub fn mined(&self) -> Option<&MinedView> {
        match &self.state {
            ChainState::Pending(_) => None,
            ChainState::Mined(mined) => Some(mined),
        }
    }

    pub fn gas_price(&self) -> Option<U256> {
        match &self.state {
            ChainState::Pending(pending) => pending.gas_price_estimate,
            ChainState::Mined(mined) => mined.effective_gas_price,
        }
    }

    /// Zero while pending.
    pub fn max_fee_per_gas(&self) -> U256 {
        self.mined()
            .map(|m| m.max_fee_per_gas)
            .unwrap_or_default()
    }

    /// Zero while pending.
    pub fn max_priority_fee_per_gas(&self) -> U256 {
        self.mined()
            .map(|m| m.max_priority_fee_per_gas)
            .unwrap_or_default()
    }
}

/// Fields gathered so far while talking to the node.
///
/// Returned alongside an error when a read fails midway.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    pub hash: H256,
    pub fee_model: Option<FeeModel>,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub value: Option<U256>,
    pub gas_limit: Option<u64>,
    pub nonce: Option<u64>,
    pub input: Vec<u8>,
    pub state: Option<ChainState>,
    pub anomalies: Vec<Anomaly>,
}

impl SnapshotBuilder {
    pub fn new(hash: H256) -> Self {
        Self {
            hash,
            ..Default::default()
        }
    }

    /// Freezes the builder. Returns `None` when the transaction body or chain
    /// state was never filled in.
    pub fn build(self) -> Option<TransactionSnapshot> {
        Some(TransactionSnapshot {
            hash: self.hash,
            fee_model: self.fee_model?,
            from: self.from,
            to: self.to,
            value: self.value?,
            gas_limit: self.gas_limit?,
            nonce: self.nonce?,
            input: self.input,
            state: self.state?,
            anomalies: self.anomalies,
        })
    }
}
