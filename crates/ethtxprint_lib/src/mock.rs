use async_trait::async_trait;
use std::sync::Mutex;
use web3::types::{Address, BlockNumber, H256, U256, U64};

use crate::err_custom_create;
use crate::error::TxInfoError;
use crate::eth::SenderRecovery;
use crate::model::{ChainBlock, ChainReceipt, ChainTransaction, FeeModel};
use crate::source::ChainSource;

/// In memory node holding at most one transaction.
#[derive(Default)]
pub struct MockSource {
    pub tx: Option<(ChainTransaction, bool)>,
    pub head: Option<ChainBlock>,
    pub receipt: Option<ChainReceipt>,
    pub block: Option<ChainBlock>,
    pub chain_id: u64,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockSource {
    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainSource for MockSource {
    async fn transaction_by_hash(
        &self,
        hash: H256,
    ) -> Result<(ChainTransaction, bool), TxInfoError> {
        self.record("transaction_by_hash");
        self.tx
            .clone()
            .ok_or_else(|| err_custom_create!("Transaction {:#x} not found", hash))
    }

    async fn block_by_number(&self, selector: BlockNumber) -> Result<ChainBlock, TxInfoError> {
        self.record("block_by_number");
        self.head
            .clone()
            .ok_or_else(|| err_custom_create!("Block {:?} not found", selector))
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<ChainReceipt, TxInfoError> {
        self.record("transaction_receipt");
        self.receipt
            .clone()
            .ok_or_else(|| err_custom_create!("Receipt for transaction {:#x} not found", hash))
    }

    async fn block_by_hash(&self, hash: H256) -> Result<ChainBlock, TxInfoError> {
        self.record("block_by_hash");
        match &self.block {
            Some(block) if block.hash == Some(hash) => Ok(block.clone()),
            _ => Err(err_custom_create!("Block {:#x} not found", hash)),
        }
    }

    async fn chain_id(&self) -> Result<u64, TxInfoError> {
        self.record("chain_id");
        Ok(self.chain_id)
    }
}

/// Recovery returning a fixed address, or failing when none is set.
pub struct FixedRecovery(pub Option<Address>);

impl SenderRecovery for FixedRecovery {
    fn recover_sender(
        &self,
        _tx: &ChainTransaction,
        _fee_model: FeeModel,
        _chain_id: u64,
    ) -> Result<Address, TxInfoError> {
        self.0
            .ok_or_else(|| err_custom_create!("invalid signature"))
    }
}

pub fn sender() -> Address {
    Address::from_low_u64_be(0xa11ce)
}

pub fn recipient() -> Address {
    Address::from_low_u64_be(0xb0b)
}

pub fn block_hash() -> H256 {
    H256::from_low_u64_be(0xb10c)
}

pub const GWEI: u64 = 1_000_000_000;

pub fn fee_market_tx() -> ChainTransaction {
    ChainTransaction {
        hash: H256::from_low_u64_be(1),
        nonce: U256::from(42),
        block_hash: Some(block_hash()),
        block_number: Some(U64::from(100)),
        from: Some(sender()),
        to: Some(recipient()),
        value: U256::exp10(17),
        gas: U256::from(50_000),
        gas_price: Some(U256::from(32 * GWEI)),
        max_fee_per_gas: Some(U256::from(50 * GWEI)),
        max_priority_fee_per_gas: Some(U256::from(2 * GWEI)),
        input: vec![0xde, 0xad, 0xbe, 0xef],
        transaction_type: Some(U64::from(2)),
        ..Default::default()
    }
}

pub fn legacy_tx() -> ChainTransaction {
    ChainTransaction {
        hash: H256::from_low_u64_be(2),
        nonce: U256::from(7),
        block_hash: Some(block_hash()),
        block_number: Some(U64::from(100)),
        from: Some(sender()),
        to: Some(recipient()),
        value: U256::exp10(18),
        gas: U256::from(21_000),
        gas_price: Some(U256::from(40 * GWEI)),
        transaction_type: Some(U64::from(0)),
        ..Default::default()
    }
}

/// Mined at block 100 with a 30 gwei base fee, head at 112.
pub fn mined_source(tx: ChainTransaction, gas_used: u64, status: u64) -> MockSource {
    MockSource {
        tx: Some((tx, false)),
        head: Some(ChainBlock {
            hash: Some(H256::from_low_u64_be(0x4ead)),
            number: Some(U64::from(112)),
            timestamp: U256::from(1_660_000_144u64),
            base_fee_per_gas: Some(U256::from(31 * GWEI)),
        }),
        receipt: Some(ChainReceipt {
            transaction_index: U64::from(5),
            block_hash: Some(block_hash()),
            block_number: Some(U64::from(100)),
            gas_used: Some(U256::from(gas_used)),
            status: Some(U64::from(status)),
            effective_gas_price: None,
        }),
        block: Some(ChainBlock {
            hash: Some(block_hash()),
            number: Some(U64::from(100)),
            timestamp: U256::from(1_660_000_000u64),
            base_fee_per_gas: Some(U256::from(30 * GWEI)),
        }),
        chain_id: 1,
        calls: Mutex::new(vec![]),
    }
}

pub fn pending_source(mut tx: ChainTransaction) -> MockSource {
    tx.block_hash = None;
    tx.block_number = None;
    let mut source = mined_source(tx.clone(), 0, 1);
    source.tx = Some((tx, true));
    source.receipt = None;
    source.block = None;
    source
}
