use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use web3::transports::Http;
use web3::types::{
    Block, BlockId, BlockNumber, Transaction, TransactionId, TransactionReceipt, H256,
};
use web3::Web3;

use crate::error::{TimeoutError, TxInfoError};
use crate::model::{ChainBlock, ChainReceipt, ChainTransaction};
use crate::utils::u256_to_u64;
use crate::{err_create, err_custom_create, err_from};

/// Read access to the chain needed to describe one transaction.
///
/// Every call is a single request, missing objects are reported as errors.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Returns the transaction and whether it is still waiting in the mempool.
    async fn transaction_by_hash(
        &self,
        hash: H256,
    ) -> Result<(ChainTransaction, bool), TxInfoError>;

    async fn block_by_number(&self, selector: BlockNumber) -> Result<ChainBlock, TxInfoError>;

    async fn transaction_receipt(&self, hash: H256) -> Result<ChainReceipt, TxInfoError>;

    async fn block_by_hash(&self, hash: H256) -> Result<ChainBlock, TxInfoError>;

    async fn chain_id(&self) -> Result<u64, TxInfoError>;
}

pub struct Web3Source {
    web3: Web3<Http>,
    request_timeout: Duration,
}

impl Web3Source {
    pub fn new(web3: Web3<Http>, request_timeout: Duration) -> Self {
        Self {
            web3,
            request_timeout,
        }
    }

    async fn timed<T, F>(&self, request: &str, fut: F) -> Result<T, TxInfoError>
    where
        F: Future<Output = Result<T, web3::Error>>,
    {
        log::debug!("Calling {}", request);
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(res) => res.map_err(err_from!()),
            Err(_elapsed) => Err(err_create!(TimeoutError::new(
                request,
                self.request_timeout.as_secs()
            ))),
        }
    }
}

/// Still in the mempool until the node reports both block hash and number.
pub fn is_pending(tx: &Transaction) -> bool {
    tx.block_hash.is_none() || tx.block_number.is_none()
}

pub fn transaction_from_web3(tx: Transaction) -> ChainTransaction {
    ChainTransaction {
        hash: tx.hash,
        nonce: tx.nonce,
        block_hash: tx.block_hash,
        block_number: tx.block_number,
        from: tx.from,
        to: tx.to,
        value: tx.value,
        gas: tx.gas,
        gas_price: tx.gas_price,
        max_fee_per_gas: tx.max_fee_per_gas,
        max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
        input: tx.input.0,
        transaction_type: tx.transaction_type,
        access_list: tx
            .access_list
            .unwrap_or_default()
            .into_iter()
            .map(|item| (item.address, item.storage_keys))
            .collect(),
        v: tx.v,
        r: tx.r,
        s: tx.s,
    }
}

pub fn receipt_from_web3(receipt: TransactionReceipt) -> ChainReceipt {
    ChainReceipt {
        transaction_index: receipt.transaction_index,
        block_hash: receipt.block_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        status: receipt.status,
        effective_gas_price: receipt.effective_gas_price,
    }
}

pub fn block_from_web3(block: Block<H256>) -> ChainBlock {
    ChainBlock {
        hash: block.hash,
        number: block.number,
        timestamp: block.timestamp,
        base_fee_per_gas: block.base_fee_per_gas,
    }
}

#[async_trait]
impl ChainSource for Web3Source {
    async fn transaction_by_hash(
        &self,
        hash: H256,
    ) -> Result<(ChainTransaction, bool), TxInfoError> {
        let tx = self
            .timed(
                "eth_getTransactionByHash",
                self.web3.eth().transaction(TransactionId::Hash(hash)),
            )
            .await?
            .ok_or_else(|| err_custom_create!("Transaction {:#x} not found", hash))?;
        let pending = is_pending(&tx);
        Ok((transaction_from_web3(tx), pending))
    }

    async fn block_by_number(&self, selector: BlockNumber) -> Result<ChainBlock, TxInfoError> {
        let block = self
            .timed(
                "eth_getBlockByNumber",
                self.web3.eth().block(BlockId::Number(selector)),
            )
            .await?
            .ok_or_else(|| err_custom_create!("Block {:?} not found", selector))?;
        Ok(block_from_web3(block))
    }

    async fn transaction_receipt(&self, hash: H256) -> Result<ChainReceipt, TxInfoError> {
        let receipt = self
            .timed(
                "eth_getTransactionReceipt",
                self.web3.eth().transaction_receipt(hash),
            )
            .await?
            .ok_or_else(|| err_custom_create!("Receipt for transaction {:#x} not found", hash))?;
        Ok(receipt_from_web3(receipt))
    }

    async fn block_by_hash(&self, hash: H256) -> Result<ChainBlock, TxInfoError> {
        let block = self
            .timed(
                "eth_getBlockByHash",
                self.web3.eth().block(BlockId::Hash(hash)),
            )
            .await?
            .ok_or_else(|| err_custom_create!("Block {:#x} not found", hash))?;
        Ok(block_from_web3(block))
    }

    async fn chain_id(&self) -> Result<u64, TxInfoError> {
        let chain_id = self
            .timed("eth_chainId", self.web3.eth().chain_id())
            .await?;
        u256_to_u64(chain_id).map_err(err_from!())
    }
}
