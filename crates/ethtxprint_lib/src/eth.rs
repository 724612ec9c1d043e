use rlp::RlpStream;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey};
use sha3::Digest;
use sha3::Keccak256;
use web3::types::{Address, H256, U256};

use crate::error::TxInfoError;
use crate::model::{ChainTransaction, FeeModel};
use crate::utils::{u256_to_trimmed_be, u256_to_u64};
use crate::{err_custom_create, err_from};

/// Seam for turning a signed transaction back into its sender address.
pub trait SenderRecovery: Send + Sync {
    fn recover_sender(
        &self,
        tx: &ChainTransaction,
        fee_model: FeeModel,
        chain_id: u64,
    ) -> Result<Address, TxInfoError>;
}

/// Recovers the sender locally with secp256k1, no node call needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Secp256k1Recovery;

impl SenderRecovery for Secp256k1Recovery {
    fn recover_sender(
        &self,
        tx: &ChainTransaction,
        fee_model: FeeModel,
        chain_id: u64,
    ) -> Result<Address, TxInfoError> {
        let v = tx
            .v
            .ok_or_else(|| err_custom_create!("Transaction {:#x} has no signature", tx.hash))?
            .as_u64();
        let (signing_hash, recovery_id) = match fee_model {
            FeeModel::Legacy => legacy_signing_hash(tx, v, chain_id)?,
            FeeModel::FeeMarket => {
                if v > 1 {
                    return Err(err_custom_create!(
                        "Invalid y parity {} for EIP-1559 transaction",
                        v
                    ));
                }
                (fee_market_signing_hash(tx, chain_id)?, v as i32)
            }
            FeeModel::Unknown(tx_type) => {
                return Err(err_custom_create!(
                    "No signer for transaction type {}",
                    tx_type
                ))
            }
        };
        let r = tx.r.ok_or_else(|| err_custom_create!("Missing signature r"))?;
        let s = tx.s.ok_or_else(|| err_custom_create!("Missing signature s"))?;
        recover_address(signing_hash, recovery_id, r, s)
    }
}

pub fn get_eth_addr_from_public_key(public_key: &PublicKey) -> Address {
    Address::from_slice(
        &Keccak256::digest(&public_key.serialize_uncompressed()[1..65]).as_slice()[12..],
    )
}

pub fn recover_address(
    signing_hash: H256,
    recovery_id: i32,
    r: U256,
    s: U256,
) -> Result<Address, TxInfoError> {
    let mut compact = [0u8; 64];
    r.to_big_endian(&mut compact[..32]);
    s.to_big_endian(&mut compact[32..]);
    let recovery_id = RecoveryId::from_i32(recovery_id).map_err(err_from!())?;
    let signature = RecoverableSignature::from_compact(&compact, recovery_id).map_err(err_from!())?;
    let message = Message::from_slice(signing_hash.as_bytes()).map_err(err_from!())?;
    let public_key = secp256k1::Secp256k1::verification_only()
        .recover_ecdsa(&message, &signature)
        .map_err(err_from!())?;
    Ok(get_eth_addr_from_public_key(&public_key))
}

fn append_common_body(stream: &mut RlpStream, tx: &ChainTransaction) {
    stream.append(&u256_to_trimmed_be(tx.gas));
    match tx.to {
        Some(to) => stream.append(&to.as_bytes().to_vec()),
        None => stream.append(&Vec::<u8>::new()),
    };
    stream.append(&u256_to_trimmed_be(tx.value));
    stream.append(&tx.input);
}

/// Signing hash and recovery id of a legacy transaction, EIP-155 or pre-155
/// depending on `v`.
pub fn legacy_signing_hash(
    tx: &ChainTransaction,
    v: u64,
    chain_id: u64,
) -> Result<(H256, i32), TxInfoError> {
    let gas_price = tx
        .gas_price
        .ok_or_else(|| err_custom_create!("Legacy transaction without gas price"))?;
    let nonce = u256_to_u64(tx.nonce).map_err(err_from!())?;
    let replay_protected = match v {
        27 | 28 => false,
        v if v >= 35 => true,
        v => return Err(err_custom_create!("Invalid legacy signature v value {}", v)),
    };
    let recovery_id = if replay_protected {
        let signed_chain_id = (v - 35) / 2;
        if signed_chain_id != chain_id {
            return Err(err_custom_create!(
                "Transaction signed for chain {}, node is on chain {}",
                signed_chain_id,
                chain_id
            ));
        }
        ((v - 35) % 2) as i32
    } else {
        (v - 27) as i32
    };

    let mut stream = RlpStream::new_list(if replay_protected { 9 } else { 6 });
    stream.append(&nonce);
    stream.append(&u256_to_trimmed_be(gas_price));
    append_common_body(&mut stream, tx);
    if replay_protected {
        stream.append(&chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
    }
    let hash = Keccak256::digest(&stream.out());
    Ok((H256::from_slice(hash.as_slice()), recovery_id))
}

pub fn fee_market_signing_hash(tx: &ChainTransaction, chain_id: u64) -> Result<H256, TxInfoError> {
    let nonce = u256_to_u64(tx.nonce).map_err(err_from!())?;
    let mut stream = RlpStream::new_list(9);
    stream.append(&chain_id);
    stream.append(&nonce);
    stream.append(&u256_to_trimmed_be(tx.gas_tip_cap()));
    stream.append(&u256_to_trimmed_be(tx.gas_fee_cap()));
    append_common_body(&mut stream, tx);
    stream.begin_list(tx.access_list.len());
    for (address, storage_keys) in &tx.access_list {
        stream.begin_list(2);
        stream.append(&address.as_bytes().to_vec());
        stream.begin_list(storage_keys.len());
        for key in storage_keys {
            stream.append(&key.as_bytes().to_vec());
        }
    }
    let mut payload = vec![0x02u8];
    payload.extend_from_slice(&stream.out());
    let hash = Keccak256::digest(&payload);
    Ok(H256::from_slice(hash.as_slice()))
}
