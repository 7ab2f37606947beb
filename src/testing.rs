//! Test doubles for the provider and oracle seams.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use primitive_types::{H160, H256, U256};
use sha3::{Digest as _, Keccak256};

use crate::oracle::{self, EncryptedPayload, EncryptionOracle, KeyHandle};
use crate::provider::{self, Provider};
use crate::shielded::query_transaction;
use crate::types::{CallRequest, SignedCall, TransactionReceipt};

/// Well-known development key (hardhat account #0).
pub(crate) const DEV_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A provider serving canned responses and recording everything submitted.
pub(crate) struct MockProvider {
    pub(crate) chain_id: u64,
    pub(crate) transaction_count: u64,
    pub(crate) gas_price: U256,
    pub(crate) node_key: [u8; 32],
    pub(crate) receipt_status: Option<u64>,
    pub(crate) call_responses: Mutex<VecDeque<Vec<u8>>>,
    pub(crate) calls: Mutex<Vec<SignedCall>>,
    pub(crate) raw_transactions: Mutex<Vec<Vec<u8>>>,
    pub(crate) requests: Mutex<Vec<&'static str>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            chain_id: 1337,
            transaction_count: 0,
            gas_price: 1_000_000_000u64.into(),
            node_key: [0; 32],
            receipt_status: Some(1),
            call_responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            raw_transactions: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockProvider {
    fn record(&self, method: &'static str) {
        self.requests.lock().unwrap().push(method);
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn chain_id(&self) -> Result<u64, provider::Error> {
        self.record("eth_chainId");
        Ok(self.chain_id)
    }

    async fn transaction_count(&self, _address: H160) -> Result<u64, provider::Error> {
        self.record("eth_getTransactionCount");
        Ok(self.transaction_count)
    }

    async fn gas_price(&self) -> Result<U256, provider::Error> {
        self.record("eth_gasPrice");
        Ok(self.gas_price)
    }

    async fn estimate_gas(&self, _call: &CallRequest) -> Result<U256, provider::Error> {
        self.record("eth_estimateGas");
        Ok(21_000.into())
    }

    async fn node_public_key(&self) -> Result<[u8; 32], provider::Error> {
        self.record("eth_getNodePublicKey");
        Ok(self.node_key)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256, provider::Error> {
        self.record("eth_sendRawTransaction");
        self.raw_transactions.lock().unwrap().push(raw.to_vec());
        Ok(H256::from_slice(&Keccak256::digest(raw)))
    }

    async fn call(&self, call: &SignedCall) -> Result<Vec<u8>, provider::Error> {
        self.record("eth_call");
        self.calls.lock().unwrap().push(call.clone());
        Ok(self
            .call_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn transaction_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, provider::Error> {
        self.record("eth_getTransactionReceipt");
        Ok(Some(TransactionReceipt {
            transaction_hash: hash,
            block_number: Some(1),
            status: self.receipt_status,
        }))
    }
}

/// An oracle with a canned ciphertext and identity decryption.
///
/// With `ciphertext: None` it is a pass-through: "encrypted" calldata equals
/// the plaintext, which lets tests assert on decoded transactions directly.
#[derive(Default)]
pub(crate) struct MockOracle {
    pub(crate) ciphertext: Option<Vec<u8>>,
    pub(crate) key: [u8; 32],
    pub(crate) encrypt_calls: Mutex<Vec<Vec<u8>>>,
    pub(crate) decrypt_calls: Mutex<Vec<(Vec<u8>, [u8; 32])>>,
}

#[async_trait]
impl EncryptionOracle for MockOracle {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, oracle::Error> {
        self.encrypt_calls.lock().unwrap().push(plaintext.to_vec());
        Ok(EncryptedPayload {
            data: self
                .ciphertext
                .clone()
                .unwrap_or_else(|| plaintext.to_vec()),
            key: KeyHandle::new(self.key),
        })
    }

    async fn decrypt(
        &self,
        ciphertext: &[u8],
        key: &KeyHandle,
    ) -> Result<Vec<u8>, oracle::Error> {
        self.decrypt_calls
            .lock()
            .unwrap()
            .push((ciphertext.to_vec(), *key.as_bytes()));
        Ok(ciphertext.to_vec())
    }
}

/// Recovers the sender address of a signed legacy transaction.
pub(crate) fn recover_sender(tx: &ethereum::LegacyTransaction) -> H160 {
    let digest = ethereum::LegacyTransactionMessage::from(tx.clone()).hash();
    recover_address(
        digest,
        tx.signature.r().to_fixed_bytes(),
        tx.signature.s().to_fixed_bytes(),
        tx.signature.standard_v(),
    )
}

/// Recovers the signer of a call envelope from the envelope's own fields.
pub(crate) fn recover_call_signer(call: &SignedCall) -> H160 {
    let message = query_transaction(call.nonce, call.to, call.data.clone(), call.chain_id);
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    call.r.to_big_endian(&mut r);
    call.s.to_big_endian(&mut s);
    let recovery_id = (call.v - call.chain_id * 2 - 35) as u8;
    recover_address(message.hash(), r, s, recovery_id)
}

fn recover_address(digest: H256, r: [u8; 32], s: [u8; 32], recovery_id: u8) -> H160 {
    let signature = k256::ecdsa::Signature::from_scalars(r, s).unwrap();
    let recovery_id = k256::ecdsa::RecoveryId::try_from(recovery_id).unwrap();
    let key =
        k256::ecdsa::VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id)
            .unwrap();
    let point = key.to_encoded_point(false);
    H160::from_slice(&Keccak256::digest(&point.as_bytes()[1..])[32 - 20..])
}
