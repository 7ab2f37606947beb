//! Secp256k1 wallet: address derivation, transaction signing, submission.
use std::sync::Arc;

use async_trait::async_trait;
use ethereum::{LegacyTransactionMessage, TransactionAction};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint as _;
use primitive_types::{H160, H256, U256};
use sha3::{Digest as _, Keccak256};

use crate::provider::{self, Provider};
use crate::types::CallRequest;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The wallet was asked to talk to the network without being connected.
    #[error("wallet has no attached network provider")]
    MissingProvider,

    #[error("malformed private key")]
    InvalidPrivateKey,

    #[error("transaction signing failed")]
    Signing,

    #[error("transaction is missing a chain id")]
    MissingChainId,

    #[error(transparent)]
    Provider(#[from] provider::Error),
}

/// Produces raw signed transactions for a single address.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> H160;

    /// Signs the message and returns the RLP-encoded signed transaction.
    async fn sign_transaction(&self, tx: LegacyTransactionMessage) -> Result<Vec<u8>, Error>;
}

/// In-memory secp256k1 signing key.
#[derive(Debug)]
pub struct Secp256k1Signer {
    key: SigningKey,
    address: H160,
}

impl Secp256k1Signer {
    /// Parses a hex private key, with or without a `0x` prefix.
    pub fn from_hex(raw: &str) -> Result<Self, Error> {
        let digits = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = hex::decode(digits).map_err(|_| Error::InvalidPrivateKey)?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| Error::InvalidPrivateKey)?;
        let address = derive_address(&key);
        Ok(Self { key, address })
    }
}

fn derive_address(key: &SigningKey) -> H160 {
    let point = key.verifying_key().to_encoded_point(false);
    H160::from_slice(&Keccak256::digest(&point.as_bytes()[1..])[32 - 20..])
}

#[async_trait]
impl Signer for Secp256k1Signer {
    fn address(&self) -> H160 {
        self.address
    }

    async fn sign_transaction(&self, tx: LegacyTransactionMessage) -> Result<Vec<u8>, Error> {
        let chain_id = tx.chain_id.ok_or(Error::MissingChainId)?;
        let digest = tx.hash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| Error::Signing)?;
        let v = u64::from(recovery_id.to_byte()) + chain_id * 2 + 35;
        let bytes = signature.to_bytes();
        let signature = ethereum::TransactionSignature::new(
            v,
            H256::from_slice(&bytes[..32]),
            H256::from_slice(&bytes[32..]),
        )
        .ok_or(Error::Signing)?;
        let signed = ethereum::LegacyTransaction {
            nonce: tx.nonce,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            action: tx.action,
            value: tx.value,
            input: tx.input,
            signature,
        };
        Ok(rlp::encode(&signed).to_vec())
    }
}

/// A signer optionally connected to a network provider.
pub struct Wallet {
    signer: Arc<dyn Signer>,
    provider: Option<Arc<dyn Provider>>,
}

impl Wallet {
    pub fn new(signer: impl Signer + 'static) -> Self {
        Self {
            signer: Arc::new(signer),
            provider: None,
        }
    }

    /// Attaches a network provider, enabling submission and queries.
    pub fn connect(mut self, provider: Arc<dyn Provider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn address(&self) -> H160 {
        self.signer.address()
    }

    pub fn provider(&self) -> Result<&dyn Provider, Error> {
        self.provider.as_deref().ok_or(Error::MissingProvider)
    }

    pub async fn sign_transaction(&self, tx: LegacyTransactionMessage) -> Result<Vec<u8>, Error> {
        self.signer.sign_transaction(tx).await
    }

    /// Fills in nonce and gas, signs, and submits. Returns the pending
    /// transaction hash without waiting for inclusion.
    pub async fn send_transaction(
        &self,
        to: H160,
        data: Vec<u8>,
        value: U256,
    ) -> Result<H256, Error> {
        let provider = self.provider()?;
        let chain_id = provider.chain_id().await?;
        let nonce = provider.transaction_count(self.address()).await?;
        let gas_price = provider.gas_price().await?;
        let gas_limit = provider
            .estimate_gas(&CallRequest {
                from: Some(self.address()),
                to: Some(to),
                value,
                data: data.clone(),
            })
            .await?;
        let tx = LegacyTransactionMessage {
            chain_id: Some(chain_id),
            nonce: nonce.into(),
            gas_price,
            gas_limit,
            action: TransactionAction::Call(to),
            value,
            input: data,
        };
        let raw = self.signer.sign_transaction(tx).await?;
        Ok(provider.send_raw_transaction(&raw).await?)
    }
}
