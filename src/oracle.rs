//! The calldata encryption oracle.
//!
//! Outgoing calldata is sealed to the node's published X25519 key; the node
//! seals its response with the same negotiated key. The request envelope is
//! `ephemeral_pk(32) ‖ nonce(15) ‖ ciphertext`, the response envelope is
//! `nonce(15) ‖ ciphertext`.
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore as _;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize as _;

use crate::mrae;
use crate::provider::{self, Provider};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Provider(#[from] provider::Error),

    #[error("malformed encryption envelope: {0}")]
    MalformedEnvelope(&'static str),

    #[error(transparent)]
    Crypto(#[from] mrae::Error),
}

/// Identifies the key material needed to decrypt the response that matches
/// an encrypted request. Wiped on drop.
pub struct KeyHandle([u8; mrae::KEY_SIZE]);

impl KeyHandle {
    pub fn new(key: [u8; mrae::KEY_SIZE]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; mrae::KEY_SIZE] {
        &self.0
    }
}

impl Drop for KeyHandle {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Ciphertext plus the key handle needed to decrypt the matching response.
pub struct EncryptedPayload {
    pub data: Vec<u8>,
    pub key: KeyHandle,
}

/// Encrypts outgoing calldata and decrypts node responses.
#[async_trait]
pub trait EncryptionOracle: Send + Sync {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, Error>;

    async fn decrypt(&self, ciphertext: &[u8], key: &KeyHandle) -> Result<Vec<u8>, Error>;
}

/// Oracle backed by the node's published encryption key.
pub struct X25519DeoxysOracle {
    provider: Arc<dyn Provider>,
}

impl X25519DeoxysOracle {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl EncryptionOracle for X25519DeoxysOracle {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptedPayload, Error> {
        let node_key = self.provider.node_public_key().await?;

        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        let key = mrae::derive_symmetric_key(&node_key, &secret);

        let mut nonce = [0u8; mrae::NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let sealed = mrae::seal(&key, &nonce, plaintext, &[]);

        let mut data = Vec::with_capacity(32 + mrae::NONCE_SIZE + sealed.len());
        data.extend_from_slice(public.as_bytes());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&sealed);

        Ok(EncryptedPayload {
            data,
            key: KeyHandle::new(key),
        })
    }

    async fn decrypt(&self, ciphertext: &[u8], key: &KeyHandle) -> Result<Vec<u8>, Error> {
        if ciphertext.len() < mrae::NONCE_SIZE + mrae::TAG_SIZE {
            return Err(Error::MalformedEnvelope("response shorter than nonce and tag"));
        }
        let (nonce, sealed) = ciphertext.split_at(mrae::NONCE_SIZE);
        let nonce: [u8; mrae::NONCE_SIZE] = nonce
            .try_into()
            .map_err(|_| Error::MalformedEnvelope("bad nonce length"))?;
        Ok(mrae::open(key.as_bytes(), &nonce, sealed, &[])?)
    }
}
