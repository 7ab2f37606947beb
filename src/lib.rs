//! Client for shielded token operations on confidential EVM networks.
//!
//! Calldata never travels in plain text: state-changing transactions carry an
//! encrypted payload, and read-only queries are authenticated by signing a
//! zero-value transaction that is submitted through `eth_call` instead of
//! being broadcast. The node encrypts its responses with the ephemeral key
//! negotiated for the request.
#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod erc20;
pub mod mrae;
pub mod oracle;
pub mod provider;
pub mod shielded;
pub mod types;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use app::TransferPlan;
pub use config::Config;
pub use erc20::Erc20;
pub use oracle::{EncryptedPayload, EncryptionOracle, KeyHandle, X25519DeoxysOracle};
pub use provider::{HttpProvider, Provider};
pub use shielded::{send_shielded_transaction, send_signed_shielded_query};
pub use types::SignedCall;
pub use wallet::{Secp256k1Signer, Signer, Wallet};
