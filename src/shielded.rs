//! The shielded call/transaction protocol.
//!
//! State changes travel as ordinary transactions whose calldata has been
//! encrypted. Read-only queries are authenticated differently: the encrypted
//! calldata is wrapped in a zero-value transaction that is signed but never
//! broadcast, and the resulting signature travels with the call so the node
//! can attribute the query to the caller.
use ethereum::{LegacyTransactionMessage, TransactionAction};
use primitive_types::{H160, H256, U256};

use crate::oracle::{self, EncryptionOracle};
use crate::provider;
use crate::types::SignedCall;
use crate::wallet::{self, Wallet};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Wallet(#[from] wallet::Error),

    #[error(transparent)]
    Oracle(#[from] oracle::Error),

    #[error(transparent)]
    Provider(#[from] provider::Error),

    #[error("malformed signed transaction: {0}")]
    MalformedTransaction(&'static str),
}

/// Encrypts `data` and submits it as a state-changing transaction to `to`.
///
/// Returns the pending transaction hash; waiting for inclusion is the
/// caller's concern. The encryption key handle is dropped here: the outcome
/// of a transaction is read from its receipt, not through the encryption
/// channel.
pub async fn send_shielded_transaction(
    wallet: &Wallet,
    oracle: &dyn EncryptionOracle,
    to: H160,
    data: Vec<u8>,
    value: U256,
) -> Result<H256, Error> {
    let encrypted = oracle.encrypt(&data).await?;
    tracing::debug!(to = ?to, "submitting shielded transaction");
    Ok(wallet.send_transaction(to, encrypted.data, value).await?)
}

/// Encrypts `data`, authenticates it with a signature over a never-broadcast
/// zero-value transaction, submits it as a read-only call against the latest
/// state and returns the decrypted response bytes.
pub async fn send_signed_shielded_query(
    wallet: &Wallet,
    oracle: &dyn EncryptionOracle,
    to: H160,
    data: Vec<u8>,
) -> Result<Vec<u8>, Error> {
    // Configuration must be sound before any network traffic happens.
    let provider = wallet.provider()?;

    let encrypted = oracle.encrypt(&data).await?;

    let chain_id = provider.chain_id().await?;
    // The transaction count only guards the query signature against reuse;
    // nothing is broadcast, so it is never spent on chain.
    let nonce = provider.transaction_count(wallet.address()).await?;

    let tx = query_transaction(nonce, to, encrypted.data, chain_id);
    let raw = wallet.sign_transaction(tx).await?;
    let call = signed_call_from_raw(&raw, nonce, chain_id)?;

    tracing::debug!(to = ?to, nonce, "submitting signed shielded query");
    let response = provider.call(&call).await?;

    Ok(oracle.decrypt(&response, &encrypted.key).await?)
}

/// The zero-value transaction that exists only to be signed for a query.
pub(crate) fn query_transaction(
    nonce: u64,
    to: H160,
    data: Vec<u8>,
    chain_id: u64,
) -> LegacyTransactionMessage {
    LegacyTransactionMessage {
        chain_id: Some(chain_id),
        nonce: nonce.into(),
        gas_price: U256::zero(),
        gas_limit: U256::zero(),
        action: TransactionAction::Call(to),
        value: U256::zero(),
        input: data,
    }
}

/// Builds the call envelope from a raw signed transaction.
///
/// Destination, calldata and signature are taken from the decoded bytes
/// rather than the pre-signing inputs, so the envelope cannot drift from
/// what was signed.
fn signed_call_from_raw(raw: &[u8], nonce: u64, chain_id: u64) -> Result<SignedCall, Error> {
    let tx = <ethereum::TransactionV2 as ethereum::EnvelopedDecodable>::decode(raw)
        .map_err(|_| Error::MalformedTransaction("undecodable rlp"))?;
    let tx = match tx {
        ethereum::TransactionV2::Legacy(tx) => tx,
        _ => return Err(Error::MalformedTransaction("not a legacy transaction")),
    };
    let to = match tx.action {
        TransactionAction::Call(to) => to,
        TransactionAction::Create => {
            return Err(Error::MalformedTransaction("missing destination"))
        }
    };
    Ok(SignedCall {
        nonce,
        to,
        data: tx.input,
        v: tx.signature.v(),
        r: U256::from_big_endian(tx.signature.r().as_bytes()),
        s: U256::from_big_endian(tx.signature.s().as_bytes()),
        chain_id,
    })
}
