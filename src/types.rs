//! Wire types shared by the provider and the shielded call protocol.
use primitive_types::{H160, H256, U256};
use serde::{Deserialize, Serialize};

/// A signed read-only call envelope.
///
/// This is the object submitted to the node's raw call method. It is treated
/// like a transaction by the node's signature check, but it is never
/// broadcast and consumes no on-chain nonce. The `to` and `data` fields must
/// come from decoding the raw signed transaction, so that the envelope is
/// guaranteed to match the bytes that were actually signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCall {
    #[serde(with = "quantity")]
    pub nonce: u64,
    pub to: H160,
    #[serde(with = "data_hex")]
    pub data: Vec<u8>,
    #[serde(with = "quantity")]
    pub v: u64,
    pub r: U256,
    pub s: U256,
    #[serde(with = "quantity")]
    pub chain_id: u64,
}

/// Call parameters for gas estimation.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<H160>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<H160>,
    pub value: U256,
    #[serde(with = "data_hex")]
    pub data: Vec<u8>,
}

/// The subset of a transaction receipt this client acts on.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    #[serde(default, with = "quantity_opt")]
    pub block_number: Option<u64>,
    #[serde(default, with = "quantity_opt")]
    pub status: Option<u64>,
}

/// Serde helpers for `QUANTITY` fields: minimal `0x`-prefixed hex, so a nonce
/// of five is `"0x5"` and never `"0x05"`.
pub(crate) mod quantity {
    use serde::Serializer;

    pub(crate) fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub(crate) fn parse(raw: &str) -> Result<u64, &'static str> {
        let digits = raw
            .strip_prefix("0x")
            .ok_or("expected a 0x-prefixed quantity")?;
        u64::from_str_radix(digits, 16).map_err(|_| "quantity out of range")
    }
}

pub(crate) mod quantity_opt {
    use serde::{de, Deserialize, Deserializer};

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| super::quantity::parse(&raw).map_err(de::Error::custom))
            .transpose()
    }
}

/// Serde helpers for `DATA` fields: `0x`-prefixed byte strings.
pub(crate) mod data_hex {
    use serde::Serializer;

    pub(crate) fn serialize<S: Serializer>(
        value: &[u8],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(value))
    }

    pub(crate) fn encode(value: &[u8]) -> String {
        format!("0x{}", hex::encode(value))
    }

    pub(crate) fn decode(raw: &str) -> Result<Vec<u8>, &'static str> {
        let digits = raw.strip_prefix("0x").ok_or("expected 0x-prefixed data")?;
        hex::decode(digits).map_err(|_| "malformed hex data")
    }
}

/// Renders a wei amount as a decimal ether string, e.g. `"0.1"` or `"100.0"`.
pub fn format_ether(wei: U256) -> String {
    let base = U256::from(10).pow(18.into());
    let whole = wei / base;
    let frac = (wei % base).to_string();
    let frac = format!("{}{}", "0".repeat(18 - frac.len()), frac);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{frac}")
    }
}
