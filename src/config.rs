//! Process configuration.
//!
//! All environment access happens here; the rest of the crate receives an
//! explicit, already-validated [`Config`].
use std::env;

use anyhow::{anyhow, Context as _, Result};
use primitive_types::{H160, U256};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_RECIPIENT: &str = "0x16af037878a6cAce2Ea29d39A3757aC2F6F7aac1";
/// 0.1 ether, the fixed funding amount that mints tokens.
const DEFAULT_MINT_VALUE_WEI: &str = "100000000000000000";
/// 1 whole token.
const DEFAULT_TRANSFER_AMOUNT_WEI: &str = "1000000000000000000";

/// Validated run configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// JSON-RPC endpoint of the confidential chain node.
    pub rpc_url: String,
    /// Hex private key of the funding/transferring account.
    pub private_key: String,
    /// Address of the token contract.
    pub token: H160,
    /// Recipient of the shielded transfer.
    pub recipient: H160,
    /// Value attached to the funding transaction, in wei.
    pub mint_value: U256,
    /// Token amount to transfer, in base units.
    pub transfer_amount: U256,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let private_key = get("PRIVATE_KEY").ok_or_else(|| anyhow!("PRIVATE_KEY is not set"))?;
        let rpc_url = get("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let token = parse_address(
            &get("TOKEN_ADDRESS").ok_or_else(|| anyhow!("TOKEN_ADDRESS is not set"))?,
        )
        .context("bad TOKEN_ADDRESS")?;
        let recipient = parse_address(
            &get("TRANSFER_RECIPIENT").unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
        )
        .context("bad TRANSFER_RECIPIENT")?;
        let mint_value = parse_wei(
            &get("MINT_VALUE_WEI").unwrap_or_else(|| DEFAULT_MINT_VALUE_WEI.to_string()),
        )
        .context("bad MINT_VALUE_WEI")?;
        let transfer_amount = parse_wei(
            &get("TRANSFER_AMOUNT_WEI")
                .unwrap_or_else(|| DEFAULT_TRANSFER_AMOUNT_WEI.to_string()),
        )
        .context("bad TRANSFER_AMOUNT_WEI")?;

        Ok(Self {
            rpc_url,
            private_key,
            token,
            recipient,
            mint_value,
            transfer_amount,
        })
    }
}

fn parse_address(raw: &str) -> Result<H160> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    format!("0x{digits}")
        .parse()
        .map_err(|_| anyhow!("expected a 20-byte hex address"))
}

fn parse_wei(raw: &str) -> Result<U256> {
    U256::from_dec_str(raw.trim()).map_err(|_| anyhow!("expected a decimal wei amount"))
}
