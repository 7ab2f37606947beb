//! The mint-and-transfer sequence.
use anyhow::Result;
use primitive_types::{H160, U256};

use crate::erc20::{self, Erc20};
use crate::oracle::EncryptionOracle;
use crate::shielded;
use crate::types::format_ether;
use crate::wallet::Wallet;

/// What to mint and transfer, derived from [`crate::Config`].
#[derive(Clone, Debug)]
pub struct TransferPlan {
    pub token: H160,
    pub recipient: H160,
    pub mint_value: U256,
    pub transfer_amount: U256,
}

/// Runs the fixed sequence: fund/mint, read balance, shielded transfer,
/// read balance. Each step completes before the next begins and any failure
/// aborts the whole run.
///
/// Returns the two observed balances.
pub async fn run(
    wallet: &Wallet,
    oracle: &dyn EncryptionOracle,
    plan: &TransferPlan,
) -> Result<(U256, U256)> {
    let provider = wallet.provider()?;
    let token = Erc20(plan.token);

    tracing::info!(token = ?plan.token, value = %plan.mint_value, "funding token contract");
    let mint_tx = wallet
        .send_transaction(plan.token, vec![], plan.mint_value)
        .await?;
    provider.wait_for_receipt(mint_tx).await?;

    let balance_before = erc20::token_balance(wallet, oracle, &token).await?;
    println!(
        "User balance before transfer: {}",
        format_ether(balance_before)
    );

    tracing::info!(recipient = ?plan.recipient, amount = %plan.transfer_amount, "sending shielded transfer");
    let calldata = token.transfer(plan.recipient, plan.transfer_amount)?;
    let transfer_tx =
        shielded::send_shielded_transaction(wallet, oracle, plan.token, calldata, U256::zero())
            .await?;
    provider.wait_for_receipt(transfer_tx).await?;

    let balance_after = erc20::token_balance(wallet, oracle, &token).await?;
    println!(
        "User balance after transfer: {}",
        format_ether(balance_after)
    );

    Ok((balance_before, balance_after))
}
