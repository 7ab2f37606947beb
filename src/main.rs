use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use shielded_transfer::app::{self, TransferPlan};
use shielded_transfer::{Config, HttpProvider, Provider, Secp256k1Signer, Wallet, X25519DeoxysOracle};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let provider: Arc<dyn Provider> = Arc::new(HttpProvider::new(&config.rpc_url));
    let wallet =
        Wallet::new(Secp256k1Signer::from_hex(&config.private_key)?).connect(provider.clone());
    let oracle = X25519DeoxysOracle::new(provider);

    tracing::info!(rpc_url = %config.rpc_url, address = ?wallet.address(), "starting");
    let plan = TransferPlan {
        token: config.token,
        recipient: config.recipient,
        mint_value: config.mint_value,
        transfer_amount: config.transfer_amount,
    };
    app::run(&wallet, &oracle, &plan).await?;

    Ok(())
}
