use std::{env, path::PathBuf};

use alloy::network::Ethereum;
use referral_scanner::{
    AlloyChainClient, DeploymentConfig, Message, Notification, ReferralScannerBuilder,
    config::DEFAULT_DEPLOYMENT_FILE,
    format::{canonical_address, is_zero_address, shorten_address},
};
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_RPC_URL: &str = "ws://localhost:8545";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).try_init();

    // Usage: watch_referrals [rpc-url] [deployment-file]. `RPC_URL` takes precedence over the
    // first argument.
    let args: Vec<String> = env::args().skip(1).collect();
    let rpc_url = env::var("RPC_URL")
        .ok()
        .or_else(|| args.first().cloned())
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_owned());
    let deployment_file =
        args.get(1).map_or_else(|| PathBuf::from(DEFAULT_DEPLOYMENT_FILE), PathBuf::from);

    let config = DeploymentConfig::load(&deployment_file)?;
    let client = AlloyChainClient::<Ethereum>::connect(rpc_url.as_str()).await?;
    let client_version = match client.client_version().await {
        Ok(version) => version,
        Err(e) => {
            warn!("Could not read the node client version: {}", e);
            "unknown".to_owned()
        }
    };
    info!(
        "Watching staking contract {} on {} via {} ({})",
        canonical_address(&config.contract_address),
        config.network_label(),
        rpc_url,
        client_version
    );

    let mut scanner = ReferralScannerBuilder::from_config(&config).connect(client)?;
    let subscription = scanner.subscribe();

    let handle = scanner.start().await?;
    let stop = handle.stop_signal();
    let mut stream = subscription.stream(&handle);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping scanner...");
            stop.cancel();
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Data(event)) => {
                if is_zero_address(&event.parent) {
                    warn!("User {} bound without a parent", canonical_address(&event.user));
                }
                info!(
                    "BindReferral at block {}: user {} -> parent {} (bound at block {}, tx {})",
                    event.observed_block,
                    shorten_address(&event.user),
                    shorten_address(&event.parent),
                    event.bound_at_block,
                    event.transaction_hash
                );
            }
            Ok(Message::Notification(Notification::NoPastEventsFound)) => {
                info!("No referrals bound in the lookback window");
            }
            Ok(Message::Notification(notification)) => {
                info!("Received notification: {:?}", notification);
            }
            Err(e) => {
                warn!("Scanner reported an error: {}", e);
            }
        }
    }

    handle.join().await;
    info!("Event stream closed");
    Ok(())
}
