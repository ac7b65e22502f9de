use alloy::{
    network::{Ethereum, Network},
    primitives::{B256, BlockNumber},
    providers::{Provider, RootProvider},
    pubsub::Subscription,
    rpc::types::{Filter, Log},
};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    chain::{ChainClient, IntoRootProvider, LiveSubscription},
    error::ChainQueryError,
    filter::EventFilter,
    log::RawLogEntry,
};

/// Default number of live entries buffered between the node subscription and the scanner.
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 1024;

/// [`ChainClient`] backed by an alloy [`RootProvider`].
///
/// Live subscriptions need a pubsub-capable transport (WebSocket or IPC); historical queries work
/// over any transport.
#[derive(Clone, Debug)]
pub struct AlloyChainClient<N: Network = Ethereum> {
    provider: RootProvider<N>,
    buffer_capacity: usize,
}

impl<N: Network> AlloyChainClient<N> {
    #[must_use]
    pub fn new(provider: RootProvider<N>) -> Self {
        Self { provider, buffer_capacity: DEFAULT_SUBSCRIPTION_BUFFER }
    }

    /// Connects to a node given a provider or a connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::RpcError`] if the connection cannot be established.
    pub async fn connect(provider: impl IntoRootProvider<N>) -> Result<Self, ChainQueryError> {
        Ok(Self::new(provider.into_root_provider().await?))
    }

    /// Sets how many live entries may queue up before the node subscription is back-pressured.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Version string the node reports through `web3_clientVersion`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::RpcError`] if the call fails.
    pub async fn client_version(&self) -> Result<String, ChainQueryError> {
        Ok(self.provider.get_client_version().await?)
    }

    #[must_use]
    pub fn provider(&self) -> &RootProvider<N> {
        &self.provider
    }
}

impl<N: Network> ChainClient for AlloyChainClient<N> {
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError> {
        trace!("eth_blockNumber called");
        let result = self.provider.get_block_number().await;
        if let Err(err) = &result {
            error!(error = %err, "eth_blockNumber failed");
        }
        Ok(result?)
    }

    async fn get_logs(&self, filter: &EventFilter) -> Result<Vec<RawLogEntry>, ChainQueryError> {
        trace!(filter = %filter, "eth_getLogs called");
        let logs = match self.provider.get_logs(&Filter::from(filter)).await {
            Ok(logs) => logs,
            Err(err) => {
                error!(error = %err, "eth_getLogs failed");
                return Err(err.into());
            }
        };
        Ok(logs.iter().filter_map(to_raw_entry).collect())
    }

    async fn subscribe_logs(
        &self,
        filter: &EventFilter,
    ) -> Result<LiveSubscription, ChainQueryError> {
        trace!(filter = %filter, "eth_subscribe called");
        let subscription = match self.provider.subscribe_logs(&Filter::from(filter)).await {
            Ok(subscription) => subscription,
            Err(err) => {
                error!(error = %err, "eth_subscribe failed");
                return Err(err.into());
            }
        };

        let (sender, receiver) = mpsc::channel(self.buffer_capacity);
        let stop = CancellationToken::new();
        tokio::spawn(forward_subscription(
            self.provider.clone(),
            subscription,
            sender,
            stop.clone(),
        ));

        Ok(LiveSubscription::new(receiver, stop))
    }
}

fn to_raw_entry(log: &Log) -> Option<RawLogEntry> {
    let entry = RawLogEntry::from_rpc_log(log);
    if entry.is_none() {
        debug!(
            removed = log.removed,
            block_number = ?log.block_number,
            "Skipping log that is pending or was removed by a reorg"
        );
    }
    entry
}

/// Pumps the node subscription into `sender` until `stop` fires, the consumer goes away or the
/// node closes the subscription, then releases the subscription on the node.
async fn forward_subscription<N: Network>(
    provider: RootProvider<N>,
    mut subscription: Subscription<Log>,
    sender: mpsc::Sender<Result<RawLogEntry, ChainQueryError>>,
    stop: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            biased;
            () = stop.cancelled() => break,
            received = subscription.recv() => received,
        };

        let item = match received {
            Ok(log) => match to_raw_entry(&log) {
                Some(entry) => Ok(entry),
                None => continue,
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped = skipped, "Log subscription lagged");
                Err(ChainQueryError::Lagged(skipped))
            }
            Err(RecvError::Closed) => {
                warn!("Log subscription closed by the node");
                forward(&sender, &stop, Err(ChainQueryError::SubscriptionClosed)).await;
                break;
            }
        };

        if !forward(&sender, &stop, item).await {
            break;
        }
    }

    release_subscription(&provider, *subscription.local_id());
}

/// Drops the node-side subscription `id`. Returns whether the provider accepted the release.
fn release_subscription<N: Network>(provider: &RootProvider<N>, id: B256) -> bool {
    match provider.unsubscribe(id) {
        Ok(()) => {
            debug!(id = %id, "Log subscription released");
            true
        }
        Err(err) => {
            debug!(id = %id, error = %err, "eth_unsubscribe failed");
            false
        }
    }
}

async fn forward(
    sender: &mpsc::Sender<Result<RawLogEntry, ChainQueryError>>,
    stop: &CancellationToken,
    item: Result<RawLogEntry, ChainQueryError>,
) -> bool {
    tokio::select! {
        biased;
        () = stop.cancelled() => false,
        sent = sender.send(item) => sent.is_ok(),
    }
}
