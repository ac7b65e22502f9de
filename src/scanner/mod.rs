use std::time::Duration;

use alloy::{
    network::{Ethereum, Network},
    primitives::{Address, BlockNumber},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::{
    BindReferralEvent, ScannerError,
    chain::{AlloyChainClient, ChainClient, IntoRootProvider},
    config::DeploymentConfig,
    filter::EventFilter,
    types::ScannerResult,
};

mod backfill;
mod coordinator;
mod handle;
mod live;
mod message;
mod seen_set;

pub use backfill::{BackfillScanner, backfill_range};
pub use handle::{EventSubscription, ScannerHandle};
pub use live::{
    DEFAULT_RESUBSCRIBE_MAX_DELAY, DEFAULT_RESUBSCRIBE_MIN_DELAY, LiveSubscriber,
    ResubscribePolicy,
};
pub use message::Message;

use coordinator::Coordinator;

/// Default number of blocks behind the head replayed at startup.
pub const DEFAULT_LOOKBACK_WINDOW: u64 = 100;

/// Default upper bound for a single chain query.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of items each subscription stream buffers before delivery waits.
pub const DEFAULT_STREAM_BUFFER_CAPACITY: usize = 50_000;

/// Item yielded by subscription streams.
pub type ReferralScannerResult = ScannerResult<BindReferralEvent>;

/// Configures and connects a [`ReferralScanner`].
#[derive(Clone, Debug)]
pub struct ReferralScannerBuilder {
    contract_address: Address,
    lookback_window: u64,
    call_timeout: Duration,
    buffer_capacity: usize,
    resubscribe_policy: ResubscribePolicy,
    catch_up: bool,
}

impl ReferralScannerBuilder {
    /// Watches `BindReferral` events emitted by `contract_address`.
    #[must_use]
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            lookback_window: DEFAULT_LOOKBACK_WINDOW,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            buffer_capacity: DEFAULT_STREAM_BUFFER_CAPACITY,
            resubscribe_policy: ResubscribePolicy::default(),
            catch_up: true,
        }
    }

    /// Watches the contract named by a deployment file.
    #[must_use]
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(config.contract_address)
    }

    /// Number of blocks behind the head to replay at startup.
    ///
    /// The backfill covers `[head - blocks, head]`, clamped at genesis. Zero replays only the head
    /// block.
    #[must_use]
    pub fn lookback_window(mut self, blocks: u64) -> Self {
        self.lookback_window = blocks;
        self
    }

    /// Upper bound for each chain query. Elapsed calls fail with
    /// [`ChainQueryError::Timeout`](crate::ChainQueryError::Timeout) and are not retried in place.
    #[must_use]
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Buffer size of every subscription stream. Must be greater than zero.
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Bounds of the exponential backoff used while re-establishing the live phase.
    #[must_use]
    pub fn resubscribe_delays(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.resubscribe_policy = ResubscribePolicy { min_delay, max_delay };
        self
    }

    /// Whether to query the blocks missed since the last scan every time the live phase is
    /// (re)established. Enabled by default.
    #[must_use]
    pub fn catch_up(mut self, enabled: bool) -> Self {
        self.catch_up = enabled;
        self
    }

    /// Validates the settings and binds them to `client`.
    ///
    /// # Errors
    ///
    /// * [`ScannerError::InvalidBufferCapacity`] if the buffer capacity is zero.
    /// * [`ScannerError::InvalidCallTimeout`] if the call timeout is zero.
    /// * [`ScannerError::InvalidResubscribeDelay`] if the minimum delay exceeds the maximum.
    pub fn connect<C: ChainClient>(self, client: C) -> Result<ReferralScanner<C>, ScannerError> {
        if self.buffer_capacity == 0 {
            return Err(ScannerError::InvalidBufferCapacity);
        }
        if self.call_timeout.is_zero() {
            return Err(ScannerError::InvalidCallTimeout);
        }
        let ResubscribePolicy { min_delay, max_delay } = self.resubscribe_policy;
        if min_delay > max_delay {
            return Err(ScannerError::InvalidResubscribeDelay { min: min_delay, max: max_delay });
        }

        Ok(ReferralScanner {
            filter: EventFilter::bind_referral(self.contract_address),
            backfill: BackfillScanner::new(client.clone(), self.call_timeout),
            live: LiveSubscriber::new(client, self.call_timeout),
            config: self,
            listeners: Vec::new(),
        })
    }

    /// Connects to a node through alloy and binds the settings to it.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::ChainQuery`] if the node cannot be reached, or any error of
    /// [`connect`](Self::connect).
    pub async fn connect_provider<N: Network>(
        self,
        provider: impl IntoRootProvider<N>,
    ) -> Result<ReferralScanner<AlloyChainClient<N>>, ScannerError> {
        let client = AlloyChainClient::connect(provider).await?;
        self.connect(client)
    }
}

/// A connected, not yet started referral scanner.
///
/// Register streams with [`subscribe`](Self::subscribe), then call [`start`](Self::start).
pub struct ReferralScanner<C = AlloyChainClient<Ethereum>> {
    config: ReferralScannerBuilder,
    filter: EventFilter,
    backfill: BackfillScanner<C>,
    live: LiveSubscriber<C>,
    listeners: Vec<mpsc::Sender<ReferralScannerResult>>,
}

impl<C: ChainClient> ReferralScanner<C> {
    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Registers a new stream. Every registered stream receives every delivered item.
    ///
    /// Streams registered after [`start`](Self::start) are not possible, since `start` consumes
    /// the scanner.
    #[must_use]
    pub fn subscribe(&mut self) -> EventSubscription {
        let (sender, receiver) = mpsc::channel(self.config.buffer_capacity);
        self.listeners.push(sender);
        EventSubscription::new(ReceiverStream::new(receiver))
    }

    /// Runs the backfill and, once it succeeds, starts the pipeline in the background.
    ///
    /// The head block and the backfill query happen before this returns. The pipeline then
    /// delivers the backfilled events, announces
    /// [`Notification::NoPastEventsFound`](crate::Notification::NoPastEventsFound) if there were
    /// none, opens the live subscription and announces
    /// [`Notification::SwitchingToLive`](crate::Notification::SwitchingToLive).
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::ChainQuery`] if the head block or the backfill query fails or times
    /// out. Nothing is delivered and no live subscription is opened in that case.
    pub async fn start(self) -> Result<ScannerHandle, ScannerError> {
        let head = self.backfill.head().await?;
        let range = backfill_range(head, self.config.lookback_window);
        info!(
            filter = %self.filter,
            block_range = ?range,
            listener_count = self.listeners.len(),
            "Starting referral scanner"
        );

        let entries = self.backfill.scan(&self.filter, range).await?;

        let stop = CancellationToken::new();
        let coordinator = Coordinator::new(
            self.filter,
            self.backfill,
            self.live,
            self.config.resubscribe_policy,
            self.config.catch_up,
            self.config.lookback_window,
            self.listeners,
            head,
        );
        let task = tokio::spawn(coordinator.run(entries, stop.clone()));

        Ok(ScannerHandle::new(stop, task))
    }

    /// Head block the backfill window would be anchored at right now.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::ChainQuery`] if the query fails or times out.
    pub async fn head_block(&self) -> Result<BlockNumber, ScannerError> {
        Ok(self.backfill.head().await?)
    }
}
