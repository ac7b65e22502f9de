use std::time::Duration;

use backon::ExponentialBuilder;

use crate::{
    chain::{ChainClient, LiveSubscription, with_timeout},
    error::ChainQueryError,
    filter::EventFilter,
};

/// Default delay before the first resubscription attempt.
pub const DEFAULT_RESUBSCRIBE_MIN_DELAY: Duration = Duration::from_secs(1);

/// Upper bound of the delay between resubscription attempts.
pub const DEFAULT_RESUBSCRIBE_MAX_DELAY: Duration = Duration::from_secs(30);

/// Backoff applied while (re)establishing the live phase.
///
/// Attempts are unbounded: the live phase is never abandoned because of node trouble, only
/// because the scanner was stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResubscribePolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ResubscribePolicy {
    fn default() -> Self {
        Self { min_delay: DEFAULT_RESUBSCRIBE_MIN_DELAY, max_delay: DEFAULT_RESUBSCRIBE_MAX_DELAY }
    }
}

impl ResubscribePolicy {
    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .without_max_times()
    }
}

/// Opens live log streams.
#[derive(Clone, Debug)]
pub struct LiveSubscriber<C> {
    client: C,
    call_timeout: Duration,
}

impl<C: ChainClient> LiveSubscriber<C> {
    pub fn new(client: C, call_timeout: Duration) -> Self {
        Self { client, call_timeout }
    }

    /// Subscribes to new logs matching `filter`.
    ///
    /// Any block bounds on `filter` are dropped: the stream starts at whatever the node considers
    /// new activity. The stream may overlap with earlier scans and may skip entries across
    /// reconnects, so consumers must deduplicate.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::Timeout`] if the node does not confirm the subscription in
    /// time, or the client's error otherwise.
    pub async fn subscribe(
        &self,
        filter: &EventFilter,
    ) -> Result<LiveSubscription, ChainQueryError> {
        let live = filter.live();
        let subscription = with_timeout(self.call_timeout, self.client.subscribe_logs(&live)).await;
        match &subscription {
            Ok(_) => debug!(filter = %live, "Live subscription opened"),
            Err(err) => warn!(filter = %live, error = %err, "Failed to open live subscription"),
        }
        subscription
    }
}
