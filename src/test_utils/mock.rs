use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use alloy::primitives::BlockNumber;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    chain::{ChainClient, LiveSubscription},
    error::ChainQueryError,
    filter::EventFilter,
    log::RawLogEntry,
};

const LIVE_BUFFER: usize = 1024;

#[derive(Debug)]
struct LiveFeed {
    filter: EventFilter,
    sender: Option<mpsc::Sender<Result<RawLogEntry, ChainQueryError>>>,
    stop: CancellationToken,
}

impl LiveFeed {
    fn is_active(&self) -> bool {
        self.sender.is_some() && !self.stop.is_cancelled()
    }
}

#[derive(Debug, Default)]
struct State {
    head: BlockNumber,
    logs: Vec<RawLogEntry>,
    block_number_failures: VecDeque<ChainQueryError>,
    get_logs_failures: VecDeque<ChainQueryError>,
    subscribe_failures: VecDeque<ChainQueryError>,
    call_delay: Option<Duration>,
    block_number_calls: usize,
    get_logs_calls: Vec<EventFilter>,
    feeds: Vec<LiveFeed>,
}

/// Scripted in-memory [`ChainClient`].
///
/// Holds a head block and a set of stored logs that historical queries are answered from.
/// Live subscriptions are fed by hand through [`emit_live`](Self::emit_live) and friends.
/// Failures can be queued per method and are returned by the next matching calls, in order.
#[derive(Clone, Debug, Default)]
pub struct MockChainClient {
    state: Arc<Mutex<State>>,
}

impl MockChainClient {
    #[must_use]
    pub fn new(head: BlockNumber) -> Self {
        let client = Self::default();
        client.state().head = head;
        client
    }

    fn state(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_head(&self, head: BlockNumber) {
        self.state().head = head;
    }

    #[must_use]
    pub fn head(&self) -> BlockNumber {
        self.state().head
    }

    /// Stores logs for historical queries without touching live subscriptions.
    pub fn add_logs(&self, entries: impl IntoIterator<Item = RawLogEntry>) {
        self.state().logs.extend(entries);
    }

    /// Mines `entry`: stores it, advances the head to its block and pushes it to every active
    /// subscription whose filter matches.
    pub fn emit_live(&self, entry: RawLogEntry) {
        let mut state = self.state();
        state.head = state.head.max(entry.block_number);
        state.logs.push(entry.clone());
        Self::push(&mut state, &entry);
    }

    /// Pushes `entry` to active subscriptions only, as a node replaying a log would.
    pub fn push_live(&self, entry: RawLogEntry) {
        Self::push(&mut self.state(), &entry);
    }

    fn push(state: &mut State, entry: &RawLogEntry) {
        for feed in state.feeds.iter().filter(|feed| feed.is_active()) {
            let topic0 = entry.topics.first();
            if !feed.filter.matches(entry.address, topic0, entry.block_number) {
                continue;
            }
            if let Some(sender) = &feed.sender {
                let _ = sender.try_send(Ok(entry.clone()));
            }
        }
    }

    /// Pushes an error item to every active subscription.
    pub fn emit_live_error(&self, error: ChainQueryError) {
        let state = self.state();
        for feed in state.feeds.iter().filter(|feed| feed.is_active()) {
            if let Some(sender) = &feed.sender {
                let _ = sender.try_send(Err(error.clone()));
            }
        }
    }

    /// Ends every open subscription stream, as a node dropping the connection would.
    pub fn close_live(&self) {
        for feed in &mut self.state().feeds {
            feed.sender = None;
        }
    }

    pub fn fail_next_block_number(&self, error: ChainQueryError) {
        self.state().block_number_failures.push_back(error);
    }

    pub fn fail_next_get_logs(&self, error: ChainQueryError) {
        self.state().get_logs_failures.push_back(error);
    }

    pub fn fail_next_subscribe(&self, error: ChainQueryError) {
        self.state().subscribe_failures.push_back(error);
    }

    /// Delays every subsequent call by `delay`.
    pub fn set_call_delay(&self, delay: Duration) {
        self.state().call_delay = Some(delay);
    }

    pub fn clear_call_delay(&self) {
        self.state().call_delay = None;
    }

    #[must_use]
    pub fn block_number_calls(&self) -> usize {
        self.state().block_number_calls
    }

    /// Filters of every `get_logs` call so far, in call order.
    #[must_use]
    pub fn get_logs_calls(&self) -> Vec<EventFilter> {
        self.state().get_logs_calls.clone()
    }

    /// Filters of every successful subscription so far, in call order.
    #[must_use]
    pub fn subscribe_calls(&self) -> Vec<EventFilter> {
        self.state().feeds.iter().map(|feed| feed.filter).collect()
    }

    /// Number of subscriptions that are open and not cancelled by the consumer.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.state().feeds.iter().filter(|feed| feed.is_active()).count()
    }

    /// Number of subscriptions the consumer has cancelled or dropped.
    #[must_use]
    pub fn cancelled_subscriptions(&self) -> usize {
        self.state().feeds.iter().filter(|feed| feed.stop.is_cancelled()).count()
    }

    /// Waits until at least `count` subscriptions have been opened in total.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within five seconds.
    pub async fn wait_for_subscriptions(&self, count: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.state().feeds.len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for {count} subscription(s)");
    }

    /// Waits until no subscription is active any more.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within five seconds.
    pub async fn wait_for_release(&self) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.active_subscriptions() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for subscriptions to be released");
    }

    async fn delay(&self) {
        let delay = self.state().call_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl ChainClient for MockChainClient {
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError> {
        self.delay().await;
        let mut state = self.state();
        state.block_number_calls += 1;
        match state.block_number_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state.head),
        }
    }

    async fn get_logs(&self, filter: &EventFilter) -> Result<Vec<RawLogEntry>, ChainQueryError> {
        self.delay().await;
        let mut state = self.state();
        state.get_logs_calls.push(*filter);
        if let Some(error) = state.get_logs_failures.pop_front() {
            return Err(error);
        }

        let mut entries: Vec<_> = state
            .logs
            .iter()
            .filter(|entry| {
                filter.matches(entry.address, entry.topics.first(), entry.block_number)
            })
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.block_number, entry.log_index));
        Ok(entries)
    }

    async fn subscribe_logs(
        &self,
        filter: &EventFilter,
    ) -> Result<LiveSubscription, ChainQueryError> {
        self.delay().await;
        let mut state = self.state();
        if let Some(error) = state.subscribe_failures.pop_front() {
            return Err(error);
        }

        let (sender, receiver) = mpsc::channel(LIVE_BUFFER);
        let stop = CancellationToken::new();
        state.feeds.push(LiveFeed { filter: *filter, sender: Some(sender), stop: stop.clone() });
        Ok(LiveSubscription::new(receiver, stop))
    }
}
