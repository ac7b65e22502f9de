//! Stream access types for the referral scanner.
//!
//! [`ScannerHandle`] and [`EventSubscription`] together enforce at compile time that the scanner
//! is started before its streams are read.

use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::ReferralScannerResult;

/// Proof that the scanner has been started, and control over the running pipeline.
///
/// Returned by [`ReferralScanner::start`](crate::ReferralScanner::start). Dropping the handle
/// leaves the pipeline running; call [`stop`](ScannerHandle::stop) to end it.
#[derive(Debug)]
pub struct ScannerHandle {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl ScannerHandle {
    pub(crate) fn new(stop: CancellationToken, task: JoinHandle<()>) -> Self {
        Self { stop, task }
    }

    /// Requests a cooperative stop and waits for the pipeline to wind down.
    ///
    /// No further live entries are accepted, the live subscription is released, and an entry that
    /// is already being delivered is delivered before the pipeline exits. Subscription streams end
    /// afterwards.
    pub async fn stop(self) {
        self.stop.cancel();
        self.join().await;
    }

    /// A token that stops the pipeline when cancelled.
    ///
    /// Useful for wiring signal handlers without moving the handle.
    #[must_use]
    pub fn stop_signal(&self) -> CancellationToken {
        self.stop.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the pipeline to end on its own, i.e. after a stop signal or once every
    /// subscription stream has been dropped.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            error!(error = %err, "Scanner task failed");
        }
    }
}

/// A subscription to scanner events that requires proof the scanner has started.
///
/// Created by [`ReferralScanner::subscribe`](crate::ReferralScanner::subscribe). The stream is
/// only reachable through [`stream`](EventSubscription::stream), which takes a [`ScannerHandle`].
///
/// # Example
///
/// ```no_run
/// # use alloy::{network::Ethereum, primitives::address};
/// # use referral_scanner::{AlloyChainClient, Message, ReferralScannerBuilder};
/// # use tokio_stream::StreamExt;
/// #
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let contract = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
/// let client = AlloyChainClient::<Ethereum>::connect("ws://localhost:8545").await?;
/// let mut scanner = ReferralScannerBuilder::new(contract).connect(client)?;
///
/// let subscription = scanner.subscribe();
/// let handle = scanner.start().await?;
/// let mut stream = subscription.stream(&handle);
///
/// while let Some(Ok(Message::Data(event))) = stream.next().await {
///     println!("{} -> {}", event.user, event.parent);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EventSubscription {
    inner: ReceiverStream<ReferralScannerResult>,
}

impl EventSubscription {
    pub(crate) fn new(inner: ReceiverStream<ReferralScannerResult>) -> Self {
        Self { inner }
    }

    /// Access the event stream.
    ///
    /// Requires a reference to a [`ScannerHandle`] as proof that the scanner has been started.
    #[must_use]
    pub fn stream(self, _handle: &ScannerHandle) -> ReceiverStream<ReferralScannerResult> {
        self.inner
    }
}
