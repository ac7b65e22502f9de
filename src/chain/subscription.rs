use std::{
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tokio_util::sync::CancellationToken;

use crate::{error::ChainQueryError, log::RawLogEntry};

/// A cancellable stream of live log entries.
///
/// The producer side of the stream watches the cancellation token and releases the underlying
/// node subscription once it fires. Dropping the `LiveSubscription` cancels it as well.
#[derive(Debug)]
pub struct LiveSubscription {
    inner: ReceiverStream<Result<RawLogEntry, ChainQueryError>>,
    stop: CancellationToken,
}

impl LiveSubscription {
    /// Wraps the receiving half of a producer channel.
    ///
    /// The producer is expected to stop and clean up when `stop` is cancelled.
    #[must_use]
    pub fn new(
        receiver: mpsc::Receiver<Result<RawLogEntry, ChainQueryError>>,
        stop: CancellationToken,
    ) -> Self {
        Self { inner: ReceiverStream::new(receiver), stop }
    }

    /// Signals the producer to stop and release the node subscription.
    pub fn cancel(&self) {
        self.stop.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.stop.is_cancelled()
    }
}

impl Stream for LiveSubscription {
    type Item = Result<RawLogEntry, ChainQueryError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
