//! Chain access used by the scanner.
//!
//! [`ChainClient`] is the seam between the scanner and a node. [`AlloyChainClient`] implements it
//! on top of an alloy [`RootProvider`](alloy::providers::RootProvider); tests use the scripted
//! client from `test_utils`.

use std::time::Duration;

use alloy::primitives::BlockNumber;
use tokio::time::timeout;

use crate::{error::ChainQueryError, filter::EventFilter, log::RawLogEntry};

mod alloy_client;
mod provider_conversion;
mod subscription;

pub use alloy_client::{AlloyChainClient, DEFAULT_SUBSCRIPTION_BUFFER};
pub use provider_conversion::IntoRootProvider;
pub use subscription::LiveSubscription;

/// Source of block heights, historical logs and live logs.
///
/// Implementations are cheap to clone and shared between the scanner's phases. None of the
/// methods retry internally; the scanner bounds every call with its own timeout.
pub trait ChainClient: Clone + Send + Sync + 'static {
    /// Returns the current head block number.
    fn block_number(&self) -> impl Future<Output = Result<BlockNumber, ChainQueryError>> + Send;

    /// Returns the mined logs matching `filter`, which must have a closed block range.
    fn get_logs(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<RawLogEntry>, ChainQueryError>> + Send;

    /// Opens a live log stream for `filter`.
    ///
    /// The stream yields entries as new blocks are observed. Transport problems are yielded as
    /// `Err` items; the stream ends when the remote side closes the subscription.
    fn subscribe_logs(
        &self,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<LiveSubscription, ChainQueryError>> + Send;
}

/// Runs `operation`, failing with [`ChainQueryError::Timeout`] once `duration` elapses.
pub(crate) async fn with_timeout<T>(
    duration: Duration,
    operation: impl Future<Output = Result<T, ChainQueryError>>,
) -> Result<T, ChainQueryError> {
    timeout(duration, operation).await?
}
