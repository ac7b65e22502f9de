//! Referral-Scanner watches a contract for `BindReferral` events.
//!
//! The main entry point is [`ReferralScanner`], built via [`ReferralScannerBuilder`] and bound to
//! a [`ChainClient`] (usually an [`AlloyChainClient`]).
//!
//! After connecting, register one or more streams with [`ReferralScanner::subscribe`], then call
//! [`ReferralScanner::start`]. Starting replays the last `W` blocks (100 by default) and then
//! follows the chain through a live log subscription.
//!
//! # Stream items
//!
//! Each subscription yields a [`ReferralScannerResult`]. Successful items are [`Message`] values,
//! which wrap either a single decoded [`BindReferralEvent`] or a [`Notification`].
//!
//! # Delivery guarantees
//!
//! Every log occurrence, identified by its transaction hash and log index, is delivered at most
//! once, and events are delivered in non-decreasing block order. The backfill and the live stream
//! usually overlap around the head block; the overlap is absorbed by an in-memory dedup window.
//!
//! # Failures
//!
//! A failing backfill aborts [`ReferralScanner::start`] and no live subscription is opened. Once
//! live, node failures are reported on the streams as non-terminal `Err` items while the scanner
//! resubscribes with exponential backoff and catches up on missed blocks.
//!
//! Logs that do not decode as `BindReferral` are logged and skipped.
//!
//! # Stopping
//!
//! [`ScannerHandle::stop`] stops accepting live entries, releases the subscription and waits for
//! an in-flight delivery to finish. Streams end afterwards.

#[macro_use]
mod logging;

pub mod chain;
pub mod config;
pub mod format;
pub mod signature;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod decoder;
mod error;
mod filter;
mod log;
mod scanner;
mod types;

pub use chain::{AlloyChainClient, ChainClient, IntoRootProvider, LiveSubscription};
pub use config::DeploymentConfig;
pub use decoder::{BIND_REFERRAL_TOPIC_COUNT, BindReferralEvent, EventDecoder};
pub use error::{ChainQueryError, ConfigError, DecodeError, ScannerError};
pub use filter::EventFilter;
pub use log::{DedupKey, RawLogEntry};
pub use scanner::{
    BackfillScanner, DEFAULT_CALL_TIMEOUT, DEFAULT_LOOKBACK_WINDOW,
    DEFAULT_RESUBSCRIBE_MAX_DELAY, DEFAULT_RESUBSCRIBE_MIN_DELAY, DEFAULT_STREAM_BUFFER_CAPACITY,
    EventSubscription, LiveSubscriber, Message, ReferralScanner, ReferralScannerBuilder,
    ReferralScannerResult, ResubscribePolicy, ScannerHandle, backfill_range,
};
pub use signature::{bind_referral_topic, compute_signature_topic};
pub use types::{Notification, ScannerMessage, ScannerResult};
