use std::{mem::discriminant, path::PathBuf, sync::Arc, time::Duration};

use alloy::{
    primitives::B256,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

use crate::types::ScannerResult;

/// Failures of the chain client while querying heads, logs or subscriptions.
///
/// During the backfill phase these abort [`ReferralScanner::start`](crate::ReferralScanner::start).
/// During the live phase they are reported on the stream and handled by resubscribing.
#[derive(Error, Debug, Clone)]
pub enum ChainQueryError {
    /// The underlying RPC transport returned an error.
    #[error("RPC error: {0}")]
    RpcError(Arc<RpcError<TransportErrorKind>>),

    /// The caller-supplied timeout elapsed before the chain answered.
    #[error("Operation timed out")]
    Timeout,

    /// The live log subscription was closed by the remote end.
    #[error("Subscription closed")]
    SubscriptionClosed,

    /// The live log subscription fell behind and dropped entries.
    #[error("Subscription lagged, {0} entries skipped")]
    Lagged(u64),
}

impl From<RpcError<TransportErrorKind>> for ChainQueryError {
    fn from(error: RpcError<TransportErrorKind>) -> Self {
        ChainQueryError::RpcError(Arc::new(error))
    }
}

impl From<tokio::time::error::Elapsed> for ChainQueryError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ChainQueryError::Timeout
    }
}

/// Reasons a raw log entry cannot be decoded into a
/// [`BindReferralEvent`](crate::BindReferralEvent).
///
/// Always non-fatal: the scanner logs the entry and skips it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Topic count mismatch: expected {expected}, got {actual}")]
    TopicCountMismatch { expected: usize, actual: usize },

    #[error("Signature topic mismatch: expected {expected}, got {actual}")]
    SignatureMismatch { expected: B256, actual: B256 },
}

/// Errors raised while loading the deployment configuration, before a scanner exists.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read deployment file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed deployment file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Watched contract address is missing from the deployment file")]
    MissingContractAddress,

    #[error("Invalid {field} address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Errors emitted by the scanner.
///
/// Returned by [`ReferralScannerBuilder::connect`](crate::ReferralScannerBuilder::connect) and
/// [`ReferralScanner::start`](crate::ReferralScanner::start), and yielded by subscription
/// streams as non-terminal `Err` items while the live phase recovers.
#[derive(Error, Debug, Clone)]
pub enum ScannerError {
    #[error(transparent)]
    ChainQuery(#[from] ChainQueryError),

    /// The configured stream buffer capacity is invalid (must be greater than zero).
    #[error("Stream buffer capacity must be greater than 0")]
    InvalidBufferCapacity,

    /// The configured call timeout is invalid (must be greater than zero).
    #[error("Call timeout must be greater than 0")]
    InvalidCallTimeout,

    #[error("Resubscribe min delay {min:?} exceeds max delay {max:?}")]
    InvalidResubscribeDelay { min: Duration, max: Duration },
}

impl From<RpcError<TransportErrorKind>> for ScannerError {
    fn from(error: RpcError<TransportErrorKind>) -> Self {
        ScannerError::ChainQuery(error.into())
    }
}

impl PartialEq for ScannerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScannerError::ChainQuery(left), ScannerError::ChainQuery(right)) => {
                discriminant(left) == discriminant(right)
            }
            _ => discriminant(self) == discriminant(other),
        }
    }
}

impl<T: Clone> PartialEq<ScannerError> for ScannerResult<T> {
    fn eq(&self, other: &ScannerError) -> bool {
        match self {
            Ok(_) => false,
            Err(err) => err == other,
        }
    }
}
