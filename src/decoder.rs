use alloy::primitives::{Address, B256, BlockNumber, TxHash, U256};

use crate::{
    error::DecodeError,
    log::{DedupKey, RawLogEntry},
    signature::bind_referral_topic,
};

/// Number of topics carried by a `BindReferral` log: the signature plus three indexed arguments.
pub const BIND_REFERRAL_TOPIC_COUNT: usize = 4;

/// A decoded `BindReferral` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindReferralEvent {
    /// The account that bound a referrer.
    pub user: Address,
    /// The referrer.
    pub parent: Address,
    /// Block number recorded by the contract when the binding happened.
    pub bound_at_block: U256,
    /// Block in which the log was observed on chain.
    pub observed_block: BlockNumber,
    pub transaction_hash: TxHash,
    pub log_index: u64,
}

impl BindReferralEvent {
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey { transaction_hash: self.transaction_hash, log_index: self.log_index }
    }
}

/// Turns raw log entries into [`BindReferralEvent`]s.
///
/// Decoding is pure: it never touches chain state and never mutates its input, so a single
/// decoder can be shared freely between pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDecoder {
    signature_topic: B256,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(bind_referral_topic())
    }
}

impl EventDecoder {
    #[must_use]
    pub fn new(signature_topic: B256) -> Self {
        Self { signature_topic }
    }

    #[must_use]
    pub fn signature_topic(&self) -> B256 {
        self.signature_topic
    }

    /// Decodes `entry`.
    ///
    /// # Errors
    ///
    /// * [`DecodeError::TopicCountMismatch`] if the entry does not carry exactly four topics.
    /// * [`DecodeError::SignatureMismatch`] if `topics[0]` is not the expected signature topic.
    pub fn decode(&self, entry: &RawLogEntry) -> Result<BindReferralEvent, DecodeError> {
        let [signature, user, parent, bound_at] = entry.topics.as_slice() else {
            return Err(DecodeError::TopicCountMismatch {
                expected: BIND_REFERRAL_TOPIC_COUNT,
                actual: entry.topics.len(),
            });
        };

        if *signature != self.signature_topic {
            return Err(DecodeError::SignatureMismatch {
                expected: self.signature_topic,
                actual: *signature,
            });
        }

        Ok(BindReferralEvent {
            user: Address::from_word(*user),
            parent: Address::from_word(*parent),
            bound_at_block: U256::from_be_bytes(bound_at.0),
            observed_block: entry.block_number,
            transaction_hash: entry.transaction_hash,
            log_index: entry.log_index,
        })
    }
}
