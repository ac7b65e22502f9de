//! Helpers for testing code built on the scanner.

use alloy::primitives::{Address, BlockNumber, TxHash, U256};

use crate::{BindReferralEvent, log::RawLogEntry, signature::bind_referral_topic};

pub mod macros;
mod mock;

pub use mock::MockChainClient;

/// Deterministic transaction hash for the log at (`block`, `log_index`).
#[must_use]
pub fn tx_hash_for(block: BlockNumber, log_index: u64) -> TxHash {
    ((U256::from(block) << 64usize) | U256::from(log_index)).into()
}

/// A well-formed `BindReferral` log emitted by `contract` in `block`.
///
/// The contract-side block number equals `block`, and the transaction hash is
/// [`tx_hash_for`]`(block, log_index)`.
#[must_use]
pub fn referral_entry(
    contract: Address,
    user: Address,
    parent: Address,
    block: BlockNumber,
    log_index: u64,
) -> RawLogEntry {
    RawLogEntry {
        address: contract,
        block_number: block,
        transaction_hash: tx_hash_for(block, log_index),
        log_index,
        topics: vec![
            bind_referral_topic(),
            user.into_word(),
            parent.into_word(),
            U256::from(block).into(),
        ],
    }
}

/// The event [`referral_entry`] decodes to.
#[must_use]
pub fn referral_event(
    user: Address,
    parent: Address,
    block: BlockNumber,
    log_index: u64,
) -> BindReferralEvent {
    BindReferralEvent {
        user,
        parent,
        bound_at_block: U256::from(block),
        observed_block: block,
        transaction_hash: tx_hash_for(block, log_index),
        log_index,
    }
}
