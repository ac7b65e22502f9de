use alloy::{
    primitives::{Address, B256, BlockNumber, TxHash},
    rpc::types::Log,
};

/// A log occurrence as reported by the chain client.
///
/// Only mined logs are represented: pending logs carry no block number, transaction hash or
/// log index and are filtered out by [`RawLogEntry::from_rpc_log`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLogEntry {
    pub address: Address,
    pub block_number: BlockNumber,
    pub transaction_hash: TxHash,
    pub log_index: u64,
    pub topics: Vec<B256>,
}

/// Identity of a log occurrence across the backfill and live delivery paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub transaction_hash: TxHash,
    pub log_index: u64,
}

impl RawLogEntry {
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey { transaction_hash: self.transaction_hash, log_index: self.log_index }
    }

    /// Converts an RPC log, returning `None` for pending or reorg-removed logs.
    #[must_use]
    pub fn from_rpc_log(log: &Log) -> Option<Self> {
        if log.removed {
            return None;
        }
        Some(Self {
            address: log.inner.address,
            block_number: log.block_number?,
            transaction_hash: log.transaction_hash?,
            log_index: log.log_index?,
            topics: log.inner.data.topics().to_vec(),
        })
    }
}
