use std::{ops::RangeInclusive, time::Duration};

use alloy::primitives::BlockNumber;

use crate::{
    chain::{ChainClient, with_timeout},
    error::ChainQueryError,
    filter::EventFilter,
    log::RawLogEntry,
};

/// Result of scanning up to the chain head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadScan {
    pub head: BlockNumber,
    pub entries: Vec<RawLogEntry>,
}

/// One-shot historical log queries over closed block ranges.
#[derive(Clone, Debug)]
pub struct BackfillScanner<C> {
    client: C,
    call_timeout: Duration,
}

/// The closed range `[head - window, head]`, with the lower bound clamped at genesis.
#[must_use]
pub fn backfill_range(head: BlockNumber, window: u64) -> RangeInclusive<BlockNumber> {
    head.saturating_sub(window)..=head
}

impl<C: ChainClient> BackfillScanner<C> {
    pub fn new(client: C, call_timeout: Duration) -> Self {
        Self { client, call_timeout }
    }

    /// Fetches the current head block.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::Timeout`] if the call exceeds the configured timeout, or the
    /// client's error otherwise.
    pub async fn head(&self) -> Result<BlockNumber, ChainQueryError> {
        with_timeout(self.call_timeout, self.client.block_number()).await
    }

    /// Returns every log in `range` matching `filter`, sorted by `(block_number, log_index)`.
    ///
    /// An inverted range yields no entries without querying the chain. The call is never retried.
    ///
    /// # Errors
    ///
    /// Returns [`ChainQueryError::Timeout`] if the query exceeds the configured timeout, or the
    /// client's error otherwise.
    pub async fn scan(
        &self,
        filter: &EventFilter,
        range: RangeInclusive<BlockNumber>,
    ) -> Result<Vec<RawLogEntry>, ChainQueryError> {
        if range.is_empty() {
            trace!(block_range = ?range, "Empty block range, skipping log query");
            return Ok(Vec::new());
        }

        let scoped = filter.with_range(range.clone());
        let mut entries = match with_timeout(self.call_timeout, self.client.get_logs(&scoped)).await
        {
            Ok(entries) => entries,
            Err(err) => {
                error!(block_range = ?range, error = %err, "Log query failed");
                return Err(err);
            }
        };

        entries.sort_by_key(|entry| (entry.block_number, entry.log_index));
        debug!(block_range = ?range, count = entries.len(), "Fetched logs");
        Ok(entries)
    }

    /// Scans from `from` to the current head.
    pub(crate) async fn scan_to_head(
        &self,
        filter: &EventFilter,
        from: BlockNumber,
    ) -> Result<HeadScan, ChainQueryError> {
        let head = self.head().await?;
        let entries = self.scan(filter, from..=head).await?;
        Ok(HeadScan { head, entries })
    }
}
