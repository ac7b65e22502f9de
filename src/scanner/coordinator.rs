//! Merges the backfill result with the live stream into exactly-once, block-ordered delivery.
//!
//! The coordinator owns all mutable pipeline state (the seen-set and the delivery watermark) and
//! processes one entry at a time, so no synchronization is needed around it.

use std::time::Duration;

use alloy::primitives::BlockNumber;
use backon::Retryable;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use super::{
    ReferralScannerResult,
    backfill::{BackfillScanner, HeadScan},
    live::{LiveSubscriber, ResubscribePolicy},
    seen_set::SeenSet,
};
use crate::{
    chain::{ChainClient, LiveSubscription},
    decoder::EventDecoder,
    error::ChainQueryError,
    filter::EventFilter,
    log::RawLogEntry,
    types::{Notification, ScannerMessage},
};

/// Outcome of offering one raw entry to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// The key was delivered before.
    Duplicate,
    /// Never seen, but older than the last delivered block.
    Stale,
    Undecodable,
    /// Every listener has gone away.
    Closed,
}

enum LiveOutcome {
    Stopped,
    Closed,
    Resubscribe,
}

pub(crate) struct Coordinator<C: ChainClient> {
    filter: EventFilter,
    decoder: EventDecoder,
    backfill: BackfillScanner<C>,
    live: LiveSubscriber<C>,
    policy: ResubscribePolicy,
    catch_up: bool,
    lookback_window: u64,
    listeners: Vec<mpsc::Sender<ReferralScannerResult>>,
    seen: SeenSet,
    last_delivered: Option<BlockNumber>,
    /// Highest block covered by a completed log query.
    scanned_to: BlockNumber,
    /// Highest chain head observed so far.
    head: BlockNumber,
}

impl<C: ChainClient> Coordinator<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filter: EventFilter,
        backfill: BackfillScanner<C>,
        live: LiveSubscriber<C>,
        policy: ResubscribePolicy,
        catch_up: bool,
        lookback_window: u64,
        listeners: Vec<mpsc::Sender<ReferralScannerResult>>,
        head: BlockNumber,
    ) -> Self {
        Self {
            decoder: EventDecoder::new(filter.signature_topic),
            filter,
            backfill,
            live,
            policy,
            catch_up,
            lookback_window,
            listeners,
            seen: SeenSet::new(),
            last_delivered: None,
            scanned_to: head,
            head,
        }
    }

    /// Delivers the backfill result, then streams live entries until `stop` fires or every
    /// listener is gone.
    pub async fn run(mut self, backfill: Vec<RawLogEntry>, stop: CancellationToken) {
        if !self.deliver_backfill(backfill).await {
            info!("All listeners closed during backfill, stopping scanner");
            return;
        }

        let mut resubscribing = false;
        while let Some(mut subscription) = self.establish_live(resubscribing, &stop).await {
            resubscribing = true;
            let outcome = self.stream_live(&mut subscription, &stop).await;
            subscription.cancel();
            match outcome {
                LiveOutcome::Resubscribe => {}
                LiveOutcome::Stopped => {
                    info!("Stop requested, live subscription released");
                    break;
                }
                LiveOutcome::Closed => {
                    info!("All listeners closed, stopping scanner");
                    break;
                }
            }
        }
        debug!(last_delivered = ?self.last_delivered, seen = self.seen.len(), "Scanner finished");
    }

    /// Decodes, deduplicates and delivers one entry.
    pub async fn process(&mut self, entry: &RawLogEntry) -> Delivery {
        let event = match self.decoder.decode(entry) {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    error = %err,
                    block_number = entry.block_number,
                    transaction_hash = %entry.transaction_hash,
                    log_index = entry.log_index,
                    "Skipping undecodable log"
                );
                return Delivery::Undecodable;
            }
        };

        let key = event.dedup_key();
        if self.seen.contains(&key) {
            trace!(
                transaction_hash = %key.transaction_hash,
                log_index = key.log_index,
                "Dropping duplicate log"
            );
            return Delivery::Duplicate;
        }

        if let Some(last) = self.last_delivered.filter(|last| event.observed_block < *last) {
            warn!(
                block_number = event.observed_block,
                last_delivered = last,
                transaction_hash = %key.transaction_hash,
                "Dropping log older than the last delivered block"
            );
            return Delivery::Stale;
        }

        self.seen.insert(key, event.observed_block);
        self.last_delivered = Some(event.observed_block);

        if self.broadcast(Ok(ScannerMessage::Data(event))).await {
            Delivery::Delivered
        } else {
            Delivery::Closed
        }
    }

    /// Sends `item` to every listener, dropping those that have gone away. Returns whether any
    /// listener is left.
    async fn broadcast(&mut self, item: ReferralScannerResult) -> bool {
        let listeners = std::mem::take(&mut self.listeners);
        for listener in listeners {
            if listener.send(item.clone()).await.is_ok() {
                self.listeners.push(listener);
            } else {
                debug!(remaining = self.listeners.len(), "Listener closed, dropping it");
            }
        }
        if self.listeners.is_empty() {
            warn!("No listeners left");
        }
        !self.listeners.is_empty()
    }

    async fn notify(&mut self, notification: Notification) -> bool {
        trace!(notification = ?notification, "Announcing phase change");
        self.broadcast(Ok(notification.into())).await
    }

    async fn report(&mut self, error: ChainQueryError) -> bool {
        debug!(error = %error, "Reporting chain error to listeners");
        self.broadcast(Err(error.into())).await
    }

    /// Evicts seen keys that can no longer be delivered again.
    ///
    /// Keys below `head - 2W` have left both the backfill window and any catch-up range; keys
    /// below the last delivered block would be rejected as stale anyway.
    pub fn prune(&mut self) {
        let Some(last_delivered) = self.last_delivered else {
            return;
        };
        let head = self.head.max(last_delivered);
        let horizon = head.saturating_sub(self.lookback_window.saturating_mul(2));
        let evicted = self.seen.evict_below(horizon.min(last_delivered));
        if evicted > 0 {
            trace!(
                evicted = evicted,
                retained = self.seen.len(),
                oldest_retained = ?self.seen.oldest_block(),
                "Pruned dedup window"
            );
        }
    }

    /// Block the next catch-up scan starts from.
    fn resume_point(&self) -> BlockNumber {
        let after_scan = self.scanned_to.saturating_add(1);
        self.last_delivered.map_or(after_scan, |last| after_scan.max(last))
    }

    async fn deliver_backfill(&mut self, entries: Vec<RawLogEntry>) -> bool {
        let mut delivered = 0usize;
        for entry in &entries {
            match self.process(entry).await {
                Delivery::Delivered => delivered += 1,
                Delivery::Closed => return false,
                Delivery::Duplicate | Delivery::Stale | Delivery::Undecodable => {}
            }
        }

        info!(fetched = entries.len(), delivered = delivered, "Backfill delivered");
        self.prune();

        if delivered == 0 {
            return self.notify(Notification::NoPastEventsFound).await;
        }
        true
    }

    async fn deliver_catch_up(&mut self, scan: HeadScan) -> bool {
        self.head = self.head.max(scan.head);
        self.scanned_to = self.scanned_to.max(scan.head);
        for entry in &scan.entries {
            if self.process(entry).await == Delivery::Closed {
                return false;
            }
        }
        self.prune();
        true
    }

    /// Subscribes and, when enabled, catches up on the blocks missed since the last scan.
    ///
    /// The subscription is opened before the catch-up query so nothing between the two can be
    /// missed; overlap is absorbed by the seen-set. Returns `None` once stopped or closed.
    async fn establish_live(
        &mut self,
        resubscribing: bool,
        stop: &CancellationToken,
    ) -> Option<LiveSubscription> {
        let resume = self.resume_point();
        let established = {
            let this = &*self;
            let attempt = (|| this.open_live(resume))
                .retry(this.policy.backoff())
                .sleep(tokio::time::sleep)
                .notify(|err: &ChainQueryError, after: Duration| {
                    warn!(error = %err, retry_in = ?after, "Failed to establish live phase");
                });

            tokio::select! {
                biased;
                () = stop.cancelled() => return None,
                established = attempt => established,
            }
        };

        let (subscription, catch_up) = match established {
            Ok(established) => established,
            Err(err) => {
                error!(error = %err, "Giving up on the live phase");
                self.report(err).await;
                return None;
            }
        };

        if let Some(scan) = catch_up {
            if !self.deliver_catch_up(scan).await {
                return None;
            }
        }

        let notification = if resubscribing {
            info!(resume_from = resume, "Live subscription re-established");
            Notification::Resubscribed
        } else {
            info!(scanned_to = self.scanned_to, "Switching to live");
            Notification::SwitchingToLive
        };
        if !self.notify(notification).await {
            return None;
        }
        Some(subscription)
    }

    async fn open_live(
        &self,
        resume: BlockNumber,
    ) -> Result<(LiveSubscription, Option<HeadScan>), ChainQueryError> {
        let subscription = self.live.subscribe(&self.filter).await?;
        if !self.catch_up {
            return Ok((subscription, None));
        }
        let scan = self.backfill.scan_to_head(&self.filter, resume).await?;
        debug!(resume_from = resume, head = scan.head, count = scan.entries.len(), "Caught up");
        Ok((subscription, Some(scan)))
    }

    async fn stream_live(
        &mut self,
        subscription: &mut LiveSubscription,
        stop: &CancellationToken,
    ) -> LiveOutcome {
        loop {
            let item = tokio::select! {
                biased;
                () = stop.cancelled() => return LiveOutcome::Stopped,
                item = subscription.next() => item,
            };

            match item {
                Some(Ok(entry)) => {
                    self.head = self.head.max(entry.block_number);
                    match self.process(&entry).await {
                        Delivery::Closed => return LiveOutcome::Closed,
                        Delivery::Delivered => self.prune(),
                        Delivery::Duplicate | Delivery::Stale | Delivery::Undecodable => {}
                    }
                }
                Some(Err(ChainQueryError::Lagged(skipped))) => {
                    warn!(skipped = skipped, "Live subscription lagged");
                    if !self.report(ChainQueryError::Lagged(skipped)).await {
                        return LiveOutcome::Closed;
                    }
                    if !self.catch_up {
                        continue;
                    }
                    match self.backfill.scan_to_head(&self.filter, self.resume_point()).await {
                        Ok(scan) => {
                            if !self.deliver_catch_up(scan).await {
                                return LiveOutcome::Closed;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "Catch-up after lag failed, resubscribing");
                            if !self.report(err).await {
                                return LiveOutcome::Closed;
                            }
                            return LiveOutcome::Resubscribe;
                        }
                    }
                }
                Some(Err(err)) => {
                    warn!(error = %err, "Live subscription failed, resubscribing");
                    if !self.report(err).await {
                        return LiveOutcome::Closed;
                    }
                    return LiveOutcome::Resubscribe;
                }
                None => {
                    warn!("Live subscription ended, resubscribing");
                    return LiveOutcome::Resubscribe;
                }
            }
        }
    }
}
