use std::{
    fmt::{Display, Formatter},
    ops::RangeInclusive,
};

use alloy::{
    primitives::{Address, B256, BlockNumber},
    rpc::types::Filter,
};

use crate::signature::bind_referral_topic;

/// Contract address and signature topic scoped to a block range.
///
/// A `to_block` of `None` means the filter is open-ended and describes live activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventFilter {
    pub contract_address: Address,
    pub signature_topic: B256,
    pub from_block: BlockNumber,
    pub to_block: Option<BlockNumber>,
}

impl EventFilter {
    /// Creates an open-ended filter starting at genesis.
    #[must_use]
    pub fn new(contract_address: Address, signature_topic: B256) -> Self {
        Self { contract_address, signature_topic, from_block: 0, to_block: None }
    }

    /// Filter for `BindReferral` events emitted by `contract_address`.
    #[must_use]
    pub fn bind_referral(contract_address: Address) -> Self {
        Self::new(contract_address, bind_referral_topic())
    }

    /// Returns a copy restricted to the closed range `range`.
    #[must_use]
    pub fn with_range(self, range: RangeInclusive<BlockNumber>) -> Self {
        Self { from_block: *range.start(), to_block: Some(*range.end()), ..self }
    }

    /// Returns a copy with an open upper bound, starting at whatever the chain considers new.
    #[must_use]
    pub fn live(self) -> Self {
        Self { from_block: 0, to_block: None, ..self }
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.to_block.is_none()
    }

    /// The closed block range of this filter, if it has one.
    #[must_use]
    pub fn block_range(&self) -> Option<RangeInclusive<BlockNumber>> {
        self.to_block.map(|to| self.from_block..=to)
    }

    /// Returns `true` if a log with the given address, first topic and block would match.
    #[must_use]
    pub fn matches(&self, address: Address, topic0: Option<&B256>, block: BlockNumber) -> bool {
        address == self.contract_address &&
            topic0 == Some(&self.signature_topic) &&
            block >= self.from_block &&
            self.to_block.is_none_or(|to| block <= to)
    }
}

impl Display for EventFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventFilter(contract: {}, topic: {}", self.contract_address, self.signature_topic)?;
        match self.to_block {
            Some(to) => write!(f, ", blocks: {}..={to})", self.from_block),
            None => write!(f, ", blocks: live)"),
        }
    }
}

impl From<&EventFilter> for Filter {
    fn from(filter: &EventFilter) -> Self {
        let log_filter =
            Filter::new().address(filter.contract_address).event_signature(filter.signature_topic);
        match filter.to_block {
            Some(to) => log_filter.from_block(filter.from_block).to_block(to),
            None => log_filter,
        }
    }
}
