//! Canonical event signatures and their filter topics.
//!
//! A topic is the keccak-256 hash of `Name(type1,type2,...)`, the same convention Solidity uses
//! for `topics[0]` of non-anonymous events.

use alloy::primitives::{B256, keccak256};

/// Name of the watched event.
pub const BIND_REFERRAL_EVENT_NAME: &str = "BindReferral";

/// Ordered argument types of `BindReferral(address indexed user, address indexed parent,
/// uint256 indexed blockNumber)`.
pub const BIND_REFERRAL_ARGUMENT_TYPES: [&str; 3] = ["address", "address", "uint256"];

/// Builds the canonical signature string for an event.
///
/// Argument types are trimmed and the `uint`/`int` shorthands are expanded to their 256-bit
/// canonical names, so `("Foo", [" uint ", "address"])` yields `Foo(uint256,address)`.
#[must_use]
pub fn canonical_signature(event_name: &str, argument_types: &[&str]) -> String {
    let arguments: Vec<&str> = argument_types.iter().map(|ty| canonical_type(ty.trim())).collect();
    format!("{}({})", event_name.trim(), arguments.join(","))
}

/// Computes the `topics[0]` value for an event with the given name and ordered argument types.
#[must_use]
pub fn compute_signature_topic(event_name: &str, argument_types: &[&str]) -> B256 {
    keccak256(canonical_signature(event_name, argument_types))
}

/// Filter topic of the `BindReferral` event.
#[must_use]
pub fn bind_referral_topic() -> B256 {
    compute_signature_topic(BIND_REFERRAL_EVENT_NAME, &BIND_REFERRAL_ARGUMENT_TYPES)
}

fn canonical_type(ty: &str) -> &str {
    match ty {
        "uint" => "uint256",
        "int" => "int256",
        other => other,
    }
}
