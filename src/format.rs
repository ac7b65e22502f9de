//! Stateless helpers for rendering addresses in human-facing output.

use alloy::{hex, primitives::Address};

/// Placeholder printed in place of the all-zero address.
pub const ZERO_ADDRESS_LABEL: &str = "zero address";

/// Lowercase `0x`-prefixed hex form of `address`.
#[must_use]
pub fn canonical_address(address: &Address) -> String {
    hex::encode_prefixed(address.as_slice())
}

/// Abbreviates `address` to `0x1234...5678`.
///
/// The all-zero address is rendered as [`ZERO_ADDRESS_LABEL`] so that unset parents stand out.
#[must_use]
pub fn shorten_address(address: &Address) -> String {
    if is_zero_address(address) {
        return ZERO_ADDRESS_LABEL.to_owned();
    }
    let full = canonical_address(address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[must_use]
pub fn is_zero_address(address: &Address) -> bool {
    address.is_zero()
}

/// Compares two textual addresses, ignoring case and surrounding whitespace.
#[must_use]
pub fn addresses_equal(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}
