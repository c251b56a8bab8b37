//! Address normalization.
//!
//! Turns whatever the user pasted into the canonical `0x` + 64 hex digit form
//! the indexer expects, or rejects it.

use crate::types::{NormalizedAddress, ADDRESS_HEX_WIDTH, ADDRESS_PREFIX};

/// Normalize a user-supplied Sui address.
///
/// Trims, lowercases, strips one optional `0x`, checks that what remains is
/// 1..=64 hex digits and left-pads it with zeros. Returns `None` for anything
/// else; no best-effort repair is attempted.
pub fn normalize(input: &str) -> Option<NormalizedAddress> {
    let lowered = input.trim().to_ascii_lowercase();
    let digits = lowered.strip_prefix(ADDRESS_PREFIX).unwrap_or(&lowered);

    if digits.is_empty() || digits.len() > ADDRESS_HEX_WIDTH {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    Some(NormalizedAddress::from_canonical(format!(
        "{}{:0>width$}",
        ADDRESS_PREFIX,
        digits,
        width = ADDRESS_HEX_WIDTH
    )))
}
