// Bounded text storage. Everything the radio stack hands us lands in one of
// these fixed-capacity buffers; oversized input is truncated, never an error.

use heapless::String;
use log::debug;

use crate::config::{ADDRESS_CAPACITY, METADATA_CAPACITY, NAME_CAPACITY, PIN_CAPACITY};

/// Title/artist metadata text.
pub type MetadataText = String<METADATA_CAPACITY>;

/// Remote device name.
pub type NameText = String<NAME_CAPACITY>;

/// Formatted remote device address.
pub type AddressText = String<ADDRESS_CAPACITY>;

/// Legacy pairing code.
pub type PinText = String<PIN_CAPACITY>;

/// Copy `input` into a fresh buffer of capacity `N`, truncating at a UTF-8
/// character boundary if it does not fit. Truncation is silent toward the
/// caller; the lost tail only shows up in the debug log.
pub fn bounded<const N: usize>(input: &str) -> String<N> {
    let mut out = String::new();
    if out.push_str(input).is_ok() {
        return out;
    }

    for ch in input.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    debug!("text truncated from {} to {} bytes", input.len(), out.len());
    out
}
