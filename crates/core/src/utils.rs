use alloy_primitives::Address;

/// Interprets `bytes` as an address if it is exactly 20 bytes long.
#[must_use]
pub fn address(bytes: &[u8]) -> Option<Address> {
    Address::try_from(bytes).ok()
}

/// Returns `start + period`, saturating at `u64::MAX`.
#[must_use]
pub fn deadline(start: u64, period: u64) -> u64 {
    start.saturating_add(period)
}
