//! Signing.
//!
//! This module contains the functions for recovering the signers of batch ids.

use alloy_primitives::{Address, Signature, B256};

/// Recovers the address that signed `digest`.
///
/// The signature is the 65-byte `r ‖ s ‖ v` encoding over the raw digest, without the
/// `personal_sign` prefix. Returns `None` if the signature is malformed or recovery fails.
#[must_use]
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Option<Address> {
    let signature = Signature::from_raw(signature).ok()?;
    signature.recover_address_from_prehash(digest).ok()
}

/// Returns whether `signature` over `digest` was produced by `signer`.
#[must_use]
pub fn verify_signer(digest: &B256, signature: &[u8], signer: Address) -> bool {
    recover_signer(digest, signature).is_some_and(|recovered| recovered == signer)
}
