//! Hashing.
//!
//! Deterministic, content-addressed identifiers for requests, results and batches, and the
//! domain-separated leaves that are committed to in the results and validators merkle trees.

use alloy_primitives::{keccak256, Address, Keccak256, B256};

use crate::sol::{Batch, DataResult, RequestInputs};

/// The version string committed to by request and result ids.
pub const VERSION: &str = "0.0.1";

/// Domain separator for result leaves.
pub const RESULT_DOMAIN_SEPARATOR: u8 = 0x00;

/// Domain separator for secp256k1 validator leaves.
pub const SECP256K1_DOMAIN_SEPARATOR: u8 = 0x01;

/// Derives the id of a request from its inputs.
///
/// Identical inputs always produce the same id.
#[must_use]
pub fn derive_request_id(inputs: &RequestInputs) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(keccak256(VERSION.as_bytes()));
    hasher.update(inputs.execProgramId);
    hasher.update(keccak256(&inputs.execInputs));
    hasher.update(inputs.execGasLimit.to_be_bytes());
    hasher.update(inputs.tallyProgramId);
    hasher.update(keccak256(&inputs.tallyInputs));
    hasher.update(inputs.tallyGasLimit.to_be_bytes());
    hasher.update(inputs.replicationFactor.to_be_bytes());
    hasher.update(keccak256(&inputs.consensusFilter));
    hasher.update(inputs.gasPrice.to_be_bytes());
    hasher.update(keccak256(&inputs.memo));
    hasher.finalize()
}

/// Derives the id of a result.
#[must_use]
pub fn derive_result_id(result: &DataResult) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(keccak256(VERSION.as_bytes()));
    hasher.update(result.drId);
    hasher.update([u8::from(result.consensus)]);
    hasher.update([result.exitCode]);
    hasher.update(keccak256(&result.result));
    hasher.update(result.blockHeight.to_be_bytes());
    hasher.update(result.blockTimestamp.to_be_bytes());
    hasher.update(result.gasUsed.to_be_bytes::<32>());
    hasher.update(keccak256(&result.paybackAddress));
    hasher.update(keccak256(&result.sedaPayload));
    hasher.finalize()
}

/// Derives the id of a batch. This is the digest validators sign.
#[must_use]
pub fn derive_batch_id(batch: &Batch) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update(batch.batchHeight.to_be_bytes());
    hasher.update(batch.blockHeight.to_be_bytes());
    hasher.update(batch.validatorsRoot);
    hasher.update(batch.resultsRoot);
    hasher.update(batch.provingMetadata);
    hasher.finalize()
}

/// The leaf committed to in a results root for `result_id`.
#[must_use]
pub fn result_leaf(result_id: B256) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update([RESULT_DOMAIN_SEPARATOR]);
    hasher.update(result_id);
    hasher.finalize()
}

/// The leaf committed to in a validators root for `signer` holding `voting_power`.
#[must_use]
pub fn validator_leaf(signer: Address, voting_power: u32) -> B256 {
    let mut hasher = Keccak256::new();
    hasher.update([SECP256K1_DOMAIN_SEPARATOR]);
    hasher.update(signer);
    hasher.update(voting_power.to_be_bytes());
    hasher.finalize()
}
