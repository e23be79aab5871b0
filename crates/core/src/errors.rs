//! Errors.
//!
//! This module contains error types that can be emitted by the crate. Every error aborts the call
//! that produced it and leaves the state untouched.

use alloy_primitives::{Address, B256, U256};
use std::error::Error as StdError;
use thiserror::Error;

/// The error that can be emitted by any operation on [`crate::state::SedaCore`],
/// [`crate::prover::Secp256k1Prover`] or [`crate::fee_manager::FeeManager`].
#[derive(Debug, PartialEq)]
pub enum CoreError {
    /// Batch verification failures.
    Prover(ProverError),
    /// Request and result lifecycle failures.
    Request(RequestError),
    /// Fee ledger failures.
    Fee(FeeError),
    /// Admission control failures.
    Access(AccessError),
}

/// An error raised while posting or verifying batches.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum ProverError {
    #[error("Mismatched signatures and proofs: {signatures} signatures, {proofs} proofs")]
    MismatchedSignaturesAndProofs { signatures: usize, proofs: usize },

    #[error("Batch already exists at height {batch_height}")]
    BatchAlreadyExists { batch_height: u64 },

    #[error(
        "Batch height too old: {batch_height} (last={last_batch_height}, max_age={max_batch_age})"
    )]
    BatchHeightTooOld { batch_height: u64, last_batch_height: u64, max_batch_age: u64 },

    #[error("Invalid validator order: {signer} does not follow {previous}")]
    InvalidValidatorOrder { previous: Address, signer: Address },

    #[error("Invalid validator proof for {signer}")]
    InvalidValidatorProof { signer: Address },

    #[error("Invalid signature for {signer}")]
    InvalidSignature { signer: Address },

    #[error("Consensus not reached: {voting_power} < {threshold}")]
    ConsensusNotReached { voting_power: u64, threshold: u64 },
}

/// An error raised by the request and result lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RequestError {
    #[error("Invalid fee amount: expected {expected}, got {actual}")]
    InvalidFeeAmount { expected: U256, actual: U256 },

    #[error("Fee manager required")]
    FeeManagerRequired,

    #[error("Invalid replication factor")]
    InvalidReplicationFactor,

    #[error("Request already exists: {id}")]
    RequestAlreadyExists { id: B256 },

    #[error("Request already resolved: {id}")]
    RequestAlreadyResolved { id: B256 },

    #[error("Request not found: {id}")]
    RequestNotFound { id: B256 },

    #[error("Request not timed out: {id} (now={now}, timeout_at={timeout_at})")]
    RequestNotTimedOut { id: B256, now: u64, timeout_at: u64 },

    #[error("Result already exists: {id}")]
    ResultAlreadyExists { id: B256 },

    #[error("Result not found: {id}")]
    ResultNotFound { id: B256 },

    #[error("Invalid result timestamp for {id}: {result_timestamp} <= {request_timestamp}")]
    InvalidResultTimestamp { id: B256, result_timestamp: u64, request_timestamp: u64 },

    #[error("Invalid result proof: {id}")]
    InvalidResultProof { id: B256 },

    #[error("Invalid timeout period")]
    InvalidTimeoutPeriod,
}

/// An error raised by the pull-based fee ledger.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FeeError {
    #[error("Invalid fee amount: expected {expected}, got {actual}")]
    InvalidFeeAmount { expected: U256, actual: U256 },

    #[error("Array length mismatch: {recipients} recipients, {amounts} amounts")]
    ArrayLengthMismatch { recipients: usize, amounts: usize },

    #[error("Invalid recipient")]
    InvalidRecipient,

    #[error("No fees to withdraw for {account}")]
    NoFeesToWithdraw { account: Address },

    #[error("Fee transfer to {recipient} of {amount} failed: {reason}")]
    FeeTransferFailed { recipient: Address, amount: U256, reason: String },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

/// An error raised by the admission checks placed in front of mutating operations.
#[derive(Debug, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum AccessError {
    #[error("Enforced pause")]
    EnforcedPause,

    #[error("Expected pause")]
    ExpectedPause,

    #[error("Unauthorized account: {account}")]
    UnauthorizedAccount { account: Address },

    #[error("Non-payable call received value {value}")]
    NonPayable { value: U256 },
}

impl From<ProverError> for CoreError {
    fn from(err: ProverError) -> Self {
        CoreError::Prover(err)
    }
}

impl From<RequestError> for CoreError {
    fn from(err: RequestError) -> Self {
        CoreError::Request(err)
    }
}

impl From<FeeError> for CoreError {
    fn from(err: FeeError) -> Self {
        CoreError::Fee(err)
    }
}

impl From<AccessError> for CoreError {
    fn from(err: AccessError) -> Self {
        CoreError::Access(err)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CoreError::Prover(err) => Some(err),
            CoreError::Request(err) => Some(err),
            CoreError::Fee(err) => Some(err),
            CoreError::Access(err) => Some(err),
        }
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Prover(err) => write!(f, "Prover: {err}"),
            CoreError::Request(err) => write!(f, "Request: {err}"),
            CoreError::Fee(err) => write!(f, "Fee: {err}"),
            CoreError::Access(err) => write!(f, "Access: {err}"),
        }
    }
}
