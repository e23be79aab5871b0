//! Transactions.
//!
//! This module contains the types for calls that are executed against the
//! [`crate::state::SedaCore`].

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::sol::{Batch, DataResult, RequestInputs, ValidatorProof};

/// The environment a call executes in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// The account making the call.
    pub caller: Address,
    /// The value attached to the call.
    #[serde(default)]
    pub value: U256,
    /// The timestamp of the block the call is included in, in seconds.
    pub timestamp: u64,
}

impl CallContext {
    /// Creates a [`CallContext`] without attached value.
    #[must_use]
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, value: U256::ZERO, timestamp }
    }

    /// Attaches `value` to the call.
    #[must_use]
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// A call that can be executed and update the [`crate::state::SedaCore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::large_enum_variant)]
pub enum CoreTransaction {
    /// Posts a data request, locking the attached fees.
    PostRequest(PostRequestTransaction),

    /// Posts the result of a data request together with its inclusion proof.
    PostResult(PostResultTransaction),

    /// Posts a batch signed by the current validator set.
    PostBatch(PostBatchTransaction),

    /// Adds to the fees of a pending request.
    IncreaseFees(IncreaseFeesTransaction),

    /// Returns the fees of a timed out request to its requestor.
    WithdrawTimedOutRequest {
        /// The id of the timed out request.
        request_id: B256,
    },

    /// Withdraws the caller's pending fees.
    WithdrawFees,

    /// Sets the timeout period. Owner only.
    SetTimeoutPeriod {
        /// The new timeout period, in seconds.
        timeout_period: u64,
    },

    /// Pauses the core. Owner only.
    Pause,

    /// Unpauses the core. Owner only.
    Unpause,

    /// Pauses batch posting on the prover. Prover owner only.
    PauseProver,

    /// Resumes batch posting on the prover. Prover owner only.
    UnpauseProver,

    /// Starts an ownership transfer of the core. Owner only.
    TransferOwnership {
        /// The account that must accept the transfer.
        new_owner: Address,
    },

    /// Completes an ownership transfer of the core.
    AcceptOwnership,
}

/// A transaction to post a data request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequestTransaction {
    /// The request inputs.
    pub inputs: RequestInputs,
    /// The fee paid to the executor, proportional to gas used.
    #[serde(default)]
    pub request_fee: U256,
    /// The fee paid to whoever posts the result.
    #[serde(default)]
    pub result_fee: U256,
    /// The fee paid to whoever posted the batch the result was proven against.
    #[serde(default)]
    pub batch_fee: U256,
}

/// A transaction to post a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResultTransaction {
    /// The result.
    pub result: DataResult,
    /// The height of the batch whose results root includes the result.
    pub batch_height: u64,
    /// The merkle proof of the result leaf.
    pub proof: Vec<B256>,
}

/// A transaction to post a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostBatchTransaction {
    /// The batch.
    pub batch: Batch,
    /// The validator signatures over the batch id, in the same order as `proofs`.
    pub signatures: Vec<Bytes>,
    /// The validator membership proofs, sorted by signer.
    pub proofs: Vec<ValidatorProof>,
}

/// A transaction to increase the fees of a pending request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncreaseFeesTransaction {
    /// The id of the request.
    pub request_id: B256,
    /// The amount added to the request fee.
    #[serde(default)]
    pub additional_request_fee: U256,
    /// The amount added to the result fee.
    #[serde(default)]
    pub additional_result_fee: U256,
    /// The amount added to the batch fee.
    #[serde(default)]
    pub additional_batch_fee: U256,
}

/// A call together with the context it executes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    /// The call context.
    pub ctx: CallContext,
    /// The call.
    pub tx: CoreTransaction,
}
