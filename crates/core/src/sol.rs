//! Solidity types.
//!
//! This module contains the types shared with the EVM contracts and the relayers that talk to
//! them: batches, validator proofs, requests, results and the events emitted by the core.

use alloy_primitives::Address;
use alloy_sol_types::sol;
use serde::{Deserialize, Serialize};

sol! {
    /// @notice A batch of results signed by the validator set.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct Batch {
        /// @notice The height of the batch on the SEDA chain.
        uint64 batchHeight;
        /// @notice The SEDA block height the batch was created at.
        uint64 blockHeight;
        /// @notice The merkle root of the validator set that will sign the next batch.
        bytes32 validatorsRoot;
        /// @notice The merkle root of the results included in this batch.
        bytes32 resultsRoot;
        /// @notice Extra data committed to by the signers.
        bytes32 provingMetadata;
    }

    /// @notice Membership proof of a validator in a validators root.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct ValidatorProof {
        address signer;
        uint32 votingPower;
        bytes32[] merkleProof;
    }

    /// @notice The caller-supplied inputs of a data request.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct RequestInputs {
        bytes32 execProgramId;
        bytes execInputs;
        uint64 execGasLimit;
        bytes32 tallyProgramId;
        bytes tallyInputs;
        uint64 tallyGasLimit;
        uint16 replicationFactor;
        bytes consensusFilter;
        uint128 gasPrice;
        bytes memo;
    }

    /// @notice A stored data request.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct Request {
        string version;
        bytes32 execProgramId;
        bytes execInputs;
        uint64 execGasLimit;
        bytes32 tallyProgramId;
        bytes tallyInputs;
        uint64 tallyGasLimit;
        uint16 replicationFactor;
        bytes consensusFilter;
        uint128 gasPrice;
        bytes memo;
    }

    /// @notice The result of a data request as produced by the SEDA chain.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct DataResult {
        string version;
        bytes32 drId;
        bool consensus;
        uint8 exitCode;
        bytes result;
        uint64 blockHeight;
        uint64 blockTimestamp;
        uint256 gasUsed;
        bytes paybackAddress;
        bytes sedaPayload;
    }

    /// @notice A pending request together with its settlement bookkeeping.
    #[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    struct PendingRequest {
        bytes32 id;
        Request request;
        address requestor;
        uint64 timestamp;
        uint256 requestFee;
        uint256 resultFee;
        uint256 batchFee;
        uint256 gasLimit;
    }

    /// @notice The category of a fee movement.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    enum FeeType {
        REQUEST,
        RESULT,
        BATCH,
        REFUND,
        WITHDRAW
    }

    /// @notice Emitted when a batch is accepted.
    #[derive(Debug, PartialEq, Eq)]
    event BatchPosted(uint256 indexed batchHeight, bytes32 indexed batchHash, address sender);

    /// @notice Emitted when a new request is stored.
    #[derive(Debug, PartialEq, Eq)]
    event RequestPosted(bytes32 indexed requestId);

    /// @notice Emitted when a result is accepted.
    #[derive(Debug, PartialEq, Eq)]
    event ResultPosted(bytes32 indexed resultId);

    /// @notice Emitted when the fees of a pending request are topped up.
    #[derive(Debug, PartialEq, Eq)]
    event FeesIncreased(
        bytes32 indexed requestId,
        uint256 additionalRequestFee,
        uint256 additionalResultFee,
        uint256 additionalBatchFee
    );

    /// @notice Emitted for every credit made while settling a request.
    #[derive(Debug, PartialEq, Eq)]
    event FeeDistributed(
        bytes32 indexed drId, address indexed recipient, uint256 amount, FeeType indexed feeType
    );

    /// @notice Emitted when a timed out request is reclaimed.
    #[derive(Debug, PartialEq, Eq)]
    event RequestWithdrawn(bytes32 indexed requestId, uint256 amount);

    /// @notice Emitted when the timeout period changes.
    #[derive(Debug, PartialEq, Eq)]
    event TimeoutPeriodUpdated(uint256 newTimeoutPeriod);

    /// @notice Emitted when the contract is paused.
    #[derive(Debug, PartialEq, Eq)]
    event Paused(address account);

    /// @notice Emitted when the contract is unpaused.
    #[derive(Debug, PartialEq, Eq)]
    event Unpaused(address account);

    /// @notice Emitted when an ownership transfer is started.
    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferStarted(address indexed previousOwner, address indexed newOwner);

    /// @notice Emitted when ownership is transferred.
    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);

    /// @notice Emitted when fees are credited to a recipient.
    #[derive(Debug, PartialEq, Eq)]
    event FeeAdded(address indexed recipient, uint256 amount);

    /// @notice Emitted when a recipient withdraws their fees.
    #[derive(Debug, PartialEq, Eq)]
    event FeeWithdrawn(address indexed recipient, uint256 amount);
}

impl Request {
    /// Builds the stored request from the caller-supplied inputs.
    #[must_use]
    pub fn from_inputs(inputs: &RequestInputs, version: &str) -> Self {
        Self {
            version: version.to_string(),
            execProgramId: inputs.execProgramId,
            execInputs: inputs.execInputs.clone(),
            execGasLimit: inputs.execGasLimit,
            tallyProgramId: inputs.tallyProgramId,
            tallyInputs: inputs.tallyInputs.clone(),
            tallyGasLimit: inputs.tallyGasLimit,
            replicationFactor: inputs.replicationFactor,
            consensusFilter: inputs.consensusFilter.clone(),
            gasPrice: inputs.gasPrice,
            memo: inputs.memo.clone(),
        }
    }
}

impl DataResult {
    /// Returns the payback address if the payload is shaped like an address.
    ///
    /// Only a payload of exactly 20 bytes is accepted. Any 20-byte payload passes, so this is a
    /// shape check rather than proof that the bytes were meant as an address.
    #[must_use]
    pub fn payback(&self) -> Option<Address> {
        crate::utils::address(&self.paybackAddress)
    }
}
