//! Request Ledger.
//!
//! Storage for requests, results and the bookkeeping that exists only while a request is
//! pending. The checks that decide whether a mutation is allowed live in
//! [`crate::state::SedaCore`]; the ledger only keeps its records consistent.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    errors::FeeError,
    pending::PendingSet,
    sol::{DataResult, PendingRequest, Request},
    u256,
};

/// Settlement bookkeeping of a pending request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDetails {
    /// The account that posted the request and receives refunds.
    pub requestor: Address,
    /// When the request was posted, in seconds.
    pub timestamp: u64,
    /// The fee paid to the executor, proportional to gas used.
    pub request_fee: U256,
    /// The fee paid to the result submitter.
    pub result_fee: U256,
    /// The fee paid to the batch submitter.
    pub batch_fee: U256,
    /// `execGasLimit + tallyGasLimit` of the request.
    pub gas_limit: U256,
}

impl RequestDetails {
    /// Returns the sum of all fees.
    pub fn total_fees(&self) -> Result<U256, FeeError> {
        u256::sum([&self.request_fee, &self.result_fee, &self.batch_fee])
    }
}

/// Requests, results and the pending set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestLedger {
    /// Every request ever posted, by id. Bodies stay queryable after resolution.
    requests: BTreeMap<B256, Request>,
    /// Every accepted result, by request id.
    results: BTreeMap<B256, DataResult>,
    /// Bookkeeping of pending requests, by id.
    details: BTreeMap<B256, RequestDetails>,
    /// Ids of requests that are waiting for a result.
    pending: PendingSet,
}

impl RequestLedger {
    /// Creates an empty [`RequestLedger`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a request and marks it pending.
    pub fn insert_request(&mut self, id: B256, request: Request, details: RequestDetails) {
        self.requests.insert(id, request);
        self.details.insert(id, details);
        self.pending.add(id);
    }

    /// Stores a result and retires the pending entry of its request.
    ///
    /// Returns the bookkeeping the request had, if it was pending.
    pub fn insert_result(&mut self, result: DataResult) -> Option<RequestDetails> {
        let id = result.drId;
        self.results.insert(id, result);
        self.retire(&id)
    }

    /// Removes `id` from the pending set and deletes its bookkeeping.
    pub fn retire(&mut self, id: &B256) -> Option<RequestDetails> {
        self.pending.remove(id);
        self.details.remove(id)
    }

    /// Returns the request stored under `id`.
    #[must_use]
    pub fn request(&self, id: &B256) -> Option<&Request> {
        self.requests.get(id)
    }

    /// Returns the result stored for request `id`.
    #[must_use]
    pub fn result(&self, id: &B256) -> Option<&DataResult> {
        self.results.get(id)
    }

    /// Returns the bookkeeping of pending request `id`.
    #[must_use]
    pub fn details(&self, id: &B256) -> Option<&RequestDetails> {
        self.details.get(id)
    }

    /// Returns the bookkeeping of pending request `id`, mutably.
    pub fn details_mut(&mut self, id: &B256) -> Option<&mut RequestDetails> {
        self.details.get_mut(id)
    }

    /// Returns whether request `id` is pending.
    #[must_use]
    pub fn is_pending(&self, id: &B256) -> bool {
        self.pending.contains(id)
    }

    /// Returns the pending set.
    #[must_use]
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Returns up to `limit` pending requests starting at `offset`.
    #[must_use]
    pub fn pending_requests(&self, offset: usize, limit: usize) -> Vec<PendingRequest> {
        self.pending
            .page(offset, limit)
            .iter()
            .map(|id| {
                let details = self.details.get(id).cloned().unwrap_or_default();
                PendingRequest {
                    id: *id,
                    request: self.requests.get(id).cloned().unwrap_or_default(),
                    requestor: details.requestor,
                    timestamp: details.timestamp,
                    requestFee: details.request_fee,
                    resultFee: details.result_fee,
                    batchFee: details.batch_fee,
                    gasLimit: details.gas_limit,
                }
            })
            .collect()
    }
}
