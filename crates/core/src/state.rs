//! State.
//!
//! This module contains the state and the logic of the request and result lifecycle. The
//! [`SedaCore`] owns the request ledger, the escrowed value of pending requests and, optionally,
//! the [`FeeManager`] that settled fees are credited to. Results are checked against batches
//! through a [`ResultProver`].
//!
//! Every operation validates all of its preconditions before it mutates anything, so a failed call
//! leaves the state exactly as it was.

use alloy_primitives::{Address, B256, U256};
use tracing::{debug, info};

use crate::{
    access::AccessControl,
    config::CoreConfig,
    errors::{CoreError, RequestError},
    events::{CoreEvent, EventLog},
    fee::distribute,
    fee_manager::{FeeManager, PaymentSink, PreparedCredit},
    hashing::{derive_request_id, derive_result_id, VERSION},
    ledger::{RequestDetails, RequestLedger},
    prover::Secp256k1Prover,
    receipts::{CallOutput, CallReceipt},
    sol::{
        Batch, DataResult, FeeDistributed, FeeType, FeesIncreased, OwnershipTransferStarted,
        OwnershipTransferred, Paused, PendingRequest, Request, RequestInputs, RequestPosted,
        RequestWithdrawn, ResultPosted, TimeoutPeriodUpdated, Unpaused,
    },
    transactions::{Call, CallContext, CoreTransaction},
    u256,
    utils::deadline,
    verifier::ResultProver,
};

/// The state of the SEDA core.
#[derive(Debug, Clone)]
pub struct SedaCore<P: ResultProver = Secp256k1Prover> {
    /// The number of calls executed through [`SedaCore::execute`] so far, plus one.
    tx_id: u64,
    /// Owner and pause flag.
    access: AccessControl,
    /// Verifies results against posted batches.
    prover: P,
    /// Requests, results and pending bookkeeping.
    ledger: RequestLedger,
    /// Where settled fees are credited. Without one, requests cannot carry fees.
    fee_manager: Option<FeeManager>,
    /// How long a request stays pending before it may be reclaimed, in seconds.
    timeout_period: u64,
    /// The value escrowed for pending requests.
    balance: U256,
    /// Events emitted by successful calls.
    events: EventLog,
}

impl SedaCore<Secp256k1Prover> {
    /// Creates a new [`SedaCore`] backed by a [`Secp256k1Prover`] anchored at `initial_batch`.
    pub fn new(config: &CoreConfig, initial_batch: &Batch) -> Result<Self, CoreError> {
        let prover = Secp256k1Prover::new(initial_batch, config.max_batch_age, config.owner);
        Self::with_prover(config, prover)
    }

    /// Executes a [`Call`] and returns its [`CallReceipt`].
    ///
    /// Payouts made by [`CoreTransaction::WithdrawFees`] go through `sink`.
    #[allow(clippy::too_many_lines)]
    pub fn execute<S: PaymentSink>(
        &mut self,
        call: &Call,
        sink: &mut S,
    ) -> Result<CallReceipt, CoreError> {
        let ctx = &call.ctx;
        // Prover events emitted outside of `execute` belong to no receipt.
        self.events.extend(self.prover.events_mut().take());
        let start = self.events.len();

        let output = match &call.tx {
            CoreTransaction::PostRequest(tx) => {
                info!(
                    "TX {}: POST_REQUEST(caller={}, value={}, fees={}/{}/{})",
                    self.tx_id, ctx.caller, ctx.value, tx.request_fee, tx.result_fee, tx.batch_fee
                );
                CallOutput::RequestId(self.post_request_with_fees(
                    ctx,
                    &tx.inputs,
                    tx.request_fee,
                    tx.result_fee,
                    tx.batch_fee,
                )?)
            }
            CoreTransaction::PostResult(tx) => {
                info!(
                    "TX {}: POST_RESULT(caller={}, dr_id={}, batch_height={})",
                    self.tx_id, ctx.caller, tx.result.drId, tx.batch_height
                );
                CallOutput::ResultId(self.post_result(ctx, &tx.result, tx.batch_height, &tx.proof)?)
            }
            CoreTransaction::PostBatch(tx) => {
                info!(
                    "TX {}: POST_BATCH(caller={}, height={}, signatures={})",
                    self.tx_id,
                    ctx.caller,
                    tx.batch.batchHeight,
                    tx.signatures.len()
                );
                self.prover.post_batch(ctx, &tx.batch, &tx.signatures, &tx.proofs)?;
                self.events.extend(self.prover.events_mut().take());
                CallOutput::None
            }
            CoreTransaction::IncreaseFees(tx) => {
                info!(
                    "TX {}: INCREASE_FEES(caller={}, id={})",
                    self.tx_id, ctx.caller, tx.request_id
                );
                self.increase_fees(
                    ctx,
                    tx.request_id,
                    tx.additional_request_fee,
                    tx.additional_result_fee,
                    tx.additional_batch_fee,
                )?;
                CallOutput::None
            }
            CoreTransaction::WithdrawTimedOutRequest { request_id } => {
                info!(
                    "TX {}: WITHDRAW_TIMED_OUT_REQUEST(caller={}, id={})",
                    self.tx_id, ctx.caller, request_id
                );
                CallOutput::Withdrawn(self.withdraw_timed_out_request(ctx, *request_id)?)
            }
            CoreTransaction::WithdrawFees => {
                info!("TX {}: WITHDRAW_FEES(caller={})", self.tx_id, ctx.caller);
                CallOutput::Withdrawn(self.withdraw_fees(ctx, sink)?)
            }
            CoreTransaction::SetTimeoutPeriod { timeout_period } => {
                info!("TX {}: SET_TIMEOUT_PERIOD({})", self.tx_id, timeout_period);
                self.set_timeout_period(ctx, *timeout_period)?;
                CallOutput::None
            }
            CoreTransaction::Pause => {
                info!("TX {}: PAUSE(caller={})", self.tx_id, ctx.caller);
                self.pause(ctx)?;
                CallOutput::None
            }
            CoreTransaction::Unpause => {
                info!("TX {}: UNPAUSE(caller={})", self.tx_id, ctx.caller);
                self.unpause(ctx)?;
                CallOutput::None
            }
            CoreTransaction::PauseProver => {
                info!("TX {}: PAUSE_PROVER(caller={})", self.tx_id, ctx.caller);
                self.prover.pause(ctx)?;
                self.events.extend(self.prover.events_mut().take());
                CallOutput::None
            }
            CoreTransaction::UnpauseProver => {
                info!("TX {}: UNPAUSE_PROVER(caller={})", self.tx_id, ctx.caller);
                self.prover.unpause(ctx)?;
                self.events.extend(self.prover.events_mut().take());
                CallOutput::None
            }
            CoreTransaction::TransferOwnership { new_owner } => {
                info!("TX {}: TRANSFER_OWNERSHIP(to={})", self.tx_id, new_owner);
                self.transfer_ownership(ctx, *new_owner)?;
                CallOutput::None
            }
            CoreTransaction::AcceptOwnership => {
                info!("TX {}: ACCEPT_OWNERSHIP(caller={})", self.tx_id, ctx.caller);
                self.accept_ownership(ctx)?;
                CallOutput::None
            }
        };

        self.tx_id += 1;
        Ok(CallReceipt { output, events: self.events.entries()[start..].to_vec() })
    }
}

impl<P: ResultProver> SedaCore<P> {
    /// Creates a new [`SedaCore`] that verifies results with `prover`.
    pub fn with_prover(config: &CoreConfig, prover: P) -> Result<Self, CoreError> {
        if config.timeout_period == 0 {
            return Err(RequestError::InvalidTimeoutPeriod.into());
        }
        Ok(Self {
            tx_id: 1,
            access: AccessControl::new(config.owner),
            prover,
            ledger: RequestLedger::new(),
            fee_manager: config.fee_manager.then(FeeManager::new),
            timeout_period: config.timeout_period,
            balance: U256::ZERO,
            events: EventLog::default(),
        })
    }

    /// Posts a request without fees.
    pub fn post_request(
        &mut self,
        ctx: &CallContext,
        inputs: &RequestInputs,
    ) -> Result<B256, CoreError> {
        self.post_request_with_fees(ctx, inputs, U256::ZERO, U256::ZERO, U256::ZERO)
    }

    /// Posts a request and escrows its fees. The attached value must equal the sum of the fees.
    ///
    /// Posting the inputs of a request that is still pending returns its id without changing
    /// anything, as long as no value is attached. Use [`SedaCore::increase_fees`] to add fees to
    /// a pending request.
    pub fn post_request_with_fees(
        &mut self,
        ctx: &CallContext,
        inputs: &RequestInputs,
        request_fee: U256,
        result_fee: U256,
        batch_fee: U256,
    ) -> Result<B256, CoreError> {
        self.access.require_not_paused()?;

        debug!("check attached value matches fees");
        let total = u256::sum([&request_fee, &result_fee, &batch_fee])?;
        if ctx.value != total {
            return Err(
                RequestError::InvalidFeeAmount { expected: total, actual: ctx.value }.into()
            );
        }

        debug!("check fee manager is configured");
        if total > U256::ZERO && self.fee_manager.is_none() {
            return Err(RequestError::FeeManagerRequired.into());
        }

        debug!("check replication factor");
        if inputs.replicationFactor == 0 {
            return Err(RequestError::InvalidReplicationFactor.into());
        }

        let id = derive_request_id(inputs);

        debug!("check request is not resolved");
        if self.ledger.result(&id).is_some() {
            return Err(RequestError::RequestAlreadyResolved { id }.into());
        }

        if self.ledger.is_pending(&id) {
            if total > U256::ZERO {
                return Err(RequestError::RequestAlreadyExists { id }.into());
            }
            debug!("request {id} is already pending");
            return Ok(id);
        }

        let balance = u256::add(self.balance, total)?;
        let gas_limit = U256::from(inputs.execGasLimit) + U256::from(inputs.tallyGasLimit);
        let details = RequestDetails {
            requestor: ctx.caller,
            timestamp: ctx.timestamp,
            request_fee,
            result_fee,
            batch_fee,
            gas_limit,
        };

        info!("├── Request {id}: pending (gas_limit={gas_limit})");
        self.ledger.insert_request(id, Request::from_inputs(inputs, VERSION), details);
        self.balance = balance;
        self.events.emit(CoreEvent::RequestPosted(RequestPosted { requestId: id }));
        Ok(id)
    }

    /// Posts the result of a request, proven against the batch at `batch_height`, and settles
    /// the fees of the request.
    ///
    /// Results for requests that were never posted here are accepted too; they carry no fees and
    /// skip the timestamp check.
    ///
    /// A request is tracked by its [`RequestDetails`], not by a non-zero timestamp. A request
    /// posted at timestamp 0 is therefore pending, and its result must carry a block timestamp of
    /// at least 1.
    pub fn post_result(
        &mut self,
        ctx: &CallContext,
        result: &DataResult,
        batch_height: u64,
        proof: &[B256],
    ) -> Result<B256, CoreError> {
        ctx.require_no_value()?;
        self.access.require_not_paused()?;

        let dr_id = result.drId;
        let result_id = derive_result_id(result);

        debug!("check result does not exist");
        if self.ledger.result(&dr_id).is_some() {
            return Err(RequestError::ResultAlreadyExists { id: dr_id }.into());
        }

        let details = self.ledger.details(&dr_id).cloned();
        if let Some(details) = &details {
            debug!("check result is newer than request");
            if result.blockTimestamp <= details.timestamp {
                return Err(RequestError::InvalidResultTimestamp {
                    id: dr_id,
                    result_timestamp: result.blockTimestamp,
                    request_timestamp: details.timestamp,
                }
                .into());
            }
        }

        debug!("check result proof");
        let (valid, batch_sender) = self.prover.verify_result_proof(result_id, batch_height, proof);
        if !valid {
            return Err(RequestError::InvalidResultProof { id: result_id }.into());
        }

        let mut settlement = None;
        if let (Some(details), Some(fee_manager)) = (&details, &self.fee_manager) {
            let distribution = distribute(result, details, ctx.caller, batch_sender)?;
            if !distribution.entries.is_empty() {
                let prepared = fee_manager.prepare_multiple(
                    distribution.total,
                    &distribution.recipients(),
                    &distribution.amounts(),
                )?;
                let balance = u256::sub(self.balance, distribution.total)?;
                settlement = Some((distribution.events(dr_id), prepared, balance));
            }
        }

        info!("├── Result {result_id}: resolves {dr_id}");
        self.ledger.insert_result(result.clone());
        if let Some((events, prepared, balance)) = settlement {
            self.balance = balance;
            self.credit(prepared);
            self.events.extend(events.into_iter().map(CoreEvent::FeeDistributed));
        }
        self.events.emit(CoreEvent::ResultPosted(ResultPosted { resultId: result_id }));
        Ok(result_id)
    }

    /// Adds to the fees of a pending request. The attached value must equal the sum of the
    /// additions.
    pub fn increase_fees(
        &mut self,
        ctx: &CallContext,
        request_id: B256,
        additional_request_fee: U256,
        additional_result_fee: U256,
        additional_batch_fee: U256,
    ) -> Result<(), CoreError> {
        self.access.require_not_paused()?;

        debug!("check fee manager is configured");
        if self.fee_manager.is_none() {
            return Err(RequestError::FeeManagerRequired.into());
        }

        debug!("check attached value matches additional fees");
        let total =
            u256::sum([&additional_request_fee, &additional_result_fee, &additional_batch_fee])?;
        if ctx.value != total {
            return Err(
                RequestError::InvalidFeeAmount { expected: total, actual: ctx.value }.into()
            );
        }

        debug!("check request is pending");
        let details = self
            .ledger
            .details(&request_id)
            .ok_or(RequestError::RequestNotFound { id: request_id })?;

        let request_fee = u256::add(details.request_fee, additional_request_fee)?;
        let result_fee = u256::add(details.result_fee, additional_result_fee)?;
        let batch_fee = u256::add(details.batch_fee, additional_batch_fee)?;
        let balance = u256::add(self.balance, total)?;

        if let Some(details) = self.ledger.details_mut(&request_id) {
            details.request_fee = request_fee;
            details.result_fee = result_fee;
            details.batch_fee = batch_fee;
        }
        self.balance = balance;
        info!("├── Request {request_id}: fees = {request_fee}/{result_fee}/{batch_fee}");

        self.events.emit(CoreEvent::FeesIncreased(FeesIncreased {
            requestId: request_id,
            additionalRequestFee: additional_request_fee,
            additionalResultFee: additional_result_fee,
            additionalBatchFee: additional_batch_fee,
        }));
        Ok(())
    }

    /// Returns every fee of a request that timed out to its requestor. Anyone may call this, and
    /// it stays available while the core is paused.
    ///
    /// Returns the amount credited to the requestor.
    pub fn withdraw_timed_out_request(
        &mut self,
        ctx: &CallContext,
        request_id: B256,
    ) -> Result<U256, CoreError> {
        ctx.require_no_value()?;

        debug!("check request is pending");
        let details = self
            .ledger
            .details(&request_id)
            .cloned()
            .ok_or(RequestError::RequestNotFound { id: request_id })?;

        debug!("check request timed out");
        let timeout_at = deadline(details.timestamp, self.timeout_period);
        if ctx.timestamp < timeout_at {
            return Err(RequestError::RequestNotTimedOut {
                id: request_id,
                now: ctx.timestamp,
                timeout_at,
            }
            .into());
        }

        let amount = details.total_fees()?;
        let mut refund = None;
        if amount > U256::ZERO {
            let fee_manager =
                self.fee_manager.as_ref().ok_or(RequestError::FeeManagerRequired)?;
            let prepared = fee_manager.prepare_multiple(amount, &[details.requestor], &[amount])?;
            refund = Some((prepared, u256::sub(self.balance, amount)?));
        }

        self.ledger.retire(&request_id);
        if let Some((prepared, balance)) = refund {
            self.balance = balance;
            self.credit(prepared);
            self.events.emit(CoreEvent::FeeDistributed(FeeDistributed {
                drId: request_id,
                recipient: details.requestor,
                amount,
                feeType: FeeType::WITHDRAW,
            }));
        }
        info!("├── Account({}): + {} (timed out)", details.requestor, amount);

        self.events.emit(CoreEvent::RequestWithdrawn(RequestWithdrawn {
            requestId: request_id,
            amount,
        }));
        Ok(amount)
    }

    /// Pays the caller their pending fees from the fee manager.
    pub fn withdraw_fees<S: PaymentSink>(
        &mut self,
        ctx: &CallContext,
        sink: &mut S,
    ) -> Result<U256, CoreError> {
        let fee_manager = self.fee_manager.as_mut().ok_or(RequestError::FeeManagerRequired)?;
        let amount = fee_manager.withdraw_fees(ctx, sink)?;
        self.events.extend(fee_manager.events_mut().take());
        Ok(amount)
    }

    /// Applies a validated credit to the fee manager, keeping its events in call order.
    fn credit(&mut self, prepared: PreparedCredit) {
        if let Some(fee_manager) = self.fee_manager.as_mut() {
            fee_manager.commit(prepared);
            self.events.extend(fee_manager.events_mut().take());
        }
    }

    /// Returns up to `limit` pending requests starting at `offset`.
    pub fn get_pending_requests(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<PendingRequest>, CoreError> {
        self.access.require_not_paused()?;
        Ok(self.ledger.pending_requests(offset, limit))
    }

    /// Returns the request stored under `request_id`.
    pub fn get_request(&self, request_id: B256) -> Result<&Request, CoreError> {
        Ok(self
            .ledger
            .request(&request_id)
            .ok_or(RequestError::RequestNotFound { id: request_id })?)
    }

    /// Returns the result stored for request `request_id`.
    pub fn get_result(&self, request_id: B256) -> Result<&DataResult, CoreError> {
        Ok(self
            .ledger
            .result(&request_id)
            .ok_or(RequestError::ResultNotFound { id: request_id })?)
    }

    /// Returns the settlement bookkeeping of pending request `request_id`.
    pub fn get_request_details(&self, request_id: B256) -> Result<&RequestDetails, CoreError> {
        Ok(self
            .ledger
            .details(&request_id)
            .ok_or(RequestError::RequestNotFound { id: request_id })?)
    }

    /// Returns the timeout period, in seconds.
    #[must_use]
    pub fn get_timeout_period(&self) -> u64 {
        self.timeout_period
    }

    /// Sets the timeout period. Only the owner may call this.
    pub fn set_timeout_period(
        &mut self,
        ctx: &CallContext,
        timeout_period: u64,
    ) -> Result<(), CoreError> {
        ctx.require_no_value()?;
        self.access.require_owner(ctx.caller)?;
        if timeout_period == 0 {
            return Err(RequestError::InvalidTimeoutPeriod.into());
        }
        self.timeout_period = timeout_period;
        self.events.emit(CoreEvent::TimeoutPeriodUpdated(TimeoutPeriodUpdated {
            newTimeoutPeriod: U256::from(timeout_period),
        }));
        Ok(())
    }

    /// Returns the pending fees of `account`. Zero without a fee manager.
    #[must_use]
    pub fn get_pending_fees(&self, account: &Address) -> U256 {
        self.fee_manager.as_ref().map(|fm| fm.get_pending_fees(account)).unwrap_or_default()
    }

    /// Returns the fee manager, if one is configured.
    #[must_use]
    pub fn get_fee_manager(&self) -> Option<&FeeManager> {
        self.fee_manager.as_ref()
    }

    /// Checks a result proof against the batch at `batch_height`.
    #[must_use]
    pub fn verify_result_proof(
        &self,
        result_id: B256,
        batch_height: u64,
        proof: &[B256],
    ) -> (bool, Address) {
        self.prover.verify_result_proof(result_id, batch_height, proof)
    }

    /// Pauses the core. Only the owner may call this.
    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), CoreError> {
        self.access.pause(ctx)?;
        self.events.emit(CoreEvent::Paused(Paused { account: ctx.caller }));
        Ok(())
    }

    /// Unpauses the core. Only the owner may call this.
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), CoreError> {
        self.access.unpause(ctx)?;
        self.events.emit(CoreEvent::Unpaused(Unpaused { account: ctx.caller }));
        Ok(())
    }

    /// Starts transferring ownership of the core to `new_owner`.
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), CoreError> {
        self.access.transfer_ownership(ctx, new_owner)?;
        self.events.emit(CoreEvent::OwnershipTransferStarted(OwnershipTransferStarted {
            previousOwner: self.access.owner(),
            newOwner: new_owner,
        }));
        Ok(())
    }

    /// Completes an ownership transfer started towards the caller.
    pub fn accept_ownership(&mut self, ctx: &CallContext) -> Result<(), CoreError> {
        let previous = self.access.accept_ownership(ctx)?;
        self.events.emit(CoreEvent::OwnershipTransferred(OwnershipTransferred {
            previousOwner: previous,
            newOwner: ctx.caller,
        }));
        Ok(())
    }

    /// Returns the access control of the core.
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Returns the prover.
    #[must_use]
    pub fn prover(&self) -> &P {
        &self.prover
    }

    /// Returns the prover, mutably.
    pub fn prover_mut(&mut self) -> &mut P {
        &mut self.prover
    }

    /// Returns the request ledger.
    #[must_use]
    pub fn ledger(&self) -> &RequestLedger {
        &self.ledger
    }

    /// Returns the value escrowed for pending requests.
    #[must_use]
    pub fn balance(&self) -> U256 {
        self.balance
    }

    /// Returns the id the next executed call is logged with.
    #[must_use]
    pub fn tx_id(&self) -> u64 {
        self.tx_id
    }

    /// Returns the events emitted so far.
    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Returns the events emitted so far, mutably.
    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }
}
