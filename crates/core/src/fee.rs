//! Fee Settlement.
//!
//! This module contains the functions that split the fees locked by a request once its result
//! has been proven. Up to four parties are paid: the executor (through the result's payback
//! address), the result submitter, the batch submitter and the requestor, who receives a single
//! combined refund of everything not paid out to the others.

use alloy_primitives::{Address, B256, U256};
use tracing::info;

use crate::{
    errors::FeeError,
    ledger::RequestDetails,
    sol::{DataResult, FeeDistributed, FeeType},
    u256,
};

/// A single credit produced by settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEntry {
    /// The account credited.
    pub recipient: Address,
    /// The amount credited.
    pub amount: U256,
    /// Why the account is credited.
    pub fee_type: FeeType,
}

/// The credits produced by settling one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeDistribution {
    /// The non-zero credits, in the order request, result, batch, refund.
    pub entries: Vec<FeeEntry>,
    /// The sum of all credits.
    pub total: U256,
}

impl FeeDistribution {
    /// Adds a credit unless `amount` is zero.
    fn push(
        &mut self,
        recipient: Address,
        amount: U256,
        fee_type: FeeType,
    ) -> Result<(), FeeError> {
        if amount == U256::ZERO {
            return Ok(());
        }
        self.total = u256::add(self.total, amount)?;
        self.entries.push(FeeEntry { recipient, amount, fee_type });
        Ok(())
    }

    /// Returns the recipients, in entry order.
    #[must_use]
    pub fn recipients(&self) -> Vec<Address> {
        self.entries.iter().map(|entry| entry.recipient).collect()
    }

    /// Returns the amounts, in entry order.
    #[must_use]
    pub fn amounts(&self) -> Vec<U256> {
        self.entries.iter().map(|entry| entry.amount).collect()
    }

    /// Returns the [`FeeDistributed`] events describing the credits for request `dr_id`.
    #[must_use]
    pub fn events(&self, dr_id: B256) -> Vec<FeeDistributed> {
        self.entries
            .iter()
            .map(|entry| FeeDistributed {
                drId: dr_id,
                recipient: entry.recipient,
                amount: entry.amount,
                feeType: entry.fee_type,
            })
            .collect()
    }
}

/// Returns the part of `request_fee` owed to the executor for using `gas_used` of `gas_limit`.
///
/// No gas used pays nothing. Using the whole limit or more pays the whole fee. Anything in
/// between pays `request_fee * gas_used / gas_limit`, rounded down.
pub fn executor_share(
    request_fee: U256,
    gas_used: U256,
    gas_limit: U256,
) -> Result<U256, FeeError> {
    if gas_used == U256::ZERO {
        return Ok(U256::ZERO);
    }
    if gas_used >= gas_limit {
        return Ok(request_fee);
    }
    u256::div(u256::mul(request_fee, gas_used)?, gas_limit)
}

/// Splits the fees of a request whose `result` has been proven.
///
/// `result_submitter` is the caller of `postResult`. `batch_sender` is the account that posted
/// the batch the result was proven against, or zero if unknown.
pub fn distribute(
    result: &DataResult,
    details: &RequestDetails,
    result_submitter: Address,
    batch_sender: Address,
) -> Result<FeeDistribution, FeeError> {
    let mut distribution = FeeDistribution::default();
    let mut refund = U256::ZERO;

    if details.request_fee > U256::ZERO {
        match result.payback().filter(|payback| !payback.is_zero()) {
            Some(payback) => {
                let share = executor_share(details.request_fee, result.gasUsed, details.gas_limit)?;
                info!(
                    "├── Request Fee = {} × {}/{} gas = {}",
                    details.request_fee, result.gasUsed, details.gas_limit, share
                );
                distribution.push(payback, share, FeeType::REQUEST)?;
                refund = u256::add(refund, u256::sub(details.request_fee, share)?)?;
            }
            None => {
                info!(
                    "├── Request Fee: no payback address, refunding {}",
                    details.request_fee
                );
                refund = u256::add(refund, details.request_fee)?;
            }
        }
    }

    distribution.push(result_submitter, details.result_fee, FeeType::RESULT)?;

    if details.batch_fee > U256::ZERO {
        if batch_sender.is_zero() {
            info!("├── Batch Fee: no batch sender, refunding {}", details.batch_fee);
            refund = u256::add(refund, details.batch_fee)?;
        } else {
            distribution.push(batch_sender, details.batch_fee, FeeType::BATCH)?;
        }
    }

    distribution.push(details.requestor, refund, FeeType::REFUND)?;

    for entry in &distribution.entries {
        info!("├── Account({}): + {} ({:?})", entry.recipient, entry.amount, entry.fee_type);
    }

    Ok(distribution)
}
