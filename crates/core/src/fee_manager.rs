//! Fee Manager.
//!
//! A pull-based balance ledger. Fees are credited to recipients as pending balances and leave the
//! ledger only when a recipient withdraws them. Payouts go through a [`PaymentSink`], which may
//! refuse a payment; the withdrawal then fails and the balance stays in place.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    errors::{CoreError, FeeError},
    events::{CoreEvent, EventLog},
    sol::{FeeAdded, FeeWithdrawn},
    transactions::CallContext,
    u256,
};

/// Receives the value paid out by [`FeeManager::withdraw_fees`].
pub trait PaymentSink {
    /// Transfers `amount` to `recipient`. An error aborts the withdrawal.
    fn pay(&mut self, recipient: Address, amount: U256) -> Result<(), String>;
}

/// A [`PaymentSink`] that records payouts in memory and can be told to refuse some recipients.
#[derive(Debug, Clone, Default)]
pub struct PayoutLedger {
    /// The total paid to each recipient.
    paid: BTreeMap<Address, U256>,
    /// Recipients whose payments are refused.
    rejecting: BTreeSet<Address>,
}

impl PayoutLedger {
    /// Refuses every future payment to `recipient`.
    pub fn reject(&mut self, recipient: Address) {
        self.rejecting.insert(recipient);
    }

    /// Returns the total paid to `recipient`.
    #[must_use]
    pub fn paid(&self, recipient: &Address) -> U256 {
        self.paid.get(recipient).copied().unwrap_or_default()
    }

    /// Returns the total paid to everyone.
    #[must_use]
    pub fn total_paid(&self) -> U256 {
        self.paid.values().fold(U256::ZERO, |acc, amount| acc.saturating_add(*amount))
    }
}

impl PaymentSink for PayoutLedger {
    fn pay(&mut self, recipient: Address, amount: U256) -> Result<(), String> {
        if self.rejecting.contains(&recipient) {
            return Err(format!("{recipient} rejects payments"));
        }
        let paid = self.paid.entry(recipient).or_default();
        *paid = paid.checked_add(amount).ok_or_else(|| "payout overflow".to_string())?;
        Ok(())
    }
}

/// A validated credit that can no longer fail.
///
/// Produced by [`FeeManager::prepare_multiple`] and applied by [`FeeManager::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct PreparedCredit {
    /// The credited recipients and amounts, in call order.
    credits: Vec<(Address, U256)>,
    /// The resulting balance of every touched recipient.
    balances: BTreeMap<Address, U256>,
    /// The resulting held balance of the manager.
    held: U256,
}

/// The pull-based fee ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeManager {
    /// The withdrawable balance of each recipient.
    pending_fees: BTreeMap<Address, U256>,
    /// The value held on behalf of all recipients.
    held: U256,
    /// Events emitted by successful calls.
    #[serde(skip)]
    events: EventLog,
}

impl FeeManager {
    /// Creates an empty [`FeeManager`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the attached value to `recipient`.
    pub fn add_pending_fees(
        &mut self,
        ctx: &CallContext,
        recipient: Address,
    ) -> Result<(), CoreError> {
        if ctx.value == U256::ZERO {
            return Err(
                FeeError::InvalidFeeAmount { expected: U256::from(1), actual: U256::ZERO }.into()
            );
        }
        let prepared = self.prepare_multiple(ctx.value, &[recipient], &[ctx.value])?;
        self.commit(prepared);
        Ok(())
    }

    /// Credits `amounts[i]` to `recipients[i]` in one call. The amounts must add up to the
    /// attached value.
    pub fn add_pending_fees_multiple(
        &mut self,
        ctx: &CallContext,
        recipients: &[Address],
        amounts: &[U256],
    ) -> Result<(), CoreError> {
        let prepared = self.prepare_multiple(ctx.value, recipients, amounts)?;
        self.commit(prepared);
        Ok(())
    }

    /// Validates a multi-recipient credit of `value` without applying it.
    pub fn prepare_multiple(
        &self,
        value: U256,
        recipients: &[Address],
        amounts: &[U256],
    ) -> Result<PreparedCredit, FeeError> {
        debug!("check recipients and amounts have the same length");
        if recipients.len() != amounts.len() {
            return Err(FeeError::ArrayLengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }

        debug!("check amounts add up to the attached value");
        let total = u256::sum(amounts)?;
        if total != value {
            return Err(FeeError::InvalidFeeAmount { expected: total, actual: value });
        }

        let mut balances = BTreeMap::new();
        for (recipient, amount) in recipients.iter().zip(amounts) {
            if recipient.is_zero() {
                return Err(FeeError::InvalidRecipient);
            }
            let balance =
                balances.entry(*recipient).or_insert_with(|| self.get_pending_fees(recipient));
            *balance = u256::add(*balance, *amount)?;
        }

        Ok(PreparedCredit {
            credits: recipients.iter().copied().zip(amounts.iter().copied()).collect(),
            balances,
            held: u256::add(self.held, value)?,
        })
    }

    /// Applies a credit validated by [`FeeManager::prepare_multiple`].
    pub fn commit(&mut self, prepared: PreparedCredit) {
        self.pending_fees.extend(prepared.balances);
        self.held = prepared.held;
        for (recipient, amount) in prepared.credits {
            debug!("FeeManager: Account({recipient}): + {amount}");
            self.events.emit(CoreEvent::FeeAdded(FeeAdded { recipient, amount }));
        }
    }

    /// Pays the caller their whole pending balance through `sink`.
    ///
    /// The balance is cleared before the payout. If the sink refuses the payment the withdrawal
    /// fails and the balance is restored.
    pub fn withdraw_fees<S: PaymentSink>(
        &mut self,
        ctx: &CallContext,
        sink: &mut S,
    ) -> Result<U256, CoreError> {
        ctx.require_no_value()?;

        let recipient = ctx.caller;
        let amount = self.get_pending_fees(&recipient);
        if amount == U256::ZERO {
            return Err(FeeError::NoFeesToWithdraw { account: recipient }.into());
        }

        info!("WITHDRAW_FEES(account={recipient}, amount={amount})");
        self.pending_fees.remove(&recipient);
        self.held = u256::sub(self.held, amount)?;

        if let Err(reason) = sink.pay(recipient, amount) {
            self.pending_fees.insert(recipient, amount);
            self.held += amount;
            return Err(FeeError::FeeTransferFailed { recipient, amount, reason }.into());
        }

        info!("├── Account({recipient}): - {amount}");
        self.events.emit(CoreEvent::FeeWithdrawn(FeeWithdrawn { recipient, amount }));
        Ok(amount)
    }

    /// Returns the withdrawable balance of `account`.
    #[must_use]
    pub fn get_pending_fees(&self, account: &Address) -> U256 {
        self.pending_fees.get(account).copied().unwrap_or_default()
    }

    /// Returns the value held on behalf of all recipients.
    #[must_use]
    pub fn held(&self) -> U256 {
        self.held
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
