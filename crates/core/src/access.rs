//! Access Control.
//!
//! Ownership and pausing, expressed as explicit checks that each operation composes before it
//! touches state.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{errors::AccessError, transactions::CallContext};

/// Owner and pause flag of a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    /// The account allowed to run admin operations.
    owner: Address,
    /// The account an ownership transfer was started towards, if any.
    pending_owner: Option<Address>,
    /// Whether gated operations are currently rejected.
    paused: bool,
}

impl AccessControl {
    /// Creates an unpaused [`AccessControl`] owned by `owner`.
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self { owner, pending_owner: None, paused: false }
    }

    /// Returns the owner.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Returns the pending owner, if an ownership transfer is in progress.
    #[must_use]
    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    /// Returns whether the component is paused.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Fails unless `account` is the owner.
    pub fn require_owner(&self, account: Address) -> Result<(), AccessError> {
        if account != self.owner {
            return Err(AccessError::UnauthorizedAccount { account });
        }
        Ok(())
    }

    /// Fails while the component is paused.
    pub fn require_not_paused(&self) -> Result<(), AccessError> {
        if self.paused {
            return Err(AccessError::EnforcedPause);
        }
        Ok(())
    }

    /// Fails unless the component is paused.
    pub fn require_paused(&self) -> Result<(), AccessError> {
        if !self.paused {
            return Err(AccessError::ExpectedPause);
        }
        Ok(())
    }

    /// Pauses the component.
    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), AccessError> {
        ctx.require_no_value()?;
        self.require_owner(ctx.caller)?;
        self.require_not_paused()?;
        info!("PAUSE(by={})", ctx.caller);
        self.paused = true;
        Ok(())
    }

    /// Unpauses the component.
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), AccessError> {
        ctx.require_no_value()?;
        self.require_owner(ctx.caller)?;
        self.require_paused()?;
        info!("UNPAUSE(by={})", ctx.caller);
        self.paused = false;
        Ok(())
    }

    /// Starts transferring ownership to `new_owner`. The transfer completes once `new_owner`
    /// calls [`AccessControl::accept_ownership`].
    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), AccessError> {
        ctx.require_no_value()?;
        self.require_owner(ctx.caller)?;
        debug!("start ownership transfer {} -> {}", self.owner, new_owner);
        self.pending_owner = Some(new_owner);
        Ok(())
    }

    /// Completes a pending ownership transfer. Returns the previous owner.
    pub fn accept_ownership(&mut self, ctx: &CallContext) -> Result<Address, AccessError> {
        ctx.require_no_value()?;
        if self.pending_owner != Some(ctx.caller) {
            return Err(AccessError::UnauthorizedAccount { account: ctx.caller });
        }
        let previous = self.owner;
        info!("OWNERSHIP({} -> {})", previous, ctx.caller);
        self.owner = ctx.caller;
        self.pending_owner = None;
        Ok(previous)
    }
}

impl CallContext {
    /// Fails if the call carries value. Used by every non-payable operation.
    pub fn require_no_value(&self) -> Result<(), AccessError> {
        if self.value != U256::ZERO {
            return Err(AccessError::NonPayable { value: self.value });
        }
        Ok(())
    }
}
