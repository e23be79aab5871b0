//! Receipts.
//!
//! What a successful call returns to its caller.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::events::CoreEvent;

/// The return value of a successful call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutput {
    /// The id of a posted request.
    RequestId(B256),
    /// The id of a posted result.
    ResultId(B256),
    /// The amount paid out by a withdrawal.
    Withdrawn(U256),
    /// The call returns nothing.
    None,
}

/// The outcome of a successful call: its return value and the events it emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    /// The return value.
    pub output: CallOutput,
    /// The events emitted by the call, in emission order.
    pub events: Vec<CoreEvent>,
}

impl CallReceipt {
    /// Returns the request or result id carried by the receipt, if any.
    #[must_use]
    pub fn id(&self) -> Option<B256> {
        match self.output {
            CallOutput::RequestId(id) | CallOutput::ResultId(id) => Some(id),
            CallOutput::Withdrawn(_) | CallOutput::None => None,
        }
    }
}
