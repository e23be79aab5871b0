//! Events.
//!
//! Every successful state transition appends the events it emitted to an [`EventLog`]. Failed
//! calls emit nothing.

use alloy_primitives::LogData;
use alloy_sol_types::SolEvent;

use crate::sol::{
    BatchPosted, FeeAdded, FeeDistributed, FeeWithdrawn, FeesIncreased, OwnershipTransferStarted,
    OwnershipTransferred, Paused, RequestPosted, RequestWithdrawn, ResultPosted,
    TimeoutPeriodUpdated, Unpaused,
};

/// An event emitted by one of the components.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CoreEvent {
    BatchPosted(BatchPosted),
    RequestPosted(RequestPosted),
    ResultPosted(ResultPosted),
    FeesIncreased(FeesIncreased),
    FeeDistributed(FeeDistributed),
    RequestWithdrawn(RequestWithdrawn),
    TimeoutPeriodUpdated(TimeoutPeriodUpdated),
    Paused(Paused),
    Unpaused(Unpaused),
    OwnershipTransferStarted(OwnershipTransferStarted),
    OwnershipTransferred(OwnershipTransferred),
    FeeAdded(FeeAdded),
    FeeWithdrawn(FeeWithdrawn),
}

impl CoreEvent {
    /// ABI-encodes the event into topics and data, as it would appear in an EVM log.
    #[must_use]
    pub fn log_data(&self) -> LogData {
        match self {
            CoreEvent::BatchPosted(event) => event.encode_log_data(),
            CoreEvent::RequestPosted(event) => event.encode_log_data(),
            CoreEvent::ResultPosted(event) => event.encode_log_data(),
            CoreEvent::FeesIncreased(event) => event.encode_log_data(),
            CoreEvent::FeeDistributed(event) => event.encode_log_data(),
            CoreEvent::RequestWithdrawn(event) => event.encode_log_data(),
            CoreEvent::TimeoutPeriodUpdated(event) => event.encode_log_data(),
            CoreEvent::Paused(event) => event.encode_log_data(),
            CoreEvent::Unpaused(event) => event.encode_log_data(),
            CoreEvent::OwnershipTransferStarted(event) => event.encode_log_data(),
            CoreEvent::OwnershipTransferred(event) => event.encode_log_data(),
            CoreEvent::FeeAdded(event) => event.encode_log_data(),
            CoreEvent::FeeWithdrawn(event) => event.encode_log_data(),
        }
    }
}

/// An append-only list of emitted events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<CoreEvent>,
}

impl EventLog {
    /// Appends an event.
    pub fn emit(&mut self, event: CoreEvent) {
        self.entries.push(event);
    }

    /// Returns the events emitted so far.
    #[must_use]
    pub fn entries(&self) -> &[CoreEvent] {
        &self.entries
    }

    /// Appends several events, keeping their order.
    pub fn extend(&mut self, events: impl IntoIterator<Item = CoreEvent>) {
        self.entries.extend(events);
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no events were emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns the events emitted so far.
    pub fn take(&mut self) -> Vec<CoreEvent> {
        std::mem::take(&mut self.entries)
    }
}
