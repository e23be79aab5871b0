//! Configuration.
//!
//! Genesis parameters of a [`crate::state::SedaCore`].

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// The default timeout period, in seconds.
pub const DEFAULT_TIMEOUT_PERIOD: u64 = 86_400;

/// The default size of the batch backfill window.
pub const DEFAULT_MAX_BATCH_AGE: u64 = 100;

/// Genesis parameters of the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// The owner of the core and its prover.
    #[serde(default)]
    pub owner: Address,
    /// How long a request stays pending before its requestor may reclaim it, in seconds.
    #[serde(default = "default_timeout_period")]
    pub timeout_period: u64,
    /// How far below the last batch height a batch may still be backfilled.
    #[serde(default = "default_max_batch_age")]
    pub max_batch_age: u64,
    /// Whether a fee manager is wired up. Without one, requests cannot carry fees.
    #[serde(default = "default_fee_manager")]
    pub fee_manager: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            timeout_period: DEFAULT_TIMEOUT_PERIOD,
            max_batch_age: DEFAULT_MAX_BATCH_AGE,
            fee_manager: true,
        }
    }
}

fn default_timeout_period() -> u64 {
    DEFAULT_TIMEOUT_PERIOD
}

fn default_max_batch_age() -> u64 {
    DEFAULT_MAX_BATCH_AGE
}

fn default_fee_manager() -> bool {
    true
}
