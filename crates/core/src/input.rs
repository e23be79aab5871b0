//! Inputs.
//!
//! This module contains the input replayed against a fresh [`crate::state::SedaCore`].

use serde::{Deserialize, Serialize};

use crate::{config::CoreConfig, sol::Batch, transactions::Call};

/// A genesis configuration and the calls to execute on top of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayInput {
    /// The genesis parameters.
    #[serde(default)]
    pub config: CoreConfig,
    /// The batch the prover is anchored at.
    #[serde(default)]
    pub initial_batch: Batch,
    /// The calls to execute, in order.
    pub calls: Vec<Call>,
}

impl ReplayInput {
    /// Parses a [`ReplayInput`] from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
