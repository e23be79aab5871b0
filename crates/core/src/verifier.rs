use alloy_primitives::{Address, B256};

/// Verifies that a result was committed to by a posted batch.
///
/// [`crate::state::SedaCore`] depends only on this trait, so the batch verifier behind it can be
/// swapped without touching the request and settlement logic.
pub trait ResultProver {
    /// Checks `proof` for `result_id` against the results root stored at `batch_height`.
    ///
    /// Returns whether the proof is valid and, if it is, the address that posted the batch.
    /// An invalid proof returns [`Address::ZERO`].
    fn verify_result_proof(
        &self,
        result_id: B256,
        batch_height: u64,
        proof: &[B256],
    ) -> (bool, Address);
}

/// A prover that accepts every proof and attributes it to a fixed batch sender.
#[derive(Debug, Clone, Default)]
pub struct MockProver {
    /// The address returned as the batch sender.
    pub batch_sender: Address,
}

impl ResultProver for MockProver {
    fn verify_result_proof(
        &self,
        _result_id: B256,
        _batch_height: u64,
        _proof: &[B256],
    ) -> (bool, Address) {
        (true, self.batch_sender)
    }
}
