//! Batch Consensus Verification.
//!
//! The [`Secp256k1Prover`] accepts batches signed by a quorum of the current validator set and
//! keeps the results root of every accepted batch, so that results can later be proven against
//! the batch height they were included at.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, Keccak256, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    access::AccessControl,
    errors::{CoreError, ProverError},
    events::{CoreEvent, EventLog},
    hashing::{derive_batch_id, result_leaf, validator_leaf},
    merkle,
    signing::verify_signer,
    sol::{Batch, BatchPosted, Paused, Unpaused, ValidatorProof},
    transactions::CallContext,
    verifier::ResultProver,
};

/// Voting power required for consensus, in parts per [`CONSENSUS_DENOMINATOR`] (≈ 2/3).
pub const CONSENSUS_PERCENTAGE: u64 = 66_666_666;

/// The total voting power of a validator set.
pub const CONSENSUS_DENOMINATOR: u64 = 100_000_000;

/// What is kept for every accepted batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchData {
    /// The results root of the batch.
    pub results_root: B256,
    /// The account that posted the batch. Zero for the initial batch.
    pub sender: Address,
}

/// Verifies secp256k1-signed batches and the results committed to by them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secp256k1Prover {
    /// Owner and pause flag.
    access: AccessControl,
    /// The height of the most recent batch.
    last_batch_height: u64,
    /// The validator set that must sign the next batch.
    last_validators_root: B256,
    /// How far below `last_batch_height` a batch may still be backfilled.
    max_batch_age: u64,
    /// Accepted batches by height.
    batches: BTreeMap<u64, BatchData>,
    /// Events emitted by successful calls.
    #[serde(skip)]
    events: EventLog,
}

impl Secp256k1Prover {
    /// Creates a new [`Secp256k1Prover`] anchored at `initial_batch`.
    ///
    /// The initial batch is trusted as given and has no sender.
    #[must_use]
    pub fn new(initial_batch: &Batch, max_batch_age: u64, owner: Address) -> Self {
        let mut batches = BTreeMap::new();
        batches.insert(
            initial_batch.batchHeight,
            BatchData { results_root: initial_batch.resultsRoot, sender: Address::ZERO },
        );
        Self {
            access: AccessControl::new(owner),
            last_batch_height: initial_batch.batchHeight,
            last_validators_root: initial_batch.validatorsRoot,
            max_batch_age,
            batches,
            events: EventLog::default(),
        }
    }

    /// Posts a new batch, or backfills one within the trailing window.
    ///
    /// `proofs` must be sorted strictly ascending by signer and `signatures[i]` must be the
    /// signature of `proofs[i].signer` over the batch id. Both are checked against the current
    /// validators root.
    pub fn post_batch(
        &mut self,
        ctx: &CallContext,
        batch: &Batch,
        signatures: &[Bytes],
        proofs: &[ValidatorProof],
    ) -> Result<(), CoreError> {
        ctx.require_no_value()?;
        self.access.require_not_paused()?;

        debug!("check signatures and proofs have the same length");
        if signatures.len() != proofs.len() {
            return Err(ProverError::MismatchedSignaturesAndProofs {
                signatures: signatures.len(),
                proofs: proofs.len(),
            }
            .into());
        }

        let is_newer = batch.batchHeight > self.last_batch_height;
        if !is_newer {
            debug!("check backfilled batch is not a duplicate");
            if self.batches.contains_key(&batch.batchHeight) {
                return Err(
                    ProverError::BatchAlreadyExists { batch_height: batch.batchHeight }.into()
                );
            }

            debug!("check backfilled batch is within the trailing window");
            if self.last_batch_height > batch.batchHeight.saturating_add(self.max_batch_age) {
                return Err(ProverError::BatchHeightTooOld {
                    batch_height: batch.batchHeight,
                    last_batch_height: self.last_batch_height,
                    max_batch_age: self.max_batch_age,
                }
                .into());
            }
        }

        let batch_id = derive_batch_id(batch);
        info!(
            "BATCH {}: POST(id={}, sender={}, backfill={})",
            batch.batchHeight, batch_id, ctx.caller, !is_newer
        );

        let voting_power = self.verify_signatures(batch_id, signatures, proofs)?;
        if voting_power < CONSENSUS_PERCENTAGE {
            return Err(ProverError::ConsensusNotReached {
                voting_power,
                threshold: CONSENSUS_PERCENTAGE,
            }
            .into());
        }
        info!("├── Voting Power = {voting_power}/{CONSENSUS_DENOMINATOR}");

        self.batches.insert(
            batch.batchHeight,
            BatchData { results_root: batch.resultsRoot, sender: ctx.caller },
        );
        if is_newer {
            info!(
                "├── Validators Root: {} -> {}",
                self.last_validators_root, batch.validatorsRoot
            );
            self.last_batch_height = batch.batchHeight;
            self.last_validators_root = batch.validatorsRoot;
        }

        self.events.emit(CoreEvent::BatchPosted(BatchPosted {
            batchHeight: U256::from(batch.batchHeight),
            batchHash: batch_id,
            sender: ctx.caller,
        }));
        Ok(())
    }

    /// Checks every validator proof and signature and returns the accumulated voting power.
    fn verify_signatures(
        &self,
        batch_id: B256,
        signatures: &[Bytes],
        proofs: &[ValidatorProof],
    ) -> Result<u64, ProverError> {
        let mut voting_power = 0u64;
        for (i, (signature, proof)) in signatures.iter().zip(proofs).enumerate() {
            // A strictly increasing order means no validator is counted twice.
            if i > 0 && proof.signer <= proofs[i - 1].signer {
                return Err(ProverError::InvalidValidatorOrder {
                    previous: proofs[i - 1].signer,
                    signer: proof.signer,
                });
            }

            let leaf = validator_leaf(proof.signer, proof.votingPower);
            if !merkle::verify::<Keccak256>(&proof.merkleProof, self.last_validators_root, leaf) {
                return Err(ProverError::InvalidValidatorProof { signer: proof.signer });
            }

            if !verify_signer(&batch_id, signature, proof.signer) {
                return Err(ProverError::InvalidSignature { signer: proof.signer });
            }

            debug!("signer {} adds {} voting power", proof.signer, proof.votingPower);
            voting_power += u64::from(proof.votingPower);
        }
        Ok(voting_power)
    }

    /// Pauses batch posting. Only the owner may call this.
    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), CoreError> {
        self.access.pause(ctx)?;
        self.events.emit(CoreEvent::Paused(Paused { account: ctx.caller }));
        Ok(())
    }

    /// Resumes batch posting. Only the owner may call this.
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), CoreError> {
        self.access.unpause(ctx)?;
        self.events.emit(CoreEvent::Unpaused(Unpaused { account: ctx.caller }));
        Ok(())
    }

    /// Returns the height of the most recent batch.
    #[must_use]
    pub fn get_last_batch_height(&self) -> u64 {
        self.last_batch_height
    }

    /// Returns the validators root that must sign the next batch.
    #[must_use]
    pub fn get_last_validators_root(&self) -> B256 {
        self.last_validators_root
    }

    /// Returns the size of the backfill window.
    #[must_use]
    pub fn get_max_batch_age(&self) -> u64 {
        self.max_batch_age
    }

    /// Returns the batch stored at `batch_height`.
    #[must_use]
    pub fn get_batch(&self, batch_height: u64) -> Option<&BatchData> {
        self.batches.get(&batch_height)
    }

    /// Returns the access control of the prover.
    #[must_use]
    pub fn access(&self) -> &AccessControl {
        &self.access
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

impl ResultProver for Secp256k1Prover {
    fn verify_result_proof(
        &self,
        result_id: B256,
        batch_height: u64,
        proof: &[B256],
    ) -> (bool, Address) {
        let batch = self.batches.get(&batch_height).copied().unwrap_or_default();
        if merkle::verify::<Keccak256>(proof, batch.results_root, result_leaf(result_id)) {
            (true, batch.sender)
        } else {
            (false, Address::ZERO)
        }
    }
}
