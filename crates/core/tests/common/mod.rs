#![allow(dead_code)]

use alloy_primitives::{keccak256, Address, Bytes, Keccak256, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use seda_core::{
    config::CoreConfig,
    errors::CoreError,
    events::CoreEvent,
    fee_manager::PayoutLedger,
    hashing::{derive_batch_id, derive_result_id, result_leaf, validator_leaf},
    merkle::MerkleTree,
    prover::Secp256k1Prover,
    receipts::CallReceipt,
    sol::{Batch, DataResult, RequestInputs, ValidatorProof},
    state::SedaCore,
    transactions::{
        Call, CallContext, CoreTransaction, PostBatchTransaction, PostRequestTransaction,
        PostResultTransaction,
    },
};

/// Creates a signer from a string key.
///
/// The key is hashed using keccak256 to generate the private key.
#[must_use]
pub fn signer(key: &str) -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&keccak256(key)).unwrap()
}

/// Creates an address from a string key.
#[must_use]
pub fn account(key: &str) -> Address {
    signer(key).address()
}

/// A validator set with its merkle tree, sorted by signer address.
pub struct ValidatorSet {
    /// The validators, ascending by address.
    pub validators: Vec<(PrivateKeySigner, u32)>,
    /// The tree over the validator leaves.
    pub tree: MerkleTree<Keccak256>,
}

impl ValidatorSet {
    /// Builds a validator set from `(key, voting power)` pairs.
    #[must_use]
    pub fn new(entries: &[(&str, u32)]) -> Self {
        let mut validators: Vec<_> =
            entries.iter().map(|(key, power)| (signer(key), *power)).collect();
        validators.sort_by_key(|(signer, _)| signer.address());
        let tree = MerkleTree::new(
            validators
                .iter()
                .map(|(signer, power)| validator_leaf(signer.address(), *power))
                .collect(),
        );
        Self { validators, tree }
    }

    /// Returns the validators root.
    #[must_use]
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    /// Returns the index of the validator created from `key`.
    #[must_use]
    pub fn index(&self, key: &str) -> usize {
        let address = account(key);
        self.validators.iter().position(|(signer, _)| signer.address() == address).unwrap()
    }

    /// Returns the indices of the validators created from `keys`, in ascending signer order.
    #[must_use]
    pub fn indices(&self, keys: &[&str]) -> Vec<usize> {
        let mut indices: Vec<_> = keys.iter().map(|key| self.index(key)).collect();
        indices.sort_unstable();
        indices
    }

    /// Returns the address of the validator at `index`.
    #[must_use]
    pub fn address(&self, index: usize) -> Address {
        self.validators[index].0.address()
    }

    /// Returns the membership proof of the validator at `index`.
    #[must_use]
    pub fn proof(&self, index: usize) -> ValidatorProof {
        let (signer, power) = &self.validators[index];
        ValidatorProof {
            signer: signer.address(),
            votingPower: *power,
            merkleProof: self.tree.proof(index).unwrap(),
        }
    }

    /// Signs `batch` with the validators at `indices`, in that order.
    #[must_use]
    pub fn sign(&self, batch: &Batch, indices: &[usize]) -> (Vec<Bytes>, Vec<ValidatorProof>) {
        let digest = derive_batch_id(batch);
        indices
            .iter()
            .map(|&index| {
                let signature = self.validators[index].0.sign_hash_sync(&digest).unwrap();
                (Bytes::copy_from_slice(&signature.as_bytes()), self.proof(index))
            })
            .unzip()
    }
}

/// A results tree over a list of results.
pub struct ResultsTree {
    /// The result ids, in leaf order.
    pub ids: Vec<B256>,
    /// The tree over the result leaves.
    pub tree: MerkleTree<Keccak256>,
}

impl ResultsTree {
    /// Builds the results tree committed to by a batch.
    #[must_use]
    pub fn new(results: &[DataResult]) -> Self {
        let ids: Vec<_> = results.iter().map(derive_result_id).collect();
        let tree = MerkleTree::new(ids.iter().map(|id| result_leaf(*id)).collect());
        Self { ids, tree }
    }

    /// Returns the results root.
    #[must_use]
    pub fn root(&self) -> B256 {
        self.tree.root()
    }

    /// Returns the inclusion proof of the result at `index`.
    #[must_use]
    pub fn proof(&self, index: usize) -> Vec<B256> {
        self.tree.proof(index).unwrap()
    }
}

/// Creates request inputs that differ by `memo`.
#[must_use]
pub fn request_inputs(memo: &str) -> RequestInputs {
    RequestInputs {
        execProgramId: keccak256("exec"),
        execInputs: Bytes::from_static(b"inputs"),
        execGasLimit: 300_000,
        tallyProgramId: keccak256("tally"),
        tallyInputs: Bytes::from_static(b"tally"),
        tallyGasLimit: 100_000,
        replicationFactor: 1,
        consensusFilter: Bytes::from_static(&[0x00]),
        gasPrice: 1,
        memo: Bytes::copy_from_slice(memo.as_bytes()),
    }
}

/// Creates a result for request `dr_id`.
#[must_use]
pub fn data_result(dr_id: B256, block_timestamp: u64, gas_used: u64, payback: &[u8]) -> DataResult {
    DataResult {
        version: "0.0.1".to_string(),
        drId: dr_id,
        consensus: true,
        exitCode: 0,
        result: Bytes::from_static(b"42"),
        blockHeight: 1,
        blockTimestamp: block_timestamp,
        gasUsed: U256::from(gas_used),
        paybackAddress: Bytes::copy_from_slice(payback),
        sedaPayload: Bytes::new(),
    }
}

/// Test environment containing the core, the validator set and the payout sink.
pub struct CoreTestContext {
    /// The core under test.
    pub core: SedaCore<Secp256k1Prover>,
    /// The validators of the initial batch.
    pub validators: ValidatorSet,
    /// Records fee withdrawals.
    pub sink: PayoutLedger,
    /// The owner of the core.
    pub owner: Address,
    /// The account that posts requests.
    pub requestor: Address,
    /// The account that posts results.
    pub submitter: Address,
    /// The account that posts batches.
    pub relayer: Address,
    /// The executor credited through the payback address.
    pub executor: Address,
}

/// Sets up a core anchored at batch 0 with a single validator holding 75% of the voting power
/// and another holding 25%.
#[must_use]
pub fn setup() -> CoreTestContext {
    setup_with(&[("validator-a", 75_000_000), ("validator-b", 25_000_000)], 100)
}

/// Sets up a core anchored at batch 0 with the given validators and max batch age.
#[must_use]
pub fn setup_with(validators: &[(&str, u32)], max_batch_age: u64) -> CoreTestContext {
    let validators = ValidatorSet::new(validators);
    let owner = account("owner");
    let config = CoreConfig {
        owner,
        max_batch_age,
        ..Default::default()
    };
    let initial = Batch { validatorsRoot: validators.root(), ..Default::default() };
    CoreTestContext {
        core: SedaCore::new(&config, &initial).unwrap(),
        validators,
        sink: PayoutLedger::default(),
        owner,
        requestor: account("requestor"),
        submitter: account("submitter"),
        relayer: account("relayer"),
        executor: account("executor"),
    }
}

impl CoreTestContext {
    /// Executes a call.
    pub fn execute(
        &mut self,
        ctx: CallContext,
        tx: CoreTransaction,
    ) -> Result<CallReceipt, CoreError> {
        self.core.execute(&Call { ctx, tx }, &mut self.sink)
    }

    /// Posts a request with fees from the requestor at `timestamp`.
    pub fn post_request(
        &mut self,
        memo: &str,
        fees: [u64; 3],
        timestamp: u64,
    ) -> Result<B256, CoreError> {
        let [request_fee, result_fee, batch_fee] = fees.map(U256::from);
        let value = request_fee + result_fee + batch_fee;
        let ctx = CallContext::new(self.requestor, timestamp).with_value(value);
        let tx = CoreTransaction::PostRequest(PostRequestTransaction {
            inputs: request_inputs(memo),
            request_fee,
            result_fee,
            batch_fee,
        });
        self.execute(ctx, tx).map(|receipt| receipt.id().unwrap())
    }

    /// Posts a batch at `batch_height` committing to `results`, signed by the validators at
    /// `signers`. The validator set does not rotate.
    pub fn post_batch(
        &mut self,
        batch_height: u64,
        results: &ResultsTree,
        signers: &[usize],
    ) -> Result<CallReceipt, CoreError> {
        let batch = Batch {
            batchHeight: batch_height,
            blockHeight: batch_height * 10,
            validatorsRoot: self.validators.root(),
            resultsRoot: results.root(),
            provingMetadata: B256::ZERO,
        };
        let (signatures, proofs) = self.validators.sign(&batch, signers);
        let ctx = CallContext::new(self.relayer, batch_height);
        self.execute(
            ctx,
            CoreTransaction::PostBatch(PostBatchTransaction { batch, signatures, proofs }),
        )
    }

    /// Posts `result` from the submitter, proven against the batch at `batch_height`.
    pub fn post_result(
        &mut self,
        result: &DataResult,
        batch_height: u64,
        proof: Vec<B256>,
        timestamp: u64,
    ) -> Result<CallReceipt, CoreError> {
        let ctx = CallContext::new(self.submitter, timestamp);
        self.execute(
            ctx,
            CoreTransaction::PostResult(PostResultTransaction {
                result: result.clone(),
                batch_height,
                proof,
            }),
        )
    }

    /// Returns the sum of the pending fees of `accounts`.
    #[must_use]
    pub fn pending_fees(&self, accounts: &[Address]) -> U256 {
        accounts.iter().fold(U256::ZERO, |acc, account| acc + self.core.get_pending_fees(account))
    }
}

/// Returns how many events of the receipt match `predicate`.
pub fn count_events(receipt: &CallReceipt, predicate: impl Fn(&CoreEvent) -> bool) -> usize {
    receipt.events.iter().filter(|event| predicate(event)).count()
}
