mod common;

use alloy_primitives::{keccak256, Address, B256, U256};
use seda_core::{
    config::CoreConfig,
    errors::{CoreError, RequestError},
    events::CoreEvent,
    fee_manager::PayoutLedger,
    hashing::{derive_request_id, derive_result_id},
    sol::{Batch, DataResult, FeeDistributed, FeeType, ResultPosted},
    state::SedaCore,
    transactions::{
        Call, CallContext, CoreTransaction, PostRequestTransaction, PostResultTransaction,
    },
};

use crate::common::*;

/// Posts a request with `fees`, then a batch at height 1 including its result, and returns the
/// result with its proof.
fn request_and_batch(
    test: &mut CoreTestContext,
    memo: &str,
    fees: [u64; 3],
    gas_used: u64,
    payback: &[u8],
) -> (DataResult, Vec<B256>) {
    let id = test.post_request(memo, fees, 10).unwrap();
    let result = data_result(id, 20, gas_used, payback);
    let results = ResultsTree::new(&[result.clone(), data_result(keccak256("other"), 20, 0, &[])]);
    let signers = test.validators.indices(&["validator-a"]);
    test.post_batch(1, &results, &signers).unwrap();
    (result, results.proof(0))
}

#[test]
fn test_post_result_pays_every_party() {
    let mut test = setup();
    let executor = test.executor;
    let (result, proof) =
        request_and_batch(&mut test, "all", [1_000, 200, 30], 100_000, executor.as_slice());

    let receipt = test.post_result(&result, 1, proof, 30).unwrap();
    let result_id = derive_result_id(&result);

    assert_eq!(receipt.id(), Some(result_id));
    assert_eq!(test.core.get_pending_fees(&test.executor), U256::from(250));
    assert_eq!(test.core.get_pending_fees(&test.submitter), U256::from(200));
    assert_eq!(test.core.get_pending_fees(&test.relayer), U256::from(30));
    assert_eq!(test.core.get_pending_fees(&test.requestor), U256::from(750));
    assert_eq!(test.core.balance(), U256::ZERO);

    let distributed: Vec<_> = receipt
        .events
        .iter()
        .filter_map(|event| match event {
            CoreEvent::FeeDistributed(event) => Some((event.recipient, event.feeType)),
            _ => None,
        })
        .collect();
    assert_eq!(
        distributed,
        vec![
            (test.executor, FeeType::REQUEST),
            (test.submitter, FeeType::RESULT),
            (test.relayer, FeeType::BATCH),
            (test.requestor, FeeType::REFUND),
        ]
    );
    assert_eq!(count_events(&receipt, |event| matches!(event, CoreEvent::FeeAdded(_))), 4);
    assert_eq!(
        receipt.events.last(),
        Some(&CoreEvent::ResultPosted(ResultPosted { resultId: result_id }))
    );

    // The request is resolved.
    assert!(test.core.get_result(result.drId).is_ok());
    assert!(test.core.get_request_details(result.drId).is_err());
    assert!(test.core.get_pending_requests(0, 10).unwrap().is_empty());
}

#[test]
fn test_post_result_gas_boundaries() {
    for (gas_used, executor_share) in [(0, 0), (100_000, 250), (400_000, 1_000), (900_000, 1_000)] {
        let mut test = setup();
        let executor = test.executor;
        let (result, proof) =
            request_and_batch(&mut test, "gas", [1_000, 0, 0], gas_used, executor.as_slice());
        test.post_result(&result, 1, proof, 30).unwrap();

        assert_eq!(test.core.get_pending_fees(&test.executor), U256::from(executor_share));
        assert_eq!(test.core.get_pending_fees(&test.requestor), U256::from(1_000 - executor_share));
    }
}

#[test]
fn test_post_result_invalid_payback_refunds_requestor() {
    let mut test = setup();
    let (result, proof) =
        request_and_batch(&mut test, "payback", [1_000, 0, 0], 400_000, &[0xab; 32]);

    let receipt = test.post_result(&result, 1, proof, 30).unwrap();

    assert_eq!(test.core.get_pending_fees(&test.requestor), U256::from(1_000));
    assert_eq!(
        count_events(&receipt, |event| matches!(
            event,
            CoreEvent::FeeDistributed(FeeDistributed { feeType: FeeType::REQUEST, .. })
        )),
        0
    );
}

#[test]
fn test_post_result_against_initial_batch_refunds_batch_fee() {
    let inputs = request_inputs("initial");
    let id = derive_request_id(&inputs);
    let result = data_result(id, 20, 0, &[]);
    let results = ResultsTree::new(&[result.clone()]);

    let requestor = account("requestor");
    let submitter = account("submitter");
    let config = CoreConfig { owner: account("owner"), ..Default::default() };
    let initial = Batch { resultsRoot: results.root(), ..Default::default() };
    let mut core = SedaCore::new(&config, &initial).unwrap();
    let mut sink = PayoutLedger::default();

    let ctx = CallContext::new(requestor, 10).with_value(U256::from(60));
    let tx = CoreTransaction::PostRequest(PostRequestTransaction {
        inputs,
        request_fee: U256::from(10),
        result_fee: U256::from(20),
        batch_fee: U256::from(30),
    });
    core.execute(&Call { ctx, tx }, &mut sink).unwrap();

    let ctx = CallContext::new(submitter, 30);
    let tx = CoreTransaction::PostResult(PostResultTransaction {
        result,
        batch_height: 0,
        proof: results.proof(0),
    });
    let receipt = core.execute(&Call { ctx, tx }, &mut sink).unwrap();

    // Request fee (no payback) and batch fee (no batch sender) come back as one refund.
    assert_eq!(core.get_pending_fees(&requestor), U256::from(40));
    assert_eq!(core.get_pending_fees(&submitter), U256::from(20));
    assert_eq!(core.get_pending_fees(&Address::ZERO), U256::ZERO);
    assert_eq!(
        count_events(&receipt, |event| matches!(
            event,
            CoreEvent::FeeDistributed(FeeDistributed { feeType: FeeType::REFUND, .. })
        )),
        1
    );
}

#[test]
fn test_post_result_already_exists() {
    let mut test = setup();
    let (result, proof) = request_and_batch(&mut test, "twice", [0, 0, 0], 0, &[]);
    test.post_result(&result, 1, proof.clone(), 30).unwrap();

    assert_eq!(
        test.post_result(&result, 1, proof, 31).map(|_| ()),
        Err(RequestError::ResultAlreadyExists { id: result.drId }.into())
    );
}

#[test]
fn test_post_result_timestamp_must_follow_request() {
    let mut test = setup();
    let id = test.post_request("timestamp", [0, 0, 0], 10).unwrap();
    let result = data_result(id, 10, 0, &[]);
    let results = ResultsTree::new(&[result.clone()]);
    let signers = test.validators.indices(&["validator-a"]);
    test.post_batch(1, &results, &signers).unwrap();

    assert_eq!(
        test.post_result(&result, 1, results.proof(0), 30).map(|_| ()),
        Err(RequestError::InvalidResultTimestamp {
            id,
            result_timestamp: 10,
            request_timestamp: 10,
        }
        .into())
    );
    assert!(test.core.ledger().is_pending(&id));
}

#[test]
fn test_post_result_for_request_posted_at_timestamp_zero() {
    let mut test = setup();
    let id = test.post_request("genesis", [0, 0, 0], 0).unwrap();
    assert!(test.core.ledger().is_pending(&id));

    let early = data_result(id, 0, 0, &[]);
    let late = data_result(id, 1, 0, &[]);
    let results = ResultsTree::new(&[early.clone(), late.clone()]);
    let signers = test.validators.indices(&["validator-a"]);
    test.post_batch(1, &results, &signers).unwrap();

    assert_eq!(
        test.post_result(&early, 1, results.proof(0), 5).map(|_| ()),
        Err(RequestError::InvalidResultTimestamp {
            id,
            result_timestamp: 0,
            request_timestamp: 0,
        }
        .into())
    );
    assert!(test.post_result(&late, 1, results.proof(1), 5).is_ok());
    assert!(!test.core.ledger().is_pending(&id));
}

#[test]
fn test_post_result_invalid_proof() {
    let mut test = setup();
    let (result, proof) = request_and_batch(&mut test, "proof", [10, 0, 0], 0, &[]);
    let result_id = derive_result_id(&result);

    // Right proof, wrong height.
    assert_eq!(
        test.post_result(&result, 0, proof.clone(), 30).map(|_| ()),
        Err(RequestError::InvalidResultProof { id: result_id }.into())
    );
    // Right height, tampered result.
    let mut tampered = result.clone();
    tampered.gasUsed = U256::from(1);
    assert!(matches!(
        test.post_result(&tampered, 1, proof, 30),
        Err(CoreError::Request(RequestError::InvalidResultProof { .. }))
    ));

    assert!(test.core.ledger().is_pending(&result.drId));
    assert_eq!(test.core.balance(), U256::from(10));
}

#[test]
fn test_post_result_for_untracked_request() {
    let mut test = setup();
    let result = data_result(keccak256("elsewhere"), 0, 0, &[]);
    let results = ResultsTree::new(&[result.clone()]);
    let signers = test.validators.indices(&["validator-a"]);
    test.post_batch(1, &results, &signers).unwrap();

    let receipt = test.post_result(&result, 1, results.proof(0), 30).unwrap();

    assert_eq!(
        receipt.events,
        vec![CoreEvent::ResultPosted(ResultPosted { resultId: derive_result_id(&result) })]
    );
    assert!(test.core.get_result(result.drId).is_ok());
}

#[test]
fn test_post_result_rejects_value() {
    let mut test = setup();
    let (result, proof) = request_and_batch(&mut test, "payable", [0, 0, 0], 0, &[]);
    let ctx = CallContext::new(test.submitter, 30).with_value(U256::from(1));
    let tx = CoreTransaction::PostResult(PostResultTransaction { result, batch_height: 1, proof });
    assert!(matches!(test.execute(ctx, tx), Err(CoreError::Access(_))));
}
