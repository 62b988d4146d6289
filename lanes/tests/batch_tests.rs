//! Dispatcher behaviour across executors and batch shapes

mod common;

use common::{invalid_request, valid_request};
use k1::{CurveConstants, VerificationRequest};
use lanes::{
    Backend, BatchBuffers, BatchError, BatchInput, BatchVerifier, CpuLanes, InlineLane,
    LaneConfig, LaneExecutor,
};

fn pooled(lanes: usize) -> BatchVerifier {
    // threshold 0 keeps every non-empty batch on the pool
    BatchVerifier::with_executor(Box::new(CpuLanes::new(Some(lanes)).unwrap()), 0)
}

fn mixed_batch(count: usize) -> (Vec<VerificationRequest>, Vec<u32>) {
    let mut rng = rand::rng();
    let mut requests = Vec::with_capacity(count);
    let mut expected = Vec::with_capacity(count);
    for i in 0..count {
        if i % 3 == 1 {
            requests.push(invalid_request(&mut rng));
            expected.push(0);
        } else {
            requests.push(valid_request(&mut rng));
            expected.push(1);
        }
    }
    (requests, expected)
}

#[test]
fn test_empty_batch() {
    let verifier = pooled(2);
    assert_eq!(verifier.verify_batch(0, &[], &[], &[]).unwrap(), Vec::<u32>::new());
    assert!(verifier.verify_requests(&[]).unwrap().is_empty());
}

#[test]
fn test_verdicts_follow_input_order() {
    let (requests, expected) = mixed_batch(40);
    for lanes in [1, 2, 8] {
        let verdicts = pooled(lanes).verify_requests(&requests).unwrap();
        assert_eq!(verdicts, expected, "{} lanes", lanes);
    }
}

#[test]
fn test_inline_and_pooled_agree() {
    let (requests, expected) = mixed_batch(12);
    let inline = BatchVerifier::with_executor(Box::new(InlineLane), usize::MAX);
    assert_eq!(inline.verify_requests(&requests).unwrap(), expected);
    assert_eq!(pooled(4).verify_requests(&requests).unwrap(), expected);
}

#[test]
fn test_small_batch_stays_inline() {
    let verifier = BatchVerifier::new(&LaneConfig::default().with_lanes(2)).unwrap();
    assert_eq!(verifier.executor_name(), "cpu");
    assert_eq!(verifier.lanes(), 2);

    let (requests, expected) = mixed_batch(5);
    assert_eq!(verifier.verify_requests(&requests).unwrap(), expected);
}

#[test]
fn test_raw_buffers() {
    let (requests, expected) = mixed_batch(9);
    let buffers = BatchBuffers::from_requests(&requests).unwrap();
    let verdicts = pooled(3)
        .verify_batch(
            requests.len(),
            &buffers.hashes,
            &buffers.signatures,
            &buffers.pubkeys,
        )
        .unwrap();
    assert_eq!(verdicts, expected);
}

#[test]
fn test_every_verdict_is_zero_or_one() {
    let junk: Vec<u8> = (0..=255u8).cycle().take(64 * 50).collect();
    let verdicts = pooled(4)
        .verify_batch(50, &junk[..32 * 50], &junk, &junk[64 * 25..])
        .unwrap();
    assert_eq!(verdicts.len(), 50);
    assert!(verdicts.iter().all(|&v| v <= 1));
}

#[test]
fn test_shape_mismatch_is_a_batch_error() {
    let verifier = pooled(2);
    let err = verifier
        .verify_batch(2, &[0; 64], &[0; 127], &[0; 64])
        .unwrap_err();
    assert!(matches!(err, BatchError::InputShape(_)));
    assert_eq!(err.code(), -3);
}

#[test]
fn test_gpu_request_falls_back_to_cpu() {
    let config = LaneConfig::default().with_backend(Backend::Gpu).with_lanes(2);
    let verifier = BatchVerifier::new(&config).expect("fallback should always yield a verifier");
    if !cfg!(feature = "gpu") {
        assert_eq!(verifier.executor_name(), "cpu");
        assert_eq!(verifier.lanes(), 2);
    }

    // small enough to stay on the calling thread whichever executor was built
    let (requests, expected) = mixed_batch(6);
    assert_eq!(verifier.verify_requests(&requests).unwrap(), expected);
}

#[test]
fn test_oversized_buffers_report_allocation() {
    let count = usize::MAX / 16;
    let err = BatchBuffers::with_capacity(count).unwrap_err();
    match &err {
        BatchError::Allocation { what, bytes } => {
            assert_eq!(*what, "hash buffer");
            assert_eq!(*bytes, count as u128 * 32);
        }
        other => panic!("expected an allocation failure, got {:?}", other),
    }
    assert_eq!(err.code(), -1);
}

/// Executor whose device memory is always exhausted
struct ExhaustedLanes;

impl LaneExecutor for ExhaustedLanes {
    fn name(&self) -> &'static str {
        "exhausted"
    }

    fn lanes(&self) -> usize {
        1
    }

    fn execute(
        &self,
        _curve: &CurveConstants,
        input: &BatchInput<'_>,
        _verdicts: &mut [u32],
    ) -> Result<(), BatchError> {
        Err(BatchError::Allocation {
            what: "device buffers",
            bytes: input.len() as u128 * 128,
        })
    }
}

#[test]
fn test_executor_allocation_failure_fails_the_batch() {
    let verifier = BatchVerifier::with_executor(Box::new(ExhaustedLanes), 0);
    let (requests, _) = mixed_batch(3);
    let err = verifier.verify_requests(&requests).unwrap_err();
    assert!(matches!(err, BatchError::Allocation { bytes: 384, .. }));
    assert_eq!(err.code(), -1);

    // the empty batch never reaches the executor
    assert!(verifier.verify_batch(0, &[], &[], &[]).unwrap().is_empty());
}

#[test]
fn test_large_batch() {
    let (requests, expected) = mixed_batch(600);
    let verifier = BatchVerifier::new(&LaneConfig::default()).unwrap();
    assert_eq!(verifier.verify_requests(&requests).unwrap(), expected);
}
