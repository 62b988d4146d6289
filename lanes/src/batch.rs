//! Batch dispatcher
//!
//! A batch arrives as three parallel big-endian byte buffers:
//! `32N` bytes of message hashes, `64N` bytes of r || s signatures and
//! `32N` bytes of x-only public keys. The dispatcher checks their shape,
//! allocates the verdict array, hands the work to a `LaneExecutor` and
//! returns one `1`/`0` verdict per request in input order, or a single
//! `BatchError` for the whole batch.

use crate::config::{Backend, LaneConfig};
use crate::cpu::{CpuLanes, InlineLane};
use crate::error::BatchError;
use k1::{CurveConstants, VerificationRequest, HASH_SIZE, PUBKEY_SIZE, SIGNATURE_SIZE};

/// Borrowed view of one batch in wire layout
#[derive(Clone, Copy, Debug)]
pub struct BatchInput<'a> {
    count: usize,
    hashes: &'a [u8],
    signatures: &'a [u8],
    pubkeys: &'a [u8],
}

impl<'a> BatchInput<'a> {
    /// Checks that each buffer holds exactly `count` records
    pub fn new(
        count: usize,
        hashes: &'a [u8],
        signatures: &'a [u8],
        pubkeys: &'a [u8],
    ) -> Result<Self, BatchError> {
        check_len("hashes", hashes.len(), count, HASH_SIZE)?;
        check_len("signatures", signatures.len(), count, SIGNATURE_SIZE)?;
        check_len("pubkeys", pubkeys.len(), count, PUBKEY_SIZE)?;

        Ok(Self {
            count,
            hashes,
            signatures,
            pubkeys,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn hashes(&self) -> &'a [u8] {
        self.hashes
    }

    pub fn signatures(&self) -> &'a [u8] {
        self.signatures
    }

    pub fn pubkeys(&self) -> &'a [u8] {
        self.pubkeys
    }

    /// Copies out request `i`
    ///
    /// # Panics
    /// Panics if `i >= len()`.
    pub fn request(&self, i: usize) -> VerificationRequest {
        request_from_chunks(
            &self.hashes[i * HASH_SIZE..(i + 1) * HASH_SIZE],
            &self.signatures[i * SIGNATURE_SIZE..(i + 1) * SIGNATURE_SIZE],
            &self.pubkeys[i * PUBKEY_SIZE..(i + 1) * PUBKEY_SIZE],
        )
    }
}

fn check_len(name: &str, actual: usize, count: usize, stride: usize) -> Result<(), BatchError> {
    let expected = count
        .checked_mul(stride)
        .ok_or_else(|| BatchError::InputShape(format!("{} records overflow usize", count)))?;
    if actual != expected {
        return Err(BatchError::InputShape(format!(
            "{} buffer is {} bytes, expected {} ({} x {})",
            name, actual, expected, count, stride
        )));
    }
    Ok(())
}

/// Builds a request from chunks whose sizes the caller has already fixed
pub(crate) fn request_from_chunks(hash: &[u8], sig: &[u8], pubkey: &[u8]) -> VerificationRequest {
    let mut message_hash = [0u8; HASH_SIZE];
    let mut signature = [0u8; SIGNATURE_SIZE];
    let mut pubkey_x = [0u8; PUBKEY_SIZE];
    message_hash.copy_from_slice(hash);
    signature.copy_from_slice(sig);
    pubkey_x.copy_from_slice(pubkey);
    VerificationRequest::new(message_hash, signature, pubkey_x)
}

/// Owned batch buffers in wire layout
///
/// Used by callers that assemble a batch item by item (the relay hook, the
/// CLI, tests). Capacity is reserved fallibly so a huge batch surfaces as
/// `BatchError::Allocation` instead of aborting the process.
#[derive(Clone, Debug, Default)]
pub struct BatchBuffers {
    pub hashes: Vec<u8>,
    pub signatures: Vec<u8>,
    pub pubkeys: Vec<u8>,
}

impl BatchBuffers {
    pub fn with_capacity(count: usize) -> Result<Self, BatchError> {
        Ok(Self {
            hashes: reserve_bytes("hash buffer", count, HASH_SIZE)?,
            signatures: reserve_bytes("signature buffer", count, SIGNATURE_SIZE)?,
            pubkeys: reserve_bytes("pubkey buffer", count, PUBKEY_SIZE)?,
        })
    }

    pub fn from_requests(requests: &[VerificationRequest]) -> Result<Self, BatchError> {
        let mut buffers = Self::with_capacity(requests.len())?;
        for request in requests {
            buffers.push(request);
        }
        Ok(buffers)
    }

    pub fn push(&mut self, request: &VerificationRequest) {
        self.hashes.extend_from_slice(&request.message_hash);
        self.signatures.extend_from_slice(&request.signature);
        self.pubkeys.extend_from_slice(&request.pubkey_x);
    }

    pub fn len(&self) -> usize {
        self.hashes.len() / HASH_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn as_input(&self) -> Result<BatchInput<'_>, BatchError> {
        BatchInput::new(self.len(), &self.hashes, &self.signatures, &self.pubkeys)
    }
}

fn reserve_bytes(what: &'static str, count: usize, stride: usize) -> Result<Vec<u8>, BatchError> {
    let requested = count as u128 * stride as u128;
    let bytes = usize::try_from(requested).map_err(|_| BatchError::Allocation {
        what,
        bytes: requested,
    })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| BatchError::Allocation {
            what,
            bytes: requested,
        })?;
    Ok(buf)
}

/// Runs the verification pipeline over every request of a batch
///
/// Implementations write `verdicts[i]` for request `i` and nothing else;
/// `verdicts.len() == input.len()` is guaranteed by the caller. An `Err`
/// means the batch failed as a whole and `verdicts` must be ignored.
pub trait LaneExecutor: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Number of lanes working concurrently
    fn lanes(&self) -> usize;

    fn execute(
        &self,
        curve: &CurveConstants,
        input: &BatchInput<'_>,
        verdicts: &mut [u32],
    ) -> Result<(), BatchError>;
}

#[cfg(feature = "gpu")]
fn gpu_or_cpu(config: &LaneConfig) -> Result<Box<dyn LaneExecutor>, BatchError> {
    match crate::gpu::GpuLanes::new(config) {
        Ok(gpu) => Ok(Box::new(gpu)),
        Err(err) => {
            log::warn!("GPU lanes unavailable ({}), falling back to CPU lanes", err);
            Ok(Box::new(CpuLanes::new(config.lanes)?))
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn gpu_or_cpu(config: &LaneConfig) -> Result<Box<dyn LaneExecutor>, BatchError> {
    log::warn!("Built without the `gpu` feature, falling back to CPU lanes");
    Ok(Box::new(CpuLanes::new(config.lanes)?))
}

/// Entry point for batch verification
pub struct BatchVerifier {
    executor: Box<dyn LaneExecutor>,
    inline: InlineLane,
    inline_threshold: usize,
    curve: &'static CurveConstants,
}

impl BatchVerifier {
    /// Builds the executor selected by `config`
    ///
    /// A GPU request falls back to CPU lanes when no adapter can be opened
    /// or the build lacks the `gpu` feature. The fallback happens here, once;
    /// a batch that later fails on the chosen executor is not rerouted.
    ///
    /// # Errors
    /// `BatchError::Launch` if the thread pool cannot be set up.
    pub fn new(config: &LaneConfig) -> Result<Self, BatchError> {
        let executor: Box<dyn LaneExecutor> = match config.backend {
            Backend::Cpu => Box::new(CpuLanes::new(config.lanes)?),
            Backend::Gpu => gpu_or_cpu(config)?,
        };
        log::info!(
            "Verification backend: {} ({} lanes)",
            executor.name(),
            executor.lanes()
        );
        Ok(Self::with_executor(executor, config.inline_threshold))
    }

    /// Uses a caller-provided executor
    pub fn with_executor(executor: Box<dyn LaneExecutor>, inline_threshold: usize) -> Self {
        Self {
            executor,
            inline: InlineLane,
            inline_threshold,
            curve: CurveConstants::get(),
        }
    }

    pub fn executor_name(&self) -> &'static str {
        self.executor.name()
    }

    pub fn lanes(&self) -> usize {
        self.executor.lanes()
    }

    /// Verifies `count` requests laid out in three parallel buffers
    ///
    /// Returns `count` verdicts (`1` valid, `0` invalid) in input order.
    /// `count == 0` succeeds with an empty vector.
    pub fn verify_batch(
        &self,
        count: usize,
        hashes: &[u8],
        signatures: &[u8],
        pubkeys: &[u8],
    ) -> Result<Vec<u32>, BatchError> {
        let input = BatchInput::new(count, hashes, signatures, pubkeys)?;
        self.verify_input(&input)
    }

    /// Same as `verify_batch` for an already validated input
    pub fn verify_input(&self, input: &BatchInput<'_>) -> Result<Vec<u32>, BatchError> {
        let count = input.len();
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut verdicts: Vec<u32> = Vec::new();
        verdicts
            .try_reserve_exact(count)
            .map_err(|_| BatchError::Allocation {
                what: "verdict buffer",
                bytes: count as u128 * std::mem::size_of::<u32>() as u128,
            })?;
        verdicts.resize(count, 0);

        let executor: &dyn LaneExecutor = if count <= self.inline_threshold {
            &self.inline
        } else {
            self.executor.as_ref()
        };
        log::debug!(
            "Dispatching {} requests to {} executor ({} lanes)",
            count,
            executor.name(),
            executor.lanes()
        );

        executor.execute(self.curve, input, &mut verdicts)?;
        Ok(verdicts)
    }

    /// Convenience wrapper over `verify_batch` for typed requests
    pub fn verify_requests(&self, requests: &[VerificationRequest]) -> Result<Vec<u32>, BatchError> {
        let buffers = BatchBuffers::from_requests(requests)?;
        self.verify_input(&buffers.as_input()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_validation() {
        assert!(BatchInput::new(0, &[], &[], &[]).is_ok());
        assert!(BatchInput::new(1, &[0; 32], &[0; 64], &[0; 32]).is_ok());

        let err = BatchInput::new(1, &[0; 31], &[0; 64], &[0; 32]).unwrap_err();
        assert!(matches!(err, BatchError::InputShape(_)));
        let err = BatchInput::new(2, &[0; 64], &[0; 64], &[0; 64]).unwrap_err();
        assert!(err.to_string().contains("signatures"));
        let err = BatchInput::new(usize::MAX, &[], &[], &[]).unwrap_err();
        assert!(matches!(err, BatchError::InputShape(_)));
    }

    #[test]
    fn test_request_extraction() {
        let hashes: Vec<u8> = (0..64).collect();
        let sigs: Vec<u8> = (0..128).map(|i| i as u8).collect();
        let keys: Vec<u8> = (100..164).collect();
        let input = BatchInput::new(2, &hashes, &sigs, &keys).unwrap();

        let second = input.request(1);
        assert_eq!(second.message_hash[0], 32);
        assert_eq!(second.signature[0], 64);
        assert_eq!(second.pubkey_x[31], 163);
    }

    #[test]
    fn test_buffers_round_trip() {
        let req = VerificationRequest::new([1; 32], [2; 64], [3; 32]);
        let buffers = BatchBuffers::from_requests(&[req, req, req]).unwrap();
        assert_eq!(buffers.len(), 3);
        let input = buffers.as_input().unwrap();
        assert_eq!(input.request(2), req);
    }
}
