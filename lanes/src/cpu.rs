//! CPU lane executors
//!
//! `CpuLanes` spreads a batch over a dedicated rayon pool. Each request maps
//! to exactly one pipeline call and one verdict slot; the slots are disjoint
//! `&mut u32`s handed out by `par_iter_mut`, so no locking is involved.
//! `InlineLane` runs the same loop on the calling thread for small batches.

use crate::batch::{request_from_chunks, BatchInput, LaneExecutor};
use crate::error::BatchError;
use k1::{verify_request, CurveConstants, HASH_SIZE, PUBKEY_SIZE, SIGNATURE_SIZE};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Thread-pool executor
pub struct CpuLanes {
    pool: ThreadPool,
}

impl CpuLanes {
    /// Creates a pool with `lanes` threads (one per core when `None`)
    ///
    /// # Errors
    /// `BatchError::Launch` if the pool cannot be built.
    pub fn new(lanes: Option<usize>) -> Result<Self, BatchError> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("k1-lane-{}", i));
        if let Some(lanes) = lanes {
            builder = builder.num_threads(lanes);
        }
        let pool = builder
            .build()
            .map_err(|e| BatchError::Launch(e.to_string()))?;
        Ok(Self { pool })
    }
}

impl LaneExecutor for CpuLanes {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn lanes(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn execute(
        &self,
        curve: &CurveConstants,
        input: &BatchInput<'_>,
        verdicts: &mut [u32],
    ) -> Result<(), BatchError> {
        self.pool.install(|| {
            input
                .hashes()
                .par_chunks_exact(HASH_SIZE)
                .zip(input.signatures().par_chunks_exact(SIGNATURE_SIZE))
                .zip(input.pubkeys().par_chunks_exact(PUBKEY_SIZE))
                .zip(verdicts.par_iter_mut())
                .for_each(|(((hash, sig), pubkey), slot)| {
                    let request = request_from_chunks(hash, sig, pubkey);
                    *slot = verify_request(curve, &request) as u32;
                });
        });
        Ok(())
    }
}

/// Sequential executor on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineLane;

impl LaneExecutor for InlineLane {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn lanes(&self) -> usize {
        1
    }

    fn execute(
        &self,
        curve: &CurveConstants,
        input: &BatchInput<'_>,
        verdicts: &mut [u32],
    ) -> Result<(), BatchError> {
        for (i, slot) in verdicts.iter_mut().enumerate() {
            *slot = verify_request(curve, &input.request(i)) as u32;
        }
        Ok(())
    }
}
