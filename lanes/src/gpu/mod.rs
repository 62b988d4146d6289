//! GPU lanes on wgpu
//!
//! One compute invocation verifies one request. The kernel in
//! `shaders/ecdsa.wgsl` carries its own copy of the curve constants and
//! works on 8 x 32-bit limbs, forming 32x32-bit products from 16-bit halves.
//!
//! ```no_run
//! use lanes::gpu::{GpuContext, VerifyPipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = GpuContext::new().await?;
//! let pipeline = VerifyPipeline::new(&ctx)?;
//! println!("GPU: {}", ctx.adapter_info().name);
//! # Ok(())
//! # }
//! ```

mod context;
mod pipeline;

pub use context::GpuContext;
pub use pipeline::{VerifyPipeline, WORKGROUP_SIZE};

use crate::batch::{BatchInput, LaneExecutor};
use crate::config::LaneConfig;
use crate::error::BatchError;
use k1::CurveConstants;
use thiserror::Error;

/// Result type for GPU operations
pub type GpuResult<T> = Result<T, GpuError>;

/// Error types for GPU operations
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("Failed to find a suitable GPU adapter")]
    NoAdapter,

    #[error("Device creation failed: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),

    #[error("Out of device memory while allocating {what} ({bytes} bytes)")]
    OutOfMemory { what: &'static str, bytes: u64 },

    #[error("Host allocation of {what} ({bytes} bytes) failed")]
    HostAllocation { what: &'static str, bytes: usize },

    #[error("Buffer operation failed: {0}")]
    BufferError(String),

    #[error("WGPU error: {0}")]
    WgpuError(String),
}

impl From<wgpu::BufferAsyncError> for GpuError {
    fn from(err: wgpu::BufferAsyncError) -> Self {
        GpuError::BufferError(err.to_string())
    }
}

impl From<GpuError> for BatchError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::OutOfMemory { what, bytes } => BatchError::Allocation {
                what,
                bytes: bytes.into(),
            },
            GpuError::HostAllocation { what, bytes } => BatchError::Allocation {
                what,
                bytes: bytes as u128,
            },
            other => BatchError::Launch(other.to_string()),
        }
    }
}

/// Executor dispatching batches to the GPU
pub struct GpuLanes {
    ctx: GpuContext,
    pipeline: VerifyPipeline,
    max_dispatch: usize,
}

impl GpuLanes {
    /// Opens the default adapter and compiles the verification kernel
    ///
    /// # Errors
    /// `BatchError::Launch` when no adapter or device is available.
    pub fn new(config: &LaneConfig) -> Result<Self, BatchError> {
        let ctx = pollster::block_on(GpuContext::new())?;
        let pipeline = VerifyPipeline::new(&ctx)?;
        Ok(Self {
            ctx,
            pipeline,
            max_dispatch: config.max_dispatch,
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }
}

impl LaneExecutor for GpuLanes {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn lanes(&self) -> usize {
        self.pipeline.items_per_dispatch(&self.ctx, self.max_dispatch)
    }

    fn execute(
        &self,
        _curve: &CurveConstants,
        input: &BatchInput<'_>,
        verdicts: &mut [u32],
    ) -> Result<(), BatchError> {
        pollster::block_on(
            self.pipeline
                .run(&self.ctx, input, verdicts, self.max_dispatch),
        )?;
        Ok(())
    }
}
