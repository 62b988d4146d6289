//! # Batch Verification Lanes
//!
//! Runs the `k1` ECDSA verification pipeline over batches of signatures,
//! one lane per request.
//!
//! ## Modules
//!
//! - **batch**: wire-layout batch buffers, the `LaneExecutor` seam and the
//!   `BatchVerifier` dispatcher
//! - **cpu**: rayon thread-pool and inline executors
//! - **gpu**: WGPU compute executor (feature `gpu`)
//! - **relay**: fail-closed validation hook for Nostr relays
//!
//! ## Examples
//!
//! ```rust
//! use lanes::{BatchVerifier, LaneConfig};
//!
//! let verifier = BatchVerifier::new(&LaneConfig::default()).unwrap();
//! let verdicts = verifier.verify_batch(1, &[0u8; 32], &[0u8; 64], &[0u8; 32]).unwrap();
//! assert_eq!(verdicts, vec![0]);
//! ```

pub mod batch;
pub mod config;
pub mod cpu;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod relay;

pub use batch::{BatchBuffers, BatchInput, BatchVerifier, LaneExecutor};
pub use config::{Backend, LaneConfig};
pub use cpu::{CpuLanes, InlineLane};
pub use error::{BatchError, ValidationError};
pub use relay::{validate_event, EventValidator, NostrEvent, SignedEvent};

/// Print text in a box sized to fit
pub fn print_box(text: &str) {
    let width = text.chars().count() + 4;
    println!("\n╔{}╗", "═".repeat(width));
    println!("║  {}  ║", text);
    println!("╚{}╝\n", "═".repeat(width));
}
