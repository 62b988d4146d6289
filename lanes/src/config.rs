//! Lane configuration
//!
//! A plain typed value; the binary fills it from command-line flags and
//! library users construct it directly.

use std::fmt;

/// Where verification lanes run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// rayon thread pool
    #[default]
    Cpu,
    /// wgpu compute shader; falls back to `Cpu` when no adapter is usable
    /// or the `gpu` feature is off
    Gpu,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "cpu"),
            Backend::Gpu => write!(f, "gpu"),
        }
    }
}

/// Batches at or below this size are verified on the calling thread
pub const DEFAULT_INLINE_THRESHOLD: usize = 10;

/// Upper bound on requests per GPU dispatch
pub const DEFAULT_MAX_DISPATCH: usize = 65_536;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaneConfig {
    pub backend: Backend,
    /// Worker threads for the CPU backend; `None` uses one per core
    pub lanes: Option<usize>,
    pub inline_threshold: usize,
    /// Requests per GPU dispatch, further capped by device limits
    pub max_dispatch: usize,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Cpu,
            lanes: None,
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            max_dispatch: DEFAULT_MAX_DISPATCH,
        }
    }
}

impl LaneConfig {
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_lanes(mut self, lanes: usize) -> Self {
        self.lanes = Some(lanes);
        self
    }

    pub fn with_inline_threshold(mut self, threshold: usize) -> Self {
        self.inline_threshold = threshold;
        self
    }

    pub fn with_max_dispatch(mut self, max_dispatch: usize) -> Self {
        self.max_dispatch = max_dispatch.max(1);
        self
    }
}
