// 2025 Thomas Bicanic – MIT License

//! Host side of three OpenCL tutorials: vector addition, matrix
//! multiplication and a numerical integration of π.
//!
//! Every program runs the same straight line: enumerate platforms, open a
//! context and a queue, build a kernel file, upload buffers, launch, read
//! back and check. That shared plumbing lives here; the binaries in
//! `src/bin` are thin drivers over [`vadd`], [`mmul`] and [`pi`].

// ─── Feature‑Module ───────────────────────────────────────────────────
#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::{record, summary, ALLOCS, ALLOC_BYTES};

pub mod buffer;
pub mod config;
pub mod matrix;
pub mod mmul;
pub mod pi;
pub mod platform;
pub mod session;
pub mod timer;
pub mod vadd;

pub use buffer::{Access, GpuBuffer, GpuEventGuard, InFlight, Queued, Ready, State};
pub use session::{load_program, ClSession, SessionConfig};
pub use timer::Timer;

use std::path::PathBuf;

// ─── Fehler‑Typ ───────────────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum ClError {
    #[error("OpenCL API error: {0}")]
    Api(i32),
    #[error("no OpenCL platform available")]
    NoPlatform,
    #[error("platform index {index} out of range ({count} platforms)")]
    PlatformIndex { index: usize, count: usize },
    #[error("platform {platform} exposes no OpenCL device")]
    NoDevice { platform: usize },
    #[error("device index {index} out of range ({count} devices in context)")]
    DeviceIndex { index: usize, count: usize },
    #[error("invalid buffer size: {0}")]
    InvalidSize(usize),
    #[error("host slice is {actual} bytes, buffer holds {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("cannot read program '{}': {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build program '{}' (OpenCL error {code})", path.display())]
    Build { path: PathBuf, code: i32, log: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<opencl3::error_codes::ClError> for ClError {
    #[inline]
    fn from(err: opencl3::error_codes::ClError) -> Self {
        ClError::Api(err.0)
    }
}

impl From<i32> for ClError {
    #[inline]
    fn from(code: i32) -> Self {
        ClError::Api(code)
    }
}

pub type Result<T, E = ClError> = std::result::Result<T, E>;
