// In: src/error.rs

//! This module defines the single, unified error type for the entire stepflow library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Capacity and aliasing violations are programming errors on the caller's side.
//! They are reported as close as possible to the offending operator and are never
//! retried: the orchestrator stops the run at the first error.

use thiserror::Error;

/// The column kind an axis id refers to. Used to give errors a precise location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Timestamps,
    Values,
    Opaque,
}

impl std::fmt::Display for AxisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisKind::Timestamps => write!(f, "timestamp"),
            AxisKind::Values => write!(f, "value"),
            AxisKind::Opaque => write!(f, "opaque"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StepflowError {
    // =========================================================================
    // === Layout & Capacity Errors
    // =========================================================================
    #[error("Capacity exceeded on timestamp axis {axis}: requested {requested}, max length is {capacity}")]
    CapacityExceeded {
        axis: usize,
        requested: usize,
        capacity: usize,
    },

    #[error("Region overflow on {kind} axis {axis}: requested {requested} elements, region holds {capacity}")]
    RegionOverflow {
        kind: AxisKind,
        axis: usize,
        requested: usize,
        capacity: usize,
    },

    #[error("{kind} axis {axis} does not exist (dataset has {count} {kind} axes)")]
    AxisOutOfRange {
        kind: AxisKind,
        axis: usize,
        count: usize,
    },

    #[error("Axis aliasing violation in {operator}: {detail}")]
    AxisAliasing {
        operator: &'static str,
        detail: String,
    },

    // =========================================================================
    // === Kernel & Descriptor Errors
    // =========================================================================
    #[error("Enum LUT index {index} is out of bounds for a LUT of length {lut_len}")]
    LutIndexOutOfBounds { index: i64, lut_len: usize },

    #[error("Opaque stride mismatch: step function declares {actual} bytes, view type needs {expected}")]
    StrideMismatch { expected: usize, actual: usize },

    #[error("Snapshot shape mismatch: expected {expected} words, got {actual}")]
    SnapshotShape { expected: usize, actual: usize },

    #[error("Invalid operation descriptor: {0}")]
    InvalidDescriptor(String),

    // =========================================================================
    // === Allocation & Hook Errors
    // =========================================================================
    #[error("Allocation of {requested} {kind} elements failed")]
    AllocationFailed { kind: AxisKind, requested: usize },

    #[error("Scratch buffer allocation of {requested} elements failed")]
    ScratchAllocationFailed { requested: usize },

    #[error("Pipeline step '{stage}' failed: {source}")]
    Step {
        stage: String,
        #[source]
        source: Box<StepflowError>,
    },

    // =========================================================================
    // === External Error Wrappers
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a definition.
    #[error("Serde JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    Cast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error
}

impl From<bytemuck::PodCastError> for StepflowError {
    fn from(err: bytemuck::PodCastError) -> Self {
        StepflowError::Cast(format!("{:?}", err))
    }
}
