// In: src/config.rs

//! Configuration for the dataset allocator and the pipeline orchestrator.
//!
//! Both structs are plain serde types so a host can build them in code or load
//! them from JSON. `AllocationConfig` is recomputed by the caller whenever the set
//! of active step functions changes; `PipelineSettings` tunes how a run executes.

use serde::{Deserialize, Serialize};

use crate::error::StepflowError;

/// Opaque regions start on this byte boundary so typed views can be formed over them.
pub const OPAQUE_ALIGNMENT: usize = std::mem::size_of::<u64>();

//==================================================================================
// I. Allocation Config
//==================================================================================

/// Per-axis capacities of the flat buffer store.
///
/// The six dimensions the allocator diffs are derived from these vectors: the
/// number of entries of each vector (axis counts) and their sums (sample/byte totals).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AllocationConfig {
    /// Max length (in samples) of each timestamp axis. Also the capacity ceiling
    /// for the `lengths` of that axis.
    #[serde(default)]
    pub timestamp_axes: Vec<usize>,

    /// Capacity (in samples) of each value axis.
    #[serde(default)]
    pub value_axes: Vec<usize>,

    /// Capacity (in bytes) of each opaque axis.
    #[serde(default)]
    pub opaque_axes: Vec<usize>,
}

impl AllocationConfig {
    pub fn new(timestamp_axes: Vec<usize>, value_axes: Vec<usize>, opaque_axes: Vec<usize>) -> Self {
        Self {
            timestamp_axes,
            value_axes,
            opaque_axes,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, StepflowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timestamp_axis_count(&self) -> usize {
        self.timestamp_axes.len()
    }

    pub fn value_axis_count(&self) -> usize {
        self.value_axes.len()
    }

    pub fn opaque_axis_count(&self) -> usize {
        self.opaque_axes.len()
    }

    pub fn timestamp_sample_total(&self) -> usize {
        self.timestamp_axes.iter().sum()
    }

    pub fn value_sample_total(&self) -> usize {
        self.value_axes.iter().sum()
    }

    /// Total opaque bytes including the padding that aligns every region start.
    pub fn opaque_byte_total(&self) -> usize {
        self.opaque_axes.iter().map(|&b| align_up(b, OPAQUE_ALIGNMENT)).sum()
    }
}

pub(crate) fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

//==================================================================================
// II. Pipeline Settings
//==================================================================================

/// Knobs for a pipeline run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PipelineSettings {
    /// Run the `Map` (length propagation) pass before `Execute`. When disabled the
    /// caller is responsible for setting every destination length beforehand.
    #[serde(default = "default_true")]
    pub propagate_lengths: bool,

    /// Measure and log the wall time of every stage.
    #[serde(default)]
    pub log_stage_timings: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            propagate_lengths: true,
            log_stage_timings: false,
        }
    }
}

impl PipelineSettings {
    pub fn from_json_str(json: &str) -> Result<Self, StepflowError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}
