//! Reconfiguration of the flat buffer store.
//!
//! `reconfigure` diffs six dimensions of the new [`AllocationConfig`] against the
//! previous one. Each backing column is released and reallocated only when its
//! total changes; otherwise the column keeps its storage and contents. The offset
//! tables are always recomputed from the new per-axis capacities.

use crate::config::AllocationConfig;
use crate::dataset::layout::Layout;
use crate::dataset::Dataset;
use crate::error::{AxisKind, StepflowError};

/// Which of the six allocation dimensions changed in a reconfiguration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reallocations {
    pub timestamp_axis_count: bool,
    pub value_axis_count: bool,
    pub opaque_axis_count: bool,
    pub timestamp_samples: bool,
    pub value_samples: bool,
    pub opaque_bytes: bool,
}

impl Reallocations {
    fn diff(old: &AllocationConfig, new: &AllocationConfig) -> Self {
        Self {
            timestamp_axis_count: old.timestamp_axis_count() != new.timestamp_axis_count(),
            value_axis_count: old.value_axis_count() != new.value_axis_count(),
            opaque_axis_count: old.opaque_axis_count() != new.opaque_axis_count(),
            timestamp_samples: old.timestamp_sample_total() != new.timestamp_sample_total(),
            value_samples: old.value_sample_total() != new.value_sample_total(),
            opaque_bytes: old.opaque_byte_total() != new.opaque_byte_total(),
        }
    }

    /// True if any backing column was reallocated.
    pub fn any_storage(&self) -> bool {
        self.timestamp_samples || self.value_samples || self.opaque_bytes
    }
}

/// Allocates a zeroed column of `max(requested, 1)` elements.
fn allocate_column<T: Copy + Default>(requested: usize, kind: AxisKind) -> Result<Vec<T>, StepflowError> {
    let len = requested.max(1);
    let mut column = Vec::new();
    column
        .try_reserve_exact(len)
        .map_err(|_| StepflowError::AllocationFailed { kind, requested: len })?;
    column.resize(len, T::default());
    Ok(column)
}

impl Dataset {
    /// Applies a new allocation config and reports which dimensions changed.
    ///
    /// When every column keeps its storage, lengths of axes that survive the
    /// change are kept, clamped to their new capacity. Reallocating any column
    /// empties every axis, since its samples no longer exist. New axes start empty.
    pub fn reconfigure(&mut self, config: AllocationConfig) -> Result<Reallocations, StepflowError> {
        let changes = Reallocations::diff(&self.config, &config);

        // A freshly defaulted dataset has no storage yet, even for zero totals.
        if changes.timestamp_samples || self.timestamps.is_empty() {
            self.timestamps = allocate_column(config.timestamp_sample_total(), AxisKind::Timestamps)?;
        }
        if changes.value_samples || self.values.is_empty() {
            self.values = allocate_column(config.value_sample_total(), AxisKind::Values)?;
        }
        if changes.opaque_bytes || self.opaque.is_empty() {
            let words = config.opaque_byte_total() / std::mem::size_of::<u64>();
            self.opaque = allocate_column(words, AxisKind::Opaque)?;
        }

        let mut layout = Layout::from_config(&config);
        if !changes.any_storage() {
            for (axis, length) in layout.lengths.iter_mut().enumerate() {
                if let Some(&previous) = self.layout.lengths.get(axis) {
                    *length = previous.min(layout.max_lengths[axis]);
                }
            }
        }
        self.layout = layout;
        self.config = config;

        log::info!(
            "Reconfigured dataset: {} timestamp axes ({} samples), {} value axes ({} samples), {} opaque axes ({} bytes); reallocated: {:?}",
            self.config.timestamp_axis_count(),
            self.config.timestamp_sample_total(),
            self.config.value_axis_count(),
            self.config.value_sample_total(),
            self.config.opaque_axis_count(),
            self.config.opaque_byte_total(),
            changes
        );
        log_metric!(
            "event" = "reconfigure",
            "timestamp_samples" = &changes.timestamp_samples,
            "value_samples" = &changes.value_samples,
            "opaque_bytes" = &changes.opaque_bytes
        );

        Ok(changes)
    }
}
