//! Offset and length tables of the flat buffer store.
//!
//! Every axis owns the region `[offset[a], offset[a] + capacity[a])` of its
//! column. Regions are contiguous in axis-id order and never overlap, whatever the
//! current lengths are. Only the allocator rewrites offsets, and only between runs.

use std::ops::Range;

use crate::config::{align_up, AllocationConfig, OPAQUE_ALIGNMENT};
use crate::dataset::step_function::AxisId;
use crate::error::{AxisKind, StepflowError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Current valid element count per timestamp axis.
    pub(crate) lengths: Vec<usize>,
    /// Capacity ceiling per timestamp axis.
    pub(crate) max_lengths: Vec<usize>,
    pub(crate) timestamp_offsets: Vec<usize>,

    pub(crate) value_offsets: Vec<usize>,
    pub(crate) value_capacities: Vec<usize>,

    // opaque offsets and capacities are in bytes
    pub(crate) opaque_offsets: Vec<usize>,
    pub(crate) opaque_capacities: Vec<usize>,
}

/// Lays each axis's region out back to back, in axis-id order.
fn contiguous_offsets(capacities: &[usize], alignment: usize) -> Vec<usize> {
    let mut cursor = 0;
    capacities
        .iter()
        .map(|&capacity| {
            let offset = cursor;
            cursor += align_up(capacity, alignment);
            offset
        })
        .collect()
}

impl Layout {
    /// Computes offsets from per-axis capacities. Lengths start at zero.
    pub(crate) fn from_config(config: &AllocationConfig) -> Self {
        Self {
            lengths: vec![0; config.timestamp_axes.len()],
            max_lengths: config.timestamp_axes.clone(),
            timestamp_offsets: contiguous_offsets(&config.timestamp_axes, 1),
            value_offsets: contiguous_offsets(&config.value_axes, 1),
            value_capacities: config.value_axes.clone(),
            opaque_offsets: contiguous_offsets(&config.opaque_axes, OPAQUE_ALIGNMENT),
            opaque_capacities: config.opaque_axes.clone(),
        }
    }

    pub fn timestamp_axis_count(&self) -> usize {
        self.max_lengths.len()
    }

    pub fn value_axis_count(&self) -> usize {
        self.value_capacities.len()
    }

    pub fn opaque_axis_count(&self) -> usize {
        self.opaque_capacities.len()
    }

    fn check_timestamp_axis(&self, axis: AxisId) -> Result<(), StepflowError> {
        if axis >= self.max_lengths.len() {
            return Err(StepflowError::AxisOutOfRange {
                kind: AxisKind::Timestamps,
                axis,
                count: self.max_lengths.len(),
            });
        }
        Ok(())
    }

    pub fn length(&self, axis: AxisId) -> Result<usize, StepflowError> {
        self.check_timestamp_axis(axis)?;
        Ok(self.lengths[axis])
    }

    pub fn max_length(&self, axis: AxisId) -> Result<usize, StepflowError> {
        self.check_timestamp_axis(axis)?;
        Ok(self.max_lengths[axis])
    }

    /// Sets the current length of a timestamp axis, enforcing `length <= max_length`.
    pub fn set_length(&mut self, axis: AxisId, length: usize) -> Result<(), StepflowError> {
        self.check_timestamp_axis(axis)?;
        let capacity = self.max_lengths[axis];
        if length > capacity {
            return Err(StepflowError::CapacityExceeded {
                axis,
                requested: length,
                capacity,
            });
        }
        self.lengths[axis] = length;
        Ok(())
    }

    /// The first `len` timestamp slots of `axis`, as indices into the timestamp column.
    pub(crate) fn timestamp_region(&self, axis: AxisId, len: usize) -> Result<Range<usize>, StepflowError> {
        self.check_timestamp_axis(axis)?;
        let capacity = self.max_lengths[axis];
        if len > capacity {
            return Err(StepflowError::CapacityExceeded {
                axis,
                requested: len,
                capacity,
            });
        }
        let start = self.timestamp_offsets[axis];
        Ok(start..start + len)
    }

    /// The first `len` value slots of `axis`, as indices into the value column.
    pub(crate) fn value_region(&self, axis: AxisId, len: usize) -> Result<Range<usize>, StepflowError> {
        let capacity = *self
            .value_capacities
            .get(axis)
            .ok_or(StepflowError::AxisOutOfRange {
                kind: AxisKind::Values,
                axis,
                count: self.value_capacities.len(),
            })?;
        if len > capacity {
            return Err(StepflowError::RegionOverflow {
                kind: AxisKind::Values,
                axis,
                requested: len,
                capacity,
            });
        }
        let start = self.value_offsets[axis];
        Ok(start..start + len)
    }

    /// The bytes of the first `len` items of `stride` bytes on opaque `axis`.
    pub(crate) fn opaque_region(
        &self,
        axis: AxisId,
        len: usize,
        stride: usize,
    ) -> Result<Range<usize>, StepflowError> {
        let capacity = *self
            .opaque_capacities
            .get(axis)
            .ok_or(StepflowError::AxisOutOfRange {
                kind: AxisKind::Opaque,
                axis,
                count: self.opaque_capacities.len(),
            })?;
        let bytes = len * stride;
        if bytes > capacity {
            return Err(StepflowError::RegionOverflow {
                kind: AxisKind::Opaque,
                axis,
                requested: len,
                capacity: if stride == 0 { 0 } else { capacity / stride },
            });
        }
        let start = self.opaque_offsets[axis];
        Ok(start..start + bytes)
    }
}

/// Splits `column` into shared views of `reads` and an exclusive view of `write`.
///
/// Reads may overlap each other but none may touch the write region; that is the
/// non-aliasing contract every kernel relies on.
pub(crate) fn split_for_write<'a, T, const N: usize>(
    column: &'a mut [T],
    reads: [Range<usize>; N],
    write: Range<usize>,
    operator: &'static str,
) -> Result<([&'a [T]; N], &'a mut [T]), StepflowError> {
    let (head, rest) = column.split_at_mut(write.start);
    let (target, tail) = rest.split_at_mut(write.end - write.start);
    let head: &'a [T] = head;
    let tail: &'a [T] = tail;

    let empty: &'a [T] = &[];
    let mut views: [&'a [T]; N] = [empty; N];
    for (view, read) in views.iter_mut().zip(reads) {
        if read.is_empty() {
            continue;
        }
        *view = if read.end <= write.start {
            &head[read]
        } else if read.start >= write.end {
            &tail[read.start - write.end..read.end - write.end]
        } else {
            return Err(StepflowError::AxisAliasing {
                operator,
                detail: format!("source region {:?} overlaps destination {:?}", read, write),
            });
        };
    }
    Ok((views, target))
}

/// Splits `column` into two exclusive views. The regions must not overlap.
pub(crate) fn split_pair_mut<'a, T>(
    column: &'a mut [T],
    a: Range<usize>,
    b: Range<usize>,
    operator: &'static str,
) -> Result<(&'a mut [T], &'a mut [T]), StepflowError> {
    if a.is_empty() {
        return Ok((Default::default(), &mut column[b]));
    }
    if b.is_empty() {
        return Ok((&mut column[a], Default::default()));
    }
    if a.start < b.end && b.start < a.end {
        return Err(StepflowError::AxisAliasing {
            operator,
            detail: format!("regions {:?} and {:?} overlap", a, b),
        });
    }
    if a.end <= b.start {
        let (lo, hi) = column.split_at_mut(b.start);
        Ok((&mut lo[a], &mut hi[..b.end - b.start]))
    } else {
        let (lo, hi) = column.split_at_mut(a.start);
        Ok((&mut hi[..a.end - a.start], &mut lo[b]))
    }
}
