// In: src/pipeline/operators.rs

//! Operator descriptors of the transform stages.
//!
//! Each descriptor names its source and destination step functions plus its
//! parameters. `map` applies the N->N or N+M->N+M length rule; `execute`
//! resolves the current regions, splits them into non-aliasing views and hands
//! them to the matching kernel. When an N->N operator writes to a different
//! timestamp axis than it reads, the source timestamps are copied over so the
//! destination step function is self-contained.

use serde::{Deserialize, Serialize};

use crate::dataset::layout::{split_for_write, split_pair_mut, Layout};
use crate::dataset::{AxisId, Dataset, OpaqueStepFunction, StepFunction1D, StepFunction2D, StepFunction3D, StepFunctionInt};
use crate::error::StepflowError;
use crate::kernels::{accumulate, enum_lut, magnitude, merge, range_processor, Range2DParams, RangeParams};
use crate::pipeline::traits::{ExecutionContext, Operator};

//==================================================================================
// 1. Helpers
//==================================================================================

fn copy_timestamps(
    layout: &Layout,
    column: &mut [u64],
    src: AxisId,
    dst: AxisId,
    len: usize,
    operator: &'static str,
) -> Result<(), StepflowError> {
    if src == dst {
        return Ok(());
    }
    let read = layout.timestamp_region(src, len)?;
    let write = layout.timestamp_region(dst, len)?;
    let ([source], target) = split_for_write(column, [read], write, operator)?;
    target.copy_from_slice(source);
    Ok(())
}

fn reject_shared_axis(operator: &'static str, what: &str, a: AxisId, b: AxisId) -> Result<(), StepflowError> {
    if a == b {
        return Err(StepflowError::AxisAliasing {
            operator,
            detail: format!("{} share axis {}", what, a),
        });
    }
    Ok(())
}

fn reject_degenerate_range(operator: &str, normalize: f32, min: f32, max: f32) -> Result<(), StepflowError> {
    if normalize != 0.0 && max == min {
        return Err(StepflowError::InvalidDescriptor(format!(
            "{}: normalize weight {} over the empty range [{}, {}]",
            operator, normalize, min, max
        )));
    }
    Ok(())
}

//==================================================================================
// 2. Type Conversion
//==================================================================================

/// `dst[i] = lut[(src[i] & mask) + lut_offset]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumToFloat {
    pub src: StepFunctionInt,
    pub dst: StepFunction1D,
    pub mask: i32,
    #[serde(default)]
    pub lut_offset: usize,
}

impl Operator for EnumToFloat {
    const NAME: &'static str = "enum_to_float";

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_to_n(&self.src, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.src.timestamps)?;
        copy_timestamps(layout, columns.timestamps, self.src.timestamps, self.dst.timestamps, len, Self::NAME)?;

        let read = layout.opaque_region(self.src.opaque_values, len, self.src.value_stride())?;
        let write = layout.value_region(self.dst.values_x, len)?;
        let src: &[i32] = bytemuck::try_cast_slice(&columns.opaque[read])?;
        enum_lut::enum_to_float(src, context.lut, self.mask, self.lut_offset, &mut columns.values[write])
    }
}

//==================================================================================
// 3. Vector Reduction
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vec2ToMagnitude {
    pub src: StepFunction2D,
    pub dst: StepFunction1D,
}

impl Operator for Vec2ToMagnitude {
    const NAME: &'static str = "vec2_to_magnitude";

    fn validate(&self) -> Result<(), StepflowError> {
        reject_shared_axis(Self::NAME, "x and destination", self.src.values_x, self.dst.values_x)?;
        reject_shared_axis(Self::NAME, "y and destination", self.src.values_y, self.dst.values_x)
    }

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_to_n(&self.src, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.src.timestamps)?;
        copy_timestamps(layout, columns.timestamps, self.src.timestamps, self.dst.timestamps, len, Self::NAME)?;

        let reads = [
            layout.value_region(self.src.values_x, len)?,
            layout.value_region(self.src.values_y, len)?,
        ];
        let write = layout.value_region(self.dst.values_x, len)?;
        let ([x, y], dst) = split_for_write(columns.values, reads, write, Self::NAME)?;
        magnitude::magnitude_2d(x, y, dst);
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vec3ToMagnitude {
    pub src: StepFunction3D,
    pub dst: StepFunction1D,
}

impl Operator for Vec3ToMagnitude {
    const NAME: &'static str = "vec3_to_magnitude";

    fn validate(&self) -> Result<(), StepflowError> {
        reject_shared_axis(Self::NAME, "x and destination", self.src.values_x, self.dst.values_x)?;
        reject_shared_axis(Self::NAME, "y and destination", self.src.values_y, self.dst.values_x)?;
        reject_shared_axis(Self::NAME, "z and destination", self.src.values_z, self.dst.values_x)
    }

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_to_n(&self.src, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.src.timestamps)?;
        copy_timestamps(layout, columns.timestamps, self.src.timestamps, self.dst.timestamps, len, Self::NAME)?;

        let reads = [
            layout.value_region(self.src.values_x, len)?,
            layout.value_region(self.src.values_y, len)?,
            layout.value_region(self.src.values_z, len)?,
        ];
        let write = layout.value_region(self.dst.values_x, len)?;
        let ([x, y, z], dst) = split_for_write(columns.values, reads, write, Self::NAME)?;
        magnitude::magnitude_3d(x, y, z, dst);
        Ok(())
    }
}

//==================================================================================
// 4. Range Processors
//==================================================================================

/// Scalar range processor. Runs in place when `src` and `dst` share their value axis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Processor1D {
    pub src: StepFunction1D,
    pub dst: StepFunction1D,
    #[serde(default)]
    pub params: RangeParams,
}

impl Processor1D {
    pub fn in_place(slice: StepFunction1D, params: RangeParams) -> Self {
        Self {
            src: slice,
            dst: slice,
            params,
        }
    }
}

impl Operator for Processor1D {
    const NAME: &'static str = "processor_1d";

    fn validate(&self) -> Result<(), StepflowError> {
        let p = &self.params;
        reject_degenerate_range(Self::NAME, p.normalize, p.min_range, p.max_range)
    }

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_to_n(&self.src, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.src.timestamps)?;
        copy_timestamps(layout, columns.timestamps, self.src.timestamps, self.dst.timestamps, len, Self::NAME)?;

        if self.src.values_x == self.dst.values_x {
            let region = layout.value_region(self.src.values_x, len)?;
            range_processor::process_1d_in_place(&mut columns.values[region], &self.params);
        } else {
            let read = layout.value_region(self.src.values_x, len)?;
            let write = layout.value_region(self.dst.values_x, len)?;
            let ([src], dst) = split_for_write(columns.values, [read], write, Self::NAME)?;
            range_processor::process_1d(src, dst, &self.params);
        }
        Ok(())
    }
}

/// Planar 2D magnitude processor, always in place.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Processor2D {
    pub slice: StepFunction2D,
    #[serde(default)]
    pub params: Range2DParams,
}

impl Operator for Processor2D {
    const NAME: &'static str = "processor_2d";

    fn validate(&self) -> Result<(), StepflowError> {
        reject_shared_axis(Self::NAME, "x and y", self.slice.values_x, self.slice.values_y)?;
        let p = &self.params;
        reject_degenerate_range(Self::NAME, p.normalize, p.min_magnitude, p.max_magnitude)
    }

    fn map(&self, _dataset: &mut Dataset) -> Result<(), StepflowError> {
        // In place: the length does not change.
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.slice.timestamps)?;
        let xs = layout.value_region(self.slice.values_x, len)?;
        let ys = layout.value_region(self.slice.values_y, len)?;
        let (x, y) = split_pair_mut(columns.values, xs, ys, Self::NAME)?;
        range_processor::process_2d_in_place(x, y, &self.params);
        Ok(())
    }
}

//==================================================================================
// 5. Accumulation and Merging
//==================================================================================

/// Running sum of a scalar stream. Runs in place when `src` and `dst` share their value axis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accumulate1D {
    pub src: StepFunction1D,
    pub dst: StepFunction1D,
}

impl Operator for Accumulate1D {
    const NAME: &'static str = "accumulate_1d";

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_to_n(&self.src, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len = layout.length(self.src.timestamps)?;
        copy_timestamps(layout, columns.timestamps, self.src.timestamps, self.dst.timestamps, len, Self::NAME)?;

        if self.src.values_x == self.dst.values_x {
            let region = layout.value_region(self.src.values_x, len)?;
            accumulate::prefix_sum_in_place(&mut columns.values[region]);
        } else {
            let read = layout.value_region(self.src.values_x, len)?;
            let write = layout.value_region(self.dst.values_x, len)?;
            let ([src], dst) = split_for_write(columns.values, [read], write, Self::NAME)?;
            accumulate::prefix_sum(src, dst);
        }
        Ok(())
    }
}

/// Merges two ascending streams into `dst`; stream 1 wins timestamp ties.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latest1D {
    pub src1: StepFunction1D,
    pub src2: StepFunction1D,
    pub dst: StepFunction1D,
}

impl Operator for Latest1D {
    const NAME: &'static str = "latest_1d";

    fn validate(&self) -> Result<(), StepflowError> {
        reject_shared_axis(Self::NAME, "sources", self.src1.timestamps, self.src2.timestamps)?;
        reject_shared_axis(Self::NAME, "source 1 and destination", self.src1.timestamps, self.dst.timestamps)?;
        reject_shared_axis(Self::NAME, "source 2 and destination", self.src2.timestamps, self.dst.timestamps)?;
        reject_shared_axis(Self::NAME, "source 1 and destination values", self.src1.values_x, self.dst.values_x)?;
        reject_shared_axis(Self::NAME, "source 2 and destination values", self.src2.values_x, self.dst.values_x)
    }

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        dataset.map_n_and_m_to_n_plus_m(&self.src1, &self.src2, &self.dst)?;
        Ok(())
    }

    fn execute(&self, dataset: &mut Dataset, _context: &ExecutionContext<'_>) -> Result<(), StepflowError> {
        let (layout, columns) = dataset.parts_mut();
        let len1 = layout.length(self.src1.timestamps)?;
        let len2 = layout.length(self.src2.timestamps)?;
        let total = len1 + len2;

        let timestamp_reads = [
            layout.timestamp_region(self.src1.timestamps, len1)?,
            layout.timestamp_region(self.src2.timestamps, len2)?,
        ];
        let timestamp_write = layout.timestamp_region(self.dst.timestamps, total)?;
        let value_reads = [
            layout.value_region(self.src1.values_x, len1)?,
            layout.value_region(self.src2.values_x, len2)?,
        ];
        let value_write = layout.value_region(self.dst.values_x, total)?;

        let ([t1, t2], out_t) = split_for_write(columns.timestamps, timestamp_reads, timestamp_write, Self::NAME)?;
        let ([v1, v2], out_v) = split_for_write(columns.values, value_reads, value_write, Self::NAME)?;
        merge::merge_latest(t1, v1, t2, v2, out_t, out_v);
        Ok(())
    }
}
