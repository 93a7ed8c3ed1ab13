// In: src/dataset/mod.rs

//! The flat buffer store and its step-function views.
//!
//! A `Dataset` owns three backing columns (ulong timestamps, float values and an
//! opaque byte blob) plus the offset/length tables that carve them into per-axis
//! regions. Step functions are keys into it; every accessor derives a checked
//! slice from `offset[axis]` and `lengths[timestamps_axis]`, validating the extent
//! against the axis capacity once per access.
//!
//! Invariant: for every timestamp axis `0 <= lengths[a] <= max_lengths[a]`.

pub mod allocator;
pub mod layout;
pub mod resizable;
pub mod step_function;

#[cfg(test)]
mod allocator_tests;

use bytemuck::Pod;

use crate::config::AllocationConfig;
use crate::error::StepflowError;

pub use allocator::Reallocations;
pub use layout::Layout;
pub use resizable::ResizableBuffer;
pub use step_function::{
    ActuatedStepFunction, AxisId, OpaqueStepFunction, Quaternion, StepFunction, StepFunction1D,
    StepFunction2D, StepFunction3D, StepFunctionInt, StepFunctionOpaque, StepFunctionQuaternion,
};

/// Mutable views of the three backing columns, split off the layout so an
/// operator can read the tables while it writes the data.
pub(crate) struct Columns<'a> {
    pub timestamps: &'a mut [u64],
    pub values: &'a mut [f32],
    pub opaque: &'a mut [u8],
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub(crate) layout: Layout,
    pub(crate) timestamps: Vec<u64>,
    pub(crate) values: Vec<f32>,
    // Backed by words so every 8-byte aligned opaque region can be viewed as any Pod type.
    pub(crate) opaque: Vec<u64>,
    pub(crate) config: AllocationConfig,
}

/// Resolves the value axis of `dimension`, rejecting dimensions the shape lacks.
pub(crate) fn value_axis_of<S: ActuatedStepFunction>(
    step_function: &S,
    dimension: usize,
) -> Result<AxisId, StepflowError> {
    step_function.value_axis(dimension).ok_or_else(|| {
        StepflowError::InvalidDescriptor(format!(
            "dimension {} requested on a {}D step function",
            dimension,
            S::DIMENSIONS
        ))
    })
}

fn check_stride<T: Pod>(stride: usize) -> Result<(), StepflowError> {
    let expected = std::mem::size_of::<T>();
    if stride != expected {
        return Err(StepflowError::StrideMismatch {
            expected,
            actual: stride,
        });
    }
    Ok(())
}

impl Dataset {
    /// Creates a dataset and allocates storage for `config`.
    pub fn new(config: AllocationConfig) -> Result<Self, StepflowError> {
        let mut dataset = Self::default();
        dataset.reconfigure(config)?;
        Ok(dataset)
    }

    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Layout, Columns<'_>) {
        (
            &mut self.layout,
            Columns {
                timestamps: &mut self.timestamps,
                values: &mut self.values,
                opaque: bytemuck::cast_slice_mut(&mut self.opaque[..]),
            },
        )
    }

    //==============================================================================
    // Lengths
    //==============================================================================

    pub fn length<S: StepFunction>(&self, step_function: &S) -> Result<usize, StepflowError> {
        self.layout.length(step_function.timestamps_axis())
    }

    pub fn max_length<S: StepFunction>(&self, step_function: &S) -> Result<usize, StepflowError> {
        self.layout.max_length(step_function.timestamps_axis())
    }

    pub fn set_length<S: StepFunction>(
        &mut self,
        step_function: &S,
        length: usize,
    ) -> Result<(), StepflowError> {
        self.layout.set_length(step_function.timestamps_axis(), length)
    }

    /// Sets the destination length to the source length and returns it.
    ///
    /// Source and destination may share a timestamp axis (in-place mapping) or use
    /// distinct ones (separate storage).
    pub fn map_n_to_n<A: StepFunction, B: StepFunction>(
        &mut self,
        src: &A,
        dst: &B,
    ) -> Result<usize, StepflowError> {
        let length = self.layout.length(src.timestamps_axis())?;
        self.layout.set_length(dst.timestamps_axis(), length)?;
        Ok(length)
    }

    /// Sets the destination length to the sum of both source lengths and returns them.
    /// All three arguments must point to different timestamp axes.
    pub fn map_n_and_m_to_n_plus_m<A: StepFunction, B: StepFunction, C: StepFunction>(
        &mut self,
        src1: &A,
        src2: &B,
        dst: &C,
    ) -> Result<(usize, usize), StepflowError> {
        let (a1, a2, a3) = (
            src1.timestamps_axis(),
            src2.timestamps_axis(),
            dst.timestamps_axis(),
        );
        if a1 == a2 || a1 == a3 || a2 == a3 {
            return Err(StepflowError::AxisAliasing {
                operator: "map_n_and_m_to_n_plus_m",
                detail: format!(
                    "timestamp axes must be pairwise distinct, got {}, {} -> {}",
                    a1, a2, a3
                ),
            });
        }
        let length1 = self.layout.length(a1)?;
        let length2 = self.layout.length(a2)?;
        self.layout.set_length(a3, length1 + length2)?;
        Ok((length1, length2))
    }

    //==============================================================================
    // Views
    //==============================================================================

    pub fn timestamps<S: StepFunction>(&self, step_function: &S) -> Result<&[u64], StepflowError> {
        let axis = step_function.timestamps_axis();
        let range = self.layout.timestamp_region(axis, self.layout.length(axis)?)?;
        Ok(&self.timestamps[range])
    }

    pub fn timestamps_mut<S: StepFunction>(
        &mut self,
        step_function: &S,
    ) -> Result<&mut [u64], StepflowError> {
        let axis = step_function.timestamps_axis();
        let range = self.layout.timestamp_region(axis, self.layout.length(axis)?)?;
        Ok(&mut self.timestamps[range])
    }

    pub fn values<S: ActuatedStepFunction>(
        &self,
        step_function: &S,
        dimension: usize,
    ) -> Result<&[f32], StepflowError> {
        let axis = value_axis_of(step_function, dimension)?;
        let length = self.length(step_function)?;
        let range = self.layout.value_region(axis, length)?;
        Ok(&self.values[range])
    }

    pub fn values_mut<S: ActuatedStepFunction>(
        &mut self,
        step_function: &S,
        dimension: usize,
    ) -> Result<&mut [f32], StepflowError> {
        let axis = value_axis_of(step_function, dimension)?;
        let length = self.length(step_function)?;
        let range = self.layout.value_region(axis, length)?;
        Ok(&mut self.values[range])
    }

    pub fn values_x<S: ActuatedStepFunction>(&self, step_function: &S) -> Result<&[f32], StepflowError> {
        self.values(step_function, 0)
    }

    pub fn values_y<S: ActuatedStepFunction>(&self, step_function: &S) -> Result<&[f32], StepflowError> {
        self.values(step_function, 1)
    }

    pub fn values_z<S: ActuatedStepFunction>(&self, step_function: &S) -> Result<&[f32], StepflowError> {
        self.values(step_function, 2)
    }

    /// The raw bytes of the current items of an opaque step function.
    pub fn opaque_bytes<S: OpaqueStepFunction>(&self, step_function: &S) -> Result<&[u8], StepflowError> {
        let length = self.length(step_function)?;
        let range = self.layout.opaque_region(
            step_function.opaque_axis(),
            length,
            step_function.value_stride(),
        )?;
        let bytes: &[u8] = bytemuck::cast_slice(&self.opaque[..]);
        Ok(&bytes[range])
    }

    /// A typed view of an opaque step function; `T` must match the declared stride.
    pub fn opaque_values<T: Pod, S: OpaqueStepFunction>(
        &self,
        step_function: &S,
    ) -> Result<&[T], StepflowError> {
        check_stride::<T>(step_function.value_stride())?;
        Ok(bytemuck::try_cast_slice(self.opaque_bytes(step_function)?)?)
    }

    pub fn opaque_values_mut<T: Pod, S: OpaqueStepFunction>(
        &mut self,
        step_function: &S,
    ) -> Result<&mut [T], StepflowError> {
        check_stride::<T>(step_function.value_stride())?;
        let length = self.length(step_function)?;
        let range = self.layout.opaque_region(
            step_function.opaque_axis(),
            length,
            step_function.value_stride(),
        )?;
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.opaque[..]);
        Ok(bytemuck::try_cast_slice_mut(&mut bytes[range])?)
    }
}
