//! Step-function descriptors.
//!
//! A step function is a pure index descriptor: it binds one timestamp axis to one
//! or more value axes (numeric shapes) or to one opaque byte axis with a fixed item
//! stride (opaque shapes). It owns no data; its only valid use is as a key into a
//! [`Dataset`](crate::dataset::Dataset).
//!
//! Shapes are told apart at compile time through the [`ActuatedStepFunction`] and
//! [`OpaqueStepFunction`] traits, so operators pick their accessors when they are
//! written, not per element.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Integer id of a logical column inside the flat buffer store.
pub type AxisId = usize;

/// Every step function has a timestamp axis; its length is the step function's length.
pub trait StepFunction {
    fn timestamps_axis(&self) -> AxisId;
}

/// A step function whose values have an actuation/magnitude notion: one float
/// value axis per dimension.
pub trait ActuatedStepFunction: StepFunction {
    const DIMENSIONS: usize;

    /// The value axis of `dimension` (0 = x, 1 = y, 2 = z), if the shape has it.
    fn value_axis(&self, dimension: usize) -> Option<AxisId>;
}

/// A step function whose values are an opaque binary blob of fixed-stride items.
pub trait OpaqueStepFunction: StepFunction {
    fn opaque_axis(&self) -> AxisId;

    /// Item stride in bytes.
    fn value_stride(&self) -> usize;
}

//==================================================================================
// 1. Numeric Shapes
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunction1D {
    pub timestamps: AxisId,
    pub values_x: AxisId,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunction2D {
    pub timestamps: AxisId,
    pub values_x: AxisId,
    pub values_y: AxisId,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunction3D {
    pub timestamps: AxisId,
    pub values_x: AxisId,
    pub values_y: AxisId,
    pub values_z: AxisId,
}

impl StepFunction1D {
    pub fn new(timestamps: AxisId, values_x: AxisId) -> Self {
        Self {
            timestamps,
            values_x,
        }
    }
}

impl StepFunction2D {
    pub fn new(timestamps: AxisId, values_x: AxisId, values_y: AxisId) -> Self {
        Self {
            timestamps,
            values_x,
            values_y,
        }
    }
}

impl StepFunction3D {
    pub fn new(timestamps: AxisId, values_x: AxisId, values_y: AxisId, values_z: AxisId) -> Self {
        Self {
            timestamps,
            values_x,
            values_y,
            values_z,
        }
    }
}

impl StepFunction for StepFunction1D {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl StepFunction for StepFunction2D {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl StepFunction for StepFunction3D {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl ActuatedStepFunction for StepFunction1D {
    const DIMENSIONS: usize = 1;

    fn value_axis(&self, dimension: usize) -> Option<AxisId> {
        match dimension {
            0 => Some(self.values_x),
            _ => None,
        }
    }
}

impl ActuatedStepFunction for StepFunction2D {
    const DIMENSIONS: usize = 2;

    fn value_axis(&self, dimension: usize) -> Option<AxisId> {
        match dimension {
            0 => Some(self.values_x),
            1 => Some(self.values_y),
            _ => None,
        }
    }
}

impl ActuatedStepFunction for StepFunction3D {
    const DIMENSIONS: usize = 3;

    fn value_axis(&self, dimension: usize) -> Option<AxisId> {
        match dimension {
            0 => Some(self.values_x),
            1 => Some(self.values_y),
            2 => Some(self.values_z),
            _ => None,
        }
    }
}

//==================================================================================
// 2. Opaque Shapes
//==================================================================================

/// Rotation payload carried by [`StepFunctionQuaternion`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

/// A completely opaque step function, for kernels that don't look inside the data.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunctionOpaque {
    pub timestamps: AxisId,
    pub opaque_values: AxisId,
    pub value_stride: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunctionQuaternion {
    pub timestamps: AxisId,
    pub opaque_values: AxisId,
}

/// Raw integers (enums, button states, demultiplexed signed fields).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepFunctionInt {
    pub timestamps: AxisId,
    pub opaque_values: AxisId,
}

impl StepFunctionInt {
    pub fn new(timestamps: AxisId, opaque_values: AxisId) -> Self {
        Self {
            timestamps,
            opaque_values,
        }
    }
}

impl StepFunction for StepFunctionOpaque {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl StepFunction for StepFunctionQuaternion {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl StepFunction for StepFunctionInt {
    fn timestamps_axis(&self) -> AxisId {
        self.timestamps
    }
}

impl OpaqueStepFunction for StepFunctionOpaque {
    fn opaque_axis(&self) -> AxisId {
        self.opaque_values
    }

    fn value_stride(&self) -> usize {
        self.value_stride
    }
}

impl OpaqueStepFunction for StepFunctionQuaternion {
    fn opaque_axis(&self) -> AxisId {
        self.opaque_values
    }

    fn value_stride(&self) -> usize {
        std::mem::size_of::<Quaternion>()
    }
}

impl OpaqueStepFunction for StepFunctionInt {
    fn opaque_axis(&self) -> AxisId {
        self.opaque_values
    }

    fn value_stride(&self) -> usize {
        std::mem::size_of::<i32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_lookup() {
        let sf = StepFunction3D::new(0, 4, 5, 6);
        assert_eq!(StepFunction3D::DIMENSIONS, 3);
        assert_eq!(sf.value_axis(0), Some(4));
        assert_eq!(sf.value_axis(2), Some(6));
        assert_eq!(sf.value_axis(3), None);
        assert_eq!(StepFunction1D::new(1, 2).value_axis(1), None);
    }

    #[test]
    fn test_opaque_strides() {
        let quat = StepFunctionQuaternion {
            timestamps: 0,
            opaque_values: 0,
        };
        assert_eq!(quat.value_stride(), 16);
        assert_eq!(StepFunctionInt::new(0, 1).value_stride(), 4);
    }
}
