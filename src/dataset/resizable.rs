//! A growable scratch buffer with power-of-two hysteresis.
//!
//! The allocation is always a power of two in bytes, with a 1024-byte floor.
//! Resizing to a length whose size class equals the current allocation, or is
//! exactly half of it, keeps the allocation; anything else reallocates and copies
//! the overlapping prefix. A buffer that oscillates around a size boundary
//! therefore does not reallocate on every call.

use bytemuck::{Pod, Zeroable};

use crate::error::StepflowError;

/// Smallest allocation in bytes.
pub const MIN_ALLOCATION_BYTES: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct ResizableBuffer<T: Pod> {
    storage: Vec<T>,
    len: usize,
}

impl<T: Pod> ResizableBuffer<T> {
    pub fn new() -> Self {
        Self {
            storage: Vec::new(),
            len: 0,
        }
    }

    /// Allocation size in elements for a buffer holding `len` elements.
    fn size_class(len: usize) -> Result<usize, StepflowError> {
        let item = std::mem::size_of::<T>().max(1);
        let bytes = len
            .checked_mul(item)
            .and_then(usize::checked_next_power_of_two)
            .ok_or(StepflowError::ScratchAllocationFailed { requested: len })?;
        Ok(bytes.max(MIN_ALLOCATION_BYTES) / item)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current allocation in elements.
    pub fn allocated(&self) -> usize {
        self.storage.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.storage[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage[..self.len]
    }

    /// Sets the length, reallocating only when the hysteresis rule asks for it.
    /// Returns true if the allocation moved.
    pub fn resize(&mut self, len: usize) -> Result<bool, StepflowError> {
        let target = Self::size_class(len)?;
        let current = self.storage.len();
        let reallocated = target != current && target != current / 2;

        if reallocated {
            let mut storage = Vec::new();
            storage
                .try_reserve_exact(target)
                .map_err(|_| StepflowError::ScratchAllocationFailed { requested: target })?;
            storage.resize(target, T::zeroed());
            let kept = self.len.min(len);
            storage[..kept].copy_from_slice(&self.storage[..kept]);
            self.storage = storage;
        }

        self.len = len;
        Ok(reallocated)
    }

    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<(), StepflowError> {
        let start = self.len;
        let len = start
            .checked_add(items.len())
            .ok_or(StepflowError::ScratchAllocationFailed { requested: usize::MAX })?;
        self.resize(len)?;
        self.storage[start..start + items.len()].copy_from_slice(items);
        Ok(())
    }

    /// Empties the buffer without touching the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }
}
