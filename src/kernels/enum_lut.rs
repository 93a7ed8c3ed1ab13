//! Enum to float conversion through a lookup table.
//!
//! A masked integer is used as a direct index into a caller-supplied table:
//! `dst[i] = lut[(src[i] & mask) + offset]`. An index outside the table is a
//! contract violation and is reported, never wrapped.

use crate::error::StepflowError;

/// Resolves one masked value against the table.
#[inline]
fn lookup(value: i32, lut: &[f32], mask: i32, lut_offset: usize) -> Result<f32, StepflowError> {
    let index = i64::from(value & mask) + lut_offset as i64;
    usize::try_from(index)
        .ok()
        .and_then(|i| lut.get(i).copied())
        .ok_or(StepflowError::LutIndexOutOfBounds {
            index,
            lut_len: lut.len(),
        })
}

pub fn enum_to_float(
    src: &[i32],
    lut: &[f32],
    mask: i32,
    lut_offset: usize,
    dst: &mut [f32],
) -> Result<(), StepflowError> {
    debug_assert_eq!(src.len(), dst.len());
    for (value, out) in src.iter().zip(dst.iter_mut()) {
        *out = lookup(*value, lut, mask, lut_offset)?;
    }
    Ok(())
}
