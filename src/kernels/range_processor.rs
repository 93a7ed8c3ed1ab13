//! Branchless range mapping for scalar and planar 2D streams.
//!
//! Every stage of the pipeline computes both the pass-through and the transformed
//! value and mixes them with `lerp`. The "flags" (`compare`, `normalize`,
//! `process_as_abs`) are therefore continuous blend weights: 0 selects the
//! pass-through value, 1 the transformed one and anything in between is a linear
//! mix. The same instructions run for every element whatever the flag values are.
//!
//! Degenerate ranges are rejected where descriptors are registered. If one reaches
//! a kernel anyway, a nonzero `normalize` weight produces NaN/Inf, which then
//! propagates downstream. A NaN input likewise yields a NaN output.

use serde::{Deserialize, Serialize};

//==================================================================================
// 1. Parameters
//==================================================================================

/// Parameters of the 1D range processor.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct RangeParams {
    pub min_range: f32,
    pub max_range: f32,
    /// Blend weight between the clamped value (0) and the compare result (1).
    pub compare: f32,
    /// Compare result for values inside `[min_range, max_range]`.
    pub compare_in: f32,
    /// Compare result for values outside the range.
    pub compare_out: f32,
    /// Blend weight between the previous stage (0) and the normalized value (1).
    pub normalize: f32,
    pub scale: f32,
    pub offset: f32,
    /// Blend weight for processing the absolute value and restoring the sign after.
    pub process_as_abs: f32,
}

impl Default for RangeParams {
    /// Clamp to `[0, 1]` and nothing else.
    fn default() -> Self {
        Self {
            min_range: 0.0,
            max_range: 1.0,
            compare: 0.0,
            compare_in: 1.0,
            compare_out: 0.0,
            normalize: 0.0,
            scale: 1.0,
            offset: 0.0,
            process_as_abs: 0.0,
        }
    }
}

/// Parameters of the 2D magnitude processor. Scale and offset are per component.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct Range2DParams {
    pub min_magnitude: f32,
    pub max_magnitude: f32,
    pub normalize: f32,
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl Default for Range2DParams {
    fn default() -> Self {
        Self {
            min_magnitude: 0.0,
            max_magnitude: 1.0,
            normalize: 0.0,
            scale: [1.0, 1.0],
            offset: [0.0, 0.0],
        }
    }
}

//==================================================================================
// 2. Scalar Pipeline
//==================================================================================

#[inline(always)]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Divisor of the normalize stage. With a zero `normalize` weight the result is
/// discarded, so the divisor is pinned to 1 and an empty range stays finite.
#[inline]
fn normalize_width(min: f32, max: f32, normalize: f32) -> f32 {
    if normalize == 0.0 {
        1.0
    } else {
        max - min
    }
}

/// Clamp that lets NaN through, so a poisoned sample stays poisoned.
#[inline(always)]
fn clamp(v: f32, min: f32, max: f32) -> f32 {
    if v < min {
        min
    } else if v > max {
        max
    } else {
        v
    }
}

/// -1 for strictly negative inputs, +1 otherwise (including -0.0 and NaN).
#[inline(always)]
fn sign_factor(input: f32) -> f32 {
    1.0 - 2.0 * ((input < 0.0) as u8 as f32)
}

#[inline(always)]
fn process_value(input: f32, p: &RangeParams, width: f32) -> f32 {
    // 1. absolute value
    let sign = sign_factor(input);
    let v = lerp(input, input * sign, p.process_as_abs);

    // 2. clamp vs. compare
    let clamped = clamp(v, p.min_range, p.max_range);
    let inside = ((v >= p.min_range) & (v <= p.max_range)) as u8 as f32;
    let compared = lerp(p.compare_out, p.compare_in, inside);
    let v = lerp(clamped, compared, p.compare);

    // 3. normalize
    let normalized = (v - p.min_range) / width;
    let v = lerp(v, normalized, p.normalize);

    // 4. sign restore
    let v = lerp(v, v * sign, p.process_as_abs);

    // 5. scale and offset
    v * p.scale + p.offset
}

/// Processes `values` in place.
pub fn process_1d_in_place(values: &mut [f32], params: &RangeParams) {
    let width = normalize_width(params.min_range, params.max_range, params.normalize);
    for v in values.iter_mut() {
        *v = process_value(*v, params, width);
    }
}

/// Processes `src` into `dst`.
pub fn process_1d(src: &[f32], dst: &mut [f32], params: &RangeParams) {
    debug_assert_eq!(src.len(), dst.len());
    let width = normalize_width(params.min_range, params.max_range, params.normalize);
    for (out, &v) in dst.iter_mut().zip(src) {
        *out = process_value(v, params, width);
    }
}

//==================================================================================
// 3. Planar 2D Pipeline
//==================================================================================

/// Rescales every `(x[i], y[i])` vector so its magnitude is clamped (and optionally
/// normalized) into the configured range, then applies per-axis scale and offset.
///
/// A zero-length input vector has no direction; its components become NaN.
pub fn process_2d_in_place(x: &mut [f32], y: &mut [f32], params: &Range2DParams) {
    debug_assert_eq!(x.len(), y.len());
    let width = normalize_width(params.min_magnitude, params.max_magnitude, params.normalize);
    for (x, y) in x.iter_mut().zip(y.iter_mut()) {
        let magnitude = (*x * *x + *y * *y).sqrt();
        let clamped = clamp(magnitude, params.min_magnitude, params.max_magnitude);
        let normalized = (clamped - params.min_magnitude) / width;
        let adjusted = lerp(clamped, normalized, params.normalize);
        let factor = adjusted / magnitude;

        *x = *x * factor * params.scale[0] + params.offset[0];
        *y = *y * factor * params.scale[1] + params.offset[1];
    }
}
