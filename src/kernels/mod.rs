//! This module holds the pure, stateless slice kernels of the transform engine.
//!
//! Every kernel takes its sources as shared slices and its destination as an
//! exclusive slice, so the non-aliasing contract is enforced by the borrow
//! checker. Kernels know nothing about axes, offsets or lengths; the operators in
//! `pipeline` resolve those against a `Dataset` and hand the resulting views down.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Type conversion
pub mod enum_lut;

/// Vector reduction
pub mod magnitude;

/// Range mapping
pub mod range_processor;

/// Running sums and stream merging
pub mod accumulate;
pub mod merge;

/// Bit-field extraction
pub mod demux;

pub use range_processor::{Range2DParams, RangeParams};
