//! # stepflow
//!
//! A fixed-layout, columnar time-series transform engine. Signals live as
//! step functions (timestamp axis + value or opaque axes) inside one flat buffer
//! store, the [`Dataset`]. A [`Pipeline`] of stateless operators (enum lookup,
//! vector magnitude, range processing, prefix sums, two-stream merges) and stateful
//! bit-field demuxers transforms them once per update tick, first propagating
//! lengths (`Map`) and then producing values (`Execute`).
//!
//! Layout of the crate:
//! - `dataset`: the buffer store, step-function descriptors, the allocator and a
//!   resizable scratch buffer.
//! - `kernels`: pure slice kernels, independent of the store.
//! - `pipeline`: operator descriptors, the demuxer, the orchestrator and the
//!   serializable pipeline definition.

#[macro_use]
mod observability;

pub mod config;
pub mod dataset;
pub mod error;
pub mod kernels;
pub mod pipeline;

#[doc(hidden)]
pub use log as __log;

pub use config::{AllocationConfig, PipelineSettings};
pub use dataset::Dataset;
pub use error::StepflowError;
pub use observability::enable_verbose_logging;
pub use pipeline::{Pipeline, PipelineDefinition};

/// The version of the library, read from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
