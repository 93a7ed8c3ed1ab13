//! Operator descriptors, the demultiplexer and the orchestrator that sweeps them.

pub mod definition;
pub mod demuxer;
pub mod operators;
pub mod orchestrator;
pub mod traits;

#[cfg(test)]
mod orchestrator_tests;

pub use definition::PipelineDefinition;
pub use demuxer::{DemuxDefinition, DemuxField, DemuxTarget, Demuxer};
pub use operators::{
    Accumulate1D, EnumToFloat, Latest1D, Processor1D, Processor2D, Vec2ToMagnitude, Vec3ToMagnitude,
};
pub use orchestrator::Pipeline;
pub use traits::{ExecutionContext, Operator, PipelineStep};
