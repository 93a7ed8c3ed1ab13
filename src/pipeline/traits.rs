//! Defines the behavioral traits for pipeline operators and user steps.

use crate::dataset::Dataset;
use crate::error::StepflowError;

/// Read-only state shared by every operator of one `Execute` pass.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// Lookup table of the enum to float stage.
    pub lut: &'a [f32],
}

/// A stateless transform descriptor.
///
/// `map` propagates lengths (the destination length follows from the source
/// lengths) without touching values. `execute` then writes exactly that many
/// samples to the destination regions. Both passes address the dataset through
/// the descriptor's step functions only.
pub trait Operator {
    /// Stage name used in logs and errors.
    const NAME: &'static str;

    /// Rejects descriptors that can never run correctly. Called on registration.
    fn validate(&self) -> Result<(), StepflowError> {
        Ok(())
    }

    fn map(&self, dataset: &mut Dataset) -> Result<(), StepflowError>;

    fn execute(&self, dataset: &mut Dataset, context: &ExecutionContext<'_>) -> Result<(), StepflowError>;
}

/// A caller-supplied callback run before or after the passes of a pipeline run.
pub trait PipelineStep {
    fn name(&self) -> &str {
        "step"
    }

    fn run(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError>;
}

impl<F> PipelineStep for F
where
    F: FnMut(&mut Dataset) -> Result<(), StepflowError>,
{
    fn run(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        self(dataset)
    }
}
