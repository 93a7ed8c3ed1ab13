// In: src/pipeline/orchestrator.rs

//! The pipeline orchestrator.
//!
//! A run is: pre-steps, the `Map` pass (length propagation), the `Execute` pass
//! (values), post-steps. Both passes sweep the operator lists in the fixed stage
//! order
//!
//! `demux -> enum_to_float -> vec2/vec3_to_magnitude -> processor_1d/2d -> accumulate_1d -> latest_1d`
//!
//! so a stage may consume anything an earlier stage wrote in the same run. The
//! first error stops the run.
//!
//! Demux output lengths depend on the snapshot contents, so the demux stage does
//! its whole job in the first pass of the run: `Map` when length propagation is
//! enabled, `Execute` otherwise.

use std::time::Instant;

use crate::config::PipelineSettings;
use crate::dataset::Dataset;
use crate::error::StepflowError;
use crate::pipeline::demuxer::{DemuxDefinition, Demuxer};
use crate::pipeline::operators::{
    Accumulate1D, EnumToFloat, Latest1D, Processor1D, Processor2D, Vec2ToMagnitude, Vec3ToMagnitude,
};
use crate::pipeline::traits::{ExecutionContext, Operator, PipelineStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Map,
    Execute,
}

impl Pass {
    fn name(self) -> &'static str {
        match self {
            Pass::Map => "map",
            Pass::Execute => "execute",
        }
    }
}

#[derive(Default)]
pub struct Pipeline {
    settings: PipelineSettings,
    lut: Vec<f32>,

    demuxers: Vec<Demuxer>,
    enum_to_float: Vec<EnumToFloat>,
    vec2_to_magnitude: Vec<Vec2ToMagnitude>,
    vec3_to_magnitude: Vec<Vec3ToMagnitude>,
    processors_1d: Vec<Processor1D>,
    processors_2d: Vec<Processor2D>,
    accumulators: Vec<Accumulate1D>,
    mergers: Vec<Latest1D>,

    pre_steps: Vec<Box<dyn PipelineStep>>,
    post_steps: Vec<Box<dyn PipelineStep>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .field("lut_len", &self.lut.len())
            .field("demuxers", &self.demuxers.len())
            .field("enum_to_float", &self.enum_to_float)
            .field("vec2_to_magnitude", &self.vec2_to_magnitude)
            .field("vec3_to_magnitude", &self.vec3_to_magnitude)
            .field("processors_1d", &self.processors_1d)
            .field("processors_2d", &self.processors_2d)
            .field("accumulators", &self.accumulators)
            .field("mergers", &self.mergers)
            .field("pre_steps", &self.pre_steps.len())
            .field("post_steps", &self.post_steps.len())
            .finish()
    }
}

/// Generates the validating `add_*` registration method of one operator list.
macro_rules! register_operator {
    ($method:ident, $list:ident, $op:ty) => {
        pub fn $method(&mut self, op: $op) -> Result<&mut Self, StepflowError> {
            op.validate()?;
            self.$list.push(op);
            Ok(self)
        }
    };
}

//==============================================================================
// 1. Construction
//==============================================================================

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Replaces the lookup table used by the enum to float stage.
    pub fn set_lut(&mut self, lut: Vec<f32>) -> &mut Self {
        self.lut = lut;
        self
    }

    register_operator!(add_enum_to_float, enum_to_float, EnumToFloat);
    register_operator!(add_vec2_to_magnitude, vec2_to_magnitude, Vec2ToMagnitude);
    register_operator!(add_vec3_to_magnitude, vec3_to_magnitude, Vec3ToMagnitude);
    register_operator!(add_processor_1d, processors_1d, Processor1D);
    register_operator!(add_processor_2d, processors_2d, Processor2D);
    register_operator!(add_accumulate_1d, accumulators, Accumulate1D);
    register_operator!(add_latest_1d, mergers, Latest1D);

    /// Registers a demuxer and returns its index for [`Pipeline::demuxer_mut`].
    pub fn add_demuxer(&mut self, definition: DemuxDefinition) -> Result<usize, StepflowError> {
        self.demuxers.push(Demuxer::new(definition)?);
        Ok(self.demuxers.len() - 1)
    }

    /// Access to a demuxer, to stage snapshots before a run.
    pub fn demuxer_mut(&mut self, index: usize) -> Option<&mut Demuxer> {
        self.demuxers.get_mut(index)
    }

    pub fn add_pre_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.pre_steps.push(Box::new(step));
        self
    }

    pub fn add_post_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.post_steps.push(Box::new(step));
        self
    }

    /// Total number of registered operators, demuxers included.
    pub fn operator_count(&self) -> usize {
        self.demuxers.len()
            + self.enum_to_float.len()
            + self.vec2_to_magnitude.len()
            + self.vec3_to_magnitude.len()
            + self.processors_1d.len()
            + self.processors_2d.len()
            + self.accumulators.len()
            + self.mergers.len()
    }
}

//==============================================================================
// 2. Execution
//==============================================================================

impl Pipeline {
    /// Runs pre-steps, `Map` (if length propagation is enabled), `Execute` and post-steps.
    pub fn run(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        let start = Instant::now();
        run_steps(&mut self.pre_steps, "pre", dataset)?;
        if self.settings.propagate_lengths {
            self.map(dataset)?;
        }
        self.execute(dataset)?;
        run_steps(&mut self.post_steps, "post", dataset)?;

        log_metric!(
            "event" = "run",
            "operators" = &self.operator_count(),
            "elapsed_us" = &start.elapsed().as_micros()
        );
        Ok(())
    }

    /// The length propagation pass. Runs the demuxers when length propagation is enabled.
    pub fn map(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        if self.settings.propagate_lengths {
            self.run_demuxers(dataset, Pass::Map)?;
        }
        let log_timings = self.settings.log_stage_timings;
        let pass = Pass::Map;
        run_stage(&self.enum_to_float, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.vec2_to_magnitude, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.vec3_to_magnitude, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.processors_1d, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.processors_2d, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.accumulators, pass, log_timings, |op| op.map(dataset))?;
        run_stage(&self.mergers, pass, log_timings, |op| op.map(dataset))
    }

    /// The value pass. Runs the demuxers when length propagation is disabled.
    pub fn execute(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        if !self.settings.propagate_lengths {
            self.run_demuxers(dataset, Pass::Execute)?;
        }
        let log_timings = self.settings.log_stage_timings;
        let pass = Pass::Execute;
        let context = ExecutionContext { lut: &self.lut };
        run_stage(&self.enum_to_float, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.vec2_to_magnitude, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.vec3_to_magnitude, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.processors_1d, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.processors_2d, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.accumulators, pass, log_timings, |op| op.execute(dataset, &context))?;
        run_stage(&self.mergers, pass, log_timings, |op| op.execute(dataset, &context))
    }

    fn run_demuxers(&mut self, dataset: &mut Dataset, pass: Pass) -> Result<(), StepflowError> {
        if self.demuxers.is_empty() {
            return Ok(());
        }
        let start = self.settings.log_stage_timings.then(Instant::now);
        let mut emitted = 0;
        for demuxer in &mut self.demuxers {
            emitted += demuxer.run(dataset)?;
        }
        if let Some(start) = start {
            log::info!(
                "  - {} pass | stage {:<18} | operators: {} | samples: {} | time: {:.2?}",
                pass.name(),
                Demuxer::NAME,
                self.demuxers.len(),
                emitted,
                start.elapsed()
            );
        }
        Ok(())
    }
}

/// Applies `f` to every operator of one stage, stopping at the first error.
fn run_stage<O, F>(ops: &[O], pass: Pass, log_timings: bool, mut f: F) -> Result<(), StepflowError>
where
    O: Operator,
    F: FnMut(&O) -> Result<(), StepflowError>,
{
    if ops.is_empty() {
        return Ok(());
    }
    log::debug!("{} pass: stage {} with {} operators", pass.name(), O::NAME, ops.len());

    let start = log_timings.then(Instant::now);
    for op in ops {
        f(op)?;
    }
    if let Some(start) = start {
        let duration = start.elapsed();
        log::info!(
            "  - {} pass | stage {:<18} | operators: {} | time: {:.2?}",
            pass.name(),
            O::NAME,
            ops.len(),
            duration
        );
        log_metric!(
            "event" = "stage",
            "pass" = pass.name(),
            "stage" = O::NAME,
            "elapsed_us" = &duration.as_micros()
        );
    }
    Ok(())
}

fn run_steps(
    steps: &mut [Box<dyn PipelineStep>],
    phase: &str,
    dataset: &mut Dataset,
) -> Result<(), StepflowError> {
    for (i, step) in steps.iter_mut().enumerate() {
        step.run(dataset).map_err(|e| StepflowError::Step {
            stage: format!("{}[{}] {}", phase, i, step.name()),
            source: Box::new(e),
        })?;
    }
    Ok(())
}
