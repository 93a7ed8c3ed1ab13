//! Serializable pipeline definitions.
//!
//! A `PipelineDefinition` lists the operators of every stage, the enum lookup
//! table and the demux field tables. It can be written by hand as JSON and is
//! turned into a runnable [`Pipeline`] by [`PipelineDefinition::build`], which
//! validates every descriptor on the way in.

use serde::{Deserialize, Serialize};

use crate::config::PipelineSettings;
use crate::error::StepflowError;
use crate::pipeline::demuxer::DemuxDefinition;
use crate::pipeline::operators::{
    Accumulate1D, EnumToFloat, Latest1D, Processor1D, Processor2D, Vec2ToMagnitude, Vec3ToMagnitude,
};
use crate::pipeline::orchestrator::Pipeline;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineDefinition {
    pub settings: PipelineSettings,
    pub lut: Vec<f32>,
    pub demuxers: Vec<DemuxDefinition>,
    pub enum_to_float: Vec<EnumToFloat>,
    pub vec2_to_magnitude: Vec<Vec2ToMagnitude>,
    pub vec3_to_magnitude: Vec<Vec3ToMagnitude>,
    pub processors_1d: Vec<Processor1D>,
    pub processors_2d: Vec<Processor2D>,
    pub accumulators: Vec<Accumulate1D>,
    pub mergers: Vec<Latest1D>,
}

impl PipelineDefinition {
    pub fn from_json_str(json: &str) -> Result<Self, StepflowError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, StepflowError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates every descriptor and assembles the pipeline.
    pub fn build(self) -> Result<Pipeline, StepflowError> {
        let mut pipeline = Pipeline::new(self.settings);
        pipeline.set_lut(self.lut);
        for definition in self.demuxers {
            pipeline.add_demuxer(definition)?;
        }
        for op in self.enum_to_float {
            pipeline.add_enum_to_float(op)?;
        }
        for op in self.vec2_to_magnitude {
            pipeline.add_vec2_to_magnitude(op)?;
        }
        for op in self.vec3_to_magnitude {
            pipeline.add_vec3_to_magnitude(op)?;
        }
        for op in self.processors_1d {
            pipeline.add_processor_1d(op)?;
        }
        for op in self.processors_2d {
            pipeline.add_processor_2d(op)?;
        }
        for op in self.accumulators {
            pipeline.add_accumulate_1d(op)?;
        }
        for op in self.mergers {
            pipeline.add_latest_1d(op)?;
        }
        log::info!(
            "Built pipeline with {} operators (propagate_lengths: {})",
            pipeline.operator_count(),
            pipeline.settings().propagate_lengths
        );
        Ok(pipeline)
    }
}
