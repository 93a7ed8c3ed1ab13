// In: src/pipeline/orchestrator_tests.rs

use std::cell::Cell;
use std::rc::Rc;

use super::*;
use crate::config::{AllocationConfig, PipelineSettings};
use crate::dataset::{Dataset, StepFunction1D, StepFunction2D, StepFunction3D, StepFunctionInt};
use crate::error::StepflowError;
use crate::kernels::demux::{BitField, SourceEncoding};
use crate::kernels::RangeParams;

//==============================================================================
// Helpers
//==============================================================================

fn fill(ds: &mut Dataset, sf: &StepFunction1D, timestamps: &[u64], values: &[f32]) {
    ds.set_length(sf, timestamps.len()).unwrap();
    ds.timestamps_mut(sf).unwrap().copy_from_slice(timestamps);
    ds.values_mut(sf, 0).unwrap().copy_from_slice(values);
}

/// Demux -> enum -> processor -> accumulate over one button field.
fn button_chain(settings: PipelineSettings) -> Pipeline {
    let raw = StepFunctionInt::new(0, 0);
    let level = StepFunction1D::new(0, 0);
    let total = StepFunction1D::new(1, 1);

    let mut pipeline = Pipeline::new(settings);
    pipeline.set_lut(vec![0.0, 10.0, 20.0, 30.0]);
    pipeline
        .add_demuxer(DemuxDefinition {
            snapshot_words: 1,
            fields: vec![DemuxField {
                bits: BitField::span(0, 2),
                source: SourceEncoding::UnsignedBits,
                target: DemuxTarget::Int(raw),
            }],
        })
        .unwrap();
    // Registered out of stage order on purpose: the stage order still applies.
    pipeline
        .add_accumulate_1d(Accumulate1D { src: level, dst: total })
        .unwrap()
        .add_processor_1d(Processor1D::in_place(
            level,
            RangeParams {
                min_range: 0.0,
                max_range: 20.0,
                normalize: 1.0,
                ..RangeParams::default()
            },
        ))
        .unwrap()
        .add_enum_to_float(EnumToFloat {
            src: raw,
            dst: level,
            mask: 0b11,
            lut_offset: 0,
        })
        .unwrap();
    pipeline
}

fn stage_button_snapshots(pipeline: &mut Pipeline) {
    let demuxer = pipeline.demuxer_mut(0).unwrap();
    for (t, word) in [(1, 1), (2, 1), (3, 3), (4, 0b110)] {
        demuxer.push_snapshot(t, &[word]).unwrap();
    }
}

fn button_dataset() -> Dataset {
    Dataset::new(AllocationConfig::new(vec![8, 8], vec![8, 8], vec![32])).unwrap()
}

//==============================================================================
// Examples
//==============================================================================

#[test]
fn test_merge_example() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![2, 2, 4], vec![2, 2, 4], vec![])).unwrap();
    let a = StepFunction1D::new(0, 0);
    let b = StepFunction1D::new(1, 1);
    let c = StepFunction1D::new(2, 2);
    fill(&mut ds, &a, &[1, 3], &[10.0, 30.0]);
    fill(&mut ds, &b, &[2, 3], &[20.0, 40.0]);

    let mut pipeline = Pipeline::default();
    pipeline.add_latest_1d(Latest1D { src1: a, src2: b, dst: c }).unwrap();
    pipeline.run(&mut ds).unwrap();

    assert_eq!(ds.length(&c).unwrap(), 4);
    assert_eq!(ds.timestamps(&c).unwrap(), &[1, 2, 3, 3]);
    assert_eq!(ds.values_x(&c).unwrap(), &[10.0, 20.0, 30.0, 40.0]);
}

#[test]
fn test_range_processor_example() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![2, 2], vec![2, 2], vec![])).unwrap();
    let src = StepFunction1D::new(0, 0);
    let dst = StepFunction1D::new(1, 1);
    fill(&mut ds, &src, &[10, 20], &[3.5, -2.0]);

    let mut pipeline = Pipeline::default();
    pipeline
        .add_processor_1d(Processor1D {
            src,
            dst,
            params: RangeParams {
                min_range: 0.0,
                max_range: 7.0,
                compare: 0.0,
                normalize: 1.0,
                scale: 1.0,
                offset: 0.0,
                process_as_abs: 0.0,
                ..RangeParams::default()
            },
        })
        .unwrap();
    pipeline.run(&mut ds).unwrap();

    assert_eq!(ds.values_x(&dst).unwrap(), &[0.5, 0.0]);
    assert_eq!(ds.timestamps(&dst).unwrap(), &[10, 20]);
}

#[test]
fn test_magnitude_examples() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![1, 1, 1, 1], vec![1; 7], vec![])).unwrap();
    let v2 = StepFunction2D::new(0, 0, 1);
    let v3 = StepFunction3D::new(1, 2, 3, 4);
    let m2 = StepFunction1D::new(2, 5);
    let m3 = StepFunction1D::new(3, 6);

    ds.set_length(&v2, 1).unwrap();
    ds.values_mut(&v2, 0).unwrap()[0] = 3.0;
    ds.values_mut(&v2, 1).unwrap()[0] = 4.0;
    ds.set_length(&v3, 1).unwrap();
    ds.values_mut(&v3, 0).unwrap()[0] = 1.0;
    ds.values_mut(&v3, 1).unwrap()[0] = 2.0;
    ds.values_mut(&v3, 2).unwrap()[0] = 2.0;

    let mut pipeline = Pipeline::default();
    pipeline
        .add_vec2_to_magnitude(Vec2ToMagnitude { src: v2, dst: m2 })
        .unwrap()
        .add_vec3_to_magnitude(Vec3ToMagnitude { src: v3, dst: m3 })
        .unwrap();
    pipeline.run(&mut ds).unwrap();

    assert_eq!(ds.values_x(&m2).unwrap(), &[5.0]);
    assert_eq!(ds.values_x(&m3).unwrap(), &[3.0]);
}

#[test]
fn test_processor_2d_in_place() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![1], vec![1, 1], vec![])).unwrap();
    let stick = StepFunction2D::new(0, 0, 1);
    ds.set_length(&stick, 1).unwrap();
    ds.values_mut(&stick, 0).unwrap()[0] = 3.0;
    ds.values_mut(&stick, 1).unwrap()[0] = 4.0;

    let mut pipeline = Pipeline::default();
    pipeline
        .add_processor_2d(Processor2D {
            slice: stick,
            params: crate::kernels::Range2DParams::default(),
        })
        .unwrap();
    pipeline.run(&mut ds).unwrap();

    assert!((ds.values_x(&stick).unwrap()[0] - 0.6).abs() < 1e-6);
    assert!((ds.values_y(&stick).unwrap()[0] - 0.8).abs() < 1e-6);
}

//==============================================================================
// Stage order and passes
//==============================================================================

#[test]
fn test_full_chain_follows_stage_order() {
    let mut ds = button_dataset();
    let mut pipeline = button_chain(PipelineSettings::default());
    stage_button_snapshots(&mut pipeline);
    pipeline.run(&mut ds).unwrap();

    let level = StepFunction1D::new(0, 0);
    let total = StepFunction1D::new(1, 1);
    // t=2 repeats t=1 and emits nothing.
    assert_eq!(ds.timestamps(&level).unwrap(), &[1, 3, 4]);
    assert_eq!(ds.values_x(&level).unwrap(), &[0.5, 1.0, 1.0]);
    assert_eq!(ds.timestamps(&total).unwrap(), &[1, 3, 4]);
    assert_eq!(ds.values_x(&total).unwrap(), &[0.5, 1.5, 2.5]);
}

#[test]
fn test_demux_runs_in_execute_without_length_propagation() {
    let mut ds = button_dataset();
    let settings = PipelineSettings {
        propagate_lengths: false,
        log_stage_timings: true,
    };
    let mut pipeline = button_chain(settings);
    stage_button_snapshots(&mut pipeline);

    // Without the map pass the caller owns every non-demux length.
    let total = StepFunction1D::new(1, 1);
    ds.set_length(&total, 3).unwrap();
    pipeline.run(&mut ds).unwrap();

    assert_eq!(ds.values_x(&total).unwrap(), &[0.5, 1.5, 2.5]);
    assert_eq!(pipeline.demuxer_mut(0).unwrap().staged_snapshots(), 0);
}

#[test]
fn test_second_run_without_snapshots_clears_demux_outputs() {
    let mut ds = button_dataset();
    let mut pipeline = button_chain(PipelineSettings::default());
    stage_button_snapshots(&mut pipeline);
    pipeline.run(&mut ds).unwrap();
    pipeline.run(&mut ds).unwrap();

    assert_eq!(ds.length(&StepFunction1D::new(0, 0)).unwrap(), 0);
    assert_eq!(ds.length(&StepFunction1D::new(1, 1)).unwrap(), 0);
}

//==============================================================================
// Steps and errors
//==============================================================================

struct FillInput;

impl PipelineStep for FillInput {
    fn name(&self) -> &str {
        "fill_input"
    }

    fn run(&mut self, dataset: &mut Dataset) -> Result<(), StepflowError> {
        let input = StepFunction1D::new(0, 0);
        dataset.set_length(&input, 3)?;
        dataset.timestamps_mut(&input)?.copy_from_slice(&[1, 2, 3]);
        dataset.values_mut(&input, 0)?.copy_from_slice(&[2.0, 2.0, 2.0]);
        Ok(())
    }
}

#[test]
fn test_pre_and_post_steps_bracket_the_run() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![4, 4], vec![4, 4], vec![])).unwrap();
    let output = StepFunction1D::new(1, 1);
    let seen = Rc::new(Cell::new(0.0f32));
    let seen_by_step = Rc::clone(&seen);

    let mut pipeline = Pipeline::default();
    pipeline
        .add_accumulate_1d(Accumulate1D {
            src: StepFunction1D::new(0, 0),
            dst: output,
        })
        .unwrap();
    pipeline.add_pre_step(FillInput);
    pipeline.add_post_step(move |ds: &mut Dataset| -> Result<(), StepflowError> {
        let values = ds.values_x(&output)?;
        seen_by_step.set(values[values.len() - 1]);
        Ok(())
    });
    pipeline.run(&mut ds).unwrap();

    assert_eq!(seen.get(), 6.0);
}

#[test]
fn test_failing_step_is_wrapped_and_stops_the_run() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![4], vec![4], vec![])).unwrap();
    let post_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&post_runs);

    let mut pipeline = Pipeline::default();
    pipeline.add_pre_step(|_: &mut Dataset| -> Result<(), StepflowError> {
        Err(StepflowError::InvalidDescriptor("boom".to_string()))
    });
    pipeline.add_post_step(move |_: &mut Dataset| -> Result<(), StepflowError> {
        counter.set(counter.get() + 1);
        Ok(())
    });

    match pipeline.run(&mut ds) {
        Err(StepflowError::Step { stage, source }) => {
            assert!(stage.starts_with("pre[0]"));
            assert!(matches!(*source, StepflowError::InvalidDescriptor(_)));
        }
        other => panic!("expected a step error, got {:?}", other),
    }
    assert_eq!(post_runs.get(), 0);
}

#[test]
fn test_capacity_violation_stops_before_execute() {
    let mut ds = Dataset::new(AllocationConfig::new(vec![2, 2, 3], vec![2, 2, 3], vec![])).unwrap();
    let a = StepFunction1D::new(0, 0);
    let b = StepFunction1D::new(1, 1);
    let c = StepFunction1D::new(2, 2);
    fill(&mut ds, &a, &[1, 2], &[1.0, 2.0]);
    fill(&mut ds, &b, &[1, 2], &[3.0, 4.0]);

    let mut pipeline = Pipeline::default();
    pipeline.add_latest_1d(Latest1D { src1: a, src2: b, dst: c }).unwrap();

    assert!(matches!(
        pipeline.run(&mut ds),
        Err(StepflowError::CapacityExceeded { axis: 2, requested: 4, capacity: 3 })
    ));
    assert_eq!(ds.length(&c).unwrap(), 0);
}

#[test]
fn test_lut_overflow_surfaces_from_execute() {
    let mut ds = button_dataset();
    let mut pipeline = button_chain(PipelineSettings::default());
    // Field values reach 3 but the table only covers 0..=1.
    pipeline.set_lut(vec![0.0, 1.0]);
    stage_button_snapshots(&mut pipeline);

    assert!(matches!(
        pipeline.run(&mut ds),
        Err(StepflowError::LutIndexOutOfBounds { index: 3, lut_len: 2 })
    ));
}
