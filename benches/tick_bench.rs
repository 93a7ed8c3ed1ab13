// In benches/tick_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stepflow::dataset::{StepFunction1D, StepFunction2D};
use stepflow::kernels::{merge, range_processor, RangeParams, Range2DParams};
use stepflow::pipeline::{Accumulate1D, Latest1D, Processor1D, Processor2D, Vec2ToMagnitude};
use stepflow::{AllocationConfig, Dataset, Pipeline};

const SAMPLES: usize = 4096;

/// Ascending timestamps with random gaps.
fn generate_timestamps(rng: &mut StdRng, len: usize) -> Vec<u64> {
    let mut t = 0;
    (0..len)
        .map(|_| {
            t += rng.random_range(1..16);
            t
        })
        .collect()
}

fn generate_values(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(-1.5..1.5)).collect()
}

/// A stick (2D) and two triggers (1D) feeding a processor/magnitude/accumulate/merge tick.
fn setup_tick() -> (Dataset, Pipeline) {
    let mut rng = StdRng::seed_from_u64(42);
    let config = AllocationConfig::new(
        vec![SAMPLES, SAMPLES, SAMPLES, SAMPLES, 2 * SAMPLES],
        vec![SAMPLES, SAMPLES, SAMPLES, SAMPLES, SAMPLES, SAMPLES, 2 * SAMPLES],
        vec![],
    );
    let mut dataset = Dataset::new(config).unwrap();

    let stick = StepFunction2D::new(0, 0, 1);
    let left = StepFunction1D::new(1, 2);
    let right = StepFunction1D::new(2, 3);
    let tilt = StepFunction1D::new(3, 4);
    let travel = StepFunction1D::new(3, 5);
    let triggers = StepFunction1D::new(4, 6);

    dataset.set_length(&stick, SAMPLES).unwrap();
    let timestamps = generate_timestamps(&mut rng, SAMPLES);
    dataset.timestamps_mut(&stick).unwrap().copy_from_slice(&timestamps);
    dataset.values_mut(&stick, 0).unwrap().copy_from_slice(&generate_values(&mut rng, SAMPLES));
    dataset.values_mut(&stick, 1).unwrap().copy_from_slice(&generate_values(&mut rng, SAMPLES));
    for trigger in [left, right] {
        dataset.set_length(&trigger, SAMPLES).unwrap();
        let timestamps = generate_timestamps(&mut rng, SAMPLES);
        dataset.timestamps_mut(&trigger).unwrap().copy_from_slice(&timestamps);
        dataset.values_mut(&trigger, 0).unwrap().copy_from_slice(&generate_values(&mut rng, SAMPLES));
    }

    let mut pipeline = Pipeline::default();
    pipeline
        .add_vec2_to_magnitude(Vec2ToMagnitude { src: stick, dst: tilt })
        .unwrap()
        .add_processor_1d(Processor1D::in_place(
            left,
            RangeParams {
                min_range: 0.1,
                max_range: 1.0,
                normalize: 1.0,
                process_as_abs: 1.0,
                ..RangeParams::default()
            },
        ))
        .unwrap()
        .add_processor_2d(Processor2D {
            slice: stick,
            params: Range2DParams {
                min_magnitude: 0.1,
                max_magnitude: 1.0,
                normalize: 1.0,
                ..Range2DParams::default()
            },
        })
        .unwrap()
        .add_accumulate_1d(Accumulate1D { src: tilt, dst: travel })
        .unwrap()
        .add_latest_1d(Latest1D { src1: left, src2: right, dst: triggers })
        .unwrap();

    (dataset, pipeline)
}

fn bench_tick(c: &mut Criterion) {
    let (mut dataset, mut pipeline) = setup_tick();

    let mut group = c.benchmark_group("Pipeline Tick");
    group.throughput(Throughput::Elements(SAMPLES as u64));
    group.bench_function("Full tick (map + execute)", |b| {
        b.iter(|| pipeline.run(black_box(&mut dataset)).unwrap())
    });
    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let src = generate_values(&mut rng, SAMPLES);
    let mut dst = vec![0.0f32; SAMPLES];
    let params = RangeParams {
        min_range: -1.0,
        max_range: 1.0,
        compare: 0.5,
        normalize: 0.5,
        ..RangeParams::default()
    };

    let t1 = generate_timestamps(&mut rng, SAMPLES);
    let t2 = generate_timestamps(&mut rng, SAMPLES);
    let v1 = generate_values(&mut rng, SAMPLES);
    let v2 = generate_values(&mut rng, SAMPLES);
    let mut out_t = vec![0u64; 2 * SAMPLES];
    let mut out_v = vec![0.0f32; 2 * SAMPLES];

    let mut group = c.benchmark_group("Kernels");
    group.throughput(Throughput::Elements(SAMPLES as u64));
    group.bench_function("Range processor 1D", |b| {
        b.iter(|| range_processor::process_1d(black_box(&src), &mut dst, &params))
    });
    group.bench_function("Latest merge", |b| {
        b.iter(|| merge::merge_latest(black_box(&t1), &v1, black_box(&t2), &v2, &mut out_t, &mut out_v))
    });
    group.finish();
}

criterion_group!(benches, bench_tick, bench_kernels);
criterion_main!(benches);
