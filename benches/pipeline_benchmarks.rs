//! Benchmarks for the per-timestep hot paths.
//!
//! Run with: `cargo bench --bench pipeline_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cortical::prelude::*;

// =============================================================================
// SDR
// =============================================================================

fn bench_sdr_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("sdr_overlap");
    let mut rng = Random::new(42);

    for (size, sparsity) in [(2048u32, 0.02f32), (2048, 0.10), (65536, 0.02)] {
        let mut a = Sdr::new(&[size]);
        let mut b = Sdr::new(&[size]);
        a.randomize(sparsity, &mut rng);
        b.randomize(sparsity, &mut rng);

        group.throughput(Throughput::Elements(a.get_sum() as u64 * 2));
        group.bench_with_input(
            BenchmarkId::new(format!("size_{size}"), sparsity),
            &(&a, &b),
            |bench, (a, b)| bench.iter(|| black_box(a.get_overlap(b))),
        );
    }
    group.finish();
}

// =============================================================================
// Encoder
// =============================================================================

fn bench_rdse_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("rdse_encode");

    for size in [100u32, 1000, 4000] {
        let encoder = RandomDistributedScalarEncoder::new(RdseParams {
            size,
            sparsity: 0.05,
            resolution: 0.5,
            seed: 1,
            ..Default::default()
        })
        .unwrap();
        let mut out = Sdr::new(&[size]);
        let mut value = 0.0;

        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| {
                value += 0.37;
                encoder.encode(black_box(value), &mut out).unwrap();
            });
        });
    }
    group.finish();
}

// =============================================================================
// Spatial pooler
// =============================================================================

fn bench_spatial_pooler(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_pooler_compute");
    group.sample_size(50);

    for (global, label) in [(true, "global"), (false, "local")] {
        let mut sp = SpatialPooler::new(SpatialPoolerParams {
            input_dimensions: vec![32, 32],
            column_dimensions: vec![32, 32],
            potential_radius: 8,
            global_inhibition: global,
            local_area_density: 0.02,
            ..Default::default()
        })
        .unwrap();
        let mut rng = Random::new(7);
        let inputs: Vec<Sdr> = (0..16)
            .map(|_| {
                let mut sdr = Sdr::new(&[32, 32]);
                sdr.randomize(0.05, &mut rng);
                sdr
            })
            .collect();
        let mut out = Sdr::new(&[32, 32]);
        let mut i = 0;

        group.bench_function(label, |b| {
            b.iter(|| {
                i = (i + 1) % inputs.len();
                sp.compute(&inputs[i], true, &mut out).unwrap();
            });
        });
    }
    group.finish();
}

// =============================================================================
// Temporal memory
// =============================================================================

fn bench_temporal_memory(c: &mut Criterion) {
    let mut group = c.benchmark_group("temporal_memory_compute");
    group.sample_size(50);

    let mut tm = TemporalMemory::new(TemporalMemoryParams {
        column_dimensions: vec![2048],
        cells_per_column: 16,
        ..Default::default()
    })
    .unwrap();
    let mut rng = Random::new(3);
    let sequence: Vec<Sdr> = (0..20)
        .map(|_| {
            let mut sdr = Sdr::new(&[2048]);
            sdr.randomize(0.02, &mut rng);
            sdr
        })
        .collect();

    // Learn the sequence first so the benchmark sees predicted columns.
    for _ in 0..10 {
        for columns in &sequence {
            tm.compute(columns, true).unwrap();
        }
    }

    let mut i = 0;
    group.bench_function("learned_sequence", |b| {
        b.iter(|| {
            i = (i + 1) % sequence.len();
            tm.compute(&sequence[i], true).unwrap();
        });
    });
    group.finish();
}

// =============================================================================
// Full timestep
// =============================================================================

fn bench_pipeline_step(c: &mut Criterion) {
    let mut pipeline = HtmPipeline::new(PipelineConfig::default()).unwrap();
    let mut t: Real = 0.0;

    c.bench_function("pipeline_step_hot_gym", |b| {
        b.iter(|| {
            t += 0.1;
            let value = 50.0 + 40.0 * t.sin();
            black_box(pipeline.step(value, true).unwrap().len());
        });
    });
}

criterion_group!(sdr_benches, bench_sdr_overlap);
criterion_group!(encoder_benches, bench_rdse_encode);
criterion_group!(algorithm_benches, bench_spatial_pooler, bench_temporal_memory);
criterion_group!(pipeline_benches, bench_pipeline_step);

criterion_main!(sdr_benches, encoder_benches, algorithm_benches, pipeline_benches);
