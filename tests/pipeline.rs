//! End-to-end tests of the encode, pool and sequence-memory loop.

use cortical::prelude::*;

fn config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.spatial_pooler.column_dimensions = vec![256];
    config.spatial_pooler.num_active_columns_per_inh_area = 8;
    config.spatial_pooler.boost_strength = 0.0;
    config.temporal_memory = TemporalMemoryParams {
        column_dimensions: vec![256],
        cells_per_column: 4,
        activation_threshold: 6,
        min_threshold: 4,
        max_new_synapse_count: 8,
        max_segments_per_cell: 16,
        max_synapses_per_segment: 32,
        ..config.temporal_memory
    };
    config
}

/// Ten well-separated values, repeated.
fn cycle() -> impl Iterator<Item = Real> {
    (0..10).map(|i| i as Real * 10.0).cycle()
}

#[test]
fn test_repeating_signal_becomes_predictable() {
    let mut pipeline = HtmPipeline::new(config()).unwrap();

    pipeline.step(0.0, true).unwrap();
    assert_eq!(pipeline.anomaly(), 1.0);

    for value in cycle().skip(1).take(299) {
        pipeline.step(value, true).unwrap();
    }

    let mut total = 0.0;
    for value in cycle().take(10) {
        pipeline.step(value, true).unwrap();
        total += pipeline.anomaly();
    }
    assert!(total / 10.0 < 0.5, "mean anomaly {}", total / 10.0);
}

#[test]
fn test_active_cells_come_from_active_columns() {
    let mut pipeline = HtmPipeline::new(config()).unwrap();
    let cells_per_column = pipeline.temporal_memory().cells_per_column();

    for value in cycle().take(40) {
        let cells = pipeline.step(value, true).unwrap().to_vec();
        let columns = pipeline.active_columns().get_sparse();

        assert!(!cells.is_empty());
        for cell in cells {
            assert!(columns.binary_search(&(cell / cells_per_column)).is_ok());
        }
    }
}

#[test]
fn test_identical_configs_give_identical_runs() {
    let mut a = HtmPipeline::new(config()).unwrap();
    let mut b = HtmPipeline::new(config()).unwrap();

    let run_a = a.run(cycle().take(50), true).unwrap();
    let run_b = b.run(cycle().take(50), true).unwrap();
    assert_eq!(run_a, run_b);
    assert_eq!(a, b);
}

#[test]
fn test_saved_pipeline_resumes_identically() {
    let mut pipeline = HtmPipeline::new(config()).unwrap();
    pipeline.run(cycle().take(60), true).unwrap();

    let bytes = pipeline.to_bytes(SerializableFormat::Binary).unwrap();
    let mut restored = HtmPipeline::from_bytes(&bytes, SerializableFormat::Binary).unwrap();
    assert_eq!(pipeline, restored);

    for value in cycle().take(25) {
        let expected = pipeline.step(value, true).unwrap().to_vec();
        let actual = restored.step(value, true).unwrap().to_vec();
        assert_eq!(expected, actual);
    }
    assert_eq!(pipeline, restored);
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("cortical-config-{}.json", std::process::id()));
    config().save_to_file(&path, SerializableFormat::Json).unwrap();

    let loaded = PipelineConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded, config());
    assert!(HtmPipeline::new(loaded).is_ok());
}

#[test]
fn test_reset_starts_a_new_sequence() {
    let mut pipeline = HtmPipeline::new(config()).unwrap();
    pipeline.run(cycle().take(100), true).unwrap();

    pipeline.reset();
    assert!(pipeline.active_cells().is_empty());

    // With no context the first value cannot have been predicted.
    pipeline.step(30.0, false).unwrap();
    assert_eq!(pipeline.anomaly(), 1.0);
}
