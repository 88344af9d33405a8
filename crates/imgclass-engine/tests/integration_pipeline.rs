//! Integration tests for the complete classification pipeline

mod common;

use std::path::Path;

use common::{
    animal_categories, bright_dark_weights, create_temp_dir, output_lines, write_gray_png,
    write_weights,
};
use imgclass_engine::{
    load_raster, preprocess, BatchDriver, BatchPolicy, CategoryTable, FixedBackend,
    PipelineError, ReferenceBackend,
};

#[test]
fn test_gray_image_end_to_end() {
    let temp_dir = create_temp_dir();
    let gray = write_gray_png(temp_dir.path(), "gray.png", 2, 2, 128);

    let raster = load_raster(&gray).expect("Failed to load fixture");
    let tensor = preprocess(&raster).expect("Failed to preprocess");
    assert_eq!(tensor.len(), 12);
    assert!(tensor.as_slice().iter().all(|v| v.to_f32() == 0.0));

    let categories = animal_categories();
    let mut backend = FixedBackend::new(vec![0.1, 0.5, 0.3]).with_input_len(12);
    let mut out = Vec::new();
    let report = {
        let mut driver = BatchDriver::start(
            &mut backend,
            Path::new("unused.bin"),
            &categories,
            BatchPolicy::default(),
        )
        .expect("Failed to start driver");
        driver.run(&[&gray], &mut out).expect("Batch aborted")
    };

    assert!(report.is_success());
    assert_eq!(output_lines(&out), vec![format!("{},dog", gray.display())]);
    assert_eq!(report.results[0].index, 1);

    // The backend saw twelve zero half-precision values
    assert_eq!(backend.last_input(), &[0u8; 24][..]);
}

#[test]
fn test_batch_continues_past_missing_image() {
    let temp_dir = create_temp_dir();
    let first = write_gray_png(temp_dir.path(), "first.png", 4, 3, 10);
    let missing = temp_dir.path().join("missing.png");
    let second = write_gray_png(temp_dir.path(), "second.png", 4, 3, 200);

    let categories = animal_categories();
    let mut backend = FixedBackend::new(vec![0.9, 0.1, 0.0]);
    let mut out = Vec::new();
    let report = {
        let mut driver = BatchDriver::start(
            &mut backend,
            Path::new("unused.bin"),
            &categories,
            BatchPolicy::default(),
        )
        .unwrap();
        driver.run(&[&first, &missing, &second], &mut out).unwrap()
    };

    assert_eq!(
        output_lines(&out),
        vec![
            format!("{},cat", first.display()),
            format!("{},cat", second.display()),
        ]
    );
    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].path, missing);
    assert!(matches!(report.failures[0].error, PipelineError::ImageLoad { .. }));
    assert_eq!(backend.run_count(), 2);
}

#[test]
fn test_inference_failure_skips_only_that_image() {
    let temp_dir = create_temp_dir();
    let a = write_gray_png(temp_dir.path(), "a.png", 2, 2, 50);
    let b = write_gray_png(temp_dir.path(), "b.png", 2, 2, 60);

    let categories = animal_categories();
    let mut backend = FixedBackend::new(vec![0.0, 0.0, 1.0]).with_failing_runs([0]);
    let mut out = Vec::new();
    let report = {
        let mut driver = BatchDriver::start(
            &mut backend,
            Path::new("unused.bin"),
            &categories,
            BatchPolicy::default(),
        )
        .unwrap();
        driver.run(&[&a, &b], &mut out).unwrap()
    };

    assert_eq!(output_lines(&out), vec![format!("{},bird", b.display())]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, PipelineError::Inference(_)));
}

#[test]
fn test_fail_fast_stops_after_first_failure() {
    let temp_dir = create_temp_dir();
    let missing = temp_dir.path().join("missing.png");
    let valid = write_gray_png(temp_dir.path(), "valid.png", 2, 2, 128);

    let categories = animal_categories();
    let mut backend = FixedBackend::new(vec![0.1, 0.5, 0.3]);
    let mut out = Vec::new();
    let report = {
        let mut driver = BatchDriver::start(
            &mut backend,
            Path::new("unused.bin"),
            &categories,
            BatchPolicy { fail_fast: true },
        )
        .unwrap();
        driver.run(&[&missing, &valid, &valid], &mut out).unwrap()
    };

    assert!(out.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.processed(), 1);
    assert_eq!(backend.run_count(), 0);
}

#[test]
fn test_size_mismatch_is_per_image() {
    let temp_dir = create_temp_dir();
    let small = write_gray_png(temp_dir.path(), "small.png", 2, 2, 128);
    let large = write_gray_png(temp_dir.path(), "large.png", 4, 4, 128);

    let categories = animal_categories();
    let mut backend = FixedBackend::new(vec![0.1, 0.5, 0.3]).with_input_len(12);
    let mut out = Vec::new();
    let report = {
        let mut driver = BatchDriver::start(
            &mut backend,
            Path::new("unused.bin"),
            &categories,
            BatchPolicy::default(),
        )
        .unwrap();
        driver.run(&[&large, &small], &mut out).unwrap()
    };

    assert_eq!(output_lines(&out), vec![format!("{},dog", small.display())]);
    assert_eq!(report.failures.len(), 1);
    assert!(!report.failures[0].error.is_fatal());
}

#[test]
fn test_reference_backend_end_to_end() {
    let temp_dir = create_temp_dir();
    let weights = write_weights(temp_dir.path(), "net.bin", &bright_dark_weights(2, 2));
    let bright = write_gray_png(temp_dir.path(), "bright.png", 2, 2, 255);
    let dark = write_gray_png(temp_dir.path(), "dark.png", 2, 2, 0);

    let categories = CategoryTable::from_labels(["bright", "dark"]).unwrap();
    let mut backend = ReferenceBackend::new();
    let mut driver =
        BatchDriver::start(&mut backend, &weights, &categories, BatchPolicy::default()).unwrap();

    let mut out = Vec::new();
    let report = driver.run(&[&dark, &bright], &mut out).unwrap();

    assert!(report.is_success());
    assert_eq!(
        output_lines(&out),
        vec![
            format!("{},dark", dark.display()),
            format!("{},bright", bright.display()),
        ]
    );
}

#[test]
fn test_reference_backend_rejects_table_width() {
    let temp_dir = create_temp_dir();
    let weights = write_weights(temp_dir.path(), "net.bin", &bright_dark_weights(2, 2));

    let categories = animal_categories();
    let mut backend = ReferenceBackend::new();
    let err = BatchDriver::start(&mut backend, &weights, &categories, BatchPolicy::default())
        .err()
        .expect("Width mismatch should be fatal");

    assert!(matches!(
        err,
        PipelineError::ConfigMismatch { categories: 3, outputs: 2 }
    ));
}

#[test]
fn test_missing_weights_is_fatal_init() {
    let temp_dir = create_temp_dir();
    let categories = animal_categories();
    let mut backend = ReferenceBackend::new();

    let err = BatchDriver::start(
        &mut backend,
        &temp_dir.path().join("absent.bin"),
        &categories,
        BatchPolicy::default(),
    )
    .err()
    .expect("Missing weights should be fatal");

    assert!(err.is_fatal());
    assert!(err.to_string().starts_with("failed to load weights"));
}

#[test]
fn test_imagenet_table_matches_thousand_outputs() {
    let categories = CategoryTable::imagenet();
    let mut scores = vec![0.0f32; 1000];
    scores[281] = 4.2;

    let temp_dir = create_temp_dir();
    let image = write_gray_png(temp_dir.path(), "cat.png", 3, 3, 90);

    let mut backend = FixedBackend::new(scores);
    let mut driver = BatchDriver::start(
        &mut backend,
        Path::new("unused.bin"),
        &categories,
        BatchPolicy::default(),
    )
    .unwrap();

    let mut out = Vec::new();
    driver.run(&[&image], &mut out).unwrap();
    assert_eq!(output_lines(&out), vec![format!("{},tabby, tabby cat", image.display())]);
}
