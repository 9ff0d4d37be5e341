use std::path::PathBuf;

use crate::idt_pipeline::colour::{
    OptimisationSpace, ReferenceColourChecker, ReferenceColourCheckerId,
};
use crate::idt_pipeline::common::{IdtError, Stage};
use crate::idt_pipeline::config::{CaptureSet, DecodingConfig, DecodingMethod, IdtConfig};
use crate::idt_pipeline::image::RgbImage;
use crate::idt_pipeline::pipeline::IdtPipeline;
use crate::idt_pipeline::sampler::{ChartGeometry, PatchRegion, RawSample, SamplerOutput};
use crate::idt_pipeline::testing::{
    MockImageSource, reference_aces_rgb, render_chart, synthetic_capture,
};

/// Per-channel sensitivity of the synthetic camera, its white point.
const CAMERA_GAINS: [f64; 3] = [0.8, 1.0, 1.3];

/// Affine encoding of the synthetic camera.
fn encode(aces: [f64; 3]) -> [f64; 3] {
    [0, 1, 2].map(|c| 0.1 * CAMERA_GAINS[c] * aces[c] + 0.05)
}

fn to_f32(rgb: [f64; 3]) -> [f32; 3] {
    rgb.map(|v| v as f32)
}

/// Checker photographs at each EV plus one grey-card photograph.
fn synthetic_shoot(evs: &[f64]) -> (MockImageSource, CaptureSet) {
    let geometry = ChartGeometry::default();
    let reference = reference_aces_rgb();
    let mut source = MockImageSource::new().with_image(
        "grey.tiff",
        RgbImage::filled(64, 64, to_f32(encode([0.18; 3]))),
    );
    let mut captures = CaptureSet::new().with_grey_card(vec![PathBuf::from("grey.tiff")]);

    for &ev in evs {
        let colours: Vec<[f32; 3]> = reference
            .iter()
            .map(|rgb| to_f32(encode(rgb.map(|v| v * ev.exp2()))))
            .collect();
        let path = PathBuf::from(format!("checker_{ev}.tiff"));
        source = source.with_image(path.clone(), render_chart(&geometry, 120, 80, &colours, [0.0; 3]));
        captures = captures.with_exposure(format!("{ev:+} stops"), vec![path]);
    }
    (source, captures)
}

fn config() -> IdtConfig {
    IdtConfig::builder()
        .camera_model("Synthetic Camera")
        .lut_size(256)
        .decoding(DecodingConfig {
            method: DecodingMethod::Median,
            ev_range: vec![-2.0, 0.0, 2.0],
            ev_weights: None,
        })
        .build()
        .unwrap()
}

#[test]
fn test_end_to_end_synthetic_checker() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let pipeline = IdtPipeline::with_custom(source, config(), ChartGeometry::default()).unwrap();

    let outcome = pipeline.run(&captures).unwrap();

    let lut = &outcome.decoding_lut;
    assert_eq!(lut.camera_model, "Synthetic Camera");
    assert_eq!(lut.size(), 256);
    for channel in &lut.lut.channels {
        assert!(channel.is_monotonic());
    }

    let result = &outcome.optimisation;
    assert!(result.converged);
    assert!(result.delta_e < 1e-3, "delta E {}", result.delta_e);

    // white balance undoes the camera's channel sensitivities
    let ratio = result.rgb_w[2] / result.rgb_w[0];
    let expected = CAMERA_GAINS[0] / CAMERA_GAINS[2];
    assert!((ratio - expected).abs() < 1e-3, "ratio {ratio}, expected {expected}");
    assert!(result.white_point_error < 1e-6);

    assert_eq!(outcome.decoded.exposures, [-2.0, 0.0, 2.0]);
    assert!(!outcome.decoded.grey_from_checker);
    assert!(outcome.merge.overwritten.is_empty());
}

#[test]
fn test_decode_reproduces_fitted_linear_values() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let config = IdtConfig::builder()
        .lut_size(512)
        .decoding_method(DecodingMethod::PerChannel)
        .build()
        .unwrap();
    let outcome = IdtPipeline::with_custom(source, config, ChartGeometry::default())
        .unwrap()
        .run(&captures)
        .unwrap();

    let reference = reference_aces_rgb();
    let neutrals = pipeline_neutrals();
    for ev in [-2.0f64, 0.0, 2.0] {
        for patch in neutrals.clone() {
            let linear = reference[patch].map(|v| v * ev.exp2());
            let decoded = outcome.decoding_lut.apply_rgb(encode(linear));
            for c in 0..3 {
                assert!(
                    (decoded[c] - linear[c]).abs() < 1e-4,
                    "patch {patch} at {ev}: {} vs {}",
                    decoded[c],
                    linear[c]
                );
            }
        }
    }
}

fn pipeline_neutrals() -> std::ops::Range<usize> {
    ReferenceColourChecker::load(ReferenceColourCheckerId::ColorChecker24).neutrals
}

#[test]
fn test_timings_cover_every_stage() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let outcome = IdtPipeline::with_custom(source, config(), ChartGeometry::default())
        .unwrap()
        .run(&captures)
        .unwrap();

    let stages: Vec<Stage> = outcome.timings.stages().iter().map(|s| s.stage).collect();
    assert_eq!(
        stages,
        [
            Stage::Sampler,
            Stage::Sorter,
            Stage::LutBuilder,
            Stage::LutFilter,
            Stage::Decoder,
            Stage::Optimiser
        ]
    );
}

#[test]
fn test_duplicate_exposures_are_reported() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let captures = CaptureSet {
        colour_checker: captures
            .colour_checker
            .into_iter()
            .rev()
            .chain([(String::from("-2"), vec![PathBuf::from(format!("checker_{}.tiff", -2.0))])])
            .collect(),
        ..captures
    };

    let outcome = IdtPipeline::with_custom(source, config(), ChartGeometry::default())
        .unwrap()
        .run(&captures)
        .unwrap();

    assert_eq!(outcome.merge.overwritten.len(), 1);
    assert_eq!(outcome.merge.overwritten[0].kept, "-2");
    assert_eq!(outcome.merge.accepted.len(), 3);
}

#[test]
fn test_grey_card_falls_back_to_checker() {
    let config = IdtConfig::builder()
        .optimisation_space(OptimisationSpace::Ipt)
        .lut_size(256)
        .build()
        .unwrap();
    let pipeline =
        IdtPipeline::with_custom(MockImageSource::new(), config, ChartGeometry::default()).unwrap();

    let capture = synthetic_capture(&[-1.0, 0.0, 1.0], encode);
    let with_card = pipeline
        .characterise(SamplerOutput {
            grey_card: Some(RawSample::uniform(encode([0.18; 3]), 100)),
            ..capture.clone()
        })
        .unwrap();
    let fallback = pipeline.characterise(capture).unwrap();

    assert!(fallback.decoded.grey_from_checker);
    assert!(!with_card.decoded.grey_from_checker);

    let (expected, result) = (&with_card.optimisation, &fallback.optimisation);
    assert!((result.k - expected.k).abs() < 1e-9, "k {} vs {}", result.k, expected.k);
    for c in 0..3 {
        assert!(
            (result.rgb_w[c] - expected.rgb_w[c]).abs() < 1e-9,
            "rgb_w {:?} vs {:?}",
            result.rgb_w,
            expected.rgb_w
        );
    }
    assert!((result.m - expected.m).abs().max() < 1e-6);
    assert!((result.delta_e - expected.delta_e).abs() < 1e-6);
}

#[test]
fn test_missing_image_fails_before_sampling() {
    let (_, captures) = synthetic_shoot(&[0.0]);
    let pipeline =
        IdtPipeline::with_custom(MockImageSource::new(), config(), ChartGeometry::default()).unwrap();
    match pipeline.run(&captures) {
        Err(IdtError::InputReadError(message)) => {
            assert!(message.contains("File does not exist"), "{message}")
        }
        other => panic!("expected a missing file error, got {other:?}"),
    }
}

#[test]
fn test_mixed_file_types_are_rejected() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let source = source.with_image("grey.arw", RgbImage::filled(8, 8, [0.1; 3]));
    let captures = captures.with_grey_card(vec![PathBuf::from("grey.arw")]);

    let pipeline = IdtPipeline::with_custom(source, config(), ChartGeometry::default()).unwrap();
    assert!(matches!(pipeline.run(&captures), Err(IdtError::InvalidConfig(_))));
}

#[test]
fn test_tif_and_tiff_count_as_one_file_type() {
    let (source, captures) = synthetic_shoot(&[-2.0, 0.0, 2.0]);
    let source = source.with_image(
        "grey.TIF",
        RgbImage::filled(64, 64, to_f32(encode([0.18; 3]))),
    );
    let captures = captures.with_grey_card(vec![PathBuf::from("grey.TIF")]);

    let pipeline = IdtPipeline::with_custom(source, config(), ChartGeometry::default()).unwrap();
    assert!(pipeline.run(&captures).is_ok());
}

#[test]
fn test_missing_reference_exposure_fails() {
    let (source, captures) = synthetic_shoot(&[1.0, 3.0]);
    let pipeline = IdtPipeline::with_custom(source, config(), ChartGeometry::default()).unwrap();
    assert!(matches!(
        pipeline.run(&captures),
        Err(IdtError::MissingReferenceExposure(_))
    ));
}

#[test]
fn test_flat_camera_fails_in_lut_builder() {
    let pipeline =
        IdtPipeline::with_custom(MockImageSource::new(), config(), ChartGeometry::default()).unwrap();
    let result = pipeline.characterise(synthetic_capture(&[-2.0, 0.0, 2.0], |_| [0.4; 3]));
    assert!(matches!(
        result,
        Err(IdtError::InsufficientSamples {
            stage: Stage::LutBuilder,
            ..
        })
    ));
}

#[test]
fn test_invalid_geometry_fails_at_construction() {
    let geometry = ChartGeometry::grid(4, 5, PatchRegion::FULL_FRAME, 0.5);
    let result = IdtPipeline::with_custom(MockImageSource::new(), config(), geometry);
    assert!(matches!(result, Err(IdtError::InvalidConfig(_))));
}

#[test]
fn test_invalid_config_fails_at_construction() {
    let mut config = config();
    config.lut.size = 0;
    let result = IdtPipeline::with_custom(MockImageSource::new(), config, ChartGeometry::default());
    assert!(matches!(result, Err(IdtError::InvalidConfig(_))));
}
