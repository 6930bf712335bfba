mod common;

use common::synthetic_image::{block_mosaic, random_blocks, transparent};
use repixel::detect::runs;
use repixel::downscale::DownscaleMethod;
use repixel::error::EngineError;
use repixel::image::io::encode_png;
use repixel::pipeline::{process_image, process_raster, PipelineOptions, SessionCache};

#[test]
fn run_length_detection_recovers_block_size() {
    for k in [1usize, 2, 3, 4, 8, 16] {
        let cells = 48 / k.min(16) + 4;
        let image = random_blocks(k, cells, 0xBEEF);
        assert_eq!(
            runs::detect(&image),
            k as u32,
            "expected run-length detection to return {k}"
        );
    }
}

#[test]
fn four_color_mosaic_restores_to_native_resolution() {
    let colors = [
        [200u8, 40, 40, 255],
        [40, 200, 40, 255],
        [40, 40, 200, 255],
        [220, 220, 40, 255],
    ];
    let image = block_mosaic(32, 8, &colors); // 256x256
    let options = PipelineOptions {
        max_colors: Some(4),
        downscale_method: DownscaleMethod::Dominant,
        snap_grid: true,
        ..Default::default()
    };
    let output = process_raster(image, &options).expect("pipeline should succeed");

    assert_eq!(output.manifest.detected_scale, Some(32));
    assert_eq!(output.manifest.final_size, [8, 8]);
    assert_eq!(
        output.palette.len(),
        4,
        "palette: {:?}",
        output.palette.colors
    );
    assert!(!output.png.is_empty());
    // Every restored pixel is one of the four source colors.
    for px in output.raster.pixels() {
        assert!(colors.contains(&px), "unexpected color {px:?}");
    }
}

#[test]
fn all_transparent_input_is_not_an_error() {
    let image = transparent(64, 64);
    let output =
        process_raster(image, &PipelineOptions::default()).expect("transparency is valid input");
    assert!(output.palette.is_empty());
    assert!(output.raster.pixels().all(|px| px == [0, 0, 0, 0]));
    assert_eq!(output.manifest.final_size, [64, 64]);
}

#[test]
fn oversized_input_is_rejected_before_processing() {
    let image = repixel::image::RasterRgba::new(8001, 2);
    match process_raster(image, &PipelineOptions::default()) {
        Err(EngineError::Oversized { width, height }) => {
            assert_eq!((width, height), (8001, 2));
        }
        other => panic!("expected Oversized, got {other:?}", other = other.err()),
    }
}

#[test]
fn encoded_payload_round_trips_through_decode() {
    let colors = [[10u8, 10, 10, 255], [240, 240, 240, 255]];
    let image = block_mosaic(8, 6, &colors);
    let png = encode_png(&image).expect("encodable");

    let output = process_image(&png, &PipelineOptions::default()).expect("pipeline on png bytes");
    assert_eq!(output.manifest.original_size, [48, 48]);
    assert_eq!(output.manifest.detected_scale, Some(8));
    assert_eq!(output.manifest.final_size, [6, 6]);
    assert_eq!(output.palette.len(), 2);
}

#[test]
fn malformed_bytes_fail_with_decode_error() {
    let result = process_image(b"definitely not an image", &PipelineOptions::default());
    assert!(matches!(result, Err(EngineError::Decode(_))));
}

#[test]
fn content_adaptive_path_produces_target_size() {
    let colors = [[200u8, 40, 40, 255], [40, 40, 200, 255]];
    let image = block_mosaic(8, 6, &colors);
    let options = PipelineOptions {
        downscale_method: DownscaleMethod::ContentAdaptive,
        max_colors: Some(2),
        snap_grid: false,
        ..Default::default()
    };
    let output = process_raster(image, &options).expect("content-adaptive pipeline");
    assert_eq!(output.manifest.final_size, [6, 6]);
    assert!(output.palette.len() <= 2);
}

#[test]
fn manual_scale_overrides_detection() {
    let colors = [[0u8, 0, 0, 255], [255, 255, 255, 255]];
    let image = block_mosaic(4, 8, &colors); // 32x32 of 4px blocks
    let options = PipelineOptions {
        manual_scale: Some(2),
        snap_grid: false,
        ..Default::default()
    };
    let output = process_raster(image, &options).expect("manual scale");
    assert_eq!(output.manifest.detected_scale, None);
    assert_eq!(output.manifest.used_scale, Some(2));
    assert_eq!(output.manifest.scale_method.as_deref(), Some("manual"));
    assert_eq!(output.manifest.final_size, [16, 16]);
}

#[test]
fn session_cache_reuses_decoded_source() {
    let colors = [[10u8, 10, 10, 255], [240, 240, 240, 255]];
    let png = encode_png(&block_mosaic(8, 6, &colors)).expect("encodable");

    let mut session = SessionCache::new();
    let first = session
        .process(&png, &PipelineOptions::default())
        .expect("first run")
        .manifest
        .final_size;
    assert_eq!(first, [6, 6]);
    // Second run with different options reuses the cached decode.
    let options = PipelineOptions {
        manual_scale: Some(4),
        ..Default::default()
    };
    let second = session.process(&png, &options).expect("second run");
    assert_eq!(second.manifest.final_size, [12, 12]);
    assert!(session.last_raster().is_some());
}
