//! The raster pipeline: recover clean pixel art at native resolution.
//!
//! Stage order: alpha binarize → scale detection (unless overridden) →
//! grid-snap crop → morphological cleanup → pre-downscale quantization
//! (content-adaptive quantizes after instead) → downscale → finalize →
//! post-downscale quantization → jaggy cleanup → PNG encode → palette →
//! manifest. Each stage is optional and value-transforming; cancellation
//! is coarse-grained at stage boundaries (drop the call between stages).
use crate::cleanup;
use crate::detect::{self, snap};
use crate::downscale::{block, content_adaptive, dominant, DownscaleMethod};
use crate::error::EngineError;
use crate::image::{io, RasterRgba};
use crate::pipeline::manifest::{PipelineMode, ProcessingManifest};
use crate::pipeline::options::{PipelineOptions, DEFAULT_AUTO_COLOR_CAP};
use crate::quant;
use crate::types::Palette;
use log::debug;
use std::time::Instant;

/// Largest accepted edge length.
pub const MAX_DIMENSION: usize = 8000;
/// Largest accepted pixel count.
pub const MAX_PIXELS: usize = 10_000_000;

/// Result of one raster pipeline run.
#[derive(Clone, Debug)]
pub struct RasterOutput {
    /// Lossless PNG encoding of `raster`.
    pub png: Vec<u8>,
    pub raster: RasterRgba,
    pub palette: Palette,
    pub manifest: ProcessingManifest,
}

/// Run the raster pipeline on an encoded image payload.
pub fn process_image(bytes: &[u8], options: &PipelineOptions) -> Result<RasterOutput, EngineError> {
    let start = Instant::now();
    let source = io::decode_rgba(bytes).map_err(EngineError::Decode)?;
    process_decoded(source, options, start)
}

/// Run the raster pipeline on an already decoded raster.
pub fn process_raster(
    source: RasterRgba,
    options: &PipelineOptions,
) -> Result<RasterOutput, EngineError> {
    process_decoded(source, options, Instant::now())
}

fn process_decoded(
    source: RasterRgba,
    options: &PipelineOptions,
    start: Instant,
) -> Result<RasterOutput, EngineError> {
    if source.is_degenerate() {
        return Err(EngineError::Empty { stage: "input" });
    }
    if source.w > MAX_DIMENSION || source.h > MAX_DIMENSION || source.w * source.h > MAX_PIXELS {
        return Err(EngineError::Oversized {
            width: source.w,
            height: source.h,
        });
    }

    let original_size = [source.w, source.h];
    let colors_before = Palette::from_raster(&source).len();
    let mut stages: Vec<String> = Vec::new();
    let mut working = source;

    if let Some(cutoff) = options.alpha_threshold {
        working = cleanup::binarize_alpha(&working, cutoff);
        stages.push("alpha-binarize".into());
    }

    let (detected_scale, used_scale, scale_method) = match options.manual_scale {
        Some(manual) => (None, manual.max(1), "manual"),
        None => {
            let detection = detect::detect_scale(
                &working,
                options.detect_method,
                options.edge_detect_method,
            );
            debug!(
                "process_image: detected scale {} via {}",
                detection.scale, detection.method
            );
            (Some(detection.scale), detection.scale, detection.method)
        }
    };

    if options.snap_grid && used_scale > 1 {
        let snapped = snap::snap_to_grid(&working, used_scale);
        if snapped.applied {
            debug!(
                "process_image: grid snap offset ({}, {})",
                snapped.offset_x, snapped.offset_y
            );
            stages.push("snap-grid".into());
        }
        working = snapped.raster;
    }

    if options.cleanup.morph {
        working = cleanup::morph_cleanup(&working);
        stages.push("morph-cleanup".into());
    }

    let content_adaptive = options.downscale_method.is_content_adaptive();
    let color_target = resolve_color_target(&working, options);

    if !content_adaptive {
        working = apply_quantization(working, options, color_target, &mut stages);
    }

    if used_scale > 1 {
        working = match options.downscale_method {
            DownscaleMethod::ContentAdaptive => {
                let out_w = ((working.w as f32 / used_scale as f32).round() as usize).max(1);
                let out_h = ((working.h as f32 / used_scale as f32).round() as usize).max(1);
                content_adaptive::downscale(&working, out_w, out_h, options.em_iterations)
            }
            DownscaleMethod::Dominant => {
                dominant::downscale(&working, used_scale, options.dom_mean_threshold)
            }
            method => block::downscale(&working, used_scale, method),
        };
        if working.is_degenerate() {
            return Err(EngineError::Empty { stage: "downscale" });
        }
        stages.push("downscale".into());
    }

    cleanup::finalize_pixels(&mut working);
    stages.push("finalize".into());

    if content_adaptive {
        working = apply_quantization(working, options, color_target, &mut stages);
    }

    if options.cleanup.jaggy {
        working = cleanup::jaggy_cleanup(&working);
        stages.push("jaggy-cleanup".into());
    }

    if working.is_degenerate() {
        return Err(EngineError::Empty { stage: "cleanup" });
    }

    let png = io::encode_png(&working).map_err(EngineError::Encode)?;
    if png.is_empty() {
        return Err(EngineError::Empty { stage: "encode" });
    }

    let palette = Palette::from_raster(&working);
    let manifest = ProcessingManifest {
        mode: PipelineMode::Raster,
        original_size,
        final_size: [working.w, working.h],
        detected_scale,
        used_scale: Some(used_scale),
        scale_method: Some(scale_method.to_string()),
        colors_before,
        colors_after: palette.len(),
        stages,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok(RasterOutput {
        png,
        raster: working,
        palette,
        manifest,
    })
}

/// Resolve the color budget: fixed palette beats auto count beats the
/// explicit budget.
fn resolve_color_target(working: &RasterRgba, options: &PipelineOptions) -> Option<usize> {
    if options.fixed_palette.is_some() {
        return None;
    }
    if options.auto_color_count {
        let cap = options.max_colors.unwrap_or(DEFAULT_AUTO_COLOR_CAP);
        let count = quant::auto_color_count(working, cap);
        debug!("process_image: auto color count {count} (cap {cap})");
        return Some(count);
    }
    options.max_colors
}

fn apply_quantization(
    working: RasterRgba,
    options: &PipelineOptions,
    color_target: Option<usize>,
    stages: &mut Vec<String>,
) -> RasterRgba {
    if let Some(palette) = &options.fixed_palette {
        stages.push("quantize-fixed".into());
        return quant::remap(&working, palette);
    }
    match color_target {
        Some(n) if n > 0 => {
            stages.push("quantize".into());
            quant::quantize(&working, n)
        }
        _ => working,
    }
}
