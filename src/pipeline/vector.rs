//! The vector pipeline: smooth, quantize and trace a raster into SVG.
//!
//! Sources with transparency are composited onto a solid "key" background
//! first (blurring and quantizing against transparency produces edge
//! halos); the key color is chosen to collide with nothing in the image
//! and its path is removed from the traced document afterwards.
//!
//! Pre/post filters and quantization are enhancements: when one fails it
//! is logged and the pipeline continues with the previous raster. Tracing
//! itself is fatal on failure.
use crate::error::EngineError;
use crate::image::{io, RasterRgba};
use crate::ops::filters::{bilateral_filter, gaussian_blur_rgba, median_filter};
use crate::ops::morphology;
use crate::pipeline::manifest::{PipelineMode, ProcessingManifest};
use crate::pipeline::options::{PostFilter, PreFilter, VectorOptions, DEFAULT_AUTO_COLOR_CAP};
use crate::pipeline::raster::{MAX_DIMENSION, MAX_PIXELS};
use crate::quant;
use crate::trace;
use crate::types::Palette;
use log::{debug, warn};
use std::collections::HashSet;
use std::time::Instant;

/// Result of one vector pipeline run.
#[derive(Clone, Debug)]
pub struct VectorOutput {
    /// SVG document with one path per realized color.
    pub svg: String,
    /// Fill colors actually present in the document.
    pub palette: Palette,
    pub manifest: ProcessingManifest,
}

/// Run the vector pipeline on an encoded image payload.
pub fn vectorize_image(bytes: &[u8], options: &VectorOptions) -> Result<VectorOutput, EngineError> {
    let start = Instant::now();
    let source = io::decode_rgba(bytes).map_err(EngineError::Decode)?;
    vectorize_decoded(source, options, start)
}

/// Run the vector pipeline on an already decoded raster.
pub fn vectorize_raster(
    source: RasterRgba,
    options: &VectorOptions,
) -> Result<VectorOutput, EngineError> {
    vectorize_decoded(source, options, Instant::now())
}

fn vectorize_decoded(
    source: RasterRgba,
    options: &VectorOptions,
    start: Instant,
) -> Result<VectorOutput, EngineError> {
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

    let key_color = if source.fully_opaque() {
        None
    } else {
        Some(pick_key_color(&source))
    };
    let mut working = match key_color {
        Some(key) => {
            debug!("vectorize_image: compositing onto key background {key:?}");
            stages.push("key-background".into());
            composite_on_key(&source, key)
        }
        None => source,
    };

    if options.pre_process.enabled {
        let value = options.pre_process.value;
        working = optional_stage("pre-filter", working, &mut stages, |img| match options
            .pre_process
            .filter
        {
            PreFilter::Bilateral => bilateral_filter(img, value.max(0.5), 12.0 * value.max(0.5)),
            PreFilter::Median => median_filter(img, value.round().max(1.0) as usize),
        });
        if options.pre_process.morphology {
            working = optional_stage("gap-fill", working, &mut stages, morphology::close);
        }
    }

    if options.quantize.enabled {
        let target = options
            .quantize
            .max_colors
            .unwrap_or_else(|| quant::auto_color_count(&working, DEFAULT_AUTO_COLOR_CAP));
        let palette = quant::build_palette(&working, target);
        if palette.is_empty() {
            warn!("vectorize_image: quantization found no opaque colors, skipping");
        } else {
            working = quant::remap(&working, &palette);
            stages.push("quantize".into());
        }
    }

    // The exact palette fed to the tracer, captured before post-smoothing
    // can drift pixels off it.
    let tracer_palette = Palette::from_raster(&working);

    if options.post_process.enabled {
        let value = options.post_process.value;
        working = optional_stage("post-filter", working, &mut stages, |img| match options
            .post_process
            .filter
        {
            PostFilter::Median => median_filter(img, value.round().max(1.0) as usize),
            PostFilter::Gaussian => {
                let mut out = img.clone();
                for _ in 0..value.round().max(1.0) as usize {
                    out = gaussian_blur_rgba(&out);
                }
                out
            }
        });
    }

    let mut svg = trace::trace_raster(&working, &tracer_palette, &options.tracer)?;
    stages.push("trace".into());

    if let Some(key) = key_color {
        let realized_key = nearest_palette_color(key, &tracer_palette);
        svg = trace::remove_fill(&svg, realized_key);
        stages.push("key-removal".into());
    }

    let palette = trace::palette_from_svg(&svg);
    let manifest = ProcessingManifest {
        mode: PipelineMode::Vector,
        original_size,
        final_size: [working.w, working.h],
        detected_scale: None,
        used_scale: None,
        scale_method: None,
        colors_before,
        colors_after: palette.len(),
        stages,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok(VectorOutput {
        svg,
        palette,
        manifest,
    })
}

/// Run an enhancement stage, falling back to its input when it produces an
/// empty raster.
fn optional_stage(
    name: &'static str,
    input: RasterRgba,
    stages: &mut Vec<String>,
    stage: impl FnOnce(&RasterRgba) -> RasterRgba,
) -> RasterRgba {
    let out = stage(&input);
    if out.is_degenerate() && !input.is_degenerate() {
        warn!("vectorize_image: stage '{name}' produced an empty raster, keeping previous output");
        return input;
    }
    stages.push(name.into());
    out
}

/// A solid background color guaranteed not to collide with any source
/// color, so its traced path can be matched and removed exactly.
fn pick_key_color(image: &RasterRgba) -> [u8; 3] {
    let present: HashSet<[u8; 3]> = image
        .pixels()
        .map(|px| [px[0], px[1], px[2]])
        .collect();
    for candidate in [[255u8, 0, 255], [0, 255, 254], [1, 254, 2]] {
        if !present.contains(&candidate) {
            return candidate;
        }
    }
    // All candidates taken: walk magenta shades until one is free.
    for b in 0..=255u8 {
        let candidate = [254, 1, b];
        if !present.contains(&candidate) {
            return candidate;
        }
    }
    [255, 0, 255]
}

/// Alpha-blend every pixel over an opaque key background.
fn composite_on_key(image: &RasterRgba, key: [u8; 3]) -> RasterRgba {
    RasterRgba::from_fn(image.w, image.h, |x, y| {
        let px = image.pixel(x, y);
        let a = px[3] as f32 / 255.0;
        [
            (px[0] as f32 * a + key[0] as f32 * (1.0 - a)).round() as u8,
            (px[1] as f32 * a + key[1] as f32 * (1.0 - a)).round() as u8,
            (px[2] as f32 * a + key[2] as f32 * (1.0 - a)).round() as u8,
            255,
        ]
    })
}

/// The palette entry the key color landed on after quantization.
fn nearest_palette_color(key: [u8; 3], palette: &Palette) -> [u8; 4] {
    if palette.is_empty() {
        return [key[0], key[1], key[2], 255];
    }
    let entries: Vec<[u8; 3]> = palette
        .colors
        .iter()
        .map(|c| [c[0], c[1], c[2]])
        .collect();
    palette.colors[crate::quant::nearest_index(key, &entries)]
}
