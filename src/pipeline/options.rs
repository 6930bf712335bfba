//! Option types configuring the two pipelines.
//!
//! Every tunable is an explicit field with an explicit default; there are
//! no hidden knobs. The structs deserialize from the JSON configs the CLI
//! tools read.

use crate::detect::{DetectMethod, EdgeMode};
use crate::downscale::content_adaptive::DEFAULT_ITERATIONS;
use crate::downscale::dominant::DEFAULT_DOMINANCE;
use crate::downscale::DownscaleMethod;
use crate::trace::TracerOptions;
use serde::Deserialize;

/// Cap used by auto color counting when no explicit budget is given.
pub const DEFAULT_AUTO_COLOR_CAP: usize = 16;

/// Configuration of the raster pipeline.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Color budget for quantization; `None` disables quantization.
    pub max_colors: Option<usize>,
    /// Estimate the real color count from image content, capped by
    /// `max_colors` (or [`DEFAULT_AUTO_COLOR_CAP`]).
    pub auto_color_count: bool,
    /// Skip detection and use this scale factor.
    pub manual_scale: Option<u32>,
    pub detect_method: DetectMethod,
    pub edge_detect_method: EdgeMode,
    pub downscale_method: DownscaleMethod,
    /// Share of opaque block pixels the dominant color must reach.
    pub dom_mean_threshold: f32,
    pub cleanup: CleanupOptions,
    /// Binarize alpha at this cutoff before anything else; `None` disables.
    pub alpha_threshold: Option<u8>,
    /// Align the detected grid to pixel boundaries before downscaling.
    pub snap_grid: bool,
    /// EM rounds for the content-adaptive downscaler.
    pub em_iterations: usize,
    /// Externally supplied palette: skips palette construction, remaps only.
    pub fixed_palette: Option<Vec<[u8; 3]>>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_colors: None,
            auto_color_count: false,
            manual_scale: None,
            detect_method: DetectMethod::Auto,
            edge_detect_method: EdgeMode::Tiled,
            downscale_method: DownscaleMethod::Dominant,
            dom_mean_threshold: DEFAULT_DOMINANCE,
            cleanup: CleanupOptions::default(),
            alpha_threshold: None,
            snap_grid: true,
            em_iterations: DEFAULT_ITERATIONS,
            fixed_palette: None,
        }
    }
}

/// Cleanup toggles of the raster pipeline.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// 2×2 morphological open + close before downscaling.
    pub morph: bool,
    /// Isolated-diagonal pixel removal after downscaling.
    pub jaggy: bool,
}

/// Configuration of the vector pipeline.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorOptions {
    pub pre_process: PreProcessOptions,
    pub quantize: QuantizeOptions,
    pub post_process: PostProcessOptions,
    pub tracer: TracerOptions,
}

/// Smoothing applied before quantization.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreProcessOptions {
    pub enabled: bool,
    pub filter: PreFilter,
    /// Filter strength: bilateral spatial sigma, or median radius.
    pub value: f32,
    /// Morphological gap-fill (2×2 close) after the filter.
    pub morphology: bool,
}

impl Default for PreProcessOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: PreFilter::Bilateral,
            value: 2.0,
            morphology: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreFilter {
    #[default]
    Bilateral,
    Median,
}

/// Palette reduction feeding the tracer.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuantizeOptions {
    pub enabled: bool,
    /// Fixed color count; `None` auto-detects, capped by
    /// [`DEFAULT_AUTO_COLOR_CAP`].
    pub max_colors: Option<usize>,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            max_colors: None,
        }
    }
}

/// Smoothing applied between quantization and tracing.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostProcessOptions {
    pub enabled: bool,
    pub filter: PostFilter,
    /// Filter strength: median radius, or Gaussian passes.
    pub value: f32,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: PostFilter::Median,
            value: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostFilter {
    #[default]
    Median,
    Gaussian,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_from_partial_json() {
        let json = r#"{
            "maxColors": 4,
            "downscaleMethod": "content-adaptive",
            "detectMethod": "runs",
            "cleanup": { "jaggy": true }
        }"#;
        let options: PipelineOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.max_colors, Some(4));
        assert_eq!(options.downscale_method, DownscaleMethod::ContentAdaptive);
        assert_eq!(options.detect_method, DetectMethod::Runs);
        assert!(options.cleanup.jaggy);
        assert!(!options.cleanup.morph);
        assert!(options.snap_grid, "defaults apply to omitted fields");
    }

    #[test]
    fn vector_options_defaults() {
        let options: VectorOptions = serde_json::from_str("{}").unwrap();
        assert!(options.quantize.enabled);
        assert!(options.quantize.max_colors.is_none());
        assert!(!options.pre_process.enabled);
        assert_eq!(options.tracer.scale, 1.0);
    }
}
