//! Downscaling strategies: block aggregation, dominant-color, and
//! content-adaptive EM kernel regression.
//!
//! All three shrink a raster by the detected scale factor. Block and
//! dominant assume an aligned integer grid; the content-adaptive path
//! handles noisy or non-integer grids at much higher cost.

pub mod block;
pub mod content_adaptive;
pub mod dominant;

use serde::{Deserialize, Serialize};

/// Aggregation strategy for shrinking by the detected scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownscaleMethod {
    /// Most frequent exact color per block, mean fallback.
    #[default]
    Dominant,
    /// Per-channel median per block.
    Median,
    /// Per-channel statistical mode per block.
    Mode,
    /// Per-channel mean per block.
    Mean,
    /// Center sample, no aggregation.
    Nearest,
    /// EM/SVD kernel regression (expensive, see [`content_adaptive`]).
    ContentAdaptive,
}

impl DownscaleMethod {
    pub fn is_content_adaptive(self) -> bool {
        matches!(self, DownscaleMethod::ContentAdaptive)
    }
}
