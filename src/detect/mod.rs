//! Scale detection: how many source pixels wide is one logical pixel?
//!
//! Two independent strategies, selectable or auto-combined:
//! - [`runs`] — run-length analysis over rows and columns; fast and exact on
//!   clean pixel art.
//! - [`edge_peaks`] — Sobel-profile peak spacing, for sources with
//!   resampling noise where run lengths no longer agree.
//!
//! The detector is total: degenerate input (flat, empty) yields scale 1,
//! never an error. [`snap`] holds the grid-snap cropper that aligns the
//! detected grid to pixel boundaries.

pub mod edge_peaks;
pub mod runs;
pub mod snap;

use crate::image::RasterRgba;
use crate::ops::grayscale;
use log::debug;
use serde::{Deserialize, Serialize};

/// Pixel budget above which edge detection hands over to run-length
/// analysis for cost control.
const EDGE_DETECT_MAX_PIXELS: usize = 8_000_000;

/// Which detection strategy to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectMethod {
    /// Run-length first; fall back to edge peaks when runs see no signal.
    #[default]
    Auto,
    Runs,
    Edge,
}

/// Sub-mode of the gradient-peak detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeMode {
    /// 3×3 grid of overlapping tiles, final scale by vote.
    #[default]
    Tiled,
    /// Single centered region of interest.
    Legacy,
}

/// Outcome of scale detection, with the strategy that actually produced it.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ScaleDetection {
    pub scale: u32,
    pub method: &'static str,
}

/// Detect the integer block size of `image`. Always returns `scale >= 1`.
pub fn detect_scale(image: &RasterRgba, method: DetectMethod, edge_mode: EdgeMode) -> ScaleDetection {
    match method {
        DetectMethod::Runs => ScaleDetection {
            scale: runs::detect(image),
            method: "runs",
        },
        DetectMethod::Edge => detect_edge(image, edge_mode),
        DetectMethod::Auto => {
            let by_runs = runs::detect(image);
            if by_runs > 1 {
                ScaleDetection {
                    scale: by_runs,
                    method: "runs",
                }
            } else {
                debug!("detect_scale: run-length signal too weak, trying edge peaks");
                detect_edge(image, edge_mode)
            }
        }
    }
}

fn detect_edge(image: &RasterRgba, edge_mode: EdgeMode) -> ScaleDetection {
    if image.w * image.h > EDGE_DETECT_MAX_PIXELS {
        debug!(
            "detect_scale: {}x{} exceeds edge-detect budget, using runs",
            image.w, image.h
        );
        return ScaleDetection {
            scale: runs::detect(image),
            method: "runs",
        };
    }
    let gray = grayscale(image);
    ScaleDetection {
        scale: edge_peaks::detect(&gray, edge_mode),
        method: "edge",
    }
}
