//! Diagnostic record of one pipeline run.
//!
//! Purely informational: emitted alongside the result, never consumed by
//! the engine itself.
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    Raster,
    Vector,
}

/// What happened during one run: sizes, scale decision, color counts, the
/// stages that actually executed (in order) and wall-clock time.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingManifest {
    pub mode: PipelineMode,
    pub original_size: [usize; 2],
    pub final_size: [usize; 2],
    /// Detected block size; `None` when detection did not run (vector mode
    /// or manual override).
    pub detected_scale: Option<u32>,
    /// Scale the pipeline actually divided by.
    pub used_scale: Option<u32>,
    /// Strategy that produced the scale: "runs", "edge" or "manual".
    pub scale_method: Option<String>,
    /// Distinct opaque colors before quantization.
    pub colors_before: usize,
    /// Distinct opaque colors in the final output.
    pub colors_after: usize,
    /// Stage names in execution order, skipped stages absent.
    pub stages: Vec<String>,
    pub elapsed_ms: f64,
}
