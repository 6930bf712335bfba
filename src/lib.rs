#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod error;
pub mod image;
pub mod pipeline;
pub mod types;

// “Expert” modules – still public, but considered unstable internals.
// (You can tighten or feature-gate these later.)
pub mod cleanup;
pub mod detect;
pub mod downscale;
pub mod ops;
pub mod quant;
pub mod stats;
pub mod trace;

// --- High-level re-exports -------------------------------------------------

// Main entry points: the two pipelines + results.
pub use crate::pipeline::{
    process_image, vectorize_image, PipelineOptions, RasterOutput, SessionCache, VectorOptions,
    VectorOutput,
};

// Shared result types.
pub use crate::error::EngineError;
pub use crate::pipeline::ProcessingManifest;
pub use crate::types::Palette;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use repixel::prelude::*;
///
/// # fn main() -> Result<(), EngineError> {
/// let bytes = std::fs::read("sprite.png").expect("readable file");
/// let output = process_image(&bytes, &PipelineOptions::default())?;
/// println!(
///     "{}x{} -> {}x{}, {} colors, {:.1} ms",
///     output.manifest.original_size[0],
///     output.manifest.original_size[1],
///     output.manifest.final_size[0],
///     output.manifest.final_size[1],
///     output.palette.len(),
///     output.manifest.elapsed_ms,
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::error::EngineError;
    pub use crate::image::RasterRgba;
    pub use crate::pipeline::{
        process_image, vectorize_image, PipelineOptions, RasterOutput, VectorOptions, VectorOutput,
    };
    pub use crate::types::Palette;
}
