use thiserror::Error;

/// Failure taxonomy of the engine.
///
/// Optional enhancement stages (pre/post filters, quantization) never
/// surface here — their failures are logged and the pipeline continues with
/// the pre-stage raster. Decode, trace and encode failures are fatal.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or unsupported image bytes.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Input exceeding the pipeline size limits; nothing was processed.
    #[error("image too large: {width}x{height}")]
    Oversized { width: usize, height: usize },

    /// A stage produced a zero-dimension raster. Distinct from bad input so
    /// callers can tell "bad file" from "bad settings".
    #[error("stage '{stage}' produced an empty result")]
    Empty { stage: &'static str },

    /// Lossless encoder failure.
    #[error("failed to encode result: {0}")]
    Encode(#[source] image::ImageError),

    /// Raster-to-vector tracing failure.
    #[error("vector tracing failed: {0}")]
    Trace(String),
}
