//! Caller-owned session state.
//!
//! The engine itself is stateless; a host that re-runs pipelines while the
//! user tweaks options owns one of these instead of a global. It caches
//! the decoded source (decoding is paid once per payload) and the last
//! output per mode, and invalidates everything when the payload changes.
use crate::error::EngineError;
use crate::image::{io, RasterRgba};
use crate::pipeline::options::{PipelineOptions, VectorOptions};
use crate::pipeline::raster::{process_raster, RasterOutput};
use crate::pipeline::vector::{vectorize_raster, VectorOutput};

#[derive(Default)]
pub struct SessionCache {
    source: Option<(Vec<u8>, RasterRgba)>,
    last_raster: Option<RasterOutput>,
    last_vector: Option<VectorOutput>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the raster pipeline, reusing the cached decode when `bytes`
    /// matches the previous payload.
    pub fn process(
        &mut self,
        bytes: &[u8],
        options: &PipelineOptions,
    ) -> Result<&RasterOutput, EngineError> {
        let source = self.source_for(bytes)?;
        let output = process_raster(source, options)?;
        Ok(self.last_raster.insert(output))
    }

    /// Run the vector pipeline, reusing the cached decode when `bytes`
    /// matches the previous payload.
    pub fn vectorize(
        &mut self,
        bytes: &[u8],
        options: &VectorOptions,
    ) -> Result<&VectorOutput, EngineError> {
        let source = self.source_for(bytes)?;
        let output = vectorize_raster(source, options)?;
        Ok(self.last_vector.insert(output))
    }

    /// Most recent raster result, if any run succeeded for the current
    /// payload.
    pub fn last_raster(&self) -> Option<&RasterOutput> {
        self.last_raster.as_ref()
    }

    /// Most recent vector result, if any run succeeded for the current
    /// payload.
    pub fn last_vector(&self) -> Option<&VectorOutput> {
        self.last_vector.as_ref()
    }

    fn source_for(&mut self, bytes: &[u8]) -> Result<RasterRgba, EngineError> {
        if let Some((cached, raster)) = &self.source {
            if cached.as_slice() == bytes {
                return Ok(raster.clone());
            }
        }
        let raster = io::decode_rgba(bytes).map_err(EngineError::Decode)?;
        self.source = Some((bytes.to_vec(), raster.clone()));
        self.last_raster = None;
        self.last_vector = None;
        Ok(raster)
    }
}
