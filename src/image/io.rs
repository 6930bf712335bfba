//! I/O helpers for RGBA rasters and JSON.
//!
//! - `decode_rgba`: decode PNG/JPEG/etc. bytes into a packed RGBA raster.
//! - `encode_png`: encode a raster as lossless PNG bytes.
//! - `load_rgba` / `save_png`: path-based variants for the CLI tools.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::RasterRgba;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Decode an in-memory image payload into a packed RGBA raster.
pub fn decode_rgba(bytes: &[u8]) -> Result<RasterRgba, image::ImageError> {
    let img = image::load_from_memory(bytes)?.into_rgba8();
    let w = img.width() as usize;
    let h = img.height() as usize;
    Ok(RasterRgba::from_raw(w, h, img.into_raw()))
}

/// Encode a raster as PNG bytes.
pub fn encode_png(raster: &RasterRgba) -> Result<Vec<u8>, image::ImageError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        &raster.data,
        raster.w as u32,
        raster.h as u32,
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Load an image from disk as packed RGBA.
pub fn load_rgba(path: &Path) -> Result<RasterRgba, String> {
    let bytes =
        fs::read(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    decode_rgba(&bytes).map_err(|e| format!("Failed to decode {}: {e}", path.display()))
}

/// Save a raster as a PNG file, creating parent directories.
pub fn save_png(raster: &RasterRgba, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let bytes = encode_png(raster)
        .map_err(|e| format!("Failed to encode {}: {e}", path.display()))?;
    fs::write(path, bytes).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
