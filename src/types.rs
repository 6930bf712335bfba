use crate::image::RasterRgba;
use serde::Serialize;

/// Ordered set of distinct RGBA colors, deduplicated by exact byte match.
/// Order is insertion order from a deterministic top-left scan.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Palette {
    pub colors: Vec<[u8; 4]>,
}

impl Palette {
    /// Derive the palette from a raster's pixels. Fully transparent pixels
    /// carry no color and are skipped, so an empty raster yields an empty
    /// palette.
    pub fn from_raster(raster: &RasterRgba) -> Self {
        let mut colors: Vec<[u8; 4]> = Vec::new();
        for px in raster.pixels() {
            if px[3] == 0 {
                continue;
            }
            if !colors.contains(&px) {
                colors.push(px);
            }
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
