//! Morphological open/close with a 2×2 structuring element.
//!
//! Erode takes the per-channel minimum over the 2×2 window anchored at each
//! pixel, dilate the maximum. OPEN (erode then dilate) removes specks
//! smaller than the element; CLOSE (dilate then erode) fills pinholes.
use crate::image::RasterRgba;

fn window_2x2(image: &RasterRgba, x: usize, y: usize, maximum: bool) -> [u8; 4] {
    let x1 = (x + 1).min(image.w - 1);
    let y1 = (y + 1).min(image.h - 1);
    let samples = [
        image.pixel(x, y),
        image.pixel(x1, y),
        image.pixel(x, y1),
        image.pixel(x1, y1),
    ];
    let mut out = samples[0];
    for px in &samples[1..] {
        for c in 0..4 {
            out[c] = if maximum {
                out[c].max(px[c])
            } else {
                out[c].min(px[c])
            };
        }
    }
    out
}

/// Per-channel 2×2 minimum.
pub fn erode(image: &RasterRgba) -> RasterRgba {
    if image.is_degenerate() {
        return image.clone();
    }
    RasterRgba::from_fn(image.w, image.h, |x, y| window_2x2(image, x, y, false))
}

/// Per-channel 2×2 maximum.
pub fn dilate(image: &RasterRgba) -> RasterRgba {
    if image.is_degenerate() {
        return image.clone();
    }
    RasterRgba::from_fn(image.w, image.h, |x, y| window_2x2(image, x, y, true))
}

/// Morphological OPEN: erode then dilate.
pub fn open(image: &RasterRgba) -> RasterRgba {
    dilate(&erode(image))
}

/// Morphological CLOSE: dilate then erode.
pub fn close(image: &RasterRgba) -> RasterRgba {
    erode(&dilate(image))
}
