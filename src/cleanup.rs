//! Cleanup stages applied around downscaling: morphological open/close,
//! isolated-diagonal ("jaggy") removal, alpha thresholding and the final
//! opacity normalization.
use crate::image::RasterRgba;
use crate::ops::morphology;

const OPAQUE_CUTOFF: u8 = 128;

/// Morphological OPEN then CLOSE with the 2×2 element: removes small
/// specks, then fills small gaps.
pub fn morph_cleanup(image: &RasterRgba) -> RasterRgba {
    morphology::close(&morphology::open(image))
}

/// Remove opaque pixels that touch no orthogonal opaque neighbor and
/// exactly one diagonal opaque neighbor — pure isolated-diagonal
/// artifacts left behind by block aggregation.
pub fn jaggy_cleanup(image: &RasterRgba) -> RasterRgba {
    let mut out = image.clone();
    if image.is_degenerate() {
        return out;
    }
    let opaque_at = |x: isize, y: isize| -> bool {
        if x < 0 || y < 0 || x >= image.w as isize || y >= image.h as isize {
            return false;
        }
        image.pixel(x as usize, y as usize)[3] >= OPAQUE_CUTOFF
    };
    for y in 0..image.h {
        for x in 0..image.w {
            if image.pixel(x, y)[3] < OPAQUE_CUTOFF {
                continue;
            }
            let (xi, yi) = (x as isize, y as isize);
            let orthogonal = [(0, -1), (0, 1), (-1, 0), (1, 0)]
                .iter()
                .filter(|&&(dx, dy)| opaque_at(xi + dx, yi + dy))
                .count();
            if orthogonal > 0 {
                continue;
            }
            let diagonal = [(-1, -1), (1, -1), (-1, 1), (1, 1)]
                .iter()
                .filter(|&&(dx, dy)| opaque_at(xi + dx, yi + dy))
                .count();
            if diagonal == 1 {
                out.set_pixel(x, y, [0, 0, 0, 0]);
            }
        }
    }
    out
}

/// Threshold alpha to fully opaque / fully transparent at `cutoff`.
pub fn binarize_alpha(image: &RasterRgba, cutoff: u8) -> RasterRgba {
    let mut out = image.clone();
    for px in out.data.chunks_exact_mut(4) {
        px[3] = if px[3] >= cutoff { 255 } else { 0 };
    }
    out
}

/// Final normalization before encoding, in place: pixels below 50% opacity
/// become zeroed black-transparent, everything else fully opaque. No
/// semi-transparent pixel survives. Idempotent.
pub fn finalize_pixels(image: &mut RasterRgba) {
    for px in image.data.chunks_exact_mut(4) {
        if px[3] < OPAQUE_CUTOFF {
            px.fill(0);
        } else {
            px[3] = 255;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaggy_removes_isolated_diagonal() {
        // Opaque pixel at (1,1) whose only opaque neighbor is (2,2)
        let mut img = RasterRgba::new(4, 4);
        img.set_pixel(1, 1, [255, 0, 0, 255]);
        img.set_pixel(2, 2, [255, 0, 0, 255]);
        img.set_pixel(3, 2, [255, 0, 0, 255]); // keeps (2,2) anchored
        let cleaned = jaggy_cleanup(&img);
        assert_eq!(cleaned.pixel(1, 1), [0, 0, 0, 0]);
        assert_eq!(cleaned.pixel(2, 2), [255, 0, 0, 255]);
    }

    #[test]
    fn jaggy_spares_pixels_with_orthogonal_support() {
        let mut img = RasterRgba::new(4, 4);
        img.set_pixel(1, 1, [255, 0, 0, 255]);
        img.set_pixel(1, 2, [255, 0, 0, 255]); // orthogonal neighbor
        img.set_pixel(2, 2, [255, 0, 0, 255]); // plus one diagonal
        let cleaned = jaggy_cleanup(&img);
        assert_eq!(cleaned.pixel(1, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn jaggy_spares_fully_isolated_pixels() {
        // Zero diagonal neighbors is not the jaggy pattern.
        let mut img = RasterRgba::new(3, 3);
        img.set_pixel(1, 1, [255, 0, 0, 255]);
        let cleaned = jaggy_cleanup(&img);
        assert_eq!(cleaned.pixel(1, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut img = RasterRgba::from_fn(4, 1, |x, _| match x {
            0 => [10, 20, 30, 255],
            1 => [10, 20, 30, 127],
            2 => [10, 20, 30, 128],
            _ => [10, 20, 30, 0],
        });
        finalize_pixels(&mut img);
        let once = img.clone();
        finalize_pixels(&mut img);
        assert_eq!(img, once);
        assert_eq!(once.pixel(0, 0), [10, 20, 30, 255]);
        assert_eq!(once.pixel(1, 0), [0, 0, 0, 0]);
        assert_eq!(once.pixel(2, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn binarize_uses_caller_cutoff() {
        let img = RasterRgba::from_fn(3, 1, |x, _| [0, 0, 0, (x * 100) as u8]);
        let out = binarize_alpha(&img, 150);
        assert_eq!(out.pixel(0, 0)[3], 0);
        assert_eq!(out.pixel(1, 0)[3], 0);
        assert_eq!(out.pixel(2, 0)[3], 255);
    }
}
