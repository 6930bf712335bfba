//! Smoothing filters: separable Gaussian, windowed median, bilateral.
//!
//! The Gaussian path reuses the separable-filter scheme from the pyramid
//! builder this module grew out of; the median and bilateral filters are the
//! vector-pipeline pre/post smoothers.
use crate::image::{ImageF32, RasterRgba};
use crate::stats::median_u8;

/// Trait implemented by separable 1D filters.
pub trait SeparableFilter {
    /// Return the 1D taps (in left-to-right order). The kernel is assumed to
    /// be symmetric around its centre, but the implementation does not rely
    /// on it.
    fn taps(&self) -> &[f32];
}

/// Simple wrapper around a static filter kernel.
#[derive(Clone, Copy, Debug)]
pub struct StaticSeparableFilter {
    taps: &'static [f32],
}

impl Default for StaticSeparableFilter {
    fn default() -> Self {
        GAUSSIAN_5TAP
    }
}

impl StaticSeparableFilter {
    pub const fn new(taps: &'static [f32]) -> Self {
        Self { taps }
    }
}

impl SeparableFilter for StaticSeparableFilter {
    #[inline]
    fn taps(&self) -> &[f32] {
        self.taps
    }
}

/// Normalised 5-tap Gaussian filter `[1, 4, 6, 4, 1] / 16`.
pub const GAUSSIAN_5TAP: StaticSeparableFilter =
    StaticSeparableFilter::new(&[0.0625, 0.25, 0.375, 0.25, 0.0625]);

/// Convolve a single-channel image with a separable kernel, horizontal then
/// vertical pass, clamping at the borders.
pub fn apply<F: SeparableFilter>(filter: F, image: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let half = taps.len() / 2;
    let w = image.w;
    let h = image.h;
    if w == 0 || h == 0 {
        return image.clone();
    }

    let mut horizontal = ImageF32::new(w, h);
    for y in 0..h {
        let src = image.row(y);
        let dst = horizontal.row_mut(y);
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &tap) in taps.iter().enumerate() {
                let sx = (x + k).saturating_sub(half).min(w - 1);
                acc += src[sx] * tap;
            }
            dst[x] = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &tap) in taps.iter().enumerate() {
                let sy = (y + k).saturating_sub(half).min(h - 1);
                acc += horizontal.get(x, sy) * tap;
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// 5-tap Gaussian blur applied per RGBA channel through the separable
/// pipeline above.
pub fn gaussian_blur_rgba(image: &RasterRgba) -> RasterRgba {
    let w = image.w;
    let h = image.h;
    if w == 0 || h == 0 {
        return image.clone();
    }

    let mut out = RasterRgba::new(w, h);
    for c in 0..4 {
        let plane = ImageF32::from_fn(w, h, |x, y| image.pixel(x, y)[c] as f32);
        let blurred = apply(GAUSSIAN_5TAP, &plane);
        for (px, &v) in out.data.chunks_exact_mut(4).zip(blurred.data.iter()) {
            px[c] = v.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Windowed median filter, radius `r`, applied per channel.
pub fn median_filter(image: &RasterRgba, radius: usize) -> RasterRgba {
    let w = image.w;
    let h = image.h;
    if w == 0 || h == 0 || radius == 0 {
        return image.clone();
    }
    let r = radius as isize;
    let mut out = RasterRgba::new(w, h);
    let mut window = [Vec::new(), Vec::new(), Vec::new(), Vec::new()];
    for y in 0..h {
        for x in 0..w {
            for chan in window.iter_mut() {
                chan.clear();
            }
            for dy in -r..=r {
                let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                for dx in -r..=r {
                    let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    let px = image.pixel(sx, sy);
                    for c in 0..4 {
                        window[c].push(px[c]);
                    }
                }
            }
            let mut px = [0u8; 4];
            for c in 0..4 {
                px[c] = median_u8(&mut window[c]);
            }
            out.set_pixel(x, y, px);
        }
    }
    out
}

/// Bilateral filter: spatial Gaussian times color-range Gaussian. Preserves
/// hard color edges while flattening gradients inside regions.
pub fn bilateral_filter(image: &RasterRgba, sigma_space: f32, sigma_color: f32) -> RasterRgba {
    let w = image.w;
    let h = image.h;
    if w == 0 || h == 0 {
        return image.clone();
    }
    let radius = (2.0 * sigma_space).ceil().max(1.0) as isize;
    let inv_space = -0.5 / (sigma_space * sigma_space).max(1e-6);
    let inv_color = -0.5 / (sigma_color * sigma_color).max(1e-6);

    let mut out = RasterRgba::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let center = image.pixel(x, y);
            let mut acc = [0.0f32; 4];
            let mut weight_sum = 0.0f32;
            for dy in -radius..=radius {
                let sy = (y as isize + dy).clamp(0, h as isize - 1) as usize;
                for dx in -radius..=radius {
                    let sx = (x as isize + dx).clamp(0, w as isize - 1) as usize;
                    let px = image.pixel(sx, sy);
                    let spatial = ((dx * dx + dy * dy) as f32) * inv_space;
                    let dr = px[0] as f32 - center[0] as f32;
                    let dg = px[1] as f32 - center[1] as f32;
                    let db = px[2] as f32 - center[2] as f32;
                    let range = (dr * dr + dg * dg + db * db) * inv_color;
                    let weight = (spatial + range).exp();
                    for c in 0..4 {
                        acc[c] += px[c] as f32 * weight;
                    }
                    weight_sum += weight;
                }
            }
            let mut px = [0u8; 4];
            for c in 0..4 {
                px[c] = (acc[c] / weight_sum).round().clamp(0.0, 255.0) as u8;
            }
            out.set_pixel(x, y, px);
        }
    }
    out
}
