//! Color space conversions: luminance grayscale and sRGB ↔ CIELAB (D65).
//!
//! Grayscale stays in the 0–255 range so the detector thresholds apply to it
//! directly. Lab is the working space of the content-adaptive downscaler.
use crate::image::{ImageF32, RasterRgba};

// D65 reference white
const XN: f32 = 0.95047;
const YN: f32 = 1.0;
const ZN: f32 = 1.08883;

/// Rec.601 luminance plane in 0–255.
pub fn grayscale(image: &RasterRgba) -> ImageF32 {
    let mut out = ImageF32::new(image.w, image.h);
    for (dst, px) in out.data.iter_mut().zip(image.data.chunks_exact(4)) {
        *dst = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
    }
    out
}

#[inline]
fn srgb_to_linear(c: u8) -> f32 {
    let v = c as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(v: f32) -> u8 {
    let v = v.clamp(0.0, 1.0);
    let s = if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (s * 255.0).round() as u8
}

#[inline]
fn lab_f(t: f32) -> f32 {
    const DELTA3: f32 = 0.008856; // (6/29)^3
    if t > DELTA3 {
        t.cbrt()
    } else {
        t * 7.787 + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// sRGB bytes to CIELAB `[L, a, b]` (L in 0–100).
pub fn rgb_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    let r = srgb_to_linear(rgb[0]);
    let g = srgb_to_linear(rgb[1]);
    let b = srgb_to_linear(rgb[2]);

    let x = 0.4124564 * r + 0.3575761 * g + 0.1804375 * b;
    let y = 0.2126729 * r + 0.7151522 * g + 0.0721750 * b;
    let z = 0.0193339 * r + 0.1191920 * g + 0.9503041 * b;

    let fx = lab_f(x / XN);
    let fy = lab_f(y / YN);
    let fz = lab_f(z / ZN);

    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// CIELAB `[L, a, b]` back to sRGB bytes.
pub fn lab_to_rgb(lab: [f32; 3]) -> [u8; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;

    let x = XN * lab_f_inv(fx);
    let y = YN * lab_f_inv(fy);
    let z = ZN * lab_f_inv(fz);

    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

    [linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_round_trip_on_primaries() {
        for rgb in [[0u8, 0, 0], [255, 255, 255], [255, 0, 0], [30, 90, 200]] {
            let back = lab_to_rgb(rgb_to_lab(rgb));
            for c in 0..3 {
                assert!(
                    (back[c] as i16 - rgb[c] as i16).abs() <= 1,
                    "round trip drifted: {rgb:?} -> {back:?}"
                );
            }
        }
    }

    #[test]
    fn white_is_l100() {
        let lab = rgb_to_lab([255, 255, 255]);
        assert!((lab[0] - 100.0).abs() < 0.1);
        assert!(lab[1].abs() < 0.1 && lab[2].abs() < 0.1);
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        let img = RasterRgba::from_fn(1, 1, |_, _| [255, 0, 0, 255]);
        let gray = grayscale(&img);
        assert!((gray.get(0, 0) - 0.299 * 255.0).abs() < 1e-3);
    }
}
