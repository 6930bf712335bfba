//! Area-average (box) downscaling.
//!
//! Each output pixel integrates its source box with fractional edge
//! coverage, so the result stays correct for non-integer ratios — that is
//! what the content-adaptive downscaler needs for its alpha plane.
use crate::image::{ImageF32, RasterRgba};

/// Per-axis coverage of one output sample: source index plus weight.
fn box_coverage(out_i: usize, ratio: f32, src_len: usize) -> Vec<(usize, f32)> {
    let start = out_i as f32 * ratio;
    let end = ((out_i + 1) as f32 * ratio).min(src_len as f32);
    let mut cover = Vec::new();
    let mut pos = start;
    while pos < end - 1e-6 {
        let idx = (pos.floor() as usize).min(src_len - 1);
        let next = (idx as f32 + 1.0).min(end);
        cover.push((idx, next - pos));
        pos = next;
    }
    if cover.is_empty() {
        cover.push(((start.floor() as usize).min(src_len - 1), 1.0));
    }
    cover
}

/// Box-filter downscale of a float plane to `nw × nh`.
pub fn area_average_f32(image: &ImageF32, nw: usize, nh: usize) -> ImageF32 {
    if image.w == 0 || image.h == 0 || nw == 0 || nh == 0 {
        return ImageF32::new(nw, nh);
    }
    let rx = image.w as f32 / nw as f32;
    let ry = image.h as f32 / nh as f32;
    let cols: Vec<Vec<(usize, f32)>> = (0..nw).map(|x| box_coverage(x, rx, image.w)).collect();

    let mut out = ImageF32::new(nw, nh);
    for y in 0..nh {
        let rows = box_coverage(y, ry, image.h);
        for (x, col_cover) in cols.iter().enumerate() {
            let mut acc = 0.0;
            let mut weight = 0.0;
            for &(sy, wy) in &rows {
                let src_row = image.row(sy);
                for &(sx, wx) in col_cover {
                    acc += src_row[sx] * wx * wy;
                    weight += wx * wy;
                }
            }
            out.set(x, y, acc / weight.max(1e-6));
        }
    }
    out
}

/// Box-filter downscale of an RGBA raster to `nw × nh`.
pub fn area_average_rgba(image: &RasterRgba, nw: usize, nh: usize) -> RasterRgba {
    if image.w == 0 || image.h == 0 || nw == 0 || nh == 0 {
        return RasterRgba::new(nw, nh);
    }
    let rx = image.w as f32 / nw as f32;
    let ry = image.h as f32 / nh as f32;
    let cols: Vec<Vec<(usize, f32)>> = (0..nw).map(|x| box_coverage(x, rx, image.w)).collect();

    let mut out = RasterRgba::new(nw, nh);
    for y in 0..nh {
        let rows = box_coverage(y, ry, image.h);
        for (x, col_cover) in cols.iter().enumerate() {
            let mut acc = [0.0f32; 4];
            let mut weight = 0.0;
            for &(sy, wy) in &rows {
                for &(sx, wx) in col_cover {
                    let px = image.pixel(sx, sy);
                    let w = wx * wy;
                    for c in 0..4 {
                        acc[c] += px[c] as f32 * w;
                    }
                    weight += w;
                }
            }
            let inv = 1.0 / weight.max(1e-6);
            out.set_pixel(
                x,
                y,
                [
                    (acc[0] * inv).round() as u8,
                    (acc[1] * inv).round() as u8,
                    (acc[2] * inv).round() as u8,
                    (acc[3] * inv).round() as u8,
                ],
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_average_integer_blocks() {
        let img = ImageF32::from_fn(4, 4, |x, _| if x < 2 { 0.0 } else { 100.0 });
        let small = area_average_f32(&img, 2, 2);
        assert!((small.get(0, 0) - 0.0).abs() < 1e-4);
        assert!((small.get(1, 0) - 100.0).abs() < 1e-4);
    }

    #[test]
    fn area_average_fractional_ratio() {
        let img = ImageF32::from_fn(3, 1, |x, _| x as f32);
        let small = area_average_f32(&img, 2, 1);
        // left box covers [0, 1.5): mean of 0 and half of 1
        assert!((small.get(0, 0) - (0.0 + 0.5) / 1.5).abs() < 1e-4);
    }

    #[test]
    fn rgba_area_average_rounds_channels() {
        let img = RasterRgba::from_fn(2, 1, |x, _| if x == 0 { [0, 0, 0, 255] } else { [255, 255, 255, 255] });
        let small = area_average_rgba(&img, 1, 1);
        assert_eq!(small.pixel(0, 0), [128, 128, 128, 255]);
    }
}
