//! Dominant-color block downscaling.
//!
//! Opaque pixels in each block are grouped by exact color. The most
//! frequent color wins when its share of the opaque pixels reaches the
//! threshold; otherwise the block falls back to the per-channel mean.
//! Output alpha is binary: a block is opaque iff the majority of its
//! pixels are.
use crate::image::RasterRgba;
use std::collections::HashMap;

const OPAQUE_CUTOFF: u8 = 128;

/// Default share of opaque pixels the dominant color must reach.
pub const DEFAULT_DOMINANCE: f32 = 0.15;

/// Downscale by integer `scale`, one dominant (or mean) color per block.
pub fn downscale(image: &RasterRgba, scale: u32, dominance_threshold: f32) -> RasterRgba {
    let scale = scale.max(1) as usize;
    let out_w = image.w / scale;
    let out_h = image.h / scale;
    let mut out = RasterRgba::new(out_w, out_h);

    let block_area = scale * scale;
    let mut counts: HashMap<[u8; 4], usize> = HashMap::new();

    for by in 0..out_h {
        for bx in 0..out_w {
            counts.clear();
            let mut opaque = 0usize;
            let mut sums = [0u32; 3];
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = image.pixel(bx * scale + dx, by * scale + dy);
                    if px[3] >= OPAQUE_CUTOFF {
                        opaque += 1;
                        *counts.entry(px).or_insert(0) += 1;
                        sums[0] += px[0] as u32;
                        sums[1] += px[1] as u32;
                        sums[2] += px[2] as u32;
                    }
                }
            }

            if opaque == 0 {
                // Fully transparent block
                out.set_pixel(bx, by, [0, 0, 0, 0]);
                continue;
            }
            if opaque * 2 < block_area {
                // Majority transparent: binarized to transparent.
                out.set_pixel(bx, by, [0, 0, 0, 0]);
                continue;
            }

            let (dominant, count) = counts
                .iter()
                .min_by(|(ca, na), (cb, nb)| nb.cmp(na).then(ca.cmp(cb)))
                .map(|(&c, &n)| (c, n))
                .expect("opaque > 0");

            let color = if count as f32 / opaque as f32 >= dominance_threshold {
                [dominant[0], dominant[1], dominant[2]]
            } else {
                [
                    (sums[0] as f32 / opaque as f32).round() as u8,
                    (sums[1] as f32 / opaque as f32).round() as u8,
                    (sums[2] as f32 / opaque as f32).round() as u8,
                ]
            };
            out.set_pixel(bx, by, [color[0], color[1], color[2], 255]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_color_wins() {
        // 3 of 4 pixels red, 1 blue: red share 0.75 >= 0.15
        let img = RasterRgba::from_fn(2, 2, |x, y| {
            if x == 1 && y == 1 {
                [0, 0, 255, 255]
            } else {
                [255, 0, 0, 255]
            }
        });
        let small = downscale(&img, 2, DEFAULT_DOMINANCE);
        assert_eq!(small.pixel(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn below_threshold_falls_back_to_mean() {
        // Four distinct colors, each share 0.25 < 0.5 threshold
        let colors = [
            [100u8, 0, 0, 255],
            [0, 100, 0, 255],
            [0, 0, 100, 255],
            [100, 100, 100, 255],
        ];
        let img = RasterRgba::from_fn(2, 2, |x, y| colors[y * 2 + x]);
        let small = downscale(&img, 2, 0.5);
        assert_eq!(small.pixel(0, 0), [50, 50, 50, 255]);
    }

    #[test]
    fn transparent_block_is_zeroed() {
        let img = RasterRgba::new(4, 4);
        let small = downscale(&img, 2, DEFAULT_DOMINANCE);
        for px in small.pixels() {
            assert_eq!(px, [0, 0, 0, 0]);
        }
    }

    #[test]
    fn majority_transparent_binarizes_to_transparent() {
        // 1 opaque pixel of 4 -> transparent output
        let img = RasterRgba::from_fn(2, 2, |x, y| {
            if x == 0 && y == 0 {
                [200, 10, 10, 255]
            } else {
                [0, 0, 0, 0]
            }
        });
        let small = downscale(&img, 2, DEFAULT_DOMINANCE);
        assert_eq!(small.pixel(0, 0), [0, 0, 0, 0]);
    }
}
