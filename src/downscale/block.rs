//! Block downscaling: aggregate each `scale × scale` block into one pixel.
//!
//! Color channels aggregate by the selected method over the block's opaque
//! pixels (alpha ≥ 50%); alpha always aggregates by median over the whole
//! block so hard transparency edges survive even when colors are smoothed.
use super::dominant::DEFAULT_DOMINANCE;
use super::DownscaleMethod;
use crate::image::RasterRgba;
use crate::stats::{dominant_or_mean, median_u8, mode};

const OPAQUE_CUTOFF: u8 = 128;

/// Downscale by integer `scale` using per-channel aggregation. Output is
/// `floor(w/scale) × floor(h/scale)`; the caller rejects empty results.
pub fn downscale(image: &RasterRgba, scale: u32, method: DownscaleMethod) -> RasterRgba {
    let scale = scale.max(1) as usize;
    let out_w = image.w / scale;
    let out_h = image.h / scale;
    let mut out = RasterRgba::new(out_w, out_h);

    let mut alphas: Vec<u8> = Vec::with_capacity(scale * scale);
    let mut channels: [Vec<u8>; 3] = [
        Vec::with_capacity(scale * scale),
        Vec::with_capacity(scale * scale),
        Vec::with_capacity(scale * scale),
    ];

    for by in 0..out_h {
        for bx in 0..out_w {
            alphas.clear();
            for chan in channels.iter_mut() {
                chan.clear();
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = image.pixel(bx * scale + dx, by * scale + dy);
                    alphas.push(px[3]);
                    if px[3] >= OPAQUE_CUTOFF {
                        channels[0].push(px[0]);
                        channels[1].push(px[1]);
                        channels[2].push(px[2]);
                    }
                }
            }

            let alpha = median_u8(&mut alphas);
            let color = match method {
                DownscaleMethod::Nearest => {
                    let px = image.pixel(bx * scale + scale / 2, by * scale + scale / 2);
                    [px[0], px[1], px[2]]
                }
                _ => [
                    aggregate(&mut channels[0], method),
                    aggregate(&mut channels[1], method),
                    aggregate(&mut channels[2], method),
                ],
            };
            out.set_pixel(bx, by, [color[0], color[1], color[2], alpha]);
        }
    }
    out
}

fn aggregate(values: &mut Vec<u8>, method: DownscaleMethod) -> u8 {
    if values.is_empty() {
        return 0;
    }
    match method {
        DownscaleMethod::Median => median_u8(values.as_mut_slice()),
        DownscaleMethod::Mode => mode(values.as_slice()).unwrap_or(0),
        DownscaleMethod::Mean => {
            let sum: u32 = values.iter().map(|&v| v as u32).sum();
            (sum as f32 / values.len() as f32).round() as u8
        }
        // Per-channel variant of the dominant rule; the pipeline routes
        // the dominant method to the whole-color specialization instead.
        DownscaleMethod::Dominant => dominant_or_mean(values.as_slice(), DEFAULT_DOMINANCE),
        // Nearest and ContentAdaptive never reach this path.
        _ => values[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_color_blocks(scale: usize) -> RasterRgba {
        let colors = [
            [255u8, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 0, 255],
        ];
        RasterRgba::from_fn(scale * 2, scale * 2, |x, y| {
            colors[(y / scale) * 2 + x / scale]
        })
    }

    #[test]
    fn exact_blocks_survive_every_method() {
        for method in [
            DownscaleMethod::Median,
            DownscaleMethod::Mode,
            DownscaleMethod::Mean,
            DownscaleMethod::Nearest,
        ] {
            let img = four_color_blocks(4);
            let small = downscale(&img, 4, method);
            assert_eq!(small.w, 2);
            assert_eq!(small.h, 2);
            assert_eq!(small.pixel(0, 0), [255, 0, 0, 255], "{method:?}");
            assert_eq!(small.pixel(1, 1), [255, 255, 0, 255], "{method:?}");
        }
    }

    #[test]
    fn per_channel_dominant_falls_back_per_channel() {
        // Red dominated by 200 (8 of 9); all 9 green values distinct, so
        // each share is 1/9 < 0.15 and the channel falls back to its mean.
        let img = RasterRgba::from_fn(3, 3, |x, y| {
            let g = ((y * 3 + x) * 10) as u8;
            if x == 0 && y == 0 {
                [10, g, 0, 255]
            } else {
                [200, g, 0, 255]
            }
        });
        let small = downscale(&img, 3, DownscaleMethod::Dominant);
        let px = small.pixel(0, 0);
        assert_eq!(px[0], 200);
        assert_eq!(px[1], 40);
    }

    #[test]
    fn transparent_block_keeps_zero_alpha() {
        let img = RasterRgba::new(8, 8);
        let small = downscale(&img, 4, DownscaleMethod::Median);
        assert_eq!(small.pixel(0, 0)[3], 0);
        assert_eq!(small.pixel(1, 1)[3], 0);
    }

    #[test]
    fn translucent_pixels_skip_color_aggregation() {
        // Block of 3 opaque dark pixels and 1 translucent bright one; the
        // bright pixel must not drag the mean.
        let img = RasterRgba::from_fn(2, 2, |x, y| {
            if x == 0 && y == 0 {
                [250, 250, 250, 40]
            } else {
                [10, 10, 10, 255]
            }
        });
        let small = downscale(&img, 2, DownscaleMethod::Mean);
        let px = small.pixel(0, 0);
        assert_eq!(&px[..3], &[10, 10, 10]);
        assert_eq!(px[3], 255); // median of [40, 255, 255, 255]
    }

    #[test]
    fn mean_stays_in_convex_range() {
        let img = RasterRgba::from_fn(2, 2, |x, _| {
            if x == 0 {
                [0, 100, 0, 255]
            } else {
                [200, 200, 0, 255]
            }
        });
        let small = downscale(&img, 2, DownscaleMethod::Mean);
        let px = small.pixel(0, 0);
        assert!(px[0] >= 0u8.min(200) && px[0] <= 200);
        assert!((100..=200).contains(&px[1]));
    }
}
