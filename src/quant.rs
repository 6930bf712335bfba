//! Color quantization: variance-minimizing palette construction and
//! nearest-color remapping, without dithering (dithering would destroy
//! pixel-art flatness).
//!
//! The palette builder works on the exact-color histogram: the bucket with
//! the largest weighted variance is split at the weighted median of its
//! widest axis until the target count is reached, and each bucket's
//! weighted mean becomes a palette entry. A fixed external palette skips
//! construction and remaps only.
use crate::image::RasterRgba;
use crate::ops::filters::gaussian_blur_rgba;
use crate::ops::resize::area_average_rgba;
use std::collections::HashMap;

const OPAQUE_CUTOFF: u8 = 128;

// Auto color count probe
const AUTO_PROBE_WIDTH: usize = 64;
const AUTO_BUCKET_STEP: u8 = 48;
const AUTO_SHARE: f32 = 0.015;
const AUTO_SHARE_TIGHT: f32 = 0.02;

/// Reduce `image` to at most `max_colors` opaque colors.
pub fn quantize(image: &RasterRgba, max_colors: usize) -> RasterRgba {
    let palette = build_palette(image, max_colors);
    remap(image, &palette)
}

/// Build a palette of at most `max_colors` entries from the opaque pixels.
pub fn build_palette(image: &RasterRgba, max_colors: usize) -> Vec<[u8; 3]> {
    let mut histogram: HashMap<[u8; 3], usize> = HashMap::new();
    for px in image.pixels() {
        if px[3] >= OPAQUE_CUTOFF {
            *histogram.entry([px[0], px[1], px[2]]).or_insert(0) += 1;
        }
    }
    if histogram.is_empty() || max_colors == 0 {
        return Vec::new();
    }

    let mut colors: Vec<([u8; 3], usize)> = histogram.into_iter().collect();
    // Deterministic starting order regardless of hash iteration.
    colors.sort_unstable();

    let mut buckets: Vec<Vec<([u8; 3], usize)>> = vec![colors];
    while buckets.len() < max_colors {
        let candidate = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.len() > 1)
            .map(|(i, b)| {
                let (axis, variance) = widest_axis(b);
                (i, axis, variance)
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));
        let Some((idx, axis, _)) = candidate else {
            break;
        };
        let bucket = buckets.swap_remove(idx);
        let (left, right) = split_at_weighted_median(bucket, axis);
        if !left.is_empty() {
            buckets.push(left);
        }
        if !right.is_empty() {
            buckets.push(right);
        }
    }

    buckets.iter().map(|b| weighted_mean(b)).collect()
}

/// Remap every opaque pixel to its nearest palette color; transparent
/// pixels pass through. Remapping to the same palette twice is a no-op.
pub fn remap(image: &RasterRgba, palette: &[[u8; 3]]) -> RasterRgba {
    if palette.is_empty() {
        return image.clone();
    }
    let mut out = image.clone();
    let mut cache: HashMap<[u8; 3], [u8; 3]> = HashMap::new();
    for px in out.data.chunks_exact_mut(4) {
        if px[3] < OPAQUE_CUTOFF {
            continue;
        }
        let key = [px[0], px[1], px[2]];
        let mapped = *cache
            .entry(key)
            .or_insert_with(|| nearest_color(key, palette));
        px[0] = mapped[0];
        px[1] = mapped[1];
        px[2] = mapped[2];
    }
    out
}

/// Estimate how many colors the image "really" has: area-average to a
/// 64-px-wide probe, blur away gradient noise, bucket channels to steps of
/// 48 and count buckets above the dominance share (tightened when too many
/// qualify). Clamped to `[2, requested_max]`.
pub fn auto_color_count(image: &RasterRgba, requested_max: usize) -> usize {
    if image.is_degenerate() {
        return 2;
    }
    let probe = if image.w > AUTO_PROBE_WIDTH {
        let probe_h = ((image.h * AUTO_PROBE_WIDTH) / image.w).max(1);
        area_average_rgba(image, AUTO_PROBE_WIDTH, probe_h)
    } else {
        image.clone()
    };
    let probe = gaussian_blur_rgba(&probe);

    let mut buckets: HashMap<[u8; 3], usize> = HashMap::new();
    let mut total = 0usize;
    for px in probe.pixels() {
        if px[3] < OPAQUE_CUTOFF {
            continue;
        }
        let key = [
            px[0] - px[0] % AUTO_BUCKET_STEP,
            px[1] - px[1] % AUTO_BUCKET_STEP,
            px[2] - px[2] % AUTO_BUCKET_STEP,
        ];
        *buckets.entry(key).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 2;
    }

    let count_above = |share: f32| {
        buckets
            .values()
            .filter(|&&n| n as f32 / total as f32 > share)
            .count()
    };
    let mut count = count_above(AUTO_SHARE);
    if count > requested_max {
        count = count_above(AUTO_SHARE_TIGHT);
    }
    count.clamp(2, requested_max.max(2))
}

fn widest_axis(bucket: &[([u8; 3], usize)]) -> (usize, f32) {
    let mut best_axis = 0;
    let mut best_var = -1.0f32;
    let weight: f32 = bucket.iter().map(|&(_, n)| n as f32).sum();
    for axis in 0..3 {
        let mean: f32 = bucket
            .iter()
            .map(|&(c, n)| c[axis] as f32 * n as f32)
            .sum::<f32>()
            / weight;
        let var: f32 = bucket
            .iter()
            .map(|&(c, n)| {
                let d = c[axis] as f32 - mean;
                d * d * n as f32
            })
            .sum::<f32>();
        if var > best_var {
            best_var = var;
            best_axis = axis;
        }
    }
    (best_axis, best_var)
}

fn split_at_weighted_median(
    mut bucket: Vec<([u8; 3], usize)>,
    axis: usize,
) -> (Vec<([u8; 3], usize)>, Vec<([u8; 3], usize)>) {
    bucket.sort_unstable_by_key(|&(c, _)| c[axis]);
    let total: usize = bucket.iter().map(|&(_, n)| n).sum();
    let half = total / 2;
    let mut cumulative = 0usize;
    let mut split = bucket.len() / 2;
    for (i, &(_, n)) in bucket.iter().enumerate() {
        cumulative += n;
        if cumulative >= half {
            split = i + 1;
            break;
        }
    }
    let split = split.clamp(1, bucket.len().saturating_sub(1).max(1));
    let right = bucket.split_off(split);
    (bucket, right)
}

fn weighted_mean(bucket: &[([u8; 3], usize)]) -> [u8; 3] {
    let weight: f32 = bucket.iter().map(|&(_, n)| n as f32).sum();
    let mut mean = [0.0f32; 3];
    for &(c, n) in bucket {
        for axis in 0..3 {
            mean[axis] += c[axis] as f32 * n as f32;
        }
    }
    [
        (mean[0] / weight).round() as u8,
        (mean[1] / weight).round() as u8,
        (mean[2] / weight).round() as u8,
    ]
}

/// Index of the nearest palette entry by RGB distance.
pub(crate) fn nearest_index(color: [u8; 3], palette: &[[u8; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, &candidate) in palette.iter().enumerate() {
        let dr = color[0] as i32 - candidate[0] as i32;
        let dg = color[1] as i32 - candidate[1] as i32;
        let db = color[2] as i32 - candidate[2] as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

fn nearest_color(color: [u8; 3], palette: &[[u8; 3]]) -> [u8; 3] {
    let mut best = palette[0];
    let mut best_dist = u32::MAX;
    for &candidate in palette {
        let dr = color[0] as i32 - candidate[0] as i32;
        let dg = color[1] as i32 - candidate[1] as i32;
        let db = color[2] as i32 - candidate[2] as i32;
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Palette;

    fn noisy_two_tone() -> RasterRgba {
        RasterRgba::from_fn(16, 16, |x, y| {
            let jitter = ((x * 7 + y * 13) % 5) as u8;
            if x < 8 {
                [20 + jitter, 20, 20, 255]
            } else {
                [200 + jitter, 200, 200, 255]
            }
        })
    }

    #[test]
    fn quantize_respects_color_budget() {
        let img = noisy_two_tone();
        for n in [2usize, 4, 8] {
            let quantized = quantize(&img, n);
            assert!(
                Palette::from_raster(&quantized).len() <= n,
                "budget {n} exceeded"
            );
        }
    }

    #[test]
    fn remap_with_same_palette_is_idempotent() {
        let img = noisy_two_tone();
        let palette = build_palette(&img, 3);
        let once = remap(&img, &palette);
        let twice = remap(&once, &palette);
        assert_eq!(once, twice);
    }

    #[test]
    fn transparent_pixels_pass_through() {
        let mut img = noisy_two_tone();
        img.set_pixel(0, 0, [123, 45, 67, 0]);
        let quantized = quantize(&img, 2);
        assert_eq!(quantized.pixel(0, 0), [123, 45, 67, 0]);
    }

    #[test]
    fn auto_count_sees_two_tones() {
        let img = noisy_two_tone();
        let count = auto_color_count(&img, 16);
        // The two flat tones dominate; the blur may add a couple of
        // edge-mixture buckets along the single boundary.
        assert!((2..=5).contains(&count), "count={count}");
    }

    #[test]
    fn auto_count_floor_is_two() {
        let img = RasterRgba::from_fn(32, 32, |_, _| [100, 100, 100, 255]);
        assert_eq!(auto_color_count(&img, 16), 2);
    }

    #[test]
    fn auto_count_clamps_to_requested_max() {
        let img = RasterRgba::from_fn(64, 64, |x, y| {
            [(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]
        });
        let count = auto_color_count(&img, 4);
        assert!(count <= 4 && count >= 2);
    }
}
