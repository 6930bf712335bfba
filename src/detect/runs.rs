//! Run-length scale detection.
//!
//! Scans every row and column for runs of consecutive identical pixels
//! (length > 1) and returns the GCD of all run lengths. Clean upscaled
//! pixel art yields runs that are all multiples of the block size, so the
//! GCD recovers it exactly. Fewer than 10 runs means the signal is too weak
//! to trust and the detector reports 1.
use crate::image::RasterRgba;
use crate::stats::gcd_all;

const MIN_RUNS: usize = 10;

/// Detect the block size by run-length analysis. Returns 1 for weak signal
/// or degenerate input.
pub fn detect(image: &RasterRgba) -> u32 {
    if image.is_degenerate() {
        return 1;
    }
    // A single-color image supports every block size; report 1 rather than
    // the accidental gcd of its dimensions.
    let first = image.pixel(0, 0);
    if image.pixels().all(|px| px == first) {
        return 1;
    }
    let mut lengths: Vec<u32> = Vec::new();

    for y in 0..image.h {
        let mut run = 1u32;
        for x in 1..image.w {
            if image.pixel(x, y) == image.pixel(x - 1, y) {
                run += 1;
            } else {
                if run > 1 {
                    lengths.push(run);
                }
                run = 1;
            }
        }
        if run > 1 {
            lengths.push(run);
        }
    }

    for x in 0..image.w {
        let mut run = 1u32;
        for y in 1..image.h {
            if image.pixel(x, y) == image.pixel(x, y - 1) {
                run += 1;
            } else {
                if run > 1 {
                    lengths.push(run);
                }
                run = 1;
            }
        }
        if run > 1 {
            lengths.push(run);
        }
    }

    if lengths.len() < MIN_RUNS {
        return 1;
    }
    gcd_all(&lengths).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(block: usize, cells: usize) -> RasterRgba {
        RasterRgba::from_fn(block * cells, block * cells, |x, y| {
            let cx = (x / block) as u8;
            let cy = (y / block) as u8;
            [cx * 40, cy * 40, cx ^ cy, 255]
        })
    }

    #[test]
    fn recovers_block_size() {
        for k in [2usize, 3, 4, 8] {
            assert_eq!(detect(&blocks(k, 6)), k as u32, "block size {k}");
        }
    }

    #[test]
    fn unit_blocks_report_one() {
        // A 1px checkerboard has no runs longer than one.
        let img = RasterRgba::from_fn(16, 16, |x, y| {
            if (x + y) % 2 == 0 {
                [0, 0, 0, 255]
            } else {
                [255, 255, 255, 255]
            }
        });
        assert_eq!(detect(&img), 1);
    }

    #[test]
    fn flat_image_reports_one() {
        let img = RasterRgba::from_fn(12, 8, |_, _| [7, 7, 7, 255]);
        assert_eq!(detect(&img), 1);
    }
}
