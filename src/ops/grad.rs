//! Sobel gradients with magnitude and per-axis edge profiles.
//!
//! - Convolves the 3×3 Sobel kernel pair with border clamping.
//! - Outputs per-pixel `gx`, `gy`, `mag = sqrt(gx^2 + gy^2)`.
//! - `axis_profiles` collapses the magnitudes into one horizontal and one
//!   vertical 1-D signal for grid-period analysis.
//!
//! Complexity: O(W·H) per pass; memory: three float buffers.
use crate::image::ImageF32;

type Kernel3 = [[f32; 3]; 3];

const SOBEL_KERNEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_KERNEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

/// Per-pixel gradient buffers.
#[derive(Clone, Debug)]
pub struct Grad {
    /// Horizontal derivative (convolution with kernel X)
    pub gx: ImageF32,
    /// Vertical derivative (convolution with kernel Y)
    pub gy: ImageF32,
    /// Euclidean magnitude per pixel: `sqrt(gx^2 + gy^2)`
    pub mag: ImageF32,
}

/// Compute Sobel gradients on a single-channel float image.
pub fn sobel_gradients(l: &ImageF32) -> Grad {
    let w = l.w;
    let h = l.h;
    let mut gx = ImageF32::new(w, h);
    let mut gy = ImageF32::new(w, h);
    let mut mag = ImageF32::new(w, h);

    if w == 0 || h == 0 {
        return Grad { gx, gy, mag };
    }

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        let rows = [l.row(y_idx[0]), l.row(y_idx[1]), l.row(y_idx[2])];
        let out_gx = gx.row_mut(y);
        let out_gy = gy.row_mut(y);
        let out_mag = mag.row_mut(y);
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let mut sum_x = 0.0;
            let mut sum_y = 0.0;
            for (ky, src_row) in rows.iter().enumerate() {
                let kx_row = &SOBEL_KERNEL_X[ky];
                let ky_row = &SOBEL_KERNEL_Y[ky];
                sum_x += src_row[x_idx[0]] * kx_row[0]
                    + src_row[x_idx[1]] * kx_row[1]
                    + src_row[x_idx[2]] * kx_row[2];
                sum_y += src_row[x_idx[0]] * ky_row[0]
                    + src_row[x_idx[1]] * ky_row[1]
                    + src_row[x_idx[2]] * ky_row[2];
            }

            out_gx[x] = sum_x;
            out_gy[x] = sum_y;
            out_mag[x] = (sum_x * sum_x + sum_y * sum_y).sqrt();
        }
    }

    Grad { gx, gy, mag }
}

/// Collapse horizontal/vertical gradient magnitudes into two 1-D profiles.
///
/// The column profile sums `|gx|` down each column (vertical block borders
/// show up as peaks along x); the row profile sums `|gy|` across each row.
pub fn axis_profiles(grad: &Grad) -> (Vec<f32>, Vec<f32>) {
    let w = grad.gx.w;
    let h = grad.gx.h;
    let mut cols = vec![0.0f32; w];
    let mut rows = vec![0.0f32; h];
    for y in 0..h {
        let gx_row = grad.gx.row(y);
        let gy_row = grad.gy.row(y);
        let mut row_sum = 0.0;
        for x in 0..w {
            cols[x] += gx_row[x].abs();
            row_sum += gy_row[x].abs();
        }
        rows[y] = row_sum;
    }
    (cols, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image(width: usize, height: usize, split_x: usize) -> ImageF32 {
        ImageF32::from_fn(width, height, |x, _| if x < split_x { 0.0 } else { 255.0 })
    }

    #[test]
    fn vertical_step_peaks_in_column_profile() {
        let img = step_image(16, 8, 8);
        let grad = sobel_gradients(&img);
        let (cols, rows) = axis_profiles(&grad);
        let peak = cols
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!(
            (7..=8).contains(&peak),
            "expected column peak at the step, got {peak}"
        );
        assert!(
            rows.iter().all(|&r| r.abs() < 1e-3),
            "horizontal edges should not respond to a vertical step"
        );
    }

    #[test]
    fn flat_image_has_zero_gradients() {
        let img = ImageF32::from_fn(8, 8, |_, _| 128.0);
        let grad = sobel_gradients(&img);
        assert!(grad.mag.data.iter().all(|&m| m == 0.0));
    }
}
