//! Content-adaptive downscaling: EM over anisotropic Gaussian kernels.
//!
//! One kernel per output pixel is refined in Lab space for a fixed number
//! of expectation-maximization rounds, with a covariance clamp between
//! rounds that keeps kernels from degenerating or over-blurring:
//!
//! - E-step: Gaussian weights over a window of ±2 source-pixel-widths
//!   around the kernel mean, normalized per input pixel across kernels.
//! - M-step: responsibility-weighted mean position, mean color and
//!   covariance per kernel.
//! - C-step: 2×2 SVD of the covariance; singular values clamped into
//!   `[0.5, max(1.0, 0.5 · average scale ratio)]` and the matrix
//!   reconstructed. The adaptive upper bound matters: a fixed small clamp
//!   over-blurs at large scale ratios.
//!
//! Color runs on the RGB channels only; alpha is downscaled separately by
//! area averaging and recombined at the end. Per-kernel weights live in a
//! pre-sized arena (one fixed-size window slot per kernel), so iterations
//! allocate nothing.
//!
//! Cost is O(iterations × output_pixels × window_area) — by far the most
//! expensive downscale path. Callers wanting to abort do so between
//! pipeline stages; the loop itself runs to completion.
use crate::image::RasterRgba;
use crate::ops::colorspace::{lab_to_rgb, rgb_to_lab};
use crate::ops::resize::area_average_f32;
use nalgebra::{Matrix2, Vector2};
use rayon::prelude::*;

/// EM rounds used when the caller does not override.
pub const DEFAULT_ITERATIONS: usize = 5;

const SIGMA_MIN: f32 = 0.5;

#[derive(Clone, Debug)]
struct Kernel {
    mu: Vector2<f32>,
    cov: Matrix2<f32>,
    color: [f32; 3],
}

#[derive(Clone, Copy, Debug, Default)]
struct Window {
    x0: usize,
    y0: usize,
    x1: usize, // exclusive
    y1: usize, // exclusive
}

impl Window {
    fn len(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// Downscale to `out_w × out_h` with `iterations` EM rounds.
pub fn downscale(image: &RasterRgba, out_w: usize, out_h: usize, iterations: usize) -> RasterRgba {
    if image.is_degenerate() || out_w == 0 || out_h == 0 {
        return RasterRgba::new(out_w, out_h);
    }

    let w = image.w;
    let h = image.h;
    let sx = w as f32 / out_w as f32;
    let sy = h as f32 / out_h as f32;
    let avg_scale = 0.5 * (sx + sy);
    let sigma_max = (0.5 * avg_scale).max(1.0);

    // Search radius: ±2 source-pixel-widths per axis.
    let rx = (2.0 * sx).ceil() as usize;
    let ry = (2.0 * sy).ceil() as usize;
    let slot = (2 * rx + 1) * (2 * ry + 1);

    let labs: Vec<[f32; 3]> = image
        .data
        .chunks_exact(4)
        .map(|px| rgb_to_lab([px[0], px[1], px[2]]))
        .collect();

    let seed_cov = Matrix2::new(sx * sx / 9.0, 0.0, 0.0, sy * sy / 9.0);
    let mut kernels: Vec<Kernel> = (0..out_w * out_h)
        .map(|i| {
            let ox = i % out_w;
            let oy = i / out_w;
            Kernel {
                mu: Vector2::new((ox as f32 + 0.5) * sx, (oy as f32 + 0.5) * sy),
                cov: seed_cov,
                color: [50.0, 0.0, 0.0], // neutral gray in Lab
            }
        })
        .collect();

    let mut weights = vec![0.0f32; kernels.len() * slot];
    let mut windows = vec![Window::default(); kernels.len()];
    let mut totals = vec![0.0f32; w * h];

    for _ in 0..iterations {
        // E-step part 1: unnormalized Gaussian weights per kernel.
        kernels
            .par_iter()
            .zip(weights.par_chunks_mut(slot))
            .zip(windows.par_iter_mut())
            .for_each(|((kernel, wslice), window)| {
                *window = window_around(kernel.mu, rx, ry, w, h);
                let inv = kernel.cov.try_inverse().unwrap_or_else(|| {
                    seed_cov.try_inverse().expect("seed covariance invertible")
                });
                let mut i = 0;
                for py in window.y0..window.y1 {
                    for px in window.x0..window.x1 {
                        let d = Vector2::new(px as f32 + 0.5, py as f32 + 0.5) - kernel.mu;
                        let md = (d.transpose() * inv * d)[(0, 0)];
                        wslice[i] = (-0.5 * md).exp();
                        i += 1;
                    }
                }
            });

        // E-step part 2: per-pixel normalization across kernels.
        totals.iter_mut().for_each(|t| *t = 0.0);
        for (window, wslice) in windows.iter().zip(weights.chunks(slot)) {
            let mut i = 0;
            for py in window.y0..window.y1 {
                let row = py * w;
                for px in window.x0..window.x1 {
                    totals[row + px] += wslice[i];
                    i += 1;
                }
            }
        }

        // M-step + C-step per kernel.
        kernels
            .par_iter_mut()
            .zip(weights.par_chunks(slot))
            .zip(windows.par_iter())
            .for_each(|((kernel, wslice), window)| {
                let mut r_sum = 0.0f32;
                let mut mu_sum = Vector2::zeros();
                let mut color_sum = [0.0f32; 3];
                let mut i = 0;
                for py in window.y0..window.y1 {
                    let row = py * w;
                    for px in window.x0..window.x1 {
                        let total = totals[row + px];
                        if total > 0.0 {
                            let r = wslice[i] / total;
                            let p = Vector2::new(px as f32 + 0.5, py as f32 + 0.5);
                            let lab = labs[row + px];
                            r_sum += r;
                            mu_sum += p * r;
                            for c in 0..3 {
                                color_sum[c] += lab[c] * r;
                            }
                        }
                        i += 1;
                    }
                }
                if r_sum <= 1e-8 {
                    // No support this round: reseed spread, keep position
                    // and color.
                    kernel.cov = seed_cov;
                    return;
                }
                let mu = mu_sum / r_sum;
                let mut cov_sum = Matrix2::zeros();
                let mut i = 0;
                for py in window.y0..window.y1 {
                    let row = py * w;
                    for px in window.x0..window.x1 {
                        let total = totals[row + px];
                        if total > 0.0 {
                            let r = wslice[i] / total;
                            let d = Vector2::new(px as f32 + 0.5, py as f32 + 0.5) - mu;
                            cov_sum += d * d.transpose() * r;
                        }
                        i += 1;
                    }
                }
                kernel.mu = mu;
                kernel.color = [
                    color_sum[0] / r_sum,
                    color_sum[1] / r_sum,
                    color_sum[2] / r_sum,
                ];
                kernel.cov = clamp_covariance(cov_sum / r_sum, SIGMA_MIN, sigma_max);
            });
    }

    // Materialize colors from converged kernel means; alpha separately.
    let alpha = area_average_f32(&image.alpha_plane(), out_w, out_h);
    let mut out = RasterRgba::new(out_w, out_h);
    for (i, kernel) in kernels.iter().enumerate() {
        let rgb = lab_to_rgb(kernel.color);
        let a = alpha.data[i].round().clamp(0.0, 255.0) as u8;
        let x = i % out_w;
        let y = i / out_w;
        out.set_pixel(x, y, [rgb[0], rgb[1], rgb[2], a]);
    }
    out
}

fn window_around(mu: Vector2<f32>, rx: usize, ry: usize, w: usize, h: usize) -> Window {
    let cx = (mu.x.round().max(0.0) as usize).min(w - 1);
    let cy = (mu.y.round().max(0.0) as usize).min(h - 1);
    Window {
        x0: cx.saturating_sub(rx),
        y0: cy.saturating_sub(ry),
        x1: (cx + rx + 1).min(w),
        y1: (cy + ry + 1).min(h),
    }
}

/// Clamp the covariance's singular values into `[lo, hi]` via 2×2 SVD and
/// rebuild the matrix.
fn clamp_covariance(cov: Matrix2<f32>, lo: f32, hi: f32) -> Matrix2<f32> {
    let svd = cov.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Matrix2::new(lo, 0.0, 0.0, lo),
    };
    let s = Vector2::new(
        svd.singular_values[0].clamp(lo, hi),
        svd.singular_values[1].clamp(lo, hi),
    );
    u * Matrix2::from_diagonal(&s) * v_t
}
