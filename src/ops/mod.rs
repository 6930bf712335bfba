//! Low-level image operators used by the detection and pipeline stages.
//!
//! Every operator takes owned or borrowed buffers and returns a fresh owned
//! result; buffer lifetimes are plain ownership, so resources are released
//! on every exit path.

pub mod colorspace;
pub mod filters;
pub mod grad;
pub mod morphology;
pub mod resize;

pub use colorspace::{grayscale, lab_to_rgb, rgb_to_lab};
pub use grad::{sobel_gradients, Grad};
