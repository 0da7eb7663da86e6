//! Contrast-driven blend masks for local detail processing
//!
//! This crate turns a luminance plane into a per-pixel blend mask:
//! a two-pass tile search estimates the image's noise contrast, a
//! sigmoid maps each pixel's local contrast through that threshold,
//! and a Gaussian blur smooths the result. The mask weights how
//! strongly a detail enhancement (sharpening, local contrast) is
//! applied at each pixel.

pub mod blend;
pub mod error;
pub mod luminance;
pub mod tile;

pub use blend::build_blend_mask;
pub use error::{MaskError, MaskResult};
pub use luminance::rgb_luminance;
pub use tile::{contrast_threshold_for_tile, find_contrast_threshold};
