//! lumask-core - Buffer types and statistics for the lumask toolkit
//!
//! This crate provides the foundation the rest of the toolkit builds on:
//!
//! - [`FloatImage`] / [`ByteImage`] - owned, flat, row-major 2D buffers
//! - Histogram-based percentile search over float slices
//! - Scanline polygon fill for painting mask regions
//!
//! # Example
//!
//! ```
//! use lumask_core::{FloatImage, find_min_max_percentile};
//!
//! let data: Vec<f32> = (0..1000).map(|i| i as f32).collect();
//! let (lo, hi) = find_min_max_percentile(&data, 0.05, 0.95, false)
//!     .unwrap()
//!     .unwrap();
//! assert!(lo < hi);
//! ```

mod error;
pub mod graphics;
pub mod histogram;
pub mod image;

pub use error::{Error, Result};
pub use graphics::{Point, fill_polygon};
pub use histogram::find_min_max_percentile;
pub use image::{ByteImage, FloatImage};
