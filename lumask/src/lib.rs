//! Lumask - contrast-adaptive blend masks for raw image pipelines
//!
//! # Overview
//!
//! Lumask bundles the numerical building blocks a raw-photo engine needs
//! to decide *where* to apply detail processing:
//!
//! - Histogram percentile search over float planes
//! - Automatic contrast-threshold estimation from the flattest tiles
//! - Sigmoid blend-mask generation with spectral Gaussian smoothing
//! - FFT convolution and Gaussian kernel construction
//! - Impulse (salt-and-pepper) pixel detection
//! - Scanline polygon rasterization into float planes
//!
//! # Example
//!
//! ```
//! use lumask::FloatImage;
//!
//! // Create a new single-channel float image
//! let img = FloatImage::new(640, 480).unwrap();
//! assert_eq!(img.width(), 640);
//! assert_eq!(img.height(), 480);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use lumask_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use lumask_filter as filter;
pub use lumask_mask as mask;
