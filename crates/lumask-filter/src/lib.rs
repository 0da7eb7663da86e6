//! lumask-filter - Kernels, spectral convolution and noise detection
//!
//! This crate provides the frequency-domain machinery of the toolkit:
//!
//! - Normalized Gaussian kernel construction
//! - FFT-based 2D convolution with plan reuse and a shared planning lock
//! - Impulse (salt-and-pepper) noise detection

mod error;
pub mod impulse;
pub mod kernel;
pub mod spectral;

pub use error::{FilterError, FilterResult};
pub use impulse::mark_impulse;
pub use kernel::{Kernel, gaussian_kernel};
pub use spectral::{Convolution, FftContext, gaussian_blur};
