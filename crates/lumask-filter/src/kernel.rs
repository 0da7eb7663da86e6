//! Convolution kernels
//!
//! Square 2D kernels for the spectral convolution engine, plus the
//! Gaussian builder. Kernels are square by construction, which is what
//! the convolution engine requires.

use crate::error::{FilterError, FilterResult};

/// A square 2D convolution kernel
#[derive(Debug, Clone)]
pub struct Kernel {
    /// Side length (width and height)
    size: u32,
    /// Kernel data (row-major order)
    data: Vec<f32>,
}

impl Kernel {
    /// Create a kernel from a slice of values.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidKernel` if `size` is zero or the data
    /// length is not `size * size`.
    pub fn from_slice(size: u32, data: &[f32]) -> FilterResult<Self> {
        if size == 0 {
            return Err(FilterError::InvalidKernel("size must be > 0".into()));
        }
        let expected = (size as usize) * (size as usize);
        if data.len() != expected {
            return Err(FilterError::InvalidKernel(format!(
                "data length {} doesn't match {size}x{size} = {expected}",
                data.len()
            )));
        }

        Ok(Kernel {
            size,
            data: data.to_vec(),
        })
    }

    /// Side length of the kernel
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Get a value at (x, y)
    ///
    /// # Panics
    ///
    /// Panics if `x >= size` or `y >= size`.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.size as usize) + (x as usize)]
    }

    /// Kernel data in row-major order
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Sum of all kernel values
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}

/// Build a normalized 2D Gaussian kernel for the given sigma.
///
/// The side length is the smallest odd integer large enough that the
/// Gaussian at the kernel edge falls below 0.5% of its peak. Each
/// separable row is sampled with a Simpson's-rule integral of the
/// Gaussian over the unit pixel interval rather than point sampling,
/// which avoids aliasing for small sigma. The outer product of the row
/// with itself is normalized so all entries sum to 1.
///
/// # Errors
///
/// Returns `FilterError::InvalidParameters` if `sigma` is not positive.
pub fn gaussian_kernel(sigma: f32) -> FilterResult<Kernel> {
    if !(sigma > 0.0) {
        return Err(FilterError::InvalidParameters(format!(
            "sigma must be > 0, got {sigma}"
        )));
    }

    const EDGE_THRESHOLD: f32 = 0.005;
    let sz = (((1.0 + 2.0 * (-2.0 * sigma * sigma * EDGE_THRESHOLD.ln()).sqrt()).floor() as i32
        + 1)
        | 1) as usize;

    let two_sigma2 = 2.0 * sigma * sigma;
    let gauss = |x: f32| (-x * x / two_sigma2).exp();
    let gauss_integral =
        |a: f32, b: f32| ((b - a) / 6.0) * (gauss(a) + 4.0 * gauss((a + b) / 2.0) + gauss(b));

    let halfsz = (sz / 2) as f32;
    let row: Vec<f32> = (0..sz)
        .map(|i| {
            let x = i as f32 - halfsz;
            gauss_integral(x - 0.5, x + 0.5)
        })
        .collect();

    let mut data = vec![0.0f32; sz * sz];
    let mut total = 0.0f64;
    for i in 0..sz {
        for j in 0..sz {
            let val = row[i] * row[j];
            data[i * sz + j] = val;
            total += val as f64;
        }
    }
    let total = total as f32;
    for val in &mut data {
        *val /= total;
    }

    Ok(Kernel {
        size: sz as u32,
        data,
    })
}
