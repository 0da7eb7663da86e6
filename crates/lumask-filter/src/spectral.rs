//! Spectral (FFT-based) convolution
//!
//! Convolves an image with a square kernel in the frequency domain:
//! both operands are padded to FFT-efficient dimensions, transformed,
//! multiplied pointwise and inverse-transformed. For the large Gaussian
//! kernels the mask builder uses, this beats direct convolution by a wide
//! margin.
//!
//! All planning and execution serializes on a shared [`FftContext`]
//! handle: at most one plan is built and one convolution runs at a time
//! process-wide. The padded scratch buffers live inside [`Convolution`]
//! and are reused across calls, so a plan built once per (kernel, W, H)
//! combination amortizes over repeated invocations.

use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use lumask_core::FloatImage;

use crate::error::{FilterError, FilterResult};
use crate::kernel::{Kernel, gaussian_kernel};

/// Shared FFT planning and execution lock.
///
/// Transform planning mutates shared planner state and is not safe to run
/// concurrently; execution shares the scratch layout. Both acquire this
/// lock, so a single `FftContext` should be created per process (or per
/// isolated pipeline) and handed to every [`Convolution`].
pub struct FftContext {
    planner: Mutex<FftPlanner<f32>>,
}

impl FftContext {
    /// Create a new context with an empty planner cache
    pub fn new() -> Self {
        FftContext {
            planner: Mutex::new(FftPlanner::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FftPlanner<f32>> {
        self.planner.lock()
    }
}

impl Default for FftContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Round up to the next power of two
fn round_up_pow2(dim: usize) -> usize {
    dim.next_power_of_two()
}

/// Smallest FFT-efficient dimension >= `dim`.
///
/// FFT sizes of the form 2^a 3^b 5^c 7^d 11^e 13^f with e+f in {0, 1}
/// transform fastest. Starting from the next power of two, a fixed table
/// of nearby smooth-factorization candidates is tested in ascending
/// order. Not exhaustive, but covers image dimensions up to 100MPix.
fn find_fast_dim(dim: usize) -> usize {
    let d1 = round_up_pow2(dim);
    let candidates = [
        d1 / 128 * 65,
        d1 / 64 * 33,
        d1 / 512 * 273,
        d1 / 16 * 9,
        d1 / 8 * 5,
        d1 / 16 * 11,
        d1 / 128 * 91,
        d1 / 4 * 3,
        d1 / 64 * 49,
        d1 / 16 * 13,
        d1 / 8 * 7,
        d1,
    ];

    for &c in &candidates {
        if c >= dim {
            return c;
        }
    }

    d1
}

/// Out-of-place rectangular transpose: `dst[x * h + y] = src[y * w + x]`
fn transpose(src: &[Complex<f32>], dst: &mut [Complex<f32>], w: usize, h: usize) {
    for y in 0..h {
        for x in 0..w {
            dst[x * h + y] = src[y * w + x];
        }
    }
}

/// A convolution plan for one (kernel, width, height) combination.
///
/// Owns the padded scratch buffer, the precomputed kernel spectrum and
/// the forward/inverse transform plans. Create once, call
/// [`execute`](Convolution::execute) repeatedly.
pub struct Convolution {
    ctx: Arc<FftContext>,
    /// Kernel side length
    k: usize,
    w: usize,
    h: usize,
    /// Padded dimensions
    pw: usize,
    ph: usize,
    fwd_row: Arc<dyn Fft<f32>>,
    fwd_col: Arc<dyn Fft<f32>>,
    inv_row: Arc<dyn Fft<f32>>,
    inv_col: Arc<dyn Fft<f32>>,
    /// Frequency-domain kernel, padded layout
    kernel_fft: Vec<Complex<f32>>,
    /// Padded scratch image
    buf: Vec<Complex<f32>>,
    /// Transpose scratch
    scratch: Vec<Complex<f32>>,
    multithread: bool,
}

impl Convolution {
    /// Build a convolution plan.
    ///
    /// Pads to FFT-efficient dimensions >= `width + K` and `height + K`,
    /// plans the transforms and precomputes the kernel spectrum. Planning
    /// holds the context lock.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidParameters` if width or height is 0.
    pub fn new(
        kernel: &Kernel,
        width: u32,
        height: u32,
        ctx: Arc<FftContext>,
        multithread: bool,
    ) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidParameters(format!(
                "invalid convolution dimensions: {width}x{height}"
            )));
        }

        let k = kernel.size() as usize;
        let w = width as usize;
        let h = height as usize;
        let pw = find_fast_dim(w + k);
        let ph = find_fast_dim(h + k);

        debug!("convolution plan: {w}x{h} kernel {k}x{k} padded to {pw}x{ph}");

        // Planning and kernel preparation both run under the shared lock.
        let lock_handle = Arc::clone(&ctx);
        let mut planner = lock_handle.lock();
        let fwd_row = planner.plan_fft_forward(pw);
        let fwd_col = planner.plan_fft_forward(ph);
        let inv_row = planner.plan_fft_inverse(pw);
        let inv_col = planner.plan_fft_inverse(ph);

        let mut conv = Convolution {
            ctx,
            k,
            w,
            h,
            pw,
            ph,
            fwd_row,
            fwd_col,
            inv_row,
            inv_col,
            kernel_fft: Vec::new(),
            buf: vec![Complex::new(0.0, 0.0); pw * ph],
            scratch: vec![Complex::new(0.0, 0.0); pw * ph],
            multithread,
        };
        conv.prepare_kernel(kernel);
        drop(planner);

        Ok(conv)
    }

    /// Transform the kernel once: placed at the top-left of the padded
    /// buffer, zero elsewhere.
    fn prepare_kernel(&mut self, kernel: &Kernel) {
        let k = self.k;
        for y in 0..self.ph {
            for x in 0..self.pw {
                let val = if y < k && x < k {
                    kernel.get(x as u32, y as u32)
                } else {
                    0.0
                };
                self.buf[y * self.pw + x] = Complex::new(val, 0.0);
            }
        }
        self.forward();
        self.kernel_fft = self.buf.clone();
    }

    /// Forward 2D FFT of `buf` in place: row transforms, transpose,
    /// column transforms (as rows), transpose back.
    fn forward(&mut self) {
        fft_rows(&mut self.buf, self.pw, &self.fwd_row, self.multithread);
        transpose(&self.buf, &mut self.scratch, self.pw, self.ph);
        fft_rows(&mut self.scratch, self.ph, &self.fwd_col, self.multithread);
        transpose(&self.scratch, &mut self.buf, self.ph, self.pw);
    }

    /// Inverse 2D FFT of `buf` in place (unnormalized)
    fn inverse(&mut self) {
        fft_rows(&mut self.buf, self.pw, &self.inv_row, self.multithread);
        transpose(&self.buf, &mut self.scratch, self.pw, self.ph);
        fft_rows(&mut self.scratch, self.ph, &self.inv_col, self.multithread);
        transpose(&self.scratch, &mut self.buf, self.ph, self.pw);
    }

    /// Convolve `src` into `dst`.
    ///
    /// Pixels needed outside the source bounds are edge-clamped (not
    /// zero-padded, which would produce dark fringing at the borders).
    /// The unpadded result is written to `dst` aligned with the original
    /// image coordinates. Holds the context lock for the duration:
    /// one convolution runs at a time process-wide.
    ///
    /// # Errors
    ///
    /// Returns an error if `src` or `dst` do not match the planned
    /// dimensions.
    pub fn execute(&mut self, src: &FloatImage, dst: &mut FloatImage) -> FilterResult<()> {
        if src.width() as usize != self.w || src.height() as usize != self.h {
            return Err(FilterError::InvalidParameters(format!(
                "source is {}x{}, plan is {}x{}",
                src.width(),
                src.height(),
                self.w,
                self.h
            )));
        }
        src.check_same_size(dst)?;

        let ctx = Arc::clone(&self.ctx);
        let _serialize = ctx.lock();

        let kernel_radius = (self.k / 2) as i64;
        let (pw, ph) = (self.pw, self.ph);

        // Edge-clamped copy of the source into the padded buffer,
        // shifted by the kernel radius.
        let fill_row = |(y, row): (usize, &mut [Complex<f32>])| {
            for (x, cell) in row.iter_mut().enumerate() {
                let val = src.get_clamped(x as i64 - kernel_radius, y as i64 - kernel_radius);
                *cell = Complex::new(val, 0.0);
            }
        };
        if self.multithread {
            self.buf.par_chunks_mut(pw).enumerate().for_each(fill_row);
        } else {
            self.buf.chunks_mut(pw).enumerate().for_each(fill_row);
        }

        self.forward();

        // Pointwise complex multiply with the kernel spectrum
        if self.multithread {
            self.buf
                .par_iter_mut()
                .zip(&self.kernel_fft)
                .for_each(|(cell, &kf)| *cell *= kf);
        } else {
            for (cell, &kf) in self.buf.iter_mut().zip(&self.kernel_fft) {
                *cell *= kf;
            }
        }

        self.inverse();

        // Copy back the unpadded result, offset to realign with the
        // source coordinates, normalized for the unscaled transforms.
        let offset = 2 * (self.k / 2);
        let norm = (pw * ph) as f32;
        let buf = &self.buf;
        let w = self.w;
        let copy_row = |(y, row): (usize, &mut [f32])| {
            let src_row = &buf[(y + offset) * pw..(y + offset) * pw + pw];
            for (x, out) in row.iter_mut().enumerate() {
                *out = src_row[x + offset].re / norm;
            }
        };
        if self.multithread {
            dst.data_mut()
                .par_chunks_mut(w)
                .enumerate()
                .for_each(copy_row);
        } else {
            dst.data_mut().chunks_mut(w).enumerate().for_each(copy_row);
        }

        Ok(())
    }
}

/// Run a length-`row_len` FFT over every row of `data`
fn fft_rows(data: &mut [Complex<f32>], row_len: usize, fft: &Arc<dyn Fft<f32>>, multithread: bool) {
    if multithread {
        data.par_chunks_mut(row_len).for_each(|row| fft.process(row));
    } else {
        for row in data.chunks_mut(row_len) {
            fft.process(row);
        }
    }
}

/// Gaussian-blur `src` into `dst` through the spectral engine.
///
/// Builds the kernel for `sigma`, plans a one-shot convolution and runs
/// it. For repeated blurs at the same sigma and dimensions, build a
/// [`Convolution`] once and reuse it instead.
pub fn gaussian_blur(
    src: &FloatImage,
    dst: &mut FloatImage,
    sigma: f32,
    ctx: &Arc<FftContext>,
    multithread: bool,
) -> FilterResult<()> {
    let kernel = gaussian_kernel(sigma)?;
    let mut conv = Convolution::new(&kernel, src.width(), src.height(), Arc::clone(ctx), multithread)?;
    conv.execute(src, dst)
}
