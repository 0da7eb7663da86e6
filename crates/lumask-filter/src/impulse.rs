//! Impulse-noise detection
//!
//! Flags isolated single-pixel outliers (salt-and-pepper noise) by
//! comparing each pixel's high-pass residual against the average residual
//! of its 5x5 neighborhood. A sustained edge raises the neighborhood
//! average along with the pixel itself and is not flagged; an impulse
//! stands out against quiet neighbors.

use std::sync::Arc;

use rayon::prelude::*;

use lumask_core::{ByteImage, FloatImage};

use crate::error::FilterResult;
use crate::spectral::{FftContext, gaussian_blur};

/// Mark likely impulse-noise pixels of `src`.
///
/// A Gaussian low-pass copy with sigma `max(2, thresh - 1)` supplies the
/// high-pass residual `|src - lowpass|` per pixel. The pixel is flagged
/// when its residual exceeds the average residual of the surrounding 5x5
/// block (excluding itself), scaled by `max(1, 5.5 - thresh) / 24`.
/// Near the borders the block is truncated to the valid image area,
/// never wrapped or zero-filled.
///
/// Returns a byte map of the same dimensions, 1 where a pixel is judged
/// an impulse.
pub fn mark_impulse(
    src: &FloatImage,
    thresh: f32,
    ctx: &Arc<FftContext>,
    multithread: bool,
) -> FilterResult<ByteImage> {
    let width = src.width() as usize;
    let height = src.height() as usize;

    // Low-pass copy for the high-pass residual
    let mut lpf = src.create_template();
    gaussian_blur(src, &mut lpf, 2.0f32.max(thresh - 1.0), ctx, multithread)?;

    let impthr = 1.0f32.max(5.5 - thresh);
    let impthr_div24 = impthr / 24.0;

    let src_data = src.data();
    let lpf_data = lpf.data();

    let mut map = ByteImage::new(src.width(), src.height())?;

    let residual = |x: usize, y: usize| (src_data[y * width + x] - lpf_data[y * width + x]).abs();

    let mark_row = |(i, out_row): (usize, &mut [u8])| {
        let i1_lo = i.saturating_sub(2);
        let i1_hi = (i + 2).min(height - 1);

        for (j, flag) in out_row.iter_mut().enumerate() {
            let hpfabs = residual(j, i);

            // Block average of high-pass data, truncated at the borders
            let j1_lo = j.saturating_sub(2);
            let j1_hi = (j + 2).min(width - 1);
            let mut hfnbrave = 0.0f32;
            for i1 in i1_lo..=i1_hi {
                for j1 in j1_lo..=j1_hi {
                    hfnbrave += residual(j1, i1);
                }
            }

            *flag = (hpfabs > (hfnbrave - hpfabs) * impthr_div24) as u8;
        }
    };

    if multithread {
        map.data_mut()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(mark_row);
    } else {
        map.data_mut()
            .chunks_mut(width)
            .enumerate()
            .for_each(mark_row);
    }

    Ok(map)
}
