//! Blend-mask generation
//!
//! Converts per-pixel local contrast into a smooth [0, amount] weighting:
//! a sigmoid centered on the contrast threshold maps contrast to blend
//! strength, border pixels replicate the nearest interior values, and the
//! result is smoothed with a spectral Gaussian blur to avoid block
//! artifacts in downstream blending.

use std::sync::Arc;

use rayon::prelude::*;

use lumask_core::FloatImage;
use lumask_filter::{FftContext, gaussian_blur};

use crate::error::{MaskError, MaskResult};
use crate::tile::{CONTRAST_SCALE, blend_factor, find_contrast_threshold, local_contrast};

/// Build a per-pixel blend mask from a luminance plane.
///
/// When `auto_contrast` is set, the threshold comes from the two-pass
/// flattest-tile search; otherwise the caller-supplied
/// `contrast_threshold` is used as-is. A threshold of 0 (supplied or
/// from the fallback of the search) produces a constant mask of
/// `amount`. Otherwise every interior pixel gets
/// `amount / (1 + exp(16 - 16 * contrast / threshold))`, the 2-pixel
/// border replicates the nearest interior row/column, and the mask is
/// blurred with a Gaussian of `blur_radius`.
///
/// Returns the mask and the threshold that was used.
///
/// # Errors
///
/// Returns an error if `amount` is outside [0, 1], `blur_radius` is not
/// positive, or the image is smaller than the 5x5 gradient stencil.
#[allow(clippy::too_many_arguments)]
pub fn build_blend_mask(
    luminance: &FloatImage,
    contrast_threshold: f32,
    amount: f32,
    auto_contrast: bool,
    blur_radius: f32,
    luminance_factor: f32,
    ctx: &Arc<FftContext>,
    multithread: bool,
) -> MaskResult<(FloatImage, f32)> {
    if !(0.0..=1.0).contains(&amount) {
        return Err(MaskError::InvalidParameters(format!(
            "amount must be in [0, 1], got {amount}"
        )));
    }
    if !(blur_radius > 0.0) {
        return Err(MaskError::InvalidParameters(format!(
            "blur_radius must be > 0, got {blur_radius}"
        )));
    }

    let w = luminance.width() as usize;
    let h = luminance.height() as usize;
    if w < 5 || h < 5 {
        return Err(MaskError::ImageTooSmall {
            width: luminance.width(),
            height: luminance.height(),
        });
    }

    let threshold = if auto_contrast {
        find_contrast_threshold(luminance, luminance_factor, multithread)
    } else {
        contrast_threshold
    };

    let mut mask = luminance.create_template();

    if threshold == 0.0 {
        // Flat image fallback: constant blend strength everywhere.
        mask.fill(amount);
        return Ok((mask, threshold));
    }

    let scale = CONTRAST_SCALE * luminance_factor;

    // Interior pixels: sigmoid of the local contrast
    let fill_row = |(j, row): (usize, &mut [f32])| {
        if j < 2 || j >= h - 2 {
            return;
        }
        for (i, cell) in row.iter_mut().enumerate().take(w - 2).skip(2) {
            let contrast = local_contrast(luminance, i, j, scale);
            *cell = amount * blend_factor(contrast, threshold);
        }
    };
    if multithread {
        mask.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(fill_row);
    } else {
        mask.data_mut().chunks_mut(w).enumerate().for_each(fill_row);
    }

    replicate_borders(&mut mask);

    // Blur the mask to smooth transitions
    let mut blurred = mask.create_template();
    gaussian_blur(&mask, &mut blurred, blur_radius, ctx, multithread)?;

    Ok((blurred, threshold))
}

/// Fill the 2-pixel border by replicating the nearest interior
/// row/column; gradients there would need out-of-bounds samples.
fn replicate_borders(mask: &mut FloatImage) {
    let w = mask.width() as usize;
    let h = mask.height() as usize;
    let data = mask.data_mut();

    // upper border
    for j in 0..2 {
        let (top, interior) = data.split_at_mut(2 * w);
        top[j * w + 2..j * w + w - 2].copy_from_slice(&interior[2..w - 2]);
    }
    // lower border
    for j in h - 2..h {
        let (interior, bottom) = data.split_at_mut((h - 2) * w);
        let src_row = &interior[(h - 3) * w..(h - 3) * w + w];
        bottom[(j - (h - 2)) * w + 2..(j - (h - 2)) * w + w - 2]
            .copy_from_slice(&src_row[2..w - 2]);
    }
    // left and right borders
    for j in 0..h {
        let row = &mut data[j * w..(j + 1) * w];
        row[0] = row[2];
        row[1] = row[2];
        row[w - 2] = row[w - 3];
        row[w - 1] = row[w - 3];
    }
}
