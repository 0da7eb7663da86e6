//! Tile contrast analysis
//!
//! Scans an image in square tiles to find the flattest well-exposed
//! region, then derives a local-contrast threshold from it. The search
//! runs in two passes: a coarse non-overlapping scan that accepts
//! immediately when it finds a sufficiently flat tile (most images do),
//! and a finer overlapping scan with a single-pixel-stride refinement
//! around the best coarse hit.

use log::debug;
use rayon::prelude::*;

use lumask_core::FloatImage;

use crate::error::{MaskError, MaskResult};

/// Gradient magnitudes are scaled into threshold units relative to a
/// 16-bit-style luminance range.
pub(crate) const CONTRAST_SCALE: f32 = 0.0625 / 327.68;

/// Tiles darker or brighter than this luminance window (divided by the
/// caller's luminance factor) carry no usable texture information.
const MIN_TILE_LUMINANCE: f32 = 2000.0;
const MAX_TILE_LUMINANCE: f32 = 20000.0;

/// Tiles with relative variance below this are flat but noiseless and
/// would bias the threshold toward zero.
const MIN_TILE_VARIANCE: f32 = 0.5;

/// Sigmoid blend factor, in ]0, 1], with the inflection point at
/// (threshold, 0.5).
#[inline]
pub(crate) fn blend_factor(val: f32, threshold: f32) -> f32 {
    1.0 / (1.0 + (16.0 - 16.0 * val / threshold).exp())
}

/// Scaled 4-neighbor local-contrast value at (x, y), combining 1-pixel
/// and 2-pixel offsets. Requires 2 <= x < W-2 and 2 <= y < H-2.
#[inline]
pub(crate) fn local_contrast(lum: &FloatImage, x: usize, y: usize, scale: f32) -> f32 {
    let w = lum.width() as usize;
    let d = lum.data();
    let idx = y * w + x;
    let sqr = |v: f32| v * v;
    (sqr(d[idx + 1] - d[idx - 1])
        + sqr(d[idx + w] - d[idx - w])
        + sqr(d[idx + 2] - d[idx - 2])
        + sqr(d[idx + 2 * w] - d[idx - 2 * w]))
    .sqrt()
        * scale
}

/// Average luminance of the tile at (tile_x, tile_y)
fn tile_average(lum: &FloatImage, tile_y: usize, tile_x: usize, tilesize: usize) -> f32 {
    let mut avg = 0.0f32;
    for y in tile_y..tile_y + tilesize {
        let row = &lum.row(y as u32)[tile_x..tile_x + tilesize];
        avg += row.iter().sum::<f32>();
    }
    avg / (tilesize * tilesize) as f32
}

/// Variance of the tile, normalized by tile area and average luminance
/// so that tiles of differing exposure compare fairly.
fn tile_variance(lum: &FloatImage, tile_y: usize, tile_x: usize, tilesize: usize, avg: f32) -> f32 {
    let mut var = 0.0f32;
    for y in tile_y..tile_y + tilesize {
        let row = &lum.row(y as u32)[tile_x..tile_x + tilesize];
        var += row.iter().map(|&v| (v - avg) * (v - avg)).sum::<f32>();
    }
    var / ((tilesize * tilesize) as f32 * avg)
}

/// Variance of one tile, or infinity if the tile is disqualified by
/// the exposure window or the variance floor.
fn qualified_variance(
    lum: &FloatImage,
    tile_y: usize,
    tile_x: usize,
    tilesize: usize,
    min_luminance: f32,
    max_luminance: f32,
) -> f32 {
    let avg = tile_average(lum, tile_y, tile_x, tilesize);
    if avg < min_luminance || avg > max_luminance {
        // too dark or too bright
        return f32::INFINITY;
    }
    let var = tile_variance(lum, tile_y, tile_x, tilesize, avg);
    if var < MIN_TILE_VARIANCE {
        f32::INFINITY
    } else {
        var
    }
}

/// Index of the minimum of a flat variance grid
fn min_variance(variances: &[f32], num_tiles_w: usize) -> (f32, usize, usize) {
    let mut minvar = f32::INFINITY;
    let mut min_i = 0;
    let mut min_j = 0;
    for (idx, &var) in variances.iter().enumerate() {
        if var < minvar {
            minvar = var;
            min_i = idx / num_tiles_w;
            min_j = idx % num_tiles_w;
        }
    }
    (minvar, min_i, min_j)
}

/// Derive a contrast threshold from the tile at (tile_x, tile_y).
///
/// Builds the per-pixel local-contrast map of the tile's 2-pixel-inset
/// interior, then scans candidate thresholds c/100 for c in 1..=99 and
/// picks the smallest one under which at most 1% of the interior's blend
/// weight remains above threshold. If no candidate satisfies the bound
/// the scan stops at 0.99, a defined boundary result.
///
/// # Errors
///
/// Returns `MaskError::InvalidParameters` if `tilesize < 5` (the
/// 2-pixel inset leaves no interior) or the tile extends past the
/// image.
pub fn contrast_threshold_for_tile(
    lum: &FloatImage,
    tile_y: usize,
    tile_x: usize,
    tilesize: usize,
    factor: f32,
) -> MaskResult<f32> {
    if tilesize < 5 {
        return Err(MaskError::InvalidParameters(format!(
            "tilesize must be at least 5, got {tilesize}"
        )));
    }
    let w = lum.width() as usize;
    let h = lum.height() as usize;
    if tile_x + tilesize > w || tile_y + tilesize > h {
        return Err(MaskError::InvalidParameters(format!(
            "tile ({tile_x},{tile_y}) of size {tilesize} exceeds {w}x{h} image"
        )));
    }

    Ok(tile_threshold(lum, tile_y, tile_x, tilesize, factor))
}

/// Unchecked scan core; the tile must lie fully inside the image and
/// `tilesize` must be at least 5.
fn tile_threshold(
    lum: &FloatImage,
    tile_y: usize,
    tile_x: usize,
    tilesize: usize,
    factor: f32,
) -> f32 {
    let scale = CONTRAST_SCALE * factor;
    let inset = tilesize - 4;

    let mut contrast = vec![0.0f32; inset * inset];
    for j in 0..inset {
        for i in 0..inset {
            contrast[j * inset + i] =
                local_contrast(lum, tile_x + 2 + i, tile_y + 2 + j, scale);
        }
    }

    let limit = (inset * inset) as f32 / 100.0;

    let mut chosen = 99;
    for c in 1..=99 {
        let threshold = c as f32 / 100.0;
        let sum: f32 = contrast.iter().map(|&v| blend_factor(v, threshold)).sum();
        if sum <= limit {
            chosen = c;
            break;
        }
    }

    chosen as f32 / 100.0
}

/// Two-pass search for the flattest well-exposed tile; returns its
/// derived contrast threshold, or 0 when no usable tile exists (flat
/// image fallback).
pub fn find_contrast_threshold(lum: &FloatImage, luminance_factor: f32, multithread: bool) -> f32 {
    let w = lum.width() as usize;
    let h = lum.height() as usize;
    let min_luminance = MIN_TILE_LUMINANCE / luminance_factor;
    let max_luminance = MAX_TILE_LUMINANCE / luminance_factor;

    for pass in 0..2usize {
        let tilesize = 80 / (pass + 1);
        let skip = if pass == 0 { tilesize } else { tilesize / 4 };
        if w < tilesize || h < tilesize {
            continue;
        }

        let num_tiles_w = (w / skip) as i64 - 3 * pass as i64;
        let num_tiles_h = (h / skip) as i64 - 3 * pass as i64;
        if num_tiles_w <= 0 || num_tiles_h <= 0 {
            continue;
        }
        let num_tiles_w = num_tiles_w as usize;
        let num_tiles_h = num_tiles_h as usize;

        let mut variances = vec![f32::INFINITY; num_tiles_h * num_tiles_w];
        let scan_row = |(i, vrow): (usize, &mut [f32])| {
            let tile_y = i * skip;
            for (j, var) in vrow.iter_mut().enumerate() {
                let tile_x = j * skip;
                *var = qualified_variance(
                    lum,
                    tile_y,
                    tile_x,
                    tilesize,
                    min_luminance,
                    max_luminance,
                );
            }
        };
        if multithread {
            variances
                .par_chunks_mut(num_tiles_w)
                .enumerate()
                .for_each(scan_row);
        } else {
            variances
                .chunks_mut(num_tiles_w)
                .enumerate()
                .for_each(scan_row);
        }

        let (minvar, min_i, min_j) = min_variance(&variances, num_tiles_w);

        if minvar <= 1.0 || pass == 1 {
            let min_y = skip * min_i;
            let min_x = skip * min_j;

            if pass == 0 {
                // A variance <= 1 means we already found a flat region
                // and can skip the second pass.
                let threshold = tile_threshold(lum, min_y, min_x, tilesize, luminance_factor);
                debug!(
                    "contrast tile pass 0: ({min_x},{min_y}) var {minvar}, threshold {threshold}"
                );
                return threshold;
            }

            // Rescan the tiles +-skip pixels around the best tile at
            // single-pixel stride for a better hit rate. The scan is
            // cheap, so it stays on one core.
            let y_lo = min_y.saturating_sub(skip);
            let x_lo = min_x.saturating_sub(skip);
            let y_hi = (min_y + skip).min(h - tilesize);
            let x_hi = (min_x + skip).min(w - tilesize);
            let local_w = x_hi - x_lo + 1;
            let local_h = y_hi - y_lo + 1;

            let mut local = vec![f32::INFINITY; local_h * local_w];
            for i in 0..local_h {
                for j in 0..local_w {
                    local[i * local_w + j] = qualified_variance(
                        lum,
                        y_lo + i,
                        x_lo + j,
                        tilesize,
                        min_luminance,
                        max_luminance,
                    );
                }
            }

            let (minvar, min_i, min_j) = min_variance(&local, local_w);

            // In the second pass a variance up to 8 is still acceptable.
            if minvar <= 8.0 {
                let threshold =
                    tile_threshold(lum, y_lo + min_i, x_lo + min_j, tilesize, luminance_factor);
                debug!(
                    "contrast tile pass 1: ({},{}) var {minvar}, threshold {threshold}",
                    x_lo + min_j,
                    y_lo + min_i
                );
                return threshold;
            }
            debug!("contrast tile search: no usable tile, var {minvar}");
            return 0.0;
        }
    }

    0.0
}
