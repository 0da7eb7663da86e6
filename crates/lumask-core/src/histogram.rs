//! Histogram-based order statistics
//!
//! Finds percentile-indexed values of large float slices without sorting.
//! A bucketed histogram over the data range is built in O(n), then the
//! cumulative counts are walked to the requested ranks. Compared to a full
//! sort this trades at most one bucket of resolution (<= 1/65536 of the
//! data range for large inputs) for linear time and small memory.
//!
//! Memory usage is `histo_size * 4` bytes per participating thread, with
//! `histo_size` in [1, 65536].

use log::trace;
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Per-thread overhead only pays off when each thread gets at least this
/// many samples per already-spawned thread.
const SAMPLES_PER_THREAD: usize = 16384;

/// Find the values at two fractional ranks of `data`.
///
/// `min_prct` and `max_prct` are fractions in [0, 1] with
/// `min_prct <= max_prct`. Returns `(min_out, max_out)`, the interpolated
/// order statistics at those ranks, both clamped to the true data range.
///
/// Degenerate inputs have defined trivial results: an empty slice returns
/// `None`, and a slice where every value is numerically identical returns
/// that value for both ranks.
///
/// The reduction and histogram merge order depend on the thread count, so
/// results may differ in the last bits of precision between runs.
///
/// # Errors
///
/// Returns `Error::InvalidParameter` if either percentile is outside
/// [0, 1] or `min_prct > max_prct`.
pub fn find_min_max_percentile(
    data: &[f32],
    min_prct: f32,
    max_prct: f32,
    multithread: bool,
) -> Result<Option<(f32, f32)>> {
    if !(0.0..=1.0).contains(&min_prct) || !(0.0..=1.0).contains(&max_prct) {
        return Err(Error::InvalidParameter(format!(
            "percentiles must be in [0, 1], got {min_prct} and {max_prct}"
        )));
    }
    if min_prct > max_prct {
        return Err(Error::InvalidParameter(format!(
            "min_prct {min_prct} > max_prct {max_prct}"
        )));
    }

    let size = data.len();
    if size == 0 {
        return Ok(None);
    }

    // Rough thread-count estimate: spawning more threads only pays off
    // above a per-thread sample count, both for the minmax reduction and
    // the histogram build.
    let mut num_threads = 1usize;
    if multithread {
        let max_threads = rayon::current_num_threads();
        while size > num_threads * num_threads * SAMPLES_PER_THREAD && num_threads < max_threads {
            num_threads += 1;
        }
    }

    // Min and max of the data determine the histogram scale factor.
    let (min_val, max_val) = if num_threads == 1 {
        data.iter()
            .fold((data[0], data[0]), |(mn, mx), &v| (mn.min(v), mx.max(v)))
    } else {
        let chunk_len = size.div_ceil(num_threads);
        data.par_chunks(chunk_len)
            .map(|chunk| {
                chunk
                    .iter()
                    .fold((chunk[0], chunk[0]), |(mn, mx), &v| (mn.min(v), mx.max(v)))
            })
            .reduce(
                || (f32::INFINITY, f32::NEG_INFINITY),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            )
    };

    // Fast exit, also avoids division by zero in the scale factor.
    if (max_val - min_val).abs() == 0.0 {
        return Ok(Some((min_val, min_val)));
    }

    // For small inputs (thumbnails) shrink the histogram to the data size.
    let histo_size = size.min(65536);
    let scale = (histo_size - 1) as f32 / (max_val - min_val);

    let bucket = |v: f32| -> usize { ((scale * (v - min_val)) as usize).min(histo_size - 1) };

    let histo: Vec<u32> = if num_threads == 1 {
        let mut histo = vec![0u32; histo_size];
        for &v in data {
            histo[bucket(v)] += 1;
        }
        histo
    } else {
        // One private histogram per chunk, merged afterward.
        let chunk_len = size.div_ceil(num_threads);
        data.par_chunks(chunk_len)
            .fold(
                || vec![0u32; histo_size],
                |mut histo, chunk| {
                    for &v in chunk {
                        histo[bucket(v)] += 1;
                    }
                    histo
                },
            )
            .reduce(
                || vec![0u32; histo_size],
                |mut a, b| {
                    for (dst, src) in a.iter_mut().zip(&b) {
                        *dst += *src;
                    }
                    a
                },
            )
    };

    trace!(
        "percentile search: {} samples, {} buckets, {} thread(s)",
        size,
        histo_size,
        num_threads
    );

    // Walk the cumulative histogram to the rank for min_prct, then keep
    // walking to the rank for max_prct (max_prct >= min_prct).
    let mut k = 0usize;
    let mut count = 0usize;

    let min_out = walk_to_rank(&histo, &mut k, &mut count, min_prct * size as f32);
    let min_out = (min_out / scale + min_val).clamp(min_val, max_val);

    let max_out = walk_to_rank(&histo, &mut k, &mut count, max_prct * size as f32);
    let max_out = (max_out / scale + min_val).clamp(min_val, max_val);

    Ok(Some((min_out, max_out)))
}

/// Advance the cumulative walk until `count` reaches `rank`, then
/// interpolate a fractional bucket index from the counts just below and
/// at the target bucket.
fn walk_to_rank(histo: &[u32], k: &mut usize, count: &mut usize, rank: f32) -> f32 {
    while (*count as f32) < rank {
        *count += histo[*k] as usize;
        *k += 1;
    }

    if *k > 0 {
        let below = *count - histo[*k - 1] as usize;
        let c0 = *count as f32 - rank;
        let c1 = rank - below as f32;
        (c1 * *k as f32 + c0 * (*k - 1) as f32) / (c0 + c1)
    } else {
        *k as f32
    }
}
