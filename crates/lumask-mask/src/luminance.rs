//! Weighted RGB-to-luminance conversion

use rayon::prelude::*;

use lumask_core::FloatImage;

use crate::error::MaskResult;

/// Build a luminance plane as the per-pixel weighted sum of three
/// channel planes. The weights are the working color space's Y row;
/// they are applied as given, without renormalization.
///
/// # Errors
///
/// Returns an error if the channel planes have differing dimensions.
pub fn rgb_luminance(
    r: &FloatImage,
    g: &FloatImage,
    b: &FloatImage,
    weights: [f32; 3],
    multithread: bool,
) -> MaskResult<FloatImage> {
    r.check_same_size(g)?;
    r.check_same_size(b)?;

    let mut lum = r.create_template();
    let w = r.width() as usize;
    let [wr, wg, wb] = weights;

    let combine_row = |(j, row): (usize, &mut [f32])| {
        let rr = &r.data()[j * w..(j + 1) * w];
        let gr = &g.data()[j * w..(j + 1) * w];
        let br = &b.data()[j * w..(j + 1) * w];
        for (i, cell) in row.iter_mut().enumerate() {
            *cell = rr[i] * wr + gr[i] * wg + br[i] * wb;
        }
    };

    if multithread {
        lum.data_mut()
            .par_chunks_mut(w)
            .enumerate()
            .for_each(combine_row);
    } else {
        lum.data_mut().chunks_mut(w).enumerate().for_each(combine_row);
    }

    Ok(lum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

    #[test]
    fn test_weighted_sum() {
        let r = FloatImage::new_with_value(8, 6, 100.0).unwrap();
        let g = FloatImage::new_with_value(8, 6, 200.0).unwrap();
        let b = FloatImage::new_with_value(8, 6, 50.0).unwrap();

        let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();
        let expected = 100.0 * 0.2126 + 200.0 * 0.7152 + 50.0 * 0.0722;
        for &v in lum.data() {
            assert_relative_eq!(v, expected, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_size_mismatch() {
        let r = FloatImage::new(8, 6).unwrap();
        let g = FloatImage::new(8, 6).unwrap();
        let b = FloatImage::new(8, 7).unwrap();
        assert!(rgb_luminance(&r, &g, &b, REC709, false).is_err());
    }

    #[test]
    fn test_multithread_matches_single() {
        let mut r = FloatImage::new(16, 12).unwrap();
        let mut g = FloatImage::new(16, 12).unwrap();
        let mut b = FloatImage::new(16, 12).unwrap();
        for y in 0..12u32 {
            for x in 0..16u32 {
                r.set_pixel(x, y, (x * y) as f32).unwrap();
                g.set_pixel(x, y, (x + y) as f32).unwrap();
                b.set_pixel(x, y, x as f32).unwrap();
            }
        }

        let single = rgb_luminance(&r, &g, &b, REC709, false).unwrap();
        let multi = rgb_luminance(&r, &g, &b, REC709, true).unwrap();
        assert_eq!(single.data(), multi.data());
    }
}
