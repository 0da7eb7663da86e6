//! End-to-end regression tests for blend-mask generation
//!
//! - rgb_luminance
//! - find_contrast_threshold
//! - build_blend_mask

use std::sync::Arc;

use lumask_core::FloatImage;
use lumask_filter::FftContext;
use lumask_mask::{build_blend_mask, find_contrast_threshold, rgb_luminance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REC709: [f32; 3] = [0.2126, 0.7152, 0.0722];

fn ctx() -> Arc<FftContext> {
    Arc::new(FftContext::new())
}

/// Three channel planes of a well-exposed scene with sensor-like noise
fn noisy_channels(width: u32, height: u32, seed: u64) -> (FloatImage, FloatImage, FloatImage) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (width * height) as usize;
    let mut make = |base: f32| {
        let data = (0..n).map(|_| base + rng.gen_range(-150.0..150.0)).collect();
        FloatImage::from_data(width, height, data).unwrap()
    };
    (make(6000.0), make(7000.0), make(4000.0))
}

#[test]
fn test_pipeline_luminance_to_mask() {
    let (r, g, b) = noisy_channels(160, 160, 41);
    let ctx = ctx();

    let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();
    assert_eq!(lum.dimensions(), (160, 160));

    let amount = 0.75;
    let (mask, threshold) =
        build_blend_mask(&lum, 0.0, amount, true, 2.0, 1.0, &ctx, false).unwrap();

    assert!(
        threshold > 0.0 && threshold <= 0.99,
        "threshold {threshold} out of range"
    );
    assert_eq!(mask.dimensions(), lum.dimensions());
    for &v in mask.data() {
        assert!(
            (-1e-3..=amount + 1e-3).contains(&v),
            "mask value {v} outside [0, {amount}]"
        );
    }
}

#[test]
fn test_pipeline_deterministic() {
    let (r, g, b) = noisy_channels(160, 120, 43);
    let ctx = ctx();
    let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();

    let (mask_a, t_a) = build_blend_mask(&lum, 0.0, 0.6, true, 2.0, 1.0, &ctx, false).unwrap();
    let (mask_b, t_b) = build_blend_mask(&lum, 0.0, 0.6, true, 2.0, 1.0, &ctx, false).unwrap();

    assert_eq!(t_a, t_b);
    assert_eq!(mask_a.data(), mask_b.data());
}

#[test]
fn test_lower_threshold_blends_harder() {
    // The sigmoid is monotonic in contrast / threshold, so halving the
    // threshold can only raise the mask on a textured image.
    let (r, g, b) = noisy_channels(120, 120, 47);
    let ctx = ctx();
    let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();

    let (strong, _) = build_blend_mask(&lum, 0.05, 1.0, false, 2.0, 1.0, &ctx, false).unwrap();
    let (weak, _) = build_blend_mask(&lum, 0.5, 1.0, false, 2.0, 1.0, &ctx, false).unwrap();

    let mean = |m: &FloatImage| m.data().iter().map(|&v| v as f64).sum::<f64>();
    assert!(mean(&strong) > mean(&weak));
}

#[test]
fn test_amount_scales_mask_linearly() {
    // Every stage after the sigmoid is linear, so the amount is a pure
    // scale factor on the mask.
    let (r, g, b) = noisy_channels(120, 120, 53);
    let ctx = ctx();
    let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();

    let (full, t_full) = build_blend_mask(&lum, 0.1, 1.0, false, 2.0, 1.0, &ctx, false).unwrap();
    let (half, t_half) = build_blend_mask(&lum, 0.1, 0.5, false, 2.0, 1.0, &ctx, false).unwrap();

    assert_eq!(t_full, t_half);
    for (a, b) in full.data().iter().zip(half.data()) {
        assert!((a * 0.5 - b).abs() < 1e-4, "scaling broken: {a} vs {b}");
    }
}

#[test]
fn test_threshold_search_standalone_agrees() {
    let (r, g, b) = noisy_channels(160, 160, 59);
    let lum = rgb_luminance(&r, &g, &b, REC709, false).unwrap();

    let direct = find_contrast_threshold(&lum, 1.0, false);
    let (_, via_mask) = build_blend_mask(&lum, 0.0, 0.5, true, 2.0, 1.0, &ctx(), false).unwrap();
    assert_eq!(direct, via_mask);
}
