//! Scanline polygon fill
//!
//! Paints polygonal regions into a [`FloatImage`] using the standard
//! even-odd scanline algorithm: per row, the polygon-edge intersections
//! are collected, sorted, and the cells between consecutive pairs filled.

use crate::error::{Error, Result};
use crate::image::FloatImage;

/// A point in continuous image coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fill a polygon with `color`.
///
/// The polygon's axis-aligned bounding box is clamped to the image before
/// filling. Returns `min(bbox_width, bbox_height)` of the *unclamped*
/// bounding box as a rough size estimate for caller heuristics; this is
/// deliberately not an exact coverage area.
///
/// # Errors
///
/// Returns `Error::InvalidParameter` if the polygon has fewer than three
/// points.
pub fn fill_polygon(buffer: &mut FloatImage, poly: &[Point], color: f32) -> Result<f32> {
    if poly.len() < 3 {
        return Err(Error::InvalidParameter(format!(
            "polygon needs at least 3 points, got {}",
            poly.len()
        )));
    }

    let width = buffer.width() as i32;
    let height = buffer.height() as i32;

    // First point of the polygon in image space
    let mut x_start = (poly[0].x + 0.5) as i32;
    let mut y_start = (poly[0].y + 0.5) as i32;
    let mut x_end = x_start;
    let mut y_end = y_start;

    // Find boundaries
    for point in poly {
        if (point.x as i32) < x_start {
            x_start = point.x as i32;
        } else if (point.x as i32) > x_end {
            x_end = point.x as i32;
        }

        if (point.y as i32) < y_start {
            y_start = point.y as i32;
        } else if (point.y as i32) > y_end {
            y_end = point.y as i32;
        }
    }

    // Size estimate comes from the unclamped box
    let ret = (x_end - x_start).min(y_end - y_start) as f32;

    x_start = x_start.clamp(0, width - 1);
    x_end = x_end.clamp(x_start, width - 1);
    y_start = y_start.clamp(0, height - 1);
    y_end = y_end.clamp(y_start, height - 1);

    let mut node_x: Vec<i32> = Vec::new();

    for y in y_start..=y_end {
        node_x.clear();

        // Build the list of edge intersections for this row
        let mut j = poly.len() - 1;
        for i in 0..poly.len() {
            if (poly[i].y < y as f64 && poly[j].y >= y as f64)
                || (poly[j].y < y as f64 && poly[i].y >= y as f64)
            {
                let x = poly[i].x
                    + (y as f64 - poly[i].y) / (poly[j].y - poly[i].y) * (poly[j].x - poly[i].x);
                node_x.push(x as i32);
            }
            j = i;
        }

        node_x.sort_unstable();

        // Fill the cells between node pairs
        let row = buffer.row_mut(y as u32);
        let mut i = 0;
        while i + 1 < node_x.len() {
            if node_x[i] > x_end {
                break;
            }
            if node_x[i + 1] > x_start {
                let lo = node_x[i].max(x_start);
                let hi = node_x[i + 1].min(x_end);
                for x in lo..=hi {
                    row[x as usize] = color;
                }
            }
            i += 2;
        }
    }

    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_filled(img: &FloatImage, color: f32) -> usize {
        img.data().iter().filter(|&&v| v == color).count()
    }

    #[test]
    fn test_degenerate_polygon() {
        let mut img = FloatImage::new(10, 10).unwrap();
        assert!(fill_polygon(&mut img, &[], 1.0).is_err());
        assert!(fill_polygon(&mut img, &[Point::new(1.0, 1.0), Point::new(2.0, 2.0)], 1.0).is_err());
    }

    #[test]
    fn test_rectangle_fill() {
        let mut img = FloatImage::new(20, 20).unwrap();
        let poly = [
            Point::new(2.0, 3.0),
            Point::new(7.0, 3.0),
            Point::new(7.0, 8.0),
            Point::new(2.0, 8.0),
        ];

        let est = fill_polygon(&mut img, &poly, 1.0).unwrap();
        assert_eq!(est, 5.0);

        // Scanline fill paints rows 4..=8, columns 2..=7.
        assert_eq!(count_filled(&img, 1.0), 5 * 6);
        for y in 4..=8u32 {
            for x in 2..=7u32 {
                assert_eq!(img.get_pixel(x, y).unwrap(), 1.0, "missing fill at ({x},{y})");
            }
        }
        assert_eq!(img.get_pixel(1, 5).unwrap(), 0.0);
        assert_eq!(img.get_pixel(8, 5).unwrap(), 0.0);
        assert_eq!(img.get_pixel(5, 3).unwrap(), 0.0);
    }

    #[test]
    fn test_clipped_rectangle() {
        // Polygon extends past the image; fill stays in bounds, but the
        // size estimate still reflects the unclamped box.
        let mut img = FloatImage::new(10, 10).unwrap();
        let poly = [
            Point::new(-5.0, -5.0),
            Point::new(30.0, -5.0),
            Point::new(30.0, 4.0),
            Point::new(-5.0, 4.0),
        ];

        let est = fill_polygon(&mut img, &poly, 2.0).unwrap();
        assert_eq!(est, 9.0);

        // Rows 0..=4 are painted (intersections exist for y > -5).
        for y in 0..=4u32 {
            for x in 0..10u32 {
                assert_eq!(img.get_pixel(x, y).unwrap(), 2.0);
            }
        }
        for y in 5..10u32 {
            for x in 0..10u32 {
                assert_eq!(img.get_pixel(x, y).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn test_triangle_inside_outside() {
        let mut img = FloatImage::new(30, 30).unwrap();
        let poly = [
            Point::new(5.0, 5.0),
            Point::new(25.0, 5.0),
            Point::new(5.0, 25.0),
        ];

        fill_polygon(&mut img, &poly, 1.0).unwrap();

        // A point well inside the triangle and one well outside it.
        assert_eq!(img.get_pixel(8, 10).unwrap(), 1.0);
        assert_eq!(img.get_pixel(24, 24).unwrap(), 0.0);
    }
}
