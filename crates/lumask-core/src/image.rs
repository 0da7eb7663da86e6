//! Float image buffers
//!
//! [`FloatImage`] is the 2D buffer all toolkit operations work on: owned,
//! flat, row-major `f32` storage with the row stride equal to the width.
//! The caller keeps ownership of its buffers; operations allocate their own
//! scratch internally.
//!
//! # Examples
//!
//! ```
//! use lumask_core::FloatImage;
//!
//! let mut img = FloatImage::new(100, 100).unwrap();
//! img.set_pixel(10, 20, 0.5).unwrap();
//! assert_eq!(img.get_pixel(10, 20).unwrap(), 0.5);
//! ```

use crate::error::{Error, Result};

/// Floating-point image
///
/// A 2D array of `f32` values stored in row-major order with no padding.
/// The pixel at (x, y) is at index `y * width + x`.
#[derive(Debug, Clone)]
pub struct FloatImage {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Pixel data (row-major, no padding)
    data: Vec<f32>,
}

impl FloatImage {
    /// Create a new image with all pixels set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let size = (width as usize) * (height as usize);
        Ok(FloatImage {
            width,
            height,
            data: vec![0.0f32; size],
        })
    }

    /// Create a new image with all pixels set to the specified value
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new_with_value(width: u32, height: u32, value: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let size = (width as usize) * (height as usize);
        Ok(FloatImage {
            width,
            height,
            data: vec![value; size],
        })
    }

    /// Create an image from raw data in row-major order
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let expected_size = (width as usize) * (height as usize);
        if data.len() != expected_size {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {}x{} = {}",
                data.len(),
                width,
                height,
                expected_size
            )));
        }

        Ok(FloatImage {
            width,
            height,
            data,
        })
    }

    /// Image width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the pixel value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<f32> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }

        Ok(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Set the pixel value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }

        self.data[(y as usize) * (self.width as usize) + (x as usize)] = value;
        Ok(())
    }

    /// Get the pixel value at (x, y) without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Sample the image at signed coordinates with replicate (clamp) border
    /// handling: any index outside the image is clamped to the nearest valid
    /// row/column.
    #[inline]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let xx = x.clamp(0, self.width as i64 - 1) as usize;
        let yy = y.clamp(0, self.height as i64 - 1) as usize;
        self.data[yy * (self.width as usize) + xx]
    }

    /// Raw read-only access to the pixel data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Raw mutable access to the pixel data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Get a row of pixel data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[f32] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }

    /// Get a mutable row of pixel data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [f32] {
        let start = (y as usize) * (self.width as usize);
        &mut self.data[start..start + self.width as usize]
    }

    /// Set all pixels to the specified value
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Minimum and maximum pixel values
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((self.data[0], self.data[0]), |(mn, mx), &v| {
                (mn.min(v), mx.max(v))
            })
    }

    /// Mean pixel value, accumulated in f64
    pub fn mean(&self) -> f32 {
        let total: f64 = self.data.iter().map(|&v| v as f64).sum();
        (total / self.data.len() as f64) as f32
    }

    /// Create a zeroed image with the same dimensions
    pub fn create_template(&self) -> FloatImage {
        FloatImage {
            width: self.width,
            height: self.height,
            data: vec![0.0; self.data.len()],
        }
    }

    /// Check that two images have the same dimensions
    pub fn check_same_size(&self, other: &FloatImage) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::IncompatibleSizes(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }
        Ok(())
    }
}

/// Byte-valued image
///
/// Same layout as [`FloatImage`] but with one `u8` per pixel. Used for
/// flag maps such as the impulse-noise output, where each cell is 0 or 1.
#[derive(Debug, Clone)]
pub struct ByteImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ByteImage {
    /// Create a new byte image with all pixels set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let size = (width as usize) * (height as usize);
        Ok(ByteImage {
            width,
            height,
            data: vec![0u8; size],
        })
    }

    /// Image width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<u8> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }

        Ok(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Get a row of data
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = (y as usize) * (self.width as usize);
        &self.data[start..start + self.width as usize]
    }

    /// Raw read-only access to the data
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw mutable access to the data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let img = FloatImage::new(100, 200).unwrap();
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 200);
        assert_eq!(img.dimensions(), (100, 200));

        for &val in img.data() {
            assert_eq!(val, 0.0);
        }
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(FloatImage::new(0, 100).is_err());
        assert!(FloatImage::new(100, 0).is_err());
        assert!(FloatImage::new(0, 0).is_err());
    }

    #[test]
    fn test_from_data() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let img = FloatImage::from_data(3, 2, data).unwrap();

        assert_eq!(img.get_pixel(0, 0).unwrap(), 1.0);
        assert_eq!(img.get_pixel(2, 0).unwrap(), 3.0);
        assert_eq!(img.get_pixel(0, 1).unwrap(), 4.0);
        assert_eq!(img.get_pixel(2, 1).unwrap(), 6.0);
    }

    #[test]
    fn test_from_data_wrong_size() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(FloatImage::from_data(3, 2, data).is_err());
    }

    #[test]
    fn test_pixel_access_out_of_bounds() {
        let img = FloatImage::new(10, 10).unwrap();

        assert!(img.get_pixel(10, 0).is_err());
        assert!(img.get_pixel(0, 10).is_err());
        assert!(img.get_pixel(10, 10).is_err());
    }

    #[test]
    fn test_get_clamped() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        let img = FloatImage::from_data(2, 2, data).unwrap();

        assert_eq!(img.get_clamped(-5, -5), 1.0);
        assert_eq!(img.get_clamped(10, -1), 2.0);
        assert_eq!(img.get_clamped(-1, 10), 3.0);
        assert_eq!(img.get_clamped(10, 10), 4.0);
        assert_eq!(img.get_clamped(0, 0), 1.0);
    }

    #[test]
    fn test_row_access() {
        let mut img = FloatImage::new(5, 3).unwrap();
        for x in 0..5 {
            img.set_pixel(x, 1, (x + 1) as f32).unwrap();
        }

        assert_eq!(img.row(1), &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let row_mut = img.row_mut(0);
        row_mut[0] = 10.0;
        assert_eq!(img.get_pixel(0, 0).unwrap(), 10.0);
    }

    #[test]
    fn test_fill() {
        let mut img = FloatImage::new(10, 10).unwrap();
        img.fill(5.0);
        for &val in img.data() {
            assert_eq!(val, 5.0);
        }
    }

    #[test]
    fn test_min_max_mean() {
        let img = FloatImage::from_data(2, 2, vec![1.0, -3.0, 7.0, 3.0]).unwrap();
        assert_eq!(img.min_max(), (-3.0, 7.0));
        assert_eq!(img.mean(), 2.0);
    }

    #[test]
    fn test_check_same_size() {
        let a = FloatImage::new(10, 10).unwrap();
        let b = FloatImage::new(10, 10).unwrap();
        let c = FloatImage::new(5, 10).unwrap();

        assert!(a.check_same_size(&b).is_ok());
        assert!(a.check_same_size(&c).is_err());
    }

    #[test]
    fn test_byte_image() {
        let mut map = ByteImage::new(4, 3).unwrap();
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);

        map.data_mut()[5] = 1;
        assert_eq!(map.get_pixel(1, 1).unwrap(), 1);
        assert_eq!(map.row(1), &[0, 1, 0, 0]);
        assert!(map.get_pixel(4, 0).is_err());
    }
}
