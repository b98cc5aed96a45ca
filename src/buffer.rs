//! # Pixel buffers
//!
//! Owned, row-major buffers exchanged between the pipeline stages. Every buffer checks its sample
//! count against its geometry on construction, so indexing inside the stages never needs to.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Geometry handed to a stereo matcher alongside the raw buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub width: usize,
    pub height: usize,
    /// Bytes per row. Equal to `width` for the un-padded single channel buffers used here.
    pub row_stride: usize
}

/// An 8-bit single channel image, immutable once loaded.
#[derive(Debug, Clone)]
pub struct GrayscaleImage {
    width: usize,
    height: usize,
    data: Vec<u8>
}

/// A floating point disparity field, one sample (in pixels) per source pixel.
#[derive(Debug, Clone)]
pub struct DisparityField {
    width: usize,
    height: usize,
    data: Vec<f32>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Dims {
    /// Geometry of an un-padded single channel image.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, row_stride: width }
    }

    /// Number of samples covered by this geometry.
    pub fn len(&self) -> usize {
        self.row_stride * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GrayscaleImage {
    /// Wrap raw row-major bytes, failing if their count does not match the geometry.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        check_len(width * height, data.len())?;
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dims(&self) -> Dims {
        Dims::new(self.width, self.height)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl From<GrayImage> for GrayscaleImage {
    fn from(img: GrayImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;

        Self {
            width,
            height,
            data: img.into_raw()
        }
    }
}

impl DisparityField {
    /// A zero filled field, ready to be handed to a matcher.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height]
        }
    }

    /// Wrap raw row-major samples, failing if their count does not match the geometry.
    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        check_len(width * height, data.len())?;
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Largest sample in the field, never less than zero. NaN samples are skipped.
    pub fn max_disp(&self) -> f32 {
        self.data
            .iter()
            .fold(0.0f32, |max, &d| if d > max { d } else { max })
    }

    /// Converts the field to a GrayImage scaled so that `max_disp` maps to 255.
    ///
    /// Scaled values are truncated toward zero and clamped into `[0, 255]`. A `max_disp` that is
    /// not strictly positive produces an all-zero image.
    pub fn to_luma_normalised(&self, max_disp: f32) -> GrayImage {
        let mut new = GrayImage::new(self.width as u32, self.height as u32);

        if !(max_disp > 0.0) {
            return new;
        }

        let max_disp = max_disp as f64;

        for (out, &d) in new.iter_mut().zip(self.data.iter()) {
            let mut val = 255.0 * d as f64 / max_disp;

            if val < 0.0 {
                val = 0.0;
            }
            else if val > 255.0 {
                val = 255.0;
            }

            // NaN falls through both comparisons and saturates to 0 in the cast.
            *out = val as u8;
        }

        new
    }
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::BufferSize { expected, actual });
    }
    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
