//! # Stereo pair loading
//!
//! Reads the left and right images of a rectified pair from disk as 8-bit grayscale buffers.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::io::Reader;
use image::ImageError;
use log::debug;

use crate::buffer::{Dims, GrayscaleImage};
use crate::error::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Two grayscale images of identical geometry.
#[derive(Debug, Clone)]
pub struct StereoPair {
    left: GrayscaleImage,
    right: GrayscaleImage
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl StereoPair {
    /// Pair two images, failing with `DimensionMismatch` if their geometries differ.
    pub fn new(left: GrayscaleImage, right: GrayscaleImage) -> Result<Self> {
        if left.width() != right.width() || left.height() != right.height() {
            return Err(Error::DimensionMismatch {
                left: (left.width(), left.height()),
                right: (right.width(), right.height())
            });
        }

        Ok(Self { left, right })
    }

    pub fn left(&self) -> &GrayscaleImage {
        &self.left
    }

    pub fn right(&self) -> &GrayscaleImage {
        &self.right
    }

    pub fn width(&self) -> usize {
        self.left.width()
    }

    pub fn height(&self) -> usize {
        self.left.height()
    }

    pub fn dims(&self) -> Dims {
        self.left.dims()
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Load a single image, converting colour inputs to grayscale.
///
/// The format is guessed from the file contents, falling back to the extension.
pub fn load_grayscale(path: &Path) -> Result<GrayscaleImage> {
    let img = Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(ImageError::IoError)
        .and_then(|reader| reader.decode())
        .map_err(|source| Error::InputMissing {
            path: path.to_path_buf(),
            source
        })?
        .to_luma8();

    debug!("Loaded {} ({}x{})", path.display(), img.width(), img.height());

    Ok(GrayscaleImage::from(img))
}

/// Load both images of a stereo pair.
///
/// Both images are decoded before their geometry is compared, so a missing right image is
/// reported as `InputMissing` even when the left one would also have mismatched.
pub fn load_pair(left: &Path, right: &Path) -> Result<StereoPair> {
    let left = load_grayscale(left)?;
    let right = load_grayscale(right)?;

    StereoPair::new(left, right)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: usize, height: usize) -> GrayscaleImage {
        GrayscaleImage::new(width, height, vec![0; width * height]).unwrap()
    }

    #[test]
    fn pair_requires_matching_geometry() {
        let err = StereoPair::new(blank(4, 4), blank(4, 5)).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch { left: (4, 4), right: (4, 5) }
        ));

        let pair = StereoPair::new(blank(3, 2), blank(3, 2)).unwrap();
        assert_eq!((pair.width(), pair.height()), (3, 2));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_grayscale(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, Error::InputMissing { .. }));
    }
}
