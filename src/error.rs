//! # Error standards
//!
//! This module provides a standardised error enum and result type for this crate.

use std::path::PathBuf;

// -----------------------------------------------------------------------------------------------
// TYPES
// -----------------------------------------------------------------------------------------------

/// Standard result type used in the disparity export crate.
pub type Result<T> = std::result::Result<T, Error>;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Input image {} is missing or could not be decoded: {source}", .path.display())]
    InputMissing {
        path: PathBuf,
        source: image::ImageError
    },

    #[error("Left image is {left:?} but right image is {right:?} (width, height)")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize)
    },

    #[error("Buffer holds {actual} samples but the geometry requires {expected}")]
    BufferSize {
        expected: usize,
        actual: usize
    },

    #[error(
        "Cannot derive an output name from {}: expected at least 5 characters ending in \
        a separator and a 3 character extension",
        .path.display()
    )]
    InvalidOutputName {
        path: PathBuf
    },

    #[error("Failed to write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        source: image::ImageError
    },

    #[error("Stereo matcher failed: {0}")]
    Matcher(String),

    #[error("Failed to load config {}: {message}", .path.display())]
    Config {
        path: PathBuf,
        message: String
    },

    #[cfg(feature = "statistics")]
    #[error("Statistics plotting failed: {0}")]
    Statistics(String)
}
