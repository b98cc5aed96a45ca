//! # Disparity image output
//!
//! Derives output names from the input paths and writes the normalised disparity images.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use image::GrayImage;
use log::debug;
use serde::Deserialize;

use crate::error::*;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Characters removed from the end of an input path: one separator and a 3 character extension.
const EXTENSION_CHARS: usize = 4;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Naming of the written disparity images, `<stem><suffix>.<extension>`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub suffix: String,

    /// File extension without the leading dot. Also selects the encoder.
    pub extension: String
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_disp".to_string(),
            extension: "png".to_string()
        }
    }
}

impl OutputConfig {
    /// Derive the output path for the given input path.
    ///
    /// The last 4 characters of the input are dropped and the suffix and extension appended, so
    /// `data/L0.png` becomes `data/L0_disp.png`. The input must be at least 5 characters long and
    /// carry a `.` followed by 3 non-separator characters at its end, otherwise
    /// `InvalidOutputName` is returned. A derived path equal to the input is rejected the same way.
    pub fn output_path(&self, input: &Path) -> Result<PathBuf> {
        let invalid = || Error::InvalidOutputName {
            path: input.to_path_buf()
        };

        let name = input.to_str().ok_or_else(invalid)?;
        let chars: Vec<char> = name.chars().collect();

        if chars.len() <= EXTENSION_CHARS {
            return Err(invalid());
        }

        let (stem, ext) = chars.split_at(chars.len() - EXTENSION_CHARS);

        if ext[0] != '.' || ext[1..].iter().any(|&c| c == '.' || std::path::is_separator(c)) {
            return Err(invalid());
        }

        let mut out: String = stem.iter().collect();
        out.push_str(&self.suffix);
        out.push('.');
        out.push_str(&self.extension);

        let out = PathBuf::from(out);

        // An empty suffix with the input's own extension would overwrite the input.
        if out == input {
            return Err(invalid());
        }

        Ok(out)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Write a disparity image, overwriting any existing file at `path`.
pub fn write_disparity(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|source| Error::WriteFailure {
        path: path.to_path_buf(),
        source
    })?;

    debug!("Wrote {} ({}x{})", path.display(), img.width(), img.height());

    Ok(())
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------
