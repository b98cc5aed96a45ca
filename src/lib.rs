//! # Disparity Export
//!
//! This crate turns a rectified stereo pair into a pair of normalised 8-bit disparity images:
//! load both views, run a stereo matcher, rescale both disparity fields by their joint maximum,
//! and write them next to the inputs.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod buffer;
mod disparity;
mod error;
mod loader;
mod normalise;
mod output;
mod pipeline;
pub mod config;
pub mod mcmanamon;

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use crate::error::{Error, Result};

pub mod prelude {
    pub use crate::buffer::{Dims, DisparityField, GrayscaleImage};
    pub use crate::disparity::{compute_disparity, DisparityPair, StereoMatcher};
    pub use crate::error::{Error, Result};
    pub use crate::loader::{load_grayscale, load_pair, StereoPair};
    pub use crate::normalise::{joint_max_disp, normalise_pair, NormalisedPair};
    pub use crate::output::{write_disparity, OutputConfig};
    pub use crate::pipeline::{process_pair, Pipeline, PipelineReport};
}
