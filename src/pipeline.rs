//! # Disparity export pipeline
//!
//! Runs one stereo pair through load, match, normalise and write. Each stage completes before the
//! next starts and every buffer is owned by the run, so all of them are released when `run`
//! returns, whichever stage failed.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::disparity::{compute_disparity, StereoMatcher};
use crate::error::*;
use crate::loader::{load_pair, StereoPair};
use crate::normalise::{normalise_pair, NormalisedPair};
use crate::output::{write_disparity, OutputConfig};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct Pipeline {
    output: OutputConfig
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub left_output: PathBuf,
    pub right_output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub max_disp: f32,

    /// Both written images are all-zero because no positive disparity was found.
    pub degenerate: bool,

    /// Wall time from loading the inputs to writing the last output.
    pub elapsed: Duration
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Pipeline {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Process the pair at `left` and `right`, writing a normalised disparity image next to each.
    ///
    /// Output names are derived before any matching, so an unusable input name fails the run
    /// without writing anything. If writing the left image succeeds but the right fails, the left
    /// image is kept.
    pub fn run<M>(&self, matcher: &mut M, left: &Path, right: &Path) -> Result<PipelineReport>
    where
        M: StereoMatcher + ?Sized
    {
        let start = Instant::now();

        let pair = load_pair(left, right)?;

        let left_output = self.output.output_path(left)?;
        let right_output = self.output.output_path(right)?;
        debug!(
            "Output paths: {} and {}",
            left_output.display(),
            right_output.display()
        );

        let norm = process_pair(matcher, &pair)?;

        write_disparity(&norm.left, &left_output)?;
        write_disparity(&norm.right, &right_output)?;

        let elapsed = start.elapsed();
        info!(
            "Processed {} / {} in {:.3} s",
            left.display(),
            right.display(),
            elapsed.as_secs_f64()
        );

        Ok(PipelineReport {
            left_output,
            right_output,
            width: pair.width(),
            height: pair.height(),
            max_disp: norm.max_disp,
            degenerate: norm.degenerate,
            elapsed
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Match and normalise an in-memory pair without touching the filesystem.
pub fn process_pair<M>(matcher: &mut M, pair: &StereoPair) -> Result<NormalisedPair>
where
    M: StereoMatcher + ?Sized
{
    let disp = compute_disparity(matcher, pair)?;
    Ok(normalise_pair(&disp))
}
