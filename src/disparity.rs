//! # General disparity objects
//!
//! This module provides the stereo matcher trait and the disparity pair produced by it. The
//! matcher sees the same raw interface as a C-style dense matcher: two byte buffers, their
//! geometry, and two pre-allocated float buffers to fill.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::debug;

use crate::buffer::{Dims, DisparityField};
use crate::error::*;
use crate::loader::StereoPair;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Disparity fields for the left and right views of a pair.
#[derive(Debug, Clone)]
pub struct DisparityPair {
    pub left: DisparityField,
    pub right: DisparityField
}

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

pub trait StereoMatcher {
    /// Compute the disparity of both views of the given buffers.
    ///
    /// `left_disp` and `right_disp` hold `dims.len()` zeroed samples on entry.
    fn compute(
        &mut self,
        left: &[u8],
        right: &[u8],
        dims: &Dims,
        left_disp: &mut [f32],
        right_disp: &mut [f32]
    ) -> Result<()>;
}

impl<F> StereoMatcher for F
where
    F: FnMut(&[u8], &[u8], &Dims, &mut [f32], &mut [f32]) -> Result<()>
{
    fn compute(
        &mut self,
        left: &[u8],
        right: &[u8],
        dims: &Dims,
        left_disp: &mut [f32],
        right_disp: &mut [f32]
    ) -> Result<()> {
        self(left, right, dims, left_disp, right_disp)
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Allocate both disparity fields for the pair and let the matcher fill them.
pub fn compute_disparity<M>(matcher: &mut M, pair: &StereoPair) -> Result<DisparityPair>
where
    M: StereoMatcher + ?Sized
{
    let dims = pair.dims();
    let mut left = DisparityField::new(dims.width, dims.height);
    let mut right = DisparityField::new(dims.width, dims.height);

    debug!(
        "Running matcher on {}x{} pair (stride {})",
        dims.width, dims.height, dims.row_stride
    );

    matcher.compute(
        pair.left().as_slice(),
        pair.right().as_slice(),
        &dims,
        left.as_mut_slice(),
        right.as_mut_slice()
    )?;

    Ok(DisparityPair { left, right })
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::GrayscaleImage;

    #[test]
    fn closure_sees_geometry_and_fills_fields() {
        let left = GrayscaleImage::new(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let right = GrayscaleImage::new(3, 2, vec![6, 5, 4, 3, 2, 1]).unwrap();
        let pair = StereoPair::new(left, right).unwrap();

        let mut seen = None;
        let mut matcher = |l: &[u8], r: &[u8], dims: &Dims, ld: &mut [f32], rd: &mut [f32]| -> Result<()> {
            seen = Some(*dims);
            for i in 0..dims.len() {
                ld[i] = l[i] as f32;
                rd[i] = r[i] as f32;
            }
            Ok(())
        };

        let disp = compute_disparity(&mut matcher, &pair).unwrap();

        assert_eq!(seen, Some(Dims { width: 3, height: 2, row_stride: 3 }));
        assert_eq!(disp.left.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(disp.right.get(0, 1), 3.0);
    }

    #[test]
    fn matcher_errors_propagate() {
        let img = GrayscaleImage::new(1, 1, vec![0]).unwrap();
        let pair = StereoPair::new(img.clone(), img).unwrap();

        let mut matcher = |_: &[u8], _: &[u8], _: &Dims, _: &mut [f32], _: &mut [f32]| -> Result<()> {
            Err(Error::Matcher("no texture".into()))
        };

        assert!(matches!(
            compute_disparity(&mut matcher, &pair),
            Err(Error::Matcher(_))
        ));
    }
}
