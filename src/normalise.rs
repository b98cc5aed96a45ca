//! # Disparity normalisation
//!
//! Rescales the disparity fields of both views into the displayable 8-bit range with one shared
//! scale, so a given disparity maps to the same grey level in the left and right outputs.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::GrayImage;
use log::{debug, warn};

use crate::disparity::DisparityPair;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Normalised 8-bit disparity images for both views.
#[derive(Debug, Clone)]
pub struct NormalisedPair {
    pub left: GrayImage,
    pub right: GrayImage,

    /// The disparity mapped to 255 in both images.
    pub max_disp: f32,

    /// True when no positive disparity was found and both images are all-zero.
    pub degenerate: bool
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Maximum disparity over both fields of the pair, starting from zero.
pub fn joint_max_disp(disp: &DisparityPair) -> f32 {
    disp.left.max_disp().max(disp.right.max_disp())
}

/// Normalise both fields of the pair by their joint maximum disparity.
///
/// A pair without any positive disparity yields two all-zero images rather than dividing by
/// zero.
pub fn normalise_pair(disp: &DisparityPair) -> NormalisedPair {
    let max_disp = joint_max_disp(disp);
    let degenerate = max_disp <= 0.0;

    if degenerate {
        warn!("No positive disparity in either view, writing all-zero disparity images");
    }
    else {
        debug!("Normalising disparity by joint maximum {}", max_disp);
    }

    NormalisedPair {
        left: disp.left.to_luma_normalised(max_disp),
        right: disp.right.to_luma_normalised(max_disp),
        max_disp,
        degenerate
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DisparityField;

    fn pair(w: usize, h: usize, left: Vec<f32>, right: Vec<f32>) -> DisparityPair {
        DisparityPair {
            left: DisparityField::from_vec(w, h, left).unwrap(),
            right: DisparityField::from_vec(w, h, right).unwrap()
        }
    }

    #[test]
    fn shared_scale_across_views() {
        let disp = pair(2, 2, vec![10.0, 20.0, 0.0, 40.0], vec![5.0, 0.0, 0.0, 0.0]);
        let norm = normalise_pair(&disp);

        assert_eq!(norm.max_disp, 40.0);
        assert!(!norm.degenerate);
        assert_eq!(norm.left.into_raw(), vec![63, 127, 0, 255]);
        assert_eq!(norm.right.into_raw(), vec![31, 0, 0, 0]);
    }

    #[test]
    fn maximum_may_come_from_right_view() {
        let disp = pair(2, 1, vec![1.0, 2.0], vec![4.0, -2.0]);
        let norm = normalise_pair(&disp);

        assert_eq!(norm.max_disp, 4.0);
        assert_eq!(norm.left.into_raw(), vec![63, 127]);
        assert_eq!(norm.right.into_raw(), vec![255, 0]);
    }

    #[test]
    fn non_positive_fields_are_degenerate() {
        let disp = pair(2, 2, vec![0.0, -1.0, -5.0, 0.0], vec![-0.5; 4]);
        let norm = normalise_pair(&disp);

        assert!(norm.degenerate);
        assert_eq!(norm.max_disp, 0.0);
        assert!(norm.left.iter().chain(norm.right.iter()).all(|&v| v == 0));
        assert_eq!((norm.left.width(), norm.left.height()), (2, 2));
    }
}
