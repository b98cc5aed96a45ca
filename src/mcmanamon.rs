//! # McManamon disparity computation
//!
//! This module provides a reference stereo matcher based on McManamon's disparity algorithm from
//! ("EXOMARS ROVER VEHICLE PERCEPTION SYSTEM ARCHITECTURE AND TEST RESULTS")[http://robotics.estec.esa.int/ASTRA/Astra2013/Papers/Mcmanamon_2811324.pdf]
//!
//! Both views are matched: the left view searches the right image towards smaller `x`, the right
//! view searches the left image towards larger `x`. Pixels too close to the border for the
//! correlation window or the disparity search are left at zero.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use image::GrayImage;
use log::debug;
use serde::Deserialize;

use crate::buffer::Dims;
use crate::disparity::StereoMatcher;
use crate::error::*;

#[cfg(feature = "statistics")]
use plotters::prelude::*;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

pub struct McManamon {
    params: Params,
    corr_window_x_range: std::ops::RangeInclusive<isize>,
    corr_window_y_range: std::ops::RangeInclusive<isize>
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Params {
    pub min_disparity: usize,
    pub max_disparity: usize,
    pub dyn_disparity_threshold: usize,
    pub correlation_window_size: (usize, usize),

    /// Sigma of a Gaussian blur applied to both images before correlation.
    pub prefilter_sigma: Option<f32>,

    /// Where to plot the dynamic disparity range of the left view. Requires the `statistics`
    /// feature.
    pub statistics_plot: Option<PathBuf>
}

/// Search direction of the matched view within the other image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Left,
    Right
}

/// Per-row dynamic disparity range, bottom row first.
type RangeHistory = Vec<(usize, usize)>;

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            min_disparity: 0,
            max_disparity: 64,
            dyn_disparity_threshold: 10,
            correlation_window_size: (11, 11),
            prefilter_sigma: None,
            statistics_plot: None
        }
    }
}

impl McManamon {
    /// Create a new instance of the algorithm with the given parameters.
    pub fn new(params: Params) -> Self {
        // Half of a usize always fits an isize.
        let semi_width = (params.correlation_window_size.0.saturating_sub(1) / 2) as isize;
        let corr_window_x_range = -semi_width..=semi_width;

        let semi_height = (params.correlation_window_size.1.saturating_sub(1) / 2) as isize;
        let corr_window_y_range = -semi_height..=semi_height;

        Self {
            params,
            corr_window_x_range,
            corr_window_y_range
        }
    }

    fn semi_width(&self) -> usize {
        *self.corr_window_x_range.end() as usize
    }

    fn semi_height(&self) -> usize {
        *self.corr_window_y_range.end() as usize
    }

    /// Smallest image width and height the window and full disparity search fit in, or `None` if
    /// the parameters overflow `usize`.
    fn search_extent(&self) -> Option<(usize, usize)> {
        let min_width = self
            .semi_width()
            .checked_mul(2)?
            .checked_add(self.params.max_disparity)?
            .checked_add(1)?;
        let min_height = self.semi_height().checked_mul(2)?.checked_add(1)?;

        Some((min_width, min_height))
    }

    /// Calculate the sum of absolute differences between the window around `(x, y)` in the
    /// reference image and the window around `(x -/+ d, y)` in the target image.
    fn get_criterion(
        &self,
        reference: &[u8],
        target: &[u8],
        stride: usize,
        view: View,
        x: usize,
        y: usize,
        d: usize
    ) -> f32 {
        let mut acc = 0u32;

        let tx = match view {
            View::Left => x - d,
            View::Right => x + d
        };

        for j in self.corr_window_y_range.clone() {
            let row = (y as isize + j) as usize * stride;

            for i in self.corr_window_x_range.clone() {
                let a = reference[row + (x as isize + i) as usize];
                let b = target[row + (tx as isize + i) as usize];
                acc += (a as i32 - b as i32).abs() as u32;
            }
        }

        acc as f32
    }

    /// Match one view against the other, writing into `out` and returning the dynamic disparity
    /// range used on each row.
    fn match_view(
        &self,
        reference: &[u8],
        target: &[u8],
        dims: &Dims,
        extent: (usize, usize),
        view: View,
        out: &mut [f32]
    ) -> RangeHistory {
        let mut history = Vec::new();

        let semi_width = self.semi_width();
        let semi_height = self.semi_height();
        let max_param = self.params.max_disparity;
        let min_param = self.params.min_disparity;

        // The search must fit between the window borders on every row.
        if dims.width < extent.0 || dims.height < extent.1 {
            return history;
        }

        let x_range = match view {
            View::Left => (semi_width + max_param)..(dims.width - semi_width),
            View::Right => semi_width..(dims.width - semi_width - max_param)
        };

        // Dynamic disparity range tracking variables
        let mut min_dyn_disp = min_param;
        let mut max_dyn_disp = max_param;

        // Iterate through rows backwards
        for y in (semi_height..(dims.height - semi_height)).rev() {
            history.push((min_dyn_disp, max_dyn_disp));

            // Min and max disparity for this row. Initial value is the opposite limit on disparity
            // so that the minimum parameter does not dominate the values, for example.
            let mut min_disp_this_row = max_param as f32;
            let mut max_disp_this_row = min_param as f32;

            let mut crits: Vec<f32> = Vec::with_capacity(max_dyn_disp + 1 - min_dyn_disp);

            for x in x_range.clone() {
                // Calculate criterion for each disparity
                crits.clear();
                for d in min_dyn_disp..=max_dyn_disp {
                    crits.push(self.get_criterion(reference, target, dims.row_stride, view, x, y, d));
                }

                // Find index of minimum value
                let min_index = crits
                    .iter()
                    .enumerate()
                    .fold(0, |min_idx, (idx, &val)| {
                        if val < crits[min_idx] {
                            idx
                        }
                        else {
                            min_idx
                        }
                    });

                let disp_val = (min_dyn_disp + min_index) as f32
                    + subpixel_offset(&crits, min_index);

                out[y * dims.row_stride + x] = disp_val;

                if disp_val > max_disp_this_row {
                    max_disp_this_row = disp_val;
                }
                if disp_val < min_disp_this_row {
                    min_disp_this_row = disp_val;
                }
            }

            // Set max disparity range value, clamped to the parameter
            max_dyn_disp = (max_disp_this_row.ceil() as usize)
                .saturating_add(self.params.dyn_disparity_threshold)
                .min(max_param);

            // Subtract in float space so the usize can't underflow
            let min = min_disp_this_row.floor() - self.params.dyn_disparity_threshold as f32;
            min_dyn_disp = min.max(min_param as f32) as usize;

            // A flat row can collapse the range, reopen it fully.
            if min_dyn_disp >= max_dyn_disp {
                min_dyn_disp = min_param;
                max_dyn_disp = max_param;
            }
        }

        history
    }

    fn prefilter(&self, data: &[u8], dims: &Dims) -> Option<Vec<u8>> {
        let sigma = self.params.prefilter_sigma.filter(|&s| s > 0.0)?;

        let mut raw = Vec::with_capacity(dims.width * dims.height);
        for y in 0..dims.height {
            let start = y * dims.row_stride;
            raw.extend_from_slice(&data[start..start + dims.width]);
        }

        let img = GrayImage::from_raw(dims.width as u32, dims.height as u32, raw)?;

        Some(imageproc::filter::gaussian_blur_f32(&img, sigma).into_raw())
    }
}

impl StereoMatcher for McManamon {
    /// Compute the disparity of both views of the given buffers.
    fn compute(
        &mut self,
        left: &[u8],
        right: &[u8],
        dims: &Dims,
        left_disp: &mut [f32],
        right_disp: &mut [f32]
    ) -> Result<()> {
        if self.params.min_disparity > self.params.max_disparity {
            return Err(Error::Matcher(format!(
                "min_disparity {} exceeds max_disparity {}",
                self.params.min_disparity, self.params.max_disparity
            )));
        }

        let extent = self.search_extent().ok_or_else(|| {
            Error::Matcher(format!(
                "max_disparity {} with correlation window {:?} overflows the search extent",
                self.params.max_disparity, self.params.correlation_window_size
            ))
        })?;

        for len in &[left.len(), right.len(), left_disp.len(), right_disp.len()] {
            if *len < dims.len() {
                return Err(Error::BufferSize {
                    expected: dims.len(),
                    actual: *len
                });
            }
        }

        if dims.is_empty() {
            return Ok(());
        }

        // ---- PRE FILTER ----

        let left_filtered = self.prefilter(left, dims);
        let right_filtered = self.prefilter(right, dims);

        let filtered_dims = Dims::new(dims.width, dims.height);
        let (left, right, dims) = match (&left_filtered, &right_filtered) {
            (Some(l), Some(r)) => (l.as_slice(), r.as_slice(), &filtered_dims),
            _ => (left, right, dims)
        };

        // ---- STEREO CORRELATION ----

        let left_history = self.match_view(left, right, dims, extent, View::Left, left_disp);
        self.match_view(right, left, dims, extent, View::Right, right_disp);

        debug!(
            "McManamon matched {} rows with disparity range {}..={}",
            left_history.len(),
            self.params.min_disparity,
            self.params.max_disparity
        );

        // ---- PLOTTING ----

        if let Some(path) = &self.params.statistics_plot {
            self.plot_range(path, &left_history, dims)?;
        }

        Ok(())
    }
}

#[cfg(feature = "statistics")]
impl McManamon {
    fn plot_range(&self, path: &std::path::Path, history: &RangeHistory, dims: &Dims) -> Result<()> {
        let plot_err = |e| Error::Statistics(format!("{:?}", e));

        // History is bottom row first, plot against the real row index.
        let top = dims.height - self.semi_height();
        let min_series: Vec<(usize, usize)> = history
            .iter()
            .enumerate()
            .map(|(i, &(min, _))| (min, top - 1 - i))
            .collect();
        let max_series: Vec<(usize, usize)> = history
            .iter()
            .enumerate()
            .map(|(i, &(_, max))| (max, top - 1 - i))
            .collect();

        let disp_range = BitMapBackend::new(path, (800, 600)).into_drawing_area();
        disp_range.fill(&WHITE).map_err(plot_err)?;

        let mut chart = ChartBuilder::on(&disp_range)
            .caption("Dynamic disparity range", ("sans-serif", 20).into_font())
            .margin(5)
            .x_label_area_size(30)
            .y_label_area_size(30)
            .build_ranged(
                self.params.min_disparity..self.params.max_disparity + 1,
                0..dims.height
            )
            .map_err(plot_err)?;

        chart.configure_mesh().draw().map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(min_series, &RED))
            .map_err(plot_err)?
            .label("Min disparity")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        chart
            .draw_series(LineSeries::new(max_series, &BLUE))
            .map_err(plot_err)?
            .label("Max disparity")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_err)?;

        debug!("Disparity range plot written to {}", path.display());

        Ok(())
    }
}

#[cfg(not(feature = "statistics"))]
impl McManamon {
    fn plot_range(&self, path: &std::path::Path, _: &RangeHistory, _: &Dims) -> Result<()> {
        log::warn!(
            "Ignoring statistics plot {}, built without the statistics feature",
            path.display()
        );
        Ok(())
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Sub pixel offset of the criterion minimum, zero on the outer edge of the search.
fn subpixel_offset(crits: &[f32], min_index: usize) -> f32 {
    if crits.len() < 3 || min_index == 0 || min_index == crits.len() - 1 {
        return 0.0;
    }

    let c_min = crits[min_index];
    let c_left = crits[min_index - 1];
    let c_right = crits[min_index + 1];

    let denom = if c_left > c_right {
        2.0 * (c_left - c_min)
    }
    else {
        2.0 * (c_right - c_min)
    };

    if denom <= 0.0 {
        return 0.0;
    }

    (c_left - c_right) / denom
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Horizontal texture that never repeats within the search range.
    fn textured(width: usize, height: usize, shift: usize) -> Vec<u8> {
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            for x in 0..width {
                let sx = x + shift;
                data[y * width + x] = ((sx * 37 + (sx * sx) % 11 * 13) % 251) as u8;
            }
        }
        data
    }

    fn small_params() -> Params {
        Params {
            min_disparity: 0,
            max_disparity: 8,
            dyn_disparity_threshold: 2,
            correlation_window_size: (3, 3),
            ..Default::default()
        }
    }

    #[test]
    fn recovers_constant_shift_in_both_views() {
        let (width, height, shift) = (32, 6, 4);
        // right(x) = left(x + shift), so a left pixel is found `shift` columns to the left.
        let left = textured(width, height, 0);
        let right = textured(width, height, shift);

        let dims = Dims::new(width, height);
        let mut left_disp = vec![0.0; dims.len()];
        let mut right_disp = vec![0.0; dims.len()];

        let mut matcher = McManamon::new(small_params());
        matcher
            .compute(&left, &right, &dims, &mut left_disp, &mut right_disp)
            .unwrap();

        // Interior of the left view, clear of the search border.
        for y in 1..height - 1 {
            for x in 9..width - 1 {
                assert!(
                    (left_disp[y * width + x] - shift as f32).abs() < 0.5,
                    "left ({}, {}) = {}",
                    x,
                    y,
                    left_disp[y * width + x]
                );
            }
            for x in 1..width - 9 {
                assert!(
                    (right_disp[y * width + x] - shift as f32).abs() < 0.5,
                    "right ({}, {}) = {}",
                    x,
                    y,
                    right_disp[y * width + x]
                );
            }
        }

        // Border rows and columns are untouched.
        assert!(left_disp[..width].iter().all(|&d| d == 0.0));
        assert_eq!(left_disp[width + 8], 0.0);
        assert_eq!(right_disp[width + width - 9], 0.0);
    }

    #[test]
    fn too_small_images_are_left_at_zero() {
        let dims = Dims::new(4, 4);
        let img = vec![7u8; dims.len()];
        let mut left_disp = vec![0.0; dims.len()];
        let mut right_disp = vec![0.0; dims.len()];

        McManamon::new(small_params())
            .compute(&img, &img, &dims, &mut left_disp, &mut right_disp)
            .unwrap();

        assert!(left_disp.iter().chain(right_disp.iter()).all(|&d| d == 0.0));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let dims = Dims::new(2, 2);
        let img = vec![0u8; 4];
        let mut out = (vec![0.0; 4], vec![0.0; 4]);

        let mut matcher = McManamon::new(Params {
            min_disparity: 5,
            max_disparity: 1,
            ..Default::default()
        });

        assert!(matches!(
            matcher.compute(&img, &img, &dims, &mut out.0, &mut out.1),
            Err(Error::Matcher(_))
        ));
    }

    #[test]
    fn oversized_parameters_are_rejected() {
        let dims = Dims::new(8, 8);
        let img = vec![0u8; dims.len()];
        let mut out = (vec![0.0; dims.len()], vec![0.0; dims.len()]);

        let huge_range = Params {
            max_disparity: usize::MAX,
            ..Default::default()
        };
        let huge_window = Params {
            correlation_window_size: (usize::MAX, usize::MAX),
            ..Default::default()
        };

        for params in vec![huge_range, huge_window] {
            assert!(matches!(
                McManamon::new(params).compute(&img, &img, &dims, &mut out.0, &mut out.1),
                Err(Error::Matcher(_))
            ));
        }
        assert!(out.0.iter().chain(out.1.iter()).all(|&d| d == 0.0));
    }

    #[test]
    fn large_threshold_saturates() {
        let dims = Dims::new(16, 5);
        let img: Vec<u8> = (0..dims.len()).map(|i| (i * 29 % 251) as u8).collect();
        let mut out = (vec![0.0; dims.len()], vec![0.0; dims.len()]);

        let mut matcher = McManamon::new(Params {
            max_disparity: 4,
            dyn_disparity_threshold: usize::MAX,
            correlation_window_size: (3, 3),
            ..Default::default()
        });

        matcher
            .compute(&img, &img, &dims, &mut out.0, &mut out.1)
            .unwrap();
        assert!(out.0.iter().chain(out.1.iter()).all(|&d| d <= 4.5));
    }

    #[test]
    fn empty_geometry_is_a_no_op() {
        let dims = Dims::new(0, 0);
        let mut out: (Vec<f32>, Vec<f32>) = (Vec::new(), Vec::new());

        McManamon::new(small_params())
            .compute(&[], &[], &dims, &mut out.0, &mut out.1)
            .unwrap();
    }

    #[test]
    fn subpixel_offset_is_bounded() {
        assert_eq!(subpixel_offset(&[1.0, 0.0], 1), 0.0);
        assert_eq!(subpixel_offset(&[2.0, 1.0, 2.0], 1), 0.0);
        assert_eq!(subpixel_offset(&[1.0, 1.0, 1.0], 1), 0.0);

        let off = subpixel_offset(&[3.0, 1.0, 2.0], 1);
        assert!(off > 0.0 && off <= 0.5);
    }
}
