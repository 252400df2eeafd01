//! Spectral Grid Builder
//!
//! A [`SamplingGrid`] is the already-resolved `(shape, sampling_rate)` pair
//! handed to the engine. It derives the frequency axes every filter and
//! spectrum is indexed by.
//!
//! ## Frequency Axes
//!
//! Axes are *centered*: the zero-frequency (DC) sample sits at index `N/2`
//! (integer division), negative frequencies to its left.
//!
//! ```text
//! N = 8, rate = 8 samples/unit, df = rate / N = 1
//!
//! index:  0    1    2    3    4    5    6    7
//! freq : -4   -3   -2   -1    0    1    2    3
//!         ^                   ^
//!      Nyquist               DC
//! ```
//!
//! For even `N` the first sample is the Nyquist bin `-rate/2`, which is its
//! own mirror. This is the layout produced by shifting a standard DFT output
//! so low frequencies land in the middle of the image.

use serde::{Deserialize, Serialize};

use crate::types::{NoiseError, NoiseResult};

/// Sampling rate in samples per unit length (e.g. pixels per degree).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SamplingRate {
    /// Same rate along both axes.
    Isotropic(f64),
    /// `(rate_y, rate_x)`
    Axes(f64, f64),
}

impl SamplingRate {
    /// `(rate_y, rate_x)`
    pub fn axes(&self) -> (f64, f64) {
        match *self {
            SamplingRate::Isotropic(rate) => (rate, rate),
            SamplingRate::Axes(rate_y, rate_x) => (rate_y, rate_x),
        }
    }

    pub fn is_isotropic(&self) -> bool {
        let (rate_y, rate_x) = self.axes();
        rate_y == rate_x
    }
}

impl From<f64> for SamplingRate {
    fn from(rate: f64) -> Self {
        SamplingRate::Isotropic(rate)
    }
}

impl From<(f64, f64)> for SamplingRate {
    fn from((rate_y, rate_x): (f64, f64)) -> Self {
        SamplingRate::Axes(rate_y, rate_x)
    }
}

/// Centered frequency axis for `n` samples at `rate` samples per unit.
pub fn frequency_axis(n: usize, rate: f64) -> Vec<f64> {
    let center = (n / 2) as f64;
    let df = rate / n as f64;
    (0..n).map(|i| (i as f64 - center) * df).collect()
}

/// Resolved sampling grid: shape in samples plus per-axis sampling rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingGrid {
    height: usize,
    width: usize,
    rate_y: f64,
    rate_x: f64,
}

impl SamplingGrid {
    /// Validate a resolved shape and sampling rate.
    ///
    /// Dimensions must be positive and rates positive and finite. No
    /// evenness or isotropy requirement; see [`SamplingGrid::spectral`].
    pub fn new(shape: (usize, usize), rate: impl Into<SamplingRate>) -> NoiseResult<Self> {
        let (height, width) = shape;
        if height == 0 || width == 0 {
            return Err(NoiseError::config(
                "shape",
                format!("dimensions must be positive (got {height}x{width})"),
            ));
        }
        let (rate_y, rate_x) = rate.into().axes();
        for rate in [rate_y, rate_x] {
            if !(rate.is_finite() && rate > 0.0) {
                return Err(NoiseError::config(
                    "sampling_rate",
                    format!("must be positive and finite (got {rate})"),
                ));
            }
        }
        Ok(Self {
            height,
            width,
            rate_y,
            rate_x,
        })
    }

    /// Validate a grid for the spectral path: isotropic sampling and an
    /// even number of samples along both axes.
    pub fn spectral(shape: (usize, usize), rate: impl Into<SamplingRate>) -> NoiseResult<Self> {
        let grid = Self::new(shape, rate)?;
        grid.require_isotropic()?;
        grid.require_even()?;
        Ok(grid)
    }

    /// Sampling rate shared by both axes, or a configuration error.
    pub fn require_isotropic(&self) -> NoiseResult<f64> {
        if self.rate_y != self.rate_x {
            return Err(NoiseError::config(
                "sampling_rate",
                format!(
                    "must be equal in both axes (got {} x {})",
                    self.rate_y, self.rate_x
                ),
            ));
        }
        Ok(self.rate_x)
    }

    pub fn require_even(&self) -> NoiseResult<()> {
        if self.height % 2 != 0 || self.width % 2 != 0 {
            return Err(NoiseError::config(
                "shape",
                format!(
                    "shape needs to be even-numbered (got {}x{})",
                    self.height, self.width
                ),
            ));
        }
        Ok(())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn rate_y(&self) -> f64 {
        self.rate_y
    }

    pub fn rate_x(&self) -> f64 {
        self.rate_x
    }

    /// Physical extent `(height, width)` in units of length.
    pub fn visual_size(&self) -> (f64, f64) {
        (
            self.height as f64 / self.rate_y,
            self.width as f64 / self.rate_x,
        )
    }

    /// Frequency step along y.
    pub fn df_y(&self) -> f64 {
        self.rate_y / self.height as f64
    }

    /// Frequency step along x.
    pub fn df_x(&self) -> f64 {
        self.rate_x / self.width as f64
    }

    /// Coarser of the two per-axis frequency steps.
    pub fn frequency_resolution(&self) -> f64 {
        self.df_y().max(self.df_x())
    }

    /// Highest representable radial frequency along the coarser axis.
    pub fn nyquist(&self) -> f64 {
        0.5 * self.rate_y.min(self.rate_x)
    }

    /// Vertical frequency axis, one entry per row.
    pub fn fy(&self) -> Vec<f64> {
        frequency_axis(self.height, self.rate_y)
    }

    /// Horizontal frequency axis, one entry per column.
    pub fn fx(&self) -> Vec<f64> {
        frequency_axis(self.width, self.rate_x)
    }

    /// Row-major `(fy, fx)` evaluation of `f` over the whole grid.
    pub fn map_frequencies(&self, mut f: impl FnMut(f64, f64) -> f64) -> Vec<f64> {
        let fy = self.fy();
        let fx = self.fx();
        let mut out = Vec::with_capacity(self.len());
        for &v in &fy {
            for &u in &fx {
                out.push(f(v, u));
            }
        }
        out
    }

    /// Radial frequency `sqrt(fx² + fy²)` for every bin, row-major.
    pub fn radial_frequency(&self) -> Vec<f64> {
        self.map_frequencies(|fy, fx| fx.hypot(fy))
    }

    /// Row/column index of the DC bin.
    pub fn dc_index(&self) -> (usize, usize) {
        (self.height / 2, self.width / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frequency_axis_even() {
        let axis = frequency_axis(8, 8.0);
        assert_eq!(axis, vec![-4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_frequency_axis_odd() {
        let axis = frequency_axis(5, 10.0);
        assert_eq!(axis, vec![-4.0, -2.0, 0.0, 2.0, 4.0]);
    }

    #[test]
    fn test_grid_axes_and_resolution() {
        let grid = SamplingGrid::spectral((64, 32), 60.0).unwrap();
        assert_eq!(grid.fy().len(), 64);
        assert_eq!(grid.fx().len(), 32);
        assert_relative_eq!(grid.df_y(), 60.0 / 64.0, epsilon = 1e-12);
        assert_relative_eq!(grid.df_x(), 60.0 / 32.0, epsilon = 1e-12);
        assert_relative_eq!(grid.frequency_resolution(), 60.0 / 32.0, epsilon = 1e-12);
        assert_eq!(grid.fy()[32], 0.0);
        assert_eq!(grid.fx()[16], 0.0);
        assert_relative_eq!(grid.fx()[0], -30.0, epsilon = 1e-12);
        assert_eq!(grid.dc_index(), (32, 16));
    }

    #[test]
    fn test_radial_frequency_zero_at_dc() {
        let grid = SamplingGrid::spectral((8, 8), 8.0).unwrap();
        let r = grid.radial_frequency();
        let (cy, cx) = grid.dc_index();
        assert_eq!(r[cy * 8 + cx], 0.0);
        assert_relative_eq!(r[0], 32.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_odd_shape_rejected() {
        let err = SamplingGrid::spectral((31, 32), 32.0).unwrap_err();
        match err {
            NoiseError::Configuration {
                parameter,
                constraint,
            } => {
                assert_eq!(parameter, "shape");
                assert!(constraint.contains("even-numbered"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Plain grids accept odd shapes
        assert!(SamplingGrid::new((31, 32), 32.0).is_ok());
    }

    #[test]
    fn test_anisotropic_rate_rejected() {
        let err = SamplingGrid::spectral((32, 32), (30.0, 32.0)).unwrap_err();
        assert!(matches!(
            err,
            NoiseError::Configuration {
                parameter: "sampling_rate",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(SamplingGrid::new((4, 4), 0.0).is_err());
        assert!(SamplingGrid::new((4, 4), f64::NAN).is_err());
        assert!(SamplingGrid::new((0, 4), 1.0).is_err());
    }

    #[test]
    fn test_visual_size() {
        let grid = SamplingGrid::new((60, 120), 30.0).unwrap();
        assert_eq!(grid.visual_size(), (2.0, 4.0));
    }
}
