//! Frequency Filters
//!
//! Real, non-negative multipliers evaluated on the centered `(fy, fx)` grid
//! of a [`SamplingGrid`]. A kernel is applied to a
//! [`Spectrum`](crate::spectrum::Spectrum) by elementwise multiplication
//! before the inverse transform.
//!
//! ## Filter Shapes
//!
//! | Filter           | Weight                                          | Peak |
//! |------------------|-------------------------------------------------|------|
//! | Bandpass         | `exp(-(f_c - r)² / 2σ²)`, σ from octave width   | 1.0  |
//! | Power law        | `1 / r^α`, DC weight 1                          | -    |
//! | Oriented Gaussian| `exp(-(a·fx² + 2b·fx·fy + c·fy²))`              | 1.0  |
//!
//! Every weight depends on `(fy, fx)` only through an even function, so
//! filtering keeps a spectrum conjugate-symmetric.

use serde::{Deserialize, Serialize};

use crate::grid::SamplingGrid;
use crate::spectrum::mirror_index;
use crate::types::{NoiseError, NoiseResult};

/// `3·sqrt(2·ln 2)`: three half-widths at half maximum.
fn octave_divisor() -> f64 {
    3.0 * (2.0 * std::f64::consts::LN_2).sqrt()
}

/// Ring half-width for a bandpass centered at `center_frequency` that is
/// `bandwidth` octaves wide.
///
/// `bandwidth = 1` puts the half-maximum points at `2/3·f_c` and `4/3·f_c`,
/// one octave apart.
pub fn octave_bandwidth_to_sigma(center_frequency: f64, bandwidth: f64) -> f64 {
    center_frequency / octave_divisor() * bandwidth
}

/// Rotated-Gaussian coefficients `(a, b, c)` for an orientation in degrees.
///
/// `a·fx² + 2b·fx·fy + c·fy²` equals `(fx·cosθ - fy·sinθ)² / 2σ²`.
pub fn oriented_gaussian_coefficients(orientation: f64, sigma: f64) -> (f64, f64, f64) {
    let theta = orientation.to_radians();
    let two_var = 2.0 * sigma * sigma;
    let a = theta.cos().powi(2) / two_var;
    let b = -(2.0 * theta).sin() / (2.0 * two_var);
    let c = theta.sin().powi(2) / two_var;
    (a, b, c)
}

/// Real, non-negative weight array matching a spectrum's shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterKernel {
    height: usize,
    width: usize,
    weights: Vec<f64>,
}

impl FilterKernel {
    /// Wrap row-major weights; every weight must be finite and non-negative.
    pub fn new(height: usize, width: usize, weights: Vec<f64>) -> NoiseResult<Self> {
        if weights.len() != height * width {
            return Err(NoiseError::BufferLength {
                expected: height * width,
                actual: weights.len(),
            });
        }
        if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w >= 0.0)) {
            return Err(NoiseError::NumericDegeneracy(format!(
                "filter weight {bad} is negative or not finite"
            )));
        }
        Ok(Self {
            height,
            width,
            weights,
        })
    }

    /// Wrap weights evaluated on `grid`, averaged with their mirror bins.
    ///
    /// On the Nyquist row and column the mirror bin keeps its `fy` (or `fx`)
    /// while the other coordinate flips sign, so a weight with a cross term
    /// differs from its mirror there. Averaging makes `K[-u,-v] == K[u,v]`
    /// hold exactly for every bin, which keeps a filtered spectrum
    /// conjugate-symmetric.
    fn from_grid(grid: &SamplingGrid, weights: Vec<f64>) -> NoiseResult<Self> {
        let (h, w) = grid.shape();
        let symmetric = (0..h * w)
            .map(|i| {
                let (row, col) = (i / w, i % w);
                let mirrored = mirror_index(row, h) * w + mirror_index(col, w);
                0.5 * (weights[i] + weights[mirrored])
            })
            .collect();
        Self::new(h, w, symmetric)
    }

    /// Largest `|K[-u,-v] - K[u,v]|` over all bins.
    pub fn symmetry_error(&self) -> f64 {
        let mut worst = 0.0f64;
        for row in 0..self.height {
            for col in 0..self.width {
                let mirrored =
                    self.get(mirror_index(row, self.height), mirror_index(col, self.width));
                worst = worst.max((self.get(row, col) - mirrored).abs());
            }
        }
        worst
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.width + col]
    }

    pub fn max(&self) -> f64 {
        self.weights.iter().copied().fold(0.0, f64::max)
    }

    /// Elementwise product of two kernels.
    pub fn product(&self, other: &FilterKernel) -> NoiseResult<FilterKernel> {
        if self.shape() != other.shape() {
            return Err(NoiseError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(Self {
            height: self.height,
            width: self.width,
            weights: self
                .weights
                .iter()
                .zip(&other.weights)
                .map(|(a, b)| a * b)
                .collect(),
        })
    }
}

fn require_positive(parameter: &'static str, value: f64) -> NoiseResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(NoiseError::config(
            parameter,
            format!("must be positive and finite (got {value})"),
        ));
    }
    Ok(())
}

fn require_finite(parameter: &'static str, value: f64) -> NoiseResult<()> {
    if !value.is_finite() {
        return Err(NoiseError::config(
            parameter,
            format!("must be finite (got {value})"),
        ));
    }
    Ok(())
}

/// Gaussian ring over radial frequency, normalized to a peak of 1.
pub fn bandpass(
    grid: &SamplingGrid,
    center_frequency: f64,
    bandwidth: f64,
) -> NoiseResult<FilterKernel> {
    require_positive("center_frequency", center_frequency)?;
    require_positive("bandwidth", bandwidth)?;

    let sigma = octave_bandwidth_to_sigma(center_frequency, bandwidth);
    let two_var = 2.0 * sigma * sigma;
    let mut weights = grid.map_frequencies(|fy, fx| {
        let r = fx.hypot(fy);
        (-(center_frequency - r).powi(2) / two_var).exp()
    });

    let peak = weights.iter().copied().fold(0.0, f64::max);
    if peak <= 0.0 {
        return Err(NoiseError::NumericDegeneracy(format!(
            "bandpass at {center_frequency} has no passband below the Nyquist frequency {}",
            grid.nyquist()
        )));
    }
    for w in weights.iter_mut() {
        *w /= peak;
    }

    tracing::trace!(center_frequency, bandwidth, sigma, "built bandpass filter");
    FilterKernel::from_grid(grid, weights)
}

/// Radial power-law weight `1 / r^exponent`; the DC bin is weighted 1.
pub fn power_law(grid: &SamplingGrid, exponent: f64) -> NoiseResult<FilterKernel> {
    require_finite("exponent", exponent)?;
    let weights = grid.map_frequencies(|fy, fx| {
        let r = fx.hypot(fy);
        let r = if r == 0.0 { 1.0 } else { r };
        1.0 / r.powf(exponent)
    });
    tracing::trace!(exponent, "built power-law filter");
    FilterKernel::from_grid(grid, weights)
}

/// Anisotropic Gaussian over `(fx, fy)` at `orientation` degrees.
pub fn oriented_gaussian(
    grid: &SamplingGrid,
    orientation: f64,
    sigma: f64,
) -> NoiseResult<FilterKernel> {
    require_finite("orientation", orientation)?;
    require_positive("sigma", sigma)?;
    let (a, b, c) = oriented_gaussian_coefficients(orientation, sigma);
    let weights =
        grid.map_frequencies(|fy, fx| (-(a * fx * fx + 2.0 * b * fx * fy + c * fy * fy)).exp());
    tracing::trace!(orientation, sigma, "built oriented Gaussian filter");
    FilterKernel::from_grid(grid, weights)
}

/// Closed set of frequency filters with their parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum Filter {
    Bandpass { center_frequency: f64, bandwidth: f64 },
    PowerLaw { exponent: f64 },
    OrientedGaussian { orientation: f64, sigma: f64 },
}

impl Filter {
    /// Check parameters without touching a grid.
    pub fn validate(&self) -> NoiseResult<()> {
        match *self {
            Filter::Bandpass {
                center_frequency,
                bandwidth,
            } => {
                require_positive("center_frequency", center_frequency)?;
                require_positive("bandwidth", bandwidth)
            }
            Filter::PowerLaw { exponent } => require_finite("exponent", exponent),
            Filter::OrientedGaussian { orientation, sigma } => {
                require_finite("orientation", orientation)?;
                require_positive("sigma", sigma)
            }
        }
    }

    /// Evaluate the filter on a grid.
    pub fn kernel(&self, grid: &SamplingGrid) -> NoiseResult<FilterKernel> {
        match *self {
            Filter::Bandpass {
                center_frequency,
                bandwidth,
            } => bandpass(grid, center_frequency, bandwidth),
            Filter::PowerLaw { exponent } => power_law(grid, exponent),
            Filter::OrientedGaussian { orientation, sigma } => {
                oriented_gaussian(grid, orientation, sigma)
            }
        }
    }

    /// Ring half-width actually used by a bandpass filter.
    pub fn effective_sigma(&self) -> Option<f64> {
        match *self {
            Filter::Bandpass {
                center_frequency,
                bandwidth,
            } => Some(octave_bandwidth_to_sigma(center_frequency, bandwidth)),
            Filter::OrientedGaussian { sigma, .. } => Some(sigma),
            Filter::PowerLaw { .. } => None,
        }
    }
}
