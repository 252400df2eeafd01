//! Spectral Analysis of Noise Images
//!
//! Measurement tools for checking what a generated raster actually
//! contains: the radially averaged power spectrum, its peak, and the
//! power-law exponent of its spectral falloff.
//!
//! ## Spectral Slope by Noise Color
//!
//! Amplitude weighting `1/f^α` gives power `∝ 1/f^(2α)`:
//!
//! | Noise  | α (amplitude) | log-log power slope |
//! |--------|---------------|---------------------|
//! | White  | 0             | 0                   |
//! | Pink   | 1             | -2                  |
//! | Brown  | 2             | -4                  |

use serde::{Deserialize, Serialize};

use crate::fft2d::{fftshift, Fft2d};
use crate::grid::SamplingGrid;
use crate::types::{NoiseError, NoiseResult, Raster};

fn check_shape(raster: &Raster, grid: &SamplingGrid) -> NoiseResult<()> {
    if raster.shape() != grid.shape() {
        return Err(NoiseError::ShapeMismatch {
            expected: grid.shape(),
            actual: raster.shape(),
        });
    }
    Ok(())
}

/// Centered power `|F|²` of the mean-removed raster, row-major.
pub fn power_spectrum(raster: &Raster, grid: &SamplingGrid) -> NoiseResult<Vec<f64>> {
    check_shape(raster, grid)?;
    let mean = raster.mean();
    let centered = raster.map(|v| v - mean);
    let (h, w) = raster.shape();
    let transform = Fft2d::new(h, w).forward_real(&centered)?;
    Ok(fftshift(h, w, &transform)
        .iter()
        .map(|c| c.norm_sqr())
        .collect())
}

/// Power averaged over rings one frequency step wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadialPowerSpectrum {
    /// Ring center frequencies (multiples of the frequency resolution).
    pub frequencies: Vec<f64>,
    /// Mean power in each ring.
    pub power: Vec<f64>,
    /// Number of bins averaged into each ring.
    pub counts: Vec<usize>,
}

impl RadialPowerSpectrum {
    /// Ring frequency with the highest mean power.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.frequencies[i])
    }
}

/// Radially averaged power spectrum, DC ring excluded.
pub fn radial_power_spectrum(
    raster: &Raster,
    grid: &SamplingGrid,
) -> NoiseResult<RadialPowerSpectrum> {
    let power = power_spectrum(raster, grid)?;
    let radial = grid.radial_frequency();
    let df = grid.frequency_resolution();

    let max_ring = radial
        .iter()
        .map(|r| (r / df).round() as usize)
        .max()
        .unwrap_or(0);
    let mut sums = vec![0.0; max_ring + 1];
    let mut counts = vec![0usize; max_ring + 1];
    for (r, p) in radial.iter().zip(&power) {
        let ring = (r / df).round() as usize;
        sums[ring] += p;
        counts[ring] += 1;
    }

    let mut spectrum = RadialPowerSpectrum {
        frequencies: Vec::new(),
        power: Vec::new(),
        counts: Vec::new(),
    };
    for ring in 1..=max_ring {
        if counts[ring] > 0 {
            spectrum.frequencies.push(ring as f64 * df);
            spectrum.power.push(sums[ring] / counts[ring] as f64);
            spectrum.counts.push(counts[ring]);
        }
    }
    Ok(spectrum)
}

/// Least-squares slope of `log10(power)` against `log10(radial frequency)`
/// over every bin with `f_min <= r <= f_max`.
pub fn power_law_slope(
    raster: &Raster,
    grid: &SamplingGrid,
    f_min: f64,
    f_max: f64,
) -> NoiseResult<f64> {
    if !(f_min > 0.0 && f_min < f_max) {
        return Err(NoiseError::config(
            "frequency_window",
            format!("needs 0 < f_min < f_max (got {f_min}..{f_max})"),
        ));
    }
    let power = power_spectrum(raster, grid)?;
    let points: Vec<(f64, f64)> = grid
        .radial_frequency()
        .into_iter()
        .zip(power)
        .filter(|&(r, p)| r >= f_min && r <= f_max && p > 0.0)
        .map(|(r, p)| (r.log10(), p.log10()))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();
    if points.len() < 2 || sxx <= 0.0 {
        return Err(NoiseError::NumericDegeneracy(format!(
            "too few distinct frequencies in {f_min}..{f_max} to fit a slope"
        )));
    }
    Ok(sxy / sxx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn grating(grid: &SamplingGrid, frequency: f64) -> Raster {
        let dx = 1.0 / grid.rate_x();
        Raster::from_fn(grid.height(), grid.width(), |_, c| {
            (2.0 * PI * frequency * c as f64 * dx).cos()
        })
    }

    #[test]
    fn test_grating_power_at_its_frequency() {
        let grid = SamplingGrid::spectral((32, 32), 32.0).unwrap();
        let power = power_spectrum(&grating(&grid, 4.0), &grid).unwrap();
        let (cy, cx) = grid.dc_index();
        let peak = power[cy * 32 + cx + 4];
        assert_relative_eq!(peak, power[cy * 32 + cx - 4], epsilon = 1e-6);
        let total: f64 = power.iter().sum();
        assert_relative_eq!(2.0 * peak, total, epsilon = 1e-6);
    }

    #[test]
    fn test_radial_peak_frequency() {
        let grid = SamplingGrid::spectral((64, 64), 60.0).unwrap();
        let df = grid.frequency_resolution();
        let radial = radial_power_spectrum(&grating(&grid, 6.0 * df), &grid).unwrap();
        assert_relative_eq!(radial.peak_frequency().unwrap(), 6.0 * df, epsilon = 1e-12);
        assert!(radial.frequencies.iter().all(|&f| f > 0.0));
        assert_eq!(radial.frequencies.len(), radial.power.len());
    }

    #[test]
    fn test_slope_requires_window() {
        let grid = SamplingGrid::spectral((8, 8), 8.0).unwrap();
        let raster = grating(&grid, 2.0);
        assert!(power_law_slope(&raster, &grid, 3.0, 1.0).is_err());
        assert!(matches!(
            power_law_slope(&raster, &grid, 100.0, 200.0),
            Err(NoiseError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = SamplingGrid::spectral((8, 8), 8.0).unwrap();
        let raster = Raster::filled(4, 8, 0.0);
        assert!(matches!(
            power_spectrum(&raster, &grid),
            Err(NoiseError::ShapeMismatch { .. })
        ));
    }
}
