//! Contrast and Range Adaptation
//!
//! Rescales a realized noise image to a target intensity range or contrast.
//! Every adaptation is affine, so it never alters the shape of the power
//! spectrum apart from the DC bin.
//!
//! | Adaptation        | Target statistic                       |
//! |-------------------|----------------------------------------|
//! | Intensity range   | `min → lo`, `max → hi`                 |
//! | RMS contrast      | standard deviation (+ optional mean)   |
//! | Normalized RMS    | standard deviation / mean luminance    |
//! | Michelson         | `(max - min) / (max + min)`            |
//!
//! Reapplying an adaptation with the same target returns the input
//! unchanged.

use serde::{Deserialize, Serialize};

use crate::types::{NoiseError, NoiseResult, Raster};

/// Relative tolerance under which a target statistic counts as reached.
const TARGET_TOLERANCE: f64 = 1e-12;

/// Summary statistics of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub rms_contrast: f64,
}

impl ImageStatistics {
    pub fn of(raster: &Raster) -> Self {
        Self {
            min: raster.min(),
            max: raster.max(),
            mean: raster.mean(),
            rms_contrast: raster.std(),
        }
    }

    /// `(max - min) / (max + min)`; NaN when `max + min == 0`.
    pub fn michelson_contrast(&self) -> f64 {
        (self.max - self.min) / (self.max + self.min)
    }

    /// RMS contrast divided by mean luminance.
    pub fn normalized_rms_contrast(&self) -> f64 {
        self.rms_contrast / self.mean
    }
}

/// Target adaptation applied after realization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adapt", rename_all = "snake_case")]
pub enum Adaptation {
    IntensityRange {
        lo: f64,
        hi: f64,
    },
    RmsContrast {
        contrast: f64,
        mean_luminance: Option<f64>,
    },
    NormalizedRmsContrast {
        contrast: f64,
        mean_luminance: Option<f64>,
    },
    MichelsonContrast {
        contrast: f64,
        mean_luminance: Option<f64>,
    },
}

impl Default for Adaptation {
    fn default() -> Self {
        Adaptation::IntensityRange { lo: 0.0, hi: 1.0 }
    }
}

impl Adaptation {
    /// Check the target without touching a raster.
    pub fn validate(&self) -> NoiseResult<()> {
        match *self {
            Adaptation::IntensityRange { lo, hi } => require_range(lo, hi),
            Adaptation::RmsContrast {
                contrast,
                mean_luminance,
            }
            | Adaptation::NormalizedRmsContrast {
                contrast,
                mean_luminance,
            }
            | Adaptation::MichelsonContrast {
                contrast,
                mean_luminance,
            } => {
                require_contrast(contrast)?;
                require_mean(mean_luminance)
            }
        }
    }

    pub fn apply(&self, raster: &Raster) -> NoiseResult<Raster> {
        match *self {
            Adaptation::IntensityRange { lo, hi } => adapt_intensity_range(raster, lo, hi),
            Adaptation::RmsContrast {
                contrast,
                mean_luminance,
            } => adapt_rms_contrast(raster, contrast, mean_luminance),
            Adaptation::NormalizedRmsContrast {
                contrast,
                mean_luminance,
            } => adapt_normalized_rms_contrast(raster, contrast, mean_luminance),
            Adaptation::MichelsonContrast {
                contrast,
                mean_luminance,
            } => adapt_michelson_contrast(raster, contrast, mean_luminance),
        }
    }
}

fn close(value: f64, target: f64) -> bool {
    (value - target).abs() <= TARGET_TOLERANCE * target.abs().max(1.0)
}

fn require_contrast(contrast: f64) -> NoiseResult<()> {
    if !(contrast.is_finite() && contrast > 0.0) {
        return Err(NoiseError::config(
            "contrast",
            format!("must be positive and finite (got {contrast})"),
        ));
    }
    Ok(())
}

fn require_mean(mean_luminance: Option<f64>) -> NoiseResult<()> {
    match mean_luminance {
        Some(m) if !m.is_finite() => Err(NoiseError::config(
            "mean_luminance",
            format!("must be finite (got {m})"),
        )),
        _ => Ok(()),
    }
}

fn require_range(lo: f64, hi: f64) -> NoiseResult<()> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(NoiseError::config(
            "intensity_range",
            format!("needs finite bounds with lo < hi (got ({lo}, {hi}))"),
        ));
    }
    Ok(())
}

/// Affine rescale so that `min → lo` and `max → hi`.
pub fn adapt_intensity_range(raster: &Raster, lo: f64, hi: f64) -> NoiseResult<Raster> {
    require_range(lo, hi)?;
    let (min, max) = (raster.min(), raster.max());
    if min == lo && max == hi {
        return Ok(raster.clone());
    }
    if min == max {
        return Err(NoiseError::NumericDegeneracy(format!(
            "cannot stretch a constant raster (all samples {min}) to an intensity range"
        )));
    }

    let span = max - min;
    Ok(raster.map(|v| {
        let t = (v - min) / span;
        (lo * (1.0 - t) + hi * t).clamp(lo, hi)
    }))
}

/// Standard deviation, relative to `|mean|`, at or below which a raster is
/// treated as constant: a few rounding steps of the mean itself.
const DEGENERATE_STD: f64 = 64.0 * f64::EPSILON;

/// Set the standard deviation to `contrast`.
///
/// The result's mean is `mean_luminance` when given, otherwise the input's
/// mean is kept. A raster whose standard deviation is zero or at most
/// `64·ε·|mean|` (rounding noise of a constant raster) is rejected with
/// [`NoiseError::NumericDegeneracy`].
pub fn adapt_rms_contrast(
    raster: &Raster,
    contrast: f64,
    mean_luminance: Option<f64>,
) -> NoiseResult<Raster> {
    require_contrast(contrast)?;
    require_mean(mean_luminance)?;

    let mean = raster.mean();
    let std = raster.std();
    if std == 0.0 || std <= DEGENERATE_STD * mean.abs() {
        return Err(NoiseError::NumericDegeneracy(format!(
            "RMS contrast adaptation of an effectively constant raster (std {std:e}, mean {mean})"
        )));
    }
    let target_mean = mean_luminance.unwrap_or(mean);
    if close(std, contrast) && close(mean, target_mean) {
        return Ok(raster.clone());
    }

    let gain = contrast / std;
    Ok(raster.map(|v| (v - mean) * gain + target_mean))
}

/// Set `std / mean` to `contrast` around `mean_luminance` (or the input's mean).
pub fn adapt_normalized_rms_contrast(
    raster: &Raster,
    contrast: f64,
    mean_luminance: Option<f64>,
) -> NoiseResult<Raster> {
    require_mean(mean_luminance)?;
    let target_mean = mean_luminance.unwrap_or_else(|| raster.mean());
    if target_mean == 0.0 {
        return Err(NoiseError::NumericDegeneracy(
            "normalized RMS contrast needs a non-zero mean luminance".to_string(),
        ));
    }
    adapt_rms_contrast(raster, contrast * target_mean.abs(), Some(target_mean))
}

/// Set `(max - min) / (max + min)` to `contrast`, centred on
/// `mean_luminance` (or the input's mid-range).
pub fn adapt_michelson_contrast(
    raster: &Raster,
    contrast: f64,
    mean_luminance: Option<f64>,
) -> NoiseResult<Raster> {
    require_contrast(contrast)?;
    require_mean(mean_luminance)?;
    let center = mean_luminance.unwrap_or_else(|| 0.5 * (raster.min() + raster.max()));
    if center <= 0.0 {
        return Err(NoiseError::NumericDegeneracy(format!(
            "Michelson contrast needs a positive mean luminance (got {center})"
        )));
    }
    adapt_intensity_range(raster, center * (1.0 - contrast), center * (1.0 + contrast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Raster {
        Raster::from_fn(8, 8, |r, c| ((r * 13 + c * 7) % 17) as f64 * 0.37 - 2.1)
    }

    #[test]
    fn test_intensity_range_exact_bounds() {
        let adapted = adapt_intensity_range(&sample(), 0.1, 0.3).unwrap();
        assert_eq!(adapted.min(), 0.1);
        assert_eq!(adapted.max(), 0.3);
    }

    #[test]
    fn test_intensity_range_idempotent() {
        let once = adapt_intensity_range(&sample(), -1.0, 2.5).unwrap();
        let twice = adapt_intensity_range(&once, -1.0, 2.5).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_intensity_range_preserves_order() {
        let raster = sample();
        let adapted = adapt_intensity_range(&raster, 0.0, 1.0).unwrap();
        for (i, j) in [(0, 5), (3, 40), (11, 63)] {
            let before = raster.as_slice()[i] < raster.as_slice()[j];
            let after = adapted.as_slice()[i] < adapted.as_slice()[j];
            assert_eq!(before, after);
        }
    }

    #[test]
    fn test_intensity_range_constant_is_degenerate() {
        let flat = Raster::filled(4, 4, 0.5);
        assert!(matches!(
            adapt_intensity_range(&flat, 0.0, 1.0),
            Err(NoiseError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn test_intensity_range_rejects_inverted_bounds() {
        assert!(matches!(
            adapt_intensity_range(&sample(), 1.0, 0.0),
            Err(NoiseError::Configuration {
                parameter: "intensity_range",
                ..
            })
        ));
    }

    #[test]
    fn test_rms_contrast_reaches_target() {
        let adapted = adapt_rms_contrast(&sample(), 0.2, Some(0.5)).unwrap();
        let stats = ImageStatistics::of(&adapted);
        assert_relative_eq!(stats.rms_contrast, 0.2, epsilon = 1e-12);
        assert_relative_eq!(stats.mean, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rms_contrast_keeps_mean_by_default() {
        let raster = sample();
        let adapted = adapt_rms_contrast(&raster, 1.5, None).unwrap();
        assert_relative_eq!(adapted.mean(), raster.mean(), epsilon = 1e-12);
        assert_relative_eq!(adapted.std(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_rms_contrast_idempotent() {
        let once = adapt_rms_contrast(&sample(), 0.2, Some(0.5)).unwrap();
        let twice = adapt_rms_contrast(&once, 0.2, Some(0.5)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rms_contrast_zero_variance() {
        for value in [0.0, 0.1, 7.3] {
            let flat = Raster::filled(5, 3, value);
            assert!(matches!(
                adapt_rms_contrast(&flat, 0.2, None),
                Err(NoiseError::NumericDegeneracy(_))
            ));
        }
    }

    #[test]
    fn test_rms_contrast_small_variance_on_large_mean() {
        let data = (0..16)
            .map(|i| if (i / 4 + i % 4) % 2 == 0 { 1000.0 + 1e-9 } else { 1000.0 - 1e-9 })
            .collect();
        let raster = Raster::new(4, 4, data).unwrap();
        let adapted = adapt_rms_contrast(&raster, 0.1, None).unwrap();
        assert_relative_eq!(adapted.std(), 0.1, epsilon = 1e-6);
        assert_relative_eq!(adapted.mean(), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_normalized_rms_contrast() {
        let adapted = adapt_normalized_rms_contrast(&sample(), 0.1, Some(50.0)).unwrap();
        let stats = ImageStatistics::of(&adapted);
        assert_relative_eq!(stats.normalized_rms_contrast(), 0.1, epsilon = 1e-10);
        assert_relative_eq!(stats.mean, 50.0, epsilon = 1e-10);
    }

    #[test]
    fn test_michelson_contrast() {
        let adapted = adapt_michelson_contrast(&sample(), 0.4, Some(0.5)).unwrap();
        let stats = ImageStatistics::of(&adapted);
        assert_relative_eq!(stats.michelson_contrast(), 0.4, epsilon = 1e-12);
        assert_relative_eq!(stats.min, 0.3, epsilon = 1e-12);
        assert_relative_eq!(stats.max, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_michelson_needs_positive_center() {
        assert!(matches!(
            adapt_michelson_contrast(&sample(), 0.4, Some(0.0)),
            Err(NoiseError::NumericDegeneracy(_))
        ));
    }

    #[test]
    fn test_adaptation_validate() {
        assert!(Adaptation::IntensityRange { lo: 0.0, hi: 0.0 }.validate().is_err());
        assert!(Adaptation::RmsContrast {
            contrast: -0.1,
            mean_luminance: None
        }
        .validate()
        .is_err());
        assert!(Adaptation::MichelsonContrast {
            contrast: 0.5,
            mean_luminance: Some(f64::INFINITY)
        }
        .validate()
        .is_err());
        assert!(Adaptation::default().validate().is_ok());
    }

    #[test]
    fn test_adaptation_dispatch() {
        let raster = sample();
        let via_enum = Adaptation::RmsContrast {
            contrast: 0.3,
            mean_luminance: None,
        }
        .apply(&raster)
        .unwrap();
        assert_eq!(via_enum, adapt_rms_contrast(&raster, 0.3, None).unwrap());
        assert_eq!(
            Adaptation::default(),
            Adaptation::IntensityRange { lo: 0.0, hi: 1.0 }
        );
    }
}
