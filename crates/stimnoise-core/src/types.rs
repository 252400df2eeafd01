//! Core types for spectral noise synthesis
//!
//! This module defines the error taxonomy shared by every stage of the
//! engine and the real-valued [`Raster`] that carries images between stages.
//!
//! ## Raster Layout
//!
//! Rasters are stored row-major: the sample at `(row, col)` lives at
//! `data[row * width + col]`. Row 0 is the top of the image.
//!
//! ```text
//!          col 0   col 1   ...   col W-1
//! row 0    [ 0 ]   [ 1 ]   ...   [ W-1 ]
//! row 1    [ W ]   [W+1]   ...   [2W-1 ]
//!  ...
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Type alias for complex frequency-domain values
pub type Complex = Complex64;

/// Result type for noise synthesis operations
pub type NoiseResult<T> = Result<T, NoiseError>;

/// Errors that can occur while synthesizing or adapting noise
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoiseError {
    /// Malformed input: odd shape on the spectral path, anisotropic
    /// sampling, missing or out-of-range preset parameter.
    #[error("invalid {parameter}: {constraint}")]
    Configuration {
        parameter: &'static str,
        constraint: String,
    },

    /// The requested operation is undefined for the input (e.g. RMS
    /// adaptation of a zero-variance raster).
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// A noise-kind tag that the dispatcher does not know.
    #[error("unsupported noise kind: '{0}'")]
    UnsupportedMode(String),

    #[error("buffer length mismatch: expected {expected}, got {actual}")]
    BufferLength { expected: usize, actual: usize },

    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

impl NoiseError {
    pub(crate) fn config(parameter: &'static str, constraint: impl Into<String>) -> Self {
        NoiseError::Configuration {
            parameter,
            constraint: constraint.into(),
        }
    }
}

/// Real-valued 2D image, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    height: usize,
    width: usize,
    data: Vec<f64>,
}

impl Raster {
    /// Wrap a row-major buffer. Both dimensions must be positive and the
    /// buffer must hold exactly `height * width` samples.
    pub fn new(height: usize, width: usize, data: Vec<f64>) -> NoiseResult<Self> {
        if height == 0 || width == 0 {
            return Err(NoiseError::config(
                "shape",
                format!("dimensions must be positive (got {height}x{width})"),
            ));
        }
        if data.len() != height * width {
            return Err(NoiseError::BufferLength {
                expected: height * width,
                actual: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build a raster by evaluating `f(row, col)` for every sample.
    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            height,
            width,
            data,
        }
    }

    /// Raster with every sample set to `value`.
    pub fn filled(height: usize, width: usize, value: f64) -> Self {
        Self {
            height,
            width,
            data: vec![value; height * width],
        }
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
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sample at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Iterate over rows as slices.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.width)
    }

    /// Apply `f` to every sample, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            height: self.height,
            width: self.width,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation (divides by N).
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let variance =
            self.data.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / self.data.len() as f64;
        variance.sqrt()
    }

    /// Elementwise sum with another raster of the same shape.
    ///
    /// This is how a noise mask is laid over a painted stimulus.
    pub fn add(&self, other: &Raster) -> NoiseResult<Raster> {
        if self.shape() != other.shape() {
            return Err(NoiseError::ShapeMismatch {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        Ok(Self {
            height: self.height,
            width: self.width,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| a + b)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_raster_rejects_bad_buffer() {
        let err = Raster::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert_eq!(
            err,
            NoiseError::BufferLength {
                expected: 6,
                actual: 5
            }
        );
    }

    #[test]
    fn test_raster_rejects_empty_shape() {
        let err = Raster::new(0, 4, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            NoiseError::Configuration {
                parameter: "shape",
                ..
            }
        ));
    }

    #[test]
    fn test_raster_row_major_indexing() {
        let raster = Raster::from_fn(2, 3, |r, c| (r * 10 + c) as f64);
        assert_eq!(raster.get(0, 2), 2.0);
        assert_eq!(raster.get(1, 0), 10.0);
        assert_eq!(raster.rows().count(), 2);
        assert_eq!(raster.rows().nth(1).unwrap(), &[10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_raster_statistics() {
        let raster = Raster::new(1, 4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(raster.min(), 1.0);
        assert_eq!(raster.max(), 4.0);
        assert_relative_eq!(raster.mean(), 2.5, epsilon = 1e-12);
        assert_relative_eq!(raster.std(), 1.25f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_raster_add() {
        let a = Raster::filled(2, 2, 1.0);
        let b = Raster::from_fn(2, 2, |r, c| (r + c) as f64);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.as_slice(), &[1.0, 2.0, 2.0, 3.0]);

        let c = Raster::filled(2, 3, 0.0);
        assert!(matches!(a.add(&c), Err(NoiseError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_error_messages_name_parameter() {
        let err = NoiseError::config("shape", "shape needs to be even-numbered");
        assert_eq!(
            err.to_string(),
            "invalid shape: shape needs to be even-numbered"
        );
        assert_eq!(
            NoiseError::UnsupportedMode("violet".into()).to_string(),
            "unsupported noise kind: 'violet'"
        );
    }
}
