//! 2D FFT Utilities and the Inverse-Transform Realizer
//!
//! Row-column decomposition of the 2D discrete Fourier transform on top of
//! `rustfft` plans, plus the quadrant shifts that move between the standard
//! DFT ordering (DC at index 0) and the centered ordering used by
//! [`Spectrum`](crate::spectrum::Spectrum) and [`SamplingGrid`](crate::grid::SamplingGrid).
//!
//! ```text
//!   standard order            centered order
//!  ┌────┬────┐               ┌────┬────┐
//!  │ DC │ B  │   fftshift    │ D  │ C  │
//!  ├────┼────┤  ─────────►   ├────┼────┤
//!  │ C  │ D  │  ◄─────────   │ B  │ DC │   (DC at [H/2, W/2])
//!  └────┴────┘   ifftshift   └────┴────┘
//! ```
//!
//! ## Normalization
//!
//! The forward transform is unnormalized; the inverse divides by `H·W`, so
//! `inverse(forward(x)) == x`.

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

use crate::spectrum::Spectrum;
use crate::types::{NoiseError, NoiseResult, Raster};

/// Relative imaginary residual above which the realizer logs a warning.
pub const IMAGINARY_TOLERANCE: f64 = 1e-9;

/// 2D FFT processor for a fixed `height × width` grid.
pub struct Fft2d {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    column: Vec<Complex64>,
}

impl fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2d")
            .field("height", &self.height)
            .field("width", &self.width)
            .finish()
    }
}

impl Fft2d {
    /// Plan forward and inverse transforms for the given shape.
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_forward = planner.plan_fft_forward(width);
        let row_inverse = planner.plan_fft_inverse(width);
        let col_forward = planner.plan_fft_forward(height);
        let col_inverse = planner.plan_fft_inverse(height);
        let scratch_len = [&row_forward, &row_inverse, &col_forward, &col_inverse]
            .iter()
            .map(|plan| plan.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Self {
            height,
            width,
            row_forward,
            row_inverse,
            col_forward,
            col_inverse,
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
            column: vec![Complex64::new(0.0, 0.0); height],
        }
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Unnormalized forward transform, in place, standard ordering.
    pub fn forward_inplace(&mut self, buffer: &mut [Complex64]) -> NoiseResult<()> {
        self.check_len(buffer)?;
        let (row, col) = (self.row_forward.clone(), self.col_forward.clone());
        self.process(buffer, row.as_ref(), col.as_ref());
        Ok(())
    }

    /// Inverse transform normalized by `1 / (H·W)`, in place.
    pub fn inverse_inplace(&mut self, buffer: &mut [Complex64]) -> NoiseResult<()> {
        self.check_len(buffer)?;
        let (row, col) = (self.row_inverse.clone(), self.col_inverse.clone());
        self.process(buffer, row.as_ref(), col.as_ref());

        let scale = 1.0 / (self.height * self.width) as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
        Ok(())
    }

    /// Forward transform of a real raster, standard ordering.
    pub fn forward_real(&mut self, raster: &Raster) -> NoiseResult<Vec<Complex64>> {
        if raster.shape() != self.shape() {
            return Err(NoiseError::ShapeMismatch {
                expected: self.shape(),
                actual: raster.shape(),
            });
        }
        let mut buffer: Vec<Complex64> = raster
            .as_slice()
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        self.forward_inplace(&mut buffer)?;
        Ok(buffer)
    }

    fn check_len(&self, buffer: &[Complex64]) -> NoiseResult<()> {
        let expected = self.height * self.width;
        if buffer.len() != expected {
            return Err(NoiseError::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(())
    }

    fn process(&mut self, buffer: &mut [Complex64], row_fft: &dyn Fft<f64>, col_fft: &dyn Fft<f64>) {
        for row in buffer.chunks_exact_mut(self.width) {
            row_fft.process_with_scratch(row, &mut self.scratch);
        }

        // Gather each column, transform, scatter back
        for col in 0..self.width {
            for (r, slot) in self.column.iter_mut().enumerate() {
                *slot = buffer[r * self.width + col];
            }
            col_fft.process_with_scratch(&mut self.column, &mut self.scratch);
            for (r, value) in self.column.iter().enumerate() {
                buffer[r * self.width + col] = *value;
            }
        }
    }
}

fn shift<T: Copy>(height: usize, width: usize, data: &[T], dy: usize, dx: usize) -> Vec<T> {
    let mut shifted = data.to_vec();
    for row in 0..height {
        let out_row = (row + dy) % height;
        for col in 0..width {
            let out_col = (col + dx) % width;
            shifted[out_row * width + out_col] = data[row * width + col];
        }
    }
    shifted
}

/// Move the zero-frequency bin from index 0 to the center `[H/2, W/2]`.
pub fn fftshift<T: Copy>(height: usize, width: usize, data: &[T]) -> Vec<T> {
    shift(height, width, data, height / 2, width / 2)
}

/// Inverse of [`fftshift`]; differs from it only for odd dimensions.
pub fn ifftshift<T: Copy>(height: usize, width: usize, data: &[T]) -> Vec<T> {
    shift(height, width, data, height - height / 2, width - width / 2)
}

/// Result of the inverse-transform realizer.
#[derive(Debug, Clone)]
pub struct Realization {
    /// Real part of the inverse transform.
    pub image: Raster,
    /// Largest absolute imaginary component that was discarded.
    pub max_imaginary: f64,
}

/// Inverse-transform a centered spectrum and keep the real component.
///
/// The imaginary residual is reported, never corrected.
pub fn realize(spectrum: &Spectrum) -> NoiseResult<Realization> {
    let (height, width) = spectrum.shape();
    let mut buffer = ifftshift(height, width, spectrum.bins());
    Fft2d::new(height, width).inverse_inplace(&mut buffer)?;

    let mut max_imaginary = 0.0f64;
    let mut max_real = 0.0f64;
    let data: Vec<f64> = buffer
        .iter()
        .map(|c| {
            max_imaginary = max_imaginary.max(c.im.abs());
            max_real = max_real.max(c.re.abs());
            c.re
        })
        .collect();

    if max_imaginary > IMAGINARY_TOLERANCE * max_real.max(1.0) {
        tracing::warn!(
            max_imaginary,
            max_real,
            "inverse transform has a non-negligible imaginary residual"
        );
    }

    Ok(Realization {
        image: Raster::new(height, width, data)?,
        max_imaginary,
    })
}
