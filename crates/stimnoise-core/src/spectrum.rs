//! Hermitian Spectrum Synthesizer
//!
//! Builds the complex, centered frequency-domain representation of a noise
//! image. Every spectrum produced here is conjugate-symmetric,
//! `S[-u,-v] == conj(S[u,v])`, so its inverse transform is real-valued.
//!
//! ## Modes
//!
//! | Mode   | Magnitude                | Phase  | Use                                  |
//! |--------|--------------------------|--------|--------------------------------------|
//! | Pseudo | exactly `A/2` (non-DC)   | random | identical amplitude spectra per draw |
//! | Free   | random                   | random | transform of i.i.d. pixel samples    |
//!
//! ## Exact-Magnitude Construction
//!
//! For an even `H × W` grid (centered layout, DC at `[H/2, W/2]`):
//!
//! ```text
//!          col 0   1 .. W/2-1   W/2   W/2+1 .. W-1
//! row 0     F*     seam row (Nyquist, self-mirrored)
//! 1..H/2-1  seam   [ drawn Q1 ]  seam  [ drawn Q2 ]
//! H/2       F*     seam row (DC row, self-mirrored)  DC at col W/2
//! H/2+1..   seam   [ conj Q2  ]  seam  [ conj Q1  ]
//!
//! F* = fixed points set to -A/2 + 0j, DC = 0
//! ```
//!
//! Every drawn bin has a real part uniform in `[-A/2, A/2]` and an imaginary
//! part of random sign chosen so that `|z| = A/2`.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

use crate::fft2d::{fftshift, Fft2d};
use crate::filters::FilterKernel;
use crate::grid::SamplingGrid;
use crate::types::{Complex, NoiseError, NoiseResult};

/// Default spectrum amplitude `A` for exact-magnitude mode.
pub const DEFAULT_AMPLITUDE: f64 = 1.0;

/// Pixel distribution that free-mode spectra are transformed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDistribution {
    /// Uniform in `[-1, 1)`
    #[default]
    Uniform,
    /// Standard normal
    Gaussian,
}

/// How the spectrum's magnitudes are produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum SynthesisMode {
    /// Exact magnitude `amplitude / 2` on every non-DC bin, random phase.
    Pseudo { amplitude: f64 },
    /// Direct transform of independent random samples.
    Free { distribution: SourceDistribution },
}

impl SynthesisMode {
    pub fn pseudo() -> Self {
        SynthesisMode::Pseudo {
            amplitude: DEFAULT_AMPLITUDE,
        }
    }

    pub fn free() -> Self {
        SynthesisMode::Free {
            distribution: SourceDistribution::Uniform,
        }
    }

    pub fn is_pseudo(&self) -> bool {
        matches!(self, SynthesisMode::Pseudo { .. })
    }
}

impl Default for SynthesisMode {
    fn default() -> Self {
        Self::free()
    }
}

/// Mirror of index `i` on a centered axis of length `n`.
#[inline]
pub(crate) fn mirror_index(i: usize, n: usize) -> usize {
    if n % 2 == 0 {
        (n - i) % n
    } else {
        n - 1 - i
    }
}

/// Centered complex spectrum with conjugate symmetry.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    height: usize,
    width: usize,
    bins: Vec<Complex>,
}

impl Spectrum {
    /// Synthesize a spectrum for `grid` in the requested mode.
    ///
    /// Identical generator state yields a bit-identical spectrum.
    pub fn synthesize<R: Rng + ?Sized>(
        grid: &SamplingGrid,
        mode: SynthesisMode,
        rng: &mut R,
    ) -> NoiseResult<Self> {
        match mode {
            SynthesisMode::Pseudo { amplitude } => Self::pseudo_white(grid, amplitude, rng),
            SynthesisMode::Free { distribution } => Self::free_white(grid, distribution, rng),
        }
    }

    /// Exact-magnitude spectrum: `|S| = amplitude / 2` on every non-DC bin.
    pub fn pseudo_white<R: Rng + ?Sized>(
        grid: &SamplingGrid,
        amplitude: f64,
        rng: &mut R,
    ) -> NoiseResult<Self> {
        grid.require_even()?;
        if !(amplitude.is_finite() && amplitude > 0.0) {
            return Err(NoiseError::config(
                "amplitude",
                format!("must be positive and finite (got {amplitude})"),
            ));
        }

        let (h, w) = grid.shape();
        let (hy, hx) = (h / 2, w / 2);
        let half = amplitude / 2.0;
        let real_part = Uniform::new_inclusive(-half, half);
        let mut draw = || {
            let re = real_part.sample(&mut *rng);
            let im = (half * half - re * re).max(0.0).sqrt();
            if rng.gen::<bool>() {
                Complex::new(re, im)
            } else {
                Complex::new(re, -im)
            }
        };

        let mut bins = vec![Complex::new(0.0, 0.0); h * w];

        // Two adjacent quadrants of the negative-fy half
        for row in 1..hy {
            for col in 1..hx {
                bins[row * w + col] = draw();
            }
        }
        for row in 1..hy {
            for col in hx + 1..w {
                bins[row * w + col] = draw();
            }
        }

        // Conjugate mirror into the positive-fy half
        for row in 1..hy {
            for col in (1..w).filter(|&c| c != hx) {
                bins[(h - row) * w + (w - col)] = bins[row * w + col].conj();
            }
        }

        // Nyquist and DC rows, each its own mirror
        for seam_row in [0, hy] {
            for col in 1..hx {
                let z = draw();
                bins[seam_row * w + col] = z;
                bins[seam_row * w + (w - col)] = z.conj();
            }
        }

        // Nyquist and DC columns
        for seam_col in [0, hx] {
            for row in 1..hy {
                let z = draw();
                bins[row * w + seam_col] = z;
                bins[(h - row) * w + seam_col] = z.conj();
            }
        }

        bins[hy * w + hx] = Complex::new(0.0, 0.0);
        for (row, col) in [(0, 0), (0, hx), (hy, 0)] {
            bins[row * w + col] = Complex::new(-half, 0.0);
        }

        tracing::trace!(height = h, width = w, amplitude, "synthesized exact-magnitude spectrum");
        Ok(Self {
            height: h,
            width: w,
            bins,
        })
    }

    /// Free-mode spectrum: transform of independent pixel samples.
    ///
    /// The transform is projected onto its Hermitian part and the DC bin
    /// zeroed, so the result satisfies the same invariants as the pseudo
    /// mode while keeping random magnitudes.
    pub fn free_white<R: Rng + ?Sized>(
        grid: &SamplingGrid,
        distribution: SourceDistribution,
        rng: &mut R,
    ) -> NoiseResult<Self> {
        grid.require_even()?;
        let (h, w) = grid.shape();

        let mut buffer: Vec<Complex> = match distribution {
            SourceDistribution::Uniform => {
                let uniform = Uniform::new(-1.0f64, 1.0);
                (0..h * w)
                    .map(|_| Complex::new(uniform.sample(rng), 0.0))
                    .collect()
            }
            SourceDistribution::Gaussian => (0..h * w)
                .map(|_| Complex::new(StandardNormal.sample(rng), 0.0))
                .collect(),
        };
        Fft2d::new(h, w).forward_inplace(&mut buffer)?;
        let centered = fftshift(h, w, &buffer);

        let mut bins = Vec::with_capacity(h * w);
        for row in 0..h {
            for col in 0..w {
                let mirrored = centered[mirror_index(row, h) * w + mirror_index(col, w)];
                bins.push((centered[row * w + col] + mirrored.conj()) * 0.5);
            }
        }
        bins[(h / 2) * w + w / 2] = Complex::new(0.0, 0.0);

        tracing::trace!(height = h, width = w, ?distribution, "synthesized free spectrum");
        Ok(Self {
            height: h,
            width: w,
            bins,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_bins(height: usize, width: usize, bins: Vec<Complex>) -> Self {
        assert_eq!(bins.len(), height * width);
        Self {
            height,
            width,
            bins,
        }
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Row-major bins, centered ordering.
    pub fn bins(&self) -> &[Complex] {
        &self.bins
    }

    pub fn get(&self, row: usize, col: usize) -> Complex {
        self.bins[row * self.width + col]
    }

    /// Value of the zero-frequency bin.
    pub fn dc(&self) -> Complex {
        self.get(self.height / 2, self.width / 2)
    }

    /// Index of the bin at the negated frequency of `(row, col)`.
    pub fn mirror(&self, row: usize, col: usize) -> (usize, usize) {
        (mirror_index(row, self.height), mirror_index(col, self.width))
    }

    /// Bins that are their own mirror, DC last. Only meaningful for even shapes.
    pub fn fixed_points(&self) -> [(usize, usize); 4] {
        let (hy, hx) = (self.height / 2, self.width / 2);
        [(0, 0), (0, hx), (hy, 0), (hy, hx)]
    }

    /// Largest `|S[-u,-v] - conj(S[u,v])|` over all bins.
    pub fn hermitian_error(&self) -> f64 {
        let mut worst = 0.0f64;
        for row in 0..self.height {
            for col in 0..self.width {
                let (mr, mc) = self.mirror(row, col);
                let err = (self.get(mr, mc) - self.get(row, col).conj()).norm();
                worst = worst.max(err);
            }
        }
        worst
    }

    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.hermitian_error() <= tolerance
    }

    /// Elementwise product with a filter kernel of the same shape.
    pub fn filtered(&self, kernel: &FilterKernel) -> NoiseResult<Spectrum> {
        if kernel.shape() != self.shape() {
            return Err(NoiseError::ShapeMismatch {
                expected: self.shape(),
                actual: kernel.shape(),
            });
        }
        Ok(Self {
            height: self.height,
            width: self.width,
            bins: self
                .bins
                .iter()
                .zip(kernel.weights())
                .map(|(z, &k)| *z * k)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(h: usize, w: usize) -> SamplingGrid {
        SamplingGrid::spectral((h, w), 32.0).unwrap()
    }

    #[test]
    fn test_pseudo_is_hermitian() {
        for (h, w) in [(2, 2), (4, 6), (16, 16), (8, 32)] {
            let mut rng = StdRng::seed_from_u64(7);
            let spectrum = Spectrum::pseudo_white(&grid(h, w), 1.0, &mut rng).unwrap();
            assert!(
                spectrum.is_hermitian(1e-15),
                "{h}x{w} error {}",
                spectrum.hermitian_error()
            );
        }
    }

    #[test]
    fn test_pseudo_flat_magnitude() {
        let mut rng = StdRng::seed_from_u64(11);
        let amplitude = 3.0;
        let spectrum = Spectrum::pseudo_white(&grid(16, 12), amplitude, &mut rng).unwrap();
        let (cy, cx) = (8, 6);
        for row in 0..16 {
            for col in 0..12 {
                let z = spectrum.get(row, col);
                if (row, col) == (cy, cx) {
                    assert_eq!(z, Complex::new(0.0, 0.0));
                } else {
                    assert_relative_eq!(z.norm(), amplitude / 2.0, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_pseudo_fixed_points() {
        let mut rng = StdRng::seed_from_u64(3);
        let spectrum = Spectrum::pseudo_white(&grid(8, 8), 2.0, &mut rng).unwrap();
        let points = spectrum.fixed_points();
        assert_eq!(spectrum.dc(), Complex::new(0.0, 0.0));
        for &(row, col) in &points[..3] {
            assert_eq!(spectrum.get(row, col), Complex::new(-1.0, 0.0));
        }
        for &(row, col) in &points {
            assert_eq!(spectrum.mirror(row, col), (row, col));
        }
    }

    #[test]
    fn test_pseudo_phases_vary() {
        let mut rng = StdRng::seed_from_u64(5);
        let spectrum = Spectrum::pseudo_white(&grid(16, 16), 1.0, &mut rng).unwrap();
        let phases: Vec<f64> = spectrum.bins().iter().map(|z| z.arg()).collect();
        let distinct = phases
            .iter()
            .filter(|&&p| (p - phases[17]).abs() > 1e-6)
            .count();
        assert!(distinct > 200);
    }

    #[test]
    fn test_deterministic_under_seed() {
        let g = grid(16, 16);
        for mode in [SynthesisMode::pseudo(), SynthesisMode::free()] {
            let a = Spectrum::synthesize(&g, mode, &mut StdRng::seed_from_u64(99)).unwrap();
            let b = Spectrum::synthesize(&g, mode, &mut StdRng::seed_from_u64(99)).unwrap();
            let c = Spectrum::synthesize(&g, mode, &mut StdRng::seed_from_u64(100)).unwrap();
            assert_eq!(a, b);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn test_free_is_hermitian_with_zero_dc() {
        for distribution in [SourceDistribution::Uniform, SourceDistribution::Gaussian] {
            let mut rng = StdRng::seed_from_u64(21);
            let spectrum = Spectrum::free_white(&grid(10, 14), distribution, &mut rng).unwrap();
            assert_eq!(spectrum.dc(), Complex::new(0.0, 0.0));
            assert!(spectrum.is_hermitian(1e-12));
            for (row, col) in spectrum.fixed_points() {
                assert_eq!(spectrum.get(row, col).im, 0.0);
            }
        }
    }

    #[test]
    fn test_odd_shape_rejected() {
        let g = SamplingGrid::new((31, 32), 32.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            Spectrum::pseudo_white(&g, 1.0, &mut rng),
            Err(NoiseError::Configuration {
                parameter: "shape",
                ..
            })
        ));
        assert!(Spectrum::free_white(&g, SourceDistribution::Uniform, &mut rng).is_err());
    }

    #[test]
    fn test_invalid_amplitude_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(Spectrum::pseudo_white(&grid(4, 4), 0.0, &mut rng).is_err());
    }

    #[test]
    fn test_hermitian_error_detects_asymmetry() {
        let mut bins = vec![Complex::new(0.0, 0.0); 16];
        bins[5] = Complex::new(1.0, 1.0);
        let spectrum = Spectrum::from_bins(4, 4, bins);
        assert!(!spectrum.is_hermitian(1e-12));
    }

    #[test]
    fn test_filtered_shape_checked() {
        let mut rng = StdRng::seed_from_u64(1);
        let spectrum = Spectrum::pseudo_white(&grid(4, 4), 1.0, &mut rng).unwrap();
        let kernel = FilterKernel::new(4, 6, vec![1.0; 24]).unwrap();
        assert!(matches!(
            spectrum.filtered(&kernel),
            Err(NoiseError::ShapeMismatch { .. })
        ));
    }
}
