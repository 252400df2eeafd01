//! # Spectral Noise Synthesis
//!
//! This crate generates 2D noise rasters with a controlled power spectrum
//! for visual-perception experiments: flat (white), narrowband, power-law
//! (pink, brown, arbitrary exponent), orientation-tuned, and binary noise.
//!
//! ## Overview
//!
//! Noise is built in the frequency domain. A conjugate-symmetric spectrum
//! is synthesized, shaped by a real frequency filter, and inverse
//! transformed; the real result is then rescaled to a target intensity
//! range or contrast.
//!
//! - **Grid**: shape plus sampling rate, and the centered frequency axes
//! - **Spectrum**: exact-magnitude (random phase only) or free synthesis
//! - **Filters**: bandpass ring, radial power law, oriented Gaussian
//! - **Realizer**: inverse 2D FFT keeping the real part
//! - **Adaptation**: intensity range, RMS, normalized RMS, Michelson
//!
//! ## Signal Flow
//!
//! ```text
//! (shape, rate) → SamplingGrid → Spectrum → × FilterKernel → IFFT → Re → Adaptation → NoiseImage
//! ```
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use stimnoise_core::prelude::*;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(123);
//! let options = NoiseOptions::default()
//!     .pseudo_noise(true)
//!     .intensity_range(0.0, 1.0);
//! let noise = narrowband((64, 64), 60.0, 5.0, 1.0, options, &mut rng).unwrap();
//!
//! assert_eq!(noise.image().shape(), (64, 64));
//! assert!(noise.metadata().sigma.is_some());
//! ```
//!
//! Randomness is always explicit: every synthesis function takes a
//! generator, and only [`noise::generate`] seeds one itself.

pub mod adapt;
pub mod analysis;
pub mod config;
pub mod fft2d;
pub mod filters;
pub mod grid;
pub mod noise;
pub mod observe;
pub mod spectrum;
pub mod types;

pub use adapt::{Adaptation, ImageStatistics};
pub use config::{ConfigError, StimNoiseConfig};
pub use filters::{Filter, FilterKernel};
pub use grid::{SamplingGrid, SamplingRate};
pub use noise::{generate, generate_with, NoiseImage, NoiseKind, NoiseMetadata, NoiseOptions, NoiseRequest};
pub use spectrum::{SourceDistribution, Spectrum, SynthesisMode};
pub use types::{Complex, NoiseError, NoiseResult, Raster};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapt::{adapt_intensity_range, adapt_rms_contrast, Adaptation};
    pub use crate::grid::{SamplingGrid, SamplingRate};
    pub use crate::noise::{
        binary, brown, generate, generate_with, narrowband, one_over_f, oriented, pink, white,
        NoiseImage, NoiseKind, NoiseOptions, NoiseRequest,
    };
    pub use crate::spectrum::SynthesisMode;
    pub use crate::types::{NoiseError, NoiseResult, Raster};
}
