//! Noise Presets
//!
//! Named noise kinds built from the spectral pipeline:
//!
//! ```text
//! SamplingGrid ─► Spectrum::synthesize ─► Filter (optional) ─► realize ─► Adaptation
//! ```
//!
//! | Kind         | Filter                       | Power spectrum           |
//! |--------------|------------------------------|--------------------------|
//! | White        | none                         | flat                     |
//! | Narrowband   | bandpass ring at `f_c`       | ring, octave bandwidth   |
//! | One-over-f   | `1 / r^α`                    | `∝ 1 / f^(2α)`           |
//! | Pink         | `1 / r`                      | `∝ 1 / f²`               |
//! | Brown        | `1 / r²`                     | `∝ 1 / f⁴`               |
//! | Oriented     | rotated Gaussian             | elongated, through DC    |
//! | Binary       | n/a (pixel domain)           | flat, two-valued pixels  |
//!
//! Every preset validates its whole request (grid, filter parameters and
//! adaptation target) before anything is allocated. The random generator
//! is always passed in; only [`generate`] creates one, from the request's
//! seed or from OS entropy.
//!
//! ## Example
//!
//! ```rust
//! use stimnoise_core::noise::{generate, NoiseKind, NoiseRequest};
//!
//! let request = NoiseRequest::new(NoiseKind::Pink, (64, 64), 32.0)
//!     .pseudo_noise(true)
//!     .intensity_range(0.0, 1.0)
//!     .seed(7);
//! let noise = generate(&request).unwrap();
//! assert_eq!(noise.image().shape(), (64, 64));
//! assert_eq!(noise.image().min(), 0.0);
//! ```

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::adapt::{Adaptation, ImageStatistics};
use crate::fft2d::realize;
use crate::filters::Filter;
use crate::grid::{SamplingGrid, SamplingRate};
use crate::spectrum::{Spectrum, SynthesisMode};
use crate::types::{NoiseError, NoiseResult, Raster};

/// Power-law exponent of the pink preset.
pub const PINK_EXPONENT: f64 = 1.0;
/// Power-law exponent of the brown preset.
pub const BROWN_EXPONENT: f64 = 2.0;

/// Closed set of noise kinds, each with its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoiseKind {
    White,
    /// Bandpass ring; `bandwidth` in octaves.
    Narrowband {
        center_frequency: f64,
        bandwidth: f64,
    },
    OneOverF {
        exponent: f64,
    },
    Pink,
    Brown,
    /// Oriented Gaussian; `orientation` in degrees.
    Oriented {
        orientation: f64,
        sigma: f64,
    },
    /// Independent two-valued pixels, no spectral path.
    Binary,
}

impl NoiseKind {
    pub fn tag(&self) -> NoiseKindTag {
        match self {
            NoiseKind::White => NoiseKindTag::White,
            NoiseKind::Narrowband { .. } => NoiseKindTag::Narrowband,
            NoiseKind::OneOverF { .. } => NoiseKindTag::OneOverF,
            NoiseKind::Pink => NoiseKindTag::Pink,
            NoiseKind::Brown => NoiseKindTag::Brown,
            NoiseKind::Oriented { .. } => NoiseKindTag::Oriented,
            NoiseKind::Binary => NoiseKindTag::Binary,
        }
    }

    /// Whether the kind goes through spectrum synthesis and the inverse
    /// transform.
    pub fn is_spectral(&self) -> bool {
        !matches!(self, NoiseKind::Binary)
    }

    /// Frequency filter applied to the synthesized spectrum, if any.
    pub fn filter(&self) -> Option<Filter> {
        match *self {
            NoiseKind::White | NoiseKind::Binary => None,
            NoiseKind::Narrowband {
                center_frequency,
                bandwidth,
            } => Some(Filter::Bandpass {
                center_frequency,
                bandwidth,
            }),
            NoiseKind::OneOverF { exponent } => Some(Filter::PowerLaw { exponent }),
            NoiseKind::Pink => Some(Filter::PowerLaw {
                exponent: PINK_EXPONENT,
            }),
            NoiseKind::Brown => Some(Filter::PowerLaw {
                exponent: BROWN_EXPONENT,
            }),
            NoiseKind::Oriented { orientation, sigma } => {
                Some(Filter::OrientedGaussian { orientation, sigma })
            }
        }
    }

    /// Build a kind from a string tag and loosely specified parameters.
    ///
    /// Unknown tags give [`NoiseError::UnsupportedMode`]; a parameter the
    /// kind needs but `params` lacks gives [`NoiseError::Configuration`].
    pub fn from_parts(tag: &str, params: &KindParams) -> NoiseResult<Self> {
        let kind = match tag.parse::<NoiseKindTag>()? {
            NoiseKindTag::White => NoiseKind::White,
            NoiseKindTag::Narrowband => NoiseKind::Narrowband {
                center_frequency: required(
                    "center_frequency",
                    params.center_frequency,
                    NoiseKindTag::Narrowband,
                )?,
                bandwidth: required("bandwidth", params.bandwidth, NoiseKindTag::Narrowband)?,
            },
            NoiseKindTag::OneOverF => NoiseKind::OneOverF {
                exponent: required("exponent", params.exponent, NoiseKindTag::OneOverF)?,
            },
            NoiseKindTag::Pink => NoiseKind::Pink,
            NoiseKindTag::Brown => NoiseKind::Brown,
            NoiseKindTag::Oriented => NoiseKind::Oriented {
                orientation: required("orientation", params.orientation, NoiseKindTag::Oriented)?,
                sigma: required("sigma", params.sigma, NoiseKindTag::Oriented)?,
            },
            NoiseKindTag::Binary => NoiseKind::Binary,
        };
        Ok(kind)
    }
}

fn required(parameter: &'static str, value: Option<f64>, tag: NoiseKindTag) -> NoiseResult<f64> {
    value.ok_or_else(|| NoiseError::config(parameter, format!("required by the {tag} preset")))
}

/// Optional preset parameters, as they arrive from a configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindParams {
    pub center_frequency: Option<f64>,
    pub bandwidth: Option<f64>,
    pub exponent: Option<f64>,
    pub orientation: Option<f64>,
    pub sigma: Option<f64>,
}

/// Parameter-free discriminant of [`NoiseKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKindTag {
    White,
    Narrowband,
    OneOverF,
    Pink,
    Brown,
    Oriented,
    Binary,
}

impl NoiseKindTag {
    pub const ALL: [NoiseKindTag; 7] = [
        NoiseKindTag::White,
        NoiseKindTag::Narrowband,
        NoiseKindTag::OneOverF,
        NoiseKindTag::Pink,
        NoiseKindTag::Brown,
        NoiseKindTag::Oriented,
        NoiseKindTag::Binary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseKindTag::White => "white",
            NoiseKindTag::Narrowband => "narrowband",
            NoiseKindTag::OneOverF => "one_over_f",
            NoiseKindTag::Pink => "pink",
            NoiseKindTag::Brown => "brown",
            NoiseKindTag::Oriented => "oriented",
            NoiseKindTag::Binary => "binary",
        }
    }
}

impl fmt::Display for NoiseKindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseKindTag {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "white" => Ok(NoiseKindTag::White),
            "narrowband" => Ok(NoiseKindTag::Narrowband),
            "one_over_f" | "1/f" => Ok(NoiseKindTag::OneOverF),
            "pink" => Ok(NoiseKindTag::Pink),
            "brown" | "brownian" => Ok(NoiseKindTag::Brown),
            "oriented" => Ok(NoiseKindTag::Oriented),
            "binary" => Ok(NoiseKindTag::Binary),
            _ => Err(NoiseError::UnsupportedMode(s.to_string())),
        }
    }
}

/// Synthesis mode and adaptation target shared by every preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseOptions {
    pub mode: SynthesisMode,
    pub adaptation: Adaptation,
}

impl NoiseOptions {
    pub fn pseudo_noise(mut self, pseudo: bool) -> Self {
        self.mode = if pseudo {
            SynthesisMode::pseudo()
        } else {
            SynthesisMode::free()
        };
        self
    }

    pub fn mode(mut self, mode: SynthesisMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn adaptation(mut self, adaptation: Adaptation) -> Self {
        self.adaptation = adaptation;
        self
    }

    pub fn intensity_range(self, lo: f64, hi: f64) -> Self {
        self.adaptation(Adaptation::IntensityRange { lo, hi })
    }

    pub fn rms_contrast(self, contrast: f64, mean_luminance: Option<f64>) -> Self {
        self.adaptation(Adaptation::RmsContrast {
            contrast,
            mean_luminance,
        })
    }
}

/// Complete, resolved description of one noise image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseRequest {
    pub kind: NoiseKind,
    /// `(height, width)` in samples
    pub shape: (usize, usize),
    pub sampling_rate: SamplingRate,
    #[serde(default)]
    pub options: NoiseOptions,
    /// `None` draws a seed from OS entropy in [`generate`].
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NoiseRequest {
    /// Request with free-mode synthesis, intensity range `(0, 1)` and no seed.
    pub fn new(kind: NoiseKind, shape: (usize, usize), sampling_rate: impl Into<SamplingRate>) -> Self {
        Self {
            kind,
            shape,
            sampling_rate: sampling_rate.into(),
            options: NoiseOptions::default(),
            seed: None,
        }
    }

    pub fn pseudo_noise(mut self, pseudo: bool) -> Self {
        self.options = self.options.pseudo_noise(pseudo);
        self
    }

    pub fn mode(mut self, mode: SynthesisMode) -> Self {
        self.options = self.options.mode(mode);
        self
    }

    pub fn options(mut self, options: NoiseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn adaptation(mut self, adaptation: Adaptation) -> Self {
        self.options = self.options.adaptation(adaptation);
        self
    }

    pub fn intensity_range(mut self, lo: f64, hi: f64) -> Self {
        self.options = self.options.intensity_range(lo, hi);
        self
    }

    pub fn rms_contrast(mut self, contrast: f64, mean_luminance: Option<f64>) -> Self {
        self.options = self.options.rms_contrast(contrast, mean_luminance);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check every precondition and return the grid to synthesize on.
    ///
    /// Sampling must be isotropic for every kind; spectral kinds also need
    /// an even shape.
    pub fn validate(&self) -> NoiseResult<SamplingGrid> {
        let grid = if self.kind.is_spectral() {
            SamplingGrid::spectral(self.shape, self.sampling_rate)?
        } else {
            let grid = SamplingGrid::new(self.shape, self.sampling_rate)?;
            grid.require_isotropic()?;
            grid
        };
        if let Some(filter) = self.kind.filter() {
            filter.validate()?;
        }
        if let SynthesisMode::Pseudo { amplitude } = self.options.mode {
            if !(amplitude.is_finite() && amplitude > 0.0) {
                return Err(NoiseError::config(
                    "amplitude",
                    format!("must be positive and finite (got {amplitude})"),
                ));
            }
        }
        self.options.adaptation.validate()?;
        Ok(grid)
    }
}

/// Parameters a noise image was actually produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseMetadata {
    pub kind: NoiseKind,
    pub grid: SamplingGrid,
    /// `None` for kinds that skip the spectral path.
    pub mode: Option<SynthesisMode>,
    pub filter: Option<Filter>,
    /// Gaussian width in frequency units, derived from the bandwidth for
    /// narrowband noise.
    pub sigma: Option<f64>,
    pub adaptation: Adaptation,
    /// Statistics of the returned image.
    pub achieved: ImageStatistics,
    /// Largest imaginary component discarded by the inverse transform.
    pub max_imaginary: f64,
    pub seed: Option<u64>,
}

/// Real-valued noise raster plus the metadata it was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseImage {
    image: Raster,
    metadata: NoiseMetadata,
}

impl NoiseImage {
    pub fn image(&self) -> &Raster {
        &self.image
    }

    pub fn metadata(&self) -> &NoiseMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (Raster, NoiseMetadata) {
        (self.image, self.metadata)
    }
}

/// Generate the requested image, seeding a [`StdRng`] from `request.seed`
/// or, without a seed, from OS entropy.
pub fn generate(request: &NoiseRequest) -> NoiseResult<NoiseImage> {
    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_with(request, &mut rng)
}

/// Generate the requested image with a caller-supplied generator.
///
/// `request.seed` is recorded in the metadata but not used for drawing.
pub fn generate_with<R: Rng + ?Sized>(request: &NoiseRequest, rng: &mut R) -> NoiseResult<NoiseImage> {
    let grid = request.validate()?;
    let kind = request.kind;
    let options = request.options;
    tracing::debug!(
        kind = %kind.tag(),
        height = grid.height(),
        width = grid.width(),
        pseudo = options.mode.is_pseudo(),
        "generating noise"
    );

    let filter = kind.filter();
    let (realized, mode, max_imaginary) = if kind.is_spectral() {
        let mut spectrum = Spectrum::synthesize(&grid, options.mode, rng)?;
        if let Some(filter) = filter {
            let kernel = filter.kernel(&grid)?;
            spectrum = spectrum.filtered(&kernel)?;
        }
        let realization = realize(&spectrum)?;
        (realization.image, Some(options.mode), realization.max_imaginary)
    } else {
        (binary_samples(&grid, rng)?, None, 0.0)
    };

    let image = options.adaptation.apply(&realized)?;
    let achieved = ImageStatistics::of(&image);
    tracing::debug!(
        kind = %kind.tag(),
        min = achieved.min,
        max = achieved.max,
        rms_contrast = achieved.rms_contrast,
        "noise ready"
    );

    Ok(NoiseImage {
        image,
        metadata: NoiseMetadata {
            kind,
            grid,
            mode,
            filter,
            sigma: filter.and_then(|f| f.effective_sigma()),
            adaptation: options.adaptation,
            achieved,
            max_imaginary,
            seed: request.seed,
        },
    })
}

fn binary_samples<R: Rng + ?Sized>(grid: &SamplingGrid, rng: &mut R) -> NoiseResult<Raster> {
    let data = (0..grid.len())
        .map(|_| if rng.gen_bool(0.5) { 1.0 } else { -1.0 })
        .collect();
    Raster::new(grid.height(), grid.width(), data)
}

/// Flat-spectrum noise.
pub fn white<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let request = NoiseRequest::new(NoiseKind::White, shape, sampling_rate).options(options);
    generate_with(&request, rng)
}

/// Noise confined to a ring around `center_frequency`, `bandwidth` octaves wide.
pub fn narrowband<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    center_frequency: f64,
    bandwidth: f64,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let kind = NoiseKind::Narrowband {
        center_frequency,
        bandwidth,
    };
    generate_with(&NoiseRequest::new(kind, shape, sampling_rate).options(options), rng)
}

/// Amplitude spectrum `∝ 1 / f^exponent`.
pub fn one_over_f<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    exponent: f64,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let kind = NoiseKind::OneOverF { exponent };
    generate_with(&NoiseRequest::new(kind, shape, sampling_rate).options(options), rng)
}

pub fn pink<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let request = NoiseRequest::new(NoiseKind::Pink, shape, sampling_rate).options(options);
    generate_with(&request, rng)
}

pub fn brown<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let request = NoiseRequest::new(NoiseKind::Brown, shape, sampling_rate).options(options);
    generate_with(&request, rng)
}

/// Noise passed through an oriented Gaussian at `orientation` degrees.
pub fn oriented<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    orientation: f64,
    sigma: f64,
    options: NoiseOptions,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let kind = NoiseKind::Oriented { orientation, sigma };
    generate_with(&NoiseRequest::new(kind, shape, sampling_rate).options(options), rng)
}

/// Independent two-valued pixels rescaled by `adaptation`.
pub fn binary<R: Rng + ?Sized>(
    shape: (usize, usize),
    sampling_rate: impl Into<SamplingRate>,
    adaptation: Adaptation,
    rng: &mut R,
) -> NoiseResult<NoiseImage> {
    let request =
        NoiseRequest::new(NoiseKind::Binary, shape, sampling_rate).adaptation(adaptation);
    generate_with(&request, rng)
}
