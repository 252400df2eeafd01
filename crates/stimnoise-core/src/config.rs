//! # Configuration
//!
//! YAML configuration for applications built on the engine: logging,
//! engine-wide defaults, and named noise presets that resolve into
//! [`NoiseRequest`]s.
//!
//! ## Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path in the `STIMNOISE_CONFIG` environment variable
//! 2. `./stimnoise.yaml`
//! 3. The user config directory (`~/.config/stimnoise/config.yaml` on Linux)
//! 4. `/etc/stimnoise/config.yaml`
//!
//! ## Example
//!
//! ```yaml
//! logging:
//!   level: debug
//!   format: json
//!
//! defaults:
//!   pseudo_noise: true
//!   intensity_range: [0.0, 1.0]
//!
//! presets:
//!   mask:
//!     kind: narrowband
//!     shape: [256, 256]
//!     sampling_rate: 64.0
//!     center_frequency: 4.0
//!     bandwidth: 1.0
//!     seed: 42
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::adapt::Adaptation;
use crate::grid::SamplingRate;
use crate::noise::{KindParams, NoiseKind, NoiseOptions, NoiseRequest};
use crate::observe::LogConfig;
use crate::spectrum::{SynthesisMode, DEFAULT_AMPLITUDE};
use crate::types::NoiseError;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "STIMNOISE_CONFIG";

/// Errors from loading or resolving a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Validation(#[from] NoiseError),
}

/// Defaults applied to presets that leave a field out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDefaults {
    /// Spectrum amplitude for exact-magnitude synthesis
    pub amplitude: f64,
    pub pseudo_noise: bool,
    pub intensity_range: (f64, f64),
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            amplitude: DEFAULT_AMPLITUDE,
            pseudo_noise: false,
            intensity_range: (0.0, 1.0),
        }
    }
}

/// A noise preset as written in the configuration file.
///
/// `kind` is a string tag; which of the optional parameters are needed
/// depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub kind: String,
    pub shape: Option<(usize, usize)>,
    pub sampling_rate: Option<SamplingRate>,
    #[serde(flatten)]
    pub params: KindParams,
    pub pseudo_noise: Option<bool>,
    pub seed: Option<u64>,
    pub intensity_range: Option<(f64, f64)>,
    pub rms_contrast: Option<f64>,
    pub mean_luminance: Option<f64>,
}

impl RequestConfig {
    /// Resolve into a typed request, filling gaps from `defaults`.
    pub fn resolve(&self, defaults: &EngineDefaults) -> Result<NoiseRequest, NoiseError> {
        let kind = NoiseKind::from_parts(&self.kind, &self.params)?;
        let shape = self
            .shape
            .ok_or_else(|| NoiseError::config("shape", format!("required by preset kind '{}'", self.kind)))?;
        let sampling_rate = self.sampling_rate.ok_or_else(|| {
            NoiseError::config(
                "sampling_rate",
                format!("required by preset kind '{}'", self.kind),
            )
        })?;

        let mode = if self.pseudo_noise.unwrap_or(defaults.pseudo_noise) {
            SynthesisMode::Pseudo {
                amplitude: defaults.amplitude,
            }
        } else {
            SynthesisMode::free()
        };
        let adaptation = match (self.rms_contrast, self.intensity_range) {
            (Some(_), Some(_)) => {
                return Err(NoiseError::config(
                    "rms_contrast",
                    "cannot be combined with intensity_range",
                ))
            }
            (Some(contrast), None) => Adaptation::RmsContrast {
                contrast,
                mean_luminance: self.mean_luminance,
            },
            (None, range) => {
                let (lo, hi) = range.unwrap_or(defaults.intensity_range);
                Adaptation::IntensityRange { lo, hi }
            }
        };

        let request = NoiseRequest {
            kind,
            shape,
            sampling_rate,
            options: NoiseOptions { mode, adaptation },
            seed: self.seed,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimNoiseConfig {
    pub version: String,
    pub logging: LogConfig,
    pub defaults: EngineDefaults,
    /// Named presets (name -> request)
    pub presets: HashMap<String, RequestConfig>,
}

impl Default for StimNoiseConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            logging: LogConfig::default(),
            defaults: EngineDefaults::default(),
            presets: HashMap::new(),
        }
    }
}

impl StimNoiseConfig {
    /// Load from the search path; defaults when no file exists.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::load_from(&path);
            }
            tracing::warn!(path = %path.display(), "{CONFIG_ENV} points to a missing file");
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), presets = config.presets.len(), "loaded config");
        Ok(config)
    }

    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./stimnoise.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "stimnoise") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/stimnoise/config.yaml"));
        paths
    }

    /// Check the defaults and resolve every preset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.defaults;
        if !(defaults.amplitude.is_finite() && defaults.amplitude > 0.0) {
            return Err(NoiseError::config(
                "amplitude",
                format!("must be positive and finite (got {})", defaults.amplitude),
            )
            .into());
        }
        let (lo, hi) = defaults.intensity_range;
        Adaptation::IntensityRange { lo, hi }.validate()?;

        for name in self.presets.keys() {
            self.request(name)?;
        }
        Ok(())
    }

    /// Resolve the preset called `name`.
    pub fn request(&self, name: &str) -> Result<NoiseRequest, ConfigError> {
        let preset = self
            .presets
            .get(name)
            .ok_or_else(|| ConfigError::NotFound(format!("preset '{name}'")))?;
        Ok(preset.resolve(&self.defaults)?)
    }

    pub fn example_yaml() -> String {
        let mut presets = HashMap::new();
        presets.insert(
            "mask".to_string(),
            RequestConfig {
                kind: "narrowband".to_string(),
                shape: Some((256, 256)),
                sampling_rate: Some(SamplingRate::Isotropic(64.0)),
                params: KindParams {
                    center_frequency: Some(4.0),
                    bandwidth: Some(1.0),
                    ..Default::default()
                },
                seed: Some(42),
                ..Default::default()
            },
        );
        presets.insert(
            "background".to_string(),
            RequestConfig {
                kind: "pink".to_string(),
                shape: Some((512, 512)),
                sampling_rate: Some(SamplingRate::Isotropic(32.0)),
                pseudo_noise: Some(true),
                rms_contrast: Some(0.2),
                mean_luminance: Some(0.5),
                ..Default::default()
            },
        );
        let config = Self {
            presets,
            ..Default::default()
        };
        serde_yaml::to_string(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StimNoiseConfig::default();
        assert_eq!(config.defaults.amplitude, 1.0);
        assert!(!config.defaults.pseudo_noise);
        assert!(config.presets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_presets() {
        let yaml = r#"
defaults:
  pseudo_noise: true
presets:
  mask:
    kind: narrowband
    shape: [64, 64]
    sampling_rate: 60.0
    center_frequency: 5.0
    bandwidth: 1.0
    seed: 7
  brown:
    kind: brown
    shape: [32, 32]
    sampling_rate: 32
    rms_contrast: 0.2
"#;
        let config = StimNoiseConfig::parse(yaml).unwrap();
        let mask = config.request("mask").unwrap();
        assert_eq!(
            mask.kind,
            NoiseKind::Narrowband {
                center_frequency: 5.0,
                bandwidth: 1.0
            }
        );
        assert_eq!(mask.seed, Some(7));
        assert!(mask.options.mode.is_pseudo());
        assert_eq!(mask.options.adaptation, Adaptation::IntensityRange { lo: 0.0, hi: 1.0 });

        let brown = config.request("brown").unwrap();
        assert_eq!(
            brown.options.adaptation,
            Adaptation::RmsContrast {
                contrast: 0.2,
                mean_luminance: None
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_kind_and_missing_parameter() {
        let yaml = r#"
presets:
  violet:
    kind: violet
    shape: [8, 8]
    sampling_rate: 8.0
  tilted:
    kind: oriented
    shape: [8, 8]
    sampling_rate: 8.0
    orientation: 45.0
"#;
        let config = StimNoiseConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.request("violet"),
            Err(ConfigError::Validation(NoiseError::UnsupportedMode(_)))
        ));
        assert!(matches!(
            config.request("tilted"),
            Err(ConfigError::Validation(NoiseError::Configuration {
                parameter: "sigma",
                ..
            }))
        ));
        assert!(matches!(config.request("absent"), Err(ConfigError::NotFound(_))));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_odd_shape_preset_fails_validation() {
        let yaml = r#"
presets:
  odd:
    kind: white
    shape: [31, 32]
    sampling_rate: 32.0
"#;
        let config = StimNoiseConfig::parse(yaml).unwrap();
        let err = config.request("odd").unwrap_err();
        assert!(err.to_string().contains("even-numbered"));
    }

    #[test]
    fn test_conflicting_adaptations() {
        let preset = RequestConfig {
            kind: "white".to_string(),
            shape: Some((8, 8)),
            sampling_rate: Some(SamplingRate::Isotropic(8.0)),
            intensity_range: Some((0.0, 1.0)),
            rms_contrast: Some(0.1),
            ..Default::default()
        };
        assert!(preset.resolve(&EngineDefaults::default()).is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            StimNoiseConfig::parse("presets: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_example_yaml_roundtrip() {
        let yaml = StimNoiseConfig::example_yaml();
        assert!(yaml.contains("presets:"));
        let config = StimNoiseConfig::parse(&yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.request("background").unwrap().kind, NoiseKind::Pink);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("stimnoise-test-{}.yaml", std::process::id()));
        let config = StimNoiseConfig::parse(&StimNoiseConfig::example_yaml()).unwrap();
        config.save(&path).unwrap();
        let loaded = StimNoiseConfig::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = StimNoiseConfig::load_from(Path::new("/nonexistent/stimnoise.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_save_to_missing_directory() {
        let path = Path::new("/nonexistent/stimnoise/config.yaml");
        let err = StimNoiseConfig::default().save(path).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
        assert!(err.to_string().starts_with("failed to write"));
    }

    #[test]
    fn test_config_search_paths() {
        let paths = StimNoiseConfig::config_search_paths();
        assert!(paths[0].ends_with("stimnoise.yaml"));
        assert!(paths.last().unwrap().starts_with("/etc/stimnoise"));
    }
}
