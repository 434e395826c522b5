//! Configuration management for duet-mixer
//!
//! Bootstrap configuration is a TOML file with four sections:
//!
//! ```toml
//! output_folder = "/srv/duet/outputs"
//!
//! [mix]
//! target_sample_rate = 22050
//! fade_ms = 10.0
//! crossfade_ms = 20.0
//! normalize_ceiling = 0.98
//! fade_curve = "linear"
//! sample_format = "pcm16"
//! resampler = "linear"
//! synthesis_concurrency = 4
//!
//! [mix.policy]
//! duration = "fixed"
//! placement = "crossfade"
//!
//! [azure]
//! region = "eastus"
//!
//! [deepgram]
//! model = "nova-2"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables (credentials: `AZURE_SPEECH_KEY`,
//!    `AZURE_SPEECH_REGION`, `DEEPGRAM_API_KEY`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Credentials are only ever handed to the provider clients; the mixing
//! engine sees [`MixConfig`] alone.

use crate::error::{Error, Result};
use crate::timeline::TimelinePolicy;
use duet_common::FadeCurve;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default output sample rate (Hz)
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 22050;

/// Native rate of the synthesis provider's raw PCM output (Hz)
pub const DEFAULT_SYNTHESIS_SAMPLE_RATE: u32 = 24000;

/// Peaks below this are treated as silence by the normalizer
pub const SILENCE_THRESHOLD: f32 = 1e-8;

/// Sample encoding of output WAV files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SampleFormat {
    /// 16-bit signed integer PCM
    #[default]
    Pcm16,
    /// 32-bit IEEE float
    Float32,
}

/// Sample-rate converter used for segment audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResamplerKind {
    /// Linear interpolation
    #[default]
    Linear,
    /// Septic polynomial interpolation (rubato)
    Polynomial,
}

/// Mixing engine parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Output sample rate of every track
    pub target_sample_rate: u32,

    /// Edge fade window (milliseconds)
    pub fade_ms: f64,

    /// Crossfade window at the head of each placement (milliseconds)
    pub crossfade_ms: f64,

    /// Peak ceiling applied by whole-track normalization
    pub normalize_ceiling: f32,

    /// Gain curve for fades and crossfades
    pub fade_curve: FadeCurve,

    /// Duration and placement policy
    pub policy: TimelinePolicy,

    /// WAV sample encoding
    pub sample_format: SampleFormat,

    /// Resampling algorithm
    pub resampler: ResamplerKind,

    /// Maximum synthesis requests in flight
    pub synthesis_concurrency: usize,

    /// Overall deadline for one generate operation (seconds)
    pub deadline_secs: Option<u64>,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
            fade_ms: 10.0,
            crossfade_ms: 20.0,
            normalize_ceiling: 0.98,
            fade_curve: FadeCurve::Linear,
            policy: TimelinePolicy::default(),
            sample_format: SampleFormat::Pcm16,
            resampler: ResamplerKind::Linear,
            synthesis_concurrency: 4,
            deadline_secs: None,
        }
    }
}

impl MixConfig {
    /// Edge fade window in samples at the target rate
    pub fn fade_samples(&self) -> usize {
        ms_to_samples(self.fade_ms, self.target_sample_rate)
    }

    /// Crossfade window in samples at the target rate
    pub fn crossfade_samples(&self) -> usize {
        ms_to_samples(self.crossfade_ms, self.target_sample_rate)
    }

    /// Overall deadline, if configured
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Reject parameter combinations the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.target_sample_rate == 0 {
            return Err(Error::Config("target_sample_rate must be positive".to_string()));
        }
        if !(self.fade_ms >= 0.0 && self.fade_ms.is_finite()) {
            return Err(Error::Config(format!("fade_ms must be >= 0, got {}", self.fade_ms)));
        }
        if !(self.crossfade_ms >= 0.0 && self.crossfade_ms.is_finite()) {
            return Err(Error::Config(format!(
                "crossfade_ms must be >= 0, got {}",
                self.crossfade_ms
            )));
        }
        if !(self.normalize_ceiling > 0.0 && self.normalize_ceiling <= 1.0) {
            return Err(Error::Config(format!(
                "normalize_ceiling must be in (0, 1], got {}",
                self.normalize_ceiling
            )));
        }
        if self.synthesis_concurrency == 0 {
            return Err(Error::Config("synthesis_concurrency must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Azure text-to-speech settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Subscription key (prefer `AZURE_SPEECH_KEY`)
    pub key: Option<String>,

    /// Service region, e.g. `eastus`
    pub region: Option<String>,

    /// Override of the regional endpoint URL
    pub endpoint: Option<String>,

    /// Native rate of the requested raw PCM format
    pub native_sample_rate: u32,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            key: None,
            region: None,
            endpoint: None,
            native_sample_rate: DEFAULT_SYNTHESIS_SAMPLE_RATE,
            timeout_secs: 60,
        }
    }
}

/// Deepgram transcription settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeepgramConfig {
    /// API key (prefer `DEEPGRAM_API_KEY`)
    pub api_key: Option<String>,

    /// Recognition model
    pub model: String,

    /// Override of the API base URL
    pub endpoint: Option<String>,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "nova-2".to_string(),
            endpoint: None,
            timeout_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder receiving generated artifacts
    pub output_folder: Option<PathBuf>,

    pub mix: MixConfig,
    pub azure: AzureConfig,
    pub deepgram: DeepgramConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Load from an explicit path or the platform default location
    pub fn load(explicit: Option<&std::path::Path>) -> Result<Self> {
        let config: TomlConfig = duet_common::config::load_toml(explicit)?;
        config.mix.validate()?;
        Ok(config)
    }
}

fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (sample_rate as f64 * ms / 1000.0).floor().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{DurationPolicy, PlacementPolicy};

    #[test]
    fn test_default_windows() {
        let config = MixConfig::default();
        assert_eq!(config.fade_samples(), 220);
        assert_eq!(config.crossfade_samples(), 441);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
            output_folder = "/tmp/duet"

            [mix]
            target_sample_rate = 24000
            crossfade_ms = 0.0
            fade_curve = "s_curve"
            sample_format = "float32"
            resampler = "polynomial"

            [mix.policy]
            duration = "natural"
            placement = "additive"

            [azure]
            region = "westeurope"

            [logging]
            level = "debug"
        "#;
        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output_folder, Some(PathBuf::from("/tmp/duet")));
        assert_eq!(config.mix.target_sample_rate, 24000);
        assert_eq!(config.mix.crossfade_samples(), 0);
        assert_eq!(config.mix.fade_ms, 10.0);
        assert_eq!(config.mix.fade_curve, FadeCurve::SCurve);
        assert_eq!(config.mix.sample_format, SampleFormat::Float32);
        assert_eq!(config.mix.resampler, ResamplerKind::Polynomial);
        assert_eq!(config.mix.policy.duration, DurationPolicy::Natural);
        assert_eq!(config.mix.policy.placement, PlacementPolicy::Additive);
        assert_eq!(config.azure.region.as_deref(), Some("westeurope"));
        assert_eq!(config.azure.native_sample_rate, 24000);
        assert_eq!(config.deepgram.model, "nova-2");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_ceiling() {
        let config = MixConfig {
            normalize_ceiling: 1.5,
            ..MixConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_rate() {
        let config = MixConfig {
            target_sample_rate: 0,
            ..MixConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_window() {
        let config = MixConfig {
            fade_ms: -1.0,
            ..MixConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
