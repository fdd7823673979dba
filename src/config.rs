//! Configuration loading for the acquisition daemon.
//!
//! Configuration is loaded from two layered sources:
//! 1. `luxd.toml` (or the file passed with `--config`)
//! 2. Environment variables prefixed with `LUXD_` (nested keys separated by
//!    `__`, e.g. `LUXD_DUMP__PATH=/var/tmp/light`)
//!
//! Every field has a default, so an empty (or absent) file yields the same
//! pipeline the original deployment ran: 10 ms sampling period, 1000-sample
//! buffer, dump file under `/tmp`, consumer renamed and dropped to uid 33.

use crate::error::{AcqError, AppResult};
use crate::hardware::spi::SpiClock;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application-level settings (logging)
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Sampling loop settings
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    /// Ring buffer settings
    #[serde(default)]
    pub buffer: BufferConfig,
    /// Dump file settings
    #[serde(default)]
    pub dump: DumpConfig,
    /// Consumer identity settings
    #[serde(default)]
    pub consumer: ConsumerConfig,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Logging filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Sampling loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Sampling period in milliseconds, measured from loop start.
    #[serde(default = "default_sample_period_ms")]
    pub sample_period_ms: u64,
    /// SPI clock used for each ADC exchange.
    #[serde(default = "default_spi_clock")]
    pub spi_clock: SpiClock,
    /// Depth of the bounded producer-to-consumer channel.
    #[serde(default = "default_channel_depth")]
    pub channel_depth: usize,
}

/// Ring buffer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Number of most-recent samples retained.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Dump file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Path of the dump file, fully rewritten on every dump.
    #[serde(default = "default_dump_path")]
    pub path: PathBuf,
}

/// Consumer identity configuration.
///
/// The consumer drops to an unprivileged uid and renames itself so the
/// controller that delivers `SIGUSR1` can both find it and signal it. Either
/// step can be disabled (set to none) for mock runs without root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Unprivileged uid to drop to after the hardware is mapped.
    #[serde(default = "default_uid")]
    pub uid: Option<u32>,
    /// Externally queryable short process name (15 bytes max on Linux).
    #[serde(default = "default_process_name")]
    pub process_name: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sample_period_ms() -> u64 {
    10
}

fn default_spi_clock() -> SpiClock {
    SpiClock::Khz976
}

fn default_channel_depth() -> usize {
    64
}

fn default_capacity() -> usize {
    1000
}

fn default_dump_path() -> PathBuf {
    PathBuf::from("/tmp/luxd_buffer")
}

fn default_uid() -> Option<u32> {
    // www-data, same identity the CGI controller runs under
    Some(33)
}

fn default_process_name() -> Option<String> {
    Some("luxd-buffer".to_string())
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: default_sample_period_ms(),
            spi_clock: default_spi_clock(),
            channel_depth: default_channel_depth(),
        }
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            path: default_dump_path(),
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            uid: default_uid(),
            process_name: default_process_name(),
        }
    }
}

impl Config {
    /// Load configuration from the given TOML file (default `luxd.toml`)
    /// layered under `LUXD_` environment variables.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = path.unwrap_or_else(|| Path::new("luxd.toml"));
        let config: Config = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LUXD_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation of values that parse but make no sense.
    pub fn validate(&self) -> AppResult<()> {
        if self.buffer.capacity == 0 {
            return Err(AcqError::Configuration(
                "buffer.capacity must be at least 1".to_string(),
            ));
        }
        if self.acquisition.channel_depth == 0 {
            return Err(AcqError::Configuration(
                "acquisition.channel_depth must be at least 1".to_string(),
            ));
        }
        if let Some(name) = &self.consumer.process_name {
            // TASK_COMM_LEN on Linux is 16 including the NUL
            if name.is_empty() || name.len() > 15 {
                return Err(AcqError::Configuration(format!(
                    "consumer.process_name {name:?} must be 1..=15 bytes"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_original_deployment() {
        let config = Config::default();
        assert_eq!(config.acquisition.sample_period_ms, 10);
        assert_eq!(config.acquisition.spi_clock, SpiClock::Khz976);
        assert_eq!(config.buffer.capacity, 1000);
        assert_eq!(config.dump.path, PathBuf::from("/tmp/luxd_buffer"));
        assert_eq!(config.consumer.uid, Some(33));
        assert_eq!(config.consumer.process_name.as_deref(), Some("luxd-buffer"));
        config.validate().expect("defaults must validate");
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("luxd.toml");
        let mut file = std::fs::File::create(&path).expect("create config");
        writeln!(
            file,
            "[buffer]\ncapacity = 16\n\n[acquisition]\nsample_period_ms = 1\nspi_clock = \"khz244\"\n\n[consumer]\n"
        )
        .expect("write config");

        let config = Config::load(Some(&path)).expect("load config");
        assert_eq!(config.buffer.capacity, 16);
        assert_eq!(config.acquisition.sample_period_ms, 1);
        assert_eq!(config.acquisition.spi_clock, SpiClock::Khz244);
        // untouched sections keep their defaults
        assert_eq!(config.consumer.uid, Some(33));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = Config::default();
        config.buffer.capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(AcqError::Configuration(_))
        ));
    }

    #[test]
    fn overlong_process_name_is_rejected() {
        let mut config = Config::default();
        config.consumer.process_name = Some("a-name-longer-than-fifteen".to_string());
        assert!(config.validate().is_err());
    }
}
