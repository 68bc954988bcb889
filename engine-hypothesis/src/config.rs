//! Configuration loading for engine-hypothesis.
//!
//! Settings come from an optional TOML file. Every key has a default, so a
//! missing file or a partial file is fine.

use anyhow::{Context, Result};
use engine_hypothesis_core::{RequestFormat, RequestStyle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::tester::TesterConfig;

/// Top-level configuration for engine-hypothesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for the hypothesis test itself.
    pub hypothesis: HypothesisConfig,
    /// Batch size and budgets.
    pub sampling: SamplingConfig,
    /// How engines are driven.
    pub engine: EngineConfig,
}

/// Configuration for the hypothesis test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Two-sided confidence level (e.g., 0.95 for 95% confidence).
    pub confidence_level: f64,
    /// Stop as soon as the interval excludes zero.
    pub stop_on_significance: bool,
}

/// Configuration for sample collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Games requested from each engine per round.
    pub batch_size: usize,
    /// Maximum number of rounds.
    pub max_rounds: Option<usize>,
    /// Maximum number of games per engine.
    pub max_samples: Option<usize>,
}

/// Configuration for the engine processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub request_style: RequestStyle,
    /// Arguments appended to `flags` style requests.
    pub extra_args: Vec<String>,
    pub ms_per_move: u32,
    pub threads: u32,
    /// Timeout in milliseconds for a whole batch.
    pub batch_timeout_ms: Option<u64>,
    /// Forward engine stderr instead of discarding it.
    pub show_stderr: bool,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            stop_on_significance: true,
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_rounds: None,
            max_samples: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_style: RequestStyle::Flags,
            extra_args: Vec::new(),
            ms_per_move: 100,
            threads: 1,
            batch_timeout_ms: None,
            show_stderr: false,
        }
    }
}

impl EngineConfig {
    /// Request line format handed to each engine.
    pub fn request_format(&self) -> RequestFormat {
        RequestFormat {
            style: self.request_style,
            extra_args: self.extra_args.clone(),
            ms_per_move: self.ms_per_move,
            threads: self.threads,
        }
    }

    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_ms.map(Duration::from_millis)
    }
}

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".engine-hypothesis.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `.engine-hypothesis.toml` from the current directory, or use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from an explicit path, falling back to the default location.
    ///
    /// An explicitly given file must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    /// Parameters for the sequential tester.
    pub fn tester_config(&self) -> TesterConfig {
        TesterConfig {
            batch_size: self.sampling.batch_size,
            confidence_level: self.hypothesis.confidence_level,
            stop_on_significance: self.hypothesis.stop_on_significance,
            max_rounds: self.sampling.max_rounds,
            max_samples: self.sampling.max_samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.hypothesis.confidence_level, 0.95);
        assert!(config.hypothesis.stop_on_significance);
        assert_eq!(config.sampling.batch_size, 50);
        assert_eq!(config.sampling.max_rounds, None);
        assert_eq!(config.sampling.max_samples, None);
        assert_eq!(config.engine.request_style, RequestStyle::Flags);
        assert!(config.engine.extra_args.is_empty());
        assert_eq!(config.engine.ms_per_move, 100);
        assert_eq!(config.engine.threads, 1);
        assert_eq!(config.engine.batch_timeout(), None);
        assert!(!config.engine.show_stderr);
    }

    #[test]
    fn test_default_tester_config_matches() {
        assert_eq!(Config::default().tester_config(), TesterConfig::default());
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[hypothesis]
confidence_level = 0.99

[sampling]
max_rounds = 20
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        // Overridden values
        assert_eq!(config.hypothesis.confidence_level, 0.99);
        assert_eq!(config.sampling.max_rounds, Some(20));

        // Default values
        assert!(config.hypothesis.stop_on_significance);
        assert_eq!(config.sampling.batch_size, 50);
        assert_eq!(config.engine.ms_per_move, 100);
    }

    #[test]
    fn test_load_full_config() {
        let toml_content = r#"
[hypothesis]
confidence_level = 0.9
stop_on_significance = false

[sampling]
batch_size = 25
max_rounds = 40
max_samples = 1000

[engine]
request_style = "positional"
extra_args = ["-d", "3"]
ms_per_move = 250
threads = 4
batch_timeout_ms = 60000
show_stderr = true
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.hypothesis.confidence_level, 0.9);
        assert!(!config.hypothesis.stop_on_significance);
        assert_eq!(config.sampling.batch_size, 25);
        assert_eq!(config.sampling.max_rounds, Some(40));
        assert_eq!(config.sampling.max_samples, Some(1000));
        assert_eq!(config.engine.request_style, RequestStyle::Positional);
        assert_eq!(config.engine.extra_args, vec!["-d", "3"]);
        assert_eq!(config.engine.ms_per_move, 250);
        assert_eq!(config.engine.threads, 4);
        assert_eq!(
            config.engine.batch_timeout(),
            Some(Duration::from_secs(60))
        );
        assert!(config.engine.show_stderr);

        let format = config.engine.request_format();
        assert_eq!(format.render(10), "10 250 4");

        let tester = config.tester_config();
        assert_eq!(tester.batch_size, 25);
        assert_eq!(tester.max_samples, Some(1000));
        assert!(!tester.stop_on_significance);
    }

    #[test]
    fn test_load_unknown_request_style() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[engine]\nrequest_style = \"telepathy\"\n")
            .unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_explicit_missing_file() {
        let result = Config::load_from(Some(Path::new("/nonexistent/path/config.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not valid toml {{{{").unwrap();

        let result = Config::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = Config::default();
        config.sampling.max_rounds = Some(7);
        config.engine.request_style = RequestStyle::Positional;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.tester_config(), config.tester_config());
        assert_eq!(parsed.engine.request_format(), config.engine.request_format());
    }
}
