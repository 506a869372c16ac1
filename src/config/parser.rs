use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Values supplied on the command line
///
/// Anything set here wins over the TOML file, which in turn wins over the
/// built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub start_url: Option<String>,
    pub max_depth: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub output_path: Option<String>,
}

impl Config {
    /// Applies command-line overrides on top of this configuration
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(url) = overrides.start_url {
            self.crawler.start_url = url;
        }
        if let Some(depth) = overrides.max_depth {
            self.crawler.max_depth = depth;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.crawler.timeout_secs = timeout;
        }
        if let Some(path) = overrides.output_path {
            self.output.path = path;
        }
    }
}

/// Parses a configuration file without validating it
///
/// Validation is deferred so that command-line overrides (most notably the
/// start URL) can be applied first.
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use pdf_scraper::config::load_config;
///
/// let config = load_config(Path::new("scraper.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config = parse_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two runs can be compared.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Builds the effective configuration for a run
///
/// Reads the optional TOML file, applies the overrides, then validates the
/// merged result. Returns the hash of the file when one was read.
pub fn resolve_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<(Config, Option<String>), ConfigError> {
    let (mut config, hash) = match path {
        Some(path) => (parse_config(path)?, Some(compute_config_hash(path)?)),
        None => (Config::default(), None),
    };

    config.apply_overrides(overrides);
    validate(&config)?;

    Ok((config, hash))
}
