//! Configuration module for the dispatch client.
//!
//! This module provides structures and utilities for managing client
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required configuration values are
//! properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the dispatch client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration for the backend HTTP API.
	pub api: ApiConfig,
	/// Configuration for the storage backend holding the token cache.
	#[serde(default)]
	pub storage: StorageConfig,
	/// Configuration for display formatting.
	#[serde(default)]
	pub display: DisplayConfig,
}

/// Configuration for the backend HTTP API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Base URL of the backend (e.g. `https://10.0.2.2:7061`).
	pub base_url: String,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Accept TLS certificates that fail verification.
	///
	/// The backend's development deployment serves a self-signed
	/// certificate; this flag is the explicit opt-in for talking to it.
	#[serde(default)]
	pub accept_invalid_certs: bool,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl Default for StorageConfig {
	fn default() -> Self {
		let mut implementations = HashMap::new();
		implementations.insert("file".to_string(), toml::Value::Table(toml::map::Map::new()));

		Self {
			primary: "file".to_string(),
			implementations,
		}
	}
}

/// Configuration for display formatting.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
	/// Fixed UTC offset, in hours, used when rendering timestamps.
	#[serde(default = "default_utc_offset_hours")]
	pub utc_offset_hours: i8,
}

impl Default for DisplayConfig {
	fn default() -> Self {
		Self {
			utc_offset_hours: default_utc_offset_hours(),
		}
	}
}

/// Returns the default API timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

/// Returns the default display UTC offset in hours.
///
/// The deployment this client was written for renders times in Indochina
/// Time (UTC+7).
fn default_utc_offset_hours() -> i8 {
	7
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			}
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	///
	/// This method supports modular configuration through include directives:
	/// - `include = ["file1.toml", "file2.toml"]` - Include specific files
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate API config
		if self.api.base_url.is_empty() {
			return Err(ConfigError::Validation("API base URL cannot be empty".into()));
		}
		if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
			return Err(ConfigError::Validation(format!(
				"API base URL must be http(s): {}",
				self.api.base_url
			)));
		}
		if self.api.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"API timeout must be greater than zero".into(),
			));
		}

		// Validate storage config
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Storage primary '{}' has no implementation section",
				self.storage.primary
			)));
		}

		// Validate display config
		if !(-12..=14).contains(&self.display.utc_offset_hours) {
			return Err(ConfigError::Validation(format!(
				"Display UTC offset out of range: {}",
				self.display.utc_offset_hours
			)));
		}

		Ok(())
	}

	/// Returns the raw TOML configuration for the primary storage backend.
	pub fn primary_storage_config(&self) -> toml::Value {
		self.storage
			.implementations
			.get(&self.storage.primary)
			.cloned()
			.unwrap_or(toml::Value::Table(toml::map::Map::new()))
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is automatically
/// validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
