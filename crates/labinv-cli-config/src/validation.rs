// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration validation rules.

use tracing::warn;

use crate::runtime::{parse_base_url, LabinvConfig};
use crate::ConfigError;

/// Validate the configuration.
pub fn validate_config(config: &LabinvConfig) -> Result<(), ConfigError> {
	validate_server(config)?;
	validate_sync(config)?;
	validate_retry(config)?;

	Ok(())
}

fn validate_server(config: &LabinvConfig) -> Result<(), ConfigError> {
	let server = &config.server;

	let base = parse_base_url(&server.base_url)?;
	match base.scheme() {
		"http" | "https" => {}
		other => {
			return Err(ConfigError::invalid_value(
				"server.base_url",
				format!("unsupported scheme '{other}'"),
			));
		}
	}

	if base.scheme() == "http" && base.host_str().is_some_and(|h| h != "localhost" && h != "127.0.0.1") {
		warn!(
			base_url = %server.base_url,
			"server uses plain http; the session cookie travels unencrypted"
		);
	}

	if server.endpoint.trim().is_empty() {
		return Err(ConfigError::invalid_value(
			"server.endpoint",
			"cannot be empty",
		));
	}

	if server.request_timeout.as_secs() == 0 {
		return Err(ConfigError::invalid_value(
			"server.request_timeout_secs",
			"must be greater than 0",
		));
	}

	config.endpoint_url()?;

	Ok(())
}

fn validate_sync(config: &LabinvConfig) -> Result<(), ConfigError> {
	if config.sync.probe_interval.as_secs() == 0 {
		return Err(ConfigError::invalid_value(
			"sync.probe_interval_secs",
			"must be greater than 0",
		));
	}

	Ok(())
}

fn validate_retry(config: &LabinvConfig) -> Result<(), ConfigError> {
	let retry = &config.retry;

	if retry.max_attempts == 0 {
		return Err(ConfigError::invalid_value(
			"retry.max_attempts",
			"must be at least 1",
		));
	}

	if retry.max_attempts > 10 {
		return Err(ConfigError::invalid_value(
			"retry.max_attempts",
			"must be at most 10",
		));
	}

	if retry.backoff_factor < 1.0 || retry.backoff_factor > 10.0 {
		return Err(ConfigError::invalid_value(
			"retry.backoff_factor",
			"must be between 1.0 and 10.0",
		));
	}

	if retry.base_delay > retry.max_delay {
		return Err(ConfigError::invalid_value(
			"retry.base_delay",
			"cannot be greater than max_delay",
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;
	use std::time::Duration;

	fn minimal_config() -> LabinvConfig {
		LabinvConfig::from_layer(ConfigLayer::default(), PathsConfig::default()).unwrap()
	}

	#[test]
	fn test_minimal_config_is_valid() {
		assert!(validate_config(&minimal_config()).is_ok());
	}

	#[test]
	fn test_non_http_scheme_fails() {
		let mut config = minimal_config();
		config.server.base_url = "ftp://lab.local/".to_string();

		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("server.base_url"));
	}

	#[test]
	fn test_empty_endpoint_fails() {
		let mut config = minimal_config();
		config.server.endpoint = "  ".to_string();

		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("server.endpoint"));
	}

	#[test]
	fn test_zero_probe_interval_fails() {
		let mut config = minimal_config();
		config.sync.probe_interval = Duration::ZERO;

		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("probe_interval"));
	}

	#[test]
	fn test_zero_max_attempts_fails() {
		let mut config = minimal_config();
		config.retry.max_attempts = 0;

		let err = validate_config(&config).unwrap_err();
		assert!(err.to_string().contains("max_attempts"));
	}

	#[test]
	fn test_base_delay_above_max_fails() {
		let mut config = minimal_config();
		config.retry.base_delay = Duration::from_secs(10);
		config.retry.max_delay = Duration::from_secs(1);

		assert!(validate_config(&config).is_err());
	}

	#[test]
	fn test_https_base_url_is_valid() {
		let mut config = minimal_config();
		config.server.base_url = "https://inventario.example.edu/lab".to_string();
		assert!(validate_config(&config).is_ok());
	}
}
