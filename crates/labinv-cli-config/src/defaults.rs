// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Default configuration file generation.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::ConfigError;

/// Written to `~/.config/labinv/config.toml` when no user config exists.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"#
# labinv configuration
# Location: ~/.config/labinv/config.toml
#
# Every value below is the built-in default. Environment variables
# (LABINV_SERVER_URL, LABINV_DATABASE, ...) and command-line flags override
# this file.
#

# =============================================================================
# Inventory server
# =============================================================================

[server]
# Directory that hosts the inventory backend.
base_url = "http://localhost/"

# Action script, joined onto base_url.
endpoint = "api.php"

# Whole-request timeout (in seconds). A request that times out counts as
# offline and the change is queued.
request_timeout_secs = 15

# =============================================================================
# Offline storage
# =============================================================================

[storage]
# SQLite file holding the mirror, the pending queue, drafts and the session.
# Defaults to ~/.local/share/labinv/offline.db
# database_path = "/path/to/offline.db"

# =============================================================================
# Synchronization
# =============================================================================

[sync]
# How often `labinv watch` checks whether the server is reachable.
probe_interval_secs = 15

# Replay queued changes before each command when the server is reachable.
drain_on_start = true

# =============================================================================
# Logging
# =============================================================================

[logging]
# Log level: error, warn, info, debug, trace
level = "warn"

# Log format: compact, pretty, json
format = "compact"

# =============================================================================
# Retry (reads only, writes are never retried)
# =============================================================================

[retry]
max_attempts = 2
base_delay_ms = 250
max_delay_ms = 5000
backoff_factor = 2.0
jitter = true
"#;

/// Ensure the config directory exists and create a default config file if none exists.
///
/// Returns `true` if a new config file was created, `false` if one already existed.
pub fn ensure_default_config(config_file_path: &Path) -> Result<bool, ConfigError> {
	if config_file_path.exists() {
		debug!(path = %config_file_path.display(), "config file already exists");
		return Ok(false);
	}

	if let Some(parent) = config_file_path.parent() {
		if !parent.exists() {
			debug!(path = %parent.display(), "creating config directory");
			fs::create_dir_all(parent)?;
		}
	}

	info!(path = %config_file_path.display(), "creating default config file");
	fs::write(config_file_path, DEFAULT_CONFIG_TEMPLATE)?;

	Ok(true)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::layer::ConfigLayer;
	use crate::paths::PathsConfig;
	use crate::runtime::{LabinvConfig, RetryConfig, SyncConfig};
	use tempfile::tempdir;

	#[test]
	fn test_template_matches_built_in_defaults() {
		let layer: ConfigLayer = toml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
		let from_template = LabinvConfig::from_layer(layer, PathsConfig::default()).unwrap();
		let built_in =
			LabinvConfig::from_layer(ConfigLayer::default(), PathsConfig::default()).unwrap();

		assert_eq!(from_template.server.base_url, built_in.server.base_url);
		assert_eq!(from_template.server.endpoint, built_in.server.endpoint);
		assert_eq!(
			from_template.server.request_timeout,
			built_in.server.request_timeout
		);
		assert_eq!(
			from_template.sync.probe_interval,
			SyncConfig::default().probe_interval
		);
		assert_eq!(from_template.logging.level, built_in.logging.level);
		assert_eq!(from_template.logging.format, built_in.logging.format);
		assert_eq!(
			from_template.retry.max_delay,
			RetryConfig::default().max_delay
		);
	}

	#[test]
	fn test_ensure_default_config_creates_file() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("labinv/config.toml");

		let created = ensure_default_config(&config_path).unwrap();
		assert!(created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert!(contents.contains("[server]"));
		assert!(contents.contains("drain_on_start"));
	}

	#[test]
	fn test_ensure_default_config_does_not_overwrite() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("config.toml");

		fs::write(&config_path, "# existing config\n").unwrap();

		let created = ensure_default_config(&config_path).unwrap();
		assert!(!created);

		let contents = fs::read_to_string(&config_path).unwrap();
		assert_eq!(contents, "# existing config\n");
	}

	#[test]
	fn test_ensure_default_config_creates_parent_dirs() {
		let dir = tempdir().unwrap();
		let config_path = dir.path().join("nested/deep/config.toml");

		assert!(ensure_default_config(&config_path).unwrap());
		assert!(config_path.exists());
	}
}
