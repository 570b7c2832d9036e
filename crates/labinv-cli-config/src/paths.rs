// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

/// Resolved paths for labinv.
#[derive(Debug, Clone)]
pub struct PathsConfig {
	/// User config file: ~/.config/labinv/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/labinv/config.toml
	pub system_config_file: PathBuf,
	/// Data directory: ~/.local/share/labinv/
	pub data_dir: PathBuf,
}

impl PathsConfig {
	/// Where the offline database lives unless configured otherwise.
	pub fn default_database_path(&self) -> PathBuf {
		self.data_dir.join("offline.db")
	}
}

impl Default for PathsConfig {
	fn default() -> Self {
		Self {
			user_config_file: PathBuf::from("~/.config/labinv/config.toml"),
			system_config_file: PathBuf::from("/etc/labinv/config.toml"),
			data_dir: PathBuf::from("~/.local/share/labinv"),
		}
	}
}

/// Resolve paths from `XDG_CONFIG_HOME` and `XDG_DATA_HOME`, falling back to
/// `~/.config` and `~/.local/share`.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;

	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".config"));

	let data_home = std::env::var_os("XDG_DATA_HOME")
		.map(PathBuf::from)
		.unwrap_or_else(|| home.join(".local/share"));

	tracing::debug!(
		config_home = %config_home.display(),
		data_home = %data_home.display(),
		"resolved XDG paths"
	);

	Ok(PathsConfig {
		user_config_file: config_home.join("labinv/config.toml"),
		system_config_file: PathBuf::from("/etc/labinv/config.toml"),
		data_dir: data_home.join("labinv"),
	})
}
