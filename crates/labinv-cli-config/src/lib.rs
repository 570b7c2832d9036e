// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the labinv inventory client.
//!
//! Layers, lowest precedence first: built-in defaults, `/etc/labinv/config.toml`,
//! the user file under `$XDG_CONFIG_HOME/labinv/`, an explicit `--config` file,
//! `LABINV_*` environment variables, then command-line flags.

pub mod defaults;
pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod sources;
pub mod validation;

pub use defaults::{ensure_default_config, DEFAULT_CONFIG_TEMPLATE};
pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::{LabinvConfig, LogFormat, LogLevel};
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Load configuration from every source, applying `cli` last.
///
/// If no user config file exists, a default one is written first.
pub fn load_config_with_cli(cli: CliOverrides) -> Result<LabinvConfig, ConfigError> {
	let paths = paths::resolve_xdg_paths()?;

	defaults::ensure_default_config(&paths.user_config_file)?;

	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::system(&paths)));
	registry.register(Box::new(sources::FileSource::user(&paths)));
	if let Some(path) = &cli.config_file {
		registry.register(Box::new(sources::FileSource::explicit(path.clone())));
	}
	registry.register(Box::new(sources::EnvSource));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load(paths)
}

/// Load configuration without command-line overrides.
pub fn load_config() -> Result<LabinvConfig, ConfigError> {
	load_config_with_cli(CliOverrides::default())
}
