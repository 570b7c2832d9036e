// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime configuration types with resolved defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::layer::*;
use crate::paths::PathsConfig;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost/";
pub const DEFAULT_ENDPOINT: &str = "api.php";

/// The final, validated configuration for labinv.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabinvConfig {
	pub server: ServerConfig,
	pub storage: StorageConfig,
	pub sync: SyncConfig,
	pub logging: LoggingConfig,
	pub retry: RetryConfig,

	/// Resolved XDG paths (not serialized)
	#[serde(skip)]
	pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
	pub base_url: String,
	pub endpoint: String,
	#[serde(with = "humantime_serde")]
	pub request_timeout: Duration,
	pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
	pub database_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
	/// How often `labinv watch` probes the backend.
	#[serde(with = "humantime_serde")]
	pub probe_interval: Duration,
	/// Replay queued changes before running a command.
	pub drain_on_start: bool,
}

mod humantime_serde {
	use serde::{self, Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.as_secs())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = u64::deserialize(deserializer)?;
		Ok(Duration::from_secs(secs))
	}
}

mod millis_serde {
	use serde::{self, Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let millis = u64::deserialize(deserializer)?;
		Ok(Duration::from_millis(millis))
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
	pub level: LogLevel,
	pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
	Error,
	#[default]
	Warn,
	Info,
	Debug,
	Trace,
}

impl LogLevel {
	/// Directive for `tracing_subscriber::EnvFilter`.
	pub fn as_filter_str(&self) -> &'static str {
		match self {
			LogLevel::Error => "error",
			LogLevel::Warn => "warn",
			LogLevel::Info => "info",
			LogLevel::Debug => "debug",
			LogLevel::Trace => "trace",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
	#[default]
	Compact,
	Pretty,
	Json,
}

/// Backoff for idempotent reads. Writes are never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
	pub max_attempts: u32,
	#[serde(with = "millis_serde")]
	pub base_delay: Duration,
	#[serde(with = "millis_serde")]
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 2,
			base_delay: Duration::from_millis(250),
			max_delay: Duration::from_secs(5),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			endpoint: DEFAULT_ENDPOINT.to_string(),
			request_timeout: Duration::from_secs(15),
			user_agent: None,
		}
	}
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			probe_interval: Duration::from_secs(15),
			drain_on_start: true,
		}
	}
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: LogLevel::Warn,
			format: LogFormat::Compact,
		}
	}
}

impl LabinvConfig {
	/// Build runtime config from a merged layer and paths.
	pub fn from_layer(layer: ConfigLayer, paths: PathsConfig) -> Result<Self, ConfigError> {
		let server = build_server_config(layer.server);
		let storage = build_storage_config(layer.storage, &paths);
		let sync = build_sync_config(layer.sync);
		let logging = build_logging_config(layer.logging)?;
		let retry = build_retry_config(layer.retry);

		Ok(Self {
			server,
			storage,
			sync,
			logging,
			retry,
			paths,
		})
	}

	/// Full URL of the action endpoint, e.g. `http://host/inventario/api.php`.
	pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
		let base = parse_base_url(&self.server.base_url)?;
		base.join(&self.server.endpoint)
			.map_err(|e| ConfigError::invalid_value("server.endpoint", e.to_string()))
	}
}

/// Parses `base_url`, treating it as a directory so relative joins keep the
/// last path segment.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let normalized = if raw.ends_with('/') {
		raw.to_string()
	} else {
		format!("{raw}/")
	};
	Url::parse(&normalized).map_err(|e| ConfigError::invalid_value("server.base_url", e.to_string()))
}

fn build_server_config(layer: Option<ServerLayer>) -> ServerConfig {
	let layer = layer.unwrap_or_default();
	let defaults = ServerConfig::default();
	ServerConfig {
		base_url: layer.base_url.unwrap_or(defaults.base_url),
		endpoint: layer.endpoint.unwrap_or(defaults.endpoint),
		request_timeout: layer
			.request_timeout_secs
			.map(Duration::from_secs)
			.unwrap_or(defaults.request_timeout),
		user_agent: layer.user_agent,
	}
}

fn build_storage_config(layer: Option<StorageLayer>, paths: &PathsConfig) -> StorageConfig {
	let layer = layer.unwrap_or_default();
	StorageConfig {
		database_path: layer
			.database_path
			.unwrap_or_else(|| paths.default_database_path()),
	}
}

fn build_sync_config(layer: Option<SyncLayer>) -> SyncConfig {
	let layer = layer.unwrap_or_default();
	let defaults = SyncConfig::default();
	SyncConfig {
		probe_interval: layer
			.probe_interval_secs
			.map(Duration::from_secs)
			.unwrap_or(defaults.probe_interval),
		drain_on_start: layer.drain_on_start.unwrap_or(defaults.drain_on_start),
	}
}

fn build_logging_config(layer: Option<LoggingLayer>) -> Result<LoggingConfig, ConfigError> {
	let layer = layer.unwrap_or_default();
	Ok(LoggingConfig {
		level: parse_log_level(layer.level.as_deref())?,
		format: parse_log_format(layer.format.as_deref())?,
	})
}

fn parse_log_level(s: Option<&str>) -> Result<LogLevel, ConfigError> {
	match s.map(str::to_ascii_lowercase).as_deref() {
		None => Ok(LogLevel::default()),
		Some("error") => Ok(LogLevel::Error),
		Some("warn") => Ok(LogLevel::Warn),
		Some("info") => Ok(LogLevel::Info),
		Some("debug") => Ok(LogLevel::Debug),
		Some("trace") => Ok(LogLevel::Trace),
		Some(other) => Err(ConfigError::invalid_value(
			"logging.level",
			format!("unknown level '{other}'"),
		)),
	}
}

fn parse_log_format(s: Option<&str>) -> Result<LogFormat, ConfigError> {
	match s.map(str::to_ascii_lowercase).as_deref() {
		None => Ok(LogFormat::default()),
		Some("json") => Ok(LogFormat::Json),
		Some("compact") => Ok(LogFormat::Compact),
		Some("pretty") => Ok(LogFormat::Pretty),
		Some(other) => Err(ConfigError::invalid_value(
			"logging.format",
			format!("unknown format '{other}'"),
		)),
	}
}

fn build_retry_config(layer: Option<RetryLayer>) -> RetryConfig {
	let layer = layer.unwrap_or_default();
	let defaults = RetryConfig::default();
	RetryConfig {
		max_attempts: layer.max_attempts.unwrap_or(defaults.max_attempts),
		base_delay: layer
			.base_delay_ms
			.map(Duration::from_millis)
			.unwrap_or(defaults.base_delay),
		max_delay: layer
			.max_delay_ms
			.map(Duration::from_millis)
			.unwrap_or(defaults.max_delay),
		backoff_factor: layer.backoff_factor.unwrap_or(defaults.backoff_factor),
		jitter: layer.jitter.unwrap_or(defaults.jitter),
	}
}
