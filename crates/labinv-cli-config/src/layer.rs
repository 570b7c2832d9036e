// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer for merging from multiple sources.

use serde::Deserialize;
use std::path::PathBuf;

/// Partial configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigLayer {
	#[serde(default)]
	pub server: Option<ServerLayer>,
	#[serde(default)]
	pub storage: Option<StorageLayer>,
	#[serde(default)]
	pub sync: Option<SyncLayer>,
	#[serde(default)]
	pub logging: Option<LoggingLayer>,
	#[serde(default)]
	pub retry: Option<RetryLayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerLayer {
	#[serde(default)]
	pub base_url: Option<String>,
	/// Script name joined onto `base_url`.
	#[serde(default)]
	pub endpoint: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageLayer {
	#[serde(default)]
	pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncLayer {
	#[serde(default)]
	pub probe_interval_secs: Option<u64>,
	#[serde(default)]
	pub drain_on_start: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingLayer {
	#[serde(default)]
	pub level: Option<String>,
	#[serde(default)]
	pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryLayer {
	#[serde(default)]
	pub max_attempts: Option<u32>,
	#[serde(default)]
	pub base_delay_ms: Option<u64>,
	#[serde(default)]
	pub max_delay_ms: Option<u64>,
	#[serde(default)]
	pub backoff_factor: Option<f64>,
	#[serde(default)]
	pub jitter: Option<bool>,
}

impl ConfigLayer {
	/// Merge another layer on top of this one (other takes precedence).
	pub fn merge(&mut self, other: ConfigLayer) {
		merge_option(&mut self.server, other.server, ServerLayer::merge);
		merge_option(&mut self.storage, other.storage, StorageLayer::merge);
		merge_option(&mut self.sync, other.sync, SyncLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingLayer::merge);
		merge_option(&mut self.retry, other.retry, RetryLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

fn overwrite<T>(target: &mut Option<T>, source: Option<T>) {
	if source.is_some() {
		*target = source;
	}
}

impl ServerLayer {
	fn merge(&mut self, other: ServerLayer) {
		overwrite(&mut self.base_url, other.base_url);
		overwrite(&mut self.endpoint, other.endpoint);
		overwrite(&mut self.request_timeout_secs, other.request_timeout_secs);
		overwrite(&mut self.user_agent, other.user_agent);
	}
}

impl StorageLayer {
	fn merge(&mut self, other: StorageLayer) {
		overwrite(&mut self.database_path, other.database_path);
	}
}

impl SyncLayer {
	fn merge(&mut self, other: SyncLayer) {
		overwrite(&mut self.probe_interval_secs, other.probe_interval_secs);
		overwrite(&mut self.drain_on_start, other.drain_on_start);
	}
}

impl LoggingLayer {
	fn merge(&mut self, other: LoggingLayer) {
		overwrite(&mut self.level, other.level);
		overwrite(&mut self.format, other.format);
	}
}

impl RetryLayer {
	fn merge(&mut self, other: RetryLayer) {
		overwrite(&mut self.max_attempts, other.max_attempts);
		overwrite(&mut self.base_delay_ms, other.base_delay_ms);
		overwrite(&mut self.max_delay_ms, other.max_delay_ms);
		overwrite(&mut self.backoff_factor, other.backoff_factor);
		overwrite(&mut self.jitter, other.jitter);
	}
}
