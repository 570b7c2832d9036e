// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide handles: configuration, offline database, HTTP client and
//! the sync coordinator built on them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use labinv_cli_config::LabinvConfig;
use labinv_common_http::{ClientOptions, RetryConfig};
use labinv_inventory::{HttpInventoryClient, InventoryApi, OfflineDb, SyncCoordinator};

pub struct App {
	pub config: LabinvConfig,
	pub db: OfflineDb,
	pub client: Arc<HttpInventoryClient>,
	pub coordinator: SyncCoordinator,
	session_ended: AtomicBool,
}

impl App {
	/// Opens the database, builds the client and restores the stored session.
	#[instrument(skip_all, fields(database = %config.storage.database_path.display()))]
	pub async fn open(config: LabinvConfig) -> Result<Self> {
		let db = OfflineDb::open(&config.storage.database_path)
			.await
			.context("failed to open offline database")?;

		let endpoint = config.endpoint_url().context("invalid server URL")?;
		let options = ClientOptions {
			timeout: Some(config.server.request_timeout),
			user_agent: config.server.user_agent.clone(),
		};
		let client = HttpInventoryClient::new(endpoint, &options)
			.context("failed to build HTTP client")?
			.with_read_retry(read_retry(&config.retry));

		if let Some(cookie) = db.kv().session_cookie().await? {
			debug!("restoring stored session");
			client.restore_session(&cookie);
		}

		let client = Arc::new(client);
		let api: Arc<dyn InventoryApi> = client.clone();
		let coordinator = SyncCoordinator::new(api, &db);

		Ok(Self {
			config,
			db,
			client,
			coordinator,
			session_ended: AtomicBool::new(false),
		})
	}

	pub fn api(&self) -> Arc<dyn InventoryApi> {
		self.client.clone()
	}

	/// Drops the stored session and stops [`App::persist_session`] from
	/// writing the jar's stale cookie back.
	pub async fn forget_session(&self) -> Result<()> {
		self.session_ended.store(true, Ordering::SeqCst);
		self.db.kv().clear_session().await.context("failed to clear session")?;
		Ok(())
	}

	/// Stores whatever session cookie the client currently holds.
	pub async fn persist_session(&self) -> Result<()> {
		if self.session_ended.load(Ordering::SeqCst) {
			return Ok(());
		}
		if let Some(cookie) = self.client.session_cookie() {
			let kv = self.db.kv();
			let email = kv.session_email().await?;
			kv.save_session(&cookie, email.as_deref())
				.await
				.context("failed to store session")?;
		}
		Ok(())
	}

	pub async fn close(self) {
		self.db.close().await;
	}
}

fn read_retry(config: &labinv_cli_config::runtime::RetryConfig) -> RetryConfig {
	RetryConfig {
		max_attempts: config.max_attempts,
		base_delay: config.base_delay,
		max_delay: config.max_delay,
		backoff_factor: config.backoff_factor,
		jitter: config.jitter,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_retry_copies_every_knob() {
		let config = labinv_cli_config::runtime::RetryConfig {
			max_attempts: 5,
			base_delay: std::time::Duration::from_millis(10),
			max_delay: std::time::Duration::from_millis(80),
			backoff_factor: 3.0,
			jitter: false,
		};

		let retry = read_retry(&config);
		assert_eq!(retry.max_attempts, 5);
		assert_eq!(retry.base_delay, config.base_delay);
		assert_eq!(retry.max_delay, config.max_delay);
		assert_eq!(retry.backoff_factor, 3.0);
		assert!(!retry.jitter);
	}
}
