// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The on-device SQLite database holding the mirror, sync queue, drafts and
//! key-value state.

use std::path::Path;
use std::str::FromStr;

use sqlx::sqlite::{
	SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use crate::drafts::DraftStore;
use crate::error::StoreError;
use crate::kv::KeyValueStore;
use crate::mirror::MirrorStore;
use crate::queue::SyncQueue;

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS inventory_mirror (
		id TEXT PRIMARY KEY,
		origin TEXT NOT NULL,
		record TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS sync_queue (
		enqueued_at INTEGER PRIMARY KEY,
		action TEXT NOT NULL,
		target TEXT NOT NULL,
		payload TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS drafts (
		name TEXT PRIMARY KEY,
		draft TEXT NOT NULL,
		saved_at TEXT NOT NULL
	)
	"#,
	r#"
	CREATE TABLE IF NOT EXISTS kv (
		key TEXT PRIMARY KEY,
		value TEXT NOT NULL
	)
	"#,
];

pub struct OfflineDb {
	pool: SqlitePool,
}

impl OfflineDb {
	/// Opens (creating if needed) the database file at `path`.
	#[tracing::instrument(skip_all, fields(path = %path.display()))]
	pub async fn open(path: &Path) -> Result<Self, StoreError> {
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				tokio::fs::create_dir_all(parent).await?;
			}
		}

		let options = SqliteConnectOptions::new()
			.filename(path)
			.journal_mode(SqliteJournalMode::Wal)
			.synchronous(SqliteSynchronous::Normal)
			.create_if_missing(true);

		let pool = SqlitePoolOptions::new()
			.max_connections(4)
			.connect_with(options)
			.await?;

		let db = Self { pool };
		db.migrate().await?;
		info!("offline database opened");
		Ok(db)
	}

	/// A private database that lives as long as this handle.
	pub async fn open_in_memory() -> Result<Self, StoreError> {
		let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
		// Every pooled connection would get its own empty database.
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.min_connections(1)
			.idle_timeout(None)
			.max_lifetime(None)
			.connect_with(options)
			.await?;

		let db = Self { pool };
		db.migrate().await?;
		Ok(db)
	}

	async fn migrate(&self) -> Result<(), StoreError> {
		for statement in SCHEMA {
			sqlx::query(statement).execute(&self.pool).await?;
		}
		debug!(tables = SCHEMA.len(), "offline schema ready");
		Ok(())
	}

	pub fn mirror(&self) -> MirrorStore {
		MirrorStore::new(self.pool.clone())
	}

	pub fn queue(&self) -> SyncQueue {
		SyncQueue::new(self.pool.clone())
	}

	pub fn drafts(&self) -> DraftStore {
		DraftStore::new(self.pool.clone())
	}

	pub fn kv(&self) -> KeyValueStore {
		KeyValueStore::new(self.pool.clone())
	}

	/// Flushes and closes all connections.
	pub async fn close(self) {
		self.pool.close().await;
		debug!("offline database closed");
	}
}
