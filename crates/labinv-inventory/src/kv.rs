// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Small key-value table for session and sync bookkeeping.

use chrono::{DateTime, Utc};
use labinv_common_secret::SecretString;
use sqlx::SqlitePool;

use crate::error::StoreError;

const SESSION_COOKIE: &str = "session.cookie";
const SESSION_EMAIL: &str = "session.email";
const LAST_FULL_FETCH: &str = "sync.last_full_fetch";

#[derive(Clone)]
pub struct KeyValueStore {
	pool: SqlitePool,
}

impl KeyValueStore {
	pub(crate) fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = ?")
			.bind(key)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.map(|(value,)| value))
	}

	pub async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
		sqlx::query("INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)")
			.bind(key)
			.bind(value)
			.execute(&self.pool)
			.await?;
		Ok(())
	}

	pub async fn delete(&self, key: &str) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM kv WHERE key = ?")
			.bind(key)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	pub async fn session_cookie(&self) -> Result<Option<SecretString>, StoreError> {
		Ok(self
			.get(SESSION_COOKIE)
			.await?
			.map(SecretString::new)
			.filter(|cookie| !cookie.is_blank()))
	}

	pub async fn save_session(&self, cookie: &SecretString, email: Option<&str>) -> Result<(), StoreError> {
		self.put(SESSION_COOKIE, cookie.expose()).await?;
		if let Some(email) = email {
			self.put(SESSION_EMAIL, email).await?;
		}
		Ok(())
	}

	pub async fn session_email(&self) -> Result<Option<String>, StoreError> {
		self.get(SESSION_EMAIL).await
	}

	pub async fn clear_session(&self) -> Result<(), StoreError> {
		self.delete(SESSION_COOKIE).await?;
		self.delete(SESSION_EMAIL).await?;
		Ok(())
	}

	pub async fn record_full_fetch(&self, at: DateTime<Utc>) -> Result<(), StoreError> {
		self.put(LAST_FULL_FETCH, &at.to_rfc3339()).await
	}

	pub async fn last_full_fetch(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
		let Some(raw) = self.get(LAST_FULL_FETCH).await? else {
			return Ok(None);
		};
		DateTime::parse_from_rfc3339(&raw)
			.map(|at| Some(at.with_timezone(&Utc)))
			.map_err(|_| StoreError::InvalidTimestamp {
				key: LAST_FULL_FETCH.to_string(),
				value: raw,
			})
	}
}
