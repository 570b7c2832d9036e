// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Unsaved equipment form input, so an interrupted edit is not lost.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreError;
use crate::model::EquipmentDraft;

/// The form has a single slot.
const DRAFT_SLOT: &str = "equipment_form";

#[derive(Clone)]
pub struct DraftStore {
	pool: SqlitePool,
}

impl DraftStore {
	pub(crate) fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn save(&self, draft: &EquipmentDraft) -> Result<(), StoreError> {
		sqlx::query("INSERT OR REPLACE INTO drafts (name, draft, saved_at) VALUES (?, ?, ?)")
			.bind(DRAFT_SLOT)
			.bind(serde_json::to_string(draft)?)
			.bind(Utc::now().to_rfc3339())
			.execute(&self.pool)
			.await?;
		debug!("draft saved");
		Ok(())
	}

	pub async fn load(&self) -> Result<Option<EquipmentDraft>, StoreError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT draft FROM drafts WHERE name = ?")
			.bind(DRAFT_SLOT)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
			None => Ok(None),
		}
	}

	/// Merges `draft` over whatever is stored and returns the result.
	pub async fn update(&self, draft: EquipmentDraft) -> Result<EquipmentDraft, StoreError> {
		let mut current = self.load().await?.unwrap_or_default();
		current.merge(draft);
		self.save(&current).await?;
		Ok(current)
	}

	pub async fn clear(&self) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM drafts WHERE name = ?")
			.bind(DRAFT_SLOT)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}
