// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Local copy of the inventory, served when the backend cannot be reached.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::model::{display_order, Equipment, EquipmentId, IdOrigin, Mutation};

#[derive(Clone)]
pub struct MirrorStore {
	pool: SqlitePool,
}

fn origin_str(id: &EquipmentId) -> &'static str {
	match id.origin() {
		IdOrigin::Server => "server",
		IdOrigin::Temporary => "temporary",
	}
}

impl MirrorStore {
	pub(crate) fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	pub async fn get(&self, id: &EquipmentId) -> Result<Option<Equipment>, StoreError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT record FROM inventory_mirror WHERE id = ?")
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
			None => Ok(None),
		}
	}

	/// Inserts or overwrites the record with the same id.
	pub async fn put(&self, record: &Equipment) -> Result<(), StoreError> {
		let json = serde_json::to_string(record)?;
		sqlx::query(
			r#"
			INSERT INTO inventory_mirror (id, origin, record, updated_at)
			VALUES (?, ?, ?, ?)
			ON CONFLICT(id) DO UPDATE SET
				origin = excluded.origin,
				record = excluded.record,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(record.id.to_string())
		.bind(origin_str(&record.id))
		.bind(json)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		debug!(id = %record.id, "mirror record saved");
		Ok(())
	}

	pub async fn remove(&self, id: &EquipmentId) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM inventory_mirror WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	/// All records in display order. Rows that fail to decode are skipped.
	pub async fn all(&self) -> Result<Vec<Equipment>, StoreError> {
		let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, record FROM inventory_mirror")
			.fetch_all(&self.pool)
			.await?;

		let mut records = Vec::with_capacity(rows.len());
		for (id, json) in rows {
			match serde_json::from_str::<Equipment>(&json) {
				Ok(record) => records.push(record),
				Err(e) => warn!(id = %id, error = %e, "skipping unreadable mirror record"),
			}
		}

		records.sort_by(|a, b| display_order(&a.id, &b.id));
		Ok(records)
	}

	/// Case-insensitive substring search over name and description.
	pub async fn search(&self, query: &str) -> Result<Vec<Equipment>, StoreError> {
		let needle = query.trim().to_lowercase();
		let records = self.all().await?;
		if needle.is_empty() {
			return Ok(records);
		}
		Ok(records
			.into_iter()
			.filter(|record| record.matches_query(&needle))
			.collect())
	}

	pub async fn len(&self) -> Result<usize, StoreError> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM inventory_mirror")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as usize)
	}

	/// Atomically swaps the mirror contents for `records`.
	pub async fn replace_all(&self, records: &[Equipment]) -> Result<(), StoreError> {
		let now = Utc::now().to_rfc3339();
		let mut tx = self.pool.begin().await?;

		sqlx::query("DELETE FROM inventory_mirror")
			.execute(&mut *tx)
			.await?;

		for record in records {
			sqlx::query(
				"INSERT OR REPLACE INTO inventory_mirror (id, origin, record, updated_at) VALUES (?, ?, ?, ?)",
			)
			.bind(record.id.to_string())
			.bind(origin_str(&record.id))
			.bind(serde_json::to_string(record)?)
			.bind(&now)
			.execute(&mut *tx)
			.await?;
		}

		tx.commit().await?;
		debug!(count = records.len(), "mirror replaced");
		Ok(())
	}

	/// Moves the record stored under `from` to `to`, keeping its fields.
	pub async fn rekey(&self, from: &EquipmentId, to: &EquipmentId) -> Result<bool, StoreError> {
		let Some(mut record) = self.get(from).await? else {
			return Ok(false);
		};
		record.id = to.clone();

		let mut tx = self.pool.begin().await?;
		sqlx::query("DELETE FROM inventory_mirror WHERE id = ?")
			.bind(from.to_string())
			.execute(&mut *tx)
			.await?;
		sqlx::query(
			"INSERT OR REPLACE INTO inventory_mirror (id, origin, record, updated_at) VALUES (?, ?, ?, ?)",
		)
		.bind(to.to_string())
		.bind(origin_str(to))
		.bind(serde_json::to_string(&record)?)
		.bind(Utc::now().to_rfc3339())
		.execute(&mut *tx)
		.await?;
		tx.commit().await?;

		debug!(from = %from, to = %to, "mirror record rekeyed");
		Ok(true)
	}

	/// Reflects a not-yet-confirmed mutation in the mirror.
	pub async fn apply_optimistic(&self, mutation: &Mutation) -> Result<(), StoreError> {
		match mutation {
			Mutation::Create { temp_id, record } => {
				self.put(&record.clone().into_record(temp_id.clone())).await
			}
			Mutation::Update(patch) => {
				if let Some(mut record) = self.get(&patch.id).await? {
					patch.apply_to(&mut record);
					self.put(&record).await?;
				}
				Ok(())
			}
			Mutation::Delete { id } => {
				self.remove(id).await?;
				Ok(())
			}
		}
	}
}
