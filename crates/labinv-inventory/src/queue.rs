// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Durable FIFO of writes that could not reach the backend.
//!
//! Entries are keyed by their enqueue time in milliseconds. Two writes in the
//! same millisecond share a key and the later one replaces the earlier.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::model::{EquipmentId, Mutation, MutationKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
	pub enqueued_at: i64,
	pub mutation: Mutation,
}

#[derive(Clone)]
pub struct SyncQueue {
	pool: SqlitePool,
}

impl SyncQueue {
	pub(crate) fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Enqueues under the current wall-clock millisecond.
	pub async fn enqueue(&self, mutation: &Mutation) -> Result<QueueEntry, StoreError> {
		self
			.enqueue_at(Utc::now().timestamp_millis(), mutation)
			.await
	}

	pub async fn enqueue_at(
		&self,
		enqueued_at: i64,
		mutation: &Mutation,
	) -> Result<QueueEntry, StoreError> {
		let payload = serde_json::to_string(mutation)?;
		sqlx::query(
			"INSERT OR REPLACE INTO sync_queue (enqueued_at, action, target, payload) VALUES (?, ?, ?, ?)",
		)
		.bind(enqueued_at)
		.bind(mutation.kind().as_str())
		.bind(mutation.target().to_string())
		.bind(payload)
		.execute(&self.pool)
		.await?;

		info!(
			enqueued_at = enqueued_at,
			action = %mutation.kind(),
			target = %mutation.target(),
			"mutation queued for sync"
		);

		Ok(QueueEntry {
			enqueued_at,
			mutation: mutation.clone(),
		})
	}

	/// All entries, oldest first. Rows that fail to decode are skipped.
	pub async fn entries(&self) -> Result<Vec<QueueEntry>, StoreError> {
		let rows: Vec<(i64, String)> =
			sqlx::query_as("SELECT enqueued_at, payload FROM sync_queue ORDER BY enqueued_at ASC")
				.fetch_all(&self.pool)
				.await?;

		let mut entries = Vec::with_capacity(rows.len());
		for (enqueued_at, payload) in rows {
			match serde_json::from_str::<Mutation>(&payload) {
				Ok(mutation) => entries.push(QueueEntry {
					enqueued_at,
					mutation,
				}),
				Err(e) => warn!(enqueued_at = enqueued_at, error = %e, "skipping unreadable queue entry"),
			}
		}
		Ok(entries)
	}

	pub async fn get(&self, enqueued_at: i64) -> Result<Option<QueueEntry>, StoreError> {
		let row: Option<(String,)> = sqlx::query_as("SELECT payload FROM sync_queue WHERE enqueued_at = ?")
			.bind(enqueued_at)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some((payload,)) => Ok(Some(QueueEntry {
				enqueued_at,
				mutation: serde_json::from_str(&payload)?,
			})),
			None => Ok(None),
		}
	}

	pub async fn remove(&self, enqueued_at: i64) -> Result<bool, StoreError> {
		let result = sqlx::query("DELETE FROM sync_queue WHERE enqueued_at = ?")
			.bind(enqueued_at)
			.execute(&self.pool)
			.await?;

		let removed = result.rows_affected() > 0;
		if removed {
			debug!(enqueued_at = enqueued_at, "queue entry removed");
		}
		Ok(removed)
	}

	pub async fn len(&self) -> Result<usize, StoreError> {
		let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sync_queue")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as usize)
	}

	pub async fn is_empty(&self) -> Result<bool, StoreError> {
		Ok(self.len().await? == 0)
	}

	pub async fn clear(&self) -> Result<u64, StoreError> {
		let result = sqlx::query("DELETE FROM sync_queue")
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}

	/// Whether a create for the temporary id `temp_id` is still queued.
	pub async fn has_pending_create(&self, temp_id: &EquipmentId) -> Result<bool, StoreError> {
		let (count,): (i64,) =
			sqlx::query_as("SELECT COUNT(*) FROM sync_queue WHERE action = ? AND target = ?")
				.bind(MutationKind::Create.as_str())
				.bind(temp_id.to_string())
				.fetch_one(&self.pool)
				.await?;
		Ok(count > 0)
	}

	/// Points queued updates and deletes for `from` at `to`.
	pub async fn retarget(&self, from: &EquipmentId, to: &EquipmentId) -> Result<usize, StoreError> {
		let mut tx = self.pool.begin().await?;

		let rows: Vec<(i64, String)> =
			sqlx::query_as("SELECT enqueued_at, payload FROM sync_queue WHERE target = ?")
				.bind(from.to_string())
				.fetch_all(&mut *tx)
				.await?;

		let mut changed = 0;
		for (enqueued_at, payload) in rows {
			let mut mutation: Mutation = serde_json::from_str(&payload)?;
			if !mutation.retarget(from, to) {
				continue;
			}
			sqlx::query("UPDATE sync_queue SET target = ?, payload = ? WHERE enqueued_at = ?")
				.bind(to.to_string())
				.bind(serde_json::to_string(&mutation)?)
				.bind(enqueued_at)
				.execute(&mut *tx)
				.await?;
			changed += 1;
		}

		tx.commit().await?;

		if changed > 0 {
			debug!(from = %from, to = %to, count = changed, "queued entries retargeted");
		}
		Ok(changed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::db::OfflineDb;
	use crate::model::{EquipmentPatch, EquipmentStatus, NewEquipment};

	fn create(ms: i64, name: &str) -> Mutation {
		Mutation::Create {
			temp_id: EquipmentId::temporary(ms),
			record: NewEquipment::new(name),
		}
	}

	#[tokio::test]
	async fn entries_come_back_oldest_first() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let queue = db.queue();

		queue.enqueue_at(30, &create(30, "c")).await.unwrap();
		queue.enqueue_at(10, &create(10, "a")).await.unwrap();
		queue.enqueue_at(20, &create(20, "b")).await.unwrap();

		let keys: Vec<i64> = queue
			.entries()
			.await
			.unwrap()
			.iter()
			.map(|e| e.enqueued_at)
			.collect();
		assert_eq!(keys, vec![10, 20, 30]);
		assert_eq!(queue.len().await.unwrap(), 3);
	}

	#[tokio::test]
	async fn same_millisecond_overwrites() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let queue = db.queue();

		queue.enqueue_at(5, &create(5, "first")).await.unwrap();
		queue.enqueue_at(5, &create(5, "second")).await.unwrap();

		let entries = queue.entries().await.unwrap();
		assert_eq!(entries.len(), 1);
		assert!(matches!(
			&entries[0].mutation,
			Mutation::Create { record, .. } if record.name == "second"
		));
	}

	#[tokio::test]
	async fn remove_and_clear() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let queue = db.queue();
		queue.enqueue_at(1, &create(1, "a")).await.unwrap();
		queue.enqueue_at(2, &create(2, "b")).await.unwrap();

		assert!(queue.remove(1).await.unwrap());
		assert!(!queue.remove(1).await.unwrap());
		assert!(queue.get(1).await.unwrap().is_none());
		assert!(queue.get(2).await.unwrap().is_some());

		assert_eq!(queue.clear().await.unwrap(), 1);
		assert!(queue.is_empty().await.unwrap());
	}

	#[tokio::test]
	async fn retarget_rewrites_dependent_entries_only() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let queue = db.queue();
		let temp = EquipmentId::temporary(1);
		let other = EquipmentId::temporary(2);

		queue.enqueue_at(1, &create(1, "Pipeta")).await.unwrap();
		queue
			.enqueue_at(
				3,
				&Mutation::Update(EquipmentPatch::new(temp.clone()).with_status(EquipmentStatus::InUse)),
			)
			.await
			.unwrap();
		queue
			.enqueue_at(4, &Mutation::Delete { id: other.clone() })
			.await
			.unwrap();

		let changed = queue.retarget(&temp, &EquipmentId::Server(50)).await.unwrap();
		assert_eq!(changed, 1);

		assert_eq!(
			queue.get(1).await.unwrap().unwrap().mutation.target(),
			&temp
		);
		assert_eq!(
			queue.get(3).await.unwrap().unwrap().mutation.target(),
			&EquipmentId::Server(50)
		);
		assert_eq!(queue.get(4).await.unwrap().unwrap().mutation.target(), &other);
	}

	#[tokio::test]
	async fn pending_create_lookup_ignores_dependents() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let queue = db.queue();
		let temp = EquipmentId::temporary(1);
		let orphan = EquipmentId::temporary(9);

		queue.enqueue_at(1, &create(1, "Pipeta")).await.unwrap();
		queue
			.enqueue_at(2, &Mutation::Delete { id: orphan.clone() })
			.await
			.unwrap();

		assert!(queue.has_pending_create(&temp).await.unwrap());
		assert!(!queue.has_pending_create(&orphan).await.unwrap());

		queue.remove(1).await.unwrap();
		assert!(!queue.has_pending_create(&temp).await.unwrap());
	}

	#[tokio::test]
	async fn enqueue_uses_wall_clock() {
		let db = OfflineDb::open_in_memory().await.unwrap();
		let before = Utc::now().timestamp_millis();
		let entry = db.queue().enqueue(&create(0, "x")).await.unwrap();
		assert!(entry.enqueued_at >= before);
	}
}
