// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Offline-first coordination between the backend, the mirror and the queue.
//!
//! Writes go to the backend first. A write that gets no response at all is
//! queued and reflected in the mirror; any other failure is returned to the
//! caller. Queued writes are replayed oldest first when connectivity returns.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::api::InventoryApi;
use crate::clock::{Clock, SystemClock};
use crate::connectivity::Connectivity;
use crate::db::OfflineDb;
use crate::error::{EquipmentIdError, InventoryError, StoreError};
use crate::kv::KeyValueStore;
use crate::mirror::MirrorStore;
use crate::model::{Equipment, EquipmentId, EquipmentPatch, Mutation, NewEquipment};
use crate::queue::{QueueEntry, SyncQueue};

/// Result of a create, update or delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
	/// The backend accepted it. `id` is absent if the backend did not return one.
	Synced { id: Option<EquipmentId> },
	/// The change waits in the queue, either because the backend was
	/// unreachable or because its record's create has not synced yet.
	Queued { enqueued_at: i64, id: EquipmentId },
}

impl SubmitOutcome {
	pub fn is_queued(&self) -> bool {
		matches!(self, Self::Queued { .. })
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSource {
	Remote,
	Mirror,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadResult {
	pub records: Vec<Equipment>,
	pub source: DataSource,
	/// Queue length at the time of the load.
	pub pending: usize,
}

impl LoadResult {
	pub fn is_offline(&self) -> bool {
		self.source == DataSource::Mirror
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
	pub attempted: usize,
	pub replayed: usize,
	pub failed: usize,
	/// Updates and deletes still waiting on an unconfirmed create.
	pub deferred: usize,
	/// Updates and deletes dropped because no create for their temporary id
	/// remains and no server id could be found for it.
	pub orphaned: usize,
	/// Creates whose temporary id was replaced by a server id.
	pub reconciled: usize,
	pub remaining: usize,
	/// A create was confirmed without an id; only a full fetch can repair the
	/// mirror.
	pub needs_refresh: bool,
}

impl DrainReport {
	pub fn is_clean(&self) -> bool {
		self.remaining == 0
	}
}

enum Replayed {
	Applied,
	Reconciled,
	NeedsRefresh,
}

pub struct SyncCoordinator {
	api: Arc<dyn InventoryApi>,
	mirror: MirrorStore,
	queue: SyncQueue,
	kv: KeyValueStore,
	clock: Arc<dyn Clock>,
}

impl SyncCoordinator {
	pub fn new(api: Arc<dyn InventoryApi>, db: &OfflineDb) -> Self {
		Self {
			api,
			mirror: db.mirror(),
			queue: db.queue(),
			kv: db.kv(),
			clock: Arc::new(SystemClock),
		}
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn mirror(&self) -> &MirrorStore {
		&self.mirror
	}

	pub fn queue(&self) -> &SyncQueue {
		&self.queue
	}

	pub async fn pending_count(&self) -> Result<usize, StoreError> {
		self.queue.len().await
	}

	/// Drains the queue if the backend is reachable. `None` when it is not.
	#[instrument(skip(self))]
	pub async fn start(&self) -> Result<Option<DrainReport>, InventoryError> {
		if !self.api.is_reachable().await {
			let pending = self.queue.len().await?;
			info!(pending = pending, "backend unreachable at startup, working offline");
			return Ok(None);
		}
		self.on_connectivity_restored().await.map(Some)
	}

	#[instrument(skip(self, record), fields(name = %record.name))]
	pub async fn create(&self, record: NewEquipment) -> Result<SubmitOutcome, InventoryError> {
		record.validate()?;

		match self.api.create_equipment(&record).await {
			Ok(created) => {
				let id = created.id.map(EquipmentId::Server);
				match &id {
					Some(id) => self.mirror.put(&record.into_record(id.clone())).await?,
					None => debug!("backend did not return an id, mirror updates on next fetch"),
				}
				Ok(SubmitOutcome::Synced { id })
			}
			Err(e) if e.is_connectivity() => {
				let now = self.clock.now_millis();
				let mutation = Mutation::Create {
					temp_id: EquipmentId::temporary(now),
					record,
				};
				self.queue_offline(now, mutation).await
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self, patch), fields(id = %patch.id))]
	pub async fn update(&self, patch: EquipmentPatch) -> Result<SubmitOutcome, InventoryError> {
		patch.validate()?;

		// The backend has never seen a temporary id.
		if patch.id.is_temporary() {
			self.require_pending_create(&patch.id).await?;
			let now = self.clock.now_millis();
			return self.queue_offline(now, Mutation::Update(patch)).await;
		}

		match self.api.update_equipment(&patch).await {
			Ok(()) => {
				if let Some(mut record) = self.mirror.get(&patch.id).await? {
					patch.apply_to(&mut record);
					self.mirror.put(&record).await?;
				}
				Ok(SubmitOutcome::Synced {
					id: Some(patch.id),
				})
			}
			Err(e) if e.is_connectivity() => {
				let now = self.clock.now_millis();
				self.queue_offline(now, Mutation::Update(patch)).await
			}
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self))]
	pub async fn delete(&self, id: EquipmentId) -> Result<SubmitOutcome, InventoryError> {
		if id.is_temporary() {
			self.require_pending_create(&id).await?;
			let now = self.clock.now_millis();
			return self.queue_offline(now, Mutation::Delete { id }).await;
		}

		match self.api.delete_equipment(&id).await {
			Ok(()) => {
				self.mirror.remove(&id).await?;
				Ok(SubmitOutcome::Synced { id: Some(id) })
			}
			Err(e) if e.is_connectivity() => {
				let now = self.clock.now_millis();
				self.queue_offline(now, Mutation::Delete { id }).await
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn require_pending_create(&self, temp_id: &EquipmentId) -> Result<(), InventoryError> {
		if self.queue.has_pending_create(temp_id).await? {
			return Ok(());
		}
		Err(EquipmentIdError::UnknownTemporary(temp_id.to_string()).into())
	}

	async fn queue_offline(&self, now: i64, mutation: Mutation) -> Result<SubmitOutcome, InventoryError> {
		let entry = self.queue.enqueue_at(now, &mutation).await?;
		self.mirror.apply_optimistic(&mutation).await?;

		warn!(
			action = %mutation.kind(),
			target = %mutation.target(),
			enqueued_at = entry.enqueued_at,
			"backend unreachable, change saved for later sync"
		);

		Ok(SubmitOutcome::Queued {
			enqueued_at: entry.enqueued_at,
			id: mutation.target().clone(),
		})
	}

	/// Lists equipment, falling back to the mirror when the backend is down.
	///
	/// A successful unfiltered fetch replaces the mirror, after which pending
	/// queue entries are reapplied so local changes stay visible.
	#[instrument(skip(self))]
	pub async fn load(&self, query: Option<&str>) -> Result<LoadResult, InventoryError> {
		let query = query.map(str::trim).filter(|q| !q.is_empty());

		match self.api.list_equipment(query).await {
			Ok(records) => {
				if query.is_none() {
					self.refresh_mirror(&records).await?;
				}
				let pending = self.queue.len().await?;
				Ok(LoadResult {
					records,
					source: DataSource::Remote,
					pending,
				})
			}
			Err(e) if e.allows_mirror_fallback() => {
				warn!(error = %e, "inventory fetch failed, serving local copy");
				let records = match query {
					Some(q) => self.mirror.search(q).await?,
					None => self.mirror.all().await?,
				};
				let pending = self.queue.len().await?;
				Ok(LoadResult {
					records,
					source: DataSource::Mirror,
					pending,
				})
			}
			Err(e) => Err(e.into()),
		}
	}

	async fn refresh_mirror(&self, records: &[Equipment]) -> Result<(), StoreError> {
		self.mirror.replace_all(records).await?;

		let pending = self.queue.entries().await?;
		for entry in &pending {
			self.mirror.apply_optimistic(&entry.mutation).await?;
		}

		self.kv.record_full_fetch(Utc::now()).await?;
		debug!(
			count = records.len(),
			reapplied = pending.len(),
			"mirror refreshed from backend"
		);
		Ok(())
	}

	/// Replays every queued entry once, oldest first.
	///
	/// A failed entry stays queued and does not stop later ones.
	#[instrument(skip(self))]
	pub async fn drain(&self) -> Result<DrainReport, InventoryError> {
		let keys: Vec<i64> = self
			.queue
			.entries()
			.await?
			.into_iter()
			.map(|entry| entry.enqueued_at)
			.collect();

		let mut report = DrainReport::default();

		for key in keys {
			// Re-read: reconciling an earlier create may have retargeted it.
			let Some(entry) = self.queue.get(key).await? else {
				continue;
			};

			if let Some(waiting_on) = entry.mutation.unresolved_dependency() {
				if !self.queue.has_pending_create(waiting_on).await? {
					warn!(
						enqueued_at = key,
						action = %entry.mutation.kind(),
						target = %waiting_on,
						"no create left for temporary id, dropping entry"
					);
					self.queue.remove(key).await?;
					report.orphaned += 1;
					continue;
				}
				debug!(
					enqueued_at = key,
					waiting_on = %waiting_on,
					"entry waits for its create to sync"
				);
				report.deferred += 1;
				continue;
			}

			report.attempted += 1;
			match self.replay(&entry).await {
				Ok(outcome) => {
					self.queue.remove(key).await?;
					report.replayed += 1;
					match outcome {
						Replayed::Applied => {}
						Replayed::Reconciled => report.reconciled += 1,
						Replayed::NeedsRefresh => report.needs_refresh = true,
					}
				}
				Err(InventoryError::Api(e)) => {
					report.failed += 1;
					warn!(
						enqueued_at = key,
						action = %entry.mutation.kind(),
						target = %entry.mutation.target(),
						error = %e,
						"replay failed, entry kept for next sync"
					);
				}
				Err(e) => return Err(e),
			}
		}

		report.remaining = self.queue.len().await?;
		info!(
			attempted = report.attempted,
			replayed = report.replayed,
			failed = report.failed,
			deferred = report.deferred,
			orphaned = report.orphaned,
			remaining = report.remaining,
			"sync queue drained"
		);
		Ok(report)
	}

	async fn replay(&self, entry: &QueueEntry) -> Result<Replayed, InventoryError> {
		match &entry.mutation {
			Mutation::Create { temp_id, record } => {
				let created = self.api.create_equipment(record).await?;
				match created.id {
					Some(id) => {
						self.reconcile(temp_id, &EquipmentId::Server(id)).await?;
						Ok(Replayed::Reconciled)
					}
					None => match self.find_created(record).await {
						Some(id) => {
							self.reconcile(temp_id, &id).await?;
							Ok(Replayed::Reconciled)
						}
						None => {
							warn!(temp_id = %temp_id, "create synced without an id, full refresh needed");
							Ok(Replayed::NeedsRefresh)
						}
					},
				}
			}
			Mutation::Update(patch) => {
				self.api.update_equipment(patch).await?;
				if let Some(mut record) = self.mirror.get(&patch.id).await? {
					patch.apply_to(&mut record);
					self.mirror.put(&record).await?;
				}
				Ok(Replayed::Applied)
			}
			Mutation::Delete { id } => {
				self.api.delete_equipment(id).await?;
				self.mirror.remove(id).await?;
				Ok(Replayed::Applied)
			}
		}
	}

	/// Looks up the server record a create produced when the backend did not
	/// return its id. Picks the newest matching record the mirror does not
	/// already hold.
	async fn find_created(&self, record: &NewEquipment) -> Option<EquipmentId> {
		let candidates = match self.api.list_equipment(Some(&record.name)).await {
			Ok(candidates) => candidates,
			Err(e) => {
				warn!(error = %e, "lookup of created record failed");
				return None;
			}
		};

		let mut found: Option<EquipmentId> = None;
		for candidate in candidates {
			let matches = candidate.name == record.name
				&& candidate.description == record.description
				&& candidate.status == record.status;
			if !matches || candidate.id.is_temporary() {
				continue;
			}
			match self.mirror.get(&candidate.id).await {
				Ok(None) => {}
				Ok(Some(_)) => continue,
				Err(e) => {
					warn!(error = %e, "mirror lookup failed while matching created record");
					return None;
				}
			}
			if found.as_ref().and_then(EquipmentId::server_id) < candidate.id.server_id() {
				found = Some(candidate.id);
			}
		}
		found
	}

	async fn reconcile(&self, temp_id: &EquipmentId, server_id: &EquipmentId) -> Result<(), StoreError> {
		let rekeyed = self.mirror.rekey(temp_id, server_id).await?;
		let retargeted = self.queue.retarget(temp_id, server_id).await?;
		info!(
			temp_id = %temp_id,
			server_id = %server_id,
			rekeyed = rekeyed,
			retargeted = retargeted,
			"temporary id reconciled"
		);
		Ok(())
	}

	/// Drains the queue, then refreshes the mirror if anything was replayed.
	pub async fn on_connectivity_restored(&self) -> Result<DrainReport, InventoryError> {
		let report = self.drain().await?;
		if report.replayed > 0 || report.orphaned > 0 || report.needs_refresh {
			if let Err(e) = self.load(None).await {
				warn!(error = %e, "refresh after sync failed");
			}
		}
		Ok(report)
	}

	/// Drains on every offline to online transition until the sender closes.
	pub async fn follow_connectivity(&self, mut rx: watch::Receiver<Connectivity>) {
		let mut last = *rx.borrow_and_update();

		while rx.changed().await.is_ok() {
			let current = *rx.borrow_and_update();
			if current == Connectivity::Online && last == Connectivity::Offline {
				info!("connectivity restored, syncing queued changes");
				if let Err(e) = self.on_connectivity_restored().await {
					warn!(error = %e, "sync after reconnect failed");
				}
			}
			last = current;
		}
		debug!("connectivity channel closed");
	}
}
