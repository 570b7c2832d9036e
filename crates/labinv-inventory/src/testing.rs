// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{CreatedEquipment, InventoryApi};
use crate::clock::Clock;
use crate::error::ApiError;
use crate::model::{Equipment, EquipmentId, EquipmentPatch, NewEquipment};

/// Clock that advances one millisecond per reading.
pub struct StepClock(AtomicI64);

impl StepClock {
	pub fn starting_at(ms: i64) -> Self {
		Self(AtomicI64::new(ms))
	}
}

impl Clock for StepClock {
	fn now_millis(&self) -> i64 {
		self.0.fetch_add(1, Ordering::SeqCst)
	}
}

#[derive(Default)]
struct FakeState {
	offline: bool,
	omit_created_ids: bool,
	list_status: Option<StatusCode>,
	failing_names: HashSet<String>,
	records: BTreeMap<i64, Equipment>,
	next_id: i64,
	calls: Vec<String>,
}

/// In-memory backend. Offline calls fail as connectivity errors.
pub struct FakeInventoryApi {
	state: Mutex<FakeState>,
}

impl FakeInventoryApi {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(FakeState {
				next_id: 100,
				..Default::default()
			}),
		}
	}

	pub fn set_online(&self, online: bool) {
		self.state.lock().unwrap().offline = !online;
	}

	pub fn omit_created_ids(&self) {
		self.state.lock().unwrap().omit_created_ids = true;
	}

	/// Makes listing answer with `status` instead of data.
	pub fn fail_listing_with(&self, status: StatusCode) {
		self.state.lock().unwrap().list_status = Some(status);
	}

	/// Creates with this name are answered with a 500.
	pub fn fail_creates_named(&self, name: &str) {
		self.state.lock().unwrap().failing_names.insert(name.to_string());
	}

	pub fn seed(&self, record: NewEquipment) -> i64 {
		let mut state = self.state.lock().unwrap();
		let id = state.next_id;
		state.next_id += 1;
		state.records.insert(id, record.into_record(EquipmentId::Server(id)));
		id
	}

	pub fn records(&self) -> Vec<Equipment> {
		self.state.lock().unwrap().records.values().cloned().collect()
	}

	pub fn calls(&self) -> Vec<String> {
		self.state.lock().unwrap().calls.clone()
	}

	fn begin(&self, call: String) -> Result<std::sync::MutexGuard<'_, FakeState>, ApiError> {
		let mut state = self.state.lock().unwrap();
		if state.offline {
			return Err(ApiError::Connectivity("connection refused".to_string()));
		}
		state.calls.push(call);
		Ok(state)
	}
}

#[async_trait]
impl InventoryApi for FakeInventoryApi {
	async fn list_equipment(&self, query: Option<&str>) -> Result<Vec<Equipment>, ApiError> {
		let state = self.begin(format!("list {}", query.unwrap_or("")))?;
		if let Some(status) = state.list_status {
			return Err(ApiError::from_status(status, "listing failed".to_string()));
		}
		let needle = query.map(str::to_lowercase);
		let mut records: Vec<Equipment> = state
			.records
			.values()
			.filter(|r| needle.as_deref().map_or(true, |n| r.matches_query(n)))
			.cloned()
			.collect();
		records.reverse();
		Ok(records)
	}

	async fn create_equipment(&self, record: &NewEquipment) -> Result<CreatedEquipment, ApiError> {
		let mut state = self.begin(format!("create {}", record.name))?;
		if state.failing_names.contains(&record.name) {
			return Err(ApiError::from_status(
				StatusCode::INTERNAL_SERVER_ERROR,
				"insert failed".to_string(),
			));
		}
		let id = state.next_id;
		state.next_id += 1;
		state
			.records
			.insert(id, record.clone().into_record(EquipmentId::Server(id)));
		Ok(CreatedEquipment {
			id: (!state.omit_created_ids).then_some(id),
		})
	}

	async fn update_equipment(&self, patch: &EquipmentPatch) -> Result<(), ApiError> {
		let mut state = self.begin(format!("update {}", patch.id))?;
		let record = patch
			.id
			.server_id()
			.and_then(|id| state.records.get_mut(&id))
			.ok_or_else(|| ApiError::from_status(StatusCode::NOT_FOUND, "no such equipment".to_string()))?;
		patch.apply_to(record);
		Ok(())
	}

	async fn delete_equipment(&self, id: &EquipmentId) -> Result<(), ApiError> {
		let mut state = self.begin(format!("delete {id}"))?;
		if let Some(id) = id.server_id() {
			state.records.remove(&id);
		}
		Ok(())
	}

	async fn is_reachable(&self) -> bool {
		!self.state.lock().unwrap().offline
	}
}
