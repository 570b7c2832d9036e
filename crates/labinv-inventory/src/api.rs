// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Backend surface: the action names and the traits the sync layer calls.

use std::fmt;

use async_trait::async_trait;
use labinv_common_secret::SecretString;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;
use crate::model::{Equipment, EquipmentId, EquipmentPatch, NewEquipment};

/// Named operations of the single-endpoint backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiAction {
	ListEquipment,
	AddEquipment,
	UpdateEquipment,
	DeleteEquipment,
	Register,
	Login,
	Logout,
	CheckSession,
}

impl ApiAction {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::ListEquipment => "get_equipos",
			Self::AddEquipment => "add_equipo",
			Self::UpdateEquipment => "update_equipo",
			Self::DeleteEquipment => "delete_equipo",
			Self::Register => "register",
			Self::Login => "login",
			Self::Logout => "logout",
			Self::CheckSession => "check_session",
		}
	}
}

impl fmt::Display for ApiAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Response to `add_equipo`. Older backends omit the id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CreatedEquipment {
	#[serde(default, deserialize_with = "optional_server_id")]
	pub id: Option<i64>,
}

fn optional_server_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
	Ok(Option::<EquipmentId>::deserialize(deserializer)?.and_then(|id| id.server_id()))
}

#[derive(Clone, Debug)]
pub struct Credentials {
	pub email: String,
	pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct Registration {
	pub name: String,
	pub email: String,
	pub password: SecretString,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
	#[serde(default, deserialize_with = "optional_server_id")]
	pub id: Option<i64>,
	#[serde(default, alias = "nombre")]
	pub name: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStatus {
	pub logged_in: bool,
	pub user: Option<SessionUser>,
}

impl SessionStatus {
	pub fn logged_out() -> Self {
		Self::default()
	}

	/// Reads the loosely shaped `check_session` body.
	pub fn from_response(value: &Value) -> Self {
		let logged_in = ["logged_in", "loggedIn", "authenticated", "success"]
			.iter()
			.find_map(|key| value.get(*key).and_then(Value::as_bool))
			.unwrap_or(false);
		let user = value
			.get("user")
			.cloned()
			.and_then(|user| serde_json::from_value(user).ok());
		Self { logged_in, user }
	}
}

/// Equipment operations against the backend.
#[async_trait]
pub trait InventoryApi: Send + Sync {
	/// Full listing, or a server-side search when `query` is set.
	async fn list_equipment(&self, query: Option<&str>) -> Result<Vec<Equipment>, ApiError>;

	async fn create_equipment(&self, record: &NewEquipment) -> Result<CreatedEquipment, ApiError>;

	async fn update_equipment(&self, patch: &EquipmentPatch) -> Result<(), ApiError>;

	async fn delete_equipment(&self, id: &EquipmentId) -> Result<(), ApiError>;

	/// True if the backend answered at all, whatever the status.
	async fn is_reachable(&self) -> bool;
}

/// Account and session operations.
#[async_trait]
pub trait SessionApi: Send + Sync {
	async fn register(&self, registration: &Registration) -> Result<(), ApiError>;

	async fn login(&self, credentials: &Credentials) -> Result<Option<SessionUser>, ApiError>;

	async fn logout(&self) -> Result<(), ApiError>;

	async fn check_session(&self) -> Result<SessionStatus, ApiError>;
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn action_names_match_backend() {
		assert_eq!(ApiAction::ListEquipment.as_str(), "get_equipos");
		assert_eq!(ApiAction::DeleteEquipment.to_string(), "delete_equipo");
	}

	#[test]
	fn created_equipment_accepts_string_or_missing_id() {
		let created: CreatedEquipment = serde_json::from_value(json!({"success": true, "id": "15"})).unwrap();
		assert_eq!(created.id, Some(15));
		let created: CreatedEquipment = serde_json::from_value(json!({"success": true})).unwrap();
		assert_eq!(created.id, None);
	}

	#[test]
	fn session_status_reads_loose_shapes() {
		let status = SessionStatus::from_response(&json!({
			"logged_in": true,
			"user": {"id": 3, "nombre": "Ana", "email": "ana@lab.test"}
		}));
		assert!(status.logged_in);
		let user = status.user.unwrap();
		assert_eq!(user.id, Some(3));
		assert_eq!(user.name.as_deref(), Some("Ana"));

		assert!(!SessionStatus::from_response(&json!({"success": false})).logged_in);
		assert!(!SessionStatus::from_response(&Value::Null).logged_in);
	}
}
