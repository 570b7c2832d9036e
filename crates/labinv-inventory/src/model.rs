// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Equipment records and the mutations that change them.
//!
//! Wire field names (`nombre`, `estado`, ...) are the backend's; the Rust
//! names are ours.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EquipmentIdError, ValidationError};

/// Prefix marking an id that was minted locally and not yet confirmed.
pub const TEMP_ID_PREFIX: &str = "temp_";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdOrigin {
	Server,
	Temporary,
}

/// Identity of an equipment record.
///
/// The backend sends ids as numbers or numeric strings depending on the
/// endpoint, so both decode to [`EquipmentId::Server`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EquipmentId {
	Server(i64),
	Temporary(String),
}

impl EquipmentId {
	pub fn temporary(created_at_ms: i64) -> Self {
		Self::Temporary(format!("{TEMP_ID_PREFIX}{created_at_ms}"))
	}

	pub fn parse(raw: &str) -> Result<Self, EquipmentIdError> {
		let raw = raw.trim();
		if let Some(suffix) = raw.strip_prefix(TEMP_ID_PREFIX) {
			if suffix.is_empty() {
				return Err(EquipmentIdError::EmptyTemporary);
			}
			return Ok(Self::Temporary(raw.to_string()));
		}
		raw.parse::<i64>()
			.map(Self::Server)
			.map_err(|_| EquipmentIdError::Invalid(raw.to_string()))
	}

	pub fn origin(&self) -> IdOrigin {
		match self {
			Self::Server(_) => IdOrigin::Server,
			Self::Temporary(_) => IdOrigin::Temporary,
		}
	}

	pub fn is_temporary(&self) -> bool {
		self.origin() == IdOrigin::Temporary
	}

	pub fn server_id(&self) -> Option<i64> {
		match self {
			Self::Server(id) => Some(*id),
			Self::Temporary(_) => None,
		}
	}

	/// Millisecond timestamp embedded in a temporary id.
	pub fn temporary_timestamp(&self) -> Option<i64> {
		match self {
			Self::Temporary(raw) => raw.strip_prefix(TEMP_ID_PREFIX)?.parse().ok(),
			Self::Server(_) => None,
		}
	}
}

impl fmt::Display for EquipmentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Server(id) => write!(f, "{id}"),
			Self::Temporary(raw) => f.write_str(raw),
		}
	}
}

impl FromStr for EquipmentId {
	type Err = EquipmentIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}

impl Serialize for EquipmentId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Server(id) => serializer.serialize_i64(*id),
			Self::Temporary(raw) => serializer.serialize_str(raw),
		}
	}
}

struct EquipmentIdVisitor;

impl<'de> Visitor<'de> for EquipmentIdVisitor {
	type Value = EquipmentId;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("an integer id, a numeric string or a temp_ id")
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
		Ok(EquipmentId::Server(v))
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
		i64::try_from(v)
			.map(EquipmentId::Server)
			.map_err(|_| E::custom(format!("id {v} out of range")))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
		EquipmentId::parse(v).map_err(E::custom)
	}
}

impl<'de> Deserialize<'de> for EquipmentId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(EquipmentIdVisitor)
	}
}

/// Display order for listings: local-only records first, newest first, then
/// server records by descending id.
pub fn display_order(a: &EquipmentId, b: &EquipmentId) -> Ordering {
	match (a, b) {
		(EquipmentId::Temporary(_), EquipmentId::Server(_)) => Ordering::Less,
		(EquipmentId::Server(_), EquipmentId::Temporary(_)) => Ordering::Greater,
		(EquipmentId::Server(x), EquipmentId::Server(y)) => y.cmp(x),
		(EquipmentId::Temporary(_), EquipmentId::Temporary(_)) => b
			.temporary_timestamp()
			.cmp(&a.temporary_timestamp())
			.then_with(|| b.to_string().cmp(&a.to_string())),
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentStatus {
	#[default]
	#[serde(rename = "Disponible")]
	Available,
	#[serde(rename = "Ocupado")]
	InUse,
	#[serde(rename = "Mantenimiento")]
	Maintenance,
}

impl EquipmentStatus {
	pub const ALL: [EquipmentStatus; 3] = [Self::Available, Self::InUse, Self::Maintenance];

	/// The value the backend stores.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Available => "Disponible",
			Self::InUse => "Ocupado",
			Self::Maintenance => "Mantenimiento",
		}
	}
}

impl fmt::Display for EquipmentStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for EquipmentStatus {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"disponible" | "available" => Ok(Self::Available),
			"ocupado" | "in-use" | "in_use" | "busy" => Ok(Self::InUse),
			"mantenimiento" | "maintenance" => Ok(Self::Maintenance),
			_ => Err(ValidationError::InvalidValue {
				field: "estado",
				message: format!("unknown status '{s}'"),
			}),
		}
	}
}

/// Optional descriptive fields shared by records, creates and patches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentAttributes {
	#[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(rename = "numero_serie", default, skip_serializing_if = "Option::is_none")]
	pub serial_number: Option<String>,
	#[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	#[serde(
		rename = "cantidad",
		default,
		deserialize_with = "lenient_quantity",
		skip_serializing_if = "Option::is_none"
	)]
	pub quantity: Option<u32>,
	#[serde(rename = "imagen", default, skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
}

impl EquipmentAttributes {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// Overwrites every field that `other` sets.
	pub fn merge_from(&mut self, other: &EquipmentAttributes) {
		if let Some(v) = &other.category {
			self.category = Some(v.clone());
		}
		if let Some(v) = &other.serial_number {
			self.serial_number = Some(v.clone());
		}
		if let Some(v) = &other.location {
			self.location = Some(v.clone());
		}
		if let Some(v) = other.quantity {
			self.quantity = Some(v);
		}
		if let Some(v) = &other.image {
			self.image = Some(v.clone());
		}
	}
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Number(u32),
		Text(String),
	}

	match Option::<Raw>::deserialize(deserializer)? {
		None => Ok(None),
		Some(Raw::Number(n)) => Ok(Some(n)),
		Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
		Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
	}
}

/// One physical item or batch tracked by the lab.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
	pub id: EquipmentId,
	#[serde(rename = "nombre")]
	pub name: String,
	#[serde(rename = "descripcion", default, deserialize_with = "null_as_empty")]
	pub description: String,
	#[serde(rename = "estado", default)]
	pub status: EquipmentStatus,
	#[serde(flatten)]
	pub attributes: EquipmentAttributes,
}

impl Equipment {
	/// Case-insensitive substring match on name or description.
	///
	/// `needle` must already be lowercased.
	pub fn matches_query(&self, needle: &str) -> bool {
		self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
	}
}

/// Body of an `add_equipo` request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEquipment {
	#[serde(rename = "nombre")]
	pub name: String,
	#[serde(rename = "descripcion", default)]
	pub description: String,
	#[serde(rename = "estado", default)]
	pub status: EquipmentStatus,
	#[serde(flatten)]
	pub attributes: EquipmentAttributes,
}

impl NewEquipment {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			description: String::new(),
			status: EquipmentStatus::default(),
			attributes: EquipmentAttributes::default(),
		}
	}

	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.name.trim().is_empty() {
			return Err(ValidationError::MissingField("nombre"));
		}
		Ok(())
	}

	pub fn into_record(self, id: EquipmentId) -> Equipment {
		Equipment {
			id,
			name: self.name,
			description: self.description,
			status: self.status,
			attributes: self.attributes,
		}
	}
}

/// Body of an `update_equipo` request. Only set fields change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPatch {
	pub id: EquipmentId,
	#[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
	pub status: Option<EquipmentStatus>,
	#[serde(flatten)]
	pub attributes: EquipmentAttributes,
}

impl EquipmentPatch {
	pub fn new(id: EquipmentId) -> Self {
		Self {
			id,
			name: None,
			description: None,
			status: None,
			attributes: EquipmentAttributes::default(),
		}
	}

	pub fn with_status(mut self, status: EquipmentStatus) -> Self {
		self.status = Some(status);
		self
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.description.is_none()
			&& self.status.is_none()
			&& self.attributes.is_empty()
	}

	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.is_empty() {
			return Err(ValidationError::EmptyUpdate);
		}
		if matches!(&self.name, Some(name) if name.trim().is_empty()) {
			return Err(ValidationError::MissingField("nombre"));
		}
		Ok(())
	}

	pub fn apply_to(&self, record: &mut Equipment) {
		if let Some(name) = &self.name {
			record.name = name.clone();
		}
		if let Some(description) = &self.description {
			record.description = description.clone();
		}
		if let Some(status) = self.status {
			record.status = status;
		}
		record.attributes.merge_from(&self.attributes);
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
	Create,
	Update,
	Delete,
}

impl MutationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Create => "create",
			Self::Update => "update",
			Self::Delete => "delete",
		}
	}
}

impl fmt::Display for MutationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A write against the inventory, as replayed from the sync queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum Mutation {
	Create {
		temp_id: EquipmentId,
		record: NewEquipment,
	},
	Update(EquipmentPatch),
	Delete {
		id: EquipmentId,
	},
}

impl Mutation {
	pub fn kind(&self) -> MutationKind {
		match self {
			Self::Create { .. } => MutationKind::Create,
			Self::Update(_) => MutationKind::Update,
			Self::Delete { .. } => MutationKind::Delete,
		}
	}

	/// The record this mutation touches. For creates, the temporary id.
	pub fn target(&self) -> &EquipmentId {
		match self {
			Self::Create { temp_id, .. } => temp_id,
			Self::Update(patch) => &patch.id,
			Self::Delete { id } => id,
		}
	}

	/// Temporary id an update or delete still waits on.
	pub fn unresolved_dependency(&self) -> Option<&EquipmentId> {
		match self {
			Self::Create { .. } => None,
			Self::Update(_) | Self::Delete { .. } => Some(self.target()).filter(|id| id.is_temporary()),
		}
	}

	/// Points an update or delete at `to` if it targets `from`.
	pub fn retarget(&mut self, from: &EquipmentId, to: &EquipmentId) -> bool {
		let id = match self {
			Self::Create { .. } => return false,
			Self::Update(patch) => &mut patch.id,
			Self::Delete { id } => id,
		};
		if id != from {
			return false;
		}
		*id = to.clone();
		true
	}
}

/// Unsaved form input, kept locally between sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDraft {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub editing: Option<EquipmentId>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<EquipmentStatus>,
	#[serde(default)]
	pub attributes: EquipmentAttributes,
}

/// What a draft turns into on submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftSubmission {
	Create(NewEquipment),
	Update(EquipmentPatch),
}

impl EquipmentDraft {
	pub fn is_empty(&self) -> bool {
		self == &Self::default()
	}

	/// Layers `newer` on top of this draft.
	pub fn merge(&mut self, newer: EquipmentDraft) {
		if newer.editing.is_some() {
			self.editing = newer.editing;
		}
		if newer.name.is_some() {
			self.name = newer.name;
		}
		if newer.description.is_some() {
			self.description = newer.description;
		}
		if newer.status.is_some() {
			self.status = newer.status;
		}
		self.attributes.merge_from(&newer.attributes);
	}

	pub fn into_submission(self) -> Result<DraftSubmission, ValidationError> {
		match self.editing {
			Some(id) => {
				let patch = EquipmentPatch {
					id,
					name: self.name,
					description: self.description,
					status: self.status,
					attributes: self.attributes,
				};
				patch.validate()?;
				Ok(DraftSubmission::Update(patch))
			}
			None => {
				let record = NewEquipment {
					name: self.name.unwrap_or_default(),
					description: self.description.unwrap_or_default(),
					status: self.status.unwrap_or_default(),
					attributes: self.attributes,
				};
				record.validate()?;
				Ok(DraftSubmission::Create(record))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	#[test]
	fn ids_decode_from_numbers_strings_and_temp() {
		let id: EquipmentId = serde_json::from_value(json!(42)).unwrap();
		assert_eq!(id, EquipmentId::Server(42));

		let id: EquipmentId = serde_json::from_value(json!("42")).unwrap();
		assert_eq!(id, EquipmentId::Server(42));

		let id: EquipmentId = serde_json::from_value(json!("temp_1700000000000")).unwrap();
		assert_eq!(id, EquipmentId::Temporary("temp_1700000000000".to_string()));
		assert_eq!(id.temporary_timestamp(), Some(1_700_000_000_000));
	}

	#[test]
	fn ids_reject_garbage() {
		assert!(serde_json::from_value::<EquipmentId>(json!("abc")).is_err());
		assert_eq!(EquipmentId::parse("temp_"), Err(EquipmentIdError::EmptyTemporary));
		assert!(serde_json::from_value::<EquipmentId>(json!(null)).is_err());
	}

	#[test]
	fn server_ids_serialize_as_numbers() {
		assert_eq!(serde_json::to_value(EquipmentId::Server(7)).unwrap(), json!(7));
		assert_eq!(
			serde_json::to_value(EquipmentId::temporary(5)).unwrap(),
			json!("temp_5")
		);
	}

	#[test]
	fn equipment_decodes_backend_row() {
		let row = json!({
			"id": "12",
			"nombre": "Osciloscopio",
			"descripcion": null,
			"estado": "Ocupado",
			"categoria": "Electrónica",
			"cantidad": "3",
			"imagen": null
		});
		let record: Equipment = serde_json::from_value(row).unwrap();
		assert_eq!(record.id, EquipmentId::Server(12));
		assert_eq!(record.description, "");
		assert_eq!(record.status, EquipmentStatus::InUse);
		assert_eq!(record.attributes.category.as_deref(), Some("Electrónica"));
		assert_eq!(record.attributes.quantity, Some(3));
		assert_eq!(record.attributes.image, None);
	}

	#[test]
	fn new_equipment_uses_backend_field_names() {
		let mut record = NewEquipment::new("Microscopio");
		record.attributes.location = Some("Lab 2".to_string());
		let body = serde_json::to_value(&record).unwrap();
		assert_eq!(
			body,
			json!({
				"nombre": "Microscopio",
				"descripcion": "",
				"estado": "Disponible",
				"ubicacion": "Lab 2"
			})
		);
	}

	#[test]
	fn new_equipment_requires_name() {
		assert_eq!(
			NewEquipment::new("   ").validate(),
			Err(ValidationError::MissingField("nombre"))
		);
		assert!(NewEquipment::new("Balanza").validate().is_ok());
	}

	#[test]
	fn patch_serializes_only_set_fields() {
		let patch = EquipmentPatch::new(EquipmentId::Server(3)).with_status(EquipmentStatus::Maintenance);
		assert_eq!(
			serde_json::to_value(&patch).unwrap(),
			json!({"id": 3, "estado": "Mantenimiento"})
		);
	}

	#[test]
	fn patch_validation() {
		assert_eq!(
			EquipmentPatch::new(EquipmentId::Server(1)).validate(),
			Err(ValidationError::EmptyUpdate)
		);
		assert_eq!(
			EquipmentPatch::new(EquipmentId::Server(1)).with_name(" ").validate(),
			Err(ValidationError::MissingField("nombre"))
		);
	}

	#[test]
	fn patch_applies_over_record() {
		let mut record = NewEquipment::new("Balanza").into_record(EquipmentId::Server(1));
		record.attributes.location = Some("Lab 1".to_string());

		let mut patch = EquipmentPatch::new(EquipmentId::Server(1)).with_status(EquipmentStatus::InUse);
		patch.attributes.quantity = Some(2);
		patch.apply_to(&mut record);

		assert_eq!(record.status, EquipmentStatus::InUse);
		assert_eq!(record.attributes.quantity, Some(2));
		assert_eq!(record.attributes.location.as_deref(), Some("Lab 1"));
		assert_eq!(record.name, "Balanza");
	}

	#[test]
	fn status_parses_spanish_and_english() {
		assert_eq!("Disponible".parse::<EquipmentStatus>().unwrap(), EquipmentStatus::Available);
		assert_eq!("maintenance".parse::<EquipmentStatus>().unwrap(), EquipmentStatus::Maintenance);
		assert_eq!("in-use".parse::<EquipmentStatus>().unwrap(), EquipmentStatus::InUse);
		assert!("roto".parse::<EquipmentStatus>().is_err());
	}

	#[test]
	fn mutation_retarget_only_touches_matching_updates_and_deletes() {
		let temp = EquipmentId::temporary(10);
		let server = EquipmentId::Server(99);

		let mut update = Mutation::Update(EquipmentPatch::new(temp.clone()).with_name("x"));
		assert_eq!(update.unresolved_dependency(), Some(&temp));
		assert!(update.retarget(&temp, &server));
		assert_eq!(update.target(), &server);
		assert_eq!(update.unresolved_dependency(), None);

		let mut create = Mutation::Create {
			temp_id: temp.clone(),
			record: NewEquipment::new("x"),
		};
		assert!(!create.retarget(&temp, &server));
		assert_eq!(create.target(), &temp);

		let mut other = Mutation::Delete {
			id: EquipmentId::temporary(11),
		};
		assert!(!other.retarget(&temp, &server));
	}

	#[test]
	fn mutation_serializes_with_action_tag() {
		let mutation = Mutation::Delete {
			id: EquipmentId::Server(4),
		};
		let value = serde_json::to_value(&mutation).unwrap();
		assert_eq!(value, json!({"action": "delete", "payload": {"id": 4}}));
		let back: Mutation = serde_json::from_value(value).unwrap();
		assert_eq!(back, mutation);
	}

	#[test]
	fn display_order_puts_newest_temporary_first() {
		let mut ids = vec![
			EquipmentId::Server(2),
			EquipmentId::temporary(100),
			EquipmentId::Server(9),
			EquipmentId::temporary(200),
		];
		ids.sort_by(display_order);
		assert_eq!(
			ids,
			vec![
				EquipmentId::temporary(200),
				EquipmentId::temporary(100),
				EquipmentId::Server(9),
				EquipmentId::Server(2),
			]
		);
	}

	#[test]
	fn draft_without_target_becomes_create() {
		let draft = EquipmentDraft {
			name: Some("Pipeta".to_string()),
			..Default::default()
		};
		match draft.into_submission().unwrap() {
			DraftSubmission::Create(record) => {
				assert_eq!(record.name, "Pipeta");
				assert_eq!(record.status, EquipmentStatus::Available);
			}
			other => panic!("expected create, got {other:?}"),
		}
	}

	#[test]
	fn draft_with_target_becomes_update() {
		let draft = EquipmentDraft {
			editing: Some(EquipmentId::Server(8)),
			status: Some(EquipmentStatus::InUse),
			..Default::default()
		};
		assert!(matches!(
			draft.into_submission().unwrap(),
			DraftSubmission::Update(patch) if patch.id == EquipmentId::Server(8)
		));
	}

	#[test]
	fn draft_merge_keeps_earlier_fields() {
		let mut draft = EquipmentDraft {
			name: Some("Pipeta".to_string()),
			..Default::default()
		};
		draft.merge(EquipmentDraft {
			description: Some("10 ml".to_string()),
			..Default::default()
		});
		assert_eq!(draft.name.as_deref(), Some("Pipeta"));
		assert_eq!(draft.description.as_deref(), Some("10 ml"));
	}

	proptest! {
		/// **Property: any id survives a trip through its text form**
		#[test]
		fn id_text_form_is_stable(n in any::<i64>(), ms in 0i64..i64::MAX) {
			let server = EquipmentId::Server(n);
			prop_assert_eq!(EquipmentId::parse(&server.to_string()).unwrap(), server);

			let temp = EquipmentId::temporary(ms);
			prop_assert!(temp.is_temporary());
			prop_assert_eq!(temp.temporary_timestamp(), Some(ms));
			prop_assert_eq!(EquipmentId::parse(&temp.to_string()).unwrap(), temp);
		}

		/// **Property: queries match regardless of case**
		#[test]
		fn query_matching_ignores_case(name in "[a-zA-Z]{1,12}") {
			let record = NewEquipment::new(name.clone()).into_record(EquipmentId::Server(1));
			prop_assert!(record.matches_query(&name.to_lowercase()));
			prop_assert!(record.matches_query(&name.to_uppercase().to_lowercase()));
		}
	}
}
