// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Equipment form flags shared by `add`, `update` and `draft save`.

use labinv_inventory::{
	EquipmentAttributes, EquipmentDraft, EquipmentId, EquipmentPatch, EquipmentStatus, NewEquipment,
};

#[derive(clap::Args, Debug, Clone, Default)]
pub struct EquipmentFields {
	#[arg(short, long)]
	pub name: Option<String>,
	#[arg(short, long)]
	pub description: Option<String>,
	/// Disponible, Ocupado or Mantenimiento (English names accepted)
	#[arg(short, long)]
	pub status: Option<EquipmentStatus>,
	#[arg(long)]
	pub category: Option<String>,
	#[arg(long)]
	pub serial: Option<String>,
	#[arg(long)]
	pub location: Option<String>,
	#[arg(long)]
	pub quantity: Option<u32>,
	/// Image URL or path as stored by the server
	#[arg(long)]
	pub image: Option<String>,
}

impl EquipmentFields {
	fn attributes(&self) -> EquipmentAttributes {
		EquipmentAttributes {
			category: self.category.clone(),
			serial_number: self.serial.clone(),
			location: self.location.clone(),
			quantity: self.quantity,
			image: self.image.clone(),
		}
	}

	pub fn into_new_equipment(self) -> NewEquipment {
		let attributes = self.attributes();
		NewEquipment {
			name: self.name.unwrap_or_default(),
			description: self.description.unwrap_or_default(),
			status: self.status.unwrap_or_default(),
			attributes,
		}
	}

	pub fn into_patch(self, id: EquipmentId) -> EquipmentPatch {
		let attributes = self.attributes();
		EquipmentPatch {
			id,
			name: self.name,
			description: self.description,
			status: self.status,
			attributes,
		}
	}

	pub fn into_draft(self, editing: Option<EquipmentId>) -> EquipmentDraft {
		let attributes = self.attributes();
		EquipmentDraft {
			editing,
			name: self.name,
			description: self.description,
			status: self.status,
			attributes,
		}
	}
}
