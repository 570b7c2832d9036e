// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Inventory, sync and draft subcommands.

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use labinv_inventory::{
	Connectivity, ConnectivityMonitor, DraftSubmission, EquipmentId, InventoryApi,
};

use crate::app::App;
use crate::fields::EquipmentFields;
use crate::render;

#[instrument(skip(app))]
pub async fn list(app: &App, query: Option<&str>, as_json: bool) -> Result<()> {
	let query = query.map(str::trim).filter(|q| !q.is_empty());
	let result = app
		.coordinator
		.load(query)
		.await
		.context("failed to list equipment")?;
	render::print_records(&result, as_json)
}

#[instrument(skip(app, fields))]
pub async fn add(app: &App, from_draft: bool, fields: EquipmentFields) -> Result<()> {
	if !from_draft {
		let outcome = app
			.coordinator
			.create(fields.into_new_equipment())
			.await
			.context("failed to add equipment")?;
		println!("{}", render::describe_outcome("Added", &outcome));
		return Ok(());
	}

	let drafts = app.db.drafts();
	let mut draft = drafts.load().await?.unwrap_or_default();
	draft.merge(fields.into_draft(None));

	let outcome = match draft.into_submission().context("draft is incomplete")? {
		DraftSubmission::Create(record) => {
			let outcome = app.coordinator.create(record).await.context("failed to add equipment")?;
			render::describe_outcome("Added", &outcome)
		}
		DraftSubmission::Update(patch) => {
			let outcome = app
				.coordinator
				.update(patch)
				.await
				.context("failed to update equipment")?;
			render::describe_outcome("Updated", &outcome)
		}
	};

	drafts.clear().await?;
	println!("{outcome}");
	Ok(())
}

#[instrument(skip(app, fields), fields(id = %id))]
pub async fn update(app: &App, id: EquipmentId, fields: EquipmentFields) -> Result<()> {
	let outcome = app
		.coordinator
		.update(fields.into_patch(id))
		.await
		.context("failed to update equipment")?;
	println!("{}", render::describe_outcome("Updated", &outcome));
	Ok(())
}

#[instrument(skip(app), fields(id = %id))]
pub async fn delete(app: &App, id: EquipmentId) -> Result<()> {
	let outcome = app
		.coordinator
		.delete(id)
		.await
		.context("failed to delete equipment")?;
	println!("{}", render::describe_outcome("Deleted", &outcome));
	Ok(())
}

#[instrument(skip(app))]
pub async fn sync(app: &App) -> Result<()> {
	match app.coordinator.start().await.context("sync failed")? {
		Some(report) => {
			println!("{}", render::describe_drain(&report));
			if report.remaining > 0 {
				println!("{} change(s) still queued. See `labinv queue`.", report.remaining);
			}
		}
		None => {
			let pending = app.coordinator.pending_count().await?;
			println!("Server unreachable. {pending} change(s) still queued.");
		}
	}
	Ok(())
}

#[instrument(skip(app))]
pub async fn status(app: &App) -> Result<()> {
	let connectivity = Connectivity::from_reachable(app.client.is_reachable().await);
	let kv = app.db.kv();
	let pending = app.coordinator.pending_count().await?;
	let mirrored = app.coordinator.mirror().len().await?;

	println!("Server:      {} ({connectivity})", app.client.endpoint());
	println!("Database:    {}", app.config.storage.database_path.display());
	match kv.session_email().await? {
		Some(email) => println!("Session:     {email}"),
		None => println!("Session:     none"),
	}
	println!("Local copy:  {mirrored} record(s)");
	match kv.last_full_fetch().await? {
		Some(at) => println!("Last fetch:  {}", at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")),
		None => println!("Last fetch:  never"),
	}
	println!("Pending:     {pending} change(s)");
	if app.db.drafts().load().await?.is_some() {
		println!("Draft:       saved (see `labinv draft show`)");
	}
	Ok(())
}

#[instrument(skip(app))]
pub async fn queue(app: &App, as_json: bool) -> Result<()> {
	let entries = app.coordinator.queue().entries().await?;

	if as_json {
		println!("{}", serde_json::to_string_pretty(&render::queue_json(&entries))?);
	} else if entries.is_empty() {
		println!("No changes waiting to sync.");
	} else {
		print!("{}", render::format_queue(&entries));
	}
	Ok(())
}

#[instrument(skip(app, fields))]
pub async fn draft_save(app: &App, editing: Option<EquipmentId>, fields: EquipmentFields) -> Result<()> {
	let draft = app
		.db
		.drafts()
		.update(fields.into_draft(editing))
		.await
		.context("failed to save draft")?;
	println!("{}", serde_json::to_string_pretty(&draft)?);
	Ok(())
}

pub async fn draft_show(app: &App) -> Result<()> {
	match app.db.drafts().load().await? {
		Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
		None => println!("No saved draft."),
	}
	Ok(())
}

pub async fn draft_clear(app: &App) -> Result<()> {
	if app.db.drafts().clear().await? {
		println!("Draft discarded.");
	} else {
		println!("No saved draft.");
	}
	Ok(())
}

/// Syncs now, then again on every offline to online transition until
/// interrupted.
#[instrument(skip(app))]
pub async fn watch(app: &App) -> Result<()> {
	let monitor = ConnectivityMonitor::new(app.api(), app.config.sync.probe_interval);
	let initial = monitor.probe().await;

	if initial.is_online() {
		match app.coordinator.on_connectivity_restored().await {
			Ok(report) => render::print_drain_summary(&report),
			Err(e) if e.is_auth() => return Err(e.into()),
			Err(e) => warn!(error = %e, "initial sync failed"),
		}
	}

	info!(connectivity = %initial, "watching for connectivity changes");
	eprintln!("Watching {} ({initial}). Press Ctrl-C to stop.", app.client.endpoint());

	let (rx, handle) = monitor.spawn(initial);

	tokio::select! {
		_ = app.coordinator.follow_connectivity(rx) => {}
		result = tokio::signal::ctrl_c() => {
			result.context("failed to listen for Ctrl-C")?;
			info!("interrupted, stopping watch");
		}
	}

	handle.abort();
	let pending = app.coordinator.pending_count().await?;
	if pending > 0 {
		eprintln!("{pending} change(s) still queued.");
	}
	Ok(())
}
