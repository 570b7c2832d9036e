// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Terminal output for records, queue entries and sync results.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::json;

use labinv_inventory::{DrainReport, Equipment, LoadResult, Mutation, QueueEntry, SubmitOutcome};

const NAME_WIDTH: usize = 28;
const DESCRIPTION_WIDTH: usize = 36;

pub fn warn_line(message: &str) {
	eprintln!("warning: {message}");
}

/// Shortens `text` to at most `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
	if text.chars().count() <= width {
		return text.to_string();
	}
	if width <= 3 {
		return text.chars().take(width).collect();
	}
	let mut cut: String = text.chars().take(width - 3).collect();
	cut.push_str("...");
	cut
}

pub fn format_table(records: &[Equipment]) -> String {
	let mut out = String::new();
	let _ = writeln!(
		out,
		"{:<20} {:<NAME_WIDTH$} {:<14} {:<DESCRIPTION_WIDTH$}",
		"ID", "NAME", "STATUS", "DESCRIPTION"
	);
	let _ = writeln!(out, "{}", "-".repeat(20 + NAME_WIDTH + 14 + DESCRIPTION_WIDTH + 3));
	for record in records {
		let _ = writeln!(
			out,
			"{:<20} {:<NAME_WIDTH$} {:<14} {:<DESCRIPTION_WIDTH$}",
			record.id.to_string(),
			truncate(&record.name, NAME_WIDTH),
			record.status.as_str(),
			truncate(&record.description, DESCRIPTION_WIDTH)
		);
	}
	out
}

pub fn print_records(result: &LoadResult, as_json: bool) -> Result<()> {
	if as_json {
		let body = json!({
			"source": if result.is_offline() { "mirror" } else { "remote" },
			"pending": result.pending,
			"records": result.records,
		});
		println!("{}", serde_json::to_string_pretty(&body)?);
		return Ok(());
	}

	if result.is_offline() {
		warn_line("server unreachable, showing the local copy");
	}

	if result.records.is_empty() {
		println!("No equipment found.");
	} else {
		print!("{}", format_table(&result.records));
	}

	if result.pending > 0 {
		println!("\n{} change(s) waiting to sync.", result.pending);
	}
	Ok(())
}

pub fn describe_outcome(verb: &str, outcome: &SubmitOutcome) -> String {
	match outcome {
		SubmitOutcome::Synced { id: Some(id) } => format!("{verb} equipment {id}."),
		SubmitOutcome::Synced { id: None } => format!("{verb} equipment."),
		SubmitOutcome::Queued { id, .. } => {
			format!("{verb} equipment {id} locally; it will sync with the other queued changes.")
		}
	}
}

pub fn describe_drain(report: &DrainReport) -> String {
	if report.attempted == 0 && report.remaining == 0 && report.orphaned == 0 {
		return "Nothing to sync.".to_string();
	}

	let mut out = format!("Synced {} of {} queued change(s)", report.replayed, report.attempted);
	if report.reconciled > 0 {
		let _ = write!(out, ", {} new id(s) assigned", report.reconciled);
	}
	out.push('.');
	if report.failed > 0 {
		let _ = write!(out, " {} failed and will be retried.", report.failed);
	}
	if report.deferred > 0 {
		let _ = write!(out, " {} wait on an unsynced create.", report.deferred);
	}
	if report.orphaned > 0 {
		let _ = write!(
			out,
			" {} dropped: their record could not be found on the server.",
			report.orphaned
		);
	}
	out
}

pub fn print_drain_summary(report: &DrainReport) {
	if report.attempted > 0 || report.orphaned > 0 {
		eprintln!("{}", describe_drain(report));
	}
}

fn local_time(millis: i64) -> String {
	match Utc.timestamp_millis_opt(millis).single() {
		Some(at) => DateTime::<Local>::from(at).format("%Y-%m-%d %H:%M:%S").to_string(),
		None => millis.to_string(),
	}
}

pub fn format_queue(entries: &[QueueEntry]) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "{:<20} {:<8} {:<20} {}", "QUEUED", "ACTION", "TARGET", "DETAIL");
	for entry in entries {
		let detail = match &entry.mutation {
			Mutation::Create { record, .. } => truncate(&record.name, 40),
			mutation if mutation.unresolved_dependency().is_some() => "waits on create".to_string(),
			_ => String::new(),
		};
		let _ = writeln!(
			out,
			"{:<20} {:<8} {:<20} {}",
			local_time(entry.enqueued_at),
			entry.mutation.kind().as_str(),
			entry.mutation.target().to_string(),
			detail
		);
	}
	out
}

pub fn queue_json(entries: &[QueueEntry]) -> serde_json::Value {
	let rows: Vec<_> = entries
		.iter()
		.map(|entry| {
			json!({
				"enqueued_at": entry.enqueued_at,
				"mutation": entry.mutation,
			})
		})
		.collect();
	json!(rows)
}
