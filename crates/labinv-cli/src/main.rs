// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! labinv - offline-first laboratory inventory client
//!
//! Reads are served from the backend when it answers and from the local
//! mirror when it does not. Writes made while offline wait in a local queue
//! and replay in order once the backend is reachable again.

mod app;
mod auth;
mod commands;
mod fields;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use labinv_cli_config::{load_config_with_cli, CliOverrides, LogFormat};
use labinv_inventory::{EquipmentId, InventoryError};

use crate::app::App;
use crate::fields::EquipmentFields;

#[derive(Parser, Debug)]
#[command(name = "labinv", version, about, long_about = None)]
struct Args {
	/// Path to a configuration file layered over the user config
	#[arg(short, long, global = true)]
	config: Option<PathBuf>,

	/// Inventory server base URL (overrides config)
	#[arg(long, global = true, env = "LABINV_SERVER_URL")]
	server_url: Option<String>,

	/// Offline database path (overrides config)
	#[arg(long, global = true, env = "LABINV_DATABASE")]
	database: Option<PathBuf>,

	/// Log level (overrides config)
	#[arg(short, long, global = true)]
	log_level: Option<String>,

	/// Output logs as JSON (overrides config)
	#[arg(long, global = true)]
	json_logs: bool,

	#[command(subcommand)]
	command: Command,
}

impl From<&Args> for CliOverrides {
	fn from(args: &Args) -> Self {
		CliOverrides {
			server_url: args.server_url.clone(),
			database: args.database.clone(),
			log_level: args.log_level.clone(),
			log_format: args.json_logs.then(|| "json".to_string()),
			config_file: args.config.clone(),
		}
	}
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Create an account on the inventory server
	Register {
		#[arg(long)]
		name: String,
		#[arg(long)]
		email: String,
		/// Read from LABINV_PASSWORD or prompted when omitted
		#[arg(long, env = "LABINV_PASSWORD", hide_env_values = true)]
		password: Option<String>,
	},
	/// Sign in and keep the session for later commands
	Login {
		#[arg(long)]
		email: String,
		#[arg(long, env = "LABINV_PASSWORD", hide_env_values = true)]
		password: Option<String>,
	},
	/// End the session on the server and forget it locally
	Logout,
	/// Show who the stored session belongs to
	Whoami,
	/// List equipment, from the server when reachable
	List {
		/// Case-insensitive match on name or description
		#[arg(short, long)]
		query: Option<String>,
		#[arg(long)]
		json: bool,
	},
	/// Add equipment
	Add {
		/// Submit the saved draft, with any fields given here layered on top
		#[arg(long)]
		from_draft: bool,
		#[command(flatten)]
		fields: EquipmentFields,
	},
	/// Change fields of existing equipment
	Update {
		id: EquipmentId,
		#[command(flatten)]
		fields: EquipmentFields,
	},
	/// Remove equipment
	Delete { id: EquipmentId },
	/// Replay queued changes now
	Sync,
	/// Show connectivity, queue length and session
	Status,
	/// List changes waiting to be sent
	Queue {
		#[arg(long)]
		json: bool,
	},
	/// Work with the unsaved equipment form
	Draft {
		#[command(subcommand)]
		command: DraftCommand,
	},
	/// Stay running and sync whenever the server comes back
	Watch,
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
	/// Merge fields into the saved draft
	Save {
		/// Make the draft an edit of existing equipment
		#[arg(long)]
		editing: Option<EquipmentId>,
		#[command(flatten)]
		fields: EquipmentFields,
	},
	/// Print the saved draft
	Show,
	/// Discard the saved draft
	Clear,
}

impl Command {
	/// Commands that talk to the backend replay the queue first.
	fn drains_on_start(&self) -> bool {
		matches!(
			self,
			Command::List { .. } | Command::Add { .. } | Command::Update { .. } | Command::Delete { .. }
		)
	}
}

fn init_tracing(logging: &labinv_cli_config::runtime::LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		let level = logging.level.as_filter_str();
		EnvFilter::new(format!("labinv={level},labinv_inventory={level},labinv_cli_config={level}"))
	});

	match logging.format {
		LogFormat::Json => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().json().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Compact => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().compact().with_writer(std::io::stderr))
				.init();
		}
		LogFormat::Pretty => {
			tracing_subscriber::registry()
				.with(filter)
				.with(fmt::layer().pretty().with_writer(std::io::stderr))
				.init();
		}
	}
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();

	match run(args).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			if is_auth_error(&e) {
				eprintln!("error: {e}");
				eprintln!("Your session is missing or expired. Run `labinv login` first.");
				ExitCode::from(2)
			} else {
				eprintln!("error: {e:#}");
				ExitCode::FAILURE
			}
		}
	}
}

fn is_auth_error(err: &anyhow::Error) -> bool {
	err.chain().any(|cause| {
		cause
			.downcast_ref::<InventoryError>()
			.is_some_and(InventoryError::is_auth)
			|| cause
				.downcast_ref::<labinv_inventory::ApiError>()
				.is_some_and(labinv_inventory::ApiError::is_auth)
	})
}

async fn run(args: Args) -> Result<()> {
	let config = load_config_with_cli(CliOverrides::from(&args)).context("failed to load configuration")?;

	init_tracing(&config.logging);

	info!(
		server = %config.server.base_url,
		database = %config.storage.database_path.display(),
		"starting labinv"
	);

	let app = App::open(config).await?;

	if args.command.drains_on_start() && app.config.sync.drain_on_start {
		match app.coordinator.start().await {
			Ok(Some(report)) => render::print_drain_summary(&report),
			Ok(None) => debug!("server unreachable, skipping startup sync"),
			Err(e) if e.is_auth() => return finish(app, Err(e.into())).await,
			Err(e) => render::warn_line(&format!("could not sync queued changes: {e}")),
		}
	}

	let result = dispatch(&app, args.command).await;
	finish(app, result).await
}

async fn dispatch(app: &App, command: Command) -> Result<()> {
	match command {
		Command::Register {
			name,
			email,
			password,
		} => auth::register(app, name, email, password).await,
		Command::Login { email, password } => auth::login(app, email, password).await,
		Command::Logout => auth::logout(app).await,
		Command::Whoami => auth::whoami(app).await,
		Command::List { query, json } => commands::list(app, query.as_deref(), json).await,
		Command::Add { from_draft, fields } => commands::add(app, from_draft, fields).await,
		Command::Update { id, fields } => commands::update(app, id, fields).await,
		Command::Delete { id } => commands::delete(app, id).await,
		Command::Sync => commands::sync(app).await,
		Command::Status => commands::status(app).await,
		Command::Queue { json } => commands::queue(app, json).await,
		Command::Draft { command } => match command {
			DraftCommand::Save { editing, fields } => commands::draft_save(app, editing, fields).await,
			DraftCommand::Show => commands::draft_show(app).await,
			DraftCommand::Clear => commands::draft_clear(app).await,
		},
		Command::Watch => commands::watch(app).await,
	}
}

/// Persists the session cookie and closes the database whatever the outcome.
async fn finish(app: App, result: Result<()>) -> Result<()> {
	let persisted = app.persist_session().await;
	app.close().await;
	result.and(persisted)
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn global_flags_become_overrides() {
		let args = Args::try_parse_from([
			"labinv",
			"list",
			"--server-url",
			"http://lab.local/",
			"--json-logs",
			"--config",
			"/tmp/labinv.toml",
		])
		.unwrap();

		let overrides = CliOverrides::from(&args);
		assert_eq!(overrides.server_url.as_deref(), Some("http://lab.local/"));
		assert_eq!(overrides.log_format.as_deref(), Some("json"));
		assert_eq!(overrides.config_file, Some(PathBuf::from("/tmp/labinv.toml")));
	}

	#[test]
	fn update_parses_server_and_temporary_ids() {
		let args = Args::try_parse_from(["labinv", "update", "42", "--status", "Ocupado"]).unwrap();
		let Command::Update { id, fields } = args.command else {
			panic!("expected update");
		};
		assert_eq!(id, EquipmentId::Server(42));
		assert!(fields.status.is_some());

		let args = Args::try_parse_from(["labinv", "delete", "temp_1700000000000"]).unwrap();
		assert!(matches!(args.command, Command::Delete { id } if id.is_temporary()));
	}

	#[test]
	fn only_backend_commands_drain_on_start() {
		let list = Args::try_parse_from(["labinv", "list"]).unwrap();
		assert!(list.command.drains_on_start());

		let status = Args::try_parse_from(["labinv", "status"]).unwrap();
		assert!(!status.command.drains_on_start());

		let sync = Args::try_parse_from(["labinv", "sync"]).unwrap();
		assert!(!sync.command.drains_on_start());
	}

	#[test]
	fn auth_errors_are_detected_through_context() {
		let err = InventoryError::from(labinv_inventory::ApiError::Unauthenticated(
			"No autorizado".to_string(),
		));
		let err = anyhow::Error::new(err).context("failed to list equipment");
		assert!(is_auth_error(&err));

		let err = anyhow::anyhow!("disk full");
		assert!(!is_auth_error(&err));
	}
}
