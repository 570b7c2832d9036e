// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, instrument, warn};

use labinv_common_secret::SecretString;
use labinv_inventory::{Credentials, Registration, SessionApi};

use crate::app::App;

/// Uses `provided` if set, otherwise prompts on the terminal.
fn resolve_password(provided: Option<String>) -> Result<SecretString> {
	let password = match provided {
		Some(password) => SecretString::new(password),
		None => prompt_password(&mut io::stdin().lock(), &mut io::stderr())?,
	};
	if password.is_blank() {
		bail!("password cannot be empty");
	}
	Ok(password)
}

fn prompt_password(input: &mut impl BufRead, prompt: &mut impl Write) -> Result<SecretString> {
	write!(prompt, "Password: ").ok();
	prompt.flush().ok();

	let mut line = String::new();
	input.read_line(&mut line).context("failed to read password")?;
	let trimmed = line.trim_end_matches(['\r', '\n']).to_string();
	line.clear();
	Ok(SecretString::new(trimmed))
}

#[instrument(skip_all, fields(email = %email))]
pub async fn register(app: &App, name: String, email: String, password: Option<String>) -> Result<()> {
	let registration = Registration {
		name,
		email,
		password: resolve_password(password)?,
	};

	app.client
		.register(&registration)
		.await
		.context("registration failed")?;

	info!("account registered");
	println!(
		"Registered {}. Run `labinv login --email {}` to sign in.",
		registration.email, registration.email
	);
	Ok(())
}

#[instrument(skip_all, fields(email = %email))]
pub async fn login(app: &App, email: String, password: Option<String>) -> Result<()> {
	let credentials = Credentials {
		email,
		password: resolve_password(password)?,
	};

	let user = app.client.login(&credentials).await.context("login failed")?;

	let Some(cookie) = app.client.session_cookie() else {
		warn!("server accepted the login but sent no session cookie");
		return Err(anyhow!("server did not start a session"));
	};
	app.db
		.kv()
		.save_session(&cookie, Some(&credentials.email))
		.await
		.context("failed to store session")?;

	let display = user
		.and_then(|u| u.name)
		.unwrap_or_else(|| credentials.email.clone());
	info!("login successful");
	println!("Signed in as {display}.");
	Ok(())
}

#[instrument(skip_all)]
pub async fn logout(app: &App) -> Result<()> {
	match app.client.logout().await {
		Ok(()) => info!("server session ended"),
		Err(e) if e.is_connectivity() => {
			warn!(error = %e, "server unreachable, forgetting session locally only");
		}
		Err(e) => return Err(e).context("logout failed"),
	}

	app.forget_session().await?;
	println!("Signed out.");
	Ok(())
}

#[instrument(skip_all)]
pub async fn whoami(app: &App) -> Result<()> {
	match app.client.check_session().await {
		Ok(status) if status.logged_in => {
			let user = status.user.unwrap_or_default();
			let who = user
				.name
				.or(user.email)
				.unwrap_or_else(|| "unknown user".to_string());
			println!("Signed in as {who}.");
			Ok(())
		}
		Ok(_) => {
			println!("Not signed in. Run `labinv login`.");
			Ok(())
		}
		Err(e) if e.is_connectivity() => {
			match app.db.kv().session_email().await? {
				Some(email) => println!("Offline. Last signed in as {email}."),
				None => println!("Offline. No stored session."),
			}
			Ok(())
		}
		Err(e) => Err(e).context("session check failed"),
	}
}
