// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP client construction with a consistent User-Agent header.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, ClientBuilder};

/// Knobs applied on top of [`builder`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
	/// Whole-request timeout. `None` lets requests run until the OS gives up.
	pub timeout: Option<Duration>,
	/// Overrides the default `labinv/{version}/{os}-{arch}` agent.
	pub user_agent: Option<String>,
}

/// Creates a client builder with the standard labinv User-Agent header.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client that stores and replays cookies through `jar`.
///
/// The backend keeps its session in a cookie, so every request made for one
/// user must go through the same jar.
pub fn new_client_with_jar(jar: Arc<Jar>, options: &ClientOptions) -> Result<Client, reqwest::Error> {
	let mut builder = match &options.user_agent {
		Some(agent) => Client::builder().user_agent(agent.clone()),
		None => builder(),
	};

	builder = builder.cookie_provider(jar);

	if let Some(timeout) = options.timeout {
		builder = builder.timeout(timeout);
	}

	builder.build()
}

/// Returns the standard labinv User-Agent string.
///
/// Format: `labinv/{version}/{os}-{arch}`
pub fn user_agent() -> String {
	format!(
		"labinv/{}/{}-{}",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_three_segments() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 3);
		assert_eq!(parts[0], "labinv");
		assert_eq!(parts[1], env!("CARGO_PKG_VERSION"));
	}

	#[test]
	fn client_with_jar_and_timeout_builds() {
		let jar = Arc::new(Jar::default());
		let options = ClientOptions {
			timeout: Some(Duration::from_secs(5)),
			user_agent: Some("labinv-test/1.0".to_string()),
		};
		assert!(new_client_with_jar(jar, &options).is_ok());
	}
}
