// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use labinv_common_http::RetryableError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EquipmentIdError {
	#[error("invalid equipment id: '{0}'")]
	Invalid(String),

	#[error("temporary id has no timestamp after the 'temp_' prefix")]
	EmptyTemporary,

	/// A temporary id with no queued create behind it.
	#[error("no pending create for temporary id '{0}'")]
	UnknownTemporary(String),
}

/// Input rejected before it reaches the backend. Never queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("missing required field: {0}")]
	MissingField(&'static str),

	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: &'static str, message: String },

	#[error("update has no fields to change")]
	EmptyUpdate,
}

#[derive(Debug, Error)]
pub enum ApiError {
	/// No response was obtained at all.
	#[error("network unavailable: {0}")]
	Connectivity(String),

	#[error("validation failed: {0}")]
	Validation(String),

	#[error("invalid credentials: {0}")]
	InvalidCredentials(String),

	#[error("not authenticated: {0}")]
	Unauthenticated(String),

	#[error("server error: {status} - {message}")]
	Server { status: StatusCode, message: String },

	/// 2xx response carrying `"success": false`.
	#[error("request rejected: {0}")]
	Rejected(String),

	#[error("failed to decode response: {0}")]
	Decode(String),

	#[error("invalid URL: {0}")]
	InvalidUrl(String),

	#[error("failed to build HTTP client: {0}")]
	ClientBuild(String),
}

impl ApiError {
	pub fn connectivity(err: reqwest::Error) -> Self {
		Self::Connectivity(err.to_string())
	}

	/// Maps a non-success status and the server's `error` message.
	pub fn from_status(status: StatusCode, message: String) -> Self {
		match status {
			StatusCode::BAD_REQUEST => Self::Validation(message),
			StatusCode::UNAUTHORIZED => Self::InvalidCredentials(message),
			StatusCode::FORBIDDEN => Self::Unauthenticated(message),
			status => Self::Server { status, message },
		}
	}

	pub fn is_connectivity(&self) -> bool {
		matches!(self, Self::Connectivity(_))
	}

	pub fn is_auth(&self) -> bool {
		matches!(self, Self::InvalidCredentials(_) | Self::Unauthenticated(_))
	}

	/// Reads that fail this way are served from the local mirror.
	pub fn allows_mirror_fallback(&self) -> bool {
		match self {
			Self::Connectivity(_) => true,
			Self::Server { status, .. } => status.is_server_error(),
			_ => false,
		}
	}
}

impl RetryableError for ApiError {
	fn is_retryable(&self) -> bool {
		self.is_connectivity()
	}
}

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("invalid timestamp in {key}: {value}")]
	InvalidTimestamp { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum InventoryError {
	#[error(transparent)]
	Api(#[from] ApiError),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error(transparent)]
	InvalidId(#[from] EquipmentIdError),
}

impl InventoryError {
	pub fn is_auth(&self) -> bool {
		matches!(self, Self::Api(e) if e.is_auth())
	}
}
