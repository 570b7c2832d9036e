// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for labinv.
//!
//! - A client builder with the labinv User-Agent and a shared cookie jar
//! - Retry with exponential backoff for idempotent requests

mod client;
mod retry;

pub use client::{builder, new_client_with_jar, user_agent, ClientOptions};
pub use retry::{retry, RetryConfig, RetryableError};
