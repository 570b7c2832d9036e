// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::Utc;

/// Source of the millisecond timestamps used for queue keys and temporary ids.
pub trait Clock: Send + Sync {
	fn now_millis(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_millis(&self) -> i64 {
		Utc::now().timestamp_millis()
	}
}
