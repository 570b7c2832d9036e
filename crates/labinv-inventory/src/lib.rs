// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

pub mod api;
pub mod client;
pub mod clock;
pub mod connectivity;
pub mod db;
pub mod drafts;
pub mod error;
pub mod kv;
pub mod mirror;
pub mod model;
pub mod queue;
pub mod sync;

#[cfg(test)]
mod testing;

pub use api::{
	ApiAction, CreatedEquipment, Credentials, InventoryApi, Registration, SessionApi, SessionStatus,
	SessionUser,
};
pub use client::HttpInventoryClient;
pub use clock::{Clock, SystemClock};
pub use connectivity::{Connectivity, ConnectivityMonitor};
pub use db::OfflineDb;
pub use drafts::DraftStore;
pub use error::*;
pub use kv::KeyValueStore;
pub use mirror::MirrorStore;
pub use model::*;
pub use queue::{QueueEntry, SyncQueue};
pub use sync::{DataSource, DrainReport, LoadResult, SubmitOutcome, SyncCoordinator};
