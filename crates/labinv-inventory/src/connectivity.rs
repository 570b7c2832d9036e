// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Periodic reachability probe publishing online/offline transitions.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::InventoryApi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
	Online,
	Offline,
}

impl Connectivity {
	pub fn from_reachable(reachable: bool) -> Self {
		if reachable {
			Self::Online
		} else {
			Self::Offline
		}
	}

	pub fn is_online(&self) -> bool {
		*self == Self::Online
	}
}

impl fmt::Display for Connectivity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Online => f.write_str("online"),
			Self::Offline => f.write_str("offline"),
		}
	}
}

pub struct ConnectivityMonitor {
	api: Arc<dyn InventoryApi>,
	interval: Duration,
}

impl ConnectivityMonitor {
	pub fn new(api: Arc<dyn InventoryApi>, interval: Duration) -> Self {
		Self { api, interval }
	}

	pub async fn probe(&self) -> Connectivity {
		Connectivity::from_reachable(self.api.is_reachable().await)
	}

	/// Probes every interval until all receivers are dropped.
	///
	/// The receiver only observes a new value when the state flips.
	pub fn spawn(self, initial: Connectivity) -> (watch::Receiver<Connectivity>, JoinHandle<()>) {
		let (tx, rx) = watch::channel(initial);

		let handle = tokio::spawn(async move {
			let mut ticker = tokio::time::interval(self.interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;
				if tx.is_closed() {
					debug!("connectivity monitor stopping, no subscribers");
					break;
				}

				let observed = self.probe().await;
				tx.send_if_modified(|current| {
					if *current == observed {
						return false;
					}
					info!(from = %current, to = %observed, "connectivity changed");
					*current = observed;
					true
				});
			}
		});

		(rx, handle)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::FakeInventoryApi;

	#[tokio::test]
	async fn probe_reflects_reachability() {
		let api = Arc::new(FakeInventoryApi::new());
		let monitor = ConnectivityMonitor::new(api.clone(), Duration::from_millis(5));
		assert_eq!(monitor.probe().await, Connectivity::Online);

		api.set_online(false);
		assert_eq!(monitor.probe().await, Connectivity::Offline);
	}

	#[tokio::test]
	async fn spawned_monitor_publishes_transition() {
		let api = Arc::new(FakeInventoryApi::new());
		api.set_online(false);

		let monitor = ConnectivityMonitor::new(api.clone(), Duration::from_millis(5));
		let (mut rx, handle) = monitor.spawn(Connectivity::Offline);

		api.set_online(true);
		tokio::time::timeout(Duration::from_secs(2), rx.changed())
			.await
			.expect("monitor should publish within timeout")
			.unwrap();
		assert_eq!(*rx.borrow(), Connectivity::Online);

		drop(rx);
		tokio::time::timeout(Duration::from_secs(2), handle)
			.await
			.expect("monitor should stop once unobserved")
			.unwrap();
	}
}
