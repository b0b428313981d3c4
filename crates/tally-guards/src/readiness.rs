// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Startup readiness gate.
//!
//! The first render after process start races session restoration. Guards
//! that consult the identity provider before restoration has settled would
//! see "no user" and bounce a signed-in user to the sign-in page. The gate
//! holds protected rendering until the provider settles or a short
//! deadline passes, then stays open for the lifetime of the process.

use std::time::Duration;

use tokio::sync::watch;

use tally_auth::IdentitySource;

use crate::wait::wait_for_settled;

/// How long the gate waits for session restoration before opening anyway.
pub const DEFAULT_STARTUP_DEADLINE: Duration = Duration::from_millis(400);

/// One-way latch that opens once authentication state has settled at
/// startup (or the deadline passed). Cheap to clone; all clones share the
/// latch.
#[derive(Clone)]
pub struct AuthReadiness {
	sender: watch::Sender<bool>,
}

impl AuthReadiness {
	pub fn new() -> Self {
		let (sender, _) = watch::channel(false);
		Self { sender }
	}

	/// Whether the gate has opened.
	pub fn is_ready(&self) -> bool {
		*self.sender.borrow()
	}

	/// Open the gate once `identity` reports a settled state, or after
	/// `deadline` if it never does. Idempotent; the gate never closes
	/// again.
	#[tracing::instrument(skip(self, identity))]
	pub async fn open_when_settled(&self, identity: &IdentitySource, deadline: Duration) {
		if self.is_ready() {
			return;
		}

		if identity.current().is_some() {
			self.sender.send_replace(true);
			return;
		}

		let settled = wait_for_settled(identity, deadline).await;
		if !settled {
			tracing::debug!(?deadline, "session restoration did not settle before deadline");
		}
		self.sender.send_replace(true);
	}

	/// Wait until the gate opens.
	pub async fn ready(&self) {
		let mut receiver = self.sender.subscribe();
		while !*receiver.borrow_and_update() {
			if receiver.changed().await.is_err() {
				return;
			}
		}
	}
}

impl Default for AuthReadiness {
	fn default() -> Self {
		Self::new()
	}
}
