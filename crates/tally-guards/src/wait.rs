// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Event-or-deadline races.
//!
//! Guards never block indefinitely on the identity provider: every wait
//! for a lifecycle event races a wall-clock deadline and proceeds on
//! whichever resolves first.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;

use tally_auth::IdentitySource;

/// Await `future` or give up after `deadline`, whichever comes first.
///
/// Returns `None` on deadline. The losing side is dropped, which cancels
/// it; there is no detached work left behind.
pub async fn await_or_deadline<F: Future>(future: F, deadline: Duration) -> Option<F::Output> {
	tokio::time::timeout(deadline, future).await.ok()
}

/// Wait until the identity provider reports a settled authentication state
/// (`SessionRestored`, `SignedIn`, or `TokenRefreshed`) or the deadline
/// passes.
///
/// Returns `true` if a settled event arrived in time. A provider that
/// never emits its lifecycle event cannot stall the caller past the
/// deadline.
pub async fn wait_for_settled(identity: &IdentitySource, deadline: Duration) -> bool {
	let mut events = identity.subscribe();

	let settled = async move {
		loop {
			match events.recv().await {
				Ok(event) if event.is_settled() => break,
				Ok(_) => continue,
				Err(RecvError::Lagged(_)) => continue,
				Err(RecvError::Closed) => break,
			}
		}
	};

	await_or_deadline(settled, deadline).await.is_some()
}

#[cfg(test)]
mod tests {
	use super::*;
	use tally_auth::UserId;

	#[tokio::test(start_paused = true)]
	async fn deadline_fires_when_nothing_resolves() {
		let result = await_or_deadline(std::future::pending::<()>(), Duration::from_millis(50)).await;
		assert!(result.is_none());
	}

	#[tokio::test]
	async fn ready_future_wins_the_race() {
		let result = await_or_deadline(async { 42 }, Duration::from_secs(5)).await;
		assert_eq!(result, Some(42));
	}

	#[tokio::test(start_paused = true)]
	async fn settled_event_resolves_the_wait() {
		let identity = IdentitySource::new();

		let identity_for_task = identity.clone();
		let waiter = tokio::spawn(async move {
			wait_for_settled(&identity_for_task, Duration::from_millis(500)).await
		});

		tokio::task::yield_now().await;
		identity.sign_in(UserId::generate());

		assert!(waiter.await.unwrap());
	}

	#[tokio::test(start_paused = true)]
	async fn sign_out_does_not_settle_the_wait() {
		let identity = IdentitySource::new();

		let identity_for_task = identity.clone();
		let waiter = tokio::spawn(async move {
			wait_for_settled(&identity_for_task, Duration::from_millis(100)).await
		});

		tokio::task::yield_now().await;
		identity.sign_out();

		// Only the deadline ends the wait.
		assert!(!waiter.await.unwrap());
	}
}
