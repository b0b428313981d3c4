// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global entry guard.
//!
//! Runs on every navigation. Public routes pass untouched; protected
//! routes require an identity, waiting briefly for session restoration
//! before redirecting to sign-in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tally_auth::IdentitySource;

use crate::route::{GuardOutcome, RouteMeta, SIGN_IN_ROUTE};
use crate::wait::wait_for_settled;

/// How long a navigation waits for session restoration before treating
/// the visitor as unauthenticated.
pub const DEFAULT_RESTORE_DEADLINE: Duration = Duration::from_millis(500);

/// Authentication gate evaluated on every navigation.
///
/// Cheap to clone; clones share the re-entrancy latch.
#[derive(Clone)]
pub struct EntryGuard {
	identity: IdentitySource,
	evaluating: Arc<AtomicBool>,
	restore_deadline: Duration,
}

impl EntryGuard {
	pub fn new(identity: IdentitySource) -> Self {
		Self::with_deadline(identity, DEFAULT_RESTORE_DEADLINE)
	}

	pub fn with_deadline(identity: IdentitySource, restore_deadline: Duration) -> Self {
		Self {
			identity,
			evaluating: Arc::new(AtomicBool::new(false)),
			restore_deadline,
		}
	}

	/// Evaluate the guard for a navigation target.
	#[tracing::instrument(skip(self), fields(path = route.path))]
	pub async fn evaluate(&self, route: RouteMeta) -> GuardOutcome {
		if route.public {
			return GuardOutcome::Allow;
		}

		// A navigation triggered while another evaluation is still waiting
		// on session restoration must not stack a second wait (or a second
		// redirect) on top of the first. The overlapping navigation passes;
		// the original evaluation still decides.
		if self.evaluating.swap(true, Ordering::SeqCst) {
			tracing::debug!("entry guard re-entered; letting overlapping navigation pass");
			return GuardOutcome::Allow;
		}

		// Released on drop, so a cancelled evaluation (the navigation was
		// superseded mid-wait) cannot leave the latch held.
		let _release = LatchRelease(Arc::clone(&self.evaluating));
		self.evaluate_protected().await
	}

	async fn evaluate_protected(&self) -> GuardOutcome {
		if self.identity.current().is_some() {
			return GuardOutcome::Allow;
		}

		// No identity yet. The session may still be restoring; give it a
		// bounded window before concluding the visitor is signed out.
		wait_for_settled(&self.identity, self.restore_deadline).await;

		if self.identity.current().is_some() {
			GuardOutcome::Allow
		} else {
			tracing::debug!("no identity after restore window; redirecting to sign-in");
			GuardOutcome::Redirect(SIGN_IN_ROUTE)
		}
	}
}

/// Clears the re-entrancy latch when dropped.
struct LatchRelease(Arc<AtomicBool>);

impl Drop for LatchRelease {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::route::COMMISSIONS_ROUTE;
	use tally_auth::UserId;

	#[tokio::test]
	async fn public_route_always_passes() {
		let guard = EntryGuard::new(IdentitySource::new());
		let outcome = guard.evaluate(RouteMeta::public(SIGN_IN_ROUTE)).await;
		assert_eq!(outcome, GuardOutcome::Allow);
	}

	#[tokio::test]
	async fn signed_in_user_passes_without_waiting() {
		let identity = IdentitySource::new();
		identity.sign_in(UserId::generate());

		// A generous deadline; the fast path must not consult it.
		let guard = EntryGuard::with_deadline(identity, Duration::from_secs(60));
		let outcome = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(outcome, GuardOutcome::Allow);
	}

	#[tokio::test(start_paused = true)]
	async fn unauthenticated_visitor_redirects_after_deadline() {
		let guard = EntryGuard::new(IdentitySource::new());
		let outcome = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(outcome, GuardOutcome::Redirect(SIGN_IN_ROUTE));
	}

	#[tokio::test(start_paused = true)]
	async fn late_session_restoration_wins_the_race() {
		let identity = IdentitySource::new();
		let guard = EntryGuard::new(identity.clone());

		let pending = tokio::spawn({
			let guard = guard.clone();
			async move { guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await }
		});

		tokio::task::yield_now().await;
		identity.restore_session(Some(UserId::generate()));

		assert_eq!(pending.await.unwrap(), GuardOutcome::Allow);
	}

	#[tokio::test(start_paused = true)]
	async fn session_restored_without_user_redirects() {
		let identity = IdentitySource::new();
		let guard = EntryGuard::new(identity.clone());

		let pending = tokio::spawn({
			let guard = guard.clone();
			async move { guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await }
		});

		tokio::task::yield_now().await;
		identity.restore_session(None);

		assert_eq!(pending.await.unwrap(), GuardOutcome::Redirect(SIGN_IN_ROUTE));
	}

	#[tokio::test(start_paused = true)]
	async fn overlapping_navigation_passes_while_first_waits() {
		let identity = IdentitySource::new();
		let guard = EntryGuard::new(identity.clone());

		let first = tokio::spawn({
			let guard = guard.clone();
			async move { guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await }
		});
		tokio::task::yield_now().await;

		// The first evaluation is parked on the restore window; a second
		// navigation must not wait behind it.
		let second = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(second, GuardOutcome::Allow);

		assert_eq!(first.await.unwrap(), GuardOutcome::Redirect(SIGN_IN_ROUTE));
	}

	#[tokio::test(start_paused = true)]
	async fn latch_releases_when_evaluation_is_cancelled() {
		let guard = EntryGuard::new(IdentitySource::new());

		// A navigation that gets superseded: its evaluation is dropped
		// while parked on the restore window.
		let superseded = tokio::spawn({
			let guard = guard.clone();
			async move { guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await }
		});
		tokio::task::yield_now().await;
		superseded.abort();
		assert!(superseded.await.is_err());

		// The guard must still protect the next navigation.
		let next = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(next, GuardOutcome::Redirect(SIGN_IN_ROUTE));
	}

	#[tokio::test(start_paused = true)]
	async fn latch_releases_after_evaluation() {
		let guard = EntryGuard::new(IdentitySource::new());

		let first = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(first, GuardOutcome::Redirect(SIGN_IN_ROUTE));

		// The latch must not stay held once the first evaluation finished.
		let second = guard.evaluate(RouteMeta::protected(COMMISSIONS_ROUTE)).await;
		assert_eq!(second, GuardOutcome::Redirect(SIGN_IN_ROUTE));
	}
}
