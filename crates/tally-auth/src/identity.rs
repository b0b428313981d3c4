// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The identity source: current authenticated subject and lifecycle events.
//!
//! [`IdentitySource`] is the process-wide handle to "who is signed in right
//! now". It exposes:
//!
//! - [`IdentitySource::current`]: the current identity, if any
//! - [`IdentitySource::on_change`]: synchronous change callbacks, invoked
//!   inside the lifecycle transition before it returns (this is what the
//!   role cache uses for invalidation, so no caller can observe a stale
//!   identity-to-result binding)
//! - [`IdentitySource::subscribe`]: an async event stream for code that
//!   needs to *wait* for a transition (the navigation guards)
//!
//! # Lifecycle events
//!
//! ```text
//! restore_session ──► SessionRestored   (startup, session may be absent)
//! sign_in         ──► SignedIn
//! refresh         ──► TokenRefreshed
//! sign_out        ──► SignedOut
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use tokio::sync::broadcast;

use crate::types::UserId;

/// Capacity of the broadcast channel backing [`IdentitySource::subscribe`].
///
/// Lifecycle transitions are rare; a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A lifecycle transition reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
	/// The provider finished restoring (or failing to restore) a session.
	SessionRestored,
	/// A user signed in.
	SignedIn,
	/// The session token was refreshed for the current user.
	TokenRefreshed,
	/// The user signed out.
	SignedOut,
}

impl AuthEvent {
	/// Events that guards treat as "authentication state is now settled".
	pub fn is_settled(self) -> bool {
		matches!(
			self,
			AuthEvent::SessionRestored | AuthEvent::SignedIn | AuthEvent::TokenRefreshed
		)
	}
}

type ChangeCallback = Box<dyn Fn(AuthEvent) + Send + Sync>;

struct Inner {
	current: RwLock<Option<UserId>>,
	callbacks: Mutex<Vec<(u64, ChangeCallback)>>,
	next_callback_id: AtomicU64,
	events: broadcast::Sender<AuthEvent>,
}

/// Handle to the current authenticated identity.
///
/// Cheap to clone; all clones observe the same state.
#[derive(Clone)]
pub struct IdentitySource {
	inner: Arc<Inner>,
}

impl IdentitySource {
	/// Create an identity source with no signed-in user.
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		Self {
			inner: Arc::new(Inner {
				current: RwLock::new(None),
				callbacks: Mutex::new(Vec::new()),
				next_callback_id: AtomicU64::new(0),
				events,
			}),
		}
	}

	/// The current identity, or `None` when unauthenticated.
	pub fn current(&self) -> Option<UserId> {
		*self
			.inner
			.current
			.read()
			.unwrap_or_else(PoisonError::into_inner)
	}

	/// Subscribe to lifecycle events.
	///
	/// Used by guards to await session restoration. Events emitted before
	/// subscribing are not replayed.
	pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
		self.inner.events.subscribe()
	}

	/// Register a callback invoked synchronously on every lifecycle
	/// transition, before the transition returns control.
	///
	/// The callback must not block or suspend. Dropping the returned
	/// [`ChangeSubscription`] unregisters it.
	pub fn on_change<F>(&self, callback: F) -> ChangeSubscription
	where
		F: Fn(AuthEvent) + Send + Sync + 'static,
	{
		let id = self.inner.next_callback_id.fetch_add(1, Ordering::Relaxed);
		self.inner
			.callbacks
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push((id, Box::new(callback)));
		ChangeSubscription {
			inner: Arc::downgrade(&self.inner),
			id,
		}
	}

	/// Report a restored session (or the absence of one) at startup.
	pub fn restore_session(&self, user: Option<UserId>) {
		self.transition(user, AuthEvent::SessionRestored);
	}

	/// Report a sign-in.
	pub fn sign_in(&self, user: UserId) {
		self.transition(Some(user), AuthEvent::SignedIn);
	}

	/// Report a token refresh for the given user.
	pub fn refresh(&self, user: UserId) {
		self.transition(Some(user), AuthEvent::TokenRefreshed);
	}

	/// Report a sign-out.
	pub fn sign_out(&self) {
		self.transition(None, AuthEvent::SignedOut);
	}

	/// Apply a transition: update the identity, run synchronous callbacks,
	/// then notify async subscribers.
	///
	/// The callback pass happens strictly before this returns, which is the
	/// ordering guarantee cache invalidation depends on.
	fn transition(&self, user: Option<UserId>, event: AuthEvent) {
		{
			let mut current = self
				.inner
				.current
				.write()
				.unwrap_or_else(PoisonError::into_inner);
			*current = user;
		}

		tracing::debug!(?event, user = ?user.map(|u| u.to_string()), "identity transition");

		let callbacks = self
			.inner
			.callbacks
			.lock()
			.unwrap_or_else(PoisonError::into_inner);
		for (_, callback) in callbacks.iter() {
			callback(event);
		}
		drop(callbacks);

		// No receivers is fine; guards only subscribe while waiting.
		let _ = self.inner.events.send(event);
	}
}

impl Default for IdentitySource {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for IdentitySource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IdentitySource")
			.field("current", &self.current())
			.finish()
	}
}

/// Scoped registration of an [`IdentitySource::on_change`] callback.
///
/// Unregisters the callback when dropped.
pub struct ChangeSubscription {
	inner: Weak<Inner>,
	id: u64,
}

impl Drop for ChangeSubscription {
	fn drop(&mut self) {
		if let Some(inner) = self.inner.upgrade() {
			inner
				.callbacks
				.lock()
				.unwrap_or_else(PoisonError::into_inner)
				.retain(|(id, _)| *id != self.id);
		}
	}
}

impl std::fmt::Debug for ChangeSubscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChangeSubscription")
			.field("id", &self.id)
			.finish()
	}
}
