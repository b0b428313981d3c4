// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role resolution with caching and in-flight deduplication.
//!
//! [`RoleResolver`] wraps the [`PermissionOracle`] with the behavior UI
//! callers rely on:
//!
//! - a single-slot cache for the global-admin predicate, keyed by identity
//! - deduplication of concurrent global-admin checks: N callers for the
//!   same identity produce exactly one oracle round trip and all receive
//!   the identical result
//! - synchronous cache invalidation on every identity transition, so a
//!   result computed for one identity is never served to another
//! - the degrade-to-false error policy: predicates never fail, a caller
//!   cannot distinguish "denied" from "oracle unreachable" through the
//!   boolean alone
//!
//! Project-scoped predicates are deliberately uncached: they are asked once
//! per page load and the caller holds the boolean itself (feeding it back
//! through [`can_manage_sync`](crate::fallback::can_manage_sync) when a
//! synchronous answer is needed).
//!
//! # Concurrency
//!
//! Cache-slot critical sections never suspend; the slot is guarded by a
//! plain [`std::sync::Mutex`] and the dedup handle is a
//! [`Shared`](futures::future::Shared) future cloned out of the lock and
//! awaited outside it. There is no cancellation of an in-flight oracle
//! call: an identity switch mid-flight means the completed result fails the
//! owner check at commit time and is discarded.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tracing::instrument;

use crate::identity::{ChangeSubscription, IdentitySource};
use crate::oracle::PermissionOracle;
use crate::project::Project;
use crate::types::{ProjectId, UserId};

/// Single-slot cache for the global-admin predicate.
///
/// Invariants:
/// - at most one outstanding oracle round trip for the global-admin check
///   exists per resolver, regardless of caller count
/// - `resolved` is only meaningful while `owner` matches the caller's
///   current identity
#[derive(Default)]
struct AdminCacheSlot {
	/// The identity the slot's contents apply to.
	owner: Option<UserId>,
	/// The cached predicate value, once a round trip has committed.
	resolved: Option<bool>,
	/// Handle to the pending round trip, if one is outstanding.
	in_flight: Option<Shared<BoxFuture<'static, bool>>>,
}

impl AdminCacheSlot {
	fn reset(&mut self) {
		self.owner = None;
		self.resolved = None;
		self.in_flight = None;
	}
}

fn lock(slot: &Mutex<AdminCacheSlot>) -> MutexGuard<'_, AdminCacheSlot> {
	slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves the current identity's roles against the permission oracle.
///
/// Construct one per application context and share it; the cache is owned
/// by the resolver, not module-global. The resolver registers a synchronous
/// identity-change callback at construction and unregisters it when
/// dropped.
pub struct RoleResolver {
	identity: IdentitySource,
	oracle: Arc<dyn PermissionOracle>,
	slot: Arc<Mutex<AdminCacheSlot>>,
	_invalidation: ChangeSubscription,
}

impl RoleResolver {
	/// Create a resolver over the given identity source and oracle.
	pub fn new(identity: IdentitySource, oracle: Arc<dyn PermissionOracle>) -> Self {
		let slot = Arc::new(Mutex::new(AdminCacheSlot::default()));

		// Runs inside the transition, before control returns to whoever
		// changed the identity. An in-flight check for the old identity will
		// fail the owner comparison at commit time and be discarded.
		let slot_for_invalidation = Arc::clone(&slot);
		let invalidation = identity.on_change(move |_| {
			lock(&slot_for_invalidation).reset();
		});

		Self {
			identity,
			oracle,
			slot,
			_invalidation: invalidation,
		}
	}

	/// Is the current identity a global administrator?
	///
	/// Never fails; oracle errors degrade to `false` without being cached,
	/// so the next caller retries rather than trusting a failed round trip.
	#[instrument(level = "debug", skip(self))]
	pub async fn is_global_admin(&self) -> bool {
		let Some(user_id) = self.identity.current() else {
			lock(&self.slot).reset();
			return false;
		};

		let pending = {
			let mut slot = lock(&self.slot);
			if slot.owner == Some(user_id) {
				if let Some(value) = slot.resolved {
					return value;
				}
				match &slot.in_flight {
					Some(pending) => pending.clone(),
					None => self.begin_check(&mut slot, user_id),
				}
			} else {
				slot.reset();
				self.begin_check(&mut slot, user_id)
			}
		};

		pending.await
	}

	/// Start a new oracle round trip for `user_id` and record it in the
	/// slot before the first suspension point.
	fn begin_check(
		&self,
		slot: &mut AdminCacheSlot,
		user_id: UserId,
	) -> Shared<BoxFuture<'static, bool>> {
		let oracle = Arc::clone(&self.oracle);
		let cache = Arc::clone(&self.slot);

		let pending = async move {
			match oracle.is_global_admin(user_id).await {
				Ok(value) => {
					let mut slot = lock(&cache);
					// Commit only if the slot still belongs to this identity;
					// a mid-flight switch means the result is stale.
					if slot.owner == Some(user_id) {
						slot.resolved = Some(value);
						slot.in_flight = None;
					}
					value
				}
				Err(error) => {
					tracing::warn!(%user_id, %error, "global-admin check failed, treating as not admin");
					let mut slot = lock(&cache);
					// Clear the pending handle but cache nothing: a failed
					// round trip must not be remembered as "not admin".
					if slot.owner == Some(user_id) {
						slot.in_flight = None;
					}
					false
				}
			}
		}
		.boxed()
		.shared();

		slot.owner = Some(user_id);
		slot.resolved = None;
		slot.in_flight = Some(pending.clone());
		pending
	}

	/// Is the current identity listed as an owner of `project_id`?
	///
	/// Uncached: every call is a fresh oracle round trip.
	#[instrument(level = "debug", skip(self), fields(project_id = %project_id))]
	pub async fn is_project_owner(&self, project_id: ProjectId) -> bool {
		let Some(user_id) = self.identity.current() else {
			return false;
		};

		match self.oracle.is_project_owner(user_id, project_id).await {
			Ok(value) => value,
			Err(error) => {
				tracing::warn!(%user_id, %project_id, %error, "project-owner check failed, treating as not owner");
				false
			}
		}
	}

	/// May the current identity manage `project_id` (global admin or
	/// project owner)?
	///
	/// Uncached. The OR is evaluated oracle-side against one snapshot; it
	/// is not composed locally from the other two predicates.
	#[instrument(level = "debug", skip(self), fields(project_id = %project_id))]
	pub async fn can_manage_project(&self, project_id: ProjectId) -> bool {
		let Some(user_id) = self.identity.current() else {
			return false;
		};

		match self.oracle.can_manage_project(user_id, project_id).await {
			Ok(value) => value,
			Err(error) => {
				tracing::warn!(%user_id, %project_id, %error, "manage-project check failed, denying");
				false
			}
		}
	}

	/// Synchronous best-effort check against the current identity.
	///
	/// See [`can_manage_sync`](crate::fallback::can_manage_sync) for the
	/// priority order and the fail-open caveat.
	pub fn can_manage_sync(
		&self,
		project: Option<&Project>,
		resolved: Option<&std::collections::HashMap<ProjectId, bool>>,
	) -> bool {
		crate::fallback::can_manage_sync(self.identity.current(), project, resolved)
	}

	/// The identity source this resolver watches.
	pub fn identity(&self) -> &IdentitySource {
		&self.identity
	}
}

impl std::fmt::Debug for RoleResolver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let slot = lock(&self.slot);
		f.debug_struct("RoleResolver")
			.field("owner", &slot.owner)
			.field("resolved", &slot.resolved)
			.field("in_flight", &slot.in_flight.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::oracle::OracleError;
	use async_trait::async_trait;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	use std::time::Duration;

	/// Oracle double with call counting, a configurable response delay, and
	/// a failure switch.
	#[derive(Default)]
	struct MockOracle {
		admins: Mutex<HashSet<UserId>>,
		owners: Mutex<HashSet<(UserId, ProjectId)>>,
		failing: AtomicBool,
		delay: Option<Duration>,
		global_admin_calls: AtomicUsize,
		project_owner_calls: AtomicUsize,
		can_manage_calls: AtomicUsize,
	}

	impl MockOracle {
		fn with_delay(delay: Duration) -> Self {
			Self {
				delay: Some(delay),
				..Default::default()
			}
		}

		fn grant_global_admin(&self, user_id: UserId) {
			self.admins.lock().unwrap().insert(user_id);
		}

		fn revoke_global_admin(&self, user_id: UserId) {
			self.admins.lock().unwrap().remove(&user_id);
		}

		fn grant_ownership(&self, user_id: UserId, project_id: ProjectId) {
			self.owners.lock().unwrap().insert((user_id, project_id));
		}

		fn set_failing(&self, failing: bool) {
			self.failing.store(failing, Ordering::SeqCst);
		}

		async fn respond(&self, value: bool) -> Result<bool, OracleError> {
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if self.failing.load(Ordering::SeqCst) {
				return Err(OracleError::Unreachable("mock failure".to_string()));
			}
			Ok(value)
		}
	}

	#[async_trait]
	impl PermissionOracle for MockOracle {
		async fn is_global_admin(&self, user_id: UserId) -> Result<bool, OracleError> {
			self.global_admin_calls.fetch_add(1, Ordering::SeqCst);
			let value = self.admins.lock().unwrap().contains(&user_id);
			self.respond(value).await
		}

		async fn is_project_owner(
			&self,
			user_id: UserId,
			project_id: ProjectId,
		) -> Result<bool, OracleError> {
			self.project_owner_calls.fetch_add(1, Ordering::SeqCst);
			let value = self.owners.lock().unwrap().contains(&(user_id, project_id));
			self.respond(value).await
		}

		async fn can_manage_project(
			&self,
			user_id: UserId,
			project_id: ProjectId,
		) -> Result<bool, OracleError> {
			self.can_manage_calls.fetch_add(1, Ordering::SeqCst);
			let is_admin = self.admins.lock().unwrap().contains(&user_id);
			let is_owner = self.owners.lock().unwrap().contains(&(user_id, project_id));
			self.respond(is_admin || is_owner).await
		}
	}

	fn resolver_with(oracle: Arc<MockOracle>) -> (RoleResolver, IdentitySource) {
		let identity = IdentitySource::new();
		let resolver = RoleResolver::new(identity.clone(), oracle);
		(resolver, identity)
	}

	mod global_admin {
		use super::*;

		#[tokio::test]
		async fn no_identity_returns_false_without_oracle_call() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, _identity) = resolver_with(Arc::clone(&oracle));

			assert!(!resolver.is_global_admin().await);
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 0);
		}

		#[tokio::test]
		async fn resolves_admin_status_from_oracle() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let admin = UserId::generate();
			oracle.grant_global_admin(admin);
			identity.sign_in(admin);

			assert!(resolver.is_global_admin().await);
		}

		#[tokio::test]
		async fn second_call_is_served_from_cache() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			oracle.grant_global_admin(user);
			identity.sign_in(user);

			assert!(resolver.is_global_admin().await);
			assert!(resolver.is_global_admin().await);
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 1);
		}

		#[tokio::test(start_paused = true)]
		async fn concurrent_calls_share_one_round_trip() {
			let oracle = Arc::new(MockOracle::with_delay(Duration::from_millis(10)));
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			oracle.grant_global_admin(user);
			identity.sign_in(user);

			let (a, b, c) = tokio::join!(
				resolver.is_global_admin(),
				resolver.is_global_admin(),
				resolver.is_global_admin(),
			);

			assert_eq!((a, b, c), (true, true, true));
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 1);
		}

		#[tokio::test]
		async fn identity_change_invalidates_cache() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let u1 = UserId::generate();
			let u2 = UserId::generate();
			oracle.grant_global_admin(u1);

			identity.sign_in(u1);
			assert!(resolver.is_global_admin().await);

			identity.sign_out();
			identity.sign_in(u2);

			// Must re-query for U2 and must not serve U1's cached true.
			assert!(!resolver.is_global_admin().await);
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 2);
		}

		#[tokio::test(start_paused = true)]
		async fn mid_flight_identity_switch_discards_result() {
			let oracle = Arc::new(MockOracle::with_delay(Duration::from_millis(10)));
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let u1 = UserId::generate();
			let u2 = UserId::generate();
			oracle.grant_global_admin(u1);
			identity.sign_in(u1);

			let resolver = Arc::new(resolver);
			let resolver_for_task = Arc::clone(&resolver);
			let first = tokio::spawn(async move { resolver_for_task.is_global_admin().await });

			// Let the first check reach its suspension point, then switch
			// identities while it is in flight.
			tokio::task::yield_now().await;
			identity.sign_out();
			identity.sign_in(u2);

			// The original caller still receives the value computed for U1...
			assert!(first.await.unwrap());

			// ...but nothing was cached for U2: the next check re-queries.
			assert!(!resolver.is_global_admin().await);
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 2);
		}

		#[tokio::test]
		async fn oracle_error_degrades_to_false_and_is_not_cached() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			oracle.grant_global_admin(user);
			identity.sign_in(user);

			oracle.set_failing(true);
			assert!(!resolver.is_global_admin().await);

			// The failure was not committed as "not admin": once the oracle
			// recovers, the next call retries and gets the real answer.
			oracle.set_failing(false);
			assert!(resolver.is_global_admin().await);
			assert_eq!(oracle.global_admin_calls.load(Ordering::SeqCst), 2);
		}

		#[tokio::test]
		async fn sign_out_resets_to_false() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			oracle.grant_global_admin(user);
			identity.sign_in(user);
			assert!(resolver.is_global_admin().await);

			identity.sign_out();
			assert!(!resolver.is_global_admin().await);
		}

		#[tokio::test]
		async fn revocation_visible_after_identity_cycle() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			oracle.grant_global_admin(user);
			identity.sign_in(user);
			assert!(resolver.is_global_admin().await);

			oracle.revoke_global_admin(user);
			// Still cached for this session...
			assert!(resolver.is_global_admin().await);

			// ...until the identity transitions.
			identity.sign_out();
			identity.sign_in(user);
			assert!(!resolver.is_global_admin().await);
		}
	}

	mod project_scoped {
		use super::*;

		#[tokio::test]
		async fn owner_but_not_admin_can_manage() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			let project = ProjectId::generate();
			oracle.grant_ownership(user, project);
			identity.sign_in(user);

			assert!(resolver.is_project_owner(project).await);
			assert!(resolver.can_manage_project(project).await);
			assert!(!resolver.is_global_admin().await);
		}

		#[tokio::test]
		async fn neither_role_cannot_manage() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			identity.sign_in(UserId::generate());
			let project = ProjectId::generate();

			assert!(!resolver.is_project_owner(project).await);
			assert!(!resolver.can_manage_project(project).await);
		}

		#[tokio::test]
		async fn global_admin_can_manage_any_project() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let admin = UserId::generate();
			oracle.grant_global_admin(admin);
			identity.sign_in(admin);

			let project = ProjectId::generate();
			assert!(resolver.can_manage_project(project).await);
			assert!(!resolver.is_project_owner(project).await);
		}

		#[tokio::test]
		async fn no_identity_denies_without_oracle_call() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, _identity) = resolver_with(Arc::clone(&oracle));

			let project = ProjectId::generate();
			assert!(!resolver.is_project_owner(project).await);
			assert!(!resolver.can_manage_project(project).await);
			assert_eq!(oracle.project_owner_calls.load(Ordering::SeqCst), 0);
			assert_eq!(oracle.can_manage_calls.load(Ordering::SeqCst), 0);
		}

		#[tokio::test]
		async fn oracle_error_denies() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			let project = ProjectId::generate();
			oracle.grant_ownership(user, project);
			identity.sign_in(user);
			oracle.set_failing(true);

			assert!(!resolver.is_project_owner(project).await);
			assert!(!resolver.can_manage_project(project).await);
		}

		#[tokio::test]
		async fn project_checks_are_never_cached() {
			let oracle = Arc::new(MockOracle::default());
			let (resolver, identity) = resolver_with(Arc::clone(&oracle));

			let user = UserId::generate();
			let project = ProjectId::generate();
			oracle.grant_ownership(user, project);
			identity.sign_in(user);

			assert!(resolver.can_manage_project(project).await);
			assert!(resolver.can_manage_project(project).await);
			assert_eq!(oracle.can_manage_calls.load(Ordering::SeqCst), 2);
		}
	}
}
