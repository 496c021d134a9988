//! Single-flight coordination of credential refreshes.
//!
//! The coordinator is a two-state machine (`Idle`, `Refreshing`) built on an async mutex.
//! [`RefreshCoordinator::acquire_leadership`] never blocks: the first caller to find the mutex
//! free becomes the leader and receives a [`RefreshLease`]; everyone else is told to wait.
//! Dropping the lease is the only way back to `Idle`, so leadership is released on every exit
//! path, including errors, panics, and cancelled futures. Leaders commit their credential
//! change before dropping the lease, which is what guarantees that waiters observe the
//! post-refresh state once they wake.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use async_lock::MutexGuard;
// self
use crate::_prelude::*;

/// Observable coordinator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CoordinatorState {
	/// No refresh exchange is in progress.
	Idle,
	/// A leader is performing a refresh exchange.
	Refreshing,
}

/// Answer to [`RefreshCoordinator::acquire_leadership`].
#[derive(Debug)]
pub enum Leadership<'a> {
	/// The caller is the leader and must perform (or deliberately skip) the refresh.
	Granted(RefreshLease<'a>),
	/// Another caller holds the coordinator; wait with [`RefreshCoordinator::wait_for_idle`].
	MustWait,
}

/// Proof of leadership; dropping it returns the coordinator to `Idle` and wakes waiters.
pub struct RefreshLease<'a> {
	refreshing: &'a AtomicBool,
	_guard: MutexGuard<'a, ()>,
}
impl Drop for RefreshLease<'_> {
	fn drop(&mut self) {
		// The mutex guard is released after this body runs, so the flag flips first.
		self.refreshing.store(false, Ordering::Release);
	}
}
impl Debug for RefreshLease<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RefreshLease(..)")
	}
}

/// Single-flight guard shared by every request of one session.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	lock: AsyncMutex<()>,
	refreshing: AtomicBool,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the current state.
	pub fn state(&self) -> CoordinatorState {
		if self.refreshing.load(Ordering::Acquire) {
			CoordinatorState::Refreshing
		} else {
			CoordinatorState::Idle
		}
	}

	/// Counters describing past coordination.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Attempts the `Idle → Refreshing` transition without blocking.
	pub fn acquire_leadership(&self) -> Leadership<'_> {
		match self.lock.try_lock() {
			Some(guard) => {
				self.refreshing.store(true, Ordering::Release);
				self.metrics.record_leadership();

				Leadership::Granted(RefreshLease { refreshing: &self.refreshing, _guard: guard })
			},
			None => {
				self.metrics.record_wait();

				Leadership::MustWait
			},
		}
	}

	/// Suspends until whoever holds the coordinator releases it.
	pub async fn wait_for_idle(&self) {
		drop(self.lock.lock().await);
	}

	/// Waits only when a refresh is currently in progress; returns whether it waited.
	pub async fn wait_if_refreshing(&self) -> bool {
		if self.state() == CoordinatorState::Idle {
			return false;
		}

		self.wait_for_idle().await;

		true
	}
}
