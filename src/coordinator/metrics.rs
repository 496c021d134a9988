// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh coordination.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	leaderships: AtomicU64,
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	waits: AtomicU64,
	stale: AtomicU64,
}
impl RefreshMetrics {
	/// Returns how often a caller was granted leadership.
	pub fn leaderships(&self) -> u64 {
		self.leaderships.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges sent to the backend.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh exchanges that installed a new credential.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh attempts that ended the session.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how often a caller had to wait for another caller's refresh.
	pub fn waits(&self) -> u64 {
		self.waits.load(Ordering::Relaxed)
	}

	/// Returns how often a leader skipped the exchange because the credential had already
	/// changed since its request was sent.
	pub fn stale_skips(&self) -> u64 {
		self.stale.load(Ordering::Relaxed)
	}

	pub(crate) fn record_leadership(&self) {
		self.leaderships.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_wait(&self) {
		self.waits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_stale_skip(&self) {
		self.stale.fetch_add(1, Ordering::Relaxed);
	}
}
