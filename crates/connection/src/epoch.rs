//! Epoch numbering for connect loops and their links.
//!
//! Every loop starts under a fresh epoch and each reconnect moves it to the
//! next one. The active-link slot is only cleared by the epoch that filled it,
//! so a link torn down late cannot evict its successor.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Issues epochs in increasing order, starting at 1.
#[derive(Debug, Default)]
pub(crate) struct EpochClock(AtomicU64);

impl EpochClock {
	pub fn tick(&self) -> u64 {
		self.0.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
	}
}

/// The epoch a connect loop is currently running under, plus its cancellation scope.
#[derive(Debug, Clone)]
pub(crate) struct LoopEpoch {
	epoch: u64,
	scope: CancellationToken,
}

impl LoopEpoch {
	/// Starts a loop scoped under `shutdown`; cancelling it ends the loop.
	pub fn start(clock: &EpochClock, shutdown: &CancellationToken) -> Self {
		Self {
			epoch: clock.tick(),
			scope: shutdown.child_token(),
		}
	}

	/// The epoch for the loop's next link. Cancellation stays shared with `self`.
	pub fn next_link(&self, clock: &EpochClock) -> Self {
		Self {
			epoch: clock.tick(),
			scope: self.scope.clone(),
		}
	}

	pub const fn epoch(&self) -> u64 {
		self.epoch
	}

	pub fn is_cancelled(&self) -> bool {
		self.scope.is_cancelled()
	}

	pub async fn cancelled(&self) {
		self.scope.cancelled().await;
	}
}
