use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters for one connection manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
	/// Links the manager tried to open.
	pub attempts: u64,
	/// Links that opened successfully.
	pub established: u64,
	/// Actions written to a live link.
	pub actions_sent: u64,
	/// Actions dropped because no link was up.
	pub actions_dropped: u64,
	/// Inbound frames that failed to decode.
	pub malformed_frames: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatCounters {
	pub(crate) attempts: AtomicU64,
	pub(crate) established: AtomicU64,
	pub(crate) actions_sent: AtomicU64,
	pub(crate) actions_dropped: AtomicU64,
	pub(crate) malformed_frames: AtomicU64,
}

impl StatCounters {
	pub(crate) fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn snapshot(&self) -> ConnectionStats {
		ConnectionStats {
			attempts: self.attempts.load(Ordering::Relaxed),
			established: self.established.load(Ordering::Relaxed),
			actions_sent: self.actions_sent.load(Ordering::Relaxed),
			actions_dropped: self.actions_dropped.load(Ordering::Relaxed),
			malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
		}
	}
}
