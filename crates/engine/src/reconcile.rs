//! Derives document versions from inbound messages.

use std::sync::Arc;

use listsync_connection::Inbound;
use listsync_model::{Document, InboundMessage};

use crate::patch::{PatchError, apply_patch};
use crate::subscriber::{DocumentSubscriber, DropReason};

/// Computes the next document from the current one and one message.
///
/// A snapshot always wins. A patch without a current document yields
/// `Ok(None)`: it is dropped, not an error.
pub fn reconcile(current: Option<&Document>, message: InboundMessage) -> Result<Option<Document>, PatchError> {
	match message {
		InboundMessage::FullSnapshot { document } => Ok(Some(document)),
		InboundMessage::DeltaPatch { ops } => match current {
			Some(current) => apply_patch(current, &ops).map(Some),
			None => Ok(None),
		},
	}
}

/// Whether the local document is known to track the authority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncHealth {
	/// No snapshot received yet.
	#[default]
	Unhydrated,
	/// Every message since the last snapshot applied cleanly.
	InSync,
	/// A message was skipped; patches are ignored until the next snapshot.
	Diverged,
}

impl SyncHealth {
	/// Short lowercase name for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unhydrated => "unhydrated",
			Self::InSync => "in_sync",
			Self::Diverged => "diverged",
		}
	}
}

/// Counters for one reconciler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
	/// Snapshots applied.
	pub snapshots_applied: u64,
	/// Patches applied.
	pub patches_applied: u64,
	/// Patches dropped because no snapshot had arrived.
	pub dropped_unhydrated: u64,
	/// Patches dropped while diverged.
	pub dropped_diverged: u64,
	/// Patches that failed to apply.
	pub patches_rejected: u64,
	/// Frames that failed to decode.
	pub malformed_frames: u64,
}

/// Result of feeding one inbound message to a [`Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
	/// A new version was published.
	Applied,
	/// The message was skipped; health is unchanged.
	Dropped(DropReason),
	/// The message was skipped and the document stopped tracking the authority.
	Diverged(DropReason),
}

/// Owner of the canonical local document.
///
/// Messages must be fed one at a time in receipt order. Every version handed
/// to the subscriber is immutable; later versions replace it wholesale.
#[derive(Debug)]
pub struct Reconciler<S> {
	document: Option<Arc<Document>>,
	health: SyncHealth,
	stats: EngineStats,
	subscriber: S,
}

impl<S: DocumentSubscriber> Reconciler<S> {
	/// Creates an unhydrated reconciler.
	pub fn new(subscriber: S) -> Self {
		Self {
			document: None,
			health: SyncHealth::Unhydrated,
			stats: EngineStats::default(),
			subscriber,
		}
	}

	/// Latest version, if any.
	pub fn document(&self) -> Option<&Arc<Document>> {
		self.document.as_ref()
	}

	/// Current sync health.
	pub fn health(&self) -> SyncHealth {
		self.health
	}

	/// Counters so far.
	pub fn stats(&self) -> EngineStats {
		self.stats
	}

	/// Applies one decoded frame.
	pub fn apply_inbound(&mut self, inbound: Inbound) -> Outcome {
		match inbound {
			Inbound::Message(message) => self.apply_message(message),
			Inbound::Malformed(reason) => {
				self.stats.malformed_frames += 1;
				tracing::warn!(health = self.health.as_str(), error = %reason, "reconcile.malformed");
				let reason = DropReason::Malformed(reason);
				if self.health == SyncHealth::InSync { self.diverge(reason) } else { self.skip(reason) }
			}
		}
	}

	/// Applies one message.
	pub fn apply_message(&mut self, message: InboundMessage) -> Outcome {
		let kind = message.kind();
		let snapshot = matches!(message, InboundMessage::FullSnapshot { .. });
		if self.health == SyncHealth::Diverged && !snapshot {
			self.stats.dropped_diverged += 1;
			tracing::debug!("reconcile.awaiting_snapshot");
			return self.skip(DropReason::Diverged);
		}

		match reconcile(self.document.as_deref(), message) {
			Ok(Some(next)) => {
				if snapshot {
					self.stats.snapshots_applied += 1;
					if self.health == SyncHealth::Diverged {
						tracing::info!("reconcile.resynced");
					}
				} else {
					self.stats.patches_applied += 1;
				}
				self.health = SyncHealth::InSync;
				self.publish(next, kind);
				Outcome::Applied
			}
			Ok(None) => {
				self.stats.dropped_unhydrated += 1;
				tracing::warn!("reconcile.patch_before_snapshot");
				self.skip(DropReason::Unhydrated)
			}
			Err(e) => {
				self.stats.patches_rejected += 1;
				tracing::warn!(error = %e, "reconcile.rejected");
				self.diverge(DropReason::Rejected(e))
			}
		}
	}

	fn publish(&mut self, next: Document, kind: &'static str) {
		let next = Arc::new(next);
		tracing::debug!(kind, name = %next.name, items = next.items.len(), "reconcile.applied");
		self.document = Some(Arc::clone(&next));
		self.subscriber.on_document(next);
	}

	fn skip(&mut self, reason: DropReason) -> Outcome {
		self.subscriber.on_dropped(&reason);
		Outcome::Dropped(reason)
	}

	fn diverge(&mut self, reason: DropReason) -> Outcome {
		self.health = SyncHealth::Diverged;
		tracing::warn!(reason = %reason, "reconcile.diverged");
		self.subscriber.on_dropped(&reason);
		Outcome::Diverged(reason)
	}
}
