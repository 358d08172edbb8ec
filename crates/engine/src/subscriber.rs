use std::sync::Arc;

use listsync_model::Document;

use crate::patch::PatchError;

/// The single consumer of document versions.
///
/// Closures taking `Arc<Document>` implement this directly. Implement it by
/// hand to also observe skipped messages.
pub trait DocumentSubscriber: Send + 'static {
	/// Called exactly once per new document version, in receipt order.
	fn on_document(&mut self, document: Arc<Document>);

	/// Called when an inbound message was skipped. The document is unchanged.
	fn on_dropped(&mut self, _reason: &DropReason) {}
}

impl<F> DocumentSubscriber for F
where
	F: FnMut(Arc<Document>) + Send + 'static,
{
	fn on_document(&mut self, document: Arc<Document>) {
		self(document)
	}
}

/// Why an inbound message produced no new version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
	/// A patch arrived before any snapshot.
	Unhydrated,
	/// A patch arrived while waiting for a snapshot after divergence.
	Diverged,
	/// The patch could not be applied.
	Rejected(PatchError),
	/// The frame did not decode.
	Malformed(String),
}

impl std::fmt::Display for DropReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Unhydrated => f.write_str("patch before first snapshot"),
			Self::Diverged => f.write_str("patch while awaiting resync"),
			Self::Rejected(err) => write!(f, "patch rejected: {err}"),
			Self::Malformed(reason) => write!(f, "malformed frame: {reason}"),
		}
	}
}
