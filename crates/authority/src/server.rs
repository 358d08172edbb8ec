use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use listsync_connection::{CloseStatus, Frame, LinkCommand, MemoryListener, MemoryPeer};
use listsync_model::{Action, Document, InboundMessage, ModelError, PatchOp};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::apply::apply_action;
use crate::diff::diff;

/// An authority serving every link opened through one [`MemoryListener`].
///
/// Each accepted link is greeted with a full snapshot. Every action changes
/// the shared document and is echoed to all links as a patch.
pub struct Authority {
	shared: Arc<Shared>,
	accept: JoinHandle<()>,
}

struct Shared {
	document: Mutex<Document>,
	/// Lock after `document` when both are needed.
	peers: Mutex<Vec<PeerEntry>>,
	next_peer: AtomicU64,
	greet: AtomicBool,
}

struct PeerEntry {
	id: u64,
	outbound: mpsc::UnboundedSender<Outgoing>,
}

enum Outgoing {
	Text(String),
	Close(CloseStatus),
}

impl Authority {
	/// Starts accepting links. Must be called from within a Tokio runtime.
	pub fn spawn(document: Document, listener: MemoryListener) -> Self {
		let shared = Arc::new(Shared {
			document: Mutex::new(document),
			peers: Mutex::new(Vec::new()),
			next_peer: AtomicU64::new(1),
			greet: AtomicBool::new(true),
		});
		let accept = tokio::spawn(accept_loop(Arc::clone(&shared), listener));
		Self { shared, accept }
	}

	/// Copy of the authoritative document.
	pub fn document(&self) -> Document {
		self.shared.document.lock().clone()
	}

	/// Number of links currently served.
	pub fn peer_count(&self) -> usize {
		self.shared.peers.lock().len()
	}

	/// Applies an action as if a client had sent it. Returns the broadcast ops.
	pub fn apply(&self, action: Action) -> Vec<PatchOp> {
		self.shared.apply(action)
	}

	/// Sends `message` to every link as is, bypassing the document.
	pub fn broadcast(&self, message: &InboundMessage) {
		self.shared.broadcast(message);
	}

	/// Sends raw text to every link.
	pub fn broadcast_text(&self, text: impl Into<String>) {
		self.shared.broadcast_text(text.into());
	}

	/// Controls whether newly accepted links receive a snapshot. On by default.
	pub fn set_greeting(&self, enabled: bool) {
		self.shared.greet.store(enabled, Ordering::Release);
	}

	/// Closes every link with `status`.
	pub fn disconnect_all(&self, status: CloseStatus) {
		let peers = std::mem::take(&mut *self.shared.peers.lock());
		tracing::info!(peers = peers.len(), status = %status, "authority.disconnect_all");
		for peer in peers {
			let _ = peer.outbound.send(Outgoing::Close(status.clone()));
		}
	}
}

impl Drop for Authority {
	fn drop(&mut self) {
		self.accept.abort();
	}
}

impl Shared {
	fn admit(&self, id: u64, outbound: mpsc::UnboundedSender<Outgoing>) {
		let document = self.document.lock();
		if self.greet.load(Ordering::Acquire) {
			let greeting = InboundMessage::FullSnapshot {
				document: document.clone(),
			};
			match greeting.to_json() {
				Ok(text) => {
					let _ = outbound.send(Outgoing::Text(text));
				}
				Err(e) => tracing::error!(peer = id, error = %e, "authority.encode_failed"),
			}
		}
		self.peers.lock().push(PeerEntry { id, outbound });
		tracing::info!(peer = id, "authority.accept");
	}

	fn forget(&self, id: u64) {
		self.peers.lock().retain(|peer| peer.id != id);
	}

	fn receive(&self, id: u64, frame: &Frame) {
		let parsed = match frame {
			Frame::Text(text) => Action::from_json(text),
			Frame::Binary(bytes) => std::str::from_utf8(bytes).map_err(ModelError::from).and_then(Action::from_json),
		};
		match parsed {
			Ok(action) => {
				self.apply(action);
			}
			Err(e) => tracing::warn!(peer = id, error = %e, "authority.unknown_action"),
		}
	}

	fn apply(&self, action: Action) -> Vec<PatchOp> {
		// Held across the broadcast so patches go out in the order they were made
		let mut document = self.document.lock();
		let before = document.clone();
		let kind = action.kind();
		apply_action(&mut document, action);

		let ops = match diff(&before, &document) {
			Ok(ops) => ops,
			Err(e) => {
				tracing::error!(action = kind, error = %e, "authority.diff_failed");
				return Vec::new();
			}
		};
		tracing::debug!(action = kind, ops = ops.len(), "authority.apply");
		if !ops.is_empty() {
			self.broadcast(&InboundMessage::DeltaPatch { ops: ops.clone() });
		}
		ops
	}

	fn broadcast(&self, message: &InboundMessage) {
		match message.to_json() {
			Ok(text) => self.broadcast_text(text),
			Err(e) => tracing::error!(kind = message.kind(), error = %e, "authority.encode_failed"),
		}
	}

	fn broadcast_text(&self, text: String) {
		self.peers
			.lock()
			.retain(|peer| peer.outbound.send(Outgoing::Text(text.clone())).is_ok());
	}
}

async fn accept_loop(shared: Arc<Shared>, mut listener: MemoryListener) {
	while let Some(peer) = listener.accept().await {
		let id = shared.next_peer.fetch_add(1, Ordering::Relaxed);
		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		shared.admit(id, outbound_tx);
		tokio::spawn(run_peer(Arc::clone(&shared), id, peer, outbound_rx));
	}
	tracing::debug!("authority.accept_exit");
}

async fn run_peer(shared: Arc<Shared>, id: u64, mut peer: MemoryPeer, mut outbound: mpsc::UnboundedReceiver<Outgoing>) {
	let close = loop {
		tokio::select! {
			out = outbound.recv() => match out {
				Some(Outgoing::Text(text)) => {
					if peer.send_text(text).is_err() {
						break None;
					}
				}
				Some(Outgoing::Close(status)) => break Some(status),
				None => break None,
			},
			command = peer.recv() => match command {
				Some(LinkCommand::Send(frame)) => shared.receive(id, &frame),
				Some(LinkCommand::Close(status)) => {
					tracing::debug!(peer = id, status = %status, "authority.peer_closed");
					break None;
				}
				None => break None,
			},
		}
	};

	shared.forget(id);
	if let Some(status) = close {
		peer.close(status);
	}
	tracing::debug!(peer = id, "authority.peer_exit");
}

#[cfg(test)]
mod tests;
