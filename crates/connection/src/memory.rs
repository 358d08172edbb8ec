//! In-process transport.
//!
//! Links are plain channel pairs handed to a [`MemoryListener`], which lets an
//! in-process authority (or a test) play the remote side without a socket.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::close::CloseStatus;
use crate::endpoint::Endpoint;
use crate::transport::{Frame, Link, LinkCommand, LinkEvent, Transport};
use crate::{Error, Result};

/// Transport whose links terminate in a paired [`MemoryListener`].
#[derive(Debug, Clone)]
pub struct MemoryTransport {
	accept_tx: mpsc::UnboundedSender<MemoryPeer>,
	refusing: Arc<AtomicBool>,
}

/// Accepting side of a [`MemoryTransport`].
#[derive(Debug)]
pub struct MemoryListener {
	accept_rx: mpsc::UnboundedReceiver<MemoryPeer>,
	refusing: Arc<AtomicBool>,
}

/// Remote end of one in-memory link.
#[derive(Debug)]
pub struct MemoryPeer {
	endpoint: Endpoint,
	commands: mpsc::UnboundedReceiver<LinkCommand>,
	events: mpsc::UnboundedSender<LinkEvent>,
}

impl MemoryTransport {
	/// Creates a connected transport/listener pair.
	pub fn new() -> (Self, MemoryListener) {
		let (accept_tx, accept_rx) = mpsc::unbounded_channel();
		let refusing = Arc::new(AtomicBool::new(false));
		let transport = Self {
			accept_tx,
			refusing: Arc::clone(&refusing),
		};
		(transport, MemoryListener { accept_rx, refusing })
	}

	/// Makes subsequent connects fail, simulating an unreachable authority.
	pub fn set_refusing(&self, refusing: bool) {
		self.refusing.store(refusing, Ordering::Release);
	}
}

#[async_trait]
impl Transport for MemoryTransport {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Link> {
		let refused = |reason: &str| Error::Connect {
			endpoint: endpoint.to_string(),
			reason: reason.to_owned(),
		};
		if self.refusing.load(Ordering::Acquire) {
			return Err(refused("connection refused"));
		}

		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		let peer = MemoryPeer {
			endpoint: endpoint.clone(),
			commands: command_rx,
			events: event_tx,
		};
		self.accept_tx.send(peer).map_err(|_| refused("listener dropped"))?;
		Ok(Link::new(command_tx, event_rx))
	}
}

impl MemoryListener {
	/// Waits for the next incoming link. `None` once every transport clone is gone.
	pub async fn accept(&mut self) -> Option<MemoryPeer> {
		self.accept_rx.recv().await
	}

	/// Returns an already-queued link without waiting.
	pub fn try_accept(&mut self) -> Option<MemoryPeer> {
		self.accept_rx.try_recv().ok()
	}

	/// Same as [`MemoryTransport::set_refusing`].
	pub fn set_refusing(&self, refusing: bool) {
		self.refusing.store(refusing, Ordering::Release);
	}
}

impl MemoryPeer {
	/// Endpoint the client dialled.
	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	/// Delivers a text frame to the client.
	pub fn send_text(&self, text: impl Into<String>) -> Result<()> {
		self.emit(LinkEvent::Frame(Frame::Text(text.into())))
	}

	/// Delivers a binary frame to the client.
	pub fn send_binary(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
		self.emit(LinkEvent::Frame(Frame::Binary(bytes.into())))
	}

	/// Reports a transport error to the client.
	pub fn fail(&self, reason: impl Into<String>) -> Result<()> {
		self.emit(LinkEvent::Error(reason.into()))
	}

	/// Closes the link from the remote side.
	pub fn close(self, status: CloseStatus) {
		let _ = self.events.send(LinkEvent::Closed(status));
	}

	/// Waits for the next command written by the client. `None` once the client dropped the link.
	pub async fn recv(&mut self) -> Option<LinkCommand> {
		self.commands.recv().await
	}

	/// Returns an already-queued command without waiting.
	pub fn try_recv(&mut self) -> Option<LinkCommand> {
		self.commands.try_recv().ok()
	}

	/// Returns true while the client still holds its end.
	pub fn is_open(&self) -> bool {
		!self.events.is_closed()
	}

	fn emit(&self, event: LinkEvent) -> Result<()> {
		self.events.send(event).map_err(|_| Error::LinkClosed)
	}
}
