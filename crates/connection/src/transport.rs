//! Transport abstraction: something that can open a message link to the authority.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::close::CloseStatus;
use crate::endpoint::Endpoint;
use crate::{Error, Result};

/// One transport-level message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
	/// UTF-8 text frame.
	Text(String),
	/// Binary frame.
	Binary(Vec<u8>),
}

/// Instruction from the manager to an open link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkCommand {
	/// Write one frame.
	Send(Frame),
	/// Close the link with the given status.
	Close(CloseStatus),
}

/// Notification from an open link to the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
	/// A frame arrived.
	Frame(Frame),
	/// The transport reported a failure. The manager force-closes the link.
	Error(String),
	/// The link closed. No further events follow.
	Closed(CloseStatus),
}

/// An open link: an ordered outbound command queue and an ordered event stream.
#[derive(Debug)]
pub struct Link {
	commands: mpsc::UnboundedSender<LinkCommand>,
	events: mpsc::UnboundedReceiver<LinkEvent>,
}

impl Link {
	/// Assembles a link from its two channel halves.
	pub fn new(commands: mpsc::UnboundedSender<LinkCommand>, events: mpsc::UnboundedReceiver<LinkEvent>) -> Self {
		Self { commands, events }
	}

	/// Splits the link into its command sender and event receiver.
	pub fn split(self) -> (mpsc::UnboundedSender<LinkCommand>, mpsc::UnboundedReceiver<LinkEvent>) {
		(self.commands, self.events)
	}

	/// Queues one outbound frame.
	pub fn send(&self, frame: Frame) -> Result<()> {
		self.commands.send(LinkCommand::Send(frame)).map_err(|_| Error::LinkClosed)
	}

	/// Waits for the next event; `None` once the link's I/O side is gone.
	pub async fn recv(&mut self) -> Option<LinkEvent> {
		self.events.recv().await
	}
}

/// Opens links to the authority.
///
/// A resolved `connect` is the transport-level open acknowledgment: the
/// returned link is ready for writes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
	/// Opens one link.
	async fn connect(&self, endpoint: &Endpoint) -> Result<Link>;
}
