//! Frame encoding and decoding.

use listsync_model::{Action, InboundMessage};
use tokio::sync::mpsc;

use crate::transport::Frame;

/// One decoded inbound frame, in receipt order.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
	/// A well-formed authority message.
	Message(InboundMessage),
	/// A frame that failed to decode. Carries the decode error text.
	Malformed(String),
}

/// Producer half of the inbound queue.
pub type InboundSender = mpsc::UnboundedSender<Inbound>;
/// Single consumer of the inbound queue.
pub type InboundReceiver = mpsc::UnboundedReceiver<Inbound>;

/// Creates the single-consumer inbound queue.
pub fn inbound_channel() -> (InboundSender, InboundReceiver) {
	mpsc::unbounded_channel()
}

pub(crate) fn decode(frame: &Frame) -> Inbound {
	let decoded = match frame {
		Frame::Text(text) => InboundMessage::from_json(text),
		Frame::Binary(bytes) => InboundMessage::from_slice(bytes),
	};
	match decoded {
		Ok(msg) => Inbound::Message(msg),
		Err(err) => Inbound::Malformed(err.to_string()),
	}
}

pub(crate) fn encode(action: &Action) -> listsync_model::Result<Frame> {
	action.to_json().map(Frame::Text)
}
