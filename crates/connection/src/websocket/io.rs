use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

use crate::close::CloseStatus;
use crate::endpoint::Endpoint;
use crate::transport::{Frame, LinkCommand, LinkEvent};

/// How long a local close waits for the peer's close acknowledgment.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Runs the I/O loop for a single socket.
///
/// Always finishes by emitting exactly one [`LinkEvent::Closed`].
pub(super) async fn run_link_io<S>(
	endpoint: Endpoint,
	stream: WebSocketStream<S>,
	mut commands: mpsc::UnboundedReceiver<LinkCommand>,
	events: mpsc::UnboundedSender<LinkEvent>,
) where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let (mut sink, mut source) = stream.split();

	let status = loop {
		tokio::select! {
			// Outbound writes are handled one at a time, in queue order
			command = commands.recv() => match command {
				Some(LinkCommand::Send(frame)) => {
					if let Err(e) = sink.send(to_message(frame)).await {
						tracing::warn!(endpoint = %endpoint, error = %e, "websocket.write_failed");
						let _ = events.send(LinkEvent::Error(e.to_string()));
						break CloseStatus::abnormal();
					}
				}
				Some(LinkCommand::Close(status)) => {
					let frame = CloseFrame {
						code: CloseCode::from(status.code),
						reason: status.reason.clone().into(),
					};
					if sink.send(Message::Close(Some(frame))).await.is_ok() {
						let _ = tokio::time::timeout(CLOSE_GRACE, drain_until_close(&mut source)).await;
					}
					break status;
				}
				None => {
					// The manager dropped its end without closing
					let _ = sink.send(Message::Close(None)).await;
					break CloseStatus::normal();
				}
			},

			message = source.next() => match message {
				Some(Ok(Message::Text(text))) => {
					let _ = events.send(LinkEvent::Frame(Frame::Text(text.as_str().to_owned())));
				}
				Some(Ok(Message::Binary(bytes))) => {
					let _ = events.send(LinkEvent::Frame(Frame::Binary(bytes.to_vec())));
				}
				Some(Ok(Message::Close(frame))) => {
					break match frame {
						Some(frame) => CloseStatus::new(u16::from(frame.code)).with_reason(frame.reason.as_str()),
						None => CloseStatus::new(CloseStatus::NO_STATUS),
					};
				}
				// Ping/pong are answered by tungstenite itself
				Some(Ok(_)) => {}
				Some(Err(e)) => {
					tracing::warn!(endpoint = %endpoint, error = %e, "websocket.read_failed");
					let _ = events.send(LinkEvent::Error(e.to_string()));
					break CloseStatus::abnormal();
				}
				None => break CloseStatus::abnormal(),
			},
		}
	};

	// Flushes a pending close reply, if any
	let _ = sink.close().await;
	tracing::debug!(endpoint = %endpoint, status = %status, "websocket.closed");
	let _ = events.send(LinkEvent::Closed(status));
}

fn to_message(frame: Frame) -> Message {
	match frame {
		Frame::Text(text) => Message::Text(text.into()),
		Frame::Binary(bytes) => Message::Binary(bytes.into()),
	}
}

async fn drain_until_close<S>(source: &mut SplitStream<WebSocketStream<S>>)
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	while let Some(Ok(message)) = source.next().await {
		if message.is_close() {
			break;
		}
	}
}
