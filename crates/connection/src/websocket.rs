//! WebSocket transport.

mod io;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;

use crate::endpoint::Endpoint;
use crate::transport::{Link, Transport};
use crate::{Error, Result};

/// Transport that opens one WebSocket per link.
///
/// Each link runs a dedicated I/O task that serializes outbound writes and
/// forwards inbound frames in arrival order.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Create a new WebSocket transport.
	pub const fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Transport for WebSocketTransport {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Link> {
		tracing::debug!(endpoint = %endpoint, "websocket.connect");

		let (stream, response) = connect_async(endpoint.as_str()).await.map_err(|e| Error::Connect {
			endpoint: endpoint.to_string(),
			reason: e.to_string(),
		})?;

		tracing::debug!(endpoint = %endpoint, status = %response.status(), "websocket.open");

		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let (event_tx, event_rx) = mpsc::unbounded_channel();
		tokio::spawn(io::run_link_io(endpoint.clone(), stream, command_rx, event_tx));

		Ok(Link::new(command_tx, event_rx))
	}
}
