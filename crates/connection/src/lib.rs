//! Self-healing connection to a listsync authority.
//!
//! The [`ConnectionManager`] owns at most one live link to the authority and
//! hides reconnection churn from everything above it:
//! * [`Transport`]: pluggable link factory ([`WebSocketTransport`], [`MemoryTransport`])
//! * [`ConnectionState`]: `Disconnected → Connecting → Connected → (Disconnected | Closed)`
//! * [`Inbound`]: decoded frames, delivered in receipt order on a single-consumer channel
//!
//! The manager knows nothing about document semantics. Outbound actions are
//! fire-and-forget: they are written when a link is up and silently dropped
//! otherwise. Abnormal closes and transport errors are retried after a fixed
//! delay, indefinitely; closes with status 1000 or 1001 end the loop.

#![warn(missing_docs)]

mod close;
mod codec;
mod config;
mod endpoint;
mod epoch;
mod manager;
mod memory;
mod state;
mod stats;
mod transport;
mod websocket;

pub use close::CloseStatus;
pub use codec::{Inbound, InboundReceiver, InboundSender, inbound_channel};
pub use config::ConnectionConfig;
pub use endpoint::Endpoint;
pub use manager::ConnectionManager;
pub use memory::{MemoryListener, MemoryPeer, MemoryTransport};
pub use state::ConnectionState;
pub use stats::ConnectionStats;
pub use transport::{Frame, Link, LinkCommand, LinkEvent, Transport};
pub use websocket::WebSocketTransport;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The endpoint could not be resolved into a socket URL.
	#[error("invalid endpoint {endpoint:?}: {reason}")]
	InvalidEndpoint {
		/// The text that failed to resolve.
		endpoint: String,
		/// Why it was rejected.
		reason: String,
	},
	/// The transport could not open a link.
	#[error("connect to {endpoint} failed: {reason}")]
	Connect {
		/// Where the link was headed.
		endpoint: String,
		/// Transport-specific failure description.
		reason: String,
	},
	/// A link was used after it closed.
	#[error("link closed")]
	LinkClosed,
}
