//! Connection lifecycle state.

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum ConnectionState {
	/// No link, either before `connect()`, between retries, or after an expected close.
	#[default]
	Disconnected,
	/// A link is being opened.
	Connecting,
	/// The link is open; actions are written.
	Connected,
	/// `close()` was called. Terminal.
	Closed,
}

impl ConnectionState {
	/// Returns true once the manager has been torn down.
	pub const fn is_closed(self) -> bool {
		matches!(self, Self::Closed)
	}

	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Disconnected => "disconnected",
			Self::Connecting => "connecting",
			Self::Connected => "connected",
			Self::Closed => "closed",
		}
	}
}
