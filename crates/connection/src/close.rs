//! Close status carried by a link shutdown.

use std::fmt;

/// Status of a closed link, mirroring WebSocket close codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseStatus {
	/// Close code.
	pub code: u16,
	/// Optional human-readable reason.
	pub reason: String,
}

impl CloseStatus {
	/// 1000: normal closure.
	pub const NORMAL: u16 = 1000;
	/// 1001: endpoint going away.
	pub const GOING_AWAY: u16 = 1001;
	/// 1005: close frame carried no status.
	pub const NO_STATUS: u16 = 1005;
	/// 1006: connection dropped without a close frame.
	pub const ABNORMAL: u16 = 1006;
	/// 4000: client-requested reconnect to obtain a fresh snapshot.
	pub const RESYNC: u16 = 4000;

	/// Creates a status with an empty reason.
	pub fn new(code: u16) -> Self {
		Self {
			code,
			reason: String::new(),
		}
	}

	/// Attaches a reason.
	#[must_use]
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = reason.into();
		self
	}

	/// Deliberate shutdown by the local side.
	pub fn normal() -> Self {
		Self::new(Self::NORMAL)
	}

	/// Loss without a close handshake.
	pub fn abnormal() -> Self {
		Self::new(Self::ABNORMAL)
	}

	/// Returns true for closes that must not trigger a reconnect (1000, 1001).
	pub const fn is_expected(&self) -> bool {
		matches!(self.code, Self::NORMAL | Self::GOING_AWAY)
	}
}

impl fmt::Display for CloseStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.reason.is_empty() {
			write!(f, "{}", self.code)
		} else {
			write!(f, "{} ({})", self.code, self.reason)
		}
	}
}
