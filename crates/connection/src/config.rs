//! Connection manager configuration.

use std::time::Duration;

use crate::endpoint::Endpoint;

/// Configuration for a [`crate::ConnectionManager`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
	/// Where to connect.
	pub endpoint: Endpoint,
	/// Fixed delay between a lost link and the next attempt.
	pub retry_delay: Duration,
}

impl ConnectionConfig {
	/// Default delay before reconnecting.
	pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

	/// Create a configuration with the default retry delay.
	pub fn new(endpoint: Endpoint) -> Self {
		Self {
			endpoint,
			retry_delay: Self::DEFAULT_RETRY_DELAY,
		}
	}

	/// Set the reconnect delay.
	pub fn retry_delay(mut self, delay: Duration) -> Self {
		self.retry_delay = delay;
		self
	}
}
