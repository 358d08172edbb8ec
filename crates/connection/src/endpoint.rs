//! Socket endpoint resolution.

use std::fmt;

use url::Url;

use crate::{Error, Result};

/// Path the authority serves its socket on.
pub const SOCKET_PATH: &str = "/ws";

/// Resolved socket URL of the authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	url: Url,
}

impl Endpoint {
	/// Resolves the socket endpoint from a page origin or an explicit socket URL.
	///
	/// `http://host` maps to `ws://host/ws` and `https://host` to `wss://host/ws`,
	/// keeping the port. `ws://` and `wss://` URLs are taken verbatim.
	pub fn from_origin(origin: &str) -> Result<Self> {
		let invalid = |reason: String| Error::InvalidEndpoint {
			endpoint: origin.to_owned(),
			reason,
		};
		let mut url = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
		if url.host_str().is_none() {
			return Err(invalid("missing host".into()));
		}

		let socket_scheme = match url.scheme() {
			"ws" | "wss" => return Ok(Self { url }),
			"http" => "ws",
			"https" => "wss",
			other => return Err(invalid(format!("unsupported scheme {other:?}"))),
		};
		url.set_scheme(socket_scheme).map_err(|()| invalid("cannot switch scheme".into()))?;
		url.set_path(SOCKET_PATH);
		url.set_query(None);
		url.set_fragment(None);
		Ok(Self { url })
	}

	/// The socket URL as text.
	pub fn as_str(&self) -> &str {
		self.url.as_str()
	}

	/// Returns true for the encrypted variant.
	pub fn is_secure(&self) -> bool {
		self.url.scheme() == "wss"
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.url.as_str())
	}
}

impl std::str::FromStr for Endpoint {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		Self::from_origin(s)
	}
}
