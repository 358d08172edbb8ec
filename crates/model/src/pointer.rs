//! RFC 6901 JSON pointers used to address patch targets.

use std::fmt;

use crate::error::{ModelError, Result};

/// A parsed JSON pointer.
///
/// The empty pointer addresses the whole document. Segments are stored
/// unescaped; [`fmt::Display`] re-escapes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
	segments: Vec<String>,
}

impl Pointer {
	/// The pointer to the whole document.
	pub const fn root() -> Self {
		Self { segments: Vec::new() }
	}

	/// Parses pointer text such as `/todos/3/completed`.
	pub fn parse(text: &str) -> Result<Self> {
		if text.is_empty() {
			return Ok(Self::root());
		}
		let Some(rest) = text.strip_prefix('/') else {
			return Err(ModelError::Pointer {
				pointer: text.to_owned(),
				reason: "must be empty or start with '/'",
			});
		};
		let segments = rest
			.split('/')
			.map(|raw| unescape(raw).ok_or_else(|| ModelError::Pointer {
				pointer: text.to_owned(),
				reason: "'~' must be followed by '0' or '1'",
			}))
			.collect::<Result<Vec<_>>>()?;
		Ok(Self { segments })
	}

	/// Returns a pointer extended by one segment.
	#[must_use]
	pub fn push(mut self, segment: impl ToString) -> Self {
		self.segments.push(segment.to_string());
		self
	}

	/// Unescaped segments, outermost first.
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Returns true for the whole-document pointer.
	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}
}

fn unescape(raw: &str) -> Option<String> {
	if !raw.contains('~') {
		return Some(raw.to_owned());
	}
	let mut out = String::with_capacity(raw.len());
	let mut chars = raw.chars();
	while let Some(c) = chars.next() {
		if c != '~' {
			out.push(c);
			continue;
		}
		match chars.next() {
			Some('0') => out.push('~'),
			Some('1') => out.push('/'),
			_ => return None,
		}
	}
	Some(out)
}

impl fmt::Display for Pointer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for segment in &self.segments {
			write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
		}
		Ok(())
	}
}

impl std::str::FromStr for Pointer {
	type Err = ModelError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}
