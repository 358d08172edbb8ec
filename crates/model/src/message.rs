//! Inbound messages from the authority.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::pointer::Pointer;

/// A message emitted by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
	/// Authoritative replacement of the whole document.
	#[serde(rename = "Full")]
	FullSnapshot {
		/// The complete document.
		#[serde(rename = "todo")]
		document: Document,
	},
	/// Ordered structural edits against the previous document version.
	#[serde(rename = "Patch")]
	DeltaPatch {
		/// Operations, applied in listed order.
		ops: Vec<PatchOp>,
	},
}

impl InboundMessage {
	/// Wire discriminant of this message.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::FullSnapshot { .. } => "Full",
			Self::DeltaPatch { .. } => "Patch",
		}
	}

	/// Decodes one text frame.
	pub fn from_json(text: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(text)?)
	}

	/// Decodes one binary frame holding UTF-8 JSON.
	pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
		Self::from_json(std::str::from_utf8(bytes)?)
	}

	/// Encodes the message as one JSON text frame.
	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string(self)?)
	}
}

/// Verb of a [`PatchOp`].
///
/// Only `add`, `replace` and `remove` are interpreted. Other RFC 6902 verbs
/// decode as [`OpKind::Unsupported`] so one odd operation fails its own
/// message instead of the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
	/// Set a value, inserting a new key if needed.
	Add,
	/// Overwrite an existing value.
	Replace,
	/// Delete an existing key.
	Remove,
	/// Any verb this client does not interpret.
	#[serde(other)]
	Unsupported,
}

/// One structural edit inside a delta patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
	/// What to do.
	pub op: OpKind,
	/// JSON pointer text addressing the target.
	pub path: String,
	/// New value for `add`/`replace`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<Value>,
}

impl PatchOp {
	/// Builds an `add` operation.
	pub fn add(path: &Pointer, value: Value) -> Self {
		Self {
			op: OpKind::Add,
			path: path.to_string(),
			value: Some(value),
		}
	}

	/// Builds a `replace` operation.
	pub fn replace(path: &Pointer, value: Value) -> Self {
		Self {
			op: OpKind::Replace,
			path: path.to_string(),
			value: Some(value),
		}
	}

	/// Builds a `remove` operation.
	pub fn remove(path: &Pointer) -> Self {
		Self {
			op: OpKind::Remove,
			path: path.to_string(),
			value: None,
		}
	}
}

#[cfg(test)]
mod tests;
