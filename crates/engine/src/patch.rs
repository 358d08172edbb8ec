//! Patch interpreter.
//!
//! Inbound patches are RFC 6902 style operation lists, but only a closed set
//! of targets inside a [`Document`] is addressable:
//!
//! | pointer                  | target            |
//! |--------------------------|-------------------|
//! | (empty)                  | whole document    |
//! | `/name`                  | document name     |
//! | `/todos`                 | whole item map    |
//! | `/todos/{key}`           | one item          |
//! | `/todos/{key}/name`      | item label        |
//! | `/todos/{key}/completed` | item done flag    |
//!
//! Items are always addressed by key, never by position. A patch is applied to
//! a copy of the document; the first failing operation aborts the whole patch.

use listsync_model::{Document, Item, ItemKey, OpKind, PatchOp, Pointer};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Why a patch could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PatchError {
	/// The path is not a valid JSON pointer.
	#[error("invalid path {path:?}: {reason}")]
	InvalidPath {
		/// Offending path text.
		path: String,
		/// Parser message.
		reason: String,
	},
	/// The path is a valid pointer but names nothing in a document.
	#[error("path {path:?} does not address a document field")]
	UnknownPath {
		/// Offending path text.
		path: String,
	},
	/// The path names an item key that is not present.
	#[error("path {path:?} refers to missing item {key}")]
	MissingItem {
		/// Offending path text.
		path: String,
		/// The absent key.
		key: ItemKey,
	},
	/// `add`/`replace` without a value.
	#[error("{op} at {path:?} requires a value")]
	MissingValue {
		/// Operation verb.
		op: &'static str,
		/// Offending path text.
		path: String,
	},
	/// The value does not fit the target's type.
	#[error("value at {path:?} has the wrong shape: {reason}")]
	TypeMismatch {
		/// Offending path text.
		path: String,
		/// Decoder message.
		reason: String,
	},
	/// `remove` on something that always exists.
	#[error("cannot remove required field {path:?}")]
	RemoveRequired {
		/// Offending path text.
		path: String,
	},
	/// A verb other than `add`, `replace`, `remove`.
	#[error("unsupported operation at {path:?}")]
	Unsupported {
		/// Offending path text.
		path: String,
	},
}

/// Addressable part of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
	Document,
	Name,
	Items,
	Item(ItemKey),
	Label(ItemKey),
	Done(ItemKey),
}

impl Target {
	fn resolve(path: &str) -> Result<Self, PatchError> {
		let pointer = Pointer::parse(path).map_err(|e| PatchError::InvalidPath {
			path: path.to_owned(),
			reason: e.to_string(),
		})?;
		let unknown = || PatchError::UnknownPath { path: path.to_owned() };

		let segments: Vec<&str> = pointer.segments().iter().map(String::as_str).collect();
		let target = match segments.as_slice() {
			[] => Self::Document,
			["name"] => Self::Name,
			["todos"] => Self::Items,
			["todos", key] => Self::Item(parse_key(key).ok_or_else(unknown)?),
			["todos", key, "name"] => Self::Label(parse_key(key).ok_or_else(unknown)?),
			["todos", key, "completed"] => Self::Done(parse_key(key).ok_or_else(unknown)?),
			_ => return Err(unknown()),
		};
		Ok(target)
	}
}

/// Parses a canonical decimal key. `01`, `+1` and `-` are not keys.
fn parse_key(segment: &str) -> Option<ItemKey> {
	let canonical = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) && (segment == "0" || !segment.starts_with('0'));
	if canonical { segment.parse().ok() } else { None }
}

/// Applies `ops` in order to a copy of `document`.
///
/// Deterministic: structurally equal inputs give structurally equal outputs.
pub fn apply_patch(document: &Document, ops: &[PatchOp]) -> Result<Document, PatchError> {
	let mut next = document.clone();
	for op in ops {
		apply_op(&mut next, op)?;
	}
	Ok(next)
}

fn apply_op(document: &mut Document, op: &PatchOp) -> Result<(), PatchError> {
	let target = Target::resolve(&op.path)?;
	match op.op {
		OpKind::Add => set(document, target, op, "add"),
		OpKind::Replace => set(document, target, op, "replace"),
		OpKind::Remove => remove(document, target, &op.path),
		OpKind::Unsupported => Err(PatchError::Unsupported { path: op.path.clone() }),
	}
}

fn set(document: &mut Document, target: Target, op: &PatchOp, verb: &'static str) -> Result<(), PatchError> {
	let path = op.path.as_str();
	let value = op.value.as_ref().ok_or_else(|| PatchError::MissingValue {
		op: verb,
		path: path.to_owned(),
	})?;

	match target {
		Target::Document => *document = decode(path, value)?,
		Target::Name => document.name = decode(path, value)?,
		Target::Items => document.items = decode(path, value)?,
		Target::Item(key) => {
			let item: Item = decode(path, value)?;
			if op.op == OpKind::Replace && !document.items.contains_key(&key) {
				return Err(PatchError::MissingItem { path: path.to_owned(), key });
			}
			document.items.insert(key, item);
		}
		Target::Label(key) => item_mut(document, key, path)?.label = decode(path, value)?,
		Target::Done(key) => item_mut(document, key, path)?.done = decode(path, value)?,
	}
	Ok(())
}

fn remove(document: &mut Document, target: Target, path: &str) -> Result<(), PatchError> {
	match target {
		Target::Item(key) => document
			.items
			.remove(&key)
			.map(drop)
			.ok_or_else(|| PatchError::MissingItem { path: path.to_owned(), key }),
		_ => Err(PatchError::RemoveRequired { path: path.to_owned() }),
	}
}

fn item_mut<'a>(document: &'a mut Document, key: ItemKey, path: &str) -> Result<&'a mut Item, PatchError> {
	document
		.items
		.get_mut(&key)
		.ok_or_else(|| PatchError::MissingItem { path: path.to_owned(), key })
}

fn decode<T: DeserializeOwned>(path: &str, value: &Value) -> Result<T, PatchError> {
	T::deserialize(value).map_err(|e| PatchError::TypeMismatch {
		path: path.to_owned(),
		reason: e.to_string(),
	})
}
