//! The synchronized list document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Stable key of an item inside a [`Document`].
///
/// Keys are issued by the authority and never reused for a different item
/// within a session. Clients address items exclusively by key.
pub type ItemKey = u32;

/// One list entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
	/// Text of the entry.
	#[serde(rename = "name")]
	pub label: String,
	/// Whether the entry is checked off.
	#[serde(rename = "completed")]
	pub done: bool,
}

impl Item {
	/// Creates an unchecked item.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			done: false,
		}
	}

	/// Returns a copy with `done` set.
	#[must_use]
	pub fn with_done(mut self, done: bool) -> Self {
		self.done = done;
		self
	}
}

/// The shared list: a name plus items keyed by [`ItemKey`].
///
/// Equality is structural; the key map is ordered, so field and insertion
/// order never influence comparisons.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
	/// Label of the whole list.
	pub name: String,
	/// Items by key.
	#[serde(rename = "todos", default)]
	pub items: BTreeMap<ItemKey, Item>,
}

impl Document {
	/// Creates an empty document with the given name.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			items: BTreeMap::new(),
		}
	}

	/// Returns a copy with `item` inserted at `key`.
	#[must_use]
	pub fn with_item(mut self, key: ItemKey, item: Item) -> Self {
		self.items.insert(key, item);
		self
	}

	/// Looks up an item by key.
	pub fn item(&self, key: ItemKey) -> Option<&Item> {
		self.items.get(&key)
	}

	/// Returns true if any item is checked off.
	pub fn has_completed(&self) -> bool {
		self.items.values().any(|item| item.done)
	}
}
