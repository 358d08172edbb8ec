//! Outbound user intents.

use serde::{Deserialize, Serialize};

use crate::document::{Item, ItemKey};

/// A user intent sent to the authority.
///
/// Actions carry no correlation id and are never acknowledged. Their effect is
/// observed only through a later inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
	/// Replace the document name.
	#[serde(rename = "ChangeName")]
	SetName {
		/// New document name.
		name: String,
	},
	/// Append a new item. The authority assigns its key.
	#[serde(rename = "Add")]
	AddItem {
		/// The item to append.
		#[serde(rename = "row")]
		item: Item,
	},
	/// Replace the item stored at `key`.
	#[serde(rename = "Update")]
	UpdateItem {
		/// Key of the item to replace.
		#[serde(rename = "index")]
		key: ItemKey,
		/// Replacement value.
		#[serde(rename = "row")]
		item: Item,
	},
	/// Delete the item stored at `key`.
	#[serde(rename = "Remove")]
	RemoveItem {
		/// Key of the item to delete.
		#[serde(rename = "index")]
		key: ItemKey,
	},
	/// Delete every item whose `done` flag is set.
	RemoveCompleted,
}

impl Action {
	/// Wire discriminant of this action.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::SetName { .. } => "ChangeName",
			Self::AddItem { .. } => "Add",
			Self::UpdateItem { .. } => "Update",
			Self::RemoveItem { .. } => "Remove",
			Self::RemoveCompleted => "RemoveCompleted",
		}
	}

	/// Encodes the action as one JSON text frame.
	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decodes an action from one JSON text frame.
	pub fn from_json(text: &str) -> crate::Result<Self> {
		Ok(serde_json::from_str(text)?)
	}
}
