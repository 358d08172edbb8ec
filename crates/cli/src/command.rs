//! Stdin commands and their translation into actions.

use std::str::FromStr;

use listsync_model::{Action, Document, Item, ItemKey};
use thiserror::Error;

pub const HELP: &str = "\
commands:
  name <text>          rename the list
  add [label]          append an item
  edit <key> <label>   change an item's label
  toggle <key>         check or uncheck an item
  rm <key>             delete an item
  clear-done           delete every checked item
  show                 print the list again
  quit                 leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	Rename(String),
	Add(String),
	Edit { key: ItemKey, label: String },
	Toggle(ItemKey),
	Remove(ItemKey),
	ClearDone,
	Show,
	Help,
	Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
	#[error("empty command")]
	Empty,
	#[error("unknown command {0:?}")]
	Unknown(String),
	#[error("{command} needs {what}")]
	MissingArgument { command: &'static str, what: &'static str },
	#[error("{0:?} is not an item key")]
	InvalidKey(String),
	#[error("the list has not loaded yet")]
	NotLoaded,
	#[error("no item with key {0}")]
	UnknownKey(ItemKey),
}

impl FromStr for Command {
	type Err = CommandError;

	fn from_str(line: &str) -> Result<Self, Self::Err> {
		let line = line.trim();
		let (verb, rest) = match line.split_once(char::is_whitespace) {
			Some((verb, rest)) => (verb, rest.trim()),
			None => (line, ""),
		};

		let command = match verb {
			"" => return Err(CommandError::Empty),
			"name" if rest.is_empty() => {
				return Err(CommandError::MissingArgument {
					command: "name",
					what: "a new name",
				});
			}
			"name" => Self::Rename(rest.to_owned()),
			"add" => Self::Add(rest.to_owned()),
			"edit" => {
				let (key, label) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
				Self::Edit {
					key: parse_key("edit", key)?,
					label: label.trim().to_owned(),
				}
			}
			"toggle" => Self::Toggle(parse_key("toggle", rest)?),
			"rm" => Self::Remove(parse_key("rm", rest)?),
			"clear-done" => Self::ClearDone,
			"show" => Self::Show,
			"help" | "?" => Self::Help,
			"quit" | "exit" => Self::Quit,
			other => return Err(CommandError::Unknown(other.to_owned())),
		};
		Ok(command)
	}
}

fn parse_key(command: &'static str, text: &str) -> Result<ItemKey, CommandError> {
	if text.is_empty() {
		return Err(CommandError::MissingArgument { command, what: "an item key" });
	}
	text.parse().map_err(|_| CommandError::InvalidKey(text.to_owned()))
}

impl Command {
	/// Builds the action for this command against the last-known document.
	///
	/// `Ok(None)` means there is nothing to send.
	pub fn to_action(&self, document: Option<&Document>) -> Result<Option<Action>, CommandError> {
		let action = match self {
			Self::Rename(name) => Action::SetName { name: name.clone() },
			Self::Add(label) => Action::AddItem { item: Item::new(label.as_str()) },
			Self::Edit { key, label } => {
				let current = known_item(document, *key)?;
				Action::UpdateItem {
					key: *key,
					item: Item {
						label: label.clone(),
						done: current.done,
					},
				}
			}
			Self::Toggle(key) => {
				let current = known_item(document, *key)?;
				Action::UpdateItem {
					key: *key,
					item: current.clone().with_done(!current.done),
				}
			}
			Self::Remove(key) => {
				known_item(document, *key)?;
				Action::RemoveItem { key: *key }
			}
			Self::ClearDone if document.is_some_and(Document::has_completed) => Action::RemoveCompleted,
			Self::ClearDone | Self::Show | Self::Help | Self::Quit => return Ok(None),
		};
		Ok(Some(action))
	}
}

fn known_item(document: Option<&Document>, key: ItemKey) -> Result<&Item, CommandError> {
	document
		.ok_or(CommandError::NotLoaded)?
		.item(key)
		.ok_or(CommandError::UnknownKey(key))
}
