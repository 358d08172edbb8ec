//! The interpreter against patches produced by the authority's differ.

use listsync_authority::{apply_action, diff};
use listsync_engine::apply_patch;
use listsync_model::{Action, Document, Item};
use pretty_assertions::assert_eq;

/// Applies each action on the authority side and replays its patch on a client copy.
fn replay(start: Document, actions: Vec<Action>) -> Document {
	let mut authority = start.clone();
	let mut client = start;
	for action in actions {
		let before = authority.clone();
		apply_action(&mut authority, action);
		let ops = diff(&before, &authority).expect("documents serialize");
		client = apply_patch(&client, &ops).expect("authority patches apply cleanly");
		assert_eq!(client, authority);
	}
	client
}

#[test]
fn every_action_kind_replays_onto_the_client() {
	let end = replay(
		Document::new("Todo List"),
		vec![
			Action::AddItem { item: Item::new("Milk") },
			Action::AddItem { item: Item::new("Bread") },
			Action::SetName { name: "Shopping".into() },
			Action::UpdateItem {
				key: 2,
				item: Item::new("Rye bread").with_done(true),
			},
			Action::AddItem { item: Item::new("Eggs") },
			Action::RemoveItem { key: 1 },
			Action::RemoveCompleted,
		],
	);
	assert_eq!(end, Document::new("Shopping").with_item(3, Item::new("Eggs")));
}

#[test]
fn emptying_and_refilling_the_list_replays() {
	let start = Document::new("L")
		.with_item(1, Item::new("a").with_done(true))
		.with_item(2, Item::new("b").with_done(true));
	let end = replay(
		start,
		vec![Action::RemoveCompleted, Action::AddItem { item: Item::new("c") }],
	);
	assert_eq!(end, Document::new("L").with_item(1, Item::new("c")));
}

#[test]
fn keys_past_nine_keep_their_identity() {
	let mut start = Document::new("L");
	for key in 1..=11 {
		start = start.with_item(key, Item::new(format!("item {key}")));
	}
	let end = replay(
		start,
		vec![
			Action::UpdateItem {
				key: 10,
				item: Item::new("ten").with_done(true),
			},
			Action::RemoveItem { key: 1 },
		],
	);
	assert_eq!(end.item(10), Some(&Item::new("ten").with_done(true)));
	assert_eq!(end.item(1), None);
	assert_eq!(end.items.len(), 10);
}
