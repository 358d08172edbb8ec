use listsync_model::{Action, Document, ItemKey};

/// Applies one action to the authoritative document.
///
/// New items get `max(existing) + 1`, or `1` for an empty list. Actions on
/// missing keys are no-ops, except `UpdateItem`, which inserts.
pub fn apply_action(document: &mut Document, action: Action) {
	match action {
		Action::SetName { name } => document.name = name,
		Action::AddItem { item } => {
			let key = next_key(document);
			document.items.insert(key, item);
		}
		Action::UpdateItem { key, item } => {
			document.items.insert(key, item);
		}
		Action::RemoveItem { key } => {
			document.items.remove(&key);
		}
		Action::RemoveCompleted => document.items.retain(|_, item| !item.done),
	}
}

fn next_key(document: &Document) -> ItemKey {
	document.items.keys().next_back().copied().unwrap_or_default() + 1
}

#[cfg(test)]
mod tests {
	use listsync_model::Item;
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn add_issues_keys_after_the_highest() {
		let mut doc = Document::new("L");
		apply_action(&mut doc, Action::AddItem { item: Item::new("a") });
		assert_eq!(doc.items.keys().copied().collect::<Vec<_>>(), vec![1]);

		doc.items.insert(7, Item::new("b"));
		apply_action(&mut doc, Action::AddItem { item: Item::new("c") });
		assert_eq!(doc.item(8), Some(&Item::new("c")));
	}

	#[test]
	fn remove_completed_keeps_open_items() {
		let mut doc = Document::new("L")
			.with_item(1, Item::new("a").with_done(true))
			.with_item(2, Item::new("b"))
			.with_item(3, Item::new("c").with_done(true));
		apply_action(&mut doc, Action::RemoveCompleted);
		assert_eq!(doc, Document::new("L").with_item(2, Item::new("b")));

		apply_action(&mut doc, Action::RemoveCompleted);
		assert_eq!(doc, Document::new("L").with_item(2, Item::new("b")));
	}

	#[test]
	fn update_upserts_and_remove_tolerates_missing() {
		let mut doc = Document::new("L");
		apply_action(&mut doc, Action::UpdateItem { key: 4, item: Item::new("x") });
		apply_action(&mut doc, Action::RemoveItem { key: 9 });
		apply_action(&mut doc, Action::SetName { name: "M".into() });
		assert_eq!(doc, Document::new("M").with_item(4, Item::new("x")));
	}
}
