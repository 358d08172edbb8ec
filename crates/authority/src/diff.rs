use listsync_model::{Document, PatchOp};

/// RFC 6902 operations turning `old` into `new`, as `json_patch` computes them
/// over the serialized documents. Equal documents yield no ops.
pub fn diff(old: &Document, new: &Document) -> serde_json::Result<Vec<PatchOp>> {
	let patch = json_patch::diff(&serde_json::to_value(old)?, &serde_json::to_value(new)?);
	serde_json::from_value(serde_json::to_value(patch)?)
}

#[cfg(test)]
mod tests {
	use listsync_model::{Item, OpKind};
	use pretty_assertions::assert_eq;
	use serde_json::json;

	use super::*;

	fn ops(old: &Document, new: &Document) -> Vec<PatchOp> {
		diff(old, new).expect("documents serialize")
	}

	fn shopping() -> Document {
		Document::new("Shopping")
			.with_item(1, Item::new("Milk"))
			.with_item(2, Item::new("Bread").with_done(true))
	}

	#[test]
	fn equal_documents_have_no_diff() {
		assert!(ops(&shopping(), &shopping()).is_empty());
	}

	#[test]
	fn rename_replaces_the_name() {
		let mut renamed = shopping();
		renamed.name = "Groceries".into();
		assert_eq!(
			ops(&shopping(), &renamed),
			vec![PatchOp {
				op: OpKind::Replace,
				path: "/name".into(),
				value: Some(json!("Groceries")),
			}]
		);
	}

	#[test]
	fn toggle_replaces_one_field() {
		let toggled = shopping().with_item(1, Item::new("Milk").with_done(true));
		assert_eq!(
			ops(&shopping(), &toggled),
			vec![PatchOp {
				op: OpKind::Replace,
				path: "/todos/1/completed".into(),
				value: Some(json!(true)),
			}]
		);
	}

	#[test]
	fn new_and_vanished_keys_become_add_and_remove() {
		let mut next = shopping().with_item(3, Item::new("Eggs"));
		next.items.remove(&2);

		let mut summary: Vec<_> = ops(&shopping(), &next)
			.into_iter()
			.map(|op| (op.path, op.op, op.value))
			.collect();
		summary.sort_by(|a, b| a.0.cmp(&b.0));
		assert_eq!(
			summary,
			vec![
				("/todos/2".to_owned(), OpKind::Remove, None),
				(
					"/todos/3".to_owned(),
					OpKind::Add,
					Some(json!({"name": "Eggs", "completed": false}))
				),
			]
		);
	}
}
