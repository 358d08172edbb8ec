use pretty_assertions::assert_eq;
use serde_json::json;

use super::*;
use crate::{Action, Item};

#[test]
fn decodes_full_snapshot() {
	let text = r#"{"type":"Full","todo":{"name":"Shopping","todos":{"0":{"name":"Milk","completed":false}}}}"#;
	let msg = InboundMessage::from_json(text).expect("valid snapshot");

	assert_eq!(
		msg,
		InboundMessage::FullSnapshot {
			document: Document::new("Shopping").with_item(0, Item::new("Milk")),
		}
	);
}

#[test]
fn decodes_patch_with_mixed_ops() {
	let text = r#"{"type":"Patch","ops":[
		{"op":"replace","path":"/todos/0/completed","value":true},
		{"op":"remove","path":"/todos/2"},
		{"op":"move","from":"/todos/1","path":"/todos/4"}
	]}"#;
	let InboundMessage::DeltaPatch { ops } = InboundMessage::from_json(text).expect("valid patch") else {
		panic!("expected a patch");
	};

	assert_eq!(ops.len(), 3);
	assert_eq!(ops[0].op, OpKind::Replace);
	assert_eq!(ops[0].value, Some(json!(true)));
	assert_eq!(ops[1].op, OpKind::Remove);
	assert_eq!(ops[1].value, None);
	assert_eq!(ops[2].op, OpKind::Unsupported);
}

#[test]
fn binary_frames_decode_like_text() {
	let bytes = br#"{"type":"Patch","ops":[]}"#;
	assert_eq!(InboundMessage::from_slice(bytes).expect("valid"), InboundMessage::DeltaPatch { ops: vec![] });
	assert!(InboundMessage::from_slice(&[0xff, 0xfe]).is_err());
}

#[test]
fn unknown_message_type_is_malformed() {
	assert!(InboundMessage::from_json(r#"{"type":"Hello"}"#).is_err());
	assert!(InboundMessage::from_json("not json").is_err());
}

#[test]
fn actions_use_wire_names() {
	let cases = [
		(Action::SetName { name: "Groceries".into() }, json!({"type": "ChangeName", "name": "Groceries"})),
		(
			Action::AddItem { item: Item::new("") },
			json!({"type": "Add", "row": {"name": "", "completed": false}}),
		),
		(
			Action::UpdateItem {
				key: 4,
				item: Item::new("Eggs").with_done(true),
			},
			json!({"type": "Update", "index": 4, "row": {"name": "Eggs", "completed": true}}),
		),
		(Action::RemoveItem { key: 4 }, json!({"type": "Remove", "index": 4})),
		(Action::RemoveCompleted, json!({"type": "RemoveCompleted"})),
	];

	for (action, expected) in cases {
		let encoded: serde_json::Value = serde_json::from_str(&action.to_json().expect("encode")).expect("json");
		assert_eq!(encoded, expected, "{}", action.kind());
		assert_eq!(Action::from_json(&encoded.to_string()).expect("decode"), action);
	}
}

#[test]
fn patch_op_builders_render_pointer_text() {
	let path = crate::Pointer::root().push("todos").push(3u32);
	let op = PatchOp::add(&path, json!({"name": "Tea", "completed": false}));
	assert_eq!(serde_json::to_value(&op).expect("encode"), json!({"op": "add", "path": "/todos/3", "value": {"name": "Tea", "completed": false}}));
	assert_eq!(serde_json::to_value(PatchOp::remove(&path)).expect("encode"), json!({"op": "remove", "path": "/todos/3"}));
}
