use listsync_connection::{Endpoint, Link, LinkEvent, MemoryTransport, Transport};
use listsync_model::{Item, OpKind};
use pretty_assertions::assert_eq;

use super::*;

fn endpoint() -> Endpoint {
	Endpoint::from_origin("http://memory.test").expect("valid origin")
}

async fn message(link: &mut Link) -> InboundMessage {
	match link.recv().await {
		Some(LinkEvent::Frame(Frame::Text(text))) => InboundMessage::from_json(&text).expect("well-formed message"),
		other => panic!("expected a text frame, got {other:?}"),
	}
}

fn action(link: &Link, action: Action) {
	let text = action.to_json().expect("encode");
	link.send(Frame::Text(text)).expect("link open");
}

#[tokio::test]
async fn new_link_is_greeted_with_snapshot() {
	let (transport, listener) = MemoryTransport::new();
	let doc = Document::new("Shopping").with_item(0, Item::new("Milk"));
	let _authority = Authority::spawn(doc.clone(), listener);

	let mut link = transport.connect(&endpoint()).await.expect("connect");
	assert_eq!(message(&mut link).await, InboundMessage::FullSnapshot { document: doc });
}

#[tokio::test]
async fn actions_are_echoed_to_every_link() {
	let (transport, listener) = MemoryTransport::new();
	let authority = Authority::spawn(Document::new("L"), listener);

	let mut first = transport.connect(&endpoint()).await.expect("connect");
	let mut second = transport.connect(&endpoint()).await.expect("connect");
	message(&mut first).await;
	message(&mut second).await;

	action(&first, Action::AddItem { item: Item::new("Eggs") });
	for link in [&mut first, &mut second] {
		let InboundMessage::DeltaPatch { ops } = message(link).await else {
			panic!("expected a patch");
		};
		assert_eq!(ops.len(), 1);
		assert_eq!(ops[0].op, OpKind::Add);
		assert_eq!(ops[0].path, "/todos/1");
	}
	assert_eq!(authority.document(), Document::new("L").with_item(1, Item::new("Eggs")));
}

#[tokio::test]
async fn no_op_actions_are_not_broadcast() {
	let (transport, listener) = MemoryTransport::new();
	let authority = Authority::spawn(Document::new("L").with_item(1, Item::new("a")), listener);
	let mut link = transport.connect(&endpoint()).await.expect("connect");
	message(&mut link).await;

	assert!(authority.apply(Action::RemoveCompleted).is_empty());
	action(&link, Action::RemoveItem { key: 42 });
	action(&link, Action::SetName { name: "M".into() });

	// The rename is the first thing to arrive
	let InboundMessage::DeltaPatch { ops } = message(&mut link).await else {
		panic!("expected a patch");
	};
	assert_eq!(ops, vec![PatchOp::replace(&listsync_model::Pointer::parse("/name").expect("pointer"), "M".into())]);
}

#[tokio::test]
async fn unknown_actions_are_ignored() {
	let (transport, listener) = MemoryTransport::new();
	let authority = Authority::spawn(Document::new("L"), listener);
	let mut link = transport.connect(&endpoint()).await.expect("connect");
	message(&mut link).await;

	link.send(Frame::Text(r#"{"type":"Shuffle"}"#.into())).expect("link open");
	link.send(Frame::Binary(br#"{"type":"ChangeName","name":"M"}"#.to_vec())).expect("link open");

	assert!(matches!(message(&mut link).await, InboundMessage::DeltaPatch { .. }));
	assert_eq!(authority.document().name, "M");
	assert_eq!(authority.peer_count(), 1);
}

#[tokio::test]
async fn disconnect_all_closes_with_status() {
	let (transport, listener) = MemoryTransport::new();
	let authority = Authority::spawn(Document::new("L"), listener);
	let mut link = transport.connect(&endpoint()).await.expect("connect");
	message(&mut link).await;

	authority.disconnect_all(CloseStatus::new(CloseStatus::GOING_AWAY));
	assert_eq!(link.recv().await, Some(LinkEvent::Closed(CloseStatus::new(CloseStatus::GOING_AWAY))));
	assert_eq!(authority.peer_count(), 0);
}

#[tokio::test]
async fn greeting_can_be_withheld() {
	let (transport, listener) = MemoryTransport::new();
	let authority = Authority::spawn(Document::new("L"), listener);
	authority.set_greeting(false);

	let mut link = transport.connect(&endpoint()).await.expect("connect");
	while authority.peer_count() == 0 {
		tokio::task::yield_now().await;
	}
	authority.apply(Action::SetName { name: "M".into() });
	assert!(matches!(message(&mut link).await, InboundMessage::DeltaPatch { .. }));
}
