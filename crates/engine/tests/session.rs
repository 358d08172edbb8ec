//! End-to-end behaviour of a [`Session`] against the reference authority.

use std::sync::Arc;
use std::time::Duration;

use listsync_authority::Authority;
use listsync_connection::{CloseStatus, ConnectionConfig, ConnectionState, Endpoint, MemoryTransport};
use listsync_engine::{DocumentSubscriber, DropReason, Session, SessionConfig, SyncHealth};
use listsync_model::{Action, Document, InboundMessage, Item, PatchOp, Pointer};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio::time::Instant;

struct Probe {
	documents: mpsc::UnboundedSender<Arc<Document>>,
	dropped: mpsc::UnboundedSender<DropReason>,
}

impl DocumentSubscriber for Probe {
	fn on_document(&mut self, document: Arc<Document>) {
		let _ = self.documents.send(document);
	}

	fn on_dropped(&mut self, reason: &DropReason) {
		let _ = self.dropped.send(reason.clone());
	}
}

struct Harness {
	authority: Authority,
	transport: MemoryTransport,
	session: Session,
	documents: mpsc::UnboundedReceiver<Arc<Document>>,
	dropped: mpsc::UnboundedReceiver<DropReason>,
}

impl Harness {
	fn start(document: Document, resync: bool) -> Self {
		Self::start_with(document, resync, |_| {})
	}

	fn start_with(document: Document, resync: bool, prepare: impl FnOnce(&Authority)) -> Self {
		let (transport, listener) = MemoryTransport::new();
		let authority = Authority::spawn(document, listener);
		prepare(&authority);

		let endpoint = Endpoint::from_origin("http://memory.test").expect("valid origin");
		let config = SessionConfig::new(ConnectionConfig::new(endpoint)).resync_on_divergence(resync);
		let (documents_tx, documents) = mpsc::unbounded_channel();
		let (dropped_tx, dropped) = mpsc::unbounded_channel();
		let probe = Probe {
			documents: documents_tx,
			dropped: dropped_tx,
		};
		let session = Session::start(Arc::new(transport.clone()), config, probe);
		Self {
			authority,
			transport,
			session,
			documents,
			dropped,
		}
	}

	async fn next_document(&mut self) -> Arc<Document> {
		tokio::time::timeout(Duration::from_secs(5), self.documents.recv())
			.await
			.expect("document timed out")
			.expect("subscriber alive")
	}

	async fn next_dropped(&mut self) -> DropReason {
		tokio::time::timeout(Duration::from_secs(5), self.dropped.recv())
			.await
			.expect("drop timed out")
			.expect("subscriber alive")
	}

	async fn wait_for_state(&self, target: ConnectionState) {
		let mut rx = self.session.subscribe_state();
		tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|state| *state == target))
			.await
			.expect("state transition timed out")
			.expect("state channel open");
	}
}

fn shopping() -> Document {
	Document::new("Shopping").with_item(0, Item::new("Milk"))
}

#[tokio::test]
async fn snapshot_then_patch() {
	let mut h = Harness::start(shopping(), true);

	let first = h.next_document().await;
	assert_eq!(first.name, "Shopping");
	assert_eq!(first.items.len(), 1);
	assert_eq!(first.item(0), Some(&Item::new("Milk")));

	h.authority
		.broadcast_text(r#"{"type":"Patch","ops":[{"op":"replace","path":"/todos/0/completed","value":true}]}"#);
	let second = h.next_document().await;
	assert_eq!(*second, Document::new("Shopping").with_item(0, Item::new("Milk").with_done(true)));
	assert_eq!(h.session.document().as_deref(), Some(second.as_ref()));
	assert_eq!(h.session.health(), SyncHealth::InSync);
}

#[tokio::test]
async fn dispatch_round_trips_through_the_authority() {
	let mut h = Harness::start(shopping(), true);
	h.next_document().await;

	h.session.dispatch(Action::AddItem { item: Item::new("Eggs") });
	assert_eq!(h.session.document().as_deref(), Some(&shopping()), "no optimistic update");

	let echoed = h.next_document().await;
	assert_eq!(echoed.item(1), Some(&Item::new("Eggs")));
	assert_eq!(*echoed, h.authority.document());
}

#[tokio::test(start_paused = true)]
async fn dispatch_while_disconnected_is_dropped() {
	let done = shopping().with_item(1, Item::new("Bread").with_done(true));
	let mut h = Harness::start(done.clone(), true);
	h.next_document().await;

	h.transport.set_refusing(true);
	h.authority.disconnect_all(CloseStatus::abnormal());
	h.wait_for_state(ConnectionState::Disconnected).await;

	h.session.dispatch(Action::RemoveCompleted);
	assert_eq!(h.session.connection().stats().actions_dropped, 1);
	assert_eq!(h.session.connection().stats().actions_sent, 0);
	assert_eq!(h.session.document().as_deref(), Some(&done));

	h.transport.set_refusing(false);
	let resynced = h.next_document().await;
	assert_eq!(*resynced, done);
	assert_eq!(h.authority.document(), done);
}

#[tokio::test(start_paused = true)]
async fn abnormal_close_reconnects_and_keeps_document() {
	let mut h = Harness::start(shopping(), true);
	h.next_document().await;

	let closed_at = Instant::now();
	h.authority.disconnect_all(CloseStatus::abnormal());
	h.wait_for_state(ConnectionState::Disconnected).await;
	assert_eq!(h.session.document().as_deref(), Some(&shopping()));

	let again = h.next_document().await;
	let elapsed = closed_at.elapsed();
	assert!(elapsed >= Duration::from_millis(500), "reconnected too early: {elapsed:?}");
	assert!(elapsed < Duration::from_millis(550), "reconnected too late: {elapsed:?}");
	assert_eq!(*again, shopping());
	assert_eq!(h.session.connection().stats().attempts, 2);
}

#[tokio::test(start_paused = true)]
async fn normal_close_does_not_reconnect() {
	let mut h = Harness::start(shopping(), true);
	h.next_document().await;

	h.authority.disconnect_all(CloseStatus::normal());
	h.wait_for_state(ConnectionState::Disconnected).await;
	tokio::time::sleep(Duration::from_secs(5)).await;

	assert_eq!(h.session.connection().stats().attempts, 1);
	assert_eq!(h.session.state(), ConnectionState::Disconnected);
	assert_eq!(h.session.document().as_deref(), Some(&shopping()));
}

#[tokio::test]
async fn replayed_remove_completed_patch_removes_nothing_more() {
	let start = Document::new("L")
		.with_item(1, Item::new("a").with_done(true))
		.with_item(2, Item::new("b"))
		.with_item(3, Item::new("c").with_done(true));
	let mut h = Harness::start(start, false);
	h.next_document().await;

	let ops = h.authority.apply(Action::RemoveCompleted);
	let after = h.next_document().await;
	assert_eq!(*after, Document::new("L").with_item(2, Item::new("b")));

	assert!(h.authority.apply(Action::RemoveCompleted).is_empty(), "second removal changes nothing");
	h.authority.broadcast(&InboundMessage::DeltaPatch { ops });
	assert!(matches!(h.next_dropped().await, DropReason::Rejected(_)));
	assert_eq!(h.session.document().as_deref(), Some(after.as_ref()));
	assert_eq!(h.session.health(), SyncHealth::Diverged);
}

#[tokio::test]
async fn patch_before_snapshot_is_dropped_and_reported() {
	let mut h = Harness::start_with(shopping(), true, |authority| authority.set_greeting(false));
	h.wait_for_state(ConnectionState::Connected).await;
	while h.authority.peer_count() == 0 {
		tokio::task::yield_now().await;
	}

	h.authority.apply(Action::SetName { name: "Groceries".into() });
	assert_eq!(h.next_dropped().await, DropReason::Unhydrated);
	assert!(h.session.document().is_none());
	assert_eq!(h.session.stats().dropped_unhydrated, 1);
	assert!(h.documents.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn divergence_requests_a_fresh_snapshot() {
	let mut h = Harness::start(shopping(), true);
	h.next_document().await;

	let bad = PatchOp::remove(&Pointer::parse("/todos/9").expect("pointer"));
	h.authority.broadcast(&InboundMessage::DeltaPatch { ops: vec![bad] });
	assert!(matches!(h.next_dropped().await, DropReason::Rejected(_)));

	let fresh = h.next_document().await;
	assert_eq!(*fresh, shopping());
	assert_eq!(h.session.health(), SyncHealth::InSync);
	assert_eq!(h.session.stats().patches_rejected, 1);
	assert_eq!(h.session.connection().stats().established, 2);
}

#[tokio::test]
async fn close_discards_the_document() {
	let mut h = Harness::start(shopping(), true);
	h.next_document().await;

	h.session.close().await;
	assert!(h.session.document().is_none());
	assert_eq!(h.session.state(), ConnectionState::Closed);

	h.session.dispatch(Action::RemoveCompleted);
	assert_eq!(h.session.connection().stats().actions_dropped, 1);
}
