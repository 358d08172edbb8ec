//! One client session: a connection, a reconciler, and the pump between them.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use listsync_connection::{ConnectionConfig, ConnectionManager, ConnectionState, InboundReceiver, Transport, inbound_channel};
use listsync_model::{Action, Document};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::reconcile::{EngineStats, Outcome, Reconciler, SyncHealth};
use crate::subscriber::{DocumentSubscriber, DropReason};

/// Session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// How to reach the authority.
	pub connection: ConnectionConfig,
	/// Reconnect to obtain a fresh snapshot after the document diverges.
	pub resync_on_divergence: bool,
}

impl SessionConfig {
	/// Settings with resync on divergence enabled.
	pub fn new(connection: ConnectionConfig) -> Self {
		Self {
			connection,
			resync_on_divergence: true,
		}
	}

	/// Set whether divergence triggers a reconnect.
	#[must_use]
	pub fn resync_on_divergence(mut self, enabled: bool) -> Self {
		self.resync_on_divergence = enabled;
		self
	}
}

#[derive(Debug, Clone, Copy, Default)]
struct EngineStatus {
	health: SyncHealth,
	stats: EngineStats,
}

/// A live session against one authority.
///
/// Owns the only connection and the only document of this client. Inbound
/// messages are processed one at a time by a dedicated task; the document is
/// never mutated by outgoing actions. Dropping the session tears everything
/// down without a close frame; prefer [`Session::close`].
pub struct Session {
	connection: ConnectionManager,
	view: Arc<ArcSwapOption<Document>>,
	status: watch::Receiver<EngineStatus>,
	pump: Mutex<Option<JoinHandle<()>>>,
	stop: CancellationToken,
	_stop_guard: DropGuard,
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("connection", &self.connection)
			.field("health", &self.health())
			.finish_non_exhaustive()
	}
}

impl Session {
	/// Connects and starts processing inbound messages. Must be called from within a Tokio runtime.
	pub fn start<S: DocumentSubscriber>(transport: Arc<dyn Transport>, config: SessionConfig, subscriber: S) -> Self {
		let connection = ConnectionManager::new(transport, config.connection);
		let view = Arc::new(ArcSwapOption::empty());
		let (status_tx, status) = watch::channel(EngineStatus::default());
		let stop = CancellationToken::new();
		let (inbound_tx, inbound_rx) = inbound_channel();

		let engine = Reconciler::new(ViewPublisher {
			view: Arc::clone(&view),
			subscriber,
		});
		let pump = tokio::spawn(run_pump(
			engine,
			inbound_rx,
			connection.clone(),
			config.resync_on_divergence,
			status_tx,
			stop.clone(),
		));
		connection.connect(inbound_tx);
		tracing::info!(endpoint = %connection.endpoint(), resync = config.resync_on_divergence, "session.start");

		Self {
			connection,
			view,
			status,
			pump: Mutex::new(Some(pump)),
			_stop_guard: stop.clone().drop_guard(),
			stop,
		}
	}

	/// Sends an action to the authority. The document changes only once the authority answers.
	pub fn dispatch(&self, action: Action) {
		tracing::debug!(action = action.kind(), "session.dispatch");
		self.connection.send(action);
	}

	/// Latest document, kept while disconnected. `None` before the first snapshot and after close.
	pub fn document(&self) -> Option<Arc<Document>> {
		self.view.load_full()
	}

	/// The underlying connection.
	pub fn connection(&self) -> &ConnectionManager {
		&self.connection
	}

	/// Current connection state.
	pub fn state(&self) -> ConnectionState {
		self.connection.state()
	}

	/// Subscribe to connection state changes.
	pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
		self.connection.subscribe_state()
	}

	/// Current sync health.
	pub fn health(&self) -> SyncHealth {
		self.status.borrow().health
	}

	/// Reconciler counters.
	pub fn stats(&self) -> EngineStats {
		self.status.borrow().stats
	}

	/// Closes the connection normally, stops processing, and discards the document.
	pub async fn close(&self) {
		self.connection.close();
		self.connection.closed().await;
		self.stop.cancel();
		let pump = self.pump.lock().take();
		if let Some(pump) = pump {
			let _ = pump.await;
		}
		self.view.store(None);
		tracing::info!(endpoint = %self.connection.endpoint(), "session.close");
	}
}

/// Exposes each version through the shared view before notifying the subscriber.
struct ViewPublisher<S> {
	view: Arc<ArcSwapOption<Document>>,
	subscriber: S,
}

impl<S: DocumentSubscriber> DocumentSubscriber for ViewPublisher<S> {
	fn on_document(&mut self, document: Arc<Document>) {
		self.view.store(Some(Arc::clone(&document)));
		self.subscriber.on_document(document);
	}

	fn on_dropped(&mut self, reason: &DropReason) {
		self.subscriber.on_dropped(reason);
	}
}

async fn run_pump<S: DocumentSubscriber>(
	mut engine: Reconciler<S>,
	mut inbound: InboundReceiver,
	connection: ConnectionManager,
	resync: bool,
	status: watch::Sender<EngineStatus>,
	stop: CancellationToken,
) {
	loop {
		let next = tokio::select! {
			biased;
			_ = stop.cancelled() => break,
			next = inbound.recv() => next,
		};
		let Some(next) = next else {
			break;
		};

		let outcome = engine.apply_inbound(next);
		status.send_replace(EngineStatus {
			health: engine.health(),
			stats: engine.stats(),
		});
		if resync && matches!(outcome, Outcome::Diverged(_)) && !connection.recycle() {
			tracing::debug!("session.resync_without_link");
		}
	}
	tracing::debug!(stats = ?engine.stats(), "session.pump_exit");
}
