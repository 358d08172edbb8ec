//! The connection manager: one supervised connect loop per instance.

use std::sync::Arc;

use listsync_model::Action;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::close::CloseStatus;
use crate::codec::{self, Inbound, InboundSender};
use crate::config::ConnectionConfig;
use crate::endpoint::Endpoint;
use crate::epoch::{EpochClock, LoopEpoch};
use crate::state::ConnectionState;
use crate::stats::{ConnectionStats, StatCounters};
use crate::transport::{Link, LinkCommand, LinkEvent, Transport};

/// Handle to the single logical connection of a session.
///
/// Cloning is cheap and every clone drives the same connection. Dropping the
/// last clone behaves like [`ConnectionManager::close`] without the close frame.
#[derive(Clone)]
pub struct ConnectionManager {
	inner: Arc<Inner>,
	_teardown: Arc<DropGuard>,
}

struct Inner {
	transport: Arc<dyn Transport>,
	config: ConnectionConfig,
	state_tx: watch::Sender<ConnectionState>,
	/// Link of the current epoch, present only while `Connected`.
	active: Mutex<Option<ActiveLink>>,
	/// The running connect loop, if any.
	supervisor: Mutex<Option<Supervisor>>,
	epochs: EpochClock,
	shutdown: CancellationToken,
	stats: StatCounters,
}

struct ActiveLink {
	epoch: u64,
	commands: mpsc::UnboundedSender<LinkCommand>,
	recycle: CancellationToken,
}

struct Supervisor {
	epoch: u64,
	/// Cancelled when the loop task returns or is dropped.
	exited: CancellationToken,
}

/// Why one link stopped being driven.
enum LinkExit {
	/// The link closed or was lost with this status.
	Closed(CloseStatus),
	/// `close()` was called.
	Cancelled,
	/// Nobody consumes inbound messages anymore.
	Detached,
}

impl std::fmt::Debug for ConnectionManager {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConnectionManager")
			.field("endpoint", &self.inner.config.endpoint)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

impl ConnectionManager {
	/// Creates a manager in the `Disconnected` state. Nothing is dialled until [`Self::connect`].
	pub fn new(transport: Arc<dyn Transport>, config: ConnectionConfig) -> Self {
		let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
		let shutdown = CancellationToken::new();
		let teardown = Arc::new(shutdown.clone().drop_guard());
		Self {
			inner: Arc::new(Inner {
				transport,
				config,
				state_tx,
				active: Mutex::new(None),
				supervisor: Mutex::new(None),
				epochs: EpochClock::default(),
				shutdown,
				stats: StatCounters::default(),
			}),
			_teardown: teardown,
		}
	}

	/// Starts the connect loop, delivering decoded frames to `inbound` in receipt order.
	///
	/// Returns `false` without side effects if a loop is already running or the
	/// manager was closed. Must be called from within a Tokio runtime.
	pub fn connect(&self, inbound: InboundSender) -> bool {
		if self.inner.shutdown.is_cancelled() {
			tracing::warn!(endpoint = %self.inner.config.endpoint, "connection.connect_after_close");
			return false;
		}

		let mut supervisor = self.inner.supervisor.lock();
		if let Some(current) = supervisor.as_ref()
			&& !current.exited.is_cancelled()
		{
			tracing::debug!(epoch = current.epoch, "connection.already_active");
			return false;
		}

		let token = LoopEpoch::start(&self.inner.epochs, &self.inner.shutdown);
		tracing::debug!(epoch = token.epoch(), endpoint = %self.inner.config.endpoint, "connection.connect");
		let exited = CancellationToken::new();
		*supervisor = Some(Supervisor {
			epoch: token.epoch(),
			exited: exited.clone(),
		});
		tokio::spawn(run_supervisor(Arc::clone(&self.inner), token, inbound, exited.drop_guard()));
		true
	}

	/// Writes one action if a link is up; drops it silently otherwise.
	pub fn send(&self, action: Action) {
		let active = self.inner.active.lock();
		let Some(link) = active.as_ref() else {
			StatCounters::bump(&self.inner.stats.actions_dropped);
			tracing::debug!(action = action.kind(), "connection.action_dropped");
			return;
		};

		let frame = match codec::encode(&action) {
			Ok(frame) => frame,
			Err(e) => {
				tracing::error!(action = action.kind(), error = %e, "connection.encode_failed");
				return;
			}
		};
		if link.commands.send(LinkCommand::Send(frame)).is_ok() {
			StatCounters::bump(&self.inner.stats.actions_sent);
			tracing::trace!(epoch = link.epoch, action = action.kind(), "connection.action_sent");
		} else {
			StatCounters::bump(&self.inner.stats.actions_dropped);
			tracing::debug!(action = action.kind(), "connection.action_dropped");
		}
	}

	/// Tears the connection down with a normal-closure status and stops reconnecting. Terminal.
	pub fn close(&self) {
		if self.inner.shutdown.is_cancelled() {
			return;
		}
		self.inner.shutdown.cancel();
		if let Some(active) = self.inner.active.lock().take() {
			let _ = active.commands.send(LinkCommand::Close(CloseStatus::normal()));
		}
		self.inner.set_state(ConnectionState::Closed);
		tracing::info!(endpoint = %self.inner.config.endpoint, "connection.close");
	}

	/// Waits for the connect loop to exit. Returns immediately if none is running.
	///
	/// The loop stays registered while this waits, so a concurrent
	/// [`Self::connect`] is still deduplicated against it.
	pub async fn closed(&self) {
		let exited = self.inner.supervisor.lock().as_ref().map(|s| s.exited.clone());
		if let Some(exited) = exited {
			exited.cancelled().await;
		}
	}

	/// Closes the current link with status 4000 so the loop reconnects after the retry delay.
	///
	/// The authority greets every new link with a full snapshot, so this is how a
	/// diverged client asks for one. Returns `false` if no link is up.
	pub fn recycle(&self) -> bool {
		let active = self.inner.active.lock();
		let Some(link) = active.as_ref() else {
			return false;
		};
		tracing::info!(epoch = link.epoch, "connection.recycle");
		link.recycle.cancel();
		true
	}

	/// Current lifecycle state.
	pub fn state(&self) -> ConnectionState {
		*self.inner.state_tx.borrow()
	}

	/// Subscribe to state changes.
	pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
		self.inner.state_tx.subscribe()
	}

	/// Endpoint this manager dials.
	pub fn endpoint(&self) -> &Endpoint {
		&self.inner.config.endpoint
	}

	/// Snapshot of the manager's counters.
	pub fn stats(&self) -> ConnectionStats {
		self.inner.stats.snapshot()
	}
}

impl Inner {
	/// Applies a transition unless the manager already reached `Closed`.
	fn set_state(&self, next: ConnectionState) {
		self.state_tx.send_if_modified(|state| {
			if state.is_closed() || *state == next {
				return false;
			}
			tracing::trace!(from = state.as_str(), to = next.as_str(), "connection.state");
			*state = next;
			true
		});
	}

	fn take_active(&self, epoch: u64) -> Option<ActiveLink> {
		let mut active = self.active.lock();
		if active.as_ref().is_some_and(|link| link.epoch == epoch) { active.take() } else { None }
	}

	/// Pumps one open link until it closes, is lost, or the manager is torn down.
	async fn drive_link(&self, link: Link, token: &LoopEpoch, inbound: &InboundSender) -> LinkExit {
		let (commands, mut events) = link.split();
		// Independent of the shutdown scope: recycling one link must not end the loop
		let recycle = CancellationToken::new();
		*self.active.lock() = Some(ActiveLink {
			epoch: token.epoch(),
			commands: commands.clone(),
			recycle: recycle.clone(),
		});
		StatCounters::bump(&self.stats.established);
		self.set_state(ConnectionState::Connected);
		tracing::info!(epoch = token.epoch(), endpoint = %self.config.endpoint, "connection.open");

		let exit = loop {
			tokio::select! {
				biased;
				_ = token.cancelled() => {
					// close() normally took the link already; this covers a link published mid-close
					if let Some(active) = self.take_active(token.epoch()) {
						let _ = active.commands.send(LinkCommand::Close(CloseStatus::normal()));
					}
					break LinkExit::Cancelled;
				}
				_ = recycle.cancelled() => {
					let status = CloseStatus::new(CloseStatus::RESYNC).with_reason("resync");
					let _ = commands.send(LinkCommand::Close(status.clone()));
					break LinkExit::Closed(status);
				}
				event = events.recv() => match event {
					Some(LinkEvent::Frame(frame)) => {
						let decoded = codec::decode(&frame);
						if let Inbound::Malformed(reason) = &decoded {
							StatCounters::bump(&self.stats.malformed_frames);
							tracing::warn!(epoch = token.epoch(), error = %reason, "connection.malformed_frame");
						}
						if inbound.send(decoded).is_err() {
							let _ = commands.send(LinkCommand::Close(CloseStatus::normal()));
							break LinkExit::Detached;
						}
					}
					Some(LinkEvent::Error(reason)) => {
						// Forced close: dropping our command sender tears the link down
						tracing::warn!(epoch = token.epoch(), error = %reason, "connection.transport_error");
						break LinkExit::Closed(CloseStatus::abnormal().with_reason(reason));
					}
					Some(LinkEvent::Closed(status)) => break LinkExit::Closed(status),
					None => break LinkExit::Closed(CloseStatus::abnormal()),
				}
			}
		};

		drop(self.take_active(token.epoch()));
		exit
	}
}

async fn run_supervisor(inner: Arc<Inner>, token: LoopEpoch, inbound: InboundSender, _exited: DropGuard) {
	let mut link_token = token.clone();
	let mut attempt = 0u64;

	loop {
		if token.is_cancelled() {
			break;
		}

		attempt = attempt.wrapping_add(1);
		StatCounters::bump(&inner.stats.attempts);
		inner.set_state(ConnectionState::Connecting);
		tracing::debug!(epoch = link_token.epoch(), attempt, endpoint = %inner.config.endpoint, "connection.attempt");

		let connected = tokio::select! {
			biased;
			_ = token.cancelled() => break,
			res = inner.transport.connect(&inner.config.endpoint) => res,
		};

		let exit = match connected {
			Ok(link) => inner.drive_link(link, &link_token, &inbound).await,
			Err(e) => {
				tracing::warn!(epoch = link_token.epoch(), attempt, error = %e, "connection.connect_failed");
				LinkExit::Closed(CloseStatus::abnormal().with_reason(e.to_string()))
			}
		};

		let status = match exit {
			LinkExit::Closed(status) => status,
			LinkExit::Cancelled => break,
			LinkExit::Detached => {
				tracing::debug!(epoch = link_token.epoch(), "connection.detached");
				inner.set_state(ConnectionState::Disconnected);
				break;
			}
		};
		if token.is_cancelled() {
			break;
		}

		inner.set_state(ConnectionState::Disconnected);
		if status.is_expected() {
			tracing::info!(epoch = link_token.epoch(), status = %status, "connection.closed");
			break;
		}

		tracing::warn!(
			epoch = link_token.epoch(),
			status = %status,
			retry_in_ms = inner.config.retry_delay.as_millis() as u64,
			"connection.lost"
		);
		tokio::select! {
			biased;
			_ = token.cancelled() => break,
			_ = tokio::time::sleep(inner.config.retry_delay) => {}
		}
		link_token = token.next_link(&inner.epochs);
		tracing::debug!(epoch = link_token.epoch(), "connection.retry");
	}

	if token.is_cancelled() {
		inner.set_state(ConnectionState::Closed);
	}
	tracing::debug!(epoch = token.epoch(), attempts = attempt, "connection.loop_exit");
}
