//! Reconciliation engine for listsync clients.
//!
//! The engine owns the canonical local [`Document`](listsync_model::Document)
//! and derives each new version from authority messages only:
//! * [`apply_patch`]: interpreter over the closed set of patch targets
//! * [`reconcile`]: the pure `(current, message) -> next` step
//! * [`Reconciler`]: stateful owner that tracks [`SyncHealth`] and notifies one [`DocumentSubscriber`]
//! * [`Session`]: wires a [`ConnectionManager`](listsync_connection::ConnectionManager) to a reconciler
//!
//! Outgoing actions never touch the local document. A user edit becomes
//! visible when the authority echoes it back as a snapshot or patch.

#![warn(missing_docs)]

mod patch;
mod reconcile;
mod session;
mod subscriber;

pub use patch::{PatchError, apply_patch};
pub use reconcile::{EngineStats, Outcome, Reconciler, SyncHealth, reconcile};
pub use session::{Session, SessionConfig};
pub use subscriber::{DocumentSubscriber, DropReason};
