//! Reference authority for listsync.
//!
//! Owns a canonical [`Document`](listsync_model::Document), applies client
//! actions to it, and answers with patches computed by [`diff`]. It speaks the
//! same wire format as the production server but runs in-process over a
//! [`MemoryTransport`](listsync_connection::MemoryTransport) link, so tests and
//! the loopback demo need no network.

#![warn(missing_docs)]

mod apply;
mod diff;
mod server;

pub use apply::apply_action;
pub use diff::diff;
pub use server::Authority;
