//! Shared data model for the listsync protocol.
//!
//! This crate defines the values exchanged between a client and the remote
//! authority that owns a list document:
//! * [`Document`] and [`Item`]: the synchronized list state
//! * [`Action`]: an outbound user intent, fire-and-forget
//! * [`InboundMessage`]: a full snapshot or an ordered delta patch
//! * [`PatchOp`] and [`Pointer`]: the structural edit operations inside a patch
//!
//! Every type serialises to the JSON wire format spoken by the authority, so the
//! transport layer only ever deals in strings.

#![warn(missing_docs)]

mod action;
mod document;
mod error;
mod message;
mod pointer;

pub use action::Action;
pub use document::{Document, Item, ItemKey};
pub use error::{ModelError, Result};
pub use message::{InboundMessage, OpKind, PatchOp};
pub use pointer::Pointer;
