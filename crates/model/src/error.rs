//! Error types for wire decoding.

use thiserror::Error;

/// Errors produced while decoding wire values.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
	/// The frame is not valid JSON or does not match the message schema.
	#[error("malformed message: {0}")]
	Json(#[from] serde_json::Error),

	/// A binary frame did not contain UTF-8 text.
	#[error("binary frame is not UTF-8: {0}")]
	Utf8(#[from] std::str::Utf8Error),

	/// A JSON pointer did not start with `/` or contained a bad escape.
	#[error("invalid JSON pointer {pointer:?}: {reason}")]
	Pointer {
		/// The offending pointer text.
		pointer: String,
		/// What was wrong with it.
		reason: &'static str,
	},
}

/// Result type for model operations.
pub type Result<T, E = ModelError> = std::result::Result<T, E>;
