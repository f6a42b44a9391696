//! Protocol-level errors.

use thiserror::Error;

/// Errors surfaced by the framing codec.
///
/// Any of these ends the connection: they are transport failures, not
/// per-command protocol errors (those are answered with IRC numerics and
/// never reach this type).
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid utf-8 at byte {byte_pos}: {details}")]
    InvalidUtf8 { byte_pos: usize, details: String },
}
