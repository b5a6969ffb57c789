//! Error types for the emulation core
//!
//! The streaming path never fails: malformed terminal input is reported as a
//! decoding-error event instead. These errors cover configuration loading,
//! tmux command submission, and image payload decoding.

use std::io;
use thiserror::Error;

/// vtmux error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A tmux command would not fit on a single protocol line
    #[error("Invalid tmux command {0:?}: commands must be a single line")]
    InvalidTmuxCommand(String),

    /// A tmux command was issued outside control mode
    #[error("tmux control mode is not active")]
    TmuxInactive,

    /// A tmux session/window/pane id token was malformed
    #[error("Invalid tmux {kind} id: {token:?}")]
    TmuxId {
        /// Which entity the id names ("session", "window" or "pane")
        kind: &'static str,
        /// The offending token
        token: String,
    },

    /// Base64 payload could not be decoded
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// PNG payload could not be decoded
    #[error("Invalid image payload: {0}")]
    Image(#[from] image::ImageError),

    /// Graphics payload is structurally wrong
    #[error("Graphics decode failed: {0}")]
    Graphics(String),
}

/// Result type for vtmux operations
pub type Result<T> = std::result::Result<T, Error>;
