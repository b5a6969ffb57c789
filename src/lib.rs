//! vtmux terminal emulation core
//!
//! Turns the byte stream a child process writes to its terminal into display
//! operations and host events. No grid, no PTY, no rendering: the host
//! supplies a [`Screen`] and acts on the [`Event`]s.
//!
//! - `parser`: character-at-a-time escape sequence tokenizer
//! - `core`: mode vector, charset slots, color table
//! - `emulator`: the command interpreter
//! - `graphics`: sixel and kitty image decoding
//! - `tmux`: tmux control-mode client

pub mod config;
pub mod core;
pub mod emulator;
pub mod error;
pub mod graphics;
pub mod parser;
pub mod tmux;

pub use config::Config;
pub use emulator::{Emulator, Event, RecordingScreen, Screen, ScreenOp, ScreenSize};
pub use error::{Error, Result};
