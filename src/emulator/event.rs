//! Notifications for the host

use serde::Serialize;

use crate::core::{Mode, Rgb};
use crate::tmux::TmuxEvent;

/// Session attributes set through OSC 0/1/2/7
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SessionAttribute {
    IconName,
    WindowTitle,
    CurrentDirectory,
}

/// Which color an OSC changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorSlot {
    Palette(u8),
    Foreground,
    Background,
}

/// Something the host must act on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Event {
    /// Bytes to write back to the child process
    Reply(String),
    Bell,
    /// A sequence was malformed or unsupported; carries the offending token
    DecodingError(String),
    /// Title, icon name and directory changes of one `receive` call
    SessionAttributes(Vec<(SessionAttribute, String)>),
    /// A mode the host's input handling depends on changed
    ModeChanged { mode: Mode, enabled: bool },
    ColorChanged { slot: ColorSlot, color: Rgb },
    /// OSC 104; `None` resets every entry
    PaletteReset(Option<Vec<u8>>),
    /// OSC 777 desktop notification
    Notification { title: String, body: String },
    TmuxStarted,
    Tmux(TmuxEvent),
    /// A control-mode command line for the transport, without newline
    TmuxCommand(String),
    /// The tmux client detached or hit a fatal configuration error
    TmuxSessionTerminated,
    TmuxEnded,
}
