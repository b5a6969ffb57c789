//! What the control-mode client reports to its host

use serde::Serialize;

/// A decoded control-mode notification or command result
///
/// Ids are the numbers tmux assigns; [`UNKNOWN_ID`](super::UNKNOWN_ID) and
/// [`INVALID_ID`](super::INVALID_ID) stand in for `*` and malformed tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TmuxEvent {
    ClientDetached {
        client: String,
    },
    ClientSessionChanged {
        client: String,
        session: i32,
        name: String,
    },
    ConfigError {
        error: String,
    },
    Continue {
        pane: i32,
    },
    Exit {
        reason: Option<String>,
    },
    Output {
        pane: i32,
        data: Vec<u8>,
    },
    ExtendedOutput {
        pane: i32,
        age: u64,
        data: Vec<u8>,
    },
    LayoutChange {
        window: i32,
        layout: String,
        visible_layout: String,
        flags: String,
    },
    Message {
        text: String,
    },
    PaneModeChanged {
        pane: i32,
    },
    PasteBufferChanged {
        name: String,
    },
    PasteBufferDeleted {
        name: String,
    },
    Pause {
        pane: i32,
    },
    SessionChanged {
        session: i32,
        name: String,
    },
    SessionRenamed {
        session: i32,
        name: String,
    },
    SessionWindowChanged {
        session: i32,
        window: i32,
    },
    SessionsChanged,
    SubscriptionChanged {
        name: String,
        session: i32,
        window: i32,
        window_index: i32,
        pane: i32,
        value: String,
    },
    UnlinkedWindowAdd {
        window: i32,
    },
    UnlinkedWindowClose {
        window: i32,
    },
    UnlinkedWindowRenamed {
        window: i32,
        name: String,
    },
    WindowAdd {
        window: i32,
    },
    WindowClose {
        window: i32,
    },
    WindowPaneChanged {
        window: i32,
        pane: i32,
    },
    WindowRenamed {
        window: i32,
        name: String,
    },
    /// `list-sessions` answered
    SessionsListed {
        sessions: Vec<(i32, String)>,
    },
    /// The size option of a session was read
    SessionSize {
        session: i32,
        width: u32,
        height: u32,
    },
    /// A command tmux rejected with `%error`
    CommandFailed {
        command: String,
        lines: Vec<String>,
    },
}

impl TmuxEvent {
    /// Events after which the control session cannot continue
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TmuxEvent::ClientDetached { .. } | TmuxEvent::ConfigError { .. }
        )
    }
}
