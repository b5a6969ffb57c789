//! tmux control-mode client
//!
//! `tmux -CC` wraps its control protocol in `DCS 1000 p ... ST`. Inside, the
//! server sends notifications (`%window-add @1`) and answers commands with
//! `%begin`/`%end` blocks. This module keeps track of the entities tmux
//! reports and serializes commands so that every answer pairs with the
//! command that caused it.

mod client;
mod command;
mod event;
mod id;
mod notification;
mod server;

pub use client::TmuxClient;
pub use command::{CommandError, CommandResult, PendingCommand};
pub use event::TmuxEvent;
pub use id::{parse_id, parse_id_lossy, IdKind, INVALID_ID, UNKNOWN_ID};
pub use notification::{Notification, OctalDecoder};
pub use server::{Pane, Session, TmuxServer, Window, LIST_SESSIONS};
