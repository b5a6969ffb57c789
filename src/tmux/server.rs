//! Client-side view of a tmux server
//!
//! Holds the session, window and pane records learned from notifications and
//! the command queue. tmux answers commands strictly in order and without
//! any request id, so at most one command is outstanding; later ones wait in
//! a FIFO until the answer to the current one arrives.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::command::{CommandError, PendingCommand};
use super::event::TmuxEvent;
use super::id::{parse_id_lossy, IdKind, UNKNOWN_ID};
use crate::error::{Error, Result};

/// Format used to list sessions; names are shell quoted
pub const LIST_SESSIONS: &str = "list-sessions -F '#{session_id} #{q:session_name}'";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub name: String,
    /// Client size stored in the session's size option
    pub size: Option<(u32, u32)>,
    pub active_window: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    pub name: String,
    pub layout: String,
    pub visible_layout: String,
    pub active_pane: Option<i32>,
    pub session: Option<i32>,
    /// Not linked into any session of this client
    pub unlinked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pane {
    pub window: Option<i32>,
    /// Output is paused (`%pause` without a later `%continue`)
    pub paused: bool,
    pub mode_changes: u32,
}

#[derive(Debug)]
pub struct TmuxServer {
    sessions: BTreeMap<i32, Session>,
    windows: BTreeMap<i32, Window>,
    panes: BTreeMap<i32, Pane>,
    active_session: i32,
    size_option: String,

    current: Option<PendingCommand>,
    queue: VecDeque<PendingCommand>,
    /// Set while `abort` runs; commands sent meanwhile are cancelled too
    aborting: bool,
    outgoing: Vec<String>,
    events: Vec<TmuxEvent>,
}

impl TmuxServer {
    pub fn new(size_option: impl Into<String>) -> Self {
        Self {
            sessions: BTreeMap::new(),
            windows: BTreeMap::new(),
            panes: BTreeMap::new(),
            active_session: UNKNOWN_ID,
            size_option: size_option.into(),
            current: None,
            queue: VecDeque::new(),
            aborting: false,
            outgoing: Vec::new(),
            events: Vec::new(),
        }
    }

    /// State right after entering control mode
    ///
    /// tmux answers the command that started control mode with a block of
    /// its own. An implicit command stands in for it; once that block has
    /// arrived the session list is requested. A rejected or cancelled attach
    /// requests nothing.
    pub fn attached(size_option: impl Into<String>) -> Self {
        let mut server = Self::new(size_option);
        server.current = Some(PendingCommand::new("", |server, result| match result {
            Ok(_) => server.list_sessions(),
            Err(err) => debug!(?err, "attach command failed"),
        }));
        server
    }

    /// Queue `command`, sending it at once when nothing is outstanding
    pub fn send(&mut self, command: PendingCommand) -> Result<()> {
        if command.text().contains(['\n', '\r']) {
            return Err(Error::InvalidTmuxCommand(command.text().to_string()));
        }
        if self.current.is_none() && !self.aborting {
            self.dispatch(command);
        } else {
            trace!(text = command.text(), "tmux command queued");
            self.queue.push_back(command);
        }
        Ok(())
    }

    fn dispatch(&mut self, command: PendingCommand) {
        debug!(text = command.text(), "tmux command sent");
        self.outgoing.push(command.text().to_string());
        self.current = Some(command);
    }

    fn promote(&mut self) {
        if self.current.is_none() {
            if let Some(next) = self.queue.pop_front() {
                self.dispatch(next);
            }
        }
    }

    /// A `%begin`/`%end` block arrived
    pub fn receive_response(&mut self, lines: Vec<String>) {
        match self.current.take() {
            Some(command) => {
                // the next command goes out before the handler can queue more
                self.promote();
                command.complete(self, Ok(lines));
            }
            None => warn!(lines = lines.len(), "tmux response with no command outstanding"),
        }
    }

    /// A `%begin`/`%error` block arrived
    pub fn receive_error(&mut self, lines: Vec<String>) {
        match self.current.take() {
            Some(command) => {
                self.promote();
                debug!(text = command.text(), ?lines, "tmux command rejected");
                if !command.text().is_empty() {
                    self.events.push(TmuxEvent::CommandFailed {
                        command: command.text().to_string(),
                        lines: lines.clone(),
                    });
                }
                command.complete(self, Err(CommandError::Rejected(lines)));
            }
            None => warn!(lines = lines.len(), "tmux error with no command outstanding"),
        }
    }

    /// Cancel the outstanding command and everything queued behind it
    ///
    /// Commands that cancellation handlers send in turn are queued and
    /// cancelled as well, in order, so every handler still runs once.
    pub fn abort(&mut self) {
        self.aborting = true;
        if let Some(current) = self.current.take() {
            self.queue.push_front(current);
        }
        let mut count = 0usize;
        while let Some(command) = self.queue.pop_front() {
            count += 1;
            command.complete(self, Err(CommandError::Cancelled));
        }
        if count > 0 {
            debug!(count, "tmux commands cancelled");
        }
        self.aborting = false;
        // nothing may reach a dead connection
        self.outgoing.clear();
    }

    /// Text of the command awaiting its answer
    pub fn current_command(&self) -> Option<&str> {
        self.current.as_ref().map(PendingCommand::text)
    }

    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(PendingCommand::text)
    }

    /// Command lines ready for the transport, oldest first
    pub fn take_outgoing(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outgoing)
    }

    pub fn take_events(&mut self) -> Vec<TmuxEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: TmuxEvent) {
        self.events.push(event);
    }

    pub fn list_sessions(&mut self) {
        let command = PendingCommand::new(LIST_SESSIONS, |server, result| {
            let Ok(lines) = result else { return };
            let mut listed = Vec::with_capacity(lines.len());
            for line in &lines {
                let Some((id, name)) = line.split_once(' ') else {
                    debug!(line, "malformed list-sessions line");
                    continue;
                };
                let id = parse_id_lossy(IdKind::Session, id, "list-sessions");
                if id < 0 {
                    continue;
                }
                let name = unquote(name);
                if let Some(session) = server.session_mut(id) {
                    session.name = name.clone();
                }
                listed.push((id, name));
            }
            server.events.push(TmuxEvent::SessionsListed { sessions: listed });
        });
        self.send_internal(command);
    }

    /// Ask for the size option of `session`
    fn query_size(&mut self, session: i32) {
        if self.size_option.is_empty() {
            return;
        }
        let text = format!("show -v -q -t ${} {}", session, self.size_option);
        let command = PendingCommand::new(text, move |server, result| {
            let Ok(lines) = result else { return };
            let Some((width, height)) = lines.first().and_then(|line| parse_size(line)) else {
                debug!(session, ?lines, "no client size stored for session");
                return;
            };
            if let Some(record) = server.session_mut(session) {
                record.size = Some((width, height));
            }
            server.events.push(TmuxEvent::SessionSize {
                session,
                width,
                height,
            });
        });
        self.send_internal(command);
    }

    fn send_internal(&mut self, command: PendingCommand) {
        if let Err(err) = self.send(command) {
            warn!(%err, "internal tmux command rejected");
        }
    }

    /// Record that the client now shows `session`
    pub(crate) fn session_changed(&mut self, session: i32, name: &str) {
        self.active_session = session;
        if session < 0 {
            return;
        }
        let unseen = !self.sessions.contains_key(&session);
        if let Some(record) = self.session_mut(session) {
            record.name = name.to_string();
        }
        if unseen {
            self.query_size(session);
        }
    }

    pub fn active_session(&self) -> i32 {
        self.active_session
    }

    pub fn session(&self, id: i32) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn window(&self, id: i32) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn pane(&self, id: i32) -> Option<&Pane> {
        self.panes.get(&id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = (i32, &Session)> {
        self.sessions.iter().map(|(id, s)| (*id, s))
    }

    pub fn windows(&self) -> impl Iterator<Item = (i32, &Window)> {
        self.windows.iter().map(|(id, w)| (*id, w))
    }

    pub fn panes(&self) -> impl Iterator<Item = (i32, &Pane)> {
        self.panes.iter().map(|(id, p)| (*id, p))
    }

    /// Record for `id`, created on first use; `None` for `*` and invalid ids
    pub fn session_mut(&mut self, id: i32) -> Option<&mut Session> {
        if id < 0 {
            return None;
        }
        Some(self.sessions.entry(id).or_default())
    }

    pub fn window_mut(&mut self, id: i32) -> Option<&mut Window> {
        if id < 0 {
            return None;
        }
        Some(self.windows.entry(id).or_default())
    }

    pub fn pane_mut(&mut self, id: i32) -> Option<&mut Pane> {
        if id < 0 {
            return None;
        }
        Some(self.panes.entry(id).or_default())
    }

    pub fn remove_session(&mut self, id: i32) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn remove_window(&mut self, id: i32) -> Option<Window> {
        self.windows.remove(&id)
    }

    pub fn remove_pane(&mut self, id: i32) -> Option<Pane> {
        self.panes.remove(&id)
    }
}

/// Parse a `W,H` size
fn parse_size(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.trim().split_once(',')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// Undo the backslash quoting of `#{q:...}`
fn unquote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }
    out
}
