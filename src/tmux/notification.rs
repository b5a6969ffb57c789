//! Control-mode notification lines
//!
//! A line starting with a known `%name` selects a [`Notification`] variant.
//! The rest of the line is fed to it one character at a time; once the line
//! ends, [`Notification::execute`] applies it to the server state and
//! produces the host-facing event.

use std::mem;

use tracing::{debug, trace};

use super::event::TmuxEvent;
use super::id::{parse_id_lossy, IdKind, INVALID_ID};
use super::server::TmuxServer;

/// Space separated arguments; the last one runs to the end of the line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fields {
    done: Vec<String>,
    current: String,
    arity: usize,
}

impl Fields {
    fn new(arity: usize) -> Self {
        Self {
            done: Vec::with_capacity(arity),
            current: String::new(),
            arity,
        }
    }

    fn push(&mut self, c: char) {
        if c == ' ' && self.done.len() + 1 < self.arity {
            self.done.push(mem::take(&mut self.current));
        } else {
            self.current.push(c);
        }
    }

    fn finish(mut self) -> Args {
        if !self.current.is_empty() || !self.done.is_empty() {
            self.done.push(self.current);
        }
        Args(self.done)
    }
}

/// Completed arguments of one line
struct Args(Vec<String>);

impl Args {
    fn str(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    fn take(&mut self, index: usize) -> String {
        self.0.get_mut(index).map(mem::take).unwrap_or_default()
    }

    fn id(&self, index: usize, kind: IdKind, context: &str) -> i32 {
        parse_id_lossy(kind, self.str(index), context)
    }

    fn number(&self, index: usize, context: &str) -> i32 {
        match self.str(index).parse::<i32>() {
            Ok(n) => n,
            Err(_) => {
                debug!(context, token = self.str(index), "malformed tmux number");
                INVALID_ID
            }
        }
    }
}

/// Decoder for tmux's octal escaped pane output
///
/// `\ooo` encodes one byte. A character other than an octal digit inside an
/// escape flushes the digits gathered so far as a byte and is then taken
/// literally.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OctalDecoder {
    bytes: Vec<u8>,
    escape: Option<(u8, u32)>,
}

impl OctalDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        if let Some((digits, value)) = self.escape {
            if let Some(d) = c.to_digit(8) {
                let value = value * 8 + d;
                if digits + 1 == 3 {
                    self.bytes.push(value as u8);
                    self.escape = None;
                } else {
                    self.escape = Some((digits + 1, value));
                }
                return;
            }
            self.bytes.push(value as u8);
            self.escape = None;
        }
        if c == '\\' {
            self.escape = Some((0, 0));
        } else {
            let mut buf = [0u8; 4];
            self.bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
    }

    /// Decoded bytes; an escape cut short by the end of line is flushed
    /// when it holds at least one digit
    pub fn finish(mut self) -> Vec<u8> {
        if let Some((digits, value)) = self.escape.take() {
            if digits > 0 {
                self.bytes.push(value as u8);
            }
        }
        self.bytes
    }
}

/// Header arguments followed by a payload
///
/// The payload starts either after a fixed number of header arguments or
/// after a lone `:` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadFields {
    header: Vec<String>,
    current: String,
    header_len: Option<usize>,
    in_payload: bool,
    octal: Option<OctalDecoder>,
    raw: String,
}

impl PayloadFields {
    /// Payload after `count` header arguments
    fn after(count: usize, octal: bool) -> Self {
        Self {
            header: Vec::new(),
            current: String::new(),
            header_len: Some(count),
            in_payload: count == 0,
            octal: octal.then(OctalDecoder::new),
            raw: String::new(),
        }
    }

    /// Payload after a `:` argument
    fn after_colon(octal: bool) -> Self {
        Self {
            header_len: None,
            ..Self::after(usize::MAX, octal)
        }
    }

    fn push(&mut self, c: char) {
        if self.in_payload {
            match &mut self.octal {
                Some(decoder) => decoder.push(c),
                None => self.raw.push(c),
            }
            return;
        }
        if c != ' ' {
            self.current.push(c);
            return;
        }
        let field = mem::take(&mut self.current);
        match self.header_len {
            None if field == ":" => self.in_payload = true,
            None => self.header.push(field),
            Some(len) => {
                self.header.push(field);
                self.in_payload = self.header.len() == len;
            }
        }
    }

    fn finish(mut self) -> (Args, Vec<u8>, String) {
        if !self.in_payload && !self.current.is_empty() && self.current != ":" {
            self.header.push(mem::take(&mut self.current));
        }
        let bytes = self.octal.map(OctalDecoder::finish).unwrap_or_default();
        (Args(self.header), bytes, self.raw)
    }
}

/// One notification line being read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Unknown `%name`; the line is read and dropped
    Ignored,
    ClientDetached(Fields),
    ClientSessionChanged(Fields),
    ConfigError(Fields),
    Continue(Fields),
    Exit(Fields),
    ExtendedOutput(PayloadFields),
    LayoutChange(Fields),
    Message(Fields),
    Output(PayloadFields),
    PaneModeChanged(Fields),
    PasteBufferChanged(Fields),
    PasteBufferDeleted(Fields),
    Pause(Fields),
    SessionChanged(Fields),
    SessionRenamed(Fields),
    SessionWindowChanged(Fields),
    SessionsChanged,
    SubscriptionChanged(PayloadFields),
    UnlinkedWindowAdd(Fields),
    UnlinkedWindowClose(Fields),
    UnlinkedWindowRenamed(Fields),
    WindowAdd(Fields),
    WindowClose(Fields),
    WindowPaneChanged(Fields),
    WindowRenamed(Fields),
}

impl Notification {
    /// Select the variant for a line's leading token
    pub fn from_name(name: &str) -> Option<Self> {
        let notification = match name {
            "%client-detached" => Self::ClientDetached(Fields::new(1)),
            "%client-session-changed" => Self::ClientSessionChanged(Fields::new(3)),
            "%config-error" => Self::ConfigError(Fields::new(1)),
            "%continue" => Self::Continue(Fields::new(1)),
            "%exit" => Self::Exit(Fields::new(1)),
            "%extended-output" => Self::ExtendedOutput(PayloadFields::after_colon(true)),
            "%layout-change" => Self::LayoutChange(Fields::new(4)),
            "%message" => Self::Message(Fields::new(1)),
            "%output" => Self::Output(PayloadFields::after(1, true)),
            "%pane-mode-changed" => Self::PaneModeChanged(Fields::new(1)),
            "%paste-buffer-changed" => Self::PasteBufferChanged(Fields::new(1)),
            "%paste-buffer-deleted" => Self::PasteBufferDeleted(Fields::new(1)),
            "%pause" => Self::Pause(Fields::new(1)),
            "%session-changed" => Self::SessionChanged(Fields::new(2)),
            "%session-renamed" => Self::SessionRenamed(Fields::new(2)),
            "%session-window-changed" => Self::SessionWindowChanged(Fields::new(2)),
            "%sessions-changed" => Self::SessionsChanged,
            "%subscription-changed" => Self::SubscriptionChanged(PayloadFields::after_colon(false)),
            "%unlinked-window-add" => Self::UnlinkedWindowAdd(Fields::new(1)),
            "%unlinked-window-close" => Self::UnlinkedWindowClose(Fields::new(1)),
            "%unlinked-window-renamed" => Self::UnlinkedWindowRenamed(Fields::new(2)),
            "%window-add" => Self::WindowAdd(Fields::new(1)),
            "%window-close" => Self::WindowClose(Fields::new(1)),
            "%window-pane-changed" => Self::WindowPaneChanged(Fields::new(2)),
            "%window-renamed" => Self::WindowRenamed(Fields::new(2)),
            _ => return None,
        };
        Some(notification)
    }

    /// Feed one character of the line after the leading token
    pub fn push_char(&mut self, c: char) {
        match self {
            Self::Ignored | Self::SessionsChanged => {}
            Self::ExtendedOutput(p) | Self::Output(p) | Self::SubscriptionChanged(p) => p.push(c),
            Self::ClientDetached(f)
            | Self::ClientSessionChanged(f)
            | Self::ConfigError(f)
            | Self::Continue(f)
            | Self::Exit(f)
            | Self::LayoutChange(f)
            | Self::Message(f)
            | Self::PaneModeChanged(f)
            | Self::PasteBufferChanged(f)
            | Self::PasteBufferDeleted(f)
            | Self::Pause(f)
            | Self::SessionChanged(f)
            | Self::SessionRenamed(f)
            | Self::SessionWindowChanged(f)
            | Self::UnlinkedWindowAdd(f)
            | Self::UnlinkedWindowClose(f)
            | Self::UnlinkedWindowRenamed(f)
            | Self::WindowAdd(f)
            | Self::WindowClose(f)
            | Self::WindowPaneChanged(f)
            | Self::WindowRenamed(f) => f.push(c),
        }
    }

    /// Apply the completed line to `server`, returning the event to report
    pub fn execute(self, server: &mut TmuxServer) -> Option<TmuxEvent> {
        let event = match self {
            Self::Ignored => return None,
            Self::ClientDetached(f) => {
                let mut args = f.finish();
                TmuxEvent::ClientDetached {
                    client: args.take(0),
                }
            }
            Self::ClientSessionChanged(f) => {
                let mut args = f.finish();
                TmuxEvent::ClientSessionChanged {
                    client: args.take(0),
                    session: args.id(1, IdKind::Session, "client-session-changed"),
                    name: args.take(2),
                }
            }
            Self::ConfigError(f) => TmuxEvent::ConfigError {
                error: f.finish().take(0),
            },
            Self::Continue(f) => {
                let pane = f.finish().id(0, IdKind::Pane, "continue");
                if let Some(p) = server.pane_mut(pane) {
                    p.paused = false;
                }
                TmuxEvent::Continue { pane }
            }
            Self::Exit(f) => {
                let reason = f.finish().take(0);
                TmuxEvent::Exit {
                    reason: (!reason.is_empty()).then_some(reason),
                }
            }
            Self::ExtendedOutput(p) => {
                let (args, data, _) = p.finish();
                let pane = args.id(0, IdKind::Pane, "extended-output");
                let age = args.str(1).parse().unwrap_or_else(|_| {
                    debug!(token = args.str(1), "malformed extended-output age");
                    0
                });
                server.pane_mut(pane);
                TmuxEvent::ExtendedOutput { pane, age, data }
            }
            Self::LayoutChange(f) => {
                let mut args = f.finish();
                let window = args.id(0, IdKind::Window, "layout-change");
                let layout = args.take(1);
                let visible_layout = args.take(2);
                if let Some(record) = server.window_mut(window) {
                    record.layout = layout.clone();
                    record.visible_layout = visible_layout.clone();
                }
                TmuxEvent::LayoutChange {
                    window,
                    layout,
                    visible_layout,
                    flags: args.take(3),
                }
            }
            Self::Message(f) => TmuxEvent::Message {
                text: f.finish().take(0),
            },
            Self::Output(p) => {
                let (args, data, _) = p.finish();
                let pane = args.id(0, IdKind::Pane, "output");
                server.pane_mut(pane);
                TmuxEvent::Output { pane, data }
            }
            Self::PaneModeChanged(f) => {
                let pane = f.finish().id(0, IdKind::Pane, "pane-mode-changed");
                if let Some(p) = server.pane_mut(pane) {
                    p.mode_changes += 1;
                }
                TmuxEvent::PaneModeChanged { pane }
            }
            Self::PasteBufferChanged(f) => TmuxEvent::PasteBufferChanged {
                name: f.finish().take(0),
            },
            Self::PasteBufferDeleted(f) => TmuxEvent::PasteBufferDeleted {
                name: f.finish().take(0),
            },
            Self::Pause(f) => {
                let pane = f.finish().id(0, IdKind::Pane, "pause");
                if let Some(p) = server.pane_mut(pane) {
                    p.paused = true;
                }
                TmuxEvent::Pause { pane }
            }
            Self::SessionChanged(f) => {
                let mut args = f.finish();
                let session = args.id(0, IdKind::Session, "session-changed");
                let name = args.take(1);
                server.session_changed(session, &name);
                TmuxEvent::SessionChanged { session, name }
            }
            Self::SessionRenamed(f) => {
                let mut args = f.finish();
                // older servers send only the new name
                let (session, name) = if args.str(0).starts_with('$') {
                    let session = args.id(0, IdKind::Session, "session-renamed");
                    (session, args.take(1))
                } else {
                    let name = args.0.join(" ");
                    (server.active_session(), name)
                };
                if let Some(record) = server.session_mut(session) {
                    record.name = name.clone();
                }
                TmuxEvent::SessionRenamed { session, name }
            }
            Self::SessionWindowChanged(f) => {
                let args = f.finish();
                let session = args.id(0, IdKind::Session, "session-window-changed");
                let window = args.id(1, IdKind::Window, "session-window-changed");
                if let Some(record) = server.session_mut(session) {
                    record.active_window = Some(window);
                }
                if let Some(record) = server.window_mut(window) {
                    record.session = Some(session);
                }
                TmuxEvent::SessionWindowChanged { session, window }
            }
            Self::SessionsChanged => {
                server.list_sessions();
                TmuxEvent::SessionsChanged
            }
            Self::SubscriptionChanged(p) => {
                let (mut args, _, value) = p.finish();
                TmuxEvent::SubscriptionChanged {
                    name: args.take(0),
                    session: args.id(1, IdKind::Session, "subscription-changed"),
                    window: args.id(2, IdKind::Window, "subscription-changed"),
                    window_index: args.number(3, "subscription-changed"),
                    pane: args.id(4, IdKind::Pane, "subscription-changed"),
                    value,
                }
            }
            Self::UnlinkedWindowAdd(f) => {
                let window = f.finish().id(0, IdKind::Window, "unlinked-window-add");
                if let Some(w) = server.window_mut(window) {
                    w.unlinked = true;
                }
                TmuxEvent::UnlinkedWindowAdd { window }
            }
            Self::UnlinkedWindowClose(f) => TmuxEvent::UnlinkedWindowClose {
                window: f.finish().id(0, IdKind::Window, "unlinked-window-close"),
            },
            Self::UnlinkedWindowRenamed(f) => {
                let mut args = f.finish();
                let window = args.id(0, IdKind::Window, "unlinked-window-renamed");
                let name = args.take(1);
                if let Some(w) = server.window_mut(window) {
                    w.name = name.clone();
                }
                TmuxEvent::UnlinkedWindowRenamed { window, name }
            }
            Self::WindowAdd(f) => {
                let window = f.finish().id(0, IdKind::Window, "window-add");
                if let Some(w) = server.window_mut(window) {
                    w.unlinked = false;
                }
                TmuxEvent::WindowAdd { window }
            }
            Self::WindowClose(f) => TmuxEvent::WindowClose {
                window: f.finish().id(0, IdKind::Window, "window-close"),
            },
            Self::WindowPaneChanged(f) => {
                let args = f.finish();
                let window = args.id(0, IdKind::Window, "window-pane-changed");
                let pane = args.id(1, IdKind::Pane, "window-pane-changed");
                if let Some(w) = server.window_mut(window) {
                    w.active_pane = Some(pane);
                }
                if let Some(p) = server.pane_mut(pane) {
                    p.window = Some(window);
                }
                TmuxEvent::WindowPaneChanged { window, pane }
            }
            Self::WindowRenamed(f) => {
                let mut args = f.finish();
                let window = args.id(0, IdKind::Window, "window-renamed");
                let name = args.take(1);
                if let Some(w) = server.window_mut(window) {
                    w.name = name.clone();
                }
                TmuxEvent::WindowRenamed { window, name }
            }
        };
        trace!(?event, "tmux notification");
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(name: &str, rest: &str) -> Notification {
        let mut n = Notification::from_name(name).unwrap();
        rest.chars().for_each(|c| n.push_char(c));
        n
    }

    fn decode(s: &str) -> Vec<u8> {
        let mut decoder = OctalDecoder::new();
        s.chars().for_each(|c| decoder.push(c));
        decoder.finish()
    }

    #[test]
    fn test_octal_escapes() {
        assert_eq!(decode("\\134\\061"), vec![0x5c, 0x31]);
        assert_eq!(decode("a\\033[m"), b"a\x1b[m".to_vec());
    }

    #[test]
    fn test_octal_short_escape_flushes() {
        assert_eq!(decode("\\12X"), vec![0x0a, b'X']);
        assert_eq!(decode("\\1\\015"), vec![0x01, 0x0d]);
        assert_eq!(decode("\\01"), vec![0x01]);
    }

    #[test]
    fn test_octal_passes_utf8() {
        assert_eq!(decode("é"), "é".as_bytes().to_vec());
    }

    #[test]
    fn test_unknown_name() {
        assert!(Notification::from_name("%bogus").is_none());
        assert!(Notification::from_name("output").is_none());
    }

    #[test]
    fn test_output() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%output", "%3 ls\\015\\012").execute(&mut server);
        assert_eq!(
            event,
            Some(TmuxEvent::Output {
                pane: 3,
                data: b"ls\r\n".to_vec()
            })
        );
        assert!(server.pane(3).is_some());
    }

    #[test]
    fn test_output_keeps_spaces() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%output", "%1 a  b").execute(&mut server);
        assert_eq!(
            event,
            Some(TmuxEvent::Output {
                pane: 1,
                data: b"a  b".to_vec()
            })
        );
    }

    #[test]
    fn test_extended_output() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%extended-output", "%2 150 : hi\\041").execute(&mut server);
        assert_eq!(
            event,
            Some(TmuxEvent::ExtendedOutput {
                pane: 2,
                age: 150,
                data: b"hi!".to_vec()
            })
        );
    }

    #[test]
    fn test_malformed_id_does_not_abort_line() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%window-renamed", "12 vim").execute(&mut server);
        assert_eq!(
            event,
            Some(TmuxEvent::WindowRenamed {
                window: INVALID_ID,
                name: "vim".into()
            })
        );
    }

    #[test]
    fn test_window_renamed_keeps_spaces_in_name() {
        let mut server = TmuxServer::new("@client_size");
        feed("%window-renamed", "@4 my editor").execute(&mut server);
        assert_eq!(server.window(4).map(|w| w.name.as_str()), Some("my editor"));
    }

    #[test]
    fn test_layout_change_updates_window() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%layout-change", "@1 b25d,80x24,0,0,0 b25d,80x24,0,0,0 *")
            .execute(&mut server)
            .unwrap();
        match event {
            TmuxEvent::LayoutChange { window, flags, .. } => {
                assert_eq!(window, 1);
                assert_eq!(flags, "*");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            server.window(1).map(|w| w.layout.as_str()),
            Some("b25d,80x24,0,0,0")
        );
    }

    #[test]
    fn test_pause_and_continue() {
        let mut server = TmuxServer::new("@client_size");
        feed("%pause", "%5").execute(&mut server);
        assert!(server.pane(5).unwrap().paused);
        feed("%continue", "%5").execute(&mut server);
        assert!(!server.pane(5).unwrap().paused);
    }

    #[test]
    fn test_subscription_changed() {
        let mut server = TmuxServer::new("@client_size");
        let event = feed("%subscription-changed", "cwd $1 @2 0 %3 : /home/me x").execute(&mut server);
        assert_eq!(
            event,
            Some(TmuxEvent::SubscriptionChanged {
                name: "cwd".into(),
                session: 1,
                window: 2,
                window_index: 0,
                pane: 3,
                value: "/home/me x".into()
            })
        );
    }

    #[test]
    fn test_exit_reason_optional() {
        let mut server = TmuxServer::new("@client_size");
        assert_eq!(
            feed("%exit", "").execute(&mut server),
            Some(TmuxEvent::Exit { reason: None })
        );
        assert_eq!(
            feed("%exit", "server exited").execute(&mut server),
            Some(TmuxEvent::Exit {
                reason: Some("server exited".into())
            })
        );
    }

    #[test]
    fn test_ignored_produces_nothing() {
        let mut server = TmuxServer::new("@client_size");
        let mut n = Notification::Ignored;
        n.push_char('x');
        assert_eq!(n.execute(&mut server), None);
    }
}
