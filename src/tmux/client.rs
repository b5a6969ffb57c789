//! Control-mode line protocol
//!
//! The tokenizer splits the control-mode stream into lines and hands over
//! each line's leading token followed by its remaining characters. Outside a
//! `%begin` block every line is a notification; inside one, lines are the
//! output of the outstanding command until the matching `%end` or `%error`.

use tracing::{debug, trace};

use super::command::PendingCommand;
use super::event::TmuxEvent;
use super::notification::Notification;
use super::server::TmuxServer;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Begin,
    End,
    Error,
}

#[derive(Debug)]
enum Line {
    /// No token seen yet
    Start,
    Marker(Marker, String),
    Body(String),
    Notification(Notification),
}

#[derive(Debug)]
struct Block {
    /// `time number flags` from `%begin`, repeated by the closing line
    args: String,
    lines: Vec<String>,
}

#[derive(Debug)]
pub struct TmuxClient {
    server: TmuxServer,
    line: Line,
    block: Option<Block>,
}

impl TmuxClient {
    /// Client for a freshly entered control mode
    pub fn new(size_option: impl Into<String>) -> Self {
        Self {
            server: TmuxServer::attached(size_option),
            line: Line::Start,
            block: None,
        }
    }

    pub fn server(&self) -> &TmuxServer {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut TmuxServer {
        &mut self.server
    }

    /// Inside a `%begin` block
    pub fn in_block(&self) -> bool {
        self.block.is_some()
    }

    /// Queue a command; see [`TmuxServer::send`]
    pub fn send(&mut self, command: PendingCommand) -> Result<()> {
        self.server.send(command)
    }

    /// Leading token of a line
    pub fn token(&mut self, token: String, separated: bool) {
        let in_block = self.block.is_some();
        self.line = match token.as_str() {
            "%begin" if !in_block => Line::Marker(Marker::Begin, String::new()),
            "%end" if in_block => Line::Marker(Marker::End, String::new()),
            "%error" if in_block => Line::Marker(Marker::Error, String::new()),
            _ if in_block => {
                let mut body = token;
                if separated {
                    body.push(' ');
                }
                Line::Body(body)
            }
            name => match Notification::from_name(name) {
                Some(notification) => Line::Notification(notification),
                None => {
                    debug!(token = name, "unknown tmux notification");
                    Line::Notification(Notification::Ignored)
                }
            },
        };
    }

    /// A character after the leading token
    pub fn put(&mut self, c: char) {
        match &mut self.line {
            Line::Start => self.line = Line::Body(c.to_string()),
            Line::Marker(_, args) | Line::Body(args) => args.push(c),
            Line::Notification(notification) => notification.push_char(c),
        }
    }

    pub fn line_end(&mut self) {
        match std::mem::replace(&mut self.line, Line::Start) {
            Line::Start => {
                if let Some(block) = &mut self.block {
                    block.lines.push(String::new());
                }
            }
            Line::Body(body) => match &mut self.block {
                Some(block) => block.lines.push(body),
                None => trace!(line = %body, "stray tmux line"),
            },
            Line::Notification(notification) => {
                if let Some(event) = notification.execute(&mut self.server) {
                    self.server.push_event(event);
                }
            }
            Line::Marker(Marker::Begin, args) => {
                self.block = Some(Block {
                    args,
                    lines: Vec::new(),
                });
            }
            Line::Marker(marker, args) => self.close_block(marker, args),
        }
    }

    fn close_block(&mut self, marker: Marker, args: String) {
        let Some(mut block) = self.block.take() else {
            return;
        };
        if block.args != args {
            // output that merely looks like a closing line
            let word = if marker == Marker::End { "%end" } else { "%error" };
            let line = if args.is_empty() {
                word.to_string()
            } else {
                format!("{word} {args}")
            };
            block.lines.push(line);
            self.block = Some(block);
            return;
        }
        trace!(lines = block.lines.len(), ?marker, "tmux block closed");
        match marker {
            Marker::Error => self.server.receive_error(block.lines),
            _ => self.server.receive_response(block.lines),
        }
    }

    /// Control mode ended; outstanding commands are cancelled
    pub fn close(&mut self) {
        self.line = Line::Start;
        self.block = None;
        self.server.abort();
    }

    pub fn take_outgoing(&mut self) -> Vec<String> {
        self.server.take_outgoing()
    }

    pub fn take_events(&mut self) -> Vec<TmuxEvent> {
        self.server.take_events()
    }
}
