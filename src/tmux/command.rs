//! Commands sent to tmux and their continuations

use std::fmt;

use super::server::TmuxServer;

/// Why a command produced no output lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// tmux answered with an `%error` block
    Rejected(Vec<String>),
    /// Control mode ended before the answer arrived
    Cancelled,
}

/// Output lines of a `%begin`/`%end` block, or why there are none
pub type CommandResult = std::result::Result<Vec<String>, CommandError>;

type Handler = Box<dyn FnOnce(&mut TmuxServer, CommandResult) + Send>;

/// A command line waiting for, or awaiting, its answer
///
/// Completing consumes the command, so each continuation runs once.
pub struct PendingCommand {
    text: String,
    handler: Handler,
}

impl PendingCommand {
    pub fn new<F>(text: impl Into<String>, handler: F) -> Self
    where
        F: FnOnce(&mut TmuxServer, CommandResult) + Send + 'static,
    {
        Self {
            text: text.into(),
            handler: Box::new(handler),
        }
    }

    /// A command whose answer is not acted on
    ///
    /// Rejections still reach the host as `CommandFailed` events.
    pub fn fire_and_forget(text: impl Into<String>) -> Self {
        Self::new(text, |_, _| {})
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn complete(self, server: &mut TmuxServer, result: CommandResult) {
        (self.handler)(server, result);
    }
}

impl fmt::Debug for PendingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCommand")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_complete_runs_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let command = PendingCommand::new("list-windows", move |_, result| {
            assert_eq!(result, Ok(vec!["@1".to_string()]));
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(command.text(), "list-windows");
        let mut server = TmuxServer::new("@client_size");
        command.complete(&mut server, Ok(vec!["@1".to_string()]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_debug_shows_text() {
        let command = PendingCommand::fire_and_forget("kill-pane -t %1");
        assert!(format!("{command:?}").contains("kill-pane -t %1"));
    }
}
