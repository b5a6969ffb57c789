//! tmux control mode driven through the emulator

use std::sync::{Arc, Mutex};

use vtmux::emulator::Event;
use vtmux::parser::ParserState;
use vtmux::tmux::{CommandError, PendingCommand, TmuxEvent, LIST_SESSIONS};
use vtmux::{Emulator, RecordingScreen, ScreenSize};

fn feed(emulator: &mut Emulator, input: &str) -> Vec<Event> {
    let mut screen = RecordingScreen::new(ScreenSize::default());
    emulator.receive(&mut screen, input);
    assert!(screen.ops().is_empty(), "control mode must not touch the screen");
    emulator.drain_events()
}

fn attach(emulator: &mut Emulator) {
    let events = feed(emulator, "\x1bP1000p%begin 1 1 0\n%end 1 1 0\n");
    assert_eq!(
        events,
        vec![Event::TmuxStarted, Event::TmuxCommand(LIST_SESSIONS.into())]
    );
}

#[test]
fn test_attach_lists_sessions() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);

    let events = feed(
        &mut emulator,
        "%begin 2 2 1\n$1 main\n$2 my\\ work\n%end 2 2 1\n",
    );
    assert_eq!(
        events,
        vec![Event::Tmux(TmuxEvent::SessionsListed {
            sessions: vec![(1, "main".into()), (2, "my work".into())]
        })]
    );
    let server = emulator.tmux().unwrap().server();
    assert_eq!(server.session(2).unwrap().name, "my work");
}

#[test]
fn test_unseen_session_queries_size() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);
    feed(&mut emulator, "%begin 2 2 1\n%end 2 2 1\n");

    let events = feed(&mut emulator, "%session-changed $3 third\n");
    assert_eq!(
        events,
        vec![
            Event::Tmux(TmuxEvent::SessionChanged {
                session: 3,
                name: "third".into()
            }),
            Event::TmuxCommand("show -v -q -t $3 @client_size".into()),
        ]
    );

    let events = feed(&mut emulator, "%begin 3 3 1\n200,50\n%end 3 3 1\n");
    assert_eq!(
        events,
        vec![Event::Tmux(TmuxEvent::SessionSize {
            session: 3,
            width: 200,
            height: 50
        })]
    );
    let server = emulator.tmux().unwrap().server();
    assert_eq!(server.active_session(), 3);
    assert_eq!(server.session(3).unwrap().size, Some((200, 50)));

    // a known session is not queried again
    let events = feed(&mut emulator, "%session-changed $3 third\n");
    assert_eq!(events.len(), 1);
}

#[test]
fn test_pane_output_decoded() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);

    let events = feed(&mut emulator, "%output %4 hi\\015\\012\\134x\n");
    assert_eq!(
        events,
        vec![Event::Tmux(TmuxEvent::Output {
            pane: 4,
            data: b"hi\r\n\\x".to_vec()
        })]
    );
}

#[test]
fn test_window_tracking() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);
    feed(
        &mut emulator,
        "%window-add @2\n%window-renamed @2 editor\n%layout-change @2 b25d,80x24,0,0,1 b25d,80x24,0,0,1 *\n%window-pane-changed @2 %1\n%window-close @2\n",
    );
    let server = emulator.tmux().unwrap().server();
    let window = server.window(2).unwrap();
    assert_eq!(window.name, "editor");
    assert_eq!(window.layout, "b25d,80x24,0,0,1");
    assert_eq!(window.active_pane, Some(1));
    assert_eq!(server.pane(1).unwrap().window, Some(2));
}

#[test]
fn test_host_commands_serialized() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);

    emulator
        .send_tmux_command(PendingCommand::fire_and_forget("list-windows"))
        .unwrap();
    // list-sessions is still outstanding
    assert!(emulator.drain_events().is_empty());

    let events = feed(&mut emulator, "%begin 2 2 1\n%end 2 2 1\n");
    assert_eq!(
        events,
        vec![
            Event::Tmux(TmuxEvent::SessionsListed { sessions: vec![] }),
            Event::TmuxCommand("list-windows".into()),
        ]
    );

    let events = feed(&mut emulator, "%begin 3 3 1\nno such window\n%error 3 3 1\n");
    assert_eq!(
        events,
        vec![Event::Tmux(TmuxEvent::CommandFailed {
            command: "list-windows".into(),
            lines: vec!["no such window".into()]
        })]
    );
}

#[test]
fn test_detach_terminates_session() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);
    let events = feed(&mut emulator, "%client-detached /dev/pts/3\n%exit\n\x1b\\");
    assert_eq!(
        events,
        vec![
            Event::Tmux(TmuxEvent::ClientDetached {
                client: "/dev/pts/3".into()
            }),
            Event::TmuxSessionTerminated,
            Event::Tmux(TmuxEvent::Exit { reason: None }),
            Event::TmuxEnded,
        ]
    );
    assert!(emulator.tmux().is_none());
    assert!(!emulator.modes().get(vtmux::core::Mode::Tmux));
}

#[test]
fn test_leaving_control_mode_cancels_commands() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);
    emulator
        .send_tmux_command(PendingCommand::fire_and_forget("list-windows"))
        .unwrap();
    let events = feed(&mut emulator, "\x1b\\");
    assert_eq!(events, vec![Event::TmuxEnded]);
    assert!(emulator
        .send_tmux_command(PendingCommand::fire_and_forget("list-windows"))
        .is_err());
}

#[test]
fn test_abort_cancels_queued_commands() {
    let mut emulator = Emulator::new();
    attach(&mut emulator);

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let log = outcomes.clone();
    emulator
        .send_tmux_command(PendingCommand::new("list-windows", move |_, result| {
            log.lock().unwrap().push(result);
        }))
        .unwrap();
    assert!(emulator.drain_events().is_empty());

    emulator.abort();
    assert_eq!(*outcomes.lock().unwrap(), vec![Err(CommandError::Cancelled)]);
    assert_eq!(emulator.drain_events(), vec![Event::TmuxEnded]);
    assert!(emulator.tmux().is_none());
    assert_eq!(emulator.parser_state(), ParserState::Ground);

    // the rest of the stream is ordinary output again
    let mut screen = RecordingScreen::new(ScreenSize::default());
    emulator.receive(&mut screen, "%exit");
    assert_eq!(screen.text(), "%exit");
}
