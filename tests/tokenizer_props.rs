//! Property tests for the tokenizer and the mode registry

use proptest::prelude::*;

use vtmux::core::{Mode, ModeVector};
use vtmux::parser::{Action, Parser, ParserState};
use vtmux::{Emulator, RecordingScreen, ScreenSize};

/// Characters that exercise every state: controls, introducers, parameter
/// bytes, intermediates, finals and some multibyte text
fn terminal_char() -> impl Strategy<Value = char> {
    prop_oneof![
        3 => prop::char::range(' ', '~'),
        2 => prop::sample::select(vec![
            '\x1b', '\x07', '\x18', '\x1a', '\n', '\r', '\x08', '\u{9b}', '\u{9d}', '\u{90}', '\u{9c}',
            '[', ']', 'P', '_', '\\', ';', ':', '?', '$', '%', '#', '(',
        ]),
        1 => prop::char::any(),
    ]
}

proptest! {
    #[test]
    fn test_any_input_keeps_a_valid_state(input in prop::collection::vec(terminal_char(), 0..400)) {
        let input: String = input.into_iter().collect();
        let mut parser = Parser::new();
        parser.parse(&input);

        // CAN always returns to ground
        parser.parse("\x18");
        prop_assert_eq!(parser.state(), ParserState::Ground);
        let actions = parser.parse("ok");
        prop_assert_eq!(actions, vec![Action::Print('o'), Action::Print('k')]);
    }

    #[test]
    fn test_chunking_does_not_matter(
        input in prop::collection::vec(terminal_char(), 0..200),
        split in 0usize..200,
    ) {
        let input: String = input.into_iter().collect();
        let split = input
            .char_indices()
            .map(|(i, _)| i)
            .nth(split)
            .unwrap_or(input.len());

        let mut whole = Parser::new();
        let expected = whole.parse(&input);

        let mut chunked = Parser::new();
        let mut actions = chunked.parse(&input[..split]);
        actions.extend(chunked.parse(&input[split..]));
        prop_assert_eq!(actions, expected);
    }

    #[test]
    fn test_emulator_survives_any_input(input in prop::collection::vec(terminal_char(), 0..400)) {
        let input: String = input.into_iter().collect();
        let mut emulator = Emulator::new();
        let mut screen = RecordingScreen::new(ScreenSize::default());
        emulator.receive(&mut screen, &input);
        emulator.drain_events();
        emulator.receive(&mut screen, "\x18\x1b\\\x1b[?2h");
        prop_assert!(!emulator.decoding_sixel());
        prop_assert!(emulator.tmux().is_none());
    }

    #[test]
    fn test_mode_save_restore_idempotent(set in prop::collection::vec(any::<bool>(), Mode::COUNT)) {
        let mut modes = ModeVector::new();
        for (mode, on) in Mode::ALL.iter().zip(&set) {
            if *on {
                modes.set(*mode);
            } else {
                modes.reset(*mode);
            }
        }
        let before: Vec<bool> = Mode::ALL.iter().map(|&m| modes.get(m)).collect();
        for mode in Mode::ALL {
            modes.save(mode);
            modes.restore(mode);
        }
        let after: Vec<bool> = Mode::ALL.iter().map(|&m| modes.get(m)).collect();
        prop_assert_eq!(before, after);
    }
}
