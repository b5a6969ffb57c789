//! Parser State Machine
//!
//! A VT500-series tokenizer extended with three tmux control-mode states and
//! the VT52 cursor-addressing states. The parser consumes one codepoint at a
//! time and reports dispatch events through a callback, so the interpreter
//! can flip the VT52 flag between two codepoints of the same chunk.
//!
//! # State Machine
//!
//! Follows "A parser for DEC's ANSI-compatible video terminals" by Paul
//! Williams (<https://vt100.net/emu/dec_ansi_parser>), with these additions:
//! - `DCS 1000 p` switches to TmuxRead/TmuxConsume/TmuxError, which split
//!   the passthrough body into lines and leading tokens
//! - `DCS ... q` (sixel) is streamed one character at a time, any other DCS
//!   is buffered and dispatched whole at ST
//! - ESC inside a string body is held until the next character: `\`
//!   completes the ST, anything else aborts the string
//! - in VT52 mode ESC leads to Vt52Escape, and `ESC Y` reads two
//!   coordinate characters

use tracing::{debug, trace, warn};

use super::action::{Action, CsiAction, DcsHeader, OscAction, StringTerminator};
use super::class::{classify, CharClass};
use super::params::Params;
use crate::config::Limits;

/// Longest leading token of a control-mode line, and longest raw sequence
/// kept for error reports
const MAX_TOKEN_LENGTH: usize = 256;

/// `DCS 1000 p` enters tmux control mode
const TMUX_CONTROL_MODE: u16 = 1000;

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserState {
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    SosPmApcString,
    TmuxRead,
    TmuxConsume,
    TmuxError,
    Vt52Escape,
    Vt52CupRow,
    Vt52CupColumn,
}

impl ParserState {
    /// States whose body is collected verbatim until ST
    fn is_string_body(self) -> bool {
        matches!(
            self,
            ParserState::OscString
                | ParserState::SosPmApcString
                | ParserState::DcsPassthrough
                | ParserState::DcsIgnore
                | ParserState::TmuxRead
                | ParserState::TmuxConsume
                | ParserState::TmuxError
        )
    }

    fn is_tmux(self) -> bool {
        matches!(
            self,
            ParserState::TmuxRead | ParserState::TmuxConsume | ParserState::TmuxError
        )
    }
}

/// Which kind of string SosPmApcString is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Sos,
    Pm,
    Apc,
}

/// How the body of a hooked DCS is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
enum DcsMode {
    Streamed,
    Buffered(DcsHeader),
}

/// The terminal parser
#[derive(Debug)]
pub struct Parser {
    state: ParserState,
    params: Params,
    private_marker: Option<u8>,
    intermediate: Option<u8>,
    /// Raw characters of the sequence being collected
    token: String,
    /// ESC seen inside a string body
    pending_esc: bool,
    string_kind: StringKind,
    /// OSC, APC or buffered DCS body
    string: String,
    string_limit: usize,
    string_overflowed: bool,
    dcs_mode: Option<DcsMode>,
    /// Leading token of the current control-mode line
    tmux_token: String,
    tmux_token_len: usize,
    vt52: bool,
    vt52_row: u16,
    max_osc_length: usize,
    max_apc_length: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in the ground state with default limits
    pub fn new() -> Self {
        Self::with_limits(&Limits::default())
    }

    /// Create a parser whose string bodies are capped by `limits`
    pub fn with_limits(limits: &Limits) -> Self {
        Self {
            state: ParserState::Ground,
            params: Params::new(),
            private_marker: None,
            intermediate: None,
            token: String::with_capacity(32),
            pending_esc: false,
            string_kind: StringKind::Sos,
            string: String::with_capacity(256),
            string_limit: limits.max_osc_length,
            string_overflowed: false,
            dcs_mode: None,
            tmux_token: String::with_capacity(32),
            tmux_token_len: 0,
            vt52: false,
            vt52_row: 0,
            max_osc_length: limits.max_osc_length,
            max_apc_length: limits.max_apc_length,
        }
    }

    /// Current state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Whether VT52 mode is active
    pub fn vt52(&self) -> bool {
        self.vt52
    }

    /// Switch between ANSI and VT52 escape decoding (DECANM)
    pub fn set_vt52(&mut self, vt52: bool) {
        self.vt52 = vt52;
    }

    /// Reset the parser to initial state, keeping its limits
    pub fn reset(&mut self) {
        self.state = ParserState::Ground;
        self.clear();
        self.pending_esc = false;
        self.string.clear();
        self.string_overflowed = false;
        self.dcs_mode = None;
        self.tmux_token.clear();
        self.tmux_token_len = 0;
        self.vt52 = false;
    }

    /// Clear sequence state
    fn clear(&mut self) {
        self.params.clear();
        self.private_marker = None;
        self.intermediate = None;
        self.token.clear();
    }

    /// Process a whole string, collecting the actions
    pub fn parse(&mut self, input: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        for c in input.chars() {
            self.advance(c, &mut |action| actions.push(action));
        }
        actions
    }

    /// Process a single codepoint
    pub fn advance<F: FnMut(Action)>(&mut self, c: char, emit: &mut F) {
        if self.pending_esc {
            self.pending_esc = false;
            if c == '\\' {
                self.terminate_string(emit);
                return;
            }
            self.abort_string(emit);
            self.enter_escape();
        }

        let class = classify(c);

        // CAN and SUB abort anything, string bodies included
        if class.contains(CharClass::ABORT) {
            self.cancel(emit);
            return;
        }

        if self.state.is_string_body() {
            self.process_string(c, class, emit);
            return;
        }

        if class.contains(CharClass::ESCAPE) {
            self.enter_escape();
            return;
        }

        if class.contains(CharClass::EXECUTE) {
            emit(Action::Execute(c as u8));
            return;
        }

        if class.contains(CharClass::IGNORE) {
            return;
        }

        if class.contains(CharClass::C1) {
            self.process_c1(c as u8, emit);
            return;
        }

        if self.state != ParserState::Ground {
            self.record(c);
        }

        match self.state {
            ParserState::Ground => emit(Action::Print(c)),
            ParserState::Escape => self.process_escape(c, class, emit),
            ParserState::EscapeIntermediate => self.process_escape_intermediate(c, class, emit),
            ParserState::CsiEntry => self.process_csi_entry(c, class, emit),
            ParserState::CsiParam => self.process_csi_param(c, class, emit),
            ParserState::CsiIntermediate => self.process_csi_intermediate(c, class, emit),
            ParserState::CsiIgnore => self.process_csi_ignore(class, emit),
            ParserState::DcsEntry => self.process_dcs_entry(c, class, emit),
            ParserState::DcsParam => self.process_dcs_param(c, class, emit),
            ParserState::DcsIntermediate => self.process_dcs_intermediate(c, class, emit),
            ParserState::Vt52Escape => self.process_vt52_escape(c, emit),
            ParserState::Vt52CupRow => {
                self.vt52_row = vt52_coordinate(c);
                self.state = ParserState::Vt52CupColumn;
            }
            ParserState::Vt52CupColumn => {
                self.state = ParserState::Ground;
                emit(Action::Vt52CursorPosition {
                    row: self.vt52_row,
                    column: vt52_coordinate(c),
                });
            }
            // string bodies were handled above
            ParserState::DcsPassthrough
            | ParserState::DcsIgnore
            | ParserState::OscString
            | ParserState::SosPmApcString
            | ParserState::TmuxRead
            | ParserState::TmuxConsume
            | ParserState::TmuxError => {}
        }
    }

    /// Keep the raw sequence around for error reports
    fn record(&mut self, c: char) {
        if self.token.len() < MAX_TOKEN_LENGTH {
            self.token.push(c);
        }
    }

    fn enter_escape(&mut self) {
        self.clear();
        self.token.push('\x1b');
        self.state = if self.vt52 {
            ParserState::Vt52Escape
        } else {
            ParserState::Escape
        };
    }

    fn cancel<F: FnMut(Action)>(&mut self, emit: &mut F) {
        if self.state.is_string_body() {
            self.abort_string(emit);
        }
        self.clear();
        self.state = ParserState::Ground;
    }

    fn invalid<F: FnMut(Action)>(&mut self, emit: &mut F) {
        debug!(token = ?self.token, "discarding malformed sequence");
        emit(Action::Invalid(std::mem::take(&mut self.token)));
        self.state = ParserState::Ground;
    }

    /// Process C1 control characters (0x80-0x9F) outside string bodies
    fn process_c1<F: FnMut(Action)>(&mut self, byte: u8, emit: &mut F) {
        self.clear();
        match byte {
            // DCS
            0x90 => {
                self.token.push_str("\x1bP");
                self.state = ParserState::DcsEntry;
            }
            // CSI
            0x9B => {
                self.token.push_str("\x1b[");
                self.state = ParserState::CsiEntry;
            }
            // OSC
            0x9D => self.start_osc(),
            // SOS, PM, APC
            0x98 => self.start_string(StringKind::Sos),
            0x9E => self.start_string(StringKind::Pm),
            0x9F => self.start_string(StringKind::Apc),
            // ST with no string open
            0x9C => self.state = ParserState::Ground,
            _ => {
                self.state = ParserState::Ground;
                emit(Action::Execute(byte));
            }
        }
    }

    /// Process bytes in escape state
    fn process_escape<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
            self.state = ParserState::EscapeIntermediate;
            return;
        }
        match c {
            '[' => self.state = ParserState::CsiEntry,
            'P' => self.state = ParserState::DcsEntry,
            ']' => self.start_osc(),
            'X' => self.start_string(StringKind::Sos),
            '^' => self.start_string(StringKind::Pm),
            '_' => self.start_string(StringKind::Apc),
            _ if class.contains(CharClass::ESC_FINAL) => {
                self.state = ParserState::Ground;
                emit(Action::EscDispatch {
                    intermediate: None,
                    final_byte: c as u8,
                });
            }
            _ => self.invalid(emit),
        }
    }

    /// Process bytes in escape intermediate state
    fn process_escape_intermediate<F: FnMut(Action)>(
        &mut self,
        c: char,
        class: CharClass,
        emit: &mut F,
    ) {
        if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
        } else if class.contains(CharClass::ESC_FINAL) {
            self.state = ParserState::Ground;
            emit(Action::EscDispatch {
                intermediate: self.intermediate,
                final_byte: c as u8,
            });
        } else {
            self.invalid(emit);
        }
    }

    /// Process bytes in CSI entry state
    fn process_csi_entry<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if c == ':' {
            self.state = ParserState::CsiIgnore;
        } else if class.contains(CharClass::PRIVATE_MARKER) {
            self.private_marker = Some(c as u8);
            self.state = ParserState::CsiParam;
        } else {
            self.process_csi_param(c, class, emit);
        }
    }

    /// Process bytes in CSI param state
    fn process_csi_param<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if self.param(c, class) {
            self.state = ParserState::CsiParam;
        } else if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
            self.state = ParserState::CsiIntermediate;
        } else if class.contains(CharClass::FINAL) {
            self.dispatch_csi(c as u8, emit);
        } else {
            // late private marker, or a non-ASCII character
            self.state = ParserState::CsiIgnore;
        }
    }

    /// Process bytes in CSI intermediate state
    fn process_csi_intermediate<F: FnMut(Action)>(
        &mut self,
        c: char,
        class: CharClass,
        emit: &mut F,
    ) {
        if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
        } else if class.contains(CharClass::FINAL) {
            self.dispatch_csi(c as u8, emit);
        } else {
            self.state = ParserState::CsiIgnore;
        }
    }

    /// Consume the rest of a malformed CSI sequence
    fn process_csi_ignore<F: FnMut(Action)>(&mut self, class: CharClass, emit: &mut F) {
        if class.contains(CharClass::FINAL) {
            self.invalid(emit);
        }
    }

    fn dispatch_csi<F: FnMut(Action)>(&mut self, final_byte: u8, emit: &mut F) {
        self.state = ParserState::Ground;
        trace!(token = ?self.token, "csi dispatch");
        emit(Action::CsiDispatch(CsiAction {
            params: self.params,
            private_marker: self.private_marker,
            intermediate: self.intermediate,
            final_byte,
        }));
    }

    /// Process bytes in DCS entry state
    fn process_dcs_entry<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if c == ':' {
            self.state = ParserState::DcsIgnore;
        } else if class.contains(CharClass::PRIVATE_MARKER) {
            self.private_marker = Some(c as u8);
            self.state = ParserState::DcsParam;
        } else {
            self.process_dcs_param(c, class, emit);
        }
    }

    /// Process bytes in DCS param state
    fn process_dcs_param<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if self.param(c, class) {
            self.state = ParserState::DcsParam;
        } else if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
            self.state = ParserState::DcsIntermediate;
        } else if class.contains(CharClass::FINAL) {
            self.hook(c as u8, emit);
        } else {
            self.state = ParserState::DcsIgnore;
        }
    }

    /// Process bytes in DCS intermediate state
    fn process_dcs_intermediate<F: FnMut(Action)>(
        &mut self,
        c: char,
        class: CharClass,
        emit: &mut F,
    ) {
        if class.contains(CharClass::INTERMEDIATE) {
            self.collect(c);
        } else if class.contains(CharClass::FINAL) {
            self.hook(c as u8, emit);
        } else {
            self.state = ParserState::DcsIgnore;
        }
    }

    /// Decide at the DCS final byte where its body goes
    fn hook<F: FnMut(Action)>(&mut self, final_byte: u8, emit: &mut F) {
        let header = DcsHeader {
            params: self.params,
            private_marker: self.private_marker,
            intermediate: self.intermediate,
            final_byte,
        };
        let plain = header.private_marker.is_none() && header.intermediate.is_none();

        if plain && final_byte == b'p' && header.params.get(0) == Some(TMUX_CONTROL_MODE) {
            debug!("entering tmux control mode");
            self.tmux_token.clear();
            self.tmux_token_len = 0;
            self.state = ParserState::TmuxRead;
            emit(Action::TmuxHook);
        } else if plain && final_byte == b'q' {
            self.dcs_mode = Some(DcsMode::Streamed);
            self.state = ParserState::DcsPassthrough;
            emit(Action::DcsHook(header));
        } else {
            self.string.clear();
            self.string_limit = self.max_osc_length;
            self.string_overflowed = false;
            self.dcs_mode = Some(DcsMode::Buffered(header));
            self.state = ParserState::DcsPassthrough;
        }
    }

    /// VT52 `ESC final`
    fn process_vt52_escape<F: FnMut(Action)>(&mut self, c: char, emit: &mut F) {
        match c {
            'Y' => self.state = ParserState::Vt52CupRow,
            ' '..='~' => {
                self.state = ParserState::Ground;
                emit(Action::Vt52Dispatch(c as u8));
            }
            _ => self.invalid(emit),
        }
    }

    /// Accumulate a parameter character; false when `c` is not one
    fn param(&mut self, c: char, class: CharClass) -> bool {
        if class.contains(CharClass::DIGIT) {
            self.params.push_digit(c as u8 - b'0');
        } else if c == ';' {
            self.params.next_param();
        } else if c == ':' {
            self.params.next_sub_param();
        } else {
            return false;
        }
        true
    }

    /// Collect an intermediate; only the first one is kept
    fn collect(&mut self, c: char) {
        if self.intermediate.is_none() {
            self.intermediate = Some(c as u8);
        } else {
            trace!(?c, "dropping extra intermediate");
        }
    }

    fn start_osc(&mut self) {
        self.string.clear();
        self.string_limit = self.max_osc_length;
        self.string_overflowed = false;
        self.state = ParserState::OscString;
    }

    fn start_string(&mut self, kind: StringKind) {
        self.string.clear();
        self.string_kind = kind;
        self.string_limit = self.max_apc_length;
        self.string_overflowed = false;
        self.state = ParserState::SosPmApcString;
    }

    fn push_string(&mut self, c: char) {
        if self.string.len() + c.len_utf8() <= self.string_limit {
            self.string.push(c);
        } else if !self.string_overflowed {
            self.string_overflowed = true;
            warn!(limit = self.string_limit, "string body too long, truncating");
        }
    }

    /// Process a character inside OSC, SOS/PM/APC, DCS or tmux bodies
    fn process_string<F: FnMut(Action)>(&mut self, c: char, class: CharClass, emit: &mut F) {
        if class.contains(CharClass::ESCAPE) {
            self.pending_esc = true;
            return;
        }
        if c == '\u{9c}' {
            self.terminate_string(emit);
            return;
        }

        match self.state {
            ParserState::OscString => {
                if c == '\x07' {
                    let raw = std::mem::take(&mut self.string);
                    self.state = ParserState::Ground;
                    emit(Action::OscDispatch(OscAction::from_raw(
                        raw,
                        StringTerminator::Bel,
                    )));
                } else if !class.contains(CharClass::CONTROL) {
                    self.push_string(c);
                }
            }
            ParserState::SosPmApcString => {
                if self.string_kind == StringKind::Apc && !class.contains(CharClass::CONTROL) {
                    self.push_string(c);
                }
            }
            ParserState::DcsPassthrough => match self.dcs_mode {
                Some(DcsMode::Streamed) => emit(Action::DcsPut(c)),
                Some(DcsMode::Buffered(_)) => self.push_string(c),
                None => {}
            },
            ParserState::TmuxRead | ParserState::TmuxConsume | ParserState::TmuxError => {
                self.process_tmux(c, emit)
            }
            _ => {}
        }
    }

    /// Split a control-mode body into lines and their leading token
    fn process_tmux<F: FnMut(Action)>(&mut self, c: char, emit: &mut F) {
        if c == '\r' {
            return;
        }
        match self.state {
            ParserState::TmuxRead => match c {
                '\n' => {
                    if !self.tmux_token.is_empty() {
                        self.flush_tmux_token(false, emit);
                    }
                    emit(Action::TmuxLineEnd);
                }
                ' ' => {
                    self.flush_tmux_token(true, emit);
                    self.state = ParserState::TmuxConsume;
                }
                _ => {
                    self.tmux_token.push(c);
                    self.tmux_token_len += 1;
                    if self.tmux_token_len > MAX_TOKEN_LENGTH {
                        if self.tmux_token.starts_with('%') {
                            let token = std::mem::take(&mut self.tmux_token);
                            self.tmux_token_len = 0;
                            debug!(len = token.len(), "control-mode token too long");
                            emit(Action::Invalid(token));
                            self.state = ParserState::TmuxError;
                        } else {
                            // plain data: hand over what we have and keep going
                            self.flush_tmux_token(false, emit);
                            self.state = ParserState::TmuxConsume;
                        }
                    }
                }
            },
            ParserState::TmuxConsume => {
                if c == '\n' {
                    self.state = ParserState::TmuxRead;
                    emit(Action::TmuxLineEnd);
                } else {
                    emit(Action::TmuxPut(c));
                }
            }
            ParserState::TmuxError => {
                if c == '\n' {
                    self.state = ParserState::TmuxRead;
                }
            }
            _ => {}
        }
    }

    fn flush_tmux_token<F: FnMut(Action)>(&mut self, separated: bool, emit: &mut F) {
        let token = std::mem::take(&mut self.tmux_token);
        self.tmux_token_len = 0;
        emit(Action::TmuxToken { token, separated });
    }

    /// ST arrived for the current string body
    fn terminate_string<F: FnMut(Action)>(&mut self, emit: &mut F) {
        let state = self.state;
        self.state = ParserState::Ground;
        match state {
            ParserState::OscString => {
                let raw = std::mem::take(&mut self.string);
                emit(Action::OscDispatch(OscAction::from_raw(
                    raw,
                    StringTerminator::St,
                )));
            }
            ParserState::SosPmApcString => {
                let raw = std::mem::take(&mut self.string);
                if self.string_kind == StringKind::Apc {
                    emit(Action::ApcDispatch(raw));
                }
            }
            ParserState::DcsPassthrough => match self.dcs_mode.take() {
                Some(DcsMode::Streamed) => emit(Action::DcsUnhook),
                Some(DcsMode::Buffered(header)) => emit(Action::DcsDispatch {
                    header,
                    data: std::mem::take(&mut self.string),
                }),
                None => {}
            },
            ParserState::DcsIgnore => self.invalid(emit),
            ParserState::TmuxRead | ParserState::TmuxConsume | ParserState::TmuxError => {
                self.tmux_token.clear();
                self.tmux_token_len = 0;
                debug!("leaving tmux control mode");
                emit(Action::TmuxUnhook);
            }
            _ => {}
        }
        self.clear();
    }

    /// The current string body ends without ST
    fn abort_string<F: FnMut(Action)>(&mut self, emit: &mut F) {
        let state = self.state;
        self.state = ParserState::Ground;
        match state {
            ParserState::DcsPassthrough => {
                if let Some(DcsMode::Streamed) = self.dcs_mode.take() {
                    emit(Action::DcsAbort);
                }
            }
            state if state.is_tmux() => {
                self.tmux_token.clear();
                self.tmux_token_len = 0;
                debug!("tmux control mode aborted");
                emit(Action::TmuxUnhook);
            }
            ParserState::OscString | ParserState::SosPmApcString => {
                debug!(len = self.string.len(), "string aborted");
            }
            _ => {}
        }
        self.string.clear();
        self.dcs_mode = None;
    }
}

/// VT52 coordinates are sent offset by 32
fn vt52_coordinate(c: char) -> u16 {
    (c as u32).saturating_sub(32).min(u32::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Vec<Action> {
        Parser::new().parse(input)
    }

    fn csi(actions: &[Action]) -> &CsiAction {
        match actions {
            [Action::CsiDispatch(csi)] => csi,
            other => panic!("expected one CSI dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_parser_print() {
        let actions = parse("Hi é");
        assert_eq!(
            actions,
            vec![
                Action::Print('H'),
                Action::Print('i'),
                Action::Print(' '),
                Action::Print('é'),
            ]
        );
    }

    #[test]
    fn test_parser_c0_inside_csi() {
        let actions = parse("\x1b[1\n;2H");
        assert_eq!(actions[0], Action::Execute(b'\n'));
        let csi = csi(&actions[1..]);
        assert_eq!(csi.params.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(csi.final_byte, b'H');
    }

    #[test]
    fn test_parser_csi_private_marker() {
        let actions = parse("\x1b[?1049h");
        let csi = csi(&actions);
        assert!(csi.is_private());
        assert_eq!(csi.params.get(0), Some(1049));
        assert_eq!(csi.intermediate, None);
    }

    #[test]
    fn test_parser_csi_intermediate() {
        let actions = parse("\x1b[2 q");
        let csi = csi(&actions);
        assert_eq!(csi.intermediate, Some(b' '));
        assert_eq!(csi.final_byte, b'q');
    }

    #[test]
    fn test_parser_second_intermediate_dropped() {
        let actions = parse("\x1b[1!$p");
        let csi = csi(&actions);
        assert_eq!(csi.intermediate, Some(b'!'));
    }

    #[test]
    fn test_parser_csi_sub_params() {
        let actions = parse("\x1b[38:2::10:20:30m");
        let csi = csi(&actions);
        assert!(csi.params.has_sub_params());
        assert_eq!(csi.params.sub_params(0), &[2, 0, 10, 20, 30]);
    }

    #[test]
    fn test_parser_colon_at_entry_ignored() {
        let actions = parse("\x1b[:5mA");
        assert!(matches!(actions[0], Action::Invalid(_)));
        assert_eq!(actions[1], Action::Print('A'));
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_parser_late_private_marker_ignored() {
        let actions = parse("\x1b[1?hA");
        assert!(matches!(actions[0], Action::Invalid(_)));
        assert_eq!(actions[1], Action::Print('A'));
    }

    #[test]
    fn test_parser_esc_dispatch() {
        let actions = parse("\x1b(0\x1b7");
        assert_eq!(
            actions,
            vec![
                Action::EscDispatch {
                    intermediate: Some(b'('),
                    final_byte: b'0'
                },
                Action::EscDispatch {
                    intermediate: None,
                    final_byte: b'7'
                },
            ]
        );
    }

    #[test]
    fn test_parser_esc_restarts_sequence() {
        let actions = parse("\x1b[12\x1b[3A");
        let csi = csi(&actions);
        assert_eq!(csi.params.get(0), Some(3));
    }

    #[test]
    fn test_parser_cancel() {
        let mut parser = Parser::new();
        let actions = parser.parse("\x1b[12\x18A");
        assert_eq!(actions, vec![Action::Print('A')]);
        assert_eq!(parser.state(), ParserState::Ground);
    }

    #[test]
    fn test_parser_osc_bel_and_st() {
        let actions = parse("\x1b]0;title\x07\x1b]2;other\x1b\\");
        assert_eq!(
            actions,
            vec![
                Action::OscDispatch(OscAction {
                    code: Some(0),
                    payload: "title".into(),
                    terminator: StringTerminator::Bel,
                }),
                Action::OscDispatch(OscAction {
                    code: Some(2),
                    payload: "other".into(),
                    terminator: StringTerminator::St,
                }),
            ]
        );
    }

    #[test]
    fn test_parser_osc_length_capped() {
        let limits = Limits {
            max_osc_length: 8,
            ..Limits::default()
        };
        let mut parser = Parser::with_limits(&limits);
        let actions = parser.parse("\x1b]2;0123456789\x07");
        match &actions[..] {
            [Action::OscDispatch(osc)] => assert_eq!(osc.payload, "012345"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parser_osc_aborted_by_escape() {
        let actions = parse("\x1b]0;abc\x1b[2J");
        let csi = csi(&actions);
        assert_eq!(csi.final_byte, b'J');
    }

    #[test]
    fn test_parser_c1_csi() {
        let actions = parse("\u{9b}5A");
        let csi = csi(&actions);
        assert_eq!(csi.params.get(0), Some(5));
        assert_eq!(csi.final_byte, b'A');
    }

    #[test]
    fn test_parser_c1_execute() {
        assert_eq!(parse("\u{84}"), vec![Action::Execute(0x84)]);
    }

    #[test]
    fn test_parser_sos_pm_discarded_apc_kept() {
        let actions = parse("\x1bXsos\x1b\\\x1b^pm\x1b\\\x1b_Gi=1\x1b\\");
        assert_eq!(actions, vec![Action::ApcDispatch("Gi=1".into())]);
    }

    #[test]
    fn test_parser_dcs_sixel_streamed() {
        let actions = parse("\x1bP0;1q#0~\x1b\\");
        assert!(matches!(&actions[0], Action::DcsHook(h) if h.final_byte == b'q'));
        assert_eq!(actions[1], Action::DcsPut('#'));
        assert_eq!(actions[2], Action::DcsPut('0'));
        assert_eq!(actions[3], Action::DcsPut('~'));
        assert_eq!(actions[4], Action::DcsUnhook);
    }

    #[test]
    fn test_parser_dcs_sixel_aborted() {
        let actions = parse("\x1bPq#0\x18");
        assert_eq!(actions.last(), Some(&Action::DcsAbort));
    }

    #[test]
    fn test_parser_dcs_buffered() {
        let actions = parse("\x1bP$qm\x1b\\");
        match &actions[..] {
            [Action::DcsDispatch { header, data }] => {
                assert_eq!(header.intermediate, Some(b'$'));
                assert_eq!(header.final_byte, b'q');
                assert_eq!(data, "m");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parser_tmux_lines() {
        let actions = parse("\x1bP1000p%begin 1 2 0\n%end 1 2 0\n\x1b\\");
        assert_eq!(actions[0], Action::TmuxHook);
        assert_eq!(
            actions[1],
            Action::TmuxToken {
                token: "%begin".into(),
                separated: true
            }
        );
        assert_eq!(actions[2], Action::TmuxPut('1'));
        assert!(actions.contains(&Action::TmuxLineEnd));
        assert_eq!(actions.last(), Some(&Action::TmuxUnhook));
    }

    #[test]
    fn test_parser_tmux_bare_token_and_empty_line() {
        let actions = parse("\x1bP1000p%exit\r\n\n");
        assert_eq!(
            &actions[1..],
            &[
                Action::TmuxToken {
                    token: "%exit".into(),
                    separated: false
                },
                Action::TmuxLineEnd,
                Action::TmuxLineEnd,
            ]
        );
    }

    #[test]
    fn test_parser_tmux_long_notification_discarded() {
        let mut parser = Parser::new();
        let line = format!("\x1bP1000p%{}\nok\n", "x".repeat(300));
        let actions = parser.parse(&line);
        assert!(matches!(actions[1], Action::Invalid(_)));
        assert_eq!(
            actions[2],
            Action::TmuxToken {
                token: "ok".into(),
                separated: false
            }
        );
        assert_eq!(parser.state(), ParserState::TmuxRead);
    }

    #[test]
    fn test_parser_tmux_long_data_flushed() {
        let line = format!("\x1bP1000p{}\n", "y".repeat(300));
        let actions = parse(&line);
        let mut text = String::new();
        for action in &actions {
            match action {
                Action::TmuxToken { token, .. } => text.push_str(token),
                Action::TmuxPut(c) => text.push(*c),
                _ => {}
            }
        }
        assert_eq!(text, "y".repeat(300));
    }

    #[test]
    fn test_parser_tmux_cancel() {
        let mut parser = Parser::new();
        let actions = parser.parse("\x1bP1000p%out\x1a");
        assert_eq!(actions.last(), Some(&Action::TmuxUnhook));
        assert_eq!(parser.state(), ParserState::Ground);
    }

    #[test]
    fn test_parser_vt52() {
        let mut parser = Parser::new();
        parser.set_vt52(true);
        let actions = parser.parse("\x1bY%*\x1bA");
        assert_eq!(
            actions,
            vec![
                Action::Vt52CursorPosition { row: 5, column: 10 },
                Action::Vt52Dispatch(b'A'),
            ]
        );
    }

    #[test]
    fn test_parser_del_ignored() {
        assert_eq!(parse("a\x7fb"), vec![Action::Print('a'), Action::Print('b')]);
    }
}
