//! Dispatch events
//!
//! What the tokenizer hands to the interpreter. Every sequence is reported
//! with its raw ingredients (final byte, collected intermediate, private
//! marker, parameter list); giving them meaning is the interpreter's job.

use super::params::Params;

/// A dispatch event produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a graphic character
    Print(char),

    /// Execute a C0 control, or a C1 control that has no string semantics
    /// (IND, NEL, HTS, RI, ...)
    Execute(u8),

    /// `ESC [intermediate] final`
    EscDispatch {
        intermediate: Option<u8>,
        final_byte: u8,
    },

    /// `CSI [marker] params [intermediate] final`
    CsiDispatch(CsiAction),

    /// A complete OSC string
    OscDispatch(OscAction),

    /// Start of a streamed DCS (sixel)
    DcsHook(DcsHeader),
    /// One character of a streamed DCS body
    DcsPut(char),
    /// Streamed DCS ended with ST
    DcsUnhook,
    /// Streamed DCS ended by CAN/SUB or a stray ESC
    DcsAbort,

    /// A complete buffered DCS string
    DcsDispatch { header: DcsHeader, data: String },

    /// A complete APC string
    ApcDispatch(String),

    /// `DCS 1000 p` entered tmux control mode
    TmuxHook,
    /// Leading token of a control-mode line; `separated` is set when a space
    /// followed it
    TmuxToken { token: String, separated: bool },
    /// One character of a control-mode line after its leading token
    TmuxPut(char),
    /// End of a control-mode line
    TmuxLineEnd,
    /// Control mode left (ST, CAN/SUB or stray ESC)
    TmuxUnhook,

    /// VT52 `ESC final`
    Vt52Dispatch(u8),
    /// VT52 `ESC Y row column`, both zero based
    Vt52CursorPosition { row: u16, column: u16 },

    /// A malformed sequence was discarded; carries the offending token
    Invalid(String),
}

/// Ingredients of a CSI sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsiAction {
    pub params: Params,
    /// `<`, `=`, `>` or `?` right after the introducer
    pub private_marker: Option<u8>,
    pub intermediate: Option<u8>,
    pub final_byte: u8,
}

impl CsiAction {
    /// Whether the sequence is a DEC private one (`CSI ? ...`)
    pub fn is_private(&self) -> bool {
        self.private_marker == Some(b'?')
    }
}

/// Ingredients of a DCS introducer, up to and including its final byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcsHeader {
    pub params: Params,
    pub private_marker: Option<u8>,
    pub intermediate: Option<u8>,
    pub final_byte: u8,
}

/// How an OSC string was terminated; replies use the same terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTerminator {
    Bel,
    St,
}

impl StringTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            StringTerminator::Bel => "\x07",
            StringTerminator::St => "\x1b\\",
        }
    }
}

/// A complete OSC string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscAction {
    /// Numeric code before the first `;`, if the prefix was numeric
    pub code: Option<u32>,
    /// Everything after the first `;` (the whole string when the prefix was
    /// not numeric)
    pub payload: String,
    pub terminator: StringTerminator,
}

impl OscAction {
    /// Split a raw OSC body into code and payload
    pub fn from_raw(raw: String, terminator: StringTerminator) -> Self {
        let (prefix, rest) = match raw.find(';') {
            Some(pos) => (&raw[..pos], Some(&raw[pos + 1..])),
            None => (raw.as_str(), None),
        };
        let code = if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            prefix.parse::<u32>().ok()
        } else {
            None
        };
        let payload = match (code, rest) {
            (Some(_), Some(rest)) => rest.to_string(),
            (Some(_), None) => String::new(),
            (None, _) => raw,
        };
        Self {
            code,
            payload,
            terminator,
        }
    }
}
