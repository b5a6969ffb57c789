//! Terminal escape sequence parser
//!
//! A stateful tokenizer that turns codepoints into dispatch events.
//! Based on the VT500-series parser model from <https://vt100.net/emu/dec_ansi_parser>

mod action;
mod class;
mod params;
mod state;

pub use action::{Action, CsiAction, DcsHeader, OscAction, StringTerminator};
pub use class::{classify, CharClass};
pub use params::{Params, MAX_PARAMS, MAX_SUB_PARAMS};
pub use state::{Parser, ParserState};
