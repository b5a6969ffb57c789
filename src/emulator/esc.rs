//! ESC sequences and VT52 escapes

use tracing::debug;

use super::reports;
use super::screen::{EraseMode, Screen, ScreenOp};
use super::Emulator;
use crate::core::{Mode, CHARSET_ASCII, CHARSET_DEC_GRAPHICS};

impl Emulator {
    pub(super) fn esc_dispatch(
        &mut self,
        screen: &mut dyn Screen,
        intermediate: Option<u8>,
        final_byte: u8,
    ) {
        match (intermediate, final_byte) {
            // IND
            (None, b'D') => screen.apply(ScreenOp::Index),
            // NEL
            (None, b'E') => screen.apply(ScreenOp::NextLine),
            // HTS
            (None, b'H') => screen.apply(ScreenOp::SetTabStop),
            // RI
            (None, b'M') => screen.apply(ScreenOp::ReverseIndex),
            // DECID
            (None, b'Z') => self.reply(reports::DA1),
            // RIS
            (None, b'c') => self.reset(screen),
            // DECKPAM / DECKPNM
            (None, b'=') => {
                self.set_mode(screen, Mode::AppKeyPad, true);
            }
            (None, b'>') => {
                self.set_mode(screen, Mode::AppKeyPad, false);
            }
            // DECSC / DECRC
            (None, b'7') => self.save_cursor(screen),
            (None, b'8') => self.restore_cursor(screen),
            // LS2 / LS3
            (None, b'n') => self.charsets_mut().invoke(2),
            (None, b'o') => self.charsets_mut().invoke(3),
            // SS2 / SS3 and a stray ST
            (None, b'N' | b'O' | b'\\') => {}
            // DECALN
            (Some(b'#'), b'8') => screen.apply(ScreenOp::AlignmentTest),
            // DECDHL / DECSWL / DECDWL
            (Some(b'#'), b'3'..=b'6') => {
                debug!(final_byte, "line size ignored");
            }
            // UTF-8 is the only encoding
            (Some(b'%'), b'G' | b'@') => {}
            // SCS
            (Some(b'('), _) => self.charsets_mut().designate(0, final_byte),
            (Some(b')'), _) => self.charsets_mut().designate(1, final_byte),
            (Some(b'*'), _) => self.charsets_mut().designate(2, final_byte),
            (Some(b'+'), _) => self.charsets_mut().designate(3, final_byte),
            // S7C1T / S8C1T
            (Some(b' '), b'F' | b'G') => {}
            _ => {
                let mut token = String::from("ESC ");
                if let Some(intermediate) = intermediate {
                    token.push(intermediate as char);
                }
                token.push(final_byte as char);
                self.decoding_error(token);
            }
        }
    }

    pub(super) fn vt52_dispatch(&mut self, screen: &mut dyn Screen, final_byte: u8) {
        match final_byte {
            b'A' => screen.apply(ScreenOp::CursorUp(1)),
            b'B' => screen.apply(ScreenOp::CursorDown(1)),
            b'C' => screen.apply(ScreenOp::CursorForward(1)),
            b'D' => screen.apply(ScreenOp::CursorBackward(1)),
            // graphics character set on / off
            b'F' => self.charsets_mut().designate_and_invoke(0, CHARSET_DEC_GRAPHICS),
            b'G' => self.charsets_mut().designate_and_invoke(0, CHARSET_ASCII),
            b'H' => screen.apply(ScreenOp::SetCursor { line: 0, column: 0 }),
            b'I' => screen.apply(ScreenOp::ReverseIndex),
            b'J' => screen.apply(ScreenOp::EraseInDisplay(EraseMode::Below)),
            b'K' => screen.apply(ScreenOp::EraseInLine(EraseMode::Below)),
            b'Z' => self.reply(reports::VT52_IDENTIFY),
            b'=' => {
                self.set_mode(screen, Mode::AppKeyPad, true);
            }
            b'>' => {
                self.set_mode(screen, Mode::AppKeyPad, false);
            }
            // back to ANSI
            b'<' => {
                self.set_mode(screen, Mode::Ansi, true);
            }
            _ => self.decoding_error(format!("VT52 ESC {}", final_byte as char)),
        }
    }
}
