//! CSI sequences

use std::fmt::Write as _;

use tracing::debug;

use super::reports;
use super::screen::{
    CursorShape, EraseMode, Rendition, Screen, ScreenOp, UnderlineStyle,
};
use super::Emulator;
use crate::core::{Color, Mode, Rgb};
use crate::parser::{CsiAction, Params};

/// Rendition as last set by SGR, kept to answer DECRQSS
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct SgrState {
    bold: bool,
    faint: bool,
    italic: bool,
    underline: Option<UnderlineStyle>,
    blink: bool,
    reverse: bool,
    conceal: bool,
    strikethrough: bool,
    overline: bool,
    foreground: Color,
    background: Color,
    underline_color: Color,
}

impl SgrState {
    fn apply(&mut self, rendition: Rendition) {
        match rendition {
            Rendition::Reset => *self = Self::default(),
            Rendition::Bold => self.bold = true,
            Rendition::Faint => self.faint = true,
            Rendition::Italic => self.italic = true,
            Rendition::Underline(style) => self.underline = Some(style),
            Rendition::Blink => self.blink = true,
            Rendition::Reverse => self.reverse = true,
            Rendition::Conceal => self.conceal = true,
            Rendition::Strikethrough => self.strikethrough = true,
            Rendition::Overline => self.overline = true,
            Rendition::NormalIntensity => {
                self.bold = false;
                self.faint = false;
            }
            Rendition::NoItalic => self.italic = false,
            Rendition::NoUnderline => self.underline = None,
            Rendition::NoBlink => self.blink = false,
            Rendition::NoReverse => self.reverse = false,
            Rendition::NoConceal => self.conceal = false,
            Rendition::NoStrikethrough => self.strikethrough = false,
            Rendition::NoOverline => self.overline = false,
            Rendition::Foreground(color) => self.foreground = color,
            Rendition::Background(color) => self.background = color,
            Rendition::UnderlineColor(color) => self.underline_color = color,
        }
    }

    /// SGR parameters reproducing this state, starting with a reset
    pub(super) fn to_params(self) -> String {
        let mut out = String::from("0");
        let flags = [
            (self.bold, "1"),
            (self.faint, "2"),
            (self.italic, "3"),
            (self.blink, "5"),
            (self.reverse, "7"),
            (self.conceal, "8"),
            (self.strikethrough, "9"),
            (self.overline, "53"),
        ];
        for (set, code) in flags {
            if set {
                out.push(';');
                out.push_str(code);
            }
        }
        match self.underline {
            Some(UnderlineStyle::Single) => out.push_str(";4"),
            Some(UnderlineStyle::Double) => out.push_str(";21"),
            Some(UnderlineStyle::Curly) => out.push_str(";4:3"),
            Some(UnderlineStyle::Dotted) => out.push_str(";4:4"),
            Some(UnderlineStyle::Dashed) => out.push_str(";4:5"),
            None => {}
        }
        push_color(&mut out, self.foreground, 30, 90, 38);
        push_color(&mut out, self.background, 40, 100, 48);
        push_color(&mut out, self.underline_color, 0, 0, 58);
        out
    }
}

fn push_color(out: &mut String, color: Color, base: u16, bright: u16, extended: u16) {
    match color {
        Color::Default => {}
        Color::Indexed(n) if n < 8 && base != 0 => {
            let _ = write!(out, ";{}", base + u16::from(n));
        }
        Color::Indexed(n) if n < 16 && bright != 0 => {
            let _ = write!(out, ";{}", bright + u16::from(n) - 8);
        }
        Color::Indexed(n) => {
            let _ = write!(out, ";{extended};5;{n}");
        }
        Color::Rgb(rgb) => {
            let _ = write!(out, ";{extended};2;{};{};{}", rgb.r, rgb.g, rgb.b);
        }
    }
}

/// Text form of a CSI for decoding-error reports
pub(super) fn describe(csi: &CsiAction) -> String {
    let mut out = String::from("CSI ");
    if let Some(marker) = csi.private_marker {
        out.push(marker as char);
    }
    let params: Vec<String> = csi.params.iter().map(|p| p.to_string()).collect();
    out.push_str(&params.join(";"));
    if let Some(intermediate) = csi.intermediate {
        out.push(intermediate as char);
    }
    out.push(csi.final_byte as char);
    out
}

impl Emulator {
    pub(super) fn csi_dispatch(&mut self, screen: &mut dyn Screen, csi: &CsiAction) {
        let p = &csi.params;
        match (csi.private_marker, csi.intermediate, csi.final_byte) {
            // ICH
            (None, None, b'@') => screen.apply(ScreenOp::InsertChars(p.get_or(0, 1))),
            // CUU
            (None, None, b'A') => screen.apply(ScreenOp::CursorUp(p.get_or(0, 1))),
            // CUD, VPR
            (None, None, b'B' | b'e') => screen.apply(ScreenOp::CursorDown(p.get_or(0, 1))),
            // CUF, HPR
            (None, None, b'C' | b'a') => screen.apply(ScreenOp::CursorForward(p.get_or(0, 1))),
            // CUB
            (None, None, b'D') => screen.apply(ScreenOp::CursorBackward(p.get_or(0, 1))),
            // CNL
            (None, None, b'E') => {
                screen.apply(ScreenOp::CursorDown(p.get_or(0, 1)));
                screen.apply(ScreenOp::CarriageReturn);
            }
            // CPL
            (None, None, b'F') => {
                screen.apply(ScreenOp::CursorUp(p.get_or(0, 1)));
                screen.apply(ScreenOp::CarriageReturn);
            }
            // CHA, HPA
            (None, None, b'G' | b'`') => {
                screen.apply(ScreenOp::SetCursorColumn(p.get_or(0, 1) - 1))
            }
            // CUP, HVP
            (None, None, b'H' | b'f') => screen.apply(ScreenOp::SetCursor {
                line: p.get_or(0, 1) - 1,
                column: p.get_or(1, 1) - 1,
            }),
            // CHT
            (None, None, b'I') => screen.apply(ScreenOp::Tab {
                count: p.get_or(0, 1),
            }),
            // ED
            (None, None, b'J') => match erase_mode(p.raw(0), true) {
                Some(mode) => screen.apply(ScreenOp::EraseInDisplay(mode)),
                None => self.decoding_error(describe(csi)),
            },
            // EL
            (None, None, b'K') => match erase_mode(p.raw(0), false) {
                Some(mode) => screen.apply(ScreenOp::EraseInLine(mode)),
                None => self.decoding_error(describe(csi)),
            },
            // IL
            (None, None, b'L') => screen.apply(ScreenOp::InsertLines(p.get_or(0, 1))),
            // DL
            (None, None, b'M') => screen.apply(ScreenOp::DeleteLines(p.get_or(0, 1))),
            // DCH
            (None, None, b'P') => screen.apply(ScreenOp::DeleteChars(p.get_or(0, 1))),
            // SU
            (None, None, b'S') => screen.apply(ScreenOp::ScrollUp(p.get_or(0, 1))),
            // SD
            (None, None, b'T') => screen.apply(ScreenOp::ScrollDown(p.get_or(0, 1))),
            // ECH
            (None, None, b'X') => screen.apply(ScreenOp::EraseChars(p.get_or(0, 1))),
            // CBT
            (None, None, b'Z') => screen.apply(ScreenOp::BackTab {
                count: p.get_or(0, 1),
            }),
            // REP
            (None, None, b'b') => {
                if let Some(c) = self.last_printed {
                    let size = screen.size();
                    let limit = u32::from(size.lines) * u32::from(size.columns);
                    for _ in 0..u32::from(p.get_or(0, 1)).min(limit) {
                        screen.apply(ScreenOp::Print(c));
                    }
                }
            }
            // DA1
            (None, None, b'c') if p.raw(0) == 0 => self.reply(reports::DA1),
            // DA2
            (Some(b'>'), None, b'c') if p.raw(0) == 0 => self.reply(reports::DA2),
            // DA3
            (Some(b'='), None, b'c') if p.raw(0) == 0 => self.reply(reports::DA3),
            // VPA
            (None, None, b'd') => screen.apply(ScreenOp::SetCursorLine(p.get_or(0, 1) - 1)),
            // TBC
            (None, None, b'g') => match p.raw(0) {
                0 => screen.apply(ScreenOp::ClearTabStop),
                3 => screen.apply(ScreenOp::ClearAllTabStops),
                _ => self.decoding_error(describe(csi)),
            },
            // SM, RM
            (None, None, b'h' | b'l') => {
                let enabled = csi.final_byte == b'h';
                for id in p.iter() {
                    match Mode::from_ansi(id) {
                        Some(mode) => {
                            self.set_mode(screen, mode, enabled);
                        }
                        None => self.decoding_error(format!("ANSI mode {id}")),
                    }
                }
            }
            // DECSET, DECRST
            (Some(b'?'), None, b'h' | b'l') => {
                let enabled = csi.final_byte == b'h';
                for id in p.iter() {
                    self.set_dec_mode(screen, id, enabled);
                }
            }
            // XTSAVE
            (Some(b'?'), None, b's') => {
                for id in p.iter() {
                    match Mode::from_dec_private(id) {
                        Some(mode) => self.modes.save(mode),
                        None => self.decoding_error(format!("DEC mode {id}")),
                    }
                }
            }
            // XTRESTORE
            (Some(b'?'), None, b'r') => {
                for id in p.iter() {
                    match Mode::from_dec_private(id) {
                        Some(mode) => {
                            let saved = self.modes.saved(mode);
                            self.set_dec_mode(screen, id, saved);
                        }
                        None => self.decoding_error(format!("DEC mode {id}")),
                    }
                }
            }
            // SGR
            (None, None, b'm') => self.select_graphic_rendition(screen, p),
            // DSR
            (None, None, b'n') => match p.raw(0) {
                5 => self.reply(reports::STATUS_OK),
                6 => {
                    let cursor = screen.cursor();
                    let line = match (self.modes.get(Mode::Origin), self.margins) {
                        (true, Some((top, _))) => cursor.line.saturating_sub(top),
                        _ => cursor.line,
                    };
                    self.reply(reports::cursor_position(line, cursor.column));
                }
                _ => self.decoding_error(describe(csi)),
            },
            // DECSCUSR
            (None, Some(b' '), b'q') => {
                let style = p.raw(0);
                let (shape, blink) = match style {
                    0 | 1 => (CursorShape::Block, true),
                    2 => (CursorShape::Block, false),
                    3 => (CursorShape::Underline, true),
                    4 => (CursorShape::Underline, false),
                    5 => (CursorShape::Bar, true),
                    6 => (CursorShape::Bar, false),
                    _ => return self.decoding_error(describe(csi)),
                };
                self.cursor_style = style;
                screen.apply(ScreenOp::CursorStyle { shape, blink });
            }
            // DECSTBM
            (None, None, b'r') => self.set_margins(screen, p),
            // SCOSC
            (None, None, b's') => self.save_cursor(screen),
            // SCORC
            (None, None, b'u') => self.restore_cursor(screen),
            // XTWINOPS
            (None, None, b't') => self.window_ops(screen, p),
            // DECREQTPARM
            (None, None, b'x') => match p.raw(0) {
                request @ (0 | 1) => self.reply(reports::terminal_parameters(request)),
                _ => self.decoding_error(describe(csi)),
            },
            // DECSTR
            (None, Some(b'!'), b'p') => self.soft_reset(screen),
            // XTSMGRAPHICS
            (Some(b'?'), None, b'S') => self.graphics_attributes(screen, p),
            _ => self.decoding_error(describe(csi)),
        }
    }

    /// Set or reset one DEC private mode, with its side effects
    pub(super) fn set_dec_mode(&mut self, screen: &mut dyn Screen, id: u16, enabled: bool) {
        match id {
            // DECCOLM
            3 => {
                if !self.modes.get(Mode::Allow132Columns) {
                    debug!("DECCOLM ignored without 132 column permission");
                    return;
                }
                self.set_mode(screen, Mode::Columns132, enabled);
                screen.apply(ScreenOp::SetColumns(if enabled { 132 } else { 80 }));
                screen.apply(ScreenOp::EraseInDisplay(EraseMode::All));
                self.reset_margins(screen);
            }
            // DECOM
            6 => {
                self.set_mode(screen, Mode::Origin, enabled);
                screen.apply(ScreenOp::SetCursor { line: 0, column: 0 });
            }
            1047 => {
                if !enabled && self.modes.get(Mode::AppScreen) {
                    screen.apply(ScreenOp::EraseInDisplay(EraseMode::All));
                }
                self.set_mode(screen, Mode::AppScreen, enabled);
            }
            1048 => {
                if enabled {
                    self.save_cursor(screen);
                } else {
                    self.restore_cursor(screen);
                }
            }
            1049 => {
                if enabled {
                    self.save_cursor(screen);
                    if self.set_mode(screen, Mode::AppScreen, true) {
                        screen.apply(ScreenOp::EraseInDisplay(EraseMode::All));
                    }
                } else {
                    self.set_mode(screen, Mode::AppScreen, false);
                    self.restore_cursor(screen);
                }
            }
            1000..=1003 | 1005 | 1006 | 1015 => {
                let Some(mode) = Mode::from_dec_private(id) else {
                    return;
                };
                // tracking modes and coordinate encodings are each exclusive
                if enabled {
                    let group: &[Mode] = if id <= 1003 {
                        &[Mode::Mouse1000, Mode::Mouse1001, Mode::Mouse1002, Mode::Mouse1003]
                    } else {
                        &[Mode::Mouse1005, Mode::Mouse1006, Mode::Mouse1015]
                    };
                    for &other in group.iter().filter(|&&m| m != mode) {
                        self.set_mode(screen, other, false);
                    }
                }
                self.set_mode(screen, mode, enabled);
            }
            _ => match Mode::from_dec_private(id) {
                Some(mode) => {
                    self.set_mode(screen, mode, enabled);
                }
                None => self.decoding_error(format!("DEC mode {id}")),
            },
        }
    }

    fn set_margins(&mut self, screen: &mut dyn Screen, p: &Params) {
        let lines = screen.size().lines.max(1);
        let top = p.get_or(0, 1);
        let bottom = p.get_or(1, lines).min(lines);
        if top < bottom {
            self.margins = Some((top - 1, bottom - 1));
            screen.apply(ScreenOp::SetMargins {
                top: top - 1,
                bottom: bottom - 1,
            });
        } else {
            self.reset_margins(screen);
        }
        screen.apply(ScreenOp::SetCursor { line: 0, column: 0 });
    }

    pub(super) fn reset_margins(&mut self, screen: &mut dyn Screen) {
        self.margins = None;
        screen.apply(ScreenOp::SetMargins {
            top: 0,
            bottom: screen.size().lines.saturating_sub(1),
        });
    }

    /// Scroll region for reports, zero based inclusive
    pub(super) fn margins(&self, screen: &dyn Screen) -> (u16, u16) {
        self.margins
            .unwrap_or((0, screen.size().lines.saturating_sub(1)))
    }

    fn window_ops(&mut self, screen: &mut dyn Screen, p: &Params) {
        let size = screen.size();
        match p.raw(0) {
            14 => self.reply(reports::text_area_pixels(size)),
            16 => self.reply(reports::cell_pixels(size)),
            18 => self.reply(reports::text_area_cells(size)),
            22 => self.push_title(),
            23 => self.pop_title(),
            op => debug!(op, "window operation ignored"),
        }
    }

    /// DECSTR
    fn soft_reset(&mut self, screen: &mut dyn Screen) {
        self.apply_rendition(screen, Rendition::Reset);
        self.set_mode(screen, Mode::Origin, false);
        self.set_mode(screen, Mode::Wrap, true);
        self.set_mode(screen, Mode::Insert, false);
        self.set_mode(screen, Mode::CursorVisible, true);
        self.set_mode(screen, Mode::AppCuKeys, false);
        self.set_mode(screen, Mode::AppKeyPad, false);
        self.reset_margins(screen);
        for slots in &mut self.charsets {
            slots.reset();
        }
        debug!("soft reset");
    }

    fn apply_rendition(&mut self, screen: &mut dyn Screen, rendition: Rendition) {
        self.sgr.apply(rendition);
        screen.apply(ScreenOp::SetRendition(rendition));
    }

    fn select_graphic_rendition(&mut self, screen: &mut dyn Screen, p: &Params) {
        if p.is_empty() {
            self.apply_rendition(screen, Rendition::Reset);
            return;
        }
        let mut i = 0;
        while i < p.len() {
            let code = p.raw(i);
            let subs = p.sub_params(i);
            let rendition = match code {
                0 => Some(Rendition::Reset),
                1 => Some(Rendition::Bold),
                2 => Some(Rendition::Faint),
                3 => Some(Rendition::Italic),
                4 => match subs.first() {
                    None | Some(1) => Some(Rendition::Underline(UnderlineStyle::Single)),
                    Some(0) => Some(Rendition::NoUnderline),
                    Some(2) => Some(Rendition::Underline(UnderlineStyle::Double)),
                    Some(3) => Some(Rendition::Underline(UnderlineStyle::Curly)),
                    Some(4) => Some(Rendition::Underline(UnderlineStyle::Dotted)),
                    Some(5) => Some(Rendition::Underline(UnderlineStyle::Dashed)),
                    Some(_) => None,
                },
                5 | 6 => Some(Rendition::Blink),
                7 => Some(Rendition::Reverse),
                8 => Some(Rendition::Conceal),
                9 => Some(Rendition::Strikethrough),
                21 => Some(Rendition::Underline(UnderlineStyle::Double)),
                22 => Some(Rendition::NormalIntensity),
                23 => Some(Rendition::NoItalic),
                24 => Some(Rendition::NoUnderline),
                25 => Some(Rendition::NoBlink),
                27 => Some(Rendition::NoReverse),
                28 => Some(Rendition::NoConceal),
                29 => Some(Rendition::NoStrikethrough),
                30..=37 => Some(Rendition::Foreground(Color::Indexed((code - 30) as u8))),
                38 | 48 | 58 => {
                    let (color, consumed) = extended_color(p, i);
                    i += consumed;
                    color.map(|color| match code {
                        38 => Rendition::Foreground(color),
                        48 => Rendition::Background(color),
                        _ => Rendition::UnderlineColor(color),
                    })
                }
                39 => Some(Rendition::Foreground(Color::Default)),
                40..=47 => Some(Rendition::Background(Color::Indexed((code - 40) as u8))),
                49 => Some(Rendition::Background(Color::Default)),
                53 => Some(Rendition::Overline),
                55 => Some(Rendition::NoOverline),
                59 => Some(Rendition::UnderlineColor(Color::Default)),
                90..=97 => Some(Rendition::Foreground(Color::Indexed((code - 90 + 8) as u8))),
                100..=107 => Some(Rendition::Background(Color::Indexed((code - 100 + 8) as u8))),
                _ => None,
            };
            match rendition {
                Some(rendition) => self.apply_rendition(screen, rendition),
                None => debug!(code, "SGR attribute ignored"),
            }
            i += 1;
        }
    }

    /// XTSMGRAPHICS
    fn graphics_attributes(&mut self, screen: &mut dyn Screen, p: &Params) {
        const READ: u16 = 1;
        const RESET: u16 = 2;
        const READ_MAX: u16 = 4;
        let item = p.raw(0);
        let action = p.raw(1);
        let limits = &self.config.limits;
        let reply = match (item, action) {
            // color registers
            (1, READ | RESET | READ_MAX) => {
                reports::graphics_attribute(1, 0, &[limits.max_sixel_colors as u32])
            }
            // sixel geometry
            (2, READ | RESET | READ_MAX) => {
                let size = screen.size();
                let width = u32::from(size.columns) * u32::from(size.cell_width);
                let height = u32::from(size.lines) * u32::from(size.cell_height);
                let max = limits.max_image_dimension;
                let (width, height) = if action == READ_MAX {
                    (max, max)
                } else {
                    (width.min(max), height.min(max))
                };
                reports::graphics_attribute(2, 0, &[width, height])
            }
            (1 | 2, _) => reports::graphics_attribute(item, 2, &[0]),
            _ => reports::graphics_attribute(item, 1, &[0]),
        };
        self.reply(reply);
    }
}

fn erase_mode(value: u16, display: bool) -> Option<EraseMode> {
    match value {
        0 => Some(EraseMode::Below),
        1 => Some(EraseMode::Above),
        2 => Some(EraseMode::All),
        3 if display => Some(EraseMode::Saved),
        _ => None,
    }
}

/// Parse the color after SGR 38/48/58
///
/// Returns the color and how many extra `;` parameters it used. The colon
/// form keeps everything in sub-parameters; `38:2:cs:r:g:b` carries a color
/// space id before the components.
fn extended_color(p: &Params, i: usize) -> (Option<Color>, usize) {
    let subs = p.sub_params(i);
    if !subs.is_empty() {
        let color = match subs {
            [5, index, ..] => Some(Color::Indexed((*index).min(255) as u8)),
            [2, _, r, g, b, ..] => Some(rgb(*r, *g, *b)),
            [2, r, g, b] => Some(rgb(*r, *g, *b)),
            _ => None,
        };
        return (color, 0);
    }
    match p.get(i + 1) {
        Some(5) => match p.get(i + 2) {
            Some(index) => (Some(Color::Indexed(index.min(255) as u8)), 2),
            None => (None, 1),
        },
        Some(2) => match (p.get(i + 2), p.get(i + 3), p.get(i + 4)) {
            (Some(r), Some(g), Some(b)) => (Some(rgb(r, g, b)), 4),
            _ => (None, p.len() - i - 1),
        },
        Some(_) => (None, 1),
        None => (None, 0),
    }
}

fn rgb(r: u16, g: u16, b: u16) -> Color {
    let clamp = |v: u16| v.min(255) as u8;
    Color::Rgb(Rgb::new(clamp(r), clamp(g), clamp(b)))
}

#[cfg(test)]
mod tests {
    use super::super::{Event, RecordingScreen, ScreenSize};
    use super::*;
    use crate::core::CharsetSlots;

    fn run(input: &str) -> (Emulator, RecordingScreen) {
        let mut emulator = Emulator::new();
        let mut screen = RecordingScreen::new(ScreenSize::default());
        emulator.receive(&mut screen, input);
        (emulator, screen)
    }

    fn replies(emulator: &mut Emulator) -> Vec<String> {
        emulator
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Reply(reply) => Some(reply),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cursor_movement_defaults() {
        let (_, screen) = run("\x1b[A\x1b[0B\x1b[5C\x1b[3;7H\x1b[H");
        assert_eq!(
            screen.ops(),
            &[
                ScreenOp::CursorUp(1),
                ScreenOp::CursorDown(1),
                ScreenOp::CursorForward(5),
                ScreenOp::SetCursor { line: 2, column: 6 },
                ScreenOp::SetCursor { line: 0, column: 0 },
            ]
        );
    }

    #[test]
    fn test_erase_variants() {
        let (mut emulator, screen) = run("\x1b[J\x1b[1J\x1b[2J\x1b[3J\x1b[2K\x1b[3K");
        assert_eq!(
            screen.ops(),
            &[
                ScreenOp::EraseInDisplay(EraseMode::Below),
                ScreenOp::EraseInDisplay(EraseMode::Above),
                ScreenOp::EraseInDisplay(EraseMode::All),
                ScreenOp::EraseInDisplay(EraseMode::Saved),
                ScreenOp::EraseInLine(EraseMode::All),
            ]
        );
        assert_eq!(
            emulator.drain_events(),
            vec![Event::DecodingError("CSI 3K".into())]
        );
    }

    #[test]
    fn test_unknown_final_leaves_state() {
        let (mut emulator, screen) = run("\x1b[?1;2y");
        assert_eq!(
            emulator.drain_events(),
            vec![Event::DecodingError("CSI ?1;2y".into())]
        );
        assert!(screen.ops().is_empty());
        assert_eq!(*emulator.modes(), crate::core::ModeVector::new());
        assert_eq!(*emulator.charsets(), CharsetSlots::new());
    }

    #[test]
    fn test_dec_mode_toggle_pair() {
        let (mut emulator, mut screen) = run("");
        let before = emulator.modes().clone();
        emulator.receive(&mut screen, "\x1b[?2004h\x1b[?2004l");
        assert_eq!(*emulator.modes(), before);
        emulator.receive(&mut screen, "\x1b[?7l\x1b[?7h");
        assert_eq!(*emulator.modes(), before);
    }

    #[test]
    fn test_unknown_dec_mode_reported() {
        let (mut emulator, _) = run("\x1b[?9999h");
        assert_eq!(
            emulator.drain_events(),
            vec![Event::DecodingError("DEC mode 9999".into())]
        );
    }

    #[test]
    fn test_mouse_modes_exclusive() {
        let (emulator, _) = run("\x1b[?1000h\x1b[?1002h\x1b[?1006h");
        assert!(!emulator.modes().get(Mode::Mouse1000));
        assert!(emulator.modes().get(Mode::Mouse1002));
        assert!(emulator.modes().get(Mode::Mouse1006));
    }

    #[test]
    fn test_xtsave_xtrestore() {
        let (emulator, _) = run("\x1b[?1s\x1b[?1h\x1b[?1r");
        assert!(!emulator.modes().get(Mode::AppCuKeys));
        let (emulator, _) = run("\x1b[?1h\x1b[?1s\x1b[?1l\x1b[?1r");
        assert!(emulator.modes().get(Mode::AppCuKeys));
    }

    #[test]
    fn test_alternate_screen_1049() {
        let (emulator, screen) = run("\x1b[?1049h");
        assert!(emulator.modes().get(Mode::AppScreen));
        assert_eq!(
            screen.ops(),
            &[
                ScreenOp::SaveCursor,
                ScreenOp::SwitchScreen { alternate: true },
                ScreenOp::EraseInDisplay(EraseMode::All),
            ]
        );
    }

    #[test]
    fn test_charsets_follow_screen() {
        let (emulator, _) = run("\x1b(0\x1b[?47h");
        assert!(!emulator.charsets().graphic());
        let (emulator, _) = run("\x1b(0\x1b[?47h\x1b[?47l");
        assert!(emulator.charsets().graphic());
    }

    #[test]
    fn test_margins() {
        let (_, screen) = run("\x1b[5;10r");
        assert_eq!(
            screen.ops()[0],
            ScreenOp::SetMargins { top: 4, bottom: 9 }
        );
        let (_, screen) = run("\x1b[10;5r");
        assert_eq!(
            screen.ops()[0],
            ScreenOp::SetMargins { top: 0, bottom: 23 }
        );
        let (_, screen) = run("\x1b[1;999r");
        assert_eq!(
            screen.ops()[0],
            ScreenOp::SetMargins { top: 0, bottom: 23 }
        );
    }

    #[test]
    fn test_deccolm_needs_permission() {
        let (_, screen) = run("\x1b[?3h");
        assert!(screen.ops().is_empty());
        let (emulator, screen) = run("\x1b[?40h\x1b[?3h");
        assert!(emulator.modes().get(Mode::Columns132));
        assert_eq!(screen.ops()[0], ScreenOp::SetColumns(132));
        assert_eq!(screen.size().columns, 132);
    }

    #[test]
    fn test_sgr_forms() {
        let (_, screen) = run("\x1b[1;38;2;10;20;30;48;5;200m\x1b[38:2::1:2:3;4:3m");
        let renditions: Vec<Rendition> = screen
            .ops()
            .iter()
            .filter_map(|op| match op {
                ScreenOp::SetRendition(r) => Some(*r),
                _ => None,
            })
            .collect();
        assert_eq!(
            renditions,
            vec![
                Rendition::Bold,
                Rendition::Foreground(Color::Rgb(Rgb::new(10, 20, 30))),
                Rendition::Background(Color::Indexed(200)),
                Rendition::Foreground(Color::Rgb(Rgb::new(1, 2, 3))),
                Rendition::Underline(UnderlineStyle::Curly),
            ]
        );
    }

    #[test]
    fn test_sgr_empty_resets() {
        let (_, screen) = run("\x1b[m");
        assert_eq!(screen.ops(), &[ScreenOp::SetRendition(Rendition::Reset)]);
    }

    #[test]
    fn test_sgr_state_params() {
        let mut state = SgrState::default();
        state.apply(Rendition::Bold);
        state.apply(Rendition::Underline(UnderlineStyle::Single));
        state.apply(Rendition::Foreground(Color::Indexed(9)));
        state.apply(Rendition::Background(Color::Rgb(Rgb::new(1, 2, 3))));
        assert_eq!(state.to_params(), "0;1;4;91;48;2;1;2;3");
    }

    #[test]
    fn test_device_attributes() {
        let (mut emulator, _) = run("\x1b[c\x1b[>c\x1b[=c");
        assert_eq!(
            replies(&mut emulator),
            vec![reports::DA1, reports::DA2, reports::DA3]
        );
    }

    #[test]
    fn test_cursor_position_report() {
        let mut emulator = Emulator::new();
        let mut screen = RecordingScreen::new(ScreenSize::default());
        emulator.receive(&mut screen, "\x1b[5;12H\x1b[6n\x1b[5n");
        assert_eq!(replies(&mut emulator), vec!["\x1b[5;12R", "\x1b[0n"]);
    }

    #[test]
    fn test_window_reports() {
        let (mut emulator, _) = run("\x1b[18t\x1b[14t\x1b[16t");
        assert_eq!(
            replies(&mut emulator),
            vec!["\x1b[8;24;80t", "\x1b[4;480;800t", "\x1b[6;20;10t"]
        );
    }

    #[test]
    fn test_decreqtparm() {
        let (mut emulator, _) = run("\x1b[x\x1b[1x");
        assert_eq!(
            replies(&mut emulator),
            vec!["\x1b[2;1;1;112;112;1;0x", "\x1b[3;1;1;112;112;1;0x"]
        );
    }

    #[test]
    fn test_sixel_graphics_queries() {
        let (mut emulator, _) = run("\x1b[?1;1S\x1b[?2;1S\x1b[?3;1S");
        assert_eq!(
            replies(&mut emulator),
            vec!["\x1b[?1;0;256S", "\x1b[?2;0;800;480S", "\x1b[?3;1;0S"]
        );
    }

    #[test]
    fn test_rep_repeats_last_character() {
        let (_, screen) = run("x\x1b[3b");
        assert_eq!(screen.text(), "xxxx");
    }

    #[test]
    fn test_cursor_style() {
        let (_, screen) = run("\x1b[6 q");
        assert_eq!(
            screen.ops(),
            &[ScreenOp::CursorStyle {
                shape: CursorShape::Bar,
                blink: false
            }]
        );
    }

    #[test]
    fn test_soft_reset() {
        let (emulator, _) = run("\x1b[?6h\x1b[4h\x1b[?1h\x1b[!p");
        assert!(!emulator.modes().get(Mode::Origin));
        assert!(!emulator.modes().get(Mode::Insert));
        assert!(!emulator.modes().get(Mode::AppCuKeys));
    }
}
