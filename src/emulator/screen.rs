//! Display mutation interface
//!
//! The emulator never owns a character grid. It describes what should
//! happen to one as [`ScreenOp`]s and hands them to a [`Screen`]
//! implementation, which also answers the two questions the interpreter
//! needs for reports: how big the display is and where the cursor is.

use std::sync::Arc;

use serde::Serialize;

use crate::core::{Color, Mode};
use crate::graphics::{Image, Placement};

/// Display geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub lines: u16,
    pub columns: u16,
    /// Cell size in pixels
    pub cell_width: u16,
    pub cell_height: u16,
}

impl Default for ScreenSize {
    fn default() -> Self {
        Self {
            lines: 24,
            columns: 80,
            cell_width: 10,
            cell_height: 20,
        }
    }
}

/// Zero based cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CursorPosition {
    pub line: u16,
    pub column: u16,
}

/// Extent of ED / EL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EraseMode {
    /// Cursor to end
    Below,
    /// Start to cursor
    Above,
    All,
    /// Scrollback only (`CSI 3 J`)
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnderlineStyle {
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// One SGR attribute change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rendition {
    Reset,
    Bold,
    Faint,
    Italic,
    Underline(UnderlineStyle),
    Blink,
    Reverse,
    Conceal,
    Strikethrough,
    Overline,
    NormalIntensity,
    NoItalic,
    NoUnderline,
    NoBlink,
    NoReverse,
    NoConceal,
    NoStrikethrough,
    NoOverline,
    Foreground(Color),
    Background(Color),
    UnderlineColor(Color),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CursorShape {
    Block,
    Underline,
    Bar,
}

/// OSC 133 shell integration marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PromptMark {
    PromptStart,
    CommandStart,
    OutputStart,
    CommandFinished { exit_code: Option<i32> },
}

/// A decoded image to show at the cursor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImagePlacement {
    /// Kitty image id; `None` for sixel images
    pub id: Option<u32>,
    pub image: Arc<Image>,
    /// Requested size in cells; zero means the image's natural size
    pub placement: Placement,
    /// Pixel aspect ratio (vertical, horizontal)
    pub aspect: (u32, u32),
    /// Unpainted pixels stay transparent
    pub transparent: bool,
    /// Sixel display mode: draw at the top-left corner without scrolling
    pub at_origin: bool,
}

/// One display mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ScreenOp {
    /// Write a character (already translated through the active charset)
    Print(char),
    Backspace,
    Tab { count: u16 },
    BackTab { count: u16 },
    CarriageReturn,
    LineFeed,
    /// IND
    Index,
    /// RI
    ReverseIndex,
    /// NEL
    NextLine,
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    /// Zero based, relative to the scroll region in origin mode
    SetCursor { line: u16, column: u16 },
    SetCursorLine(u16),
    SetCursorColumn(u16),
    SaveCursor,
    RestoreCursor,
    EraseInDisplay(EraseMode),
    EraseInLine(EraseMode),
    EraseChars(u16),
    InsertChars(u16),
    DeleteChars(u16),
    InsertLines(u16),
    DeleteLines(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    /// Zero based, inclusive
    SetMargins { top: u16, bottom: u16 },
    SetTabStop,
    ClearTabStop,
    ClearAllTabStops,
    SetRendition(Rendition),
    /// A mode that changes how the display behaves or looks
    SetMode { mode: Mode, enabled: bool },
    /// Switch between the primary and alternate screen
    SwitchScreen { alternate: bool },
    /// DECCOLM asks for a new width
    SetColumns(u16),
    CursorStyle { shape: CursorShape, blink: bool },
    /// DECALN: fill the screen with `E`
    AlignmentTest,
    SemanticPrompt(PromptMark),
    PlaceImage(ImagePlacement),
    /// Remove kitty placements of one image, or all of them
    DeleteImages { id: Option<u32> },
    /// RIS
    Reset,
}

/// The grid model the emulator drives
pub trait Screen {
    fn size(&self) -> ScreenSize;
    fn cursor(&self) -> CursorPosition;
    fn apply(&mut self, op: ScreenOp);
}

/// A screen that records operations and keeps a rough cursor
///
/// Enough for tests and the headless runner: cursor motion is clamped to
/// the display, printing advances one column, nothing wraps or scrolls.
#[derive(Debug, Clone, Default)]
pub struct RecordingScreen {
    size: ScreenSize,
    cursor: CursorPosition,
    saved: CursorPosition,
    ops: Vec<ScreenOp>,
}

impl RecordingScreen {
    pub fn new(size: ScreenSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn ops(&self) -> &[ScreenOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<ScreenOp> {
        std::mem::take(&mut self.ops)
    }

    /// Printed characters, in order
    pub fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                ScreenOp::Print(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn set_cursor(&mut self, cursor: CursorPosition) {
        self.cursor = cursor;
        self.clamp();
    }

    fn clamp(&mut self) {
        self.cursor.line = self.cursor.line.min(self.size.lines.saturating_sub(1));
        self.cursor.column = self.cursor.column.min(self.size.columns.saturating_sub(1));
    }
}

impl Screen for RecordingScreen {
    fn size(&self) -> ScreenSize {
        self.size
    }

    fn cursor(&self) -> CursorPosition {
        self.cursor
    }

    fn apply(&mut self, op: ScreenOp) {
        let c = &mut self.cursor;
        match &op {
            ScreenOp::Print(_) => c.column = c.column.saturating_add(1),
            ScreenOp::CursorForward(n) => c.column = c.column.saturating_add(*n),
            ScreenOp::Backspace => c.column = c.column.saturating_sub(1),
            ScreenOp::CursorBackward(n) => c.column = c.column.saturating_sub(*n),
            ScreenOp::CarriageReturn => c.column = 0,
            ScreenOp::LineFeed | ScreenOp::Index => c.line = c.line.saturating_add(1),
            ScreenOp::NextLine => {
                c.line = c.line.saturating_add(1);
                c.column = 0;
            }
            ScreenOp::ReverseIndex => c.line = c.line.saturating_sub(1),
            ScreenOp::CursorUp(n) => c.line = c.line.saturating_sub(*n),
            ScreenOp::CursorDown(n) => c.line = c.line.saturating_add(*n),
            ScreenOp::SetCursor { line, column } => {
                c.line = *line;
                c.column = *column;
            }
            ScreenOp::SetCursorLine(line) => c.line = *line,
            ScreenOp::SetCursorColumn(column) => c.column = *column,
            ScreenOp::Tab { count } => {
                c.column = (c.column / 8).saturating_add(*count).saturating_mul(8);
            }
            ScreenOp::BackTab { count } => {
                let stops_back = if c.column % 8 == 0 { *count } else { count.saturating_sub(1) };
                c.column = (c.column / 8).saturating_sub(stops_back).saturating_mul(8);
            }
            ScreenOp::SaveCursor => self.saved = *c,
            ScreenOp::RestoreCursor => *c = self.saved,
            ScreenOp::SetColumns(columns) => self.size.columns = *columns,
            ScreenOp::Reset => *c = CursorPosition::default(),
            _ => {}
        }
        self.clamp();
        self.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_screen_cursor() {
        let mut screen = RecordingScreen::new(ScreenSize::default());
        screen.apply(ScreenOp::SetCursor { line: 5, column: 10 });
        screen.apply(ScreenOp::Print('x'));
        assert_eq!(screen.cursor(), CursorPosition { line: 5, column: 11 });
        screen.apply(ScreenOp::CursorUp(100));
        assert_eq!(screen.cursor().line, 0);
        screen.apply(ScreenOp::CursorForward(500));
        assert_eq!(screen.cursor().column, 79);
        assert_eq!(screen.text(), "x");
    }

    #[test]
    fn test_recording_screen_tabs() {
        let mut screen = RecordingScreen::new(ScreenSize::default());
        screen.apply(ScreenOp::Tab { count: 1 });
        assert_eq!(screen.cursor().column, 8);
        screen.apply(ScreenOp::Tab { count: 2 });
        assert_eq!(screen.cursor().column, 24);
        screen.apply(ScreenOp::CursorBackward(3));
        screen.apply(ScreenOp::BackTab { count: 1 });
        assert_eq!(screen.cursor().column, 16);
    }

    #[test]
    fn test_recording_screen_save_restore() {
        let mut screen = RecordingScreen::new(ScreenSize::default());
        screen.apply(ScreenOp::SetCursor { line: 3, column: 4 });
        screen.apply(ScreenOp::SaveCursor);
        screen.apply(ScreenOp::SetCursor { line: 0, column: 0 });
        screen.apply(ScreenOp::RestoreCursor);
        assert_eq!(screen.cursor(), CursorPosition { line: 3, column: 4 });
    }
}
