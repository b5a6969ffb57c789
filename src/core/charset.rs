//! Character set handling for terminal emulation
//!
//! Four designation slots (G0-G3) hold the final byte of the `ESC ( F`
//! style sequence that designated them. Only two legacy VT100 sets change
//! what is displayed: DEC Special Graphics (`0`) and UK (`A`), tracked as the
//! `graphic` and `pound` flags of the slot currently invoked into GL.

use serde::{Deserialize, Serialize};

/// DEC Special Graphics replacements for 0x5F..=0x7E
static VT100_GRAPHICS: [char; 32] = [
    ' ', // _ blank
    '◆', // ` diamond
    '▒', // a checkerboard
    '␉', // b HT symbol
    '␌', // c FF symbol
    '␍', // d CR symbol
    '␊', // e LF symbol
    '°', // f degree
    '±', // g plus/minus
    '␤', // h NL symbol
    '␋', // i VT symbol
    '┘', // j lower right corner
    '┐', // k upper right corner
    '┌', // l upper left corner
    '└', // m lower left corner
    '┼', // n crossing lines
    '⎺', // o scan line 1
    '⎻', // p scan line 3
    '─', // q scan line 5
    '⎼', // r scan line 7
    '⎽', // s scan line 9
    '├', // t left tee
    '┤', // u right tee
    '┴', // v bottom tee
    '┬', // w top tee
    '│', // x vertical line
    '≤', // y less than or equal
    '≥', // z greater than or equal
    'π', // { pi
    '≠', // | not equal
    '£', // } pound sterling
    '·', // ~ centered dot
];

/// Designation byte for US ASCII
pub const CHARSET_ASCII: u8 = b'B';
/// Designation byte for DEC Special Graphics
pub const CHARSET_DEC_GRAPHICS: u8 = b'0';
/// Designation byte for the UK national set
pub const CHARSET_UK: u8 = b'A';

/// Character set state for G0-G3 slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetSlots {
    /// Designation byte per slot
    slots: [u8; 4],
    /// Slot currently invoked into GL
    current: usize,
    /// Current slot holds DEC Special Graphics
    graphic: bool,
    /// Current slot holds the UK set
    pound: bool,
    /// Snapshot taken by save cursor
    saved: SavedCharset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct SavedCharset {
    current: usize,
    graphic: bool,
    pound: bool,
}

impl Default for CharsetSlots {
    fn default() -> Self {
        Self {
            slots: [CHARSET_ASCII; 4],
            current: 0,
            graphic: false,
            pound: false,
            saved: SavedCharset {
                current: 0,
                graphic: false,
                pound: false,
            },
        }
    }
}

impl CharsetSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to default state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Designate `charset` into slot `n` and refresh the active flags
    pub fn designate(&mut self, n: usize, charset: u8) {
        if n < 4 {
            self.slots[n] = charset;
            self.invoke(self.current);
        }
    }

    /// Invoke slot `n` into GL (SI, SO, LS2, LS3)
    pub fn invoke(&mut self, n: usize) {
        if n < 4 {
            self.current = n;
            self.graphic = self.slots[n] == CHARSET_DEC_GRAPHICS;
            self.pound = self.slots[n] == CHARSET_UK;
        }
    }

    /// Designate and invoke in one step (VT52 graphics mode)
    pub fn designate_and_invoke(&mut self, n: usize, charset: u8) {
        self.designate(n, charset);
        self.invoke(n);
    }

    /// Snapshot the slot selection and flags (DECSC)
    pub fn save(&mut self) {
        self.saved = SavedCharset {
            current: self.current,
            graphic: self.graphic,
            pound: self.pound,
        };
    }

    /// Restore the snapshot taken by [`save`](Self::save) (DECRC)
    pub fn restore(&mut self) {
        self.current = self.saved.current;
        self.graphic = self.saved.graphic;
        self.pound = self.saved.pound;
    }

    /// Index of the slot invoked into GL
    pub fn current_slot(&self) -> usize {
        self.current
    }

    /// Designation byte of slot `n`
    pub fn slot(&self, n: usize) -> u8 {
        self.slots[n.min(3)]
    }

    pub fn graphic(&self) -> bool {
        self.graphic
    }

    pub fn pound(&self) -> bool {
        self.pound
    }

    /// Translate a character through the active set
    pub fn apply(&self, c: char) -> char {
        let code = c as u32;
        if self.graphic && (0x5F..=0x7E).contains(&code) {
            return VT100_GRAPHICS[(code - 0x5F) as usize];
        }
        if self.pound && c == '#' {
            return '£';
        }
        c
    }
}
