//! Terminal mode flags
//!
//! Every boolean terminal behavior switch lives in one fixed-size vector
//! indexed by [`Mode`], with a parallel saved copy used by XTSAVE/XTRESTORE
//! (`CSI ? Pm s` / `CSI ? Pm r`) and by the alternate-screen switch.

use serde::{Deserialize, Serialize};

/// A terminal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// DECOM - cursor addressing relative to the scroll region
    Origin,
    /// DECAWM - auto wrap at the right margin
    Wrap,
    /// IRM - insert rather than replace
    Insert,
    /// DECSCNM - reverse video
    Screen,
    /// DECTCEM - cursor visible
    CursorVisible,
    /// ATT610 - cursor blinking
    CursorBlink,
    /// LNM - LF also performs CR
    NewLine,
    /// Alternate screen buffer active (47/1047/1049)
    AppScreen,
    /// DECCKM - application cursor keys
    AppCuKeys,
    /// DECNKM / DECKPAM - application keypad
    AppKeyPad,
    /// Send mouse X,Y position on press and release
    Mouse1000,
    /// Highlight mouse tracking
    Mouse1001,
    /// Cell motion mouse tracking
    Mouse1002,
    /// All motion mouse tracking
    Mouse1003,
    /// Focus in/out reporting
    FocusEvents,
    /// UTF-8 extended mouse coordinates
    Mouse1005,
    /// SGR extended mouse coordinates
    Mouse1006,
    /// Alternate scroll: wheel sends cursor keys on the alternate screen
    Mouse1007,
    /// urxvt extended mouse coordinates
    Mouse1015,
    /// DECANM - ANSI mode; cleared means VT52 mode
    Ansi,
    /// DECCOLM - 132 column mode
    Columns132,
    /// Permission for DECCOLM to take effect
    Allow132Columns,
    /// Bracketed paste
    BracketedPaste,
    /// DECSDM - sixel display mode (set disables sixel scrolling)
    SixelDisplay,
    /// A sixel image is being decoded
    Sixel,
    /// tmux control mode is active
    Tmux,
}

impl Mode {
    /// Number of modes
    pub const COUNT: usize = 26;

    /// All modes, in index order
    pub const ALL: [Mode; Mode::COUNT] = [
        Mode::Origin,
        Mode::Wrap,
        Mode::Insert,
        Mode::Screen,
        Mode::CursorVisible,
        Mode::CursorBlink,
        Mode::NewLine,
        Mode::AppScreen,
        Mode::AppCuKeys,
        Mode::AppKeyPad,
        Mode::Mouse1000,
        Mode::Mouse1001,
        Mode::Mouse1002,
        Mode::Mouse1003,
        Mode::FocusEvents,
        Mode::Mouse1005,
        Mode::Mouse1006,
        Mode::Mouse1007,
        Mode::Mouse1015,
        Mode::Ansi,
        Mode::Columns132,
        Mode::Allow132Columns,
        Mode::BracketedPaste,
        Mode::SixelDisplay,
        Mode::Sixel,
        Mode::Tmux,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Map a DEC private mode number (`CSI ? Ps h`) to a mode.
    ///
    /// 47, 1047 and 1049 all map to [`Mode::AppScreen`]; the interpreter
    /// adds the cursor save and clear that distinguish them. 1048 is not a
    /// mode at all and returns `None`.
    pub fn from_dec_private(id: u16) -> Option<Mode> {
        let mode = match id {
            1 => Mode::AppCuKeys,
            2 => Mode::Ansi,
            3 => Mode::Columns132,
            5 => Mode::Screen,
            6 => Mode::Origin,
            7 => Mode::Wrap,
            12 => Mode::CursorBlink,
            25 => Mode::CursorVisible,
            40 => Mode::Allow132Columns,
            47 | 1047 | 1049 => Mode::AppScreen,
            66 => Mode::AppKeyPad,
            80 => Mode::SixelDisplay,
            1000 => Mode::Mouse1000,
            1001 => Mode::Mouse1001,
            1002 => Mode::Mouse1002,
            1003 => Mode::Mouse1003,
            1004 => Mode::FocusEvents,
            1005 => Mode::Mouse1005,
            1006 => Mode::Mouse1006,
            1007 => Mode::Mouse1007,
            1015 => Mode::Mouse1015,
            2004 => Mode::BracketedPaste,
            _ => return None,
        };
        Some(mode)
    }

    /// Map an ANSI mode number (`CSI Ps h`) to a mode
    pub fn from_ansi(id: u16) -> Option<Mode> {
        match id {
            4 => Some(Mode::Insert),
            20 => Some(Mode::NewLine),
            _ => None,
        }
    }
}

/// Current and saved values of every mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeVector {
    current: [bool; Mode::COUNT],
    saved: [bool; Mode::COUNT],
}

impl Default for ModeVector {
    fn default() -> Self {
        let mut modes = Self {
            current: [false; Mode::COUNT],
            saved: [false; Mode::COUNT],
        };
        modes.reset_all();
        modes
    }
}

impl ModeVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `mode` is set
    pub fn get(&self, mode: Mode) -> bool {
        self.current[mode.index()]
    }

    /// Set `mode`, returning whether the value changed
    pub fn set(&mut self, mode: Mode) -> bool {
        self.assign(mode, true)
    }

    /// Reset `mode`, returning whether the value changed
    pub fn reset(&mut self, mode: Mode) -> bool {
        self.assign(mode, false)
    }

    fn assign(&mut self, mode: Mode, value: bool) -> bool {
        let slot = &mut self.current[mode.index()];
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Remember the current value of `mode`
    pub fn save(&mut self, mode: Mode) {
        self.saved[mode.index()] = self.current[mode.index()];
    }

    /// The remembered value of `mode`
    pub fn saved(&self, mode: Mode) -> bool {
        self.saved[mode.index()]
    }

    /// Bring back the remembered value of `mode`, returning it
    pub fn restore(&mut self, mode: Mode) -> bool {
        let value = self.saved[mode.index()];
        self.current[mode.index()] = value;
        value
    }

    /// Return every mode to its power-on value, except
    /// [`Mode::Allow132Columns`] which is a user permission
    pub fn reset_all(&mut self) {
        let allow_132 = self.current[Mode::Allow132Columns.index()];
        self.current = [false; Mode::COUNT];
        self.current[Mode::Allow132Columns.index()] = allow_132;
        self.current[Mode::Ansi.index()] = true;
        self.current[Mode::Wrap.index()] = true;
        self.current[Mode::CursorVisible.index()] = true;
        self.saved = self.current;
    }

    /// Iterate over the modes that are currently set
    pub fn iter_set(&self) -> impl Iterator<Item = Mode> + '_ {
        Mode::ALL.iter().copied().filter(|&mode| self.get(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_table_order() {
        for (i, mode) in Mode::ALL.iter().enumerate() {
            assert_eq!(mode.index(), i);
        }
    }

    #[test]
    fn test_modes_default() {
        let modes = ModeVector::new();
        assert!(modes.get(Mode::Ansi));
        assert!(modes.get(Mode::Wrap));
        assert!(modes.get(Mode::CursorVisible));
        assert!(!modes.get(Mode::Origin));
        assert!(!modes.get(Mode::BracketedPaste));
    }

    #[test]
    fn test_set_reset_reports_change() {
        let mut modes = ModeVector::new();
        assert!(modes.set(Mode::BracketedPaste));
        assert!(!modes.set(Mode::BracketedPaste));
        assert!(modes.get(Mode::BracketedPaste));
        assert!(modes.reset(Mode::BracketedPaste));
        assert!(!modes.get(Mode::BracketedPaste));
    }

    #[test]
    fn test_save_restore() {
        let mut modes = ModeVector::new();
        modes.set(Mode::Mouse1002);
        modes.save(Mode::Mouse1002);
        modes.reset(Mode::Mouse1002);
        assert!(modes.restore(Mode::Mouse1002));
        assert!(modes.get(Mode::Mouse1002));
    }

    #[test]
    fn test_save_then_restore_is_noop() {
        let mut modes = ModeVector::new();
        modes.set(Mode::Origin);
        let before = modes.clone();
        for mode in Mode::ALL {
            modes.save(mode);
            modes.restore(mode);
        }
        assert_eq!(modes.current, before.current);
    }

    #[test]
    fn test_reset_all_keeps_132_permission() {
        let mut modes = ModeVector::new();
        modes.set(Mode::Allow132Columns);
        modes.set(Mode::Columns132);
        modes.reset_all();
        assert!(modes.get(Mode::Allow132Columns));
        assert!(!modes.get(Mode::Columns132));
    }

    #[test]
    fn test_dec_private_ids() {
        assert_eq!(Mode::from_dec_private(2004), Some(Mode::BracketedPaste));
        assert_eq!(Mode::from_dec_private(1049), Some(Mode::AppScreen));
        assert_eq!(Mode::from_dec_private(1048), None);
        assert_eq!(Mode::from_dec_private(9999), None);
        assert_eq!(Mode::from_ansi(4), Some(Mode::Insert));
        assert_eq!(Mode::from_ansi(2), None);
    }
}
