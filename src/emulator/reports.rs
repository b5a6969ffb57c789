//! Reply strings sent back to the child process

use std::fmt::Write as _;

use super::screen::ScreenSize;
use crate::core::Rgb;
use crate::parser::StringTerminator;

/// Primary device attributes: VT220 with 132 columns and sixel
pub const DA1: &str = "\x1b[?62;1;4c";
/// Secondary device attributes
pub const DA2: &str = "\x1b[>1;115;0c";
/// Tertiary device attributes (unit id)
pub const DA3: &str = "\x1bP!|7E4B4445\x1b\\";
/// VT52 identify reply
pub const VT52_IDENTIFY: &str = "\x1b/Z";
/// DSR 5: terminal OK
pub const STATUS_OK: &str = "\x1b[0n";

/// CPR for a zero based position
pub fn cursor_position(line: u16, column: u16) -> String {
    format!("\x1b[{};{}R", u32::from(line) + 1, u32::from(column) + 1)
}

/// DECREPTPARM for request type 0 or 1
pub fn terminal_parameters(request: u16) -> String {
    format!("\x1b[{};1;1;112;112;1;0x", request + 2)
}

/// XTWINOPS 14: text area size in pixels
pub fn text_area_pixels(size: ScreenSize) -> String {
    format!(
        "\x1b[4;{};{}t",
        u32::from(size.lines) * u32::from(size.cell_height),
        u32::from(size.columns) * u32::from(size.cell_width)
    )
}

/// XTWINOPS 16: cell size in pixels
pub fn cell_pixels(size: ScreenSize) -> String {
    format!("\x1b[6;{};{}t", size.cell_height, size.cell_width)
}

/// XTWINOPS 18: text area size in cells
pub fn text_area_cells(size: ScreenSize) -> String {
    format!("\x1b[8;{};{}t", size.lines, size.columns)
}

/// OSC color query answer, terminated like the query
pub fn color(code: u32, index: Option<u8>, color: Rgb, terminator: StringTerminator) -> String {
    let mut out = format!("\x1b]{code};");
    if let Some(index) = index {
        let _ = write!(out, "{index};");
    }
    out.push_str(&color.to_x11_spec());
    out.push_str(terminator.as_str());
    out
}

/// XTSMGRAPHICS answer
pub fn graphics_attribute(item: u16, status: u16, values: &[u32]) -> String {
    let mut out = format!("\x1b[?{item};{status}");
    for value in values {
        let _ = write!(out, ";{value}");
    }
    out.push('S');
    out
}

/// DECRPSS; `None` reports an invalid request
pub fn setting(value: Option<&str>) -> String {
    match value {
        Some(value) => format!("\x1bP1$r{value}\x1b\\"),
        None => "\x1bP0$r\x1b\\".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_position_one_based() {
        assert_eq!(cursor_position(0, 0), "\x1b[1;1R");
        assert_eq!(cursor_position(u16::MAX, 9), "\x1b[65536;10R");
    }

    #[test]
    fn test_color_reply() {
        let reply = color(4, Some(1), Rgb::new(0xff, 0, 0x10), StringTerminator::St);
        assert_eq!(reply, "\x1b]4;1;rgb:ffff/0000/1010\x1b\\");
        let reply = color(11, None, Rgb::new(0, 0, 0), StringTerminator::Bel);
        assert_eq!(reply, "\x1b]11;rgb:0000/0000/0000\x07");
    }

    #[test]
    fn test_setting_reply() {
        assert_eq!(setting(Some("0m")), "\x1bP1$r0m\x1b\\");
        assert_eq!(setting(None), "\x1bP0$r\x1b\\");
    }
}
