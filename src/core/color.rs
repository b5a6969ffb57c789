//! Colors and the 256-entry color table
//!
//! The table is the xterm layout: 16 configurable base colors, a 6x6x6
//! color cube and a 24 step grayscale ramp.

use serde::{Deserialize, Serialize};

use crate::config::ColorPalette;

/// A 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Format as an X11 color spec (`rgb:rrrr/gggg/bbbb`), the form OSC
    /// color queries are answered in
    pub fn to_x11_spec(self) -> String {
        format!(
            "rgb:{:02x}{:02x}/{:02x}{:02x}/{:02x}{:02x}",
            self.r, self.r, self.g, self.g, self.b, self.b
        )
    }

    /// Parse `rgb:r/g/b` (1-4 hex digits per channel) or `#rrggbb`
    pub fn parse_spec(spec: &str) -> Option<Self> {
        if let Some(hex) = spec.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            return Some(Self::new(r, g, b));
        }

        let body = spec.strip_prefix("rgb:")?;
        let mut channels = body.split('/').map(scale_hex_channel);
        let r = channels.next()??;
        let g = channels.next()??;
        let b = channels.next()??;
        if channels.next().is_some() {
            return None;
        }
        Some(Self::new(r, g, b))
    }
}

/// Scale a 1-4 digit hex channel to 8 bits
fn scale_hex_channel(digits: &str) -> Option<u8> {
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    let max = (1u32 << (4 * digits.len())) - 1;
    Some((value * 255 / max) as u8)
}

/// A color as carried by SGR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Color {
    /// Default terminal color (foreground or background)
    #[default]
    Default,
    /// Palette index (0-255)
    Indexed(u8),
    /// 24-bit RGB color
    Rgb(Rgb),
}

/// Compute the entry for `index` in the xterm 256 color layout
pub fn indexed_color(palette: &ColorPalette, index: u8) -> Rgb {
    match index {
        0..=15 => palette.ansi[index as usize],
        // 216 color cube (16-231)
        16..=231 => {
            let n = index - 16;
            let to_component = |c: u8| if c == 0 { 0 } else { 55 + c * 40 };
            Rgb::new(to_component(n / 36), to_component((n / 6) % 6), to_component(n % 6))
        }
        // Grayscale (232-255)
        232..=255 => {
            let gray = 8 + (index - 232) * 10;
            Rgb::new(gray, gray, gray)
        }
    }
}

/// Build the full 256 entry table from the configured base colors
pub fn color_table(palette: &ColorPalette) -> [Rgb; 256] {
    let mut table = [Rgb::default(); 256];
    for (i, entry) in table.iter_mut().enumerate() {
        *entry = indexed_color(palette, i as u8);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_layout() {
        let palette = ColorPalette::default();
        let table = color_table(&palette);

        assert_eq!(table[1], Rgb::new(205, 0, 0));
        assert_eq!(table[16], Rgb::new(0, 0, 0));
        assert_eq!(table[231], Rgb::new(255, 255, 255));
        assert_eq!(table[232], Rgb::new(8, 8, 8));
        assert_eq!(table[255], Rgb::new(238, 238, 238));
    }

    #[test]
    fn test_x11_spec_roundtrip() {
        let color = Rgb::new(0x12, 0xab, 0xff);
        assert_eq!(color.to_x11_spec(), "rgb:1212/abab/ffff");
        assert_eq!(Rgb::parse_spec(&color.to_x11_spec()), Some(color));
    }

    #[test]
    fn test_parse_spec_forms() {
        assert_eq!(Rgb::parse_spec("#ff0080"), Some(Rgb::new(255, 0, 128)));
        assert_eq!(Rgb::parse_spec("rgb:f/0/8"), Some(Rgb::new(255, 0, 136)));
        assert_eq!(Rgb::parse_spec("rgb:ff/00"), None);
        assert_eq!(Rgb::parse_spec("red"), None);
    }
}
