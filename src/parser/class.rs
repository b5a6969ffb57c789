//! Character classification
//!
//! Every value 0..=255 carries a fixed set of class flags, computed once at
//! compile time. The tokenizer's transition function only looks at these
//! flags (plus the handful of literal bytes with dedicated meaning), never at
//! raw ranges. Codepoints above 0xFF are plain printable text.

use bitflags::bitflags;

bitflags! {
    /// Class flags of a character
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharClass: u16 {
        /// C0 control, 0x00-0x1F
        const CONTROL = 1 << 0;
        /// C0 control executed immediately (everything but CAN, SUB, ESC)
        const EXECUTE = 1 << 1;
        /// CAN or SUB: abort the current sequence
        const ABORT = 1 << 2;
        /// ESC: introduces an escape sequence
        const ESCAPE = 1 << 3;
        /// Graphic character, 0x20-0x7E and everything above 0x9F
        const PRINTABLE = 1 << 4;
        /// Intermediate byte, 0x20-0x2F
        const INTERMEDIATE = 1 << 5;
        /// Decimal digit
        const DIGIT = 1 << 6;
        /// Parameter separator, `;` or `:`
        const SEPARATOR = 1 << 7;
        /// Private marker, `<` `=` `>` `?`
        const PRIVATE_MARKER = 1 << 8;
        /// Parameter byte range, 0x30-0x3F
        const PARAMETER = 1 << 9;
        /// CSI/DCS final byte, 0x40-0x7E
        const FINAL = 1 << 10;
        /// ESC final byte, 0x30-0x7E
        const ESC_FINAL = 1 << 11;
        /// DEL, ignored outside string bodies
        const IGNORE = 1 << 12;
        /// C1 control, 0x80-0x9F
        const C1 = 1 << 13;
        /// Sixel data character, 0x3F-0x7E
        const SIXEL = 1 << 14;
    }
}

static CHAR_CLASS: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut bits = 0u16;
        if i < 0x20 {
            bits |= CharClass::CONTROL.bits();
            bits |= match i {
                0x18 | 0x1A => CharClass::ABORT.bits(),
                0x1B => CharClass::ESCAPE.bits(),
                _ => CharClass::EXECUTE.bits(),
            };
        } else if i < 0x7F || i > 0x9F {
            bits |= CharClass::PRINTABLE.bits();
        } else if i == 0x7F {
            bits |= CharClass::IGNORE.bits();
        } else {
            bits |= CharClass::C1.bits();
        }
        if i >= 0x20 && i <= 0x2F {
            bits |= CharClass::INTERMEDIATE.bits();
        }
        if i >= 0x30 && i <= 0x3F {
            bits |= CharClass::PARAMETER.bits();
        }
        if i >= 0x30 && i <= 0x39 {
            bits |= CharClass::DIGIT.bits();
        }
        if i == 0x3A || i == 0x3B {
            bits |= CharClass::SEPARATOR.bits();
        }
        if i >= 0x3C && i <= 0x3F {
            bits |= CharClass::PRIVATE_MARKER.bits();
        }
        if i >= 0x40 && i <= 0x7E {
            bits |= CharClass::FINAL.bits();
        }
        if i >= 0x30 && i <= 0x7E {
            bits |= CharClass::ESC_FINAL.bits();
        }
        if i >= 0x3F && i <= 0x7E {
            bits |= CharClass::SIXEL.bits();
        }
        table[i] = bits;
        i += 1;
    }
    table
}

/// Class flags of `c`
#[inline]
pub fn classify(c: char) -> CharClass {
    let code = c as u32;
    if code < 256 {
        CharClass::from_bits_retain(CHAR_CLASS[code as usize])
    } else {
        CharClass::PRINTABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controls() {
        assert!(classify('\n').contains(CharClass::CONTROL | CharClass::EXECUTE));
        assert!(classify('\x18').contains(CharClass::ABORT));
        assert!(classify('\x1a').contains(CharClass::ABORT));
        assert!(classify('\x1b').contains(CharClass::ESCAPE));
        assert!(!classify('\x1b').contains(CharClass::EXECUTE));
    }

    #[test]
    fn test_parameter_bytes() {
        assert!(classify('7').contains(CharClass::DIGIT | CharClass::PARAMETER));
        assert!(classify(';').contains(CharClass::SEPARATOR));
        assert!(classify(':').contains(CharClass::SEPARATOR));
        assert!(classify('?').contains(CharClass::PRIVATE_MARKER));
        assert!(!classify('?').contains(CharClass::DIGIT));
    }

    #[test]
    fn test_final_and_intermediate() {
        assert!(classify('m').contains(CharClass::FINAL));
        assert!(classify('$').contains(CharClass::INTERMEDIATE));
        assert!(classify('0').contains(CharClass::ESC_FINAL));
        assert!(!classify('0').contains(CharClass::FINAL));
    }

    #[test]
    fn test_high_codepoints() {
        assert_eq!(classify('\u{7f}'), CharClass::IGNORE);
        assert!(classify('\u{9b}').contains(CharClass::C1));
        assert_eq!(classify('é'), CharClass::PRINTABLE);
        assert_eq!(classify('世'), CharClass::PRINTABLE);
    }
}
