//! Terminal Core Module
//!
//! Per-terminal registries the interpreter consults and mutates:
//! - Mode vector with saved copies
//! - G0-G3 character set slots with save/restore
//! - The 256 entry color table

mod charset;
mod color;
mod modes;

pub use charset::{CharsetSlots, CHARSET_ASCII, CHARSET_DEC_GRAPHICS, CHARSET_UK};
pub use color::{color_table, indexed_color, Color, Rgb};
pub use modes::{Mode, ModeVector};
