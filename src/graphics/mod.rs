//! Inline graphics
//!
//! - [`SixelDecoder`]: palette based raster images carried in `DCS q`
//! - [`KittyGraphics`]: the kitty placement protocol carried in `APC G`
//! - [`GraphicsCache`]: decoded images keyed by protocol id

mod cache;
mod image;
mod kitty;
mod sixel;

pub use cache::GraphicsCache;
pub use image::Image;
pub use kitty::{
    parse_command, DeleteTarget, KittyAction, KittyCommand, KittyEffect, KittyFormat,
    KittyGraphics, KittyOutcome, Placement,
};
pub use sixel::SixelDecoder;
