//! DCS and APC strings: sixel images, setting requests, kitty graphics

use std::sync::Arc;

use tracing::debug;

use super::reports;
use super::screen::{ImagePlacement, Screen, ScreenOp};
use super::Emulator;
use crate::core::Mode;
use crate::graphics::{parse_command, KittyEffect, Placement, SixelDecoder};
use crate::parser::DcsHeader;

impl Emulator {
    /// Streamed DCS start; only sixel is streamed
    pub(super) fn dcs_hook(&mut self, header: &DcsHeader) {
        if header.final_byte != b'q' {
            return;
        }
        let p = &header.params;
        self.sixel = Some(SixelDecoder::new(p.raw(0), p.raw(1), &self.config.limits));
        self.modes.set(Mode::Sixel);
    }

    pub(super) fn dcs_put(&mut self, c: char) {
        if let Some(decoder) = self.sixel.as_mut() {
            decoder.put(c);
        }
    }

    pub(super) fn dcs_unhook(&mut self, screen: &mut dyn Screen) {
        self.modes.reset(Mode::Sixel);
        let Some(decoder) = self.sixel.take() else {
            return;
        };
        let aspect = decoder.aspect();
        let transparent = decoder.transparent_background();
        let Some(image) = decoder.finish() else {
            debug!("empty sixel image");
            return;
        };
        let at_origin = self.modes.get(Mode::SixelDisplay);
        screen.apply(ScreenOp::PlaceImage(ImagePlacement {
            id: None,
            image: Arc::new(image),
            placement: Placement {
                move_cursor: !at_origin,
                ..Placement::default()
            },
            aspect,
            transparent,
            at_origin,
        }));
    }

    /// Drop a sixel image cut short by CAN, SUB or a new sequence
    pub(super) fn abort_sixel(&mut self) {
        if self.sixel.take().is_some() {
            debug!("sixel image aborted");
        }
        self.modes.reset(Mode::Sixel);
    }

    /// Buffered DCS strings
    pub(super) fn dcs_dispatch(&mut self, screen: &mut dyn Screen, header: &DcsHeader, data: &str) {
        match (header.private_marker, header.intermediate, header.final_byte) {
            // DECRQSS
            (None, Some(b'$'), b'q') => {
                let value = match data {
                    "m" => Some(format!("{}m", self.sgr.to_params())),
                    "r" => {
                        let (top, bottom) = self.margins(screen);
                        Some(format!("{};{}r", top + 1, bottom + 1))
                    }
                    " q" => Some(format!("{} q", self.cursor_style.max(1))),
                    "\"p" => Some("62;1\"p".to_string()),
                    _ => None,
                };
                self.reply(reports::setting(value.as_deref()));
            }
            _ => {
                let mut token = String::from("DCS ");
                if let Some(marker) = header.private_marker {
                    token.push(marker as char);
                }
                if let Some(intermediate) = header.intermediate {
                    token.push(intermediate as char);
                }
                token.push(header.final_byte as char);
                self.decoding_error(token);
            }
        }
    }

    /// APC strings; only kitty graphics (`G...`) are understood
    pub(super) fn apc_dispatch(&mut self, screen: &mut dyn Screen, data: &str) {
        let Some(command) = parse_command(data) else {
            debug!(len = data.len(), "APC ignored");
            return;
        };
        let outcome = self.kitty.handle(command, &mut self.images);
        if let Some(reply) = outcome.reply {
            self.reply(reply);
        }
        match outcome.effect {
            Some(KittyEffect::Place {
                id,
                image,
                placement,
            }) => screen.apply(ScreenOp::PlaceImage(ImagePlacement {
                id: Some(id),
                image,
                placement,
                aspect: (1, 1),
                transparent: true,
                at_origin: false,
            })),
            Some(KittyEffect::Delete { id }) => screen.apply(ScreenOp::DeleteImages { id }),
            None => {}
        }
    }
}
