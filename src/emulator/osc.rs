//! OSC commands

use tracing::debug;

use super::event::{ColorSlot, Event, SessionAttribute};
use super::reports;
use super::screen::{PromptMark, Screen, ScreenOp};
use super::Emulator;
use crate::core::{color_table, Rgb};
use crate::parser::OscAction;

impl Emulator {
    pub(super) fn osc_dispatch(&mut self, screen: &mut dyn Screen, osc: OscAction) {
        let Some(code) = osc.code else {
            let prefix: String = osc.payload.chars().take(16).collect();
            return self.decoding_error(format!("OSC {prefix}"));
        };
        match code {
            0 => {
                self.set_attribute(SessionAttribute::IconName, osc.payload.clone());
                self.set_attribute(SessionAttribute::WindowTitle, osc.payload);
            }
            1 => self.set_attribute(SessionAttribute::IconName, osc.payload),
            2 => self.set_attribute(SessionAttribute::WindowTitle, osc.payload),
            7 => self.set_attribute(SessionAttribute::CurrentDirectory, osc.payload),
            4 => self.set_palette(&osc),
            10 | 11 => self.set_dynamic_colors(code, &osc),
            104 => self.reset_palette(&osc.payload),
            133 => self.semantic_prompt(screen, &osc.payload),
            777 => self.notify(&osc.payload),
            _ => self.decoding_error(format!("OSC {code}")),
        }
    }

    /// OSC 4: `index;spec` pairs, `?` queries an entry
    fn set_palette(&mut self, osc: &OscAction) {
        let mut parts = osc.payload.split(';');
        while let (Some(index), Some(spec)) = (parts.next(), parts.next()) {
            let Ok(index) = index.parse::<u8>() else {
                self.decoding_error(format!("OSC 4 index {index}"));
                continue;
            };
            if spec == "?" {
                let color = self.colors[usize::from(index)];
                self.reply(reports::color(4, Some(index), color, osc.terminator));
                continue;
            }
            match Rgb::parse_spec(spec) {
                Some(color) => {
                    self.colors[usize::from(index)] = color;
                    self.events.push(Event::ColorChanged {
                        slot: ColorSlot::Palette(index),
                        color,
                    });
                }
                None => self.decoding_error(format!("OSC 4 color {spec}")),
            }
        }
    }

    /// OSC 10 / 11: each further `;` spec addresses the next dynamic color
    fn set_dynamic_colors(&mut self, first: u32, osc: &OscAction) {
        for (code, spec) in (first..=11).zip(osc.payload.split(';')) {
            let slot = if code == 10 {
                ColorSlot::Foreground
            } else {
                ColorSlot::Background
            };
            if spec == "?" {
                let color = if code == 10 {
                    self.foreground
                } else {
                    self.background
                };
                self.reply(reports::color(code, None, color, osc.terminator));
                continue;
            }
            match Rgb::parse_spec(spec) {
                Some(color) => {
                    if code == 10 {
                        self.foreground = color;
                    } else {
                        self.background = color;
                    }
                    self.events.push(Event::ColorChanged { slot, color });
                }
                None => self.decoding_error(format!("OSC {code} color {spec}")),
            }
        }
    }

    /// OSC 104: no argument resets every entry
    fn reset_palette(&mut self, payload: &str) {
        let defaults = color_table(&self.config.colors);
        if payload.is_empty() {
            self.colors = defaults;
            self.events.push(Event::PaletteReset(None));
            return;
        }
        let mut reset = Vec::new();
        for index in payload.split(';') {
            match index.parse::<u8>() {
                Ok(index) => {
                    self.colors[usize::from(index)] = defaults[usize::from(index)];
                    reset.push(index);
                }
                Err(_) => debug!(index, "palette reset index ignored"),
            }
        }
        if !reset.is_empty() {
            self.events.push(Event::PaletteReset(Some(reset)));
        }
    }

    /// OSC 133 shell integration marks
    fn semantic_prompt(&mut self, screen: &mut dyn Screen, payload: &str) {
        let mut parts = payload.split(';');
        let mark = match parts.next() {
            Some("A") => PromptMark::PromptStart,
            Some("B") => PromptMark::CommandStart,
            Some("C") => PromptMark::OutputStart,
            Some("D") => PromptMark::CommandFinished {
                exit_code: parts.next().and_then(|code| code.parse().ok()),
            },
            _ => return self.decoding_error(format!("OSC 133;{payload}")),
        };
        screen.apply(ScreenOp::SemanticPrompt(mark));
    }

    /// OSC 777: `notify;title;body`
    fn notify(&mut self, payload: &str) {
        let mut parts = payload.splitn(3, ';');
        match (parts.next(), parts.next()) {
            (Some("notify"), Some(title)) => {
                let body = parts.next().unwrap_or_default().to_string();
                self.events.push(Event::Notification {
                    title: title.to_string(),
                    body,
                });
            }
            _ => self.decoding_error(format!("OSC 777;{payload}")),
        }
    }
}
