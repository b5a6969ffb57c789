//! Command interpreter
//!
//! Feeds codepoints through the tokenizer and gives every dispatch event its
//! meaning: display mutations go to a [`Screen`], replies and notifications
//! queue up as [`Event`]s for the host to drain. Mode, charset, color and
//! graphics state live here; the character grid does not.

mod csi;
mod dcs;
mod esc;
mod event;
mod osc;
mod reports;
mod screen;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::Config;
use crate::core::{color_table, CharsetSlots, Mode, ModeVector, Rgb};
use crate::error::{Error, Result};
use crate::graphics::{GraphicsCache, KittyGraphics, SixelDecoder};
use crate::parser::{Action, Parser, ParserState};
use crate::tmux::{PendingCommand, TmuxClient};

use csi::SgrState;

pub use event::{ColorSlot, Event, SessionAttribute};
pub use screen::{
    CursorPosition, CursorShape, EraseMode, ImagePlacement, PromptMark, RecordingScreen,
    Rendition, Screen, ScreenOp, ScreenSize, UnderlineStyle,
};

/// Most titles XTWINOPS 22 keeps
const TITLE_STACK_DEPTH: usize = 10;

/// One terminal's interpreter state
#[derive(Debug)]
pub struct Emulator {
    config: Config,
    parser: Parser,
    modes: ModeVector,
    /// Charset slots of the primary and the alternate screen
    charsets: [CharsetSlots; 2],
    colors: [Rgb; 256],
    foreground: Rgb,
    background: Rgb,
    /// Scroll region, zero based inclusive; `None` is the whole screen
    margins: Option<(u16, u16)>,
    sgr: SgrState,
    /// Last DECSCUSR parameter
    cursor_style: u16,
    last_printed: Option<char>,
    title: String,
    icon_name: String,
    title_stack: Vec<(String, String)>,

    sixel: Option<SixelDecoder>,
    images: GraphicsCache,
    kitty: KittyGraphics,
    tmux: Option<TmuxClient>,

    pending_attributes: BTreeMap<SessionAttribute, String>,
    actions: Vec<Action>,
    events: Vec<Event>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut modes = ModeVector::new();
        if config.allow_132_columns {
            modes.set(Mode::Allow132Columns);
        }
        Self {
            parser: Parser::with_limits(&config.limits),
            modes,
            charsets: [CharsetSlots::new(), CharsetSlots::new()],
            colors: color_table(&config.colors),
            foreground: config.colors.foreground,
            background: config.colors.background,
            margins: None,
            sgr: SgrState::default(),
            cursor_style: 0,
            last_printed: None,
            title: String::new(),
            icon_name: String::new(),
            title_stack: Vec::new(),
            sixel: None,
            images: GraphicsCache::new(),
            kitty: KittyGraphics::new(&config.limits),
            tmux: None,
            pending_attributes: BTreeMap::new(),
            actions: Vec::new(),
            events: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process a chunk of terminal output
    ///
    /// Characters take effect strictly in order. Title and directory changes
    /// are collected and reported once, at the end of the chunk.
    pub fn receive(&mut self, screen: &mut dyn Screen, input: &str) {
        let mut actions = std::mem::take(&mut self.actions);
        for c in input.chars() {
            self.parser.advance(c, &mut |action| actions.push(action));
            for action in actions.drain(..) {
                self.apply_action(screen, action);
            }
        }
        self.actions = actions;
        self.flush_attributes();
    }

    /// Take the events produced so far
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn modes(&self) -> &ModeVector {
        &self.modes
    }

    /// Charset slots of the active screen
    pub fn charsets(&self) -> &CharsetSlots {
        &self.charsets[self.screen_index()]
    }

    pub fn parser_state(&self) -> ParserState {
        self.parser.state()
    }

    /// Current entry `index` of the color table
    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    pub fn default_colors(&self) -> (Rgb, Rgb) {
        (self.foreground, self.background)
    }

    pub fn images(&self) -> &GraphicsCache {
        &self.images
    }

    /// The control-mode client, while tmux control mode is active
    pub fn tmux(&self) -> Option<&TmuxClient> {
        self.tmux.as_ref()
    }

    /// Whether a sixel image is being decoded
    pub fn decoding_sixel(&self) -> bool {
        self.sixel.is_some()
    }

    /// Send a command to tmux; the line is reported as an
    /// [`Event::TmuxCommand`] once it may go out
    pub fn send_tmux_command(&mut self, command: PendingCommand) -> Result<()> {
        let client = self.tmux.as_mut().ok_or(Error::TmuxInactive)?;
        client.send(command)?;
        self.drain_tmux();
        Ok(())
    }

    fn screen_index(&self) -> usize {
        usize::from(self.modes.get(Mode::AppScreen))
    }

    fn charsets_mut(&mut self) -> &mut CharsetSlots {
        let index = self.screen_index();
        &mut self.charsets[index]
    }

    fn apply_action(&mut self, screen: &mut dyn Screen, action: Action) {
        match action {
            Action::Print(c) => self.print(screen, c),
            Action::Execute(byte) => self.execute(screen, byte),
            Action::EscDispatch {
                intermediate,
                final_byte,
            } => self.esc_dispatch(screen, intermediate, final_byte),
            Action::CsiDispatch(csi) => self.csi_dispatch(screen, &csi),
            Action::OscDispatch(osc) => self.osc_dispatch(screen, osc),
            Action::DcsHook(header) => self.dcs_hook(&header),
            Action::DcsPut(c) => self.dcs_put(c),
            Action::DcsUnhook => self.dcs_unhook(screen),
            Action::DcsAbort => self.abort_sixel(),
            Action::DcsDispatch { header, data } => self.dcs_dispatch(screen, &header, &data),
            Action::ApcDispatch(data) => self.apc_dispatch(screen, &data),
            Action::TmuxHook => self.tmux_hook(),
            Action::TmuxToken { token, separated } => {
                if let Some(client) = self.tmux.as_mut() {
                    client.token(token, separated);
                }
            }
            Action::TmuxPut(c) => {
                if let Some(client) = self.tmux.as_mut() {
                    client.put(c);
                }
            }
            Action::TmuxLineEnd => {
                if let Some(client) = self.tmux.as_mut() {
                    client.line_end();
                }
                self.drain_tmux();
            }
            Action::TmuxUnhook => self.tmux_unhook(),
            Action::Vt52Dispatch(final_byte) => self.vt52_dispatch(screen, final_byte),
            Action::Vt52CursorPosition { row, column } => screen.apply(ScreenOp::SetCursor {
                line: row,
                column,
            }),
            Action::Invalid(token) => self.decoding_error(token),
        }
    }

    fn print(&mut self, screen: &mut dyn Screen, c: char) {
        let c = self.charsets().apply(c);
        self.last_printed = Some(c);
        screen.apply(ScreenOp::Print(c));
    }

    /// C0 controls, and C1 controls without string semantics
    fn execute(&mut self, screen: &mut dyn Screen, byte: u8) {
        match byte {
            0x05 => {
                // ENQ
                if !self.config.answerback.is_empty() {
                    let answer = self.config.answerback.clone();
                    self.reply(answer);
                }
            }
            0x07 => self.events.push(Event::Bell),
            0x08 => screen.apply(ScreenOp::Backspace),
            0x09 => screen.apply(ScreenOp::Tab { count: 1 }),
            0x0A..=0x0C => {
                // LF, VT, FF
                screen.apply(ScreenOp::LineFeed);
                if self.modes.get(Mode::NewLine) {
                    screen.apply(ScreenOp::CarriageReturn);
                }
            }
            0x0D => screen.apply(ScreenOp::CarriageReturn),
            // SO / SI
            0x0E => self.charsets_mut().invoke(1),
            0x0F => self.charsets_mut().invoke(0),
            0x84 => screen.apply(ScreenOp::Index),
            0x85 => screen.apply(ScreenOp::NextLine),
            0x88 => screen.apply(ScreenOp::SetTabStop),
            0x8D => screen.apply(ScreenOp::ReverseIndex),
            0x9A => self.reply(reports::DA1),
            _ => trace!(byte, "control ignored"),
        }
    }

    /// Set or reset `mode`, telling the screen or the host when it changed
    fn set_mode(&mut self, screen: &mut dyn Screen, mode: Mode, enabled: bool) -> bool {
        let changed = if enabled {
            self.modes.set(mode)
        } else {
            self.modes.reset(mode)
        };
        if !changed {
            return false;
        }
        match mode {
            Mode::AppScreen => screen.apply(ScreenOp::SwitchScreen { alternate: enabled }),
            Mode::Origin
            | Mode::Wrap
            | Mode::Insert
            | Mode::Screen
            | Mode::CursorVisible
            | Mode::CursorBlink
            | Mode::SixelDisplay => screen.apply(ScreenOp::SetMode { mode, enabled }),
            Mode::Columns132 | Mode::Sixel | Mode::Tmux => {}
            Mode::Ansi => {
                self.parser.set_vt52(!enabled);
                self.events.push(Event::ModeChanged { mode, enabled });
            }
            _ => self.events.push(Event::ModeChanged { mode, enabled }),
        }
        true
    }

    fn save_cursor(&mut self, screen: &mut dyn Screen) {
        screen.apply(ScreenOp::SaveCursor);
        self.charsets_mut().save();
    }

    fn restore_cursor(&mut self, screen: &mut dyn Screen) {
        screen.apply(ScreenOp::RestoreCursor);
        self.charsets_mut().restore();
    }

    /// Cancel everything in flight
    ///
    /// Leaves tmux control mode, failing its queued commands with
    /// `Cancelled`, and discards any partly received sequence, sixel image
    /// or kitty upload. Processing resumes in the ground state.
    pub fn abort(&mut self) {
        debug!("abort");
        if self.tmux.is_some() {
            self.tmux_unhook();
        }
        self.abort_sixel();
        self.kitty.reset();
        let vt52 = self.parser.vt52();
        self.parser.reset();
        self.parser.set_vt52(vt52);
    }

    /// RIS
    pub fn reset(&mut self, screen: &mut dyn Screen) {
        debug!("full reset");
        self.abort();
        self.images.clear();
        let allow_132 = self.modes.get(Mode::Allow132Columns);
        self.modes.reset_all();
        if allow_132 {
            self.modes.set(Mode::Allow132Columns);
        }
        self.parser.set_vt52(false);
        for slots in &mut self.charsets {
            slots.reset();
        }
        self.colors = color_table(&self.config.colors);
        self.foreground = self.config.colors.foreground;
        self.background = self.config.colors.background;
        self.margins = None;
        self.sgr = SgrState::default();
        self.cursor_style = 0;
        self.last_printed = None;
        self.title_stack.clear();
        screen.apply(ScreenOp::Reset);
    }

    fn reply(&mut self, reply: impl Into<String>) {
        self.events.push(Event::Reply(reply.into()));
    }

    fn decoding_error(&mut self, token: String) {
        debug!(%token, "decoding error");
        self.events.push(Event::DecodingError(token));
    }

    fn set_attribute(&mut self, attribute: SessionAttribute, value: String) {
        match attribute {
            SessionAttribute::WindowTitle => self.title = value.clone(),
            SessionAttribute::IconName => self.icon_name = value.clone(),
            SessionAttribute::CurrentDirectory => {}
        }
        self.pending_attributes.insert(attribute, value);
    }

    fn flush_attributes(&mut self) {
        if self.pending_attributes.is_empty() {
            return;
        }
        let attributes = std::mem::take(&mut self.pending_attributes);
        self.events
            .push(Event::SessionAttributes(attributes.into_iter().collect()));
    }

    /// XTWINOPS 22
    fn push_title(&mut self) {
        if self.title_stack.len() == TITLE_STACK_DEPTH {
            self.title_stack.remove(0);
        }
        self.title_stack
            .push((self.title.clone(), self.icon_name.clone()));
    }

    /// XTWINOPS 23
    fn pop_title(&mut self) {
        if let Some((title, icon_name)) = self.title_stack.pop() {
            self.set_attribute(SessionAttribute::WindowTitle, title);
            self.set_attribute(SessionAttribute::IconName, icon_name);
        }
    }

    fn tmux_hook(&mut self) {
        debug!("tmux control mode started");
        self.tmux = Some(TmuxClient::new(self.config.tmux.size_option.clone()));
        self.modes.set(Mode::Tmux);
        self.events.push(Event::TmuxStarted);
    }

    fn tmux_unhook(&mut self) {
        if let Some(client) = self.tmux.as_mut() {
            client.close();
        }
        self.drain_tmux();
        self.tmux = None;
        self.modes.reset(Mode::Tmux);
        self.events.push(Event::TmuxEnded);
    }

    /// Move the client's events and command lines to the host queue
    fn drain_tmux(&mut self) {
        let Some(client) = self.tmux.as_mut() else {
            return;
        };
        let tmux_events = client.take_events();
        let commands = client.take_outgoing();
        for event in tmux_events {
            let fatal = event.is_fatal();
            self.events.push(Event::Tmux(event));
            if fatal {
                self.events.push(Event::TmuxSessionTerminated);
            }
        }
        self.events
            .extend(commands.into_iter().map(Event::TmuxCommand));
    }
}
