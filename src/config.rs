//! Configuration for the emulation core

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Rgb;
use crate::error::Result;

/// Emulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reply sent to the child on ENQ
    pub answerback: String,
    /// Default colors reported through OSC queries
    pub colors: ColorPalette,
    /// Memory ceilings for strings and images
    pub limits: Limits,
    /// Initial state of the "allow 132 columns" mode
    pub allow_132_columns: bool,
    /// tmux control-mode settings
    pub tmux: TmuxConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            answerback: String::new(),
            colors: ColorPalette::default(),
            limits: Limits::default(),
            allow_132_columns: false,
            tmux: TmuxConfig::default(),
        }
    }
}

/// Color palette configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorPalette {
    /// Default foreground color
    pub foreground: Rgb,
    /// Default background color
    pub background: Rgb,
    /// The 16 ANSI colors (0-15)
    pub ansi: [Rgb; 16],
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            foreground: Rgb::new(229, 229, 229),
            background: Rgb::new(0, 0, 0),
            // Default ANSI colors (similar to xterm)
            ansi: [
                Rgb::new(0, 0, 0),       // 0: Black
                Rgb::new(205, 0, 0),     // 1: Red
                Rgb::new(0, 205, 0),     // 2: Green
                Rgb::new(205, 205, 0),   // 3: Yellow
                Rgb::new(0, 0, 238),     // 4: Blue
                Rgb::new(205, 0, 205),   // 5: Magenta
                Rgb::new(0, 205, 205),   // 6: Cyan
                Rgb::new(229, 229, 229), // 7: White
                Rgb::new(127, 127, 127), // 8: Bright Black
                Rgb::new(255, 0, 0),     // 9: Bright Red
                Rgb::new(0, 255, 0),     // 10: Bright Green
                Rgb::new(255, 255, 0),   // 11: Bright Yellow
                Rgb::new(92, 92, 255),   // 12: Bright Blue
                Rgb::new(255, 0, 255),   // 13: Bright Magenta
                Rgb::new(0, 255, 255),   // 14: Bright Cyan
                Rgb::new(255, 255, 255), // 15: Bright White
            ],
        }
    }
}

/// Resource ceilings. Input exceeding them is clipped, never rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest image width or height in pixels
    pub max_image_dimension: u32,
    /// Largest image area in pixels; bounds the decode buffer
    pub max_image_pixels: usize,
    /// Number of sixel color registers
    pub max_sixel_colors: usize,
    /// Longest OSC or buffered DCS payload, in characters
    pub max_osc_length: usize,
    /// Longest APC payload, in characters
    pub max_apc_length: usize,
    /// Largest accumulated kitty upload, in decoded bytes
    pub max_graphics_upload: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_image_dimension: 16384,
            max_image_pixels: 4096 * 4096,
            max_sixel_colors: 256,
            max_osc_length: 65536,
            max_apc_length: 4 * 1024 * 1024,
            max_graphics_upload: 64 * 1024 * 1024,
        }
    }
}

/// tmux control-mode configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxConfig {
    /// Session user option holding the last known client size (`W,H`)
    pub size_option: String,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            size_option: "@client_size".to_string(),
        }
    }
}

impl Config {
    /// Parse configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
