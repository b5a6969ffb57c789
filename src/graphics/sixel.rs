//! Sixel graphics decoder
//!
//! Incremental: the DCS body is fed one character at a time as it arrives
//! and [`SixelDecoder::finish`] hands back the bitmap at ST. Each data
//! character in `?`..=`~` paints a column of six pixels in the current
//! band; `$` returns to the band start, `-` moves to the next band, `!n`
//! repeats the next column n times, `#n` selects a color register and
//! `#n;s;a;b;c` defines one (HLS or RGB), `"pan;pad;w;h` sets raster
//! attributes.
//!
//! The pixel buffer grows on demand as pixels are painted, never past the
//! configured maximum dimension in either axis nor past the pixel budget.
//! Pixels beyond them are clipped. Raster attributes only record the
//! declared extent.

use tracing::{debug, trace};

use super::image::Image;
use crate::config::Limits;
use crate::core::Rgb;

/// Power-on VT340 color registers 0-15
const VT340_PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(51, 51, 204),
    Rgb::new(204, 36, 36),
    Rgb::new(51, 204, 51),
    Rgb::new(204, 51, 204),
    Rgb::new(51, 204, 204),
    Rgb::new(204, 204, 51),
    Rgb::new(120, 120, 120),
    Rgb::new(69, 69, 69),
    Rgb::new(87, 87, 153),
    Rgb::new(153, 69, 69),
    Rgb::new(87, 153, 87),
    Rgb::new(153, 87, 153),
    Rgb::new(87, 153, 153),
    Rgb::new(153, 153, 87),
    Rgb::new(204, 204, 204),
];

/// Most numeric arguments any sixel control takes (`#Pc;Pu;Px;Py;Pz`)
const MAX_ARGS: usize = 5;

/// Parse state for control arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Sixel data and single-character controls
    Data,
    /// After `!`
    Repeat,
    /// After `#`
    Color,
    /// After `"`
    Raster,
}

/// Sixel decoder
#[derive(Debug, Clone)]
pub struct SixelDecoder {
    state: ParseState,
    args: [u32; MAX_ARGS],
    arg_count: usize,
    palette: Vec<Rgb>,
    current_color: usize,
    /// Column of the next sixel
    x: u32,
    /// Top row of the current band
    y: u32,
    /// Extent painted so far
    width: u32,
    height: u32,
    /// Extent declared by raster attributes
    declared_width: u32,
    declared_height: u32,
    /// RGBA buffer, `stride` pixels per row, `rows` rows
    pixels: Vec<u8>,
    stride: u32,
    rows: u32,
    max_dimension: u32,
    max_pixels: u64,
    transparent: bool,
    aspect: (u32, u32),
    clipped: bool,
}

impl SixelDecoder {
    /// Create a decoder for `DCS P1 ; P2 ; P3 q`
    ///
    /// P1 selects the pixel aspect ratio and P2 = 1 keeps unpainted pixels
    /// transparent; P3 (grid size) has no effect.
    pub fn new(p1: u16, p2: u16, limits: &Limits) -> Self {
        let max_colors = limits.max_sixel_colors.max(1);
        let mut palette = vec![Rgb::default(); max_colors];
        for (slot, color) in palette.iter_mut().zip(VT340_PALETTE.iter()) {
            *slot = *color;
        }

        let vertical = match p1 {
            2 => 5,
            3 | 4 => 3,
            5 | 6 => 2,
            7..=9 => 1,
            _ => 2,
        };

        Self {
            state: ParseState::Data,
            args: [0; MAX_ARGS],
            arg_count: 0,
            palette,
            current_color: 0,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            declared_width: 0,
            declared_height: 0,
            pixels: Vec::new(),
            stride: 0,
            rows: 0,
            max_dimension: limits.max_image_dimension.max(1),
            max_pixels: (limits.max_image_pixels as u64).max(1),
            transparent: p2 == 1,
            aspect: (vertical, 1),
            clipped: false,
        }
    }

    /// Pixel aspect ratio (numerator, denominator)
    pub fn aspect(&self) -> (u32, u32) {
        self.aspect
    }

    /// Whether unpainted pixels stay transparent
    pub fn transparent_background(&self) -> bool {
        self.transparent
    }

    /// Current color register contents
    pub fn color(&self, index: usize) -> Option<Rgb> {
        self.palette.get(index).copied()
    }

    /// Feed one character of the DCS body
    pub fn put(&mut self, c: char) {
        match self.state {
            ParseState::Data => self.put_data(c),
            ParseState::Repeat => match c {
                '0'..='9' => self.push_digit(c),
                '?'..='~' => {
                    let count = self.args[0].max(1);
                    self.state = ParseState::Data;
                    self.draw(c as u8 - b'?', count);
                }
                _ => {
                    self.state = ParseState::Data;
                    self.put_data(c);
                }
            },
            ParseState::Color | ParseState::Raster => match c {
                '0'..='9' => self.push_digit(c),
                ';' => {
                    if self.arg_count < MAX_ARGS {
                        self.arg_count += 1;
                    }
                }
                _ => {
                    self.end_arguments();
                    self.put_data(c);
                }
            },
        }
    }

    fn start_arguments(&mut self, state: ParseState) {
        self.state = state;
        self.args = [0; MAX_ARGS];
        self.arg_count = 0;
    }

    fn push_digit(&mut self, c: char) {
        let digit = c as u32 - '0' as u32;
        if let Some(arg) = self.args.get_mut(self.arg_count) {
            *arg = arg.saturating_mul(10).saturating_add(digit);
        }
    }

    /// A non-argument character ended `#...` or `"...`
    fn end_arguments(&mut self) {
        let state = self.state;
        self.state = ParseState::Data;
        let args = self.args;
        match state {
            ParseState::Color if self.arg_count == 0 => {
                self.current_color = args[0] as usize % self.palette.len();
            }
            ParseState::Color => self.define_color(args),
            ParseState::Raster => self.set_raster(args),
            _ => {}
        }
    }

    fn put_data(&mut self, c: char) {
        match c {
            '?'..='~' => self.draw(c as u8 - b'?', 1),
            '!' => self.start_arguments(ParseState::Repeat),
            '#' => self.start_arguments(ParseState::Color),
            '"' => self.start_arguments(ParseState::Raster),
            '$' => self.x = 0,
            '-' => {
                self.x = 0;
                self.y = self.y.saturating_add(6);
            }
            _ => trace!(?c, "ignoring sixel character"),
        }
    }

    /// `#Pc;Pu;Px;Py;Pz`
    fn define_color(&mut self, args: [u32; MAX_ARGS]) {
        let index = args[0] as usize % self.palette.len();
        let color = match args[1] {
            1 => hls_to_rgb(args[2], args[3].min(100), args[4].min(100)),
            2 => Rgb::new(percent(args[2]), percent(args[3]), percent(args[4])),
            system => {
                debug!(system, "unknown sixel color system");
                return;
            }
        };
        self.palette[index] = color;
        self.current_color = index;
    }

    /// `"Pan;Pad;Ph;Pv`
    fn set_raster(&mut self, args: [u32; MAX_ARGS]) {
        if args[0] > 0 && args[1] > 0 {
            self.aspect = (args[0], args[1]);
        }
        let width = args[2].min(self.max_dimension);
        let height = args[3].min(self.max_dimension);
        if args[2] > self.max_dimension || args[3] > self.max_dimension {
            self.note_clipped();
        }
        if width > 0 && height > 0 {
            self.declared_width = width;
            self.declared_height = height;
        }
    }

    fn draw(&mut self, bits: u8, count: u32) {
        if bits == 0 {
            self.x = self.x.saturating_add(count);
            return;
        }

        let mut end_x = self.x.saturating_add(count).min(self.max_dimension);
        let mut end_y = self.y.saturating_add(6).min(self.max_dimension);
        if end_x < self.x.saturating_add(count) || end_y < self.y.saturating_add(6) {
            self.note_clipped();
        }
        if end_x > self.x && end_y > self.y {
            // the pixel budget may leave the buffer smaller than asked for
            self.reserve(end_x, end_y);
            end_x = end_x.min(self.stride);
            end_y = end_y.min(self.rows);
        }
        if end_x > self.x && end_y > self.y {
            let color = self.palette[self.current_color];
            for bit in 0..6u32 {
                let py = self.y + bit;
                if bits & (1 << bit) == 0 || py >= end_y {
                    continue;
                }
                for px in self.x..end_x {
                    self.set_pixel(px, py, color);
                }
                self.height = self.height.max(py + 1);
            }
            self.width = self.width.max(end_x);
        }
        self.x = self.x.saturating_add(count);
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        let idx = (y as usize * self.stride as usize + x as usize) * 4;
        if let Some(px) = self.pixels.get_mut(idx..idx + 4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// Grow the buffer towards `width` x `height`, doubling to amortize
    ///
    /// Never exceeds the pixel budget: the request is cut down to fit it, so
    /// callers must clip against `stride` and `rows` afterwards.
    fn reserve(&mut self, width: u32, height: u32) {
        if width <= self.stride && height <= self.rows {
            return;
        }
        let mut width = width.max(self.stride);
        let mut height = height.max(self.rows);
        if area(width, height) > self.max_pixels {
            self.note_clipped();
            // stride * rows is within budget, so both stay at least as large
            width = width
                .min(budget_along(self.max_pixels, self.rows))
                .max(self.stride);
            height = height
                .min(budget_along(self.max_pixels, width))
                .max(self.rows);
            if width <= self.stride && height <= self.rows {
                return;
            }
        }

        let mut new_stride = if width > self.stride {
            width.max(self.stride.saturating_mul(2)).min(self.max_dimension)
        } else {
            self.stride
        };
        let mut new_rows = if height > self.rows {
            height.max(self.rows.saturating_mul(2)).min(self.max_dimension)
        } else {
            self.rows
        };
        if area(new_stride, new_rows) > self.max_pixels {
            new_stride = width;
            new_rows = height;
        }

        let fill = if self.transparent {
            [0u8; 4]
        } else {
            let bg = self.palette[0];
            [bg.r, bg.g, bg.b, 255]
        };
        let row_bytes = new_stride as usize * 4;
        let mut pixels = fill.repeat(new_stride as usize * new_rows as usize);
        let old_row_bytes = self.stride as usize * 4;
        for row in 0..self.rows as usize {
            let src = &self.pixels[row * old_row_bytes..(row + 1) * old_row_bytes];
            pixels[row * row_bytes..row * row_bytes + old_row_bytes].copy_from_slice(src);
        }

        trace!(new_stride, new_rows, "sixel buffer grown");
        self.pixels = pixels;
        self.stride = new_stride;
        self.rows = new_rows;
    }

    fn note_clipped(&mut self) {
        if !self.clipped {
            self.clipped = true;
            debug!(
                max_dimension = self.max_dimension,
                max_pixels = self.max_pixels,
                "sixel image clipped"
            );
        }
    }

    /// Bytes held by the pixel buffer
    pub fn buffer_len(&self) -> usize {
        self.pixels.len()
    }

    /// Finish decoding; `None` when nothing was painted or declared
    pub fn finish(mut self) -> Option<Image> {
        if self.state != ParseState::Data {
            self.end_arguments();
        }
        let width = self.width.max(self.declared_width);
        let height = self.height.max(self.declared_height);
        if width == 0 || height == 0 {
            return None;
        }
        self.reserve(width, height);
        let width = width.min(self.stride);
        let height = height.min(self.rows);
        if width == 0 || height == 0 {
            return None;
        }

        let row_bytes = width as usize * 4;
        let stride_bytes = self.stride as usize * 4;
        let mut rgba = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride_bytes;
            rgba.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Some(Image::new(width, height, rgba))
    }
}

fn area(width: u32, height: u32) -> u64 {
    width as u64 * height as u64
}

/// Longest side that fits `budget` pixels next to a side of `other`
fn budget_along(budget: u64, other: u32) -> u32 {
    (budget / other.max(1) as u64).min(u32::MAX as u64) as u32
}

fn percent(value: u32) -> u8 {
    (value.min(100) * 255 / 100) as u8
}

/// Convert a DEC HLS triple to RGB
///
/// DEC puts blue at 0 degrees and red at 120, so the hue is rotated by 240
/// degrees into the usual red-at-0 convention first.
fn hls_to_rgb(hue: u32, lightness: u32, saturation: u32) -> Rgb {
    let h = ((hue % 360 + 240) % 360) as f64;
    let l = lightness as f64 / 100.0;
    let s = saturation as f64 / 100.0;

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb::new(v, v, v);
    }

    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;

    let r = hue_to_channel(m1, m2, h + 120.0);
    let g = hue_to_channel(m1, m2, h);
    let b = hue_to_channel(m1, m2, h - 120.0);

    Rgb::new(
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

fn hue_to_channel(m1: f64, m2: f64, mut h: f64) -> f64 {
    if h < 0.0 {
        h += 360.0;
    }
    if h >= 360.0 {
        h -= 360.0;
    }

    if h < 60.0 {
        m1 + (m2 - m1) * h / 60.0
    } else if h < 180.0 {
        m2
    } else if h < 240.0 {
        m1 + (m2 - m1) * (240.0 - h) / 60.0
    } else {
        m1
    }
}
