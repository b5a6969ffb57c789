//! Decoded RGBA bitmaps

use std::io::Cursor;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{Error, Result};

/// An RGBA bitmap, 4 bytes per pixel, row major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Build from packed RGBA, checking the buffer matches the geometry
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = pixel_bytes(width, height, 4)?;
        if rgba.len() < expected {
            return Err(Error::Graphics(format!(
                "{}x{} RGBA needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        let mut rgba = rgba;
        rgba.truncate(expected);
        Ok(Self::new(width, height, rgba))
    }

    /// Build from packed RGB, adding an opaque alpha channel
    pub fn from_rgb(width: u32, height: u32, rgb: &[u8]) -> Result<Self> {
        let expected = pixel_bytes(width, height, 3)?;
        if rgb.len() < expected {
            return Err(Error::Graphics(format!(
                "{}x{} RGB needs {} bytes, got {}",
                width,
                height,
                expected,
                rgb.len()
            )));
        }
        let mut rgba = Vec::with_capacity(expected / 3 * 4);
        for px in rgb[..expected].chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        Ok(Self::new(width, height, rgba))
    }

    /// Decode a PNG file
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let decoded = ::image::load(Cursor::new(data), ::image::ImageFormat::Png)?.into_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self::new(width, height, decoded.into_raw()))
    }

    /// RGBA value at (x, y); transparent black outside the image
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 4;
        match self.rgba.get(idx..idx + 4) {
            Some(px) => [px[0], px[1], px[2], px[3]],
            None => [0; 4],
        }
    }
}

fn pixel_bytes(width: u32, height: u32, channels: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| Error::Graphics(format!("{width}x{height} image is too large")))
}

// Pixel data stays out of dumps; geometry is what the host wants to see.
impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Image", 2)?;
        state.serialize_field("width", &self.width)?;
        state.serialize_field("height", &self.height)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_adds_alpha() {
        let image = Image::from_rgb(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(image.rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(image.pixel(1, 0), [4, 5, 6, 255]);
        assert_eq!(image.pixel(2, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_from_rgba_short_buffer() {
        assert!(Image::from_rgba(2, 2, vec![0; 15]).is_err());
        assert!(Image::from_rgba(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_png_roundtrip() {
        let mut png = Vec::new();
        let buffer = ::image::RgbaImage::from_raw(1, 1, vec![10, 20, 30, 255]).unwrap();
        buffer
            .write_to(&mut Cursor::new(&mut png), ::image::ImageFormat::Png)
            .unwrap();
        let decoded = Image::from_png(&png).unwrap();
        assert_eq!((decoded.width, decoded.height), (1, 1));
        assert_eq!(decoded.pixel(0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn test_serialize_geometry_only() {
        let image = Image::new(3, 2, vec![0; 24]);
        let json = serde_json::to_string(&image).unwrap();
        assert_eq!(json, r#"{"width":3,"height":2}"#);
    }
}
