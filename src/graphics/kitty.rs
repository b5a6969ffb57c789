//! Kitty graphics protocol
//!
//! Commands arrive as `APC G <key=value,...> ; <base64 payload> ST`.
//! [`parse_command`] splits one APC string into a [`KittyCommand`];
//! [`KittyGraphics`] runs commands against the image cache, joining chunked
//! uploads (`m=1`) and producing the reply the client expects.

use std::io::Read;
use std::sync::Arc;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use flate2::read::ZlibDecoder;
use tracing::{debug, warn};

use super::cache::GraphicsCache;
use super::image::Image;
use crate::config::Limits;
use crate::error::{Error, Result};

/// Chunks may or may not carry `=` padding
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KittyAction {
    /// `a=t`
    Transmit,
    /// `a=T`
    TransmitAndDisplay,
    /// `a=p`
    Display,
    /// `a=d`
    Delete,
    /// `a=q`
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KittyFormat {
    /// `f=24`
    Rgb,
    /// `f=32`
    Rgba,
    /// `f=100`
    Png,
}

/// Where and how big to show an image, in cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Placement {
    pub placement_id: u32,
    pub columns: u32,
    pub rows: u32,
    pub z_index: i32,
    /// `C=1` leaves the cursor where it is
    pub move_cursor: bool,
}

/// What `a=d` removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    /// `d=a` / `d=A`
    All { free: bool },
    /// `d=i` / `d=I`
    ById { id: u32, free: bool },
    /// Any other selector; placement-level deletes we do not track
    Unsupported(char),
}

/// One parsed APC G command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KittyCommand {
    pub action: KittyAction,
    /// `q=1` suppresses OK replies, `q=2` suppresses errors too
    pub quiet: u8,
    pub image_id: Option<u32>,
    pub format: KittyFormat,
    pub width: u32,
    pub height: u32,
    pub zlib: bool,
    /// `m=1`: more chunks follow
    pub more: bool,
    pub placement: Placement,
    pub delete: DeleteTarget,
    /// Still base64 encoded
    pub payload: String,
}

/// Parse an APC string; `None` unless it is a graphics command
pub fn parse_command(apc: &str) -> Option<KittyCommand> {
    let rest = apc.strip_prefix('G')?;
    let (control, payload) = match rest.find(';') {
        Some(sep) => (&rest[..sep], &rest[sep + 1..]),
        None => (rest, ""),
    };

    let mut command = KittyCommand {
        action: KittyAction::Transmit,
        quiet: 0,
        image_id: None,
        format: KittyFormat::Rgba,
        width: 0,
        height: 0,
        zlib: false,
        more: false,
        placement: Placement {
            move_cursor: true,
            ..Placement::default()
        },
        delete: DeleteTarget::All { free: false },
        payload: payload.to_string(),
    };

    for pair in control.split(',') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let number = || value.parse::<u32>().ok();
        match key {
            "a" => {
                command.action = match value {
                    "t" => KittyAction::Transmit,
                    "T" => KittyAction::TransmitAndDisplay,
                    "p" => KittyAction::Display,
                    "d" => KittyAction::Delete,
                    "q" => KittyAction::Query,
                    other => {
                        debug!(action = other, "unknown kitty graphics action");
                        return None;
                    }
                }
            }
            "q" => command.quiet = number().unwrap_or(0).min(2) as u8,
            "i" => command.image_id = number().filter(|&id| id != 0),
            "f" => {
                command.format = match number() {
                    Some(24) => KittyFormat::Rgb,
                    Some(100) => KittyFormat::Png,
                    _ => KittyFormat::Rgba,
                }
            }
            "s" => command.width = number().unwrap_or(0),
            "v" => command.height = number().unwrap_or(0),
            "o" => command.zlib = value == "z",
            "m" => command.more = number() == Some(1),
            "p" => command.placement.placement_id = number().unwrap_or(0),
            "c" => command.placement.columns = number().unwrap_or(0),
            "r" => command.placement.rows = number().unwrap_or(0),
            "z" => command.placement.z_index = value.parse().unwrap_or(0),
            "C" => command.placement.move_cursor = number() != Some(1),
            "d" => {
                let selector = value.chars().next().unwrap_or('a');
                command.delete = match selector {
                    'a' | 'A' => DeleteTarget::All {
                        free: selector == 'A',
                    },
                    'i' | 'I' => DeleteTarget::ById {
                        id: 0,
                        free: selector == 'I',
                    },
                    other => DeleteTarget::Unsupported(other),
                };
            }
            _ => {}
        }
    }

    if let DeleteTarget::ById { ref mut id, .. } = command.delete {
        *id = command.image_id.unwrap_or(0);
    }

    Some(command)
}

/// Side effect of a graphics command on the display
#[derive(Debug, Clone, PartialEq)]
pub enum KittyEffect {
    /// Show `image` at the cursor
    Place {
        id: u32,
        image: Arc<Image>,
        placement: Placement,
    },
    /// Remove placements of `id`, or all placements
    Delete { id: Option<u32> },
}

/// Result of running one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KittyOutcome {
    /// Bytes to send back to the client
    pub reply: Option<String>,
    pub effect: Option<KittyEffect>,
}

#[derive(Debug)]
struct Upload {
    command: KittyCommand,
    data: Vec<u8>,
}

/// Per-terminal kitty graphics state
#[derive(Debug)]
pub struct KittyGraphics {
    upload: Option<Upload>,
    max_upload: usize,
    max_dimension: u32,
}

impl KittyGraphics {
    pub fn new(limits: &Limits) -> Self {
        Self {
            upload: None,
            max_upload: limits.max_graphics_upload,
            max_dimension: limits.max_image_dimension,
        }
    }

    /// Whether a chunked upload is in progress
    pub fn uploading(&self) -> bool {
        self.upload.is_some()
    }

    /// Drop any partial upload
    pub fn reset(&mut self) {
        self.upload = None;
    }

    /// Run one command
    pub fn handle(&mut self, command: KittyCommand, cache: &mut GraphicsCache) -> KittyOutcome {
        // continuation chunks only carry m= and the payload
        if let Some(mut upload) = self.upload.take() {
            if let Err(err) = self.append(&mut upload.data, &command.payload) {
                return reply(&upload.command, Err(err));
            }
            if command.more {
                self.upload = Some(upload);
                return KittyOutcome::default();
            }
            return self.complete(upload.command, upload.data, cache);
        }

        match command.action {
            KittyAction::Transmit | KittyAction::TransmitAndDisplay | KittyAction::Query => {
                let mut data = Vec::new();
                if let Err(err) = self.append(&mut data, &command.payload) {
                    return reply(&command, Err(err));
                }
                if command.more {
                    self.upload = Some(Upload { command, data });
                    return KittyOutcome::default();
                }
                self.complete(command, data, cache)
            }
            KittyAction::Display => {
                let id = command.image_id.unwrap_or(0);
                match cache.get(id) {
                    Some(image) => {
                        let mut outcome = reply(&command, Ok(()));
                        outcome.effect = Some(KittyEffect::Place {
                            id,
                            image,
                            placement: command.placement,
                        });
                        outcome
                    }
                    None => reply(&command, Err(not_found(id))),
                }
            }
            KittyAction::Delete => {
                let effect = match command.delete {
                    DeleteTarget::All { free } => {
                        if free {
                            cache.clear();
                        }
                        Some(KittyEffect::Delete { id: None })
                    }
                    DeleteTarget::ById { id, free } => {
                        if free {
                            cache.remove(id);
                        }
                        Some(KittyEffect::Delete { id: Some(id) })
                    }
                    DeleteTarget::Unsupported(selector) => {
                        debug!(?selector, "unsupported kitty delete selector");
                        None
                    }
                };
                KittyOutcome {
                    reply: None,
                    effect,
                }
            }
        }
    }

    fn append(&self, data: &mut Vec<u8>, payload: &str) -> Result<()> {
        let decoded = PAYLOAD_ENGINE.decode(payload.trim_end())?;
        if data.len() + decoded.len() > self.max_upload {
            warn!(limit = self.max_upload, "kitty upload too large");
            return Err(Error::Graphics("upload exceeds size limit".into()));
        }
        data.extend_from_slice(&decoded);
        Ok(())
    }

    fn complete(
        &mut self,
        command: KittyCommand,
        data: Vec<u8>,
        cache: &mut GraphicsCache,
    ) -> KittyOutcome {
        let image = match self.decode(&command, data) {
            Ok(image) => Arc::new(image),
            Err(err) => {
                debug!(%err, "kitty image rejected");
                return reply(&command, Err(err));
            }
        };

        if command.action == KittyAction::Query {
            return reply(&command, Ok(()));
        }

        let id = command.image_id.unwrap_or_else(|| cache.free_id());
        cache.put(id, image.clone());
        let mut outcome = reply(&command, Ok(()));
        if command.action == KittyAction::TransmitAndDisplay {
            outcome.effect = Some(KittyEffect::Place {
                id,
                image,
                placement: command.placement,
            });
        }
        outcome
    }

    fn decode(&self, command: &KittyCommand, data: Vec<u8>) -> Result<Image> {
        let data = if command.zlib {
            let mut inflated = Vec::new();
            ZlibDecoder::new(data.as_slice())
                .take(self.max_upload as u64 + 1)
                .read_to_end(&mut inflated)?;
            if inflated.len() > self.max_upload {
                return Err(Error::Graphics("inflated payload exceeds size limit".into()));
            }
            inflated
        } else {
            data
        };

        let image = match command.format {
            KittyFormat::Png => Image::from_png(&data)?,
            KittyFormat::Rgb => Image::from_rgb(command.width, command.height, &data)?,
            KittyFormat::Rgba => Image::from_rgba(command.width, command.height, data)?,
        };
        if image.width == 0
            || image.height == 0
            || image.width > self.max_dimension
            || image.height > self.max_dimension
        {
            return Err(Error::Graphics(format!(
                "image size {}x{} out of range",
                image.width, image.height
            )));
        }
        Ok(image)
    }
}

fn not_found(id: u32) -> Error {
    Error::Graphics(format!("ENOENT:image {id} not found"))
}

/// Build the reply for `command`, honoring its quiet level
fn reply(command: &KittyCommand, result: Result<()>) -> KittyOutcome {
    let Some(id) = command.image_id else {
        return KittyOutcome::default();
    };
    let text = match result {
        Ok(()) if command.quiet >= 1 => return KittyOutcome::default(),
        Ok(()) => "OK".to_string(),
        Err(_) if command.quiet >= 2 => return KittyOutcome::default(),
        Err(Error::Graphics(msg)) if msg.starts_with("ENOENT:") => msg,
        Err(err) => format!("EINVAL:{err}"),
    };
    KittyOutcome {
        reply: Some(format!("\x1b_Gi={id};{text}\x1b\\")),
        effect: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(graphics: &mut KittyGraphics, cache: &mut GraphicsCache, apc: &str) -> KittyOutcome {
        let command = parse_command(apc).expect("graphics command");
        graphics.handle(command, cache)
    }

    fn setup() -> (KittyGraphics, GraphicsCache) {
        (KittyGraphics::new(&Limits::default()), GraphicsCache::new())
    }

    #[test]
    fn test_parse_transmit() {
        let command = parse_command("Ga=t,f=24,s=2,v=1,i=9,q=1;AAAA").unwrap();
        assert_eq!(command.action, KittyAction::Transmit);
        assert_eq!(command.format, KittyFormat::Rgb);
        assert_eq!((command.width, command.height), (2, 1));
        assert_eq!(command.image_id, Some(9));
        assert_eq!(command.quiet, 1);
        assert_eq!(command.payload, "AAAA");
    }

    #[test]
    fn test_parse_not_graphics() {
        assert!(parse_command("Xsomething").is_none());
        assert!(parse_command("Ga=Z").is_none());
    }

    #[test]
    fn test_parse_delete() {
        let command = parse_command("Ga=d,d=I,i=42").unwrap();
        assert_eq!(command.delete, DeleteTarget::ById { id: 42, free: true });
    }

    #[test]
    fn test_transmit_rgb_reply() {
        let (mut graphics, mut cache) = setup();
        // two pixels, 6 bytes
        let payload = PAYLOAD_ENGINE.encode([255, 0, 0, 0, 255, 0]);
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=t,f=24,s=2,v=1,i=3;{payload}"),
        );
        assert_eq!(out.reply.as_deref(), Some("\x1b_Gi=3;OK\x1b\\"));
        assert!(out.effect.is_none());
        let image = cache.get(3).unwrap();
        assert_eq!(image.pixel(1, 0), [0, 255, 0, 255]);
    }

    #[test]
    fn test_transmit_and_display() {
        let (mut graphics, mut cache) = setup();
        let payload = PAYLOAD_ENGINE.encode([1, 2, 3, 4]);
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=T,f=32,s=1,v=1,i=5,c=4,r=2,q=1;{payload}"),
        );
        assert!(out.reply.is_none());
        match out.effect {
            Some(KittyEffect::Place { id, placement, .. }) => {
                assert_eq!(id, 5);
                assert_eq!((placement.columns, placement.rows), (4, 2));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_chunked_upload() {
        let (mut graphics, mut cache) = setup();
        let first = PAYLOAD_ENGINE.encode([9, 9, 9]);
        let second = PAYLOAD_ENGINE.encode([7, 7, 7]);
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=t,f=24,s=2,v=1,i=1,m=1;{first}"),
        );
        assert_eq!(out, KittyOutcome::default());
        assert!(graphics.uploading());
        let out = run(&mut graphics, &mut cache, &format!("Gm=0;{second}"));
        assert_eq!(out.reply.as_deref(), Some("\x1b_Gi=1;OK\x1b\\"));
        assert_eq!(cache.get(1).unwrap().pixel(1, 0), [7, 7, 7, 255]);
    }

    #[test]
    fn test_zlib_payload() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let (mut graphics, mut cache) = setup();
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[10, 20, 30, 40]).unwrap();
        let payload = PAYLOAD_ENGINE.encode(encoder.finish().unwrap());
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=t,f=32,o=z,s=1,v=1,i=2;{payload}"),
        );
        assert_eq!(out.reply.as_deref(), Some("\x1b_Gi=2;OK\x1b\\"));
        assert_eq!(cache.get(2).unwrap().pixel(0, 0), [10, 20, 30, 40]);
    }

    #[test]
    fn test_display_missing_image() {
        let (mut graphics, mut cache) = setup();
        let out = run(&mut graphics, &mut cache, "Ga=p,i=77");
        assert_eq!(
            out.reply.as_deref(),
            Some("\x1b_Gi=77;ENOENT:image 77 not found\x1b\\")
        );
        let out = run(&mut graphics, &mut cache, "Ga=p,i=77,q=2");
        assert!(out.reply.is_none());
    }

    #[test]
    fn test_short_data_rejected() {
        let (mut graphics, mut cache) = setup();
        let payload = PAYLOAD_ENGINE.encode([1, 2, 3]);
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=t,f=32,s=1,v=1,i=4;{payload}"),
        );
        assert!(out.reply.unwrap().starts_with("\x1b_Gi=4;EINVAL:"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_query_does_not_store() {
        let (mut graphics, mut cache) = setup();
        let payload = PAYLOAD_ENGINE.encode([0, 0, 0, 0]);
        let out = run(
            &mut graphics,
            &mut cache,
            &format!("Ga=q,f=32,s=1,v=1,i=31;{payload}"),
        );
        assert_eq!(out.reply.as_deref(), Some("\x1b_Gi=31;OK\x1b\\"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_auto_id() {
        let (mut graphics, mut cache) = setup();
        let payload = PAYLOAD_ENGINE.encode([0, 0, 0, 0]);
        let out = run(&mut graphics, &mut cache, &format!("Ga=t,s=1,v=1;{payload}"));
        assert!(out.reply.is_none());
        assert!(cache.contains(0));
    }

    #[test]
    fn test_delete_frees() {
        let (mut graphics, mut cache) = setup();
        cache.put(6, Arc::new(Image::new(1, 1, vec![0; 4])));
        let out = run(&mut graphics, &mut cache, "Ga=d,d=i,i=6");
        assert_eq!(out.effect, Some(KittyEffect::Delete { id: Some(6) }));
        assert!(cache.contains(6));
        run(&mut graphics, &mut cache, "Ga=d,d=I,i=6");
        assert!(!cache.contains(6));
    }
}
