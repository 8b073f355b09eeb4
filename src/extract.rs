use std::io::Cursor;

use anyhow::Context as _;
use image::AnimationDecoder as _;
use image::codecs::gif::GifDecoder;

use crate::error::{FlipbookError, FlipbookResult};

/// Hard cap on extracted frames, bounding output document size.
pub const MAX_EXTRACT_FRAMES: usize = 15;

/// Floor for per-frame display time. GIF delays are centisecond-based and
/// frequently 0; anything shorter than this is not visible in a viewer.
pub const MIN_FRAME_DELAY_MS: u32 = 100;

/// Delay assigned to the single frame of a static fallback.
pub const STATIC_FRAME_DELAY_MS: u32 = 1000;

/// One decoded animation frame. Always opaque: transparency is composited
/// onto white at extraction because the output page has no alpha channel.
#[derive(Clone, Debug)]
pub struct Frame {
    /// RGBA8, row-major, tightly packed, alpha always 255.
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub delay_ms: u32,
}

/// Non-empty ordered frame sequence. Replaced wholesale on each new upload.
#[derive(Clone, Debug)]
pub struct FrameSet {
    frames: Vec<Frame>,
}

impl FrameSet {
    pub fn new(frames: Vec<Frame>) -> FlipbookResult<Self> {
        if frames.is_empty() {
            return Err(FlipbookError::decode("frame set must not be empty"));
        }
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn first(&self) -> &Frame {
        &self.frames[0]
    }
}

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Capability flag: whether an animated decoder is available. When false
    /// every input takes the single-frame static path.
    pub animated: bool,
    pub max_frames: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            animated: true,
            max_frames: MAX_EXTRACT_FRAMES,
        }
    }
}

/// Decode image bytes into a non-empty [`FrameSet`].
///
/// Multi-frame extraction is attempted first when the capability flag is set;
/// anything short of 2 surviving frames degrades silently to the static path.
/// Unreadable bytes are the only outright failure.
pub fn extract_frames(bytes: &[u8], opts: &ExtractOptions) -> FlipbookResult<FrameSet> {
    if opts.animated {
        match extract_animated(bytes, opts.max_frames) {
            Ok(frames) if frames.len() >= 2 => {
                tracing::debug!(frames = frames.len(), "extracted animated frames");
                return FrameSet::new(frames);
            }
            Ok(frames) => {
                tracing::debug!(
                    frames = frames.len(),
                    "fewer than 2 usable frames, falling back to static"
                );
            }
            Err(err) => {
                tracing::debug!(%err, "animated decode failed, falling back to static");
            }
        }
    }
    extract_static(bytes)
}

fn extract_animated(bytes: &[u8], max_frames: usize) -> FlipbookResult<Vec<Frame>> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).context("open gif decoder")?;
    let mut out = Vec::new();

    for frame in decoder.into_frames() {
        if out.len() >= max_frames {
            break;
        }
        // A frame that fails to decode is skipped, not fatal.
        let frame = match frame {
            Ok(f) => f,
            Err(err) => {
                tracing::debug!(%err, "skipping undecodable frame");
                continue;
            }
        };

        let (numer_ms, denom) = frame.delay().numer_denom_ms();
        let raw_ms = if denom == 0 {
            MIN_FRAME_DELAY_MS
        } else {
            (f64::from(numer_ms) / f64::from(denom)).round() as u32
        };

        let buffer = frame.into_buffer();
        let (width, height) = buffer.dimensions();
        out.push(Frame {
            rgba: composite_on_white(buffer.into_raw()),
            width,
            height,
            delay_ms: raw_ms.max(MIN_FRAME_DELAY_MS),
        });
    }

    Ok(out)
}

fn extract_static(bytes: &[u8]) -> FlipbookResult<FrameSet> {
    let img = image::load_from_memory(bytes)
        .context("decode static image")
        .map_err(|e| FlipbookError::decode(format!("{e:#}")))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    FrameSet::new(vec![Frame {
        rgba: composite_on_white(rgba.into_raw()),
        width,
        height,
        delay_ms: STATIC_FRAME_DELAY_MS,
    }])
}

fn composite_on_white(mut rgba: Vec<u8>) -> Vec<u8> {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        px[0] = ((u16::from(px[0]) * a + 255 * (255 - a) + 127) / 255) as u8;
        px[1] = ((u16::from(px[1]) * a + 255 * (255 - a) + 127) / 255) as u8;
        px[2] = ((u16::from(px[2]) * a + 255 * (255 - a) + 127) / 255) as u8;
        px[3] = 255;
    }
    rgba
}
