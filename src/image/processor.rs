use super::{Bounds, ImageArtifact, ImageService};
use crate::{Error, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{
    DynamicImage, ExtendedColorType, GenericImageView, ImageEncoder, ImageError, ImageReader,
    Limits, Rgb, RgbImage,
};
use std::io::{Cursor, Read};
use tracing::debug;

/// Fixed JPEG quality for every normalized image.
pub const JPEG_QUALITY: u8 = 85;

pub const JPEG_MIME: &str = "image/jpeg";

// Decoder limits: a few-KB file declaring a 100k x 100k canvas must fail
// as a decode error instead of allocating gigabytes.
const MAX_DECODE_DIMENSION: u32 = 16_384;
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

/// Decode, flatten, fit into `bounds` and re-encode as JPEG.
///
/// The format is sniffed from the bytes, never taken from a filename. The
/// output is deterministic for identical input and bounds.
pub fn normalize_image(image_data: &[u8], bounds: Bounds) -> Result<ImageArtifact> {
    let decoded = decode(image_data)?;
    let (source_width, source_height) = decoded.dimensions();
    let had_alpha = decoded.color().has_alpha();

    let flattened = flatten_onto_white(decoded);
    let (width, height) = bounds.fit(source_width, source_height);
    let resized = if (width, height) == (source_width, source_height) {
        flattened
    } else {
        image::imageops::resize(&flattened, width, height, FilterType::Lanczos3)
    };

    let payload = encode_jpeg(&resized)?;
    debug!(
        "Normalized image {}x{} -> {}x{} (alpha flattened: {}, {} bytes)",
        source_width,
        source_height,
        width,
        height,
        had_alpha,
        payload.len()
    );

    Ok(ImageArtifact::from_parts(payload, JPEG_MIME, width, height))
}

/// Like [`normalize_image`], reading the upload from a stream.
///
/// At most `max_bytes` are accepted; longer streams are rejected before any
/// decoding happens.
pub fn normalize_reader<R: Read>(reader: R, bounds: Bounds, max_bytes: u64) -> Result<ImageArtifact> {
    let mut data = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut data)?;

    if data.len() as u64 > max_bytes {
        return Err(Error::UploadRejected(format!(
            "File too large. Maximum size is {} bytes",
            max_bytes
        )));
    }

    normalize_image(&data, bounds)
}

fn decode(image_data: &[u8]) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(image_data))
        .with_guessed_format()
        .map_err(|e| Error::Decode(ImageError::IoError(e)))?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_DECODE_DIMENSION);
    limits.max_image_height = Some(MAX_DECODE_DIMENSION);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    reader.limits(limits);

    reader.decode().map_err(Error::Decode)
}

/// Convert to 8-bit RGB, compositing any transparency onto white.
fn flatten_onto_white(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([blend(r, a), blend(g, a), blend(b, a)])
    })
}

fn blend(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (u32::from(channel), u32::from(alpha));
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>> {
    let mut payload = Vec::new();
    JpegEncoder::new_with_quality(&mut payload, JPEG_QUALITY)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(Error::Encode)?;
    Ok(payload)
}

/// [`ImageService`] backed by [`normalize_image`] on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn process_image(&self, image_data: &[u8], bounds: Bounds) -> Result<ImageArtifact> {
        let data = image_data.to_vec();
        tokio::task::spawn_blocking(move || normalize_image(&data, bounds))
            .await
            .map_err(|e| Error::Invariant(format!("Image processing task join error: {}", e)))?
    }
}
