//! Image normalization
//!
//! Decodes uploaded images, flattens transparency, fits them into a bounding
//! box and re-encodes them as JPEG so every stored image has one format.

pub mod mime;
pub mod mock;
pub mod processor;
pub mod validation;

pub use mime::detect_image_mime;
pub use mock::MockImageProcessor;
pub use processor::{normalize_image, normalize_reader, ImageProcessor, JPEG_MIME, JPEG_QUALITY};
pub use validation::{Upload, UploadValidator, DEFAULT_MAX_UPLOAD_BYTES};

use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Maximum width and height an output image may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    max_width: u32,
    max_height: u32,
}

impl Bounds {
    /// Profile pictures.
    pub const AVATAR: Bounds = Bounds {
        max_width: 400,
        max_height: 400,
    };

    /// Exercise media and progress photos.
    pub const CONTENT: Bounds = Bounds {
        max_width: 800,
        max_height: 800,
    };

    /// Blog post images.
    pub const BLOG: Bounds = Bounds {
        max_width: 1200,
        max_height: 1200,
    };

    pub fn new(max_width: u32, max_height: u32) -> Result<Self> {
        if max_width == 0 || max_height == 0 {
            return Err(Error::Config(format!(
                "Image bounds must be positive, got {}x{}",
                max_width, max_height
            )));
        }
        Ok(Self {
            max_width,
            max_height,
        })
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Largest size that fits inside the box with the same aspect ratio.
    ///
    /// Sources already inside the box keep their size (no upscaling). The
    /// scaled side is rounded to the nearest pixel and never drops below 1.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width && height <= self.max_height {
            return (width, height);
        }

        let (w, h) = (u64::from(width), u64::from(height));
        let (max_w, max_h) = (u64::from(self.max_width), u64::from(self.max_height));

        if w * max_h >= h * max_w {
            let scaled_h = (h * max_w + w / 2) / w;
            (self.max_width, scaled_h.max(1) as u32)
        } else {
            let scaled_w = (w * max_h + h / 2) / h;
            (scaled_w.max(1) as u32, self.max_height)
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.max_width, self.max_height)
    }
}

impl FromStr for Bounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Config(format!("Invalid bounds '{}'. Expected WIDTHxHEIGHT", s));
        let (width, height) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(invalid)?;
        let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
        let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(width, height)
    }
}

/// A normalized, storage-ready image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    payload: Vec<u8>,
    media_type: String,
    width: u32,
    height: u32,
}

impl ImageArtifact {
    pub(crate) fn from_parts(payload: Vec<u8>, media_type: &str, width: u32, height: u32) -> Self {
        Self {
            payload,
            media_type: media_type.to_string(),
            width,
            height,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

#[async_trait]
pub trait ImageService: Send + Sync {
    async fn process_image(&self, image_data: &[u8], bounds: Bounds) -> Result<ImageArtifact>;
}
