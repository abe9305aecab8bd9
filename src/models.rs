//! Data models and configuration
//!
//! Defines the media sum type handed back to callers, the document form they
//! persist, the named upload slots, and the environment-driven configuration.

use crate::image::{Bounds, ImageArtifact, DEFAULT_MAX_UPLOAD_BYTES, JPEG_MIME};
use crate::video::{VideoProvider, VideoReference};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The media attached to a record: one image, one video, or nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Media {
    Image(ImageArtifact),
    Video(VideoReference),
    #[default]
    None,
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Image(_) => MediaKind::Image,
            Media::Video(_) => MediaKind::Video,
            Media::None => MediaKind::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Media::None)
    }

    pub fn as_image(&self) -> Option<&ImageArtifact> {
        match self {
            Media::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_video(&self) -> Option<&VideoReference> {
        match self {
            Media::Video(video) => Some(video),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    None,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::None => write!(f, "none"),
        }
    }
}

/// Document form of [`Media`], tagged by `media_type`.
///
/// Image bytes are stored as standard base64 so the record stays a plain
/// JSON/BSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum StoredMedia {
    Image {
        image_data: String,
        content_type: String,
        width: u32,
        height: u32,
    },
    Video {
        video_url: String,
        video_id: String,
        source_url: String,
    },
    None,
}

impl From<&Media> for StoredMedia {
    fn from(media: &Media) -> Self {
        use base64::Engine as _;
        match media {
            Media::Image(image) => StoredMedia::Image {
                image_data: base64::engine::general_purpose::STANDARD.encode(image.payload()),
                content_type: image.media_type().to_string(),
                width: image.width(),
                height: image.height(),
            },
            Media::Video(video) => StoredMedia::Video {
                video_url: video.embed_url().to_string(),
                video_id: video.video_id().to_string(),
                source_url: video.raw_url().to_string(),
            },
            Media::None => StoredMedia::None,
        }
    }
}

impl Media {
    /// Rebuild media from its stored document.
    ///
    /// Stored records are not trusted: the video embed URL is recomputed from
    /// `video_id` through `provider`, and image records must carry a JPEG with
    /// positive dimensions.
    pub fn from_stored(stored: StoredMedia, provider: &VideoProvider) -> Result<Self> {
        use base64::Engine as _;
        match stored {
            StoredMedia::Image {
                image_data,
                content_type,
                width,
                height,
            } => {
                if content_type != JPEG_MIME {
                    return Err(Error::InvalidStoredMedia(format!(
                        "unexpected image content type '{}'",
                        content_type
                    )));
                }
                if width == 0 || height == 0 {
                    return Err(Error::InvalidStoredMedia(format!(
                        "image dimensions must be positive, got {}x{}",
                        width, height
                    )));
                }
                let payload = base64::engine::general_purpose::STANDARD.decode(image_data)?;
                if payload.is_empty() {
                    return Err(Error::InvalidStoredMedia("image data is empty".to_string()));
                }
                Ok(Media::Image(ImageArtifact::from_parts(
                    payload, JPEG_MIME, width, height,
                )))
            }
            StoredMedia::Video {
                video_url,
                video_id,
                source_url,
            } => {
                if !provider.is_valid_id(&video_id) {
                    return Err(Error::InvalidStoredMedia(format!(
                        "'{}' is not a valid {} video id",
                        video_id,
                        provider.name()
                    )));
                }
                let embed_url = provider.embed_url(&video_id);
                if video_url != embed_url {
                    return Err(Error::InvalidStoredMedia(format!(
                        "embed URL '{}' does not match video id '{}'",
                        video_url, video_id
                    )));
                }
                Ok(Media::Video(VideoReference::from_parts(
                    source_url, video_id, embed_url,
                )))
            }
            StoredMedia::None => Ok(Media::None),
        }
    }
}

/// A call site that stores media, fixing its bounding box and allowed kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSlot {
    Avatar,
    Exercise,
    Progress,
    Blog,
}

impl MediaSlot {
    pub fn accepts(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::None | MediaKind::Image => true,
            MediaKind::Video => matches!(self, MediaSlot::Exercise | MediaSlot::Blog),
        }
    }

    /// Human-readable field name.
    pub fn label(&self) -> &'static str {
        match self {
            MediaSlot::Avatar => "profile picture",
            MediaSlot::Exercise => "exercise media",
            MediaSlot::Progress => "progress photo",
            MediaSlot::Blog => "blog media",
        }
    }
}

impl fmt::Display for MediaSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSlot::Avatar => write!(f, "avatar"),
            MediaSlot::Exercise => write!(f, "exercise"),
            MediaSlot::Progress => write!(f, "progress"),
            MediaSlot::Blog => write!(f, "blog"),
        }
    }
}

impl FromStr for MediaSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avatar" | "profile" => Ok(MediaSlot::Avatar),
            "exercise" => Ok(MediaSlot::Exercise),
            "progress" => Ok(MediaSlot::Progress),
            "blog" => Ok(MediaSlot::Blog),
            other => Err(Error::Config(format!("Unknown media slot: {}", other))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub avatar_bounds: Bounds,
    pub content_bounds: Bounds,
    pub blog_bounds: Bounds,
    pub max_upload_bytes: u64,
    pub video_provider: VideoProvider,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            avatar_bounds: Bounds::AVATAR,
            content_bounds: Bounds::CONTENT,
            blog_bounds: Bounds::BLOG,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            video_provider: VideoProvider::youtube(),
        }
    }
}

impl Config {
    /// Load `.env` (if present) and read `MEDIA_*` variables.
    ///
    /// Unset variables keep their defaults; a variable that is set but
    /// malformed is an error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bounds = |key: &str, default: Bounds| -> Result<Bounds> {
            match lookup(key) {
                Some(value) => value.parse().map_err(|_| {
                    Error::Config(format!(
                        "{} must be WIDTHxHEIGHT with positive values, got '{}'",
                        key, value
                    ))
                }),
                None => Ok(default),
            }
        };

        let max_upload_bytes = match lookup("MEDIA_MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(Error::Config(format!(
                        "MEDIA_MAX_UPLOAD_BYTES must be a positive integer, got '{}'",
                        value
                    )))
                }
            },
            None => defaults.max_upload_bytes,
        };

        let video_provider = match lookup("MEDIA_VIDEO_PROVIDER") {
            Some(name) => VideoProvider::from_name(&name)?,
            None => defaults.video_provider,
        };

        Ok(Self {
            avatar_bounds: bounds("MEDIA_AVATAR_BOUNDS", defaults.avatar_bounds)?,
            content_bounds: bounds("MEDIA_CONTENT_BOUNDS", defaults.content_bounds)?,
            blog_bounds: bounds("MEDIA_BLOG_BOUNDS", defaults.blog_bounds)?,
            max_upload_bytes,
            video_provider,
        })
    }

    pub fn bounds_for(&self, slot: MediaSlot) -> Bounds {
        match slot {
            MediaSlot::Avatar => self.avatar_bounds,
            MediaSlot::Exercise | MediaSlot::Progress => self.content_bounds,
            MediaSlot::Blog => self.blog_bounds,
        }
    }
}
