//! Media ingestion for the fitness tracker's upload fields
//!
//! Normalizes profile pictures, exercise media, progress photos and blog
//! images into bounded JPEGs, and rewrites video links into the provider's
//! canonical embed URL, so callers only ever persist one shape per field.

pub mod error;
pub mod image;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod video;

pub use error::{Error, Result};
pub use crate::image::{normalize_image, normalize_reader, Bounds, ImageArtifact};
pub use models::{Config, Media, MediaKind, MediaSlot, StoredMedia};
pub use pipeline::{MediaInput, MediaPipeline, MediaUpdate, PipelineServices};
pub use video::{normalize_video_url, VideoNormalizer, VideoProvider, VideoReference};
