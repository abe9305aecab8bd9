//! Media ingestion for the application's upload fields.
//!
//! Each submission is routed by its [`MediaSlot`]: the slot decides which
//! kinds it accepts and which bounding box images are fitted into. Uploads
//! are validated before they reach the image service. A failed update leaves
//! the caller's current media in place and reports the error alongside it.

use crate::image::{ImageProcessor, ImageService, Upload, UploadValidator};
use crate::models::{Config, Media, MediaKind, MediaSlot};
use crate::video::VideoNormalizer;
use crate::{Error, Result};
use tracing::{info, warn};

/// What a user submitted for a media field.
#[derive(Debug, Clone)]
pub enum MediaInput {
    Upload(Upload),
    VideoLink(String),
    /// Remove the current media.
    Clear,
}

impl MediaInput {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaInput::Upload(_) => MediaKind::Image,
            MediaInput::VideoLink(_) => MediaKind::Video,
            MediaInput::Clear => MediaKind::None,
        }
    }
}

/// Result of [`MediaPipeline::update`].
///
/// On failure `media` is the caller's current value, untouched.
#[derive(Debug)]
pub struct MediaUpdate {
    pub media: Media,
    pub error: Option<Error>,
}

impl MediaUpdate {
    pub fn is_changed(&self) -> bool {
        self.error.is_none()
    }
}

/// Turns raw submissions into storable [`Media`].
pub struct MediaPipeline {
    image: Box<dyn ImageService>,
    video: VideoNormalizer,
    validator: UploadValidator,
    config: Config,
}

/// Injectable service bundle used to construct [`MediaPipeline`] in tests/harnesses.
pub struct PipelineServices {
    pub image: Box<dyn ImageService>,
    pub video: VideoNormalizer,
    pub validator: UploadValidator,
}

impl MediaPipeline {
    /// Build a pipeline from concrete service dependencies.
    pub fn with_services(services: PipelineServices, config: Config) -> Self {
        Self {
            image: services.image,
            video: services.video,
            validator: services.validator,
            config,
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self::with_services(
            PipelineServices {
                image: Box::new(ImageProcessor::new()),
                video: VideoNormalizer::new(config.video_provider.clone()),
                validator: UploadValidator::new(config.max_upload_bytes),
            },
            config,
        )
    }

    /// Construct a pipeline from environment configuration (`Config::from_env`).
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(Config::from_env()?))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn video(&self) -> &VideoNormalizer {
        &self.video
    }

    /// Validate and normalize one submission for `slot`.
    pub async fn ingest(&self, slot: MediaSlot, input: MediaInput) -> Result<Media> {
        let kind = input.kind();
        if !slot.accepts(kind) {
            return Err(Error::UnsupportedMedia {
                slot: slot.label().to_string(),
                kind: kind.to_string(),
            });
        }

        match input {
            MediaInput::Upload(upload) => {
                self.validator.validate(&upload)?;
                let bounds = self.config.bounds_for(slot);
                let artifact = self.image.process_image(&upload.data, bounds).await?;
                info!(
                    "Stored {} upload '{}' as {}x{} {} ({} -> {} bytes)",
                    slot,
                    upload.filename,
                    artifact.width(),
                    artifact.height(),
                    artifact.media_type(),
                    upload.data.len(),
                    artifact.len()
                );
                Ok(Media::Image(artifact))
            }
            MediaInput::VideoLink(url) => {
                let video = self.video.normalize(&url)?;
                info!("Stored {} video {}", slot, video.embed_url());
                Ok(Media::Video(video))
            }
            MediaInput::Clear => Ok(Media::None),
        }
    }

    /// Like [`ingest`](Self::ingest), but keeps `current` when the submission fails.
    pub async fn update(&self, current: Media, slot: MediaSlot, input: MediaInput) -> MediaUpdate {
        match self.ingest(slot, input).await {
            Ok(media) => MediaUpdate { media, error: None },
            Err(e) => {
                warn!("Keeping existing {} after failed update: {}", slot, e);
                MediaUpdate {
                    media: current,
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{Bounds, MockImageProcessor};
    use crate::video::VideoProvider;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn pipeline_with(image: MockImageProcessor) -> MediaPipeline {
        MediaPipeline::with_services(
            PipelineServices {
                image: Box::new(image),
                video: VideoNormalizer::new(VideoProvider::new(
                    "example",
                    "example.com",
                    "short.example",
                )),
                validator: UploadValidator::default(),
            },
            Config::default(),
        )
    }

    fn png_upload() -> MediaInput {
        MediaInput::Upload(Upload::new("me.png", PNG_HEADER.to_vec()).with_content_type("image/png"))
    }

    #[tokio::test]
    async fn test_avatar_upload_uses_avatar_bounds() {
        let pipeline = pipeline_with(MockImageProcessor::new().with_source_dimensions(1000, 500));

        let media = pipeline.ingest(MediaSlot::Avatar, png_upload()).await.unwrap();

        let image = media.as_image().unwrap();
        assert_eq!((image.width(), image.height()), (400, 200));
    }

    #[tokio::test]
    async fn test_video_link_for_exercise() {
        let pipeline = pipeline_with(MockImageProcessor::new());

        let media = pipeline
            .ingest(
                MediaSlot::Exercise,
                MediaInput::VideoLink("https://short.example/abc123".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(media.kind(), MediaKind::Video);
        assert_eq!(
            media.as_video().unwrap().embed_url(),
            "https://example.com/embed/abc123"
        );
    }

    #[tokio::test]
    async fn test_progress_rejects_video() {
        let pipeline = pipeline_with(MockImageProcessor::new());

        let result = pipeline
            .ingest(
                MediaSlot::Progress,
                MediaInput::VideoLink("https://short.example/abc123".to_string()),
            )
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, Error::UnsupportedMedia { .. }));
        assert_eq!(
            err.user_message(),
            "The progress photo field does not accept video uploads."
        );
    }

    #[tokio::test]
    async fn test_rejected_upload_never_reaches_processor() {
        let image = MockImageProcessor::new();
        let pipeline = pipeline_with(image.clone());

        let result = pipeline
            .ingest(
                MediaSlot::Blog,
                MediaInput::Upload(Upload::new("notes.txt", b"hello".to_vec())),
            )
            .await;

        assert!(matches!(result, Err(Error::UploadRejected(_))));
        assert_eq!(image.get_process_count(), 0);
        assert_eq!(image.get_last_bounds(), None);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_current_media() {
        let pipeline = pipeline_with(MockImageProcessor::new().with_failure(true));
        let current = pipeline
            .ingest(
                MediaSlot::Exercise,
                MediaInput::VideoLink("https://example.com/watch?v=abc123".to_string()),
            )
            .await
            .unwrap();

        let update = pipeline
            .update(current.clone(), MediaSlot::Exercise, png_upload())
            .await;

        assert!(!update.is_changed());
        assert_eq!(update.media, current);
        assert_eq!(
            update.error.unwrap().user_message(),
            "Please upload a valid image."
        );
    }

    #[tokio::test]
    async fn test_bad_video_link_keeps_current_media() {
        let pipeline = pipeline_with(MockImageProcessor::new());
        let current = pipeline.ingest(MediaSlot::Blog, png_upload()).await.unwrap();

        let update = pipeline
            .update(
                current.clone(),
                MediaSlot::Blog,
                MediaInput::VideoLink("https://example.com/playlist?list=xyz".to_string()),
            )
            .await;

        assert_eq!(update.media, current);
        assert!(matches!(update.error, Some(Error::InvalidVideoUrl(_))));
    }

    #[tokio::test]
    async fn test_clear_removes_media() {
        let pipeline = pipeline_with(MockImageProcessor::new());
        let current = pipeline.ingest(MediaSlot::Avatar, png_upload()).await.unwrap();

        let update = pipeline.update(current, MediaSlot::Avatar, MediaInput::Clear).await;

        assert!(update.is_changed());
        assert!(update.media.is_none());
    }

    #[test]
    fn test_from_config_uses_configured_bounds() {
        let config = Config {
            blog_bounds: Bounds::new(640, 480).unwrap(),
            ..Config::default()
        };

        let pipeline = MediaPipeline::from_config(config);

        assert_eq!(
            pipeline.config().bounds_for(MediaSlot::Blog),
            Bounds::new(640, 480).unwrap()
        );
        assert_eq!(pipeline.video().provider().name(), "youtube");
    }
}
