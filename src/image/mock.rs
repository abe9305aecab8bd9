use super::processor::JPEG_MIME;
use super::{Bounds, ImageArtifact, ImageService};
use crate::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Fake bytes returned in place of a real JPEG.
pub const MOCK_PAYLOAD: &[u8] = b"mock-jpeg";

#[derive(Clone)]
pub struct MockImageProcessor {
    process_count: Arc<Mutex<usize>>,
    source_dimensions: (u32, u32),
    should_fail: Arc<Mutex<bool>>,
    last_bounds: Arc<Mutex<Option<Bounds>>>,
}

impl MockImageProcessor {
    pub fn new() -> Self {
        Self {
            process_count: Arc::new(Mutex::new(0)),
            source_dimensions: (1024, 768),
            should_fail: Arc::new(Mutex::new(false)),
            last_bounds: Arc::new(Mutex::new(None)),
        }
    }

    /// Dimensions the mock pretends every input decodes to.
    pub fn with_source_dimensions(mut self, width: u32, height: u32) -> Self {
        self.source_dimensions = (width, height);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_process_count(&self) -> usize {
        *self.process_count.lock().unwrap()
    }

    pub fn get_last_bounds(&self) -> Option<Bounds> {
        *self.last_bounds.lock().unwrap()
    }
}

impl Default for MockImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for MockImageProcessor {
    async fn process_image(&self, _image_data: &[u8], bounds: Bounds) -> Result<ImageArtifact> {
        *self.last_bounds.lock().unwrap() = Some(bounds);

        if *self.should_fail.lock().unwrap() {
            return Err(crate::Error::Decode(image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        let mut count = self.process_count.lock().unwrap();
        *count += 1;

        let (width, height) = bounds.fit(self.source_dimensions.0, self.source_dimensions.1);
        Ok(ImageArtifact::from_parts(
            MOCK_PAYLOAD.to_vec(),
            JPEG_MIME,
            width,
            height,
        ))
    }
}
