//! Error handling and custom error types
//!
//! Provides unified error handling across the media pipeline using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Image decode error: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Image encode error: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Invalid video URL: {0}")]
    InvalidVideoUrl(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("The {slot} field does not accept {kind} media")]
    UnsupportedMedia { slot: String, kind: String },

    #[error("Stored image data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Stored media record is invalid: {0}")]
    InvalidStoredMedia(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Message suitable for showing next to the form field that caused it.
    pub fn user_message(&self) -> String {
        match self {
            Error::Decode(_) => "Please upload a valid image.".to_string(),
            Error::Encode(_) => {
                "Failed to process image. Please try a different file.".to_string()
            }
            Error::InvalidVideoUrl(_) => "Please provide a valid video URL.".to_string(),
            Error::UploadRejected(reason) => format!("File validation failed: {}", reason),
            Error::UnsupportedMedia { slot, kind } => {
                format!("The {} field does not accept {} uploads.", slot, kind)
            }
            _ => "Something went wrong while processing your media.".to_string(),
        }
    }

    /// True for failures caused by what the user submitted rather than by the system.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Decode(_)
                | Error::InvalidVideoUrl(_)
                | Error::UploadRejected(_)
                | Error::UnsupportedMedia { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_field_specific() {
        let err = Error::InvalidVideoUrl("not a url".to_string());
        assert_eq!(err.user_message(), "Please provide a valid video URL.");
        assert!(err.is_user_error());

        let err = Error::UploadRejected("File is empty".to_string());
        assert_eq!(err.user_message(), "File validation failed: File is empty");
    }

    #[test]
    fn test_system_errors_get_generic_message() {
        let err = Error::Invariant("join failed".to_string());
        assert!(!err.is_user_error());
        assert!(err.user_message().contains("Something went wrong"));
    }
}
