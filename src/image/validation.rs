//! Pre-decode checks on an uploaded file.
//!
//! These run before any pixel is decoded and reject uploads whose declared
//! name, type, size or leading bytes do not describe an allowed image.

use super::mime::{detect_image_mime, mime_for_extension};
use crate::{Error, Result};
use tracing::warn;

/// Default upload ceiling (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "php", "py", "pl", "sh", "asp",
    "aspx",
];

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
];

/// A raw file upload as received from a form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            data,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lowercased extension, ignoring control characters in the name.
    pub fn extension(&self) -> Option<String> {
        let clean: String = self.filename.chars().filter(|c| !c.is_control()).collect();
        let (_, ext) = clean.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_bytes: u64,
}

impl Default for UploadValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn validate(&self, upload: &Upload) -> Result<()> {
        self.check(upload).map_err(|reason| {
            warn!("Rejected upload '{}': {}", upload.filename.escape_debug(), reason);
            Error::UploadRejected(reason)
        })
    }

    fn check(&self, upload: &Upload) -> std::result::Result<(), String> {
        if upload.filename.is_empty() {
            return Err("No file provided".to_string());
        }

        if upload.filename.chars().any(char::is_control) {
            return Err("Filename contains invalid characters".to_string());
        }

        let ext = upload
            .extension()
            .ok_or_else(|| "File must have an extension".to_string())?;

        if DANGEROUS_EXTENSIONS.contains(&ext.as_str()) {
            return Err(format!(
                "File type '{}' is not allowed for security reasons",
                ext
            ));
        }

        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(format!(
                "File type '{}' not allowed. Allowed types: {}",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            ));
        }

        if let Some(content_type) = &upload.content_type {
            if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
                return Err(format!(
                    "Invalid file type. Expected image file, got '{}'",
                    content_type
                ));
            }
        }

        let size = upload.data.len() as u64;
        if size == 0 {
            return Err("File is empty".to_string());
        }
        if size > self.max_bytes {
            return Err(format!(
                "File too large. Maximum size is {}",
                human_size(self.max_bytes)
            ));
        }

        if detect_image_mime(&upload.data) != mime_for_extension(&ext) {
            return Err("File content does not match expected image format".to_string());
        }

        Ok(())
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn rejection(upload: Upload) -> String {
        match UploadValidator::default().validate(&upload) {
            Err(Error::UploadRejected(reason)) => reason,
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_matching_upload() {
        let upload = Upload::new("photo.PNG", PNG_HEADER.to_vec()).with_content_type("image/png");
        assert!(UploadValidator::default().validate(&upload).is_ok());

        let upload = Upload::new("pic.jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert!(UploadValidator::default().validate(&upload).is_ok());
    }

    #[test]
    fn test_rejects_missing_or_odd_names() {
        assert_eq!(rejection(Upload::new("", PNG_HEADER.to_vec())), "No file provided");
        assert_eq!(
            rejection(Upload::new("a\0.png", PNG_HEADER.to_vec())),
            "Filename contains invalid characters"
        );
        assert_eq!(
            rejection(Upload::new("README", PNG_HEADER.to_vec())),
            "File must have an extension"
        );
    }

    #[test]
    fn test_rejects_dangerous_and_unknown_extensions() {
        assert!(rejection(Upload::new("run.exe", PNG_HEADER.to_vec())).contains("security"));
        assert!(rejection(Upload::new("scan.bmp", PNG_HEADER.to_vec())).contains("not allowed"));
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let upload = Upload::new("photo.png", PNG_HEADER.to_vec()).with_content_type("text/html");
        assert!(rejection(upload).contains("text/html"));
    }

    #[test]
    fn test_rejects_empty_and_oversized() {
        assert_eq!(rejection(Upload::new("photo.png", Vec::new())), "File is empty");

        let validator = UploadValidator::new(4);
        let result = validator.validate(&Upload::new("photo.png", PNG_HEADER.to_vec()));
        assert!(matches!(result, Err(Error::UploadRejected(reason)) if reason.contains("4 bytes")));
        assert_eq!(human_size(DEFAULT_MAX_UPLOAD_BYTES), "10MB");
    }

    #[test]
    fn test_rejects_mismatched_signature() {
        let upload = Upload::new("photo.jpg", PNG_HEADER.to_vec());
        assert_eq!(
            rejection(upload),
            "File content does not match expected image format"
        );

        let upload = Upload::new("photo.png", b"just text".to_vec());
        assert_eq!(
            rejection(upload),
            "File content does not match expected image format"
        );
    }
}
