//! Video link normalization
//!
//! Validates user-supplied video links against a single whitelisted provider
//! and rewrites them to the provider's embeddable form. Nothing here touches
//! the network: a well-formed link to a deleted video is still accepted.

pub mod provider;

pub use provider::VideoProvider;

use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Site pages that can never be a short-link video id.
const RESERVED_SEGMENTS: &[&str] = &["watch", "playlist", "channel", "embed", "v", "user", "c"];

/// A validated video link and its canonical embed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoReference {
    raw_url: String,
    video_id: String,
    embed_url: String,
}

impl VideoReference {
    pub(crate) fn from_parts(raw_url: String, video_id: String, embed_url: String) -> Self {
        Self {
            raw_url,
            video_id,
            embed_url,
        }
    }

    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn embed_url(&self) -> &str {
        &self.embed_url
    }
}

/// Derived links for a video, built without calling the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub video_url: String,
    pub embed_url: String,
    pub thumbnail_url: Option<String>,
    pub thumbnail_medium: Option<String>,
    pub thumbnail_small: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct VideoNormalizer {
    provider: VideoProvider,
}

impl VideoNormalizer {
    pub fn new(provider: VideoProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &VideoProvider {
        &self.provider
    }

    /// Validate `url` and rewrite it to `<embed base>/<id>`.
    ///
    /// Accepted shapes, first match wins: `/watch?v=<id>` on a watch host,
    /// `/<id>` on a short-link host, `/embed/<id>` (or another configured
    /// embed prefix) on a watch host. A missing scheme means `https`.
    pub fn normalize(&self, url: &str) -> Result<VideoReference> {
        let Some(video_id) = self.extract_id(url) else {
            warn!("Rejected {} video URL: {:?}", self.provider.name(), url);
            return Err(Error::InvalidVideoUrl(format!(
                "'{}' is not a recognized {} video link",
                url.trim(),
                self.provider.name()
            )));
        };

        let embed_url = self.provider.embed_url(&video_id);
        debug!("Normalized video URL {:?} -> {}", url, embed_url);

        Ok(VideoReference::from_parts(
            url.to_string(),
            video_id,
            embed_url,
        ))
    }

    pub fn metadata(&self, reference: &VideoReference) -> VideoMetadata {
        let id = reference.video_id();
        VideoMetadata {
            video_id: id.to_string(),
            video_url: self.provider.watch_url(id),
            embed_url: reference.embed_url().to_string(),
            thumbnail_url: self.provider.thumbnail_url(id, "maxresdefault"),
            thumbnail_medium: self.provider.thumbnail_url(id, "mqdefault"),
            thumbnail_small: self.provider.thumbnail_url(id, "default"),
        }
    }

    fn extract_id(&self, url: &str) -> Option<String> {
        let parsed = parse_lenient(url.trim())?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.port().is_some() {
            return None;
        }

        let host = parsed.host_str()?;
        let path = parsed.path();
        let on_watch_host = self.provider.is_watch_host(host);

        let candidate = if on_watch_host && path == self.provider.watch_path() {
            parsed.query().and_then(query_video_id)
        } else if self.provider.is_short_host(host) {
            self.short_link_id(path, parsed.query())
        } else if on_watch_host {
            self.provider.embed_prefixes().find_map(|prefix| {
                path.strip_prefix('/')?
                    .strip_prefix(prefix)?
                    .strip_prefix('/')
                    .map(leading_token)
            })
        } else {
            None
        };
        let candidate = candidate?;

        self.provider
            .is_valid_id(candidate)
            .then(|| candidate.to_string())
    }

    /// The single path segment of a short link.
    ///
    /// Nested paths, site pages (`/watch`, `/playlist`, ...) and playlist
    /// queries are not video links.
    fn short_link_id<'a>(&self, path: &'a str, query: Option<&str>) -> Option<&'a str> {
        let segment = path.strip_prefix('/')?;
        if segment.contains('/') {
            return None;
        }
        if query.is_some_and(|q| q.split('&').any(|pair| pair.starts_with("list="))) {
            return None;
        }

        let reserved = RESERVED_SEGMENTS.contains(&segment)
            || self.provider.watch_path().trim_start_matches('/') == segment
            || self.provider.embed_prefixes().any(|prefix| prefix == segment);
        (!reserved).then_some(segment)
    }
}

/// Normalize a link against the default provider (YouTube).
pub fn normalize_video_url(url: &str) -> Result<VideoReference> {
    VideoNormalizer::default().normalize(url)
}

fn parse_lenient(input: &str) -> Option<Url> {
    if input.is_empty() {
        return None;
    }
    if has_scheme(input) {
        Url::parse(input).ok()
    } else {
        Url::parse(&format!("https://{}", input)).ok()
    }
}

/// True when `input` starts with `<scheme>://`, ignoring any URL nested in the query.
fn has_scheme(input: &str) -> bool {
    input.split_once("://").is_some_and(|(scheme, _)| {
        scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Value of the first `v=` pair in a raw (still percent-encoded) query.
fn query_video_id(query: &str) -> Option<&str> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("v="))
        .map(leading_token)
}

fn leading_token(s: &str) -> &str {
    let end = s.find(['&', '?', '/', '#']).unwrap_or(s.len());
    &s[..end]
}
