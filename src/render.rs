//! Presentation helpers
//!
//! Builds what a template needs to display stored media: a data URI for
//! images and an iframe snippet for videos.

use crate::image::ImageArtifact;
use crate::models::Media;
use crate::video::VideoReference;
use base64::Engine as _;

const IFRAME_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// `data:<media_type>;base64,<payload>`
pub fn data_uri(image: &ImageArtifact) -> String {
    format!(
        "data:{};base64,{}",
        image.media_type(),
        base64::engine::general_purpose::STANDARD.encode(image.payload())
    )
}

/// Value for an `src` attribute, if there is anything to show.
pub fn media_src(media: &Media) -> Option<String> {
    match media {
        Media::Image(image) => Some(data_uri(image)),
        Media::Video(video) => Some(video.embed_url().to_string()),
        Media::None => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOptions {
    pub width: u32,
    pub height: u32,
    pub autoplay: bool,
    pub mute: bool,
    pub start: Option<u32>,
    pub end: Option<u32>,
    pub allow_fullscreen: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            width: 560,
            height: 315,
            autoplay: false,
            mute: false,
            start: None,
            end: None,
            allow_fullscreen: true,
        }
    }
}

/// Embed URL with player parameters appended.
pub fn embed_src(video: &VideoReference, options: &EmbedOptions) -> String {
    let mut params = Vec::new();
    if options.autoplay {
        params.push("autoplay=1".to_string());
    }
    if options.mute {
        params.push("mute=1".to_string());
    }
    if let Some(start) = options.start {
        params.push(format!("start={}", start));
    }
    if let Some(end) = options.end {
        params.push(format!("end={}", end));
    }

    if params.is_empty() {
        video.embed_url().to_string()
    } else {
        format!("{}?{}", video.embed_url(), params.join("&"))
    }
}

/// Responsive 16:9 iframe wrapper.
///
/// The embed URL is built from a validated id and a configured base, so it
/// contains no characters that need escaping inside the attribute.
pub fn embed_code(video: &VideoReference, options: &EmbedOptions) -> String {
    let fullscreen = if options.allow_fullscreen {
        " allowfullscreen"
    } else {
        ""
    };

    format!(
        concat!(
            r#"<div class="video-embed-container" style="position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden; max-width: 100%;">"#,
            r#"<iframe src="{src}" width="{width}" height="{height}" frameborder="0" loading="lazy" allow="{allow}"{fullscreen} "#,
            r#"style="position: absolute; top: 0; left: 0; width: 100%; height: 100%;"></iframe>"#,
            "</div>"
        ),
        src = embed_src(video, options),
        width = options.width,
        height = options.height,
        allow = IFRAME_ALLOW,
        fullscreen = fullscreen,
    )
}
