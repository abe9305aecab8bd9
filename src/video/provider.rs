use crate::{Error, Result};

/// A whitelisted video host and the URL shapes it is reachable under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoProvider {
    name: String,
    watch_hosts: Vec<String>,
    short_hosts: Vec<String>,
    watch_path: String,
    embed_prefixes: Vec<String>,
    embed_base: String,
    watch_base: String,
    thumbnail_base: Option<String>,
    id_length: Option<usize>,
}

impl VideoProvider {
    /// Provider served from `canonical_host` with short links on `short_host`.
    ///
    /// Watch pages live at `/watch?v=<id>`, embeds at `/embed/<id>`. Ids are
    /// any non-empty run of `[A-Za-z0-9_-]` until narrowed with
    /// [`with_id_length`](Self::with_id_length).
    pub fn new(name: &str, canonical_host: &str, short_host: &str) -> Self {
        let canonical_host = canonical_host.to_ascii_lowercase();
        Self {
            name: name.to_string(),
            watch_hosts: vec![canonical_host.clone()],
            short_hosts: vec![short_host.to_ascii_lowercase()],
            watch_path: "/watch".to_string(),
            embed_prefixes: vec!["embed".to_string()],
            embed_base: format!("https://{}/embed", canonical_host),
            watch_base: format!("https://{}/watch", canonical_host),
            thumbnail_base: None,
            id_length: None,
        }
    }

    pub fn youtube() -> Self {
        Self::new("youtube", "www.youtube.com", "youtu.be")
            .with_watch_host("youtube.com")
            .with_watch_host("m.youtube.com")
            .with_embed_prefix("v")
            .with_thumbnail_base("https://img.youtube.com/vi")
            .with_id_length(11)
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "youtube" | "yt" => Ok(Self::youtube()),
            other => Err(Error::Config(format!("Unknown video provider: {}", other))),
        }
    }

    /// Accept another host serving the watch and embed pages.
    pub fn with_watch_host(mut self, host: &str) -> Self {
        self.watch_hosts.push(host.to_ascii_lowercase());
        self
    }

    /// Accept `/<prefix>/<id>` as an embed path in addition to `/embed/<id>`.
    pub fn with_embed_prefix(mut self, prefix: &str) -> Self {
        self.embed_prefixes.push(prefix.trim_matches('/').to_string());
        self
    }

    pub fn with_thumbnail_base(mut self, base: &str) -> Self {
        self.thumbnail_base = Some(base.trim_end_matches('/').to_string());
        self
    }

    pub fn with_id_length(mut self, length: usize) -> Self {
        self.id_length = Some(length);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_watch_host(&self, host: &str) -> bool {
        self.watch_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    pub(crate) fn is_short_host(&self, host: &str) -> bool {
        self.short_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    pub(crate) fn watch_path(&self) -> &str {
        &self.watch_path
    }

    pub(crate) fn embed_prefixes(&self) -> impl Iterator<Item = &str> {
        self.embed_prefixes.iter().map(String::as_str)
    }

    pub fn is_valid_id(&self, id: &str) -> bool {
        !id.is_empty()
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            && self.id_length.map_or(true, |len| id.len() == len)
    }

    pub fn embed_url(&self, video_id: &str) -> String {
        format!("{}/{}", self.embed_base, video_id)
    }

    pub fn watch_url(&self, video_id: &str) -> String {
        format!("{}?v={}", self.watch_base, video_id)
    }

    pub fn thumbnail_url(&self, video_id: &str, variant: &str) -> Option<String> {
        self.thumbnail_base
            .as_ref()
            .map(|base| format!("{}/{}/{}.jpg", base, video_id, variant))
    }
}

impl Default for VideoProvider {
    fn default() -> Self {
        Self::youtube()
    }
}
