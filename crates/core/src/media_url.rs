//! Canonical form for media references returned by remote capabilities.
//!
//! Capabilities sometimes hand back bare `host/path` references. Every
//! reference stored in a [`SceneUnit`](crate::scene::SceneUnit) or a
//! [`PipelineResult`](crate::result::PipelineResult) goes through
//! [`normalize_media_url`] first.

/// Normalize a media reference to an absolute URL.
///
/// Surrounding whitespace is trimmed and `https://` is prepended when no
/// scheme is present. Empty input stays empty.
pub fn normalize_media_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }
    let bare = trimmed.trim_start_matches('/');
    format!("https://{bare}")
}

/// Normalize an optional reference, mapping empty results to `None`.
pub fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(normalize_media_url).filter(|url| !url.is_empty())
}
