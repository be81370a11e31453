//! Embeddable player URLs for shared video links.

use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_PATH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/d/([^/?#]+)").expect("valid regex"));
static DRIVE_QUERY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]id=([^&#]+)").expect("valid regex"));

/// Map a watch/share URL to the platform's embed URL.
///
/// Recognizes YouTube (`youtube.com/watch?v=` and `youtu.be/`), Vimeo and
/// Google Drive; anything else is returned unchanged.
///
/// ```
/// use service::embed::generate_embed_url;
/// assert_eq!(generate_embed_url("https://youtu.be/ABC123?t=5"), "https://www.youtube.com/embed/ABC123");
/// assert_eq!(generate_embed_url("https://example.com/video"), "https://example.com/video");
/// ```
pub fn generate_embed_url(url: &str) -> String {
    if url.contains("youtube.com/watch") {
        if let Some(id) = youtube_watch_id(url) {
            return format!("https://www.youtube.com/embed/{id}");
        }
    }
    if let Some(id) = segment_after(url, "youtu.be/") {
        return format!("https://www.youtube.com/embed/{id}");
    }
    if url.contains("player.vimeo.com/") {
        return url.to_string();
    }
    if let Some(id) = segment_after(url, "vimeo.com/") {
        return format!("https://player.vimeo.com/video/{id}");
    }
    if url.contains("drive.google.com") {
        let id = DRIVE_PATH_ID
            .captures(url)
            .or_else(|| DRIVE_QUERY_ID.captures(url))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        if let Some(id) = id {
            return format!("https://drive.google.com/file/d/{id}/preview");
        }
    }
    url.to_string()
}

fn youtube_watch_id(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let id = parsed.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.into_owned());
    id.filter(|v| !v.is_empty())
}

/// Text after `marker` up to the query string; `None` if empty or absent.
fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = url.split_once(marker)?;
    let id = rest.split('?').next().unwrap_or_default();
    (!id.is_empty()).then_some(id)
}
