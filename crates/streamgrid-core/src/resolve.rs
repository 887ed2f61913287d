//! Stream URL recognition.
//!
//! A fixed, ordered table of providers is tried in sequence and the first
//! match wins. The generic http(s) catch-all is always last.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::document::Platform;
use crate::error::ResolveError;

/// Result of recognising a URL; the store stamps it into a `StreamSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSource {
    pub id: String,
    pub platform: Platform,
    pub embed_url: String,
    pub original_url: String,
}

/// Document flags that influence embed URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedOptions {
    pub youtube_no_cookie: bool,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            youtube_no_cookie: true,
        }
    }
}

type Build = fn(&Captures<'_>, &str, &EmbedOptions) -> Option<(String, String)>;

struct Provider {
    platform: Platform,
    pattern: Regex,
    build: Build,
}

static PROVIDERS: Lazy<Vec<Provider>> = Lazy::new(|| {
    vec![
        Provider {
            platform: Platform::Youtube,
            pattern: Regex::new(
                r"^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|embed/|shorts/|live/|v/)|youtube-nocookie\.com/embed/|youtu\.be/)([A-Za-z0-9_-]+)",
            )
            .expect("youtube pattern"),
            build: build_youtube,
        },
        Provider {
            platform: Platform::Twitch,
            pattern: Regex::new(
                r"^(?:https?://)?(?:www\.|m\.)?twitch\.tv/(?:videos/(\d+)|([A-Za-z0-9_]+))/?(?:[?#].*)?$",
            )
            .expect("twitch pattern"),
            build: build_twitch,
        },
        Provider {
            platform: Platform::Nicovideo,
            pattern: Regex::new(
                r"^(?:https?://)?(?:(?:www\.|sp\.|live\.)?nicovideo\.jp/watch/|nico\.ms/)((?:sm|nm|so|lv)\d+)",
            )
            .expect("nicovideo pattern"),
            build: build_nicovideo,
        },
        Provider {
            platform: Platform::Vimeo,
            pattern: Regex::new(r"^(?:https?://)?(?:www\.|player\.)?vimeo\.com/(?:video/)?(\d+)")
                .expect("vimeo pattern"),
            build: build_vimeo,
        },
    ]
});

static GENERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/?#]+[^\s]*$").expect("generic pattern"));

/// Recognise `url` and derive its id and embed URL.
///
/// # Errors
///
/// [`ResolveError::Empty`] for blank input, [`ResolveError::Unrecognized`]
/// when no provider matches (the generic fallback only accepts well-formed
/// `http://` / `https://` URLs).
pub fn parse(url: &str, options: &EmbedOptions) -> Result<ParsedSource, ResolveError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ResolveError::Empty);
    }

    for provider in PROVIDERS.iter() {
        let Some(captures) = provider.pattern.captures(url) else {
            continue;
        };
        if let Some((key, embed_url)) = (provider.build)(&captures, url, options) {
            return Ok(ParsedSource {
                id: format!("{}:{}", provider.platform, key),
                platform: provider.platform,
                embed_url,
                original_url: url.to_string(),
            });
        }
    }

    if GENERIC.is_match(url) {
        let platform = if is_hls(url) {
            Platform::Hls
        } else {
            Platform::Url
        };
        return Ok(ParsedSource {
            id: format!("{}:{:016x}", platform, seahash::hash(url.as_bytes())),
            platform,
            embed_url: url.to_string(),
            original_url: url.to_string(),
        });
    }

    Err(ResolveError::Unrecognized(url.to_string()))
}

/// Embed URL for a YouTube video on the regular or privacy-enhanced host.
pub fn youtube_embed_url(video_id: &str, no_cookie: bool) -> String {
    let host = if no_cookie {
        "www.youtube-nocookie.com"
    } else {
        "www.youtube.com"
    };
    format!("https://{host}/embed/{video_id}?autoplay=1&mute=1")
}

/// The extracted video id of a `youtube:<id>` source id.
pub fn youtube_video_id(source_id: &str) -> Option<&str> {
    source_id.strip_prefix("youtube:")
}

fn is_hls(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.to_ascii_lowercase().ends_with(".m3u8")
}

fn build_youtube(caps: &Captures<'_>, _url: &str, options: &EmbedOptions) -> Option<(String, String)> {
    let video_id = caps.get(1)?.as_str();
    Some((
        video_id.to_string(),
        youtube_embed_url(video_id, options.youtube_no_cookie),
    ))
}

fn build_twitch(caps: &Captures<'_>, _url: &str, _options: &EmbedOptions) -> Option<(String, String)> {
    if let Some(video) = caps.get(1) {
        let video = video.as_str();
        return Some((
            format!("v{video}"),
            format!("https://player.twitch.tv/?video=v{video}&parent=localhost&muted=true"),
        ));
    }

    let channel = caps.get(2)?.as_str().to_ascii_lowercase();
    // Site pages that share the channel URL shape
    if matches!(channel.as_str(), "directory" | "downloads" | "p" | "settings" | "videos") {
        return None;
    }
    let embed = format!("https://player.twitch.tv/?channel={channel}&parent=localhost&muted=true");
    Some((channel, embed))
}

fn build_nicovideo(caps: &Captures<'_>, _url: &str, _options: &EmbedOptions) -> Option<(String, String)> {
    let video_id = caps.get(1)?.as_str();
    Some((
        video_id.to_string(),
        format!("https://embed.nicovideo.jp/watch/{video_id}?autoplay=1"),
    ))
}

fn build_vimeo(caps: &Captures<'_>, _url: &str, _options: &EmbedOptions) -> Option<(String, String)> {
    let video_id = caps.get(1)?.as_str();
    Some((
        video_id.to_string(),
        format!("https://player.vimeo.com/video/{video_id}?autoplay=1&muted=1"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(url: &str) -> ParsedSource {
        parse(url, &EmbedOptions::default()).unwrap()
    }

    #[test]
    fn test_youtube_variants_share_id() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
            "youtube.com/embed/dQw4w9WgXcQ",
        ];
        for url in urls {
            let parsed = parse_default(url);
            assert_eq!(parsed.id, "youtube:dQw4w9WgXcQ", "{url}");
            assert_eq!(parsed.platform, Platform::Youtube);
            assert_eq!(parsed.original_url, url);
        }
    }

    #[test]
    fn test_youtube_embed_host_follows_option() {
        let private = parse("https://youtu.be/abc", &EmbedOptions { youtube_no_cookie: true }).unwrap();
        assert_eq!(
            private.embed_url,
            "https://www.youtube-nocookie.com/embed/abc?autoplay=1&mute=1"
        );

        let public = parse("https://youtu.be/abc", &EmbedOptions { youtube_no_cookie: false }).unwrap();
        assert_eq!(public.embed_url, "https://www.youtube.com/embed/abc?autoplay=1&mute=1");
    }

    #[test]
    fn test_twitch_channel_and_video() {
        let channel = parse_default("https://www.twitch.tv/SomeStreamer");
        assert_eq!(channel.id, "twitch:somestreamer");
        assert!(channel.embed_url.contains("channel=somestreamer"));

        let video = parse_default("https://www.twitch.tv/videos/123456");
        assert_eq!(video.id, "twitch:v123456");
        assert!(video.embed_url.contains("video=v123456"));
    }

    #[test]
    fn test_nicovideo_and_vimeo() {
        assert_eq!(
            parse_default("https://www.nicovideo.jp/watch/sm9").id,
            "nicovideo:sm9"
        );
        assert_eq!(parse_default("https://nico.ms/sm12345").id, "nicovideo:sm12345");

        let vimeo = parse_default("https://vimeo.com/76979871");
        assert_eq!(vimeo.id, "vimeo:76979871");
        assert_eq!(
            vimeo.embed_url,
            "https://player.vimeo.com/video/76979871?autoplay=1&muted=1"
        );
    }

    #[test]
    fn test_generic_fallback() {
        let hls = parse_default("https://cdn.example.com/live/stream.m3u8?token=1");
        assert_eq!(hls.platform, Platform::Hls);
        assert!(hls.id.starts_with("hls:"));
        assert_eq!(hls.embed_url, "https://cdn.example.com/live/stream.m3u8?token=1");

        let file = parse_default("http://192.168.1.10:8080/clip.mp4");
        assert_eq!(file.platform, Platform::Url);
        assert!(file.id.starts_with("url:"));
    }

    #[test]
    fn test_generic_id_is_deterministic() {
        let a = parse_default("https://example.com/a.m3u8");
        let b = parse_default("https://example.com/a.m3u8");
        let c = parse_default("https://example.com/b.m3u8");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_unrecognized() {
        let options = EmbedOptions::default();
        assert_eq!(parse("   ", &options), Err(ResolveError::Empty));
        assert!(matches!(
            parse("ftp://example.com/file", &options),
            Err(ResolveError::Unrecognized(_))
        ));
        assert!(parse("not a url", &options).is_err());
        assert!(parse("https://", &options).is_err());
    }

    #[test]
    fn test_twitch_site_pages_fall_through() {
        let parsed = parse_default("https://www.twitch.tv/directory");
        assert_eq!(parsed.platform, Platform::Url);
    }
}
