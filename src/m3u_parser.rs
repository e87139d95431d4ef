//! M3U playlist parser
//!
//! A two-line state machine: an `#EXTINF` line fills a draft, the following
//! `http`/`rtmp` line emits that draft as a channel. Anything else is skipped,
//! so the parser never fails; unparseable input yields no channels.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::models::{Channel, ChannelId, Quality};

/// `key="` markers inside a metadata line
static ATTR_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s,:"])([A-Za-z][A-Za-z0-9_-]*)=""#).expect("valid attribute regex")
});

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub channels: Vec<Channel>,
    pub epg_url: Option<String>, // From x-tvg-url in header
}

/// Lookup result for a quoted `key="value"` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute<'a> {
    Absent,
    Value(&'a str),
    /// Marker present but the closing quote never comes
    Malformed,
}

impl<'a> Attribute<'a> {
    pub fn value(self) -> Option<&'a str> {
        match self {
            Attribute::Value(v) => Some(v),
            Attribute::Absent | Attribute::Malformed => None,
        }
    }
}

/// Extract the first `name="..."` attribute from a line (case-sensitive key)
pub fn extract_attribute<'a>(line: &'a str, name: &str) -> Attribute<'a> {
    find_attribute(line, |key| key == name)
}

fn find_attribute<'a>(line: &'a str, matches: impl Fn(&str) -> bool) -> Attribute<'a> {
    for caps in ATTR_MARKER.captures_iter(line) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !matches(key.as_str()) {
            continue;
        }
        let rest = &line[whole.end()..];
        return match rest.find('"') {
            Some(end) => Attribute::Value(&rest[..end]),
            None => Attribute::Malformed,
        };
    }
    Attribute::Absent
}

/// Metadata carried from an `#EXTINF` line to the URL line(s) after it
#[derive(Debug, Clone, Default)]
struct Draft {
    name: String,
    logo: Option<String>,
    quality: Quality,
    epg_id: Option<String>,
    group: Option<String>,
}

impl Draft {
    fn from_extinf(line: &str) -> Self {
        let name = line
            .split_once(',')
            .map(|(_, rest)| rest.trim().to_string())
            .unwrap_or_default();

        Self {
            name,
            logo: optional_attr(line, "tvg-logo"),
            quality: Quality::classify(line),
            epg_id: optional_attr(line, "tvg-id"),
            group: optional_attr(line, "group-title"),
        }
    }

    fn to_channel(&self, url: &str) -> Channel {
        Channel {
            id: ChannelId::new(),
            name: self.name.clone(),
            url: url.to_string(),
            logo: self.logo.clone(),
            quality: self.quality,
            epg_id: self.epg_id.clone(),
            group: self.group.clone(),
        }
    }
}

fn optional_attr(line: &str, name: &str) -> Option<String> {
    match extract_attribute(line, name) {
        Attribute::Value(v) => Some(v.to_string()),
        Attribute::Malformed => {
            trace!(attribute = name, "Unterminated attribute quote, leaving field empty");
            None
        }
        Attribute::Absent => None,
    }
}

/// Split on `\n`, `\r\n` and bare `\r`
fn split_lines(text: &str) -> Vec<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines().flat_map(|l| l.split('\r')).collect()
}

fn is_stream_url(line: &str) -> bool {
    line.starts_with("http") || line.starts_with("rtmp")
}

/// Parse M3U content and extract channels
pub fn parse_playlist(text: &str) -> Vec<Channel> {
    parse_playlist_with_progress(text, |_| {})
}

/// Parse M3U content, reporting `lines_processed / total_lines` after each line
pub fn parse_playlist_with_progress(text: &str, mut progress: impl FnMut(f64)) -> Vec<Channel> {
    let lines = split_lines(text);
    let total = lines.len();
    let mut channels = Vec::new();
    let mut draft = Draft::default();

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("#EXTINF") {
            draft = Draft::from_extinf(line);
        } else if is_stream_url(line) {
            channels.push(draft.to_channel(line.trim()));
        }
        progress((i + 1) as f64 / total as f64);
    }

    debug!(channels = channels.len(), lines = total, "Parsed playlist");
    channels
}

/// Parse M3U and return playlist with EPG URL
pub fn parse_playlist_document(text: &str) -> Playlist {
    parse_playlist_document_with_progress(text, |_| {})
}

pub fn parse_playlist_document_with_progress(text: &str, progress: impl FnMut(f64)) -> Playlist {
    let epg_url = split_lines(text)
        .into_iter()
        .find(|l| !l.trim().is_empty())
        .filter(|l| l.starts_with("#EXTM3U"))
        .and_then(|header| {
            find_attribute(header, |k| k.eq_ignore_ascii_case("x-tvg-url"))
                .value()
                .or_else(|| find_attribute(header, |k| k.eq_ignore_ascii_case("url-tvg")).value())
        })
        .map(str::to_string);

    Playlist {
        channels: parse_playlist_with_progress(text, progress),
        epg_url,
    }
}

#[cfg(test)]
#[path = "m3u_parser_tests.rs"]
mod tests;
