//! Data models for channels, programs and saved playlists

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque channel identity, freshly generated for every parsed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stream quality inferred from the `#EXTINF` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "SD")]
    Sd,
    #[default]
    Other,
}

impl Quality {
    /// Classify a raw metadata line. HD indicators always win over SD ones.
    pub fn classify(line: &str) -> Self {
        if ["HD", "720", "1080"].iter().any(|t| line.contains(t)) {
            Quality::Hd
        } else if ["SD", "480"].iter().any(|t| line.contains(t)) {
            Quality::Sd
        } else {
            Quality::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Hd => "HD",
            Quality::Sd => "SD",
            Quality::Other => "Other",
        }
    }
}

/// Channel/Stream information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
    pub url: String,
    pub logo: Option<String>,
    pub quality: Quality,
    /// Key into the schedule index (`tvg-id`)
    pub epg_id: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

/// A single guide entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Channel ID this program belongs to
    pub epg_id: String,
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub description: Option<String>,
    pub category: Option<String>,
}

impl Program {
    /// Whether `now` falls inside `[start, end]`, both ends inclusive
    pub fn is_airing_at<Tz: chrono::TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.start <= *now && self.end >= *now
    }
}

/// Saved playlist entry (name + URL), persisted by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPlaylist {
    pub id: Uuid,
    pub name: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_prefers_hd() {
        assert_eq!(Quality::classify("#EXTINF:-1,News SD 1080"), Quality::Hd);
        assert_eq!(Quality::classify("#EXTINF:-1,Movies 480"), Quality::Sd);
        assert_eq!(Quality::classify("#EXTINF:-1,Kids"), Quality::Other);
        assert_eq!(Quality::classify("#EXTINF:-1,sport hd"), Quality::Other);
    }

    #[test]
    fn test_channel_ids_unique() {
        assert_ne!(ChannelId::new(), ChannelId::new());
    }

    #[test]
    fn test_quality_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Quality::Hd).unwrap(), "\"HD\"");
        assert_eq!(serde_json::to_string(&Quality::Other).unwrap(), "\"Other\"");
    }
}
