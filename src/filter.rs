//! Channel list filtering by name search and quality

use serde::{Deserialize, Serialize};

use crate::models::{Channel, Quality};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityFilter {
    #[default]
    All,
    Hd,
    Sd,
}

impl QualityFilter {
    pub fn accepts(&self, quality: Quality) -> bool {
        match self {
            QualityFilter::All => true,
            QualityFilter::Hd => quality == Quality::Hd,
            QualityFilter::Sd => quality == Quality::Sd,
        }
    }
}

impl std::str::FromStr for QualityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(QualityFilter::All),
            "hd" => Ok(QualityFilter::Hd),
            "sd" => Ok(QualityFilter::Sd),
            other => Err(format!("unknown quality filter: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    pub search: String,
    pub quality: QualityFilter,
}

impl ChannelFilter {
    pub fn new(search: impl Into<String>, quality: QualityFilter) -> Self {
        Self {
            search: search.into(),
            quality,
        }
    }

    pub fn matches(&self, channel: &Channel) -> bool {
        self.quality.accepts(channel.quality) && contains_ignore_case(&channel.name, self.search.trim())
    }

    /// Matching channels, in playlist order
    pub fn apply<'a>(&self, channels: &'a [Channel]) -> Vec<&'a Channel> {
        channels.iter().filter(|c| self.matches(c)).collect()
    }
}

/// Case-insensitive substring check
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
