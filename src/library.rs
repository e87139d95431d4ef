//! User library: favorites, watch history and saved playlists.
//!
//! Plain state owned by the caller; parsing and correlation never touch it.
//! Stored as JSON by whoever holds it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Channel, SavedPlaylist};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryState {
    /// Favorite channel names
    #[serde(default)]
    pub favorites: BTreeSet<String>,
    /// Watched channels, most recent first
    #[serde(default)]
    pub history: Vec<Channel>,
    #[serde(default)]
    pub saved_playlists: Vec<SavedPlaylist>,
}

impl LibraryState {
    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.contains(name)
    }

    /// Flip favorite status; returns the new status
    pub fn toggle_favorite(&mut self, name: &str) -> bool {
        if self.favorites.remove(name) {
            false
        } else {
            self.favorites.insert(name.to_string());
            true
        }
    }

    /// Favorite channels of a playlist, in playlist order
    pub fn favorite_channels<'a>(&self, channels: &'a [Channel]) -> Vec<&'a Channel> {
        channels.iter().filter(|c| self.is_favorite(&c.name)).collect()
    }

    /// Push a channel to the front of the history, keeping at most `limit` entries
    pub fn record_watched(&mut self, channel: &Channel, limit: usize) {
        self.history.insert(0, channel.clone());
        self.history.truncate(limit);
    }

    pub fn save_playlist(&mut self, name: impl Into<String>, url: impl Into<String>) -> Uuid {
        let id = Uuid::new_v4();
        self.saved_playlists.push(SavedPlaylist {
            id,
            name: name.into(),
            url: url.into(),
        });
        id
    }

    /// Returns false if no playlist had that id
    pub fn remove_playlist(&mut self, id: Uuid) -> bool {
        let before = self.saved_playlists.len();
        self.saved_playlists.retain(|p| p.id != id);
        self.saved_playlists.len() != before
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
