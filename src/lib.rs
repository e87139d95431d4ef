//! IPTV guide engine
//!
//! Parses M3U playlists and XMLTV guides into plain records and answers
//! "what is on now / next" for a channel at a given instant.

pub mod config;
pub mod epg;
pub mod error;
pub mod filter;
pub mod guide;
pub mod library;
pub mod loader;
pub mod m3u_parser;
pub mod models;

pub use config::GuideConfig;
pub use epg::{parse_epg, parse_epg_bytes, parse_epg_document, spawn_epg_parse, EpgDocument, ScheduleIndex};
pub use error::{ConfigError, EpgError};
pub use filter::{ChannelFilter, QualityFilter};
pub use guide::{describe, now_next_programs, NowNext};
pub use library::LibraryState;
pub use loader::{GuideLoader, LoadEvent, LoadKind, RequestId};
pub use m3u_parser::{
    parse_playlist, parse_playlist_document, parse_playlist_document_with_progress, parse_playlist_with_progress,
    Playlist,
};
pub use models::{Channel, ChannelId, Program, Quality, SavedPlaylist};
