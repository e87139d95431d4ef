//! Background loading of playlists and guides.
//!
//! Each load runs on its own worker thread and reports back over a channel.
//! Loads are stamped with a per-kind generation number; when a newer load of
//! the same kind has been started, events from older ones are dropped on
//! receipt, so the most recently *started* load always wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::epg::{parse_epg_bytes, ScheduleIndex};
use crate::error::EpgError;
use crate::m3u_parser::{parse_playlist_document_with_progress, Playlist};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadKind {
    Playlist,
    Epg,
}

/// Identifies one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub kind: LoadKind,
    pub generation: u64,
}

/// Background task messages
#[derive(Debug)]
pub enum LoadEvent {
    /// Fraction of playlist lines processed
    Progress { request: RequestId, fraction: f64 },
    PlaylistLoaded { request: RequestId, playlist: Playlist },
    /// Always delivered for an EPG load. On document failure the index is
    /// empty and `error` says why.
    EpgLoaded {
        request: RequestId,
        index: ScheduleIndex,
        error: Option<EpgError>,
    },
}

impl LoadEvent {
    pub fn request(&self) -> RequestId {
        match self {
            LoadEvent::Progress { request, .. }
            | LoadEvent::PlaylistLoaded { request, .. }
            | LoadEvent::EpgLoaded { request, .. } => *request,
        }
    }
}

#[derive(Debug, Default)]
struct Generations {
    playlist: AtomicU64,
    epg: AtomicU64,
}

impl Generations {
    fn counter(&self, kind: LoadKind) -> &AtomicU64 {
        match kind {
            LoadKind::Playlist => &self.playlist,
            LoadKind::Epg => &self.epg,
        }
    }
}

pub struct GuideLoader {
    generations: Arc<Generations>,
    task_sender: Sender<LoadEvent>,
    task_receiver: Receiver<LoadEvent>,
}

impl Default for GuideLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl GuideLoader {
    pub fn new() -> Self {
        let (task_sender, task_receiver) = channel();
        Self {
            generations: Arc::new(Generations::default()),
            task_sender,
            task_receiver,
        }
    }

    fn next_request(&self, kind: LoadKind) -> RequestId {
        let generation = self.generations.counter(kind).fetch_add(1, Ordering::SeqCst) + 1;
        RequestId { kind, generation }
    }

    /// Whether `request` is the latest load of its kind
    pub fn is_current(&self, request: RequestId) -> bool {
        self.generations.counter(request.kind).load(Ordering::SeqCst) == request.generation
    }

    /// Parse an already-fetched playlist in the background.
    /// `source` is only used for log output.
    pub fn load_playlist(&self, source: &str, text: String) -> RequestId {
        let request = self.next_request(LoadKind::Playlist);
        let sender = self.task_sender.clone();
        let source = source.to_string();
        info!(%source, generation = request.generation, "Loading playlist");

        thread::spawn(move || {
            let mut last_percent = 0u32;
            let playlist = parse_playlist_document_with_progress(&text, |fraction| {
                // One event per whole percent is plenty for a progress bar
                let percent = (fraction * 100.0) as u32;
                if percent > last_percent {
                    last_percent = percent;
                    let _ = sender.send(LoadEvent::Progress { request, fraction });
                }
            });
            debug!(%source, channels = playlist.channels.len(), "Playlist parsed");
            let _ = sender.send(LoadEvent::PlaylistLoaded { request, playlist });
        });

        request
    }

    /// Parse an already-fetched guide (plain or gzip) in the background.
    pub fn load_epg(&self, source: &str, bytes: Vec<u8>) -> RequestId {
        let request = self.next_request(LoadKind::Epg);
        let sender = self.task_sender.clone();
        let source = source.to_string();
        info!(%source, generation = request.generation, "Loading EPG");

        thread::spawn(move || {
            let event = match parse_epg_bytes(&bytes) {
                Ok(doc) => {
                    debug!(%source, programs = doc.programs.len(), "EPG parsed");
                    LoadEvent::EpgLoaded {
                        request,
                        index: ScheduleIndex::build(doc.programs),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(%source, error = %e, "EPG unusable, continuing without guide data");
                    LoadEvent::EpgLoaded {
                        request,
                        index: ScheduleIndex::default(),
                        error: Some(e),
                    }
                }
            };
            let _ = sender.send(event);
        });

        request
    }

    fn keep(&self, event: LoadEvent) -> Option<LoadEvent> {
        if self.is_current(event.request()) {
            Some(event)
        } else {
            debug!(request = ?event.request(), "Discarding stale load result");
            None
        }
    }

    /// Next pending event for a current request, without blocking
    pub fn try_next(&self) -> Option<LoadEvent> {
        while let Ok(event) = self.task_receiver.try_recv() {
            if let Some(event) = self.keep(event) {
                return Some(event);
            }
        }
        None
    }

    /// Wait up to `timeout` for the next event of a current request
    pub fn wait_next(&self, timeout: Duration) -> Option<LoadEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.task_receiver.recv_timeout(remaining) {
                Ok(event) => {
                    if let Some(event) = self.keep(event) {
                        return Some(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}
