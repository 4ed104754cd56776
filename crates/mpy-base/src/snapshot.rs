//! Cached view of the playback server, refreshed once per sync cycle.

use std::path::Path;

use tracing::debug;

use crate::remote::{PlaybackService, RemoteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    Play,
    Pause,
    #[default]
    Stop,
}

impl PlayState {
    pub fn label(self) -> &'static str {
        match self {
            PlayState::Play => "Playing",
            PlayState::Pause => "Paused",
            PlayState::Stop => "Stopped",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub state: PlayState,
    /// `None` when the server has no mixer.
    pub volume: Option<u8>,
    pub repeat: bool,
    pub random: bool,
    pub single: bool,
    pub consume: bool,
    pub playlist_version: u32,
    pub playlist_length: usize,
    /// Position of the current song in the queue.
    pub song: Option<usize>,
    pub song_id: Option<u32>,
    /// Seconds into the current song.
    pub elapsed: u32,
    /// Length of the current song in seconds.
    pub duration: u32,
    pub updating_db: bool,
}

impl Status {
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Play
    }

    /// Whether there is a current song the server can seek in.
    pub fn is_active(&self) -> bool {
        matches!(self.state, PlayState::Play | PlayState::Pause)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub artists: u64,
    pub albums: u64,
    pub songs: u64,
    pub uptime: u64,
    pub playtime: u64,
    pub db_playtime: u64,
    /// Unix timestamp of the last database update.
    pub db_update: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Song {
    pub uri: String,
    /// Queue id, present only for songs listed from the queue.
    pub id: Option<u32>,
    pub pos: Option<usize>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub duration: Option<u32>,
    pub rating: u8,
}

impl Song {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into(), ..Self::default() }
    }

    /// Title tag, or the file name when the song is untagged.
    pub fn display_title(&self) -> &str {
        match &self.title {
            Some(title) if !title.is_empty() => title,
            _ => basename(&self.uri),
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq)]
pub enum DirEntry {
    Parent,
    Directory(String),
    File(Song),
    Playlist(String),
}

impl DirEntry {
    pub fn label(&self) -> &str {
        match self {
            DirEntry::Parent => "..",
            DirEntry::Directory(path) => basename(path),
            DirEntry::File(song) => song.display_title(),
            DirEntry::Playlist(name) => name,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            DirEntry::Parent => None,
            DirEntry::Directory(path) | DirEntry::Playlist(path) => Some(path),
            DirEntry::File(song) => Some(&song.uri),
        }
    }
}

pub fn basename(path: &str) -> &str {
    Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or(path)
}

/// Parent directory of a server path, `""` for the root.
pub fn dirname(path: &str) -> &str {
    Path::new(path).parent().and_then(|p| p.to_str()).unwrap_or("")
}

/// Everything the panels read from the server in a sync cycle.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub status: Status,
    pub stats: Stats,
    pub current: Option<Song>,
    pub queue: Vec<Song>,
    /// Playlist version `queue` was listed at.
    pub queue_version: Option<u32>,
}

impl Snapshot {
    /// Query the server. A partial refresh leaves the queue listing alone so
    /// speculative edits survive a sync taken in the middle of a gesture.
    pub fn refresh(&mut self, remote: &mut dyn PlaybackService, partial: bool, ratings: bool) -> Result<(), RemoteError> {
        self.status = remote.status()?;
        self.stats = remote.stats()?;
        self.current = remote.current_song()?;

        if partial || self.queue_version == Some(self.status.playlist_version) {
            return Ok(());
        }

        let mut queue = remote.queue()?;
        if ratings {
            for song in &mut queue {
                song.rating = match remote.rating(&song.uri) {
                    Ok(rating) => rating.unwrap_or(0),
                    Err(e) if !e.is_fatal() => 0,
                    Err(e) => return Err(e),
                };
            }
        }
        debug!(version = self.status.playlist_version, len = queue.len(), "queue listed");
        self.queue = queue;
        self.queue_version = Some(self.status.playlist_version);
        Ok(())
    }

    /// Forget the queue listing so the next full refresh lists it again.
    pub fn invalidate_queue(&mut self) {
        self.queue_version = None;
    }
}
