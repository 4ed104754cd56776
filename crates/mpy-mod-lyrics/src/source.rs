//! Where lyrics come from: the local `.lrc` cache and the network.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LyricsError {
    #[error("lyrics cache: {0}")]
    Io(#[from] io::Error),
    #[error("lyrics request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("no lyrics for {artist} - {title}")]
    NotFound { artist: String, title: String },
    #[error("song has no artist/title")]
    MissingTags,
}

/// A slow lookup of LRC text by artist and title.
pub trait LyricsSource: Send {
    fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError>;
}

// ============================================================================
// Local cache
// ============================================================================

/// `.lrc` files named `<artist>-<title>.lrc` in one directory.
#[derive(Debug, Clone)]
pub struct LyricsStore {
    dir: PathBuf,
}

impl LyricsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(artist: &str, title: &str) -> String {
        format!("{}-{}.lrc", artist.replace('/', "_"), title.replace('/', "_"))
    }

    pub fn path(&self, artist: &str, title: &str) -> PathBuf {
        self.dir.join(Self::file_name(artist, title))
    }

    /// `Ok(None)` when nothing is cached.
    pub fn load(&self, artist: &str, title: &str) -> Result<Option<String>, LyricsError> {
        match fs::read_to_string(self.path(artist, title)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, artist: &str, title: &str, lyrics: &str) -> Result<PathBuf, LyricsError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(artist, title);
        fs::write(&path, lyrics)?;
        info!(path = %path.display(), "lyrics saved");
        Ok(path)
    }
}

// ============================================================================
// LRCLIB
// ============================================================================

#[derive(Deserialize)]
struct LrclibTrack {
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

/// Synced lyrics from an LRCLIB-compatible `GET /api/get` endpoint.
pub struct LrclibSource {
    client: Client,
    endpoint: String,
}

impl LrclibSource {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, LyricsError> {
        let client = Client::builder()
            .user_agent(concat!("mpy/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

impl LyricsSource for LrclibSource {
    fn fetch(&self, artist: &str, title: &str) -> Result<String, LyricsError> {
        debug!(%artist, %title, "lyrics request");
        let not_found = || LyricsError::NotFound { artist: artist.to_string(), title: title.to_string() };
        let response = self.client.get(&self.endpoint).query(&[("artist_name", artist), ("track_name", title)]).send()?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        let body = response.error_for_status()?.text()?;
        let track: LrclibTrack = serde_json::from_str(&body).map_err(|_| not_found())?;
        track.synced_lyrics.filter(|l| !l.trim().is_empty()).ok_or_else(not_found)
    }
}
