//! Capability interface to the playback server.

use std::fmt;

use thiserror::Error;

use crate::snapshot::{DirEntry, Song, Stats, Status};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server refused a command. `message` is meant for the user.
    #[error("{message}")]
    Rejected { code: u32, index: usize, command: String, message: String },
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("command sent while subscribed to notifications")]
    Subscribed,
}

impl RemoteError {
    /// Transport and framing failures leave the connection unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RemoteError::Io(_) | RemoteError::Protocol(_))
    }
}

/// A state-changing request. Reads go through the query methods instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PlayId(u32),
    TogglePause,
    Stop,
    Previous,
    Next,
    SetVolume(u8),
    SeekId { id: u32, position: u32 },
    Consume(bool),
    Random(bool),
    Repeat(bool),
    Single(bool),
    Add(String),
    FindAdd { tag: String, value: String },
    DeleteId(u32),
    Swap(usize, usize),
    Shuffle,
    Clear,
    Save(String),
    Load(String),
    RemovePlaylist(String),
    Update,
    SetRating { uri: String, rating: u8 },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PlayId(id) => write!(f, "playid {}", id),
            Command::TogglePause => write!(f, "pause"),
            Command::Stop => write!(f, "stop"),
            Command::Previous => write!(f, "previous"),
            Command::Next => write!(f, "next"),
            Command::SetVolume(v) => write!(f, "setvol {}", v),
            Command::SeekId { id, position } => write!(f, "seekid {} {}", id, position),
            Command::Consume(on) => write!(f, "consume {}", u8::from(*on)),
            Command::Random(on) => write!(f, "random {}", u8::from(*on)),
            Command::Repeat(on) => write!(f, "repeat {}", u8::from(*on)),
            Command::Single(on) => write!(f, "single {}", u8::from(*on)),
            Command::Add(uri) => write!(f, "add {:?}", uri),
            Command::FindAdd { tag, value } => write!(f, "findadd {} {:?}", tag, value),
            Command::DeleteId(id) => write!(f, "deleteid {}", id),
            Command::Swap(a, b) => write!(f, "swap {} {}", a, b),
            Command::Shuffle => write!(f, "shuffle"),
            Command::Clear => write!(f, "clear"),
            Command::Save(name) => write!(f, "save {:?}", name),
            Command::Load(name) => write!(f, "load {:?}", name),
            Command::RemovePlaylist(name) => write!(f, "rm {:?}", name),
            Command::Update => write!(f, "update"),
            Command::SetRating { uri, rating } => write!(f, "sticker set song {:?} rating {}", uri, rating),
        }
    }
}

/// Synchronous client for the playback server.
///
/// Between [`subscribe`](Self::subscribe) and [`unsubscribe`](Self::unsubscribe)
/// the connection only waits for change notifications; every other call fails
/// with [`RemoteError::Subscribed`].
pub trait PlaybackService {
    fn status(&mut self) -> Result<Status, RemoteError>;
    fn stats(&mut self) -> Result<Stats, RemoteError>;
    fn current_song(&mut self) -> Result<Option<Song>, RemoteError>;
    /// Every song in the play queue, in order.
    fn queue(&mut self) -> Result<Vec<Song>, RemoteError>;
    /// Stored rating of a song, `None` if it has never been rated.
    fn rating(&mut self, uri: &str) -> Result<Option<u8>, RemoteError>;
    /// Contents of one database directory, `""` being the root.
    fn browse(&mut self, dir: &str) -> Result<Vec<DirEntry>, RemoteError>;
    /// Distinct values of `tag`, optionally restricted to songs matching `filter`.
    fn list(&mut self, tag: &str, filter: Option<(&str, &str)>) -> Result<Vec<String>, RemoteError>;
    /// Database songs whose `tag` equals `value`.
    fn find(&mut self, tag: &str, value: &str) -> Result<Vec<Song>, RemoteError>;
    fn find_in_queue(&mut self, uri: &str) -> Result<Option<Song>, RemoteError>;
    /// Database metadata for a single file.
    fn song_info(&mut self, uri: &str) -> Result<Option<Song>, RemoteError>;
    /// Append a song to the queue and return its queue id.
    fn add_id(&mut self, uri: &str) -> Result<u32, RemoteError>;
    fn execute(&mut self, command: &Command) -> Result<(), RemoteError>;
    /// Send `commands` as one list. On error the server stops at the failing
    /// command, which is reported through `RemoteError::Rejected::index`;
    /// the commands before it stay applied.
    fn submit_batch(&mut self, commands: &[Command]) -> Result<(), RemoteError>;
    fn subscribe(&mut self) -> Result<(), RemoteError>;
    /// Stop waiting for notifications, returning the subsystems that changed.
    fn unsubscribe(&mut self) -> Result<Vec<String>, RemoteError>;
    /// Whether a notification arrived since [`subscribe`](Self::subscribe).
    /// Never blocks.
    fn notification_pending(&mut self) -> bool;
}

/// Play `uri`, queueing it first if it is not already in the queue.
pub fn play_uri(remote: &mut dyn PlaybackService, uri: &str) -> Result<(), RemoteError> {
    let id = match remote.find_in_queue(uri)?.and_then(|song| song.id) {
        Some(id) => id,
        None => remote.add_id(uri)?,
    };
    remote.execute(&Command::PlayId(id))
}
