//! In-memory doubles for tests of code built on this crate.
//!
//! Enabled inside this crate's own tests and, for dependents, through the
//! `test-support` feature.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::board::Board;
use crate::config::Config;
use crate::module::{Cycle, Prompt};
use crate::pending::PendingQueue;
use crate::remote::{Command, PlaybackService, RemoteError};
use crate::search::SearchPattern;
use crate::snapshot::{DirEntry, PlayState, Song, Stats, Status};

/// A playback server held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct FakeRemote {
    pub status: Status,
    pub stats: Stats,
    pub queue: Vec<Song>,
    pub library: Vec<Song>,
    pub playlists: Vec<String>,
    pub ratings: HashMap<String, u8>,
    /// Every command accepted through `execute`.
    pub executed: Vec<Command>,
    /// Every batch submitted, accepted or not.
    pub batches: Vec<Vec<Command>>,
    pub queue_listings: usize,
    pub subscribed: bool,
    pub subscriptions: usize,
    /// Reported by `notification_pending` while subscribed.
    pub notify: bool,
    /// Command prefixes the server refuses, with the message it answers.
    pub rejections: Vec<(String, String)>,
    /// Fail every request with a transport error.
    pub broken: bool,
    next_id: u32,
}

impl FakeRemote {
    pub fn with_queue(uris: &[&str]) -> Self {
        let mut remote = Self::default();
        for uri in uris {
            remote.push_song(uri);
        }
        remote
    }

    /// Append a song to the queue as another client would.
    pub fn push_song(&mut self, uri: &str) -> u32 {
        let song = self.library.iter().find(|s| s.uri == uri).cloned().unwrap_or_else(|| Song::new(uri));
        self.enqueue(song)
    }

    pub fn add_library_song(&mut self, uri: &str, artist: &str, album: &str, title: &str) {
        let mut song = Song::new(uri);
        song.artist = Some(artist.to_string());
        song.album = Some(album.to_string());
        song.title = Some(title.to_string());
        self.library.push(song);
    }

    pub fn reject(&mut self, prefix: &str, message: &str) {
        self.rejections.push((prefix.to_string(), message.to_string()));
    }

    pub fn queue_uris(&self) -> Vec<&str> {
        self.queue.iter().map(|s| s.uri.as_str()).collect()
    }

    pub fn play(&mut self, pos: usize, duration: u32) {
        self.status.state = PlayState::Play;
        self.status.song = Some(pos);
        self.status.song_id = self.queue.get(pos).and_then(|s| s.id);
        self.status.duration = duration;
    }

    fn enqueue(&mut self, mut song: Song) -> u32 {
        self.next_id += 1;
        song.id = Some(self.next_id);
        self.queue.push(song);
        self.renumber();
        self.next_id
    }

    fn renumber(&mut self) {
        for (pos, song) in self.queue.iter_mut().enumerate() {
            song.pos = Some(pos);
        }
        self.status.playlist_version += 1;
        self.status.playlist_length = self.queue.len();
    }

    fn check(&self) -> Result<(), RemoteError> {
        if self.broken {
            return Err(RemoteError::Io(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")));
        }
        if self.subscribed {
            return Err(RemoteError::Subscribed);
        }
        Ok(())
    }

    fn rejected(command: &Command, index: usize, message: &str) -> RemoteError {
        RemoteError::Rejected { code: 50, index, command: command.to_string(), message: message.to_string() }
    }

    fn apply(&mut self, command: &Command, index: usize) -> Result<(), RemoteError> {
        let wire = command.to_string();
        if let Some((_, message)) = self.rejections.iter().find(|(prefix, _)| wire.starts_with(prefix.as_str())) {
            return Err(Self::rejected(command, index, message));
        }
        match command {
            Command::PlayId(id) => {
                let pos = self.queue.iter().position(|s| s.id == Some(*id)).ok_or_else(|| Self::rejected(command, index, "No such song"))?;
                self.play(pos, self.queue[pos].duration.unwrap_or(0));
                self.status.elapsed = 0;
            }
            Command::TogglePause => {
                self.status.state = match self.status.state {
                    PlayState::Play => PlayState::Pause,
                    _ => PlayState::Play,
                }
            }
            Command::Stop => self.status.state = PlayState::Stop,
            Command::Previous | Command::Next => {}
            Command::SetVolume(v) => self.status.volume = Some(*v),
            Command::SeekId { position, .. } => self.status.elapsed = *position,
            Command::Consume(on) => self.status.consume = *on,
            Command::Random(on) => self.status.random = *on,
            Command::Repeat(on) => self.status.repeat = *on,
            Command::Single(on) => self.status.single = *on,
            Command::Add(uri) => {
                let songs: Vec<Song> = self
                    .library
                    .iter()
                    .filter(|s| uri.is_empty() || s.uri == *uri || s.uri.starts_with(&format!("{}/", uri)))
                    .cloned()
                    .collect();
                if songs.is_empty() {
                    self.enqueue(Song::new(uri.clone()));
                }
                for song in songs {
                    self.enqueue(song);
                }
            }
            Command::FindAdd { tag, value } => {
                let songs: Vec<Song> =
                    self.library.iter().filter(|s| tag_value(s, tag) == Some(value.as_str())).cloned().collect();
                for song in songs {
                    self.enqueue(song);
                }
            }
            Command::DeleteId(id) => {
                let pos = self.queue.iter().position(|s| s.id == Some(*id)).ok_or_else(|| Self::rejected(command, index, "No such song"))?;
                self.queue.remove(pos);
                self.renumber();
            }
            Command::Swap(a, b) => {
                if *a >= self.queue.len() || *b >= self.queue.len() {
                    return Err(Self::rejected(command, index, "Bad song index"));
                }
                self.queue.swap(*a, *b);
                self.renumber();
            }
            Command::Shuffle => {
                self.queue.reverse();
                self.renumber();
            }
            Command::Clear => {
                self.queue.clear();
                self.renumber();
            }
            Command::Save(name) => {
                if self.playlists.contains(name) {
                    return Err(Self::rejected(command, index, "Playlist already exists"));
                }
                self.playlists.push(name.clone());
            }
            Command::Load(name) | Command::RemovePlaylist(name) => {
                if !self.playlists.contains(name) {
                    return Err(Self::rejected(command, index, "No such playlist"));
                }
                if matches!(command, Command::RemovePlaylist(_)) {
                    self.playlists.retain(|p| p != name);
                }
            }
            Command::Update => self.status.updating_db = true,
            Command::SetRating { uri, rating } => {
                self.ratings.insert(uri.clone(), *rating);
            }
        }
        Ok(())
    }
}

fn tag_value<'a>(song: &'a Song, tag: &str) -> Option<&'a str> {
    match tag {
        "artist" => song.artist.as_deref(),
        "album" => song.album.as_deref(),
        "title" => song.title.as_deref(),
        "genre" => song.genre.as_deref(),
        "date" => song.date.as_deref(),
        "file" => Some(&song.uri),
        _ => None,
    }
}

fn unknown_tag(tag: &str) -> RemoteError {
    RemoteError::Rejected { code: 2, index: 0, command: "find".into(), message: format!("Unknown tag type: {}", tag) }
}

impl PlaybackService for FakeRemote {
    fn status(&mut self) -> Result<Status, RemoteError> {
        self.check()?;
        Ok(self.status.clone())
    }

    fn stats(&mut self) -> Result<Stats, RemoteError> {
        self.check()?;
        Ok(self.stats.clone())
    }

    fn current_song(&mut self) -> Result<Option<Song>, RemoteError> {
        self.check()?;
        Ok(self.status.song.and_then(|pos| self.queue.get(pos).cloned()))
    }

    fn queue(&mut self) -> Result<Vec<Song>, RemoteError> {
        self.check()?;
        self.queue_listings += 1;
        Ok(self.queue.clone())
    }

    fn rating(&mut self, uri: &str) -> Result<Option<u8>, RemoteError> {
        self.check()?;
        Ok(self.ratings.get(uri).copied())
    }

    fn browse(&mut self, dir: &str) -> Result<Vec<DirEntry>, RemoteError> {
        self.check()?;
        let prefix = if dir.is_empty() { String::new() } else { format!("{}/", dir) };
        let mut dirs = BTreeSet::new();
        let mut files = Vec::new();
        for song in &self.library {
            let Some(rest) = song.uri.strip_prefix(&prefix) else { continue };
            match rest.split_once('/') {
                Some((child, _)) => {
                    dirs.insert(format!("{}{}", prefix, child));
                }
                None => files.push(DirEntry::File(song.clone())),
            }
        }
        let mut entries: Vec<DirEntry> = dirs.into_iter().map(DirEntry::Directory).collect();
        entries.extend(files);
        if dir.is_empty() {
            entries.extend(self.playlists.iter().cloned().map(DirEntry::Playlist));
        }
        Ok(entries)
    }

    fn list(&mut self, tag: &str, filter: Option<(&str, &str)>) -> Result<Vec<String>, RemoteError> {
        self.check()?;
        let mut values = BTreeSet::new();
        for song in &self.library {
            if let Some((ftag, fvalue)) = filter
                && tag_value(song, ftag) != Some(fvalue)
            {
                continue;
            }
            if let Some(value) = tag_value(song, tag) {
                values.insert(value.to_string());
            }
        }
        Ok(values.into_iter().collect())
    }

    fn find(&mut self, tag: &str, value: &str) -> Result<Vec<Song>, RemoteError> {
        self.check()?;
        if !["artist", "album", "title", "genre", "date", "file"].contains(&tag) {
            return Err(unknown_tag(tag));
        }
        Ok(self.library.iter().filter(|s| tag_value(s, tag) == Some(value)).cloned().collect())
    }

    fn find_in_queue(&mut self, uri: &str) -> Result<Option<Song>, RemoteError> {
        self.check()?;
        Ok(self.queue.iter().find(|s| s.uri == uri).cloned())
    }

    fn song_info(&mut self, uri: &str) -> Result<Option<Song>, RemoteError> {
        self.check()?;
        Ok(self.library.iter().find(|s| s.uri == uri).cloned())
    }

    fn add_id(&mut self, uri: &str) -> Result<u32, RemoteError> {
        self.check()?;
        Ok(self.push_song(uri))
    }

    fn execute(&mut self, command: &Command) -> Result<(), RemoteError> {
        self.check()?;
        self.apply(command, 0)?;
        self.executed.push(command.clone());
        Ok(())
    }

    fn submit_batch(&mut self, commands: &[Command]) -> Result<(), RemoteError> {
        self.check()?;
        self.batches.push(commands.to_vec());
        // Like MPD: commands before the failing one stay applied.
        for (index, command) in commands.iter().enumerate() {
            self.apply(command, index)?;
        }
        Ok(())
    }

    fn subscribe(&mut self) -> Result<(), RemoteError> {
        self.check()?;
        self.subscribed = true;
        self.subscriptions += 1;
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<Vec<String>, RemoteError> {
        if self.broken {
            return self.check().map(|_| Vec::new());
        }
        self.subscribed = false;
        let changed = if std::mem::take(&mut self.notify) { vec!["player".to_string()] } else { Vec::new() };
        Ok(changed)
    }

    fn notification_pending(&mut self) -> bool {
        self.subscribed && self.notify
    }
}

/// Answers prompts from a script, then cancels.
#[derive(Debug, Default)]
pub struct FakePrompt {
    pub answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl FakePrompt {
    pub fn answering(answers: &[&str]) -> Self {
        Self { answers: answers.iter().map(|a| a.to_string()).collect(), asked: Vec::new() }
    }
}

impl Prompt for FakePrompt {
    fn prompt(&mut self, label: &str) -> Option<String> {
        self.asked.push(label.to_string());
        self.answers.pop_front()
    }
}

/// Owns everything a [`Cycle`] borrows, so panel tests can run phases directly.
pub struct Rig {
    pub board: Board,
    pub remote: FakeRemote,
    pub pending: PendingQueue,
    pub prompt: FakePrompt,
    pub search: SearchPattern,
    pub config: Config,
    pub online: bool,
}

impl Rig {
    pub fn new(remote: FakeRemote) -> Self {
        Self {
            board: Board::new(),
            remote,
            pending: PendingQueue::new(),
            prompt: FakePrompt::default(),
            search: SearchPattern::default(),
            config: Config::default(),
            online: true,
        }
    }

    pub fn cycle(&mut self) -> Cycle<'_> {
        Cycle {
            board: &mut self.board,
            remote: &mut self.remote,
            pending: &mut self.pending,
            prompt: &mut self.prompt,
            search: &self.search,
            config: &self.config,
            online: self.online,
        }
    }
}
