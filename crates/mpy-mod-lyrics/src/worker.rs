//! Background lyrics lookup.
//!
//! One long-lived thread per panel. The panel writes `requested`, the worker
//! writes the result fields, and both only touch them under the monitor. The
//! panel side never blocks: it uses `try_lock` and retries next cycle.

use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::source::{LyricsError, LyricsSource, LyricsStore};

pub const NO_TAGS: &str = "[00:00.00]Cannot fetch lyrics (No artist/title).";
pub const UNAVAILABLE: &str = "[00:00.00]Lyrics unavailable.";

/// Identifies the song lyrics are wanted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsKey {
    pub uri: String,
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl LyricsKey {
    pub fn tags(&self) -> Option<(&str, &str)> {
        match (self.artist.as_deref(), self.title.as_deref()) {
            (Some(artist), Some(title)) if !artist.is_empty() && !title.is_empty() => Some((artist, title)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultState {
    #[default]
    Idle,
    LocalHit,
    Fetched,
    /// Already taken by the panel.
    Stale,
}

#[derive(Debug, Default)]
struct Slot {
    requested: Option<LyricsKey>,
    handled: Option<LyricsKey>,
    payload: String,
    result_key: Option<LyricsKey>,
    state: ResultState,
}

impl Slot {
    fn working(&self) -> bool {
        self.requested != self.handled
    }
}

/// A result handed to the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub key: Option<LyricsKey>,
    pub payload: String,
    pub state: ResultState,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Poll {
    /// The monitor was held, or a lookup is in flight.
    Busy,
    /// Nothing new since the last delivery.
    Unchanged,
    Ready(Delivery),
}

type Shared = Arc<(Mutex<Slot>, Condvar)>;

pub struct LyricsWorker {
    shared: Shared,
    _handle: JoinHandle<()>,
}

impl LyricsWorker {
    pub fn spawn(store: LyricsStore, source: Option<Box<dyn LyricsSource>>) -> io::Result<Self> {
        let shared: Shared = Arc::new((Mutex::new(Slot::default()), Condvar::new()));
        let worker_shared = Arc::clone(&shared);
        let fetch = source.is_some();
        let handle = thread::Builder::new()
            .name("lyrics".into())
            .spawn(move || run(worker_shared, store, source))?;
        info!(fetch, "lyrics worker started");
        Ok(Self { shared, _handle: handle })
    }

    fn try_slot(&self) -> Option<MutexGuard<'_, Slot>> {
        match self.shared.0.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(e)) => Some(e.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    /// Ask for lyrics of `key`. Returns false if the monitor was busy, in
    /// which case the caller retries next cycle.
    pub fn request(&self, key: Option<LyricsKey>) -> bool {
        let Some(mut slot) = self.try_slot() else { return false };
        if slot.requested != key {
            debug!(key = ?key, "lyrics requested");
            slot.requested = key;
            self.shared.1.notify_one();
        }
        true
    }

    /// Take the latest result if there is a new one.
    pub fn poll(&self) -> Poll {
        let Some(mut slot) = self.try_slot() else { return Poll::Busy };
        if slot.working() {
            return Poll::Busy;
        }
        match slot.state {
            ResultState::LocalHit | ResultState::Fetched => {
                let delivery =
                    Delivery { key: slot.result_key.clone(), payload: slot.payload.clone(), state: slot.state };
                slot.state = ResultState::Stale;
                Poll::Ready(delivery)
            }
            ResultState::Idle | ResultState::Stale => Poll::Unchanged,
        }
    }
}

fn run(shared: Shared, store: LyricsStore, source: Option<Box<dyn LyricsSource>>) {
    let (lock, cvar) = &*shared;
    let mut slot = lock.lock().unwrap_or_else(|e| e.into_inner());
    loop {
        while !slot.working() {
            slot = cvar.wait(slot).unwrap_or_else(|e| e.into_inner());
        }
        let key = slot.requested.clone();
        drop(slot);

        let (payload, state) = lookup(key.as_ref(), &store, source.as_deref());

        slot = lock.lock().unwrap_or_else(|e| e.into_inner());
        slot.payload = payload;
        slot.state = state;
        slot.result_key = key.clone();
        slot.handled = key;
    }
}

fn lookup(key: Option<&LyricsKey>, store: &LyricsStore, source: Option<&dyn LyricsSource>) -> (String, ResultState) {
    let Some((artist, title)) = key.and_then(|k| k.tags()) else {
        return (NO_TAGS.to_string(), ResultState::LocalHit);
    };
    match store.load(artist, title) {
        Ok(Some(text)) => {
            debug!(%artist, %title, "lyrics cache hit");
            return (text, ResultState::LocalHit);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "lyrics cache unreadable"),
    }
    let result = match source {
        Some(source) => source.fetch(artist, title),
        None => Err(LyricsError::NotFound { artist: artist.to_string(), title: title.to_string() }),
    };
    match result {
        Ok(text) => {
            info!(%artist, %title, "lyrics fetched");
            (text, ResultState::Fetched)
        }
        Err(e) => {
            warn!(error = %e, "lyrics lookup failed");
            (UNAVAILABLE.to_string(), ResultState::Fetched)
        }
    }
}
