//! Single-cycle message board for cross-panel signaling.
//!
//! The controller clears the board at the start of every cycle. Entries are
//! keyed by [`Topic`], so a second post on the same topic replaces the first.

use std::collections::HashMap;

use crate::module::ModuleId;
use crate::snapshot::Song;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Locate,
    Status,
    Focus,
    Back,
    QueueSelection,
    DatabaseSelection,
    PlaylistSaved,
    DatabaseUpdated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Ask `target` to bring the item with this uri into view.
    Locate { target: ModuleId, uri: String },
    /// Short human readable message for the message line.
    Status(String),
    /// Switch the active panel after settlement.
    Focus(ModuleId),
    /// Return to the previously active panel.
    Back,
    QueueSelection(Song),
    DatabaseSelection(Option<String>),
    PlaylistSaved,
    DatabaseUpdated,
}

impl Entry {
    pub fn topic(&self) -> Topic {
        match self {
            Entry::Locate { .. } => Topic::Locate,
            Entry::Status(_) => Topic::Status,
            Entry::Focus(_) => Topic::Focus,
            Entry::Back => Topic::Back,
            Entry::QueueSelection(_) => Topic::QueueSelection,
            Entry::DatabaseSelection(_) => Topic::DatabaseSelection,
            Entry::PlaylistSaved => Topic::PlaylistSaved,
            Entry::DatabaseUpdated => Topic::DatabaseUpdated,
        }
    }
}

#[derive(Debug, Default)]
pub struct Board {
    entries: HashMap<Topic, Entry>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, entry: Entry) {
        self.entries.insert(entry.topic(), entry);
    }

    pub fn post_status(&mut self, message: impl Into<String>) {
        self.post(Entry::Status(message.into()));
    }

    pub fn locate(&mut self, target: ModuleId, uri: impl Into<String>) {
        self.post(Entry::Locate { target, uri: uri.into() });
    }

    pub fn get(&self, topic: Topic) -> Option<&Entry> {
        self.entries.get(&topic)
    }

    pub fn contains(&self, topic: Topic) -> bool {
        self.entries.contains_key(&topic)
    }

    pub fn take(&mut self, topic: Topic) -> Option<Entry> {
        self.entries.remove(&topic)
    }

    /// Consume a locate request addressed to `target`, leaving others in place.
    pub fn take_locate(&mut self, target: ModuleId) -> Option<String> {
        match self.entries.get(&Topic::Locate) {
            Some(Entry::Locate { target: t, .. }) if *t == target => {}
            _ => return None,
        }
        match self.entries.remove(&Topic::Locate) {
            Some(Entry::Locate { uri, .. }) => Some(uri),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self.entries.get(&Topic::Status) {
            Some(Entry::Status(message)) => Some(message),
            _ => None,
        }
    }

    pub fn queue_selection(&self) -> Option<&Song> {
        match self.entries.get(&Topic::QueueSelection) {
            Some(Entry::QueueSelection(song)) => Some(song),
            _ => None,
        }
    }

    pub fn database_selection(&self) -> Option<&str> {
        match self.entries.get(&Topic::DatabaseSelection) {
            Some(Entry::DatabaseSelection(uri)) => uri.as_deref(),
            _ => None,
        }
    }

    pub fn topics(&self) -> impl Iterator<Item = Topic> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
