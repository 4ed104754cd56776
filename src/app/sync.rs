//! Per-event sync decision and the notification-mode state of the connection.

use crossterm::event::KeyCode;
use tracing::debug;

use mpy_base::config::constants::QUIT_KEY;
use mpy_base::module::Module;
use mpy_base::remote::{PlaybackService, RemoteError};

/// What woke the controller up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Startup,
    /// The polling interval elapsed without input.
    Timeout,
    /// The server pushed a change while the connection was idle.
    Notification,
    Input(KeyCode),
    Resize(u16, u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Quit,
    /// Handle the event from cached state only.
    Local,
    /// Talk to the server first. A partial sync keeps held-back edits queued
    /// and the queue listing untouched.
    Sync { partial: bool },
}

/// Navigation that never needs the server, whatever panel has focus.
pub const GLOBAL_EXEMPT: &[KeyCode] = &[
    KeyCode::Char('j'),
    KeyCode::Char('k'),
    KeyCode::Char('f'),
    KeyCode::Char('b'),
    KeyCode::Char('H'),
    KeyCode::Char('M'),
    KeyCode::Char('L'),
    KeyCode::Char('g'),
    KeyCode::Char('G'),
    KeyCode::F(1),
    KeyCode::F(2),
    KeyCode::F(3),
    KeyCode::F(4),
    KeyCode::Char('/'),
    KeyCode::Char('?'),
    KeyCode::Char('n'),
    KeyCode::Char('N'),
];

/// The seek gesture accumulates locally until released.
pub const GLOBAL_PARTIAL: &[KeyCode] = &[KeyCode::Left, KeyCode::Right, KeyCode::Up, KeyCode::Down];

/// The global key sets plus those of the focused panel.
#[derive(Default)]
pub struct KeySets<'a> {
    exempt: &'a [KeyCode],
    partial: &'a [KeyCode],
}

impl<'a> KeySets<'a> {
    pub fn of(focused: &'a dyn Module) -> Self {
        Self { exempt: focused.cycle_exempt_keys(), partial: focused.partial_sync_keys() }
    }

    fn is_exempt(&self, key: KeyCode) -> bool {
        GLOBAL_EXEMPT.contains(&key) || self.exempt.contains(&key)
    }

    fn is_partial(&self, key: KeyCode) -> bool {
        GLOBAL_PARTIAL.contains(&key) || self.partial.contains(&key)
    }
}

/// Decide whether `event` needs the server.
///
/// `last_key` is the key of the previous event, `None` if it was not a key.
/// Quit is recognised before anything else so the cycle can end untouched.
pub fn classify(event: Event, playing: bool, last_key: Option<KeyCode>, keys: &KeySets<'_>) -> Verdict {
    let verdict = match event {
        Event::Input(key) if key == QUIT_KEY => Verdict::Quit,
        Event::Startup | Event::Notification => Verdict::Sync { partial: false },
        Event::Timeout => match last_key {
            Some(key) if !playing && keys.is_exempt(key) => Verdict::Local,
            _ => Verdict::Sync { partial: false },
        },
        Event::Input(key) if playing => Verdict::Sync { partial: keys.is_partial(key) },
        Event::Input(key) if keys.is_exempt(key) || keys.is_partial(key) => Verdict::Local,
        Event::Input(_) => Verdict::Sync { partial: false },
        Event::Resize(..) if playing => Verdict::Sync { partial: false },
        Event::Resize(..) => Verdict::Local,
    };
    debug!(?event, playing, ?last_key, ?verdict, "classified");
    verdict
}

// =============================================================================
// Idle link
// =============================================================================

/// Tracks whether the connection is parked in notification mode.
#[derive(Debug, Default)]
pub struct Link {
    idle: bool,
}

impl Link {
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn enter_idle(&mut self, remote: &mut dyn PlaybackService) -> Result<(), RemoteError> {
        if !self.idle {
            remote.subscribe()?;
            self.idle = true;
        }
        Ok(())
    }

    /// Returns the subsystems the server reported as changed.
    pub fn leave_idle(&mut self, remote: &mut dyn PlaybackService) -> Result<Vec<String>, RemoteError> {
        if !self.idle {
            return Ok(Vec::new());
        }
        self.idle = false;
        let changed = remote.unsubscribe()?;
        if !changed.is_empty() {
            debug!(?changed, "left idle");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpy_base::testing::FakeRemote;

    const NONE: KeySets<'static> = KeySets { exempt: &[], partial: &[] };
    const QUEUE: KeySets<'static> =
        KeySets { exempt: &[KeyCode::Char('l')], partial: &[KeyCode::Char('J'), KeyCode::Char('K')] };

    fn key(c: char) -> Event {
        Event::Input(KeyCode::Char(c))
    }

    #[test]
    fn line_down_is_local_unless_playing() {
        assert_eq!(classify(key('j'), false, None, &NONE), Verdict::Local);
        assert_eq!(classify(key('j'), true, None, &NONE), Verdict::Sync { partial: false });
    }

    #[test]
    fn quit_wins_even_when_playing() {
        assert_eq!(classify(key('q'), true, Some(KeyCode::Char('j')), &QUEUE), Verdict::Quit);
    }

    #[test]
    fn startup_and_notifications_always_sync() {
        for event in [Event::Startup, Event::Notification] {
            assert_eq!(classify(event, false, Some(KeyCode::Char('j')), &NONE), Verdict::Sync { partial: false });
        }
    }

    #[test]
    fn focused_panel_keys_count() {
        assert_eq!(classify(key('l'), false, None, &QUEUE), Verdict::Local);
        assert_eq!(classify(key('l'), false, None, &NONE), Verdict::Sync { partial: false });
        assert_eq!(classify(key('J'), false, None, &QUEUE), Verdict::Local);
        assert_eq!(classify(key('J'), true, None, &QUEUE), Verdict::Sync { partial: true });
        assert_eq!(classify(Event::Input(KeyCode::Up), true, None, &NONE), Verdict::Sync { partial: true });
    }

    #[test]
    fn timeout_follows_previous_key() {
        assert_eq!(classify(Event::Timeout, false, Some(KeyCode::Char('k')), &NONE), Verdict::Local);
        assert_eq!(classify(Event::Timeout, true, Some(KeyCode::Char('k')), &NONE), Verdict::Sync { partial: false });
        // A held-back edit is flushed once the gesture ends.
        assert_eq!(classify(Event::Timeout, false, Some(KeyCode::Char('J')), &QUEUE), Verdict::Sync { partial: false });
        assert_eq!(classify(Event::Timeout, true, None, &NONE), Verdict::Sync { partial: false });
    }

    #[test]
    fn timeout_after_a_non_key_event_syncs() {
        // Startup, notifications and resizes leave no previous key behind.
        assert_eq!(classify(Event::Timeout, false, None, &NONE), Verdict::Sync { partial: false });
        assert_eq!(classify(Event::Timeout, false, None, &QUEUE), Verdict::Sync { partial: false });
    }

    #[test]
    fn resize_syncs_only_while_playing() {
        assert_eq!(classify(Event::Resize(80, 24), false, None, &NONE), Verdict::Local);
        assert_eq!(classify(Event::Resize(80, 24), true, None, &NONE), Verdict::Sync { partial: false });
    }

    #[test]
    fn link_subscribes_once() {
        let mut remote = FakeRemote::default();
        let mut link = Link::default();
        link.enter_idle(&mut remote).unwrap();
        link.enter_idle(&mut remote).unwrap();
        assert!(link.is_idle());
        assert_eq!(remote.subscriptions, 1);

        remote.notify = true;
        assert_eq!(link.leave_idle(&mut remote).unwrap(), vec!["player".to_string()]);
        assert!(!remote.subscribed);
        assert!(link.leave_idle(&mut remote).unwrap().is_empty());
    }
}
