//! Keys that act on playback whatever panel has focus.
//!
//! They run before the focused panel sees the key and do not consume it.

use crossterm::event::KeyCode;

use mpy_base::board::Entry;
use mpy_base::module::Cycle;
use mpy_base::remote::Command;
use mpy_base::snapshot::Snapshot;

/// A seek gesture held on the arrow keys, committed when released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seek {
    id: u32,
    position: u32,
}

#[derive(Debug, Default)]
pub struct Controls {
    seek: Option<Seek>,
}

impl Controls {
    /// Apply `key`. Mutations the bars show are mirrored into `snapshot`
    /// straight away. Returns a new in-list search pattern and its direction
    /// when one was entered.
    pub fn handle(&mut self, key: Option<KeyCode>, snapshot: &mut Snapshot, cycle: &mut Cycle<'_>) -> Option<(String, bool)> {
        if let Some(key @ (KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down)) = key {
            self.seek(key, snapshot, cycle.config.seek_step_percent);
            return None;
        }
        if let Some(seek) = self.seek.take() {
            cycle.dispatch(Command::SeekId { id: seek.id, position: seek.position });
        }

        let status = &mut snapshot.status;
        match key? {
            KeyCode::Char(' ') => cycle.dispatch(Command::TogglePause),
            KeyCode::Char('s') => cycle.dispatch(Command::Stop),
            KeyCode::Char('<') => cycle.dispatch(Command::Previous),
            KeyCode::Char('>') => cycle.dispatch(Command::Next),
            key @ (KeyCode::Char('9') | KeyCode::Char('0')) => {
                let volume = status.volume?;
                let volume = if key == KeyCode::Char('9') { volume.saturating_sub(1) } else { volume.saturating_add(1).min(100) };
                status.volume = Some(volume);
                cycle.dispatch(Command::SetVolume(volume));
            }
            KeyCode::Char('u') => {
                status.consume = !status.consume;
                cycle.dispatch(Command::Consume(status.consume));
            }
            KeyCode::Char('i') => {
                status.random = !status.random;
                cycle.dispatch(Command::Random(status.random));
            }
            KeyCode::Char('o') => {
                status.repeat = !status.repeat;
                cycle.dispatch(Command::Repeat(status.repeat));
            }
            KeyCode::Char('p') => {
                status.single = !status.single;
                cycle.dispatch(Command::Single(status.single));
            }
            KeyCode::Char('S') => {
                let name = ask(cycle, "Save")?;
                if cycle.execute(Command::Save(name.clone())) {
                    cycle.board.post_status(format!("Playlist {} saved", name));
                    cycle.board.post(Entry::PlaylistSaved);
                }
            }
            KeyCode::Char('O') => {
                let name = ask(cycle, "Load")?;
                if cycle.execute(Command::Load(name.clone())) {
                    cycle.board.post_status(format!("Playlist {} loaded", name));
                }
            }
            key @ (KeyCode::Char('/') | KeyCode::Char('?')) => {
                let text = ask(cycle, "Find")?;
                return Some((text, key == KeyCode::Char('/')));
            }
            _ => {}
        }
        None
    }

    fn seek(&mut self, key: KeyCode, snapshot: &mut Snapshot, step_percent: u32) {
        let status = &mut snapshot.status;
        let Some(id) = status.song_id.filter(|_| status.is_active()) else {
            return;
        };
        let duration = status.duration;
        let from = match self.seek {
            Some(seek) if seek.id == id => seek.position,
            _ => status.elapsed,
        };
        let step = (duration * step_percent / 100).max(1);
        let position = match key {
            KeyCode::Left => from.saturating_sub(1),
            KeyCode::Right => from + 1,
            KeyCode::Down => from.saturating_sub(step),
            _ => from + step,
        }
        .min(duration);
        status.elapsed = position;
        self.seek = Some(Seek { id, position });
    }
}

/// Prompt on the message line; blank answers count as cancelled.
fn ask(cycle: &mut Cycle<'_>, label: &str) -> Option<String> {
    cycle.prompt.prompt(label).filter(|text| !text.is_empty())
}
