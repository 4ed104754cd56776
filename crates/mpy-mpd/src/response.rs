//! Decoding of MPD `key: value` responses.

use mpy_base::remote::RemoteError;
use mpy_base::snapshot::{DirEntry, PlayState, Song, Stats, Status};

pub type Pairs = Vec<(String, String)>;

/// Split one response line at the first `": "`.
pub fn split_pair(line: &str) -> Result<(String, String), RemoteError> {
    line.split_once(": ")
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| RemoteError::Protocol(format!("malformed line {:?}", line)))
}

/// Parse `ACK [code@index] {command} message`.
pub fn parse_ack(line: &str) -> RemoteError {
    let parsed = (|| {
        let rest = line.strip_prefix("ACK [")?;
        let (code_index, rest) = rest.split_once("] {")?;
        let (code, index) = code_index.split_once('@')?;
        let (command, message) = rest.split_once("} ")?;
        Some(RemoteError::Rejected {
            code: code.parse().ok()?,
            index: index.parse().ok()?,
            command: command.to_string(),
            message: message.to_string(),
        })
    })();
    parsed.unwrap_or_else(|| RemoteError::Protocol(format!("malformed error {:?}", line)))
}

fn flag(value: &str) -> bool {
    value != "0"
}

pub fn parse_status(pairs: &Pairs) -> Status {
    let mut status = Status::default();
    for (key, value) in pairs {
        match key.as_str() {
            "state" => {
                status.state = match value.as_str() {
                    "play" => PlayState::Play,
                    "pause" => PlayState::Pause,
                    _ => PlayState::Stop,
                }
            }
            "volume" => status.volume = value.parse::<i32>().ok().and_then(|v| u8::try_from(v).ok()),
            "repeat" => status.repeat = flag(value),
            "random" => status.random = flag(value),
            "single" => status.single = flag(value),
            "consume" => status.consume = flag(value),
            "playlist" => status.playlist_version = value.parse().unwrap_or(0),
            "playlistlength" => status.playlist_length = value.parse().unwrap_or(0),
            "song" => status.song = value.parse().ok(),
            "songid" => status.song_id = value.parse().ok(),
            "time" => {
                if let Some((elapsed, total)) = value.split_once(':') {
                    status.elapsed = elapsed.parse().unwrap_or(0);
                    status.duration = total.parse().unwrap_or(0);
                }
            }
            "elapsed" => status.elapsed = seconds(value).unwrap_or(status.elapsed),
            "duration" => status.duration = seconds(value).unwrap_or(status.duration),
            "updating_db" => status.updating_db = true,
            _ => {}
        }
    }
    status
}

pub fn parse_stats(pairs: &Pairs) -> Stats {
    let mut stats = Stats::default();
    for (key, value) in pairs {
        let n = value.parse().unwrap_or(0);
        match key.as_str() {
            "artists" => stats.artists = n,
            "albums" => stats.albums = n,
            "songs" => stats.songs = n,
            "uptime" => stats.uptime = n,
            "playtime" => stats.playtime = n,
            "db_playtime" => stats.db_playtime = n,
            "db_update" => stats.db_update = value.parse().unwrap_or(0),
            _ => {}
        }
    }
    stats
}

/// Whole seconds from an integer or fractional value.
fn seconds(value: &str) -> Option<u32> {
    value.parse::<f64>().ok().map(|s| s.max(0.0) as u32)
}

fn apply_song_field(song: &mut Song, key: &str, value: &str) {
    let value = value.to_string();
    match key {
        "Title" => song.title = Some(value),
        "Artist" => song.artist = Some(value),
        "Album" => song.album = Some(value),
        "Track" => song.track = Some(value),
        "Genre" => song.genre = Some(value),
        "Date" => song.date = Some(value),
        "Time" => song.duration = song.duration.or_else(|| seconds(&value)),
        "duration" => song.duration = seconds(&value).or(song.duration),
        "Pos" => song.pos = value.parse().ok(),
        "Id" => song.id = value.parse().ok(),
        _ => {}
    }
}

/// Directory listing. Fields following a `file` line belong to that file.
pub fn parse_entries(pairs: &Pairs) -> Vec<DirEntry> {
    let mut entries = Vec::new();
    for (key, value) in pairs {
        match key.as_str() {
            "directory" => entries.push(DirEntry::Directory(value.clone())),
            "playlist" => entries.push(DirEntry::Playlist(value.clone())),
            "file" => entries.push(DirEntry::File(Song::new(value.clone()))),
            _ => {
                if let Some(DirEntry::File(song)) = entries.last_mut() {
                    apply_song_field(song, key, value);
                }
            }
        }
    }
    entries
}

pub fn parse_songs(pairs: &Pairs) -> Vec<Song> {
    parse_entries(pairs)
        .into_iter()
        .filter_map(|entry| match entry {
            DirEntry::File(song) => Some(song),
            _ => None,
        })
        .collect()
}

/// Values of `tag` from a `list` response.
pub fn parse_values(pairs: &Pairs, tag: &str) -> Vec<String> {
    pairs.iter().filter(|(k, _)| k.eq_ignore_ascii_case(tag)).map(|(_, v)| v.clone()).collect()
}

/// `sticker: rating=4` → 4.
pub fn parse_rating(pairs: &Pairs) -> Option<u8> {
    pairs
        .iter()
        .find(|(k, _)| k == "sticker")
        .and_then(|(_, v)| v.split_once('='))
        .and_then(|(_, n)| n.parse().ok())
}

pub fn find_value<'a>(pairs: &'a Pairs, key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(lines: &[&str]) -> Pairs {
        lines.iter().map(|l| split_pair(l).unwrap()).collect()
    }

    #[test]
    fn ack_lines() {
        match parse_ack("ACK [50@2] {load} No such playlist") {
            RemoteError::Rejected { code, index, command, message } => {
                assert_eq!((code, index), (50, 2));
                assert_eq!(command, "load");
                assert_eq!(message, "No such playlist");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_ack("ACK garbage"), RemoteError::Protocol(_)));
    }

    #[test]
    fn status_fields() {
        let status = parse_status(&pairs(&[
            "volume: -1",
            "repeat: 1",
            "random: 0",
            "single: oneshot",
            "consume: 0",
            "playlist: 12",
            "playlistlength: 3",
            "state: pause",
            "song: 1",
            "songid: 7",
            "time: 61:200",
            "elapsed: 61.480",
            "duration: 200.125",
        ]));
        assert_eq!(status.volume, None);
        assert!(status.repeat && status.single && !status.random);
        assert_eq!(status.state, PlayState::Pause);
        assert_eq!((status.song, status.song_id), (Some(1), Some(7)));
        assert_eq!((status.elapsed, status.duration), (61, 200));
        assert_eq!(status.playlist_version, 12);
    }

    #[test]
    fn listing_groups_fields_by_file() {
        let entries = parse_entries(&pairs(&[
            "directory: rock",
            "Last-Modified: 2020-01-01T00:00:00Z",
            "file: intro.flac",
            "Title: Intro",
            "Time: 95",
            "file: outro.flac",
            "playlist: favourites",
        ]));
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0], DirEntry::Directory("rock".into()));
        let DirEntry::File(song) = &entries[1] else { panic!("expected file") };
        assert_eq!(song.title.as_deref(), Some("Intro"));
        assert_eq!(song.duration, Some(95));
        let DirEntry::File(song) = &entries[2] else { panic!("expected file") };
        assert_eq!(song.title, None);
        assert_eq!(entries[3], DirEntry::Playlist("favourites".into()));
    }

    #[test]
    fn small_responses() {
        assert_eq!(parse_rating(&pairs(&["sticker: rating=4"])), Some(4));
        assert_eq!(parse_values(&pairs(&["Artist: A", "Artist: B"]), "artist"), vec!["A", "B"]);
        assert!(split_pair("no separator").is_err());
        assert_eq!(find_value(&pairs(&["Id: 9"]), "Id"), Some("9"));
    }
}
