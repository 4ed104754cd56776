//! MPD text protocol client.
//!
//! One blocking TCP connection. While subscribed (`idle`) the connection only
//! waits for change notifications, and every other request is refused
//! locally with [`RemoteError::Subscribed`].

pub mod response;

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use mpy_base::remote::{Command, PlaybackService, RemoteError};
use mpy_base::snapshot::{DirEntry, Song, Stats, Status};

use crate::response::{Pairs, find_value, parse_ack, split_pair};

const GREETING: &str = "OK MPD ";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// ACK code for a missing sticker or song.
const ACK_NO_EXIST: u32 = 50;

pub struct MpdClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    idle: bool,
    version: String,
}

impl MpdClient {
    pub fn connect(host: &str, port: u16) -> Result<Self, RemoteError> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("cannot resolve {}", host)))?;
        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        let client = Self::from_stream(stream)?;
        info!(%host, port, version = %client.version, "connected");
        Ok(client)
    }

    /// Take over an open connection and consume the server greeting.
    pub fn from_stream(stream: TcpStream) -> Result<Self, RemoteError> {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        let writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let version = line
            .trim_end()
            .strip_prefix(GREETING)
            .ok_or_else(|| RemoteError::Protocol(format!("unexpected greeting {:?}", line.trim_end())))?
            .to_string();
        Ok(Self { reader, writer, idle: false, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn password(&mut self, password: &str) -> Result<(), RemoteError> {
        self.request(&format!("password {}", quote(password))).map(|_| ())
    }

    fn send(&mut self, line: &str) -> Result<(), RemoteError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, RemoteError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(RemoteError::Protocol("connection closed by server".into()));
        }
        Ok(line.trim_end_matches('\n').to_string())
    }

    /// Read pairs up to the closing `OK`.
    fn read_response(&mut self) -> Result<Pairs, RemoteError> {
        let mut pairs = Vec::new();
        loop {
            let line = self.read_line()?;
            if line == "OK" {
                return Ok(pairs);
            }
            if line == "list_OK" {
                continue;
            }
            if line.starts_with("ACK ") {
                return Err(parse_ack(&line));
            }
            pairs.push(split_pair(&line)?);
        }
    }

    fn request(&mut self, line: &str) -> Result<Pairs, RemoteError> {
        if self.idle {
            return Err(RemoteError::Subscribed);
        }
        debug!(command = %line, "request");
        self.send(line)?;
        self.read_response()
    }
}

/// Double-quote an argument, escaping backslashes and quotes.
pub fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Request line for a command.
pub fn wire(command: &Command) -> String {
    match command {
        Command::PlayId(id) => format!("playid {}", id),
        Command::TogglePause => "pause".to_string(),
        Command::Stop => "stop".to_string(),
        Command::Previous => "previous".to_string(),
        Command::Next => "next".to_string(),
        Command::SetVolume(v) => format!("setvol {}", v),
        Command::SeekId { id, position } => format!("seekid {} {}", id, position),
        Command::Consume(on) => format!("consume {}", u8::from(*on)),
        Command::Random(on) => format!("random {}", u8::from(*on)),
        Command::Repeat(on) => format!("repeat {}", u8::from(*on)),
        Command::Single(on) => format!("single {}", u8::from(*on)),
        Command::Add(uri) => format!("add {}", quote(uri)),
        Command::FindAdd { tag, value } => format!("findadd {} {}", tag, quote(value)),
        Command::DeleteId(id) => format!("deleteid {}", id),
        Command::Swap(a, b) => format!("swap {} {}", a, b),
        Command::Shuffle => "shuffle".to_string(),
        Command::Clear => "clear".to_string(),
        Command::Save(name) => format!("save {}", quote(name)),
        Command::Load(name) => format!("load {}", quote(name)),
        Command::RemovePlaylist(name) => format!("rm {}", quote(name)),
        Command::Update => "update".to_string(),
        Command::SetRating { uri, rating } => format!("sticker set song {} rating {}", quote(uri), rating),
    }
}

fn missing_to_none<T>(result: Result<T, RemoteError>) -> Result<Option<T>, RemoteError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RemoteError::Rejected { code: ACK_NO_EXIST, .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

impl PlaybackService for MpdClient {
    fn status(&mut self) -> Result<Status, RemoteError> {
        self.request("status").map(|p| response::parse_status(&p))
    }

    fn stats(&mut self) -> Result<Stats, RemoteError> {
        self.request("stats").map(|p| response::parse_stats(&p))
    }

    fn current_song(&mut self) -> Result<Option<Song>, RemoteError> {
        self.request("currentsong").map(|p| response::parse_songs(&p).into_iter().next())
    }

    fn queue(&mut self) -> Result<Vec<Song>, RemoteError> {
        self.request("playlistinfo").map(|p| response::parse_songs(&p))
    }

    fn rating(&mut self, uri: &str) -> Result<Option<u8>, RemoteError> {
        let result = self.request(&format!("sticker get song {} rating", quote(uri)));
        Ok(missing_to_none(result)?.and_then(|p| response::parse_rating(&p)))
    }

    fn browse(&mut self, dir: &str) -> Result<Vec<DirEntry>, RemoteError> {
        self.request(&format!("lsinfo {}", quote(dir))).map(|p| response::parse_entries(&p))
    }

    fn list(&mut self, tag: &str, filter: Option<(&str, &str)>) -> Result<Vec<String>, RemoteError> {
        let line = match filter {
            Some((ftag, value)) => format!("list {} {} {}", tag, ftag, quote(value)),
            None => format!("list {}", tag),
        };
        self.request(&line).map(|p| response::parse_values(&p, tag))
    }

    fn find(&mut self, tag: &str, value: &str) -> Result<Vec<Song>, RemoteError> {
        self.request(&format!("find {} {}", tag, quote(value))).map(|p| response::parse_songs(&p))
    }

    fn find_in_queue(&mut self, uri: &str) -> Result<Option<Song>, RemoteError> {
        self.request(&format!("playlistfind file {}", quote(uri))).map(|p| response::parse_songs(&p).into_iter().next())
    }

    fn song_info(&mut self, uri: &str) -> Result<Option<Song>, RemoteError> {
        let result = self.request(&format!("listallinfo {}", quote(uri)));
        Ok(missing_to_none(result)?.and_then(|p| response::parse_songs(&p).into_iter().next()))
    }

    fn add_id(&mut self, uri: &str) -> Result<u32, RemoteError> {
        let pairs = self.request(&format!("addid {}", quote(uri)))?;
        find_value(&pairs, "Id")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| RemoteError::Protocol("addid response without Id".into()))
    }

    fn execute(&mut self, command: &Command) -> Result<(), RemoteError> {
        self.request(&wire(command)).map(|_| ())
    }

    fn submit_batch(&mut self, commands: &[Command]) -> Result<(), RemoteError> {
        if self.idle {
            return Err(RemoteError::Subscribed);
        }
        let mut batch = String::from("command_list_ok_begin\n");
        for command in commands {
            batch.push_str(&wire(command));
            batch.push('\n');
        }
        batch.push_str("command_list_end");
        debug!(count = commands.len(), "command list");
        self.send(&batch)?;
        self.read_response().map(|_| ())
    }

    fn subscribe(&mut self) -> Result<(), RemoteError> {
        if self.idle {
            return Ok(());
        }
        self.send("idle")?;
        self.idle = true;
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<Vec<String>, RemoteError> {
        if !self.idle {
            return Ok(Vec::new());
        }
        // Once a notification has arrived the idle is already answered and the
        // server would ignore a noidle. Either way exactly one response follows.
        if !self.notification_pending() {
            self.send("noidle")?;
        }
        self.idle = false;
        let pairs = self.read_response()?;
        let changed: Vec<String> = pairs.into_iter().filter(|(k, _)| k == "changed").map(|(_, v)| v).collect();
        if !changed.is_empty() {
            debug!(?changed, "notifications");
        }
        Ok(changed)
    }

    fn notification_pending(&mut self) -> bool {
        if !self.idle {
            return false;
        }
        if !self.reader.buffer().is_empty() {
            return true;
        }
        let stream = self.reader.get_ref();
        if stream.set_nonblocking(true).is_err() {
            return false;
        }
        let mut probe = [0u8; 1];
        let pending = matches!(stream.peek(&mut probe), Ok(n) if n > 0);
        let _ = stream.set_nonblocking(false);
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// Serve `script` (expected request, canned reply) on a local socket.
    fn serve(script: Vec<(&'static str, &'static str)>) -> (MpdClient, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"OK MPD 0.23.5\n").unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut seen = Vec::new();
            for (expect, reply) in script {
                let mut request = String::new();
                for _ in 0..expect.lines().count() {
                    reader.read_line(&mut request).unwrap();
                }
                seen.push(request.trim_end().to_string());
                stream.write_all(reply.as_bytes()).unwrap();
            }
            let mut rest = Vec::new();
            let _ = reader.read_to_end(&mut rest);
            seen
        });
        let client = MpdClient::connect("127.0.0.1", addr.port()).unwrap();
        (client, handle)
    }

    #[test]
    fn quoting() {
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
        assert_eq!(wire(&Command::Add("x y".into())), "add \"x y\"");
    }

    #[test]
    fn status_and_rejection() {
        let (mut client, server) = serve(vec![
            ("status", "state: play\nsong: 0\nsongid: 3\nplaylist: 4\nOK\n"),
            ("load \"nope\"", "ACK [50@0] {load} No such playlist\n"),
            ("sticker get song \"a.mp3\" rating", "ACK [50@0] {sticker} no such sticker\n"),
        ]);
        assert_eq!(client.version(), "0.23.5");
        let status = client.status().unwrap();
        assert!(status.is_playing());
        assert_eq!(status.song_id, Some(3));

        let err = client.execute(&Command::Load("nope".into())).unwrap_err();
        assert_eq!(err.to_string(), "No such playlist");
        assert_eq!(client.rating("a.mp3").unwrap(), None);

        drop(client);
        let seen = server.join().unwrap();
        assert_eq!(seen, vec!["status", "load \"nope\"", "sticker get song \"a.mp3\" rating"]);
    }

    #[test]
    fn batch_is_one_command_list() {
        let (mut client, server) = serve(vec![(
            "command_list_ok_begin\nswap 0 1\ndeleteid 7\ncommand_list_end",
            "list_OK\nACK [50@1] {deleteid} No such song\n",
        )]);
        let err = client.submit_batch(&[Command::Swap(0, 1), Command::DeleteId(7)]).unwrap_err();
        assert!(matches!(err, RemoteError::Rejected { index: 1, .. }));
        drop(client);
        let seen = server.join().unwrap();
        assert_eq!(seen[0], "command_list_ok_begin\nswap 0 1\ndeleteid 7\ncommand_list_end");
    }

    #[test]
    fn idle_blocks_requests_until_noidle() {
        let (mut client, server) = serve(vec![("idle", ""), ("noidle", "changed: playlist\nOK\n")]);
        client.subscribe().unwrap();
        assert!(matches!(client.status(), Err(RemoteError::Subscribed)));
        assert!(!client.notification_pending());
        let changed = client.unsubscribe().unwrap();
        assert_eq!(changed, vec!["playlist"]);
        drop(client);
        server.join().unwrap();
    }

    #[test]
    fn answered_idle_is_read_without_noidle() {
        let (mut client, server) = serve(vec![("idle", "changed: player\nOK\n")]);
        client.subscribe().unwrap();
        let mut waited = 0;
        while !client.notification_pending() && waited < 100 {
            thread::sleep(Duration::from_millis(10));
            waited += 1;
        }
        assert!(client.notification_pending());
        assert_eq!(client.unsubscribe().unwrap(), vec!["player"]);
        drop(client);
        assert_eq!(server.join().unwrap(), vec!["idle"]);
    }
}
