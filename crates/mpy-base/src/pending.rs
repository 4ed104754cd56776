//! Ordered writes held back while input is handled locally.

use tracing::{debug, warn};

use crate::remote::{Command, PlaybackService, RemoteError};

#[derive(Debug, Default)]
pub struct PendingQueue {
    commands: Vec<Command>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: Command) {
        debug!(%command, "queued");
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Send every queued command as one batch and empty the queue.
    ///
    /// The queue is emptied whatever the outcome. A failed batch is never
    /// resent: whatever the server did not apply is dropped and the caller
    /// resynchronizes from the server.
    pub fn flush(&mut self, remote: &mut dyn PlaybackService) -> Result<usize, RemoteError> {
        if self.commands.is_empty() {
            return Ok(0);
        }
        let batch = std::mem::take(&mut self.commands);
        match remote.submit_batch(&batch) {
            Ok(()) => {
                debug!(count = batch.len(), "pending batch sent");
                Ok(batch.len())
            }
            Err(e) => {
                warn!(count = batch.len(), error = %e, "pending batch discarded");
                Err(e)
            }
        }
    }
}
