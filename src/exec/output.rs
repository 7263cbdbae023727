// src/exec/output.rs

//! Line reader for process output.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

use crate::types::TaskKind;

/// Consecutive read errors after which a stream is abandoned.
pub const MAX_CONSECUTIVE_READ_ERRORS: usize = 8;

/// Reads `\n`-terminated lines from a process stream.
///
/// Lines are decoded lossily: bytes that are not valid UTF-8 become U+FFFD
/// instead of an error, so a stray byte never ends the stream.
pub struct OutputLines<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> OutputLines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    /// Next line without its `\n` or `\r\n`, or `None` at end of stream.
    ///
    /// Bytes read before an error stay buffered and lead the next line.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        if read == 0 && self.pending.is_empty() {
            return Ok(None);
        }

        if self.pending.last() == Some(&b'\n') {
            self.pending.pop();
            if self.pending.last() == Some(&b'\r') {
                self.pending.pop();
            }
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Ok(Some(line))
    }

    /// Append every line to `output`, each followed by `\n`.
    ///
    /// On a read error `output` keeps the lines read so far, the rest of the
    /// stream is drained through [`discard`](Self::discard), and the error is
    /// returned.
    pub async fn read_into(&mut self, output: &mut String, task: TaskKind) -> io::Result<()> {
        loop {
            match self.next_line().await {
                Ok(Some(line)) => {
                    output.push_str(&line);
                    output.push('\n');
                }
                Ok(None) => return Ok(()),
                Err(e) => {
                    self.discard(task, "stdout").await;
                    return Err(e);
                }
            }
        }
    }

    /// Read to the end of the stream, sending each line to the debug log.
    ///
    /// Keeps the writer from blocking on a full pipe. Gives up after
    /// [`MAX_CONSECUTIVE_READ_ERRORS`] errors in a row.
    pub async fn discard(&mut self, task: TaskKind, stream: &str) {
        let mut errors = 0;
        while errors < MAX_CONSECUTIVE_READ_ERRORS {
            match self.next_line().await {
                Ok(Some(line)) => {
                    errors = 0;
                    debug!(%task, "{stream}: {line}");
                }
                Ok(None) => return,
                Err(e) => {
                    errors += 1;
                    debug!(%task, stream, error = %e, "read failed");
                }
            }
        }
        debug!(%task, stream, "abandoning stream after repeated read errors");
    }
}
