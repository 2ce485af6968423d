//! # Non-blocking line reader
//!
//! Splits a byte stream into text lines without ever blocking on the underlying reader. Used for
//! the motor controller's pipes and position feed, which may stay silent for long periods.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const READ_CHUNK_SIZE: usize = 1024;

/// Most chunks taken from the reader by one call, so a busy device cannot hold the caller.
const MAX_CHUNKS_PER_CALL: usize = 8;

/// Longest partial line kept while waiting for its terminator.
const MAX_PARTIAL_LINE_LEN: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Accumulates bytes from a non-blocking reader and hands out complete lines.
pub struct LineReader<R: Read> {
    reader: R,
    partial: Vec<u8>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
        }
    }

    /// Read what is currently available and return the complete lines, without their line
    /// terminators.
    ///
    /// Returns as soon as the reader would block, reaches its end or has handed out
    /// `MAX_CHUNKS_PER_CALL` chunks. Anything left is picked up by the next call. A trailing
    /// partial line is kept until its terminator arrives.
    pub fn read_lines(&mut self) -> io::Result<Vec<String>> {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        let mut chunks = 0;

        while chunks < MAX_CHUNKS_PER_CALL {
            match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    chunks += 1;
                    self.partial.extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(|c| c == '\n' || c == '\r');
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }

        if self.partial.len() > MAX_PARTIAL_LINE_LEN {
            log::warn!(
                "Discarding {} bytes of unterminated input",
                self.partial.len()
            );
            self.partial.clear();
        }

        Ok(lines)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Open a file, pipe or device for non-blocking reads.
///
/// Opening a named pipe this way succeeds even if no writer is connected yet.
pub fn open_nonblocking<P: AsRef<Path>>(path: P) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::VecDeque;

    /// Reader handing out pre-set chunks, blocking between them.
    struct ChunkReader {
        chunks: VecDeque<Option<&'static [u8]>>,
    }

    impl Read for ChunkReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Some(c)) => {
                    buf[..c.len()].copy_from_slice(c);
                    Ok(c.len())
                }
                Some(None) => Err(io::Error::new(ErrorKind::WouldBlock, "no data")),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn test_partial_lines() {
        let mut lr = LineReader::new(ChunkReader {
            chunks: vec![
                Some(&b"OK CT1\r\nOK "[..]),
                None,
                Some(&b"CT0\n\nERR"[..]),
                None,
            ]
            .into_iter()
            .collect(),
        });

        assert_eq!(lr.read_lines().unwrap(), vec!["OK CT1".to_string()]);
        assert_eq!(lr.read_lines().unwrap(), vec!["OK CT0".to_string()]);
        assert_eq!(lr.read_lines().unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_slice_reader() {
        let mut lr = LineReader::new(&b"@M119 S0\n@M120 S1\n"[..]);
        assert_eq!(
            lr.read_lines().unwrap(),
            vec!["@M119 S0".to_string(), "@M120 S1".to_string()]
        );
        assert!(lr.read_lines().unwrap().is_empty());
    }

    /// Reader which always has another line ready.
    struct EndlessReader;

    impl Read for EndlessReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let line = b"@M119 S0\n";
            buf[..line.len()].copy_from_slice(line);
            Ok(line.len())
        }
    }

    #[test]
    fn test_busy_reader_returns() {
        let mut lr = LineReader::new(EndlessReader);

        assert_eq!(lr.read_lines().unwrap().len(), MAX_CHUNKS_PER_CALL);
        assert_eq!(lr.read_lines().unwrap().len(), MAX_CHUNKS_PER_CALL);
    }

    #[test]
    fn test_open_missing() {
        assert!(open_nonblocking("/does/not/exist/feed").is_err());
    }
}
