//! # Telemetry reader
//!
//! Background thread reading the live position feed of the motor controller. The feed is a pipe or
//! device which may not exist yet, so its path is polled until it appears. Every valid record is
//! sent to the control loop over a channel, malformed lines are logged and dropped.
//!
//! The thread holds no shared state besides its run flag, and never blocks on the feed, so it
//! stops within one poll period of being asked to whether or not the feed is still producing.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use std::{
    fs::File,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::eqpt::mech_tlm::MechTlmRecord;
use util::line_reader::{open_nonblocking, LineReader};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Handle on the telemetry reader thread.
pub struct TlmReader {
    run: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    rx: Receiver<MechTlmRecord>,
}

/// Timing of the reader thread.
#[derive(Debug, Clone, Copy)]
pub struct TlmReaderTiming {
    /// Time between checks for the feed while it is missing
    pub poll_period: Duration,

    /// Time between reads of an open feed
    pub read_period: Duration,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TlmReaderError {
    #[error("Could not start the telemetry reader thread: {0}")]
    CannotSpawn(std::io::Error),

    #[error("The telemetry reader thread stopped unexpectedly")]
    Disconnected,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TlmReader {
    /// Start reading the feed at `feed_path` on a new thread.
    pub fn start<P: Into<PathBuf>>(
        feed_path: P,
        timing: TlmReaderTiming,
    ) -> Result<Self, TlmReaderError> {
        let feed_path = feed_path.into();
        let run = Arc::new(AtomicBool::new(true));
        let (tx, rx) = channel();

        let thread_run = run.clone();
        let handle = thread::Builder::new()
            .name(String::from("tlm_reader"))
            .spawn(move || read_feed(feed_path, thread_run, tx, timing))
            .map_err(TlmReaderError::CannotSpawn)?;

        Ok(Self {
            run,
            handle: Some(handle),
            rx,
        })
    }

    /// Get every record received since the last call, without blocking.
    pub fn recv_records(&self) -> Result<Vec<MechTlmRecord>, TlmReaderError> {
        let mut records = Vec::new();

        loop {
            match self.rx.try_recv() {
                Ok(r) => records.push(r),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if records.is_empty() {
                        return Err(TlmReaderError::Disconnected);
                    }
                    break;
                }
            }
        }

        Ok(records)
    }

    /// True until the thread has been stopped.
    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.run.load(Ordering::Relaxed)
    }

    /// Stop the thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.run.store(false, Ordering::Relaxed);

        if let Some(h) = self.handle.take() {
            if h.join().is_err() {
                warn!("Telemetry reader thread panicked");
            }
            debug!("Telemetry reader stopped");
        }
    }
}

impl Drop for TlmReader {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Body of the reader thread.
fn read_feed(
    feed_path: PathBuf,
    run: Arc<AtomicBool>,
    tx: Sender<MechTlmRecord>,
    timing: TlmReaderTiming,
) {
    let mut reader: Option<LineReader<File>> = None;

    while run.load(Ordering::Relaxed) {
        let r = match reader {
            Some(ref mut r) => r,
            None => {
                match open_nonblocking(&feed_path) {
                    Ok(f) => {
                        info!("Position feed {:?} opened", feed_path);
                        reader = Some(LineReader::new(f));
                    }
                    Err(e) => {
                        trace!("Position feed unavailable: {}", e);
                        thread::sleep(timing.poll_period);
                    }
                }
                continue;
            }
        };

        let lines = match r.read_lines() {
            Ok(l) => l,
            Err(e) => {
                warn!("Error reading the position feed, reopening: {}", e);
                reader = None;
                continue;
            }
        };

        for line in lines {
            match MechTlmRecord::parse(&line) {
                Ok(record) => {
                    // Receiver gone, nobody left to read for
                    if tx.send(record).is_err() {
                        return;
                    }
                }
                Err(e) => warn!("Malformed telemetry line \"{}\": {}", line, e),
            }
        }

        thread::sleep(timing.read_period);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use std::time::Instant;

    const TEST_TIMING: TlmReaderTiming = TlmReaderTiming {
        poll_period: Duration::from_millis(50),
        read_period: Duration::from_millis(5),
    };

    fn feed_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tripod_feed_{}_{}", name, std::process::id()))
    }

    /// Wait for `n` records, giving up after a second.
    fn wait_records(reader: &TlmReader, n: usize) -> Vec<MechTlmRecord> {
        let start = Instant::now();
        let mut records = Vec::new();

        while records.len() < n && start.elapsed() < Duration::from_secs(1) {
            records.extend(reader.recv_records().unwrap());
            thread::sleep(Duration::from_millis(5));
        }

        records
    }

    #[test]
    fn test_reads_records() {
        let path = feed_path("records");
        std::fs::write(
            &path,
            "@M119 S0 @M120 S0 @M121 S0 @M122 S0 AS4 T9.89 C0\n\
             not a record\n\
             @M119 S-10 @M120 S20 @M121 S30 @M122 S40 AS8 T10.1 C5\n",
        )
        .unwrap();

        let mut reader = TlmReader::start(&path, TEST_TIMING).unwrap();
        let records = wait_records(&reader, 2);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].steps, [20, 30, 40, -10]);
        assert_eq!(records[1].progress, 5);

        // Lines appended later are picked up
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "@M119 S1 @M120 S2 @M121 S3 @M122 S4 AS6 T9.9 C0").unwrap();
        let records = wait_records(&reader, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].steps, [2, 3, 4, 1]);

        reader.stop();
        assert!(!reader.is_running());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_waits_for_feed() {
        let path = feed_path("late");
        std::fs::remove_file(&path).ok();

        let reader = TlmReader::start(&path, TEST_TIMING).unwrap();
        thread::sleep(Duration::from_millis(120));
        assert!(reader.is_running());
        assert!(reader.recv_records().unwrap().is_empty());

        std::fs::write(&path, "@M119 S0 @M120 S0 @M121 S0 @M122 S0 AS4 T9.89 C0\n").unwrap();
        assert_eq!(wait_records(&reader, 1).len(), 1);

        drop(reader);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_stops_promptly() {
        let path = feed_path("missing");
        std::fs::remove_file(&path).ok();

        let mut reader = TlmReader::start(&path, TEST_TIMING).unwrap();
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        reader.stop();
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(!reader.is_running());
    }
}
