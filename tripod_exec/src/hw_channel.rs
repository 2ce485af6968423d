//! # Hardware channel
//!
//! Line channel to the motor controller: commands are written one per line, responses are read
//! back one per line without blocking.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, trace};
use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Write},
    path::Path,
};

use comms_if::eqpt::mech::{MechCmd, MechResponse};
use util::line_reader::{open_nonblocking, LineReader};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command and response channel of the motor controller.
pub struct HwChannel<W: Write, R: Read> {
    writer: W,
    reader: LineReader<R>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum HwChannelError {
    #[error("Could not open the command pipe: {0}")]
    CmdPipeOpen(io::Error),

    #[error("Could not open the response pipe: {0}")]
    RespPipeOpen(io::Error),

    #[error("Could not write \"{0}\" to the controller: {1}")]
    WriteError(String, io::Error),

    #[error("Could not read from the controller: {0}")]
    ReadError(io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HwChannel<File, File> {
    /// Open the controller's named pipes.
    ///
    /// The command pipe is opened for reading as well as writing so that opening it does not wait
    /// for the controller to connect.
    pub fn open<P: AsRef<Path>>(cmd_pipe: P, resp_pipe: P) -> Result<Self, HwChannelError> {
        let writer = OpenOptions::new()
            .read(true)
            .write(true)
            .open(cmd_pipe)
            .map_err(HwChannelError::CmdPipeOpen)?;

        let reader = open_nonblocking(resp_pipe).map_err(HwChannelError::RespPipeOpen)?;

        Ok(Self::new(writer, reader))
    }
}

impl<W: Write, R: Read> HwChannel<W, R> {
    pub fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            reader: LineReader::new(reader),
        }
    }

    /// Write a command to the controller.
    pub fn send(&mut self, cmd: &MechCmd) -> Result<(), HwChannelError> {
        self.send_line(&cmd.to_string())
    }

    /// Write a raw line to the controller.
    pub fn send_line(&mut self, line: &str) -> Result<(), HwChannelError> {
        debug!("-> {}", line);

        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| HwChannelError::WriteError(line.to_string(), e))
    }

    /// Get every response received since the last poll, in arrival order.
    pub fn poll_responses(&mut self) -> Result<Vec<MechResponse>, HwChannelError> {
        let lines = self
            .reader
            .read_lines()
            .map_err(HwChannelError::ReadError)?;

        Ok(lines
            .iter()
            .map(|l| {
                trace!("<- {}", l);
                MechResponse::parse(l)
            })
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::mech::{ActId, MoveProfile};
    use std::io::Cursor;

    #[test]
    fn test_send_and_poll() {
        let responses = "OK CT1\r\n\nCERR CT1 1: limit\n@M120 S0\nOK CT";
        let mut chan = HwChannel::new(Vec::new(), Cursor::new(responses.as_bytes().to_vec()));

        chan.send(&MechCmd::Move {
            act: ActId::Front,
            target_steps: 42,
            profile: MoveProfile {
                velocity: 600,
                accel: 5,
            },
            sync: false,
        })
        .unwrap();
        chan.send_line("CT0 M5").unwrap();

        assert_eq!(
            String::from_utf8(chan.writer.clone()).unwrap(),
            "CT1 M120 P42 VM600 AM5\nCT0 M5\n"
        );

        let responses = chan.poll_responses().unwrap();
        assert_eq!(
            responses,
            vec![
                MechResponse::Ack(String::from("OK CT1")),
                MechResponse::Reject(String::from("CERR CT1 1: limit")),
                MechResponse::Info(String::from("@M120 S0")),
            ]
        );

        // The unterminated line is held back
        assert!(chan.poll_responses().unwrap().is_empty());
    }
}
