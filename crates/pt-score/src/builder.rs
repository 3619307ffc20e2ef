//! Programmatic score construction.

use alloc::vec::Vec;

use crate::command::{Command, MAX_WAIT_MS};
use crate::error::ScoreError;

/// Builds a score byte stream command by command.
///
/// ```
/// use pt_score::ScoreBuilder;
///
/// let bytes = ScoreBuilder::new()
///     .note_on(0, 69)
///     .wait(500)
///     .note_off(0)
///     .stop()
///     .build()
///     .unwrap();
/// assert_eq!(bytes, [0x90, 69, 0x01, 0xF4, 0x80, 0xF0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScoreBuilder {
    bytes: Vec<u8>,
    error: Option<ScoreError>,
}

impl ScoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary command. The first encoding error is kept and
    /// returned from [`build`](Self::build).
    pub fn command(mut self, command: Command) -> Self {
        if self.error.is_some() {
            return self;
        }
        let mut buf = [0u8; 2];
        match command.encode_into(&mut buf) {
            Ok(n) => self.bytes.extend_from_slice(&buf[..n]),
            Err(e) => self.error = Some(e),
        }
        self
    }

    pub fn note_on(self, channel: u8, note: u8) -> Self {
        self.command(Command::NoteOn { channel, note })
    }

    pub fn note_off(self, channel: u8) -> Self {
        self.command(Command::NoteOff { channel })
    }

    /// A single wait command. Waits above 32767 ms are an error.
    pub fn wait(self, ms: u16) -> Self {
        self.command(Command::Wait(ms))
    }

    /// A wait of any length, split into as many wait commands as needed.
    pub fn wait_long(mut self, mut ms: u32) -> Self {
        while ms > 0 {
            let chunk = ms.min(MAX_WAIT_MS as u32);
            self = self.wait(chunk as u16);
            ms -= chunk;
        }
        self
    }

    pub fn restart(self) -> Self {
        self.command(Command::Restart)
    }

    pub fn stop(self) -> Self {
        self.command(Command::Stop)
    }

    pub fn build(self) -> Result<Vec<u8>, ScoreError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.bytes),
        }
    }
}
