//! Score handle and command iteration.

use crate::command::{decode, Command};
use crate::error::DecodeError;

/// An immutable score living for the whole program.
///
/// Scores are normally declared as `static` items so they stay in read-only
/// memory, and players keep a `&'static Score` to them:
///
/// ```
/// use pt_score::Score;
///
/// static BEEP: Score = Score::new(&[0x90, 69, 0x01, 0xF4, 0x80, 0xF0]);
/// assert_eq!(BEEP.len(), 6);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Score {
    bytes: &'static [u8],
}

impl Score {
    /// Wrap a byte stream. The stream is not validated; see [`crate::analyze`].
    pub const fn new(bytes: &'static [u8]) -> Self {
        Self { bytes }
    }

    pub const fn bytes(&self) -> &'static [u8] {
        self.bytes
    }

    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterate commands from the start, stopping after the first error.
    ///
    /// Restart commands are yielded, not followed.
    pub fn commands(&self) -> Commands<'static> {
        Commands::new(self.bytes)
    }
}

/// Iterator over the commands of a byte stream.
///
/// Yields `(offset, command)` pairs.
#[derive(Clone, Debug)]
pub struct Commands<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Commands<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0, failed: false }
    }
}

impl Iterator for Commands<'_> {
    type Item = Result<(usize, Command), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let at = self.offset;
        match decode(self.bytes, at) {
            Ok((command, len)) => {
                self.offset += len;
                Some(Ok((at, command)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
