//! Score commands and their byte encoding.
//!
//! A command byte carries the opcode in its high nibble and, for note
//! commands, the channel in its low nibble. Any byte below `0x80` starts a
//! two-byte wait: the low 7 bits of the first byte and all of the second
//! form a 15-bit big-endian duration in milliseconds.

use crate::error::{DecodeError, ScoreError};

/// Raw opcode values.
pub mod opcodes {
    /// Silence a channel (`0x8c`).
    pub const NOTE_OFF: u8 = 0x80;
    /// Start a note (`0x9c nn`).
    pub const NOTE_ON: u8 = 0x90;
    /// Jump back to the start of the score.
    pub const RESTART: u8 = 0xE0;
    /// End of score.
    pub const STOP: u8 = 0xF0;

    pub const OPCODE_MASK: u8 = 0xF0;
    pub const CHANNEL_MASK: u8 = 0x0F;
    /// Command bytes below this value are the high half of a wait.
    pub const WAIT_LIMIT: u8 = 0x80;
}

/// Longest wait a single command can encode.
pub const MAX_WAIT_MS: u16 = 0x7FFF;

/// Highest note index with a tabulated frequency.
pub const MAX_NOTE: u8 = 127;

/// Highest channel index the low nibble can address.
pub const MAX_CHANNEL: u8 = opcodes::CHANNEL_MASK;

/// A decoded score command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Silence a channel.
    NoteOff { channel: u8 },
    /// Start a note on a channel.
    NoteOn { channel: u8, note: u8 },
    /// Suspend the score for this many milliseconds.
    Wait(u16),
    /// Move the cursor back to the start of the score.
    Restart,
    /// End playback.
    Stop,
}

impl Command {
    /// Number of bytes this command occupies in a score.
    pub const fn encoded_len(&self) -> usize {
        match self {
            Command::NoteOn { .. } | Command::Wait(_) => 2,
            Command::NoteOff { .. } | Command::Restart | Command::Stop => 1,
        }
    }

    /// True for commands that end a pass through the score.
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Command::Restart | Command::Stop)
    }

    /// Encode into `out`, returning the number of bytes written.
    ///
    /// Out-of-range fields are rejected instead of being masked, so a wait
    /// longer than [`MAX_WAIT_MS`] never silently wraps.
    pub fn encode_into(&self, out: &mut [u8]) -> Result<usize, ScoreError> {
        let len = self.encoded_len();
        if out.len() < len {
            return Err(ScoreError::BufferTooSmall { needed: len });
        }
        match *self {
            Command::NoteOff { channel } => {
                check_channel(channel)?;
                out[0] = opcodes::NOTE_OFF | channel;
            }
            Command::NoteOn { channel, note } => {
                check_channel(channel)?;
                if note > MAX_NOTE {
                    return Err(ScoreError::InvalidNote(note));
                }
                out[0] = opcodes::NOTE_ON | channel;
                out[1] = note;
            }
            Command::Wait(ms) => {
                if ms > MAX_WAIT_MS {
                    return Err(ScoreError::WaitTooLong(ms as u32));
                }
                out[..2].copy_from_slice(&ms.to_be_bytes());
            }
            Command::Restart => out[0] = opcodes::RESTART,
            Command::Stop => out[0] = opcodes::STOP,
        }
        Ok(len)
    }
}

fn check_channel(channel: u8) -> Result<(), ScoreError> {
    if channel > MAX_CHANNEL {
        Err(ScoreError::InvalidChannel(channel))
    } else {
        Ok(())
    }
}

/// Decode the command starting at `offset`.
///
/// Returns the command and its length in bytes.
pub fn decode(bytes: &[u8], offset: usize) -> Result<(Command, usize), DecodeError> {
    let command = *bytes.get(offset).ok_or(DecodeError::Truncated { offset })?;
    let operand = || {
        bytes
            .get(offset + 1)
            .copied()
            .ok_or(DecodeError::Truncated { offset })
    };

    if command < opcodes::WAIT_LIMIT {
        let ms = u16::from_be_bytes([command, operand()?]);
        return Ok((Command::Wait(ms), 2));
    }

    let channel = command & opcodes::CHANNEL_MASK;
    match command & opcodes::OPCODE_MASK {
        opcodes::NOTE_OFF => Ok((Command::NoteOff { channel }, 1)),
        opcodes::NOTE_ON => Ok((Command::NoteOn { channel, note: operand()? }, 2)),
        opcodes::RESTART => Ok((Command::Restart, 1)),
        opcodes::STOP => Ok((Command::Stop, 1)),
        _ => Err(DecodeError::UnknownOpcode { offset, byte: command }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_note_commands_with_channel_nibble() {
        assert_eq!(decode(&[0x91, 69], 0), Ok((Command::NoteOn { channel: 1, note: 69 }, 2)));
        assert_eq!(decode(&[0x80], 0), Ok((Command::NoteOff { channel: 0 }, 1)));
    }

    #[test]
    fn wait_is_fifteen_bit_big_endian() {
        assert_eq!(decode(&[0x03, 0xE8], 0), Ok((Command::Wait(1000), 2)));
        assert_eq!(decode(&[0x7F, 0xFF], 0), Ok((Command::Wait(MAX_WAIT_MS), 2)));
    }

    #[test]
    fn restart_and_stop_ignore_low_nibble() {
        assert_eq!(decode(&[0xE5], 0), Ok((Command::Restart, 1)));
        assert_eq!(decode(&[0xF3], 0), Ok((Command::Stop, 1)));
    }

    #[test]
    fn unknown_opcodes_are_reported() {
        assert_eq!(
            decode(&[0x90, 60, 0xC0], 2),
            Err(DecodeError::UnknownOpcode { offset: 2, byte: 0xC0 })
        );
    }

    #[test]
    fn missing_operand_is_truncation() {
        assert_eq!(decode(&[0x90], 0), Err(DecodeError::Truncated { offset: 0 }));
        assert_eq!(decode(&[0x01], 0), Err(DecodeError::Truncated { offset: 0 }));
        assert_eq!(decode(&[], 0), Err(DecodeError::Truncated { offset: 0 }));
    }

    #[test]
    fn encode_rejects_long_wait() {
        let mut buf = [0u8; 2];
        assert_eq!(
            Command::Wait(MAX_WAIT_MS + 1).encode_into(&mut buf),
            Err(ScoreError::WaitTooLong(32768))
        );
    }

    #[test]
    fn encode_rejects_out_of_range_fields() {
        let mut buf = [0u8; 2];
        assert_eq!(
            Command::NoteOn { channel: 16, note: 60 }.encode_into(&mut buf),
            Err(ScoreError::InvalidChannel(16))
        );
        assert_eq!(
            Command::NoteOn { channel: 0, note: 128 }.encode_into(&mut buf),
            Err(ScoreError::InvalidNote(128))
        );
    }

    #[test]
    fn encoded_bytes_decode_to_same_command() {
        let mut buf = [0u8; 2];
        let cmd = Command::Wait(1234);
        let n = cmd.encode_into(&mut buf).unwrap();
        assert_eq!(decode(&buf, 0), Ok((cmd, n)));
    }
}
