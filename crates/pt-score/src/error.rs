//! Error types for score decoding, encoding, and analysis.

/// A command could not be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {byte:#04x} at offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },
    #[error("command at offset {offset} runs past the end of the score")]
    Truncated { offset: usize },
}

/// A score is malformed or a command cannot be encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("wait of {0} ms exceeds the 15-bit limit of 32767 ms")]
    WaitTooLong(u32),
    #[error("channel {0} does not fit in a command nibble")]
    InvalidChannel(u8),
    #[error("note {0} has no frequency (valid notes are 0-127)")]
    InvalidNote(u8),
    #[error("output buffer too small, {needed} bytes needed")]
    BufferTooSmall { needed: usize },
    #[error("channel {channel} at offset {offset} exceeds the {channel_count} available channels")]
    ChannelOutOfRange { offset: usize, channel: u8, channel_count: u8 },
    #[error("note {note} at offset {offset} has no frequency")]
    NoteOutOfRange { offset: usize, note: u8 },
    #[error("score ends without a stop or restart command")]
    Unterminated,
}
