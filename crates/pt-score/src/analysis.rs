//! Score analysis: one pass over a score to check it and summarize it.

use core::fmt;

use crate::command::{Command, MAX_NOTE};
use crate::error::ScoreError;
use crate::score::Commands;

/// Summary of one pass through a score, up to its terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    /// Commands up to and including the terminator.
    pub commands: usize,
    pub total_notes: usize,
    pub note_range: Option<(u8, u8)>,
    /// Bit `n` set when channel `n` is addressed.
    pub channels_used: u16,
    /// Sum of all waits in one pass, in milliseconds.
    pub duration_ms: u64,
    /// True when the pass ends with a restart.
    pub loops: bool,
    /// Offset just past the terminator. Bytes after it are never executed.
    pub end_offset: usize,
}

impl ScoreSummary {
    pub fn channel_count(&self) -> u32 {
        self.channels_used.count_ones()
    }
}

/// Check a score for playback on `channel_count` channels and summarize it.
///
/// Fails on the first command the interpreter could not execute as written:
/// unknown opcodes, truncated commands, channels the player does not have,
/// notes without a frequency, or a missing stop/restart.
pub fn analyze(bytes: &[u8], channel_count: u8) -> Result<ScoreSummary, ScoreError> {
    let mut summary = ScoreSummary::default();

    for item in Commands::new(bytes) {
        let (offset, command) = item?;
        summary.commands += 1;
        match command {
            Command::NoteOff { channel } => {
                check_channel(offset, channel, channel_count)?;
                summary.channels_used |= 1 << channel;
            }
            Command::NoteOn { channel, note } => {
                check_channel(offset, channel, channel_count)?;
                if note > MAX_NOTE {
                    return Err(ScoreError::NoteOutOfRange { offset, note });
                }
                summary.channels_used |= 1 << channel;
                summary.total_notes += 1;
                summary.note_range = Some(match summary.note_range {
                    Some((lo, hi)) => (lo.min(note), hi.max(note)),
                    None => (note, note),
                });
            }
            Command::Wait(ms) => summary.duration_ms += ms as u64,
            Command::Restart | Command::Stop => {
                summary.loops = command == Command::Restart;
                summary.end_offset = offset + command.encoded_len();
                return Ok(summary);
            }
        }
    }

    Err(ScoreError::Unterminated)
}

fn check_channel(offset: usize, channel: u8, channel_count: u8) -> Result<(), ScoreError> {
    if channel >= channel_count {
        Err(ScoreError::ChannelOutOfRange { offset, channel, channel_count })
    } else {
        Ok(())
    }
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Commands: {}", self.commands)?;
        writeln!(f, "Notes:    {} total", self.total_notes)?;
        if let Some((lo, hi)) = self.note_range {
            writeln!(f, "Range:    {} - {} (MIDI)", lo, hi)?;
        }
        writeln!(f, "Channels: {} used (mask {:#06b})", self.channel_count(), self.channels_used)?;
        writeln!(
            f,
            "Length:   {}.{:03}s{}",
            self.duration_ms / 1000,
            self.duration_ms % 1000,
            if self.loops { " (loops)" } else { "" },
        )
    }
}
