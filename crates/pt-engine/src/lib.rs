//! Playback engine for playtune.
//!
//! Interprets score bytecode against a small bank of tone channels, driven
//! by a periodic tick, with one-shot tones that can take over a channel.
//! Runs without an allocator; all state lives in one [`Playtune`].

#![cfg_attr(not(feature = "std"), no_std)]

mod channel;
mod frame;
mod frequency;
mod interpreter;
mod player;
mod scheduler;
mod soft_synth;
mod synth;
mod timer;
mod tone;

#[cfg(test)]
mod test_support;

pub use channel::{ChannelSnapshot, ChannelState};
pub use frame::Frame;
pub use frequency::{doubled_frequency, frequency_of, MAX_NOTE, TABLE_SPLIT};
pub use player::{
    Config, PlaybackState, Playtune, ToneState, MAX_CHANNELS, SCORE_CHANNEL, TONE_CHANNEL,
};
pub use soft_synth::{SoftSynth, FULL_AMPLITUDE};
pub use synth::{OutputGate, Synth};
pub use timer::{FrameClock, TickTimer};
