//! Per-channel state shared between the tick and main contexts.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Channel state built from single-word atomics.
///
/// Each field is read and written independently; a reader racing a writer
/// may see a new frequency with an old amplitude for one tick at most.
#[derive(Debug)]
pub struct ChannelState {
    active: AtomicBool,
    /// `f32` bits.
    frequency: AtomicU32,
    amplitude: AtomicU8,
}

impl ChannelState {
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            frequency: AtomicU32::new(0),
            amplitude: AtomicU8::new(0),
        }
    }

    /// Hold a note. An amplitude of 0 keeps the note but makes it inaudible.
    pub fn set(&self, frequency: f32, amplitude: u8) {
        self.frequency.store(frequency.to_bits(), Ordering::Relaxed);
        self.amplitude.store(amplitude, Ordering::Relaxed);
        self.active.store(true, Ordering::Relaxed);
    }

    /// Release the note. The last frequency is kept.
    pub fn silence(&self) {
        self.active.store(false, Ordering::Relaxed);
        self.amplitude.store(0, Ordering::Relaxed);
    }

    /// Back to the power-on state.
    pub fn reset(&self) {
        self.silence();
        self.frequency.store(0, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            active: self.is_active(),
            frequency: f32::from_bits(self.frequency.load(Ordering::Relaxed)),
            amplitude: self.amplitude.load(Ordering::Relaxed),
        }
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of a channel's state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ChannelSnapshot {
    pub active: bool,
    /// Hz.
    pub frequency: f32,
    /// 0 = silent.
    pub amplitude: u8,
}

impl ChannelSnapshot {
    /// Active and not muted.
    pub fn is_audible(&self) -> bool {
        self.active && self.amplitude > 0
    }
}
