//! Seams to the outside world: the tone generator and the host's mute switch.

use core::sync::atomic::{AtomicBool, Ordering};

/// A bank of tone-generating voices.
///
/// Methods take `&self` because they are called from both the tick context
/// and the main context; implementations write hardware registers or
/// atomics, never block.
pub trait Synth: Sync {
    fn set_amplitude(&self, channel: u8, amplitude: u8);
    /// `hz` is the pitch to produce.
    fn set_frequency(&self, channel: u8, hz: f32);
    /// Speaker/amplifier switch, on while at least one channel is active.
    fn set_output_enabled(&self, enabled: bool);
}

/// Host predicate deciding whether sound may be produced right now.
///
/// Polled on every note-on and every tone request, never cached.
pub trait OutputGate: Sync {
    fn sound_enabled(&self) -> bool;
}

impl<F: Fn() -> bool + Sync> OutputGate for F {
    fn sound_enabled(&self) -> bool {
        self()
    }
}

impl OutputGate for AtomicBool {
    fn sound_enabled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}
