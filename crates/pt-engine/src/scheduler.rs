//! Tick handling: the shared countdown and what happens when it expires.

use core::sync::atomic::Ordering;

use crate::player::Playtune;
use crate::synth::{OutputGate, Synth};

impl<S: Synth, G: OutputGate> Playtune<S, G> {
    /// Advance time by one tick. Call from the periodic timer.
    ///
    /// When the countdown reaches zero a playing tone ends first; only then
    /// does the score get to run its next batch.
    pub fn tick(&self) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.tick_inner());
        #[cfg(not(feature = "alloc_check"))]
        self.tick_inner();
    }

    fn tick_inner(&self) {
        if self.channel_count() == 0 {
            return;
        }
        let remaining = self.countdown.load(Ordering::Relaxed);
        if remaining == 0 {
            return;
        }
        self.countdown.store(remaining - 1, Ordering::Relaxed);
        if remaining > 1 {
            return;
        }

        if self.tone_playing.load(Ordering::Relaxed) {
            self.end_tone();
            if self.is_playing() {
                self.resume_parked_score();
            }
        } else if self.is_playing() {
            self.step();
        }
    }

    /// Give the countdown back to a score that was waiting when a tone began.
    fn resume_parked_score(&self) {
        let parked = self.parked_wait.load(Ordering::Relaxed);
        self.parked_wait.store(0, Ordering::Relaxed);
        if parked > 0 {
            self.countdown.store(parked, Ordering::Relaxed);
        } else {
            self.step();
        }
    }
}
