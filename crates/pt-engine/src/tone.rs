//! Foreground tones and their arbitration with the score.

use core::sync::atomic::Ordering;

use crate::player::{Playtune, SCORE_CHANNEL, TONE_CHANNEL};
use crate::synth::{OutputGate, Synth};

impl<S: Synth, G: OutputGate> Playtune<S, G> {
    /// Play `frequency` Hz on channel 0 for `duration_ms` ticks.
    ///
    /// Ignored while sound is disabled, before two channels are
    /// initialized, or for a zero duration. A tone replaces any tone already
    /// playing. A score that is waiting when the tone starts is held until
    /// the tone ends, then resumes with the wait it had left.
    pub fn tone(&self, frequency: u16, duration_ms: u32) {
        if !self.gate.sound_enabled() {
            log::debug!("tone ignored: sound disabled");
            return;
        }
        if self.channel_count() < 2 {
            log::debug!("tone ignored: tone channel not initialized");
            return;
        }
        if duration_ms == 0 {
            log::debug!("tone ignored: zero duration");
            return;
        }
        log::debug!("tone {} Hz for {} ms", frequency, duration_ms);

        let remaining = self.countdown.load(Ordering::Relaxed);
        let already_playing = self.tone_playing.load(Ordering::Relaxed);
        let mute = self.tone_mutes_score.load(Ordering::Relaxed);

        self.tone_playing.store(true, Ordering::Relaxed);
        self.score_muted.store(mute, Ordering::Relaxed);
        if !already_playing && self.is_playing() {
            self.parked_wait.store(remaining, Ordering::Relaxed);
        }

        self.drive(TONE_CHANNEL, frequency as f32, self.config.amplitude);
        self.refresh_channel(SCORE_CHANNEL);
        self.update_output_enable();
        self.countdown.store(duration_ms, Ordering::Relaxed);
    }

    /// Whether later tones silence the score's second channel while they
    /// play. The current tone keeps the setting it started with.
    pub fn tone_mutes_score(&self, mute: bool) {
        self.tone_mutes_score.store(mute, Ordering::Relaxed);
    }

    pub fn mutes_score(&self) -> bool {
        self.tone_mutes_score.load(Ordering::Relaxed)
    }

    /// Release the tone channel and hand both channels back to the score.
    pub(crate) fn end_tone(&self) {
        self.tone_playing.store(false, Ordering::Relaxed);
        self.score_muted.store(false, Ordering::Relaxed);
        self.refresh_channel(TONE_CHANNEL);
        self.refresh_channel(SCORE_CHANNEL);
        log::debug!("tone finished");
    }
}
