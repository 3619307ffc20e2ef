//! Score interpreter: runs command batches up to the next wait.

use core::sync::atomic::Ordering;

use pt_score::{decode, Command, DecodeError, Score};

use crate::frequency::frequency_of;
use crate::player::Playtune;
use crate::synth::{OutputGate, Synth};

impl<S: Synth, G: OutputGate> Playtune<S, G> {
    /// Start playing `score` from its first byte.
    ///
    /// Commands up to the first wait run before this returns. Ignored until
    /// the channels are initialized.
    pub fn play_score(&self, score: &'static Score) {
        if self.channel_count() == 0 {
            log::debug!("play_score ignored: channels not initialized");
            return;
        }
        log::debug!("playing score ({} bytes)", score.len());

        // With the countdown at zero the tick handler stays out of the way
        // until the first batch seeds a wait. A playing tone keeps its own.
        if !self.tone_playing.load(Ordering::Relaxed) {
            self.countdown.store(0, Ordering::Relaxed);
        }
        self.parked_wait.store(0, Ordering::Relaxed);

        self.score
            .store(score as *const Score as *mut Score, Ordering::Release);
        self.cursor.store(0, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
        self.step();
    }

    /// Stop the score and silence every channel, ending any tone.
    pub fn stop_score(&self) {
        self.running.store(false, Ordering::Release);
        self.parked_wait.store(0, Ordering::Relaxed);
        self.countdown.store(0, Ordering::Relaxed);
        self.tone_playing.store(false, Ordering::Relaxed);
        self.score_muted.store(false, Ordering::Relaxed);
        for ch in 0..self.channel_count() {
            self.score_channels[ch as usize].silence();
            self.drive_silence(ch);
        }
        self.update_output_enable();
    }

    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Execute commands until a wait suspends the score or it stops.
    ///
    /// Runs in whichever context calls it: `play_score` from the main
    /// context, the tick handler when a wait expires.
    pub(crate) fn step(&self) {
        let Some(score) = self.score() else {
            self.running.store(false, Ordering::Release);
            return;
        };
        let bytes = score.bytes();
        let mut cursor = self.cursor.load(Ordering::Relaxed);
        let mut restarted = false;

        loop {
            let (command, len) = match decode(bytes, cursor) {
                Ok(decoded) => decoded,
                Err(DecodeError::UnknownOpcode { offset, byte }) => {
                    log::warn!("skipping unknown opcode {:#04x} at offset {}", byte, offset);
                    cursor += 1;
                    continue;
                }
                Err(e @ DecodeError::Truncated { .. }) => {
                    log::warn!("stopping score: {}", e);
                    self.running.store(false, Ordering::Release);
                    break;
                }
            };
            log::trace!("{:04x}: {:?}", cursor, command);
            cursor += len;

            match command {
                Command::NoteOff { channel } => self.stop_note(channel),
                Command::NoteOn { channel, note } => self.play_note(channel, note),
                // A zero countdown never expires, so there is nothing to wait for.
                Command::Wait(0) => {}
                Command::Wait(ms) => {
                    self.cursor.store(cursor, Ordering::Relaxed);
                    self.seed_wait(ms as u32);
                    return;
                }
                Command::Restart => {
                    if restarted {
                        log::warn!("score loops without waiting; stopping");
                        self.running.store(false, Ordering::Release);
                        break;
                    }
                    restarted = true;
                    cursor = 0;
                }
                Command::Stop => {
                    self.running.store(false, Ordering::Release);
                    break;
                }
            }
        }

        self.cursor.store(cursor, Ordering::Relaxed);
    }

    /// Hand a score wait to the countdown, or park it behind a playing tone.
    fn seed_wait(&self, ms: u32) {
        if self.tone_playing.load(Ordering::Relaxed) {
            self.parked_wait.store(ms, Ordering::Relaxed);
        } else {
            self.countdown.store(ms, Ordering::Relaxed);
        }
    }

    pub(crate) fn play_note(&self, channel: u8, note: u8) {
        if channel >= self.channel_count() {
            log::debug!("note on channel {} ignored", channel);
            return;
        }
        let Some(frequency) = frequency_of(note) else {
            log::debug!("note {} has no frequency", note);
            return;
        };
        let amplitude = if self.gate.sound_enabled() {
            self.config.amplitude
        } else {
            0
        };
        self.score_channels[channel as usize].set(frequency, amplitude);
        self.refresh_channel(channel);
    }

    pub(crate) fn stop_note(&self, channel: u8) {
        if channel >= self.channel_count() {
            return;
        }
        self.score_channels[channel as usize].silence();
        self.refresh_channel(channel);
    }
}
