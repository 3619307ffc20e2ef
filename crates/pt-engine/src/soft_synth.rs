//! Software sine-voice synth for hosts without tone hardware.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use crate::frame::Frame;
use crate::player::MAX_CHANNELS;
use crate::synth::Synth;

/// Peak level of one voice at full amplitude. Two voices cannot clip.
const VOICE_PEAK: f32 = 12_000.0;

/// Full-scale amplitude value.
pub const FULL_AMPLITUDE: u8 = 64;

#[derive(Debug)]
struct Voice {
    amplitude: AtomicU8,
    /// `f32` bits, Hz.
    frequency: AtomicU32,
    /// `f32` bits, cycles in [0, 1). Only touched by the renderer.
    phase: AtomicU32,
}

impl Voice {
    const fn new() -> Self {
        Self {
            amplitude: AtomicU8::new(0),
            frequency: AtomicU32::new(0),
            phase: AtomicU32::new(0),
        }
    }
}

/// A [`Synth`] made of sine oscillators.
///
/// Control calls store into atomics; [`render_frame`](Self::render_frame)
/// reads them, so control and rendering may run on different threads.
#[derive(Debug)]
pub struct SoftSynth {
    sample_rate: u32,
    voices: [Voice; MAX_CHANNELS],
    output_enabled: AtomicBool,
}

impl SoftSynth {
    pub const fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            voices: [Voice::new(), Voice::new()],
            output_enabled: AtomicBool::new(false),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn amplitude(&self, channel: u8) -> u8 {
        self.voices
            .get(channel as usize)
            .map_or(0, |v| v.amplitude.load(Ordering::Relaxed))
    }

    pub fn frequency(&self, channel: u8) -> f32 {
        self.voices
            .get(channel as usize)
            .map_or(0.0, |v| f32::from_bits(v.frequency.load(Ordering::Relaxed)))
    }

    pub fn output_enabled(&self) -> bool {
        self.output_enabled.load(Ordering::Relaxed)
    }

    /// Render one frame and advance the oscillators.
    pub fn render_frame(&self) -> Frame {
        if !self.output_enabled() || self.sample_rate == 0 {
            return Frame::silence();
        }

        let mut mix = 0.0f32;
        for voice in &self.voices {
            let amplitude = voice.amplitude.load(Ordering::Relaxed);
            let hz = f32::from_bits(voice.frequency.load(Ordering::Relaxed));
            let phase = f32::from_bits(voice.phase.load(Ordering::Relaxed));

            if amplitude > 0 {
                let level = VOICE_PEAK * amplitude as f32 / FULL_AMPLITUDE as f32;
                mix += level * libm::sinf(phase * core::f32::consts::TAU);
            }

            let next = phase + hz / self.sample_rate as f32;
            voice.phase.store((next - libm::floorf(next)).to_bits(), Ordering::Relaxed);
        }

        Frame::mono(mix.clamp(i16::MIN as f32, i16::MAX as f32) as i16)
    }
}

impl Synth for SoftSynth {
    fn set_amplitude(&self, channel: u8, amplitude: u8) {
        if let Some(voice) = self.voices.get(channel as usize) {
            voice.amplitude.store(amplitude.min(FULL_AMPLITUDE), Ordering::Relaxed);
        }
    }

    fn set_frequency(&self, channel: u8, hz: f32) {
        if let Some(voice) = self.voices.get(channel as usize) {
            voice.frequency.store(hz.to_bits(), Ordering::Relaxed);
        }
    }

    fn set_output_enabled(&self, enabled: bool) {
        self.output_enabled.store(enabled, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_until_enabled() {
        let synth = SoftSynth::new(8000);
        synth.set_frequency(0, 440.0);
        synth.set_amplitude(0, FULL_AMPLITUDE);
        assert!((0..100).all(|_| synth.render_frame().is_silent()));

        synth.set_output_enabled(true);
        assert!((0..100).any(|_| !synth.render_frame().is_silent()));
    }

    #[test]
    fn zero_amplitude_renders_silence() {
        let synth = SoftSynth::new(8000);
        synth.set_output_enabled(true);
        synth.set_frequency(1, 440.0);
        assert!((0..100).all(|_| synth.render_frame().is_silent()));
    }

    #[test]
    fn peak_stays_within_voice_budget() {
        let synth = SoftSynth::new(8000);
        synth.set_output_enabled(true);
        for ch in 0..2 {
            synth.set_frequency(ch, 500.0);
            synth.set_amplitude(ch, FULL_AMPLITUDE);
        }
        let peak = (0..8000)
            .map(|_| synth.render_frame().left.saturating_abs())
            .max()
            .unwrap();
        assert!(peak > 20_000 && peak <= 24_000, "peak {}", peak);
    }

    #[test]
    fn out_of_range_channel_is_ignored() {
        let synth = SoftSynth::new(8000);
        synth.set_amplitude(5, 10);
        assert_eq!(synth.amplitude(5), 0);
    }
}
