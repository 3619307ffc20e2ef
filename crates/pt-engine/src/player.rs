//! The player: all playback state in one object shared by the tick and main
//! contexts.

use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, AtomicU8, AtomicUsize, Ordering};

use heapless::Vec;
use pt_score::Score;

use crate::channel::{ChannelSnapshot, ChannelState};
use crate::soft_synth::FULL_AMPLITUDE;
use crate::synth::{OutputGate, Synth};
use crate::timer::TickTimer;

/// Voices available to scores and tones.
pub const MAX_CHANNELS: usize = 2;

/// Channel a tone claims.
pub const TONE_CHANNEL: u8 = 0;

/// Channel silenced during a tone when tones mute the score.
pub const SCORE_CHANNEL: u8 = 1;

/// Fixed player parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Channels to initialize, at most [`MAX_CHANNELS`].
    pub channels: u8,
    /// Tick period; one tick is one millisecond of score time.
    pub tick_period_us: u32,
    /// Amplitude given to sounding notes and tones.
    pub amplitude: u8,
}

impl Config {
    pub const DEFAULT: Config = Config {
        channels: MAX_CHANNELS as u8,
        tick_period_us: 1000,
        amplitude: FULL_AMPLITUDE,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneState {
    Idle,
    Playing,
}

/// Score interpreter, tick scheduler, and tone arbitrator.
///
/// Every field is a single-word atomic and every method takes `&self`, so one
/// player can be a `static` shared with a timer interrupt. Fields are only
/// ever loaded and stored, never read-modify-written, which keeps the player
/// usable on cores without compare-and-swap.
///
/// That only holds while the tick preempts the control calls and never runs
/// beside them. Control calls made from a thread that runs in parallel with
/// the ticking one must be handed to the ticking thread and applied between
/// ticks. Inspection methods are safe from anywhere.
///
/// Two views of each channel are kept: what the score asked for, and what
/// the synth is currently producing. They differ while a tone holds channel
/// 0 or mutes channel 1; when the tone ends the synth is rewritten from the
/// score's view.
pub struct Playtune<S, G> {
    pub(crate) synth: S,
    pub(crate) gate: G,
    pub(crate) config: Config,

    pub(crate) channel_count: AtomicU8,
    timer_started: AtomicBool,

    pub(crate) score: AtomicPtr<Score>,
    pub(crate) cursor: AtomicUsize,
    pub(crate) running: AtomicBool,

    /// Milliseconds until the next score batch or tone end.
    pub(crate) countdown: AtomicU32,
    /// Score wait set aside while a tone owns the countdown.
    pub(crate) parked_wait: AtomicU32,

    pub(crate) tone_playing: AtomicBool,
    pub(crate) tone_mutes_score: AtomicBool,
    /// `tone_mutes_score` as captured when the current tone started.
    pub(crate) score_muted: AtomicBool,

    pub(crate) score_channels: [ChannelState; MAX_CHANNELS],
    pub(crate) output: [ChannelState; MAX_CHANNELS],
}

impl<S: Synth, G: OutputGate> Playtune<S, G> {
    pub const fn new(synth: S, gate: G) -> Self {
        Self::with_config(synth, gate, Config::DEFAULT)
    }

    pub const fn with_config(synth: S, gate: G, config: Config) -> Self {
        Self {
            synth,
            gate,
            config,
            channel_count: AtomicU8::new(0),
            timer_started: AtomicBool::new(false),
            score: AtomicPtr::new(core::ptr::null_mut()),
            cursor: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            countdown: AtomicU32::new(0),
            parked_wait: AtomicU32::new(0),
            tone_playing: AtomicBool::new(false),
            tone_mutes_score: AtomicBool::new(false),
            score_muted: AtomicBool::new(false),
            score_channels: [ChannelState::new(), ChannelState::new()],
            output: [ChannelState::new(), ChannelState::new()],
        }
    }

    /// Bring up the channels and start the tick timer.
    ///
    /// The timer is started on the first call only. Calling again, with or
    /// without [`close_channels`](Self::close_channels) in between, resets
    /// the channels without starting a second timer.
    pub fn init_channels<T: TickTimer>(&self, timer: &mut T) {
        let count = (self.config.channels as usize).min(MAX_CHANNELS) as u8;
        for ch in 0..MAX_CHANNELS as u8 {
            self.score_channels[ch as usize].reset();
            self.drive_silence(ch);
        }
        self.synth.set_output_enabled(false);
        self.channel_count.store(count, Ordering::Release);

        if self.timer_started.load(Ordering::Relaxed) {
            log::debug!("tick timer already running");
        } else {
            timer.start(self.config.tick_period_us);
            self.timer_started.store(true, Ordering::Relaxed);
        }
        log::debug!("initialized {} channels", count);
    }

    /// Silence everything and return to the uninitialized state.
    ///
    /// The tick timer keeps running; ticks are ignored until the next
    /// [`init_channels`](Self::init_channels).
    pub fn close_channels(&self) {
        self.running.store(false, Ordering::Release);
        self.countdown.store(0, Ordering::Relaxed);
        self.parked_wait.store(0, Ordering::Relaxed);
        self.tone_playing.store(false, Ordering::Relaxed);
        self.score_muted.store(false, Ordering::Relaxed);
        self.channel_count.store(0, Ordering::Release);

        for ch in 0..MAX_CHANNELS as u8 {
            self.score_channels[ch as usize].reset();
            self.drive_silence(ch);
        }
        self.synth.set_output_enabled(false);
        self.score.store(core::ptr::null_mut(), Ordering::Release);
        self.cursor.store(0, Ordering::Relaxed);
        log::debug!("channels closed");
    }

    // --- Inspection ---

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn synth(&self) -> &S {
        &self.synth
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    /// Initialized channels; 0 before init and after close.
    pub fn channel_count(&self) -> u8 {
        self.channel_count.load(Ordering::Acquire)
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.running.load(Ordering::Acquire) {
            PlaybackState::Running
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn tone_state(&self) -> ToneState {
        if self.tone_playing.load(Ordering::Relaxed) {
            ToneState::Playing
        } else {
            ToneState::Idle
        }
    }

    /// Milliseconds left on the shared countdown.
    pub fn countdown(&self) -> u32 {
        self.countdown.load(Ordering::Relaxed)
    }

    /// The score most recently passed to `play_score`.
    pub fn score(&self) -> Option<&'static Score> {
        let ptr = self.score.load(Ordering::Acquire);
        // SAFETY: the pointer is either null or was created from a
        // `&'static Score` in `play_score`, so it is valid forever.
        unsafe { ptr.as_ref() }
    }

    /// Byte offset of the next command.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    /// What the synth is producing on `channel`.
    pub fn channel(&self, channel: u8) -> Option<ChannelSnapshot> {
        self.output.get(channel as usize).map(ChannelState::snapshot)
    }

    /// What the score last asked of `channel`.
    pub fn score_channel(&self, channel: u8) -> Option<ChannelSnapshot> {
        self.score_channels.get(channel as usize).map(ChannelState::snapshot)
    }

    /// Output state of every initialized channel.
    pub fn channels(&self) -> Vec<ChannelSnapshot, MAX_CHANNELS> {
        self.output
            .iter()
            .take(self.channel_count() as usize)
            .map(ChannelState::snapshot)
            .collect()
    }

    // --- Synth plumbing ---

    pub(crate) fn drive(&self, channel: u8, frequency: f32, amplitude: u8) {
        self.output[channel as usize].set(frequency, amplitude);
        self.synth.set_frequency(channel, frequency);
        self.synth.set_amplitude(channel, amplitude);
    }

    pub(crate) fn drive_silence(&self, channel: u8) {
        self.output[channel as usize].silence();
        self.synth.set_amplitude(channel, 0);
    }

    /// Speaker on while any channel holds a note.
    pub(crate) fn update_output_enable(&self) {
        let any = self.output.iter().any(ChannelState::is_active);
        self.synth.set_output_enabled(any);
    }

    /// Rewrite the synth for `channel` from the score's view, unless a tone
    /// owns or mutes it.
    pub(crate) fn refresh_channel(&self, channel: u8) {
        if self.tone_playing.load(Ordering::Relaxed) {
            if channel == TONE_CHANNEL {
                return;
            }
            if channel == SCORE_CHANNEL && self.score_muted.load(Ordering::Relaxed) {
                self.drive_silence(channel);
                self.update_output_enable();
                return;
            }
        }

        let wanted = self.score_channels[channel as usize].snapshot();
        if wanted.active {
            self.drive(channel, wanted.frequency, wanted.amplitude);
        } else {
            self.drive_silence(channel);
        }
        self.update_output_enable();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft_synth::SoftSynth;
    use crate::test_support::{init_player, leak, player, run_ticks};
    use crate::timer::FrameClock;

    #[derive(Default)]
    struct CountingTimer {
        starts: u32,
    }

    impl TickTimer for CountingTimer {
        fn start(&mut self, _period_us: u32) {
            self.starts += 1;
        }
    }

    fn player_with_channels(channels: u8) -> Playtune<SoftSynth, AtomicBool> {
        let config = Config { channels, ..Config::DEFAULT };
        let player = Playtune::with_config(SoftSynth::new(8000), AtomicBool::new(true), config);
        player.init_channels(&mut FrameClock::new(8000));
        player
    }

    #[test]
    fn timer_starts_once_across_reinit() {
        let player = player();
        let mut timer = CountingTimer::default();

        player.init_channels(&mut timer);
        player.init_channels(&mut timer);
        assert_eq!(timer.starts, 1);

        player.close_channels();
        player.init_channels(&mut timer);
        assert_eq!(timer.starts, 1);
        assert_eq!(player.channel_count(), 2);
    }

    #[test]
    fn second_clock_is_left_stopped() {
        let player = player();
        let mut first = FrameClock::new(8000);
        let mut second = FrameClock::new(8000);

        player.init_channels(&mut first);
        player.close_channels();
        player.init_channels(&mut second);

        assert!(first.is_running());
        assert!(!second.is_running());
    }

    #[test]
    fn reinit_silences_a_sounding_player() {
        let player = init_player();
        player.play_score(leak(&[0x90, 60, 0x91, 64, 0x03, 0xE8, 0xF0]));
        player.init_channels(&mut CountingTimer::default());

        assert!(player.channels().iter().all(|c| !c.active));
        assert!(!player.synth().output_enabled());
    }

    #[test]
    fn channel_count_is_clamped() {
        let player = player_with_channels(9);
        assert_eq!(player.channel_count(), MAX_CHANNELS as u8);
        assert_eq!(player.channels().len(), MAX_CHANNELS);
    }

    #[test]
    fn single_channel_player_refuses_tones() {
        let player = player_with_channels(1);
        player.play_score(leak(&[0x90, 60, 0x91, 64, 0x00, 0x64, 0xF0]));

        assert_eq!(player.channel_count(), 1);
        assert!(player.channel(0).unwrap().active);
        assert!(!player.channel(1).unwrap().active);
        assert!(!player.score_channel(1).unwrap().active);
        assert_eq!(player.synth().amplitude(1), 0);

        player.tone(880, 50);
        assert_eq!(player.tone_state(), ToneState::Idle);
        assert_eq!(player.channel(0).unwrap().frequency, player.score_channel(0).unwrap().frequency);
        assert_eq!(player.countdown(), 100);
    }

    #[test]
    fn ticks_after_close_do_nothing() {
        let player = init_player();
        player.play_score(leak(&[0x90, 60, 0x00, 0x05, 0x91, 64, 0x00, 0x05, 0xF0]));
        player.tone(880, 3);
        assert!(player.countdown() > 0);

        player.close_channels();
        run_ticks(&player, 50);

        assert_eq!(player.channel_count(), 0);
        assert_eq!(player.countdown(), 0);
        assert_eq!(player.cursor(), 0);
        assert!(player.score().is_none());
        assert_eq!(player.playback_state(), PlaybackState::Stopped);
        assert_eq!(player.tone_state(), ToneState::Idle);
        assert!(player.channels().is_empty());
        assert!((0..MAX_CHANNELS as u8).all(|ch| player.synth().amplitude(ch) == 0));
        assert!(!player.synth().output_enabled());
    }

    #[test]
    fn controls_before_init_are_ignored() {
        let player = player();
        player.play_score(leak(&[0x90, 60, 0x00, 0x05, 0xF0]));
        player.tone(880, 10);
        run_ticks(&player, 10);

        assert!(!player.is_playing());
        assert_eq!(player.tone_state(), ToneState::Idle);
        assert!(!player.synth().output_enabled());
    }
}
