//! End-to-end playback behaviour: scores and tones driven tick by tick,
//! observed through a synth that records every write.

use pt_engine::{
    frequency_of, FrameClock, PlaybackState, Playtune, SoftSynth, Synth, ToneState,
};
use pt_score::{Score, ScoreBuilder};
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq)]
enum SynthWrite {
    Amplitude(u8, u8),
    Frequency(u8, f32),
    Output(bool),
}

#[derive(Default)]
struct RecordingSynth {
    writes: Mutex<Vec<SynthWrite>>,
}

impl RecordingSynth {
    fn take(&self) -> Vec<SynthWrite> {
        std::mem::take(&mut *self.writes.lock().unwrap())
    }
}

impl Synth for RecordingSynth {
    fn set_amplitude(&self, channel: u8, amplitude: u8) {
        self.writes.lock().unwrap().push(SynthWrite::Amplitude(channel, amplitude));
    }

    fn set_frequency(&self, channel: u8, hz: f32) {
        self.writes.lock().unwrap().push(SynthWrite::Frequency(channel, hz));
    }

    fn set_output_enabled(&self, enabled: bool) {
        self.writes.lock().unwrap().push(SynthWrite::Output(enabled));
    }
}

type Recorder = Playtune<RecordingSynth, AtomicBool>;

fn recorder() -> Recorder {
    let player = Playtune::new(RecordingSynth::default(), AtomicBool::new(true));
    player.init_channels(&mut FrameClock::new(8000));
    player.synth().take();
    player
}

fn soft_player() -> Playtune<SoftSynth, AtomicBool> {
    let player = Playtune::new(SoftSynth::new(8000), AtomicBool::new(true));
    player.init_channels(&mut FrameClock::new(8000));
    player
}

fn leak(bytes: Vec<u8>) -> &'static Score {
    Box::leak(Box::new(Score::new(Box::leak(bytes.into_boxed_slice()))))
}

fn ticks<S: Synth>(player: &Playtune<S, AtomicBool>, n: u32) {
    for _ in 0..n {
        player.tick();
    }
}

#[test]
fn leading_commands_run_before_play_score_returns() {
    let player = soft_player();
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 60)
            .note_on(1, 64)
            .wait(500)
            .stop()
            .build()
            .unwrap(),
    );

    player.play_score(score);

    assert!(player.is_playing());
    assert!(player.channel(0).unwrap().active);
    assert!(player.channel(1).unwrap().active);
    assert_eq!(player.channel(1).unwrap().frequency, frequency_of(64).unwrap());
    assert_eq!(player.countdown(), 500);
}

#[test]
fn thousand_ms_wait_resumes_on_the_thousandth_tick() {
    let player = soft_player();
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 69)
            .wait(1000)
            .note_off(0)
            .stop()
            .build()
            .unwrap(),
    );
    player.play_score(score);

    ticks(&player, 999);
    assert!(player.channel(0).unwrap().active);
    assert_eq!(player.playback_state(), PlaybackState::Running);

    player.tick();
    assert!(!player.channel(0).unwrap().active);
    assert_eq!(player.playback_state(), PlaybackState::Stopped);
}

#[test]
fn restart_reproduces_identical_output_every_loop() {
    let player = recorder();
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 60)
            .note_on(1, 67)
            .wait(30)
            .note_off(1)
            .note_on(0, 62)
            .wait(20)
            .note_off(0)
            .wait(50)
            .restart()
            .build()
            .unwrap(),
    );
    const LOOP_MS: u32 = 100;

    player.play_score(score);
    // Writes from the first batch belong to loop one; every later loop's
    // first batch runs on the tick that ends the previous loop.
    let mut loops = Vec::new();
    let mut current = player.synth().take();
    for _ in 0..5 {
        for tick in 1..=LOOP_MS {
            player.tick();
            let writes = player.synth().take();
            if tick == LOOP_MS {
                loops.push(std::mem::replace(&mut current, writes));
            } else {
                current.extend(writes);
            }
        }
    }

    assert_eq!(loops.len(), 5);
    assert!(!loops[0].is_empty());
    for (i, lap) in loops.iter().enumerate().skip(1) {
        assert_eq!(lap, &loops[0], "loop {} diverged", i + 1);
    }
    assert!(player.is_playing());
}

#[test]
fn muting_tone_owns_channel_zero_then_hands_it_back() {
    let player = soft_player();
    player.tone_mutes_score(true);
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 60)
            .note_on(1, 64)
            .wait(1000)
            .stop()
            .build()
            .unwrap(),
    );
    player.play_score(score);
    ticks(&player, 100);

    player.tone(880, 200);
    assert_eq!(player.tone_state(), ToneState::Playing);
    assert_eq!(player.channel(0).unwrap().frequency, 880.0);
    assert!(!player.channel(1).unwrap().is_audible());
    // The score's own view is untouched.
    assert_eq!(player.score_channel(0).unwrap().frequency, frequency_of(60).unwrap());

    ticks(&player, 199);
    assert_eq!(player.channel(0).unwrap().frequency, 880.0);

    player.tick();
    assert_eq!(player.tone_state(), ToneState::Idle);
    let ch0 = player.channel(0).unwrap();
    assert!(ch0.active);
    assert_eq!(ch0.frequency, frequency_of(60).unwrap());
    assert!(player.channel(1).unwrap().is_audible());

    // The score finishes its wait where it left off.
    assert_eq!(player.countdown(), 900);
    ticks(&player, 900);
    assert!(!player.is_playing());
}

#[test]
fn closed_player_activates_nothing() {
    let player = recorder();
    player.close_channels();
    player.synth().take();

    player.tone(440, 100);
    player.play_score(leak(vec![0x90, 60, 0x00, 0x10, 0xF0]));
    ticks(&player, 50);

    assert_eq!(player.tone_state(), ToneState::Idle);
    assert!(!player.is_playing());
    assert_eq!(player.channel_count(), 0);
    assert!(player.synth().take().is_empty());
}

#[test]
fn disabled_sound_keeps_time_but_not_amplitude() {
    let player = recorder();
    player.gate().store(false, std::sync::atomic::Ordering::Relaxed);
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 60)
            .wait(10)
            .note_on(1, 72)
            .wait(10)
            .stop()
            .build()
            .unwrap(),
    );

    player.play_score(score);
    ticks(&player, 10);
    assert!(player.is_playing());
    assert!(player.score_channel(1).unwrap().active);

    let writes = player.synth().take();
    assert!(writes
        .iter()
        .all(|w| !matches!(w, SynthWrite::Amplitude(_, amp) if *amp > 0)));

    ticks(&player, 10);
    assert!(!player.is_playing());
}

#[test]
fn out_of_range_notes_leave_channels_alone() {
    let player = soft_player();
    player.play_score(leak(vec![0x90, 60, 0x90, 200, 0x00, 0x05, 0xF0]));
    assert_eq!(player.channel(0).unwrap().frequency, frequency_of(60).unwrap());
    assert!(frequency_of(128).is_none());
}

fn sound_on() -> bool {
    true
}

static STATIC_PLAYER: Playtune<SoftSynth, fn() -> bool> =
    Playtune::new(SoftSynth::new(8000), sound_on as fn() -> bool);

#[test]
fn player_can_live_in_a_static() {
    static SCORE: Score = Score::new(&[0x90, 69, 0x00, 0x02, 0x80, 0xF0]);

    STATIC_PLAYER.init_channels(&mut FrameClock::new(8000));
    STATIC_PLAYER.play_score(&SCORE);
    assert!(STATIC_PLAYER.channel(0).unwrap().active);

    STATIC_PLAYER.tick();
    STATIC_PLAYER.tick();
    assert!(!STATIC_PLAYER.is_playing());
    assert!(!STATIC_PLAYER.channel(0).unwrap().active);
}
