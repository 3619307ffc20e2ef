//! Allocation-free tick path tests.
//!
//! These tests verify that `Playtune::tick()` and `SoftSynth::render_frame()`
//! do not allocate once playback has started. They run scores for several
//! seconds of frames, with tones landing on top, so every branch of the
//! tick handler is taken inside the guard.
//!
//! Runs under plain `cargo test`; the guard needs no feature flag.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use pt_engine::{FrameClock, Playtune, SoftSynth};
use pt_score::{Score, ScoreBuilder};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

const SAMPLE_RATE: u32 = 44100;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/scores")
}

fn leak(bytes: Vec<u8>) -> &'static Score {
    Box::leak(Box::new(Score::new(Box::leak(bytes.into_boxed_slice()))))
}

/// Play `score` for `duration_frames`, aborting on any heap allocation.
/// A tone is requested every `tone_every` frames when given.
fn assert_playback_alloc_free(score: &'static Score, duration_frames: usize, tone_every: Option<usize>) {
    let player = Playtune::new(SoftSynth::new(SAMPLE_RATE), AtomicBool::new(true));
    let mut clock = FrameClock::new(SAMPLE_RATE);
    player.init_channels(&mut clock);

    assert_no_alloc(|| {
        player.play_score(score);
        for frame in 0..duration_frames {
            if tone_every.is_some_and(|n| frame % n == n / 2) {
                player.tone(660, 120);
            }
            if clock.advance() {
                player.tick();
            }
            player.synth().render_frame();
        }
    });
}

#[test]
fn looping_score_alloc_free() {
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 48)
            .note_on(1, 76)
            .wait(125)
            .note_off(1)
            .note_on(0, 50)
            .wait(125)
            .note_off(0)
            .wait(50)
            .restart()
            .build()
            .unwrap(),
    );
    assert_playback_alloc_free(score, SAMPLE_RATE as usize * 5, None);
}

#[test]
fn tones_over_score_alloc_free() {
    let score = leak(
        ScoreBuilder::new()
            .note_on(0, 60)
            .note_on(1, 64)
            .wait(333)
            .note_on(1, 67)
            .wait(333)
            .restart()
            .build()
            .unwrap(),
    );
    assert_playback_alloc_free(score, SAMPLE_RATE as usize * 5, Some(SAMPLE_RATE as usize / 3));
}

#[test]
fn siren_fixture_alloc_free() {
    let data = fs::read(fixtures_dir().join("siren.bin")).unwrap();
    let loaded = pt_formats::load_score(&data, 2).unwrap();
    assert_playback_alloc_free(leak(loaded.bytes), SAMPLE_RATE as usize * 5, None);
}

#[test]
fn ode_to_joy_fixture_alloc_free() {
    let source = fs::read_to_string(fixtures_dir().join("ode_to_joy.c")).unwrap();
    let loaded = pt_formats::load_c_source(&source, 2).unwrap();
    assert_playback_alloc_free(leak(loaded.bytes), SAMPLE_RATE as usize * 6, Some(SAMPLE_RATE as usize));
}
