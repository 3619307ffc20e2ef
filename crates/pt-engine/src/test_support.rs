//! Shared fixtures for unit tests.

use std::sync::atomic::AtomicBool;

use pt_score::Score;

use crate::player::Playtune;
use crate::soft_synth::SoftSynth;
use crate::timer::FrameClock;

pub type TestPlayer = Playtune<SoftSynth, AtomicBool>;

/// A player with sound enabled, channels not yet initialized.
pub fn player() -> TestPlayer {
    Playtune::new(SoftSynth::new(8000), AtomicBool::new(true))
}

pub fn init_player() -> TestPlayer {
    let player = player();
    player.init_channels(&mut FrameClock::new(8000));
    player
}

/// Give test bytes the `'static` lifetime scores need.
pub fn leak(bytes: &[u8]) -> &'static Score {
    let bytes: &'static [u8] = Box::leak(bytes.to_vec().into_boxed_slice());
    Box::leak(Box::new(Score::new(bytes)))
}

pub fn run_ticks(player: &TestPlayer, ticks: usize) {
    for _ in 0..ticks {
        player.tick();
    }
}
