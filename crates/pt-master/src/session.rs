//! The live player and the queue that feeds it control calls.
//!
//! Only the audio thread touches the player's control methods. The
//! controller pushes [`Control`]s into an SPSC queue and the audio thread
//! applies them between frames, so a batch started by a tick always runs to
//! its wait before a new score or tone can land.

use pt_engine::{Frame, FrameClock};
use pt_score::Score;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::Player;

const CONTROL_QUEUE_LEN: usize = 16;

#[derive(Clone, Copy, Debug)]
pub(crate) enum Control {
    PlayScore(&'static Score),
    StopScore,
    Tone { frequency: u16, duration_ms: u32 },
    ToneMutesScore(bool),
}

/// Sending half, owned by the controller.
pub(crate) struct ControlLink {
    producer: HeapProd<Control>,
    sent: u64,
    applied: Arc<AtomicU64>,
}

/// Receiving half, owned by the audio thread together with the clock.
pub(crate) struct Session {
    player: Arc<Player>,
    clock: FrameClock,
    controls: HeapCons<Control>,
    applied: Arc<AtomicU64>,
    applied_count: u64,
}

pub(crate) fn control_channel(player: Arc<Player>, clock: FrameClock) -> (ControlLink, Session) {
    let (producer, controls) = HeapRb::<Control>::new(CONTROL_QUEUE_LEN).split();
    let applied = Arc::new(AtomicU64::new(0));
    let link = ControlLink {
        producer,
        sent: 0,
        applied: applied.clone(),
    };
    let session = Session {
        player,
        clock,
        controls,
        applied,
        applied_count: 0,
    };
    (link, session)
}

impl ControlLink {
    /// Queue a control, sleeping while the queue is full.
    pub(crate) fn send(&mut self, control: Control) {
        let mut pending = control;
        while let Err(rejected) = self.producer.try_push(pending) {
            pending = rejected;
            std::thread::sleep(Duration::from_millis(1));
        }
        self.sent += 1;
    }

    /// True once the audio thread has applied everything sent so far.
    pub(crate) fn is_applied(&self) -> bool {
        self.applied.load(Ordering::Acquire) >= self.sent
    }
}

impl Session {
    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    /// Apply queued controls, then advance one frame.
    pub(crate) fn next_frame(&mut self) -> Frame {
        self.apply_pending();
        if self.clock.advance() {
            self.player.tick();
        }
        self.player.synth().render_frame()
    }

    fn apply_pending(&mut self) {
        let before = self.applied_count;
        while let Some(control) = self.controls.try_pop() {
            match control {
                Control::PlayScore(score) => self.player.play_score(score),
                Control::StopScore => self.player.stop_score(),
                Control::Tone { frequency, duration_ms } => self.player.tone(frequency, duration_ms),
                Control::ToneMutesScore(mute) => self.player.tone_mutes_score(mute),
            }
            self.applied_count += 1;
        }
        if self.applied_count != before {
            self.applied.store(self.applied_count, Ordering::Release);
        }
    }
}
