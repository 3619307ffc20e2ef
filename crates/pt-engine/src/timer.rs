//! Periodic tick sources.
//!
//! The player never owns an interrupt. A [`TickTimer`] is started once by
//! [`Playtune::init_channels`](crate::Playtune::init_channels) and whatever
//! fires it (an ISR, an audio callback) calls [`Playtune::tick`](crate::Playtune::tick).

/// Periodic timer that drives the player.
pub trait TickTimer {
    /// Begin firing every `period_us` microseconds.
    fn start(&mut self, period_us: u32);
}

const MICROS_PER_SECOND: u64 = 1_000_000;

/// Tick source counted in rendered audio frames.
///
/// Fractional periods are spread evenly: at 44.1 kHz and 1 ms the clock
/// ticks 1000 times per 44100 frames, alternating 44 and 45 frame gaps.
#[derive(Clone, Debug)]
pub struct FrameClock {
    sample_rate: u32,
    /// Frames-per-tick scaled by one million; 0 while stopped.
    threshold: u64,
    accumulator: u64,
}

impl FrameClock {
    pub const fn new(sample_rate: u32) -> Self {
        Self { sample_rate, threshold: 0, accumulator: 0 }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_running(&self) -> bool {
        self.threshold > 0
    }

    /// Account for one rendered frame. True when a tick is due.
    pub fn advance(&mut self) -> bool {
        if self.threshold == 0 {
            return false;
        }
        self.accumulator += MICROS_PER_SECOND;
        if self.accumulator >= self.threshold {
            self.accumulator -= self.threshold;
            true
        } else {
            false
        }
    }
}

impl TickTimer for FrameClock {
    fn start(&mut self, period_us: u32) {
        self.threshold = self.sample_rate as u64 * period_us as u64;
        self.accumulator = 0;
    }
}
