//! Headless controller for playtune.
//!
//! Owns a loaded score and a player, runs the player against a real audio
//! device on its own thread, and renders scores offline to WAV.

mod cue;
mod session;
mod wav;

use pt_audio::{AudioError, AudioOutput, CpalOutput};
use pt_engine::{Config, FrameClock, Playtune, SoftSynth, ToneState, MAX_CHANNELS};
use session::{control_channel, Control, ControlLink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

// Re-export common types so callers don't need pt-score/pt-engine directly.
pub use pt_engine::{ChannelSnapshot, Frame, PlaybackState};
pub use pt_formats::{FormatError, PlaytuneHeader};
pub use pt_score::{Score, ScoreSummary};

pub use cue::{ParseCueError, ToneCue};
pub use wav::{frames_to_wav, write_wav, MAX_WAV_FRAMES};

/// The player a controller drives: software voices, sound switch in an
/// atomic flag.
pub type Player = Playtune<SoftSynth, AtomicBool>;

/// Frames of silence queued after playback so the device drains cleanly.
const TAIL_MS: u32 = 100;

/// Initial buffer for renders whose length is not known up front.
const LOOPING_RENDER_RESERVE_MS: u64 = 60_000;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("no score loaded")]
    NoScore,
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("audio thread exited during startup")]
    AudioThread,
    #[error("sample rate must be non-zero")]
    InvalidSampleRate,
    #[error("{seconds} s at {sample_rate} Hz does not fit in a WAV file")]
    RenderTooLong { seconds: u32, sample_rate: u32 },
    #[error("WAV encoding failed: {0}")]
    Wav(#[from] std::io::Error),
}

/// Headless playtune controller: owns a score and manages playback.
///
/// While audio is open the player belongs to the audio thread. Control
/// calls are queued to it and applied between frames; each returns once the
/// audio thread has applied it.
pub struct Controller {
    config: Config,
    score: Option<&'static Score>,
    header: Option<PlaytuneHeader>,
    summary: Option<ScoreSummary>,
    cues: Vec<ToneCue>,
    tone_mutes_score: bool,
    sound_enabled: bool,
    playback: Option<PlaybackHandle>,
}

struct PlaybackHandle {
    player: Arc<Player>,
    link: ControlLink,
    stop_signal: Arc<AtomicBool>,
    sample_rate: u32,
    thread: Option<JoinHandle<()>>,
}

impl PlaybackHandle {
    fn send(&mut self, control: Control) {
        self.link.send(control);
        while !self.link.is_applied() {
            if self.thread.as_ref().map_or(true, JoinHandle::is_finished) {
                log::warn!("audio thread gone; {:?} dropped", control);
                return;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::with_config(Config::DEFAULT)
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            score: None,
            header: None,
            summary: None,
            cues: Vec::new(),
            tone_mutes_score: false,
            sound_enabled: true,
            playback: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // --- Score management ---

    pub fn score(&self) -> Option<&'static Score> {
        self.score
    }

    pub fn header(&self) -> Option<&PlaytuneHeader> {
        self.header.as_ref()
    }

    pub fn summary(&self) -> Option<&ScoreSummary> {
        self.summary.as_ref()
    }

    /// Load a Playtune bytestream, with or without its header.
    ///
    /// The bytes are leaked: a player may hold a score for as long as it
    /// lives, so every loaded score stays in memory for the rest of the
    /// process.
    pub fn load_score(&mut self, data: &[u8]) -> Result<&ScoreSummary, FormatError> {
        let loaded = pt_formats::load_score(data, self.channel_limit())?;
        Ok(self.install(loaded))
    }

    /// Load a score from the C byte-array source it was published as.
    pub fn load_c_source(&mut self, source: &str) -> Result<&ScoreSummary, FormatError> {
        let loaded = pt_formats::load_c_source(source, self.channel_limit())?;
        Ok(self.install(loaded))
    }

    fn install(&mut self, loaded: pt_formats::LoadedScore) -> &ScoreSummary {
        if let Some(pb) = &mut self.playback {
            pb.send(Control::StopScore);
        }
        log::info!(
            "loaded score: {} bytes, {} notes, {} ms{}",
            loaded.bytes.len(),
            loaded.summary.total_notes,
            loaded.summary.duration_ms,
            if loaded.summary.loops { ", loops" } else { "" }
        );
        self.score = Some(leak_score(loaded.bytes));
        self.header = loaded.header;
        self.summary.insert(loaded.summary)
    }

    fn channel_limit(&self) -> u8 {
        self.config.channels.min(MAX_CHANNELS as u8)
    }

    /// Schedule a tone relative to the start of an offline render.
    pub fn add_tone_cue(&mut self, cue: ToneCue) {
        let at = self.cues.partition_point(|c| c.at_ms <= cue.at_ms);
        self.cues.insert(at, cue);
    }

    /// Scheduled tones, earliest first.
    pub fn tone_cues(&self) -> &[ToneCue] {
        &self.cues
    }

    // --- Real-time playback ---

    /// Open the audio device and start ticking the player.
    ///
    /// Does nothing if audio is already running.
    pub fn open_audio(&mut self) -> Result<(), ControllerError> {
        if self.playback.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let stop_signal = Arc::new(AtomicBool::new(false));
        let settings = self.settings();

        let stop = stop_signal.clone();
        let thread = std::thread::spawn(move || audio_thread(settings, stop, ready_tx));

        let (player, link, sample_rate) = match ready_rx.recv() {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e.into());
            }
            Err(_) => {
                let _ = thread.join();
                return Err(ControllerError::AudioThread);
            }
        };

        self.playback = Some(PlaybackHandle {
            player,
            link,
            stop_signal,
            sample_rate,
            thread: Some(thread),
        });
        Ok(())
    }

    /// Start the loaded score from the beginning, opening audio if needed.
    pub fn play(&mut self) -> Result<(), ControllerError> {
        let score = self.score.ok_or(ControllerError::NoScore)?;
        self.open_audio()?;
        if let Some(pb) = &mut self.playback {
            pb.send(Control::PlayScore(score));
        }
        Ok(())
    }

    /// Stop the score and any tone. Audio stays open.
    pub fn stop(&mut self) {
        if let Some(pb) = &mut self.playback {
            pb.send(Control::StopScore);
        }
    }

    /// Silence everything and release the audio device.
    pub fn close(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.as_ref().is_some_and(|pb| pb.player.is_playing())
    }

    pub fn is_tone_playing(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|pb| pb.player.tone_state() == ToneState::Playing)
    }

    /// Device sample rate, once audio is open.
    pub fn sample_rate(&self) -> Option<u32> {
        self.playback.as_ref().map(|pb| pb.sample_rate)
    }

    /// The live player, once audio is open. For inspection only; control
    /// goes through the controller.
    pub fn player(&self) -> Option<&Player> {
        self.playback.as_ref().map(|pb| pb.player.as_ref())
    }

    /// Play a tone over whatever the score is doing, opening audio if needed.
    pub fn tone(&mut self, frequency: u16, duration_ms: u32) -> Result<(), ControllerError> {
        self.open_audio()?;
        if let Some(pb) = &mut self.playback {
            pb.send(Control::Tone { frequency, duration_ms });
        }
        Ok(())
    }

    pub fn set_tone_mutes_score(&mut self, mute: bool) {
        self.tone_mutes_score = mute;
        if let Some(pb) = &mut self.playback {
            pb.send(Control::ToneMutesScore(mute));
        }
    }

    /// Global sound switch. While off, notes start silent and tones are
    /// refused; the score keeps its timing.
    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
        if let Some(pb) = &self.playback {
            // A lone flag the tick side only reads.
            pb.player.gate().store(enabled, Ordering::Relaxed);
        }
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    // --- Offline rendering ---

    /// Render the loaded score, with its tone cues, until both have finished
    /// or `max_frames` is reached.
    pub fn render_frames(
        &self,
        sample_rate: u32,
        max_frames: usize,
    ) -> Result<Vec<Frame>, ControllerError> {
        let score = self.score.ok_or(ControllerError::NoScore)?;
        if sample_rate == 0 {
            return Err(ControllerError::InvalidSampleRate);
        }
        let (player, mut clock) = self.settings().build(sample_rate);
        player.play_score(score);

        let reserve = self.expected_frames(sample_rate).min(max_frames as u64) as usize;
        let mut frames = Vec::with_capacity(reserve);
        let mut cues = self.cues.iter().peekable();
        let mut elapsed_ms: u64 = 0;

        while frames.len() < max_frames
            && (player.is_playing()
                || player.tone_state() == ToneState::Playing
                || cues.peek().is_some())
        {
            if clock.advance() {
                player.tick();
                elapsed_ms += 1;
            }
            while let Some(cue) = cues.next_if(|c| u64::from(c.at_ms) <= elapsed_ms) {
                player.tone(cue.frequency, cue.duration_ms);
            }
            frames.push(player.synth().render_frame());
        }
        log::debug!("rendered {} frames at {} Hz", frames.len(), sample_rate);
        Ok(frames)
    }

    pub fn render_to_wav(&self, sample_rate: u32, max_seconds: u32) -> Result<Vec<u8>, ControllerError> {
        let max_frames = u64::from(sample_rate) * u64::from(max_seconds);
        if max_frames > MAX_WAV_FRAMES {
            return Err(ControllerError::RenderTooLong {
                seconds: max_seconds,
                sample_rate,
            });
        }
        let frames = self.render_frames(sample_rate, max_frames as usize)?;
        Ok(wav::frames_to_wav(&frames, sample_rate)?)
    }

    /// Frames a render is likely to need: the score plus its cues when it
    /// ends on its own, a minute otherwise.
    fn expected_frames(&self, sample_rate: u32) -> u64 {
        let cue_end = self
            .cues
            .iter()
            .map(|c| u64::from(c.at_ms) + u64::from(c.duration_ms))
            .max()
            .unwrap_or(0);
        let ms = match &self.summary {
            Some(summary) if !summary.loops => summary.duration_ms.max(cue_end) + 1,
            _ => LOOPING_RENDER_RESERVE_MS,
        };
        ms * u64::from(sample_rate) / 1000
    }

    fn settings(&self) -> PlayerSettings {
        PlayerSettings {
            config: self.config,
            sound_enabled: self.sound_enabled,
            tone_mutes_score: self.tone_mutes_score,
        }
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Clone, Copy)]
pub(crate) struct PlayerSettings {
    pub(crate) config: Config,
    pub(crate) sound_enabled: bool,
    pub(crate) tone_mutes_score: bool,
}

impl PlayerSettings {
    /// A player with its channels up, ticked by the returned clock.
    pub(crate) fn build(self, sample_rate: u32) -> (Player, FrameClock) {
        let player = Playtune::with_config(
            SoftSynth::new(sample_rate),
            AtomicBool::new(self.sound_enabled),
            self.config,
        );
        player.tone_mutes_score(self.tone_mutes_score);
        let mut clock = FrameClock::new(sample_rate);
        player.init_channels(&mut clock);
        (player, clock)
    }
}

pub(crate) fn leak_score(bytes: Vec<u8>) -> &'static Score {
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    Box::leak(Box::new(Score::new(bytes)))
}

type Ready = Result<(Arc<Player>, ControlLink, u32), AudioError>;

fn audio_thread(
    settings: PlayerSettings,
    stop_signal: Arc<AtomicBool>,
    ready: mpsc::SyncSender<Ready>,
) {
    let (mut output, consumer) = match CpalOutput::new() {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if let Err(e) = output.build_stream(consumer).and_then(|()| output.start()) {
        let _ = ready.send(Err(e));
        return;
    }

    let sample_rate = output.sample_rate();
    let (player, clock) = settings.build(sample_rate);
    let player = Arc::new(player);
    let (link, mut session) = control_channel(player.clone(), clock);
    if ready.send(Ok((player, link, sample_rate))).is_err() {
        return;
    }
    log::debug!("audio thread running at {} Hz", sample_rate);

    while !stop_signal.load(Ordering::Relaxed) {
        #[cfg(feature = "alloc_check")]
        let frame = assert_no_alloc::assert_no_alloc(|| session.next_frame());
        #[cfg(not(feature = "alloc_check"))]
        let frame = session.next_frame();
        output.write_spin(frame);
    }

    session.player().close_channels();
    for _ in 0..sample_rate * TAIL_MS / 1000 {
        output.write_spin(Frame::silence());
    }
    if let Err(e) = output.stop() {
        log::warn!("failed to stop audio stream: {}", e);
    }
}
