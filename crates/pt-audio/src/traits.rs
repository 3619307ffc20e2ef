//! Audio output trait and error types.

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
}

/// Trait for audio output backends.
///
/// Frames go through the backend's own blocking writer, e.g.
/// [`CpalOutput::write_spin`](crate::CpalOutput::write_spin).
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}
